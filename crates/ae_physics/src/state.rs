// crates/ae_physics/src/state.rs

//! 状态向量类型
//!
//! - [`PrimitiveState`]: 原始变量 {ρ, u, v, w, p} (+ {k, ω})
//! - [`ConservedState`]: 守恒变量 {ρ, ρu, ρv, ρw, ρE} (+ {ρk, ρω})
//! - [`EqnVec`]: 七分量代数向量，用于通量与残差
//!
//! 两种状态间的双射由状态方程定义（完全气体，γ 固定）。
//! 层流运行时湍流分量恒为零，对外报告 5 个方程。
//! 总能在湍流运行时计入湍动能：ρE = p/(γ-1) + ½ρ|V|² + ρk。

use crate::thermo::IdealGas;
use glam::DVec3;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub, SubAssign};

/// 方程总数（含湍流输运方程）
pub const NUM_EQNS: usize = 7;

/// 层流方程数
pub const NUM_EQNS_LAMINAR: usize = 5;

/// 方程索引：质量
pub const EQ_MASS: usize = 0;
/// 方程索引：x 动量
pub const EQ_MOM_X: usize = 1;
/// 方程索引：y 动量
pub const EQ_MOM_Y: usize = 2;
/// 方程索引：z 动量
pub const EQ_MOM_Z: usize = 3;
/// 方程索引：能量
pub const EQ_ENERGY: usize = 4;
/// 方程索引：湍动能
pub const EQ_TKE: usize = 5;
/// 方程索引：比耗散率
pub const EQ_SDR: usize = 6;

// ============================================================
// EqnVec
// ============================================================

/// 七分量代数向量
///
/// 残差、通量、谱半径等逐方程量的统一载体，按分量做代数运算。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EqnVec(pub [f64; NUM_EQNS]);

impl EqnVec {
    /// 零向量
    pub const ZERO: Self = Self([0.0; NUM_EQNS]);

    /// 全部分量取同一值
    #[inline]
    #[must_use]
    pub fn splat(v: f64) -> Self {
        Self([v; NUM_EQNS])
    }

    /// 分量绝对值
    #[inline]
    #[must_use]
    pub fn abs(&self) -> Self {
        let mut out = *self;
        for v in &mut out.0 {
            *v = v.abs();
        }
        out
    }

    /// 逐分量平方
    #[inline]
    #[must_use]
    pub fn squared(&self) -> Self {
        let mut out = *self;
        for v in &mut out.0 {
            *v *= *v;
        }
        out
    }

    /// 逐分量最大
    #[inline]
    #[must_use]
    pub fn max(&self, other: &Self) -> Self {
        let mut out = *self;
        for (v, o) in out.0.iter_mut().zip(other.0.iter()) {
            *v = v.max(*o);
        }
        out
    }

    /// 是否所有分量有限
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// 前 n 个分量的迭代器
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
}

impl Index<usize> for EqnVec {
    type Output = f64;
    #[inline]
    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl IndexMut<usize> for EqnVec {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

impl Add for EqnVec {
    type Output = Self;
    #[inline]
    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for EqnVec {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a += b;
        }
    }
}

impl Sub for EqnVec {
    type Output = Self;
    #[inline]
    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl SubAssign for EqnVec {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a -= b;
        }
    }
}

impl Mul<f64> for EqnVec {
    type Output = Self;
    #[inline]
    fn mul(mut self, s: f64) -> Self {
        for a in &mut self.0 {
            *a *= s;
        }
        self
    }
}

impl Mul<EqnVec> for f64 {
    type Output = EqnVec;
    #[inline]
    fn mul(self, v: EqnVec) -> EqnVec {
        v * self
    }
}

impl Div<f64> for EqnVec {
    type Output = Self;
    #[inline]
    fn div(mut self, s: f64) -> Self {
        for a in &mut self.0 {
            *a /= s;
        }
        self
    }
}

impl Neg for EqnVec {
    type Output = Self;
    #[inline]
    fn neg(mut self) -> Self {
        for a in &mut self.0 {
            *a = -*a;
        }
        self
    }
}

// ============================================================
// 原始变量
// ============================================================

/// 原始状态 {ρ, u, v, w, p, k, ω}（无量纲）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PrimitiveState {
    /// 密度
    pub rho: f64,
    /// x 速度
    pub u: f64,
    /// y 速度
    pub v: f64,
    /// z 速度
    pub w: f64,
    /// 静压
    pub p: f64,
    /// 湍动能
    pub tke: f64,
    /// 比耗散率
    pub sdr: f64,
}

impl PrimitiveState {
    /// 层流构造
    #[must_use]
    pub fn new(rho: f64, velocity: DVec3, p: f64) -> Self {
        Self {
            rho,
            u: velocity.x,
            v: velocity.y,
            w: velocity.z,
            p,
            tke: 0.0,
            sdr: 0.0,
        }
    }

    /// 带湍流量构造
    #[must_use]
    pub fn with_turbulence(rho: f64, velocity: DVec3, p: f64, tke: f64, sdr: f64) -> Self {
        Self {
            rho,
            u: velocity.x,
            v: velocity.y,
            w: velocity.z,
            p,
            tke,
            sdr,
        }
    }

    /// 速度向量
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> DVec3 {
        DVec3::new(self.u, self.v, self.w)
    }

    /// 无量纲温度
    #[inline]
    #[must_use]
    pub fn temperature(&self, gas: &IdealGas) -> f64 {
        gas.temperature(self.p, self.rho)
    }

    /// 无量纲声速
    #[inline]
    #[must_use]
    pub fn sound_speed(&self, gas: &IdealGas) -> f64 {
        gas.sound_speed(self.p, self.rho)
    }

    /// 总焓 h0 = (ρE + p) / ρ
    #[inline]
    #[must_use]
    pub fn total_enthalpy(&self, gas: &IdealGas) -> f64 {
        let e_tot = self.p / ((gas.gamma() - 1.0) * self.rho)
            + 0.5 * self.velocity().length_squared()
            + self.tke;
        e_tot + self.p / self.rho
    }

    /// 转换到守恒变量
    #[must_use]
    pub fn to_conserved(&self, gas: &IdealGas) -> ConservedState {
        let vel = self.velocity();
        let rho_e = self.p / (gas.gamma() - 1.0)
            + 0.5 * self.rho * vel.length_squared()
            + self.rho * self.tke;
        ConservedState {
            rho: self.rho,
            rho_u: self.rho * self.u,
            rho_v: self.rho * self.v,
            rho_w: self.rho * self.w,
            rho_e,
            rho_tke: self.rho * self.tke,
            rho_sdr: self.rho * self.sdr,
        }
    }

    /// 状态是否物理可采纳（ρ > 0 且 p > 0）
    #[inline]
    #[must_use]
    pub fn is_physical(&self) -> bool {
        self.rho > 0.0 && self.p > 0.0
    }

    /// 以 EqnVec 视图返回（重构插值用）
    #[inline]
    #[must_use]
    pub fn to_vec(&self) -> EqnVec {
        EqnVec([self.rho, self.u, self.v, self.w, self.p, self.tke, self.sdr])
    }

    /// 从 EqnVec 恢复
    #[inline]
    #[must_use]
    pub fn from_vec(v: &EqnVec) -> Self {
        Self {
            rho: v[0],
            u: v[1],
            v: v[2],
            w: v[3],
            p: v[4],
            tke: v[5],
            sdr: v[6],
        }
    }
}

// ============================================================
// 守恒变量
// ============================================================

/// 守恒状态 {ρ, ρu, ρv, ρw, ρE, ρk, ρω}（无量纲）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConservedState {
    /// 密度
    pub rho: f64,
    /// x 动量
    pub rho_u: f64,
    /// y 动量
    pub rho_v: f64,
    /// z 动量
    pub rho_w: f64,
    /// 总能
    pub rho_e: f64,
    /// ρk
    pub rho_tke: f64,
    /// ρω
    pub rho_sdr: f64,
}

impl ConservedState {
    /// 转换到原始变量
    #[must_use]
    pub fn to_primitive(&self, gas: &IdealGas) -> PrimitiveState {
        let inv_rho = 1.0 / self.rho;
        let vel = DVec3::new(self.rho_u, self.rho_v, self.rho_w) * inv_rho;
        let tke = self.rho_tke * inv_rho;
        let p = (gas.gamma() - 1.0)
            * (self.rho_e - 0.5 * self.rho * vel.length_squared() - self.rho_tke);
        PrimitiveState {
            rho: self.rho,
            u: vel.x,
            v: vel.y,
            w: vel.z,
            p,
            tke,
            sdr: self.rho_sdr * inv_rho,
        }
    }

    /// 以 EqnVec 返回
    #[inline]
    #[must_use]
    pub fn to_vec(&self) -> EqnVec {
        EqnVec([
            self.rho,
            self.rho_u,
            self.rho_v,
            self.rho_w,
            self.rho_e,
            self.rho_tke,
            self.rho_sdr,
        ])
    }

    /// 从 EqnVec 恢复
    #[inline]
    #[must_use]
    pub fn from_vec(v: &EqnVec) -> Self {
        Self {
            rho: v[0],
            rho_u: v[1],
            rho_v: v[2],
            rho_w: v[3],
            rho_e: v[4],
            rho_tke: v[5],
            rho_sdr: v[6],
        }
    }

    /// 施加增量 U + ΔU
    #[inline]
    #[must_use]
    pub fn applied(&self, delta: &EqnVec) -> Self {
        Self::from_vec(&(self.to_vec() + *delta))
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ae_foundation::approx_eq_rel;

    fn gas() -> IdealGas {
        IdealGas::new(1.4)
    }

    /// 性质 1：任意可采纳 P 的往返转换相对误差 < 1e-12
    #[test]
    fn test_primitive_conserved_roundtrip() {
        let states = [
            PrimitiveState::new(1.0, DVec3::new(0.3, -0.2, 0.1), 1.0 / 1.4),
            PrimitiveState::new(0.125, DVec3::ZERO, 0.1),
            PrimitiveState::with_turbulence(2.5, DVec3::new(1.8, 0.0, -0.4), 3.2, 0.01, 150.0),
            PrimitiveState::new(1e-3, DVec3::new(5.0, 5.0, 5.0), 1e-4),
        ];

        for p in states {
            let back = p.to_conserved(&gas()).to_primitive(&gas());
            assert!(approx_eq_rel(back.rho, p.rho, 1e-12));
            assert!(approx_eq_rel(back.u, p.u, 1e-12));
            assert!(approx_eq_rel(back.v, p.v, 1e-12));
            assert!(approx_eq_rel(back.w, p.w, 1e-12));
            assert!(approx_eq_rel(back.p, p.p, 1e-12));
            assert!(approx_eq_rel(back.tke, p.tke, 1e-12));
            assert!(approx_eq_rel(back.sdr, p.sdr, 1e-12));
        }
    }

    #[test]
    fn test_turbulent_energy_contains_tke() {
        // 含 k 时总能多出 ρk
        let lam = PrimitiveState::new(1.0, DVec3::new(0.5, 0.0, 0.0), 1.0);
        let mut turb = lam;
        turb.tke = 0.02;
        let de = turb.to_conserved(&gas()).rho_e - lam.to_conserved(&gas()).rho_e;
        assert!(approx_eq_rel(de, 0.02, 1e-12));
    }

    #[test]
    fn test_total_enthalpy() {
        let p = PrimitiveState::new(1.0, DVec3::new(0.5, 0.0, 0.0), 1.0 / 1.4);
        // h0 = a²/(γ-1) + V²/2 在来流态下 = 1/0.4 + 0.125
        let h0 = p.total_enthalpy(&gas());
        assert!(approx_eq_rel(h0, 1.0 / 0.4 + 0.125, 1e-12));
    }

    #[test]
    fn test_eqnvec_algebra() {
        let a = EqnVec([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let b = EqnVec::splat(1.0);
        let c = (a + b) * 2.0 - a;
        assert_eq!(c[0], 3.0);
        assert_eq!(c[6], 9.0);
        assert_eq!((-b)[3], -1.0);
    }

    #[test]
    fn test_is_physical() {
        assert!(PrimitiveState::new(1.0, DVec3::ZERO, 0.5).is_physical());
        assert!(!PrimitiveState::new(-1.0, DVec3::ZERO, 0.5).is_physical());
        assert!(!PrimitiveState::new(1.0, DVec3::ZERO, 0.0).is_physical());
    }
}
