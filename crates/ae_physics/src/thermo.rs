// crates/ae_physics/src/thermo.rs

//! 热力学模型：完全气体 + Sutherland 黏性律
//!
//! 所有内部运算使用无量纲 frame：密度以 ρ∞、速度以声速 a∞、
//! 长度以 L、黏性以 μ_ref 缩放。由此：
//!
//! - 状态方程  p̃ = ρ̃ T̃ / γ （因 a∞² = γ R T∞）
//! - 声速      ã = √(γ p̃ / ρ̃)
//! - 来流      ρ̃ = 1, |Ṽ| = M∞, p̃ = 1/γ, T̃ = 1
//!
//! 黏性通量整体携带因子 1/Re_a，Re_a = ρ∞ a∞ L / μ_ref
//! （声学雷诺数，由输入卡的 Re_L 与 M∞ 换算）。

use ae_config::{FluidConfig, ReferenceConfig};

/// 完全气体状态方程（γ 固定）
#[derive(Debug, Clone, Copy)]
pub struct IdealGas {
    /// 比热比
    gamma: f64,
}

impl IdealGas {
    /// 创建完全气体模型
    #[must_use]
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }

    /// 比热比 γ
    #[inline]
    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// 无量纲温度 T̃ = γ p̃ / ρ̃
    #[inline]
    #[must_use]
    pub fn temperature(&self, p: f64, rho: f64) -> f64 {
        self.gamma * p / rho
    }

    /// 无量纲声速 ã = √(γ p̃ / ρ̃)
    #[inline]
    #[must_use]
    pub fn sound_speed(&self, p: f64, rho: f64) -> f64 {
        (self.gamma * p / rho).sqrt()
    }

    /// 由温度反解压力 p̃ = ρ̃ T̃ / γ
    #[inline]
    #[must_use]
    pub fn pressure_from_temperature(&self, rho: f64, t: f64) -> f64 {
        rho * t / self.gamma
    }

    /// 单位质量内能 ẽ = p̃ / (ρ̃ (γ-1))
    #[inline]
    #[must_use]
    pub fn internal_energy(&self, p: f64, rho: f64) -> f64 {
        p / (rho * (self.gamma - 1.0))
    }
}

/// Sutherland 黏性律（无量纲形式）
///
/// μ̃(T̃) = T̃^(3/2) · (1 + S̃) / (T̃ + S̃)，S̃ = S / T∞，
/// 归一化使 μ̃(1) = 1。
#[derive(Debug, Clone, Copy)]
pub struct Sutherland {
    /// 无量纲 Sutherland 温度 S / T∞
    s_nd: f64,
}

impl Sutherland {
    /// 由有量纲 Sutherland 温度与参考温度创建
    #[must_use]
    pub fn new(s_dimensional: f64, t_ref: f64) -> Self {
        Self {
            s_nd: s_dimensional / t_ref,
        }
    }

    /// 无量纲黏性 μ̃(T̃)
    #[inline]
    #[must_use]
    pub fn viscosity(&self, t: f64) -> f64 {
        t.powf(1.5) * (1.0 + self.s_nd) / (t + self.s_nd)
    }
}

/// 热力学对象：状态方程 + 黏性律 + 无量纲缩放系数
///
/// 以显式 `Context` 的一部分传入积分器，不使用进程级常量。
#[derive(Debug, Clone, Copy)]
pub struct Thermodynamics {
    /// 状态方程
    pub gas: IdealGas,
    /// 黏性律
    pub sutherland: Sutherland,
    /// 分子 Prandtl 数
    pub prandtl: f64,
    /// 湍流 Prandtl 数
    pub prandtl_turb: f64,
    /// 黏性通量缩放 1/Re_a = μ_ref / (ρ∞ a∞ L)
    pub inv_re: f64,
}

impl Thermodynamics {
    /// 由输入卡的流体与参考态构建
    ///
    /// 输入卡给出基于来流速度的 Re_L = ρ∞ U∞ L / μ∞；
    /// 换算到声学雷诺数 Re_a = Re_L / M∞。
    #[must_use]
    pub fn from_config(fluid: &FluidConfig, reference: &ReferenceConfig) -> Self {
        let re_acoustic = if reference.mach > 0.0 {
            reference.reynolds / reference.mach
        } else {
            reference.reynolds
        };
        Self {
            gas: IdealGas::new(fluid.gamma),
            sutherland: Sutherland::new(fluid.sutherland_s, reference.t_ref),
            prandtl: fluid.prandtl,
            prandtl_turb: fluid.prandtl_turb,
            inv_re: 1.0 / re_acoustic,
        }
    }

    /// 导热系数因子：黏性能量通量中 (μ/Pr + μt/Pr_t) / (γ-1) 的层流份额
    #[inline]
    #[must_use]
    pub fn conductivity(&self, mu: f64) -> f64 {
        mu / (self.prandtl * (self.gas.gamma() - 1.0))
    }

    /// 湍流导热份额
    #[inline]
    #[must_use]
    pub fn turb_conductivity(&self, mu_t: f64) -> f64 {
        mu_t / (self.prandtl_turb * (self.gas.gamma() - 1.0))
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ae_foundation::approx_eq_eps;

    #[test]
    fn test_freestream_relations() {
        let gas = IdealGas::new(1.4);
        // 来流: ρ=1, p=1/γ, 则 T=1, a=1
        let p_inf = 1.0 / 1.4;
        assert!(approx_eq_eps(gas.temperature(p_inf, 1.0), 1.0, 1e-14));
        assert!(approx_eq_eps(gas.sound_speed(p_inf, 1.0), 1.0, 1e-14));
    }

    #[test]
    fn test_pressure_temperature_roundtrip() {
        let gas = IdealGas::new(1.4);
        let t = gas.temperature(0.9, 1.3);
        let p = gas.pressure_from_temperature(1.3, t);
        assert!(approx_eq_eps(p, 0.9, 1e-14));
    }

    #[test]
    fn test_sutherland_normalized() {
        // μ̃(1) = 1
        let suth = Sutherland::new(110.4, 288.15);
        assert!(approx_eq_eps(suth.viscosity(1.0), 1.0, 1e-14));
        // 黏性随温度单调增
        assert!(suth.viscosity(2.0) > suth.viscosity(1.0));
        assert!(suth.viscosity(0.5) < 1.0);
    }

    #[test]
    fn test_acoustic_reynolds() {
        let fluid = FluidConfig::default();
        let mut reference = ReferenceConfig::default();
        reference.reynolds = 1.0e5;
        reference.mach = 0.2;
        let thermo = Thermodynamics::from_config(&fluid, &reference);
        // Re_a = Re_L / M = 5e5
        assert!(approx_eq_eps(thermo.inv_re, 2.0e-6, 1e-18));
    }
}
