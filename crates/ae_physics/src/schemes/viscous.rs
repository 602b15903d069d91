// crates/ae_physics/src/schemes/viscous.rs

//! 面黏性通量
//!
//! 面梯度取相邻两单元梯度的平均，并沿面法向施加薄剪切层
//! 方向导数修正以抑制奇偶解耦：
//!
//! ∇φ̂ = ∇φ̄ − (∇φ̄·ê − (φ_R − φ_L)/|d|) ê,  ê = d/|d|
//!
//! 应力张量 τ = (μ + μ_t)(∇u + ∇uᵀ − ⅔(∇·u)I)，
//! 热流由 Sutherland μ(T) 与 Prandtl 数给出。
//! 全部黏性通量携带 1/Re_a 缩放（见 thermo 模块）。

use crate::state::{EqnVec, PrimitiveState, EQ_ENERGY, EQ_MOM_X, EQ_MOM_Y, EQ_MOM_Z, EQ_SDR, EQ_TKE};
use crate::thermo::Thermodynamics;
use glam::{DMat3, DVec3};

/// 面两侧的单元中心梯度
#[derive(Debug, Clone, Copy)]
pub struct FaceGradients {
    /// 速度梯度（列 = 分量）
    pub vel: DMat3,
    /// 温度梯度
    pub temp: DVec3,
    /// 湍动能梯度
    pub tke: DVec3,
    /// 比耗散率梯度
    pub sdr: DVec3,
}

impl FaceGradients {
    /// 两侧平均
    #[must_use]
    pub fn average(a: &Self, b: &Self) -> Self {
        Self {
            vel: (a.vel + b.vel) * 0.5,
            temp: (a.temp + b.temp) * 0.5,
            tke: (a.tke + b.tke) * 0.5,
            sdr: (a.sdr + b.sdr) * 0.5,
        }
    }
}

/// 湍流扩散系数（模型相关）
#[derive(Debug, Clone, Copy)]
pub struct TurbDiffusion {
    /// k 方程扩散系数 σ_k
    pub sigma_k: f64,
    /// ω 方程扩散系数 σ_ω
    pub sigma_w: f64,
}

impl Default for TurbDiffusion {
    fn default() -> Self {
        Self {
            sigma_k: 0.0,
            sigma_w: 0.0,
        }
    }
}

/// 方向导数修正
#[inline]
fn tsl_correct(grad: DVec3, e_hat: DVec3, jump_over_dist: f64) -> DVec3 {
    grad - (grad.dot(e_hat) - jump_over_dist) * e_hat
}

/// 计算面黏性通量（已乘面积）
///
/// # 参数
/// - `left`/`right`: 面两侧单元的原始状态
/// - `grads`: 两侧梯度的平均
/// - `dist`: 单元中心连线 x_R − x_L
/// - `area`: 面积加权外法向 Â·A
/// - `mu_t`: 面涡黏（μ_ref 单位）
/// - `diff`: 湍流扩散系数
///
/// 返回的通量在装配时从无黏通量中扣除：F = F_inv − F_visc。
#[must_use]
pub fn viscous_flux(
    left: &PrimitiveState,
    right: &PrimitiveState,
    grads: &FaceGradients,
    dist: DVec3,
    area: DVec3,
    mu_t: f64,
    diff: &TurbDiffusion,
    thermo: &Thermodynamics,
) -> EqnVec {
    let a_mag = area.length();
    let n = area / a_mag;

    let d_mag = dist.length();
    let e_hat = dist / d_mag;
    let inv_d = 1.0 / d_mag;

    // 面状态与黏性
    let t_face = 0.5 * (left.temperature(&thermo.gas) + right.temperature(&thermo.gas));
    let mu = thermo.sutherland.viscosity(t_face);
    let vel_face = 0.5 * (left.velocity() + right.velocity());

    // 方向导数修正后的面梯度
    let du = tsl_correct(grads.vel.col(0), e_hat, (right.u - left.u) * inv_d);
    let dv = tsl_correct(grads.vel.col(1), e_hat, (right.v - left.v) * inv_d);
    let dw = tsl_correct(grads.vel.col(2), e_hat, (right.w - left.w) * inv_d);
    let dt = tsl_correct(
        grads.temp,
        e_hat,
        (right.temperature(&thermo.gas) - left.temperature(&thermo.gas)) * inv_d,
    );
    let dk = tsl_correct(grads.tke, e_hat, (right.tke - left.tke) * inv_d);
    let dsdr = tsl_correct(grads.sdr, e_hat, (right.sdr - left.sdr) * inv_d);

    // 应力张量 τ = (μ+μt)(∇u + ∇uᵀ − ⅔(∇·u)I)
    let mu_eff = mu + mu_t;
    let div_u = du.x + dv.y + dw.z;
    let grad = DMat3::from_cols(du, dv, dw);
    // grad.col(c)[d] = ∂u_c/∂x_d; τ_cd = μ(∂u_c/∂x_d + ∂u_d/∂x_c) − ⅔μ δ_cd ∇·u
    let tau = (grad + grad.transpose()) * mu_eff
        - DMat3::from_diagonal(DVec3::splat(2.0 / 3.0 * mu_eff * div_u));

    // τ·n（τ 对称，按行点乘）
    let tau_n = DVec3::new(
        tau.col(0).dot(n),
        tau.col(1).dot(n),
        tau.col(2).dot(n),
    );

    // 热流 + 湍流输运扩散
    let kappa = thermo.conductivity(mu) + thermo.turb_conductivity(mu_t);
    let q_n = kappa * dt.dot(n);
    let k_diff = (mu + diff.sigma_k * mu_t) * dk.dot(n);
    let w_diff = (mu + diff.sigma_w * mu_t) * dsdr.dot(n);

    let scale = thermo.inv_re * a_mag;
    let mut f = EqnVec::ZERO;
    f[EQ_MOM_X] = tau_n.x * scale;
    f[EQ_MOM_Y] = tau_n.y * scale;
    f[EQ_MOM_Z] = tau_n.z * scale;
    f[EQ_ENERGY] = (tau_n.dot(vel_face) + q_n) * scale;
    f[EQ_TKE] = k_diff * scale;
    f[EQ_SDR] = w_diff * scale;
    f
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ae_config::{FluidConfig, ReferenceConfig};
    use ae_foundation::approx_eq_rel;

    fn thermo() -> Thermodynamics {
        let mut reference = ReferenceConfig::default();
        reference.reynolds = 1000.0;
        reference.mach = 1.0;
        Thermodynamics::from_config(&FluidConfig::default(), &reference)
    }

    fn zero_grads() -> FaceGradients {
        FaceGradients {
            vel: DMat3::ZERO,
            temp: DVec3::ZERO,
            tke: DVec3::ZERO,
            sdr: DVec3::ZERO,
        }
    }

    #[test]
    fn test_uniform_flow_zero_flux() {
        let q = PrimitiveState::new(1.0, DVec3::new(0.5, 0.0, 0.0), 1.0 / 1.4);
        let f = viscous_flux(
            &q,
            &q,
            &zero_grads(),
            DVec3::X,
            DVec3::X,
            0.0,
            &TurbDiffusion::default(),
            &thermo(),
        );
        for eq in 0..7 {
            assert!(f[eq].abs() < 1e-14, "方程{} 非零: {}", eq, f[eq]);
        }
    }

    #[test]
    fn test_couette_shear_stress() {
        // 纯剪切 du/dy = 1：τ_xy = μ，x 动量通量 = μ/Re · A
        let th = thermo();
        let q = PrimitiveState::new(1.0, DVec3::ZERO, 1.0 / 1.4); // T = 1, μ = 1
        let grads = FaceGradients {
            vel: DMat3::from_cols(DVec3::new(0.0, 1.0, 0.0), DVec3::ZERO, DVec3::ZERO),
            temp: DVec3::ZERO,
            tke: DVec3::ZERO,
            sdr: DVec3::ZERO,
        };
        // 面法向 +y，中心连线也沿 y（修正项与梯度一致时不改变结果）
        let f = viscous_flux(
            &q,
            &q,
            &grads,
            DVec3::Y,
            DVec3::Y,
            0.0,
            &TurbDiffusion::default(),
            &th,
        );
        // du/dy·ê 修正: jump=0 → ∂u/∂y 被修正为 0；改用切向距离向量保留梯度
        let f_tangent_dist = viscous_flux(
            &q,
            &q,
            &grads,
            DVec3::X,
            DVec3::Y,
            0.0,
            &TurbDiffusion::default(),
            &th,
        );
        // 沿 ê=x 的修正不影响 ∂u/∂y
        assert!(approx_eq_rel(f_tangent_dist[EQ_MOM_X], th.inv_re, 1e-12));
        // 沿 ê=y 且跳跃为零时方向导数被清零
        assert!(f[EQ_MOM_X].abs() < 1e-14);
    }

    #[test]
    fn test_tsl_correction_restores_jump() {
        // 平均梯度为零但两侧值有跳跃：修正项补回方向导数
        let th = thermo();
        let l = PrimitiveState::new(1.0, DVec3::ZERO, 1.0 / 1.4);
        let r = PrimitiveState::new(1.0, DVec3::new(0.1, 0.0, 0.0), 1.0 / 1.4);
        let f = viscous_flux(
            &l,
            &r,
            &zero_grads(),
            DVec3::X,
            DVec3::X,
            0.0,
            &TurbDiffusion::default(),
            &th,
        );
        // ∂u/∂x = 0.1 → τ_xx = 2μ(0.1) − ⅔μ(0.1) = (4/3)μ(0.1)
        let expected = 4.0 / 3.0 * 0.1 * th.inv_re;
        assert!(approx_eq_rel(f[EQ_MOM_X], expected, 1e-12));
    }

    #[test]
    fn test_heat_flux_direction() {
        // 温度沿 +x 增加，热流使能量通量为正（能量流入低温侧在扣除时体现）
        let th = thermo();
        let q = PrimitiveState::new(1.0, DVec3::ZERO, 1.0 / 1.4);
        let grads = FaceGradients {
            vel: DMat3::ZERO,
            temp: DVec3::new(0.5, 0.0, 0.0),
            tke: DVec3::ZERO,
            sdr: DVec3::ZERO,
        };
        // 中心连线取切向，避免方向修正清零
        let f = viscous_flux(
            &q,
            &q,
            &grads,
            DVec3::Y,
            DVec3::X,
            0.0,
            &TurbDiffusion::default(),
            &th,
        );
        assert!(f[EQ_ENERGY] > 0.0);
    }

    #[test]
    fn test_turbulent_diffusion_scaling() {
        let th = thermo();
        let q = PrimitiveState::with_turbulence(1.0, DVec3::ZERO, 1.0 / 1.4, 0.01, 100.0);
        let grads = FaceGradients {
            vel: DMat3::ZERO,
            temp: DVec3::ZERO,
            tke: DVec3::new(0.2, 0.0, 0.0),
            sdr: DVec3::ZERO,
        };
        let diff = TurbDiffusion {
            sigma_k: 0.85,
            sigma_w: 0.5,
        };
        let f0 = viscous_flux(&q, &q, &grads, DVec3::Y, DVec3::X, 0.0, &diff, &th);
        let f1 = viscous_flux(&q, &q, &grads, DVec3::Y, DVec3::X, 2.0, &diff, &th);
        // μt 增大使 k 扩散增大 σ_k·μt 份额
        let expected_delta = 0.85 * 2.0 * 0.2 * th.inv_re;
        assert!(approx_eq_rel(f1[EQ_TKE] - f0[EQ_TKE], expected_delta, 1e-12));
    }
}
