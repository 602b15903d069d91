// crates/ae_physics/src/turbulence.rs

//! k-ω 族湍流闭合
//!
//! 以标签变体（枚举分发）暴露统一能力面：涡黏、源项、
//! 壁面幽灵 ω、扩散系数。热循环内无虚调用、无隐藏分配。
//!
//! 变体：
//! - [`TurbulenceModel::None`]: 层流/无黏
//! - [`TurbulenceModel::WilcoxKw`]: Wilcox k-ω
//! - [`TurbulenceModel::MenterSst`]: Menter SST（F1/F2 混合）
//! - [`TurbulenceModel::SstDes`]: SST-DES（耗散项长度尺度限制）
//! - [`TurbulenceModel::WaleLes`]: WALE 亚格子涡黏（无输运方程）
//!
//! # 单位
//!
//! 状态存储采用输出缩放一致的无量纲：k 以 a∞² 缩放，
//! ω 以 ρ∞a∞²/μ_ref 缩放，因此 μt = ρk/ω 直接得 μ_ref 单位，
//! 与 Sutherland μ̃ 同单位进入黏性通量。含梯度的生成类项携带
//! inv_re 因子，耗散类项（ρkω、ρω²）携带 1/inv_re，推导见
//! thermo 模块的缩放约定。
//!
//! 壁面近壁 ω 采用 Menter 公式 ω_w = 60ν/(β₁ Δy²)。

use crate::schemes::viscous::TurbDiffusion;
use crate::state::PrimitiveState;
use crate::thermo::Thermodynamics;
use ae_config::{TurbulenceConfig, TurbulenceKind};
use glam::{DMat3, DVec3};

// ============================================================
// 模型常数
// ============================================================

/// β*（k-ω 族公用）
pub const BETA_STAR: f64 = 0.09;
/// von Kármán 常数
pub const KAPPA_VK: f64 = 0.41;
/// 对数律截距
pub const WALL_LAW_B: f64 = 5.1;

/// Wilcox k-ω 常数
mod wilcox {
    pub const ALPHA: f64 = 5.0 / 9.0;
    pub const BETA: f64 = 3.0 / 40.0;
    pub const SIGMA_K: f64 = 0.5;
    pub const SIGMA_W: f64 = 0.5;
}

/// SST 内层（k-ω 侧）常数
mod sst1 {
    pub const SIGMA_K: f64 = 0.85;
    pub const SIGMA_W: f64 = 0.5;
    pub const BETA: f64 = 0.075;
    pub const GAMMA: f64 = 5.0 / 9.0;
    pub const C_DES: f64 = 0.78;
}

/// SST 外层（k-ε 侧）常数
mod sst2 {
    pub const SIGMA_K: f64 = 1.0;
    pub const SIGMA_W: f64 = 0.856;
    pub const BETA: f64 = 0.0828;
    pub const GAMMA: f64 = 0.44;
    pub const C_DES: f64 = 0.61;
}

/// SST 涡黏限制常数 a₁
const SST_A1: f64 = 0.31;

/// WALE 常数
const WALE_CW: f64 = 0.325;

/// ω 除法保护
const OMEGA_FLOOR: f64 = 1.0e-20;

// ============================================================
// 梯度不变量
// ============================================================

/// 应变率张量双点积 S:S（S = ½(∇u + ∇uᵀ)）
#[must_use]
fn strain_double_dot(g: &DMat3) -> f64 {
    let mut sum = 0.0;
    for c in 0..3 {
        for d in 0..3 {
            let s = 0.5 * (g.col(c)[d] + g.col(d)[c]);
            sum += s * s;
        }
    }
    sum
}

/// 涡量模 |∇×u|
#[must_use]
fn vorticity_mag(g: &DMat3) -> f64 {
    // ∂u_c/∂x_d = g.col(c)[d]
    let wx = g.col(2)[1] - g.col(1)[2];
    let wy = g.col(0)[2] - g.col(2)[0];
    let wz = g.col(1)[0] - g.col(0)[1];
    (wx * wx + wy * wy + wz * wz).sqrt()
}

/// 速度散度
#[must_use]
fn divergence(g: &DMat3) -> f64 {
    g.col(0)[0] + g.col(1)[1] + g.col(2)[2]
}

// ============================================================
// 湍流模型
// ============================================================

/// 湍流源项（单位体积，存储单位）
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceTerms {
    /// k 方程净源
    pub tke: f64,
    /// ω 方程净源
    pub sdr: f64,
}

/// 湍流模型（标签变体）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurbulenceModel {
    /// 无模型
    None,
    /// Wilcox k-ω
    WilcoxKw,
    /// Menter SST
    MenterSst,
    /// SST-DES
    SstDes,
    /// WALE LES（代数涡黏）
    WaleLes,
}

impl TurbulenceModel {
    /// 由配置创建
    #[must_use]
    pub fn from_config(cfg: &TurbulenceConfig) -> Self {
        match cfg.model {
            TurbulenceKind::None => Self::None,
            TurbulenceKind::WilcoxKw => Self::WilcoxKw,
            TurbulenceKind::MenterSst => Self::MenterSst,
            TurbulenceKind::SstDes => Self::SstDes,
            TurbulenceKind::WaleLes => Self::WaleLes,
        }
    }

    /// 是否推进 k/ω 输运方程
    #[must_use]
    pub fn has_transport(&self) -> bool {
        matches!(self, Self::WilcoxKw | Self::MenterSst | Self::SstDes)
    }

    /// 是否产生涡黏
    #[must_use]
    pub fn is_modelled(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// SST F1 混合函数（1 → 内层 k-ω，0 → 外层 k-ε）
    fn f1(
        &self,
        q: &PrimitiveState,
        tke_grad: DVec3,
        sdr_grad: DVec3,
        wall_dist: f64,
        thermo: &Thermodynamics,
    ) -> f64 {
        match self {
            Self::MenterSst | Self::SstDes => {
                let inv_re = thermo.inv_re;
                let t = q.temperature(&thermo.gas);
                let mu = thermo.sutherland.viscosity(t);
                let d2 = wall_dist * wall_dist;
                let omega = q.sdr.max(OMEGA_FLOOR);

                let cd_kw = (2.0 * q.rho * sst2::SIGMA_W / omega * tke_grad.dot(sdr_grad)
                    * inv_re)
                    .max(1.0e-20);

                let term1 = q.tke.max(0.0).sqrt() * inv_re / (BETA_STAR * omega * wall_dist);
                let term2 = 500.0 * mu * inv_re * inv_re / (q.rho * d2 * omega);
                let term3 = 4.0 * q.rho * sst2::SIGMA_W * q.tke / (cd_kw * d2);

                let arg1 = term1.max(term2).min(term3);
                (arg1.powi(4)).tanh().min(1.0)
            }
            _ => 1.0,
        }
    }

    /// 涡黏 μt（μ_ref 单位）
    ///
    /// `volume` 仅 LES/DES 变体使用（滤波尺度 Δ = V^⅓）。
    #[must_use]
    pub fn eddy_viscosity(
        &self,
        q: &PrimitiveState,
        vel_grad: &DMat3,
        wall_dist: f64,
        volume: f64,
        thermo: &Thermodynamics,
    ) -> f64 {
        match self {
            Self::None => 0.0,
            Self::WilcoxKw => q.rho * q.tke.max(0.0) / q.sdr.max(OMEGA_FLOOR),
            Self::MenterSst | Self::SstDes => {
                let inv_re = thermo.inv_re;
                let t = q.temperature(&thermo.gas);
                let mu = thermo.sutherland.viscosity(t);
                let omega = q.sdr.max(OMEGA_FLOOR);
                let d2 = (wall_dist * wall_dist).max(1.0e-30);

                // F2 = tanh(arg2²)
                let term1 =
                    2.0 * q.tke.max(0.0).sqrt() * inv_re / (BETA_STAR * omega * wall_dist);
                let term2 = 500.0 * mu * inv_re * inv_re / (q.rho * d2 * omega);
                let f2 = (term1.max(term2).powi(2)).tanh();

                let vort = vorticity_mag(vel_grad);
                q.rho * SST_A1 * q.tke.max(0.0)
                    / (SST_A1 * omega).max(f2 * vort * inv_re)
            }
            Self::WaleLes => {
                // WALE 算子：基于速度梯度张量平方的迹偏量
                let g = *vel_grad;
                let g2 = g * g;
                let tr = (g2.col(0)[0] + g2.col(1)[1] + g2.col(2)[2]) / 3.0;
                let mut sd_dd = 0.0;
                for c in 0..3 {
                    for d in 0..3 {
                        let sd = 0.5 * (g2.col(c)[d] + g2.col(d)[c])
                            - if c == d { tr } else { 0.0 };
                        sd_dd += sd * sd;
                    }
                }
                let s_dd = strain_double_dot(&g);
                let delta = volume.cbrt();
                let op = sd_dd.powf(1.5)
                    / (s_dd.powf(2.5) + sd_dd.powf(1.25) + 1.0e-30);
                q.rho * (WALE_CW * delta).powi(2) * op / thermo.inv_re
            }
        }
    }

    /// k/ω 方程源项
    ///
    /// 生成项带产生限制 P ≤ 20 β* ρkω，抑制滞止点异常。
    #[must_use]
    pub fn source_terms(
        &self,
        q: &PrimitiveState,
        vel_grad: &DMat3,
        tke_grad: DVec3,
        sdr_grad: DVec3,
        wall_dist: f64,
        volume: f64,
        thermo: &Thermodynamics,
    ) -> SourceTerms {
        if !self.has_transport() {
            return SourceTerms::default();
        }

        let inv_re = thermo.inv_re;
        let mu_t = self.eddy_viscosity(q, vel_grad, wall_dist, volume, thermo);
        let omega = q.sdr.max(OMEGA_FLOOR);

        let s_dd = strain_double_dot(vel_grad);
        let div = divergence(vel_grad);

        // 产生项 P = τt : ∇u
        let mut prod = 2.0 * mu_t * inv_re * (s_dd - div * div / 3.0)
            - (2.0 / 3.0) * q.rho * q.tke * div;
        // 耗散项 D = β* ρ k ω
        let mut diss = BETA_STAR * q.rho * q.tke * omega / inv_re;
        prod = prod.min(20.0 * diss);

        let (alpha, beta, cross) = match self {
            Self::WilcoxKw => (wilcox::ALPHA, wilcox::BETA, 0.0),
            Self::MenterSst | Self::SstDes => {
                let f1 = self.f1(q, tke_grad, sdr_grad, wall_dist, thermo);
                let alpha = f1 * sst1::GAMMA + (1.0 - f1) * sst2::GAMMA;
                let beta = f1 * sst1::BETA + (1.0 - f1) * sst2::BETA;
                // 交叉扩散（仅外层激活）
                let cross = 2.0 * (1.0 - f1) * q.rho * sst2::SIGMA_W / omega
                    * tke_grad.dot(sdr_grad)
                    * inv_re;
                (alpha, beta, cross)
            }
            _ => unreachable!(),
        };

        // DES：以滤波尺度限制耗散长度尺度
        if let Self::SstDes = self {
            let f1 = self.f1(q, tke_grad, sdr_grad, wall_dist, thermo);
            let c_des = f1 * sst1::C_DES + (1.0 - f1) * sst2::C_DES;
            let l_t = q.tke.max(0.0).sqrt() * inv_re / (BETA_STAR * omega);
            let delta = volume.cbrt();
            let f_des = (l_t / (c_des * delta)).max(1.0);
            diss *= f_des;
        }

        // ω 方程：Pω = α (ω/k) P 的 μt 形式，避免 k → 0 奇异
        let prod_w = if mu_t > 0.0 {
            alpha * q.rho / mu_t * prod
        } else {
            0.0
        };
        let diss_w = beta * q.rho * q.sdr * q.sdr / inv_re;

        SourceTerms {
            tke: prod - diss,
            sdr: prod_w - diss_w + cross,
        }
    }

    /// 湍流输运扩散系数（SST 按 F1 混合）
    #[must_use]
    pub fn diffusion(
        &self,
        q: &PrimitiveState,
        tke_grad: DVec3,
        sdr_grad: DVec3,
        wall_dist: f64,
        thermo: &Thermodynamics,
    ) -> TurbDiffusion {
        match self {
            Self::None | Self::WaleLes => TurbDiffusion::default(),
            Self::WilcoxKw => TurbDiffusion {
                sigma_k: wilcox::SIGMA_K,
                sigma_w: wilcox::SIGMA_W,
            },
            Self::MenterSst | Self::SstDes => {
                let f1 = self.f1(q, tke_grad, sdr_grad, wall_dist, thermo);
                TurbDiffusion {
                    sigma_k: f1 * sst1::SIGMA_K + (1.0 - f1) * sst2::SIGMA_K,
                    sigma_w: f1 * sst1::SIGMA_W + (1.0 - f1) * sst2::SIGMA_W,
                }
            }
        }
    }

    /// 黏性壁面近壁 ω（Menter）：ω_w = 60ν/(β₁ Δy²)
    ///
    /// `wall_dist` 为壁邻单元中心到壁面的距离。
    #[must_use]
    pub fn wall_ghost_sdr(&self, rho: f64, mu: f64, wall_dist: f64, thermo: &Thermodynamics) -> f64 {
        let inv_re = thermo.inv_re;
        60.0 * mu * inv_re * inv_re / (sst1::BETA * rho * wall_dist * wall_dist)
    }

    /// 来流湍流量 (k∞, ω∞)
    ///
    /// k 由湍流强度给出，ω 由涡黏比反解。
    #[must_use]
    pub fn freestream(&self, mach: f64, cfg: &TurbulenceConfig) -> (f64, f64) {
        if !self.has_transport() {
            return (0.0, 0.0);
        }
        let tke = 1.5 * (cfg.intensity * mach).powi(2);
        // μt/μ = ρk/(ω μ)，来流 ρ = μ = 1
        let sdr = tke / cfg.eddy_viscosity_ratio.max(1.0e-10);
        (tke, sdr)
    }
}

// ============================================================
// 壁面律
// ============================================================

/// 对数律摩擦速度求解
///
/// u⁺ = ln(y⁺)/κ + B，Newton 迭代求 u_τ；
/// 返回 (u_τ, y⁺)。输入为壁面切向速度模、壁距与壁面物性。
#[must_use]
pub fn wall_shear_velocity(
    u_parallel: f64,
    wall_dist: f64,
    rho: f64,
    mu: f64,
    thermo: &Thermodynamics,
) -> (f64, f64) {
    let re_fac = rho * wall_dist / (mu * thermo.inv_re);
    // 初值：层流估计 u_τ = √(u ν / d)
    let mut u_tau = (u_parallel / re_fac).abs().sqrt().max(1.0e-12);

    for _ in 0..8 {
        let y_plus = (re_fac * u_tau).max(1.0e-12);
        let f = u_tau * ((y_plus.ln()) / KAPPA_VK + WALL_LAW_B) - u_parallel;
        let df = (y_plus.ln()) / KAPPA_VK + WALL_LAW_B + 1.0 / KAPPA_VK;
        let step = f / df;
        u_tau = (u_tau - step).max(1.0e-14);
        if step.abs() < 1.0e-12 * u_tau.max(1.0e-12) {
            break;
        }
    }
    (u_tau, re_fac * u_tau)
}

/// 壁面律/低雷诺数自动切换的 y⁺ 迟滞带
///
/// 上穿 `Y_PLUS_HIGH` 切入壁面律，下穿 `Y_PLUS_LOW` 退回低雷诺数
/// 处理；带内保持原状态，避免振荡收敛过程中来回切换。
pub const Y_PLUS_LOW: f64 = 8.0;
/// 迟滞带上界
pub const Y_PLUS_HIGH: f64 = 12.0;

/// 迟滞切换：返回新的壁面律激活状态
#[inline]
#[must_use]
pub fn wall_law_switch(y_plus: f64, currently_active: bool) -> bool {
    if currently_active {
        y_plus >= Y_PLUS_LOW
    } else {
        y_plus > Y_PLUS_HIGH
    }
}

// ============================================================
// 测试
// ============================================================
