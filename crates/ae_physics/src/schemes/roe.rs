// crates/ae_physics/src/schemes/roe.rs

//! Roe 近似黎曼求解器
//!
//! 以 Roe 平均态线性化界面黎曼问题：
//!
//! F* = ½ (F(P_L) + F(P_R)) − ½ |A| Σ_k |λ_k| α_k r_k
//!
//! λ_k 为 Roe 平均特征值，α_k 为波强，r_k 为右特征向量。
//! 声学特征值施加 Harten 熵修正：|λ| < δ 时
//! λ → (λ² + δ²)/(2δ)，δ 取当地声速的小倍数。
//!
//! 湍流输运量 (k, ω) 按熵波耗散迎风输运；总能计入 ρk，
//! Roe 平均总焓随之携带湍动能份额。
//!
//! 参考: Toro, "Riemann Solvers and Numerical Methods for
//! Fluid Dynamics"

use crate::state::{EqnVec, PrimitiveState, EQ_ENERGY, EQ_MASS, EQ_MOM_X, EQ_MOM_Y, EQ_MOM_Z, EQ_SDR, EQ_TKE};
use crate::thermo::IdealGas;
use glam::DVec3;

/// Roe 通量计算结果
#[derive(Debug, Clone, Copy)]
pub struct RoeFluxResult {
    /// 面通量（已乘面积 |A|）
    pub flux: EqnVec,
    /// 界面最大波速 |v_n| + a（谱半径估计用）
    pub max_wave_speed: f64,
}

/// Roe 通量格式
#[derive(Debug, Clone, Copy)]
pub struct RoeFlux {
    gas: IdealGas,
    /// 熵修正系数：δ = coeff · a_roe
    entropy_fix_coeff: f64,
}

impl RoeFlux {
    /// 创建 Roe 格式
    #[must_use]
    pub fn new(gas: IdealGas, entropy_fix_coeff: f64) -> Self {
        Self {
            gas,
            entropy_fix_coeff,
        }
    }

    /// Harten 熵修正后的 |λ|
    #[inline]
    fn entropy_fix(&self, lambda: f64, a_roe: f64) -> f64 {
        let delta = self.entropy_fix_coeff * a_roe;
        let mag = lambda.abs();
        if mag < delta && delta > 0.0 {
            (lambda * lambda + delta * delta) / (2.0 * delta)
        } else {
            mag
        }
    }

    /// 单侧物理通量（法向分量，未乘面积）
    fn physical_flux(&self, q: &PrimitiveState, n: DVec3) -> EqnVec {
        let vn = q.velocity().dot(n);
        let rho_e = q.to_conserved(&self.gas).rho_e;
        let mut f = EqnVec::ZERO;
        f[EQ_MASS] = q.rho * vn;
        f[EQ_MOM_X] = q.rho * vn * q.u + q.p * n.x;
        f[EQ_MOM_Y] = q.rho * vn * q.v + q.p * n.y;
        f[EQ_MOM_Z] = q.rho * vn * q.w + q.p * n.z;
        f[EQ_ENERGY] = vn * (rho_e + q.p);
        f[EQ_TKE] = q.rho * vn * q.tke;
        f[EQ_SDR] = q.rho * vn * q.sdr;
        f
    }

    /// 计算面通量
    ///
    /// `area` 为面积加权外法向 Â·A（由左单元指向右单元）；
    /// 返回的通量已乘面积，可直接累加到两侧残差。
    #[must_use]
    pub fn compute(&self, left: &PrimitiveState, right: &PrimitiveState, area: DVec3) -> RoeFluxResult {
        let a_mag = area.length();
        let n = area / a_mag;
        let gamma = self.gas.gamma();

        // Roe 平均
        let sqrt_l = left.rho.sqrt();
        let sqrt_r = right.rho.sqrt();
        let inv_sum = 1.0 / (sqrt_l + sqrt_r);

        let rho_roe = sqrt_l * sqrt_r;
        let vel_roe = (sqrt_l * left.velocity() + sqrt_r * right.velocity()) * inv_sum;
        let h0_roe = (sqrt_l * left.total_enthalpy(&self.gas)
            + sqrt_r * right.total_enthalpy(&self.gas))
            * inv_sum;
        let tke_roe = (sqrt_l * left.tke + sqrt_r * right.tke) * inv_sum;
        let sdr_roe = (sqrt_l * left.sdr + sqrt_r * right.sdr) * inv_sum;

        let q2_roe = vel_roe.length_squared();
        let a2_roe = (gamma - 1.0) * (h0_roe - 0.5 * q2_roe - tke_roe);
        let a_roe = a2_roe.max(0.0).sqrt();
        let vn_roe = vel_roe.dot(n);

        // 跳跃量
        let d_rho = right.rho - left.rho;
        let d_p = right.p - left.p;
        let d_vel = right.velocity() - left.velocity();
        let d_vn = d_vel.dot(n);

        // 波强
        let inv_2a2 = 1.0 / (2.0 * a2_roe);
        let alpha_minus = (d_p - rho_roe * a_roe * d_vn) * inv_2a2;
        let alpha_entropy = d_rho - d_p / a2_roe;
        let alpha_plus = (d_p + rho_roe * a_roe * d_vn) * inv_2a2;
        let d_vel_tangent = d_vel - d_vn * n;

        // 特征值（声学波带熵修正）
        let lam_minus = self.entropy_fix(vn_roe - a_roe, a_roe);
        let lam_entropy = self.entropy_fix(vn_roe, a_roe);
        let lam_plus = self.entropy_fix(vn_roe + a_roe, a_roe);

        // 耗散 Σ |λ| α r
        let mut diss = EqnVec::ZERO;

        // u − a 声学波
        let vel_m = vel_roe - a_roe * n;
        diss[EQ_MASS] += lam_minus * alpha_minus;
        diss[EQ_MOM_X] += lam_minus * alpha_minus * vel_m.x;
        diss[EQ_MOM_Y] += lam_minus * alpha_minus * vel_m.y;
        diss[EQ_MOM_Z] += lam_minus * alpha_minus * vel_m.z;
        diss[EQ_ENERGY] += lam_minus * alpha_minus * (h0_roe - a_roe * vn_roe);

        // 熵波
        diss[EQ_MASS] += lam_entropy * alpha_entropy;
        diss[EQ_MOM_X] += lam_entropy * alpha_entropy * vel_roe.x;
        diss[EQ_MOM_Y] += lam_entropy * alpha_entropy * vel_roe.y;
        diss[EQ_MOM_Z] += lam_entropy * alpha_entropy * vel_roe.z;
        diss[EQ_ENERGY] += lam_entropy * alpha_entropy * (0.5 * q2_roe + tke_roe);

        // 剪切波
        let shear = rho_roe * d_vel_tangent;
        diss[EQ_MOM_X] += lam_entropy * shear.x;
        diss[EQ_MOM_Y] += lam_entropy * shear.y;
        diss[EQ_MOM_Z] += lam_entropy * shear.z;
        diss[EQ_ENERGY] += lam_entropy * vel_roe.dot(shear);

        // u + a 声学波
        let vel_p = vel_roe + a_roe * n;
        diss[EQ_MASS] += lam_plus * alpha_plus;
        diss[EQ_MOM_X] += lam_plus * alpha_plus * vel_p.x;
        diss[EQ_MOM_Y] += lam_plus * alpha_plus * vel_p.y;
        diss[EQ_MOM_Z] += lam_plus * alpha_plus * vel_p.z;
        diss[EQ_ENERGY] += lam_plus * alpha_plus * (h0_roe + a_roe * vn_roe);

        // 湍流输运量沿熵波迎风
        diss[EQ_TKE] += lam_entropy * (right.rho * right.tke - left.rho * left.tke);
        diss[EQ_SDR] += lam_entropy * (right.rho * right.sdr - left.rho * left.sdr);
        diss[EQ_ENERGY] += lam_entropy * rho_roe * (right.tke - left.tke);

        let f_l = self.physical_flux(left, n);
        let f_r = self.physical_flux(right, n);
        let flux = ((f_l + f_r) * 0.5 - diss * 0.5) * a_mag;

        RoeFluxResult {
            flux,
            max_wave_speed: vn_roe.abs() + a_roe,
        }
    }
}

// ============================================================
// 测试
// ============================================================
