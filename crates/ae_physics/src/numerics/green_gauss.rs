// crates/ae_physics/src/numerics/green_gauss.rs

//! Green-Gauss 单元中心梯度
//!
//! 使用 Green 定理将体积分转化为面积分：
//!
//! ∇φ|_c = (1/V_c) Σ_f φ_f Â_f·A_f
//!
//! φ_f 取相邻两单元的算术平均（邻居可为幽灵单元）。
//! 梯度为迭代内的 scratch 量，仅在产生它的非线性迭代内有效。

use crate::array3d::Array3D;
use crate::geometry::BlockGeometry;
use crate::state::PrimitiveState;
use crate::thermo::IdealGas;
use glam::{DMat3, DVec3};

/// 一个块的单元中心梯度集合（内部单元，无幽灵层）
///
/// 速度梯度按列存储：`vel.col(0) = ∇u`，元素 ∂u_c/∂x_d = `vel.col(c)[d]`。
#[derive(Debug, Clone)]
pub struct GradientSet {
    /// 速度梯度（3×3）
    pub vel: Array3D<DMat3>,
    /// 温度梯度
    pub temp: Array3D<DVec3>,
    /// 湍动能梯度
    pub tke: Array3D<DVec3>,
    /// 比耗散率梯度
    pub sdr: Array3D<DVec3>,
}

impl GradientSet {
    /// 按块内部尺寸分配
    #[must_use]
    pub fn new(ni: usize, nj: usize, nk: usize) -> Self {
        Self {
            vel: Array3D::new(ni, nj, nk, 0),
            temp: Array3D::new(ni, nj, nk, 0),
            tke: Array3D::new(ni, nj, nk, 0),
            sdr: Array3D::new(ni, nj, nk, 0),
        }
    }

    /// 重新计算全部梯度
    ///
    /// `state` 为含幽灵层的原始变量数组；六个面的 φ_f 取
    /// 本单元与面邻单元的算术平均。
    pub fn compute(
        &mut self,
        geom: &BlockGeometry,
        state: &Array3D<PrimitiveState>,
        gas: &IdealGas,
    ) {
        let (ni, nj, nk) = geom.num_cells();
        let g = geom.ghosts();

        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    let (ip, jp, kp) = (i + g, j + g, k + g);
                    let inv_v = 1.0 / geom.volume[(ip, jp, kp)];

                    let mut grad_u = DVec3::ZERO;
                    let mut grad_v = DVec3::ZERO;
                    let mut grad_w = DVec3::ZERO;
                    let mut grad_t = DVec3::ZERO;
                    let mut grad_k = DVec3::ZERO;
                    let mut grad_s = DVec3::ZERO;

                    let c = &state[(ip, jp, kp)];
                    let tc = c.temperature(gas);

                    // 六个面：(邻居物理索引, 外法向面积向量)
                    let faces = [
                        ((ip - 1, jp, kp), -geom.fa_i[(i, j, k)]),
                        ((ip + 1, jp, kp), geom.fa_i[(i + 1, j, k)]),
                        ((ip, jp - 1, kp), -geom.fa_j[(i, j, k)]),
                        ((ip, jp + 1, kp), geom.fa_j[(i, j + 1, k)]),
                        ((ip, jp, kp - 1), -geom.fa_k[(i, j, k)]),
                        ((ip, jp, kp + 1), geom.fa_k[(i, j, k + 1)]),
                    ];

                    for (nb, area) in faces {
                        let n = &state[nb];
                        grad_u += area * (0.5 * (c.u + n.u));
                        grad_v += area * (0.5 * (c.v + n.v));
                        grad_w += area * (0.5 * (c.w + n.w));
                        grad_t += area * (0.5 * (tc + n.temperature(gas)));
                        grad_k += area * (0.5 * (c.tke + n.tke));
                        grad_s += area * (0.5 * (c.sdr + n.sdr));
                    }

                    self.vel[(i, j, k)] =
                        DMat3::from_cols(grad_u * inv_v, grad_v * inv_v, grad_w * inv_v);
                    self.temp[(i, j, k)] = grad_t * inv_v;
                    self.tke[(i, j, k)] = grad_k * inv_v;
                    self.sdr[(i, j, k)] = grad_s * inv_v;
                }
            }
        }
    }
}
