// crates/ae_physics/src/numerics/muscl.rs

//! MUSCL 面重构
//!
//! 对原始变量逐方向重构，给出面两侧的界面状态：
//!
//! ```text
//! P_L = P_i     + ½ ψ(Δ₋, Δ₊)        Δ₋ = P_i − P_{i−1}, Δ₊ = P_{i+1} − P_i
//! P_R = P_{i+1} − ½ ψ(Δ₊', Δ₊₊')
//! ```
//!
//! 量纲健全性：重构出非正 ρ 或 p 的面状态退化为一阶
//! （分片常值）界面并置修复标记供诊断统计；退化后仍非正
//! 则重构失败，由积分器转化为步长拒绝。

use crate::numerics::limiter::SlopeLimiter;
use crate::state::{EqnVec, PrimitiveState};

/// 面两侧重构状态
#[derive(Debug, Clone, Copy)]
pub struct FaceStates {
    /// 左侧界面状态
    pub left: PrimitiveState,
    /// 右侧界面状态
    pub right: PrimitiveState,
    /// 是否发生一阶修复
    pub repaired: bool,
}

/// 四单元模板重构
///
/// 模板沿面法向排列：`ll | l ‖ r | rr`，面位于 l 与 r 之间。
/// 返回 `None` 表示退化到一阶后界面状态仍非正
/// （即单元状态本身已非物理）。
#[must_use]
pub fn reconstruct_face(
    ll: &PrimitiveState,
    l: &PrimitiveState,
    r: &PrimitiveState,
    rr: &PrimitiveState,
    limiter: SlopeLimiter,
) -> Option<FaceStates> {
    let vll = ll.to_vec();
    let vl = l.to_vec();
    let vr = r.to_vec();
    let vrr = rr.to_vec();

    let mut left = EqnVec::ZERO;
    let mut right = EqnVec::ZERO;
    for eq in 0..crate::state::NUM_EQNS {
        left[eq] = vl[eq] + 0.5 * limiter.limit(vl[eq] - vll[eq], vr[eq] - vl[eq]);
        right[eq] = vr[eq] - 0.5 * limiter.limit(vr[eq] - vl[eq], vrr[eq] - vr[eq]);
    }

    let mut face = FaceStates {
        left: PrimitiveState::from_vec(&left),
        right: PrimitiveState::from_vec(&right),
        repaired: false,
    };

    if !face.left.is_physical() || !face.right.is_physical() {
        // 一阶修复：退回分片常值界面
        face.left = *l;
        face.right = *r;
        face.repaired = true;
        if !face.left.is_physical() || !face.right.is_physical() {
            return None;
        }
    }

    Some(face)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_foundation::approx_eq_eps;
    use glam::DVec3;

    fn prim(rho: f64, u: f64, p: f64) -> PrimitiveState {
        PrimitiveState::new(rho, DVec3::new(u, 0.0, 0.0), p)
    }

    #[test]
    fn test_uniform_field_piecewise_constant() {
        // 均匀场重构后两侧状态等于单元值
        let q = prim(1.0, 0.5, 0.7);
        let f = reconstruct_face(&q, &q, &q, &q, SlopeLimiter::VanAlbada).unwrap();
        assert_eq!(f.left, q);
        assert_eq!(f.right, q);
        assert!(!f.repaired);
    }

    #[test]
    fn test_linear_field_second_order() {
        // 线性场：van Albada 在光滑区恢复中心插值，面值为两单元平均
        let cells: Vec<_> = (0..4).map(|i| prim(1.0 + 0.1 * i as f64, 0.0, 1.0)).collect();
        let f = reconstruct_face(
            &cells[0],
            &cells[1],
            &cells[2],
            &cells[3],
            SlopeLimiter::VanAlbada,
        )
        .unwrap();
        assert!(approx_eq_eps(f.left.rho, 1.15, 1e-10));
        assert!(approx_eq_eps(f.right.rho, 1.15, 1e-10));
    }

    #[test]
    fn test_first_order_keeps_cell_values() {
        let cells: Vec<_> = (0..4).map(|i| prim(1.0 + 0.1 * i as f64, 0.0, 1.0)).collect();
        let f = reconstruct_face(
            &cells[0],
            &cells[1],
            &cells[2],
            &cells[3],
            SlopeLimiter::FirstOrder,
        )
        .unwrap();
        assert_eq!(f.left.rho, cells[1].rho);
        assert_eq!(f.right.rho, cells[2].rho);
    }

    #[test]
    fn test_shock_no_overshoot_minmod() {
        // 间断两侧限制器不得产生新的极值
        let f = reconstruct_face(
            &prim(1.0, 0.0, 1.0),
            &prim(1.0, 0.0, 1.0),
            &prim(0.125, 0.0, 0.1),
            &prim(0.125, 0.0, 0.1),
            SlopeLimiter::Minmod,
        )
        .unwrap();
        assert!(f.left.rho <= 1.0 + 1e-14);
        assert!(f.right.rho >= 0.125 - 1e-14);
    }

    #[test]
    fn test_steep_gradient_stays_physical() {
        // 限制器保证正数据的界面状态为正（修复路径是安全网）
        let f = reconstruct_face(
            &prim(1.0, 0.0, 10.0),
            &prim(1.0, 0.0, 1.0e-3),
            &prim(1.0, 0.0, 5.0),
            &prim(1.0, 0.0, 5.0),
            SlopeLimiter::Minmod,
        )
        .unwrap();
        assert!(f.left.is_physical());
        assert!(f.right.is_physical());
    }

    #[test]
    fn test_nonphysical_cell_fails_reconstruction() {
        // 单元状态本身非物理：一阶退化也救不回 → None
        let bad = prim(-1.0, 0.0, 1.0);
        assert!(reconstruct_face(&bad, &bad, &bad, &bad, SlopeLimiter::FirstOrder).is_none());
    }
}
