// crates/ae_physics/src/engine/residual.rs

//! 残差归一化参考值跟踪
//!
//! 报告的归一化残差为 (L2 + ε)/(L2_ref + ε)。L2_ref 取重置窗口
//! 内（默认前 5 个外层迭代）各方程 L2 的运行最大值，窗口外
//! 保持不变。从收敛解重启时首个归一化 L2 因此 ≤ 1。

use crate::state::{EqnVec, NUM_EQNS};
use ae_foundation::EPS_RESIDUAL;

/// L2_ref 跟踪器
#[derive(Debug, Clone)]
pub struct ResidualHistory {
    l2_ref: EqnVec,
    /// 重置窗口（外层迭代数，可配置）
    window: usize,
    initialized: bool,
}

impl ResidualHistory {
    /// 创建跟踪器
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            l2_ref: EqnVec::ZERO,
            window,
            initialized: false,
        }
    }

    /// 更新参考值并返回归一化残差
    ///
    /// 仅在每个外层迭代的首个非线性子迭代（`inner == 0`）更新
    /// 参考值；窗口内取运行最大。
    pub fn normalize(&mut self, outer: usize, inner: usize, l2: &EqnVec) -> EqnVec {
        if inner == 0 {
            if !self.initialized {
                self.l2_ref = *l2;
                self.initialized = true;
            } else if outer < self.window {
                self.l2_ref = self.l2_ref.max(l2);
            }
        }

        let mut out = EqnVec::ZERO;
        for eq in 0..NUM_EQNS {
            out[eq] = (l2[eq] + EPS_RESIDUAL) / (self.l2_ref[eq] + EPS_RESIDUAL);
        }
        out
    }

    /// 当前参考值
    #[must_use]
    pub fn l2_ref(&self) -> &EqnVec {
        &self.l2_ref
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(v: f64) -> EqnVec {
        EqnVec::splat(v)
    }

    #[test]
    fn test_first_iteration_normalizes_to_one() {
        let mut h = ResidualHistory::new(5);
        let norm = h.normalize(0, 0, &vec_of(3.0));
        assert!((norm[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_takes_running_max() {
        let mut h = ResidualHistory::new(5);
        h.normalize(0, 0, &vec_of(1.0));
        // 窗口内更大的残差抬高参考值
        h.normalize(2, 0, &vec_of(4.0));
        let norm = h.normalize(3, 0, &vec_of(2.0));
        assert!((norm[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_outside_window_frozen() {
        let mut h = ResidualHistory::new(5);
        h.normalize(0, 0, &vec_of(1.0));
        // 窗口外不再抬高
        h.normalize(7, 0, &vec_of(10.0));
        let norm = h.normalize(8, 0, &vec_of(1.0));
        assert!((norm[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inner_iterations_do_not_reset() {
        let mut h = ResidualHistory::new(5);
        h.normalize(0, 0, &vec_of(1.0));
        h.normalize(1, 3, &vec_of(100.0));
        let norm = h.normalize(2, 0, &vec_of(1.0));
        assert!((norm[0] - 1.0).abs() < 1e-12);
    }

    /// 性质 8：从收敛解重启，首个归一化 L2 ≤ 1
    #[test]
    fn test_restart_from_converged_bounded() {
        let mut h = ResidualHistory::new(5);
        let tiny = vec_of(1.0e-14);
        let norm = h.normalize(0, 0, &tiny);
        assert!(norm[0] <= 1.0 + 1e-12);
    }

    #[test]
    fn test_configurable_window() {
        let mut h = ResidualHistory::new(2);
        h.normalize(0, 0, &vec_of(1.0));
        // 窗口 2：第 2 个外层迭代已冻结
        h.normalize(2, 0, &vec_of(10.0));
        let norm = h.normalize(3, 0, &vec_of(1.0));
        assert!((norm[0] - 1.0).abs() < 1e-12);
    }
}
