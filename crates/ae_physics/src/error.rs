// crates/ae_physics/src/error.rs

//! 求解器层错误类型
//!
//! 错误策略：任何 rank 上的错误都会变为全局错误并走集体中止路径，
//! 不允许静默回退。唯一允许恢复的组件是时间积分器
//! （通过步长拒绝重试），其余组件一律向上传播。

use ae_foundation::AeError;

/// 求解器统一结果类型
pub type SolverResult<T> = Result<T, SolverError>;

/// 数值错误
///
/// 由内核计算产生，积分器据此决定降 CFL 重试还是放弃。
/// 重试预算耗尽后升级为致命错误，倾倒最后一个完好解。
#[derive(Debug, thiserror::Error)]
pub enum NumericalError {
    /// 更新后的状态违反正性（ρ、p 或 T 非正）
    #[error("非正状态: 块{block} 单元({i},{j},{k}) ρ={rho:.3e} p={p:.3e}")]
    NonPositiveState {
        /// 块编号
        block: usize,
        /// 单元 i 索引（内部相对）
        i: usize,
        /// 单元 j 索引
        j: usize,
        /// 单元 k 索引
        k: usize,
        /// 违反时的密度
        rho: f64,
        /// 违反时的压力
        p: f64,
    },

    /// 面重构失败：退化到一阶后界面状态仍非正
    #[error("重构失败: 块{block} 方向{dir} 面({i},{j},{k})")]
    ReconstructionFailure {
        /// 块编号
        block: usize,
        /// 面方向 (0=i, 1=j, 2=k)
        dir: usize,
        /// 面 i 索引
        i: usize,
        /// 面 j 索引
        j: usize,
        /// 面 k 索引
        k: usize,
    },

    /// 线性求解发散
    #[error("线性求解发散: 扫掠{sweeps}次后相对残差 {residual:.3e}")]
    LinearSolveDivergence {
        /// 已执行扫掠数
        sweeps: usize,
        /// 最终相对线性残差
        residual: f64,
    },
}

/// 并行交换瞬态错误
///
/// 交换层内部有界重试，超限后升级为致命。
#[derive(Debug, thiserror::Error)]
pub enum TransientError {
    /// 幽灵消息缺失
    #[error("幽灵消息丢失: 目标块{block} 边界面{boundary}")]
    MessageLost {
        /// 目标块编号
        block: usize,
        /// 目标边界面编号
        boundary: usize,
    },

    /// 交换超时
    #[error("幽灵交换超时: 第{iteration}次迭代")]
    Timeout {
        /// 发生超时的迭代
        iteration: usize,
    },
}

/// 求解器层错误
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// 网格错误：块尺寸不一致、负体积、退化面等，致命
    #[error("网格错误: {0}")]
    Grid(String),

    /// 数值错误，积分器可通过步长拒绝恢复
    #[error("数值错误: {0}")]
    Numerical(#[from] NumericalError),

    /// 并行交换瞬态错误
    #[error("交换错误: {0}")]
    Transient(#[from] TransientError),

    /// 基础层错误
    #[error(transparent)]
    Foundation(#[from] AeError),
}

impl SolverError {
    /// 创建网格错误
    pub fn grid(message: impl Into<String>) -> Self {
        Self::Grid(message.into())
    }

    /// 该错误是否允许积分器降 CFL 重试
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Numerical(
                NumericalError::NonPositiveState { .. }
                    | NumericalError::ReconstructionFailure { .. }
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numerical_recoverable() {
        let err: SolverError = NumericalError::NonPositiveState {
            block: 0,
            i: 1,
            j: 2,
            k: 3,
            rho: -1.0e-8,
            p: 0.5,
        }
        .into();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_grid_fatal() {
        let err = SolverError::grid("块 3 单元 (4,5,6) 体积为负");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("体积为负"));
    }

    #[test]
    fn test_divergence_not_recoverable() {
        let err: SolverError = NumericalError::LinearSolveDivergence {
            sweeps: 8,
            residual: 2.4,
        }
        .into();
        assert!(!err.is_recoverable());
    }
}
