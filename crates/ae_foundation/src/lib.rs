// crates/ae_foundation/src/lib.rs

//! Aerion 基础层 (Layer 1)
//!
//! 提供整个工作区共享的基础设施：
//! - [`error`]: 基础错误类型 [`AeError`] 与统一结果别名 [`AeResult`]
//! - [`tolerance`]: 数值容差常量与浮点比较辅助函数
//!
//! 本层禁止引入任何求解器、网格或 IO 领域概念，
//! 也不依赖工作区内其他 crate。

pub mod error;
pub mod tolerance;

pub use error::{AeError, AeResult};
pub use tolerance::{
    approx_eq, approx_eq_eps, approx_eq_rel, EPS_GEOMETRY, EPS_RESIDUAL, EPS_STATE,
};
