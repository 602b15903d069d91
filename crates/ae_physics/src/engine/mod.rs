// crates/ae_physics/src/engine/mod.rs

//! 时间积分引擎
//!
//! - [`driver`]: 外层/内层迭代循环、CFL 爬升、步长拒绝重试
//! - [`lusgs`]: LU-SGS 隐式更新
//! - [`residual`]: 残差归一化参考值（L2_ref）跟踪

pub mod driver;
pub mod lusgs;
pub mod residual;

pub use driver::{Solver, StepReport};
pub use residual::ResidualHistory;
