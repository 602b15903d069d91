// crates/ae_physics/src/boundary/mod.rs

//! 边界条件
//!
//! - [`types`]: 边界面记录与块边界条件列表（拆分/合并支持）
//! - [`ghost`]: 各类边界的幽灵状态规则

pub mod ghost;
pub mod types;

pub use ghost::{ghost_state, GhostContext};
pub use types::{BcKind, BlockBoundaryConditions, BoundarySurface};
