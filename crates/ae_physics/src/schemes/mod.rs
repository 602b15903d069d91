// crates/ae_physics/src/schemes/mod.rs

//! 面通量格式
//!
//! - [`roe`]: Roe 近似黎曼求解器（无黏通量）
//! - [`viscous`]: 面黏性应力与热流

pub mod roe;
pub mod viscous;

pub use roe::{RoeFlux, RoeFluxResult};
pub use viscous::{viscous_flux, FaceGradients, TurbDiffusion};
