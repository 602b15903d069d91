// crates/ae_config/src/lib.rs

//! Aerion 配置层 (Layer 2)
//!
//! 输入卡的加载、默认值与校验。上层通过 [`SolverConfig`] 拿到
//! 一份填充完整的配置记录，配置错误全部在启动阶段暴露。

pub mod error;
pub mod solver_config;

pub use error::ConfigError;
pub use solver_config::{
    EquationSet, Integrator, LimiterKind, LinearSolverConfig, OutputConfig, ReferenceConfig,
    SchemeConfig, SolverConfig, TimeConfig, TurbulenceConfig, TurbulenceKind, WallTreatment,
    RECOGNIZED_VARIABLES,
};
pub use solver_config::FluidConfig;
