// crates/ae_physics/src/lib.rs

//! Aerion 核心 (Layer 3)
//!
//! 结构化多块可压缩 Navier-Stokes 有限体积求解器：
//!
//! - 幽灵晕圈块存储（[`array3d`]）与单元中心几何（[`geometry`]）
//! - MUSCL 重构 + Roe 通量 + Green-Gauss 梯度 + 黏性通量
//!   （[`numerics`]、[`schemes`]）
//! - k-ω 族湍流闭合（[`turbulence`]）与壁距预计算（[`walldist`]）
//! - 边界条件与块间点匹配补丁（[`boundary`]、[`patch`]）
//! - 块分解/重组（[`decomp`]）与幽灵交换（[`exchange`]）
//! - 显式/隐式时间积分驱动（[`engine`]）
//!
//! 全部内部运算使用无量纲 frame（见 [`thermo`]）。

pub mod array3d;
pub mod block;
pub mod boundary;
pub mod decomp;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod geometry;
pub mod numerics;
pub mod patch;
pub mod schemes;
pub mod state;
pub mod thermo;
pub mod turbulence;
pub mod walldist;

pub use array3d::{Array3D, Array3View, Array3ViewMut};
pub use block::{ProcBlock, RhsContext, RhsStats, DEFAULT_GHOSTS, FAR_WALL_DIST};
pub use boundary::{BcKind, BlockBoundaryConditions, BoundarySurface, GhostContext};
pub use decomp::{
    decompose, pair_interblock_patches, recombine, split_block_number, Decomposition, Split,
};
pub use engine::{ResidualHistory, Solver, StepReport};
pub use error::{NumericalError, SolverError, SolverResult, TransientError};
pub use exchange::{
    exchange_ghosts, reduce_min_dt, reduce_residuals, ResidualLinf, ResidualNorms,
};
pub use geometry::{BlockGeometry, GridBlock};
pub use patch::{InterblockPatch, Orientation, PatchSide};
pub use state::{
    ConservedState, EqnVec, PrimitiveState, EQ_ENERGY, EQ_MASS, EQ_MOM_X, EQ_MOM_Y, EQ_MOM_Z,
    EQ_SDR, EQ_TKE, NUM_EQNS, NUM_EQNS_LAMINAR,
};
pub use thermo::{IdealGas, Sutherland, Thermodynamics};
pub use turbulence::TurbulenceModel;
pub use walldist::compute_wall_distances;
