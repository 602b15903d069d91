// crates/ae_io/src/lib.rs

//! Aerion IO 层 (Layer 4)
//!
//! - [`plot3d`]: PLOT3D 多块二进制网格读入
//! - [`bc_file`]: 边界条件描述文件（ASCII）读入
//! - [`output`]: 单元中心网格/函数文件/结果索引输出与残差日志

pub mod bc_file;
pub mod error;
pub mod output;
pub mod plot3d;

pub use bc_file::{parse_bc_input, read_bc_file, BcInput};
pub use error::{IoError, IoResult};
pub use output::{
    format_residual_header, format_residual_row, write_cell_center_file, write_function_file,
    write_results_file, ReferenceScales, ResidualLog,
};
pub use plot3d::{read_grid, write_grid};
