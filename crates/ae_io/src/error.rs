// crates/ae_io/src/error.rs

//! IO 层错误类型
//!
//! 输出文件无处落地即致命（计算结果没有去处），不做静默回退。

/// IO 错误
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// 底层 IO 失败
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 网格文件格式错误
    #[error("网格文件格式错误: {0}")]
    GridFormat(String),

    /// 边界条件文件格式错误
    #[error("边界条件文件 {line} 行: {message}")]
    BcFormat {
        /// 行号（1 起）
        line: usize,
        /// 错误说明
        message: String,
    },

    /// 求解器层错误透传
    #[error(transparent)]
    Solver(#[from] ae_physics::SolverError),
}

impl IoError {
    /// 创建网格格式错误
    pub fn grid_format(message: impl Into<String>) -> Self {
        Self::GridFormat(message.into())
    }

    /// 创建 BC 格式错误
    pub fn bc_format(line: usize, message: impl Into<String>) -> Self {
        Self::BcFormat {
            line,
            message: message.into(),
        }
    }
}

/// IO 统一结果类型
pub type IoResult<T> = Result<T, IoError>;
