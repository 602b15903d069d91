// crates/ae_foundation/src/error.rs

//! 基础错误类型
//!
//! 定义整个项目的基础错误类型，仅包含与基础设施相关的错误。
//! 本模块是 Layer 1 的核心组件，禁止引入任何求解器或网格领域概念。
//!
//! # 错误分层
//!
//! ```text
//! 求解器错误 (ae_physics::SolverError)
//!        ↓ (转换)
//! IO 错误 (ae_io::IoError) / 配置错误 (ae_config::ConfigError)
//!        ↓ (转换)
//! 基础错误 ← 你在这里 (ae_foundation::AeError)
//! ```

use std::{fmt, io, path::PathBuf};

/// 统一结果类型别名
///
/// 等价于 `Result<T, AeError>`，用于简化函数签名。
pub type AeResult<T> = Result<T, AeError>;

/// Foundation 层基础错误
///
/// 包含所有基础设施级别的错误，是错误体系的根基。
/// 高层错误通过转换为 [`AeError::Internal`] 或具体的基础错误向下兼容。
#[derive(Debug)]
pub enum AeError {
    /// IO 操作失败
    Io {
        /// 描述性错误信息
        message: String,
        /// 底层 IO 错误源
        source: Option<io::Error>,
    },

    /// 文件不存在
    FileNotFound {
        /// 未找到的文件路径
        path: PathBuf,
    },

    /// 数组或集合大小不匹配
    ///
    /// 在需要严格大小一致性的操作中触发（如同形数组相加）。
    SizeMismatch {
        /// 数据名称（用于调试）
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引访问越界
    IndexOutOfBounds {
        /// 索引类别（如 "Cell", "Block"）
        index_type: &'static str,
        /// 访问的索引值
        index: usize,
        /// 容器长度（上界）
        len: usize,
    },

    /// 输入数据验证失败
    ///
    /// 用于参数校验、前置条件检查等场景。
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 内部实现错误
    ///
    /// 当程序进入不应到达的状态时使用，通常表示不变量被破坏。
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ============================================================================
// 便捷构造方法
// ============================================================================

impl AeError {
    /// 创建 IO 错误
    #[inline]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带源的 IO 错误
    ///
    /// 当需要保留底层 [`std::io::Error`] 时使用。
    #[inline]
    pub fn io_with_source(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 创建文件未找到错误
    #[inline]
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 创建大小不匹配错误
    #[inline]
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 创建索引越界错误
    #[inline]
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 创建无效输入错误
    #[inline]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 创建内部错误
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ============================================================================
// 验证辅助方法
// ============================================================================

impl AeError {
    /// 验证数组大小是否匹配，不匹配则返回 [`AeError::SizeMismatch`]
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> AeResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 验证索引是否在有效范围内，越界则返回 [`AeError::IndexOutOfBounds`]
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> AeResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// 标准库错误转换实现
// ============================================================================

impl From<io::Error> for AeError {
    /// 将 [`std::io::Error`] 转换为 [`AeError::Io`]
    fn from(err: io::Error) -> Self {
        Self::io_with_source("IO 操作失败", err)
    }
}

// ============================================================================
// 核心 Trait 实现
// ============================================================================

impl fmt::Display for AeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { message, .. } => {
                write!(f, "IO错误: {}", message)
            }
            Self::FileNotFound { path } => {
                write!(f, "文件不存在: {}", path.display())
            }
            Self::SizeMismatch {
                name,
                expected,
                actual,
            } => {
                write!(f, "数组大小不匹配: {} 期望{}, 实际{}", name, expected, actual)
            }
            Self::IndexOutOfBounds {
                index_type,
                index,
                len,
            } => {
                write!(f, "索引越界: {} 索引{} 超出范围 0..{}", index_type, index, len)
            }
            Self::InvalidInput { message } => write!(f, "无效的输入数据: {}", message),
            Self::Internal { message } => write!(f, "内部错误: {}", message),
        }
    }
}

impl std::error::Error for AeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => source.as_ref().map(|e| e as _),
            _ => None,
        }
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_error_display() {
        let err = AeError::io("磁盘已满");
        assert!(err.to_string().contains("IO错误"));
    }

    #[test]
    fn test_io_error_with_source() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "文件未找到");
        let err = AeError::io_with_source("读取网格失败", io_err);
        assert!(err.to_string().contains("读取网格失败"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_file_not_found() {
        let err = AeError::file_not_found("/path/to/grid.xyz");
        assert!(err.to_string().contains("/path/to/grid.xyz"));
    }

    #[test]
    fn test_check_size() {
        assert!(AeError::check_size("residual", 7, 7).is_ok());
        let result = AeError::check_size("residual", 7, 5);
        assert!(matches!(result.unwrap_err(), AeError::SizeMismatch { .. }));
    }

    #[test]
    fn test_check_index() {
        assert!(AeError::check_index("Cell", 5, 10).is_ok());
        let result = AeError::check_index("Cell", 10, 10);
        assert!(matches!(
            result.unwrap_err(),
            AeError::IndexOutOfBounds { .. }
        ));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "无权限");
        let ae_err: AeError = io_err.into();
        assert!(matches!(ae_err, AeError::Io { .. }));
    }
}
