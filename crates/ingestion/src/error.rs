//! Ingestion 错误类型

use contracts::ContractError;
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 文件读取失败
    #[error("failed to read {file}: {source}")]
    Io {
        /// 文件名
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// 分隔文本解析失败
    #[error("failed to parse {file}: {message}")]
    ParseFailed {
        /// 文件名
        file: String,
        /// 错误消息
        message: String,
    },

    /// 文件没有任何通道
    #[error("{file} has no channels")]
    NoChannels {
        /// 文件名
        file: String,
    },

    /// 内存读取器中不存在该表
    #[error("no table registered for {file}")]
    UnknownTable {
        /// 文件名
        file: String,
    },

    /// 没有输入文件
    #[error("no input files")]
    NoFiles,
}

impl IngestionError {
    /// 对应的文件名 (若有)
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::Io { file, .. }
            | Self::ParseFailed { file, .. }
            | Self::NoChannels { file }
            | Self::UnknownTable { file } => Some(file),
            Self::NoFiles => None,
        }
    }
}

impl From<IngestionError> for ContractError {
    fn from(err: IngestionError) -> Self {
        match err.file() {
            Some(file) => ContractError::source_read(file.to_string(), err.to_string()),
            None => ContractError::Other(err.to_string()),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
