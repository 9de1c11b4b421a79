//! Codec 错误类型定义

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unsupported column {column}: {data_type}")]
    UnsupportedColumn { column: String, data_type: String },

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Unexpected end of stream")]
    EndOfStream,

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid type '{type_name}': {reason}")]
    InvalidType { type_name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Column {column} ({data_type}): {source}")]
    Column {
        column: String,
        data_type: String,
        #[source]
        source: Box<CodecError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub fn out_of_range(what: impl std::fmt::Display, value: impl std::fmt::Display) -> Self {
        CodecError::OutOfRange(format!("{} out of range: {}", what, value))
    }

    pub fn mismatch(expected: &str, value: &crate::core::value::Value) -> Self {
        CodecError::TypeMismatch(format!("expected {}, got {}", expected, value.type_label()))
    }

    /// 附加列名与类型，已附加过的错误保持不变
    pub fn in_column(self, column: &str, data_type: &str) -> Self {
        match self {
            e @ CodecError::Column { .. } => e,
            e @ CodecError::UnsupportedColumn { .. } => e,
            e => CodecError::Column {
                column: column.to_string(),
                data_type: data_type.to_string(),
                source: Box::new(e),
            },
        }
    }

    /// 剥去列上下文后的原始错误
    pub fn root(&self) -> &CodecError {
        match self {
            CodecError::Column { source, .. } => source.root(),
            e => e,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        match self.root() {
            CodecError::EndOfStream => true,
            CodecError::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
pub type CodecResult<T> = std::result::Result<T, CodecError>;
