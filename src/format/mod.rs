//! 格式驱动
//!
//! 把列编解码器按行（RowBinary 系列）或按块（Native）依次作用于字节流。
//! `open_reader` / `open_writer` 按 [`CodecConfig::format`] 选择驱动。

pub mod native;
pub mod row_binary;

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::CodecConfig;
use crate::core::codec::{CodecError, CodecResult};
use crate::core::types::Column;
use crate::core::value::Value;

pub use native::{Block, ColumnCodec, NativeReader, NativeWriter};
pub use row_binary::{RowBinaryReader, RowBinaryWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    #[default]
    RowBinary,
    RowBinaryWithNames,
    RowBinaryWithNamesAndTypes,
    Native,
}

impl Format {
    pub fn name(self) -> &'static str {
        match self {
            Format::RowBinary => "RowBinary",
            Format::RowBinaryWithNames => "RowBinaryWithNames",
            Format::RowBinaryWithNamesAndTypes => "RowBinaryWithNamesAndTypes",
            Format::Native => "Native",
        }
    }

    /// 流头部是否带列名
    pub fn has_names(self) -> bool {
        matches!(self, Format::RowBinaryWithNames | Format::RowBinaryWithNamesAndTypes)
    }

    /// 流头部是否带列类型
    pub fn has_types(self) -> bool {
        matches!(self, Format::RowBinaryWithNamesAndTypes)
    }

    pub fn is_row_binary(self) -> bool {
        !matches!(self, Format::Native)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Format::RowBinary,
            Format::RowBinaryWithNames,
            Format::RowBinaryWithNamesAndTypes,
            Format::Native,
        ]
        .into_iter()
        .find(|f| f.name().eq_ignore_ascii_case(s))
        .ok_or_else(|| CodecError::Unsupported(format!("format {}", s)))
    }
}

/// 按行读取记录
pub trait RecordReader {
    /// 流中的列描述；带头部的格式会先读取头部
    fn read_columns(&mut self) -> CodecResult<&[Column]>;

    fn has_more_rows(&mut self) -> CodecResult<bool>;

    /// 读取下一行到驱动持有的单元格中并返回它们，单元格在行间复用
    fn read_row(&mut self) -> CodecResult<&[Value]>;

    /// 已读取的行数
    fn rows_read(&self) -> u64;
}

/// 按行写入记录
pub trait RecordWriter {
    fn columns(&self) -> &[Column];

    /// 写入当前行的下一列
    fn write_value(&mut self, value: &Value) -> CodecResult<()>;

    fn write_row(&mut self, row: &[Value]) -> CodecResult<()> {
        if row.len() != self.columns().len() {
            return Err(CodecError::Protocol(format!(
                "Expect {} values but got {}",
                self.columns().len(),
                row.len()
            )));
        }
        for value in row {
            self.write_value(value)?;
        }
        Ok(())
    }

    /// 写出缓冲的数据并刷新底层输出
    fn finish(&mut self) -> CodecResult<()>;

    fn rows_written(&self) -> u64;
}

/// 按配置打开读取驱动
///
/// `RowBinary` 和 `RowBinaryWithNames` 的流中没有类型信息，必须提供 `columns`；
/// 其余格式从流头部读取列描述，忽略传入的 `columns`。
pub fn open_reader<'a, R: Read + 'a>(
    config: &CodecConfig,
    input: R,
    columns: Option<Vec<Column>>,
) -> CodecResult<Box<dyn RecordReader + 'a>> {
    config.validate()?;
    log::debug!("opening {} reader", config.format);
    Ok(match config.format {
        Format::Native => Box::new(NativeReader::new(config, input)?),
        _ => Box::new(RowBinaryReader::new(config, input, columns)?),
    })
}

pub fn open_writer<'a, W: Write + 'a>(
    config: &CodecConfig,
    output: W,
    columns: Vec<Column>,
) -> CodecResult<Box<dyn RecordWriter + 'a>> {
    config.validate()?;
    log::debug!("opening {} writer for {} columns", config.format, columns.len());
    Ok(match config.format {
        Format::Native => Box::new(NativeWriter::new(config, output, columns)?),
        _ => Box::new(RowBinaryWriter::new(config, output, columns)?),
    })
}
