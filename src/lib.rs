//! chcodec - ClickHouse RowBinary/Native 二进制编解码
//!
//! 按列类型描述构造编解码器，在行格式（RowBinary 系列）与列式块格式（Native）
//! 之间读写值：变长整数、最宽 256 位的整数、定点小数、带时区的日期时间、
//! 低基数字典列以及任意嵌套的数组、元组、映射、嵌套与变体类型。

pub mod config;
pub mod core;
pub mod format;
pub mod utils;

pub use crate::config::{CodecConfig, Config};
pub use crate::core::{Codec, CodecBuilder, CodecError, CodecResult, Column, DataType, Value};
pub use crate::format::{open_reader, open_writer, Format, RecordReader, RecordWriter};
