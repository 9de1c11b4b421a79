//! Codec 模块 - 按类型驱动的二进制编解码
//!
//! 行格式与列式格式共用的编码规则：变长整数、最宽 256 位的定长整数、定点小数、
//! 带时区的日期时间、字典编码的低基数列，以及可任意嵌套的复合类型。
//!
//! ## 架构
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │            codec::mod.rs            │
//! │       模块入口和公共类型导出         │
//! └─────────────────────────────────────┘
//!              │
//!    ┌─────────┼─────────┬──────────┐
//!    ▼         ▼         ▼          ▼
//! ┌──────┐ ┌────────┐ ┌─────────┐ ┌──────────┐
//! │error │ │stream  │ │varint   │ │cache     │
//! │      │ │        │ │         │ │          │
//! └──────┘ └────────┘ └─────────┘ └──────────┘
//!                    │
//!         ┌──────────┼──────────┐
//!         ▼          ▼          ▼
//!    ┌─────────┐ ┌────────┐ ┌───────────────┐
//!    │primitive│ │temporal│ │low_cardinality│
//!    └─────────┘ └────────┘ └───────────────┘
//!                    │
//!                    ▼
//!              ┌───────────┐
//!              │ composite │  Codec / CodecBuilder
//!              └───────────┘
//! ```
//!
//! ## 使用示例
//!
//! ```
//! use chcodec::core::codec::{ByteReader, ByteWriter, CodecBuilder};
//! use chcodec::core::types::Column;
//! use chcodec::core::value::Value;
//!
//! let column = Column::parse("tags", "Array(Int8)").unwrap();
//! let codec = CodecBuilder::default().build(&column).unwrap();
//!
//! let mut output = ByteWriter::new(Vec::new());
//! let value = Value::Array(vec![Value::Int8(1), Value::Int8(-2), Value::Int8(3)]);
//! codec.encode(&value, &mut output).unwrap();
//! let bytes = output.into_inner();
//! assert_eq!(bytes, vec![0x03, 0x01, 0xFE, 0x03]);
//!
//! let mut cell = Value::Null;
//! codec.decode(&mut cell, &mut ByteReader::new(&bytes[..])).unwrap();
//! assert_eq!(cell, value);
//! ```

pub mod cache;
pub mod composite;
pub mod error;
pub mod low_cardinality;
pub mod primitive;
pub mod stream;
pub mod temporal;
pub mod varint;

pub use cache::CodecCache;
pub use composite::{ArrayCodec, Codec, CodecBuilder, LengthMode, VariantCodec};
pub use error::{CodecError, CodecResult, Result};
pub use low_cardinality::LowCardinalityCodec;
pub use primitive::{DecimalCodec, IntKind, PrimitiveCodec};
pub use stream::{ByteReader, ByteWriter};
pub use temporal::{TemporalCodec, TemporalKind};
