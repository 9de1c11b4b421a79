//! Value 模块 - 列值类型系统
//!
//! 此模块提供编解码器读写的值单元，包括：
//! - 核心值枚举 (`types.rs`)
//! - 定点小数 (`decimal.rs`)
//! - 256 位无符号整数 (`wide_int.rs`)
//! - 地理空间类型 (`geography.rs`)
//! - groupBitmap 聚合状态 (`bitmap.rs`)
//! - 类型转换 (`conversion.rs`)

pub mod bitmap;
pub mod conversion;
pub mod decimal;
pub mod geography;
pub mod types;
pub mod wide_int;

pub use arrow_buffer::i256;
pub use bitmap::Bitmap;
pub use decimal::DecimalValue;
pub use geography::{MultiPolygon, Point, Polygon, Ring};
pub use types::Value;
pub use wide_int::U256;
