//! 列描述符与类型字符串
//!
//! - `data_type.rs`：数据类型标签及渲染
//! - `column.rs`：列描述符（名称、类型、可空标记）
//! - `parser.rs`：类型字符串解析

pub mod column;
pub mod data_type;
pub mod parser;

pub use column::Column;
pub use data_type::{
    DataType, DecimalWidth, IntervalUnit, DATETIME64_MAX_SCALE, DECIMAL128_MAX_PRECISION,
    DECIMAL256_MAX_PRECISION, DECIMAL32_MAX_PRECISION, DECIMAL64_MAX_PRECISION,
};
pub use parser::TypeParser;
