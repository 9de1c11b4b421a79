use std::net::{Ipv4Addr, Ipv6Addr};

use arrow_buffer::i256;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use super::bitmap::Bitmap;
use super::decimal::DecimalValue;
use super::geography::{MultiPolygon, Point, Polygon, Ring};
use super::wide_int::U256;

/// 列值单元
///
/// 解码时由驱动按列持有并原地覆盖，数组类单元复用已有的 `Vec` 存储。
/// `Null` 同时充当可空列的空值和 `Nothing` 列的占位值。
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    Int256(i256),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    UInt256(U256),
    Float32(f32),
    Float64(f64),
    Decimal(DecimalValue),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Point(Point),
    Ring(Ring),
    Polygon(Polygon),
    MultiPolygon(MultiPolygon),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    /// 保持插入顺序的键值对
    Map(Vec<(Value, Value)>),
    Bitmap(Bitmap),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// 值的类型名称，用于错误消息
    pub fn type_label(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int8(_) => "Int8",
            Value::Int16(_) => "Int16",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::Int128(_) => "Int128",
            Value::Int256(_) => "Int256",
            Value::UInt8(_) => "UInt8",
            Value::UInt16(_) => "UInt16",
            Value::UInt32(_) => "UInt32",
            Value::UInt64(_) => "UInt64",
            Value::UInt128(_) => "UInt128",
            Value::UInt256(_) => "UInt256",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::Decimal(_) => "Decimal",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "DateTime",
            Value::Uuid(_) => "UUID",
            Value::Ipv4(_) => "IPv4",
            Value::Ipv6(_) => "IPv6",
            Value::Point(_) => "Point",
            Value::Ring(_) => "Ring",
            Value::Polygon(_) => "Polygon",
            Value::MultiPolygon(_) => "MultiPolygon",
            Value::Array(_) => "Array",
            Value::Tuple(_) => "Tuple",
            Value::Map(_) => "Map",
            Value::Bitmap(_) => "Bitmap",
        }
    }

    /// 将单元准备为数组并返回其存储，原本就是数组时沿用已有分配
    ///
    /// 不调整长度：元素个数来自流，由解码端边读边填充。
    pub fn array_storage(&mut self) -> &mut Vec<Value> {
        if !matches!(self, Value::Array(_)) {
            *self = Value::Array(Vec::new());
        }
        match self {
            Value::Array(items) => items,
            _ => unreachable!("cell was just turned into an array"),
        }
    }

    /// 与 `array_storage` 相同，但面向映射单元
    pub fn map_storage(&mut self) -> &mut Vec<(Value, Value)> {
        if !matches!(self, Value::Map(_)) {
            *self = Value::Map(Vec::new());
        }
        match self {
            Value::Map(pairs) => pairs,
            _ => unreachable!("cell was just turned into a map"),
        }
    }

    /// 将单元准备为 `len` 个元素的元组，元组宽度来自列类型
    ///
    /// 保留下来的元素由调用方逐个覆盖。
    pub fn allocate_tuple(&mut self, len: usize) -> &mut Vec<Value> {
        if !matches!(self, Value::Tuple(_)) {
            *self = Value::Tuple(Vec::with_capacity(len));
        }
        match self {
            Value::Tuple(items) => {
                items.truncate(len);
                items.resize(len, Value::Null);
                items
            }
            _ => unreachable!("cell was just turned into a tuple"),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// 字符串或字节串的原始字节
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s.as_bytes()),
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::Int8(_)
                | Value::Int16(_)
                | Value::Int32(_)
                | Value::Int64(_)
                | Value::Int128(_)
                | Value::Int256(_)
                | Value::UInt8(_)
                | Value::UInt16(_)
                | Value::UInt32(_)
                | Value::UInt64(_)
                | Value::UInt128(_)
                | Value::UInt256(_)
        )
    }
}
