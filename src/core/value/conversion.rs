use std::net::{Ipv4Addr, Ipv6Addr};

use arrow_buffer::i256;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use super::bitmap::Bitmap;
use super::decimal::DecimalValue;
use super::geography::Point;
use super::types::Value;
use super::wide_int::U256;

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from!(
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    i128 => Int128,
    i256 => Int256,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    u128 => UInt128,
    U256 => UInt256,
    f32 => Float32,
    f64 => Float64,
    DecimalValue => Decimal,
    String => String,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    Uuid => Uuid,
    Ipv4Addr => Ipv4,
    Ipv6Addr => Ipv6,
    Point => Point,
    Bitmap => Bitmap,
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl Value {
    /// 任意整数值统一提升为 `i256`，超出 `i256` 的 UInt256 返回 `None`
    pub fn to_i256(&self) -> Option<i256> {
        let v = match self {
            Value::Int8(v) => i256::from_i128(*v as i128),
            Value::Int16(v) => i256::from_i128(*v as i128),
            Value::Int32(v) => i256::from_i128(*v as i128),
            Value::Int64(v) => i256::from_i128(*v as i128),
            Value::Int128(v) => i256::from_i128(*v),
            Value::Int256(v) => *v,
            Value::UInt8(v) => i256::from_i128(*v as i128),
            Value::UInt16(v) => i256::from_i128(*v as i128),
            Value::UInt32(v) => i256::from_i128(*v as i128),
            Value::UInt64(v) => i256::from_i128(*v as i128),
            Value::UInt128(v) => i256::from_parts(*v, 0),
            Value::UInt256(v) => return v.to_i256(),
            _ => return None,
        };
        Some(v)
    }

    /// 非负整数值转换为 `U256`
    pub fn to_u256(&self) -> Option<U256> {
        match self {
            Value::UInt256(v) => Some(*v),
            other => other.to_i256().and_then(U256::from_i256),
        }
    }

    pub fn to_i128(&self) -> Option<i128> {
        self.to_i256().and_then(|v| v.to_i128())
    }

    pub fn to_u128(&self) -> Option<u128> {
        let v = self.to_i256()?;
        let (low, high) = v.to_parts();
        if high == 0 {
            Some(low)
        } else {
            None
        }
    }

    /// 浮点值，整数按 `as` 语义转换
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::Decimal(d) => d.to_string().parse().ok(),
            other => other.to_i128().map(|v| v as f64),
        }
    }

    /// 小数值，整数按 0 位小数处理，字符串和浮点数按十进制文本解析
    pub fn to_decimal(&self) -> Option<DecimalValue> {
        match self {
            Value::Decimal(d) => Some(*d),
            Value::String(s) => s.parse().ok(),
            Value::Float32(v) => v.to_string().parse().ok(),
            Value::Float64(v) => v.to_string().parse().ok(),
            other => other.to_i256().map(|v| DecimalValue::new(v, 0)),
        }
    }
}
