//! 基础类型编解码
//!
//! 定长整数、浮点、布尔、字符串、UUID、IP 地址、枚举、地理类型和 groupBitmap 状态，
//! 以及按宽度缓存的小数编解码器。所有定长整数均为小端序。

use std::io::{Read, Write};
use std::net::{Ipv4Addr, Ipv6Addr};

use arrow_buffer::i256;
use uuid::Uuid;

use super::error::{CodecError, CodecResult};
use super::stream::{ByteReader, ByteWriter};
use crate::core::types::{DataType, DecimalWidth};
use crate::core::value::bitmap::SMALL_SET_MAX;
use crate::core::value::decimal::pow10;
use crate::core::value::{Bitmap, DecimalValue, Point, Polygon, Ring, Value, U256};

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// 定长整数种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    I128,
    I256,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
}

impl IntKind {
    pub fn from_data_type(data_type: &DataType) -> Option<Self> {
        Some(match data_type {
            DataType::Int8 => IntKind::I8,
            DataType::Int16 => IntKind::I16,
            DataType::Int32 => IntKind::I32,
            // 时间间隔在线上就是 Int64
            DataType::Int64 | DataType::Interval(_) => IntKind::I64,
            DataType::Int128 => IntKind::I128,
            DataType::Int256 => IntKind::I256,
            DataType::UInt8 => IntKind::U8,
            DataType::UInt16 => IntKind::U16,
            DataType::UInt32 => IntKind::U32,
            DataType::UInt64 => IntKind::U64,
            DataType::UInt128 => IntKind::U128,
            DataType::UInt256 => IntKind::U256,
            _ => return None,
        })
    }

    /// 能容纳 `count` 个字典项下标的最窄无符号类型
    pub fn index_for(count: usize) -> Self {
        if count <= 1 << 8 {
            IntKind::U8
        } else if count <= 1 << 16 {
            IntKind::U16
        } else if (count as u64) <= 1 << 32 {
            IntKind::U32
        } else {
            IntKind::U64
        }
    }

    pub fn byte_len(self) -> usize {
        match self {
            IntKind::I8 | IntKind::U8 => 1,
            IntKind::I16 | IntKind::U16 => 2,
            IntKind::I32 | IntKind::U32 => 4,
            IntKind::I64 | IntKind::U64 => 8,
            IntKind::I128 | IntKind::U128 => 16,
            IntKind::I256 | IntKind::U256 => 32,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64 | IntKind::I128 | IntKind::I256
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            IntKind::I8 => "Int8",
            IntKind::I16 => "Int16",
            IntKind::I32 => "Int32",
            IntKind::I64 => "Int64",
            IntKind::I128 => "Int128",
            IntKind::I256 => "Int256",
            IntKind::U8 => "UInt8",
            IntKind::U16 => "UInt16",
            IntKind::U32 => "UInt32",
            IntKind::U64 => "UInt64",
            IntKind::U128 => "UInt128",
            IntKind::U256 => "UInt256",
        }
    }

    fn bounds(self) -> (i256, i256) {
        let r = |lo: i128, hi: i128| (i256::from_i128(lo), i256::from_i128(hi));
        match self {
            IntKind::I8 => r(i8::MIN as i128, i8::MAX as i128),
            IntKind::I16 => r(i16::MIN as i128, i16::MAX as i128),
            IntKind::I32 => r(i32::MIN as i128, i32::MAX as i128),
            IntKind::I64 => r(i64::MIN as i128, i64::MAX as i128),
            IntKind::I128 => r(i128::MIN, i128::MAX),
            IntKind::U8 => r(0, u8::MAX as i128),
            IntKind::U16 => r(0, u16::MAX as i128),
            IntKind::U32 => r(0, u32::MAX as i128),
            IntKind::U64 => r(0, u64::MAX as i128),
            IntKind::U128 => (i256::ZERO, i256::from_parts(u128::MAX, 0)),
            IntKind::I256 | IntKind::U256 => (i256::MIN, i256::MAX),
        }
    }

    /// 从小端字节解码；`widen` 为真时 8/16/32 位无符号值提升为更宽的有符号类型
    pub fn decode_le(self, b: &[u8], widen: bool) -> Value {
        match self {
            IntKind::I8 => Value::Int8(b[0] as i8),
            IntKind::I16 => Value::Int16(i16::from_le_bytes(array(b))),
            IntKind::I32 => Value::Int32(i32::from_le_bytes(array(b))),
            IntKind::I64 => Value::Int64(i64::from_le_bytes(array(b))),
            IntKind::I128 => Value::Int128(i128::from_le_bytes(array(b))),
            IntKind::I256 => Value::Int256(i256::from_le_bytes(array(b))),
            IntKind::U8 if widen => Value::Int16(b[0] as i16),
            IntKind::U8 => Value::UInt8(b[0]),
            IntKind::U16 if widen => Value::Int32(u16::from_le_bytes(array(b)) as i32),
            IntKind::U16 => Value::UInt16(u16::from_le_bytes(array(b))),
            IntKind::U32 if widen => Value::Int64(u32::from_le_bytes(array(b)) as i64),
            IntKind::U32 => Value::UInt32(u32::from_le_bytes(array(b))),
            IntKind::U64 => Value::UInt64(u64::from_le_bytes(array(b))),
            IntKind::U128 => Value::UInt128(u128::from_le_bytes(array(b))),
            IntKind::U256 => Value::UInt256(U256::from_le_bytes(array(b))),
        }
    }

    /// 编码为 32 字节小端缓冲区，有效部分为前 `byte_len()` 个字节
    ///
    /// 任意整数值都可写入，超出目标宽度的值返回越界错误。
    pub fn encode_le(self, value: &Value) -> CodecResult<[u8; 32]> {
        if !value.is_integer() {
            return Err(CodecError::mismatch(self.name(), value));
        }
        if self == IntKind::U256 {
            return value
                .to_u256()
                .map(U256::to_le_bytes)
                .ok_or_else(|| CodecError::out_of_range(self.name(), display_int(value)));
        }
        let v = value
            .to_i256()
            .ok_or_else(|| CodecError::out_of_range(self.name(), display_int(value)))?;
        let (lo, hi) = self.bounds();
        if v < lo || v > hi {
            return Err(CodecError::out_of_range(self.name(), v));
        }
        Ok(v.to_le_bytes())
    }

    pub fn zero(self, widen: bool) -> Value {
        self.decode_le(&[0u8; 32], widen)
    }
}

fn display_int(value: &Value) -> String {
    match value {
        Value::UInt256(v) => v.to_string(),
        other => other.to_i256().map(|v| v.to_string()).unwrap_or_default(),
    }
}

/// 叶子类型编解码器
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveCodec {
    Bool,
    Int { kind: IntKind, widen: bool },
    Float32,
    Float64,
    String { binary: bool },
    FixedString { length: usize, binary: bool },
    Uuid,
    IPv4,
    IPv6,
    Enum8(Vec<(String, i8)>),
    Enum16(Vec<(String, i16)>),
    Point,
    Ring,
    Polygon,
    MultiPolygon,
    /// groupBitmap 聚合状态，`kind` 为位图元素类型
    Bitmap { kind: IntKind },
    Nothing,
}

impl PrimitiveCodec {
    /// 定长编码的字节数，变长类型返回 `None`
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            PrimitiveCodec::Bool => Some(1),
            PrimitiveCodec::Int { kind, .. } => Some(kind.byte_len()),
            PrimitiveCodec::Float32 | PrimitiveCodec::IPv4 => Some(4),
            PrimitiveCodec::Float64 => Some(8),
            PrimitiveCodec::FixedString { length, .. } => Some(*length),
            PrimitiveCodec::Uuid | PrimitiveCodec::IPv6 | PrimitiveCodec::Point => Some(16),
            PrimitiveCodec::Enum8(_) => Some(1),
            PrimitiveCodec::Enum16(_) => Some(2),
            _ => None,
        }
    }

    /// 从恰好 `fixed_width()` 个字节解码定长值
    pub fn decode_fixed(&self, b: &[u8]) -> CodecResult<Value> {
        Ok(match self {
            PrimitiveCodec::Bool => match b[0] {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => return Err(CodecError::out_of_range("boolean byte", other)),
            },
            PrimitiveCodec::Int { kind, widen } => kind.decode_le(b, *widen),
            PrimitiveCodec::Float32 => Value::Float32(f32::from_bits(u32::from_le_bytes(array(b)))),
            PrimitiveCodec::Float64 => Value::Float64(f64::from_bits(u64::from_le_bytes(array(b)))),
            PrimitiveCodec::FixedString { binary: true, .. } => Value::Bytes(b.to_vec()),
            PrimitiveCodec::FixedString { binary: false, .. } => {
                let end = b.iter().rposition(|&c| c != 0).map_or(0, |i| i + 1);
                Value::String(String::from_utf8_lossy(&b[..end]).into_owned())
            }
            PrimitiveCodec::Uuid => {
                let high = u64::from_le_bytes(array(&b[..8]));
                let low = u64::from_le_bytes(array(&b[8..]));
                Value::Uuid(Uuid::from_u64_pair(high, low))
            }
            PrimitiveCodec::IPv4 => Value::Ipv4(Ipv4Addr::from(u32::from_le_bytes(array(b)))),
            PrimitiveCodec::IPv6 => Value::Ipv6(Ipv6Addr::from(array::<16>(b))),
            PrimitiveCodec::Enum8(_) => Value::Int8(b[0] as i8),
            PrimitiveCodec::Enum16(_) => Value::Int16(i16::from_le_bytes(array(b))),
            PrimitiveCodec::Point => Value::Point(Point::new(
                f64::from_bits(u64::from_le_bytes(array(&b[..8]))),
                f64::from_bits(u64::from_le_bytes(array(&b[8..]))),
            )),
            other => {
                return Err(CodecError::Unsupported(format!(
                    "{:?} has no fixed-width encoding",
                    other
                )))
            }
        })
    }

    pub fn decode<R: Read>(&self, cell: &mut Value, input: &mut ByteReader<R>) -> CodecResult<()> {
        if let Some(width) = self.fixed_width() {
            if width <= 32 {
                let mut buf = [0u8; 32];
                input.read_exact_into(&mut buf[..width])?;
                *cell = self.decode_fixed(&buf[..width])?;
            } else {
                let buf = input.read_bytes(width)?;
                *cell = self.decode_fixed(&buf)?;
            }
            return Ok(());
        }
        match self {
            PrimitiveCodec::String { binary: true } => *cell = Value::Bytes(input.read_binary_string()?),
            PrimitiveCodec::String { binary: false } => *cell = Value::String(input.read_unicode_string()?),
            PrimitiveCodec::Ring => *cell = Value::Ring(read_ring(input)?),
            PrimitiveCodec::Polygon => *cell = Value::Polygon(read_polygon(input)?),
            PrimitiveCodec::MultiPolygon => {
                let n = input.read_length()?;
                let mut polygons = Vec::with_capacity(n.min(1024));
                for _ in 0..n {
                    polygons.push(read_polygon(input)?);
                }
                *cell = Value::MultiPolygon(polygons);
            }
            PrimitiveCodec::Bitmap { kind } => *cell = Value::Bitmap(read_bitmap(*kind, input)?),
            PrimitiveCodec::Nothing => *cell = Value::Null,
            _ => unreachable!("fixed-width codecs handled above"),
        }
        Ok(())
    }

    pub fn encode<W: Write>(&self, value: &Value, output: &mut ByteWriter<W>) -> CodecResult<()> {
        match self {
            PrimitiveCodec::Bool => match value {
                Value::Bool(b) => output.write_boolean(*b),
                other => match other.to_i128() {
                    Some(0) => output.write_boolean(false),
                    Some(1) => output.write_boolean(true),
                    Some(v) => Err(CodecError::out_of_range("Bool", v)),
                    None => Err(CodecError::mismatch("Bool", other)),
                },
            },
            PrimitiveCodec::Int { kind, .. } => {
                let buf = kind.encode_le(value)?;
                output.write_bytes(&buf[..kind.byte_len()])
            }
            PrimitiveCodec::Float32 => {
                let v = match value {
                    Value::Float32(v) => *v,
                    other => other.to_f64().ok_or_else(|| CodecError::mismatch("Float32", other))? as f32,
                };
                output.write_bytes(&v.to_bits().to_le_bytes())
            }
            PrimitiveCodec::Float64 => {
                let v = value.to_f64().ok_or_else(|| CodecError::mismatch("Float64", value))?;
                output.write_bytes(&v.to_bits().to_le_bytes())
            }
            PrimitiveCodec::String { .. } => {
                let bytes = value.as_bytes().ok_or_else(|| CodecError::mismatch("String", value))?;
                output.write_binary_string(bytes)
            }
            PrimitiveCodec::FixedString { length, .. } => {
                let bytes = value
                    .as_bytes()
                    .ok_or_else(|| CodecError::mismatch("FixedString", value))?;
                if bytes.len() >= *length {
                    output.write_bytes(&bytes[..*length])
                } else {
                    output.write_bytes(bytes)?;
                    output.write_bytes(&vec![0u8; length - bytes.len()])
                }
            }
            PrimitiveCodec::Uuid => {
                let uuid = match value {
                    Value::Uuid(u) => *u,
                    Value::String(s) => Uuid::parse_str(s)
                        .map_err(|e| CodecError::TypeMismatch(format!("invalid UUID '{}': {}", s, e)))?,
                    other => return Err(CodecError::mismatch("UUID", other)),
                };
                let (high, low) = uuid.as_u64_pair();
                output.write_bytes(&high.to_le_bytes())?;
                output.write_bytes(&low.to_le_bytes())
            }
            PrimitiveCodec::IPv4 => {
                let addr = match value {
                    Value::Ipv4(a) => *a,
                    Value::UInt32(v) => Ipv4Addr::from(*v),
                    Value::String(s) => s
                        .parse()
                        .map_err(|_| CodecError::TypeMismatch(format!("invalid IPv4 '{}'", s)))?,
                    other => return Err(CodecError::mismatch("IPv4", other)),
                };
                output.write_bytes(&u32::from(addr).to_le_bytes())
            }
            PrimitiveCodec::IPv6 => {
                let addr = match value {
                    Value::Ipv6(a) => *a,
                    Value::Ipv4(a) => a.to_ipv6_mapped(),
                    Value::String(s) => s
                        .parse()
                        .map_err(|_| CodecError::TypeMismatch(format!("invalid IPv6 '{}'", s)))?,
                    other => return Err(CodecError::mismatch("IPv6", other)),
                };
                output.write_bytes(&addr.octets())
            }
            PrimitiveCodec::Enum8(symbols) => {
                let code = enum_code(symbols, value, IntKind::I8)?;
                output.write_byte(code as i8 as u8)
            }
            PrimitiveCodec::Enum16(symbols) => {
                let code = enum_code(symbols, value, IntKind::I16)?;
                output.write_bytes(&(code as i16).to_le_bytes())
            }
            PrimitiveCodec::Point => write_point(output, &as_point(value)?),
            PrimitiveCodec::Ring => match value {
                Value::Ring(ring) => write_ring(output, ring),
                other => Err(CodecError::mismatch("Ring", other)),
            },
            PrimitiveCodec::Polygon => match value {
                Value::Polygon(polygon) => write_polygon(output, polygon),
                other => Err(CodecError::mismatch("Polygon", other)),
            },
            PrimitiveCodec::MultiPolygon => match value {
                Value::MultiPolygon(polygons) => {
                    output.write_var_int(polygons.len() as u64)?;
                    for polygon in polygons {
                        write_polygon(output, polygon)?;
                    }
                    Ok(())
                }
                other => Err(CodecError::mismatch("MultiPolygon", other)),
            },
            PrimitiveCodec::Bitmap { kind } => match value {
                Value::Bitmap(bitmap) => write_bitmap(*kind, bitmap, output),
                other => Err(CodecError::mismatch("Bitmap", other)),
            },
            PrimitiveCodec::Nothing => Ok(()),
        }
    }

    /// 该类型的默认值，列式格式中可空列的空行以此占位
    pub fn default_value(&self) -> Value {
        match self {
            PrimitiveCodec::Bool => Value::Bool(false),
            PrimitiveCodec::Int { kind, widen } => kind.zero(*widen),
            PrimitiveCodec::Float32 => Value::Float32(0.0),
            PrimitiveCodec::Float64 => Value::Float64(0.0),
            PrimitiveCodec::String { binary: true } => Value::Bytes(Vec::new()),
            PrimitiveCodec::String { binary: false } => Value::String(String::new()),
            PrimitiveCodec::FixedString { length, binary: true } => Value::Bytes(vec![0u8; *length]),
            PrimitiveCodec::FixedString { binary: false, .. } => Value::String(String::new()),
            PrimitiveCodec::Uuid => Value::Uuid(Uuid::nil()),
            PrimitiveCodec::IPv4 => Value::Ipv4(Ipv4Addr::UNSPECIFIED),
            PrimitiveCodec::IPv6 => Value::Ipv6(Ipv6Addr::UNSPECIFIED),
            PrimitiveCodec::Enum8(symbols) => Value::Int8(symbols.first().map_or(0, |(_, v)| *v)),
            PrimitiveCodec::Enum16(symbols) => Value::Int16(symbols.first().map_or(0, |(_, v)| *v)),
            PrimitiveCodec::Point => Value::Point(Point::default()),
            PrimitiveCodec::Ring => Value::Ring(Vec::new()),
            PrimitiveCodec::Polygon => Value::Polygon(Vec::new()),
            PrimitiveCodec::MultiPolygon => Value::MultiPolygon(Vec::new()),
            PrimitiveCodec::Bitmap { .. } => Value::Bitmap(Bitmap::default()),
            PrimitiveCodec::Nothing => Value::Null,
        }
    }
}

fn enum_code<T>(symbols: &[(String, T)], value: &Value, kind: IntKind) -> CodecResult<i128>
where
    T: Copy + Into<i128>,
{
    let code = match value {
        Value::String(name) => symbols
            .iter()
            .find(|(s, _)| s == name)
            .map(|(_, v)| Into::<i128>::into(*v))
            .ok_or_else(|| CodecError::OutOfRange(format!("unknown enum symbol '{}'", name)))?,
        other => {
            kind.encode_le(other)?;
            other.to_i128().ok_or_else(|| CodecError::mismatch(kind.name(), other))?
        }
    };
    if !symbols.is_empty() && !symbols.iter().any(|(_, v)| Into::<i128>::into(*v) == code) {
        return Err(CodecError::OutOfRange(format!("unknown enum value {}", code)));
    }
    Ok(code)
}

fn as_point(value: &Value) -> CodecResult<Point> {
    match value {
        Value::Point(p) => Ok(*p),
        Value::Tuple(items) if items.len() == 2 => {
            let x = items[0].to_f64().ok_or_else(|| CodecError::mismatch("Float64", &items[0]))?;
            let y = items[1].to_f64().ok_or_else(|| CodecError::mismatch("Float64", &items[1]))?;
            Ok(Point::new(x, y))
        }
        other => Err(CodecError::mismatch("Point", other)),
    }
}

fn read_point<R: Read>(input: &mut ByteReader<R>) -> CodecResult<Point> {
    let b = input.read_buffer::<16>()?;
    Ok(Point::new(
        f64::from_bits(u64::from_le_bytes(array(&b[..8]))),
        f64::from_bits(u64::from_le_bytes(array(&b[8..]))),
    ))
}

fn read_ring<R: Read>(input: &mut ByteReader<R>) -> CodecResult<Ring> {
    let n = input.read_length()?;
    let mut ring = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        ring.push(read_point(input)?);
    }
    Ok(ring)
}

fn read_polygon<R: Read>(input: &mut ByteReader<R>) -> CodecResult<Polygon> {
    let n = input.read_length()?;
    let mut polygon = Vec::with_capacity(n.min(1024));
    for _ in 0..n {
        polygon.push(read_ring(input)?);
    }
    Ok(polygon)
}

fn write_point<W: Write>(output: &mut ByteWriter<W>, point: &Point) -> CodecResult<()> {
    output.write_bytes(&point.x.to_bits().to_le_bytes())?;
    output.write_bytes(&point.y.to_bits().to_le_bytes())
}

fn write_ring<W: Write>(output: &mut ByteWriter<W>, ring: &Ring) -> CodecResult<()> {
    output.write_var_int(ring.len() as u64)?;
    for point in ring {
        write_point(output, point)?;
    }
    Ok(())
}

fn write_polygon<W: Write>(output: &mut ByteWriter<W>, polygon: &Polygon) -> CodecResult<()> {
    output.write_var_int(polygon.len() as u64)?;
    for ring in polygon {
        write_ring(output, ring)?;
    }
    Ok(())
}

fn read_bitmap<R: Read>(kind: IntKind, input: &mut ByteReader<R>) -> CodecResult<Bitmap> {
    match input.read_byte()? {
        0 => {
            let cardinality = input.read_byte()? as usize;
            let width = kind.byte_len();
            let raw = input.read_bytes(cardinality * width)?;
            let values = raw
                .chunks_exact(width)
                .map(|chunk| {
                    let mut buf = [0u8; 8];
                    buf[..width].copy_from_slice(chunk);
                    u64::from_le_bytes(buf)
                })
                .collect();
            Ok(Bitmap::Values(values))
        }
        1 => Ok(Bitmap::Serialized(input.read_binary_string()?)),
        flag => Err(CodecError::Protocol(format!("invalid bitmap flag {}", flag))),
    }
}

fn write_bitmap<W: Write>(kind: IntKind, bitmap: &Bitmap, output: &mut ByteWriter<W>) -> CodecResult<()> {
    match bitmap {
        Bitmap::Values(values) => {
            if values.len() > SMALL_SET_MAX {
                return Err(CodecError::Unsupported(format!(
                    "bitmap with {} values needs a serialized roaring payload",
                    values.len()
                )));
            }
            let width = kind.byte_len();
            output.write_byte(0)?;
            output.write_byte(values.len() as u8)?;
            for v in values {
                if width < 8 && v >> (width * 8) != 0 {
                    return Err(CodecError::out_of_range(kind.name(), v));
                }
                output.write_bytes(&v.to_le_bytes()[..width])?;
            }
            Ok(())
        }
        Bitmap::Serialized(bytes) => {
            output.write_byte(1)?;
            output.write_binary_string(bytes)
        }
    }
}

/// 小数编解码器，按（存储宽度，小数位数）缓存复用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalCodec {
    width: DecimalWidth,
    scale: u32,
    limit: i256,
}

impl DecimalCodec {
    pub fn new(width: DecimalWidth, scale: u32) -> CodecResult<Self> {
        let max = width.max_precision();
        if scale > max {
            return Err(CodecError::OutOfRange(format!(
                "scale {} exceeds {} for {}-byte decimals",
                scale,
                max,
                width.byte_len()
            )));
        }
        let limit = pow10(max).ok_or_else(|| CodecError::out_of_range("decimal precision", max))?;
        Ok(Self { width, scale, limit })
    }

    pub fn width(&self) -> DecimalWidth {
        self.width
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn decode_fixed(&self, b: &[u8]) -> Value {
        let unscaled = match self.width {
            DecimalWidth::D32 => i256::from_i128(i32::from_le_bytes(array(b)) as i128),
            DecimalWidth::D64 => i256::from_i128(i64::from_le_bytes(array(b)) as i128),
            DecimalWidth::D128 => i256::from_i128(i128::from_le_bytes(array(b))),
            DecimalWidth::D256 => i256::from_le_bytes(array(b)),
        };
        Value::Decimal(DecimalValue::new(unscaled, self.scale))
    }

    pub fn decode<R: Read>(&self, cell: &mut Value, input: &mut ByteReader<R>) -> CodecResult<()> {
        let mut buf = [0u8; 32];
        let width = self.width.byte_len();
        input.read_exact_into(&mut buf[..width])?;
        *cell = self.decode_fixed(&buf[..width]);
        Ok(())
    }

    /// 按列的小数位数缩放后检查宽度上下限，越界时不写入任何字节
    ///
    /// 上下限不含端点：未缩放值须满足 `-10^P < v < 10^P`，P 为该存储宽度的最大精度。
    pub fn encode<W: Write>(&self, value: &Value, output: &mut ByteWriter<W>) -> CodecResult<()> {
        let decimal = value
            .to_decimal()
            .ok_or_else(|| CodecError::mismatch("Decimal", value))?;
        let unscaled = decimal
            .rescale(self.scale)
            .ok_or_else(|| CodecError::out_of_range("decimal", decimal))?;
        let neg_limit = self.limit.wrapping_neg();
        if unscaled >= self.limit || unscaled <= neg_limit {
            return Err(CodecError::out_of_range(
                format!("Decimal{}({})", self.width.byte_len() * 8, self.scale),
                decimal,
            ));
        }
        output.write_bytes(&unscaled.to_le_bytes()[..self.width.byte_len()])
    }

    pub fn default_value(&self) -> Value {
        Value::Decimal(DecimalValue::new(i256::ZERO, self.scale))
    }
}
