//! 复合类型编解码与构造分派
//!
//! `CodecBuilder::build` 按列描述符递归构造 [`Codec`]：叶子类型交给基础/日期时间/小数
//! 编解码器，数组、映射、元组、嵌套与变体在此组合，可空包装最后套在最外层。

use std::io::{Read, Write};
use std::sync::Arc;

use chrono_tz::Tz;

use super::cache::CodecCache;
use super::error::{CodecError, CodecResult};
use super::primitive::{DecimalCodec, IntKind, PrimitiveCodec};
use super::stream::{ByteReader, ByteWriter};
use super::temporal::{TemporalCodec, TemporalKind};
use crate::config::CodecConfig;
use crate::core::types::{Column, DataType};
use crate::core::value::Value;

/// 变体中表示 NULL 的判别值
pub const NULL_DISCRIMINATOR: u8 = 255;

/// 数组长度的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMode {
    /// 变长整数前缀
    VarInt,
    /// 8 字节小端前缀，用于列式格式的长度头
    FixedWidth,
    /// 流中没有长度，由调用方给出（块的行数）
    External,
}

#[derive(Debug, Clone)]
pub enum Codec {
    Primitive(PrimitiveCodec),
    Decimal(Arc<DecimalCodec>),
    Temporal(Arc<TemporalCodec>),
    Nullable(Box<Codec>),
    Array(ArrayCodec),
    Map(Box<Codec>, Box<Codec>),
    Tuple(Vec<Codec>),
    Nested(Vec<Codec>),
    Variant(VariantCodec),
}

impl Codec {
    pub fn decode<R: Read>(&self, cell: &mut Value, input: &mut ByteReader<R>) -> CodecResult<()> {
        match self {
            Codec::Primitive(p) => p.decode(cell, input),
            Codec::Decimal(d) => d.decode(cell, input),
            Codec::Temporal(t) => t.decode(cell, input),
            Codec::Nullable(inner) => {
                if input.read_boolean()? {
                    *cell = Value::Null;
                    Ok(())
                } else {
                    inner.decode(cell, input)
                }
            }
            Codec::Array(array) => array.decode(cell, input),
            Codec::Map(key, value) => {
                let n = input.read_length()?;
                fill_items(cell.map_storage(), n, |(k, v)| {
                    key.decode(k, input)?;
                    value.decode(v, input)
                })
            }
            Codec::Tuple(fields) => {
                let items = cell.allocate_tuple(fields.len());
                for (codec, slot) in fields.iter().zip(items.iter_mut()) {
                    codec.decode(slot, input)?;
                }
                Ok(())
            }
            Codec::Nested(fields) => {
                let n = input.read_length()?;
                fill_items(cell.array_storage(), n, |row| {
                    let items = row.allocate_tuple(fields.len());
                    for (codec, slot) in fields.iter().zip(items.iter_mut()) {
                        codec.decode(slot, input)?;
                    }
                    Ok(())
                })
            }
            Codec::Variant(variant) => variant.decode(cell, input),
        }
    }

    pub fn encode<W: Write>(&self, value: &Value, output: &mut ByteWriter<W>) -> CodecResult<()> {
        match self {
            Codec::Primitive(p) => p.encode(value, output),
            Codec::Decimal(d) => d.encode(value, output),
            Codec::Temporal(t) => t.encode(value, output),
            Codec::Nullable(inner) => {
                if value.is_null() {
                    output.write_boolean(true)
                } else {
                    output.write_boolean(false)?;
                    inner.encode(value, output)
                }
            }
            Codec::Array(array) => array.encode(value, output),
            Codec::Map(key, val) => match value {
                Value::Map(pairs) => {
                    output.write_var_int(pairs.len() as u64)?;
                    for (k, v) in pairs {
                        key.encode(k, output)?;
                        val.encode(v, output)?;
                    }
                    Ok(())
                }
                other => Err(CodecError::mismatch("Map", other)),
            },
            Codec::Tuple(fields) => {
                let items = value.as_tuple().ok_or_else(|| CodecError::mismatch("Tuple", value))?;
                encode_fields(fields, items, output)
            }
            Codec::Nested(fields) => {
                let rows = value.as_array().ok_or_else(|| CodecError::mismatch("Nested", value))?;
                output.write_var_int(rows.len() as u64)?;
                for row in rows {
                    let items = row.as_tuple().ok_or_else(|| CodecError::mismatch("Tuple", row))?;
                    encode_fields(fields, items, output)?;
                }
                Ok(())
            }
            Codec::Variant(variant) => variant.encode(value, output),
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            Codec::Primitive(p) => p.default_value(),
            Codec::Decimal(d) => d.default_value(),
            Codec::Temporal(t) => t.default_value(),
            Codec::Nullable(_) | Codec::Variant(_) => Value::Null,
            Codec::Array(_) | Codec::Nested(_) => Value::Array(Vec::new()),
            Codec::Map(_, _) => Value::Map(Vec::new()),
            Codec::Tuple(fields) => Value::Tuple(fields.iter().map(Codec::default_value).collect()),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Codec::Nullable(_))
    }

    /// 去掉可空包装后的编解码器
    pub fn unwrap_nullable(&self) -> &Codec {
        match self {
            Codec::Nullable(inner) => inner,
            other => other,
        }
    }
}

/// 以 `len` 个元素重新填充 `items`
///
/// 已有元素原地覆盖以复用其分配，不足的部分逐个解码后追加。`len` 来自流，
/// 容量只随实际解码出的元素增长。
pub(crate) fn fill_items<T: Default>(
    items: &mut Vec<T>,
    len: usize,
    mut decode: impl FnMut(&mut T) -> CodecResult<()>,
) -> CodecResult<()> {
    items.truncate(len);
    for item in items.iter_mut() {
        decode(item)?;
    }
    while items.len() < len {
        let mut item = T::default();
        decode(&mut item)?;
        items.push(item);
    }
    Ok(())
}

fn encode_fields<W: Write>(fields: &[Codec], items: &[Value], output: &mut ByteWriter<W>) -> CodecResult<()> {
    if fields.len() != items.len() {
        return Err(CodecError::Protocol(format!(
            "Expect {} values but got {}",
            fields.len(),
            items.len()
        )));
    }
    for (codec, item) in fields.iter().zip(items) {
        codec.encode(item, output)?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ArrayCodec {
    element: Box<Codec>,
    length: LengthMode,
}

impl ArrayCodec {
    pub fn new(element: Codec, length: LengthMode) -> Self {
        Self {
            element: Box::new(element),
            length,
        }
    }

    pub fn element(&self) -> &Codec {
        &self.element
    }

    pub fn length_mode(&self) -> LengthMode {
        self.length
    }

    fn read_length<R: Read>(&self, input: &mut ByteReader<R>) -> CodecResult<usize> {
        match self.length {
            LengthMode::VarInt => input.read_length(),
            LengthMode::FixedWidth => {
                let n = u64::from_le_bytes(input.read_buffer()?);
                usize::try_from(n).map_err(|_| CodecError::Protocol(format!("array length {} too large", n)))
            }
            LengthMode::External => Err(CodecError::Protocol(
                "array length must be supplied by the caller".to_string(),
            )),
        }
    }

    pub fn decode<R: Read>(&self, cell: &mut Value, input: &mut ByteReader<R>) -> CodecResult<()> {
        let len = self.read_length(input)?;
        self.decode_with_length(len, cell, input)
    }

    /// 按给定长度解码，流中不读取长度
    pub fn decode_with_length<R: Read>(
        &self,
        len: usize,
        cell: &mut Value,
        input: &mut ByteReader<R>,
    ) -> CodecResult<()> {
        self.decode_into(cell.array_storage(), len, input)
    }

    /// 把 `len` 个元素解码进 `items`；定长元素先读入整段字节再切分
    pub fn decode_into<R: Read>(
        &self,
        items: &mut Vec<Value>,
        len: usize,
        input: &mut ByteReader<R>,
    ) -> CodecResult<()> {
        let fixed = match self.element.as_ref() {
            Codec::Primitive(p) => p.fixed_width().map(|w| (w, FixedElement::Primitive(p))),
            Codec::Decimal(d) => Some((d.width().byte_len(), FixedElement::Decimal(d))),
            _ => None,
        };
        if let Some((width, element)) = fixed {
            let total = len
                .checked_mul(width)
                .ok_or_else(|| CodecError::Protocol(format!("array of {} elements too large", len)))?;
            let raw = input.read_bytes(total)?;
            items.clear();
            for chunk in raw.chunks_exact(width) {
                items.push(match element {
                    FixedElement::Primitive(p) => p.decode_fixed(chunk)?,
                    FixedElement::Decimal(d) => d.decode_fixed(chunk),
                });
            }
            return Ok(());
        }
        fill_items(items, len, |slot| self.element.decode(slot, input))
    }

    pub fn encode<W: Write>(&self, value: &Value, output: &mut ByteWriter<W>) -> CodecResult<()> {
        let items = value.as_array().ok_or_else(|| CodecError::mismatch("Array", value))?;
        match self.length {
            LengthMode::VarInt => output.write_var_int(items.len() as u64)?,
            LengthMode::FixedWidth => output.write_bytes(&(items.len() as u64).to_le_bytes())?,
            LengthMode::External => {}
        }
        self.encode_items(items, output)
    }

    pub fn encode_items<W: Write>(&self, items: &[Value], output: &mut ByteWriter<W>) -> CodecResult<()> {
        for item in items {
            self.element.encode(item, output)?;
        }
        Ok(())
    }
}

enum FixedElement<'a> {
    Primitive(&'a PrimitiveCodec),
    Decimal(&'a DecimalCodec),
}

/// 变体（带标签的联合）
///
/// 解码结果为与备选项等长的元组，只有命中的位置有值；判别值 255 解码为 `Null`。
/// 编码时按以下顺序选择备选项：
/// 1. `Null` 写入判别值 255；
/// 2. 与备选项等长且至多一个非空位置的元组，按该位置选择；
/// 3. 值的运行时类型与备选项类型一致的第一个；
/// 4. 能成功编码该值的第一个备选项。
#[derive(Debug, Clone)]
pub struct VariantCodec {
    alternatives: Vec<Codec>,
    types: Vec<DataType>,
}

impl VariantCodec {
    pub fn new(alternatives: Vec<Codec>, types: Vec<DataType>) -> CodecResult<Self> {
        if alternatives.len() != types.len() {
            return Err(CodecError::Protocol(format!(
                "Expect {} deserializers but got {}",
                types.len(),
                alternatives.len()
            )));
        }
        if alternatives.len() >= NULL_DISCRIMINATOR as usize {
            return Err(CodecError::Protocol(format!(
                "variant with {} alternatives",
                alternatives.len()
            )));
        }
        Ok(Self { alternatives, types })
    }

    pub fn alternatives(&self) -> &[Codec] {
        &self.alternatives
    }

    pub fn decode<R: Read>(&self, cell: &mut Value, input: &mut ByteReader<R>) -> CodecResult<()> {
        let discriminator = input.read_byte()?;
        self.decode_alternative(discriminator, cell, input)
    }

    pub fn decode_alternative<R: Read>(
        &self,
        discriminator: u8,
        cell: &mut Value,
        input: &mut ByteReader<R>,
    ) -> CodecResult<()> {
        if discriminator == NULL_DISCRIMINATOR {
            *cell = Value::Null;
            return Ok(());
        }
        let index = discriminator as usize;
        let codec = self.alternatives.get(index).ok_or_else(|| {
            CodecError::Protocol(format!(
                "variant discriminator {} out of {} alternatives",
                index,
                self.alternatives.len()
            ))
        })?;
        let slots = cell.allocate_tuple(self.alternatives.len());
        for (i, slot) in slots.iter_mut().enumerate() {
            if i != index {
                *slot = Value::Null;
            }
        }
        codec.decode(&mut slots[index], input)
    }

    /// 选择备选项，返回判别值及实际要编码的值
    pub fn select<'v>(&self, value: &'v Value) -> CodecResult<(u8, Option<&'v Value>)> {
        if value.is_null() {
            return Ok((NULL_DISCRIMINATOR, None));
        }
        if let Value::Tuple(items) = value {
            if items.len() == self.alternatives.len() {
                let mut present = items.iter().enumerate().filter(|(_, v)| !v.is_null());
                match (present.next(), present.next()) {
                    (None, _) => return Ok((NULL_DISCRIMINATOR, None)),
                    (Some((i, v)), None) => return Ok((i as u8, Some(v))),
                    _ => {}
                }
            }
        }
        if let Some(i) = self.types.iter().position(|t| matches_runtime_type(t, value)) {
            return Ok((i as u8, Some(value)));
        }
        for (i, codec) in self.alternatives.iter().enumerate() {
            let mut scratch = ByteWriter::new(Vec::new());
            if codec.encode(value, &mut scratch).is_ok() {
                return Ok((i as u8, Some(value)));
            }
        }
        Err(CodecError::TypeMismatch(format!(
            "no variant alternative accepts {}",
            value.type_label()
        )))
    }

    pub fn encode<W: Write>(&self, value: &Value, output: &mut ByteWriter<W>) -> CodecResult<()> {
        let (discriminator, payload) = self.select(value)?;
        output.write_byte(discriminator)?;
        match payload {
            Some(v) => self.alternatives[discriminator as usize].encode(v, output),
            None => Ok(()),
        }
    }
}

/// 值的运行时类型是否就是该数据类型的自然表示
pub fn matches_runtime_type(data_type: &DataType, value: &Value) -> bool {
    match (data_type, value) {
        (DataType::Bool, Value::Bool(_))
        | (DataType::Int8, Value::Int8(_))
        | (DataType::Int16, Value::Int16(_))
        | (DataType::Int32, Value::Int32(_))
        | (DataType::Int64 | DataType::Interval(_), Value::Int64(_))
        | (DataType::Int128, Value::Int128(_))
        | (DataType::Int256, Value::Int256(_))
        | (DataType::UInt8, Value::UInt8(_))
        | (DataType::UInt16, Value::UInt16(_))
        | (DataType::UInt32, Value::UInt32(_))
        | (DataType::UInt64, Value::UInt64(_))
        | (DataType::UInt128, Value::UInt128(_))
        | (DataType::UInt256, Value::UInt256(_))
        | (DataType::Float32, Value::Float32(_))
        | (DataType::Float64, Value::Float64(_))
        | (DataType::String | DataType::Json, Value::String(_) | Value::Bytes(_))
        | (DataType::FixedString(_), Value::String(_) | Value::Bytes(_))
        | (DataType::Date | DataType::Date32, Value::Date(_))
        | (DataType::DateTime(_) | DataType::DateTime64 { .. }, Value::DateTime(_))
        | (DataType::Uuid, Value::Uuid(_))
        | (DataType::IPv4, Value::Ipv4(_))
        | (DataType::IPv6, Value::Ipv6(_))
        | (DataType::Enum8(_), Value::Int8(_))
        | (DataType::Enum16(_), Value::Int16(_))
        | (DataType::Point, Value::Point(_))
        | (DataType::Ring, Value::Ring(_))
        | (DataType::Polygon, Value::Polygon(_))
        | (DataType::MultiPolygon, Value::MultiPolygon(_))
        | (DataType::Array(_) | DataType::Nested(_), Value::Array(_))
        | (DataType::Map(_, _), Value::Map(_))
        | (DataType::AggregateFunction { .. }, Value::Bitmap(_)) => true,
        (DataType::Tuple(fields), Value::Tuple(items)) => fields.len() == items.len(),
        (data_type, Value::Decimal(_)) => data_type.decimal_spec().is_some(),
        (DataType::LowCardinality(inner), v) => matches_runtime_type(&inner.data_type, v),
        (DataType::SimpleAggregateFunction { inner, .. }, v) => matches_runtime_type(&inner.data_type, v),
        _ => false,
    }
}

/// 编解码器构造器
///
/// 持有解析后的时区设置与参数化编解码器缓存；同一缓存可在多个构造器间共享。
#[derive(Debug, Clone)]
pub struct CodecBuilder {
    widen_unsigned: bool,
    binary_string: bool,
    server_zone: Tz,
    use_time_zone: Option<Tz>,
    date_zone: Tz,
    cache: Arc<CodecCache>,
}

impl Default for CodecBuilder {
    fn default() -> Self {
        Self {
            widen_unsigned: false,
            binary_string: false,
            server_zone: Tz::UTC,
            use_time_zone: None,
            date_zone: Tz::UTC,
            cache: Arc::new(CodecCache::new()),
        }
    }
}

impl CodecBuilder {
    pub fn new(config: &CodecConfig) -> CodecResult<Self> {
        Self::with_cache(config, Arc::new(CodecCache::new()))
    }

    pub fn with_cache(config: &CodecConfig, cache: Arc<CodecCache>) -> CodecResult<Self> {
        let server_zone = config.server_zone()?;
        Ok(Self {
            widen_unsigned: config.widen_unsigned_types,
            binary_string: config.use_binary_string,
            server_zone,
            use_time_zone: config.use_zone()?,
            date_zone: config.date_zone()?.unwrap_or(server_zone),
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<CodecCache> {
        &self.cache
    }

    pub fn widen_unsigned(&self) -> bool {
        self.widen_unsigned
    }

    /// 为一列构造编解码器，错误附带列名与类型
    pub fn build(&self, column: &Column) -> CodecResult<Codec> {
        self.build_column(column, &column.name)
            .map_err(|e| e.in_column(&column.name, &column.type_name()))
    }

    pub fn build_all(&self, columns: &[Column]) -> CodecResult<Vec<Codec>> {
        columns.iter().map(|c| self.build(c)).collect()
    }

    pub(crate) fn build_column(&self, column: &Column, root: &str) -> CodecResult<Codec> {
        let codec = self.build_type(column, root)?;
        Ok(if column.nullable {
            Codec::Nullable(Box::new(codec))
        } else {
            codec
        })
    }

    fn unsupported(column: &Column, root: &str) -> CodecError {
        CodecError::UnsupportedColumn {
            column: root.to_string(),
            data_type: column.type_name(),
        }
    }

    /// DateTime 类型实际使用的时区：列自带的，其次是配置指定的，最后是服务端时区
    pub fn date_time_zone(&self, explicit: Option<Tz>) -> Tz {
        explicit.or(self.use_time_zone).unwrap_or(self.server_zone)
    }

    pub(crate) fn temporal(&self, data_type: &DataType) -> CodecResult<Option<Arc<TemporalCodec>>> {
        let (kind, zone, reference) = match data_type {
            DataType::Date => (TemporalKind::Date, self.date_zone, self.server_zone),
            DataType::Date32 => (TemporalKind::Date32, self.date_zone, self.server_zone),
            DataType::DateTime(tz) => (TemporalKind::DateTime32, self.date_time_zone(*tz), Tz::UTC),
            DataType::DateTime64 { scale, time_zone } => (
                TemporalKind::DateTime64 { scale: *scale },
                self.date_time_zone(*time_zone),
                Tz::UTC,
            ),
            _ => return Ok(None),
        };
        self.cache.temporal(kind, zone, reference).map(Some)
    }

    pub(crate) fn build_type(&self, column: &Column, root: &str) -> CodecResult<Codec> {
        if let Some(kind) = IntKind::from_data_type(&column.data_type) {
            return Ok(Codec::Primitive(PrimitiveCodec::Int {
                kind,
                widen: self.widen_unsigned,
            }));
        }
        if let Some((width, _, scale)) = column.data_type.decimal_spec() {
            return Ok(Codec::Decimal(self.cache.decimal(width, scale)?));
        }
        if let Some(temporal) = self.temporal(&column.data_type)? {
            return Ok(Codec::Temporal(temporal));
        }
        let binary = self.binary_string;
        let codec = match &column.data_type {
            DataType::Bool => Codec::Primitive(PrimitiveCodec::Bool),
            DataType::Float32 => Codec::Primitive(PrimitiveCodec::Float32),
            DataType::Float64 => Codec::Primitive(PrimitiveCodec::Float64),
            DataType::String | DataType::Json => Codec::Primitive(PrimitiveCodec::String { binary }),
            DataType::FixedString(0) => {
                return Err(CodecError::OutOfRange("FixedString length must be at least 1".to_string()))
            }
            DataType::FixedString(length) => Codec::Primitive(PrimitiveCodec::FixedString {
                length: *length,
                binary,
            }),
            DataType::Uuid => Codec::Primitive(PrimitiveCodec::Uuid),
            DataType::IPv4 => Codec::Primitive(PrimitiveCodec::IPv4),
            DataType::IPv6 => Codec::Primitive(PrimitiveCodec::IPv6),
            DataType::Enum8(symbols) => Codec::Primitive(PrimitiveCodec::Enum8(symbols.clone())),
            DataType::Enum16(symbols) => Codec::Primitive(PrimitiveCodec::Enum16(symbols.clone())),
            DataType::Point => Codec::Primitive(PrimitiveCodec::Point),
            DataType::Ring => Codec::Primitive(PrimitiveCodec::Ring),
            DataType::Polygon => Codec::Primitive(PrimitiveCodec::Polygon),
            DataType::MultiPolygon => Codec::Primitive(PrimitiveCodec::MultiPolygon),
            DataType::Nothing => Codec::Primitive(PrimitiveCodec::Nothing),
            DataType::Array(element) => Codec::Array(ArrayCodec::new(
                self.build_column(element, root)?,
                LengthMode::VarInt,
            )),
            DataType::Map(key, value) => Codec::Map(
                Box::new(self.build_column(key, root)?),
                Box::new(self.build_column(value, root)?),
            ),
            DataType::Tuple(fields) => Codec::Tuple(self.build_fields(fields, root)?),
            DataType::Nested(fields) => Codec::Nested(self.build_fields(fields, root)?),
            DataType::Variant(alternatives) => {
                let codecs = self.build_fields(alternatives, root)?;
                let types = alternatives.iter().map(|c| c.data_type.clone()).collect();
                Codec::Variant(VariantCodec::new(codecs, types)?)
            }
            // 行格式中低基数列按元素类型本身编码
            DataType::LowCardinality(element) => self.build_column(element, root)?,
            DataType::SimpleAggregateFunction { inner, .. } => self.build_column(inner, root)?,
            DataType::AggregateFunction { function, args } => {
                let kind = match args.as_slice() {
                    [arg] if function == "groupBitmap" && !arg.nullable => {
                        IntKind::from_data_type(&arg.data_type).filter(|k| k.byte_len() <= 8)
                    }
                    _ => None,
                };
                match kind {
                    Some(kind) => Codec::Primitive(PrimitiveCodec::Bitmap { kind }),
                    None => return Err(Self::unsupported(column, root)),
                }
            }
            _ => return Err(Self::unsupported(column, root)),
        };
        Ok(codec)
    }

    fn build_fields(&self, fields: &[Column], root: &str) -> CodecResult<Vec<Codec>> {
        fields.iter().map(|f| self.build_column(f, root)).collect()
    }
}
