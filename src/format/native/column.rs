//! 列式格式中整列的编解码
//!
//! 与行格式不同，复合类型在块内拆成多条子列：
//! - Nullable：每行一个字节的空值标记，随后是嵌套列（空行写默认值）
//! - Array：每行一个 8 字节累计偏移，随后是展平后的元素列
//! - Map：等同 Array(Tuple(K, V))，偏移后依次是键列和值列
//! - Tuple：各元素列依次排列
//! - Nested：偏移后是各字段列
//! - Variant：状态前缀为 8 字节判别模式（0），每行一个判别字节（255 为 NULL），
//!   随后每个备选项一列，只包含属于它的行
//! - LowCardinality：见 [`LowCardinalityCodec`]
//! - 地理类型按其 Tuple/Array 等价结构编码
//!
//! 状态前缀（低基数版本号、变体判别模式）在每个块中每列写一次，位于该列数据之前。

use std::io::{Read, Write};

use crate::core::codec::primitive::PrimitiveCodec;
use crate::core::codec::{
    ArrayCodec, ByteReader, ByteWriter, Codec, CodecBuilder, CodecError, CodecResult, LengthMode,
    LowCardinalityCodec, VariantCodec,
};
use crate::core::types::{Column, DataType};
use crate::core::value::{Point, Value};

const VARIANT_BASIC_MODE: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoKind {
    Point,
    Ring,
    Polygon,
    MultiPolygon,
}

#[derive(Debug, Clone)]
pub enum ColumnCodec {
    /// 逐值拼接的叶子列
    Plain(ArrayCodec),
    Nothing,
    Nullable(Box<ColumnCodec>),
    Array(Box<ColumnCodec>),
    Map(Box<ColumnCodec>, Box<ColumnCodec>),
    Tuple(Vec<ColumnCodec>),
    Nested(Vec<ColumnCodec>),
    LowCardinality(LowCardinalityCodec),
    Variant {
        selector: VariantCodec,
        columns: Vec<ColumnCodec>,
    },
    Geo {
        kind: GeoKind,
        inner: Box<ColumnCodec>,
    },
}

impl ColumnCodec {
    pub fn build(builder: &CodecBuilder, column: &Column) -> CodecResult<Self> {
        Self::build_column(builder, column, &column.name)
            .map_err(|e| e.in_column(&column.name, &column.type_name()))
    }

    fn build_column(builder: &CodecBuilder, column: &Column, root: &str) -> CodecResult<Self> {
        let codec = Self::build_type(builder, column, root)?;
        Ok(if column.nullable {
            ColumnCodec::Nullable(Box::new(codec))
        } else {
            codec
        })
    }

    fn build_fields(builder: &CodecBuilder, fields: &[Column], root: &str) -> CodecResult<Vec<Self>> {
        fields.iter().map(|f| Self::build_column(builder, f, root)).collect()
    }

    fn build_type(builder: &CodecBuilder, column: &Column, root: &str) -> CodecResult<Self> {
        let codec = match &column.data_type {
            DataType::Array(element) => ColumnCodec::Array(Box::new(Self::build_column(builder, element, root)?)),
            DataType::Map(key, value) => ColumnCodec::Map(
                Box::new(Self::build_column(builder, key, root)?),
                Box::new(Self::build_column(builder, value, root)?),
            ),
            DataType::Tuple(fields) => ColumnCodec::Tuple(Self::build_fields(builder, fields, root)?),
            DataType::Nested(fields) => ColumnCodec::Nested(Self::build_fields(builder, fields, root)?),
            DataType::Variant(alternatives) => {
                let codecs = alternatives
                    .iter()
                    .map(|a| builder.build_column(a, root))
                    .collect::<CodecResult<Vec<_>>>()?;
                let types = alternatives.iter().map(|a| a.data_type.clone()).collect();
                ColumnCodec::Variant {
                    selector: VariantCodec::new(codecs, types)?,
                    columns: Self::build_fields(builder, alternatives, root)?,
                }
            }
            DataType::LowCardinality(element) => ColumnCodec::LowCardinality(LowCardinalityCodec::new(
                builder.build_type(element, root)?,
                element.nullable,
            )),
            DataType::SimpleAggregateFunction { inner, .. } => Self::build_column(builder, inner, root)?,
            DataType::Nothing => ColumnCodec::Nothing,
            DataType::Point => Self::geo(GeoKind::Point),
            DataType::Ring => Self::geo(GeoKind::Ring),
            DataType::Polygon => Self::geo(GeoKind::Polygon),
            DataType::MultiPolygon => Self::geo(GeoKind::MultiPolygon),
            _ => ColumnCodec::Plain(ArrayCodec::new(
                builder.build_type(column, root)?,
                LengthMode::External,
            )),
        };
        Ok(codec)
    }

    fn geo(kind: GeoKind) -> Self {
        let coordinate = || {
            ColumnCodec::Plain(ArrayCodec::new(
                Codec::Primitive(PrimitiveCodec::Float64),
                LengthMode::External,
            ))
        };
        let point = ColumnCodec::Tuple(vec![coordinate(), coordinate()]);
        let depth = match kind {
            GeoKind::Point => 0,
            GeoKind::Ring => 1,
            GeoKind::Polygon => 2,
            GeoKind::MultiPolygon => 3,
        };
        let inner = (0..depth).fold(point, |inner, _| ColumnCodec::Array(Box::new(inner)));
        ColumnCodec::Geo {
            kind,
            inner: Box::new(inner),
        }
    }

    /// 空值行在嵌套列中写入的占位值
    pub fn default_value(&self) -> Value {
        match self {
            ColumnCodec::Plain(array) => array.element().default_value(),
            ColumnCodec::Nothing | ColumnCodec::Nullable(_) | ColumnCodec::Variant { .. } => Value::Null,
            ColumnCodec::Array(_) | ColumnCodec::Nested(_) => Value::Array(Vec::new()),
            ColumnCodec::Map(_, _) => Value::Map(Vec::new()),
            ColumnCodec::Tuple(fields) => Value::Tuple(fields.iter().map(ColumnCodec::default_value).collect()),
            ColumnCodec::LowCardinality(lc) => lc.default_value(),
            ColumnCodec::Geo { kind, .. } => match kind {
                GeoKind::Point => Value::Point(Point::default()),
                GeoKind::Ring => Value::Ring(Vec::new()),
                GeoKind::Polygon => Value::Polygon(Vec::new()),
                GeoKind::MultiPolygon => Value::MultiPolygon(Vec::new()),
            },
        }
    }

    pub fn read_prefix<R: Read>(&self, input: &mut ByteReader<R>) -> CodecResult<()> {
        match self {
            ColumnCodec::Plain(_) | ColumnCodec::Nothing => Ok(()),
            ColumnCodec::Nullable(inner) | ColumnCodec::Array(inner) | ColumnCodec::Geo { inner, .. } => {
                inner.read_prefix(input)
            }
            ColumnCodec::Map(key, value) => {
                key.read_prefix(input)?;
                value.read_prefix(input)
            }
            ColumnCodec::Tuple(fields) | ColumnCodec::Nested(fields) => {
                fields.iter().try_for_each(|f| f.read_prefix(input))
            }
            ColumnCodec::LowCardinality(lc) => lc.read_prefix(input),
            ColumnCodec::Variant { columns, .. } => {
                let mode = u64::from_le_bytes(input.read_buffer()?);
                if mode != VARIANT_BASIC_MODE {
                    return Err(CodecError::Protocol(format!(
                        "Unexpected variant discriminators mode: {}",
                        mode
                    )));
                }
                columns.iter().try_for_each(|c| c.read_prefix(input))
            }
        }
    }

    pub fn write_prefix<W: Write>(&self, output: &mut ByteWriter<W>) -> CodecResult<()> {
        match self {
            ColumnCodec::Plain(_) | ColumnCodec::Nothing => Ok(()),
            ColumnCodec::Nullable(inner) | ColumnCodec::Array(inner) | ColumnCodec::Geo { inner, .. } => {
                inner.write_prefix(output)
            }
            ColumnCodec::Map(key, value) => {
                key.write_prefix(output)?;
                value.write_prefix(output)
            }
            ColumnCodec::Tuple(fields) | ColumnCodec::Nested(fields) => {
                fields.iter().try_for_each(|f| f.write_prefix(output))
            }
            ColumnCodec::LowCardinality(lc) => lc.write_prefix(output),
            ColumnCodec::Variant { columns, .. } => {
                output.write_bytes(&VARIANT_BASIC_MODE.to_le_bytes())?;
                columns.iter().try_for_each(|c| c.write_prefix(output))
            }
        }
    }

    /// 解码 `rows` 行
    ///
    /// 行数与偏移都来自流，结果向量随实际读到的数据增长。
    pub fn read_column<R: Read>(&self, rows: usize, input: &mut ByteReader<R>) -> CodecResult<Vec<Value>> {
        match self {
            ColumnCodec::Plain(array) => {
                let mut cells = Vec::new();
                array.decode_into(&mut cells, rows, input)?;
                Ok(cells)
            }
            ColumnCodec::Nothing => {
                input.skip(rows)?;
                Ok(vec![Value::Null; rows])
            }
            ColumnCodec::Nullable(inner) => {
                let null_map = input.read_bytes(rows)?;
                let mut cells = inner.read_column(rows, input)?;
                for (cell, flag) in cells.iter_mut().zip(null_map) {
                    if flag != 0 {
                        *cell = Value::Null;
                    }
                }
                Ok(cells)
            }
            ColumnCodec::Array(inner) => {
                let offsets = read_offsets(rows, input)?;
                let items = inner.read_column(offsets.last().copied().unwrap_or(0), input)?;
                Ok(split_offsets(&offsets, items, Value::Array))
            }
            ColumnCodec::Map(key, value) => {
                let offsets = read_offsets(rows, input)?;
                let total = offsets.last().copied().unwrap_or(0);
                let keys = key.read_column(total, input)?;
                let values = value.read_column(total, input)?;
                let pairs = keys.into_iter().zip(values).collect();
                Ok(split_offsets(&offsets, pairs, Value::Map))
            }
            ColumnCodec::Tuple(fields) => Ok(assemble_tuples(read_fields(fields, rows, input)?, rows)),
            ColumnCodec::Nested(fields) => {
                let offsets = read_offsets(rows, input)?;
                let total = offsets.last().copied().unwrap_or(0);
                let tuples = assemble_tuples(read_fields(fields, total, input)?, total);
                Ok(split_offsets(&offsets, tuples, Value::Array))
            }
            ColumnCodec::LowCardinality(lc) => lc.read_body(rows, input),
            ColumnCodec::Variant { columns, .. } => {
                let discriminators = input.read_bytes(rows)?;
                let mut counts = vec![0usize; columns.len()];
                for &d in &discriminators {
                    if d == crate::core::codec::composite::NULL_DISCRIMINATOR {
                        continue;
                    }
                    match counts.get_mut(d as usize) {
                        Some(count) => *count += 1,
                        None => {
                            return Err(CodecError::Protocol(format!(
                                "variant discriminator {} out of {} alternatives",
                                d,
                                columns.len()
                            )))
                        }
                    }
                }
                let mut parts = Vec::with_capacity(columns.len());
                for (codec, &count) in columns.iter().zip(&counts) {
                    let part = if count > 0 {
                        codec.read_column(count, input)?
                    } else {
                        Vec::new()
                    };
                    parts.push(part.into_iter());
                }
                let mut cells = Vec::with_capacity(discriminators.len());
                for &d in &discriminators {
                    if d == crate::core::codec::composite::NULL_DISCRIMINATOR {
                        cells.push(Value::Null);
                        continue;
                    }
                    let mut slots = vec![Value::Null; columns.len()];
                    slots[d as usize] = parts[d as usize].next().unwrap_or_default();
                    cells.push(Value::Tuple(slots));
                }
                Ok(cells)
            }
            ColumnCodec::Geo { kind, inner } => inner
                .read_column(rows, input)?
                .into_iter()
                .map(|cell| from_structural(*kind, cell))
                .collect(),
        }
    }

    pub fn write_column<W: Write>(&self, values: &[&Value], output: &mut ByteWriter<W>) -> CodecResult<()> {
        match self {
            ColumnCodec::Plain(array) => values.iter().try_for_each(|v| array.element().encode(v, output)),
            ColumnCodec::Nothing => output.write_bytes(&vec![b'0'; values.len()]),
            ColumnCodec::Nullable(inner) => {
                let null_map: Vec<u8> = values.iter().map(|v| v.is_null() as u8).collect();
                output.write_bytes(&null_map)?;
                let default = inner.default_value();
                let nested: Vec<&Value> = values
                    .iter()
                    .map(|v| if v.is_null() { &default } else { *v })
                    .collect();
                inner.write_column(&nested, output)
            }
            ColumnCodec::Array(inner) => {
                let mut items = Vec::new();
                let mut offsets = Vec::with_capacity(values.len());
                for value in values {
                    let array = value.as_array().ok_or_else(|| CodecError::mismatch("Array", value))?;
                    items.extend(array.iter());
                    offsets.push(items.len() as u64);
                }
                write_offsets(&offsets, output)?;
                inner.write_column(&items, output)
            }
            ColumnCodec::Map(key, value) => {
                let mut keys = Vec::new();
                let mut vals = Vec::new();
                let mut offsets = Vec::with_capacity(values.len());
                for v in values {
                    let pairs = match v {
                        Value::Map(pairs) => pairs,
                        other => return Err(CodecError::mismatch("Map", other)),
                    };
                    for (k, val) in pairs {
                        keys.push(k);
                        vals.push(val);
                    }
                    offsets.push(keys.len() as u64);
                }
                write_offsets(&offsets, output)?;
                key.write_column(&keys, output)?;
                value.write_column(&vals, output)
            }
            ColumnCodec::Tuple(fields) => {
                let tuples = collect_tuples(values, fields.len())?;
                write_fields(fields, &tuples, output)
            }
            ColumnCodec::Nested(fields) => {
                let mut rows = Vec::new();
                let mut offsets = Vec::with_capacity(values.len());
                for value in values {
                    let array = value.as_array().ok_or_else(|| CodecError::mismatch("Nested", value))?;
                    rows.extend(array.iter());
                    offsets.push(rows.len() as u64);
                }
                write_offsets(&offsets, output)?;
                let tuples = collect_tuples(&rows, fields.len())?;
                write_fields(fields, &tuples, output)
            }
            ColumnCodec::LowCardinality(lc) => lc.write_body(values, output),
            ColumnCodec::Variant { selector, columns } => {
                let mut discriminators = Vec::with_capacity(values.len());
                let mut groups: Vec<Vec<&Value>> = vec![Vec::new(); columns.len()];
                for value in values {
                    let (d, payload) = selector.select(value)?;
                    if let Some(payload) = payload {
                        groups[d as usize].push(payload);
                    }
                    discriminators.push(d);
                }
                output.write_bytes(&discriminators)?;
                for (codec, group) in columns.iter().zip(&groups) {
                    if !group.is_empty() {
                        codec.write_column(group, output)?;
                    }
                }
                Ok(())
            }
            ColumnCodec::Geo { kind, inner } => {
                let converted = values
                    .iter()
                    .map(|v| to_structural(*kind, v))
                    .collect::<CodecResult<Vec<_>>>()?;
                let refs: Vec<&Value> = converted.iter().collect();
                inner.write_column(&refs, output)
            }
        }
    }
}

/// 读取 `rows` 个累计偏移；容量不按行数预分配，截断的流在读到末尾时报错
fn read_offsets<R: Read>(rows: usize, input: &mut ByteReader<R>) -> CodecResult<Vec<usize>> {
    let mut offsets = Vec::new();
    let mut previous = 0usize;
    for _ in 0..rows {
        let raw = u64::from_le_bytes(input.read_buffer()?);
        let offset = usize::try_from(raw)
            .ok()
            .filter(|&o| o >= previous)
            .ok_or_else(|| CodecError::Protocol(format!("offset {} after {}", raw, previous)))?;
        offsets.push(offset);
        previous = offset;
    }
    Ok(offsets)
}

/// 按累计偏移把展平的元素切回每行
fn split_offsets<T>(offsets: &[usize], items: Vec<T>, wrap: impl Fn(Vec<T>) -> Value) -> Vec<Value> {
    let mut items = items.into_iter();
    let mut start = 0;
    offsets
        .iter()
        .map(|&end| {
            let row = wrap(items.by_ref().take(end - start).collect());
            start = end;
            row
        })
        .collect()
}

fn write_offsets<W: Write>(offsets: &[u64], output: &mut ByteWriter<W>) -> CodecResult<()> {
    let mut raw = Vec::with_capacity(offsets.len() * 8);
    for offset in offsets {
        raw.extend_from_slice(&offset.to_le_bytes());
    }
    output.write_bytes(&raw)
}

fn read_fields<R: Read>(fields: &[ColumnCodec], rows: usize, input: &mut ByteReader<R>) -> CodecResult<Vec<Vec<Value>>> {
    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        columns.push(if rows > 0 { field.read_column(rows, input)? } else { Vec::new() });
    }
    Ok(columns)
}

fn assemble_tuples(columns: Vec<Vec<Value>>, rows: usize) -> Vec<Value> {
    let mut columns: Vec<_> = columns.into_iter().map(Vec::into_iter).collect();
    (0..rows)
        .map(|_| Value::Tuple(columns.iter_mut().map(|c| c.next().unwrap_or_default()).collect()))
        .collect()
}

fn collect_tuples<'v>(values: &[&'v Value], arity: usize) -> CodecResult<Vec<&'v [Value]>> {
    values
        .iter()
        .map(|v| {
            let items = v.as_tuple().ok_or_else(|| CodecError::mismatch("Tuple", v))?;
            if items.len() != arity {
                return Err(CodecError::Protocol(format!(
                    "Expect {} values but got {}",
                    arity,
                    items.len()
                )));
            }
            Ok(items)
        })
        .collect()
}

fn write_fields<W: Write>(fields: &[ColumnCodec], tuples: &[&[Value]], output: &mut ByteWriter<W>) -> CodecResult<()> {
    for (i, field) in fields.iter().enumerate() {
        let column: Vec<&Value> = tuples.iter().map(|t| &t[i]).collect();
        field.write_column(&column, output)?;
    }
    Ok(())
}

fn point_value(p: &Point) -> Value {
    Value::Tuple(vec![Value::Float64(p.x), Value::Float64(p.y)])
}

fn ring_value(ring: &[Point]) -> Value {
    Value::Array(ring.iter().map(point_value).collect())
}

fn polygon_value(rings: &[Vec<Point>]) -> Value {
    Value::Array(rings.iter().map(|r| ring_value(r)).collect())
}

fn to_structural(kind: GeoKind, value: &Value) -> CodecResult<Value> {
    Ok(match (kind, value) {
        (GeoKind::Point, Value::Point(p)) => point_value(p),
        (GeoKind::Point, Value::Tuple(items)) if items.len() == 2 => value.clone(),
        (GeoKind::Ring, Value::Ring(ring)) => ring_value(ring),
        (GeoKind::Polygon, Value::Polygon(rings)) => polygon_value(rings),
        (GeoKind::MultiPolygon, Value::MultiPolygon(polygons)) => {
            Value::Array(polygons.iter().map(|p| polygon_value(p)).collect())
        }
        (kind, other) => return Err(CodecError::mismatch(&format!("{:?}", kind), other)),
    })
}

fn structural_point(value: &Value) -> CodecResult<Point> {
    match value.as_tuple() {
        Some([x, y]) => match (x.to_f64(), y.to_f64()) {
            (Some(x), Some(y)) => Ok(Point::new(x, y)),
            _ => Err(CodecError::mismatch("Point", value)),
        },
        _ => Err(CodecError::mismatch("Point", value)),
    }
}

fn structural_list<T>(value: &Value, item: impl Fn(&Value) -> CodecResult<T>) -> CodecResult<Vec<T>> {
    value
        .as_array()
        .ok_or_else(|| CodecError::mismatch("Array", value))?
        .iter()
        .map(item)
        .collect()
}

fn from_structural(kind: GeoKind, value: Value) -> CodecResult<Value> {
    let ring = |v: &Value| structural_list(v, structural_point);
    let polygon = |v: &Value| structural_list(v, ring);
    Ok(match kind {
        GeoKind::Point => Value::Point(structural_point(&value)?),
        GeoKind::Ring => Value::Ring(ring(&value)?),
        GeoKind::Polygon => Value::Polygon(polygon(&value)?),
        GeoKind::MultiPolygon => Value::MultiPolygon(structural_list(&value, polygon)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(type_name: &str) -> ColumnCodec {
        ColumnCodec::build(&CodecBuilder::default(), &Column::parse("c", type_name).unwrap()).unwrap()
    }

    fn write(codec: &ColumnCodec, values: &[Value]) -> Vec<u8> {
        let refs: Vec<&Value> = values.iter().collect();
        let mut out = ByteWriter::new(Vec::new());
        codec.write_prefix(&mut out).unwrap();
        codec.write_column(&refs, &mut out).unwrap();
        out.into_inner()
    }

    fn read(codec: &ColumnCodec, bytes: &[u8], rows: usize) -> Vec<Value> {
        let mut input = ByteReader::new(bytes);
        codec.read_prefix(&mut input).unwrap();
        let cells = codec.read_column(rows, &mut input).unwrap();
        assert_eq!(input.available().unwrap(), 0, "trailing bytes");
        cells
    }

    fn round_trip(type_name: &str, values: Vec<Value>) -> Vec<u8> {
        let codec = codec(type_name);
        let bytes = write(&codec, &values);
        assert_eq!(read(&codec, &bytes, values.len()), values, "{}", type_name);
        bytes
    }

    #[test]
    fn test_nullable_layout() {
        let bytes = round_trip("Nullable(UInt8)", vec![Value::UInt8(4), Value::Null, Value::UInt8(6)]);
        assert_eq!(bytes, vec![0, 1, 0, 4, 0, 6]);
    }

    #[test]
    fn test_array_offsets() {
        let bytes = round_trip(
            "Array(Int8)",
            vec![
                Value::Array(vec![Value::Int8(1), Value::Int8(2)]),
                Value::Array(vec![]),
                Value::Array(vec![Value::Int8(3)]),
            ],
        );
        let mut expected = Vec::new();
        for offset in [2u64, 2, 3] {
            expected.extend_from_slice(&offset.to_le_bytes());
        }
        expected.extend_from_slice(&[1, 2, 3]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_map_and_tuple_columns() {
        let bytes = round_trip(
            "Map(String, UInt8)",
            vec![
                Value::Map(vec![(Value::from("b"), Value::UInt8(1)), (Value::from("a"), Value::UInt8(2))]),
                Value::Map(vec![]),
            ],
        );
        assert_eq!(&bytes[16..], &[1, b'b', 1, b'a', 1, 2]);

        let bytes = round_trip(
            "Tuple(UInt8, String)",
            vec![
                Value::Tuple(vec![Value::UInt8(1), Value::from("x")]),
                Value::Tuple(vec![Value::UInt8(2), Value::from("y")]),
            ],
        );
        assert_eq!(bytes, vec![1, 2, 1, b'x', 1, b'y']);
    }

    #[test]
    fn test_nested_columns() {
        let row = |pairs: &[(i8, &str)]| {
            Value::Array(
                pairs
                    .iter()
                    .map(|(n, s)| Value::Tuple(vec![Value::Int8(*n), Value::from(*s)]))
                    .collect(),
            )
        };
        let bytes = round_trip("Nested(n Int8, s String)", vec![row(&[(1, "a"), (2, "b")]), row(&[(3, "c")])]);
        assert_eq!(&bytes[16..], &[1, 2, 3, 1, b'a', 1, b'b', 1, b'c']);
    }

    #[test]
    fn test_variant_columns() {
        let bytes = round_trip(
            "Variant(String, UInt8)",
            vec![
                Value::Tuple(vec![Value::Null, Value::UInt8(9)]),
                Value::Null,
                Value::Tuple(vec![Value::from("s"), Value::Null]),
            ],
        );
        let mut expected = 0u64.to_le_bytes().to_vec();
        expected.extend_from_slice(&[1, 255, 0, 1, b's', 9]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_low_cardinality_nested_in_array() {
        round_trip(
            "Array(LowCardinality(Nullable(String)))",
            vec![
                Value::Array(vec![Value::from("a"), Value::Null]),
                Value::Array(vec![Value::from("a")]),
            ],
        );
    }

    #[test]
    fn test_geo_columns() {
        let ring = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.5)];
        round_trip("Point", vec![Value::Point(Point::new(1.5, -2.0))]);
        round_trip("Ring", vec![Value::Ring(ring.clone()), Value::Ring(vec![])]);
        round_trip("MultiPolygon", vec![Value::MultiPolygon(vec![vec![ring]])]);
    }

    #[test]
    fn test_nothing_column() {
        let codec = ColumnCodec::build(
            &CodecBuilder::default(),
            &Column::nullable("n", DataType::Nothing),
        )
        .unwrap();
        let bytes = write(&codec, &[Value::Null, Value::Null]);
        assert_eq!(bytes, vec![1, 1, b'0', b'0']);
        assert_eq!(read(&codec, &bytes, 2), vec![Value::Null, Value::Null]);
    }

    #[test]
    fn test_decreasing_offsets_rejected() {
        let codec = codec("Array(UInt8)");
        let mut bytes = 2u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1u64.to_le_bytes());
        let err = codec.read_column(2, &mut ByteReader::new(&bytes[..])).unwrap_err();
        assert!(matches!(err, CodecError::Protocol(_)));
    }

    #[test]
    fn test_huge_offset_reports_end_of_stream() {
        // 偏移声称有 2^62 个元素，实际只有两个字节
        let mut bytes = (1u64 << 62).to_le_bytes().to_vec();
        bytes.extend_from_slice(&[1, b'a']);
        for type_name in ["Array(String)", "Array(Int8)", "Map(String, String)", "Nested(s String)"] {
            let err = codec(type_name)
                .read_column(1, &mut ByteReader::new(&bytes[..]))
                .unwrap_err();
            assert!(err.is_end_of_stream(), "{}: {}", type_name, err);
        }
    }

    #[test]
    fn test_huge_row_count_reports_end_of_stream() {
        for type_name in ["String", "Nullable(Int8)", "Tuple(String, Int8)", "Variant(String, Int8)"] {
            let err = codec(type_name)
                .read_column(1 << 62, &mut ByteReader::new(&[1u8, b'a', 0][..]))
                .unwrap_err();
            assert!(err.is_end_of_stream(), "{}: {}", type_name, err);
        }
    }
}
