//! Native 列式格式集成测试
//!
//! 测试范围:
//! - 块的写入与读取往返
//! - 低基数列的字典去重、下标宽度与多分片
//! - 复合列类型
//! - 块切分、空结果与截断

mod common;

use chcodec::core::codec::{ByteWriter, CodecBuilder, CodecError};
use chcodec::core::types::Column;
use chcodec::core::value::Value;
use chcodec::format::native::{Block, NativeReader, NativeWriter};
use chcodec::format::{open_reader, open_writer, Format, RecordWriter};
use chcodec::CodecConfig;
use common::assertions::{assert_ok, assert_root_err};
use common::{columns, config, read_rows, write_rows};
use pretty_assertions::assert_eq;

/// 块头部：列数、行数之后紧跟首列的名称与类型
fn header(column: &Column, rows: u8) -> Vec<u8> {
    let mut out = ByteWriter::new(Vec::new());
    out.write_var_int(1).unwrap();
    out.write_var_int(rows as u64).unwrap();
    out.write_unicode_string(&column.name).unwrap();
    out.write_unicode_string(&column.type_name()).unwrap();
    out.into_inner()
}

fn lc_chunk(keys: &[&str], indices: &[u8]) -> Vec<u8> {
    let mut out = ((1u64 << 9) | (1u64 << 10)).to_le_bytes().to_vec();
    out.extend_from_slice(&(keys.len() as u64).to_le_bytes());
    for key in keys {
        out.push(key.len() as u8);
        out.extend_from_slice(key.as_bytes());
    }
    out.extend_from_slice(&(indices.len() as u64).to_le_bytes());
    out.extend_from_slice(indices);
    out
}

#[test]
fn test_two_columns_three_rows_round_trip() {
    let config = config(Format::Native);
    let columns = columns(&[("id", "UInt32"), ("name", "String")]);
    let rows = vec![
        vec![Value::UInt32(1), Value::from("one")],
        vec![Value::UInt32(2), Value::from("two")],
        vec![Value::UInt32(3), Value::from("three")],
    ];
    let bytes = write_rows(&config, &columns, &rows);
    assert_eq!(&bytes[..2], &[2, 3]);

    let (header, read) = read_rows(&config, &bytes, None);
    assert_eq!(header, columns);
    assert_eq!(read, rows);
}

#[test]
fn test_low_cardinality_dictionary_layout() {
    let column = Column::parse("s", "LowCardinality(String)").unwrap();
    let mut writer =
        NativeWriter::with_builder(&CodecBuilder::default(), 16, Vec::new(), vec![column.clone()]).unwrap();
    for s in ["a", "b", "a"] {
        writer.write_row(&[Value::from(s)]).unwrap();
    }
    writer.finish().unwrap();

    let mut expected = header(&column, 3);
    expected.extend_from_slice(&1u64.to_le_bytes());
    expected.extend(lc_chunk(&["a", "b"], &[0, 1, 0]));
    assert_eq!(writer.into_inner(), expected);
}

#[test]
fn test_nullable_low_cardinality_placeholder() {
    let column = Column::parse("s", "LowCardinality(Nullable(String))").unwrap();
    let rows = vec![vec![Value::from("x")], vec![Value::Null], vec![Value::from("x")]];
    let mut writer =
        NativeWriter::with_builder(&CodecBuilder::default(), 16, Vec::new(), vec![column.clone()]).unwrap();
    for row in &rows {
        writer.write_row(row).unwrap();
    }
    writer.finish().unwrap();
    let bytes = writer.into_inner();

    let mut expected = header(&column, 3);
    expected.extend_from_slice(&1u64.to_le_bytes());
    expected.extend(lc_chunk(&["", "x"], &[1, 0, 1]));
    assert_eq!(bytes, expected);

    let (_, read) = read_rows(&config(Format::Native), &bytes, None);
    assert_eq!(read, rows);
}

#[test]
fn test_low_cardinality_wide_index() {
    let config = CodecConfig {
        format: Format::Native,
        block_rows: 1024,
        ..CodecConfig::default()
    };
    let columns = columns(&[("s", "LowCardinality(String)")]);
    let rows: Vec<Vec<Value>> = (0..300).map(|i| vec![Value::from(format!("v{}", i).as_str())]).collect();
    let bytes = write_rows(&config, &columns, &rows);

    // 300 行的行数占两个字节，再跳过 8 字节前缀
    let offset = header(&columns[0], 0).len() + 1 + 8;
    let type_word = u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap());
    assert_eq!(type_word & 0x0F, 1);

    let (_, read) = read_rows(&config, &bytes, None);
    assert_eq!(read, rows);
}

#[test]
fn test_low_cardinality_multiple_chunks() {
    let column = Column::parse("s", "LowCardinality(String)").unwrap();
    let mut bytes = header(&column, 3);
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.extend(lc_chunk(&["a"], &[0, 0]));
    bytes.extend(lc_chunk(&["b"], &[0]));

    let (_, read) = read_rows(&config(Format::Native), &bytes, None);
    assert_eq!(
        read,
        vec![vec![Value::from("a")], vec![Value::from("a")], vec![Value::from("b")]]
    );
}

#[test]
fn test_low_cardinality_rejects_global_dictionary() {
    let column = Column::parse("s", "LowCardinality(String)").unwrap();
    let mut bytes = header(&column, 1);
    bytes.extend_from_slice(&1u64.to_le_bytes());
    let mut chunk = lc_chunk(&["a"], &[0]);
    chunk[1] |= 1;
    bytes.extend(chunk);

    let mut reader = NativeReader::with_builder(CodecBuilder::default(), &bytes[..]);
    assert_root_err(reader.read_block(), |e| matches!(e, CodecError::Protocol(_)));
}

#[test]
fn test_composite_columns_round_trip() {
    let config = config(Format::Native);
    let columns = columns(&[
        ("maybe", "Nullable(Int64)"),
        ("list", "Array(Nullable(String))"),
        ("dict", "Map(String, Array(UInt8))"),
        ("either", "Variant(String, UInt64)"),
        ("points", "Nested(x Float64, y Float64)"),
        ("at", "DateTime64(3, 'UTC')"),
    ]);
    let point = |x: f64, y: f64| Value::Tuple(vec![Value::Float64(x), Value::Float64(y)]);
    let at = chrono::NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_milli_opt(12, 0, 0, 250)
        .unwrap();
    let rows = vec![
        vec![
            Value::Int64(-5),
            Value::Array(vec![Value::from("a"), Value::Null]),
            Value::Map(vec![(Value::from("k"), Value::Array(vec![Value::UInt8(1)]))]),
            Value::Tuple(vec![Value::from("s"), Value::Null]),
            Value::Array(vec![point(1.0, 2.0), point(3.0, 4.0)]),
            Value::DateTime(at),
        ],
        vec![
            Value::Null,
            Value::Array(vec![]),
            Value::Map(vec![]),
            Value::Null,
            Value::Array(vec![]),
            Value::DateTime(at),
        ],
        vec![
            Value::Int64(7),
            Value::Array(vec![Value::Null]),
            Value::Map(vec![(Value::from("z"), Value::Array(vec![]))]),
            Value::Tuple(vec![Value::Null, Value::UInt64(42)]),
            Value::Array(vec![point(-1.0, 0.5)]),
            Value::DateTime(at),
        ],
    ];
    let bytes = write_rows(&config, &columns, &rows);
    let (header, read) = read_rows(&config, &bytes, None);
    assert_eq!(header, columns);
    assert_eq!(read, rows);
}

#[test]
fn test_variant_selection_by_runtime_type() {
    let config = config(Format::Native);
    let columns = columns(&[("v", "Variant(String, UInt64)")]);
    let bytes = write_rows(&config, &columns, &[vec![Value::UInt64(3)], vec![Value::from("t")]]);
    let (_, read) = read_rows(&config, &bytes, None);
    assert_eq!(
        read,
        vec![
            vec![Value::Tuple(vec![Value::Null, Value::UInt64(3)])],
            vec![Value::Tuple(vec![Value::from("t"), Value::Null])],
        ]
    );
}

#[test]
fn test_blocks_split_by_block_rows() {
    let config = CodecConfig {
        format: Format::Native,
        block_rows: 2,
        ..CodecConfig::default()
    };
    let columns = columns(&[("n", "Int16")]);
    let rows: Vec<Vec<Value>> = (0..5).map(|i| vec![Value::Int16(i)]).collect();
    let bytes = write_rows(&config, &columns, &rows);

    let mut reader = assert_ok(NativeReader::new(&config, &bytes[..]));
    let mut sizes = Vec::new();
    while let Some(block) = assert_ok(reader.read_block()) {
        sizes.push(block.row_count());
    }
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(reader.blocks_read(), 3);
}

#[test]
fn test_write_block_then_read_block() {
    let columns = columns(&[("k", "String"), ("v", "Nullable(Float32)")]);
    let block = Block::from_columns(
        columns.clone(),
        vec![
            vec![Value::from("a"), Value::from("b")],
            vec![Value::Float32(1.5), Value::Null],
        ],
    )
    .unwrap();
    let mut writer = NativeWriter::with_builder(&CodecBuilder::default(), 8, Vec::new(), columns).unwrap();
    writer.write_block(&block).unwrap();
    writer.finish().unwrap();
    assert_eq!(writer.rows_written(), 2);
    let bytes = writer.into_inner();

    let mut reader = NativeReader::with_builder(CodecBuilder::default(), &bytes[..]);
    assert_eq!(reader.read_block().unwrap(), Some(block));
    assert_eq!(reader.read_block().unwrap(), None);
}

#[test]
fn test_empty_output_keeps_header() {
    let config = config(Format::Native);
    let columns = columns(&[("a", "UUID"), ("b", "IPv4")]);
    let bytes = write_rows(&config, &columns, &[]);
    let (header, rows) = read_rows(&config, &bytes, None);
    assert_eq!(header, columns);
    assert!(rows.is_empty());
}

#[test]
fn test_truncated_block() {
    let config = config(Format::Native);
    let columns = columns(&[("a", "UInt64"), ("b", "String")]);
    let mut bytes = write_rows(&config, &columns, &[vec![Value::UInt64(1), Value::from("abc")]]);
    bytes.truncate(bytes.len() - 2);

    let mut reader = open_reader(&config, &bytes[..], None).unwrap();
    let err = reader.read_columns().map(|_| ()).unwrap_err();
    assert!(err.is_end_of_stream(), "{:?}", err);
    assert!(err.to_string().contains("Column b"), "{}", err);
}

#[test]
fn test_bad_value_leaves_output_untouched() {
    let config = CodecConfig {
        format: Format::Native,
        block_rows: 1,
        ..CodecConfig::default()
    };
    let mut buffer = Vec::new();
    {
        let mut writer = open_writer(&config, &mut buffer, columns(&[("n", "UInt8")])).unwrap();
        let err = writer.write_row(&[Value::Int32(1000)]).unwrap_err();
        assert!(matches!(err.root(), CodecError::OutOfRange(_)), "{:?}", err);
    }
    assert!(buffer.is_empty());
}

#[test]
fn test_writer_recovers_after_bad_row() {
    let config = CodecConfig {
        format: Format::Native,
        block_rows: 1,
        ..CodecConfig::default()
    };
    let columns = columns(&[("n", "UInt8"), ("s", "LowCardinality(String)")]);
    let mut buffer = Vec::new();
    {
        let mut writer = open_writer(&config, &mut buffer, columns.clone()).unwrap();
        assert!(writer.write_row(&[Value::Int32(-1), Value::from("bad")]).is_err());
        writer.write_row(&[Value::UInt8(5), Value::from("ok")]).unwrap();
        assert!(writer.write_value(&Value::Int32(256)).is_err());
        writer.write_value(&Value::UInt8(6)).unwrap();
        writer.write_value(&Value::from("ok")).unwrap();
        writer.finish().unwrap();
        assert_eq!(writer.rows_written(), 2);
    }

    let (_, rows) = read_rows(&config, &buffer, None);
    assert_eq!(
        rows,
        vec![
            vec![Value::UInt8(5), Value::from("ok")],
            vec![Value::UInt8(6), Value::from("ok")],
        ]
    );
}

#[test]
fn test_writer_rejects_empty_columns() {
    assert_root_err(open_writer(&config(Format::Native), Vec::new(), Vec::new()), |e| {
        matches!(e, CodecError::Protocol(_))
    });
}

#[test]
fn test_huge_row_count_is_end_of_stream() {
    let column = Column::parse("a", "Int8").unwrap();
    let mut bytes = vec![1];
    bytes.extend_from_slice(&[0x80; 8]);
    bytes.push(0x40);
    bytes.extend_from_slice(&header(&column, 0)[2..]);

    let mut reader = open_reader(&config(Format::Native), &bytes[..], None).unwrap();
    let err = reader.read_columns().map(|_| ()).unwrap_err();
    assert!(err.is_end_of_stream(), "{:?}", err);
    assert!(err.to_string().contains("Column a"), "{}", err);
}
