//! 集成测试共享工具模块
//!
//! 提供按类型字符串构造编解码器、编码解码单个值以及整表读写的辅助函数

#![allow(dead_code)]

pub mod assertions;

use chcodec::config::CodecConfig;
use chcodec::core::codec::{ByteReader, ByteWriter, Codec, CodecBuilder};
use chcodec::core::types::Column;
use chcodec::core::value::Value;
use chcodec::format::{open_reader, open_writer, Format};

/// 按 (列名, 类型) 列表构造列描述
pub fn columns(pairs: &[(&str, &str)]) -> Vec<Column> {
    pairs.iter()
        .map(|(name, type_name)| Column::parse(name, type_name).expect("类型字符串应能解析"))
        .collect()
}

pub fn codec(type_name: &str) -> Codec {
    codec_with(&CodecBuilder::default(), type_name)
}

pub fn codec_with(builder: &CodecBuilder, type_name: &str) -> Codec {
    let column = Column::parse("c", type_name).expect("类型字符串应能解析");
    builder.build(&column).expect("应能构造编解码器")
}

pub fn encode(codec: &Codec, value: &Value) -> Vec<u8> {
    let mut output = ByteWriter::new(Vec::new());
    codec.encode(value, &mut output).expect("编码应该成功");
    output.into_inner()
}

/// 解码并确认输入被完整消费
pub fn decode(codec: &Codec, bytes: &[u8]) -> Value {
    let mut input = ByteReader::new(bytes);
    let mut cell = Value::Null;
    codec.decode(&mut cell, &mut input).expect("解码应该成功");
    assert_eq!(input.available().expect("读取剩余字节失败"), 0, "存在未消费的字节");
    cell
}

/// 编码后再解码，断言结果与原值相同，返回编码字节
pub fn round_trip(type_name: &str, value: &Value) -> Vec<u8> {
    let codec = codec(type_name);
    let bytes = encode(&codec, value);
    pretty_assertions::assert_eq!(&decode(&codec, &bytes), value, "{}", type_name);
    bytes
}

pub fn config(format: Format) -> CodecConfig {
    CodecConfig {
        format,
        ..CodecConfig::default()
    }
}

pub fn write_rows(config: &CodecConfig, columns: &[Column], rows: &[Vec<Value>]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut writer = open_writer(config, &mut buffer, columns.to_vec()).expect("打开写入驱动失败");
        for row in rows {
            writer.write_row(row).expect("写入行失败");
        }
        writer.finish().expect("结束写入失败");
    }
    buffer
}

pub fn read_rows(
    config: &CodecConfig,
    bytes: &[u8],
    columns: Option<Vec<Column>>,
) -> (Vec<Column>, Vec<Vec<Value>>) {
    let mut reader = open_reader(config, bytes, columns).expect("打开读取驱动失败");
    let header = reader.read_columns().expect("读取列描述失败").to_vec();
    let mut rows = Vec::new();
    while reader.has_more_rows().expect("检查剩余行失败") {
        rows.push(reader.read_row().expect("读取行失败").to_vec());
    }
    assert_eq!(reader.rows_read(), rows.len() as u64);
    (header, rows)
}
