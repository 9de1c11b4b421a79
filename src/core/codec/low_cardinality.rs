//! 低基数（字典）列编解码
//!
//! 列式格式中的布局：
//! - 状态前缀：8 字节版本号，固定为 1（共享字典键）
//! - 每个块：8 字节序列化类型字（低 4 位为下标宽度 0/1/2/3 → 8/16/32/64 位，
//!   以及 `HAS_ADDITIONAL_KEYS`、`NEED_UPDATE_DICTIONARY` 标志），8 字节字典项数，字典项，
//!   8 字节行数，下标数组
//!
//! 可空列的字典第 0 项是空值占位，下标 0 即表示 NULL。

use std::collections::HashMap;
use std::io::{Read, Write};

use super::composite::{ArrayCodec, Codec, LengthMode};
use super::error::{CodecError, CodecResult};
use super::primitive::IntKind;
use super::stream::{ByteReader, ByteWriter};
use crate::core::value::Value;

pub const SHARED_KEYS_VERSION: u64 = 1;

pub const KEY_WIDTH_MASK: u64 = 0x0F;
pub const NEED_GLOBAL_DICTIONARY: u64 = 1 << 8;
pub const HAS_ADDITIONAL_KEYS: u64 = 1 << 9;
pub const NEED_UPDATE_DICTIONARY: u64 = 1 << 10;

#[derive(Debug, Clone)]
pub struct LowCardinalityCodec {
    keys: ArrayCodec,
    nullable: bool,
}

impl LowCardinalityCodec {
    /// `dictionary` 为字典项的编解码器，不带可空包装
    pub fn new(dictionary: Codec, nullable: bool) -> Self {
        Self {
            keys: ArrayCodec::new(dictionary.unwrap_nullable().clone(), LengthMode::External),
            nullable,
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn dictionary(&self) -> &Codec {
        self.keys.element()
    }

    pub fn default_value(&self) -> Value {
        if self.nullable {
            Value::Null
        } else {
            self.keys.element().default_value()
        }
    }

    pub fn read_prefix<R: Read>(&self, input: &mut ByteReader<R>) -> CodecResult<()> {
        let version = read_u64(input)?;
        if version != SHARED_KEYS_VERSION {
            return Err(CodecError::Protocol(format!(
                "Unexpected low cardinality version: {}",
                version
            )));
        }
        Ok(())
    }

    pub fn write_prefix<W: Write>(&self, output: &mut ByteWriter<W>) -> CodecResult<()> {
        output.write_bytes(&SHARED_KEYS_VERSION.to_le_bytes())
    }

    fn index_kind(type_word: u64) -> CodecResult<IntKind> {
        if type_word & NEED_GLOBAL_DICTIONARY != 0 {
            return Err(CodecError::Protocol(
                "global low cardinality dictionaries are not supported".to_string(),
            ));
        }
        if type_word & HAS_ADDITIONAL_KEYS == 0 {
            return Err(CodecError::Protocol(
                "low cardinality block without additional keys".to_string(),
            ));
        }
        match type_word & KEY_WIDTH_MASK {
            0 => Ok(IntKind::U8),
            1 => Ok(IntKind::U16),
            2 => Ok(IntKind::U32),
            3 => Ok(IntKind::U64),
            other => Err(CodecError::Protocol(format!(
                "Unexpected low cardinality key type: {}",
                other
            ))),
        }
    }

    fn width_code(kind: IntKind) -> u64 {
        match kind.byte_len() {
            1 => 0,
            2 => 1,
            4 => 2,
            _ => 3,
        }
    }

    /// 解码一个块中的 `rows` 行，可能跨越多个字典分片
    pub fn read_body<R: Read>(&self, rows: usize, input: &mut ByteReader<R>) -> CodecResult<Vec<Value>> {
        let mut cells = Vec::new();
        let mut keys: Vec<Value> = Vec::new();
        while cells.len() < rows {
            let type_word = read_u64(input)?;
            let index_kind = Self::index_kind(type_word)?;
            if type_word & NEED_UPDATE_DICTIONARY == 0 {
                log::warn!("low cardinality chunk without NeedUpdateDictionary flag: {:#x}", type_word);
            }

            let key_count = read_len(input)?;
            self.keys.decode_into(&mut keys, key_count, input)?;

            let chunk_rows = read_len(input)?;
            if chunk_rows > rows - cells.len() {
                return Err(CodecError::Protocol(format!(
                    "low cardinality chunk of {} rows exceeds block of {} rows",
                    chunk_rows, rows
                )));
            }

            let width = index_kind.byte_len();
            let total = chunk_rows
                .checked_mul(width)
                .ok_or_else(|| CodecError::Protocol(format!("{} low cardinality rows too large", chunk_rows)))?;
            let raw = input.read_bytes(total)?;
            for chunk in raw.chunks_exact(width) {
                let mut buf = [0u8; 8];
                buf[..width].copy_from_slice(chunk);
                let index = u64::from_le_bytes(buf);
                let slot = usize::try_from(index)
                    .ok()
                    .filter(|&i| i < key_count)
                    .ok_or_else(|| {
                        CodecError::Protocol(format!(
                            "low cardinality index {} out of {} keys",
                            index, key_count
                        ))
                    })?;
                cells.push(if self.nullable && slot == 0 {
                    Value::Null
                } else {
                    keys[slot].clone()
                });
            }
        }
        Ok(cells)
    }

    /// 把一个块的所有值写成单个字典分片；空块不写任何内容
    pub fn write_body<W: Write>(&self, values: &[&Value], output: &mut ByteWriter<W>) -> CodecResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let element = self.keys.element();
        let mut dictionary: Vec<Vec<u8>> = Vec::new();
        if self.nullable {
            let mut placeholder = ByteWriter::new(Vec::new());
            element.encode(&element.default_value(), &mut placeholder)?;
            dictionary.push(placeholder.into_inner());
        }

        let mut lookup: HashMap<Vec<u8>, usize> = HashMap::new();
        let mut indices = Vec::with_capacity(values.len());
        for value in values {
            if value.is_null() {
                if !self.nullable {
                    return Err(CodecError::mismatch("non-null low cardinality value", value));
                }
                indices.push(0usize);
                continue;
            }
            let mut scratch = ByteWriter::new(Vec::new());
            element.encode(value, &mut scratch)?;
            let bytes = scratch.into_inner();
            let index = match lookup.get(&bytes) {
                Some(&index) => index,
                None => {
                    let index = dictionary.len();
                    dictionary.push(bytes.clone());
                    lookup.insert(bytes, index);
                    index
                }
            };
            indices.push(index);
        }

        let index_kind = IntKind::index_for(dictionary.len());
        let width = index_kind.byte_len();
        let type_word = Self::width_code(index_kind) | HAS_ADDITIONAL_KEYS | NEED_UPDATE_DICTIONARY;
        output.write_bytes(&type_word.to_le_bytes())?;
        output.write_bytes(&(dictionary.len() as u64).to_le_bytes())?;
        for key in &dictionary {
            output.write_bytes(key)?;
        }
        output.write_bytes(&(indices.len() as u64).to_le_bytes())?;
        let mut raw = Vec::with_capacity(indices.len() * width);
        for index in indices {
            raw.extend_from_slice(&(index as u64).to_le_bytes()[..width]);
        }
        output.write_bytes(&raw)
    }

    /// 前缀加单个块，用于独立的一列
    pub fn decode<R: Read>(&self, rows: usize, input: &mut ByteReader<R>) -> CodecResult<Vec<Value>> {
        self.read_prefix(input)?;
        self.read_body(rows, input)
    }

    pub fn encode<W: Write>(&self, values: &[&Value], output: &mut ByteWriter<W>) -> CodecResult<()> {
        self.write_prefix(output)?;
        self.write_body(values, output)
    }
}

fn read_u64<R: Read>(input: &mut ByteReader<R>) -> CodecResult<u64> {
    Ok(u64::from_le_bytes(input.read_buffer()?))
}

fn read_len<R: Read>(input: &mut ByteReader<R>) -> CodecResult<usize> {
    let n = read_u64(input)?;
    usize::try_from(n).map_err(|_| CodecError::Protocol(format!("length {} too large", n)))
}
