//! 变长无符号整数
//!
//! 每字节低 7 位为数据，最高位表示后面还有字节。读写最多 9 个字节，
//! 超出部分直接截断，与服务端协议的迭代上限保持一致。

use std::io::{Read, Write};

use super::error::CodecResult;
use super::stream::{ByteReader, ByteWriter};

pub const MAX_VARINT_BYTES: usize = 9;

pub fn read_var_int<R: Read>(input: &mut ByteReader<R>) -> CodecResult<u64> {
    let mut result: u64 = 0;
    for i in 0..MAX_VARINT_BYTES {
        let b = input.read_byte()?;
        result |= ((b & 0x7F) as u64) << (7 * i);
        if b & 0x80 == 0 {
            break;
        }
    }
    Ok(result)
}

pub fn write_var_int<W: Write>(output: &mut ByteWriter<W>, mut value: u64) -> CodecResult<()> {
    for _ in 0..MAX_VARINT_BYTES {
        let mut b = (value & 0x7F) as u8;
        if value > 0x7F {
            b |= 0x80;
        }
        output.write_byte(b)?;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    Ok(())
}

/// 编码后的字节数
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).clamp(1, MAX_VARINT_BYTES)
}
