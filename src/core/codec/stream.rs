//! 字节流抽象
//!
//! `ByteReader` 在 `BufReader` 之上提供按字节、定长缓冲区、变长整数和字符串的读取，
//! 读到流末尾时先关闭底层读取器再返回 `EndOfStream`。`ByteWriter` 为对称的写入端。

use std::io::{BufRead, BufReader, Read, Write};

use super::error::{CodecError, CodecResult};
use super::varint;

pub struct ByteReader<R: Read> {
    inner: Option<BufReader<R>>,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: Some(BufReader::new(inner)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// 释放底层读取器，之后的读取都返回 `EndOfStream`
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            log::trace!("input stream closed");
        }
    }

    fn reader(&mut self) -> CodecResult<&mut BufReader<R>> {
        self.inner.as_mut().ok_or(CodecError::EndOfStream)
    }

    fn end_of_stream(&mut self) -> CodecError {
        self.close();
        CodecError::EndOfStream
    }

    /// 无需阻塞等待即可读取的字节数；已关闭或到达末尾时为 0
    pub fn available(&mut self) -> CodecResult<usize> {
        match self.inner.as_mut() {
            None => Ok(0),
            Some(reader) => Ok(reader.fill_buf()?.len()),
        }
    }

    pub fn read_byte(&mut self) -> CodecResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact_into(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_boolean(&mut self) -> CodecResult<bool> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::out_of_range("boolean byte", other)),
        }
    }

    pub fn read_exact_into(&mut self, buf: &mut [u8]) -> CodecResult<()> {
        let result = self.reader()?.read_exact(buf);
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(self.end_of_stream()),
            Err(e) => Err(e.into()),
        }
    }

    /// 读取定长缓冲区
    pub fn read_buffer<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact_into(&mut buf)?;
        Ok(buf)
    }

    /// 读取 `n` 个字节；不按声明长度预分配，避免损坏的长度前缀造成巨额分配
    pub fn read_bytes(&mut self, n: usize) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        let result = self.reader()?.by_ref().take(n as u64).read_to_end(&mut buf);
        result?;
        if buf.len() < n {
            return Err(self.end_of_stream());
        }
        Ok(buf)
    }

    pub fn skip(&mut self, n: usize) -> CodecResult<()> {
        let result = std::io::copy(&mut self.reader()?.by_ref().take(n as u64), &mut std::io::sink());
        if (result? as usize) < n {
            return Err(self.end_of_stream());
        }
        Ok(())
    }

    pub fn read_var_int(&mut self) -> CodecResult<u64> {
        varint::read_var_int(self)
    }

    /// 变长整数作为长度使用
    pub fn read_length(&mut self) -> CodecResult<usize> {
        let len = self.read_var_int()?;
        usize::try_from(len).map_err(|_| CodecError::Protocol(format!("length {} too large", len)))
    }

    pub fn read_binary_string(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.read_length()?;
        self.read_bytes(len)
    }

    /// 长度前缀的 UTF-8 字符串，非法序列以替换字符代替
    pub fn read_unicode_string(&mut self) -> CodecResult<String> {
        let bytes = self.read_binary_string()?;
        Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

pub struct ByteWriter<W: Write> {
    inner: W,
}

impl<W: Write> ByteWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_byte(&mut self, b: u8) -> CodecResult<()> {
        self.inner.write_all(&[b])?;
        Ok(())
    }

    pub fn write_boolean(&mut self, b: bool) -> CodecResult<()> {
        self.write_byte(b as u8)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    pub fn write_var_int(&mut self, value: u64) -> CodecResult<()> {
        varint::write_var_int(self, value)
    }

    pub fn write_binary_string(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.write_var_int(bytes.len() as u64)?;
        self.write_bytes(bytes)
    }

    pub fn write_unicode_string(&mut self, s: &str) -> CodecResult<()> {
        self.write_binary_string(s.as_bytes())
    }

    pub fn flush(&mut self) -> CodecResult<()> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_past_end_closes() {
        let mut input = ByteReader::new(&[1u8, 2][..]);
        assert_eq!(input.read_byte().unwrap(), 1);
        let err = input.read_buffer::<4>().unwrap_err();
        assert!(matches!(err, CodecError::EndOfStream));
        assert!(input.is_closed());
        assert_eq!(input.available().unwrap(), 0);
    }

    #[test]
    fn test_read_bytes_short() {
        let mut input = ByteReader::new(&[1u8, 2, 3][..]);
        assert!(matches!(input.read_bytes(5), Err(CodecError::EndOfStream)));
        assert!(input.is_closed());
    }

    #[test]
    fn test_read_boolean_range() {
        let mut input = ByteReader::new(&[0u8, 1, 2][..]);
        assert!(!input.read_boolean().unwrap());
        assert!(input.read_boolean().unwrap());
        assert!(matches!(input.read_boolean(), Err(CodecError::OutOfRange(_))));
    }

    #[test]
    fn test_string_round_trip() {
        let mut out = ByteWriter::new(Vec::new());
        out.write_unicode_string("héllo").unwrap();
        let bytes = out.into_inner();
        assert_eq!(bytes[0], 6);

        let mut input = ByteReader::new(&bytes[..]);
        assert_eq!(input.available().unwrap(), 7);
        assert_eq!(input.read_unicode_string().unwrap(), "héllo");
        assert_eq!(input.available().unwrap(), 0);
    }

    #[test]
    fn test_skip() {
        let mut input = ByteReader::new(&[1u8, 2, 3][..]);
        input.skip(2).unwrap();
        assert_eq!(input.read_byte().unwrap(), 3);
        assert!(input.skip(1).is_err());
    }
}
