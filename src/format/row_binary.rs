//! RowBinary 系列格式驱动
//!
//! 每行按列顺序依次编码各列的值，无分隔符。`RowBinaryWithNames` 在流开头写入
//! 变长整数列数与各列名，`RowBinaryWithNamesAndTypes` 再接各列类型名。

use std::io::{Read, Write};

use crate::config::CodecConfig;
use crate::core::codec::{ByteReader, ByteWriter, Codec, CodecBuilder, CodecError, CodecResult};
use crate::core::types::{Column, DataType};
use crate::core::value::Value;

use super::{Format, RecordReader, RecordWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    AwaitHeader,
    ReadingRow,
    Exhausted,
}

pub struct RowBinaryReader<R: Read> {
    input: ByteReader<R>,
    format: Format,
    builder: CodecBuilder,
    columns: Vec<Column>,
    codecs: Vec<Codec>,
    cells: Vec<Value>,
    state: ReaderState,
    rows: u64,
}

impl<R: Read> RowBinaryReader<R> {
    pub fn new(config: &CodecConfig, input: R, columns: Option<Vec<Column>>) -> CodecResult<Self> {
        Self::with_builder(CodecBuilder::new(config)?, config.format, input, columns)
    }

    pub fn with_builder(
        builder: CodecBuilder,
        format: Format,
        input: R,
        columns: Option<Vec<Column>>,
    ) -> CodecResult<Self> {
        if !format.is_row_binary() {
            return Err(CodecError::Unsupported(format!("{} is not a row format", format)));
        }
        let columns = match columns {
            Some(columns) => columns,
            None if format.has_names() => Vec::new(),
            None => {
                return Err(CodecError::Config(format!(
                    "{} requires column descriptors",
                    format
                )))
            }
        };
        Ok(Self {
            input: ByteReader::new(input),
            format,
            builder,
            columns,
            codecs: Vec::new(),
            cells: Vec::new(),
            state: ReaderState::AwaitHeader,
            rows: 0,
        })
    }

    fn read_header(&mut self) -> CodecResult<()> {
        if self.state != ReaderState::AwaitHeader {
            return Ok(());
        }
        if self.format.has_names() {
            let count = self.input.read_length()?;
            let mut names = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                names.push(self.input.read_unicode_string()?);
            }
            if self.format.has_types() {
                let mut columns = Vec::with_capacity(names.len());
                for name in names {
                    let type_name = self.input.read_unicode_string()?;
                    columns.push(Column::parse(&name, &type_name)?);
                }
                self.columns = columns;
            } else if self.columns.is_empty() {
                // 只有列名时各列按可空字符串读取
                self.columns = names
                    .into_iter()
                    .map(|name| Column::nullable(name, DataType::String))
                    .collect();
            } else {
                if names.len() != self.columns.len() {
                    return Err(CodecError::Protocol(format!(
                        "Expect {} columns but the header lists {}",
                        self.columns.len(),
                        names.len()
                    )));
                }
                for (column, name) in self.columns.iter_mut().zip(names) {
                    column.name = name;
                }
            }
        }
        if self.columns.is_empty() {
            return Err(CodecError::Protocol("no columns to read".to_string()));
        }
        self.codecs = self.builder.build_all(&self.columns)?;
        self.cells = self.codecs.iter().map(Codec::default_value).collect();
        self.state = ReaderState::ReadingRow;
        log::debug!("{} header: {} columns", self.format, self.columns.len());
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// 读取一行到调用方提供的单元格
    pub fn read_row_into(&mut self, cells: &mut [Value]) -> CodecResult<()> {
        if !self.has_more_rows()? {
            return Err(CodecError::EndOfStream);
        }
        if cells.len() != self.codecs.len() {
            return Err(CodecError::Protocol(format!(
                "Expect {} cells but got {}",
                self.codecs.len(),
                cells.len()
            )));
        }
        let result = decode_row(&self.columns, &self.codecs, cells, &mut self.input);
        self.after_row(result)
    }

    fn after_row(&mut self, result: CodecResult<()>) -> CodecResult<()> {
        match result {
            Ok(()) => {
                self.rows += 1;
                Ok(())
            }
            Err(e) => {
                if e.is_end_of_stream() {
                    self.state = ReaderState::Exhausted;
                }
                Err(e)
            }
        }
    }
}

fn decode_row<R: Read>(
    columns: &[Column],
    codecs: &[Codec],
    cells: &mut [Value],
    input: &mut ByteReader<R>,
) -> CodecResult<()> {
    for ((column, codec), cell) in columns.iter().zip(codecs).zip(cells.iter_mut()) {
        codec
            .decode(cell, input)
            .map_err(|e| e.in_column(&column.name, &column.type_name()))?;
    }
    Ok(())
}

impl<R: Read> RecordReader for RowBinaryReader<R> {
    fn read_columns(&mut self) -> CodecResult<&[Column]> {
        self.read_header()?;
        Ok(&self.columns)
    }

    fn has_more_rows(&mut self) -> CodecResult<bool> {
        self.read_header()?;
        if self.state == ReaderState::Exhausted {
            return Ok(false);
        }
        if self.input.available()? == 0 {
            log::debug!("{} exhausted after {} rows", self.format, self.rows);
            self.state = ReaderState::Exhausted;
            self.input.close();
            return Ok(false);
        }
        Ok(true)
    }

    fn read_row(&mut self) -> CodecResult<&[Value]> {
        if !self.has_more_rows()? {
            return Err(CodecError::EndOfStream);
        }
        let result = decode_row(&self.columns, &self.codecs, &mut self.cells, &mut self.input);
        self.after_row(result)?;
        Ok(&self.cells)
    }

    fn rows_read(&self) -> u64 {
        self.rows
    }
}

pub struct RowBinaryWriter<W: Write> {
    output: ByteWriter<W>,
    format: Format,
    columns: Vec<Column>,
    codecs: Vec<Codec>,
    header_written: bool,
    position: usize,
    scratch: Vec<u8>,
    rows: u64,
}

impl<W: Write> RowBinaryWriter<W> {
    pub fn new(config: &CodecConfig, output: W, columns: Vec<Column>) -> CodecResult<Self> {
        Self::with_builder(&CodecBuilder::new(config)?, config.format, output, columns)
    }

    pub fn with_builder(
        builder: &CodecBuilder,
        format: Format,
        output: W,
        columns: Vec<Column>,
    ) -> CodecResult<Self> {
        if !format.is_row_binary() {
            return Err(CodecError::Unsupported(format!("{} is not a row format", format)));
        }
        if columns.is_empty() {
            return Err(CodecError::Protocol("no columns to write".to_string()));
        }
        let codecs = builder.build_all(&columns)?;
        Ok(Self {
            output: ByteWriter::new(output),
            format,
            columns,
            codecs,
            header_written: false,
            position: 0,
            scratch: Vec::new(),
            rows: 0,
        })
    }

    /// 写入格式要求的头部，只写一次
    pub fn write_header(&mut self) -> CodecResult<()> {
        if self.header_written {
            return Ok(());
        }
        if self.format.has_names() {
            self.output.write_var_int(self.columns.len() as u64)?;
            for column in &self.columns {
                self.output.write_unicode_string(&column.name)?;
            }
            if self.format.has_types() {
                for column in &self.columns {
                    self.output.write_unicode_string(&column.type_name())?;
                }
            }
        }
        self.header_written = true;
        Ok(())
    }

    /// 先编码到暂存区，成功后再写出，出错时输出中不留半个值
    fn encode_value(&mut self, index: usize, value: &Value) -> CodecResult<()> {
        let column = &self.columns[index];
        let mut scratch = ByteWriter::new(&mut self.scratch);
        self.codecs[index]
            .encode(value, &mut scratch)
            .map_err(|e| e.in_column(&column.name, &column.type_name()))
    }

    pub fn into_inner(self) -> W {
        self.output.into_inner()
    }
}

impl<W: Write> RecordWriter for RowBinaryWriter<W> {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn write_value(&mut self, value: &Value) -> CodecResult<()> {
        self.write_header()?;
        self.scratch.clear();
        self.encode_value(self.position, value)?;
        self.output.write_bytes(&self.scratch)?;
        self.position += 1;
        if self.position == self.columns.len() {
            self.position = 0;
            self.rows += 1;
        }
        Ok(())
    }

    fn write_row(&mut self, row: &[Value]) -> CodecResult<()> {
        if self.position != 0 {
            return Err(CodecError::Protocol(format!(
                "row started with {} of {} values already written",
                self.position,
                self.columns.len()
            )));
        }
        if row.len() != self.columns.len() {
            return Err(CodecError::Protocol(format!(
                "Expect {} values but got {}",
                self.columns.len(),
                row.len()
            )));
        }
        self.write_header()?;
        self.scratch.clear();
        for (index, value) in row.iter().enumerate() {
            self.encode_value(index, value)?;
        }
        self.output.write_bytes(&self.scratch)?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> CodecResult<()> {
        if self.position != 0 {
            return Err(CodecError::Protocol(format!(
                "incomplete row: {} of {} values written",
                self.position,
                self.columns.len()
            )));
        }
        self.write_header()?;
        self.output.flush()?;
        log::debug!("{} finished after {} rows", self.format, self.rows);
        Ok(())
    }

    fn rows_written(&self) -> u64 {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::parse("id", "UInt8").unwrap(),
            Column::parse("name", "Nullable(String)").unwrap(),
        ]
    }

    fn write(format: Format, rows: &[Vec<Value>]) -> Vec<u8> {
        let mut writer =
            RowBinaryWriter::with_builder(&CodecBuilder::default(), format, Vec::new(), columns()).unwrap();
        for row in rows {
            writer.write_row(row).unwrap();
        }
        writer.finish().unwrap();
        writer.into_inner()
    }

    fn sample() -> Vec<Vec<Value>> {
        vec![
            vec![Value::UInt8(1), Value::from("a")],
            vec![Value::UInt8(2), Value::Null],
        ]
    }

    #[test]
    fn test_plain_layout() {
        let bytes = write(Format::RowBinary, &sample());
        assert_eq!(bytes, vec![1, 0, 1, b'a', 2, 1]);
    }

    #[test]
    fn test_header_variants() {
        let with_names = write(Format::RowBinaryWithNames, &[]);
        assert_eq!(with_names, vec![2, 2, b'i', b'd', 4, b'n', b'a', b'm', b'e']);

        let with_types = write(Format::RowBinaryWithNamesAndTypes, &[]);
        let mut expected = with_names.clone();
        expected.extend_from_slice(&[5, b'U', b'I', b'n', b't', b'8']);
        expected.push(16);
        expected.extend_from_slice(b"Nullable(String)");
        assert_eq!(with_types, expected);
    }

    #[test]
    fn test_read_all_variants() {
        for format in [
            Format::RowBinary,
            Format::RowBinaryWithNames,
            Format::RowBinaryWithNamesAndTypes,
        ] {
            let bytes = write(format, &sample());
            let provided = if format.has_types() { None } else { Some(columns()) };
            let mut reader =
                RowBinaryReader::with_builder(CodecBuilder::default(), format, &bytes[..], provided).unwrap();
            assert_eq!(reader.read_columns().unwrap(), &columns()[..]);
            let mut rows = Vec::new();
            while reader.has_more_rows().unwrap() {
                rows.push(reader.read_row().unwrap().to_vec());
            }
            assert_eq!(rows, sample(), "{}", format);
            assert_eq!(reader.rows_read(), 2);
            assert!(matches!(reader.read_row(), Err(CodecError::EndOfStream)));
        }
    }

    #[test]
    fn test_names_header_renames_columns() {
        let bytes = write(Format::RowBinaryWithNames, &sample());
        let provided = vec![
            Column::parse("a", "UInt8").unwrap(),
            Column::parse("b", "Nullable(String)").unwrap(),
        ];
        let mut reader = RowBinaryReader::with_builder(
            CodecBuilder::default(),
            Format::RowBinaryWithNames,
            &bytes[..],
            Some(provided),
        )
        .unwrap();
        let names: Vec<_> = reader.read_columns().unwrap().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_names_without_columns_default_to_nullable_strings() {
        let bytes = [2, 1, b'a', 1, b'b', 0, 1, b'x', 1];
        let mut reader =
            RowBinaryReader::with_builder(CodecBuilder::default(), Format::RowBinaryWithNames, &bytes[..], None)
                .unwrap();
        let types: Vec<_> = reader.read_columns().unwrap().iter().map(Column::type_name).collect();
        assert_eq!(types, vec!["Nullable(String)", "Nullable(String)"]);
        assert_eq!(reader.read_row().unwrap(), &[Value::from("x"), Value::Null][..]);
    }

    #[test]
    fn test_plain_format_requires_columns() {
        let err = RowBinaryReader::with_builder(CodecBuilder::default(), Format::RowBinary, &[][..], None)
            .err()
            .unwrap();
        assert!(matches!(err, CodecError::Config(_)));
    }

    #[test]
    fn test_truncated_row() {
        let mut bytes = write(Format::RowBinary, &sample());
        bytes.truncate(3);
        let mut reader =
            RowBinaryReader::with_builder(CodecBuilder::default(), Format::RowBinary, &bytes[..], Some(columns()))
                .unwrap();
        let err = reader.read_row().unwrap_err();
        assert!(err.is_end_of_stream());
        assert!(err.to_string().contains("name"));
        assert!(!reader.has_more_rows().unwrap());
    }

    #[test]
    fn test_read_row_into_caller_cells() {
        let bytes = write(Format::RowBinary, &sample());
        let mut reader =
            RowBinaryReader::with_builder(CodecBuilder::default(), Format::RowBinary, &bytes[..], Some(columns()))
                .unwrap();
        let mut short = vec![Value::Null];
        assert!(matches!(reader.read_row_into(&mut short), Err(CodecError::Protocol(_))));

        let mut cells = vec![Value::Null, Value::from("stale")];
        for expected in sample() {
            reader.read_row_into(&mut cells).unwrap();
            assert_eq!(cells, expected);
        }
        assert_eq!(reader.rows_read(), 2);
        assert!(matches!(reader.read_row_into(&mut cells), Err(CodecError::EndOfStream)));
    }

    #[test]
    fn test_huge_length_prefix_is_end_of_stream() {
        // 变长整数 2^62 之后流即结束
        let mut bytes = vec![0x80; 8];
        bytes.push(0x40);
        for type_name in ["Array(Int8)", "Array(String)", "Map(String, UInt8)", "Nested(a Int8)"] {
            let mut reader = RowBinaryReader::with_builder(
                CodecBuilder::default(),
                Format::RowBinary,
                &bytes[..],
                Some(vec![Column::parse("list", type_name).unwrap()]),
            )
            .unwrap();
            let err = reader.read_row().unwrap_err();
            assert!(err.is_end_of_stream(), "{}: {}", type_name, err);
            assert!(err.to_string().contains("list"));
            assert!(!reader.has_more_rows().unwrap());
        }
    }

    #[test]
    fn test_failed_value_leaves_no_bytes() {
        let mut writer =
            RowBinaryWriter::with_builder(&CodecBuilder::default(), Format::RowBinary, Vec::new(), columns())
                .unwrap();
        let err = writer
            .write_row(&[Value::UInt8(1), Value::Int32(5)])
            .unwrap_err();
        assert!(matches!(err.root(), CodecError::TypeMismatch(_)));
        writer.write_value(&Value::UInt8(7)).unwrap();
        assert!(writer.write_value(&Value::Int64(300)).is_err());
        assert!(writer.finish().is_err());
        writer.write_value(&Value::Null).unwrap();
        writer.finish().unwrap();
        assert_eq!(writer.rows_written(), 1);
        assert_eq!(writer.into_inner(), vec![7, 1]);
    }
}
