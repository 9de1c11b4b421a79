//! Native 列式格式驱动
//!
//! 流由若干块组成，每块：
//! - 变长整数列数、变长整数行数
//! - 每列：列名、类型名、状态前缀与整列数据（行数为 0 时没有数据）
//!
//! 读取端在块之上提供逐行访问，跨越块边界时透明地读取下一块；
//! 写入端把行缓冲成 `block_rows` 行一块后写出。

pub mod block;
pub mod column;

use std::io::{Read, Write};
use std::mem;

use crate::config::CodecConfig;
use crate::core::codec::{ByteReader, ByteWriter, CodecBuilder, CodecError, CodecResult};
use crate::core::types::Column;
use crate::core::value::Value;

use super::{RecordReader, RecordWriter};

pub use block::Block;
pub use column::{ColumnCodec, GeoKind};

pub struct NativeReader<R: Read> {
    input: ByteReader<R>,
    builder: CodecBuilder,
    columns: Vec<Column>,
    codecs: Vec<ColumnCodec>,
    block: Block,
    position: usize,
    cells: Vec<Value>,
    exhausted: bool,
    rows: u64,
    blocks: u64,
}

impl<R: Read> NativeReader<R> {
    pub fn new(config: &CodecConfig, input: R) -> CodecResult<Self> {
        Ok(Self::with_builder(CodecBuilder::new(config)?, input))
    }

    pub fn with_builder(builder: CodecBuilder, input: R) -> Self {
        Self {
            input: ByteReader::new(input),
            builder,
            columns: Vec::new(),
            codecs: Vec::new(),
            block: Block::default(),
            position: 0,
            cells: Vec::new(),
            exhausted: false,
            rows: 0,
            blocks: 0,
        }
    }

    pub fn blocks_read(&self) -> u64 {
        self.blocks
    }

    /// 读取下一个完整的块；还未逐行读取过的缓冲块优先返回
    pub fn read_block(&mut self) -> CodecResult<Option<Block>> {
        if self.position == 0 && !self.block.is_empty() {
            return Ok(Some(mem::take(&mut self.block)));
        }
        self.block = Block::default();
        self.position = 0;
        self.next_block()
    }

    fn read_column_header(&mut self, index: usize) -> CodecResult<()> {
        let name = self.input.read_unicode_string()?;
        let type_name = self.input.read_unicode_string()?;
        if self.blocks == 0 {
            let column = Column::parse(&name, &type_name)?;
            self.codecs.push(ColumnCodec::build(&self.builder, &column)?);
            self.columns.push(column);
            return Ok(());
        }
        match self.columns.get(index) {
            Some(column) if column.type_name() == Column::parse(&name, &type_name)?.type_name() => Ok(()),
            _ => Err(CodecError::Protocol(format!(
                "column {} ({} {}) differs from the first block",
                index, name, type_name
            ))),
        }
    }

    fn next_block(&mut self) -> CodecResult<Option<Block>> {
        if self.exhausted {
            return Ok(None);
        }
        if self.input.available()? == 0 {
            log::debug!("native stream exhausted after {} blocks, {} rows", self.blocks, self.rows);
            self.exhausted = true;
            self.input.close();
            return Ok(None);
        }

        let column_count = self.input.read_length()?;
        let row_count = self.input.read_length()?;
        if self.blocks > 0 && column_count != self.columns.len() {
            return Err(CodecError::Protocol(format!(
                "block has {} columns, expected {}",
                column_count,
                self.columns.len()
            )));
        }

        let mut data = Vec::new();
        for index in 0..column_count {
            self.read_column_header(index)?;
            let values = if row_count > 0 {
                let column = &self.columns[index];
                let codec = &self.codecs[index];
                codec
                    .read_prefix(&mut self.input)
                    .and_then(|_| codec.read_column(row_count, &mut self.input))
                    .map_err(|e| e.in_column(&column.name, &column.type_name()))?
            } else {
                Vec::new()
            };
            data.push(values);
        }

        self.blocks += 1;
        self.cells.resize(self.columns.len(), Value::Null);
        log::debug!("native block {}: {} columns x {} rows", self.blocks, column_count, row_count);
        Block::from_columns(self.columns.clone(), data).map(Some)
    }

    /// 保证当前块还有未读的行，必要时读取后续块
    fn fill(&mut self) -> CodecResult<bool> {
        while self.position >= self.block.row_count() {
            match self.next_block()? {
                Some(block) => {
                    self.block = block;
                    self.position = 0;
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }
}

impl<R: Read> RecordReader for NativeReader<R> {
    fn read_columns(&mut self) -> CodecResult<&[Column]> {
        if self.blocks == 0 && !self.exhausted {
            if let Some(block) = self.next_block()? {
                self.block = block;
                self.position = 0;
            }
        }
        Ok(&self.columns)
    }

    fn has_more_rows(&mut self) -> CodecResult<bool> {
        self.fill()
    }

    fn read_row(&mut self) -> CodecResult<&[Value]> {
        if !self.fill()? {
            return Err(CodecError::EndOfStream);
        }
        for (index, cell) in self.cells.iter_mut().enumerate() {
            *cell = self.block.take_value(self.position, index).unwrap_or_default();
        }
        self.position += 1;
        self.rows += 1;
        Ok(&self.cells)
    }

    fn rows_read(&self) -> u64 {
        self.rows
    }
}

pub struct NativeWriter<W: Write> {
    output: ByteWriter<W>,
    columns: Vec<Column>,
    codecs: Vec<ColumnCodec>,
    pending: Block,
    block_rows: usize,
    position: usize,
    rows: u64,
    blocks: u64,
}

impl<W: Write> NativeWriter<W> {
    pub fn new(config: &CodecConfig, output: W, columns: Vec<Column>) -> CodecResult<Self> {
        Self::with_builder(&CodecBuilder::new(config)?, config.block_rows, output, columns)
    }

    pub fn with_builder(
        builder: &CodecBuilder,
        block_rows: usize,
        output: W,
        columns: Vec<Column>,
    ) -> CodecResult<Self> {
        if block_rows == 0 {
            return Err(CodecError::Config("block_rows must be positive".to_string()));
        }
        if columns.is_empty() {
            return Err(CodecError::Protocol("no columns to write".to_string()));
        }
        let codecs = columns
            .iter()
            .map(|c| ColumnCodec::build(builder, c))
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(Self {
            output: ByteWriter::new(output),
            pending: Block::new(columns.clone()),
            columns,
            codecs,
            block_rows,
            position: 0,
            rows: 0,
            blocks: 0,
        })
    }

    pub fn blocks_written(&self) -> u64 {
        self.blocks
    }

    /// 整块写出，调用方已按列持有数据时使用；先写出缓冲的行
    pub fn write_block(&mut self, block: &Block) -> CodecResult<()> {
        if self.position != 0 {
            return Err(CodecError::Protocol("write_block inside a partially written row".to_string()));
        }
        let compatible = block.column_count() == self.columns.len()
            && block
                .columns()
                .iter()
                .zip(&self.columns)
                .all(|(a, b)| a.type_name() == b.type_name());
        if !compatible {
            return Err(CodecError::Protocol("block columns differ from the writer's".to_string()));
        }
        self.flush_pending()?;
        self.emit(block)?;
        self.rows += block.row_count() as u64;
        Ok(())
    }

    /// 把整块编码到内存中，成功后才写到输出
    fn encode_block(&self, block: &Block) -> CodecResult<Vec<u8>> {
        let mut buffer = ByteWriter::new(Vec::new());
        let rows = block.row_count();
        buffer.write_var_int(self.columns.len() as u64)?;
        buffer.write_var_int(rows as u64)?;
        for (index, (column, codec)) in self.columns.iter().zip(&self.codecs).enumerate() {
            buffer.write_unicode_string(&column.name)?;
            buffer.write_unicode_string(&column.type_name())?;
            if rows == 0 {
                continue;
            }
            let values: Vec<&Value> = block.column(index).unwrap_or_default().iter().collect();
            codec
                .write_prefix(&mut buffer)
                .and_then(|_| codec.write_column(&values, &mut buffer))
                .map_err(|e| e.in_column(&column.name, &column.type_name()))?;
        }
        Ok(buffer.into_inner())
    }

    fn emit(&mut self, block: &Block) -> CodecResult<()> {
        let bytes = self.encode_block(block)?;
        self.output.write_bytes(&bytes)?;
        self.blocks += 1;
        log::debug!("native block {}: {} rows, {} bytes", self.blocks, block.row_count(), bytes.len());
        Ok(())
    }

    fn flush_pending(&mut self) -> CodecResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let bytes = self.encode_block(&self.pending)?;
        self.output.write_bytes(&bytes)?;
        self.blocks += 1;
        log::debug!("native block {}: {} rows, {} bytes", self.blocks, self.pending.row_count(), bytes.len());
        self.pending.clear();
        Ok(())
    }

    /// 在缓冲之前单独编码一次，越界或类型不符的值立即报错且不进入缓冲块
    fn check_value(&self, index: usize, value: &Value) -> CodecResult<()> {
        let column = &self.columns[index];
        let mut scratch = ByteWriter::new(Vec::new());
        self.codecs[index]
            .write_column(&[value], &mut scratch)
            .map_err(|e| e.in_column(&column.name, &column.type_name()))
    }

    fn row_completed(&mut self) -> CodecResult<()> {
        self.rows += 1;
        if self.pending.row_count() >= self.block_rows {
            self.flush_pending()?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.output.into_inner()
    }
}

impl<W: Write> RecordWriter for NativeWriter<W> {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn write_value(&mut self, value: &Value) -> CodecResult<()> {
        self.check_value(self.position, value)?;
        self.pending.push_value(self.position, value.clone());
        self.position += 1;
        if self.position == self.columns.len() {
            self.position = 0;
            self.row_completed()?;
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
        for (index, value) in row.iter().enumerate() {
            self.check_value(index, value)?;
        }
        self.pending.push_row(row.to_vec())?;
        self.row_completed()
    }

    fn finish(&mut self) -> CodecResult<()> {
        if self.position != 0 {
            return Err(CodecError::Protocol(format!(
                "incomplete row: {} of {} values written",
                self.position,
                self.columns.len()
            )));
        }
        self.flush_pending()?;
        if self.blocks == 0 {
            // 没有任何行时仍写出一个空块，让读取端拿到列描述
            let empty = Block::new(self.columns.clone());
            self.emit(&empty)?;
        }
        self.output.flush()
    }

    fn rows_written(&self) -> u64 {
        self.rows
    }
}
