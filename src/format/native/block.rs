//! 列式数据块
//!
//! 一个块由若干列描述和等长的列数据组成，读取后即被消费，不做持久化。

use crate::core::codec::{CodecError, CodecResult};
use crate::core::types::Column;
use crate::core::value::Value;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    columns: Vec<Column>,
    data: Vec<Vec<Value>>,
    rows: usize,
}

impl Block {
    pub fn new(columns: Vec<Column>) -> Self {
        let data = vec![Vec::new(); columns.len()];
        Self {
            columns,
            data,
            rows: 0,
        }
    }

    /// 由列描述和列数据构造，所有列必须等长
    pub fn from_columns(columns: Vec<Column>, data: Vec<Vec<Value>>) -> CodecResult<Self> {
        if columns.len() != data.len() {
            return Err(CodecError::Protocol(format!(
                "Expect {} data columns but got {}",
                columns.len(),
                data.len()
            )));
        }
        let rows = data.first().map_or(0, Vec::len);
        if let Some((column, values)) = columns.iter().zip(&data).find(|(_, d)| d.len() != rows) {
            return Err(CodecError::Protocol(format!(
                "column {} has {} rows, expected {}",
                column.name,
                values.len(),
                rows
            )));
        }
        Ok(Self { columns, data, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column(&self, index: usize) -> Option<&[Value]> {
        self.data.get(index).map(Vec::as_slice)
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.data.get(column).and_then(|c| c.get(row))
    }

    /// 取出一个值，原位置留下 `Null`
    pub fn take_value(&mut self, row: usize, column: usize) -> Option<Value> {
        self.data
            .get_mut(column)
            .and_then(|c| c.get_mut(row))
            .map(std::mem::take)
    }

    pub fn row(&self, row: usize) -> Option<Vec<&Value>> {
        if row >= self.rows {
            return None;
        }
        Some(self.data.iter().map(|c| &c[row]).collect())
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> CodecResult<()> {
        if row.len() != self.columns.len() {
            return Err(CodecError::Protocol(format!(
                "Expect {} values but got {}",
                self.columns.len(),
                row.len()
            )));
        }
        for (column, value) in self.data.iter_mut().zip(row) {
            column.push(value);
        }
        self.rows += 1;
        Ok(())
    }

    /// 按列追加单个值，调用方负责保证各列最终等长
    pub(crate) fn push_value(&mut self, column: usize, value: Value) {
        self.data[column].push(value);
        if column + 1 == self.columns.len() {
            self.rows += 1;
        }
    }

    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(Vec::clear);
        self.rows = 0;
    }

    pub fn into_parts(self) -> (Vec<Column>, Vec<Vec<Value>>) {
        (self.columns, self.data)
    }
}
