//! 列描述符

use std::fmt;

use chrono_tz::Tz;

use super::data_type::{render, DataType};
use super::parser::TypeParser;
use crate::core::codec::CodecResult;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
        }
    }

    pub fn nullable(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    /// 无名子列，用于数组元素、映射键值等位置
    pub fn anonymous(data_type: DataType) -> Self {
        Self::new(String::new(), data_type)
    }

    /// 从类型字符串解析列描述符
    ///
    /// ```
    /// use chcodec::core::types::{Column, DataType};
    ///
    /// let col = Column::parse("price", "Nullable(Decimal(10, 2))").unwrap();
    /// assert!(col.nullable);
    /// assert_eq!(col.data_type, DataType::Decimal { precision: 10, scale: 2 });
    /// ```
    pub fn parse(name: &str, type_name: &str) -> CodecResult<Self> {
        let mut column = TypeParser::new(type_name).parse()?;
        column.name = name.to_string();
        Ok(column)
    }

    /// 渲染为服务端可识别的类型字符串
    pub fn type_name(&self) -> String {
        let inner = render(&self.data_type);
        if self.nullable {
            format!("Nullable({})", inner)
        } else {
            inner
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn precision(&self) -> Option<u32> {
        self.data_type.decimal_spec().map(|(_, p, _)| p)
    }

    /// 小数或 DateTime64 的小数位数
    pub fn scale(&self) -> Option<u32> {
        match &self.data_type {
            DataType::DateTime64 { scale, .. } => Some(*scale),
            other => other.decimal_spec().map(|(_, _, s)| s),
        }
    }

    pub fn time_zone(&self) -> Option<Tz> {
        match &self.data_type {
            DataType::DateTime(tz) => *tz,
            DataType::DateTime64 { time_zone, .. } => *time_zone,
            _ => None,
        }
    }

    pub fn nested_columns(&self) -> Vec<&Column> {
        self.data_type.children()
    }

    /// 数组嵌套层数
    pub fn array_depth(&self) -> usize {
        match &self.data_type {
            DataType::Array(element) => 1 + element.array_depth(),
            _ => 0,
        }
    }

    pub fn is_low_cardinality(&self) -> bool {
        matches!(self.data_type, DataType::LowCardinality(_))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.type_name())
    }
}
