//! 类型字符串解析器
//!
//! 递归下降解析 `Nullable(LowCardinality(String))`、`Map(String, Array(UInt8))`、
//! `Tuple(a Int8, b DateTime64(3, 'UTC'))` 这类类型字符串，得到 [`Column`]。

use std::str::FromStr;

use chrono_tz::Tz;

use super::column::Column;
use super::data_type::{DataType, IntervalUnit, DATETIME64_MAX_SCALE, DECIMAL256_MAX_PRECISION};
use crate::core::codec::{CodecError, CodecResult};

pub struct TypeParser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> TypeParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    /// 解析完整的类型字符串，末尾不允许残留字符
    pub fn parse(mut self) -> CodecResult<Column> {
        let column = self.parse_column()?;
        self.skip_ws();
        if self.pos != self.bytes.len() {
            return Err(self.error(format!("unexpected trailing input at {}", self.pos)));
        }
        Ok(column)
    }

    fn error(&self, reason: impl Into<String>) -> CodecError {
        CodecError::InvalidType {
            type_name: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: u8) -> CodecResult<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}' at {}", c as char, self.pos)))
        }
    }

    fn is_ident_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
    }

    fn identifier(&mut self) -> CodecResult<String> {
        self.skip_ws();
        if self.bytes.get(self.pos) == Some(&b'`') {
            self.pos += 1;
            let start = self.pos;
            while self.pos < self.bytes.len() && self.bytes[self.pos] != b'`' {
                self.pos += 1;
            }
            let ident = self.input[start..self.pos].to_string();
            self.expect(b'`')?;
            return Ok(ident);
        }
        let start = self.pos;
        while self.pos < self.bytes.len() && Self::is_ident_byte(self.bytes[self.pos]) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error(format!("expected identifier at {}", start)));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn integer(&mut self) -> CodecResult<i64> {
        self.skip_ws();
        let start = self.pos;
        if matches!(self.bytes.get(self.pos), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| self.error(format!("expected integer at {}", start)))
    }

    fn unsigned(&mut self) -> CodecResult<u32> {
        let v = self.integer()?;
        u32::try_from(v).map_err(|_| self.error(format!("expected non-negative integer, got {}", v)))
    }

    fn quoted(&mut self) -> CodecResult<String> {
        self.expect(b'\'')?;
        let mut out = Vec::new();
        loop {
            match self.bytes.get(self.pos) {
                None => return Err(self.error("unterminated string literal")),
                Some(b'\\') => {
                    let escaped = self
                        .bytes
                        .get(self.pos + 1)
                        .copied()
                        .ok_or_else(|| self.error("dangling escape"))?;
                    out.push(escaped);
                    self.pos += 2;
                }
                Some(b'\'') => {
                    self.pos += 1;
                    break;
                }
                Some(&b) => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
        String::from_utf8(out).map_err(|_| self.error("string literal is not valid UTF-8"))
    }

    fn time_zone(&mut self) -> CodecResult<Tz> {
        let name = self.quoted()?;
        Tz::from_str(&name).map_err(|_| self.error(format!("unknown time zone '{}'", name)))
    }

    /// 聚合函数名称，可能带参数，如 `quantiles(0.5, 0.9)`
    fn function_name(&mut self) -> CodecResult<String> {
        self.skip_ws();
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b'(' => depth += 1,
                b')' if depth == 0 => break,
                b')' => depth -= 1,
                b',' if depth == 0 => break,
                _ => {}
            }
            self.pos += 1;
        }
        let name = self.input[start..self.pos].trim().to_string();
        if name.is_empty() {
            return Err(self.error("missing aggregate function name"));
        }
        Ok(name)
    }

    fn parse_column(&mut self) -> CodecResult<Column> {
        let name = self.identifier()?;
        let has_args = self.eat(b'(');
        let column = match name.as_str() {
            "Nullable" => {
                let inner = self.parse_column()?;
                if inner.nullable {
                    return Err(self.error("nested Nullable"));
                }
                inner.with_nullable(true)
            }
            _ => Column::anonymous(self.parse_data_type(&name, has_args)?),
        };
        if has_args {
            self.expect(b')')?;
        }
        Ok(column)
    }

    fn no_args(&self, name: &str, has_args: bool, data_type: DataType) -> CodecResult<DataType> {
        if has_args {
            Err(self.error(format!("{} takes no parameters", name)))
        } else {
            Ok(data_type)
        }
    }

    fn require_args(&self, name: &str, has_args: bool) -> CodecResult<()> {
        if has_args {
            Ok(())
        } else {
            Err(self.error(format!("{} requires parameters", name)))
        }
    }

    fn parse_data_type(&mut self, name: &str, has_args: bool) -> CodecResult<DataType> {
        let simple = match name {
            "Bool" | "Boolean" => Some(DataType::Bool),
            "Int8" => Some(DataType::Int8),
            "Int16" => Some(DataType::Int16),
            "Int32" => Some(DataType::Int32),
            "Int64" => Some(DataType::Int64),
            "Int128" => Some(DataType::Int128),
            "Int256" => Some(DataType::Int256),
            "UInt8" => Some(DataType::UInt8),
            "UInt16" => Some(DataType::UInt16),
            "UInt32" => Some(DataType::UInt32),
            "UInt64" => Some(DataType::UInt64),
            "UInt128" => Some(DataType::UInt128),
            "UInt256" => Some(DataType::UInt256),
            "Float32" => Some(DataType::Float32),
            "Float64" => Some(DataType::Float64),
            "BFloat16" => Some(DataType::BFloat16),
            "String" => Some(DataType::String),
            "Date" => Some(DataType::Date),
            "Date32" => Some(DataType::Date32),
            "UUID" => Some(DataType::Uuid),
            "IPv4" => Some(DataType::IPv4),
            "IPv6" => Some(DataType::IPv6),
            "Point" => Some(DataType::Point),
            "Ring" => Some(DataType::Ring),
            "Polygon" => Some(DataType::Polygon),
            "MultiPolygon" => Some(DataType::MultiPolygon),
            "Nothing" => Some(DataType::Nothing),
            "Dynamic" => Some(DataType::Dynamic),
            _ => IntervalUnit::from_type_name(name).map(DataType::Interval),
        };
        if let Some(data_type) = simple {
            return self.no_args(name, has_args, data_type);
        }

        match name {
            "JSON" | "Object" => {
                // 参数只需跳过，值按字符串传输
                if has_args {
                    self.function_name()?;
                    while self.eat(b',') {
                        self.function_name()?;
                    }
                }
                Ok(DataType::Json)
            }
            "FixedString" => {
                self.require_args(name, has_args)?;
                let n = self.unsigned()?;
                if n == 0 {
                    return Err(self.error("FixedString length must be at least 1"));
                }
                Ok(DataType::FixedString(n as usize))
            }
            "Decimal" => {
                self.require_args(name, has_args)?;
                let precision = self.unsigned()?;
                let scale = if self.eat(b',') { self.unsigned()? } else { 0 };
                if precision == 0 || precision > DECIMAL256_MAX_PRECISION {
                    return Err(self.error(format!("decimal precision {} out of range", precision)));
                }
                if scale > precision {
                    return Err(self.error(format!("decimal scale {} exceeds precision {}", scale, precision)));
                }
                Ok(DataType::Decimal { precision, scale })
            }
            "Decimal32" | "Decimal64" | "Decimal128" | "Decimal256" => {
                self.require_args(name, has_args)?;
                let scale = self.unsigned()?;
                Ok(match name {
                    "Decimal32" => DataType::Decimal32(scale),
                    "Decimal64" => DataType::Decimal64(scale),
                    "Decimal128" => DataType::Decimal128(scale),
                    _ => DataType::Decimal256(scale),
                })
            }
            "DateTime" => {
                let tz = if has_args { Some(self.time_zone()?) } else { None };
                Ok(DataType::DateTime(tz))
            }
            "DateTime64" => {
                self.require_args(name, has_args)?;
                let scale = self.unsigned()?;
                if scale > DATETIME64_MAX_SCALE {
                    return Err(self.error(format!("DateTime64 scale {} out of range", scale)));
                }
                let time_zone = if self.eat(b',') { Some(self.time_zone()?) } else { None };
                Ok(DataType::DateTime64 { scale, time_zone })
            }
            "Enum" | "Enum8" | "Enum16" => {
                self.require_args(name, has_args)?;
                self.parse_enum(name)
            }
            "Array" => {
                self.require_args(name, has_args)?;
                Ok(DataType::Array(Box::new(self.parse_column()?)))
            }
            "LowCardinality" => {
                self.require_args(name, has_args)?;
                Ok(DataType::LowCardinality(Box::new(self.parse_column()?)))
            }
            "Map" => {
                self.require_args(name, has_args)?;
                let key = self.parse_column()?;
                self.expect(b',')?;
                let value = self.parse_column()?;
                Ok(DataType::Map(Box::new(key), Box::new(value)))
            }
            "Tuple" => {
                self.require_args(name, has_args)?;
                Ok(DataType::Tuple(self.parse_elements()?))
            }
            "Nested" => {
                self.require_args(name, has_args)?;
                let fields = self.parse_elements()?;
                if fields.iter().any(|f| f.name.is_empty()) {
                    return Err(self.error("Nested fields must be named"));
                }
                Ok(DataType::Nested(fields))
            }
            "Variant" => {
                self.require_args(name, has_args)?;
                Ok(DataType::Variant(self.parse_list()?))
            }
            "SimpleAggregateFunction" => {
                self.require_args(name, has_args)?;
                let function = self.function_name()?;
                self.expect(b',')?;
                let inner = self.parse_column()?;
                Ok(DataType::SimpleAggregateFunction {
                    function,
                    inner: Box::new(inner),
                })
            }
            "AggregateFunction" => {
                self.require_args(name, has_args)?;
                let function = self.function_name()?;
                let args = if self.eat(b',') { self.parse_list()? } else { Vec::new() };
                Ok(DataType::AggregateFunction { function, args })
            }
            other => Err(self.error(format!("unknown type '{}'", other))),
        }
    }

    fn parse_list(&mut self) -> CodecResult<Vec<Column>> {
        let mut items = vec![self.parse_column()?];
        while self.eat(b',') {
            items.push(self.parse_column()?);
        }
        Ok(items)
    }

    /// 元组元素：`name Type` 或仅 `Type`
    fn parse_element(&mut self) -> CodecResult<Column> {
        let start = self.pos;
        let ident = self.identifier()?;
        match self.peek() {
            Some(b) if Self::is_ident_byte(b) || b == b'`' => {
                let mut column = self.parse_column()?;
                column.name = ident;
                Ok(column)
            }
            _ => {
                self.pos = start;
                self.parse_column()
            }
        }
    }

    fn parse_elements(&mut self) -> CodecResult<Vec<Column>> {
        let mut items = vec![self.parse_element()?];
        while self.eat(b',') {
            items.push(self.parse_element()?);
        }
        Ok(items)
    }

    fn parse_enum(&mut self, name: &str) -> CodecResult<DataType> {
        let mut symbols: Vec<(String, i64)> = Vec::new();
        loop {
            let symbol = self.quoted()?;
            let value = if self.eat(b'=') {
                self.integer()?
            } else {
                symbols.last().map(|(_, v)| v + 1).unwrap_or(1)
            };
            symbols.push((symbol, value));
            if !self.eat(b',') {
                break;
            }
        }
        let fits8 = symbols.iter().all(|(_, v)| i8::try_from(*v).is_ok());
        if name == "Enum8" || (name == "Enum" && fits8) {
            let converted = symbols
                .into_iter()
                .map(|(s, v)| {
                    i8::try_from(v)
                        .map(|v| (s, v))
                        .map_err(|_| self.error(format!("Enum8 value {} out of range", v)))
                })
                .collect::<CodecResult<Vec<_>>>()?;
            Ok(DataType::Enum8(converted))
        } else {
            let converted = symbols
                .into_iter()
                .map(|(s, v)| {
                    i16::try_from(v)
                        .map(|v| (s, v))
                        .map_err(|_| self.error(format!("Enum16 value {} out of range", v)))
                })
                .collect::<CodecResult<Vec<_>>>()?;
            Ok(DataType::Enum16(converted))
        }
    }
}
