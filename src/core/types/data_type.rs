//! 数据类型标签
//!
//! 列描述符的类型部分。复合类型的子列本身就是完整的 [`Column`]，
//! 因此整个描述符构成一棵有限树。

use chrono_tz::Tz;

use super::column::Column;

/// Decimal32/64/128/256 的最大精度（同时也是最大小数位数）
pub const DECIMAL32_MAX_PRECISION: u32 = 9;
pub const DECIMAL64_MAX_PRECISION: u32 = 18;
pub const DECIMAL128_MAX_PRECISION: u32 = 38;
pub const DECIMAL256_MAX_PRECISION: u32 = 76;

/// DateTime64 的最大小数位数
pub const DATETIME64_MAX_SCALE: u32 = 9;

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    UInt256,
    Float32,
    Float64,
    BFloat16,
    /// 通用写法 `Decimal(P, S)`，按精度选择存储宽度
    Decimal { precision: u32, scale: u32 },
    Decimal32(u32),
    Decimal64(u32),
    Decimal128(u32),
    Decimal256(u32),
    String,
    FixedString(usize),
    Date,
    Date32,
    DateTime(Option<Tz>),
    DateTime64 { scale: u32, time_zone: Option<Tz> },
    Uuid,
    IPv4,
    IPv6,
    Enum8(Vec<(String, i8)>),
    Enum16(Vec<(String, i16)>),
    Point,
    Ring,
    Polygon,
    MultiPolygon,
    Array(Box<Column>),
    Map(Box<Column>, Box<Column>),
    Tuple(Vec<Column>),
    Nested(Vec<Column>),
    Variant(Vec<Column>),
    LowCardinality(Box<Column>),
    SimpleAggregateFunction { function: String, inner: Box<Column> },
    AggregateFunction { function: String, args: Vec<Column> },
    /// 时间间隔，存储为 Int64
    Interval(IntervalUnit),
    Nothing,
    Dynamic,
    /// `JSON` 与旧的 `Object('json')`，按字符串编码
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl IntervalUnit {
    pub const ALL: [IntervalUnit; 11] = [
        IntervalUnit::Year,
        IntervalUnit::Quarter,
        IntervalUnit::Month,
        IntervalUnit::Week,
        IntervalUnit::Day,
        IntervalUnit::Hour,
        IntervalUnit::Minute,
        IntervalUnit::Second,
        IntervalUnit::Millisecond,
        IntervalUnit::Microsecond,
        IntervalUnit::Nanosecond,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            IntervalUnit::Year => "IntervalYear",
            IntervalUnit::Quarter => "IntervalQuarter",
            IntervalUnit::Month => "IntervalMonth",
            IntervalUnit::Week => "IntervalWeek",
            IntervalUnit::Day => "IntervalDay",
            IntervalUnit::Hour => "IntervalHour",
            IntervalUnit::Minute => "IntervalMinute",
            IntervalUnit::Second => "IntervalSecond",
            IntervalUnit::Millisecond => "IntervalMillisecond",
            IntervalUnit::Microsecond => "IntervalMicrosecond",
            IntervalUnit::Nanosecond => "IntervalNanosecond",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|unit| unit.type_name() == name)
    }
}

/// 小数的物理存储宽度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecimalWidth {
    D32,
    D64,
    D128,
    D256,
}

impl DecimalWidth {
    pub fn for_precision(precision: u32) -> Self {
        if precision <= DECIMAL32_MAX_PRECISION {
            DecimalWidth::D32
        } else if precision <= DECIMAL64_MAX_PRECISION {
            DecimalWidth::D64
        } else if precision <= DECIMAL128_MAX_PRECISION {
            DecimalWidth::D128
        } else {
            DecimalWidth::D256
        }
    }

    pub fn byte_len(self) -> usize {
        match self {
            DecimalWidth::D32 => 4,
            DecimalWidth::D64 => 8,
            DecimalWidth::D128 => 16,
            DecimalWidth::D256 => 32,
        }
    }

    pub fn max_precision(self) -> u32 {
        match self {
            DecimalWidth::D32 => DECIMAL32_MAX_PRECISION,
            DecimalWidth::D64 => DECIMAL64_MAX_PRECISION,
            DecimalWidth::D128 => DECIMAL128_MAX_PRECISION,
            DecimalWidth::D256 => DECIMAL256_MAX_PRECISION,
        }
    }
}

impl DataType {
    /// 小数类型的存储宽度、精度与小数位数
    pub fn decimal_spec(&self) -> Option<(DecimalWidth, u32, u32)> {
        match *self {
            DataType::Decimal { precision, scale } => {
                Some((DecimalWidth::for_precision(precision), precision, scale))
            }
            DataType::Decimal32(s) => Some((DecimalWidth::D32, DECIMAL32_MAX_PRECISION, s)),
            DataType::Decimal64(s) => Some((DecimalWidth::D64, DECIMAL64_MAX_PRECISION, s)),
            DataType::Decimal128(s) => Some((DecimalWidth::D128, DECIMAL128_MAX_PRECISION, s)),
            DataType::Decimal256(s) => Some((DecimalWidth::D256, DECIMAL256_MAX_PRECISION, s)),
            _ => None,
        }
    }

    /// 定长整数类型的字节宽度
    pub fn integer_byte_len(&self) -> Option<usize> {
        match self {
            DataType::Int8 | DataType::UInt8 => Some(1),
            DataType::Int16 | DataType::UInt16 => Some(2),
            DataType::Int32 | DataType::UInt32 => Some(4),
            DataType::Int64 | DataType::UInt64 => Some(8),
            DataType::Int128 | DataType::UInt128 => Some(16),
            DataType::Int256 | DataType::UInt256 => Some(32),
            _ => None,
        }
    }

    pub fn is_signed_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::Int128
                | DataType::Int256
        )
    }

    /// 子列列表，叶子类型返回空切片
    pub fn children(&self) -> Vec<&Column> {
        match self {
            DataType::Array(c) | DataType::LowCardinality(c) => vec![c.as_ref()],
            DataType::SimpleAggregateFunction { inner, .. } => vec![inner.as_ref()],
            DataType::Map(k, v) => vec![k.as_ref(), v.as_ref()],
            DataType::Tuple(cs)
            | DataType::Nested(cs)
            | DataType::Variant(cs)
            | DataType::AggregateFunction { args: cs, .. } => cs.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// 类型名称中不带参数的部分
    pub fn base_name(&self) -> &'static str {
        match self {
            DataType::Bool => "Bool",
            DataType::Int8 => "Int8",
            DataType::Int16 => "Int16",
            DataType::Int32 => "Int32",
            DataType::Int64 => "Int64",
            DataType::Int128 => "Int128",
            DataType::Int256 => "Int256",
            DataType::UInt8 => "UInt8",
            DataType::UInt16 => "UInt16",
            DataType::UInt32 => "UInt32",
            DataType::UInt64 => "UInt64",
            DataType::UInt128 => "UInt128",
            DataType::UInt256 => "UInt256",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
            DataType::BFloat16 => "BFloat16",
            DataType::Decimal { .. } => "Decimal",
            DataType::Decimal32(_) => "Decimal32",
            DataType::Decimal64(_) => "Decimal64",
            DataType::Decimal128(_) => "Decimal128",
            DataType::Decimal256(_) => "Decimal256",
            DataType::String => "String",
            DataType::FixedString(_) => "FixedString",
            DataType::Date => "Date",
            DataType::Date32 => "Date32",
            DataType::DateTime(_) => "DateTime",
            DataType::DateTime64 { .. } => "DateTime64",
            DataType::Uuid => "UUID",
            DataType::IPv4 => "IPv4",
            DataType::IPv6 => "IPv6",
            DataType::Enum8(_) => "Enum8",
            DataType::Enum16(_) => "Enum16",
            DataType::Point => "Point",
            DataType::Ring => "Ring",
            DataType::Polygon => "Polygon",
            DataType::MultiPolygon => "MultiPolygon",
            DataType::Array(_) => "Array",
            DataType::Map(_, _) => "Map",
            DataType::Tuple(_) => "Tuple",
            DataType::Nested(_) => "Nested",
            DataType::Variant(_) => "Variant",
            DataType::LowCardinality(_) => "LowCardinality",
            DataType::SimpleAggregateFunction { .. } => "SimpleAggregateFunction",
            DataType::AggregateFunction { .. } => "AggregateFunction",
            DataType::Interval(unit) => unit.type_name(),
            DataType::Nothing => "Nothing",
            DataType::Dynamic => "Dynamic",
            DataType::Json => "JSON",
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

fn join_columns(columns: &[Column], named: bool) -> String {
    columns
        .iter()
        .map(|c| {
            if named && !c.name.is_empty() {
                format!("{} {}", c.name, c.type_name())
            } else {
                c.type_name()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_enum<T: std::fmt::Display>(name: &str, symbols: &[(String, T)]) -> String {
    let body = symbols
        .iter()
        .map(|(s, v)| format!("{} = {}", quote(s), v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", name, body)
}

/// 渲染不含 Nullable 包装的类型名称
pub(crate) fn render(data_type: &DataType) -> String {
    let base = data_type.base_name();
    match data_type {
        DataType::Decimal { precision, scale } => format!("Decimal({}, {})", precision, scale),
        DataType::Decimal32(s)
        | DataType::Decimal64(s)
        | DataType::Decimal128(s)
        | DataType::Decimal256(s) => format!("{}({})", base, s),
        DataType::FixedString(n) => format!("FixedString({})", n),
        DataType::DateTime(Some(tz)) => format!("DateTime({})", quote(tz.name())),
        DataType::DateTime64 { scale, time_zone } => match time_zone {
            Some(tz) => format!("DateTime64({}, {})", scale, quote(tz.name())),
            None => format!("DateTime64({})", scale),
        },
        DataType::Enum8(symbols) => render_enum(base, symbols),
        DataType::Enum16(symbols) => render_enum(base, symbols),
        DataType::Array(c) | DataType::LowCardinality(c) => format!("{}({})", base, c.type_name()),
        DataType::Map(k, v) => format!("Map({}, {})", k.type_name(), v.type_name()),
        DataType::Tuple(cs) | DataType::Nested(cs) => format!("{}({})", base, join_columns(cs, true)),
        DataType::Variant(cs) => format!("Variant({})", join_columns(cs, false)),
        DataType::SimpleAggregateFunction { function, inner } => {
            format!("SimpleAggregateFunction({}, {})", function, inner.type_name())
        }
        DataType::AggregateFunction { function, args } if args.is_empty() => {
            format!("AggregateFunction({})", function)
        }
        DataType::AggregateFunction { function, args } => {
            format!("AggregateFunction({}, {})", function, join_columns(args, false))
        }
        _ => base.to_string(),
    }
}
