//! 日期时间编解码
//!
//! - Date：u16 天数，Date32：i32 天数（1900-01-01 至 2299-12-31）
//! - DateTime：u32 秒
//! - DateTime64：i64，`秒 * 10^scale + 亚秒单位`，负值按向下取整拆分
//!
//! 时区只在与参考时区不同时才做换算。

use std::io::{Read, Write};

use chrono::{
    DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Timelike,
};
use chrono_tz::Tz;

use super::error::{CodecError, CodecResult};
use super::stream::{ByteReader, ByteWriter};
use crate::core::types::DATETIME64_MAX_SCALE;
use crate::core::value::Value;

/// Date32 可表示的最小、最大天数（相对 1970-01-01）
pub const DATE32_MIN_DAYS: i64 = -25_567;
pub const DATE32_MAX_DAYS: i64 = 120_529;

/// DateTime64 的取值范围：1900-01-01 00:00:00 至 2299-12-31 23:59:59.999999999，
/// scale 为 9 时上限为 2262-04-11 23:47:16
const DATETIME64_MIN_SECONDS: i64 = DATE32_MIN_DAYS * 86_400;
const DATETIME64_MAX_SECONDS: i64 = DATE32_MAX_DAYS * 86_400 + 86_399;
const DATETIME64_9_MAX_SECONDS: i64 = 9_223_372_036;

const POWERS_OF_TEN: [i64; 10] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    Date32,
    DateTime32,
    DateTime64 { scale: u32 },
}

impl TemporalKind {
    pub fn byte_len(self) -> usize {
        match self {
            TemporalKind::Date => 2,
            TemporalKind::Date32 | TemporalKind::DateTime32 => 4,
            TemporalKind::DateTime64 { .. } => 8,
        }
    }
}

/// 把本地时间解释为指定时区中的时刻
///
/// 重叠时段取较早的时刻；跳过的时段按跳变前的偏移量换算。
pub fn resolve_local(tz: &Tz, local: &NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(local) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let offset = tz.offset_from_utc_datetime(local).fix().local_minus_utc();
            let utc = local
                .checked_sub_signed(TimeDelta::seconds(offset as i64))
                .unwrap_or(*local);
            tz.from_utc_datetime(&utc)
        }
    }
}

/// 日期与时间类型的编解码器
///
/// `zone` 为值所在的时区，`reference` 为线上表示所基于的时区；
/// 二者相同时不做任何换算。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalCodec {
    kind: TemporalKind,
    zone: Tz,
    reference: Tz,
}

impl TemporalCodec {
    pub fn new(kind: TemporalKind, zone: Tz, reference: Tz) -> CodecResult<Self> {
        if let TemporalKind::DateTime64 { scale } = kind {
            if scale > DATETIME64_MAX_SCALE {
                return Err(CodecError::out_of_range("DateTime64 scale", scale));
            }
        }
        Ok(Self {
            kind,
            zone,
            reference,
        })
    }

    pub fn kind(&self) -> TemporalKind {
        self.kind
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    fn needs_rezone(&self) -> bool {
        self.zone != self.reference
    }

    fn epoch() -> NaiveDate {
        NaiveDate::default()
    }

    fn days_to_date(&self, days: i64) -> CodecResult<NaiveDate> {
        let date = Self::epoch()
            .checked_add_signed(TimeDelta::days(days))
            .ok_or_else(|| CodecError::out_of_range("day offset", days))?;
        if self.needs_rezone() {
            let start = resolve_local(&self.reference, &date.and_time(NaiveTime::default()));
            Ok(start.with_timezone(&self.zone).date_naive())
        } else {
            Ok(date)
        }
    }

    /// `days_to_date` 的逆运算：取该日在参考时区中遇到的第一个零点
    fn date_to_days(&self, date: NaiveDate) -> CodecResult<i64> {
        let date = if self.needs_rezone() {
            let start = resolve_local(&self.zone, &date.and_time(NaiveTime::default()))
                .with_timezone(&self.reference);
            let day = start.date_naive();
            if start.time() == NaiveTime::default() {
                day
            } else {
                day.succ_opt()
                    .ok_or_else(|| CodecError::out_of_range("date", date))?
            }
        } else {
            date
        };
        Ok((date - Self::epoch()).num_days())
    }

    fn instant_to_local(&self, seconds: i64, nanos: u32) -> CodecResult<NaiveDateTime> {
        let utc = DateTime::from_timestamp(seconds, nanos)
            .ok_or_else(|| CodecError::out_of_range("timestamp", seconds))?;
        if self.needs_rezone() {
            Ok(utc.with_timezone(&self.zone).naive_local())
        } else {
            Ok(utc.naive_utc())
        }
    }

    fn local_to_instant(&self, local: &NaiveDateTime) -> (i64, u32) {
        if self.needs_rezone() {
            let t = resolve_local(&self.zone, local);
            (t.timestamp(), t.nanosecond())
        } else {
            let t = local.and_utc();
            (t.timestamp(), t.timestamp_subsec_nanos())
        }
    }

    /// 线上整数转换为值
    pub fn from_raw(&self, raw: i64) -> CodecResult<Value> {
        Ok(match self.kind {
            TemporalKind::Date | TemporalKind::Date32 => Value::Date(self.days_to_date(raw)?),
            TemporalKind::DateTime32 => Value::DateTime(self.instant_to_local(raw.max(0), 0)?),
            TemporalKind::DateTime64 { scale } => {
                let factor = POWERS_OF_TEN[scale as usize];
                let mut seconds = raw / factor;
                let mut units = raw % factor;
                if units < 0 {
                    units += factor;
                    seconds -= 1;
                }
                let nanos = units * POWERS_OF_TEN[(9 - scale) as usize];
                Value::DateTime(self.instant_to_local(seconds, nanos as u32)?)
            }
        })
    }

    /// 值转换为线上整数，并按类型检查取值范围
    pub fn to_raw(&self, value: &Value) -> CodecResult<i64> {
        match self.kind {
            TemporalKind::Date | TemporalKind::Date32 => {
                let date = match value {
                    Value::Date(d) => *d,
                    Value::DateTime(dt) => dt.date(),
                    other => return Err(CodecError::mismatch("Date", other)),
                };
                let days = self.date_to_days(date)?;
                let (min, max) = if self.kind == TemporalKind::Date {
                    (0, u16::MAX as i64)
                } else {
                    (DATE32_MIN_DAYS, DATE32_MAX_DAYS)
                };
                if days < min || days > max {
                    return Err(CodecError::out_of_range("date", date));
                }
                Ok(days)
            }
            TemporalKind::DateTime32 => {
                let local = datetime_of(value)?;
                let (seconds, _) = self.local_to_instant(&local);
                if seconds < 0 || seconds > u32::MAX as i64 {
                    return Err(CodecError::out_of_range("DateTime", local));
                }
                Ok(seconds)
            }
            TemporalKind::DateTime64 { scale } => {
                let local = datetime_of(value)?;
                let (seconds, nanos) = self.local_to_instant(&local);
                let local_seconds = local.and_utc().timestamp();
                let max = if scale == 9 {
                    DATETIME64_9_MAX_SECONDS
                } else {
                    DATETIME64_MAX_SECONDS
                };
                if local_seconds < DATETIME64_MIN_SECONDS || local_seconds > max {
                    return Err(CodecError::out_of_range("DateTime64", local));
                }
                let factor = POWERS_OF_TEN[scale as usize];
                let units = nanos as i64 / POWERS_OF_TEN[(9 - scale) as usize];
                seconds
                    .checked_mul(factor)
                    .and_then(|v| v.checked_add(units))
                    .ok_or_else(|| CodecError::out_of_range("DateTime64", local))
            }
        }
    }

    pub fn decode<R: Read>(&self, cell: &mut Value, input: &mut ByteReader<R>) -> CodecResult<()> {
        let raw = match self.kind {
            TemporalKind::Date => u16::from_le_bytes(input.read_buffer()?) as i64,
            TemporalKind::Date32 => i32::from_le_bytes(input.read_buffer()?) as i64,
            TemporalKind::DateTime32 => u32::from_le_bytes(input.read_buffer()?) as i64,
            TemporalKind::DateTime64 { .. } => i64::from_le_bytes(input.read_buffer()?),
        };
        *cell = self.from_raw(raw)?;
        Ok(())
    }

    pub fn encode<W: Write>(&self, value: &Value, output: &mut ByteWriter<W>) -> CodecResult<()> {
        let raw = self.to_raw(value)?;
        match self.kind {
            TemporalKind::Date => output.write_bytes(&(raw as u16).to_le_bytes()),
            TemporalKind::Date32 => output.write_bytes(&(raw as i32).to_le_bytes()),
            TemporalKind::DateTime32 => output.write_bytes(&(raw as u32).to_le_bytes()),
            TemporalKind::DateTime64 { .. } => output.write_bytes(&raw.to_le_bytes()),
        }
    }

    /// 线上值为 0 时对应的值
    pub fn default_value(&self) -> Value {
        self.from_raw(0).unwrap_or(Value::Null)
    }
}

fn datetime_of(value: &Value) -> CodecResult<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::Date(d) => Ok(d.and_time(NaiveTime::default())),
        other => Err(CodecError::mismatch("DateTime", other)),
    }
}
