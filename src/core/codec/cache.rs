//! 按参数缓存的编解码器
//!
//! 小数与日期时间编解码器只由（宽度/种类，小数位数，时区）决定，构造一次后共享。
//! 缓存由 `CodecBuilder` 持有并显式传递，多个驱动可在不同线程中并发填充。

use std::sync::Arc;

use chrono_tz::Tz;
use dashmap::DashMap;

use super::error::CodecResult;
use super::primitive::DecimalCodec;
use super::temporal::{TemporalCodec, TemporalKind};
use crate::core::types::DecimalWidth;

type TemporalKey = (TemporalKind, &'static str, &'static str);

#[derive(Debug, Default)]
pub struct CodecCache {
    decimals: DashMap<(DecimalWidth, u32), Arc<DecimalCodec>>,
    temporals: DashMap<TemporalKey, Arc<TemporalCodec>>,
}

impl CodecCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decimal(&self, width: DecimalWidth, scale: u32) -> CodecResult<Arc<DecimalCodec>> {
        let key = (width, scale);
        if let Some(codec) = self.decimals.get(&key) {
            return Ok(Arc::clone(codec.value()));
        }
        // 先在锁外完成参数校验，插入时若已有其他线程写入则沿用已有实例
        let codec = Arc::new(DecimalCodec::new(width, scale)?);
        let entry = self.decimals.entry(key).or_insert_with(|| {
            log::trace!("cached decimal codec {:?} scale {}", width, scale);
            codec
        });
        Ok(Arc::clone(entry.value()))
    }

    pub fn temporal(&self, kind: TemporalKind, zone: Tz, reference: Tz) -> CodecResult<Arc<TemporalCodec>> {
        let key = (kind, zone.name(), reference.name());
        if let Some(codec) = self.temporals.get(&key) {
            return Ok(Arc::clone(codec.value()));
        }
        let codec = Arc::new(TemporalCodec::new(kind, zone, reference)?);
        let entry = self.temporals.entry(key).or_insert_with(|| {
            log::trace!("cached temporal codec {:?} in {}", kind, zone.name());
            codec
        });
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.decimals.len() + self.temporals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
