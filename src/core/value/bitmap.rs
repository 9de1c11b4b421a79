//! groupBitmap 聚合状态
//!
//! 小集合（不超过 32 个值）以值列表直接编码；更大的位图只以已序列化的
//! roaring 字节透传，编解码器不负责生成 roaring 格式。

/// 小集合编码所能容纳的最大基数
pub const SMALL_SET_MAX: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Bitmap {
    /// 值按内部类型宽度的无符号位模式保存
    Values(Vec<u64>),
    /// 预先序列化的 roaring 位图
    Serialized(Vec<u8>),
}

impl Bitmap {
    pub fn from_values<I: IntoIterator<Item = u64>>(values: I) -> Self {
        let mut values: Vec<u64> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        Bitmap::Values(values)
    }

    pub fn cardinality(&self) -> Option<usize> {
        match self {
            Bitmap::Values(v) => Some(v.len()),
            Bitmap::Serialized(_) => None,
        }
    }

    pub fn is_small(&self) -> bool {
        matches!(self, Bitmap::Values(v) if v.len() <= SMALL_SET_MAX)
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Bitmap::Values(Vec::new())
    }
}
