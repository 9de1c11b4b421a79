//! 定点小数值
//!
//! 以 256 位未缩放整数加小数位数表示，可容纳 Decimal32 到 Decimal256 的全部取值。

use std::fmt;
use std::str::FromStr;

use arrow_buffer::i256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalValue {
    pub unscaled: i256,
    pub scale: u32,
}

/// 10 的 `exp` 次方，溢出 256 位时返回 `None`
pub fn pow10(exp: u32) -> Option<i256> {
    let ten = i256::from_i128(10);
    let mut acc = i256::ONE;
    for _ in 0..exp {
        acc = acc.checked_mul(ten)?;
    }
    Some(acc)
}

impl DecimalValue {
    pub fn new(unscaled: i256, scale: u32) -> Self {
        Self { unscaled, scale }
    }

    pub fn from_i128(unscaled: i128, scale: u32) -> Self {
        Self::new(i256::from_i128(unscaled), scale)
    }

    /// 调整到目标小数位数下的未缩放整数
    ///
    /// 位数增加时按 10 的幂放大，溢出返回 `None`；位数减少时向零截断。
    pub fn rescale(&self, scale: u32) -> Option<i256> {
        if scale == self.scale {
            Some(self.unscaled)
        } else if scale > self.scale {
            self.unscaled.checked_mul(pow10(scale - self.scale)?)
        } else {
            self.unscaled.checked_div(pow10(self.scale - scale)?)
        }
    }

    pub fn is_negative(&self) -> bool {
        self.unscaled.is_negative()
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.to_string();
        let (sign, digits) = match digits.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", digits.as_str()),
        };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits.to_string()
        };
        let split = padded.len() - scale;
        write!(f, "{}{}.{}", sign, &padded[..split], &padded[split..])
    }
}

impl FromStr for DecimalValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, body) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(format!("invalid decimal '{}'", s));
        }
        let ten = i256::from_i128(10);
        let mut acc = i256::ZERO;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            if !b.is_ascii_digit() {
                return Err(format!("invalid decimal '{}'", s));
            }
            acc = acc
                .checked_mul(ten)
                .and_then(|v| v.checked_add(i256::from_i128((b - b'0') as i128)))
                .ok_or_else(|| format!("decimal '{}' overflows 256 bits", s))?;
        }
        if negative {
            acc = acc
                .checked_neg()
                .ok_or_else(|| format!("decimal '{}' overflows 256 bits", s))?;
        }
        Ok(Self::new(acc, frac_part.len() as u32))
    }
}
