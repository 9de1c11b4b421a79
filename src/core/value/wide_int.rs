//! 256 位无符号整数
//!
//! 有符号 256 位整数直接使用 `arrow_buffer::i256`，这里只补足无符号的一半。

use std::fmt;
use std::str::FromStr;

use arrow_buffer::i256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct U256 {
    high: u128,
    low: u128,
}

impl U256 {
    pub const ZERO: U256 = U256 { high: 0, low: 0 };
    pub const MAX: U256 = U256 {
        high: u128::MAX,
        low: u128::MAX,
    };

    pub const fn from_parts(low: u128, high: u128) -> Self {
        Self { high, low }
    }

    pub const fn from_u128(value: u128) -> Self {
        Self { high: 0, low: value }
    }

    pub fn to_parts(self) -> (u128, u128) {
        (self.low, self.high)
    }

    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        let mut low = [0u8; 16];
        let mut high = [0u8; 16];
        low.copy_from_slice(&bytes[..16]);
        high.copy_from_slice(&bytes[16..]);
        Self {
            low: u128::from_le_bytes(low),
            high: u128::from_le_bytes(high),
        }
    }

    pub fn to_le_bytes(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..16].copy_from_slice(&self.low.to_le_bytes());
        out[16..].copy_from_slice(&self.high.to_le_bytes());
        out
    }

    /// 小于 2^255 时可无损转换为 `i256`
    pub fn to_i256(self) -> Option<i256> {
        if self.high > i128::MAX as u128 {
            None
        } else {
            Some(i256::from_parts(self.low, self.high as i128))
        }
    }

    pub fn from_i256(value: i256) -> Option<Self> {
        if value.is_negative() {
            return None;
        }
        let (low, high) = value.to_parts();
        Some(Self {
            low,
            high: high as u128,
        })
    }

    fn limbs(self) -> [u64; 4] {
        [
            self.low as u64,
            (self.low >> 64) as u64,
            self.high as u64,
            (self.high >> 64) as u64,
        ]
    }

    fn from_limbs(limbs: [u64; 4]) -> Self {
        Self {
            low: limbs[0] as u128 | ((limbs[1] as u128) << 64),
            high: limbs[2] as u128 | ((limbs[3] as u128) << 64),
        }
    }

    fn is_zero(self) -> bool {
        self.low == 0 && self.high == 0
    }

    /// 除以一个小整数，返回商和余数
    fn div_rem_small(self, divisor: u64) -> (Self, u64) {
        let mut limbs = self.limbs();
        let mut rem: u128 = 0;
        for limb in limbs.iter_mut().rev() {
            let cur = (rem << 64) | *limb as u128;
            *limb = (cur / divisor as u128) as u64;
            rem = cur % divisor as u128;
        }
        (Self::from_limbs(limbs), rem as u64)
    }

    fn checked_mul_add_small(self, mul: u64, add: u64) -> Option<Self> {
        let mut limbs = self.limbs();
        let mut carry: u128 = add as u128;
        for limb in limbs.iter_mut() {
            let cur = *limb as u128 * mul as u128 + carry;
            *limb = cur as u64;
            carry = cur >> 64;
        }
        if carry != 0 {
            None
        } else {
            Some(Self::from_limbs(limbs))
        }
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let mut digits = Vec::new();
        let mut cur = *self;
        while !cur.is_zero() {
            let (q, r) = cur.div_rem_small(10);
            digits.push(b'0' + r as u8);
            cur = q;
        }
        digits.reverse();
        f.write_str(std::str::from_utf8(&digits).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for U256 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty string".to_string());
        }
        let mut acc = U256::ZERO;
        for b in s.bytes() {
            if !b.is_ascii_digit() {
                return Err(format!("invalid digit in '{}'", s));
            }
            acc = acc
                .checked_mul_add_small(10, (b - b'0') as u64)
                .ok_or_else(|| format!("'{}' overflows UInt256", s))?;
        }
        Ok(acc)
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        U256::from_u128(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(U256::MAX.to_string(), max);
        assert_eq!(max.parse::<U256>().unwrap(), U256::MAX);
        assert!(format!("{}0", max).parse::<U256>().is_err());
        assert_eq!(U256::from_u128(12345).to_string(), "12345");
        assert_eq!(U256::ZERO.to_string(), "0");
    }

    #[test]
    fn test_le_bytes() {
        let v = U256::from_parts(1, 2);
        let bytes = v.to_le_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[16], 2);
        assert_eq!(U256::from_le_bytes(bytes), v);
    }

    #[test]
    fn test_i256_conversion() {
        assert_eq!(U256::MAX.to_i256(), None);
        let v = U256::from_u128(42);
        assert_eq!(v.to_i256(), Some(i256::from_i128(42)));
        assert_eq!(U256::from_i256(i256::from_i128(-1)), None);
        assert_eq!(U256::from_i256(i256::MAX).and_then(|u| u.to_i256()), Some(i256::MAX));
    }
}
