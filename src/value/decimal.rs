//! Exact base-10 numbers for decimal literals.
//!
//! `3.14` in markup stays `3.14` rather than the nearest binary float. The
//! representation is a signed mantissa plus a decimal scale, so `3.140` and
//! `3.14` compare equal but keep their own display form.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Largest scale we keep exact. Anything finer is rejected at parse time.
const MAX_SCALE: u32 = 28;

/// An exact decimal number: `mantissa * 10^-scale`.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

/// Error returned when a string is not a valid decimal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid decimal literal '{0}'")]
pub struct ParseDecimalError(pub String);

impl Decimal {
    /// Build from raw parts.
    pub fn new(mantissa: i128, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    /// The integer `value` as a decimal with scale 0.
    pub fn from_i64(value: i64) -> Self {
        Self::new(i128::from(value), 0)
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Nearest `f64`, used for division and mixed float math.
    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }

    /// Build from a float by going through its shortest display form.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        format!("{value}").parse().ok()
    }

    /// Integral part, truncated toward zero, if it fits in `i64`.
    pub fn trunc(&self) -> Option<i64> {
        let divisor = 10i128.checked_pow(self.scale)?;
        i64::try_from(self.mantissa / divisor).ok()
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// Strip trailing fractional zeros.
    pub fn normalize(self) -> Self {
        let mut out = self;
        while out.scale > 0 && out.mantissa % 10 == 0 {
            out.mantissa /= 10;
            out.scale -= 1;
        }
        out
    }

    /// Bring both operands to the same scale. `None` on overflow.
    fn aligned(self, other: Self) -> Option<(i128, i128, u32)> {
        match self.scale.cmp(&other.scale) {
            Ordering::Equal => Some((self.mantissa, other.mantissa, self.scale)),
            Ordering::Less => {
                let factor = 10i128.checked_pow(other.scale - self.scale)?;
                Some((self.mantissa.checked_mul(factor)?, other.mantissa, other.scale))
            }
            Ordering::Greater => {
                let factor = 10i128.checked_pow(self.scale - other.scale)?;
                Some((self.mantissa, other.mantissa.checked_mul(factor)?, self.scale))
            }
        }
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        let (a, b, scale) = self.aligned(other)?;
        Some(Self::new(a.checked_add(b)?, scale))
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        let (a, b, scale) = self.aligned(other)?;
        Some(Self::new(a.checked_sub(b)?, scale))
    }

    pub fn checked_mul(self, other: Self) -> Option<Self> {
        let scale = self.scale + other.scale;
        if scale > MAX_SCALE {
            return Self::from_f64(self.to_f64() * other.to_f64());
        }
        Some(Self::new(self.mantissa.checked_mul(other.mantissa)?, scale))
    }

    pub fn neg(self) -> Self {
        Self::new(-self.mantissa, self.scale)
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_owned());
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }
        let scale = u32::try_from(frac_part.len()).map_err(|_| err())?;
        if scale > MAX_SCALE {
            return Err(err());
        }

        let mut mantissa: i128 = 0;
        for digit in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(digit - b'0')))
                .ok_or_else(err)?;
        }
        if negative {
            mantissa = -mantissa;
        }
        Ok(Self::new(mantissa, scale))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let sign = if self.mantissa < 0 { "-" } else { "" };
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int}.{frac}")
        } else {
            write!(f, "{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_value(other) == Ordering::Equal
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_value(other))
    }
}

impl Decimal {
    fn cmp_value(&self, other: &Self) -> Ordering {
        match self.aligned(*other) {
            Some((a, b, _)) => a.cmp(&b),
            None => self
                .to_f64()
                .partial_cmp(&other.to_f64())
                .unwrap_or(Ordering::Equal),
        }
    }
}
