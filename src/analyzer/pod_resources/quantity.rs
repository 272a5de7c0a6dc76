//! Exact resource quantities.
//!
//! Parses Kubernetes quantity strings ("500m", "256Mi", "1e3", "2") into a
//! fixed-point magnitude so that values written with different suffixes can
//! be compared and summed without rounding drift.

use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use std::sync::LazyLock;

/// Nano-units per whole unit. One nano-unit is the smallest amount a
/// quantity can hold; finer fractions are rounded up to it.
const NANOS_PER_UNIT: i128 = 1_000_000_000;
const NANO_EXPONENT: i32 = 9;

/// Largest power of ten that fits in an `i128`.
const MAX_POW10: u32 = 38;

const BINARY_SUFFIXES: [&str; 7] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];

/// Splits a quantity into sign, integer digits, fraction digits and the rest.
static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])?([0-9]*)(?:\.([0-9]*))?(.*)$").unwrap());

// ============================================================================
// Errors
// ============================================================================

/// Reasons a quantity string can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityParseError {
    #[error("quantity is empty")]
    Empty,

    #[error("invalid number in quantity {0:?}")]
    InvalidNumber(String),

    #[error("unrecognized suffix {suffix:?} in quantity {input:?}")]
    UnknownSuffix { input: String, suffix: String },

    #[error("quantity {0:?} is out of range")]
    OutOfRange(String),
}

// ============================================================================
// Format
// ============================================================================

/// The notation a quantity was written in. Only affects rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuantityFormat {
    /// Power-of-ten suffixes: n, u, m, k, M, G, T, P, E
    #[default]
    DecimalSi,
    /// Power-of-1024 suffixes: Ki, Mi, Gi, Ti, Pi, Ei
    BinarySi,
    /// Scientific notation: 1e3, 5E-3
    DecimalExponent,
}

/// Scale applied to the numeric literal by a suffix.
#[derive(Debug, Clone, Copy)]
enum Scale {
    /// Multiply by 10^n.
    Decimal(i32),
    /// Multiply by 1024^n.
    Binary(u32),
}

fn parse_suffix(suffix: &str) -> Option<(Scale, QuantityFormat)> {
    let decimal = |exp| Some((Scale::Decimal(exp), QuantityFormat::DecimalSi));
    let binary = |power| Some((Scale::Binary(power), QuantityFormat::BinarySi));

    match suffix {
        "n" => decimal(-9),
        "u" => decimal(-6),
        "m" => decimal(-3),
        "" => decimal(0),
        "k" => decimal(3),
        "M" => decimal(6),
        "G" => decimal(9),
        "T" => decimal(12),
        "P" => decimal(15),
        "E" => decimal(18),
        "Ki" => binary(1),
        "Mi" => binary(2),
        "Gi" => binary(3),
        "Ti" => binary(4),
        "Pi" => binary(5),
        "Ei" => binary(6),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            let exponent: i32 = exponent.parse().ok()?;
            Some((Scale::Decimal(exponent), QuantityFormat::DecimalExponent))
        }
    }
}

fn decimal_suffix(exponent: i32) -> &'static str {
    match exponent {
        -9 => "n",
        -6 => "u",
        -3 => "m",
        3 => "k",
        6 => "M",
        9 => "G",
        12 => "T",
        15 => "P",
        18 => "E",
        _ => "",
    }
}

// ============================================================================
// Quantity
// ============================================================================

/// A resource amount such as `500m` CPU or `256Mi` memory.
///
/// Stored as a signed count of nano-units. Equality, ordering and hashing
/// use the magnitude only, so `"1"` and `"1000m"` are the same quantity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quantity {
    nanos: i128,
    format: QuantityFormat,
}

impl Quantity {
    /// The zero quantity, identity for addition.
    pub const fn zero() -> Self {
        Self {
            nanos: 0,
            format: QuantityFormat::DecimalSi,
        }
    }

    /// Build a quantity from whole milli-units (e.g. millicores).
    pub fn from_milli(milli: i64, format: QuantityFormat) -> Self {
        Self {
            nanos: i128::from(milli) * 1_000_000,
            format,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }

    pub fn is_negative(&self) -> bool {
        self.nanos < 0
    }

    /// The notation used when rendering this quantity.
    pub fn format_kind(&self) -> QuantityFormat {
        self.format
    }

    /// Value in milli-units, rounded up.
    pub fn milli_value(&self) -> i128 {
        ceil_div(self.nanos, 1_000_000)
    }

    /// Value in whole units, rounded up.
    pub fn value(&self) -> i128 {
        ceil_div(self.nanos, NANOS_PER_UNIT)
    }

    /// Exact addition, `None` on overflow. Keeps `self`'s format.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        Some(Self {
            nanos: self.nanos.checked_add(other.nanos)?,
            format: self.format,
        })
    }

    fn parse_str(input: &str) -> Result<Self, QuantityParseError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(QuantityParseError::Empty);
        }

        let invalid = || QuantityParseError::InvalidNumber(text.to_string());

        let caps = NUMBER_REGEX.captures(text).ok_or_else(invalid)?;
        let negative = caps.get(1).is_some_and(|m| m.as_str() == "-");
        let int_part = caps.get(2).map_or("", |m| m.as_str());
        let frac_part = caps.get(3).map_or("", |m| m.as_str());
        let suffix = caps.get(4).map_or("", |m| m.as_str());

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if suffix.starts_with(|c: char| c.is_ascii_digit() || c == '.' || c == '+' || c == '-') {
            return Err(invalid());
        }

        let (scale, format) =
            parse_suffix(suffix).ok_or_else(|| QuantityParseError::UnknownSuffix {
                input: text.to_string(),
                suffix: suffix.to_string(),
            })?;

        let magnitude = scale_to_nanos(int_part, frac_part, scale)
            .ok_or_else(|| QuantityParseError::OutOfRange(text.to_string()))?;

        Ok(Self {
            nanos: if negative { -magnitude } else { magnitude },
            format,
        })
    }
}

/// Combine the literal's digits with its suffix scale into nano-units.
fn scale_to_nanos(int_part: &str, frac_part: &str, scale: Scale) -> Option<i128> {
    // Fraction digits past this position cannot change the nano-unit count
    // beyond forcing a round up.
    let precision = match scale {
        Scale::Decimal(exponent) => NANO_EXPONENT.saturating_add(exponent).max(0),
        Scale::Binary(power) => NANO_EXPONENT + 10 * power as i32,
    };
    let frac_part = frac_part.trim_end_matches('0');
    let (frac_part, dropped) = frac_part.split_at(frac_part.len().min(precision as usize));
    let inexact = !dropped.is_empty();

    let digits = format!("{int_part}{frac_part}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(i128::from(inexact));
    }
    if digits.len() > MAX_POW10 as usize {
        return None;
    }

    let mut mantissa: i128 = digits.parse().ok()?;
    let mut shift = NANO_EXPONENT - i32::try_from(frac_part.len()).ok()?;

    match scale {
        Scale::Decimal(exponent) => shift = shift.checked_add(exponent)?,
        Scale::Binary(power) => mantissa = mantissa.checked_mul(1024i128.checked_pow(power)?)?,
    }

    if shift >= 0 {
        let scaled = mantissa.checked_mul(10i128.checked_pow(shift.unsigned_abs())?)?;
        return if inexact { scaled.checked_add(1) } else { Some(scaled) };
    }

    let divisor_exp = shift.unsigned_abs();
    if divisor_exp > MAX_POW10 {
        // Any non-zero amount below one nano-unit rounds up to it.
        return Some(1);
    }
    let divisor = 10i128.pow(divisor_exp);
    if inexact {
        Some(mantissa / divisor + 1)
    } else {
        Some(ceil_div(mantissa, divisor))
    }
}

/// Division rounding towards positive infinity.
fn ceil_div(value: i128, divisor: i128) -> i128 {
    let quotient = value / divisor;
    if value % divisor > 0 {
        quotient + 1
    } else {
        quotient
    }
}

/// Largest power-of-1024 suffix that represents `magnitude` exactly.
/// Only whole amounts of at least 1024 units use binary notation.
fn binary_form(magnitude: u128) -> Option<(u128, &'static str)> {
    let nanos_per_unit = NANOS_PER_UNIT.unsigned_abs();
    if magnitude % nanos_per_unit != 0 {
        return None;
    }
    let mut mantissa = magnitude / nanos_per_unit;
    if mantissa < 1024 {
        return None;
    }

    let mut index = 0;
    while index < BINARY_SUFFIXES.len() - 1 && mantissa % 1024 == 0 {
        mantissa /= 1024;
        index += 1;
    }
    Some((mantissa, BINARY_SUFFIXES[index]))
}

/// Largest power-of-1000 exponent (between n and E) that represents
/// `magnitude` exactly.
fn decimal_form(magnitude: u128) -> (u128, i32) {
    let mut mantissa = magnitude;
    let mut exponent = -NANO_EXPONENT;
    while exponent < 18 && mantissa % 1000 == 0 {
        mantissa /= 1000;
        exponent += 3;
    }
    (mantissa, exponent)
}

impl FromStr for Quantity {
    type Err = QuantityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            return f.pad("0");
        }

        let sign = if self.nanos < 0 { "-" } else { "" };
        let magnitude = self.nanos.unsigned_abs();

        if self.format == QuantityFormat::BinarySi {
            if let Some((mantissa, suffix)) = binary_form(magnitude) {
                return f.pad(&format!("{sign}{mantissa}{suffix}"));
            }
        }

        let (mantissa, exponent) = decimal_form(magnitude);
        let text = match self.format {
            QuantityFormat::DecimalExponent if exponent != 0 => {
                format!("{sign}{mantissa}e{exponent}")
            }
            QuantityFormat::DecimalExponent => format!("{sign}{mantissa}"),
            _ => format!("{sign}{mantissa}{}", decimal_suffix(exponent)),
        };
        f.pad(&text)
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.nanos == other.nanos
    }
}

impl Eq for Quantity {}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nanos.hash(state);
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.nanos.cmp(&other.nanos)
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Saturates at the representable range; use [`Quantity::checked_add`] to
/// detect overflow.
impl Add for Quantity {
    type Output = Quantity;

    fn add(self, other: Self) -> Self {
        Self {
            nanos: self.nanos.saturating_add(other.nanos),
            format: self.format,
        }
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.reduce(Add::add).unwrap_or_else(Quantity::zero)
    }
}

impl<'a> Sum<&'a Quantity> for Quantity {
    fn sum<I: Iterator<Item = &'a Quantity>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuantityVisitor;

        impl Visitor<'_> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a resource quantity such as \"500m\" or \"1Gi\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
                self.visit_str(&v.to_string())
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
                self.visit_str(&v.to_string())
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
                self.visit_str(&v.to_string())
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_decimal_suffixes() {
        assert_eq!(q("500m").milli_value(), 500);
        assert_eq!(q("2").milli_value(), 2000);
        assert_eq!(q("1.5").milli_value(), 1500);
        assert_eq!(q("0.1").milli_value(), 100);
        assert_eq!(q(".5").milli_value(), 500);
        assert_eq!(q("1k").value(), 1000);
        assert_eq!(q("128M").value(), 128_000_000);
        assert_eq!(q("1E").value(), 1_000_000_000_000_000_000);
        assert_eq!(q("250u").milli_value(), 1);
    }

    #[test]
    fn test_parse_binary_suffixes() {
        assert_eq!(q("1Ki").value(), 1024);
        assert_eq!(q("128Mi").value(), 128 * 1024 * 1024);
        assert_eq!(q("1Gi").value(), 1024 * 1024 * 1024);
        assert_eq!(q("1.5Gi").value(), 1536 * 1024 * 1024);
        assert_eq!(q("1Ei").value(), 1 << 60);
    }

    #[test]
    fn test_parse_exponent() {
        assert_eq!(q("1e3"), q("1k"));
        assert_eq!(q("5E-3"), q("5m"));
        assert_eq!(q("1e3").format_kind(), QuantityFormat::DecimalExponent);
    }

    #[test]
    fn test_parse_sign_and_whitespace() {
        assert_eq!(q(" 100m "), q("0.1"));
        assert_eq!(q("+1"), q("1"));
        assert!(q("-1").is_negative());
        assert_eq!(q("-1") + q("1"), Quantity::zero());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Quantity>(), Err(QuantityParseError::Empty));
        assert_eq!("   ".parse::<Quantity>(), Err(QuantityParseError::Empty));
        assert!(matches!(
            "abc".parse::<Quantity>(),
            Err(QuantityParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            ".".parse::<Quantity>(),
            Err(QuantityParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            "1.2.3".parse::<Quantity>(),
            Err(QuantityParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            "100x".parse::<Quantity>(),
            Err(QuantityParseError::UnknownSuffix { .. })
        ));
        assert!(matches!(
            "1KB".parse::<Quantity>(),
            Err(QuantityParseError::UnknownSuffix { .. })
        ));
        assert!(matches!(
            "1e".parse::<Quantity>(),
            Err(QuantityParseError::UnknownSuffix { .. })
        ));
        assert!(matches!(
            "١٠٠m".parse::<Quantity>(),
            Err(QuantityParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            "1e40".parse::<Quantity>(),
            Err(QuantityParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_sub_nano_rounds_up() {
        assert_eq!(q("0.1n"), q("1n"));
        assert_eq!(q("1e-50"), q("1n"));
        assert!(q("0n").is_zero());
    }

    #[test]
    fn test_long_fraction_rounds_up() {
        assert_eq!(
            q("0.1234567890123456789012345678901234567891"),
            q("123456790n")
        );
        assert_eq!(q("1.0000000001"), q("1000000001n"));
        assert_eq!(q("1.000000000000000000000000000000000000000000"), q("1"));
        assert_eq!(q("0.00000000000000000000000000000000000000000001"), q("1n"));
        assert_eq!(q("0.000000000000000000000000000000000000000001Ki"), q("1n"));
        assert_eq!(q("1.00000000000000000000000000000000000000000Mi"), q("1Mi"));
        assert_eq!(q("0.0000000000000000000000000000000000000000001m"), q("1n"));
    }

    #[test]
    fn test_suffix_equivalence() {
        assert_eq!(q("1"), q("1000m"));
        assert_eq!(q("1Ki"), q("1024"));
        assert_eq!(q("1G"), q("1000M"));
        assert_eq!(q("0.5Gi"), q("512Mi"));
        assert!(q("1Gi") > q("1G"));
        assert!(q("999m") < q("1"));
    }

    #[test]
    fn test_add_is_exact() {
        let total: Quantity = ["100m", "250m", "150m"].iter().map(|s| q(s)).sum();
        assert_eq!(total, q("500m"));
        assert_eq!(total.to_string(), "500m");

        // 0.1 summed ten times must land exactly on 1
        let tenth = q("0.1");
        let sum: Quantity = std::iter::repeat_n(tenth, 10).sum();
        assert_eq!(sum, q("1"));
    }

    #[test]
    fn test_add_keeps_left_format() {
        let sum = q("512Mi") + q("512M");
        assert_eq!(sum.format_kind(), QuantityFormat::BinarySi);
        let sum = q("512M") + q("512Mi");
        assert_eq!(sum.format_kind(), QuantityFormat::DecimalSi);
    }

    #[test]
    fn test_checked_add_overflow() {
        let huge = q("100000000000E");
        assert!(huge.checked_add(huge).is_none());
        assert_eq!(huge + huge, huge + huge + huge);
    }

    #[test]
    fn test_display_canonical() {
        assert_eq!(q("1000m").to_string(), "1");
        assert_eq!(q("1500m").to_string(), "1500m");
        assert_eq!(q("0.5").to_string(), "500m");
        assert_eq!(q("2000").to_string(), "2k");
        assert_eq!(q("1024Mi").to_string(), "1Gi");
        assert_eq!(q("1536Mi").to_string(), "1536Mi");
        assert_eq!(q("0.5Ki").to_string(), "512");
        assert_eq!(q("1e3").to_string(), "1e3");
        assert_eq!(q("0").to_string(), "0");
        assert_eq!(q("-250m").to_string(), "-250m");
        assert_eq!(format!("{:>6}", q("1")), "     1");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&q("256Mi")).unwrap();
        assert_eq!(json, "\"256Mi\"");
        let back: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q("256Mi"));
        let number: Quantity = serde_json::from_str("2").unwrap();
        assert_eq!(number, q("2"));
    }

    fn milli() -> impl Strategy<Value = Quantity> {
        (0i64..10_000_000).prop_map(|m| Quantity::from_milli(m, QuantityFormat::DecimalSi))
    }

    proptest! {
        #[test]
        fn prop_add_commutative(a in milli(), b in milli()) {
            prop_assert_eq!(a + b, b + a);
        }

        #[test]
        fn prop_add_associative(a in milli(), b in milli(), c in milli()) {
            prop_assert_eq!((a + b) + c, a + (b + c));
        }

        #[test]
        fn prop_display_reparses(
            a in 0i64..1_000_000_000_000,
            binary in any::<bool>(),
        ) {
            let format = if binary { QuantityFormat::BinarySi } else { QuantityFormat::DecimalSi };
            let quantity = Quantity::from_milli(a, format);
            let reparsed: Quantity = quantity.to_string().parse().unwrap();
            prop_assert_eq!(reparsed, quantity);
        }
    }
}
