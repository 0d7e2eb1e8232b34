//! Arbitrary-precision decimal used for every game quantity.
//!
//! A [`Decimal`] is a fixed-point value `units / 10^SCALE` over an unbounded
//! [`BigInt`]. Addition and subtraction are exact; multiplication and
//! division round half away from zero at [`SCALE`] fractional digits. The
//! integer part is unbounded, so values such as `1e300` keep every digit.
//!
//! Fractional powers use the identity `x^y = exp(y * ln x)` evaluated with
//! [`GUARD_DIGITS`] extra digits:
//! - `ln` reduces the argument to `[1, 2)` by a power of two and sums the
//!   series `ln y = 2 * atanh((y - 1) / (y + 1))`;
//! - `exp` reduces by multiples of `ln 2`, halves the remainder
//!   [`EXP_SQUARINGS`] times, sums the Taylor series, then squares back.
//!
//! An exponent with fractional part exactly `0.5` is routed through the
//! integer square root instead, which truncates and therefore floors exactly.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Number of fractional digits carried by every [`Decimal`].
pub const SCALE: u32 = 100;
/// Extra digits used internally by `ln`/`exp`.
pub const GUARD_DIGITS: u32 = 24;
/// Halvings applied to the reduced `exp` argument before the Taylor sum.
pub const EXP_SQUARINGS: usize = 12;
/// Largest decimal exponent accepted by the parser (`1e100000`).
pub const MAX_PARSE_EXPONENT: i64 = 100_000;

/// Errors produced by parsing or by partial operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecimalError {
    /// Input string was empty.
    #[error("empty decimal string")]
    Empty,
    /// Input string contained something other than a decimal literal.
    #[error("invalid decimal literal: {0:?}")]
    InvalidLiteral(String),
    /// Exponent was too large to be represented.
    #[error("exponent out of range: {0}")]
    ExponentOutOfRange(i64),
    /// Division (or negative power) of zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Square root or logarithm of a negative value.
    #[error("operation undefined for negative value")]
    NegativeOperand,
}

/// Arbitrary-precision signed base-10 number.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal {
    units: BigInt,
}

fn ten_pow(n: u32) -> BigInt {
    BigInt::from(10u32).pow(n)
}

fn unit() -> &'static BigInt {
    static UNIT: OnceLock<BigInt> = OnceLock::new();
    UNIT.get_or_init(|| ten_pow(SCALE))
}

fn guard_factor() -> &'static BigInt {
    static GUARD: OnceLock<BigInt> = OnceLock::new();
    GUARD.get_or_init(|| ten_pow(GUARD_DIGITS))
}

fn working_unit() -> &'static BigInt {
    static WORK: OnceLock<BigInt> = OnceLock::new();
    WORK.get_or_init(|| ten_pow(SCALE + GUARD_DIGITS))
}

/// Integer division rounding half away from zero.
fn div_round(n: &BigInt, d: &BigInt) -> BigInt {
    let (q, r) = n.div_rem(d);
    if (r.abs() << 1usize) >= d.abs() {
        if n.is_negative() != d.is_negative() {
            q - BigInt::one()
        } else {
            q + BigInt::one()
        }
    } else {
        q
    }
}

fn wmul(a: &BigInt, b: &BigInt, one: &BigInt) -> BigInt {
    div_round(&(a * b), one)
}

fn wdiv(a: &BigInt, b: &BigInt, one: &BigInt) -> BigInt {
    div_round(&(a * one), b)
}

/// `ln y` for `y` in `[1, 2)` via `2 * atanh((y-1)/(y+1))`.
fn ln_reduced(y: &BigInt, one: &BigInt) -> BigInt {
    let z = wdiv(&(y - one), &(y + one), one);
    let z2 = wmul(&z, &z, one);
    let mut term = z;
    let mut sum = BigInt::zero();
    let mut n = BigInt::one();
    loop {
        let t = div_round(&term, &n);
        if t.is_zero() {
            break;
        }
        sum += t;
        term = wmul(&term, &z2, one);
        n += BigInt::from(2u32);
    }
    sum << 1usize
}

fn ln2_working() -> &'static BigInt {
    static LN2: OnceLock<BigInt> = OnceLock::new();
    LN2.get_or_init(|| {
        let one = working_unit();
        ln_reduced(&(one << 1usize), one)
    })
}

/// Natural logarithm of a positive working-scale value.
fn ln_working(x: &BigInt) -> BigInt {
    let one = working_unit();
    let two = one << 1usize;
    let mut k = x.bits() as i64 - one.bits() as i64;
    let mut y = if k >= 0 {
        div_round(x, &(BigInt::one() << (k as usize)))
    } else {
        x << ((-k) as usize)
    };
    while y >= two {
        y = div_round(&y, &BigInt::from(2u32));
        k += 1;
    }
    while &y < one {
        y = y << 1usize;
        k -= 1;
    }
    ln_reduced(&y, one) + BigInt::from(k) * ln2_working()
}

/// `e^x` for a working-scale value.
fn exp_working(x: &BigInt) -> Result<BigInt, DecimalError> {
    let one = working_unit();
    let ln2 = ln2_working();
    let n = div_round(x, ln2);
    let shift = n
        .to_i64()
        .filter(|v| v.unsigned_abs() <= (MAX_PARSE_EXPONENT as u64) * 4)
        .ok_or(DecimalError::ExponentOutOfRange(MAX_PARSE_EXPONENT))?;
    let r = x - &n * ln2;
    let r = div_round(&r, &(BigInt::one() << EXP_SQUARINGS));
    let mut sum = one.clone();
    let mut term = one.clone();
    let mut i = 1u32;
    loop {
        term = div_round(&wmul(&term, &r, one), &BigInt::from(i));
        if term.is_zero() {
            break;
        }
        sum += &term;
        i += 1;
    }
    for _ in 0..EXP_SQUARINGS {
        sum = wmul(&sum, &sum, one);
    }
    Ok(if shift >= 0 {
        sum << (shift as usize)
    } else {
        div_round(&sum, &(BigInt::one() << ((-shift) as usize)))
    })
}

impl Decimal {
    /// Zero.
    pub fn zero() -> Self {
        Self {
            units: BigInt::zero(),
        }
    }

    /// One.
    pub fn one() -> Self {
        Self {
            units: unit().clone(),
        }
    }

    /// Build `mantissa * 10^-scale`, e.g. `Decimal::new(15, 1)` is `1.5`.
    pub fn new(mantissa: i64, scale: u32) -> Self {
        let m = BigInt::from(mantissa);
        let units = if scale <= SCALE {
            m * ten_pow(SCALE - scale)
        } else {
            div_round(&m, &ten_pow(scale - SCALE))
        };
        Self { units }
    }

    /// True when the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.units.is_zero()
    }

    /// True when the value is strictly below zero.
    pub fn is_negative(&self) -> bool {
        self.units.is_negative()
    }

    /// True when the value is strictly above zero.
    pub fn is_positive(&self) -> bool {
        self.units.is_positive()
    }

    /// True when the value has no fractional part.
    pub fn is_integer(&self) -> bool {
        self.units.is_multiple_of(unit())
    }

    /// Largest integer not greater than `self`.
    pub fn floor(&self) -> Self {
        Self {
            units: self.units.div_floor(unit()) * unit(),
        }
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Self {
            units: self.units.abs(),
        }
    }

    /// `self - rhs`, or zero when `rhs > self`.
    pub fn sub_clamped(&self, rhs: &Decimal) -> Self {
        if rhs >= self {
            Self::zero()
        } else {
            self - rhs
        }
    }

    /// Division returning `None` when `rhs` is zero.
    pub fn checked_div(&self, rhs: &Decimal) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        Some(Self {
            units: div_round(&(&self.units * unit()), &rhs.units),
        })
    }

    /// Integer power by repeated squaring. Each multiplication rounds at
    /// [`SCALE`] digits, so results are deterministic for a given input.
    pub fn powi(&self, exponent: u64) -> Self {
        let mut result = Self::one();
        let mut base = self.clone();
        let mut e = exponent;
        while e > 0 {
            if e & 1 == 1 {
                result = &result * &base;
            }
            e >>= 1;
            if e > 0 {
                base = &base * &base;
            }
        }
        result
    }

    /// Square root, truncated at [`SCALE`] digits.
    pub fn sqrt(&self) -> Result<Self, DecimalError> {
        if self.is_negative() {
            return Err(DecimalError::NegativeOperand);
        }
        Ok(Self {
            units: (&self.units * unit()).sqrt(),
        })
    }

    /// Natural logarithm.
    pub fn ln(&self) -> Result<Self, DecimalError> {
        if !self.is_positive() {
            return Err(DecimalError::NegativeOperand);
        }
        let l = ln_working(&(&self.units * guard_factor()));
        Ok(Self {
            units: div_round(&l, guard_factor()),
        })
    }

    /// `e^self`.
    pub fn exp(&self) -> Result<Self, DecimalError> {
        let e = exp_working(&(&self.units * guard_factor()))?;
        Ok(Self {
            units: div_round(&e, guard_factor()),
        })
    }

    /// Real power `self^exponent`.
    ///
    /// Integer exponents use [`Decimal::powi`]. A fractional part of exactly
    /// one half uses [`Decimal::sqrt`]; anything else goes through `exp`/`ln`.
    pub fn pow(&self, exponent: &Decimal) -> Result<Self, DecimalError> {
        if exponent.is_integer() {
            let n = (&exponent.units / unit())
                .to_i64()
                .ok_or(DecimalError::ExponentOutOfRange(i64::MAX))?;
            if n >= 0 {
                return Ok(self.powi(n as u64));
            }
            return Self::one()
                .checked_div(&self.powi(n.unsigned_abs()))
                .ok_or(DecimalError::DivisionByZero);
        }
        if self.is_zero() {
            return if exponent.is_positive() {
                Ok(Self::zero())
            } else {
                Err(DecimalError::DivisionByZero)
            };
        }
        if self.is_negative() {
            return Err(DecimalError::NegativeOperand);
        }
        let whole = exponent.floor();
        let frac = exponent - &whole;
        if frac == Decimal::new(5, 1) {
            let root = self.sqrt()?;
            if whole.is_zero() {
                return Ok(root);
            }
            return Ok(&self.pow(&whole)? * &root);
        }
        let wone = working_unit();
        let l = ln_working(&(&self.units * guard_factor()));
        let y = wmul(&l, &(&exponent.units * guard_factor()), wone);
        let e = exp_working(&y)?;
        Ok(Self {
            units: div_round(&e, guard_factor()),
        })
    }

    /// Integer part as `u64`, truncating toward zero. `None` when negative
    /// or out of range.
    pub fn to_u64(&self) -> Option<u64> {
        (&self.units / unit()).to_u64()
    }
}

macro_rules! forward_binop {
    ($imp:ident, $method:ident, $body:ident) => {
        impl<'a, 'b> $imp<&'b Decimal> for &'a Decimal {
            type Output = Decimal;
            fn $method(self, rhs: &'b Decimal) -> Decimal {
                $body(self, rhs)
            }
        }
        impl<'a> $imp<&'a Decimal> for Decimal {
            type Output = Decimal;
            fn $method(self, rhs: &'a Decimal) -> Decimal {
                $body(&self, rhs)
            }
        }
        impl<'a> $imp<Decimal> for &'a Decimal {
            type Output = Decimal;
            fn $method(self, rhs: Decimal) -> Decimal {
                $body(self, &rhs)
            }
        }
        impl $imp<Decimal> for Decimal {
            type Output = Decimal;
            fn $method(self, rhs: Decimal) -> Decimal {
                $body(&self, &rhs)
            }
        }
    };
}

fn add_impl(a: &Decimal, b: &Decimal) -> Decimal {
    Decimal {
        units: &a.units + &b.units,
    }
}

fn sub_impl(a: &Decimal, b: &Decimal) -> Decimal {
    Decimal {
        units: &a.units - &b.units,
    }
}

fn mul_impl(a: &Decimal, b: &Decimal) -> Decimal {
    Decimal {
        units: div_round(&(&a.units * &b.units), unit()),
    }
}

/// # Panics
/// Panics on division by zero, like integer division.
fn div_impl(a: &Decimal, b: &Decimal) -> Decimal {
    match a.checked_div(b) {
        Some(v) => v,
        None => panic!("attempt to divide a Decimal by zero"),
    }
}

forward_binop!(Add, add, add_impl);
forward_binop!(Sub, sub, sub_impl);
forward_binop!(Mul, mul, mul_impl);
forward_binop!(Div, div, div_impl);

impl<'a> AddAssign<&'a Decimal> for Decimal {
    fn add_assign(&mut self, rhs: &'a Decimal) {
        self.units += &rhs.units;
    }
}

impl AddAssign<Decimal> for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        self.units += rhs.units;
    }
}

impl<'a> SubAssign<&'a Decimal> for Decimal {
    fn sub_assign(&mut self, rhs: &'a Decimal) {
        self.units -= &rhs.units;
    }
}

impl SubAssign<Decimal> for Decimal {
    fn sub_assign(&mut self, rhs: Decimal) {
        self.units -= rhs.units;
    }
}

impl<'a> MulAssign<&'a Decimal> for Decimal {
    fn mul_assign(&mut self, rhs: &'a Decimal) {
        *self = mul_impl(self, rhs);
    }
}

impl Neg for Decimal {
    type Output = Decimal;
    fn neg(self) -> Decimal {
        Decimal { units: -self.units }
    }
}

impl<'a> Neg for &'a Decimal {
    type Output = Decimal;
    fn neg(self) -> Decimal {
        Decimal {
            units: -&self.units,
        }
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Decimal> for Decimal {
    fn sum<I: Iterator<Item = &'a Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), |acc, x| acc + x)
    }
}

impl Product for Decimal {
    fn product<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::one(), |acc, x| acc * x)
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Decimal {
                fn from(v: $t) -> Self {
                    Decimal { units: BigInt::from(v) * unit() }
                }
            }
        )*
    };
}

from_int!(u8, u16, u32, u64, usize, i32, i64);

impl From<rust_decimal::Decimal> for Decimal {
    /// Lossless: a `rust_decimal` carries at most 28 fractional digits.
    fn from(v: rust_decimal::Decimal) -> Self {
        Decimal {
            units: BigInt::from(v.mantissa()) * ten_pow(SCALE - v.scale()),
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.units.abs().to_string();
        let scale = SCALE as usize;
        let (int_part, frac_part) = if digits.len() > scale {
            let (i, fr) = digits.split_at(digits.len() - scale);
            (i.to_string(), fr.to_string())
        } else {
            ("0".to_string(), format!("{digits:0>scale$}"))
        };
        let frac = frac_part.trim_end_matches('0');
        if self.units.is_negative() {
            f.write_str("-")?;
        }
        if frac.is_empty() {
            f.write_str(&int_part)
        } else {
            write!(f, "{int_part}.{frac}")
        }
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    /// Accepts `[+-]digits[.digits][(e|E)[+-]digits]`, including `.5` and `5.`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DecimalError::Empty);
        }
        let invalid = || DecimalError::InvalidLiteral(s.to_string());
        let (negative, body) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let (mantissa, exponent) = match body.find(|c: char| c == 'e' || c == 'E') {
            Some(i) => {
                let exp: i64 = body[i + 1..].parse().map_err(|_| invalid())?;
                (&body[..i], exp)
            }
            None => (body, 0),
        };
        if exponent.abs() > MAX_PARSE_EXPONENT {
            return Err(DecimalError::ExponentOutOfRange(exponent));
        }
        let (int_digits, frac_digits) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }
        if !int_digits
            .bytes()
            .chain(frac_digits.bytes())
            .all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let digits = format!("{int_digits}{frac_digits}");
        let coeff = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(invalid)?;
        let shift = exponent - frac_digits.len() as i64 + SCALE as i64;
        let mut units = if shift >= 0 {
            coeff * ten_pow(shift as u32)
        } else {
            let drop = u32::try_from(-shift).map_err(|_| invalid())?;
            div_round(&coeff, &ten_pow(drop))
        };
        if negative {
            units = -units;
        }
        Ok(Decimal { units })
    }
}

impl PartialEq<u64> for Decimal {
    fn eq(&self, other: &u64) -> bool {
        *self == Decimal::from(*other)
    }
}

impl PartialOrd<u64> for Decimal {
    fn partial_cmp(&self, other: &u64) -> Option<Ordering> {
        Some(self.cmp(&Decimal::from(*other)))
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a base-10 decimal string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        if !v.is_finite() {
            return Err(E::custom("non-finite decimal"));
        }
        v.to_string().parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Config formats may write bare numbers; binary formats only carry strings.
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(DecimalVisitor)
        } else {
            deserializer.deserialize_str(DecimalVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(d("1.50").to_string(), "1.5");
        assert_eq!(d("-0.25").to_string(), "-0.25");
        assert_eq!(d(".5").to_string(), "0.5");
        assert_eq!(d("5.").to_string(), "5");
        assert_eq!(d("1e3").to_string(), "1000");
        assert_eq!(d("2.5E-2").to_string(), "0.025");
        assert_eq!(d("-0").to_string(), "0");
        assert!("".parse::<Decimal>().is_err());
        assert!("abc".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("1e".parse::<Decimal>().is_err());
        assert!(".".parse::<Decimal>().is_err());
    }

    #[test]
    fn huge_values_keep_every_digit() {
        let big = d("1e300");
        let s = big.to_string();
        assert_eq!(s.len(), 301);
        let plus_one = &big + &Decimal::one();
        assert!(plus_one > big);
        assert_eq!(&plus_one - &big, Decimal::one());
    }

    #[test]
    fn arithmetic_is_exact_for_short_decimals() {
        assert_eq!(d("0.1") + d("0.2"), d("0.3"));
        assert_eq!(d("1.15") * d("1.15"), d("1.3225"));
        assert_eq!(d("1") / d("4"), d("0.25"));
        assert_eq!(Decimal::new(15, 1), d("1.5"));
        assert!(Decimal::one().checked_div(&Decimal::zero()).is_none());
    }

    #[test]
    fn division_rounds_half_away_from_zero() {
        let third = d("1") / d("3");
        let s = third.to_string();
        assert!(s.starts_with("0.3333"));
        assert_eq!(s.len(), 2 + SCALE as usize);
        let two_thirds = d("2") / d("3");
        assert!(two_thirds.to_string().ends_with('7'));
        let neg = d("-2") / d("3");
        assert!(neg.to_string().ends_with('7'));
    }

    #[test]
    fn floor_and_integer_checks() {
        assert_eq!(d("3.99").floor(), d("3"));
        assert_eq!(d("-0.5").floor(), d("-1"));
        assert!(d("7").is_integer());
        assert!(!d("7.000001").is_integer());
        assert_eq!(d("42.9").to_u64(), Some(42));
        assert_eq!(d("-1").to_u64(), None);
    }

    #[test]
    fn powers_and_roots() {
        assert_eq!(d("1.15").powi(2), d("1.3225"));
        assert_eq!(d("2").powi(10), d("1024"));
        assert_eq!(d("5").powi(0), Decimal::one());
        assert_eq!(d("100").sqrt().unwrap(), d("10"));
        assert_eq!(d("100").pow(&d("0.5")).unwrap(), d("10"));
        assert_eq!(d("4").pow(&d("1.5")).unwrap(), d("8"));
        assert_eq!(d("2").pow(&d("-2")).unwrap(), d("0.25"));
        assert!(d("-4").sqrt().is_err());
        assert!(d("0").pow(&d("-1")).is_err());
        assert!(d("99").sqrt().unwrap().floor() == d("9"));
    }

    #[test]
    fn transcendental_functions() {
        let e = Decimal::one().exp().unwrap();
        assert!(e.to_string().starts_with("2.718281828459045235360287471352"));
        let ln2 = d("2").ln().unwrap();
        assert!(ln2.to_string().starts_with("0.693147180559945309417232121458"));
        let root4 = d("2").pow(&d("0.25")).unwrap();
        assert!(root4.to_string().starts_with("1.1892071150027210667"));
        let back = d("12345.678").ln().unwrap().exp().unwrap();
        let err = (&back - &d("12345.678")).abs();
        assert!(err < d("1e-80"));
        assert!(d("0").ln().is_err());
    }

    #[test]
    fn converts_config_rates_losslessly() {
        let rate = rust_decimal::Decimal::new(115, 2);
        assert_eq!(Decimal::from(rate), d("1.15"));
        let tiny = rust_decimal::Decimal::new(1, 28);
        assert_eq!(Decimal::from(tiny), d("1e-28"));
    }

    #[test]
    fn serde_uses_strings() {
        let v = d("123456789012345678901234567890.000000000000000000001");
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"123456789012345678901234567890.000000000000000000001\"");
        let back: Decimal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        let from_number: Decimal = serde_json::from_str("15").unwrap();
        assert_eq!(from_number, d("15"));
    }

    #[test]
    fn clamped_subtraction() {
        assert_eq!(d("5").sub_clamped(&d("7")), Decimal::zero());
        assert_eq!(d("7").sub_clamped(&d("5")), d("2"));
    }

    proptest! {
        #[test]
        fn display_parse_roundtrip(m in any::<i64>(), scale in 0u32..40, e in 0u64..30) {
            let v = &Decimal::new(m, scale) * &Decimal::from(10u64).powi(e);
            let back: Decimal = v.to_string().parse().unwrap();
            prop_assert_eq!(back, v);
        }

        #[test]
        fn add_then_sub_is_identity(a in any::<i64>(), b in any::<i64>(), sa in 0u32..20, sb in 0u32..20) {
            let x = Decimal::new(a, sa);
            let y = Decimal::new(b, sb);
            prop_assert_eq!(&(&x + &y) - &y, x);
        }

        #[test]
        fn sqrt_floor_matches_integer_root(n in 0u64..1_000_000_000_000) {
            let root = Decimal::from(n).sqrt().unwrap().floor();
            let r = root.to_u64().unwrap();
            prop_assert!(r * r <= n);
            prop_assert!((r + 1) * (r + 1) > n);
        }
    }
}
