use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Largest cent value that survives a round trip through an `f64`.
const MAX_CENTS: i64 = (1 << 53) - 1;

/// Entered amounts and percentages keep six decimals until they are summed.
const MICROS: i128 = 1_000_000;

/// Micro units in one cent.
const MICROS_PER_CENT: i128 = MICROS / 100;

/// Signed money amount held as integer **cents**.
///
/// All balances, shares and expense totals go through this type so that
/// splitting and reconciling never drift by a fraction of a cent.
///
/// On the wire and in storage the amount is a plain decimal number of major
/// units (`12.34`), rounded to the nearest cent when read back.
///
/// ```rust
/// use tripmate::Money;
///
/// let amount = Money::from_major(0.1 + 0.2).unwrap();
/// assert_eq!(amount.cents(), 30);
/// assert_eq!(amount.to_string(), "0.30");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Converts a decimal amount of major units, rounding to the nearest cent.
    pub fn from_major(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::InvalidAmount(format!(
                "amount {value} is not a number"
            )));
        }
        let cents = (value * 100.0).round();
        if cents.abs() > MAX_CENTS as f64 {
            return Err(ValidationError::InvalidAmount(format!(
                "amount {value} is too large"
            )));
        }
        Ok(Self(cents as i64))
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Checked addition (returns `None` on overflow). The `+` operator
    /// saturates instead.
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// The part of `self` matching `percentage`, rounded down to the cent.
    #[must_use]
    pub fn portion(self, percentage: Percentage) -> Money {
        let scaled = i128::from(self.0) * i128::from(percentage.micros());
        let cents = scaled.div_euclid(i128::from(Percentage::HUNDRED.micros()));
        // |cents| <= |self.0| for any percentage up to 100%.
        Money(i64::try_from(cents).unwrap_or(self.0))
    }

    /// Splits `self` into `parts` equal pieces rounded down to the cent, and
    /// returns `(piece, remainder)` with `piece * parts + remainder == self`.
    #[must_use]
    pub fn divide(self, parts: usize) -> (Money, Money) {
        let parts = i64::try_from(parts.max(1)).unwrap_or(i64::MAX);
        let piece = self.0.div_euclid(parts);
        (Money(piece), Money(self.0 - piece * parts))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_major(value).map_err(de::Error::custom)
    }
}

/// Writes `micros` millionths as a decimal with at least two places.
fn write_micros(f: &mut fmt::Formatter<'_>, micros: i128) -> fmt::Result {
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    let scale = MICROS.unsigned_abs();
    let mut frac = format!("{:06}", abs % scale);
    while frac.len() > 2 && frac.ends_with('0') {
        frac.pop();
    }
    write!(f, "{sign}{}.{frac}", abs / scale)
}

/// An amount as typed on an expense form, kept to the millionth of a major
/// unit.
///
/// Custom split entries are summed at this precision and only then compared
/// with the expense total, so `33.333 + 33.333 + 33.334` is `100.00` even
/// though each entry alone rounds to `33.33`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnteredAmount(i128);

impl EnteredAmount {
    pub fn from_major(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::InvalidAmount(format!(
                "amount {value} is not a number"
            )));
        }
        if (value * 100.0).abs() > MAX_CENTS as f64 {
            return Err(ValidationError::InvalidAmount(format!(
                "amount {value} is too large"
            )));
        }
        Ok(Self((value * MICROS as f64).round() as i128))
    }

    #[must_use]
    pub const fn micros(self) -> i128 {
        self.0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Rounds to the nearest cent, halves away from zero.
    #[must_use]
    pub fn to_money(self) -> Money {
        let half = MICROS_PER_CENT / 2;
        let cents = if self.0 < 0 {
            -((-self.0 + half) / MICROS_PER_CENT)
        } else {
            (self.0 + half) / MICROS_PER_CENT
        };
        // Bounded by MAX_CENTS on input.
        Money(i64::try_from(cents).unwrap_or(if cents < 0 { i64::MIN } else { i64::MAX }))
    }

    #[must_use]
    pub fn to_major(self) -> f64 {
        self.0 as f64 / MICROS as f64
    }
}

impl From<Money> for EnteredAmount {
    fn from(value: Money) -> Self {
        Self(i128::from(value.0) * MICROS_PER_CENT)
    }
}

impl Sum for EnteredAmount {
    fn sum<I: Iterator<Item = EnteredAmount>>(iter: I) -> Self {
        // Each entry is bounded by MAX_CENTS, far below i128::MAX.
        Self(iter.map(|a| a.0).sum())
    }
}

impl fmt::Display for EnteredAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_micros(f, self.0)
    }
}

impl Serialize for EnteredAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major())
    }
}

impl<'de> Deserialize<'de> for EnteredAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        EnteredAmount::from_major(value).map_err(de::Error::custom)
    }
}

/// A non-negative percentage held in millionths of a percent.
///
/// Six decimals are kept so that `33.333`, `33.333` and `33.334` still total
/// exactly 100%.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percentage(u64);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0);
    pub const HUNDRED: Percentage = Percentage(100 * MICROS as u64);

    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub fn from_percent(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::InvalidAmount(format!(
                "percentage {value} is not a number"
            )));
        }
        let micros = (value * MICROS as f64).round();
        if micros < 0.0 {
            return Err(ValidationError::InvalidAmount(format!(
                "percentage {value} is negative"
            )));
        }
        if micros > u32::MAX as f64 * MICROS as f64 {
            return Err(ValidationError::InvalidAmount(format!(
                "percentage {value} is too large"
            )));
        }
        Ok(Self(micros as u64))
    }

    /// Millionths of a percent.
    #[must_use]
    pub const fn micros(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn to_percent(self) -> f64 {
        self.0 as f64 / MICROS as f64
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_micros(f, i128::from(self.0))?;
        f.write_str("%")
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_percent())
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Percentage::from_percent(value).map_err(de::Error::custom)
    }
}
