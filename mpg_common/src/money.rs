use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const RUPEE_CURRENCY_CODE: &str = "INR";

const PAISE_PER_RUPEE: i64 = 100;

//--------------------------------------       Paise       -----------------------------------------------------------
/// A monetary amount in Indian paise (hundredths of a rupee).
///
/// All money in the system is carried as an integer number of paise so that fee arithmetic is exact. The gateway
/// speaks in decimal rupee strings ("1023.00"); use [`Paise::from_str`] and [`Paise::to_rupee_string`] at that
/// boundary only.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Paise(i64);

op!(binary Paise, Add, add);
op!(binary Paise, Sub, sub);
op!(inplace Paise, SubAssign, sub_assign);
op!(unary Paise, Neg, neg);

impl Mul<i64> for Paise {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Paise {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in paise: {0}")]
pub struct PaiseConversionError(String);

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Paise {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Paise {}

impl TryFrom<u64> for Paise {
    type Error = PaiseConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PaiseConversionError(format!("Value {} is too large to convert to paise", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl FromStr for Paise {
    type Err = PaiseConversionError;

    /// Parses a decimal rupee amount ("1023", "1023.5", "1023.50") into paise.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (sign, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, trimmed),
        };
        let (whole, frac) = match unsigned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (unsigned, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(PaiseConversionError(format!("'{s}' is not a rupee amount")));
        }
        let whole = if whole.is_empty() {
            0
        } else {
            whole.parse::<i64>().map_err(|e| PaiseConversionError(format!("'{s}' is not a rupee amount. {e}")))?
        };
        let frac = match frac.len() {
            0 => 0,
            1 => {
                10 * frac.parse::<i64>().map_err(|e| PaiseConversionError(format!("'{s}' is not a rupee amount. {e}")))?
            },
            2 => frac.parse::<i64>().map_err(|e| PaiseConversionError(format!("'{s}' is not a rupee amount. {e}")))?,
            _ => return Err(PaiseConversionError(format!("'{s}' has sub-paise precision"))),
        };
        Ok(Self(sign * (whole * PAISE_PER_RUPEE + frac)))
    }
}

impl Display for Paise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let v = self.0.abs();
        write!(f, "{sign}₹{}.{:02}", v / PAISE_PER_RUPEE, v % PAISE_PER_RUPEE)
    }
}

impl Paise {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub const fn from_rupees(rupees: i64) -> Self {
        Self(rupees * PAISE_PER_RUPEE)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// The decimal rupee rendering the gateway expects, without a currency symbol.
    pub fn to_rupee_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let v = self.0.abs();
        format!("{sign}{}.{:02}", v / PAISE_PER_RUPEE, v % PAISE_PER_RUPEE)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_rupee_strings() {
        assert_eq!("1023.00".parse::<Paise>().unwrap(), Paise::new(102_300));
        assert_eq!("1023".parse::<Paise>().unwrap(), Paise::new(102_300));
        assert_eq!("1023.5".parse::<Paise>().unwrap(), Paise::new(102_350));
        assert_eq!("0.09".parse::<Paise>().unwrap(), Paise::new(9));
        assert_eq!("-12.34".parse::<Paise>().unwrap(), Paise::new(-1234));
        assert_eq!(".50".parse::<Paise>().unwrap(), Paise::new(50));
    }

    #[test]
    fn reject_malformed_rupee_strings() {
        assert!("".parse::<Paise>().is_err());
        assert!(".".parse::<Paise>().is_err());
        assert!("1023.005".parse::<Paise>().is_err());
        assert!("ten rupees".parse::<Paise>().is_err());
        assert!("10.2x".parse::<Paise>().is_err());
    }

    #[test]
    fn render_rupee_strings() {
        assert_eq!(Paise::new(102_300).to_rupee_string(), "1023.00");
        assert_eq!(Paise::new(9).to_rupee_string(), "0.09");
        assert_eq!(Paise::new(-1234).to_rupee_string(), "-12.34");
        assert_eq!(Paise::from_rupees(1000).to_string(), "₹1000.00");
        assert_eq!(Paise::new(-50).to_string(), "-₹0.50");
    }

    #[test]
    fn arithmetic() {
        let total = Paise::from_rupees(1000) + Paise::new(2300);
        assert_eq!(total, Paise::new(102_300));
        assert_eq!(total - Paise::from_rupees(1000), Paise::new(2300));
        assert_eq!([Paise::new(100), Paise::new(250)].into_iter().sum::<Paise>(), Paise::new(350));
        assert_eq!(-Paise::new(10), Paise::new(-10));
    }
}
