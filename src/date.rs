//! Date values at different granularities.
//!
//! Hessian2 dates are milliseconds since the Unix epoch. Each unit type here wraps a
//! signed count since the epoch; encoding multiplies up to milliseconds and decoding
//! divides down with truncation toward zero.

use crate::*;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

macro_rules! date_unit {
    ($($(#[$doc:meta])* $name:ident = $millis:expr;)+) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name(pub i64);

            impl $name {
                pub const MILLIS: i64 = $millis;

                pub fn from_millis(millis: i64) -> Self {
                    $name(millis / Self::MILLIS)
                }

                /// `None` if the value does not fit in `i64` milliseconds.
                pub fn to_millis(self) -> Option<i64> {
                    self.0.checked_mul(Self::MILLIS)
                }
            }

            impl ToHessian for $name {
                fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
                    let millis = self.to_millis().ok_or_else(|| {
                        Error::Encode(format!("{:?} overflows i64 milliseconds", self))
                    })?;
                    encoder.write_date_millis(millis);
                    Ok(())
                }
            }

            impl FromHessian for $name {
                fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
                    Ok($name::from_millis(decoder.read_date_millis()?))
                }
            }
        )+
    };
}

date_unit! {
    Millis = 1;
    Seconds = 1_000;
    Minutes = 60_000;
    Hours = 3_600_000;
    Days = 86_400_000;
    Weeks = 604_800_000;
    /// Average Gregorian month, 30.436875 days.
    Months = 2_629_746_000;
    /// Average Gregorian year, 365.2425 days.
    Years = 31_556_952_000;
}

/// Times before the epoch are written as negative milliseconds.
impl ToHessian for SystemTime {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        let millis = match self.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_millis()),
            Err(e) => i64::try_from(e.duration().as_millis()).map(|m| -m),
        }
        .map_err(|_| Error::Encode(format!("{:?} overflows i64 milliseconds", self)))?;
        encoder.write_date_millis(millis);
        Ok(())
    }
}

impl FromHessian for SystemTime {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        let millis = decoder.read_date_millis()?;
        let offset = Duration::from_millis(millis.unsigned_abs());
        let time = if millis >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        };
        time.ok_or_else(|| Error::Decode(format!("date {} ms is out of range", millis)))
    }
}
