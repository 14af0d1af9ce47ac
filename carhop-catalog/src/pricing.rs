/// Shortest rental the wizard accepts
pub const MIN_DURATION_HOURS: u32 = 1;

/// Longest rental the wizard accepts
pub const MAX_DURATION_HOURS: u32 = 24;

/// Price of a rental: hourly rate times duration.
///
/// Pure, so callers recompute it whenever either input changes instead of caching it.
pub fn quote(hourly_rate: i32, duration_hours: u32) -> Result<i32, PricingError> {
    if hourly_rate < 0 {
        return Err(PricingError::NegativeRate(hourly_rate));
    }
    if !(MIN_DURATION_HOURS..=MAX_DURATION_HOURS).contains(&duration_hours) {
        return Err(PricingError::DurationOutOfRange(duration_hours));
    }

    // duration is at most 24 here, the cast is lossless
    hourly_rate
        .checked_mul(duration_hours as i32)
        .ok_or(PricingError::Overflow {
            hourly_rate,
            duration_hours,
        })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("Hourly rate cannot be negative: {0}")]
    NegativeRate(i32),

    #[error("Duration must be between 1 and 24 hours, got {0}")]
    DurationOutOfRange(u32),

    #[error("Price overflow: {hourly_rate} x {duration_hours}h")]
    Overflow {
        hourly_rate: i32,
        duration_hours: u32,
    },
}
