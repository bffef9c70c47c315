//! Clock text for display and input.

use crate::error::ValidationError;

/// Largest minutes value accepted by [`parse_clock`].
pub const MAX_MINUTES: u64 = 99;

/// Longest duration [`parse_clock`] accepts, `99:59`.
pub const MAX_SECS: u64 = MAX_MINUTES * 60 + 59;

/// Render seconds as zero-padded `MM:SS`. Minutes are not capped.
pub fn format_clock(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Parse `MM:SS` or a bare seconds count into seconds.
///
/// Minutes must be below 100 and seconds below 60 when a colon is used.
/// Bare seconds are capped at [`MAX_SECS`].
/// A zero result is rejected: a phase needs some duration.
pub fn parse_clock(input: &str) -> Result<u64, ValidationError> {
    let invalid = |message: &str| ValidationError::InvalidClock {
        input: input.to_string(),
        message: message.to_string(),
    };
    let text = input.trim();

    let total = match text.split_once(':') {
        Some((min, sec)) => {
            let minutes: u64 = min
                .trim()
                .parse()
                .map_err(|_| invalid("minutes are not a number"))?;
            let seconds: u64 = sec
                .trim()
                .parse()
                .map_err(|_| invalid("seconds are not a number"))?;
            if minutes > MAX_MINUTES {
                return Err(invalid("minutes must be below 100"));
            }
            if seconds >= 60 {
                return Err(invalid("seconds must be below 60"));
            }
            minutes * 60 + seconds
        }
        None => text
            .parse()
            .map_err(|_| invalid("expected MM:SS or a number of seconds"))?,
    };

    if total == 0 {
        return Err(invalid("duration must be greater than zero"));
    }
    if total > MAX_SECS {
        return Err(invalid("duration must not exceed 99:59"));
    }
    Ok(total)
}
