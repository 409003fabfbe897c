//! Parsing and rendering of task deadlines.

use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// `datetime-local` form value without seconds.
const INPUT_MINUTES: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]T[hour]:[minute]");
/// `datetime-local` form value with seconds (browsers emit it when `step` < 60).
const INPUT_SECONDS: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const DISPLAY: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day] [hour]:[minute]");
const OFFSET: &[BorrowedFormatItem<'_>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");

/// Errors raised while decoding user supplied time values.
#[derive(Debug, Error)]
pub enum DeadlineParseError {
    /// The deadline did not match `YYYY-MM-DDTHH:MM[:SS]`.
    #[error("failed to decode time '{0}'")]
    InvalidDeadline(String),

    /// The offset did not match `±HH:MM`.
    #[error("invalid UTC offset '{0}', expected e.g. +09:00")]
    InvalidOffset(String),
}

/// Parse a form deadline interpreted in `offset`.
///
/// Empty input means "no deadline".
///
/// # Errors
/// Returns [`DeadlineParseError::InvalidDeadline`] for malformed input.
pub fn parse_deadline(
    input: &str,
    offset: UtcOffset,
) -> Result<Option<OffsetDateTime>, DeadlineParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    let local = PrimitiveDateTime::parse(input, INPUT_MINUTES)
        .or_else(|_| PrimitiveDateTime::parse(input, INPUT_SECONDS))
        .map_err(|_| DeadlineParseError::InvalidDeadline(input.to_owned()))?;
    Ok(Some(local.assume_offset(offset)))
}

/// Parse a `±HH:MM` offset. `Z` and `UTC` are accepted as aliases for UTC.
///
/// # Errors
/// Returns [`DeadlineParseError::InvalidOffset`] when the value is not an offset.
pub fn parse_offset(input: &str) -> Result<UtcOffset, DeadlineParseError> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("z") || input.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(input, OFFSET).map_err(|_| DeadlineParseError::InvalidOffset(input.to_owned()))
}

/// Render a deadline as `YYYY-MM-DD HH:MM` in the given offset.
#[must_use]
pub fn format_deadline(ts: OffsetDateTime, offset: UtcOffset) -> String {
    let local = ts.to_offset(offset);
    local.format(DISPLAY).unwrap_or_else(|_| local.to_string())
}
