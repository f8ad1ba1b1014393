use super::domain::ParseError;
use super::normalizer::capitalize_words;
use chrono::{Duration, NaiveDate, NaiveDateTime};

const TIMESTAMP_TOKENS: usize = 7;

/// Parses a submission time of the form `year/month/day hour:minute:second meridiem`.
///
/// Only the exact lowercase `pm` adds twelve hours; any other meridiem is read
/// as a 24-hour clock. Hours past 23 roll over into the following day.
pub fn parse_submission_time(raw: &str) -> Result<NaiveDateTime, ParseError> {
    let tokens: Vec<&str> = raw.split(['/', ':', ' ']).collect();
    if tokens.len() != TIMESTAMP_TOKENS {
        return Err(ParseError::TimestampTokens {
            value: raw.to_string(),
            tokens: tokens.len(),
        });
    }

    let invalid = || ParseError::InvalidTimestamp {
        value: raw.to_string(),
    };
    let field = |index: usize| tokens[index].parse::<u32>().map_err(|_| invalid());

    let year = i32::try_from(field(0)?).map_err(|_| invalid())?;
    let (month, day) = (field(1)?, field(2)?);
    let mut hour = i64::from(field(3)?);
    let minute = i64::from(field(4)?);
    let second = i64::from(field(5)?);
    if tokens[6] == "pm" {
        hour += 12;
    }

    let midnight = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(invalid)?;

    let offset = Duration::hours(hour) + Duration::minutes(minute) + Duration::seconds(second);
    midnight.checked_add_signed(offset).ok_or_else(invalid)
}

/// The three positional parts of a club request, `Name (Weekday) - Staff`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubDescription {
    pub name: String,
    pub weekday: String,
    pub staff: String,
}

impl ClubDescription {
    /// Returns `Ok(None)` for a blank slot.
    ///
    /// Staff is whatever follows `)`, with one leading `-` removed when present.
    /// A missing separator is accepted, so `Chess (Friday) Mr Brown` names
    /// `Mr Brown`; a missing staff segment yields an empty staff name.
    pub fn parse(raw: &str) -> Result<Option<Self>, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let invalid = || ParseError::InvalidClubDescription {
            value: trimmed.to_string(),
        };
        let (name, rest) = trimmed.split_once('(').ok_or_else(invalid)?;
        let (weekday, staff) = rest.split_once(')').ok_or_else(invalid)?;

        let name = capitalize_words(name.trim());
        let weekday = weekday.trim().to_string();
        if name.is_empty() || weekday.is_empty() {
            return Err(invalid());
        }

        let staff = staff.trim();
        let staff = staff.strip_prefix('-').unwrap_or(staff).trim().to_string();

        Ok(Some(Self {
            name,
            weekday,
            staff,
        }))
    }
}

/// The school year is the digit in the second character of the class label (`P5A` is year 5).
pub fn parse_class_year(class: &str) -> Result<u32, ParseError> {
    class
        .chars()
        .nth(1)
        .and_then(|ch| ch.to_digit(10))
        .ok_or_else(|| ParseError::InvalidClassYear {
            class: class.to_string(),
        })
}

pub fn parse_quota(raw: &str) -> Result<u32, ParseError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|quota| *quota > 0)
        .ok_or_else(|| ParseError::InvalidCount {
            value: raw.to_string(),
        })
}
