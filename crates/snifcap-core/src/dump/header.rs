use time::{Date, Month, PrimitiveDateTime, Time};

use super::Direction;
use super::error::FormatError;
use super::layout;

/// Metadata recovered from the line preceding a packet's first hex line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFields {
    pub ts_sec: u64,
    pub ts_usec: u64,
    pub interface: String,
    pub direction: Direction,
}

impl Default for HeaderFields {
    fn default() -> Self {
        Self {
            ts_sec: 0,
            ts_usec: 0,
            interface: layout::UNKNOWN_INTERFACE.to_string(),
            direction: Direction::Unknown,
        }
    }
}

/// Parse a packet header line such as
/// `[slot1] 2022-08-23 10:11:12.123456 port1 in 10.0.0.1.53 -> ...` or
/// `1.123456 port1 out ...`.
///
/// Parsing never fails as a whole: every stage that cannot be recognized
/// keeps its placeholder value and reports a [`FormatError`].
pub fn parse_header_line(line: &str) -> (HeaderFields, Vec<FormatError>) {
    let mut fields = HeaderFields::default();
    let mut issues = Vec::new();

    let (slot, after_slot) = split_slot_tag(line);
    let mut slot_used = None;
    let mut rest = line;

    if let Some((timestamp, after)) = parse_absolute_time(after_slot) {
        match timestamp {
            Ok((sec, usec)) => {
                fields.ts_sec = sec;
                fields.ts_usec = usec;
            }
            Err(err) => issues.push(err),
        }
        slot_used = slot;
        rest = after;
    } else if let Some((sec, usec, after)) = parse_relative_time(after_slot) {
        fields.ts_sec = sec;
        fields.ts_usec = usec;
        slot_used = slot;
        rest = after;
    } else {
        issues.push(FormatError::Timestamp);
    }

    let mut tokens = rest.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(interface), Some(direction)) => {
            fields.interface = interface.to_string();
            fields.direction = Direction::from_token(direction);
        }
        _ => issues.push(FormatError::Interface),
    }

    if let Some(slot) = slot_used {
        fields.interface = format!("{}/{}", slot, fields.interface);
    }

    (fields, issues)
}

/// Split an optional leading `[chassis-slot]` tag.
fn split_slot_tag(line: &str) -> (Option<&str>, &str) {
    let Some(body) = line.strip_prefix('[') else {
        return (None, line);
    };
    let Some(close) = body.find(']') else {
        return (None, line);
    };
    let after = &body[close + 1..];
    if !after.starts_with(char::is_whitespace) {
        return (None, line);
    }
    (Some(body[..close].trim()), after.trim_start())
}

type AbsoluteTime<'a> = (Result<(u64, u64), FormatError>, &'a str);

/// `YYYY-MM-DD HH:MM:SS.ffffff ` prefix, interpreted as UTC.
fn parse_absolute_time(text: &str) -> Option<AbsoluteTime<'_>> {
    let bytes = text.as_bytes();
    let shape_ok = bytes.len() > 20
        && digits_at(bytes, 0..4)
        && bytes[4] == b'-'
        && digits_at(bytes, 5..7)
        && bytes[7] == b'-'
        && digits_at(bytes, 8..10)
        && bytes[10] == b' '
        && digits_at(bytes, 11..13)
        && bytes[13] == b':'
        && digits_at(bytes, 14..16)
        && bytes[16] == b':'
        && digits_at(bytes, 17..19)
        && bytes[19] == b'.';
    if !shape_ok {
        return None;
    }
    let frac_len = bytes[20..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    let frac_end = 20 + frac_len;
    if bytes.get(frac_end) != Some(&b' ') {
        return None;
    }

    let number = |range: std::ops::Range<usize>| text[range].parse::<u32>().unwrap_or(0);
    let timestamp = to_unix(
        number(0..4) as i32,
        number(5..7) as u8,
        number(8..10) as u8,
        number(11..13) as u8,
        number(14..16) as u8,
        number(17..19) as u8,
        micros_from_fraction(&text[20..frac_end]),
    );
    Some((timestamp, &text[frac_end + 1..]))
}

fn to_unix(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    micros: u32,
) -> Result<(u64, u64), FormatError> {
    let month = Month::try_from(month).map_err(|_| FormatError::Calendar)?;
    let date = Date::from_calendar_date(year, month, day).map_err(|_| FormatError::Calendar)?;
    let time =
        Time::from_hms_micro(hour, minute, second, micros).map_err(|_| FormatError::Calendar)?;
    let unix = PrimitiveDateTime::new(date, time).assume_utc().unix_timestamp();
    let sec = u64::try_from(unix).map_err(|_| FormatError::Calendar)?;
    Ok((sec, micros as u64))
}

/// `<seconds>.<microseconds>` followed by a space or tab.
fn parse_relative_time(text: &str) -> Option<(u64, u64, &str)> {
    let (sec_text, after_dot) = text.split_once('.')?;
    if sec_text.is_empty() || !sec_text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let usec_len = after_dot
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    let rest = &after_dot[usec_len..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let sec = sec_text.parse().ok()?;
    let usec = if usec_len == 0 {
        0
    } else {
        after_dot[..usec_len].parse().ok()?
    };
    Some((sec, usec, &rest[1..]))
}

fn micros_from_fraction(fraction: &str) -> u32 {
    let mut micros = 0u32;
    for idx in 0..layout::MICROS_DIGITS {
        let digit = fraction
            .as_bytes()
            .get(idx)
            .map(|b| (b - b'0') as u32)
            .unwrap_or(0);
        micros = micros * 10 + digit;
    }
    micros
}

fn digits_at(bytes: &[u8], range: std::ops::Range<usize>) -> bool {
    bytes[range].iter().all(u8::is_ascii_digit)
}
