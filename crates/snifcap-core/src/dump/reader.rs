use std::borrow::Cow;

use super::Dialect;
use super::layout;

/// Split an over-long trailing token so only its last 16 characters remain
/// as the ASCII column.
///
/// Some dumps glue the ASCII rendering directly to the last hex group
/// (`...0800 4500.PV.{6........E.`), which would otherwise hide the final
/// hex bytes.
///
/// # Examples
/// ```
/// use snifcap_core::dump::reader::normalize_packet_line;
///
/// let line = "0x0000 0050 5694 4500.PV.{6........E.";
/// assert_eq!(normalize_packet_line(line), "0x0000 0050 5694 4500 .PV.{6........E.");
/// ```
pub fn normalize_packet_line(line: &str) -> Cow<'_, str> {
    let Some(last) = line.split_whitespace().next_back() else {
        return Cow::Borrowed(line);
    };
    let chars = last.chars().count();
    if chars <= layout::ASCII_COLUMN_WIDTH {
        return Cow::Borrowed(line);
    }
    let Some(token_start) = line.rfind(last) else {
        return Cow::Borrowed(line);
    };
    let split = last
        .char_indices()
        .nth(chars - layout::ASCII_COLUMN_WIDTH)
        .map(|(idx, _)| token_start + idx)
        .unwrap_or(line.len());
    Cow::Owned(format!("{} {}", &line[..split], &line[split..]))
}

/// Classify a trimmed line and split it into `(offset digits, remainder)`.
///
/// Returns `None` for anything that is not a packet-data line in the given
/// dialect. The remainder starts after the offset separators.
pub fn split_packet_line(line: &str, dialect: Dialect) -> Option<(&str, &str)> {
    match dialect {
        Dialect::Strict => split_strict(line),
        Dialect::Compatible => split_prefixed(line).or_else(|| split_bare(line)),
    }
}

fn split_strict(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_prefix(layout::OFFSET_PREFIX)?;
    let digits = body.get(..layout::STRICT_OFFSET_DIGITS)?;
    if !digits.chars().all(is_hex_digit) {
        return None;
    }
    let after = &body[layout::STRICT_OFFSET_DIGITS..];
    if !after.starts_with([' ', '\t']) {
        return None;
    }
    Some((digits, skip_separators(after)))
}

fn split_prefixed(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_prefix(layout::OFFSET_PREFIX)?;
    let digits_len = body.find(|c: char| !is_hex_digit(c)).unwrap_or(body.len());
    let after = &body[digits_len..];
    if !after.starts_with(layout::OFFSET_SEPARATORS) {
        return None;
    }
    Some((&body[..digits_len], skip_separators(after)))
}

fn split_bare(line: &str) -> Option<(&str, &str)> {
    let digits_len = line.find(|c: char| !is_hex_digit(c))?;
    if digits_len == 0 || !line[digits_len..].starts_with('\t') {
        return None;
    }
    Some((&line[..digits_len], skip_separators(&line[digits_len..])))
}

fn skip_separators(text: &str) -> &str {
    text.trim_start_matches(layout::OFFSET_SEPARATORS)
}

/// Locate the hex payload at the start of `rest`, excluding the ASCII column.
///
/// The payload is the leading run of hex digits and spaces. A double space
/// always ends the hex column, even when the ASCII rendering that follows
/// starts with hex letters. Without one, a tab after the run or the end of
/// the line closes the column directly; otherwise the ASCII rendering begins
/// after the run's last space.
pub fn locate_payload(rest: &str) -> &str {
    let run_len = rest
        .find(|c: char| !is_payload_char(c))
        .unwrap_or(rest.len());
    let run = &rest[..run_len];
    if let Some(idx) = run.find("  ") {
        return &run[..idx];
    }
    if run_len == rest.len() || rest[run_len..].starts_with('\t') {
        return run;
    }
    match run.rfind(' ') {
        Some(idx) => &run[..idx],
        None => "",
    }
}

/// Parse the `<N> packets received by filter` trailer some sniffers print.
pub fn parse_filter_summary(line: &str) -> Option<u64> {
    let idx = line.find(layout::FILTER_SUMMARY_SUFFIX)?;
    line[..idx].split_whitespace().next_back()?.parse().ok()
}

fn is_hex_digit(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='f')
}

fn is_payload_char(c: char) -> bool {
    is_hex_digit(c) || c == ' '
}
