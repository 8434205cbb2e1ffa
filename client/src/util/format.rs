//! Display formatting for dates, money, phone numbers and status codes.
//!
//! Inputs that cannot be parsed are returned unchanged, so a page never
//! renders an empty cell for a value the server sent in an unexpected shape.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day]/[month]/[year]");
const DATE_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day]/[month]/[year] [hour]:[minute]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");
const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const CLOCK_HM: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");
const CLOCK_HMS: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

/// Parse an RFC 3339 timestamp, a local ISO date-time or a bare date.
/// Offsets are kept as sent; no conversion to the local zone happens.
fn parse_instant(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(PrimitiveDateTime::new(at.date(), at.time()));
    }
    if let Ok(at) = PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Some(at);
    }
    Date::parse(raw, ISO_DATE).ok().map(|date| date.midnight())
}

/// Parse a bare `HH:mm` or `HH:mm:ss` clock time.
pub(crate) fn parse_clock(raw: &str) -> Option<Time> {
    let raw = raw.trim();
    Time::parse(raw, CLOCK_HM).or_else(|_| Time::parse(raw, CLOCK_HMS)).ok()
}

pub(crate) fn parse_date(raw: &str) -> Option<Date> {
    parse_instant(raw).map(PrimitiveDateTime::date)
}

fn render(value: Option<PrimitiveDateTime>, raw: &str, format: &[BorrowedFormatItem<'_>]) -> String {
    value.and_then(|v| v.format(format).ok()).unwrap_or_else(|| raw.to_owned())
}

/// `dd/MM/yyyy`.
#[must_use]
pub fn format_date(raw: &str) -> String {
    render(parse_instant(raw), raw, DATE_FORMAT)
}

/// `dd/MM/yyyy HH:mm`.
#[must_use]
pub fn format_date_time(raw: &str) -> String {
    render(parse_instant(raw), raw, DATE_TIME_FORMAT)
}

/// `HH:mm`. Also accepts a bare clock time such as an appointment slot.
#[must_use]
pub fn format_time(raw: &str) -> String {
    if let Some(clock) = parse_clock(raw) {
        return clock.format(TIME_FORMAT).unwrap_or_else(|_| raw.to_owned());
    }
    render(parse_instant(raw), raw, TIME_FORMAT)
}

/// Vietnamese dong: `1.250.000 ₫`.
#[must_use]
pub fn format_currency(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped}\u{a0}₫")
}

/// Ten-digit numbers render as `dddd ddd ddd`; anything else is returned as-is.
#[must_use]
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        format!("{} {} {}", &digits[..4], &digits[4..7], &digits[7..])
    } else {
        phone.to_owned()
    }
}

/// Avatar initials: first letter of the first two words, uppercased.
#[must_use]
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

const ELLIPSIS: &str = "...";

/// Shorten to at most `max_chars` characters, ending in `...` when cut.
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    if max_chars < ELLIPSIS.len() {
        return ELLIPSIS[..max_chars].to_owned();
    }
    let kept: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    format!("{kept}{ELLIPSIS}")
}

#[must_use]
pub fn appointment_status_label(status: &str) -> &str {
    match status {
        "PENDING" => "Chờ xác nhận",
        "CONFIRMED" => "Đã xác nhận",
        "COMPLETED" => "Đã khám",
        "CANCELLED" => "Đã hủy",
        "NO_SHOW" => "Không đến",
        other => other,
    }
}

#[must_use]
pub fn payment_status_label(status: &str) -> &str {
    match status {
        "PENDING" => "Chờ thanh toán",
        "SUCCESS" => "Đã thanh toán",
        "FAILED" => "Thất bại",
        "REFUNDED" => "Đã hoàn tiền",
        other => other,
    }
}
