use super::*;

// =============================================================================
// dates
// =============================================================================

#[test]
fn format_date_accepts_date_datetime_and_rfc3339() {
    assert_eq!(format_date("2026-03-07"), "07/03/2026");
    assert_eq!(format_date("2026-03-07T14:05:00"), "07/03/2026");
    assert_eq!(format_date("2026-03-07T14:05:00+07:00"), "07/03/2026");
}

#[test]
fn format_date_time_pads_fields() {
    assert_eq!(format_date_time("2026-03-07T09:05:00"), "07/03/2026 09:05");
    assert_eq!(format_date_time("2026-03-07"), "07/03/2026 00:00");
}

#[test]
fn format_time_accepts_clock_values() {
    assert_eq!(format_time("08:30"), "08:30");
    assert_eq!(format_time("08:30:00"), "08:30");
    assert_eq!(format_time("2026-03-07T16:45:00Z"), "16:45");
}

#[test]
fn unparseable_dates_are_returned_unchanged() {
    assert_eq!(format_date("hôm nay"), "hôm nay");
    assert_eq!(format_time("soon"), "soon");
}

// =============================================================================
// numbers and text
// =============================================================================

#[test]
fn format_currency_groups_thousands_with_dots() {
    assert_eq!(format_currency(0), "0\u{a0}₫");
    assert_eq!(format_currency(500), "500\u{a0}₫");
    assert_eq!(format_currency(1_250_000), "1.250.000\u{a0}₫");
    assert_eq!(format_currency(-30_000), "-30.000\u{a0}₫");
}

#[test]
fn format_phone_splits_ten_digit_numbers() {
    assert_eq!(format_phone("0912345678"), "0912 345 678");
    assert_eq!(format_phone("0912-345-678"), "0912 345 678");
    assert_eq!(format_phone("+84912345678"), "+84912345678");
}

#[test]
fn initials_take_first_two_words() {
    assert_eq!(initials("nguyễn văn an"), "NV");
    assert_eq!(initials("  lan  "), "L");
    assert_eq!(initials(""), "");
}

#[test]
fn truncate_respects_character_budget() {
    assert_eq!(truncate("khám tổng quát", 20), "khám tổng quát");
    assert_eq!(truncate("khám tổng quát", 10), "khám tổ...");
    assert_eq!(truncate("abcdef", 3), "...");
}

#[test]
fn truncate_below_ellipsis_width_stays_within_budget() {
    assert_eq!(truncate("abcdef", 2), "..");
    assert_eq!(truncate("abcdef", 0), "");
    assert_eq!(truncate("ab", 2), "ab");
}

#[test]
fn status_labels_translate_known_codes() {
    assert_eq!(appointment_status_label("NO_SHOW"), "Không đến");
    assert_eq!(appointment_status_label("RESCHEDULED"), "RESCHEDULED");
    assert_eq!(payment_status_label("REFUNDED"), "Đã hoàn tiền");
    assert_eq!(payment_status_label("VOID"), "VOID");
}
