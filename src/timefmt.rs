use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};

const DATETIME_FORMATS: &[&[FormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]/[month]/[day] [hour]:[minute]:[second]"),
    format_description!("[year]/[month]/[day] [hour]:[minute]"),
];

const DATE_FORMATS: &[&[FormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]"),
    format_description!("[year]/[month]/[day]"),
];

const EPOCH_MIN_DIGITS: usize = 10;

const ABSOLUTE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Parses the timestamp encodings the capture flow has been seen to write.
///
/// Naive date-times are read as UTC. Runs of ten or more digits are epoch
/// milliseconds; shorter numbers such as a bare year are not timestamps.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt);
    }
    if raw.len() >= EPOCH_MIN_DIGITS && raw.bytes().all(|b| b.is_ascii_digit()) {
        let millis = raw.parse::<i64>().ok()?;
        return OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok();
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = PrimitiveDateTime::parse(raw, format) {
            return Some(dt.assume_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = Date::parse(raw, format) {
            return Some(date.with_time(Time::MIDNIGHT).assume_utc());
        }
    }
    None
}

pub fn format_absolute(dt: OffsetDateTime) -> String {
    dt.format(ABSOLUTE_FORMAT)
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

/// Relative label for recent timestamps, absolute minute precision otherwise.
/// Unparseable input is returned verbatim.
pub fn format_display(raw: &str, now: OffsetDateTime) -> String {
    let Some(dt) = parse_timestamp(raw) else {
        return raw.to_string();
    };
    let diff = now - dt;
    if diff.is_negative() || diff < Duration::minutes(1) {
        return "just now".to_string();
    }
    if diff < Duration::hours(1) {
        return format!("{} min ago", diff.whole_minutes());
    }
    if diff < Duration::days(1) {
        return format!("{} h ago", diff.whole_hours());
    }
    if diff < Duration::days(7) {
        return format!("{} d ago", diff.whole_days());
    }
    format_absolute(dt)
}

/// Same as [`format_display`] without the relative labels.
pub fn format_display_absolute(raw: &str) -> String {
    parse_timestamp(raw)
        .map(format_absolute)
        .unwrap_or_else(|| raw.to_string())
}

/// Timestamp written into `collectTime`.
pub fn now_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| (now.unix_timestamp() * 1000).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_supported_encodings() {
        let expected = datetime!(2024-03-05 14:30:00 UTC);
        assert_eq!(parse_timestamp("2024-03-05T14:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 14:30"), Some(expected));
        assert_eq!(parse_timestamp("2024/03/05 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("1709649000000"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-05"),
            Some(datetime!(2024-03-05 00:00:00 UTC))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("  "), None);
    }

    #[test]
    fn short_digit_runs_are_not_epoch_millis() {
        assert_eq!(parse_timestamp("2024"), None);
        assert_eq!(parse_timestamp("42"), None);
        assert_eq!(parse_timestamp("-1712345678901"), None);
        assert_eq!(format_display_absolute("2024"), "2024");
        let epoch = parse_timestamp("1712345678901").map(|dt| dt.unix_timestamp());
        assert_eq!(epoch, Some(1_712_345_678));
    }

    #[test]
    fn display_uses_relative_labels_for_recent_times() {
        let now = datetime!(2024-03-10 12:00:00 UTC);
        assert_eq!(format_display("2024-03-10T11:59:30Z", now), "just now");
        assert_eq!(format_display("2024-03-10T12:05:00Z", now), "just now");
        assert_eq!(format_display("2024-03-10T11:15:00Z", now), "45 min ago");
        assert_eq!(format_display("2024-03-10T02:00:00Z", now), "10 h ago");
        assert_eq!(format_display("2024-03-07T12:00:00Z", now), "3 d ago");
        assert_eq!(format_display("2024-02-01T08:09:00Z", now), "2024-02-01 08:09");
        assert_eq!(format_display("not a date", now), "not a date");
    }

    #[test]
    fn now_timestamp_round_trips_through_parser() {
        assert!(parse_timestamp(&now_timestamp()).is_some());
    }
}
