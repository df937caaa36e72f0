use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

/// Formats a timestamp relative to the current local date.
///
/// Returns `"today, HH:MM"`, `"yesterday, HH:MM"` or `"<N> days ago"`, and an
/// empty string when the timestamp cannot be parsed.
pub fn format_relative_date(timestamp: &str) -> String {
    format_relative_date_at(timestamp, Local::now())
}

/// Same as [`format_relative_date`] with an explicit "now".
///
/// Only calendar dates are compared: 23:59 yesterday and 00:01 today are one
/// day apart. Future dates produce a negative day count.
pub fn format_relative_date_at(timestamp: &str, now: DateTime<Local>) -> String {
    let Some(input) = parse_timestamp(timestamp) else {
        return String::new();
    };

    let diff_days = (now.date_naive() - input.date_naive()).num_days();
    let clock = input.format("%H:%M");

    match diff_days {
        0 => format!("today, {clock}"),
        1 => format!("yesterday, {clock}"),
        n => format!("{n} days ago"),
    }
}

fn parse_timestamp(timestamp: &str) -> Option<DateTime<Local>> {
    let timestamp = timestamp.trim();
    if timestamp.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(parsed.with_timezone(&Local));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d, %H:%M",
    ];
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(timestamp, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(timestamp, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    // Ambiguous local times (DST fold) resolve to the earlier instant.
    Local.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .earliest()
            .unwrap()
    }

    fn naive_string(dt: DateTime<Local>) -> String {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    #[test]
    fn same_calendar_day_is_today() {
        let now = local(2024, 5, 10, 18, 30);
        let input = local(2024, 5, 10, 0, 5);
        assert_eq!(
            format_relative_date_at(&naive_string(input), now),
            "today, 00:05"
        );
    }

    #[test]
    fn previous_calendar_day_is_yesterday_even_when_close_in_time() {
        let now = local(2024, 5, 10, 0, 10);
        let input = local(2024, 5, 9, 23, 50);
        assert_eq!(
            format_relative_date_at(&naive_string(input), now),
            "yesterday, 23:50"
        );
    }

    #[test]
    fn older_dates_count_days() {
        let now = local(2024, 5, 10, 9, 0);
        let input = local(2024, 5, 3, 21, 0);
        assert_eq!(
            format_relative_date_at(&naive_string(input), now),
            "7 days ago"
        );
    }

    #[test]
    fn future_dates_are_negative() {
        let now = local(2024, 5, 10, 9, 0);
        let input = local(2024, 5, 13, 9, 0);
        assert_eq!(
            format_relative_date_at(&naive_string(input), now),
            "-3 days ago"
        );
    }

    #[test]
    fn rfc3339_input_is_converted_to_local_time() {
        let now = Local::now();
        let input = now - Duration::minutes(1);
        let label = format_relative_date_at(&input.to_rfc3339(), now);
        assert!(
            label.starts_with("today, ") || label.starts_with("yesterday, "),
            "unexpected label {label}"
        );
    }

    #[test]
    fn server_date_format_and_bare_dates() {
        let now = local(2024, 5, 10, 9, 0);
        assert_eq!(
            format_relative_date_at("2024-05-10 08:15:00", now),
            "today, 08:15"
        );
        assert_eq!(format_relative_date_at("2024-05-09", now), "yesterday, 00:00");
    }

    #[test]
    fn invalid_input_is_empty() {
        let now = Local::now();
        assert_eq!(format_relative_date_at("not a date", now), "");
        assert_eq!(format_relative_date_at("", now), "");
        assert_eq!(format_relative_date("2024-13-45T99:00:00"), "");
    }

    #[test]
    fn now_is_today() {
        let now = Local::now();
        assert!(format_relative_date(&now.to_rfc3339()).starts_with("today, "));
    }
}
