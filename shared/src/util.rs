use chrono::{DateTime, Months, Utc};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Add calendar months to a millisecond timestamp.
///
/// Day-of-month is clamped the way chrono does it (Jan 31 + 1 month = Feb 28/29).
/// Out-of-range inputs return the timestamp unchanged.
pub fn add_months(timestamp_ms: i64, months: u32) -> i64 {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .and_then(|dt| dt.checked_add_months(Months::new(months)))
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(timestamp_ms)
}

/// Format a millisecond timestamp as `YYYYMMDD-HHMMSS` (UTC), used in file names.
pub fn file_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%Y%m%d-%H%M%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0)
            .single()
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_add_months_crosses_year() {
        assert_eq!(add_months(ts(2024, 11, 15), 3), ts(2025, 2, 15));
    }

    #[test]
    fn test_add_months_clamps_day() {
        assert_eq!(add_months(ts(2024, 1, 31), 1), ts(2024, 2, 29));
    }

    #[test]
    fn test_file_timestamp_format() {
        assert_eq!(file_timestamp(ts(2024, 3, 5)), "20240305-120000");
    }
}
