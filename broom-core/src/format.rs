use chrono::{DateTime, Utc};

use crate::candidate::UNKNOWN_DURATION_THRESHOLD;

/// Format an inactivity duration for display ("unknown" for the sentinel)
pub fn format_days(days: u32) -> String {
    if days >= UNKNOWN_DURATION_THRESHOLD {
        "unknown".to_string()
    } else if days == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", days)
    }
}

/// Format a number with thousand separators (e.g., 1,234,567)
pub fn format_count(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }

    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// "1 entity" / "3 entities"
pub fn pluralize_entities(n: usize) -> String {
    if n == 1 {
        "1 entity".to_string()
    } else {
        format!("{} entities", format_count(n as u64))
    }
}

/// Backup timestamp for the header, "never" when absent
pub fn format_backup_time(when: Option<DateTime<Utc>>) -> String {
    match when {
        Some(t) => t.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => "never".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_days() {
        assert_eq!(format_days(0), "0 days");
        assert_eq!(format_days(1), "1 day");
        assert_eq!(format_days(42), "42 days");
        assert_eq!(format_days(9000), "unknown");
        assert_eq!(format_days(9999), "unknown");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize_entities(1), "1 entity");
        assert_eq!(pluralize_entities(0), "0 entities");
        assert_eq!(pluralize_entities(1200), "1,200 entities");
    }

    #[test]
    fn test_format_backup_time() {
        assert_eq!(format_backup_time(None), "never");
        let t = Utc.with_ymd_and_hms(2025, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(format_backup_time(Some(t)), "2025-03-09 07:05 UTC");
    }
}
