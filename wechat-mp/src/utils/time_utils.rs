use chrono::{DateTime, Utc};

/// 当前unix秒
///
/// 由毫秒向下取整得到,与微信签名所需的 timestamp 保持一致。
pub fn unix_timestamp() -> i64 {
    unix_timestamp_at(Utc::now())
}

/// 指定时刻的unix秒 (向下取整)
///
/// 例: 1700000000999ms → 1700000000
pub fn unix_timestamp_at(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis().div_euclid(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unix_timestamp_floors_milliseconds() {
        let dt = Utc.timestamp_millis_opt(1_700_000_000_999).unwrap();
        assert_eq!(unix_timestamp_at(dt), 1_700_000_000);
    }

    #[test]
    fn test_unix_timestamp_on_exact_second() {
        let dt = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(unix_timestamp_at(dt), 1_700_000_000);
    }

    #[test]
    fn test_unix_timestamp_is_current() {
        let before = Utc::now().timestamp();
        let now = unix_timestamp();
        let after = Utc::now().timestamp();
        assert!(before <= now && now <= after);
    }
}
