use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use regex::Regex;

static TIMESTAMP_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\[(\d{2}:\d{2}:\d{2})\]").ok());

/// Reads the leading `[HH:MM:SS]` of a game log line as a time today.
pub fn extract_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let re = TIMESTAMP_RE.as_ref()?;
    let caps = re.captures(input.trim_start())?;
    let time = NaiveTime::parse_from_str(&caps[1], "%H:%M:%S").ok()?;

    let today = Local::now().date_naive();
    let local_dt = Local.from_local_datetime(&today.and_time(time)).single()?;

    Some(local_dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_timestamp_without_prefix() {
        assert!(extract_timestamp("Exception in thread main").is_none());
        assert!(extract_timestamp("[Render thread/INFO]: hi").is_none());
        assert!(extract_timestamp("[25:61:99] bad").is_none());
    }

    #[test]
    fn timestamp_is_today() {
        let ts = extract_timestamp("[08:00:00] [main/INFO]: hi").unwrap();
        assert_eq!(
            ts.with_timezone(&Local).date_naive(),
            Local::now().date_naive()
        );
    }
}
