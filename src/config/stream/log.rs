use std::fmt::{self, Display};

/// Header fields of a game log line such as
/// `[12:34:56] [Render thread/INFO]: Setting user: Steve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMeta {
    pub time: String,
    pub thread: String,
    pub level: LogLevel,
    pub msg: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Other,
}

impl LogMeta {
    /// Returns `None` for lines that do not carry the standard header
    /// (stack trace continuations, JVM chatter).
    pub fn new<S: AsRef<str>>(line: S) -> Option<Self> {
        let line = line.as_ref().trim();

        if !line.starts_with('[') {
            return None;
        }

        let time_end = line.find(']')?;
        let time = line[1..time_end].to_string();

        let meta_start = time_end + 1 + line[time_end + 1..].find('[')?;
        let msg_sep = meta_start + line[meta_start..].find("]: ")?;

        let meta = &line[(meta_start + 1)..msg_sep];
        let msg = line[(msg_sep + 3)..].to_string();

        let (thread, level_str) = meta.rsplit_once('/')?;

        let level = match level_str {
            "INFO" => LogLevel::Info,
            "WARN" => LogLevel::Warn,
            "ERROR" | "FATAL" => LogLevel::Error,
            _ => LogLevel::Other,
        };

        Some(LogMeta {
            time,
            thread: thread.to_string(),
            level,
            msg,
        })
    }
}

impl Display for LogMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Time: {}\nThread: {}\nLevel: {}\nMessage: {}",
            self.time, self.thread, self.level, self.msg
        )
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Other => write!(f, "OTHER"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_client_log_header() {
        let meta = LogMeta::new("[09:15:02] [Render thread/WARN]: Missing sound for event").unwrap();
        assert_eq!(meta.time, "09:15:02");
        assert_eq!(meta.thread, "Render thread");
        assert_eq!(meta.level, LogLevel::Warn);
        assert_eq!(meta.msg, "Missing sound for event");
    }

    #[test]
    fn thread_names_may_contain_slashes() {
        let meta = LogMeta::new("[09:15:02] [Worker-Main/1/ERROR]: boom").unwrap();
        assert_eq!(meta.thread, "Worker-Main/1");
        assert_eq!(meta.level, LogLevel::Error);
    }

    #[test]
    fn ignores_lines_without_header() {
        assert!(LogMeta::new("\tat net.minecraft.client.Main.main(Main.java:1)").is_none());
        assert!(LogMeta::new("[09:15:02] no thread block").is_none());
    }
}
