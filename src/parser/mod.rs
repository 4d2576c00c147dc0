use std::{path::PathBuf, sync::LazyLock};

use regex::Regex;

/// Something the game announced that the controller cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameSignal {
    CrashReport(PathBuf),
}

static CRASH_REPORT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Crash report saved to: #@!@# (.+)$").ok());

/// Inspects a raw output line. The crash banner shows up both with and
/// without the usual log header.
pub fn parse_line(line: &str) -> Option<GameSignal> {
    let re = CRASH_REPORT_RE.as_ref()?;
    let caps = re.captures(line.trim_end())?;
    Some(GameSignal::CrashReport(PathBuf::from(caps[1].trim())))
}
