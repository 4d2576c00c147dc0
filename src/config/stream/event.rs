use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::instance::LaunchStatus;

use super::line::StreamLine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EventPayload {
    StateChange {
        old: LaunchStatus,
        new: LaunchStatus,
    },

    StdLine {
        line: StreamLine,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchEvent {
    pub id: Uuid,

    /// Attempt the event belongs to, if one exists.
    pub attempt: Option<Uuid>,

    pub timestamp: DateTime<Utc>,

    pub payload: EventPayload,
}

impl LaunchEvent {
    pub fn state_change(attempt: Option<Uuid>, old: LaunchStatus, new: LaunchStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            attempt,
            timestamp: Utc::now(),
            payload: EventPayload::StateChange { old, new },
        }
    }

    /// Timestamped from the game's own `[HH:MM:SS]` prefix when present.
    pub fn line(attempt: Uuid, line: StreamLine) -> Self {
        let timestamp = line.extract_timestamp().unwrap_or_else(Utc::now);
        Self {
            id: Uuid::new_v4(),
            attempt: Some(attempt),
            timestamp,
            payload: EventPayload::StdLine { line },
        }
    }
}

impl Display for LaunchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.timestamp.format("%H:%M:%S"))?;
        match &self.payload {
            EventPayload::StdLine { line } => write!(f, "{:?}: {}", line.source, line),
            EventPayload::StateChange { old, new } => {
                write!(f, "State changed: {old} -> {new}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn line_event_uses_game_timestamp() {
        let attempt = Uuid::new_v4();
        let event = LaunchEvent::line(
            attempt,
            StreamLine::stdout("[12:34:56] [Render thread/INFO]: Backend library: LWJGL"),
        );
        assert_eq!(event.attempt, Some(attempt));
        let local = event.timestamp.with_timezone(&chrono::Local);
        assert_eq!((local.hour(), local.minute(), local.second()), (12, 34, 56));
    }

    #[test]
    fn state_change_display() {
        let event = LaunchEvent::state_change(None, LaunchStatus::Idle, LaunchStatus::Launching);
        assert!(event.to_string().ends_with("State changed: Idle -> Launching"));
    }
}
