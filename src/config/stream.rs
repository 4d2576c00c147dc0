//! Payloads published on a controller's event bus.

mod event;
mod line;
mod log;

pub use event::{EventPayload, LaunchEvent};
pub use line::{StreamLine, StreamSource};
pub use log::{LogLevel, LogMeta};
