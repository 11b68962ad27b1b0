//! Actuation of trigger events.
//!
//! The OS cursor API is out of scope; sinks model the effect of a command
//! (a virtual cursor, a log line, a channel message). The dispatcher runs
//! each command in its own short-lived task so a slow sink never delays
//! ingestion or analysis.

pub mod dispatcher;
pub mod panel;
pub mod sinks;

use crate::core::Command;
use crate::error::Result;
use std::sync::Arc;

// Re-export commonly used types
pub use dispatcher::Actuator;
pub use panel::IndicatorPanel;
pub use sinks::{ChannelSink, LogSink, VirtualCursor, DEFAULT_CURSOR_STEP};

/// Receives discrete directional commands.
///
/// Implementations may be called concurrently and must not block beyond
/// issuing the command.
pub trait ActuationSink: Send + Sync {
    fn actuate(&self, command: Command) -> Result<()>;
}

impl<S: ActuationSink + ?Sized> ActuationSink for Arc<S> {
    fn actuate(&self, command: Command) -> Result<()> {
        (**self).actuate(command)
    }
}

impl<S: ActuationSink + ?Sized> ActuationSink for Box<S> {
    fn actuate(&self, command: Command) -> Result<()> {
        (**self).actuate(command)
    }
}
