//! Built-in actuation sinks.

use crate::actuation::ActuationSink;
use crate::core::Command;
use crate::error::{PipelineError, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::Mutex;

/// Pixels the cursor moves per command.
pub const DEFAULT_CURSOR_STEP: i64 = 50;

/// A cursor that moves a fixed step per command.
///
/// Tracks position in screen coordinates (y grows downwards). When bounds
/// are set the position is clamped to the screen.
#[derive(Debug)]
pub struct VirtualCursor {
    position: Mutex<(i64, i64)>,
    step: i64,
    bounds: Option<(i64, i64)>,
}

impl VirtualCursor {
    pub fn new(start: (i64, i64), step: i64) -> Self {
        Self {
            position: Mutex::new(start),
            step,
            bounds: None,
        }
    }

    /// Clamp to a `width` x `height` screen.
    pub fn with_bounds(mut self, width: i64, height: i64) -> Self {
        self.bounds = Some((width, height));
        self
    }

    /// Current position, `None` if a writer panicked mid-update.
    pub fn position(&self) -> Option<(i64, i64)> {
        self.position.lock().ok().map(|p| *p)
    }

    pub fn step(&self) -> i64 {
        self.step
    }
}

impl ActuationSink for VirtualCursor {
    fn actuate(&self, command: Command) -> Result<()> {
        let mut position = self
            .position
            .lock()
            .map_err(|_| PipelineError::ActuationFailure {
                command,
                reason: "cursor state poisoned".to_string(),
            })?;

        let (dx, dy) = command.direction();
        let mut x = position.0.saturating_add(dx.saturating_mul(self.step));
        let mut y = position.1.saturating_add(dy.saturating_mul(self.step));
        if let Some((width, height)) = self.bounds {
            x = x.clamp(0, width.saturating_sub(1).max(0));
            y = y.clamp(0, height.saturating_sub(1).max(0));
        }
        *position = (x, y);

        tracing::debug!(%command, x, y, "cursor moved");
        Ok(())
    }
}

/// Logs every command and does nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ActuationSink for LogSink {
    fn actuate(&self, command: Command) -> Result<()> {
        tracing::info!(%command, "actuation command");
        Ok(())
    }
}

/// Forwards commands over a bounded channel to another thread.
///
/// Never blocks: a full or disconnected channel is reported as an
/// actuation failure.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<Command>,
}

impl ChannelSink {
    pub fn new(sender: Sender<Command>) -> Self {
        Self { sender }
    }

    /// Sink plus the receiving end of a channel holding `capacity` commands.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Command>) {
        let (sender, receiver) = bounded(capacity);
        (Self::new(sender), receiver)
    }
}

impl ActuationSink for ChannelSink {
    fn actuate(&self, command: Command) -> Result<()> {
        self.sender.try_send(command).map_err(|e| {
            let reason = match e {
                TrySendError::Full(_) => "command queue full",
                TrySendError::Disconnected(_) => "command receiver dropped",
            };
            PipelineError::ActuationFailure {
                command,
                reason: reason.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_moves_one_step_per_command() {
        let cursor = VirtualCursor::new((200, 200), DEFAULT_CURSOR_STEP);

        cursor.actuate(Command::Up).unwrap();
        assert_eq!(cursor.position(), Some((200, 150)));
        cursor.actuate(Command::Down).unwrap();
        cursor.actuate(Command::Down).unwrap();
        assert_eq!(cursor.position(), Some((200, 250)));
        cursor.actuate(Command::Left).unwrap();
        assert_eq!(cursor.position(), Some((150, 250)));
        cursor.actuate(Command::Right).unwrap();
        assert_eq!(cursor.position(), Some((200, 250)));
    }

    #[test]
    fn test_cursor_clamps_to_bounds() {
        let cursor = VirtualCursor::new((10, 10), 50).with_bounds(100, 100);
        cursor.actuate(Command::Up).unwrap();
        cursor.actuate(Command::Left).unwrap();
        assert_eq!(cursor.position(), Some((0, 0)));

        for _ in 0..5 {
            cursor.actuate(Command::Right).unwrap();
        }
        assert_eq!(cursor.position(), Some((99, 0)));
    }

    #[test]
    fn test_cursor_saturates_at_extremes() {
        let cursor = VirtualCursor::new((i64::MAX - 10, i64::MIN + 10), i64::MAX);
        cursor.actuate(Command::Right).unwrap();
        cursor.actuate(Command::Up).unwrap();
        assert_eq!(cursor.position(), Some((i64::MAX, i64::MIN)));

        cursor.actuate(Command::Left).unwrap();
        assert_eq!(cursor.position(), Some((0, i64::MIN)));
    }

    #[test]
    fn test_channel_sink_reports_full_queue() {
        let (sink, receiver) = ChannelSink::bounded(1);
        sink.actuate(Command::Up).unwrap();

        let err = sink.actuate(Command::Down).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ActuationFailure {
                command: Command::Down,
                reason: "command queue full".to_string()
            }
        );
        assert_eq!(receiver.try_recv().unwrap(), Command::Up);
    }

    #[test]
    fn test_channel_sink_reports_disconnect() {
        let (sink, receiver) = ChannelSink::bounded(4);
        drop(receiver);
        assert!(sink.actuate(Command::Left).is_err());
    }

    #[test]
    fn test_log_sink_accepts_everything() {
        for command in Command::ALL {
            assert!(LogSink.actuate(command).is_ok());
        }
    }
}
