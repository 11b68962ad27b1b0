//! Arrow indicators that flash when a command is actuated.
//!
//! The panel is the read model for a display: it only records which arrows
//! are lit. Overlapping flashes of the same arrow keep it lit until the
//! last one ends.

use crate::core::Command;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Indicators {
    /// Active flashes per arrow, indexed by `Command::index`
    active: [AtomicU32; 4],
    /// Flashes ever started per arrow
    flashes: [AtomicU64; 4],
}

/// Cheaply clonable handle to the four arrow indicators.
#[derive(Debug, Clone, Default)]
pub struct IndicatorPanel {
    inner: Arc<Indicators>,
}

impl IndicatorPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a flash on an arrow.
    pub fn light(&self, command: Command) {
        let i = command.index();
        self.inner.active[i].fetch_add(1, Ordering::SeqCst);
        self.inner.flashes[i].fetch_add(1, Ordering::Relaxed);
    }

    /// End one flash on an arrow.
    pub fn release(&self, command: Command) {
        let _ = self.inner.active[command.index()].fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |n| n.checked_sub(1),
        );
    }

    /// Turn every arrow off (shutdown).
    pub fn clear_all(&self) {
        for active in &self.inner.active {
            active.store(0, Ordering::SeqCst);
        }
    }

    pub fn is_lit(&self, command: Command) -> bool {
        self.inner.active[command.index()].load(Ordering::SeqCst) > 0
    }

    /// Arrows currently lit.
    pub fn lit(&self) -> Vec<Command> {
        Command::ALL
            .into_iter()
            .filter(|&command| self.is_lit(command))
            .collect()
    }

    /// Flashes ever started on an arrow.
    pub fn flash_count(&self, command: Command) -> u64 {
        self.inner.flashes[command.index()].load(Ordering::Relaxed)
    }

    /// One-line rendering, lit arrows in brackets.
    pub fn render(&self) -> String {
        Command::ALL
            .into_iter()
            .map(|command| {
                if self.is_lit(command) {
                    format!("[{command}]")
                } else {
                    format!(" {} ", command.to_string().to_lowercase())
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
