//! Fire-and-forget dispatch of trigger events.
//!
//! Every event gets its own tokio task that calls the sink and then holds
//! the matching indicator lit for the flash duration. The analysis cycle
//! never awaits these tasks. On shutdown in-flight tasks get a grace
//! period and are aborted after it.

use crate::actuation::{ActuationSink, IndicatorPanel};
use crate::core::TriggerEvent;
use crate::stats::SharedStats;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Dispatches commands to a sink without blocking the caller.
pub struct Actuator {
    sink: Arc<dyn ActuationSink>,
    panel: IndicatorPanel,
    stats: SharedStats,
    flash_duration: Duration,
    in_flight: Vec<JoinHandle<()>>,
}

impl Actuator {
    pub fn new(
        sink: Arc<dyn ActuationSink>,
        panel: IndicatorPanel,
        stats: SharedStats,
        flash_duration: Duration,
    ) -> Self {
        Self {
            sink,
            panel,
            stats,
            flash_duration,
            in_flight: Vec::new(),
        }
    }

    /// Spawn a task performing the event's command.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, event: &TriggerEvent) {
        self.in_flight.retain(|handle| !handle.is_finished());

        let sink = self.sink.clone();
        let panel = self.panel.clone();
        let stats = self.stats.clone();
        let flash = self.flash_duration;
        let command = event.command;

        let handle = tokio::spawn(async move {
            match sink.actuate(command) {
                Ok(()) => {
                    stats.record_actuation();
                    panel.light(command);
                    tokio::time::sleep(flash).await;
                    panel.release(command);
                }
                Err(e) => {
                    stats.record_actuation_failure();
                    tracing::warn!(%command, error = %e, "actuation failed");
                }
            }
        });
        self.in_flight.push(handle);
    }

    /// Tasks started and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn panel(&self) -> &IndicatorPanel {
        &self.panel
    }

    /// Wait up to `grace` for in-flight tasks, abort the rest, clear the panel.
    ///
    /// Returns the number of aborted tasks.
    pub async fn shutdown(self, grace: Duration) -> usize {
        let deadline = Instant::now() + grace;
        let mut aborted = 0;

        for mut handle in self.in_flight {
            if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                handle.abort();
                aborted += 1;
            }
        }

        if aborted > 0 {
            tracing::debug!(aborted, "aborted in-flight actuation tasks");
        }
        self.panel.clear_all();
        aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuation::{ChannelSink, VirtualCursor};
    use crate::core::{Band, Command};
    use crate::stats::create_shared_stats;
    use chrono::Utc;

    fn event(command: Command) -> TriggerEvent {
        TriggerEvent {
            command,
            band: Band::Gamma,
            power: 30_000.0,
            threshold: 25_000.0,
            cycle: 1,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_actuates_and_flashes() {
        let cursor = Arc::new(VirtualCursor::new((200, 200), 50));
        let stats = create_shared_stats();
        let panel = IndicatorPanel::new();
        let mut actuator = Actuator::new(
            cursor.clone(),
            panel.clone(),
            stats.clone(),
            Duration::from_millis(50),
        );

        actuator.dispatch(&event(Command::Up));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cursor.position(), Some((200, 150)));
        assert!(panel.is_lit(Command::Up));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!panel.is_lit(Command::Up));
        assert_eq!(stats.stats().actuations, 1);
        assert_eq!(actuator.shutdown(Duration::from_millis(10)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_actuation_is_counted() {
        let (sink, receiver) = ChannelSink::bounded(1);
        drop(receiver);
        let stats = create_shared_stats();
        let mut actuator = Actuator::new(
            Arc::new(sink),
            IndicatorPanel::new(),
            stats.clone(),
            Duration::from_millis(10),
        );

        actuator.dispatch(&event(Command::Down));
        actuator.shutdown(Duration::from_millis(200)).await;

        let snapshot = stats.stats();
        assert_eq!(snapshot.actuation_failures, 1);
        assert_eq!(snapshot.actuations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_long_flashes() {
        let panel = IndicatorPanel::new();
        let mut actuator = Actuator::new(
            Arc::new(VirtualCursor::new((0, 0), 1)),
            panel.clone(),
            create_shared_stats(),
            Duration::from_secs(60),
        );

        actuator.dispatch(&event(Command::Left));
        actuator.dispatch(&event(Command::Right));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(actuator.in_flight(), 2);

        let aborted = actuator.shutdown(Duration::from_millis(20)).await;
        assert_eq!(aborted, 2);
        assert!(panel.lit().is_empty());
    }
}
