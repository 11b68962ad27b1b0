//! Integration tests for the spawned pipeline runtime

use eeg_cursor_agent::acquisition::{
    write_recording, ManualFeed, ReplayFeed, SyntheticConfig, SyntheticFeed, Tone,
};
use eeg_cursor_agent::actuation::{ChannelSink, LogSink, VirtualCursor};
use eeg_cursor_agent::core::{BandPowers, Command, RetriggerConfig};
use eeg_cursor_agent::pipeline::{
    analyze_recording, analyze_recording_with, AnalysisReport, Pipeline, PipelineHandle,
};
use eeg_cursor_agent::Config;
use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;

// The runtime tests run on a paused clock: tokio advances time whenever
// every task is idle, so interval ticks land at exact virtual instants.

/// 1 kHz with a 64-sample window: bins fall on multiples of 15.625 Hz.
fn fast_config() -> Config {
    Config {
        sampling_rate_hz: 1000.0,
        buffer_capacity: 64,
        min_window: 64,
        ingest_interval: Duration::from_millis(10),
        analysis_interval: Duration::from_millis(50),
        flash_duration: Duration::from_millis(20),
        shutdown_grace: Duration::from_millis(100),
        ..Config::default()
    }
}

/// 31.25 Hz lands exactly on a Beta bin, so every window has the same power.
fn beta_feed(config: &Config) -> SyntheticFeed {
    SyntheticFeed::new(
        SyntheticConfig::new(config.sampling_rate_hz, 1, config.ingest_interval)
            .with_tone(Tone::new(31.25, 2000.0)),
    )
    .expect("Failed to create feed")
}

fn beta_rows(count: usize) -> Vec<Vec<f64>> {
    (0..count)
        .map(|i| vec![2000.0 * (2.0 * PI * 31.25 * i as f64 / 1000.0).sin()])
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_beta_tone_moves_cursor_down() {
    let config = fast_config();
    let (sink, receiver) = ChannelSink::bounded(64);

    let handle = Pipeline::new(&config)
        .expect("Failed to create pipeline")
        .spawn(beta_feed(&config), Arc::new(sink));

    // Window fills at 70ms, the cycle at 150ms crosses the Beta threshold
    let mut received = None;
    for _ in 0..100 {
        if let Ok(command) = receiver.try_recv() {
            received = Some(command);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(received, Some(Command::Down));

    let report = handle.shutdown().await;
    assert!(report.cycles >= 2);
    assert!(report.trigger_count() >= 1);
    assert_eq!(report.command_count(Command::Down) as usize, report.trigger_count());
    assert!(report.stats.samples_ingested >= 64);
    assert!(report.stats.actuations >= 1);
    assert_eq!(report.stats.actuation_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_silence_never_triggers() {
    let config = fast_config();
    let feed = SyntheticFeed::new(SyntheticConfig::new(
        config.sampling_rate_hz,
        1,
        config.ingest_interval,
    ))
    .expect("Failed to create feed");
    let cursor = Arc::new(VirtualCursor::new((100, 100), 50));

    let handle = Pipeline::new(&config)
        .expect("Failed to create pipeline")
        .spawn(feed, cursor.clone());
    tokio::time::sleep(Duration::from_millis(300)).await;

    let view = handle.view();
    assert_eq!(view.smoothed(), BandPowers::zero());
    assert!(view.latest_report().is_some());

    let report = handle.shutdown().await;
    assert!(report.cycles > 0);
    assert_eq!(report.trigger_count(), 0);
    assert_eq!(cursor.position(), Some((100, 100)));
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_feed_skips_cycles() {
    let config = fast_config();
    let mut feed = ManualFeed::new(1, config.sampling_rate_hz);
    feed.set_available(false);

    let handle = Pipeline::new(&config)
        .expect("Failed to create pipeline")
        .spawn(feed, Arc::new(LogSink));
    tokio::time::sleep(Duration::from_millis(200)).await;

    let view = handle.view();
    let raw = view.raw_samples(0).await.expect("channel 0 exists");
    assert!(raw.is_empty());
    assert!(view.latest_report().is_none());

    let report = handle.shutdown().await;
    assert_eq!(report.cycles, 0);
    assert_eq!(report.stats.samples_ingested, 0);
    assert!(report.stats.ingest_cycles_skipped > 0);
    assert!(report.stats.analysis_cycles_skipped > 0);
}

#[tokio::test(start_paused = true)]
async fn test_view_reads_buffer_and_reports() {
    let config = fast_config();
    let handle = Pipeline::new(&config)
        .expect("Failed to create pipeline")
        .spawn(beta_feed(&config), Arc::new(LogSink));

    let mut view = handle.view();
    let report = tokio::time::timeout(Duration::from_secs(2), view.next_report())
        .await
        .expect("no analysis cycle within 2s")
        .expect("pipeline stopped");
    assert_eq!(report.cycle, 1);
    assert_eq!(report.window_len, 64);

    let raw = view.raw_samples(0).await.expect("channel 0 exists");
    assert_eq!(raw.len(), 64);
    assert!(view.raw_samples(3).await.is_err());
    assert!(view.stats().analysis_cycles >= 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cuts_long_flashes() {
    let config = Config {
        flash_duration: Duration::from_secs(60),
        shutdown_grace: Duration::from_millis(50),
        ..fast_config()
    };
    let handle = Pipeline::new(&config)
        .expect("Failed to create pipeline")
        .spawn(beta_feed(&config), Arc::new(LogSink));

    let view = handle.view();
    let mut lit = false;
    for _ in 0..100 {
        if view.is_lit(Command::Down) {
            lit = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(lit);

    let report = tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
        .await
        .expect("shutdown should not wait for the flash");
    assert!(report.trigger_count() >= 1);
    assert!(view.panel().lit().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_replay_runs_until_exhausted() {
    let config = fast_config();
    let path = std::env::temp_dir().join(format!("eeg-replay-{}.jsonl", std::process::id()));
    write_recording(&path, &beta_rows(200)).expect("Failed to write recording");

    let feed = ReplayFeed::from_path(&path, config.sampling_rate_hz, 10)
        .expect("Failed to load recording");
    let handle = Pipeline::new(&config)
        .expect("Failed to create pipeline")
        .spawn(feed, Arc::new(LogSink));

    // 200 samples at 10 per tick are delivered by the tick at 190ms
    tokio::time::sleep(Duration::from_millis(500)).await;
    let report = handle.shutdown().await;

    assert_eq!(report.stats.samples_ingested, 200);
    // Ticks from 200ms on find the recording exhausted
    assert!(report.stats.ingest_cycles_skipped >= 30);
    // Cycles from 100ms to 450ms all see a full window
    assert!(report.cycles >= 8);

    let _ = std::fs::remove_file(&path);
}

async fn collect_reports(handle: &PipelineHandle, count: usize) -> Vec<AnalysisReport> {
    let mut view = handle.view();
    let mut reports = Vec::with_capacity(count);
    while reports.len() < count {
        let report = tokio::time::timeout(Duration::from_secs(2), view.next_report())
            .await
            .expect("no analysis cycle within 2s")
            .expect("pipeline stopped");
        reports.push(report);
    }
    reports
}

#[tokio::test(start_paused = true)]
async fn test_failing_sink_does_not_disturb_analysis() {
    let config = fast_config();
    let (sink, receiver) = ChannelSink::bounded(8);
    drop(receiver);

    let failing = Pipeline::new(&config)
        .expect("Failed to create pipeline")
        .spawn(beta_feed(&config), Arc::new(sink));
    let healthy = Pipeline::new(&config)
        .expect("Failed to create pipeline")
        .spawn(beta_feed(&config), Arc::new(LogSink));

    let (failing_reports, healthy_reports) =
        tokio::join!(collect_reports(&failing, 6), collect_reports(&healthy, 6));

    // Cycles keep completing after the sink starts failing at cycle 2
    let cycles: Vec<u64> = failing_reports.iter().map(|r| r.cycle).collect();
    assert!(cycles.windows(2).all(|w| w[0] < w[1]));
    assert!(*cycles.last().unwrap() >= 6);
    assert!(failing_reports.iter().any(|r| !r.events.is_empty()));

    // Smoothed state matches a run whose sink never fails
    let mut compared = 0;
    for report in &failing_reports {
        let expected = report.raw.beta * (1.0 - 0.8_f64.powi(report.cycle as i32));
        assert!((report.smoothed.beta - expected).abs() <= 1e-6 * expected);

        if let Some(reference) = healthy_reports.iter().find(|r| r.cycle == report.cycle) {
            assert!(
                (report.smoothed.beta - reference.smoothed.beta).abs()
                    <= 1e-6 * reference.smoothed.beta
            );
            compared += 1;
        }
    }
    assert!(compared >= 4);

    let failing = failing.shutdown().await;
    let healthy = healthy.shutdown().await;

    assert!(failing.stats.actuation_failures > 0);
    assert_eq!(failing.stats.actuations, 0);
    assert_eq!(failing.stats.actuation_failures, failing.stats.triggers_fired);
    assert_eq!(healthy.stats.actuation_failures, 0);
    assert!(failing.cycles >= 6);
}

#[test]
fn test_offline_cooldown_limits_repeats() {
    let rows = beta_rows(2000);

    // 50 rows per cycle: the first cycle is short, 39 complete
    let mut first_events = None;
    let every = analyze_recording_with(&rows, &fast_config(), |r| {
        first_events.get_or_insert(r.events.len());
    })
    .expect("analysis failed");
    assert_eq!(every.cycles, 39);
    assert_eq!(every.trigger_count(), 38);
    assert_eq!(first_events, Some(0));

    let config = Config {
        retrigger: RetriggerConfig {
            cooldown_cycles: 2,
            hysteresis: None,
        },
        ..fast_config()
    };
    let mut cycles: Vec<u64> = Vec::new();
    let limited = analyze_recording_with(&rows, &config, |r| {
        if !r.events.is_empty() {
            cycles.push(r.cycle);
        }
    })
    .expect("analysis failed");
    assert_eq!(limited.trigger_count(), 13);
    assert_eq!(cycles.len(), 13);
    assert_eq!(&cycles[..3], &[2, 5, 8]);
}

#[test]
fn test_offline_hysteresis_fires_once_while_active() {
    let config = Config {
        retrigger: RetriggerConfig {
            cooldown_cycles: 0,
            hysteresis: Some(1000.0),
        },
        ..fast_config()
    };
    let report = analyze_recording(&beta_rows(2000), &config).expect("analysis failed");
    assert_eq!(report.trigger_count(), 1);
}
