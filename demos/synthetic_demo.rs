//! Demonstration of the EEG cursor pipeline on a synthetic signal.
//!
//! This example shows how to:
//! 1. Build a synthetic feed with a Gamma and a Beta component
//! 2. Spawn the pipeline with a virtual cursor as the sink
//! 3. Watch analysis cycles through a read-only view
//! 4. Shut down and inspect the session report
//!
//! Run with: cargo run --example synthetic_demo

use std::sync::Arc;
use std::time::Duration;

use eeg_cursor_agent::{
    acquisition::{SyntheticConfig, SyntheticFeed, Tone},
    actuation::VirtualCursor,
    band_table,
    config::Config,
    pipeline::Pipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("EEG Cursor Agent - Synthetic Demo");
    println!("=================================");
    println!();
    println!("{}", band_table());

    let config = Config::default();

    // 40 Hz drives Gamma (UP), 20 Hz drives Beta (DOWN)
    let feed = SyntheticFeed::new(
        SyntheticConfig::new(config.sampling_rate_hz, 1, config.ingest_interval)
            .with_tone(Tone::new(40.0, 300.0))
            .with_tone(Tone::new(20.0, 120.0)),
    )?;
    let cursor = Arc::new(VirtualCursor::new((400, 300), config.cursor_step_px).with_bounds(800, 600));

    let handle = Pipeline::new(&config)?.spawn(feed, cursor.clone());
    let mut view = handle.view();

    println!("Running for 8 analysis cycles...");
    println!();
    for _ in 0..8 {
        let Some(report) = view.next_report().await else {
            break;
        };
        let commands: Vec<String> = report.events.iter().map(|e| e.command.to_string()).collect();
        println!(
            "cycle {:>2}  gamma {:>9.1}  beta {:>9.1}  {}",
            report.cycle,
            report.smoothed.gamma,
            report.smoothed.beta,
            commands.join(" ")
        );

        // Let the flash show up on the panel
        tokio::time::sleep(Duration::from_millis(20)).await;
        println!("          {}", view.panel().render());
    }

    let report = handle.shutdown().await;
    println!();
    if let Some((x, y)) = cursor.position() {
        println!("Cursor ended at ({x}, {y})");
    }
    println!("Triggers: {}", report.trigger_count());
    println!();
    println!("{}", report.to_json()?);

    Ok(())
}
