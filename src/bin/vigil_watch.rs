//! Scripted demo harness for the monitor engine.
//!
//! Drives a full session against the synthetic media source: a quiet
//! lead-in, a motion burst, then a loud tone, printing alerts as they fire.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vigil_core::engine::SystemTimeSource;
use vigil_core::media::{MediaSource, SyntheticMediaSource};
use vigil_core::verify::StubVerifier;
use vigil_core::{AlertNotice, MonitorConfig, MonitorHandle, SettingsPatch};

#[derive(Parser, Debug)]
#[command(name = "vigil_watch", about = "Run a scripted monitoring session")]
struct Args {
    /// Path to a JSON config file (defaults are used if missing)
    #[arg(long, default_value = "assets/monitor_config.json")]
    config: String,

    /// Seconds of quiet lead-in before the scripted bursts
    #[arg(long, default_value_t = 1)]
    lead_in_secs: u64,

    /// Seconds each scripted burst lasts
    #[arg(long, default_value_t = 2)]
    burst_secs: u64,

    /// Require verification before alerts are logged
    #[arg(long)]
    smart_guard: bool,

    /// Suppress the audible-alarm flag on raised alerts
    #[arg(long)]
    muted: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = MonitorConfig::load_from_file(&args.config);

    let source = Arc::new(SyntheticMediaSource::new(640, 480));
    let handle = Arc::new(MonitorHandle::with_components(
        config,
        Arc::clone(&source) as Arc<dyn MediaSource>,
        Arc::new(StubVerifier::with_verdict(true, "figure near the window")),
        Arc::new(SystemTimeSource::default()),
    ));

    handle.apply_settings(SettingsPatch {
        motion_sensitivity: Some(85),
        audio_sensitivity: Some(85),
        smart_guard: Some(args.smart_guard),
        muted: Some(args.muted),
    });

    let mut alerts = handle.subscribe_alerts();
    tokio::spawn(async move {
        while let Ok(notice) = alerts.recv().await {
            match notice {
                AlertNotice::Raised { event, audible } => {
                    println!(
                        "ALERT [{}] {} ({} byte snapshot, audible: {})",
                        event.id,
                        event.reason,
                        event.image_jpeg.len(),
                        audible
                    );
                }
                AlertNotice::Dismissed => println!("alarm dismissed"),
            }
        }
    });

    handle.start_session()?;
    println!("session started; watching a quiet scene...");
    tokio::time::sleep(Duration::from_secs(args.lead_in_secs)).await;

    println!("injecting motion burst...");
    source.set_motion(0.6);
    tokio::time::sleep(Duration::from_secs(args.burst_secs)).await;
    source.quiet();

    println!("injecting loud tone...");
    source.set_tone(0.9);
    tokio::time::sleep(Duration::from_secs(args.burst_secs)).await;
    source.quiet();

    handle.dismiss();
    handle.stop_session().await?;

    let events = handle.events();
    println!("session ended with {} logged event(s):", events.len());
    for event in &events {
        println!("  {} - {}", event.id, event.reason);
    }

    Ok(())
}
