//! signup-race demo entry point.
//!
//! Races the configured registry variants and logs each outcome.

use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use signup_race::config::RaceConfig;
use signup_race::domain::EventBus;
use signup_race::harness::RaceHarness;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RaceConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        username = %config.username,
        contenders = config.contenders,
        pause = ?config.pause,
        "starting signup-race"
    );

    // Log every registration event as JSON
    let event_bus = EventBus::new(config.event_bus_capacity);
    let mut events = event_bus.subscribe();
    let event_logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => tracing::info!(target: "signup_race::events", "{json}"),
                    Err(e) => tracing::warn!(error = %e, "failed to encode event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let harness = RaceHarness::new(config.username.clone(), config.contenders)?
        .with_events(event_bus.clone());

    let mut violations = 0usize;
    for variant in &config.variants {
        let outcome = harness.run_variant(*variant, config.pause).await?;
        if !outcome.invariant_holds() {
            violations = violations.saturating_add(1);
        }
        let json = serde_json::to_string(&outcome)?;
        tracing::info!(%variant, outcome = %json, "race outcome");
    }

    // Closing the last sender ends the logger loop
    drop(harness);
    drop(event_bus);
    event_logger.await?;

    if violations > 0 {
        tracing::warn!(
            violations,
            "duplicate registrations observed: check-then-act without a lock lost the race"
        );
    }

    Ok(())
}
