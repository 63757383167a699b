mod cli;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use freezer_alerts::prefs;
use freezer_alerts::{
    refresh_forecast, AlertContext, AlertKind, AlertScheduler, CheckOutcome, SqlitePreferences,
    SystemClock, TracingSink,
};
use freezer_core::{AppError, Config, ConfigError};
use freezer_weather::{Coordinates, OpenWeatherProvider};

use crate::cli::{Cli, Command, LocationArgs};

#[tokio::main]
async fn main() -> Result<()> {
    freezer_core::init()?;

    let cli = Cli::parse();
    let loaded = match &cli.config {
        Some(path) => Config::load_validated_from(path),
        None => Config::load_validated(),
    };
    let (config, _validation) = loaded.map_err(|e| match e.downcast_ref::<ConfigError>() {
        Some(config_err) => anyhow::anyhow!("{} ({})", config_err.user_message(), config_err),
        None => e,
    })?;

    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!("Failed to create data directory {}", config.data_dir.display())
    })?;
    let store = SqlitePreferences::new(config.preferences_path())
        .map_err(|e| anyhow::anyhow!("{}", AppError::from(e).user_message()))?;
    let source = OpenWeatherProvider::from_config(&config.weather)?;

    let scheduler = AlertScheduler::new(AlertContext {
        source: Arc::new(source),
        sink: Arc::new(TracingSink),
        prefs: Arc::new(store),
        clock: Arc::new(SystemClock),
        tz: Local,
        recheck_before_dispatch: config.alerts.recheck_enabled_before_dispatch,
    });

    tracing::debug!(command = ?cli.cmd, "Freezer started");

    match cli.cmd {
        Command::Run => run(&scheduler, &config).await,
        Command::Enable { kind } => {
            let state = scheduler.set_enabled(kind, true)?;
            match state.next_fire() {
                Some(at) => println!("{} alerts enabled; next check {}", kind, at.with_timezone(&Local)),
                None => println!("{} alerts enabled", kind),
            }
            if kind == AlertKind::Freeze
                && prefs::last_location(scheduler.context().prefs.as_ref())?.is_none()
            {
                println!("No saved location yet; run `freezer forecast --lat <LAT> --lon <LON>` once.");
            }
            Ok(())
        }
        Command::Disable { kind } => {
            scheduler.set_enabled(kind, false)?;
            println!("{} alerts disabled", kind);
            Ok(())
        }
        Command::Check { kind } => {
            let outcome = scheduler.run_now(kind).await;
            print_outcome(kind, &outcome);
            Ok(())
        }
        Command::Forecast(args) => forecast(&scheduler, &config, args).await,
        Command::Status => status(&scheduler),
    }
}

/// Keep checks armed until Ctrl-C, picking up preference changes made by
/// other invocations.
async fn run(scheduler: &AlertScheduler<Local>, config: &Config) -> Result<()> {
    scheduler.sync_with_preferences()?;
    for kind in AlertKind::ALL {
        if let Some(at) = scheduler.state(kind).next_fire() {
            tracing::info!(%kind, next = %at.with_timezone(&Local), "Check scheduled");
        }
    }

    let mut sync = tokio::time::interval(Duration::from_secs(config.alerts.preference_sync_secs));
    sync.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                break;
            }
            _ = sync.tick() => {
                if let Err(e) = scheduler.sync_with_preferences() {
                    tracing::warn!("Preference sync failed: {}", e);
                }
            }
        }
    }

    scheduler.shutdown().await;
    Ok(())
}

async fn forecast(
    scheduler: &AlertScheduler<Local>,
    config: &Config,
    args: LocationArgs,
) -> Result<()> {
    let requested = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)?),
        _ => None,
    };
    let configured = config
        .location
        .coordinates()
        .and_then(|(lat, lon)| Coordinates::new(lat, lon).ok());

    let summary = match refresh_forecast(scheduler, requested, configured).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Forecast refresh failed: {}", e);
            anyhow::bail!("{}", e.user_message());
        }
    };

    let symbol = summary.units.temperature_symbol();
    println!("{}", summary.location_label);
    if let (Some(temp), Some(description)) = (summary.current_temperature, &summary.description) {
        println!("Now: {:.0}{} {}", temp, symbol, description);
    }
    for sample in &summary.next_24_hours {
        let local = sample.timestamp.with_timezone(&Local);
        println!(
            "  {:>4}  {:>5.1}{}  {:>3.0}%  {}",
            freezer_alerts::format::format_time_label(&local),
            sample.temperature,
            symbol,
            sample.precipitation_probability * 100.0,
            sample.condition_summary
        );
    }
    Ok(())
}

fn status(scheduler: &AlertScheduler<Local>) -> Result<()> {
    let store = scheduler.context().prefs.as_ref();
    let now = Local::now();

    for kind in AlertKind::ALL {
        let enabled = prefs::is_enabled(store, kind)?;
        let next = freezer_alerts::next_fire_time(&now, kind.fire_hour());
        if enabled {
            println!("{:<9} on   next check {}", kind.as_str(), next.format("%a %H:%M"));
        } else {
            println!("{:<9} off", kind.as_str());
        }
    }

    match prefs::last_location(store)? {
        Some(coords) => println!("location  {}", coords),
        None => println!("location  not set"),
    }
    Ok(())
}

fn print_outcome(kind: AlertKind, outcome: &CheckOutcome) {
    match outcome {
        CheckOutcome::Disabled => println!("{} alerts are disabled", kind),
        CheckOutcome::NoLocation => println!("No saved location; run `freezer forecast` first"),
        CheckOutcome::FetchFailed(e) => println!("Could not fetch the forecast: {}", e),
        CheckOutcome::NoAlert => println!("No {} alert needed", kind),
        CheckOutcome::Alerted(_) => {}
        CheckOutcome::Suppressed => println!("{} alerts were disabled during the check", kind),
        CheckOutcome::DispatchFailed(e) => println!("Could not send the alert: {}", e),
    }
}
