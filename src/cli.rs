use clap::{Parser, Subcommand};
use freezer_alerts::AlertKind;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "freezer", version, about = "Overnight freeze and morning umbrella alerts.")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(env = "FREEZER_CONFIG", short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Keep enabled checks scheduled until interrupted
    Run,
    /// Turn an alert kind on and schedule it
    Enable { kind: AlertKind },
    /// Turn an alert kind off
    Disable { kind: AlertKind },
    /// Run one check now, regardless of its schedule
    Check { kind: AlertKind },
    /// Fetch and print the next 24 hours, remembering the location
    Forecast(LocationArgs),
    /// Show enabled flags, saved location and next fire times
    Status,
}

#[derive(Debug, Parser)]
pub struct LocationArgs {
    #[arg(long, allow_negative_numbers = true, requires = "lon")]
    pub lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    pub lon: Option<f64>,
}
