use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{CustomType, Password};
use kmw_core::{
    Config, CurrentConditions, DailyPoint, ForecastSource, Freshness, HourlyPoint, Refresher,
    Resource, Snapshot, source_from_config,
};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "kmw", version, about = "Kachelmann Wetter forecast CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Current,
    Hourly,
    Daily,
    All,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and location.
    Configure,

    /// Run one refresh cycle and print the normalized result.
    Show {
        #[arg(value_enum, default_value_t = View::All)]
        view: View,

        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the raw vendor records of one resource.
    Raw {
        /// One of: current, hourly, three_hourly, daily.
        resource: String,
    },

    /// Refresh on the configured polling interval until interrupted.
    Watch,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { view, json } => show(view, json).await,
            Command::Raw { resource } => raw(&resource).await,
            Command::Watch => watch().await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("Kachelmann Wetter API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let mut latitude =
        CustomType::<f64>::new("Latitude:").with_error_message("Enter a number, e.g. 47.37");
    if let Some(lat) = config.latitude {
        latitude = latitude.with_default(lat);
    }
    let latitude = latitude.prompt().context("Failed to read latitude")?;

    let mut longitude =
        CustomType::<f64>::new("Longitude:").with_error_message("Enter a number, e.g. 8.54");
    if let Some(lon) = config.longitude {
        longitude = longitude.with_default(lon);
    }
    let longitude = longitude.prompt().context("Failed to read longitude")?;

    config.set_credentials(api_key, latitude, longitude);
    config.validate()?;
    config.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(view: View, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let refresher = Refresher::new(source_from_config(&config)?, config.refresh_options());

    if refresher.refresh().await.is_none() {
        anyhow::bail!("A refresh is already running");
    }
    let snapshot = refresher.snapshot();

    if json {
        let rendered = match view {
            View::Current => serde_json::to_string_pretty(&snapshot.current),
            View::Hourly => serde_json::to_string_pretty(&snapshot.hourly),
            View::Daily => serde_json::to_string_pretty(&snapshot.daily),
            View::All => serde_json::to_string_pretty(&*snapshot),
        }
        .context("Failed to serialize snapshot")?;
        println!("{rendered}");
        return Ok(());
    }

    if matches!(view, View::Current | View::All) {
        print_current(&snapshot);
    }
    if matches!(view, View::Hourly | View::All) {
        print_hourly(&snapshot);
    }
    if matches!(view, View::Daily | View::All) {
        print_daily(&snapshot);
    }

    Ok(())
}

async fn raw(resource: &str) -> anyhow::Result<()> {
    let resource = Resource::try_from(resource)?;
    let config = Config::load()?;
    let source = source_from_config(&config)?;

    let records = match resource {
        Resource::Current => vec![source.fetch_current().await?],
        Resource::Hourly => source.fetch_hourly().await?,
        Resource::ThreeHourly => source.fetch_three_hourly().await?,
        Resource::Daily => source.fetch_daily().await?,
    };

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn watch() -> anyhow::Result<()> {
    let config = Config::load()?;
    let refresher = Refresher::new(source_from_config(&config)?, config.refresh_options());

    let mut ticker = interval(config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(every = ?config.poll_interval(), "polling for new data");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(report) = refresher.refresh().await else {
                    continue;
                };
                let snapshot = refresher.snapshot();
                if let Some(current) = &snapshot.current {
                    info!(
                        version = report.version,
                        temperature = ?current.attributes.temperature,
                        condition = ?current.attributes.condition,
                        hourly_points = snapshot.hourly.len(),
                        daily_points = snapshot.daily.len(),
                        "snapshot published"
                    );
                } else {
                    warn!(version = report.version, "no current conditions available yet");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                return Ok(());
            }
        }
    }
}

fn reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.1}{unit}"),
        None => "unknown".to_string(),
    }
}

fn staleness(freshness: &Freshness) -> &'static str {
    if freshness.stale { " (stale)" } else { "" }
}

fn print_current(snapshot: &Snapshot) {
    println!("Current conditions{}", staleness(&snapshot.current_freshness));

    let Some(current) = snapshot.current.as_deref() else {
        println!("  no data");
        return;
    };
    let CurrentConditions { observed_at, attributes: a, .. } = current;

    if let Some(at) = observed_at {
        println!("  observed     {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
    println!("  condition    {}", a.condition.map_or("unknown", |c| c.as_str()));
    println!("  temperature  {}", reading(a.temperature, " °C"));
    println!("  dew point    {}", reading(a.dew_point, " °C"));
    println!("  humidity     {}", reading(a.humidity, " %"));
    println!("  pressure     {}", reading(a.pressure, " hPa"));
    println!("  precip 1h    {}", reading(a.precipitation, " mm"));
    println!(
        "  wind         {} from {} (gusts {})",
        reading(a.wind_speed, ""),
        reading(a.wind_bearing, "°"),
        reading(a.wind_gust_speed, "")
    );
}

fn print_hourly(snapshot: &Snapshot) {
    println!("Hourly forecast{}", staleness(&snapshot.hourly_freshness));

    for HourlyPoint { start, resolution, attributes: a } in snapshot.hourly.iter() {
        println!(
            "  {} +{}h  {:>10}  {:>9}  {}",
            start.with_timezone(&Local).format("%a %d %H:%M"),
            resolution.duration().num_hours(),
            reading(a.temperature, " °C"),
            reading(a.precipitation, " mm"),
            a.condition.map_or("unknown", |c| c.as_str()),
        );
    }
}

fn print_daily(snapshot: &Snapshot) {
    println!("Daily forecast{}", staleness(&snapshot.daily_freshness));

    for point in snapshot.daily.iter() {
        let DailyPoint {
            date,
            temperature_max,
            temperature_min,
            risks,
            attributes: a,
            ..
        } = point;
        let risk_types: Vec<&str> = risks.iter().filter_map(|r| r.kind.as_deref()).collect();
        let risks = if risk_types.is_empty() {
            String::new()
        } else {
            format!("  risks: {}", risk_types.join(", "))
        };
        println!(
            "  {}  {:>9} / {:>9}  {:>9}  {}{}",
            date.format("%a %d %b"),
            reading(*temperature_min, " °C"),
            reading(*temperature_max, " °C"),
            reading(a.precipitation, " mm"),
            a.condition.map_or("unknown", |c| c.as_str()),
            risks,
        );
    }
}
