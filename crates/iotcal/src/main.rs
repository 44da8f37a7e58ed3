use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use iotcal::{
    config::Config,
    dashboard::Dashboard,
    mock_data::{MockCalendar, MockRenderer, MockWeather},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// iotcal - Calendar and weather dashboard for e-paper displays
#[derive(Parser, Debug)]
#[command(name = "iotcal")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Number of dashboard refreshes to run
    #[arg(long, short = 'n', default_value = "3", env = "REFRESHES")]
    refreshes: u32,

    /// Pause between refreshes in milliseconds
    #[arg(long, default_value = "500", env = "INTERVAL_MS")]
    interval_ms: u64,

    /// Clear every cache between refreshes
    #[arg(long)]
    clear_between: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iotcal=debug,iotcal_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::debug!(
        calendar_id = %config.calendar_id,
        days = config.dashboard_days,
        provider = %config.weather_provider,
        "configuration loaded"
    );

    let calendar = Arc::new(MockCalendar::new());
    let weather = Arc::new(MockWeather::new(
        config.weather_provider.clone(),
        config.weather_api_key.clone(),
    ));
    let renderer = Arc::new(MockRenderer::new());
    let dashboard =
        Dashboard::cached(&config, calendar.clone(), weather.clone(), renderer.clone())?;

    for refresh in 1..=cli.refreshes {
        if refresh > 1 {
            tokio::time::sleep(Duration::from_millis(cli.interval_ms)).await;
            if cli.clear_between {
                dashboard.clear_caches();
            }
        }

        let image = dashboard.refresh().await?;
        tracing::info!(
            refresh,
            bytes = image.png.len(),
            rendered_at = %image.rendered_at.format("%H:%M:%S%.3f"),
            calendar_calls = calendar.calls(),
            weather_calls = weather.calls(),
            render_calls = renderer.calls(),
            "dashboard refreshed"
        );
    }

    Ok(())
}
