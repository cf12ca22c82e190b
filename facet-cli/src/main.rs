//! Facet grid command line
//!
//! Loads a Facet Data file, runs the contour and crossing pipeline and
//! writes reports, SVG views or edited data files.

mod commands;
mod config;
mod error;
mod facet_file;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facet_cli=info,facet_globe=info".into()),
        )
        .init();

    let config = Config::parse();
    info!("Loading {}", config.input.display());

    commands::run(&config)?;
    Ok(())
}
