//! Command line configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use facet::render::LabelMetric;

/// Facet grid contouring and globe export
#[derive(Parser, Clone, Debug)]
#[command(name = "facet-cli")]
#[command(about = "Contours a Facet Data file and renders its crossing mesh")]
pub struct Config {
    /// Facet Data file to load
    pub input: PathBuf,

    /// Tilt in degrees, overriding the value stored in the file
    #[arg(long, allow_negative_numbers = true)]
    pub tilt: Option<f64>,

    /// View elevation in degrees
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub theta0: f64,

    /// View azimuth in degrees
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub fi0: f64,

    /// Value printed beside each centroid on export
    #[arg(long, value_enum, default_value = "angle")]
    pub metric: MetricArg,

    /// Globe radius in scene units
    #[arg(long, default_value = "270")]
    pub radius: f64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Print facet, contour and crossing counts
    Summary,

    /// Dump the crossing mesh as JSON
    Crossings {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },

    /// Write the labeled globe as SVG
    Export {
        /// Defaults to `<stem>-<code> <theta0> <fi0>.svg` next to the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the written file with the system viewer
        #[arg(long)]
        open: bool,
    },

    /// Write the angular (phi, theta) view as SVG
    Angular {
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the planar facet view as SVG
    Facets {
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Mirror the layout vertically and save
    ReverseY {
        /// Defaults to the next numbered file name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Move an existing facet and save
    Move {
        #[arg(allow_negative_numbers = true)]
        i: i32,
        #[arg(allow_negative_numbers = true)]
        j: i32,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Insert a facet beyond two adjacent ones and save
    Insert {
        /// Anchor facet as `i,j`
        #[arg(long, value_parser = parse_index, allow_hyphen_values = true)]
        anchor: (i32, i32),

        /// Neighbour of the anchor as `i,j`; the new facet continues past it
        #[arg(long, value_parser = parse_index, allow_hyphen_values = true)]
        neighbor: (i32, i32),

        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Open the interactive globe preview
    Preview,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricArg {
    /// Opening angle (A)
    Angle,
    /// z1–z2 separation in level steps (X)
    Dx,
    /// z1–z4 separation in level steps (Y)
    Dy,
    /// z2–z4 separation in level steps (Z)
    Dz,
    /// Diameter times opening angle (p)
    Pitch,
    /// Mean diameter (D)
    Diameter,
}

impl From<MetricArg> for LabelMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Angle => LabelMetric::OpeningAngle,
            MetricArg::Dx => LabelMetric::DeltaX,
            MetricArg::Dy => LabelMetric::DeltaY,
            MetricArg::Dz => LabelMetric::DeltaZ,
            MetricArg::Pitch => LabelMetric::Pitch,
            MetricArg::Diameter => LabelMetric::Diameter,
        }
    }
}

fn parse_index(s: &str) -> std::result::Result<(i32, i32), String> {
    let (i, j) = s
        .split_once(',')
        .ok_or_else(|| format!("expected i,j but got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<i32>()
            .map_err(|e| format!("{v:?}: {e}"))
    };
    Ok((parse(i)?, parse(j)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_with_negative_view() {
        let config = Config::try_parse_from([
            "facet-cli",
            "dome.txt",
            "--theta0",
            "-20",
            "--fi0",
            "170",
            "--metric",
            "pitch",
            "export",
            "--open",
        ])
        .unwrap();
        assert_eq!(config.theta0, -20.0);
        assert_eq!(config.fi0, 170.0);
        assert_eq!(LabelMetric::from(config.metric), LabelMetric::Pitch);
        assert!(matches!(config.command, Command::Export { output: None, open: true }));
    }

    #[test]
    fn parses_insert_indices() {
        let config = Config::try_parse_from([
            "facet-cli",
            "dome.txt",
            "insert",
            "--anchor",
            "-1,0",
            "--neighbor",
            "0,0",
            "12.5",
            "-3",
        ])
        .unwrap();
        let Command::Insert { anchor, neighbor, x, y, .. } = config.command else {
            panic!("expected insert");
        };
        assert_eq!(anchor, (-1, 0));
        assert_eq!(neighbor, (0, 0));
        assert_eq!((x, y), (12.5, -3.0));
    }

    #[test]
    fn rejects_malformed_index() {
        assert!(parse_index("3").is_err());
        assert!(parse_index("a,1").is_err());
        assert_eq!(parse_index(" 2, -4").unwrap(), (2, -4));
    }
}
