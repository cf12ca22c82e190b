//! Subcommand handlers

use std::fs;
use std::path::{Path, PathBuf};

use facet::grid::{FacetGrid, GridIndex, GridSnapshot};
use facet::pipeline::recompute;
use facet::projection::ViewState;
use facet::render::{
    LabelMetric, SceneStyle, angular_scene, export_file_name, export_scene, facet_scene,
};
use facet::runtime::run_preview;
use facet::scene::Scene;
use tracing::{info, warn};

use crate::config::{Command, Config};
use crate::error::{CliError, Result};
use crate::facet_file::{self, FacetFile};

pub fn run(config: &Config) -> Result<()> {
    let file = FacetFile::read(&config.input)?;
    let tilt = config.tilt.unwrap_or(file.tilt);
    let mut grid = file.to_grid()?;
    let view = ViewState::new(config.theta0, config.fi0);
    let style = SceneStyle {
        radius: config.radius,
        ..SceneStyle::default()
    };

    match &config.command {
        Command::Summary => summary(&grid, tilt),
        Command::Crossings { output, pretty } => {
            let result = recompute(&grid, tilt);
            let json = if *pretty {
                serde_json::to_string_pretty(&result.mesh)?
            } else {
                serde_json::to_string(&result.mesh)?
            };
            match output {
                Some(path) => {
                    fs::write(path, json)?;
                    info!("Crossing mesh written to {}", path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Command::Export { output, open } => {
            let metric = LabelMetric::from(config.metric);
            if metric.needs_diameter() && !grid.has_diameter() {
                warn!(metric = %metric.code(), "data has no diameter column, labels will be empty");
            }
            let result = recompute(&grid, tilt);
            let scene = export_scene(&result.mesh, view, metric, &style);
            let path = match output {
                Some(path) => path.clone(),
                None => default_export_path(&config.input, metric, view),
            };
            write_svg(&path, &scene)?;
            if *open {
                open::that(&path)?;
            }
            Ok(())
        }
        Command::Angular { output } => {
            let result = recompute(&grid, tilt);
            write_svg(output, &angular_scene(&grid, &result, &style))
        }
        Command::Facets { output } => {
            // the loaded file doubles as the reference layout
            let reference = grid.clone();
            write_svg(output, &facet_scene(&grid, &reference, &style))
        }
        Command::ReverseY { output } => {
            let snapshot = grid.reverse_y();
            save(&config.input, output.as_deref(), &snapshot, tilt)
        }
        Command::Move { i, j, x, y, output } => {
            let snapshot = grid.move_point(*i, *j, *x, *y)?;
            save(&config.input, output.as_deref(), &snapshot, tilt)
        }
        Command::Insert {
            anchor,
            neighbor,
            x,
            y,
            output,
        } => {
            let (target, snapshot) = grid.insert_point(
                GridIndex::new(anchor.0, anchor.1),
                GridIndex::new(neighbor.0, neighbor.1),
                *x,
                *y,
            )?;
            info!("Inserted facet at i={} j={}", target.i, target.j);
            save(&config.input, output.as_deref(), &snapshot, tilt)
        }
        Command::Preview => {
            let result = recompute(&grid, tilt);
            info!(
                "Opening preview, {} crossings, tilt {tilt}",
                result.mesh.valid_count()
            );
            run_preview(result.mesh, tilt, view, style)?;
            Ok(())
        }
    }
}

fn summary(grid: &FacetGrid, tilt: f64) -> Result<()> {
    let result = recompute(grid, tilt);
    println!("facets        {}", grid.valid_count());
    println!("diameter      {}", if grid.has_diameter() { "yes" } else { "no" });
    println!("tilt          {tilt}");
    println!("x levels      {}", result.iso_x.non_empty_levels());
    println!("y levels      {}", result.iso_y.non_empty_levels());
    println!("crossings     {}", result.mesh.valid_count());
    println!("cells         {}", result.mesh.measured_count());
    Ok(())
}

fn default_export_path(input: &Path, metric: LabelMetric, view: ViewState) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("facets");
    input.with_file_name(export_file_name(stem, metric, view))
}

fn write_svg(path: &Path, scene: &Scene) -> Result<()> {
    let svg = scene.to_svg()?;
    fs::write(path, svg)?;
    info!("SVG written to {}", path.display());
    Ok(())
}

fn save(input: &Path, output: Option<&Path>, grid: &GridSnapshot, tilt: f64) -> Result<()> {
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => facet_file::next_save_path(input)
            .ok_or_else(|| CliError::NoSavePath(input.to_path_buf()))?,
    };
    facet_file::write(&path, grid, tilt)?;
    info!("Saved {} facets to {}", grid.valid_count(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const DOME: &str = "Facet Data\n0\n\
        0\t0\t-5\t-5\n10\t0\t5\t-5\n0\t10\t-5\t5\n10\t10\t5\t5\nEND\n";

    fn run_with(dir: &Path, args: &[&str]) -> Result<()> {
        let input = dir.join("dome.txt");
        fs::write(&input, DOME)?;
        let mut argv = vec!["facet-cli", input.to_str().unwrap_or_default()];
        argv.extend_from_slice(args);
        run(&Config::parse_from(argv))
    }

    #[test]
    fn reverse_saves_next_numbered_file() {
        let dir = tempfile::tempdir().unwrap();
        run_with(dir.path(), &["reverse-y"]).unwrap();
        let saved = FacetFile::read(&dir.path().join("dome_1.txt")).unwrap();
        let grid = saved.to_grid().unwrap();
        assert_eq!(grid.get(0, 0).unwrap().y, 5.0);
        assert_eq!(grid.get(1, 1).unwrap().y, -5.0);
    }

    #[test]
    fn export_uses_metric_and_view_in_default_name() {
        let dir = tempfile::tempdir().unwrap();
        run_with(dir.path(), &["--fi0", "-10", "--metric", "dx", "export"]).unwrap();
        let svg = fs::read_to_string(dir.path().join("dome-X 0 -10.svg")).unwrap();
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn insert_extrapolates_from_existing_facets() {
        let dir = tempfile::tempdir().unwrap();
        // (-1, 0) holds no facet
        let err = run_with(
            dir.path(),
            &["insert", "--anchor", "-1,0", "--neighbor", "0,0", "1", "1"],
        );
        assert!(matches!(err, Err(CliError::Engine(_))));
        // (0, 0) and (1, 1) are diagonal
        let err = run_with(
            dir.path(),
            &["insert", "--anchor", "0,0", "--neighbor", "1,1", "1", "1"],
        );
        assert!(matches!(err, Err(CliError::Engine(_))));

        let out = dir.path().join("out.txt");
        let out = out.to_str().unwrap();
        run_with(
            dir.path(),
            &["insert", "--anchor", "1,0", "--neighbor", "0,0", "-15", "-5", "-o", out],
        )
        .unwrap_or_else(|e| panic!("{e}"));

        let grid = FacetFile::read(Path::new(out)).unwrap().to_grid().unwrap();
        let inserted = grid.get(-1, 0).unwrap();
        assert!(inserted.valid);
        assert_eq!((inserted.x, inserted.y), (-15.0, -5.0));
    }
}
