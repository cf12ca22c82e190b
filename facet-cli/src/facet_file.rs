//! Reader and writer for the "Facet Data" text format.
//!
//! ```text
//! Facet Data 5
//! 12.5
//! -90	-40	-31.00	12.00	4.20
//! ...
//! END
//! ```
//!
//! The header must contain `Facet Data`; a `5` anywhere in it means every
//! row carries a diameter column. The second line is the tilt in degrees.
//! Rows are `j·10 i·10 x y [diam]` separated by any whitespace.

use std::fs;
use std::path::{Path, PathBuf};

use facet::grid::{FacetGrid, Sample};
use tracing::{debug, warn};

use crate::error::{CliError, Result};

const HEADER: &str = "Facet Data";
const TERMINATOR: &str = "END";

#[derive(Clone, Debug, PartialEq)]
pub struct FacetFile {
    pub tilt: f64,
    pub has_diameter: bool,
    pub samples: Vec<Sample>,
}

impl FacetFile {
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let file = Self::parse(&text)?;
        debug!(
            path = %path.display(),
            rows = file.samples.len(),
            has_diameter = file.has_diameter,
            "facet file read"
        );
        Ok(file)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().enumerate();

        let header = lines.next().map(|(_, l)| l).unwrap_or_default();
        if !header.contains(HEADER) {
            return Err(CliError::MissingHeader(header.to_string()));
        }
        let has_diameter = header.contains('5');
        let columns = if has_diameter { 5 } else { 4 };

        let (_, tilt) = lines.next().ok_or(CliError::MissingTilt)?;
        let tilt = tilt
            .trim()
            .parse::<f64>()
            .map_err(|_| CliError::InvalidTilt(tilt.to_string()))?;

        let mut samples = Vec::new();
        for (n, line) in lines {
            if line.contains(TERMINATOR) {
                return Ok(Self {
                    tilt,
                    has_diameter,
                    samples,
                });
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != columns {
                warn!(line = n + 1, found = fields.len(), columns, "skipping row");
                continue;
            }

            let values = fields
                .iter()
                .map(|f| {
                    f.parse::<f64>().map_err(|_| CliError::InvalidNumber {
                        line: n + 1,
                        value: f.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;

            samples.push(Sample {
                j10: values[0],
                i10: values[1],
                x: values[2],
                y: values[3],
                diam: values.get(4).copied(),
            });
        }

        Err(CliError::MissingEnd)
    }

    pub fn to_grid(&self) -> Result<FacetGrid> {
        Ok(FacetGrid::from_samples(&self.samples, self.has_diameter)?)
    }
}

/// Serializes every valid facet, i-major, with two decimals.
pub fn render(grid: &FacetGrid, tilt: f64) -> String {
    let mut out = String::from(HEADER);
    if grid.has_diameter() {
        out.push_str(" 5");
    }
    out.push('\n');
    out.push_str(&format!("{tilt}\n"));

    for (index, p) in grid.valid_points() {
        out.push_str(&format!(
            "{}\t{}\t{:.2}\t{:.2}",
            index.j * 10,
            index.i * 10,
            p.x,
            p.y
        ));
        if grid.has_diameter() {
            out.push_str(&format!("\t{:.2}", p.diam.unwrap_or_default()));
        }
        out.push('\n');
    }

    out.push_str(TERMINATOR);
    out.push('\n');
    out
}

pub fn write(path: &Path, grid: &FacetGrid, tilt: f64) -> Result<()> {
    fs::write(path, render(grid, tilt))?;
    debug!(path = %path.display(), facets = grid.valid_count(), "facet file written");
    Ok(())
}

/// Next file name in a numbered series: the first `_<digits>` group is
/// incremented, otherwise `_1` is appended to the stem.
///
/// `dome_3.txt → dome_4.txt`, `dome.txt → dome_1.txt`, `dome → dome_1.txt`.
/// Names with more than one dot and no number have no successor.
pub fn next_save_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;

    let next = match numbered_suffix(name) {
        Some((start, end)) => {
            let n: u64 = name[start..end].parse().ok()?;
            format!("{}{}{}", &name[..start], n + 1, &name[end..])
        }
        None => match name.split('.').collect::<Vec<_>>().as_slice() {
            [stem] => format!("{stem}_1.txt"),
            [stem, ext] => format!("{stem}_1.{ext}"),
            _ => return None,
        },
    };

    Some(path.with_file_name(next))
}

/// Byte range of the digits in the first `_<digits>` group.
fn numbered_suffix(name: &str) -> Option<(usize, usize)> {
    let bytes = name.as_bytes();
    bytes.iter().enumerate().find_map(|(pos, b)| {
        if *b != b'_' {
            return None;
        }
        let start = pos + 1;
        let len = bytes[start..].iter().take_while(|c| c.is_ascii_digit()).count();
        (len > 0).then_some((start, start + len))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Facet Data 5\n12.5\n0\t0\t1.5\t-2\t4\n10  -10 3 4 5\n\n-90 120 7 8\n20 10 1 1 1\nEND\nignored\n";

    #[test]
    fn parses_rows_until_end() {
        let file = FacetFile::parse(SAMPLE).unwrap();
        assert_eq!(file.tilt, 12.5);
        assert!(file.has_diameter);
        // the four-column row is skipped
        assert_eq!(file.samples.len(), 3);
        let s = file.samples[1];
        assert_eq!((s.j10, s.i10, s.x, s.y, s.diam), (10.0, -10.0, 3.0, 4.0, Some(5.0)));
    }

    #[test]
    fn four_column_header_has_no_diameter() {
        let file = FacetFile::parse("Facet Data\n0\n0 0 1 2\nEND").unwrap();
        assert!(!file.has_diameter);
        assert_eq!(file.samples[0].diam, None);
    }

    #[test]
    fn rejects_malformed_files() {
        assert!(matches!(
            FacetFile::parse("Something else\n0\nEND"),
            Err(CliError::MissingHeader(_))
        ));
        assert!(matches!(FacetFile::parse("Facet Data"), Err(CliError::MissingTilt)));
        assert!(matches!(
            FacetFile::parse("Facet Data\nabc\nEND"),
            Err(CliError::InvalidTilt(_))
        ));
        assert!(matches!(
            FacetFile::parse("Facet Data\n0\n0 0 x 1\nEND"),
            Err(CliError::InvalidNumber { line: 3, .. })
        ));
        assert!(matches!(
            FacetFile::parse("Facet Data\n0\n0 0 1 1\n"),
            Err(CliError::MissingEnd)
        ));
    }

    #[test]
    fn out_of_lattice_rows_fail_grid_construction() {
        let file = FacetFile::parse("Facet Data\n0\n0 130 1 1\nEND").unwrap();
        assert!(matches!(file.to_grid(), Err(CliError::Engine(_))));
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dome.txt");

        let grid = FacetFile::parse(SAMPLE).unwrap().to_grid().unwrap();
        write(&path, &grid, 12.5).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Facet Data 5\n12.5\n"));
        assert!(text.contains("0\t0\t1.50\t-2.00\t4.00\n"));
        assert!(text.trim_end().ends_with("END"));

        let back = FacetFile::read(&path).unwrap().to_grid().unwrap();
        assert_eq!(back.valid_count(), grid.valid_count());
        assert_eq!(back.get(-1, 1).unwrap().diam, Some(5.0));
    }

    #[test]
    fn render_writes_valid_facets_i_major() {
        let grid = FacetFile::parse("Facet Data\n0\n10 10 1 2\n-10 0 3.456 -4\nEND")
            .unwrap()
            .to_grid()
            .unwrap();
        assert_eq!(
            render(&grid, -2.5),
            "Facet Data\n-2.5\n-10\t0\t3.46\t-4.00\n10\t10\t1.00\t2.00\nEND\n"
        );
    }

    #[test]
    fn save_paths_increment() {
        let next = |p: &str| next_save_path(Path::new(p)).map(|p| p.display().to_string());
        assert_eq!(next("/data/dome_3.txt").as_deref(), Some("/data/dome_4.txt"));
        assert_eq!(next("/data/dome_9_x.txt").as_deref(), Some("/data/dome_10_x.txt"));
        assert_eq!(next("/data/dome.txt").as_deref(), Some("/data/dome_1.txt"));
        assert_eq!(next("dome").as_deref(), Some("dome_1.txt"));
        assert_eq!(next("/data/dome.v2.txt"), None);
        assert_eq!(next("/data/a1_1.txt").as_deref(), Some("/data/a1_2.txt"));
    }
}
