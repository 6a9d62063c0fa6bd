use std::path::{Path, PathBuf};

use imgcompare::decode::converted_png_path;
use imgcompare::{ComparisonOutcome, Format};

/// Files produced by a run that `--clean` should remove: PNG renders of SVG
/// inputs that exist on disk, and the highlight image of a `Different` outcome.
pub fn artifacts(base: &Path, compare: &Path, outcome: &ComparisonOutcome) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in [base, compare] {
        if Format::from_path(input) == Some(Format::Svg) {
            let png = converted_png_path(input);
            if png.exists() && !paths.contains(&png) {
                paths.push(png);
            }
        }
    }
    if let Some(highlight) = outcome.highlight_path() {
        paths.push(highlight.to_path_buf());
    }
    paths
}

/// Remove each artifact, returning the per-file result. Failures are not fatal.
pub fn remove(paths: Vec<PathBuf>) -> Vec<(PathBuf, std::io::Result<()>)> {
    paths
        .into_iter()
        .map(|path| {
            let result = std::fs::remove_file(&path);
            (path, result)
        })
        .collect()
}

/// The line printed for one removal attempt.
pub fn report_line(path: &Path, result: &std::io::Result<()>) -> String {
    match result {
        Ok(()) => format!("Removed {}", path.display()),
        Err(e) => format!("Failed to remove {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgcompare::Dimensions;

    #[test]
    fn equal_outcome_with_raster_inputs_leaves_nothing() {
        let paths = artifacts(
            Path::new("a.png"),
            Path::new("b.jpg"),
            &ComparisonOutcome::Equal,
        );
        assert!(paths.is_empty());
    }

    #[test]
    fn different_outcome_removes_highlight() {
        let dir = tempfile::tempdir().unwrap();
        let highlight = dir.path().join("highlighted_differences.png");
        std::fs::write(&highlight, b"png").unwrap();
        let outcome = ComparisonOutcome::Different {
            percentage: 10.0,
            highlight_path: highlight.clone(),
        };

        let paths = artifacts(&dir.path().join("a.png"), &dir.path().join("b.png"), &outcome);
        assert_eq!(paths, vec![highlight.clone()]);

        let results = remove(paths);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert!(!highlight.exists());
    }

    #[test]
    fn svg_renders_removed_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("logo.svg");
        let compare = dir.path().join("other.svg");
        std::fs::write(dir.path().join("logo.png"), b"png").unwrap();
        let outcome = ComparisonOutcome::DimensionMismatch {
            base: Dimensions {
                width: 1,
                height: 1,
            },
            compare: Dimensions {
                width: 2,
                height: 2,
            },
        };

        let paths = artifacts(&base, &compare, &outcome);
        assert_eq!(paths, vec![dir.path().join("logo.png")]);
    }

    #[test]
    fn same_svg_twice_listed_once() {
        let dir = tempfile::tempdir().unwrap();
        let svg = dir.path().join("logo.svg");
        std::fs::write(dir.path().join("logo.png"), b"png").unwrap();

        let paths = artifacts(&svg, &svg, &ComparisonOutcome::Equal);
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn failed_removal_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone.png");
        let results = remove(vec![gone.clone()]);
        assert_eq!(results.len(), 1);
        assert!(results[0].1.is_err());

        let line = report_line(&results[0].0, &results[0].1);
        assert!(
            line.starts_with(&format!("Failed to remove {}: ", gone.display())),
            "{line}"
        );
    }

    #[test]
    fn successful_removal_line() {
        assert_eq!(
            report_line(Path::new("out/highlighted_differences.png"), &Ok(())),
            "Removed out/highlighted_differences.png"
        );
    }
}
