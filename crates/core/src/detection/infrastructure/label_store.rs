use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelStoreError {
    #[error("failed to read labels from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("labels file {0} contains no class names")]
    Empty(PathBuf),
}

/// Loads a newline-delimited class-name list.
///
/// Lines are trimmed; blank lines are skipped. Class names may contain
/// internal whitespace (`Bus Line Number`), so only leading/trailing
/// whitespace is stripped.
pub fn load_labels(path: &Path) -> Result<Vec<String>, LabelStoreError> {
    let text = fs::read_to_string(path).map_err(|e| LabelStoreError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let labels: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        return Err(LabelStoreError::Empty(path.to_path_buf()));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_labels(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("labels.txt");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_loads_lines_in_order() {
        let dir = TempDir::new().unwrap();
        let path = write_labels(&dir, "BMTA-bus\nBus Line Number\nTSB-Bus\n");
        let labels = load_labels(&path).unwrap();
        assert_eq!(labels, vec!["BMTA-bus", "Bus Line Number", "TSB-Bus"]);
    }

    #[test]
    fn test_skips_blank_lines_and_trims() {
        let dir = TempDir::new().unwrap();
        let path = write_labels(&dir, "  BMTA-bus  \n\n\nDestination Sign\n   \n");
        let labels = load_labels(&path).unwrap();
        assert_eq!(labels, vec!["BMTA-bus", "Destination Sign"]);
    }

    #[test]
    fn test_preserves_internal_whitespace() {
        let dir = TempDir::new().unwrap();
        let path = write_labels(&dir, "Bus Side Number\n");
        let labels = load_labels(&path).unwrap();
        assert_eq!(labels[0], "Bus Side Number");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = load_labels(Path::new("/nonexistent/labels.txt"));
        assert!(matches!(result, Err(LabelStoreError::Read { .. })));
    }

    #[test]
    fn test_empty_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_labels(&dir, "\n  \n");
        let result = load_labels(&path);
        assert!(matches!(result, Err(LabelStoreError::Empty(_))));
    }
}
