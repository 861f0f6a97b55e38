//! Conversion of raw export dumps into JSON record files.
//!
//! Upstream dumps arrive as plain files carrying one JSON-encoded record
//! per line; the catalog loader wants JSON array files. Each input becomes
//! `<stem>.json` in the output directory.

use std::fs;
use std::path::Path;

use crate::error::{ReportError, Result};

/// Convert every non-hidden file under `input`, returning how many files
/// were written. Sources are removed only when `delete_after` is set.
pub fn convert_dir(input: &Path, output: &Path, delete_after: bool) -> Result<usize> {
    fs::create_dir_all(output)?;

    let mut paths = Vec::new();
    for entry in fs::read_dir(input)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        paths.push(path);
    }
    paths.sort();

    let mut written = 0;
    for path in paths {
        let text = fs::read_to_string(&path)?;
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records".to_string());
        let target = output.join(format!("{stem}.json"));
        let file = fs::File::create(&target)?;
        serde_json::to_writer(file, &lines).map_err(|e| ReportError::Json {
            path: target.display().to_string(),
            source: e,
        })?;
        written += 1;
        tracing::debug!(
            from = %path.display(),
            to = %target.display(),
            records = lines.len(),
            "Converted"
        );

        if delete_after {
            fs::remove_file(&path)?;
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn raw_lines_become_a_string_array() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::write(
            input.path().join("batch1"),
            "{\"ip\":\"1.1.1.1\"}\n\n{\"ip\":\"2.2.2.2\"}\n",
        )
        .unwrap();

        let written = convert_dir(input.path(), output.path(), false).unwrap();
        assert_eq!(written, 1);

        let text = fs::read_to_string(output.path().join("batch1.json")).unwrap();
        let decoded: Vec<String> = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0], "{\"ip\":\"1.1.1.1\"}");
        // sources survive without the delete flag
        assert!(input.path().join("batch1").exists());
    }

    #[test]
    fn delete_flag_removes_sources() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::write(input.path().join("batch1"), "{}\n").unwrap();

        convert_dir(input.path(), output.path(), true).unwrap();
        assert!(!input.path().join("batch1").exists());
        assert!(output.path().join("batch1.json").exists());
    }

    #[test]
    fn hidden_files_are_left_alone() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::write(input.path().join(".partial"), "{}\n").unwrap();

        let written = convert_dir(input.path(), output.path(), false).unwrap();
        assert_eq!(written, 0);
    }
}
