//! Sealed-corpus export with the codebook bundling guard.
//!
//! A codebook file alongside a public sealed export would hand any reader the
//! reverse mapping, defeating the sealing entirely. The export path therefore
//! refuses, before writing anything, if the target directory already contains
//! a file that parses as a codebook.
//!
//! License: MIT OR Apache-2.0

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::errors::SealError;
use crate::record::{save_records, PaperRecord};

/// File name written by `export_sealed_records`.
pub const SEALED_EXPORT_FILE: &str = "sealed_records.jsonl";

// The top-level keys that identify a codebook file.
static CODEBOOK_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend(["seed", "forward", "category_counters"]);
    set
});

/// Returns true if the file at `path` parses as a codebook file, i.e. a JSON
/// object carrying `seed`, `forward`, and `category_counters`.
pub fn is_codebook_file(path: &Path) -> bool {
    let Ok(text) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(value) = serde_json::from_str::<Value>(&text) else {
        return false;
    };
    let Some(object) = value.as_object() else {
        return false;
    };
    CODEBOOK_KEYS.iter().all(|key| object.contains_key(*key))
}

/// Writes the sealed corpus into `export_dir` as newline-delimited JSON.
///
/// Fails with a policy violation - before any file is written - if the
/// directory already holds a codebook file.
pub fn export_sealed_records(
    records: &[PaperRecord],
    export_dir: &Path,
) -> Result<PathBuf, SealError> {
    fs::create_dir_all(export_dir)?;

    for entry in fs::read_dir(export_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            debug!("Checking export sibling: {}", path.display());
            if is_codebook_file(&path) {
                warn!("Codebook file found in export directory: {}", path.display());
                return Err(SealError::PolicyViolation(format!(
                    "codebook file '{}' must not be bundled with a sealed export",
                    path.display()
                )));
            }
        }
    }

    let out_path = export_dir.join(SEALED_EXPORT_FILE);
    save_records(&out_path, records)?;
    info!(
        "Exported {} sealed records to {}.",
        records.len(),
        out_path.display()
    );
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebook::{Codebook, TermCategory};

    fn sealed_records() -> Vec<PaperRecord> {
        vec![PaperRecord {
            paper_id: "p-1".to_string(),
            title: "Term-Alpha".to_string(),
            ..Default::default()
        }]
    }

    #[test]
    fn test_export_succeeds_into_clean_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = export_sealed_records(&sealed_records(), dir.path()).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn test_export_rejects_directory_containing_codebook() {
        let dir = tempfile::tempdir().unwrap();
        let mut codebook = Codebook::new(42);
        codebook.seal_term("residual learning", TermCategory::Keyword);
        let codebook_path = dir.path().join("codebook.json");
        codebook.save(&codebook_path).unwrap();

        let result = export_sealed_records(&sealed_records(), dir.path());
        assert!(matches!(result, Err(SealError::PolicyViolation(_))));
        assert!(!dir.path().join(SEALED_EXPORT_FILE).exists());
    }

    #[test]
    fn test_unrelated_json_files_do_not_trip_the_guard() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.json"), r#"{"seed": 1}"#).unwrap();
        assert!(export_sealed_records(&sealed_records(), dir.path()).is_ok());
    }
}
