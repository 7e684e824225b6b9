//! Flat record store for the file registry
//!
//! One-column CSV: a `filename` header, then one basename per row.

use std::fs;
use std::path::Path;

use eyre::{Context, Result, eyre};
use tracing::debug;

use super::FileRegistry;

const HEADER: &str = "filename";

impl FileRegistry {
    /// Write the registry to `path`, rows sorted for stable diffs
    pub fn save(&self, path: &Path) -> Result<()> {
        debug!(?path, files = self.len(), "save: called");
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create registry directory")?;
        }

        let mut rows: Vec<&str> = self.iter().collect();
        rows.sort_unstable();

        let mut writer =
            csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record([HEADER])?;
        for row in rows {
            writer.write_record([row])?;
        }
        writer.flush().context("Failed to flush registry file")?;
        Ok(())
    }

    /// Read a registry previously written by [`FileRegistry::save`]
    pub fn load(path: &Path) -> Result<Self> {
        debug!(?path, "load: called");
        let mut reader = csv::Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;

        let headers = reader.headers()?;
        if headers.get(0) != Some(HEADER) {
            return Err(eyre!(
                "{} is not a registry file: expected '{}' header",
                path.display(),
                HEADER
            ));
        }

        let mut registry = FileRegistry::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("Malformed row in {}", path.display()))?;
            if let Some(name) = record.get(0).filter(|n| !n.is_empty()) {
                registry.insert(name);
            }
        }

        debug!(files = registry.len(), "load: done");
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::TreeEntry;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_writes_header_and_sorted_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("files.csv");
        let registry: FileRegistry = ["b.py", "a.py"].into_iter().collect();

        registry.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "filename\na.py\nb.py\n");
    }

    #[test]
    fn test_roundtrip_quotes_awkward_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("files.csv");
        let registry: FileRegistry = ["plain.rs", "with,comma.txt", "with \"quote\".md"].into_iter().collect();

        registry.save(&path).unwrap();
        let loaded = FileRegistry::load(&path).unwrap();

        assert_eq!(loaded, registry);
    }

    #[test]
    fn test_empty_registry_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("files.csv");

        FileRegistry::new().save(&path).unwrap();
        let loaded = FileRegistry::load(&path).unwrap();

        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(FileRegistry::load(&dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn test_load_rejects_foreign_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "name,size\na.py,10\n").unwrap();

        let err = FileRegistry::load(&path).unwrap_err();
        assert!(err.to_string().contains("not a registry file"));
    }

    proptest! {
        #[test]
        fn prop_build_save_load_preserves_membership(
            paths in proptest::collection::vec("[a-z]{1,6}(/[a-z]{1,6}){0,3}\\.[a-z]{1,3}", 0..40),
            probe in "[a-z]{1,6}\\.[a-z]{1,3}",
        ) {
            let entries: Vec<TreeEntry> = paths.iter().map(TreeEntry::blob).collect();
            let built = FileRegistry::from_tree(&entries);

            let dir = TempDir::new().unwrap();
            let path = dir.path().join("files.csv");
            built.save(&path).unwrap();
            let loaded = FileRegistry::load(&path).unwrap();

            for p in &paths {
                let b = super::super::basename(p);
                prop_assert_eq!(loaded.contains(b), built.contains(b));
                prop_assert!(loaded.contains(b));
            }
            prop_assert_eq!(loaded.contains(&probe), built.contains(&probe));
        }
    }
}
