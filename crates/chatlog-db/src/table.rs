use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One CSV file with a fixed header row.
///
/// Callers take the lock with [`Table::with_lock`] and then read or rewrite
/// the whole file inside the closure.
pub struct Table {
    path: PathBuf,
    columns: &'static [&'static str],
    lock: Mutex<()>,
}

impl Table {
    /// Open the table, writing a header-only file if none exists yet.
    pub fn open(path: PathBuf, columns: &'static [&'static str]) -> Result<Self> {
        let table = Self {
            path,
            columns,
            lock: Mutex::new(()),
        };
        if !table.path.exists() {
            table.truncate()?;
        }
        Ok(table)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn with_lock<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Self) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| anyhow!("Table lock poisoned for {}: {}", self.path.display(), e))?;
        f(self)
    }

    /// Read every row in file order.
    pub fn read<R: DeserializeOwned>(&self) -> Result<Vec<R>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<R>, _>>()
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(rows)
    }

    /// Replace the file contents with the header followed by `rows`.
    ///
    /// Writes to a sibling temp file and renames it into place so a crash
    /// mid-write leaves the previous contents intact.
    pub fn rewrite<R: Serialize>(&self, rows: &[R]) -> Result<()> {
        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp_path)
                .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
            writer.write_record(self.columns)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    /// Drop every row, keeping the header.
    pub fn truncate(&self) -> Result<()> {
        self.rewrite::<()>(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        a: String,
        #[serde(default)]
        b: String,
    }

    #[test]
    fn open_writes_header_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path().join("t.csv"), &["a", "b"]).unwrap();

        let contents = std::fs::read_to_string(table.path()).unwrap();
        assert_eq!(contents, "a,b\n");
        assert!(table.read::<Row>().unwrap().is_empty());
    }

    #[test]
    fn rewrite_preserves_order_and_quotes_commas() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path().join("t.csv"), &["a", "b"]).unwrap();

        let rows = vec![
            Row { a: "first".into(), b: "x".into() },
            Row { a: "hello, world".into(), b: "line\nbreak".into() },
        ];
        table.with_lock(|t| t.rewrite(&rows)).unwrap();

        let back: Vec<Row> = table.read().unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn short_records_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "a,b\nonly\nboth,set\n").unwrap();
        let table = Table::open(path, &["a", "b"]).unwrap();

        let rows: Vec<Row> = table.read().unwrap();
        assert_eq!(rows[0], Row { a: "only".into(), b: String::new() });
        assert_eq!(rows[1], Row { a: "both".into(), b: "set".into() });
    }

    #[test]
    fn truncate_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path().join("t.csv"), &["a", "b"]).unwrap();
        table
            .rewrite(&[Row { a: "1".into(), b: "2".into() }])
            .unwrap();

        table.truncate().unwrap();

        assert_eq!(std::fs::read_to_string(table.path()).unwrap(), "a,b\n");
    }
}
