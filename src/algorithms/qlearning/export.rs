//! Plain-text dump of the value tables for offline inspection.
//!
//! Each table is written to its own file as one line per source station,
//! values separated by single spaces, in canonical station order.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::table::QTable;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export target `{}` exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to write table: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes `table` to `path`, replacing any previous content.
pub fn write_table(path: &Path, table: &QTable) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    for row in table.rows().take(table.size()) {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()?;
    Ok(())
}

/// Creates `dir` if needed.
pub fn prepare_directory(dir: &Path) -> Result<(), ExportError> {
    if dir.exists() && !dir.is_dir() {
        return Err(ExportError::NotADirectory(dir.to_path_buf()));
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::StationIdx;

    #[test]
    fn rows_are_space_separated() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = QTable::new(2);
        table.set(StationIdx(0), StationIdx(1), 0.5);
        table.set(StationIdx(1), StationIdx(0), -1.25);

        let path = dir.path().join("t.txt");
        write_table(&path, &table).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "0 0.5\n-1.25 0\n");
    }

    #[test]
    fn empty_table_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        write_table(&path, &QTable::new(0)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            prepare_directory(&file),
            Err(ExportError::NotADirectory(_))
        ));
        let nested = dir.path().join("a").join("b");
        prepare_directory(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
