//! Row collection across scan files
//!
//! All paths are checked up front; a missing file fails the whole run
//! before anything is parsed. Files are then parsed and extracted in the
//! order given.

use crate::error::{Error, Result};
use crate::extract::{extract_all, ExtractOptions};
use crate::scan;
use crate::types::FlatRow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parses every scan file and returns their rows in file order
///
/// # Errors
///
/// - [`Error::FileNotFound`] naming every path that is not an existing file
/// - [`Error::Parse`] if a scan file is malformed
/// - [`Error::ServiceResolution`] if extraction fails for a host
pub fn collect<P: AsRef<Path>>(paths: &[P], options: &ExtractOptions) -> Result<Vec<FlatRow>> {
    let missing: Vec<PathBuf> = paths
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.is_file())
        .map(Path::to_path_buf)
        .collect();
    if !missing.is_empty() {
        return Err(Error::FileNotFound(missing));
    }

    let mut rows = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let hosts = scan::parse_file(path)?;
        let file_rows = extract_all(&hosts, options)?;
        debug!("{}: {} row(s)", path.display(), file_rows.len());
        rows.extend(file_rows);
    }

    Ok(rows)
}
