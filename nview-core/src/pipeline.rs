//! End-to-end run: scan files in, delimited text out

use crate::collect::collect;
use crate::config::Config;
use crate::error::Result;
use crate::filter::Filter;
use crate::table::build;
use tracing::debug;

/// Runs the whole pipeline and returns the output text
///
/// The filter is parsed before any file is read. Nothing is written; the
/// caller prints the returned text once.
///
/// # Errors
///
/// Any [`Error`](crate::Error) from filter parsing, file collection or
/// serialization; no partial output is produced.
pub fn run(config: &Config) -> Result<String> {
    let filter = config
        .filter
        .as_deref()
        .map(|expr| Filter::parse(expr, &config.data_columns))
        .transpose()?;

    let rows = collect(&config.files, &config.extract)?;
    debug!(
        "collected {} row(s) from {} file(s)",
        rows.len(),
        config.files.len()
    );

    build(
        rows,
        &config.data_columns,
        &config.view_columns,
        filter.as_ref(),
        config.csv_separator,
    )
}
