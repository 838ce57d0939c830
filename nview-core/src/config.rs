//! Resolved pipeline configuration

use crate::extract::ExtractOptions;
use crate::table::DEFAULT_CSV_SEPARATOR;
use crate::types::Column;
use std::path::PathBuf;

/// Everything one run needs, validated and defaulted
///
/// Built by [`NviewArgs::into_config`](crate::args::NviewArgs::into_config).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Scan files, in processing order
    pub files: Vec<PathBuf>,
    /// Active data-column schema
    pub data_columns: Vec<Column>,
    /// Columns shown in the output, a subset of `data_columns` in schema order
    pub view_columns: Vec<Column>,
    /// Row extraction mode
    pub extract: ExtractOptions,
    /// Row filter expression
    pub filter: Option<String>,
    /// Output field separator
    pub csv_separator: u8,
    /// Print the cause chain on failure
    pub debug: bool,
}

impl Config {
    /// Configuration with default options for `files`
    pub fn new(files: Vec<PathBuf>) -> Self {
        let data_columns = Column::data_columns(false);
        Self {
            files,
            view_columns: data_columns.clone(),
            data_columns,
            extract: ExtractOptions::default(),
            filter: None,
            csv_separator: DEFAULT_CSV_SEPARATOR as u8,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::new(vec![PathBuf::from("scan.xml")]);
        assert_eq!(config.view_columns, Column::ALL.to_vec());
        assert_eq!(config.data_columns, config.view_columns);
        assert_eq!(config.csv_separator, b'\t');
        assert!(!config.extract.pack_ports);
        assert_eq!(config.extract.pack_ports_separator, ',');
    }
}
