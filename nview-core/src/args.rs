//! CLI argument parsing and validation
//!
//! Parses the nview command line into [`NviewArgs`], validates it and turns
//! it into the immutable [`Config`] the pipeline runs on.
//!
//! Options may appear anywhere on the line. Long options accept
//! `--name value` and `--name=value`; single-letter options may be bundled
//! (`-pd`) and accept an attached value (`-caddress,port`, `-pcport`).
//! Everything after `--` is a scan file.
//!
//! # Examples
//!
//! ```
//! use nview_core::args::NviewArgs;
//!
//! let args = NviewArgs::from_iter_safe(["nview", "-p", "-c", "address,port", "scan.xml"]).unwrap();
//! assert!(args.pack_ports);
//! assert_eq!(args.files.len(), 1);
//! ```

use crate::columns::view_columns;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::ExtractOptions;
use crate::table::DEFAULT_CSV_SEPARATOR;
use crate::types::Column;
use std::path::PathBuf;

/// Default separator between packed ports
pub const DEFAULT_PACK_PORTS_SEPARATOR: char = ',';

/// One-line usage summary
pub const USAGE: &str = "usage: nview [-h] [-V] [-c COLUMNS] [-p] [-f FILTER] \
[--pack-ports-separator CHARACTER] [--csv-separator CHARACTER] [-d] \
NMAP_XML_FILE [NMAP_XML_FILE ...]";

/// Parsed command-line arguments, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NviewArgs {
    /// Columns to print (-c, --columns)
    pub columns: Option<String>,
    /// Pack ports into one field per protocol and state (-p, --pack-ports)
    pub pack_ports: bool,
    /// Row filter expression (-f, --filter)
    pub filter: Option<String>,
    /// Separator between packed ports (--pack-ports-separator)
    pub pack_ports_separator: Option<String>,
    /// Output field separator (--csv-separator)
    pub csv_separator: Option<String>,
    /// Print the cause chain on failure (-d, --debug)
    pub debug: bool,
    /// Print help summary (-h, --help)
    pub help: bool,
    /// Print version number (-V, --version)
    pub version: bool,
    /// Nmap XML files (positional arguments)
    pub files: Vec<PathBuf>,
}

impl NviewArgs {
    /// Parse arguments from a command-line iterator; the first item is the
    /// program name
    pub fn from_iter_safe<I, S>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = iter.into_iter().map(|s| s.as_ref().to_string()).collect();
        if args.is_empty() {
            return Ok(Self::default());
        }
        Self::parse_args(&args[1..])
    }

    fn parse_args(tokens: &[String]) -> Result<Self> {
        let mut args = NviewArgs::default();
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];

            if token == "--" {
                args.files
                    .extend(tokens[i + 1..].iter().map(PathBuf::from));
                break;
            }

            if token.starts_with('-') && token != "-" {
                let cleaned = token.trim_start_matches('-');

                // --name=value
                if let Some((key, value)) = cleaned
                    .split_once('=')
                    .filter(|(key, _)| Self::is_valid_arg(key))
                {
                    if !Self::arg_needs_value(key) {
                        return Err(Error::Usage(format!(
                            "argument {} takes no value",
                            Self::display_name(key)
                        )));
                    }
                    Self::set_arg_value(&mut args, key, Some(value.to_string()))?;
                    i += 1;
                    continue;
                }

                if Self::is_valid_arg(cleaned) {
                    let value = if Self::arg_needs_value(cleaned) {
                        i += 1;
                        Some(Self::take_value(cleaned, tokens.get(i))?)
                    } else {
                        None
                    };
                    Self::set_arg_value(&mut args, cleaned, value)?;
                    i += 1;
                    continue;
                }

                if !token.starts_with("--") {
                    i = Self::parse_short_bundle(&mut args, token, tokens, i)?;
                    continue;
                }

                return Err(Error::Usage(format!("unrecognized argument: {}", token)));
            }

            args.files.push(PathBuf::from(token));
            i += 1;
        }

        Ok(args)
    }

    /// Bundled single-letter options such as `-pd`, `-pcaddress` or
    /// `-pc address`; returns the index of the next unread token
    ///
    /// Flags may be followed by at most one option taking a value, which
    /// consumes the rest of the bundle or else the next token.
    fn parse_short_bundle(
        args: &mut NviewArgs,
        token: &str,
        tokens: &[String],
        index: usize,
    ) -> Result<usize> {
        let bundle = &token[1..];

        for (pos, c) in bundle.char_indices() {
            let key = &bundle[pos..pos + c.len_utf8()];
            if !Self::is_valid_arg(key) {
                return Err(Error::Usage(format!("unrecognized argument: {}", token)));
            }

            if Self::arg_needs_value(key) {
                let rest = &bundle[pos + c.len_utf8()..];
                if rest.is_empty() {
                    let value = Self::take_value(key, tokens.get(index + 1))?;
                    Self::set_arg_value(args, key, Some(value))?;
                    return Ok(index + 2);
                }
                Self::set_arg_value(args, key, Some(rest.to_string()))?;
                return Ok(index + 1);
            }

            Self::set_arg_value(args, key, None)?;
        }

        Ok(index + 1)
    }

    fn take_value(arg: &str, next: Option<&String>) -> Result<String> {
        match next {
            // "-" alone is a legitimate separator value
            Some(value) if value == "-" || !value.starts_with('-') => {
                Ok(value.clone())
            }
            _ => Err(Error::Usage(format!(
                "argument {} expected one argument",
                Self::display_name(arg)
            ))),
        }
    }

    fn display_name(arg: &str) -> String {
        if arg.chars().count() == 1 {
            format!("-{}", arg)
        } else {
            format!("--{}", arg)
        }
    }

    fn arg_needs_value(arg: &str) -> bool {
        matches!(
            arg,
            "c" | "columns" | "f" | "filter" | "pack-ports-separator" | "csv-separator"
        )
    }

    fn is_valid_arg(arg: &str) -> bool {
        matches!(
            arg,
            "c" | "columns"
                | "p"
                | "pack-ports"
                | "f"
                | "filter"
                | "pack-ports-separator"
                | "csv-separator"
                | "d"
                | "debug"
                | "V"
                | "version"
                | "h"
                | "help"
        )
    }

    fn set_arg_value(args: &mut NviewArgs, name: &str, value: Option<String>) -> Result<()> {
        match name {
            "c" | "columns" => args.columns = value,
            "p" | "pack-ports" => args.pack_ports = true,
            "f" | "filter" => args.filter = value,
            "pack-ports-separator" => args.pack_ports_separator = value,
            "csv-separator" => args.csv_separator = value,
            "d" | "debug" => args.debug = true,
            "V" | "version" => args.version = true,
            "h" | "help" => args.help = true,
            _ => {
                return Err(Error::Usage(format!("unrecognized argument: {}", name)));
            }
        }

        Ok(())
    }

    /// Validates the parsed arguments
    ///
    /// # Errors
    ///
    /// - [`Error::Usage`] when no scan file is given
    /// - [`Error::InvalidOption`] when a separator is not exactly one
    ///   character or both separators are equal
    pub fn validate(&self) -> Result<()> {
        if self.help || self.version {
            return Ok(());
        }

        if self.files.is_empty() {
            return Err(Error::Usage(
                "the following arguments are required: NMAP_XML_FILE".to_string(),
            ));
        }

        let csv_separator = self.csv_separator()?;
        let pack_ports_separator = self.pack_ports_separator()?;
        if csv_separator == pack_ports_separator {
            return Err(Error::InvalidOption(
                "--csv-separator and --pack-ports-separator can not be the same!".to_string(),
            ));
        }

        Ok(())
    }

    /// Output field separator, or the default tab
    pub fn csv_separator(&self) -> Result<char> {
        let separator = single_char("--csv-separator", self.csv_separator.as_deref())?
            .unwrap_or(DEFAULT_CSV_SEPARATOR);
        if !separator.is_ascii() {
            return Err(Error::InvalidOption(
                "--csv-separator must be an ASCII character!".to_string(),
            ));
        }
        Ok(separator)
    }

    /// Packed ports separator, or the default comma
    pub fn pack_ports_separator(&self) -> Result<char> {
        Ok(
            single_char("--pack-ports-separator", self.pack_ports_separator.as_deref())?
                .unwrap_or(DEFAULT_PACK_PORTS_SEPARATOR),
        )
    }

    /// Validates and resolves the arguments into a pipeline configuration
    pub fn into_config(self) -> Result<Config> {
        self.validate()?;

        let csv_separator = self.csv_separator()? as u8;
        let extract = ExtractOptions {
            pack_ports: self.pack_ports,
            pack_ports_separator: self.pack_ports_separator()?,
        };
        let data_columns = Column::data_columns(self.pack_ports);
        let view_columns = view_columns(self.columns.as_deref(), &data_columns)?;

        Ok(Config {
            files: self.files,
            data_columns,
            view_columns,
            extract,
            filter: self.filter.filter(|f| !f.trim().is_empty()),
            csv_separator,
            debug: self.debug,
        })
    }
}

/// Exactly one character, or `None` when the option was not given
fn single_char(option: &str, value: Option<&str>) -> Result<Option<char>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Some(c)),
        _ => Err(Error::InvalidOption(format!(
            "{} must be a 1-character string!",
            option
        ))),
    }
}

/// Full help text
pub fn help_text() -> String {
    format!(
        r#"{usage}

View and filter nmap results.

positional arguments:
  NMAP_XML_FILE         One or more nmap xml files to parse

options:
  -h, --help            Show this help message and exit
  -V, --version         Print version number and exit
  -c, --columns COLUMNS
                        Columns to print (default='address,port,protocol,status,banner').
  -p, --pack-ports      Pack ports into single string separated by character (default=',').
  -f, --filter FILTER   Filter results (e.g. 'status == "open" and protocol == "tcp"').
  --pack-ports-separator CHARACTER
                        1-character string which is used to separate packed ports (default=,).
  --csv-separator CHARACTER
                        1-character string which is used to separate columns in the resulting csv (default=\t).
  -d, --debug           Prints additional debug information (e.g. the full error chain).
"#,
        usage = USAGE
    )
}
