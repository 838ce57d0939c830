//! Column selection parsing
//!
//! Users pick columns with a comma separated list. The result always follows
//! schema order, never the order typed on the command line.

use crate::error::{Error, Result};
use crate::types::Column;

/// Parses a comma separated column list against `valid`
///
/// Returns `Ok(None)` for an absent or blank list, meaning "use every column".
/// Whitespace around names is ignored, as are empty entries.
///
/// # Errors
///
/// Returns [`Error::InvalidColumns`] listing, in input order, every name
/// that is not in `valid`.
///
/// # Examples
///
/// ```
/// use nview_core::columns::parse_columns;
/// use nview_core::types::Column;
///
/// let columns = parse_columns(Some("port,address"), &Column::ALL).unwrap();
/// assert_eq!(columns, Some(vec![Column::Address, Column::Port]));
/// ```
pub fn parse_columns(input: Option<&str>, valid: &[Column]) -> Result<Option<Vec<Column>>> {
    let Some(input) = input.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    let tokens: Vec<&str> = input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let invalid: Vec<String> = tokens
        .iter()
        .filter(|t| !valid.iter().any(|c| c.name() == **t))
        .map(|t| t.to_string())
        .collect();
    if !invalid.is_empty() {
        return Err(Error::InvalidColumns(invalid));
    }

    Ok(Some(
        valid
            .iter()
            .copied()
            .filter(|c| tokens.contains(&c.name()))
            .collect(),
    ))
}

/// Resolves the columns to display for the active schema
///
/// Names are validated against the full schema, so asking for `banner` while
/// packing ports is not an error: the column simply is not shown. An empty
/// selection falls back to every active column.
pub fn view_columns(input: Option<&str>, data_columns: &[Column]) -> Result<Vec<Column>> {
    let selected: Vec<Column> = parse_columns(input, &Column::ALL)?
        .unwrap_or_default()
        .into_iter()
        .filter(|c| data_columns.contains(c))
        .collect();

    if selected.is_empty() {
        Ok(data_columns.to_vec())
    } else {
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_order_not_input_order() {
        let columns = parse_columns(Some("port,address"), &Column::ALL).unwrap();
        assert_eq!(columns, Some(vec![Column::Address, Column::Port]));
    }

    #[test]
    fn test_duplicates_removed() {
        let columns = parse_columns(Some("status,port,status"), &Column::ALL).unwrap();
        assert_eq!(columns, Some(vec![Column::Port, Column::Status]));
    }

    #[test]
    fn test_invalid_column_named() {
        let err = parse_columns(Some("bogus"), &Column::ALL).unwrap_err();
        match err {
            Error::InvalidColumns(names) => assert_eq!(names, vec!["bogus"]),
            other => panic!("expected InvalidColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_columns_listed_in_input_order() {
        let err = parse_columns(Some("zeta,port,alpha"), &Column::ALL).unwrap_err();
        assert_eq!(err.to_string(), "Invalid columns: zeta,alpha");
    }

    #[test]
    fn test_absent_or_blank_input_is_none() {
        assert_eq!(parse_columns(None, &Column::ALL).unwrap(), None);
        assert_eq!(parse_columns(Some(""), &Column::ALL).unwrap(), None);
        assert_eq!(parse_columns(Some("  "), &Column::ALL).unwrap(), None);
    }

    #[test]
    fn test_whitespace_and_empty_entries_ignored() {
        let columns = parse_columns(Some(" banner , address,"), &Column::ALL).unwrap();
        assert_eq!(columns, Some(vec![Column::Address, Column::Banner]));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(parse_columns(Some("Address"), &Column::ALL).is_err());
    }

    #[test]
    fn test_view_columns_default_to_active_schema() {
        let packed = Column::data_columns(true);
        assert_eq!(view_columns(None, &packed).unwrap(), packed);
        assert_eq!(
            view_columns(None, &Column::ALL).unwrap(),
            Column::ALL.to_vec()
        );
    }

    #[test]
    fn test_view_columns_drop_banner_when_packing() {
        let packed = Column::data_columns(true);
        assert_eq!(
            view_columns(Some("banner,port"), &packed).unwrap(),
            vec![Column::Port]
        );
        assert_eq!(view_columns(Some("banner"), &packed).unwrap(), packed);
    }

    #[test]
    fn test_view_columns_still_reject_unknown_names() {
        let packed = Column::data_columns(true);
        assert!(matches!(
            view_columns(Some("banner,bogus"), &packed),
            Err(Error::InvalidColumns(_))
        ));
    }
}
