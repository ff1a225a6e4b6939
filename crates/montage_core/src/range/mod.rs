//! Selection range parsing for partial runs.
//!
//! Users pick files out of the processing order with compact
//! expressions like `1,3,5-7` or `3-`. This module expands those
//! expressions into concrete 1-based indices and renders the short
//! indicator that partial outputs carry in their file names.
//!
//! # Example
//!
//! ```ignore
//! use montage_core::range::{parse_range, format_range_indicator};
//!
//! let picked = parse_range("1,3,5-7", 10)?;
//! assert_eq!(picked, vec![1, 3, 5, 6, 7]);
//!
//! let tag = format_range_indicator("1-5", "M", 10)?;
//! assert_eq!(tag, "M1_5");
//! ```

use thiserror::Error;

/// Errors produced while interpreting a selection expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// A token in the expression is malformed.
    #[error("Invalid selection token '{token}': {reason}")]
    Syntax { token: String, reason: String },

    /// The expression is well-formed but selects nothing.
    #[error("Selection '{expr}' matches no files (valid indices are 1-{max_index})")]
    Bounds { expr: String, max_index: usize },
}

impl RangeError {
    pub fn syntax(token: impl Into<String>, reason: impl Into<String>) -> Self {
        RangeError::Syntax {
            token: token.into(),
            reason: reason.into(),
        }
    }

    pub fn bounds(expr: impl Into<String>, max_index: usize) -> Self {
        RangeError::Bounds {
            expr: expr.into(),
            max_index,
        }
    }
}

/// Parse a selection expression into sorted, deduplicated indices.
///
/// The expression is a comma-separated list of tokens, each one of:
///
/// * a single index (`5`),
/// * a closed range `a-b` with `a <= b`,
/// * an open range `a-` running to `max_index`.
///
/// Indices above `max_index` are clamped down to it; an index below 1
/// is rejected. The result is ascending with duplicates removed.
pub fn parse_range(expr: &str, max_index: usize) -> Result<Vec<usize>, RangeError> {
    let mut indices = expand_tokens(expr, max_index)?;
    if indices.is_empty() {
        return Err(RangeError::bounds(expr.trim(), max_index));
    }
    indices.sort_unstable();
    Ok(indices)
}

/// Render the file-name indicator for a partial run.
///
/// A contiguous selection becomes `{tag}{first}_{last}`; anything with
/// gaps keeps the picked indices as given, comma-joined after the tag.
/// The expression is validated exactly as [`parse_range`] does.
pub fn format_range_indicator(
    expr: &str,
    tag: &str,
    max_index: usize,
) -> Result<String, RangeError> {
    let picked = expand_tokens(expr, max_index)?;
    if picked.is_empty() {
        return Err(RangeError::bounds(expr.trim(), max_index));
    }

    let mut sorted = picked.clone();
    sorted.sort_unstable();
    let contiguous = sorted.windows(2).all(|pair| pair[1] == pair[0] + 1);

    if contiguous {
        Ok(format!("{}{}_{}", tag, sorted[0], sorted[sorted.len() - 1]))
    } else {
        let joined = picked
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Ok(format!("{}{}", tag, joined))
    }
}

/// Expand an expression into indices in first-occurrence order.
fn expand_tokens(expr: &str, max_index: usize) -> Result<Vec<usize>, RangeError> {
    if expr.trim().is_empty() {
        return Err(RangeError::bounds(expr.trim(), max_index));
    }

    let mut picked: Vec<usize> = Vec::new();
    let mut push = |index: usize, picked: &mut Vec<usize>| {
        if !picked.contains(&index) {
            picked.push(index);
        }
    };

    for raw in expr.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            return Err(RangeError::syntax(raw.trim(), "empty token"));
        }

        match token.split_once('-') {
            None => {
                let index = parse_index(token, token)?;
                push(index.min(max_index), &mut picked);
            }
            Some((start, "")) => {
                let start = parse_index(token, start)?;
                for index in start.min(max_index)..=max_index {
                    push(index, &mut picked);
                }
            }
            Some((start, end)) => {
                let start = parse_index(token, start)?;
                let end = parse_index(token, end)?;
                if start > end {
                    return Err(RangeError::syntax(token, "range runs backwards"));
                }
                for index in start.min(max_index)..=end.min(max_index) {
                    push(index, &mut picked);
                }
            }
        }
    }

    Ok(picked)
}

fn parse_index(token: &str, part: &str) -> Result<usize, RangeError> {
    let part = part.trim();
    if part.is_empty() {
        return Err(RangeError::syntax(token, "missing index"));
    }
    let index: usize = part
        .parse()
        .map_err(|_| RangeError::syntax(token, "not a number"))?;
    if index < 1 {
        return Err(RangeError::syntax(token, "indices start at 1"));
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_singles_and_ranges() {
        assert_eq!(parse_range("1,3,5-7", 10).unwrap(), vec![1, 3, 5, 6, 7]);
    }

    #[test]
    fn open_range_runs_to_max() {
        assert_eq!(parse_range("3-", 10).unwrap(), vec![3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn clamps_indices_above_max() {
        assert_eq!(parse_range("15", 10).unwrap(), vec![10]);
        assert_eq!(parse_range("8-15", 10).unwrap(), vec![8, 9, 10]);
    }

    #[test]
    fn deduplicates_and_sorts() {
        assert_eq!(parse_range("5,1,3,1", 10).unwrap(), vec![1, 3, 5]);
        assert_eq!(parse_range("2-4,3-5", 10).unwrap(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn tolerates_whitespace_around_tokens() {
        assert_eq!(parse_range(" 1 , 3 ", 10).unwrap(), vec![1, 3]);
    }

    #[test]
    fn rejects_backwards_range() {
        let err = parse_range("7-3", 10).unwrap_err();
        assert!(matches!(err, RangeError::Syntax { .. }));
        assert!(err.to_string().contains("backwards"));
    }

    #[test]
    fn rejects_zero_index() {
        assert!(matches!(
            parse_range("0", 10),
            Err(RangeError::Syntax { .. })
        ));
        assert!(matches!(
            parse_range("0-3", 10),
            Err(RangeError::Syntax { .. })
        ));
    }

    #[test]
    fn rejects_garbage_tokens() {
        assert!(matches!(
            parse_range("abc", 10),
            Err(RangeError::Syntax { .. })
        ));
        assert!(matches!(
            parse_range("1,,3", 10),
            Err(RangeError::Syntax { .. })
        ));
        assert!(matches!(
            parse_range("-3", 10),
            Err(RangeError::Syntax { .. })
        ));
    }

    #[test]
    fn empty_expression_selects_nothing() {
        assert!(matches!(
            parse_range("", 10),
            Err(RangeError::Bounds { .. })
        ));
        assert!(matches!(
            parse_range("   ", 10),
            Err(RangeError::Bounds { .. })
        ));
    }

    #[test]
    fn contiguous_selection_renders_first_last() {
        assert_eq!(format_range_indicator("1-5", "M", 10).unwrap(), "M1_5");
        assert_eq!(format_range_indicator("2,3,4", "R", 10).unwrap(), "R2_4");
    }

    #[test]
    fn gapped_selection_keeps_original_indices() {
        assert_eq!(format_range_indicator("1,3,5", "R", 10).unwrap(), "R1,3,5");
        assert_eq!(format_range_indicator("5,1,3", "R", 10).unwrap(), "R5,1,3");
    }

    #[test]
    fn single_index_is_contiguous() {
        assert_eq!(format_range_indicator("4", "M", 10).unwrap(), "M4_4");
    }

    #[test]
    fn indicator_validates_like_parse() {
        assert!(format_range_indicator("7-3", "M", 10).is_err());
        assert!(format_range_indicator("", "M", 10).is_err());
    }
}
