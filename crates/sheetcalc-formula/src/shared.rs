//! Shared formula expansion
//!
//! A shared formula is stored once, on its anchor cell, and replicated over a
//! range. Each follower sees the anchor's template with every relative
//! reference moved by the follower's offset from the anchor.

use crate::error::{FormulaError, FormulaResult};
use crate::tokenizer::is_cell_reference;
use sheetcalc_core::{CellAddress, CellError};

/// Shift the cell references of a shared-formula template
///
/// Returns the rewritten text up to the end of the last reference together
/// with the number of template bytes it covers. Whatever follows is unchanged
/// and is appended by the caller, see [`resolve_shared_formula`].
///
/// Text inside string literals and quoted sheet names, function names, sheet
/// qualifiers and numbers are copied as is. `$`-anchored components keep
/// their position. A reference moved off the grid becomes `#REF!`.
///
/// # Errors
/// [`FormulaError::Coordinate`] when something shaped like a reference does
/// not name a valid cell, e.g. `A0` or `XFE1`.
pub fn shift_shared_formula(
    d_col: i64,
    d_row: i64,
    template: &str,
) -> FormulaResult<(String, usize)> {
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut copied = 0;
    let mut consumed = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            quote @ (b'"' | b'\'') => {
                pos = skip_quoted(bytes, pos, quote);
            }
            b if is_word_byte(b) => {
                let start = pos;
                while pos < bytes.len() && is_word_byte(bytes[pos]) {
                    pos += 1;
                }
                let word = &template[start..pos];
                let next = bytes.get(pos).copied();

                // Sheet qualifiers and function names look like references
                if matches!(next, Some(b'!') | Some(b'(')) || !is_cell_reference(word) {
                    continue;
                }

                let address =
                    CellAddress::parse(word).map_err(|source| FormulaError::Coordinate {
                        reference: word.to_string(),
                        source,
                    })?;

                out.push_str(&template[copied..start]);
                match address.offset(d_col, d_row) {
                    Some(shifted) => out.push_str(&shifted.to_a1_string()),
                    None => out.push_str(CellError::Ref.as_str()),
                }
                copied = pos;
                consumed = pos;
            }
            _ => {
                pos += char_len(bytes[pos]);
            }
        }
    }

    Ok((out, consumed))
}

/// Full formula text of a shared-formula follower
///
/// ```rust
/// use sheetcalc_formula::resolve_shared_formula;
///
/// assert_eq!(resolve_shared_formula(0, 1, "=A1+1").unwrap(), "=A2+1");
/// assert_eq!(resolve_shared_formula(1, 1, "=$A$1*B1").unwrap(), "=$A$1*C2");
/// ```
pub fn resolve_shared_formula(d_col: i64, d_row: i64, template: &str) -> FormulaResult<String> {
    let (mut text, consumed) = shift_shared_formula(d_col, d_row, template)?;
    text.push_str(&template[consumed..]);
    Ok(text)
}

/// Bytes that can appear in a name, reference, or number
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.')
}

/// Index just past a quoted run; doubled quotes are escapes
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut pos = start + 1;
    while pos < bytes.len() {
        if bytes[pos] == quote {
            if bytes.get(pos + 1) == Some(&quote) {
                pos += 2;
                continue;
            }
            return pos + 1;
        }
        pos += 1;
    }
    bytes.len()
}

/// UTF-8 sequence length from its leading byte
fn char_len(lead: u8) -> usize {
    match lead {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}
