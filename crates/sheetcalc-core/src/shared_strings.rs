//! Workbook-level shared-string table

use ahash::AHashMap;

use crate::cell::SharedString;
use crate::error::{Error, Result};

/// Deduplicated strings referenced by index from cells
///
/// Cells written through the workbook store a [`CellValue::StringIndex`]
/// into this table instead of an inline copy of the text.
///
/// [`CellValue::StringIndex`]: crate::CellValue::StringIndex
#[derive(Debug, Default)]
pub struct SharedStringTable {
    strings: Vec<SharedString>,
    index_map: AHashMap<SharedString, u32>,
}

impl SharedStringTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index of `s`, adding it if it is not in the table yet
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.index_map.get(s) {
            return idx;
        }

        let idx = self.strings.len() as u32;
        let shared = SharedString::new(s);
        self.index_map.insert(shared.clone(), idx);
        self.strings.push(shared);
        idx
    }

    /// Look up a string by index
    pub fn get(&self, index: u32) -> Result<&SharedString> {
        self.strings
            .get(index as usize)
            .ok_or(Error::InvalidSharedString(index, self.strings.len()))
    }

    /// Number of unique strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
