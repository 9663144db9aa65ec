//! Formula descriptors attached to cells

/// How a cell's formula is stored
///
/// Shared formulas are written once on an anchor cell and referenced by index
/// from the other cells of the group. The anchor carries the template text;
/// followers carry an empty string and are expanded on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellFormula {
    /// Formula text stored directly on the cell
    Normal(String),
    /// Member of a shared-formula group
    Shared {
        /// Shared-formula group index
        index: u32,
        /// Template text on the anchor, empty on followers
        text: String,
    },
}

impl CellFormula {
    /// Create a regular formula descriptor
    pub fn normal<S: Into<String>>(text: S) -> Self {
        CellFormula::Normal(text.into())
    }

    /// The text physically stored on this cell
    pub fn text(&self) -> &str {
        match self {
            CellFormula::Normal(text) => text,
            CellFormula::Shared { text, .. } => text,
        }
    }

    /// Shared-formula group index, if this cell belongs to one
    pub fn shared_index(&self) -> Option<u32> {
        match self {
            CellFormula::Shared { index, .. } => Some(*index),
            CellFormula::Normal(_) => None,
        }
    }

    /// Whether this cell physically stores a shared-formula template
    pub fn is_shared_anchor(&self) -> bool {
        matches!(self, CellFormula::Shared { text, .. } if !text.is_empty())
    }
}
