//! Built-in spreadsheet functions
//!
//! Functions receive already evaluated arguments. Spreadsheet errors are
//! returned as [`FormulaValue::Error`]; an `Err` from an implementation is
//! turned into `#VALUE!` by the evaluator.

pub mod logical;
pub mod math;
pub mod text;

use ahash::AHashMap;
use once_cell::sync::Lazy;

use crate::error::FormulaResult;
use crate::value::FormulaValue;

/// Function implementation signature
pub type FunctionImpl = fn(&[FormulaValue]) -> FormulaResult<FormulaValue>;

/// Function definition
#[derive(Clone, Copy)]
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    pub const fn new(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            implementation,
        }
    }

    /// Whether `count` arguments are acceptable
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
}

static REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::new);

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        for def in math::FUNCTIONS
            .iter()
            .chain(logical::FUNCTIONS)
            .chain(text::FUNCTIONS)
        {
            registry.register(*def);
        }

        registry
    }

    /// The process-wide registry of built-in functions
    pub fn global() -> &'static FunctionRegistry {
        &REGISTRY
    }

    /// Look up a function by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name.to_ascii_uppercase().as_str())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// First error among the arguments, descending into arrays
pub(crate) fn first_error(args: &[FormulaValue]) -> Option<FormulaValue> {
    let mut found = None;
    for arg in args {
        arg.for_each_scalar(&mut |v| {
            if found.is_none() && v.is_error() {
                found = Some(v.clone());
            }
        });
        if found.is_some() {
            break;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::global();
        assert!(registry.get("sum").is_some());
        assert!(registry.get("Concatenate").is_some());
        assert!(registry.get("NOPE").is_none());
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_arity() {
        let round = FunctionRegistry::global().get("ROUND").unwrap();
        assert!(!round.accepts(0));
        assert!(round.accepts(1));
        assert!(round.accepts(2));
        assert!(!round.accepts(3));
        assert!(FunctionRegistry::global().get("SUM").unwrap().accepts(255));
    }
}
