//! Iterative calculation bookkeeping
//!
//! A [`CalcContext`] lives for one top-level calculation request. It caches
//! the value of every formula cell computed on behalf of that request and
//! counts how often each one was entered, so circular references stop after
//! a bounded number of passes.

use std::cell::{Cell, RefCell};

use ahash::AHashMap;
use sheetcalc_core::CellError;

use crate::error::FormulaResult;
use crate::value::FormulaValue;

/// A cell within a workbook, by sheet index and 0-based position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub sheet: usize,
    pub row: u32,
    pub col: u16,
}

impl CellKey {
    pub fn new(sheet: usize, row: u32, col: u16) -> Self {
        Self { sheet, row, col }
    }
}

/// Nested formula computations allowed before a request yields `#CALC!`
pub const DEFAULT_MAX_DEPTH: u32 = 256;

/// Per-request calculation state
#[derive(Debug)]
pub struct CalcContext {
    entry: CellKey,
    max_iterations: u32,
    max_depth: u32,
    depth: Cell<u32>,
    iterations: RefCell<AHashMap<CellKey, u32>>,
    cache: RefCell<AHashMap<CellKey, FormulaValue>>,
}

impl CalcContext {
    /// Start a request computing `entry`, allowing each referenced formula
    /// cell at most `max_iterations` evaluations
    pub fn new(entry: CellKey, max_iterations: u32) -> Self {
        Self {
            entry,
            max_iterations,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: Cell::new(0),
            iterations: RefCell::new(AHashMap::new()),
            cache: RefCell::new(AHashMap::new()),
        }
    }

    pub fn entry(&self) -> CellKey {
        self.entry
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Limit how many formula computations may be nested inside each other
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of formula computations currently in progress
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    /// How many times `key` has been entered under this request
    pub fn iterations(&self, key: CellKey) -> u32 {
        self.iterations.borrow().get(&key).copied().unwrap_or(0)
    }

    /// Last value computed for `key`, if any
    pub fn cached(&self, key: CellKey) -> Option<FormulaValue> {
        self.cache.borrow().get(&key).cloned()
    }

    /// Value of formula cell `key` as seen by this request
    ///
    /// The entry cell itself yields its `stored` value, i.e. the result of the
    /// previous pass. Other cells are computed once and cached. A cell entered
    /// more than `max_iterations` times stops recursing and yields its last
    /// known value, or `#NUM!` when it never produced one. A computation
    /// that would nest deeper than the depth limit yields `#CALC!` instead.
    pub fn resolve(
        &self,
        key: CellKey,
        stored: impl FnOnce() -> FormulaResult<FormulaValue>,
        compute: impl FnOnce() -> FormulaResult<FormulaValue>,
    ) -> FormulaResult<FormulaValue> {
        if key == self.entry {
            tracing::trace!("self reference to {key:?}, using stored value");
            return stored();
        }

        if let Some(value) = self.cached(key) {
            tracing::trace!("cache hit for {key:?}");
            return Ok(value);
        }

        if self.depth.get() >= self.max_depth {
            tracing::warn!(
                "{key:?} is nested {} formulas deep, stopping",
                self.max_depth
            );
            return Ok(FormulaValue::Error(CellError::Calc));
        }

        let count = {
            let mut iterations = self.iterations.borrow_mut();
            let count = iterations.entry(key).or_insert(0);
            *count += 1;
            *count
        };

        if count > self.max_iterations {
            tracing::warn!(
                "{key:?} exceeded {} calculation passes, stopping",
                self.max_iterations
            );
            return Ok(self
                .cached(key)
                .unwrap_or(FormulaValue::Error(CellError::Num)));
        }

        tracing::trace!("evaluating {key:?}, pass {count}");
        self.depth.set(self.depth.get() + 1);
        let value = compute();
        self.depth.set(self.depth.get() - 1);
        let value = value?;
        self.cache.borrow_mut().insert(key, value.clone());
        Ok(value)
    }
}
