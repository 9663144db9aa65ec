//! # sheetcalc-formula
//!
//! Formula engine for sheetcalc.
//!
//! This crate provides:
//! - Formula tokenizing and parsing (text → tokens → AST)
//! - Formula evaluation (AST → value) against a workbook
//! - Shared-formula expansion for follower cells
//! - Bounded iterative calculation for circular references
//! - A small table of built-in functions
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc_core::Workbook;
//! use sheetcalc_formula::{evaluate_formula, CalcContext, CellKey, EvaluationContext, FormulaValue};
//!
//! let wb = Workbook::new();
//! wb.worksheet(0).unwrap().set_cell_value("A1", 2.0).unwrap();
//!
//! let calc = CalcContext::new(CellKey::new(0, 0, 1), 100);
//! let ctx = EvaluationContext::new(Some(&wb), 0, 0, 1).with_calc(&calc);
//! assert_eq!(evaluate_formula("=A1+3", &ctx).unwrap(), FormulaValue::Number(5.0));
//! ```

pub mod ast;
pub mod calc_context;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod shared;
pub mod tokenizer;
pub mod value;

pub use ast::{
    BinaryOperator, CellReference, FormulaExpr, RangeReference, Reference, UnaryOperator,
};
pub use calc_context::{CalcContext, CellKey, DEFAULT_MAX_DEPTH};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    evaluate, evaluate_formula, evaluate_tokens, formula_text_at, EvaluationContext,
};
pub use parser::{parse_formula, parse_tokens};
pub use shared::{resolve_shared_formula, shift_shared_formula};
pub use tokenizer::{tokenize, Token};
pub use value::FormulaValue;
