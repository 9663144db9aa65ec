//! Formula parser
//!
//! A recursive descent parser over the token stream produced by
//! [`tokenize`], with spreadsheet operator precedence.

use crate::ast::{BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::tokenizer::{tokenize, Token};
use sheetcalc_core::{CellAddress, CellRange};

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use sheetcalc_formula::parse_formula;
///
/// assert!(parse_formula("=1+2").is_ok());
/// assert!(parse_formula("=SUM(A1:A10)").is_ok());
/// assert!(parse_formula("=IF(A1>0,\"Yes\",\"No\")").is_ok());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    parse_tokens(&tokenize(formula)?)
}

/// Parse an already tokenized formula
///
/// An empty token stream is [`FormulaError::EmptyFormula`].
pub fn parse_tokens(tokens: &[Token]) -> FormulaResult<FormulaExpr> {
    if tokens.is_empty() {
        return Err(FormulaError::EmptyFormula);
    }

    let mut parser = FormulaParser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;

    if let Some(extra) = parser.current() {
        return Err(FormulaError::Parse(format!(
            "Unexpected token after expression: {:?}",
            extra
        )));
    }

    Ok(expr)
}

struct FormulaParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> FormulaParser<'a> {
    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, expected: &Token) -> bool {
        self.current() == Some(expected)
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.check(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Lowest to highest:
    // comparison, concatenation, additive, multiplicative, exponent,
    // unary/percent, range, primary

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current() {
                Some(Token::Equal) => BinaryOperator::Equal,
                Some(Token::NotEqual) => BinaryOperator::NotEqual,
                Some(Token::LessThan) => BinaryOperator::LessThan,
                Some(Token::LessEqual) => BinaryOperator::LessEqual,
                Some(Token::GreaterThan) => BinaryOperator::GreaterThan,
                Some(Token::GreaterEqual) => BinaryOperator::GreaterEqual,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_concatenation()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;

        while self.check(&Token::Ampersand) {
            self.pos += 1;
            let right = self.parse_additive()?;
            left = binary(BinaryOperator::Concat, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current() {
                Some(Token::Plus) => BinaryOperator::Add,
                Some(Token::Minus) => BinaryOperator::Subtract,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current() {
                Some(Token::Star) => BinaryOperator::Multiply,
                Some(Token::Slash) => BinaryOperator::Divide,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_exponent()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_unary()?;

        if self.check(&Token::Caret) {
            self.pos += 1;
            let right = self.parse_exponent()?; // right associative
            return Ok(binary(BinaryOperator::Power, left, right));
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current() {
            Some(Token::Minus) => {
                self.pos += 1;
                let operand = self.parse_unary()?;
                return Ok(FormulaExpr::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                });
            }
            Some(Token::Plus) => {
                self.pos += 1;
                return self.parse_unary();
            }
            _ => {}
        }

        let mut expr = self.parse_range()?;
        while self.check(&Token::Percent) {
            self.pos += 1;
            expr = FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(expr),
            };
        }

        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if !self.check(&Token::Colon) {
            return Ok(left);
        }
        self.pos += 1;
        let right = self.parse_primary()?;

        match (left, right) {
            (FormulaExpr::CellRef(start), FormulaExpr::CellRef(end)) => {
                // `Sheet1!A1:B2` qualifies only the first corner
                let sheet = match (start.sheet, end.sheet) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(FormulaError::Parse(
                            "Range references must be on the same sheet".into(),
                        ))
                    }
                    (a, b) => a.or(b),
                };
                Ok(FormulaExpr::RangeRef(RangeReference {
                    sheet,
                    range: CellRange::new(start.address, end.address),
                }))
            }
            _ => Err(FormulaError::Parse(
                "Range operator ':' needs cell references on both sides".into(),
            )),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        let token = self
            .consume()
            .ok_or_else(|| FormulaError::Parse("Unexpected end of formula".into()))?;

        match token {
            Token::Number(n) => Ok(FormulaExpr::Number(*n)),
            Token::String(s) => Ok(FormulaExpr::String(s.clone())),
            Token::Boolean(b) => Ok(FormulaExpr::Boolean(*b)),
            Token::Error(e) => Ok(FormulaExpr::Error(*e)),

            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::LeftBrace => self.parse_array(),

            Token::SheetRef(sheet) => match self.consume() {
                Some(Token::CellRef(text)) => cell_reference(Some(sheet.clone()), text),
                other => Err(FormulaError::Parse(format!(
                    "Expected cell reference after sheet '{}', got {:?}",
                    sheet, other
                ))),
            },

            Token::CellRef(text) => cell_reference(None, text),

            Token::Identifier(name) => {
                if self.check(&Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::NameRef(name.clone()))
                }
            }

            other => Err(FormulaError::Parse(format!("Unexpected token: {:?}", other))),
        }
    }

    fn parse_array(&mut self) -> FormulaResult<FormulaExpr> {
        let mut rows = Vec::new();
        let mut current_row = Vec::new();

        if !self.check(&Token::RightBrace) {
            current_row.push(self.parse_expression()?);

            loop {
                match self.current() {
                    Some(Token::Comma) => {
                        self.pos += 1;
                        current_row.push(self.parse_expression()?);
                    }
                    Some(Token::Semicolon) => {
                        self.pos += 1;
                        rows.push(std::mem::take(&mut current_row));
                        current_row.push(self.parse_expression()?);
                    }
                    Some(Token::RightBrace) => break,
                    _ => {
                        return Err(FormulaError::Parse(
                            "Expected ',' ';' or '}' in array".into(),
                        ))
                    }
                }
            }
        }

        if !current_row.is_empty() {
            rows.push(current_row);
        }

        self.expect(&Token::RightBrace)?;
        Ok(FormulaExpr::Array(rows))
    }

    fn parse_function_call(&mut self, name: &str) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();
        if !self.check(&Token::RightParen) {
            args.push(self.parse_expression()?);
            while self.check(&Token::Comma) {
                self.pos += 1;
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function {
            name: name.to_uppercase(),
            args,
        })
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn cell_reference(sheet: Option<String>, text: &str) -> FormulaResult<FormulaExpr> {
    let address = CellAddress::parse(text)
        .map_err(|e| FormulaError::Parse(format!("Invalid cell reference '{}': {}", text, e)))?;
    Ok(FormulaExpr::CellRef(CellReference { sheet, address }))
}
