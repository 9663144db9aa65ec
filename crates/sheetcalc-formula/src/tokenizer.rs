//! Formula tokenizer
//!
//! Turns formula source text into a flat token stream. The leading `=` is
//! optional. Whitespace between tokens is dropped.

use crate::error::{FormulaError, FormulaResult};
use sheetcalc_core::CellError;

/// A formula token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    // Identifiers and references
    /// Function name or defined name
    Identifier(String),
    /// Cell reference like `A1` or `$A$1`, text kept as written
    CellRef(String),
    /// Sheet qualifier like `Sheet1!`, quotes removed
    SheetRef(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,
    Semicolon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
}

/// Split formula text into tokens
///
/// Returns an empty vector for `""` or `"="`.
///
/// # Example
/// ```rust
/// use sheetcalc_formula::{tokenize, Token};
///
/// let tokens = tokenize("=A1+3").unwrap();
/// assert_eq!(
///     tokens,
///     vec![Token::CellRef("A1".into()), Token::Plus, Token::Number(3.0)]
/// );
/// ```
pub fn tokenize(formula: &str) -> FormulaResult<Vec<Token>> {
    let formula = formula.trim();
    let body = formula.strip_prefix('=').unwrap_or(formula);

    let mut scanner = Scanner { input: body, pos: 0 };
    let mut tokens = Vec::new();
    while let Some(token) = scanner.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn next_token(&mut self) -> FormulaResult<Option<Token>> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(None),
        };

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '{' => Some(Token::LeftBrace),
            '}' => Some(Token::RightBrace),
            '=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(Some(token));
        }

        let token = match c {
            '<' => {
                self.advance();
                match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        Token::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEqual
                    }
                    _ => Token::LessThan,
                }
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    Token::GreaterEqual
                } else {
                    Token::GreaterThan
                }
            }
            '"' => self.scan_string()?,
            '\'' => self.scan_quoted_sheet()?,
            '#' => self.scan_error()?,
            c if c.is_ascii_digit()
                || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())) =>
            {
                self.scan_number()?
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => self.scan_identifier_or_ref(),
            other => {
                return Err(FormulaError::Parse(format!(
                    "Unexpected character '{}' at offset {}",
                    other, self.pos
                )))
            }
        };

        Ok(Some(token))
    }

    fn scan_string(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') if self.peek_char_at(1) == Some('"') => {
                    s.push('"');
                    self.advance();
                    self.advance();
                }
                Some('"') => {
                    self.advance();
                    return Ok(Token::String(s));
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => {
                    return Err(FormulaError::Parse(format!(
                        "Unterminated string starting at offset {}",
                        start
                    )))
                }
            }
        }
    }

    /// `'My Sheet'!` style qualifier; `''` inside the quotes is a literal quote
    fn scan_quoted_sheet(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance();

        let mut name = String::new();
        loop {
            match self.peek_char() {
                Some('\'') if self.peek_char_at(1) == Some('\'') => {
                    name.push('\'');
                    self.advance();
                    self.advance();
                }
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
                None => {
                    return Err(FormulaError::Parse(format!(
                        "Unterminated sheet name starting at offset {}",
                        start
                    )))
                }
            }
        }

        if self.peek_char() != Some('!') {
            return Err(FormulaError::Parse(format!(
                "Expected '!' after sheet name '{}'",
                name
            )));
        }
        self.advance();
        Ok(Token::SheetRef(name))
    }

    fn scan_error(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance();
        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '/' || c == '_'
        }) {
            self.advance();
        }
        // Closing '!' or '?' belongs to the literal
        if matches!(self.peek_char(), Some('!') | Some('?')) {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        CellError::parse(text)
            .map(Token::Error)
            .ok_or_else(|| FormulaError::Parse(format!("Unknown error literal '{}'", text)))
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        self.skip_digits();
        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }

        // Exponent only when digits follow, so `1E` stays an error below
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_char_at(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self
                .peek_char_at(digit_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..digit_at {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let text = &self.input[start..self.pos];
        text.parse()
            .map(Token::Number)
            .map_err(|_| FormulaError::Parse(format!("Invalid number '{}'", text)))
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        let start = self.pos;
        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
        }) {
            self.advance();
        }
        let text = &self.input[start..self.pos];

        if self.peek_char() == Some('!') {
            self.advance();
            return Token::SheetRef(text.to_string());
        }

        // A following '(' makes it a function call (LOG10(100), TRUE())
        let is_call = self.peek_char() == Some('(');
        if !is_call {
            if text.eq_ignore_ascii_case("TRUE") {
                return Token::Boolean(true);
            }
            if text.eq_ignore_ascii_case("FALSE") {
                return Token::Boolean(false);
            }
            if is_cell_reference(text) {
                return Token::CellRef(text.to_string());
            }
        }

        Token::Identifier(text.to_string())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, char::is_whitespace) {
            self.advance();
        }
    }
}

/// `[$]LETTERS[$]DIGITS` with nothing else around it
pub(crate) fn is_cell_reference(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;

    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }
    let letters = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == letters {
        return false;
    }

    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }
    let digits = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }

    i > digits && i == bytes.len()
}
