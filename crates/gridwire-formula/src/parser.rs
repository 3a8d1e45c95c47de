//! Formula parser
//!
//! A recursive descent parser for spreadsheet formulas with proper operator
//! precedence. Input is the formula source without its leading `=` marker.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use gridwire_core::{CellAddress, CellError, CellRange};

/// Parse formula source (marker already stripped) into an AST
///
/// # Example
/// ```rust
/// use gridwire_formula::parse_formula;
///
/// let ast = parse_formula("1+2").unwrap();
/// let ast = parse_formula("SUM(A1:A10)").unwrap();
/// let ast = parse_formula("IF(A1>0,\"Yes\",\"No\")").unwrap();
/// ```
pub fn parse_formula(source: &str) -> FormulaResult<FormulaExpr> {
    let mut parser = FormulaParser::new(source);

    if matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse("Empty formula".into()));
    }

    let expr = parser.parse_expression()?;

    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    // Identifiers and references
    Identifier(String),
    CellRef(String),

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

    // Delimiters
    LeftParen,
    RightParen,

    Unknown(char),
    Eof,
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.current_token = self.scan_token();
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Token::Eof,
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
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        match c {
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
            '"' => self.scan_string(),
            c if c.is_ascii_digit()
                || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())) =>
            {
                self.scan_number()
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' || c == '#' => {
                self.scan_identifier_or_ref()
            }
            other => {
                self.advance();
                Token::Unknown(other)
            }
        }
    }

    fn scan_string(&mut self) -> Token {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                // Escaped quote ("")
                if self.peek_char_at(1) == Some('"') {
                    s.push('"');
                    self.advance();
                    self.advance();
                } else {
                    break;
                }
            } else {
                s.push(c);
                self.advance();
            }
        }

        if self.peek_char() == Some('"') {
            self.advance();
        }

        Token::String(s)
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse() {
            Ok(n) => Token::Number(n),
            Err(_) => Token::Identifier(num_str.to_string()),
        }
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        // Error literals (#VALUE!, #REF!, etc.)
        if self.peek_char() == Some('#') {
            let start = self.pos;
            self.advance();
            while self.peek_char().map_or(false, |c| {
                c.is_ascii_alphanumeric() || c == '!' || c == '/' || c == '?'
            }) {
                self.advance();
            }
            let error_str = &self.input[start..self.pos];
            return match CellError::parse(error_str) {
                Some(err) => Token::Error(err),
                None => Token::Identifier(error_str.to_string()),
            };
        }

        let start = self.pos;
        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
        }) {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        let is_call = self.peek_char() == Some('(');

        // TRUE/FALSE are literals unless called as functions
        if !is_call {
            if text.eq_ignore_ascii_case("TRUE") {
                return Token::Boolean(true);
            }
            if text.eq_ignore_ascii_case("FALSE") {
                return Token::Boolean(false);
            }
            if Self::is_cell_reference(text) {
                return Token::CellRef(text.to_string());
            }
        }

        Token::Identifier(text.to_string())
    }

    fn is_cell_reference(text: &str) -> bool {
        // [$]letters[$]digits
        let rest = text.strip_prefix('$').unwrap_or(text);
        let letters = rest.chars().take_while(|c| c.is_ascii_alphabetic()).count();
        if letters == 0 {
            return false;
        }
        let rest = &rest[letters..];
        let rest = rest.strip_prefix('$').unwrap_or(rest);
        !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
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

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> Token {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^
    // 6. Unary: -, %
    // 7. Range: :
    // 8. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            let right = self.parse_concatenation()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;

        while matches!(self.current_token(), Token::Ampersand) {
            self.consume();
            let right = self.parse_additive()?;
            left = binary(BinaryOperator::Concat, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_exponent()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_unary()?;

        if matches!(self.current_token(), Token::Caret) {
            self.consume();
            let right = self.parse_exponent()?; // Right associative
            return Ok(binary(BinaryOperator::Power, left, right));
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        if matches!(self.current_token(), Token::Minus) {
            self.consume();
            let operand = self.parse_unary()?;
            return Ok(FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        if matches!(self.current_token(), Token::Plus) {
            self.consume();
            return self.parse_unary();
        }

        let mut expr = self.parse_range()?;

        while matches!(self.current_token(), Token::Percent) {
            self.consume();
            expr = FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(expr),
            };
        }

        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if !matches!(self.current_token(), Token::Colon) {
            return Ok(left);
        }

        self.consume();
        let right = self.parse_primary()?;

        match (left, right) {
            (FormulaExpr::CellRef(start), FormulaExpr::CellRef(end)) => {
                Ok(FormulaExpr::RangeRef(CellRange::new(start, end)))
            }
            _ => Err(FormulaError::Parse(
                "Range operator requires cell references on both sides".into(),
            )),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.consume() {
            Token::Number(n) => Ok(FormulaExpr::Number(n)),
            Token::String(s) => Ok(FormulaExpr::String(s)),
            Token::Boolean(b) => Ok(FormulaExpr::Boolean(b)),
            Token::Error(e) => Ok(FormulaExpr::Error(e)),

            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::CellRef(ref_str) => parse_cell_reference(&ref_str),

            Token::Identifier(name) => {
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::NameRef(name))
                }
            }

            other => Err(FormulaError::Parse(format!("Unexpected token: {:?}", other))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
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

fn parse_cell_reference(ref_str: &str) -> FormulaResult<FormulaExpr> {
    // Absolute markers carry no meaning without copy/fill
    let clean_ref = ref_str.replace('$', "");
    let address = CellAddress::parse(&clean_ref).map_err(|e| {
        FormulaError::Parse(format!("Invalid cell reference '{}': {}", ref_str, e))
    })?;

    Ok(FormulaExpr::CellRef(address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(s: &str) -> FormulaExpr {
        FormulaExpr::CellRef(CellAddress::parse(s).unwrap())
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("42").unwrap(), FormulaExpr::Number(42.0));
        assert_eq!(parse_formula("3.25").unwrap(), FormulaExpr::Number(3.25));
        assert_eq!(parse_formula("1e3").unwrap(), FormulaExpr::Number(1000.0));
        assert_eq!(parse_formula(".5").unwrap(), FormulaExpr::Number(0.5));
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(
            parse_formula("\"Hello\"").unwrap(),
            FormulaExpr::String("Hello".into())
        );
        assert_eq!(
            parse_formula("\"Say \"\"hi\"\"\"").unwrap(),
            FormulaExpr::String("Say \"hi\"".into())
        );
    }

    #[test]
    fn test_parse_boolean_and_error() {
        assert_eq!(parse_formula("TRUE").unwrap(), FormulaExpr::Boolean(true));
        assert_eq!(parse_formula("false").unwrap(), FormulaExpr::Boolean(false));
        assert_eq!(
            parse_formula("#DIV/0!").unwrap(),
            FormulaExpr::Error(CellError::Div0)
        );
    }

    #[test]
    fn test_parse_arithmetic() {
        assert_eq!(
            parse_formula("A1+B1").unwrap(),
            binary(BinaryOperator::Add, cell("A1"), cell("B1"))
        );

        // Multiplication binds tighter than addition
        assert_eq!(
            parse_formula("1+2*3").unwrap(),
            binary(
                BinaryOperator::Add,
                FormulaExpr::Number(1.0),
                binary(
                    BinaryOperator::Multiply,
                    FormulaExpr::Number(2.0),
                    FormulaExpr::Number(3.0)
                )
            )
        );
    }

    #[test]
    fn test_parse_power_is_right_associative() {
        assert_eq!(
            parse_formula("2^3^2").unwrap(),
            binary(
                BinaryOperator::Power,
                FormulaExpr::Number(2.0),
                binary(
                    BinaryOperator::Power,
                    FormulaExpr::Number(3.0),
                    FormulaExpr::Number(2.0)
                )
            )
        );
    }

    #[test]
    fn test_parse_comparison_and_concat() {
        assert_eq!(
            parse_formula("A1<>B1").unwrap(),
            binary(BinaryOperator::NotEqual, cell("A1"), cell("B1"))
        );
        assert_eq!(
            parse_formula("A1&\"x\"").unwrap(),
            binary(
                BinaryOperator::Concat,
                cell("A1"),
                FormulaExpr::String("x".into())
            )
        );
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(
            parse_formula("-A1").unwrap(),
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(cell("A1")),
            }
        );
        assert_eq!(
            parse_formula("50%").unwrap(),
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(FormulaExpr::Number(50.0)),
            }
        );
    }

    #[test]
    fn test_parse_cell_reference() {
        assert_eq!(parse_formula("c3").unwrap(), cell("C3"));
        assert_eq!(parse_formula("$B$2").unwrap(), cell("B2"));
    }

    #[test]
    fn test_parse_range_reference() {
        assert_eq!(
            parse_formula("A1:A3").unwrap(),
            FormulaExpr::RangeRef(CellRange::parse("A1:A3").unwrap())
        );
        assert!(parse_formula("A1:3").is_err());
    }

    #[test]
    fn test_parse_function() {
        assert_eq!(
            parse_formula("sum(A1:A3, 4)").unwrap(),
            FormulaExpr::Function {
                name: "SUM".into(),
                args: vec![
                    FormulaExpr::RangeRef(CellRange::parse("A1:A3").unwrap()),
                    FormulaExpr::Number(4.0),
                ],
            }
        );
        assert_eq!(
            parse_formula("NOW()").unwrap(),
            FormulaExpr::Function {
                name: "NOW".into(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_parse_name_ref() {
        assert_eq!(
            parse_formula("total").unwrap(),
            FormulaExpr::NameRef("total".into())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_formula(""), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_formula("   "), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_formula("1+"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_formula("(1+2"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_formula("1 2"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_formula("A1@B1"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_formula("SUM(1,"), Err(FormulaError::Parse(_))));
    }

    #[test]
    fn test_references_in_order() {
        let ast = parse_formula("A1+SUM(B1:B2)*C3").unwrap();
        let refs: Vec<String> = ast.references().iter().map(|a| a.to_string()).collect();
        assert_eq!(refs, vec!["A1", "B1", "B2", "C3"]);
    }
}
