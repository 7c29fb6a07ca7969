use super::error::UnitError;
use super::unit::{MAX_EXPONENT, Unit};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Mul,
    Div,
    Pow,
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, UnitError> {
    let parse_error = |reason: String| UnitError::Parse {
        expression: expression.to_string(),
        reason,
    };

    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::Pow);
                    i += 2;
                } else {
                    tokens.push(Token::Mul);
                    i += 1;
                }
            }
            '·' => {
                tokens.push(Token::Mul);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Div);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| parse_error(format!("invalid number '{}'", literal)))?;
                tokens.push(Token::Number(value));
            }
            '-' | '+' => {
                // Only valid as the sign of an exponent.
                if tokens.last() != Some(&Token::Pow) {
                    return Err(parse_error(format!("unexpected '{}'", c)));
                }
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| parse_error(format!("invalid exponent '{}'", literal)))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' || c == 'µ' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                if ident == "per" {
                    tokens.push(Token::Div);
                } else {
                    tokens.push(Token::Ident(ident));
                }
            }
            other => return Err(parse_error(format!("unexpected character '{}'", other))),
        }
    }
    Ok(tokens)
}

struct Parser<'a, F> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    resolve: F,
}

impl<F> Parser<'_, F>
where
    F: Fn(&str) -> Result<Unit, UnitError>,
{
    fn error(&self, reason: impl Into<String>) -> UnitError {
        UnitError::Parse {
            expression: self.expression.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expression(&mut self) -> Result<(f64, Unit), UnitError> {
        let (mut factor, mut unit) = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Mul) => {
                    self.pos += 1;
                    let (f, u) = self.term()?;
                    factor *= f;
                    unit = unit.try_mul(&u)?;
                }
                Some(Token::Div) => {
                    self.pos += 1;
                    let (f, u) = self.term()?;
                    factor /= f;
                    unit = unit.try_div(&u)?;
                }
                // Juxtaposition: "sievert cm ** 2".
                Some(Token::Ident(_)) | Some(Token::Number(_)) | Some(Token::LParen) => {
                    let (f, u) = self.term()?;
                    factor *= f;
                    unit = unit.try_mul(&u)?;
                }
                _ => break,
            }
        }
        Ok((factor, unit))
    }

    fn term(&mut self) -> Result<(f64, Unit), UnitError> {
        let (factor, unit) = self.atom()?;
        if self.peek() != Some(&Token::Pow) {
            return Ok((factor, unit));
        }
        self.pos += 1;
        let exponent = match self.next() {
            Some(Token::Number(n)) => n,
            _ => return Err(self.error("expected a number after the power operator")),
        };
        if exponent.fract() != 0.0 {
            return Err(self.error(format!("non-integer exponent {}", exponent)));
        }
        if exponent.abs() > f64::from(MAX_EXPONENT) {
            return Err(self.error(format!(
                "exponent {} exceeds the limit of {}",
                exponent, MAX_EXPONENT
            )));
        }
        let exponent = exponent as i32;
        Ok((factor.powi(exponent), unit.try_powi(exponent)?))
    }

    fn atom(&mut self) -> Result<(f64, Unit), UnitError> {
        match self.next() {
            Some(Token::Number(n)) => Ok((n, Unit::dimensionless())),
            Some(Token::Ident(name)) => Ok((1.0, (self.resolve)(&name)?)),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error("unbalanced parenthesis")),
                }
            }
            Some(other) => Err(self.error(format!("unexpected token {:?}", other))),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

/// Parses a unit expression into a numeric factor and a [`Unit`], resolving
/// each identifier through `resolve`.
pub(crate) fn parse_expression<F>(expression: &str, resolve: F) -> Result<(f64, Unit), UnitError>
where
    F: Fn(&str) -> Result<Unit, UnitError>,
{
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Ok((1.0, Unit::dimensionless()));
    }
    let mut parser = Parser {
        expression,
        tokens,
        pos: 0,
        resolve,
    };
    let parsed = parser.expression()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error("trailing tokens"));
    }
    Ok(parsed)
}
