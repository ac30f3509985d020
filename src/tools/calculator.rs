use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;

/// Arithmetic expression evaluation: `+ - * /`, unary minus, parentheses.
pub struct Calculator;

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate mathematical expressions"
    }

    async fn execute(&self, input: &str) -> Result<String> {
        let value = evaluate(input)?;
        // Integers print without a trailing ".0".
        if value.fract() == 0.0 && value.abs() < 1e15 {
            Ok(format!("{}", value as i64))
        } else {
            Ok(format!("{}", value))
        }
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
    };
    let value = parser.parse_expression()?;
    if parser.pos != tokens.len() {
        return Err(AppError::InvalidInput(format!(
            "Unexpected trailing input in expression '{}'",
            expression
        )));
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut number = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        number.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = number.parse().map_err(|_| {
                    AppError::InvalidInput(format!("Invalid number '{}'", number))
                })?;
                tokens.push(Token::Number(value));
            }
            other => {
                return Err(AppError::InvalidInput(format!(
                    "Unexpected character '{}' in expression",
                    other
                )));
            }
        }
    }

    if tokens.is_empty() {
        return Err(AppError::InvalidInput("Empty expression".to_string()));
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn parse_expression(&mut self) -> Result<f64> {
        let mut value = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                Token::Minus => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<f64> {
        let mut value = self.parse_factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.pos += 1;
                    value *= self.parse_factor()?;
                }
                Token::Slash => {
                    self.pos += 1;
                    let divisor = self.parse_factor()?;
                    if divisor == 0.0 {
                        return Err(AppError::InvalidInput("Division by zero".to_string()));
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_factor(&mut self) -> Result<f64> {
        match self.peek() {
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(value)
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.parse_factor()?)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let value = self.parse_expression()?;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    _ => Err(AppError::InvalidInput(
                        "Missing closing parenthesis".to_string(),
                    )),
                }
            }
            _ => Err(AppError::InvalidInput(
                "Expected a number or parenthesized expression".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2 + 2", 4.0)]
    #[case("2 + 3 * 4", 14.0)]
    #[case("(2 + 3) * 4", 20.0)]
    #[case("10 / 4", 2.5)]
    #[case("-3 + 5", 2.0)]
    #[case("2 * -3", -6.0)]
    #[case("1.5 * 2", 3.0)]
    fn test_evaluate(#[case] expression: &str, #[case] expected: f64) {
        assert!((evaluate(expression).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_division_by_zero() {
        assert!(evaluate("1 / 0").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(evaluate("import os").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(2 + 3").is_err());
    }

    #[tokio::test]
    async fn test_tool_formats_integers() {
        let result = Calculator.execute("6 * 7").await.unwrap();
        assert_eq!(result, "42");

        let result = Calculator.execute("10 / 4").await.unwrap();
        assert_eq!(result, "2.5");
    }
}
