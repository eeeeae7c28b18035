//! Tokenizing and infix-to-postfix conversion (shunting-yard).

use paral_core::Operation;

use crate::error::{CompileError, Result};

/// One element of a postfix sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    /// A literal operand
    Number(f64),
    /// A binary operator
    Operator(Operation),
}

/// Pending entries on the operator stack.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Operator(Operation),
    LeftParen,
}

/// Convert infix `text` into postfix order.
///
/// Operators of greater-or-equal precedence are emitted before a new operator
/// is pushed, so equal precedence associates to the left.
pub fn to_postfix(text: &str) -> Result<Vec<Token>> {
    let mut output = Vec::new();
    let mut operators: Vec<Pending> = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        if c.is_ascii_digit() || c == '.' {
            let mut end = position + c.len_utf8();
            while let Some(&(next_pos, next)) = chars.peek() {
                if !(next.is_ascii_digit() || next == '.') {
                    break;
                }
                end = next_pos + next.len_utf8();
                chars.next();
            }
            output.push(Token::Number(parse_number(&text[position..end])?));
            continue;
        }

        if let Some(op) = Operation::from_symbol(c) {
            while let Some(&Pending::Operator(top)) = operators.last() {
                if top.precedence() < op.precedence() {
                    break;
                }
                output.push(Token::Operator(top));
                operators.pop();
            }
            operators.push(Pending::Operator(op));
            continue;
        }

        match c {
            '(' => operators.push(Pending::LeftParen),
            ')' => loop {
                match operators.pop() {
                    Some(Pending::Operator(op)) => output.push(Token::Operator(op)),
                    Some(Pending::LeftParen) => break,
                    None => return Err(CompileError::Brackets),
                }
            },
            c if c.is_whitespace() => {}
            found => return Err(CompileError::Allowed { found, position }),
        }
    }

    while let Some(pending) = operators.pop() {
        match pending {
            Pending::Operator(op) => output.push(Token::Operator(op)),
            Pending::LeftParen => return Err(CompileError::Brackets),
        }
    }

    Ok(output)
}

fn parse_number(raw: &str) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CompileError::Number(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Operation::*;

    fn num(v: f64) -> Token {
        Token::Number(v)
    }

    fn op(o: Operation) -> Token {
        Token::Operator(o)
    }

    #[test]
    fn test_precedence_ordering() {
        assert_eq!(
            to_postfix("2+3*4").unwrap(),
            vec![num(2.0), num(3.0), num(4.0), op(Multiply), op(Add)]
        );
        assert_eq!(
            to_postfix("2*3+4").unwrap(),
            vec![num(2.0), num(3.0), op(Multiply), num(4.0), op(Add)]
        );
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(
            to_postfix("8-3-2").unwrap(),
            vec![num(8.0), num(3.0), op(Subtract), num(2.0), op(Subtract)]
        );
        assert_eq!(
            to_postfix("8/4*2").unwrap(),
            vec![num(8.0), num(4.0), op(Divide), num(2.0), op(Multiply)]
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        assert_eq!(
            to_postfix("(2+3)*4").unwrap(),
            vec![num(2.0), num(3.0), op(Add), num(4.0), op(Multiply)]
        );
        assert_eq!(
            to_postfix("((1))").unwrap(),
            vec![num(1.0)]
        );
    }

    #[test]
    fn test_whitespace_and_decimals() {
        assert_eq!(
            to_postfix(" 1.5 *\t2 ").unwrap(),
            vec![num(1.5), num(2.0), op(Multiply)]
        );
        assert_eq!(to_postfix(".5").unwrap(), vec![num(0.5)]);
    }

    #[test]
    fn test_bracket_mismatch() {
        assert_eq!(to_postfix("(2+3"), Err(CompileError::Brackets));
        assert_eq!(to_postfix("2+3)"), Err(CompileError::Brackets));
        assert_eq!(to_postfix(")("), Err(CompileError::Brackets));
    }

    #[test]
    fn test_disallowed_character() {
        assert_eq!(
            to_postfix("2+a"),
            Err(CompileError::Allowed { found: 'a', position: 2 })
        );
        assert!(matches!(to_postfix("2^3"), Err(CompileError::Allowed { found: '^', .. })));
        assert!(matches!(to_postfix("٣+1"), Err(CompileError::Allowed { .. })));
    }

    #[test]
    fn test_malformed_number() {
        assert_eq!(to_postfix("1.2.3+1"), Err(CompileError::Number("1.2.3".to_string())));
        assert_eq!(to_postfix("."), Err(CompileError::Number(".".to_string())));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(to_postfix("").unwrap(), vec![]);
        assert_eq!(to_postfix("   ").unwrap(), vec![]);
    }
}
