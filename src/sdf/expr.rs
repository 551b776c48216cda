//! Conditional expression parser.
//!
//! Precedence, lowest to highest, all binary levels left-associative:
//!
//! ```text
//! expr     = or_or
//! or_or    = and_and { "||" and_and }
//! and_and  = bit_or  { "&&" bit_or }
//! bit_or   = bit_xor { "|" bit_xor }
//! bit_xor  = bit_and { "^" bit_and }
//! bit_and  = equality { "&" equality }
//! equality = unary { ("==" | "!=") unary }
//! unary    = { "~" | "!" } primary
//! primary  = identifier | number | based_const | "(" expr ")"
//! ```
//!
//! The result is not an evaluable tree but the consumed tokens joined by
//! single spaces, e.g. `a&(B|C)` becomes `a & ( B | C )`.

use super::lexer::{Operator, TokenKind};
use super::parser::Cursor;
use crate::error::Result;

const LEVELS: [&[Operator]; 6] = [
    &[Operator::LogicOr],
    &[Operator::LogicAnd],
    &[Operator::BitOr],
    &[Operator::BitXor],
    &[Operator::BitAnd],
    &[Operator::Eq, Operator::NotEq],
];

/// Deepest parenthesis nesting accepted in one expression.
const MAX_NESTING: usize = 256;

/// Parse a conditional expression starting at the cursor's current token.
///
/// Stops at the first token that cannot continue the expression and
/// returns the normalized text.
pub(crate) fn parse_expression(cursor: &mut Cursor<'_>) -> Result<String> {
    let mut parser = ExprParser {
        cursor,
        out: Vec::new(),
        depth: 0,
    };
    parser.binary(0)?;
    Ok(parser.out.join(" "))
}

struct ExprParser<'c, 'a> {
    cursor: &'c mut Cursor<'a>,
    out: Vec<String>,
    depth: usize,
}

impl ExprParser<'_, '_> {
    fn binary(&mut self, level: usize) -> Result<()> {
        if level == LEVELS.len() {
            return self.unary();
        }
        self.binary(level + 1)?;
        while let TokenKind::Operator(op) = self.cursor.current().kind {
            if !LEVELS[level].contains(&op) {
                break;
            }
            self.shift()?;
            self.binary(level + 1)?;
        }
        Ok(())
    }

    fn unary(&mut self) -> Result<()> {
        while matches!(
            self.cursor.current().kind,
            TokenKind::Operator(Operator::BitNot) | TokenKind::Operator(Operator::LogicNot)
        ) {
            self.shift()?;
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<()> {
        match self.cursor.current().kind {
            TokenKind::Identifier | TokenKind::Number | TokenKind::BasedConst => self.shift(),
            TokenKind::OpenParen => {
                if self.depth == MAX_NESTING {
                    return Err(self.cursor.error("expression nested too deeply"));
                }
                self.shift()?;
                self.depth += 1;
                self.binary(0)?;
                self.depth -= 1;
                if self.cursor.current().kind != TokenKind::CloseParen {
                    return Err(self.cursor.error("unbalanced parentheses in expression"));
                }
                self.shift()
            }
            _ => Err(self.cursor.error("expected operand in expression")),
        }
    }

    fn shift(&mut self) -> Result<()> {
        let token = self.cursor.advance()?;
        self.out.push(token.text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::sdf::lexer::Lexer;
    use crate::sdf::parser::Cursor;

    use super::*;

    fn normalize(input: &str) -> Result<String> {
        let mut cursor = Cursor::new(Lexer::new(input))?;
        parse_expression(&mut cursor)
    }

    #[test]
    fn test_normalizes_spacing() {
        assert_eq!(normalize("en==1'b1").unwrap(), "en == 1'b1");
        assert_eq!(normalize("x & ~y").unwrap(), "x & ~ y");
        assert_eq!(normalize("a&(B|C)").unwrap(), "a & ( B | C )");
        assert_eq!(normalize("!a && b || c ^ d != 'b0").unwrap(), "! a && b || c ^ d != 'b0");
    }

    #[test]
    fn test_nested_and_unary_chains() {
        assert_eq!(normalize("~~a").unwrap(), "~ ~ a");
        assert_eq!(normalize("((a))").unwrap(), "( ( a ) )");
        assert_eq!(normalize("a.b/c[1] == 0").unwrap(), "a.b/c[1] == 0");
    }

    #[test]
    fn test_stops_at_non_operator() {
        let mut cursor = Cursor::new(Lexer::new("en (IOPATH a b (1))")).unwrap();
        assert_eq!(parse_expression(&mut cursor).unwrap(), "en");
        assert_eq!(cursor.current().kind, TokenKind::OpenParen);
    }

    #[test]
    fn test_errors() {
        assert!(normalize("").is_err());
        assert!(normalize("a &").is_err());
        assert!(normalize("(a | b").is_err());
        assert!(normalize("~").is_err());
        assert!(normalize("== a").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
        assert!(normalize(&nested(MAX_NESTING)).is_ok());

        let err = normalize(&nested(MAX_NESTING + 1)).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"));

        // Far past the limit still fails cleanly instead of exhausting the stack.
        assert!(normalize(&nested(10_000)).is_err());
    }
}
