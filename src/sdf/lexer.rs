//! Lexer (tokenizer) for SDF text.

use std::fmt;

use crate::error::{Result, SdfError};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text as written in the source
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset into the source
    pub offset: usize,
}

/// Token types in SDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Open parenthesis '('
    OpenParen,
    /// Close parenthesis ')'
    CloseParen,
    /// Triple separator ':'
    Colon,
    /// Wildcard instance '*'
    Star,
    /// A construct keyword (recognized case-insensitively)
    Keyword(Keyword),
    /// An identifier or hierarchical path
    Identifier,
    /// A quoted string; `text` holds the content without quotes
    QString,
    /// A signed integer or real literal
    Number,
    /// A based constant such as `1'b0`
    BasedConst,
    /// A boolean expression operator
    Operator(Operator),
    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::OpenParen => f.write_str("'('"),
            TokenKind::CloseParen => f.write_str("')'"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::Star => f.write_str("'*'"),
            TokenKind::Keyword(kw) => write!(f, "keyword {}", kw.as_str()),
            TokenKind::Identifier => f.write_str("identifier"),
            TokenKind::QString => f.write_str("quoted string"),
            TokenKind::Number => f.write_str("number"),
            TokenKind::BasedConst => f.write_str("based constant"),
            TokenKind::Operator(op) => write!(f, "operator '{}'", op.as_str()),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// Boolean expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `~`
    BitNot,
    /// `!`
    LogicNot,
    /// `&`
    BitAnd,
    /// `&&`
    LogicAnd,
    /// `|`
    BitOr,
    /// `||`
    LogicOr,
    /// `^`
    BitXor,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::BitNot => "~",
            Operator::LogicNot => "!",
            Operator::BitAnd => "&",
            Operator::LogicAnd => "&&",
            Operator::BitOr => "|",
            Operator::LogicOr => "||",
            Operator::BitXor => "^",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
        }
    }
}

macro_rules! keywords {
    ($($variant:ident => $text:literal,)*) => {
        /// SDF construct keywords.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            /// Look up a keyword, ignoring case.
            pub fn lookup(word: &str) -> Option<Self> {
                $(
                    if word.eq_ignore_ascii_case($text) {
                        return Some(Keyword::$variant);
                    }
                )*
                None
            }

            /// Canonical spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }
        }
    };
}

keywords! {
    DelayFile => "DELAYFILE",
    SdfVersion => "SDFVERSION",
    Design => "DESIGN",
    Date => "DATE",
    Vendor => "VENDOR",
    Program => "PROGRAM",
    Version => "VERSION",
    Divider => "DIVIDER",
    Voltage => "VOLTAGE",
    Process => "PROCESS",
    Temperature => "TEMPERATURE",
    Timescale => "TIMESCALE",
    Cell => "CELL",
    CellType => "CELLTYPE",
    Instance => "INSTANCE",
    Delay => "DELAY",
    Absolute => "ABSOLUTE",
    Increment => "INCREMENT",
    IoPath => "IOPATH",
    Interconnect => "INTERCONNECT",
    Port => "PORT",
    Device => "DEVICE",
    Retain => "RETAIN",
    Cond => "COND",
    TimingCheck => "TIMINGCHECK",
    SetupHold => "SETUPHOLD",
    Setup => "SETUP",
    Hold => "HOLD",
    Width => "WIDTH",
    Period => "PERIOD",
    NoChange => "NOCHANGE",
    Recovery => "RECOVERY",
    Removal => "REMOVAL",
    Skew => "SKEW",
    TimingEnv => "TIMINGENV",
    PathConstraint => "PATHCONSTRAINT",
    Posedge => "posedge",
    Negedge => "negedge",
}

/// Lexer for tokenizing SDF input.
///
/// Besides [`Lexer::next_token`], the lexer is an iterator yielding tokens
/// up to (not including) end of input, and stopping after the first error.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments()?;

        let start = self.pos;
        let line = self.line;
        let column = self.column;

        let ch = match self.peek() {
            Some(ch) => ch,
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    text: String::new(),
                    line,
                    column,
                    offset: start,
                });
            }
        };

        let kind = match ch {
            '(' => {
                self.advance();
                TokenKind::OpenParen
            }
            ')' => {
                self.advance();
                TokenKind::CloseParen
            }
            ':' => {
                self.advance();
                TokenKind::Colon
            }
            '*' => {
                self.advance();
                TokenKind::Star
            }
            '"' => {
                let text = self.read_string(line, column, start)?;
                return Ok(Token {
                    kind: TokenKind::QString,
                    text,
                    line,
                    column,
                    offset: start,
                });
            }
            '~' => {
                self.advance();
                TokenKind::Operator(Operator::BitNot)
            }
            '^' => {
                self.advance();
                TokenKind::Operator(Operator::BitXor)
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Operator(Operator::NotEq)
                } else {
                    TokenKind::Operator(Operator::LogicNot)
                }
            }
            '&' => {
                self.advance();
                if self.peek() == Some('&') {
                    self.advance();
                    TokenKind::Operator(Operator::LogicAnd)
                } else {
                    TokenKind::Operator(Operator::BitAnd)
                }
            }
            '|' => {
                self.advance();
                if self.peek() == Some('|') {
                    self.advance();
                    TokenKind::Operator(Operator::LogicOr)
                } else {
                    TokenKind::Operator(Operator::BitOr)
                }
            }
            '=' => {
                self.advance();
                if self.peek() != Some('=') {
                    return Err(SdfError::lex(line, column, start, "expected '==' operator"));
                }
                self.advance();
                TokenKind::Operator(Operator::Eq)
            }
            '\'' => {
                self.read_based_digits(line, column, start)?;
                TokenKind::BasedConst
            }
            _ if self.starts_number() => self.read_number(line, column, start)?,
            _ if is_ident_start(ch) => {
                self.read_identifier();
                match Keyword::lookup(&self.input[start..self.pos]) {
                    Some(kw) => TokenKind::Keyword(kw),
                    None => TokenKind::Identifier,
                }
            }
            _ => {
                return Err(SdfError::lex(
                    line,
                    column,
                    start,
                    format!("unexpected character '{}'", ch),
                ));
            }
        };

        Ok(Token {
            kind,
            text: self.input[start..self.pos].to_string(),
            line,
            column,
            offset: start,
        })
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                while let Some(ch) = self.peek() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else if rest.starts_with("/*") {
                let (line, column, offset) = (self.line, self.column, self.pos);
                self.advance();
                self.advance();
                loop {
                    if self.rest().starts_with("*/") {
                        self.advance();
                        self.advance();
                        break;
                    }
                    if self.advance().is_none() {
                        return Err(SdfError::lex(line, column, offset, "unterminated block comment"));
                    }
                }
            } else if self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            } else {
                return Ok(());
            }
        }
    }

    fn read_string(&mut self, line: usize, column: usize, offset: usize) -> Result<String> {
        self.advance(); // opening quote
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(SdfError::lex(line, column, offset, "unterminated string")),
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('"') => {
                    let text = self.input[start..self.pos].to_string();
                    self.advance();
                    return Ok(text);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn starts_number(&self) -> bool {
        let is_digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
        match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => is_digit(self.peek_second()),
            Some('-') | Some('+') => {
                let mut chars = self.rest().chars().skip(1);
                match chars.next() {
                    Some(c) if c.is_ascii_digit() => true,
                    Some('.') => is_digit(chars.next()),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn eat_digits(&mut self) -> usize {
        let mut count = 0;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            count += 1;
        }
        count
    }

    fn read_number(&mut self, line: usize, column: usize, offset: usize) -> Result<TokenKind> {
        let signed = matches!(self.peek(), Some('-') | Some('+'));
        if signed {
            self.advance();
        }

        // Integer part
        let int_digits = self.eat_digits();

        // Size prefix of a based constant, e.g. 1'b0
        if !signed && int_digits > 0 && self.peek() == Some('\'') {
            self.read_based_digits(line, column, offset)?;
            return Ok(TokenKind::BasedConst);
        }

        // Fraction
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.eat_digits();
        } else if self.peek() == Some('.') && int_digits > 0 {
            // "1." is a valid real
            self.advance();
        }

        // Exponent
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut chars = self.rest().chars().skip(1);
            let has_exponent = match chars.next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('-') | Some('+') => chars.next().is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                self.advance();
                if matches!(self.peek(), Some('-') | Some('+')) {
                    self.advance();
                }
                self.eat_digits();
            }
        }

        Ok(TokenKind::Number)
    }

    fn read_based_digits(&mut self, line: usize, column: usize, offset: usize) -> Result<()> {
        self.advance(); // quote
        match self.peek() {
            Some(c) if matches!(c.to_ascii_lowercase(), 'b' | 'o' | 'd' | 'h') => {
                self.advance();
            }
            _ => {
                return Err(SdfError::lex(line, column, offset, "expected base after quote"));
            }
        }
        let mut count = 0;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_hexdigit() || matches!(c, 'x' | 'X' | 'z' | 'Z' | '_'))
        {
            self.advance();
            count += 1;
        }
        if count == 0 {
            return Err(SdfError::lex(line, column, offset, "based constant has no digits"));
        }
        Ok(())
    }

    fn read_identifier(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\\' {
                self.advance();
                self.advance();
            } else if ch == '/' && matches!(self.peek_second(), Some('/') | Some('*')) {
                break;
            } else if is_ident_char(ch) {
                self.advance();
            } else {
                break;
            }
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || matches!(ch, '_' | '$' | '\\' | '/' | '.' | '[')
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '/' | '.' | '[' | ']')
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => {
                self.finished = true;
                None
            }
            Ok(token) => Some(Ok(token)),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).map(|t| t.unwrap().kind).collect()
    }

    fn texts(input: &str) -> Vec<String> {
        Lexer::new(input).map(|t| t.unwrap().text).collect()
    }

    #[test]
    fn test_lexer_basic() {
        let input = "(DELAYFILE (SDFVERSION \"3.0\"))";
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::OpenParen,
                TokenKind::Keyword(Keyword::DelayFile),
                TokenKind::OpenParen,
                TokenKind::Keyword(Keyword::SdfVersion),
                TokenKind::QString,
                TokenKind::CloseParen,
                TokenKind::CloseParen,
            ]
        );
        assert_eq!(texts(input)[4], "3.0");
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            kinds("iopath Posedge NEGEDGE"),
            vec![
                TokenKind::Keyword(Keyword::IoPath),
                TokenKind::Keyword(Keyword::Posedge),
                TokenKind::Keyword(Keyword::Negedge),
            ]
        );
    }

    #[test]
    fn test_numbers_and_triples() {
        assert_eq!(texts("(.6:-1.5e-3:+2)"), vec!["(", ".6", ":", "-1.5e-3", ":", "+2", ")"]);
        assert_eq!(
            kinds("1 ::"),
            vec![TokenKind::Number, TokenKind::Colon, TokenKind::Colon]
        );
    }

    #[test]
    fn test_timescale_unit_split() {
        assert_eq!(texts("100ps"), vec!["100", "ps"]);
        assert_eq!(kinds("1.0ns"), vec![TokenKind::Number, TokenKind::Identifier]);
    }

    #[test]
    fn test_paths() {
        assert_eq!(texts("b/c/clk d[0] a.b\\.c[3] /"), vec!["b/c/clk", "d[0]", "a.b\\.c[3]", "/"]);
        assert_eq!(kinds("."), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_based_constants_and_operators() {
        assert_eq!(texts("en==1'b1"), vec!["en", "==", "1'b1"]);
        assert_eq!(
            kinds("'B1 ~a&&!b||c^d!=e|f&g"),
            vec![
                TokenKind::BasedConst,
                TokenKind::Operator(Operator::BitNot),
                TokenKind::Identifier,
                TokenKind::Operator(Operator::LogicAnd),
                TokenKind::Operator(Operator::LogicNot),
                TokenKind::Identifier,
                TokenKind::Operator(Operator::LogicOr),
                TokenKind::Identifier,
                TokenKind::Operator(Operator::BitXor),
                TokenKind::Identifier,
                TokenKind::Operator(Operator::NotEq),
                TokenKind::Identifier,
                TokenKind::Operator(Operator::BitOr),
                TokenKind::Identifier,
                TokenKind::Operator(Operator::BitAnd),
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let input = "// header comment\n(CELL /* inline\n block */ x) // trailing";
        assert_eq!(texts(input), vec!["(", "CELL", "x", ")"]);
    }

    #[test]
    fn test_positions() {
        let mut lexer = Lexer::new("(CELL\n  foo)");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.text, "foo");
        assert_eq!((tok.line, tok.column, tok.offset), (2, 3, 8));
    }

    #[test]
    fn test_lex_errors() {
        let err = Lexer::new("(CELL @)").find_map(|t| t.err()).unwrap();
        match err {
            SdfError::LexError { line, column, offset, .. } => {
                assert_eq!((line, column, offset), (1, 7, 6));
            }
            other => panic!("expected lex error, got {other:?}"),
        }
        assert!(Lexer::new("\"open").next_token().is_err());
        assert!(Lexer::new("/* open").next_token().is_err());
        assert!(Lexer::new("a = b").find_map(|t| t.err()).is_some());
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let tokens: Vec<_> = Lexer::new("a @ b").collect();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[1].is_err());
    }
}
