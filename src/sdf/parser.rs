//! Recursive-descent parser for SDF.

use super::ast::*;
use super::expr::parse_expression;
use super::lexer::{Keyword, Lexer, Token, TokenKind};
use crate::document::{Edge, TimeUnit, Timescale, Triple};
use crate::error::{Result, SdfError};

/// Token cursor with one token of lookahead.
pub(crate) struct Cursor<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            peeked: None,
        })
    }

    pub(crate) fn current(&self) -> &Token {
        &self.current
    }

    /// Consume the current token and return it.
    pub(crate) fn advance(&mut self) -> Result<Token> {
        let next = match self.peeked.take() {
            Some(tok) => tok,
            None => self.lexer.next_token()?,
        };
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// The token after the current one.
    pub(crate) fn peek(&mut self) -> Result<&Token> {
        let token = match self.peeked.take() {
            Some(tok) => tok,
            None => self.lexer.next_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Syntax error at the current token.
    pub(crate) fn error(&self, message: impl Into<String>) -> SdfError {
        let token = if self.current.kind == TokenKind::Eof {
            "<eof>".to_string()
        } else {
            self.current.text.clone()
        };
        SdfError::syntax(self.current.line, self.current.column, token, message)
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.error(format!("expected {}, got {}", kind, self.current.kind)))
        }
    }
}

/// Grammar rule to start parsing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRule {
    /// A complete `(DELAYFILE ...)`
    DelayFile,
    /// A single `(CELL ...)` block
    Cell,
    /// A single path delay such as `(IOPATH ...)` or `(COND ... (IOPATH ...))`
    PathDelay,
    /// A single timing check such as `(SETUPHOLD ...)`
    TimingCheck,
    /// A single `(PATHCONSTRAINT ...)`
    PathConstraint,
    /// A bare conditional expression
    Expression,
}

/// Result of parsing from a [`StartRule`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    DelayFile(DelayFileAst),
    Cell(CellAst),
    PathDelay(PathDelay),
    TimingCheck(CheckAst),
    PathConstraint(PathConstraintAst),
    Expression(String),
}

/// Parser for SDF text.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(lexer: Lexer<'a>) -> Result<Self> {
        Ok(Self {
            cursor: Cursor::new(lexer)?,
        })
    }

    /// Parse a complete delay file.
    pub fn parse(&mut self) -> Result<DelayFileAst> {
        let ast = self.parse_delay_file()?;
        self.expect_end()?;
        Ok(ast)
    }

    /// Parse the whole input as the given rule.
    pub fn parse_rule(&mut self, rule: StartRule) -> Result<Fragment> {
        let fragment = match rule {
            StartRule::DelayFile => Fragment::DelayFile(self.parse_delay_file()?),
            StartRule::Cell => Fragment::Cell(self.parse_cell()?),
            StartRule::PathDelay => Fragment::PathDelay(self.parse_path_delay()?),
            StartRule::TimingCheck => Fragment::TimingCheck(self.parse_check()?),
            StartRule::PathConstraint => Fragment::PathConstraint(self.parse_path_constraint()?),
            StartRule::Expression => Fragment::Expression(parse_expression(&mut self.cursor)?),
        };
        self.expect_end()?;
        Ok(fragment)
    }

    fn expect_end(&self) -> Result<()> {
        if self.at(TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.cursor.error("unexpected trailing input"))
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.cursor.current().kind == kind
    }

    /// Keyword following the current `(`, if any.
    fn peek_keyword(&mut self) -> Result<Option<Keyword>> {
        if !self.at(TokenKind::OpenParen) {
            return Ok(None);
        }
        Ok(match self.cursor.peek()?.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        })
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Token> {
        if self.at(TokenKind::Keyword(kw)) {
            self.cursor.advance()
        } else {
            Err(self.cursor.error(format!("expected {}", kw.as_str())))
        }
    }

    /// Consume `(` followed by the given keyword.
    fn open(&mut self, kw: Keyword) -> Result<Token> {
        self.cursor.expect(TokenKind::OpenParen)?;
        self.expect_keyword(kw)
    }

    fn close(&mut self) -> Result<()> {
        self.cursor.expect(TokenKind::CloseParen)?;
        Ok(())
    }

    fn parse_delay_file(&mut self) -> Result<DelayFileAst> {
        self.open(Keyword::DelayFile)?;
        let mut ast = DelayFileAst::default();

        while !self.at(TokenKind::CloseParen) {
            match self.peek_keyword()? {
                Some(Keyword::Cell) => ast.cells.push(self.parse_cell()?),
                Some(_) if !ast.cells.is_empty() => {
                    return Err(self.cursor.error("header items must precede CELL blocks"));
                }
                Some(_) => ast.header.push(self.parse_header_item()?),
                None => return Err(self.cursor.error("expected header item or CELL")),
            }
        }
        self.close()?;
        Ok(ast)
    }

    fn parse_header_item(&mut self) -> Result<HeaderItem> {
        self.cursor.expect(TokenKind::OpenParen)?;
        let kw = match self.cursor.current().kind {
            TokenKind::Keyword(kw) => kw,
            _ => return Err(self.cursor.error("expected header keyword")),
        };
        self.cursor.advance()?;

        let item = match kw {
            Keyword::SdfVersion => HeaderItem::SdfVersion(self.parse_qstring()?),
            Keyword::Design => HeaderItem::Design(self.parse_qstring()?),
            Keyword::Date => HeaderItem::Date(self.parse_qstring()?),
            Keyword::Vendor => HeaderItem::Vendor(self.parse_qstring()?),
            Keyword::Program => HeaderItem::Program(self.parse_qstring()?),
            Keyword::Version => HeaderItem::Version(self.parse_qstring()?),
            Keyword::Process => HeaderItem::Process(self.parse_qstring()?),
            Keyword::Divider => HeaderItem::Divider(self.parse_divider()?),
            Keyword::Voltage => HeaderItem::Voltage(self.parse_header_triple()?),
            Keyword::Temperature => HeaderItem::Temperature(self.parse_header_triple()?),
            Keyword::Timescale => HeaderItem::Timescale(self.parse_timescale()?),
            other => {
                return Err(self
                    .cursor
                    .error(format!("{} is not a header item", other.as_str())))
            }
        };
        self.close()?;
        Ok(item)
    }

    fn parse_qstring(&mut self) -> Result<String> {
        Ok(self.cursor.expect(TokenKind::QString)?.text)
    }

    fn parse_divider(&mut self) -> Result<char> {
        let token = self.cursor.current();
        if token.kind == TokenKind::Identifier && (token.text == "." || token.text == "/") {
            let divider = if token.text == "." { '.' } else { '/' };
            self.cursor.advance()?;
            Ok(divider)
        } else {
            Err(self.cursor.error("expected '.' or '/' divider"))
        }
    }

    fn parse_header_triple(&mut self) -> Result<Triple> {
        if self.at(TokenKind::CloseParen) {
            return Err(self.cursor.error("expected value"));
        }
        self.parse_triple_body()
    }

    fn parse_timescale(&mut self) -> Result<Timescale> {
        let magnitude = self.parse_number()?;
        let token = self.cursor.current();
        let unit = match token.kind {
            TokenKind::Identifier => TimeUnit::from_name(&token.text),
            _ => None,
        }
        .ok_or_else(|| self.cursor.error("expected time unit (s, ms, us, ns, ps, fs)"))?;
        self.cursor.advance()?;
        Ok(Timescale { magnitude, unit })
    }

    fn parse_number(&mut self) -> Result<f64> {
        if !self.at(TokenKind::Number) {
            return Err(self.cursor.error("expected number"));
        }
        let value = self
            .cursor
            .current()
            .text
            .parse::<f64>()
            .map_err(|_| self.cursor.error("invalid number"))?;
        if !value.is_finite() {
            return Err(self.cursor.error("number out of range"));
        }
        self.cursor.advance()?;
        Ok(value)
    }

    /// Parse a path token; keywords are accepted by their original text.
    fn parse_path(&mut self) -> Result<String> {
        match self.cursor.current().kind {
            TokenKind::Identifier | TokenKind::Keyword(_) => Ok(self.cursor.advance()?.text),
            _ => Err(self.cursor.error("expected port path")),
        }
    }

    fn parse_cell(&mut self) -> Result<CellAst> {
        let line = self.open(Keyword::Cell)?.line;

        self.open(Keyword::CellType)?;
        let celltype = self.parse_qstring()?;
        self.close()?;

        self.open(Keyword::Instance)?;
        let instance = match self.cursor.current().kind {
            TokenKind::CloseParen => String::new(),
            TokenKind::Star => self.cursor.advance()?.text,
            _ => self.parse_path()?,
        };
        self.close()?;

        let mut specs = Vec::new();
        while !self.at(TokenKind::CloseParen) {
            let spec = match self.peek_keyword()? {
                Some(Keyword::Delay) => TimingSpec::Delay(self.parse_delay()?),
                Some(Keyword::TimingCheck) => TimingSpec::TimingCheck(self.parse_timing_check()?),
                Some(Keyword::TimingEnv) => TimingSpec::TimingEnv(self.parse_timing_env()?),
                _ => return Err(self.cursor.error("expected DELAY, TIMINGCHECK or TIMINGENV")),
            };
            specs.push(spec);
        }
        self.close()?;

        Ok(CellAst {
            celltype,
            instance,
            specs,
            line,
        })
    }

    fn parse_delay(&mut self) -> Result<Vec<DelayBlock>> {
        self.open(Keyword::Delay)?;
        let mut blocks = Vec::new();
        while !self.at(TokenKind::CloseParen) {
            let mode = match self.peek_keyword()? {
                Some(Keyword::Absolute) => DelayMode::Absolute,
                Some(Keyword::Increment) => DelayMode::Increment,
                _ => return Err(self.cursor.error("expected ABSOLUTE or INCREMENT")),
            };
            self.cursor.advance()?;
            self.cursor.advance()?;

            let mut paths = Vec::new();
            while !self.at(TokenKind::CloseParen) {
                paths.push(self.parse_path_delay()?);
            }
            self.close()?;
            blocks.push(DelayBlock { mode, paths });
        }
        self.close()?;
        Ok(blocks)
    }

    fn parse_path_delay(&mut self) -> Result<PathDelay> {
        match self.peek_keyword()? {
            Some(Keyword::IoPath) => self.parse_iopath(None),
            Some(Keyword::Cond) => {
                self.open(Keyword::Cond)?;
                let cond = parse_expression(&mut self.cursor)?;
                if self.peek_keyword()? != Some(Keyword::IoPath) {
                    return Err(self.cursor.error("COND may only wrap IOPATH"));
                }
                let path = self.parse_iopath(Some(cond))?;
                self.close()?;
                Ok(path)
            }
            Some(Keyword::Interconnect) => {
                self.open(Keyword::Interconnect)?;
                let source = self.parse_port()?;
                let dest = self.parse_port()?;
                let values = self.parse_values()?;
                self.close()?;
                Ok(PathDelay::Interconnect {
                    source,
                    dest,
                    values,
                })
            }
            Some(Keyword::Port) => {
                self.open(Keyword::Port)?;
                let port = self.parse_port()?;
                let values = self.parse_values()?;
                self.close()?;
                Ok(PathDelay::Port { port, values })
            }
            Some(Keyword::Device) => {
                self.open(Keyword::Device)?;
                let port = match self.cursor.current().kind {
                    TokenKind::Identifier | TokenKind::Keyword(_) => Some(self.parse_port()?),
                    _ => None,
                };
                let values = self.parse_values()?;
                self.close()?;
                Ok(PathDelay::Device { port, values })
            }
            _ => Err(self
                .cursor
                .error("expected IOPATH, COND, INTERCONNECT, PORT or DEVICE")),
        }
    }

    fn parse_iopath(&mut self, cond: Option<String>) -> Result<PathDelay> {
        self.open(Keyword::IoPath)?;
        let input = self.parse_port()?;
        let output = self.parse_port()?;

        let retain = if self.peek_keyword()? == Some(Keyword::Retain) {
            self.open(Keyword::Retain)?;
            let mut values = Vec::new();
            while self.at(TokenKind::OpenParen) {
                values.push(self.parse_triple()?);
            }
            if values.is_empty() || values.len() > 3 {
                return Err(self.cursor.error("RETAIN takes one to three values"));
            }
            self.close()?;
            Some(values)
        } else {
            None
        };

        let values = self.parse_values()?;
        self.close()?;
        Ok(PathDelay::IoPath {
            cond,
            input,
            output,
            retain,
            values,
        })
    }

    /// `path` or `(posedge path)` / `(negedge path)`.
    fn parse_port(&mut self) -> Result<PortSpec> {
        if !self.at(TokenKind::OpenParen) {
            return Ok(PortSpec::plain(self.parse_path()?));
        }
        let edge = match self.peek_keyword()? {
            Some(Keyword::Posedge) => Edge::Posedge,
            Some(Keyword::Negedge) => Edge::Negedge,
            _ => return Err(self.cursor.error("expected port or edge specification")),
        };
        self.cursor.advance()?;
        self.cursor.advance()?;
        let path = self.parse_path()?;
        self.close()?;
        Ok(PortSpec {
            path,
            edge: Some(edge),
        })
    }

    /// Sequence of delay values; the count must be 1, 2, 3, 6 or 12.
    fn parse_values(&mut self) -> Result<Vec<Triple>> {
        let mut values = Vec::new();
        while self.at(TokenKind::OpenParen) {
            values.push(self.parse_triple()?);
        }
        if !matches!(values.len(), 1 | 2 | 3 | 6 | 12) {
            return Err(self.cursor.error(format!(
                "expected 1, 2, 3, 6 or 12 delay values, found {}",
                values.len()
            )));
        }
        Ok(values)
    }

    fn parse_triple(&mut self) -> Result<Triple> {
        self.cursor.expect(TokenKind::OpenParen)?;
        let triple = self.parse_triple_body()?;
        self.close()?;
        Ok(triple)
    }

    /// Body of a value: empty, a scalar, or `min:avg:max` with optional slots.
    fn parse_triple_body(&mut self) -> Result<Triple> {
        let mut slots = [None; 3];
        let mut colons = 0;
        let mut seen_number = false;
        loop {
            match self.cursor.current().kind {
                TokenKind::Number => {
                    if slots[colons].is_some() {
                        return Err(self.cursor.error("expected ':' between values"));
                    }
                    slots[colons] = Some(self.parse_number()?);
                    seen_number = true;
                }
                TokenKind::Colon => {
                    if colons == 2 {
                        return Err(self.cursor.error("too many ':' in value"));
                    }
                    colons += 1;
                    self.cursor.advance()?;
                }
                _ => break,
            }
        }

        match (colons, seen_number) {
            (0, false) => Ok(Triple::empty()),
            (0, true) => Ok(Triple::single(slots[0].unwrap_or_default())),
            (2, true) => Ok(Triple::new(slots[0], slots[1], slots[2])),
            (2, false) => Err(self.cursor.error("value '::' has no numbers")),
            _ => Err(self.cursor.error("value must be a scalar or min:typ:max")),
        }
    }

    fn parse_timing_check(&mut self) -> Result<Vec<CheckAst>> {
        self.open(Keyword::TimingCheck)?;
        let mut checks = Vec::new();
        while !self.at(TokenKind::CloseParen) {
            checks.push(self.parse_check()?);
        }
        self.close()?;
        Ok(checks)
    }

    fn parse_check(&mut self) -> Result<CheckAst> {
        let kind = match self.peek_keyword()? {
            Some(Keyword::SetupHold) => CheckKind::SetupHold,
            Some(Keyword::Setup) => CheckKind::Setup,
            Some(Keyword::Hold) => CheckKind::Hold,
            Some(Keyword::Recovery) => CheckKind::Recovery,
            Some(Keyword::Removal) => CheckKind::Removal,
            Some(Keyword::Skew) => CheckKind::Skew,
            Some(Keyword::Width) => CheckKind::Width,
            Some(Keyword::Period) => CheckKind::Period,
            Some(Keyword::NoChange) => CheckKind::NoChange,
            _ => return Err(self.cursor.error("expected timing check")),
        };
        self.cursor.advance()?;
        let keyword = self.cursor.advance()?;

        let mut ports = Vec::new();
        while self.at_check_port()? {
            ports.push(self.parse_check_port()?);
        }
        if ports.len() != kind.port_count() {
            return Err(self.cursor.error(format!(
                "{} takes {} port specification(s), found {}",
                keyword.text.to_ascii_uppercase(),
                kind.port_count(),
                ports.len()
            )));
        }

        let mut values = Vec::new();
        while self.at(TokenKind::OpenParen) {
            values.push(self.parse_triple()?);
        }
        if values.is_empty() || values.len() > kind.max_values() {
            return Err(self.cursor.error(format!(
                "{} takes at most {} value(s), found {}",
                keyword.text.to_ascii_uppercase(),
                kind.max_values(),
                values.len()
            )));
        }
        self.close()?;

        Ok(CheckAst {
            kind,
            ports,
            values,
            line: keyword.line,
        })
    }

    fn at_check_port(&mut self) -> Result<bool> {
        Ok(match self.cursor.current().kind {
            TokenKind::Identifier | TokenKind::Keyword(_) => true,
            TokenKind::OpenParen => matches!(
                self.peek_keyword()?,
                Some(Keyword::Posedge) | Some(Keyword::Negedge) | Some(Keyword::Cond)
            ),
            _ => false,
        })
    }

    fn parse_check_port(&mut self) -> Result<CheckPort> {
        if self.peek_keyword()? == Some(Keyword::Cond) {
            self.open(Keyword::Cond)?;
            let cond = parse_expression(&mut self.cursor)?;
            let port = self.parse_port()?;
            self.close()?;
            Ok(CheckPort {
                port,
                cond: Some(cond),
            })
        } else {
            Ok(CheckPort {
                port: self.parse_port()?,
                cond: None,
            })
        }
    }

    fn parse_timing_env(&mut self) -> Result<Vec<PathConstraintAst>> {
        self.open(Keyword::TimingEnv)?;
        let mut constraints = Vec::new();
        while !self.at(TokenKind::CloseParen) {
            constraints.push(self.parse_path_constraint()?);
        }
        self.close()?;
        Ok(constraints)
    }

    fn parse_path_constraint(&mut self) -> Result<PathConstraintAst> {
        self.open(Keyword::PathConstraint)?;
        let output = self.parse_port()?;
        let input = self.parse_port()?;
        let rise = self.parse_triple()?;
        let fall = self.parse_triple()?;
        self.close()?;
        Ok(PathConstraintAst {
            output,
            input,
            rise,
            fall,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_as(input: &str, rule: StartRule) -> Result<Fragment> {
        Parser::new(Lexer::new(input))?.parse_rule(rule)
    }

    fn triple(input: &str) -> Result<Triple> {
        let mut parser = Parser::new(Lexer::new(input))?;
        parser.parse_triple()
    }

    #[test]
    fn test_parse_header() {
        let input = r#"(DELAYFILE
            (SDFVERSION "3.0")
            (DESIGN "top")
            (DIVIDER /)
            (VOLTAGE 1.62:1.8:1.98)
            (TEMPERATURE 25)
            (TIMESCALE 100ps)
        )"#;
        let ast = Parser::new(Lexer::new(input)).unwrap().parse().unwrap();
        assert_eq!(ast.header.len(), 6);
        assert_eq!(ast.header[0], HeaderItem::SdfVersion("3.0".to_string()));
        assert_eq!(ast.header[2], HeaderItem::Divider('/'));
        assert_eq!(
            ast.header[3],
            HeaderItem::Voltage(Triple::new(Some(1.62), Some(1.8), Some(1.98)))
        );
        assert_eq!(ast.header[4], HeaderItem::Temperature(Triple::single(25.0)));
        assert_eq!(
            ast.header[5],
            HeaderItem::Timescale(Timescale {
                magnitude: 100.0,
                unit: TimeUnit::Ps
            })
        );
        assert!(ast.cells.is_empty());
    }

    #[test]
    fn test_parse_triples() {
        assert_eq!(triple("()").unwrap(), Triple::empty());
        assert_eq!(triple("(2)").unwrap(), Triple::single(2.0));
        assert_eq!(
            triple("(.6:.7:.9)").unwrap(),
            Triple::new(Some(0.6), Some(0.7), Some(0.9))
        );
        assert_eq!(triple("(1::3)").unwrap(), Triple::new(Some(1.0), None, Some(3.0)));
        assert_eq!(triple("(:2:)").unwrap(), Triple::new(None, Some(2.0), None));
        assert!(triple("(::)").is_err());
        assert!(triple("(1:2)").is_err());
        assert!(triple("(1:2:3:4)").is_err());
        assert!(triple("(1 2)").is_err());
    }

    #[test]
    fn test_out_of_range_numbers() {
        let err = triple("(1e999)").unwrap_err();
        assert!(matches!(err, SdfError::SyntaxError { ref token, .. } if token == "1e999"));
        assert!(triple("(1:-1e400:3)").is_err());
        assert!(parse_as("(IOPATH a y (1e308))", StartRule::PathDelay).is_ok());

        let timescale = "(DELAYFILE (TIMESCALE 1e999 ps))";
        assert!(Parser::new(Lexer::new(timescale)).unwrap().parse().is_err());
    }

    #[test]
    fn test_timescale_requires_unit() {
        let parse = |s: &str| Parser::new(Lexer::new(s)).and_then(|mut p| p.parse());
        assert!(parse("(DELAYFILE (TIMESCALE 1ns))").is_ok());
        assert!(parse("(DELAYFILE (TIMESCALE 10 fs))").is_ok());
        assert!(parse("(DELAYFILE (TIMESCALE 1))").is_err());
        assert!(parse("(DELAYFILE (TIMESCALE 1 ticks))").is_err());
    }

    #[test]
    fn test_parse_interconnect_fragment() {
        let fragment = parse_as("(INTERCONNECT mck b/c/clk (.6:.7:.9))", StartRule::PathDelay).unwrap();
        match fragment {
            Fragment::PathDelay(PathDelay::Interconnect { source, dest, values }) => {
                assert_eq!(source, PortSpec::plain("mck"));
                assert_eq!(dest, PortSpec::plain("b/c/clk"));
                assert_eq!(values.len(), 1);
            }
            other => panic!("expected interconnect, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_cond_iopath_with_retain() {
        let input = "(COND en==1'b1 (IOPATH d[0] b/c/d (RETAIN (0.3)) (0.4:0.4:0.4)))";
        match parse_as(input, StartRule::PathDelay).unwrap() {
            Fragment::PathDelay(PathDelay::IoPath {
                cond,
                input,
                output,
                retain,
                values,
            }) => {
                assert_eq!(cond.as_deref(), Some("en == 1'b1"));
                assert_eq!(input.path, "d[0]");
                assert_eq!(output.path, "b/c/d");
                assert_eq!(retain, Some(vec![Triple::single(0.3)]));
                assert_eq!(values, vec![Triple::new(Some(0.4), Some(0.4), Some(0.4))]);
            }
            other => panic!("expected iopath, got {other:?}"),
        }
    }

    #[test]
    fn test_cond_only_wraps_iopath() {
        let err = parse_as("(COND en (INTERCONNECT a b (1)))", StartRule::PathDelay).unwrap_err();
        assert!(matches!(err, SdfError::SyntaxError { .. }));
    }

    #[test]
    fn test_parse_edge_ports() {
        match parse_as("(IOPATH (posedge CLK) Q (1) (2))", StartRule::PathDelay).unwrap() {
            Fragment::PathDelay(PathDelay::IoPath { input, values, .. }) => {
                assert_eq!(input.edge, Some(Edge::Posedge));
                assert_eq!(input.path, "CLK");
                assert_eq!(values.len(), 2);
            }
            other => panic!("expected iopath, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_value_counts() {
        let six = "(IOPATH a y (1) (2) (3) (4) (5) (6))";
        assert!(parse_as(six, StartRule::PathDelay).is_ok());
        let four = "(IOPATH a y (1) (2) (3) (4))";
        assert!(parse_as(four, StartRule::PathDelay).is_err());
        let none = "(IOPATH a y)";
        assert!(parse_as(none, StartRule::PathDelay).is_err());
    }

    #[test]
    fn test_parse_device_without_port() {
        match parse_as("(DEVICE (1:2:3))", StartRule::PathDelay).unwrap() {
            Fragment::PathDelay(PathDelay::Device { port, values }) => {
                assert!(port.is_none());
                assert_eq!(values.len(), 1);
            }
            other => panic!("expected device, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_checks() {
        let fragment = parse_as("(WIDTH (negedge clk) (4.4:7.5:11.3))", StartRule::TimingCheck).unwrap();
        match fragment {
            Fragment::TimingCheck(check) => {
                assert_eq!(check.kind, CheckKind::Width);
                assert_eq!(check.ports.len(), 1);
                assert_eq!(check.ports[0].port.edge, Some(Edge::Negedge));
            }
            other => panic!("expected check, got {other:?}"),
        }

        let fragment = parse_as(
            "(SETUPHOLD d (COND en==1 (posedge clk)) (1) (2))",
            StartRule::TimingCheck,
        )
        .unwrap();
        match fragment {
            Fragment::TimingCheck(check) => {
                assert_eq!(check.kind, CheckKind::SetupHold);
                assert_eq!(check.ports[1].cond.as_deref(), Some("en == 1"));
                assert_eq!(check.values.len(), 2);
            }
            other => panic!("expected check, got {other:?}"),
        }
    }

    #[test]
    fn test_check_arity_errors() {
        assert!(parse_as("(WIDTH a b (1))", StartRule::TimingCheck).is_err());
        assert!(parse_as("(SETUP a (1))", StartRule::TimingCheck).is_err());
        assert!(parse_as("(SETUP a b (1) (2))", StartRule::TimingCheck).is_err());
    }

    #[test]
    fn test_parse_cell_fragment() {
        let input = r#"
(CELL
 (CELLTYPE "BIGCHIP")
 (INSTANCE top)
 (DELAY
  (ABSOLUTE
   (INTERCONNECT mck b/c/clk (.6:.7:.9))
   (INTERCONNECT d[0] b/c/d (.4:.5:.6))
  )
 )
)
"#;
        match parse_as(input, StartRule::Cell).unwrap() {
            Fragment::Cell(cell) => {
                assert_eq!(cell.celltype, "BIGCHIP");
                assert_eq!(cell.instance, "top");
                assert_eq!(cell.line, 2);
                match &cell.specs[0] {
                    TimingSpec::Delay(blocks) => {
                        assert_eq!(blocks[0].mode, DelayMode::Absolute);
                        assert_eq!(blocks[0].paths.len(), 2);
                    }
                    other => panic!("expected delay, got {other:?}"),
                }
            }
            other => panic!("expected cell, got {other:?}"),
        }
    }

    #[test]
    fn test_wildcard_and_empty_instance() {
        for (text, expected) in [("*", "*"), ("", "")] {
            let input = format!("(CELL (CELLTYPE \"X\") (INSTANCE {}))", text);
            match parse_as(&input, StartRule::Cell).unwrap() {
                Fragment::Cell(cell) => assert_eq!(cell.instance, expected),
                other => panic!("expected cell, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_structural_errors() {
        let parse = |s: &str| Parser::new(Lexer::new(s)).and_then(|mut p| p.parse());
        assert!(parse("(DELAYFILE").is_err());
        assert!(parse("DELAYFILE)").is_err());
        assert!(parse("(DELAYFILE (SDFVERSION \"3.0\")) extra").is_err());
        assert!(parse("(DELAYFILE (BOGUS 1))").is_err());
        assert!(parse("(DELAYFILE (CELL (CELLTYPE \"a\") (INSTANCE b)) (DESIGN \"x\"))").is_err());
        assert!(parse_as("(INTERCONNECT a b (1:2:3)", StartRule::PathDelay).is_err());
        assert!(parse_as("INTERCONNECT a b (1:2:3))", StartRule::PathDelay).is_err());
    }

    #[test]
    fn test_syntax_error_position() {
        let err = Parser::new(Lexer::new("(DELAYFILE\n  (SDFVERSION 3))"))
            .unwrap()
            .parse()
            .unwrap_err();
        match err {
            SdfError::SyntaxError {
                line, column, token, ..
            } => {
                assert_eq!((line, column), (2, 15));
                assert_eq!(token, "3");
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_expression_rule() {
        assert_eq!(
            parse_as("a&(B|C)", StartRule::Expression).unwrap(),
            Fragment::Expression("a & ( B | C )".to_string())
        );
    }
}
