//! SDF (Standard Delay Format) reader.
//!
//! This module turns SDF text into a parse tree. SDF is a parenthesized,
//! keyword-driven format; keywords are case-insensitive and comments use
//! `//` or `/* */`.
//!
//! # Grammar Overview
//!
//! ```text
//! delayfile   = "(" DELAYFILE { header } { cell } ")"
//! header      = "(" (SDFVERSION|DESIGN|DATE|VENDOR|PROGRAM|VERSION|PROCESS) qstring ")"
//!             | "(" DIVIDER ("." | "/") ")"
//!             | "(" (VOLTAGE|TEMPERATURE) triple_body ")"
//!             | "(" TIMESCALE number unit ")"
//! cell        = "(" CELL "(" CELLTYPE qstring ")" "(" INSTANCE [path | "*"] ")"
//!               { timing_spec } ")"
//! timing_spec = "(" DELAY { "(" (ABSOLUTE | INCREMENT) { path_delay } ")" } ")"
//!             | "(" TIMINGCHECK { check } ")"
//!             | "(" TIMINGENV { path_constraint } ")"
//! path_delay  = "(" IOPATH port port [retain] values ")"
//!             | "(" COND expr "(" IOPATH ... ")" ")"
//!             | "(" INTERCONNECT port port values ")"
//!             | "(" PORT port values ")"
//!             | "(" DEVICE [port] values ")"
//! retain      = "(" RETAIN triple { triple } ")"
//! check       = "(" (SETUPHOLD|SETUP|HOLD|RECOVERY|REMOVAL|SKEW|NOCHANGE)
//!                   port_tchk port_tchk values ")"
//!             | "(" (WIDTH|PERIOD) port_tchk values ")"
//! port_tchk   = port | "(" COND expr port ")"
//! port        = path | "(" (posedge|negedge) path ")"
//! path_constraint = "(" PATHCONSTRAINT port port triple triple ")"
//! values      = triple { triple }
//! triple      = "(" triple_body ")"
//! triple_body = [number] | [number] ":" [number] ":" [number]
//! ```
//!
//! Delay value lists hold 1, 2, 3, 6 or 12 values. Conditional expressions
//! are described in the `expr` module.
//!
//! # Example
//!
//! ```text
//! (DELAYFILE
//!   (SDFVERSION "3.0")
//!   (TIMESCALE 1ns)
//!   (CELL
//!     (CELLTYPE "INV")
//!     (INSTANCE top.u1)
//!     (DELAY (ABSOLUTE (IOPATH A Y (0.1:0.2:0.3))))
//!   )
//! )
//! ```

mod ast;
mod expr;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{Keyword, Lexer, Operator, Token, TokenKind};
pub use parser::{Fragment, Parser, StartRule};

use crate::error::Result;

/// Parse SDF text into a parse tree.
pub fn parse(input: &str) -> Result<DelayFileAst> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse the whole of `input` as a single grammar fragment.
pub fn parse_rule(input: &str, rule: StartRule) -> Result<Fragment> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse_rule(rule)
}
