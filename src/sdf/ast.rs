//! Parse tree produced by the grammar parser.
//!
//! The tree mirrors the textual structure of the file: blocks keep their
//! order and value lists keep their positional form. Naming the values and
//! keying the entries is left to the document builder.

use crate::document::{Edge, Timescale, Triple};

/// Complete parse tree of a `DELAYFILE`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelayFileAst {
    /// Header items in source order
    pub header: Vec<HeaderItem>,
    /// Cells in source order
    pub cells: Vec<CellAst>,
}

/// A header item of the `DELAYFILE`.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderItem {
    SdfVersion(String),
    Design(String),
    Date(String),
    Vendor(String),
    Program(String),
    Version(String),
    Divider(char),
    Voltage(Triple),
    Process(String),
    Temperature(Triple),
    Timescale(Timescale),
}

impl HeaderItem {
    /// SDF keyword of the item.
    pub fn keyword(&self) -> &'static str {
        match self {
            HeaderItem::SdfVersion(_) => "SDFVERSION",
            HeaderItem::Design(_) => "DESIGN",
            HeaderItem::Date(_) => "DATE",
            HeaderItem::Vendor(_) => "VENDOR",
            HeaderItem::Program(_) => "PROGRAM",
            HeaderItem::Version(_) => "VERSION",
            HeaderItem::Divider(_) => "DIVIDER",
            HeaderItem::Voltage(_) => "VOLTAGE",
            HeaderItem::Process(_) => "PROCESS",
            HeaderItem::Temperature(_) => "TEMPERATURE",
            HeaderItem::Timescale(_) => "TIMESCALE",
        }
    }
}

/// A `CELL` block.
#[derive(Debug, Clone, PartialEq)]
pub struct CellAst {
    pub celltype: String,
    /// Instance path; `*` for wildcard, empty for the top level
    pub instance: String,
    pub specs: Vec<TimingSpec>,
    /// Source line number for diagnostics
    pub line: usize,
}

/// A timing specification block inside a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum TimingSpec {
    Delay(Vec<DelayBlock>),
    TimingCheck(Vec<CheckAst>),
    TimingEnv(Vec<PathConstraintAst>),
}

/// Whether delays replace or add to existing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayMode {
    Absolute,
    Increment,
}

/// An `ABSOLUTE` or `INCREMENT` block.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayBlock {
    pub mode: DelayMode,
    pub paths: Vec<PathDelay>,
}

/// A port reference, optionally edge-qualified.
#[derive(Debug, Clone, PartialEq)]
pub struct PortSpec {
    pub path: String,
    pub edge: Option<Edge>,
}

impl PortSpec {
    pub fn plain(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            edge: None,
        }
    }
}

/// A timing-check port, optionally gated by a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckPort {
    pub port: PortSpec,
    pub cond: Option<String>,
}

/// A path delay entry.
#[derive(Debug, Clone, PartialEq)]
pub enum PathDelay {
    IoPath {
        cond: Option<String>,
        input: PortSpec,
        output: PortSpec,
        retain: Option<Vec<Triple>>,
        values: Vec<Triple>,
    },
    Interconnect {
        source: PortSpec,
        dest: PortSpec,
        values: Vec<Triple>,
    },
    Port {
        port: PortSpec,
        values: Vec<Triple>,
    },
    Device {
        port: Option<PortSpec>,
        values: Vec<Triple>,
    },
}

/// Kind of a timing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    SetupHold,
    Setup,
    Hold,
    Recovery,
    Removal,
    Skew,
    Width,
    Period,
    NoChange,
}

impl CheckKind {
    /// Number of port specs the check takes.
    pub fn port_count(&self) -> usize {
        match self {
            CheckKind::Width | CheckKind::Period => 1,
            _ => 2,
        }
    }

    /// Largest number of values the check takes.
    pub fn max_values(&self) -> usize {
        match self {
            CheckKind::SetupHold | CheckKind::NoChange => 2,
            _ => 1,
        }
    }
}

/// A timing check entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckAst {
    pub kind: CheckKind,
    pub ports: Vec<CheckPort>,
    pub values: Vec<Triple>,
    pub line: usize,
}

/// A `PATHCONSTRAINT` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PathConstraintAst {
    pub output: PortSpec,
    pub input: PortSpec,
    pub rise: Triple,
    pub fall: Triple,
}
