//! Core types of the SDF document model.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SdfError};

/// Timing entries of one instance, keyed by their unique per-instance key.
pub type Entries = IndexMap<EntryKey, Entry>;

/// Signal edge qualifying a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Posedge,
    Negedge,
}

impl Edge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Edge::Posedge => "posedge",
            Edge::Negedge => "negedge",
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `min:avg:max` value set.
///
/// Any subset of the three slots may be absent. A value written as a single
/// scalar sets all three slots and remembers that form so the writer can
/// reproduce it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Triple {
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    single: bool,
}

impl Triple {
    /// A triple with explicit slots.
    pub fn new(min: Option<f64>, avg: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            avg,
            max,
            single: false,
        }
    }

    /// The empty value `()`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single scalar value applying to all three slots.
    pub fn single(value: f64) -> Self {
        Self {
            min: Some(value),
            avg: Some(value),
            max: Some(value),
            single: true,
        }
    }

    /// True when all three slots are absent.
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.avg.is_none() && self.max.is_none()
    }

    /// True when the value was given as a single scalar.
    pub fn is_single(&self) -> bool {
        self.single && !self.is_empty()
    }
}

/// Renders the body of the triple, without the surrounding parentheses.
impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn slot(f: &mut fmt::Formatter<'_>, v: Option<f64>) -> fmt::Result {
            match v {
                Some(v) => write!(f, "{}", v),
                None => Ok(()),
            }
        }

        if self.is_empty() {
            return Ok(());
        }
        if self.is_single() {
            return slot(f, self.avg);
        }
        slot(f, self.min)?;
        f.write_str(":")?;
        slot(f, self.avg)?;
        f.write_str(":")?;
        slot(f, self.max)
    }
}

/// Named position of a value in an entry's delay list.
///
/// The derived ordering is the order in which the writer emits values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DelaySlot {
    Nominal,
    Rise,
    Fall,
    TurnOff,
    T01,
    T10,
    T0z,
    Tz1,
    T1z,
    Tz0,
    T0x,
    Tx1,
    T1x,
    Tx0,
    Txz,
    Tzx,
    Setup,
    Hold,
}

impl DelaySlot {
    /// Slots of the six-value transition form.
    pub const SIX: [DelaySlot; 6] = [
        DelaySlot::T01,
        DelaySlot::T10,
        DelaySlot::T0z,
        DelaySlot::Tz1,
        DelaySlot::T1z,
        DelaySlot::Tz0,
    ];

    /// Slots of the twelve-value transition form.
    pub const TWELVE: [DelaySlot; 12] = [
        DelaySlot::T01,
        DelaySlot::T10,
        DelaySlot::T0z,
        DelaySlot::Tz1,
        DelaySlot::T1z,
        DelaySlot::Tz0,
        DelaySlot::T0x,
        DelaySlot::Tx1,
        DelaySlot::T1x,
        DelaySlot::Tx0,
        DelaySlot::Txz,
        DelaySlot::Tzx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DelaySlot::Nominal => "nominal",
            DelaySlot::Rise => "rise",
            DelaySlot::Fall => "fall",
            DelaySlot::TurnOff => "turnoff",
            DelaySlot::T01 => "01",
            DelaySlot::T10 => "10",
            DelaySlot::T0z => "0z",
            DelaySlot::Tz1 => "z1",
            DelaySlot::T1z => "1z",
            DelaySlot::Tz0 => "z0",
            DelaySlot::T0x => "0x",
            DelaySlot::Tx1 => "x1",
            DelaySlot::T1x => "1x",
            DelaySlot::Tx0 => "x0",
            DelaySlot::Txz => "xz",
            DelaySlot::Tzx => "zx",
            DelaySlot::Setup => "setup",
            DelaySlot::Hold => "hold",
        }
    }
}

impl fmt::Display for DelaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DelaySlot {
    type Err = SdfError;

    fn from_str(s: &str) -> Result<Self> {
        let slot = match s {
            "nominal" => DelaySlot::Nominal,
            "rise" => DelaySlot::Rise,
            "fall" => DelaySlot::Fall,
            "turnoff" => DelaySlot::TurnOff,
            "01" => DelaySlot::T01,
            "10" => DelaySlot::T10,
            "0z" => DelaySlot::T0z,
            "z1" => DelaySlot::Tz1,
            "1z" => DelaySlot::T1z,
            "z0" => DelaySlot::Tz0,
            "0x" => DelaySlot::T0x,
            "x1" => DelaySlot::Tx1,
            "1x" => DelaySlot::T1x,
            "x0" => DelaySlot::Tx0,
            "xz" => DelaySlot::Txz,
            "zx" => DelaySlot::Tzx,
            "setup" => DelaySlot::Setup,
            "hold" => DelaySlot::Hold,
            _ => return Err(SdfError::semantic(format!("unknown delay slot '{}'", s))),
        };
        Ok(slot)
    }
}

impl Serialize for DelaySlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DelaySlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Kind of timing construct an [`Entry`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Iopath,
    Interconnect,
    Port,
    Device,
    Setuphold,
    Hold,
    Setup,
    Recovery,
    Removal,
    Skew,
    Width,
    Period,
    Nochange,
    Pathconstraint,
}

impl EntryKind {
    /// Lowercase name, used in entry keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Iopath => "iopath",
            EntryKind::Interconnect => "interconnect",
            EntryKind::Port => "port",
            EntryKind::Device => "device",
            EntryKind::Setuphold => "setuphold",
            EntryKind::Hold => "hold",
            EntryKind::Setup => "setup",
            EntryKind::Recovery => "recovery",
            EntryKind::Removal => "removal",
            EntryKind::Skew => "skew",
            EntryKind::Width => "width",
            EntryKind::Period => "period",
            EntryKind::Nochange => "nochange",
            EntryKind::Pathconstraint => "pathconstraint",
        }
    }

    /// SDF keyword of the construct.
    pub fn keyword(&self) -> &'static str {
        match self {
            EntryKind::Iopath => "IOPATH",
            EntryKind::Interconnect => "INTERCONNECT",
            EntryKind::Port => "PORT",
            EntryKind::Device => "DEVICE",
            EntryKind::Setuphold => "SETUPHOLD",
            EntryKind::Hold => "HOLD",
            EntryKind::Setup => "SETUP",
            EntryKind::Recovery => "RECOVERY",
            EntryKind::Removal => "REMOVAL",
            EntryKind::Skew => "SKEW",
            EntryKind::Width => "WIDTH",
            EntryKind::Period => "PERIOD",
            EntryKind::Nochange => "NOCHANGE",
            EntryKind::Pathconstraint => "PATHCONSTRAINT",
        }
    }

    pub fn is_delay(&self) -> bool {
        matches!(
            self,
            EntryKind::Iopath | EntryKind::Interconnect | EntryKind::Port | EntryKind::Device
        )
    }

    pub fn is_timing_check(&self) -> bool {
        !self.is_delay() && *self != EntryKind::Pathconstraint
    }

    /// Constructs naming a single port that stands for both pins.
    pub fn is_single_port(&self) -> bool {
        matches!(
            self,
            EntryKind::Port | EntryKind::Device | EntryKind::Width | EntryKind::Period
        )
    }

    /// Checks that carry a setup/hold pair of limits.
    pub fn has_setup_hold(&self) -> bool {
        matches!(self, EntryKind::Setuphold | EntryKind::Nochange)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// `DELAY (ABSOLUTE ...)`
    Absolute,
    /// `DELAY (INCREMENT ...)`
    Incremental,
    /// `TIMINGCHECK`
    TimingCheck,
    /// `TIMINGENV`
    TimingEnv,
}

/// Port of a two-port timing check that carries its `COND`, in the order
/// the ports are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CondPort {
    First,
    #[default]
    Second,
}

impl CondPort {
    pub fn is_second(&self) -> bool {
        *self == CondPort::Second
    }
}

/// One timing construct of an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub kind: EntryKind,
    pub family: Family,
    pub from_pin: String,
    pub to_pin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_pin_edge: Option<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_pin_edge: Option<Edge>,
    /// Normalized conditional equation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    /// Which check port the condition is written on
    #[serde(default, skip_serializing_if = "CondPort::is_second")]
    pub cond_port: CondPort,
    /// `RETAIN` values of an IOPATH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain: Option<Vec<Triple>>,
    pub delay_paths: BTreeMap<DelaySlot, Triple>,
}

impl Entry {
    /// Create an entry with no edges, condition or values.
    pub fn new(
        kind: EntryKind,
        family: Family,
        from_pin: impl Into<String>,
        to_pin: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            family,
            from_pin: from_pin.into(),
            to_pin: to_pin.into(),
            from_pin_edge: None,
            to_pin_edge: None,
            cond: None,
            cond_port: CondPort::Second,
            retain: None,
            delay_paths: BTreeMap::new(),
        }
    }

    /// Set a named value slot.
    pub fn with_value(mut self, slot: DelaySlot, value: Triple) -> Self {
        self.delay_paths.insert(slot, value);
        self
    }

    /// Attach a conditional equation.
    pub fn with_cond(mut self, equation: impl Into<String>) -> Self {
        self.cond = Some(equation.into());
        self
    }

    pub fn is_absolute(&self) -> bool {
        self.family == Family::Absolute
    }

    pub fn is_incremental(&self) -> bool {
        self.family == Family::Incremental
    }

    pub fn is_timing_check(&self) -> bool {
        self.family == Family::TimingCheck
    }

    pub fn is_timing_env(&self) -> bool {
        self.family == Family::TimingEnv
    }

    pub fn is_cond(&self) -> bool {
        self.cond.is_some()
    }

    pub fn cond_equation(&self) -> Option<&str> {
        self.cond.as_deref()
    }

    /// Key name before disambiguation: `{kind}_{from}_{to}`, with an
    /// `increment_` prefix for incremental delays.
    pub fn key_name(&self) -> String {
        let prefix = if self.is_incremental() { "increment_" } else { "" };
        format!("{}{}_{}_{}", prefix, self.kind, self.from_pin, self.to_pin)
    }
}

/// Unique key of an entry within its instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey {
    pub name: String,
    pub index: usize,
}

impl EntryKey {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            f.write_str(&self.name)
        } else {
            write!(f, "{}#{}", self.name, self.index)
        }
    }
}

impl FromStr for EntryKey {
    type Err = SdfError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some((name, index)) = split_index(s) {
            let index = index
                .parse::<usize>()
                .ok()
                .filter(|&i| i > 0)
                .ok_or_else(|| SdfError::semantic(format!("malformed entry key '{}'", s)))?;
            Ok(Self::new(name, index))
        } else {
            Ok(Self::new(s, 0))
        }
    }
}

/// Split `name#n` at its last unescaped `#`. A `#` after an odd run of
/// backslashes belongs to an escaped path character.
fn split_index(s: &str) -> Option<(&str, &str)> {
    let (name, index) = s.rsplit_once('#')?;
    let escapes = name.bytes().rev().take_while(|&b| b == b'\\').count();
    (escapes % 2 == 0).then_some((name, index))
}

impl Serialize for EntryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Unit of a `TIMESCALE` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    S,
    Ms,
    Us,
    Ns,
    Ps,
    Fs,
}

impl TimeUnit {
    /// Parse a unit name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "s" => Some(Self::S),
            "ms" => Some(Self::Ms),
            "us" => Some(Self::Us),
            "ns" => Some(Self::Ns),
            "ps" => Some(Self::Ps),
            "fs" => Some(Self::Fs),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S => "s",
            Self::Ms => "ms",
            Self::Us => "us",
            Self::Ns => "ns",
            Self::Ps => "ps",
            Self::Fs => "fs",
        }
    }
}

/// `TIMESCALE` header value, e.g. `100 ps`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timescale {
    pub magnitude: f64,
    pub unit: TimeUnit,
}

impl fmt::Display for Timescale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit.as_str())
    }
}

/// Recognized `DELAYFILE` header items.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdfversion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divider: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage: Option<Triple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Triple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timescale: Option<Timescale>,
}

impl Header {
    /// Hierarchy divider, `.` unless declared otherwise.
    pub fn divider(&self) -> char {
        self.divider.unwrap_or('.')
    }
}

/// A parsed SDF file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub header: Header,
    /// Cell type -> instance name -> entries
    #[serde(default)]
    pub cells: IndexMap<String, IndexMap<String, Entries>>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of one instance of a cell type.
    pub fn instance(&self, celltype: &str, instance: &str) -> Option<&Entries> {
        self.cells.get(celltype)?.get(instance)
    }

    /// Register an instance without entries.
    pub fn add_instance(&mut self, celltype: &str, instance: &str) -> &mut Entries {
        self.cells
            .entry(celltype.to_string())
            .or_default()
            .entry(instance.to_string())
            .or_default()
    }

    /// Add an entry to an instance, returning the key it was stored under.
    ///
    /// The key name comes from [`Entry::key_name`]; repeated names take the
    /// next free index.
    pub fn add_entry(&mut self, celltype: &str, instance: &str, entry: Entry) -> EntryKey {
        let entries = self.add_instance(celltype, instance);
        let name = entry.key_name();
        let mut key = EntryKey::new(name, 0);
        while entries.contains_key(&key) {
            key.index += 1;
        }
        entries.insert(key.clone(), entry);
        key
    }

    /// Total number of entries across all instances.
    pub fn entry_count(&self) -> usize {
        self.cells
            .values()
            .flat_map(|instances| instances.values())
            .map(|entries| entries.len())
            .sum()
    }

    /// Iterate over `(celltype, instance, key, entry)`.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &EntryKey, &Entry)> {
        self.cells.iter().flat_map(|(celltype, instances)| {
            instances.iter().flat_map(move |(instance, entries)| {
                entries
                    .iter()
                    .map(move |(key, entry)| (celltype.as_str(), instance.as_str(), key, entry))
            })
        })
    }
}
