//! Reduction of the parse tree to the document model.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::types::*;
use crate::error::{Result, SdfError};
use crate::sdf::{
    CellAst, CheckAst, CheckKind, DelayFileAst, DelayMode, HeaderItem, PathConstraintAst,
    PathDelay, PortSpec, TimingSpec,
};

impl Document {
    /// Build a document from a parse tree.
    ///
    /// Value lists are named by position, entries are keyed per instance and
    /// cells sharing a cell type and instance are merged.
    pub fn from_ast(ast: DelayFileAst) -> Result<Self> {
        let mut doc = Document::new();

        for item in ast.header {
            doc.header.apply(item)?;
        }

        for cell in ast.cells {
            doc.add_cell(cell)?;
        }

        debug!(
            celltypes = doc.cells.len(),
            entries = doc.entry_count(),
            "built SDF document"
        );
        Ok(doc)
    }

    fn add_cell(&mut self, cell: CellAst) -> Result<()> {
        trace!(
            celltype = %cell.celltype,
            instance = %cell.instance,
            line = cell.line,
            "adding cell"
        );
        self.add_instance(&cell.celltype, &cell.instance);

        for spec in cell.specs {
            let entries = match spec {
                TimingSpec::Delay(blocks) => {
                    let mut entries = Vec::new();
                    for block in blocks {
                        let family = match block.mode {
                            DelayMode::Absolute => Family::Absolute,
                            DelayMode::Increment => Family::Incremental,
                        };
                        for path in block.paths {
                            entries.push(delay_entry(path, family)?);
                        }
                    }
                    entries
                }
                TimingSpec::TimingCheck(checks) => checks
                    .into_iter()
                    .map(check_entry)
                    .collect::<Result<Vec<_>>>()?,
                TimingSpec::TimingEnv(constraints) => {
                    constraints.into_iter().map(constraint_entry).collect()
                }
            };
            for entry in entries {
                self.add_entry(&cell.celltype, &cell.instance, entry);
            }
        }
        Ok(())
    }
}

impl Header {
    /// Record a header item; each item may appear once.
    fn apply(&mut self, item: HeaderItem) -> Result<()> {
        fn set<T>(slot: &mut Option<T>, value: T, keyword: &str) -> Result<()> {
            if slot.is_some() {
                return Err(SdfError::semantic(format!(
                    "duplicate header item {}",
                    keyword
                )));
            }
            *slot = Some(value);
            Ok(())
        }

        let keyword = item.keyword();
        match item {
            HeaderItem::SdfVersion(v) => set(&mut self.sdfversion, v, keyword),
            HeaderItem::Design(v) => set(&mut self.design, v, keyword),
            HeaderItem::Date(v) => set(&mut self.date, v, keyword),
            HeaderItem::Vendor(v) => set(&mut self.vendor, v, keyword),
            HeaderItem::Program(v) => set(&mut self.program, v, keyword),
            HeaderItem::Version(v) => set(&mut self.version, v, keyword),
            HeaderItem::Divider(v) => set(&mut self.divider, v, keyword),
            HeaderItem::Voltage(v) => set(&mut self.voltage, v, keyword),
            HeaderItem::Process(v) => set(&mut self.process, v, keyword),
            HeaderItem::Temperature(v) => set(&mut self.temperature, v, keyword),
            HeaderItem::Timescale(v) => set(&mut self.timescale, v, keyword),
        }
    }
}

/// Slot names for a delay value list of the given length.
pub(crate) fn delay_slots(count: usize) -> Option<&'static [DelaySlot]> {
    match count {
        1 => Some(&[DelaySlot::Nominal]),
        2 => Some(&[DelaySlot::Rise, DelaySlot::Fall]),
        3 => Some(&[DelaySlot::Rise, DelaySlot::Fall, DelaySlot::TurnOff]),
        6 => Some(&DelaySlot::SIX),
        12 => Some(&DelaySlot::TWELVE),
        _ => None,
    }
}

/// Slot names for a timing check value list of the given length.
pub(crate) fn check_slots(kind: EntryKind, count: usize) -> Option<&'static [DelaySlot]> {
    match (kind.has_setup_hold(), count) {
        (_, 1) => Some(&[DelaySlot::Nominal]),
        (true, 2) => Some(&[DelaySlot::Setup, DelaySlot::Hold]),
        _ => None,
    }
}

/// Slot names for a path constraint value list of the given length.
pub(crate) fn constraint_slots(count: usize) -> Option<&'static [DelaySlot]> {
    match count {
        2 => Some(&[DelaySlot::Rise, DelaySlot::Fall]),
        _ => None,
    }
}

fn named_values(
    slots: Option<&[DelaySlot]>,
    values: Vec<Triple>,
    keyword: &str,
) -> Result<BTreeMap<DelaySlot, Triple>> {
    let count = values.len();
    let slots = slots.ok_or_else(|| {
        SdfError::semantic(format!("{} cannot take {} value(s)", keyword, count))
    })?;
    Ok(slots.iter().copied().zip(values).collect())
}

fn with_ports(mut entry: Entry, from: &PortSpec, to: &PortSpec) -> Entry {
    entry.from_pin_edge = from.edge;
    entry.to_pin_edge = to.edge;
    entry
}

fn delay_entry(path: PathDelay, family: Family) -> Result<Entry> {
    let entry = match path {
        PathDelay::IoPath {
            cond,
            input,
            output,
            retain,
            values,
        } => {
            let mut entry = Entry::new(EntryKind::Iopath, family, &input.path, &output.path);
            entry.cond = cond;
            entry.retain = retain;
            entry.delay_paths = named_values(delay_slots(values.len()), values, "IOPATH")?;
            with_ports(entry, &input, &output)
        }
        PathDelay::Interconnect {
            source,
            dest,
            values,
        } => {
            let mut entry = Entry::new(EntryKind::Interconnect, family, &source.path, &dest.path);
            entry.delay_paths = named_values(delay_slots(values.len()), values, "INTERCONNECT")?;
            with_ports(entry, &source, &dest)
        }
        PathDelay::Port { port, values } => {
            let mut entry = Entry::new(EntryKind::Port, family, &port.path, &port.path);
            entry.delay_paths = named_values(delay_slots(values.len()), values, "PORT")?;
            with_ports(entry, &port, &port)
        }
        PathDelay::Device { port, values } => {
            let port = port.unwrap_or_else(|| PortSpec::plain(""));
            let mut entry = Entry::new(EntryKind::Device, family, &port.path, &port.path);
            entry.delay_paths = named_values(delay_slots(values.len()), values, "DEVICE")?;
            with_ports(entry, &port, &port)
        }
    };
    Ok(entry)
}

fn check_kind(kind: CheckKind) -> EntryKind {
    match kind {
        CheckKind::SetupHold => EntryKind::Setuphold,
        CheckKind::Setup => EntryKind::Setup,
        CheckKind::Hold => EntryKind::Hold,
        CheckKind::Recovery => EntryKind::Recovery,
        CheckKind::Removal => EntryKind::Removal,
        CheckKind::Skew => EntryKind::Skew,
        CheckKind::Width => EntryKind::Width,
        CheckKind::Period => EntryKind::Period,
        CheckKind::NoChange => EntryKind::Nochange,
    }
}

fn check_entry(check: CheckAst) -> Result<Entry> {
    let kind = check_kind(check.kind);
    let keyword = kind.keyword();

    let conds: Vec<&String> = check.ports.iter().filter_map(|p| p.cond.as_ref()).collect();
    if conds.len() > 1 {
        return Err(SdfError::semantic(format!(
            "{} at line {} has COND on both ports",
            keyword, check.line
        )));
    }
    let cond = conds.first().map(|c| c.to_string());
    let cond_port = match check.ports.as_slice() {
        [first, _] if first.cond.is_some() => CondPort::First,
        _ => CondPort::Second,
    };

    let (from, to) = match check.ports.as_slice() {
        [only] if kind.is_single_port() => (&only.port, &only.port),
        // NOCHANGE names its ports in the opposite order
        [first, second] if kind == EntryKind::Nochange => (&second.port, &first.port),
        [first, second] if !kind.is_single_port() => (&first.port, &second.port),
        ports => {
            return Err(SdfError::semantic(format!(
                "{} at line {} has {} port(s)",
                keyword,
                check.line,
                ports.len()
            )))
        }
    };

    let mut entry = with_ports(
        Entry::new(kind, Family::TimingCheck, &from.path, &to.path),
        from,
        to,
    );
    entry.cond = cond;
    entry.cond_port = cond_port;
    entry.delay_paths = named_values(
        check_slots(kind, check.values.len()),
        check.values,
        keyword,
    )?;
    Ok(entry)
}

fn constraint_entry(constraint: PathConstraintAst) -> Entry {
    let PathConstraintAst {
        output,
        input,
        rise,
        fall,
    } = constraint;
    with_ports(
        Entry::new(
            EntryKind::Pathconstraint,
            Family::TimingEnv,
            &input.path,
            &output.path,
        ),
        &input,
        &output,
    )
    .with_value(DelaySlot::Rise, rise)
    .with_value(DelaySlot::Fall, fall)
}
