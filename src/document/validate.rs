//! Document validation.

use std::collections::BTreeMap;

use crate::error::{Result, SdfError};
use crate::sdf::{self, StartRule};

use super::builder::{check_slots, constraint_slots, delay_slots};
use super::types::*;

/// Validate a document that was not produced by the parser.
///
/// Checks:
/// - Each entry's family matches its kind
/// - Value slots are a set the kind can carry
/// - Keys match the entry they index
/// - Conditions and RETAIN only appear where SDF allows them
/// - Every number is finite and quoted text contains no quotes
///
/// A document passing validation emits text that parses back to an equal
/// document.
pub fn validate_document(doc: &Document) -> Result<()> {
    validate_header(&doc.header)?;

    for (celltype, instances) in &doc.cells {
        check_quoted("CELLTYPE", celltype)?;
        for (instance, entries) in instances {
            if instance != "*" && !is_path(instance) && !instance.is_empty() {
                return Err(SdfError::semantic(format!(
                    "cell '{}' has malformed instance '{}'",
                    celltype, instance
                )));
            }
            check_indices(entries).map_err(|e| {
                SdfError::semantic(format!(
                    "cell '{}' instance '{}': {}",
                    celltype,
                    instance,
                    detail(e)
                ))
            })?;
            for (key, entry) in entries {
                validate_entry(key, entry).map_err(|e| {
                    SdfError::semantic(format!(
                        "cell '{}' instance '{}' entry '{}': {}",
                        celltype,
                        instance,
                        key,
                        detail(e)
                    ))
                })?;
            }
        }
    }
    Ok(())
}

/// Entries sharing a key name must be numbered `0..n`.
fn check_indices(entries: &Entries) -> Result<()> {
    let mut indices: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for key in entries.keys() {
        indices.entry(key.name.as_str()).or_default().push(key.index);
    }
    for (name, mut found) in indices {
        found.sort_unstable();
        if found.iter().enumerate().any(|(i, &index)| i != index) {
            return Err(SdfError::semantic(format!(
                "entries named '{}' are not numbered consecutively from 0",
                name
            )));
        }
    }
    Ok(())
}

fn detail(err: SdfError) -> String {
    match err {
        SdfError::SemanticError { message } => message,
        other => other.to_string(),
    }
}

fn validate_header(header: &Header) -> Result<()> {
    let quoted = [
        ("SDFVERSION", &header.sdfversion),
        ("DESIGN", &header.design),
        ("DATE", &header.date),
        ("VENDOR", &header.vendor),
        ("PROGRAM", &header.program),
        ("VERSION", &header.version),
        ("PROCESS", &header.process),
    ];
    for (keyword, value) in quoted {
        if let Some(value) = value {
            check_quoted(keyword, value)?;
        }
    }

    if let Some(divider) = header.divider {
        if divider != '.' && divider != '/' {
            return Err(SdfError::semantic(format!(
                "DIVIDER must be '.' or '/', got '{}'",
                divider
            )));
        }
    }

    for (keyword, value) in [("VOLTAGE", &header.voltage), ("TEMPERATURE", &header.temperature)] {
        if let Some(triple) = value {
            if triple.is_empty() {
                return Err(SdfError::semantic(format!("{} has no value", keyword)));
            }
            check_triple(triple)?;
        }
    }

    if let Some(timescale) = header.timescale {
        if !timescale.magnitude.is_finite() {
            return Err(SdfError::semantic("TIMESCALE magnitude is not finite"));
        }
    }
    Ok(())
}

fn check_quoted(keyword: &str, value: &str) -> Result<()> {
    let mut escaped = false;
    for c in value.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Err(SdfError::semantic(format!(
                "{} text contains an unescaped double quote",
                keyword
            )));
        }
    }
    if escaped {
        return Err(SdfError::semantic(format!(
            "{} text ends with a dangling escape",
            keyword
        )));
    }
    Ok(())
}

fn check_triple(triple: &Triple) -> Result<()> {
    let finite = [triple.min, triple.avg, triple.max]
        .into_iter()
        .flatten()
        .all(f64::is_finite);
    if !finite {
        return Err(SdfError::semantic("value is not finite"));
    }
    Ok(())
}

/// A hierarchical path the lexer reads back as a single token.
fn is_path(text: &str) -> bool {
    let mut chars = text.chars();
    let starts_ok = match (chars.next(), chars.next()) {
        (Some('.'), Some(c)) if c.is_ascii_digit() => false,
        (Some(c), _) => c.is_ascii_alphabetic() || matches!(c, '_' | '$' | '\\' | '/' | '.' | '['),
        (None, _) => false,
    };
    if !starts_ok || text.contains("//") || text.contains("/*") {
        return false;
    }

    // A backslash escapes the next character, whatever it is.
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        let ok = match c {
            '\\' => chars.next().is_some(),
            c => c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | '.' | '[' | ']'),
        };
        if !ok {
            return false;
        }
    }
    true
}

fn validate_entry(key: &EntryKey, entry: &Entry) -> Result<()> {
    let kind = entry.kind;

    let family_ok = match entry.family {
        Family::Absolute | Family::Incremental => kind.is_delay(),
        Family::TimingCheck => kind.is_timing_check(),
        Family::TimingEnv => kind == EntryKind::Pathconstraint,
    };
    if !family_ok {
        return Err(SdfError::semantic(format!(
            "{} cannot belong to {:?}",
            kind.keyword(),
            entry.family
        )));
    }

    if key.name != entry.key_name() {
        return Err(SdfError::semantic(format!(
            "key does not match entry, expected '{}'",
            entry.key_name()
        )));
    }

    let device_without_port = kind == EntryKind::Device && entry.from_pin.is_empty();
    if !device_without_port {
        for pin in [&entry.from_pin, &entry.to_pin] {
            if !is_path(pin) {
                return Err(SdfError::semantic(format!("malformed pin '{}'", pin)));
            }
        }
    }
    if kind.is_single_port()
        && (entry.from_pin != entry.to_pin || entry.from_pin_edge != entry.to_pin_edge)
    {
        return Err(SdfError::semantic(format!(
            "{} names a single port but its pins differ",
            kind.keyword()
        )));
    }

    let slots: Vec<DelaySlot> = entry.delay_paths.keys().copied().collect();
    let count = slots.len();
    let expected = if kind.is_delay() {
        delay_slots(count)
    } else if kind.is_timing_check() {
        check_slots(kind, count)
    } else {
        constraint_slots(count)
    };
    if expected != Some(slots.as_slice()) {
        return Err(SdfError::semantic(format!(
            "{} cannot carry values {:?}",
            kind.keyword(),
            slots.iter().map(DelaySlot::as_str).collect::<Vec<_>>()
        )));
    }
    for triple in entry.delay_paths.values() {
        check_triple(triple)?;
    }

    if let Some(retain) = &entry.retain {
        if kind != EntryKind::Iopath {
            return Err(SdfError::semantic("RETAIN is only allowed on IOPATH"));
        }
        if retain.is_empty() || retain.len() > 3 {
            return Err(SdfError::semantic("RETAIN takes one to three values"));
        }
        for triple in retain {
            check_triple(triple)?;
        }
    }

    if let Some(cond) = &entry.cond {
        if kind != EntryKind::Iopath && !kind.is_timing_check() {
            return Err(SdfError::semantic(format!(
                "COND is not allowed on {}",
                kind.keyword()
            )));
        }
        sdf::parse_rule(cond, StartRule::Expression)?;
    }
    if entry.cond_port == CondPort::First
        && (entry.cond.is_none() || !kind.is_timing_check() || kind.is_single_port())
    {
        return Err(SdfError::semantic(
            "only a conditional two-port timing check can put COND on its first port",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(entry: Entry) -> Document {
        let mut doc = Document::new();
        doc.add_entry("C", "u1", entry);
        doc
    }

    fn iopath() -> Entry {
        Entry::new(EntryKind::Iopath, Family::Absolute, "a", "y")
            .with_value(DelaySlot::Nominal, Triple::single(1.0))
    }

    #[test]
    fn test_valid_entries() {
        assert!(validate_document(&doc_with(iopath())).is_ok());
        assert!(validate_document(&doc_with(iopath().with_cond("en == 1'b1"))).is_ok());

        let width = Entry::new(EntryKind::Width, Family::TimingCheck, "clk", "clk")
            .with_value(DelaySlot::Nominal, Triple::single(2.0));
        assert!(validate_document(&doc_with(width)).is_ok());

        let device = Entry::new(EntryKind::Device, Family::Absolute, "", "")
            .with_value(DelaySlot::Rise, Triple::empty())
            .with_value(DelaySlot::Fall, Triple::empty());
        assert!(validate_document(&doc_with(device)).is_ok());
    }

    #[test]
    fn test_family_mismatch() {
        let mut entry = iopath();
        entry.family = Family::TimingCheck;
        assert!(validate_document(&doc_with(entry)).is_err());
    }

    #[test]
    fn test_bad_slots() {
        let entry = Entry::new(EntryKind::Iopath, Family::Absolute, "a", "y")
            .with_value(DelaySlot::Rise, Triple::single(1.0));
        assert!(validate_document(&doc_with(entry)).is_err());

        let entry = Entry::new(EntryKind::Setup, Family::TimingCheck, "d", "clk")
            .with_value(DelaySlot::Setup, Triple::single(1.0))
            .with_value(DelaySlot::Hold, Triple::single(1.0));
        assert!(validate_document(&doc_with(entry)).is_err());

        let entry = Entry::new(EntryKind::Iopath, Family::Absolute, "a", "y")
            .with_value(DelaySlot::Nominal, Triple::single(f64::NAN));
        assert!(validate_document(&doc_with(entry)).is_err());
    }

    #[test]
    fn test_key_mismatch() {
        let mut doc = doc_with(iopath());
        let entries = doc.cells.get_mut("C").unwrap().get_mut("u1").unwrap();
        let entry = entries.swap_remove(&EntryKey::new("iopath_a_y", 0)).unwrap();
        entries.insert(EntryKey::new("iopath_b_y", 0), entry);
        assert!(validate_document(&doc).is_err());
    }

    #[test]
    fn test_key_gap() {
        let mut doc = doc_with(iopath());
        let entries = doc.cells.get_mut("C").unwrap().get_mut("u1").unwrap();
        entries.insert(EntryKey::new("iopath_a_y", 2), iopath());
        assert!(validate_document(&doc).is_err());
    }

    #[test]
    fn test_cond_placement() {
        let entry = Entry::new(EntryKind::Interconnect, Family::Absolute, "a", "b")
            .with_value(DelaySlot::Nominal, Triple::single(1.0))
            .with_cond("en");
        assert!(validate_document(&doc_with(entry)).is_err());

        assert!(validate_document(&doc_with(iopath().with_cond("a &"))).is_err());

        let setup = Entry::new(EntryKind::Setup, Family::TimingCheck, "d", "clk")
            .with_value(DelaySlot::Nominal, Triple::single(1.0))
            .with_cond("en");
        let mut first = setup.clone();
        first.cond_port = CondPort::First;
        assert!(validate_document(&doc_with(first)).is_ok());

        let mut unconditional = setup.clone();
        unconditional.cond = None;
        unconditional.cond_port = CondPort::First;
        assert!(validate_document(&doc_with(unconditional)).is_err());

        let mut on_iopath = iopath().with_cond("en");
        on_iopath.cond_port = CondPort::First;
        assert!(validate_document(&doc_with(on_iopath)).is_err());
    }

    #[test]
    fn test_header_checks() {
        let mut doc = Document::new();
        doc.header.divider = Some(':');
        assert!(validate_document(&doc).is_err());

        let mut doc = Document::new();
        doc.header.design = Some("has \"quote\"".to_string());
        assert!(validate_document(&doc).is_err());

        let mut doc = Document::new();
        doc.header.voltage = Some(Triple::empty());
        assert!(validate_document(&doc).is_err());
    }

    #[test]
    fn test_pins_must_be_paths() {
        let entry = Entry::new(EntryKind::Iopath, Family::Absolute, "a b", "y")
            .with_value(DelaySlot::Nominal, Triple::single(1.0));
        assert!(validate_document(&doc_with(entry)).is_err());

        assert!(is_path(r"b\#1"));
        assert!(is_path(r"\#net"));
        assert!(!is_path("b#1"));
        assert!(!is_path("b\\"));
    }
}
