//! Canonical SDF writer.
//!
//! The output is deterministic: header items appear in a fixed order, cells
//! are sorted by cell type then instance, and the entries of each section are
//! sorted by key. Every construct occupies a single line and the text ends
//! without a trailing newline.

use tracing::debug;

use crate::document::{
    CondPort, Document, Edge, Entries, Entry, EntryKey, EntryKind, Family, Triple,
};

/// Options controlling the writer's layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// One level of indentation
    pub indent: String,
    /// Upper-case cell type names
    pub uppercase_celltype: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            uppercase_celltype: false,
        }
    }
}

impl EmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indentation unit.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Indent with `width` spaces per level.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent = " ".repeat(width);
        self
    }

    pub fn with_uppercase_celltype(mut self, uppercase: bool) -> Self {
        self.uppercase_celltype = uppercase;
        self
    }
}

/// Render a document as canonical SDF text.
pub fn emit(doc: &Document, options: &EmitOptions) -> String {
    let mut writer = Writer {
        options,
        lines: Vec::new(),
        depth: 0,
    };
    writer.emit_document(doc);
    let text = writer.lines.join("\n");
    debug!(
        celltypes = doc.cells.len(),
        entries = doc.entry_count(),
        bytes = text.len(),
        "emitted SDF"
    );
    text
}

struct Writer<'o> {
    options: &'o EmitOptions,
    lines: Vec<String>,
    depth: usize,
}

impl Writer<'_> {
    fn line(&mut self, text: impl AsRef<str>) {
        let mut line = self.options.indent.repeat(self.depth);
        line.push_str(text.as_ref());
        self.lines.push(line);
    }

    /// Emit `(KEYWORD`, the body one level deeper, then `)`.
    fn block(&mut self, keyword: &str, body: impl FnOnce(&mut Self)) {
        self.line(format!("({}", keyword));
        self.depth += 1;
        body(self);
        self.depth -= 1;
        self.line(")");
    }

    fn emit_document(&mut self, doc: &Document) {
        self.block("DELAYFILE", |w| {
            w.emit_header(doc);

            let mut cells: Vec<(&String, &String, &Entries)> = doc
                .cells
                .iter()
                .flat_map(|(celltype, instances)| {
                    instances
                        .iter()
                        .map(move |(instance, entries)| (celltype, instance, entries))
                })
                .collect();
            cells.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

            for (celltype, instance, entries) in cells {
                w.emit_cell(celltype, instance, entries);
            }
        });
    }

    fn emit_header(&mut self, doc: &Document) {
        let h = &doc.header;
        let quoted = |keyword: &str, value: &Option<String>| {
            value
                .as_ref()
                .map(|v| format!("({} \"{}\")", keyword, v))
        };

        let items = [
            quoted("SDFVERSION", &h.sdfversion),
            quoted("DESIGN", &h.design),
            quoted("DATE", &h.date),
            quoted("VENDOR", &h.vendor),
            quoted("PROGRAM", &h.program),
            quoted("VERSION", &h.version),
            h.divider.map(|d| format!("(DIVIDER {})", d)),
            h.voltage.map(|v| format!("(VOLTAGE {})", v)),
            quoted("PROCESS", &h.process),
            h.temperature.map(|t| format!("(TEMPERATURE {})", t)),
            h.timescale.map(|t| format!("(TIMESCALE {})", t)),
        ];
        for item in items.into_iter().flatten() {
            self.line(item);
        }
    }

    fn emit_cell(&mut self, celltype: &str, instance: &str, entries: &Entries) {
        let celltype = if self.options.uppercase_celltype {
            celltype.to_uppercase()
        } else {
            celltype.to_string()
        };

        let section = |family: Family| {
            let mut selected: Vec<(&EntryKey, &Entry)> =
                entries.iter().filter(|(_, e)| e.family == family).collect();
            selected.sort_by(|a, b| a.0.cmp(b.0));
            selected.into_iter().map(|(_, e)| e).collect::<Vec<_>>()
        };
        let absolute = section(Family::Absolute);
        let increment = section(Family::Incremental);
        let checks = section(Family::TimingCheck);
        let env = section(Family::TimingEnv);

        self.block("CELL", |w| {
            w.line(format!("(CELLTYPE \"{}\")", celltype));
            if instance.is_empty() {
                w.line("(INSTANCE)");
            } else {
                w.line(format!("(INSTANCE {})", instance));
            }

            if !absolute.is_empty() || !increment.is_empty() {
                w.block("DELAY", |w| {
                    for (keyword, group) in [("ABSOLUTE", &absolute), ("INCREMENT", &increment)] {
                        if !group.is_empty() {
                            w.block(keyword, |w| {
                                for entry in group.iter() {
                                    w.line(delay_line(entry));
                                }
                            });
                        }
                    }
                });
            }
            if !checks.is_empty() {
                w.block("TIMINGCHECK", |w| {
                    for entry in &checks {
                        w.line(check_line(entry));
                    }
                });
            }
            if !env.is_empty() {
                w.block("TIMINGENV", |w| {
                    for entry in &env {
                        w.line(constraint_line(entry));
                    }
                });
            }
        });
    }
}

/// Render a value with its parentheses: `()`, `(v)` or `(min:avg:max)`.
pub fn format_triple(triple: &Triple) -> String {
    format!("({})", triple)
}

fn values(entry: &Entry) -> String {
    entry
        .delay_paths
        .values()
        .map(format_triple)
        .collect::<Vec<_>>()
        .join(" ")
}

fn port(pin: &str, edge: Option<Edge>) -> String {
    match edge {
        Some(edge) => format!("({} {})", edge, pin),
        None => pin.to_string(),
    }
}

/// Close up the spacing inside parentheses: `( B | C )` becomes `(B | C)`.
pub fn tighten_equation(equation: &str) -> String {
    equation.replace("( ", "(").replace(" )", ")")
}

fn delay_line(entry: &Entry) -> String {
    let from = port(&entry.from_pin, entry.from_pin_edge);
    let to = port(&entry.to_pin, entry.to_pin_edge);
    match entry.kind {
        EntryKind::Iopath => {
            let retain = match &entry.retain {
                Some(retain) => format!(
                    " (RETAIN {})",
                    retain.iter().map(format_triple).collect::<Vec<_>>().join(" ")
                ),
                None => String::new(),
            };
            let iopath = format!("(IOPATH {} {}{} {})", from, to, retain, values(entry));
            match &entry.cond {
                Some(cond) => format!("(COND {} {})", tighten_equation(cond), iopath),
                None => iopath,
            }
        }
        EntryKind::Device if entry.from_pin.is_empty() => format!("(DEVICE {})", values(entry)),
        EntryKind::Port | EntryKind::Device => {
            format!("({} {} {})", entry.kind.keyword(), from, values(entry))
        }
        _ => format!("({} {} {} {})", entry.kind.keyword(), from, to, values(entry)),
    }
}

fn check_line(entry: &Entry) -> String {
    let from = port(&entry.from_pin, entry.from_pin_edge);
    let to = port(&entry.to_pin, entry.to_pin_edge);
    let wrap = |port: String| match &entry.cond {
        Some(cond) => format!("(COND {} {})", tighten_equation(cond), port),
        None => port,
    };

    let ports = if entry.kind.is_single_port() {
        wrap(from)
    } else {
        let (first, second) = if entry.kind == EntryKind::Nochange {
            (to, from)
        } else {
            (from, to)
        };
        match entry.cond_port {
            CondPort::First => format!("{} {}", wrap(first), second),
            CondPort::Second => format!("{} {}", first, wrap(second)),
        }
    };
    format!("({} {} {})", entry.kind.keyword(), ports, values(entry))
}

fn constraint_line(entry: &Entry) -> String {
    let from = port(&entry.from_pin, entry.from_pin_edge);
    let to = port(&entry.to_pin, entry.to_pin_edge);
    format!("(PATHCONSTRAINT {} {} {})", to, from, values(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DelaySlot, Header, TimeUnit, Timescale};

    fn doc_with(entries: Vec<Entry>) -> Document {
        let mut doc = Document::new();
        for entry in entries {
            doc.add_entry("C", "u1", entry);
        }
        doc
    }

    fn body(doc: &Document) -> Vec<String> {
        emit(doc, &EmitOptions::default())
            .lines()
            .map(|l| l.trim().to_string())
            .collect()
    }

    #[test]
    fn test_minimal_document() {
        let mut doc = Document::new();
        doc.header.sdfversion = Some("3.0".to_string());
        assert_eq!(
            emit(&doc, &EmitOptions::default()),
            "(DELAYFILE\n  (SDFVERSION \"3.0\")\n)"
        );
    }

    #[test]
    fn test_header_order() {
        let doc = Document {
            header: Header {
                timescale: Some(Timescale {
                    magnitude: 100.0,
                    unit: TimeUnit::Ps,
                }),
                design: Some("top".to_string()),
                divider: Some('/'),
                voltage: Some(Triple::new(None, Some(2.0), Some(3.0))),
                temperature: Some(Triple::single(25.0)),
                sdfversion: Some("3.0".to_string()),
                ..Header::default()
            },
            ..Document::default()
        };
        assert_eq!(
            body(&doc),
            vec![
                "(DELAYFILE",
                "(SDFVERSION \"3.0\")",
                "(DESIGN \"top\")",
                "(DIVIDER /)",
                "(VOLTAGE :2:3)",
                "(TEMPERATURE 25)",
                "(TIMESCALE 100 ps)",
                ")",
            ]
        );
    }

    #[test]
    fn test_triple_formatting() {
        assert_eq!(format_triple(&Triple::empty()), "()");
        assert_eq!(format_triple(&Triple::new(Some(1.0), Some(2.0), Some(3.0))), "(1:2:3)");
        assert_eq!(format_triple(&Triple::new(Some(1.0), None, Some(3.0))), "(1::3)");
        assert_eq!(format_triple(&Triple::single(0.3)), "(0.3)");
    }

    #[test]
    fn test_tighten_equation() {
        assert_eq!(tighten_equation("a & ( B | C )"), "a & (B | C)");
        assert_eq!(tighten_equation("( ( a ) )"), "((a))");
        assert_eq!(tighten_equation("en == 1'b1"), "en == 1'b1");
    }

    #[test]
    fn test_layout_and_empty_sections() {
        let doc = doc_with(vec![Entry::new(EntryKind::Iopath, Family::Absolute, "a", "y")
            .with_value(DelaySlot::Rise, Triple::single(1.0))
            .with_value(DelaySlot::Fall, Triple::single(2.0))]);
        let text = emit(&doc, &EmitOptions::default());
        let expected = [
            "(DELAYFILE",
            "  (CELL",
            "    (CELLTYPE \"C\")",
            "    (INSTANCE u1)",
            "    (DELAY",
            "      (ABSOLUTE",
            "        (IOPATH a y (1) (2))",
            "      )",
            "    )",
            "  )",
            ")",
        ]
        .join("\n");
        assert_eq!(text, expected);
        assert!(!text.contains("INCREMENT"));
        assert!(!text.contains("TIMINGCHECK"));
    }

    #[test]
    fn test_cond_iopath_with_retain() {
        let mut entry = Entry::new(EntryKind::Iopath, Family::Absolute, "d[0]", "b/c/d")
            .with_value(
                DelaySlot::Nominal,
                Triple::new(Some(0.4), Some(0.4), Some(0.4)),
            )
            .with_cond("en == 1'b1");
        entry.retain = Some(vec![Triple::single(0.3)]);
        let lines = body(&doc_with(vec![entry]));
        assert!(lines.contains(
            &"(COND en == 1'b1 (IOPATH d[0] b/c/d (RETAIN (0.3)) (0.4:0.4:0.4)))".to_string()
        ));
    }

    #[test]
    fn test_check_lines() {
        let mut width = Entry::new(EntryKind::Width, Family::TimingCheck, "clk", "clk")
            .with_value(DelaySlot::Nominal, Triple::new(Some(4.4), Some(7.5), Some(11.3)));
        width.from_pin_edge = Some(Edge::Negedge);
        width.to_pin_edge = Some(Edge::Negedge);

        let mut setuphold = Entry::new(EntryKind::Setuphold, Family::TimingCheck, "d", "clk")
            .with_value(DelaySlot::Setup, Triple::single(1.0))
            .with_value(DelaySlot::Hold, Triple::single(2.0))
            .with_cond("a & ( B | C )");
        setuphold.to_pin_edge = Some(Edge::Posedge);

        let nochange = Entry::new(EntryKind::Nochange, Family::TimingCheck, "d", "clk")
            .with_value(DelaySlot::Nominal, Triple::single(3.0));

        let lines = body(&doc_with(vec![width, setuphold, nochange]));
        assert!(lines.contains(&"(WIDTH (negedge clk) (4.4:7.5:11.3))".to_string()));
        assert!(lines.contains(
            &"(SETUPHOLD d (COND a & (B | C) (posedge clk)) (1) (2))".to_string()
        ));
        assert!(lines.contains(&"(NOCHANGE clk d (3))".to_string()));
    }

    #[test]
    fn test_cond_on_first_check_port() {
        let mut setup = Entry::new(EntryKind::Setup, Family::TimingCheck, "d", "clk")
            .with_value(DelaySlot::Nominal, Triple::single(1.0))
            .with_cond("en");
        setup.to_pin_edge = Some(Edge::Posedge);
        setup.cond_port = CondPort::First;

        let mut nochange = Entry::new(EntryKind::Nochange, Family::TimingCheck, "d", "clk")
            .with_value(DelaySlot::Nominal, Triple::single(3.0))
            .with_cond("rst");
        nochange.cond_port = CondPort::First;

        let lines = body(&doc_with(vec![setup, nochange]));
        assert!(lines.contains(&"(SETUP (COND en d) (posedge clk) (1))".to_string()));
        assert!(lines.contains(&"(NOCHANGE (COND rst clk) d (3))".to_string()));
    }

    #[test]
    fn test_empty_instance() {
        let mut doc = Document::new();
        doc.add_instance("C", "");
        assert_eq!(
            emit(&doc, &EmitOptions::default()),
            "(DELAYFILE\n  (CELL\n    (CELLTYPE \"C\")\n    (INSTANCE)\n  )\n)"
        );
    }

    #[test]
    fn test_pathconstraint_and_device() {
        let constraint = Entry::new(EntryKind::Pathconstraint, Family::TimingEnv, "a", "y")
            .with_value(DelaySlot::Rise, Triple::single(1.0))
            .with_value(DelaySlot::Fall, Triple::single(2.0));
        let device = Entry::new(EntryKind::Device, Family::Incremental, "", "")
            .with_value(DelaySlot::Nominal, Triple::single(5.0));
        let lines = body(&doc_with(vec![constraint, device]));
        assert!(lines.contains(&"(PATHCONSTRAINT y a (1) (2))".to_string()));
        assert!(lines.contains(&"(INCREMENT".to_string()));
        assert!(lines.contains(&"(DEVICE (5))".to_string()));
    }

    #[test]
    fn test_options() {
        let mut doc = Document::new();
        doc.add_instance("inv", "*");
        let options = EmitOptions::new()
            .with_indent_width(4)
            .with_uppercase_celltype(true);
        assert_eq!(
            emit(&doc, &options),
            "(DELAYFILE\n    (CELL\n        (CELLTYPE \"INV\")\n        (INSTANCE *)\n    )\n)"
        );
        assert_eq!(EmitOptions::new().with_indent("\t").indent, "\t");
    }

    #[test]
    fn test_sorted_output() {
        let mut a = Document::new();
        a.add_instance("B", "u2");
        a.add_instance("A", "u9");
        a.add_instance("B", "u1");
        let mut b = Document::new();
        b.add_instance("B", "u1");
        b.add_instance("B", "u2");
        b.add_instance("A", "u9");
        let options = EmitOptions::default();
        assert_eq!(emit(&a, &options), emit(&b, &options));
        let text = emit(&a, &options);
        let first = text.find("u9").unwrap();
        let second = text.find("u1").unwrap();
        assert!(first < second);
    }
}
