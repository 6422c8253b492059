//! Human-readable diff report
//!
//! One header line per reported node, `"<indent><Label> (<name>) <status>"`,
//! followed by the line diff when the node changed. Traits are qualified
//! with their component, `"Component (<name>) / Trait (<type>/<resource>)"`.

use crate::diff::{Delta, DiffEntry, DiffRecord, DiffType};
use crate::errors::{ExError, LiveDiffError, Result};
use crate::manifest::ManifestKind;
use colored::Colorize;
use std::io::Write;

/// Default number of unchanged lines shown around each change
pub const DEFAULT_CONTEXT: i32 = 10;

const INDENT: &str = "  ";
const ELISION: &str = "...";

fn status_phrase(diff_type: DiffType) -> &'static str {
    match diff_type {
        DiffType::Add => "has been added(+)",
        DiffType::Modify => "has been modified(*)",
        DiffType::Remove => "has been removed(-)",
        DiffType::NoChange => "has no change",
    }
}

/// Report writer over any byte sink
///
/// # Example
/// ```
/// use livediff_core::diff::{DiffEntry, DiffType};
/// use livediff_core::manifest::ManifestKind;
/// use livediff_core::report::ReportDiffOption;
///
/// let entry = DiffEntry::new("livediff-demo", ManifestKind::Application);
/// let mut report = ReportDiffOption::new(10, Vec::new()).with_color(false);
/// report.print_diff_report(&entry).unwrap();
///
/// let text = String::from_utf8(report.into_inner()).unwrap();
/// assert_eq!(text, "Application (livediff-demo) has no change\n");
/// ```
pub struct ReportDiffOption<W: Write> {
    /// Unchanged lines kept around each change; `<= 0` prints every line
    pub context: i32,
    pub color: bool,
    writer: W,
}

impl<W: Write> ReportDiffOption<W> {
    pub fn new(context: i32, writer: W) -> Self {
        Self {
            context,
            color: true,
            writer,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write the report for `root` and everything below it
    pub fn print_diff_report(&mut self, root: &DiffEntry) -> Result<()> {
        self.print_entry(root, 0, None)?;
        self.writer.flush().map_err(io_error)
    }

    fn print_entry(&mut self, entry: &DiffEntry, depth: usize, component: Option<&str>) -> Result<()> {
        let Some(label) = entry.kind.header() else {
            for sub in &entry.subs {
                self.print_entry(sub, depth, Some(&entry.name))?;
            }
            return Ok(());
        };

        let indent = INDENT.repeat(depth);
        let qualifier = match (entry.kind, component) {
            (ManifestKind::Trait, Some(parent)) => format!("Component ({}) / ", parent),
            _ => String::new(),
        };
        let header = format!(
            "{}{}{} ({}) {}",
            indent,
            qualifier,
            label,
            entry.name,
            status_phrase(entry.diff_type)
        );

        if entry.diff_type.is_no_change() {
            self.write_line(&header)?;
        } else {
            let header = if self.color {
                header.yellow().to_string()
            } else {
                header
            };
            self.write_line(&header)?;
            self.print_diffs(&entry.diffs, &indent)?;
        }

        for sub in &entry.subs {
            self.print_entry(sub, depth + 1, None)?;
        }
        Ok(())
    }

    fn print_diffs(&mut self, diffs: &[DiffRecord], indent: &str) -> Result<()> {
        let visible = visible_lines(diffs, self.context);
        let mut elided = false;
        for (record, show) in diffs.iter().zip(visible) {
            if !show {
                if !elided {
                    self.write_line(&format!("{}{}", indent, ELISION))?;
                    elided = true;
                }
                continue;
            }
            elided = false;
            let line = match record.delta {
                Delta::RightOnly => self.paint(format!("+ {}", record.payload), Delta::RightOnly),
                Delta::LeftOnly => self.paint(format!("- {}", record.payload), Delta::LeftOnly),
                Delta::Common => format!("  {}", record.payload),
            };
            self.write_line(&format!("{}{}", indent, line))?;
        }
        Ok(())
    }

    fn paint(&self, line: String, delta: Delta) -> String {
        if !self.color {
            return line;
        }
        match delta {
            Delta::RightOnly => line.green().to_string(),
            Delta::LeftOnly => line.red().to_string(),
            Delta::Common => line,
        }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line).map_err(io_error)
    }
}

/// Which records fall inside the context window of some change
///
/// Two sweeps track the distance to the nearest change before and after
/// each record.
fn visible_lines(diffs: &[DiffRecord], context: i32) -> Vec<bool> {
    if context <= 0 {
        return vec![true; diffs.len()];
    }
    let window = context as usize;

    let mut distance = vec![usize::MAX; diffs.len()];
    let mut since_change: Option<usize> = None;
    for (i, record) in diffs.iter().enumerate() {
        since_change = if record.delta != Delta::Common {
            Some(0)
        } else {
            since_change.map(|d| d + 1)
        };
        if let Some(d) = since_change {
            distance[i] = d;
        }
    }
    let mut until_change: Option<usize> = None;
    for (i, record) in diffs.iter().enumerate().rev() {
        until_change = if record.delta != Delta::Common {
            Some(0)
        } else {
            until_change.map(|d| d + 1)
        };
        if let Some(d) = until_change {
            distance[i] = distance[i].min(d);
        }
    }

    distance.into_iter().map(|d| d <= window).collect()
}

fn io_error(err: std::io::Error) -> ExError {
    ExError::from(LiveDiffError::Io {
        target: "report".to_string(),
        reason: err.to_string(),
    })
    .with_op("print_diff_report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffRecord;

    fn common(n: usize) -> Vec<DiffRecord> {
        (0..n)
            .map(|i| DiffRecord::new(Delta::Common, format!("line{}", i)))
            .collect()
    }

    fn render(entry: &DiffEntry, context: i32) -> String {
        let mut report = ReportDiffOption::new(context, Vec::new()).with_color(false);
        report.print_diff_report(entry).unwrap();
        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn test_context_window_elides() {
        let mut diffs = common(10);
        diffs[5] = DiffRecord::new(Delta::RightOnly, "added");
        let entry = DiffEntry::new("app", ManifestKind::Application).with_diffs(DiffType::Add, diffs);

        let out = render(&entry, 1);
        assert_eq!(
            out,
            "Application (app) has been added(+)\n...\n  line4\n+ added\n  line6\n...\n"
        );
    }

    #[test]
    fn test_context_window_between_changes() {
        let mut diffs = common(12);
        diffs[2] = DiffRecord::new(Delta::LeftOnly, "old");
        diffs[9] = DiffRecord::new(Delta::RightOnly, "new");

        let visible = visible_lines(&diffs, 2);
        let shown: Vec<usize> = (0..diffs.len()).filter(|&i| visible[i]).collect();
        assert_eq!(shown, vec![0, 1, 2, 3, 4, 7, 8, 9, 10, 11]);

        assert!(visible_lines(&common(5), 3).iter().all(|v| !v));
    }

    #[test]
    fn test_non_positive_context_prints_everything() {
        let mut diffs = common(30);
        diffs[0] = DiffRecord::new(Delta::LeftOnly, "gone");
        let entry =
            DiffEntry::new("app", ManifestKind::Application).with_diffs(DiffType::Remove, diffs);

        let out = render(&entry, -1);
        assert!(!out.contains(ELISION));
        assert!(out.contains("- gone"));
        assert!(out.contains("  line29"));
    }

    #[test]
    fn test_trait_qualified_by_component_and_structural_hidden() {
        let mut acc = DiffEntry::new("myweb-1", ManifestKind::AppConfigComponent);
        acc.subs = vec![
            DiffEntry::new("myweb-1", ManifestKind::Component),
            DiffEntry::new("myingress/service", ManifestKind::Trait).with_diffs(
                DiffType::Modify,
                vec![
                    DiffRecord::new(Delta::LeftOnly, "port: 80"),
                    DiffRecord::new(Delta::RightOnly, "port: 8080"),
                ],
            ),
        ];
        let mut root = DiffEntry::new("livediff-demo", ManifestKind::Application);
        root.subs = vec![acc];

        let out = render(&root, 10);
        assert_eq!(
            out,
            "Application (livediff-demo) has no change\n\
             \x20 Component (myweb-1) has no change\n\
             \x20 Component (myweb-1) / Trait (myingress/service) has been modified(*)\n\
             \x20 - port: 80\n\
             \x20 + port: 8080\n"
        );
        assert!(!out.contains("AppConfigComponent"));
    }

    #[test]
    fn test_colored_header() {
        colored::control::set_override(true);
        let entry = DiffEntry::new("app", ManifestKind::Application).with_diffs(
            DiffType::Add,
            vec![DiffRecord::new(Delta::RightOnly, "a: 1")],
        );
        let mut report = ReportDiffOption::new(10, Vec::new());
        report.print_diff_report(&entry).unwrap();
        let out = String::from_utf8(report.into_inner()).unwrap();
        colored::control::unset_override();

        assert!(out.contains("\u{1b}["));
        assert!(out.contains("Application (app) has been added(+)"));
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_propagates() {
        let entry = DiffEntry::new("app", ManifestKind::Application);
        let err = ReportDiffOption::new(10, FailingSink)
            .print_diff_report(&entry)
            .unwrap_err();
        assert_eq!(err.code(), "ERR_IO");
    }
}
