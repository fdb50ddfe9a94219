//! Text diffs in four presentation formats with bounded output.
//!
//! Both inputs are read fully into memory and split into lines. Each format
//! produces a lazy sequence of output lines which is then cut down to a
//! maximum count before being written to stdout, a log entry or any writer.

mod context;
mod html;
mod ndiff;
mod unified;

use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use fcompare_common::{CompareError, DiffFormat, DiffRequest, TRUNCATION_SENTINEL};
use similar::{capture_diff_slices, group_diff_ops, Algorithm, DiffOp};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

/// Where rendered diff lines go
pub enum DiffSink<'a> {
    /// Write each line to standard output
    Stdout,
    /// Join all lines into a single info-level log entry
    Log,
    /// Write each line to the given writer
    Writer(&'a mut dyn Write),
}

/// Both sides of a diff, loaded and split into lines
pub(crate) struct DiffInput {
    pub from_label: String,
    pub to_label: String,
    pub from_date: String,
    pub to_date: String,
    /// Lines including their `\n` terminator, CRLF normalized
    pub old: Vec<String>,
    pub new: Vec<String>,
}

impl DiffInput {
    fn load(from: &Path, to: &Path) -> Result<Self, CompareError> {
        let old = read_lines(from)?;
        let new = read_lines(to)?;

        Ok(Self {
            from_label: from.display().to_string(),
            to_label: to.display().to_string(),
            from_date: file_mtime(from)?,
            to_date: file_mtime(to)?,
            old,
            new,
        })
    }

    pub fn ops(&self) -> Vec<DiffOp> {
        capture_diff_slices(Algorithm::Myers, &self.old, &self.new)
    }

    /// Change clusters with `context` lines of surrounding equal lines
    pub fn grouped_ops(&self, context: usize) -> Vec<Vec<DiffOp>> {
        group_diff_ops(self.ops(), context)
    }
}

/// A line without its trailing newline
pub(crate) fn content(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

fn read_lines(path: &Path) -> Result<Vec<String>, CompareError> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes).replace("\r\n", "\n");
    Ok(text.split_inclusive('\n').map(str::to_string).collect())
}

/// Last-modified time in the local timezone, ISO-8601
fn file_mtime(path: &Path) -> Result<String, CompareError> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(iso_timestamp(DateTime::<Local>::from(modified)))
}

/// Seconds precision unless there is a sub-second part, then microseconds
fn iso_timestamp<Tz: TimeZone>(time: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let precision = if time.timestamp_subsec_micros() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    time.to_rfc3339_opts(precision, false)
}

/// Consume at most `max_lines` lines, appending the sentinel when more remain.
///
/// A `max_lines` of zero consumes everything.
pub fn bound_lines<I>(lines: I, max_lines: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut iter = lines.into_iter();
    if max_lines == 0 {
        return iter.collect();
    }

    let mut bounded: Vec<String> = iter.by_ref().take(max_lines).collect();
    if iter.next().is_some() {
        bounded.push(TRUNCATION_SENTINEL.to_string());
    }
    bounded
}

/// Renders and emits diffs between two files
pub struct DiffFormatter;

impl DiffFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Read both files and produce the bounded output lines
    pub fn render(&self, request: &DiffRequest) -> Result<Vec<String>, CompareError> {
        let input = DiffInput::load(&request.from, &request.to)?;
        let options = &request.options;

        let lines: Box<dyn Iterator<Item = String> + '_> = match options.format {
            DiffFormat::Context => context::render(&input, options.context_lines),
            DiffFormat::Unified => unified::render(&input, options.context_lines),
            DiffFormat::Ndiff => ndiff::render(&input),
            DiffFormat::Html => html::render(&input, options.context_only, options.context_lines),
        };

        Ok(bound_lines(lines, options.max_lines))
    }

    /// Write already rendered lines to `sink`. Empty output emits nothing.
    pub fn emit(&self, lines: &[String], sink: DiffSink<'_>) -> io::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        match sink {
            DiffSink::Log => {
                info!("  >> DIFF:\n{}", lines.join("\n"));
                Ok(())
            }
            DiffSink::Stdout => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                write_lines(&mut out, lines)
            }
            DiffSink::Writer(writer) => write_lines(writer, lines),
        }
    }

    /// Render then emit; returns the number of lines emitted
    pub fn run(&self, request: &DiffRequest, sink: DiffSink<'_>) -> Result<usize, CompareError> {
        let lines = self.render(request)?;
        self.emit(&lines, sink)?;
        Ok(lines.len())
    }
}

impl Default for DiffFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_lines(out: &mut dyn Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fcompare_common::DiffOptions;
    use filetime::{set_file_mtime, FileTime};
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Pair {
        _temp: TempDir,
        from: PathBuf,
        to: PathBuf,
    }

    fn pair(left: &str, right: &str) -> Pair {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("from.txt");
        let to = temp.path().join("to.txt");
        fs::write(&from, left).unwrap();
        fs::write(&to, right).unwrap();

        let mtime = FileTime::from_unix_time(1_700_000_000, 0);
        set_file_mtime(&from, mtime).unwrap();
        set_file_mtime(&to, mtime).unwrap();

        Pair {
            _temp: temp,
            from,
            to,
        }
    }

    fn request(pair: &Pair, format: DiffFormat) -> DiffRequest {
        DiffRequest::new(&pair.from, &pair.to, DiffOptions::new(format))
    }

    fn numbered(count: usize) -> String {
        (0..count).map(|i| format!("line {i}\n")).collect()
    }

    #[test]
    fn test_bound_lines_under_cap_has_no_sentinel() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(bound_lines(lines.clone(), 2), lines);
        assert_eq!(bound_lines(lines.clone(), 5), lines);
    }

    #[test]
    fn test_bound_lines_over_cap_appends_sentinel() {
        let lines: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        let bounded = bound_lines(lines, 3);

        assert_eq!(bounded.len(), 4);
        assert_eq!(bounded[2], "2");
        assert_eq!(bounded[3], TRUNCATION_SENTINEL);
    }

    #[test]
    fn test_bound_lines_zero_is_unbounded() {
        let lines: Vec<String> = (0..500).map(|i| i.to_string()).collect();
        assert_eq!(bound_lines(lines, 0).len(), 500);
    }

    #[test]
    fn test_render_truncates_long_ndiff() {
        let files = pair(&numbered(150), &numbered(150));
        let lines = DiffFormatter::new()
            .render(&request(&files, DiffFormat::Ndiff))
            .unwrap();

        assert_eq!(lines.len(), 101);
        assert_eq!(lines.last().map(String::as_str), Some(TRUNCATION_SENTINEL));
    }

    #[test]
    fn test_render_is_idempotent() {
        let files = pair("a\nb\nc\n", "a\nx\nc\n");
        let formatter = DiffFormatter::new();

        for format in [
            DiffFormat::Context,
            DiffFormat::Unified,
            DiffFormat::Ndiff,
            DiffFormat::Html,
        ] {
            let first = formatter.render(&request(&files, format)).unwrap();
            let second = formatter.render(&request(&files, format)).unwrap();
            assert_eq!(first, second, "{format} output changed between runs");
        }
    }

    #[test]
    fn test_render_missing_file_fails() {
        let files = pair("a\n", "b\n");
        let req = DiffRequest::new(
            files.from.with_file_name("absent.txt"),
            &files.to,
            DiffOptions::new(DiffFormat::Unified),
        );

        assert!(matches!(
            DiffFormatter::new().render(&req),
            Err(CompareError::Io(_))
        ));
    }

    #[test]
    fn test_identical_files_produce_no_unified_output() {
        let files = pair("same\n", "same\n");
        let lines = DiffFormatter::new()
            .render(&request(&files, DiffFormat::Unified))
            .unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_emit_to_writer() {
        let files = pair("a\nb\n", "a\nc\n");
        let formatter = DiffFormatter::new();
        let mut buffer = Vec::new();

        let count = formatter
            .run(&request(&files, DiffFormat::Unified), DiffSink::Writer(&mut buffer))
            .unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), count);
        assert!(text.contains("\n-b\n+c\n"));
    }

    #[test]
    fn test_crlf_is_normalized() {
        let files = pair("a\r\nb\r\n", "a\nb\n");
        let lines = DiffFormatter::new()
            .render(&request(&files, DiffFormat::Unified))
            .unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_header_uses_file_mtime() {
        std::env::set_var("TZ", "UTC");
        let files = pair("a\nb\n", "a\nc\n");
        let lines = DiffFormatter::new()
            .render(&request(&files, DiffFormat::Unified))
            .unwrap();

        assert_eq!(
            lines[0],
            format!("--- {}\t2023-11-14T22:13:20+00:00", files.from.display())
        );
        assert_eq!(
            lines[1],
            format!("+++ {}\t2023-11-14T22:13:20+00:00", files.to.display())
        );
    }

    #[test]
    fn test_iso_timestamp_precision() {
        let whole = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(iso_timestamp(whole), "2023-11-14T22:13:20+00:00");

        let fractional = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        assert_eq!(iso_timestamp(fractional), "2023-11-14T22:13:20.123456+00:00");
    }
}
