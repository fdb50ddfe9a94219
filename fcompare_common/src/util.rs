//! Small string and file helpers shared by the comparator and diff tools.

use chrono::Local;
use regex::Regex;
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// True when `text` contains at least one of `needles`
pub fn contains_any<S: AsRef<str>>(text: &str, needles: &[S]) -> bool {
    needles.iter().any(|n| text.contains(n.as_ref()))
}

/// True when `text` contains every one of `needles`
pub fn contains_all<S: AsRef<str>>(text: &str, needles: &[S]) -> bool {
    needles.iter().all(|n| text.contains(n.as_ref()))
}

/// Replace a literal prefix of `text` with `to`
pub fn replace_prefix<'a>(prefix: &str, to: &str, text: &'a str) -> Cow<'a, str> {
    anchored_replace(&format!("^{}", regex::escape(prefix)), to, text)
}

/// Replace a literal suffix of `text` with `to`
pub fn replace_suffix<'a>(suffix: &str, to: &str, text: &'a str) -> Cow<'a, str> {
    anchored_replace(&format!("{}$", regex::escape(suffix)), to, text)
}

fn anchored_replace<'a>(pattern: &str, to: &str, text: &'a str) -> Cow<'a, str> {
    match Regex::new(pattern) {
        Ok(re) => re.replace(text, regex::NoExpand(to)),
        // escaped literals always compile
        Err(_) => Cow::Borrowed(text),
    }
}

/// Remove `prefix` from `text`, optionally trimming whitespace first
pub fn remove_prefix<'a>(prefix: &str, text: &'a str, strip: bool) -> &'a str {
    let text = if strip { text.trim() } else { text };
    text.strip_prefix(prefix).unwrap_or(text)
}

/// Remove `suffix` from `text`, optionally trimming whitespace first
pub fn remove_suffix<'a>(suffix: &str, text: &'a str, strip: bool) -> &'a str {
    let text = if strip { text.trim() } else { text };
    text.strip_suffix(suffix).unwrap_or(text)
}

/// Month and day of the current local date, e.g. `Jul10`
pub fn date_suffix() -> String {
    Local::now().format("%b%d").to_string()
}

/// Count lines in a file, stopping at `max_lines` when it is non-zero
pub fn file_length(path: &Path, max_lines: usize) -> io::Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for line in reader.split(b'\n') {
        line?;
        count += 1;
        if max_lines > 0 && count >= max_lines {
            break;
        }
    }
    Ok(count)
}

/// Join displayable items with `sep`, one leading separator per item
pub fn join_lines<T: std::fmt::Display>(items: &[T], sep: &str) -> String {
    items.iter().map(|item| format!("{sep}{item}")).collect()
}
