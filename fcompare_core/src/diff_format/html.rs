use super::{content, DiffInput};
use similar::{capture_diff_slices, Algorithm, DiffOp, DiffTag};

const TAB_SIZE: usize = 8;

const HEAD: &[&str] = &[
    r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN""#,
    r#"          "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#,
    "<html>",
    "<head>",
    r#"    <meta http-equiv="Content-Type" content="text/html; charset=utf-8" />"#,
    "    <title></title>",
    r#"    <style type="text/css">"#,
    "        table.diff {font-family:Courier; border:medium;}",
    "        .diff_header {background-color:#e0e0e0}",
    "        td.diff_header {text-align:right}",
    "        .diff_add {background-color:#aaffaa}",
    "        .diff_chg {background-color:#ffff77}",
    "        .diff_sub {background-color:#ffaaaa}",
    "    </style>",
    "</head>",
    "<body>",
    r#"    <table class="diff" cellspacing="0" cellpadding="0" rules="groups">"#,
    "        <colgroup></colgroup> <colgroup></colgroup>",
    "        <colgroup></colgroup> <colgroup></colgroup>",
];

const TAIL: &[&str] = &[
    "    </table>",
    r#"    <table class="diff" summary="Legends">"#,
    r#"        <tr><th>Legends</th></tr>"#,
    r#"        <tr><td class="diff_add">&nbsp;Added&nbsp;</td></tr>"#,
    r#"        <tr><td class="diff_chg">Changed</td></tr>"#,
    r#"        <tr><td class="diff_sub">Deleted</td></tr>"#,
    "    </table>",
    "</body>",
    "</html>",
];

/// One side of a table row: line number and already escaped markup
type Cell = Option<(usize, String)>;

/// Side-by-side HTML document, one output line per table row.
///
/// With `context_only` only the changed regions plus `context` lines around
/// them are shown, each region in its own table body.
pub(super) fn render(
    input: &DiffInput,
    context_only: bool,
    context: usize,
) -> Box<dyn Iterator<Item = String> + '_> {
    let groups = if context_only {
        input.grouped_ops(context)
    } else {
        let ops = input.ops();
        if ops.is_empty() {
            Vec::new()
        } else {
            vec![ops]
        }
    };

    let title = format!(
        r#"        <thead><tr><th class="diff_header" colspan="2">{}</th><th class="diff_header" colspan="2">{}</th></tr></thead>"#,
        escape(&input.from_label),
        escape(&input.to_label)
    );
    let head = HEAD.iter().map(|l| l.to_string()).chain(std::iter::once(title));
    let tail = TAIL.iter().map(|l| l.to_string());

    let body: Box<dyn Iterator<Item = String> + '_> = if groups.is_empty() {
        let message = if context_only {
            "No Differences Found"
        } else {
            "Empty File"
        };
        Box::new(
            vec![
                "        <tbody>".to_string(),
                message_row(message),
                "        </tbody>".to_string(),
            ]
            .into_iter(),
        )
    } else {
        Box::new(groups.into_iter().flat_map(move |group| {
            let mut lines = vec!["        <tbody>".to_string()];
            for op in &group {
                lines.extend(op_rows(input, op));
            }
            lines.push("        </tbody>".to_string());
            lines
        }))
    };

    Box::new(head.chain(body).chain(tail))
}

fn message_row(message: &str) -> String {
    let cell = format!("<td></td><td>&nbsp;{message}&nbsp;</td>");
    format!("            <tr>{cell}{cell}</tr>")
}

fn op_rows(input: &DiffInput, op: &DiffOp) -> Vec<String> {
    let (tag, old, new) = op.as_tag_tuple();
    let old_lines = &input.old[old.clone()];
    let new_lines = &input.new[new.clone()];

    match tag {
        DiffTag::Equal => old_lines
            .iter()
            .zip(new_lines)
            .enumerate()
            .map(|(k, (o, n))| {
                row(
                    Some((old.start + k + 1, escape(&expand_tabs(content(o))))),
                    Some((new.start + k + 1, escape(&expand_tabs(content(n))))),
                )
            })
            .collect(),
        DiffTag::Delete => old_lines
            .iter()
            .enumerate()
            .map(|(k, o)| row(Some((old.start + k + 1, whole_line(o, "diff_sub"))), None))
            .collect(),
        DiffTag::Insert => new_lines
            .iter()
            .enumerate()
            .map(|(k, n)| row(None, Some((new.start + k + 1, whole_line(n, "diff_add")))))
            .collect(),
        DiffTag::Replace => {
            let paired = old_lines.len().max(new_lines.len());
            (0..paired)
                .filter_map(|k| match (old_lines.get(k), new_lines.get(k)) {
                    (Some(o), Some(n)) => {
                        let (left, right) = intraline(content(o), content(n));
                        Some(row(
                            Some((old.start + k + 1, left)),
                            Some((new.start + k + 1, right)),
                        ))
                    }
                    (Some(o), None) => Some(row(
                        Some((old.start + k + 1, whole_line(o, "diff_sub"))),
                        None,
                    )),
                    (None, Some(n)) => Some(row(
                        None,
                        Some((new.start + k + 1, whole_line(n, "diff_add"))),
                    )),
                    (None, None) => None,
                })
                .collect()
        }
    }
}

fn row(left: Cell, right: Cell) -> String {
    format!("            <tr>{}{}</tr>", cell(left), cell(right))
}

fn cell(side: Cell) -> String {
    match side {
        Some((number, markup)) => format!(
            r#"<td class="diff_header">{number}</td><td nowrap="nowrap">{markup}</td>"#
        ),
        None => r#"<td class="diff_header"></td><td nowrap="nowrap"></td>"#.to_string(),
    }
}

fn whole_line(line: &str, class: &str) -> String {
    span(class, &expand_tabs(content(line)))
}

fn span(class: &str, text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!(r#"<span class="{}">{}</span>"#, class, escape(text))
}

/// Highlight character level changes between two paired lines
fn intraline(old: &str, new: &str) -> (String, String) {
    let old_chars: Vec<char> = expand_tabs(old).chars().collect();
    let new_chars: Vec<char> = expand_tabs(new).chars().collect();

    let mut left = String::new();
    let mut right = String::new();
    for op in capture_diff_slices(Algorithm::Myers, &old_chars, &new_chars) {
        let (tag, o, n) = op.as_tag_tuple();
        let old_text: String = old_chars[o].iter().collect();
        let new_text: String = new_chars[n].iter().collect();
        match tag {
            DiffTag::Equal => {
                left.push_str(&escape(&old_text));
                right.push_str(&escape(&new_text));
            }
            DiffTag::Delete => left.push_str(&span("diff_sub", &old_text)),
            DiffTag::Insert => right.push_str(&span("diff_add", &new_text)),
            DiffTag::Replace => {
                left.push_str(&span("diff_chg", &old_text));
                right.push_str(&span("diff_chg", &new_text));
            }
        }
    }
    (left, right)
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_SIZE - column % TAB_SIZE;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            ' ' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
    out
}
