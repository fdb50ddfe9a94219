use super::{content, DiffInput};
use similar::{DiffOp, DiffTag};
use std::ops::Range;

const HUNK_SEPARATOR: &str = "***************";

/// Context diff: each hunk shows the old lines, then the new lines
pub(super) fn render(input: &DiffInput, context: usize) -> Box<dyn Iterator<Item = String> + '_> {
    let groups = input.grouped_ops(context);
    if groups.is_empty() {
        return Box::new(std::iter::empty());
    }

    let header = vec![
        format!("*** {}\t{}", input.from_label, input.from_date),
        format!("--- {}\t{}", input.to_label, input.to_date),
    ];

    Box::new(
        header
            .into_iter()
            .chain(groups.into_iter().flat_map(move |group| hunk(input, &group))),
    )
}

fn prefix(tag: DiffTag) -> &'static str {
    match tag {
        DiffTag::Equal => "  ",
        DiffTag::Delete => "- ",
        DiffTag::Insert => "+ ",
        DiffTag::Replace => "! ",
    }
}

fn hunk(input: &DiffInput, group: &[DiffOp]) -> Vec<String> {
    let (Some(first), Some(last)) = (group.first(), group.last()) else {
        return Vec::new();
    };
    let old_range = first.old_range().start..last.old_range().end;
    let new_range = first.new_range().start..last.new_range().end;

    let mut lines = vec![
        HUNK_SEPARATOR.to_string(),
        format!("*** {} ****", format_range(&old_range)),
    ];

    // the old side is only listed when something was removed or changed
    if group
        .iter()
        .any(|op| matches!(op.tag(), DiffTag::Replace | DiffTag::Delete))
    {
        for op in group {
            let (tag, old, _) = op.as_tag_tuple();
            if tag != DiffTag::Insert {
                lines.extend(
                    input.old[old]
                        .iter()
                        .map(|l| format!("{}{}", prefix(tag), content(l))),
                );
            }
        }
    }

    lines.push(format!("--- {} ----", format_range(&new_range)));

    if group
        .iter()
        .any(|op| matches!(op.tag(), DiffTag::Replace | DiffTag::Insert))
    {
        for op in group {
            let (tag, _, new) = op.as_tag_tuple();
            if tag != DiffTag::Delete {
                lines.extend(
                    input.new[new]
                        .iter()
                        .map(|l| format!("{}{}", prefix(tag), content(l))),
                );
            }
        }
    }

    lines
}

/// `first,last` with 1-based line numbers; a single line is just `first`
fn format_range(range: &Range<usize>) -> String {
    let mut beginning = range.start + 1;
    let length = range.end - range.start;
    if length == 0 {
        beginning -= 1;
    }
    if length <= 1 {
        return beginning.to_string();
    }
    format!("{},{}", beginning, beginning + length - 1)
}
