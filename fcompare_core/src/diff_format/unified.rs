use super::{content, DiffInput};
use similar::{DiffOp, DiffTag};
use std::ops::Range;

/// Unified diff: `---`/`+++` header, then `@@` hunks with inline changes
pub(super) fn render(input: &DiffInput, context: usize) -> Box<dyn Iterator<Item = String> + '_> {
    let groups = input.grouped_ops(context);
    if groups.is_empty() {
        return Box::new(std::iter::empty());
    }

    let header = vec![
        format!("--- {}\t{}", input.from_label, input.from_date),
        format!("+++ {}\t{}", input.to_label, input.to_date),
    ];

    Box::new(
        header
            .into_iter()
            .chain(groups.into_iter().flat_map(move |group| hunk(input, &group))),
    )
}

fn hunk(input: &DiffInput, group: &[DiffOp]) -> Vec<String> {
    let (Some(first), Some(last)) = (group.first(), group.last()) else {
        return Vec::new();
    };
    let old_range = first.old_range().start..last.old_range().end;
    let new_range = first.new_range().start..last.new_range().end;

    let mut lines = vec![format!(
        "@@ -{} +{} @@",
        format_range(&old_range),
        format_range(&new_range)
    )];

    for op in group {
        let (tag, old, new) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                lines.extend(input.old[old].iter().map(|l| format!(" {}", content(l))));
            }
            DiffTag::Delete => {
                lines.extend(input.old[old].iter().map(|l| format!("-{}", content(l))));
            }
            DiffTag::Insert => {
                lines.extend(input.new[new].iter().map(|l| format!("+{}", content(l))));
            }
            DiffTag::Replace => {
                lines.extend(input.old[old].iter().map(|l| format!("-{}", content(l))));
                lines.extend(input.new[new].iter().map(|l| format!("+{}", content(l))));
            }
        }
    }

    lines
}

/// `start,len` with 1-based start; a single line is just `start`
fn format_range(range: &Range<usize>) -> String {
    let mut beginning = range.start + 1;
    let length = range.end - range.start;
    if length == 1 {
        return beginning.to_string();
    }
    if length == 0 {
        beginning -= 1;
    }
    format!("{beginning},{length}")
}
