use super::{content, DiffInput};
use similar::{capture_diff_slices, Algorithm, DiffTag, TextDiff};
use std::collections::{HashMap, VecDeque};

/// Similarity a pair of lines must exceed to be shown as a changed pair
const PAIR_CUTOFF: f32 = 0.74999;

/// How far from the diagonal a synch pair is looked for
const SYNC_WINDOW: usize = 10;

/// ndiff: every line with `  `, `- `, `+ ` markers and `? ` intraline guides.
///
/// Lines are produced on demand, so a bounded consumer only pays for the
/// part of a replaced block it actually reads.
pub(super) fn render(input: &DiffInput) -> Box<dyn Iterator<Item = String> + '_> {
    Box::new(input.ops().into_iter().flat_map(move |op| {
        let (tag, old, new) = op.as_tag_tuple();
        let lines: Box<dyn Iterator<Item = String> + '_> = match tag {
            DiffTag::Equal => dump("  ", &input.old[old]),
            DiffTag::Delete => dump("- ", &input.old[old]),
            DiffTag::Insert => dump("+ ", &input.new[new]),
            DiffTag::Replace => Box::new(FancyReplace::new(&input.old[old], &input.new[new])),
        };
        lines
    }))
}

fn dump<'a>(marker: &'a str, lines: &'a [String]) -> Box<dyn Iterator<Item = String> + 'a> {
    Box::new(lines.iter().map(move |l| format!("{}{}", marker, content(l))))
}

/// Walks a replaced block looking for similar line pairs near the diagonal.
///
/// Lines between two synch pairs are emitted as plain deletions and
/// insertions; each synch pair gets intraline guides.
struct FancyReplace<'a> {
    old: &'a [String],
    new: &'a [String],
    /// Next line of `new` to find a partner for
    next_new: usize,
    /// First lines of each side not yet emitted
    dump_old: usize,
    dump_new: usize,
    pending: VecDeque<String>,
    finished: bool,
}

impl<'a> FancyReplace<'a> {
    fn new(old: &'a [String], new: &'a [String]) -> Self {
        Self {
            old,
            new,
            next_new: 0,
            dump_old: 0,
            dump_new: 0,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Queue output up to and including the next synch pair, or the tail
    fn advance(&mut self) {
        while self.next_new < self.new.len() {
            let j = self.next_new;
            self.next_new += 1;

            let lo = j.saturating_sub(SYNC_WINDOW).max(self.dump_old);
            let hi = (j + SYNC_WINDOW + 1).min(self.old.len());
            if lo >= hi {
                break;
            }

            if let Some(i) = best_partner(&self.old[lo..hi], &self.new[j]).map(|k| lo + k) {
                let (dump_old, dump_new) = (self.dump_old, self.dump_new);
                plain_gap(&self.old[dump_old..i], &self.new[dump_new..j], &mut self.pending);
                if self.old[i] == self.new[j] {
                    self.pending.push_back(format!("  {}", content(&self.old[i])));
                } else {
                    paired_lines(content(&self.old[i]), content(&self.new[j]), &mut self.pending);
                }
                self.dump_old = i + 1;
                self.dump_new = j + 1;
                return;
            }
        }

        let (dump_old, dump_new) = (self.dump_old, self.dump_new);
        plain_gap(&self.old[dump_old..], &self.new[dump_new..], &mut self.pending);
        self.finished = true;
    }
}

impl Iterator for FancyReplace<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(line);
            }
            if self.finished {
                return None;
            }
            self.advance();
        }
    }
}

/// Index of the candidate most similar to `target`, if any beats the cutoff.
///
/// The length bound and the character multiset bound are tried before the
/// full character diff, and a pair is skipped as soon as one of them cannot
/// beat the best ratio so far.
fn best_partner(candidates: &[String], target: &str) -> Option<usize> {
    let target_len = target.chars().count();
    let mut target_counts: HashMap<char, usize> = HashMap::new();
    for c in target.chars() {
        *target_counts.entry(c).or_default() += 1;
    }

    let mut best = None;
    let mut best_ratio = PAIR_CUTOFF;
    for (k, line) in candidates.iter().enumerate() {
        let len = line.chars().count();
        if length_bound(len, target_len) <= best_ratio {
            continue;
        }
        if multiset_bound(line, len, &target_counts, target_len) <= best_ratio {
            continue;
        }
        let ratio = TextDiff::from_chars(line.as_str(), target).ratio();
        if ratio > best_ratio {
            best_ratio = ratio;
            best = Some(k);
        }
    }
    best
}

fn similarity(matches: usize, total: usize) -> f32 {
    if total == 0 {
        1.0
    } else {
        2.0 * matches as f32 / total as f32
    }
}

/// Upper bound from the line lengths alone
fn length_bound(len: usize, target_len: usize) -> f32 {
    similarity(len.min(target_len), len + target_len)
}

/// Upper bound from the characters both lines share, ignoring order
fn multiset_bound(
    line: &str,
    len: usize,
    target_counts: &HashMap<char, usize>,
    target_len: usize,
) -> f32 {
    let mut available: HashMap<char, usize> = HashMap::new();
    let mut matches = 0;
    for c in line.chars() {
        let left = available
            .entry(c)
            .or_insert_with(|| target_counts.get(&c).copied().unwrap_or(0));
        if *left > 0 {
            *left -= 1;
            matches += 1;
        }
    }
    similarity(matches, len + target_len)
}

/// Lines between synch pairs: deletions and insertions, shorter block first
fn plain_gap(old: &[String], new: &[String], out: &mut VecDeque<String>) {
    if new.len() < old.len() {
        out.extend(dump("+ ", new));
        out.extend(dump("- ", old));
    } else {
        out.extend(dump("- ", old));
        out.extend(dump("+ ", new));
    }
}

/// Emit a changed pair with guide lines under each side
fn paired_lines(old: &str, new: &str, out: &mut VecDeque<String>) {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let mut old_tags = String::new();
    let mut new_tags = String::new();
    for op in capture_diff_slices(Algorithm::Myers, &old_chars, &new_chars) {
        let (tag, o, n) = op.as_tag_tuple();
        let (old_mark, new_mark) = match tag {
            DiffTag::Equal => (' ', ' '),
            DiffTag::Delete => ('-', ' '),
            DiffTag::Insert => (' ', '+'),
            DiffTag::Replace => ('^', '^'),
        };
        if tag != DiffTag::Insert {
            old_tags.extend(std::iter::repeat(old_mark).take(o.len()));
        }
        if tag != DiffTag::Delete {
            new_tags.extend(std::iter::repeat(new_mark).take(n.len()));
        }
    }

    out.push_back(format!("- {old}"));
    push_guide(&old_chars, &old_tags, out);
    out.push_back(format!("+ {new}"));
    push_guide(&new_chars, &new_tags, out);
}

/// Guide line under `line`; unmarked whitespace keeps its original character
fn push_guide(line: &[char], tags: &str, out: &mut VecDeque<String>) {
    let guide: String = line
        .iter()
        .zip(tags.chars())
        .map(|(c, tag)| if tag == ' ' && c.is_whitespace() { *c } else { tag })
        .collect();
    let guide = guide.trim_end();
    if !guide.is_empty() {
        out.push_back(format!("? {guide}"));
    }
}
