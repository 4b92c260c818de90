//! Document segmentation into bounded fragments
//!
//! Sizes are counted in characters. A fragment only exceeds the bound when it
//! holds a single unit (one sentence, or one line in marker mode) that is
//! itself larger than the bound; units are never cut.

use crate::config::SegmentMode;
use crate::types::Fragment;
use regex::Regex;
use std::sync::LazyLock;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph pattern"));

/// Splits document text into fragments
pub struct Segmenter {
    mode: SegmentMode,
    max_fragment_size: usize,
    marker: Option<Regex>,
    leading_label: String,
}

/// A packing unit and the paragraph (or line group) it came from
struct Unit<'a> {
    text: &'a str,
    group: usize,
}

impl Segmenter {
    /// Create a segmenter; `leading_label` tags text that precedes any marker
    pub fn new(mode: SegmentMode, max_fragment_size: usize, leading_label: impl Into<String>) -> Self {
        Self {
            mode,
            max_fragment_size: max_fragment_size.max(1),
            marker: None,
            leading_label: leading_label.into(),
        }
    }

    /// Set the marker pattern used in marker-bounded mode
    pub fn with_marker(mut self, marker: Regex) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Segment the given text
    pub fn segment(&self, text: &str) -> Vec<Fragment> {
        if text.trim().is_empty() {
            return vec![Fragment {
                index: 0,
                text: String::new(),
                label: self.leading_label.clone(),
            }];
        }

        let groups = match (&self.mode, &self.marker) {
            (SegmentMode::MarkerBounded, Some(marker)) => self.group_by_marker(text, marker),
            _ => Vec::new(),
        };

        // No markers found: the whole input is one group
        if groups.is_empty() {
            let pieces = if char_len(text) <= self.max_fragment_size {
                vec![text.to_string()]
            } else {
                match self.mode {
                    SegmentMode::SizeBounded => self.pack(paragraph_units(text), "\n\n", " "),
                    SegmentMode::MarkerBounded => self.pack(line_units(text, self.max_fragment_size), "\n", "\n"),
                }
            };
            return self.label_all(vec![(self.leading_label.clone(), pieces)]);
        }

        let labeled = groups
            .into_iter()
            .map(|(label, body)| {
                let body = body.trim();
                let pieces = if char_len(body) <= self.max_fragment_size {
                    vec![body.to_string()]
                } else {
                    self.pack(line_units(body, self.max_fragment_size), "\n", "\n")
                };
                (label, pieces)
            })
            .collect();

        self.label_all(labeled)
    }

    /// Cut the text into (label, body) groups at marker lines.
    /// Returns nothing when no line matches.
    fn group_by_marker(&self, text: &str, marker: &Regex) -> Vec<(String, String)> {
        let mut groups: Vec<(String, String)> = Vec::new();
        let mut label = self.leading_label.clone();
        let mut body = String::new();
        let mut seen_marker = false;

        for line in text.lines() {
            if marker.is_match(line) {
                if !body.trim().is_empty() {
                    groups.push((label, std::mem::take(&mut body)));
                }
                body.clear();
                label = line.trim().to_string();
                seen_marker = true;
            }
            body.push_str(line);
            body.push('\n');
        }

        if !seen_marker {
            return Vec::new();
        }
        if !body.trim().is_empty() {
            groups.push((label, body));
        }
        groups
    }

    /// Greedily pack units, joining with `inner` within a group and `outer`
    /// across groups
    fn pack(&self, units: Vec<Unit<'_>>, outer: &str, inner: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;
        let mut current_group = usize::MAX;

        for unit in units {
            let unit_len = char_len(unit.text);
            let sep = if unit.group == current_group { inner } else { outer };

            if current.is_empty() {
                current.push_str(unit.text);
                current_len = unit_len;
            } else if current_len + sep.len() + unit_len > self.max_fragment_size {
                pieces.push(std::mem::take(&mut current));
                current.push_str(unit.text);
                current_len = unit_len;
            } else {
                current.push_str(sep);
                current.push_str(unit.text);
                current_len += sep.len() + unit_len;
            }
            current_group = unit.group;
        }

        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }

    fn label_all(&self, groups: Vec<(String, Vec<String>)>) -> Vec<Fragment> {
        let mut fragments = Vec::new();
        for (label, pieces) in groups {
            for text in pieces {
                fragments.push(Fragment {
                    index: fragments.len(),
                    text,
                    label: label.clone(),
                });
            }
        }
        fragments
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Sentences of each paragraph; the group is the paragraph index
fn paragraph_units(text: &str) -> Vec<Unit<'_>> {
    PARAGRAPH_BREAK
        .split(text)
        .enumerate()
        .flat_map(|(group, paragraph)| {
            split_sentences(paragraph)
                .into_iter()
                .map(move |text| Unit { text, group })
        })
        .collect()
}

/// Non-blank lines; a line over the bound is cut into its sentences
fn line_units(text: &str, max: usize) -> Vec<Unit<'_>> {
    let mut units = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if char_len(line) > max {
            units.extend(split_sentences(line).into_iter().map(|text| Unit { text, group: 0 }));
        } else {
            units.push(Unit { text: line, group: 0 });
        }
    }
    units
}

/// Split after `.`, `!` or `?` when followed by whitespace.
/// Pieces are trimmed and never empty.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(_, next)) = chars.peek() {
                if next.is_whitespace() {
                    let end = i + c.len_utf8();
                    push_trimmed(&mut pieces, &text[start..end]);
                    start = end;
                }
            }
        }
    }
    push_trimmed(&mut pieces, &text[start..]);
    pieces
}

fn push_trimmed<'a>(pieces: &mut Vec<&'a str>, piece: &'a str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        pieces.push(piece);
    }
}
