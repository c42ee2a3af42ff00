use std::fmt;
use std::ops::Range;

/// Opaque 24-bit colour used for highlighted spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a colour from a packed `0xAARRGGBB` value; alpha is ignored.
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRule {
    pub marker: String,
    pub color: Color,
}

impl HighlightRule {
    pub fn new(marker: impl Into<String>, color: Color) -> Self {
        Self {
            marker: marker.into(),
            color,
        }
    }
}

/// One match of a rule inside the visible text. `range` is in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub range: Range<usize>,
    pub color: Color,
    /// Index of the producing rule in declaration order.
    pub rule: usize,
}

/// A run of text with at most one colour, produced by [`Highlighter::segments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub color: Option<Color>,
}

const TERMINAL_PALETTE: &[(&str, u32)] = &[
    ("[  OK  ]", 0xFF00FF88),
    ("[ WARN ]", 0xFFFFBB00),
    ("[ INFO ]", 0xFF00CCFF),
    ("[SYSTEM]", 0xFFFFFFFF),
    ("[ DIAG ]", 0xFFBB88FF),
    ("[ TEST ]", 0xFFFFEEAA),
    ("[ DUMP ]", 0xFF777777),
    ("[ RUN  ]", 0xFF00FF88),
    ("[ WELCOME ]", 0xFFFF3377),
    (
        "-----------------------------------------------------------",
        0xFFF50057,
    ),
    ("root@retroscreen", 0xFFC6FF00),
    ("RETRO CRT BABY", 0xFFFAA02A),
    ("#########[", 0xFF7A18DC),
    ("]#########", 0xFF7217CE),
    ("0x", 0xFFFFCC00),
    ("120Hz", 0xFFD500F9),
    ("ERROR", 0xFFFF3377),
];

/// Ordered set of literal markers with their colours.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    rules: Vec<HighlightRule>,
}

impl Highlighter {
    /// Empty markers are dropped since they would match everywhere.
    pub fn new(rules: impl IntoIterator<Item = HighlightRule>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .filter(|rule| !rule.marker.is_empty())
                .collect(),
        }
    }

    /// Status tags, banner markers and technical values of the boot log.
    pub fn terminal_defaults() -> Self {
        Self::new(
            TERMINAL_PALETTE
                .iter()
                .map(|(marker, argb)| HighlightRule::new(*marker, Color::from_argb(*argb))),
        )
    }

    pub fn rules(&self) -> &[HighlightRule] {
        &self.rules
    }

    /// Every case-sensitive match of every rule, grouped by rule in declaration
    /// order. Matches of the same rule never overlap.
    pub fn spans(&self, visible: &str) -> Vec<StyledSpan> {
        let mut spans = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            spans.extend(
                visible
                    .match_indices(rule.marker.as_str())
                    .map(|(start, marker)| StyledSpan {
                        range: start..start + marker.len(),
                        color: rule.color,
                        rule: index,
                    }),
            );
        }
        spans
    }

    /// Byte length of the prefix of `visible` whose colouring can no longer
    /// change as text is appended. Everything after it is a proper prefix of
    /// some marker that may still complete.
    pub fn settled_len(&self, visible: &str) -> usize {
        visible
            .char_indices()
            .map(|(start, _)| start)
            .find(|&start| {
                let tail = &visible[start..];
                self.rules
                    .iter()
                    .any(|rule| rule.marker.len() > tail.len() && rule.marker.starts_with(tail))
            })
            .unwrap_or(visible.len())
    }

    /// Flattens [`spans`](Self::spans) into consecutive runs covering the whole
    /// text. Where spans overlap, the earliest declared rule wins.
    pub fn segments<'a>(&self, visible: &'a str) -> Vec<Segment<'a>> {
        let mut owner: Vec<Option<usize>> = vec![None; visible.len()];
        for span in self.spans(visible) {
            for slot in &mut owner[span.range] {
                match slot {
                    Some(existing) if *existing <= span.rule => {}
                    _ => *slot = Some(span.rule),
                }
            }
        }

        let mut segments = Vec::new();
        let mut start = 0;
        for end in 1..=visible.len() {
            let boundary = end == visible.len() || owner[end] != owner[start];
            if boundary && visible.is_char_boundary(end) {
                segments.push(Segment {
                    text: &visible[start..end],
                    color: owner[start].map(|rule| self.rules[rule].color),
                });
                start = end;
            }
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: Color = Color::rgb(0, 255, 136);
    const AMBER: Color = Color::rgb(255, 204, 0);

    #[test]
    fn unpacks_argb() {
        let color = Color::from_argb(0xFFC6FF00);
        assert_eq!(color, Color::rgb(0xC6, 0xFF, 0x00));
        assert_eq!(color.to_string(), "#C6FF00");
    }

    #[test]
    fn default_palette_is_in_declaration_order() {
        let highlighter = Highlighter::terminal_defaults();
        let markers: Vec<_> = highlighter
            .rules()
            .iter()
            .map(|rule| rule.marker.as_str())
            .collect();
        assert_eq!(markers.len(), 17);
        assert_eq!(markers[0], "[  OK  ]");
        assert_eq!(markers[9].len(), 59);
        assert_eq!(markers[16], "ERROR");
    }

    #[test]
    fn finds_every_occurrence() {
        let highlighter = Highlighter::new([HighlightRule::new("0x", AMBER)]);
        let spans = highlighter.spans("addr 0x1F then 0x2A");
        let ranges: Vec<_> = spans.iter().map(|span| span.range.clone()).collect();
        assert_eq!(ranges, vec![5..7, 15..17]);
        assert!(spans.iter().all(|span| span.color == AMBER));
    }

    #[test]
    fn same_rule_matches_do_not_overlap() {
        let highlighter = Highlighter::new([HighlightRule::new("aa", GREEN)]);
        let spans = highlighter.spans("aaaa");
        let ranges: Vec<_> = spans.iter().map(|span| span.range.clone()).collect();
        assert_eq!(ranges, vec![0..2, 2..4]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let highlighter = Highlighter::terminal_defaults();
        assert!(highlighter.spans("error: nothing here").is_empty());
        assert_eq!(highlighter.spans("ERROR: disk").len(), 1);
    }

    #[test]
    fn partial_marker_is_not_highlighted() {
        let highlighter = Highlighter::terminal_defaults();
        assert!(highlighter.spans("[  OK").is_empty());
        let spans = highlighter.spans("boot [  OK  ] done");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].range, 5..13);
        assert_eq!(spans[0].color, Color::rgb(0, 255, 136));
    }

    #[test]
    fn settled_len_holds_back_possible_markers() {
        let highlighter = Highlighter::terminal_defaults();
        assert_eq!(highlighter.settled_len("boot "), 5);
        assert_eq!(highlighter.settled_len("boot [  O"), 5);
        assert_eq!(highlighter.settled_len("boot [  OK  ]"), 12);
        assert_eq!(highlighter.settled_len("boot [  OK  ] "), 14);
        assert_eq!(highlighter.settled_len("value 0"), 6);
        assert_eq!(highlighter.settled_len("value 0x"), 8);
        assert_eq!(highlighter.settled_len("[7"), 2);
        assert_eq!(highlighter.settled_len("[12"), 1);
        assert_eq!(highlighter.settled_len(""), 0);
        assert_eq!(Highlighter::default().settled_len("[  O"), 4);
    }

    #[test]
    fn overlapping_rules_resolve_to_first_declared() {
        let highlighter = Highlighter::new([
            HighlightRule::new("CRT", GREEN),
            HighlightRule::new("RETRO CRT", AMBER),
        ]);
        let segments = highlighter.segments("RETRO CRT!");
        assert_eq!(
            segments,
            vec![
                Segment {
                    text: "RETRO ",
                    color: Some(AMBER),
                },
                Segment {
                    text: "CRT",
                    color: Some(GREEN),
                },
                Segment {
                    text: "!",
                    color: None,
                },
            ]
        );
    }

    #[test]
    fn segments_cover_whole_text() {
        let highlighter = Highlighter::terminal_defaults();
        let line = "[  OK  ] mounted é at 0xBEEF";
        let joined: String = highlighter
            .segments(line)
            .iter()
            .map(|segment| segment.text)
            .collect();
        assert_eq!(joined, line);
        assert!(highlighter.segments("").is_empty());
    }
}
