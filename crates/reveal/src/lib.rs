//! Character-by-character text reveal driven by an external clock.
//!
//! [`RevealSequencer`] is an explicit state machine: callers feed it `Instant`s
//! from whatever tick source they own and it reports how many characters are
//! visible. Starting a new text cancels the previous reveal outright.

mod highlight;

use std::time::{Duration, Instant};

pub use highlight::{Color, HighlightRule, Highlighter, Segment, StyledSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Idle,
    Revealing { count: usize },
    Done,
}

pub struct RevealSequencer {
    text: String,
    /// Byte offset of the end of each character; `boundaries[i]` closes char `i`.
    boundaries: Vec<usize>,
    char_delay: Duration,
    settle: Duration,
    state: RevealState,
    started_at: Instant,
    finished_at: Option<Instant>,
}

impl RevealSequencer {
    pub fn new(char_delay: Duration, settle: Duration) -> Self {
        Self {
            text: String::new(),
            boundaries: Vec::new(),
            char_delay: char_delay.max(Duration::from_nanos(1)),
            settle,
            state: RevealState::Idle,
            started_at: Instant::now(),
            finished_at: None,
        }
    }

    pub fn char_delay(&self) -> Duration {
        self.char_delay
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    /// Total length of the current text in characters.
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Replaces the text and restarts from zero visible characters.
    pub fn start(&mut self, text: impl Into<String>, now: Instant) {
        self.text = text.into();
        self.boundaries = self
            .text
            .char_indices()
            .map(|(offset, ch)| offset + ch.len_utf8())
            .collect();
        self.started_at = now;
        if self.boundaries.is_empty() {
            self.state = RevealState::Done;
            self.finished_at = Some(now);
        } else {
            self.state = RevealState::Revealing { count: 0 };
            self.finished_at = None;
        }
    }

    /// Drops the current text and returns to `Idle`.
    pub fn cancel(&mut self) {
        self.text.clear();
        self.boundaries.clear();
        self.state = RevealState::Idle;
        self.finished_at = None;
    }

    pub fn visible_count(&self) -> usize {
        match self.state {
            RevealState::Idle => 0,
            RevealState::Revealing { count } => count,
            RevealState::Done => self.boundaries.len(),
        }
    }

    pub fn visible_text(&self) -> &str {
        match self.visible_count() {
            0 => "",
            count => &self.text[..self.boundaries[count - 1]],
        }
    }

    /// Advances the reveal to `now`, calling `on_char` once for every newly
    /// visible character with its zero-based index. Returns how many
    /// characters were revealed by this call.
    pub fn tick<F>(&mut self, now: Instant, mut on_char: F) -> usize
    where
        F: FnMut(usize, char),
    {
        let RevealState::Revealing { count } = self.state else {
            return 0;
        };

        let total = self.boundaries.len();
        let elapsed = now.saturating_duration_since(self.started_at);
        let due = (elapsed.as_nanos() / self.char_delay.as_nanos()).min(total as u128) as usize;
        if due <= count {
            return 0;
        }

        for index in count..due {
            let start = if index == 0 {
                0
            } else {
                self.boundaries[index - 1]
            };
            let ch = self.text[start..self.boundaries[index]]
                .chars()
                .next()
                .unwrap_or_default();
            on_char(index, ch);
        }

        if due == total {
            self.state = RevealState::Done;
            self.finished_at = Some(self.started_at + self.char_delay * total as u32);
        } else {
            self.state = RevealState::Revealing { count: due };
        }
        due - count
    }

    /// When the next character becomes due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            RevealState::Revealing { count } => {
                Some(self.started_at + self.char_delay * (count as u32 + 1))
            }
            RevealState::Idle | RevealState::Done => None,
        }
    }

    /// True while characters are still being revealed and for the settle
    /// period after the last one.
    pub fn is_writing(&self, now: Instant) -> bool {
        match self.state {
            RevealState::Idle => false,
            RevealState::Revealing { .. } => true,
            RevealState::Done => self
                .finished_at
                .is_some_and(|finished| now < finished + self.settle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(20);

    fn sequencer() -> RevealSequencer {
        RevealSequencer::new(DELAY, Duration::from_millis(150))
    }

    #[test]
    fn starts_idle() {
        let seq = sequencer();
        assert_eq!(seq.state(), RevealState::Idle);
        assert_eq!(seq.visible_count(), 0);
        assert_eq!(seq.visible_text(), "");
        assert!(seq.next_deadline().is_none());
    }

    #[test]
    fn reveals_one_character_per_delay() {
        let mut seq = sequencer();
        let start = Instant::now();
        seq.start("hello", start);
        assert_eq!(seq.visible_count(), 0);

        assert_eq!(seq.tick(start + DELAY / 2, |_, _| {}), 0);
        assert_eq!(seq.tick(start + DELAY, |_, _| {}), 1);
        assert_eq!(seq.visible_text(), "h");
        assert_eq!(seq.tick(start + DELAY * 3, |_, _| {}), 2);
        assert_eq!(seq.visible_text(), "hel");
        assert_eq!(seq.next_deadline(), Some(start + DELAY * 4));
    }

    #[test]
    fn completes_and_holds_after_full_duration() {
        let mut seq = sequencer();
        let start = Instant::now();
        let text = "READY.";
        seq.start(text, start);

        let mut revealed = Vec::new();
        let end = start + DELAY * text.len() as u32 + Duration::from_millis(1);
        seq.tick(end, |index, ch| revealed.push((index, ch)));

        assert_eq!(seq.state(), RevealState::Done);
        assert_eq!(seq.visible_count(), text.len());
        assert_eq!(revealed.len(), text.len());
        assert_eq!(revealed.first(), Some(&(0, 'R')));
        assert_eq!(revealed.last(), Some(&(5, '.')));

        let mut extra = 0;
        seq.tick(end + Duration::from_secs(10), |_, _| extra += 1);
        assert_eq!(extra, 0);
        assert_eq!(seq.visible_count(), text.len());
        assert!(seq.next_deadline().is_none());
    }

    #[test]
    fn restart_resets_count_for_new_text() {
        let mut seq = sequencer();
        let start = Instant::now();
        seq.start("first message", start);
        seq.tick(start + DELAY * 5, |_, _| {});
        assert_eq!(seq.visible_count(), 5);

        let restart = start + DELAY * 5;
        seq.start("second", restart);
        assert_eq!(seq.visible_count(), 0);
        assert_eq!(seq.len(), 6);
        assert_eq!(seq.state(), RevealState::Revealing { count: 0 });

        seq.tick(restart + DELAY * 2, |_, _| {});
        assert_eq!(seq.visible_text(), "se");
    }

    #[test]
    fn counts_unicode_scalars() {
        let mut seq = sequencer();
        let start = Instant::now();
        seq.start("é█z", start);
        assert_eq!(seq.len(), 3);
        seq.tick(start + DELAY * 2, |_, _| {});
        assert_eq!(seq.visible_text(), "é█");
    }

    #[test]
    fn empty_text_is_done_immediately() {
        let mut seq = sequencer();
        let start = Instant::now();
        seq.start("", start);
        assert_eq!(seq.state(), RevealState::Done);
        assert_eq!(seq.tick(start + DELAY, |_, _| {}), 0);
    }

    #[test]
    fn writing_lingers_for_settle_period() {
        let mut seq = sequencer();
        let start = Instant::now();
        seq.start("ab", start);
        assert!(seq.is_writing(start));
        let finished = start + DELAY * 2;
        seq.tick(finished, |_, _| {});
        assert!(seq.is_writing(finished + Duration::from_millis(100)));
        assert!(!seq.is_writing(finished + Duration::from_millis(150)));
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut seq = sequencer();
        let start = Instant::now();
        seq.start("abc", start);
        seq.tick(start + DELAY, |_, _| {});
        seq.cancel();
        assert_eq!(seq.state(), RevealState::Idle);
        assert_eq!(seq.visible_count(), 0);
        assert_eq!(seq.tick(start + DELAY * 10, |_, _| {}), 0);
    }
}
