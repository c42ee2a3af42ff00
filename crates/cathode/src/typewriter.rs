//! Terminal rendition of the reveal: one character at a time with the boot-log
//! markers highlighted and a block cursor trailing the text while it writes.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reveal::{Highlighter, RevealSequencer};

use crate::cli::{RunArgs, TypeArgs};
use crate::config::LoadedConfig;
use crate::paths::AppPaths;

/// DECSCUSR steady block, shown while the text is being written.
const BLOCK_CURSOR: &str = "\x1b[2 q";
const DEFAULT_CURSOR: &str = "\x1b[0 q";
const RESET: &str = "\x1b[0m";

pub fn run(run_args: &RunArgs, args: TypeArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let loaded = LoadedConfig::load(&paths, run_args.config.as_deref())?;
    let char_delay = args.char_delay.unwrap_or(loaded.config.reveal.char_delay);
    let text = read_text(args.file.as_deref())?;
    tracing::debug!(
        chars = text.chars().count(),
        ?char_delay,
        color = !args.no_color,
        "starting text reveal"
    );

    let highlighter = Highlighter::terminal_defaults();
    let mut typewriter = Typewriter::new(io::stdout().lock(), &highlighter, !args.no_color);
    typewriter
        .play(&text, char_delay, loaded.config.reveal.settle)
        .context("failed to write to stdout")
}

fn read_text(file: Option<&Path>) -> Result<String> {
    let raw = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read text from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read text from stdin")?;
            buffer
        }
    };
    Ok(raw.replace("\r\n", "\n"))
}

/// Writes each byte once, already in its final colour. Characters that could
/// still begin a marker are held back until the marker completes or is ruled
/// out, so nothing on screen is ever rewritten and wrapped lines stay intact.
struct Typewriter<'h, W> {
    out: W,
    highlighter: &'h Highlighter,
    color: bool,
    line: String,
    written: usize,
    block_cursor: bool,
}

impl<'h, W: Write> Typewriter<'h, W> {
    fn new(out: W, highlighter: &'h Highlighter, color: bool) -> Self {
        Self {
            out,
            highlighter,
            color,
            line: String::new(),
            written: 0,
            block_cursor: false,
        }
    }

    /// Reveals `text` in real time, sleeping until each character is due.
    fn play(&mut self, text: &str, char_delay: Duration, settle: Duration) -> io::Result<()> {
        let mut sequencer = RevealSequencer::new(char_delay, settle);
        sequencer.start(text, Instant::now());

        let mut revealed = Vec::new();
        loop {
            let now = Instant::now();
            sequencer.tick(now, |_, ch| revealed.push(ch));
            self.emit(&revealed, sequencer.is_writing(now))?;
            revealed.clear();

            match sequencer.next_deadline() {
                Some(deadline) => thread::sleep(deadline.saturating_duration_since(Instant::now())),
                None => break,
            }
        }

        self.finish_line()?;
        if self.block_cursor {
            thread::sleep(settle);
            self.show_block_cursor(sequencer.is_writing(Instant::now()))?;
        }
        if !text.is_empty() && !text.ends_with('\n') {
            writeln!(self.out)?;
        }
        self.out.flush()
    }

    fn emit(&mut self, chars: &[char], writing: bool) -> io::Result<()> {
        if chars.is_empty() {
            return Ok(());
        }
        if !self.color {
            let chunk: String = chars.iter().collect();
            self.out.write_all(chunk.as_bytes())?;
            return self.out.flush();
        }

        if writing {
            self.show_block_cursor(true)?;
        }
        for &ch in chars {
            if ch == '\n' {
                self.finish_line()?;
                writeln!(self.out)?;
                self.line.clear();
                self.written = 0;
            } else {
                self.line.push(ch);
            }
        }
        let settled = self.highlighter.settled_len(&self.line);
        self.write_styled(settled)?;
        if !writing {
            self.show_block_cursor(false)?;
        }
        self.out.flush()
    }

    /// Writes whatever of the current line is still held back.
    fn finish_line(&mut self) -> io::Result<()> {
        self.write_styled(self.line.len())
    }

    /// Writes `line[written..end]` with the colours of the whole line.
    fn write_styled(&mut self, end: usize) -> io::Result<()> {
        let mut offset = 0;
        for segment in self.highlighter.segments(&self.line) {
            let range = offset..offset + segment.text.len();
            offset = range.end;
            let from = range.start.max(self.written);
            let to = range.end.min(end);
            if from >= to {
                continue;
            }
            let text = &self.line[from..to];
            match segment.color {
                Some(color) => write!(
                    self.out,
                    "\x1b[1;38;2;{};{};{}m{text}{RESET}",
                    color.r, color.g, color.b
                )?,
                None => self.out.write_all(text.as_bytes())?,
            }
        }
        self.written = self.written.max(end);
        Ok(())
    }

    fn show_block_cursor(&mut self, show: bool) -> io::Result<()> {
        if show != self.block_cursor {
            self.block_cursor = show;
            let sequence = if show { BLOCK_CURSOR } else { DEFAULT_CURSOR };
            self.out.write_all(sequence.as_bytes())?;
        }
        Ok(())
    }
}
