use std::fmt;
use std::path::Path;
use std::str::FromStr;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;
use tracing::info;

use crate::error::{Result, SubsyncError};
use crate::page::Page;

// HH:MM:SS,mmm; a period is tolerated in place of the comma
static TIMECODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})[,.](\d{3})$").expect("valid timecode pattern")
});

// Timing line; trailing display coordinates are ignored
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+-->\s+(\S+)(?:\s.*)?$").expect("valid timing pattern")
});

/// A subtitle timestamp with millisecond precision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timecode(u64);

impl Timecode {
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Convert fractional seconds, rounding to the nearest millisecond
    pub fn from_secs(seconds: f64) -> Self {
        Self((seconds.max(0.0) * 1000.0).round() as u64)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn saturating_add_ms(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }
}

/// Format time in milliseconds to SRT time format (HH:MM:SS,mmm)
impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3_600_000;
        let minutes = (self.0 % 3_600_000) / 60_000;
        let secs = (self.0 % 60_000) / 1_000;
        let millis = self.0 % 1_000;

        write!(f, "{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }
}

impl FromStr for Timecode {
    type Err = SubsyncError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SubsyncError::InvalidSubtitle(format!("Invalid timecode: {}", s));

        let caps = TIMECODE_REGEX.captures(s.trim()).ok_or_else(invalid)?;
        let field = |i: usize| caps[i].parse::<u64>().map_err(|_| invalid());
        let (hours, minutes, seconds, millis) = (field(1)?, field(2)?, field(3)?, field(4)?);

        if minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }

        Ok(Self(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis))
    }
}

/// One element of a block's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    LineBreak,
}

/// One time-coded subtitle unit of at most two lines
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub words: Vec<Token>,
    pub start_time: Timecode,
    pub end_time: Timecode,
    /// Character count of the last rendered line
    pub current_line_length: usize,
    /// Translation of this block's text on its own
    pub raw_translation: Option<String>,
    /// Aligned, wrapped translation ready for rendering
    pub translation: Option<String>,
}

impl Block {
    pub fn new(start_time: Timecode, end_time: Timecode) -> Self {
        Self {
            words: Vec::new(),
            start_time,
            end_time: end_time.max(start_time),
            current_line_length: 0,
            raw_translation: None,
            translation: None,
        }
    }

    /// Build a block from already rendered text (one or more lines)
    pub fn from_text(text: &str, start_time: Timecode, end_time: Timecode) -> Self {
        let mut block = Self::new(start_time, end_time);
        for (line_no, line) in text.lines().filter(|l| !l.trim().is_empty()).enumerate() {
            if line_no == 1 {
                block.push_line_break();
            }
            for word in line.split_whitespace() {
                block.push_word(word);
            }
        }
        block
    }

    pub fn is_empty(&self) -> bool {
        !self.words.iter().any(|t| matches!(t, Token::Word(_)))
    }

    pub fn line_count(&self) -> usize {
        1 + self.words.iter().filter(|t| matches!(t, Token::LineBreak)).count()
    }

    pub fn push_word(&mut self, word: &str) {
        self.words.push(Token::Word(word.to_string()));
        self.refresh_line_length();
    }

    /// Insert the soft line break; a block holds at most one
    pub fn push_line_break(&mut self) {
        if self.line_count() < 2 {
            self.words.push(Token::LineBreak);
            self.current_line_length = 0;
        }
    }

    /// Glue punctuation onto the last word; false when there is no word yet
    pub fn append_to_last_word(&mut self, suffix: &str) -> bool {
        let last = self.words.iter_mut().rev().find_map(|t| match t {
            Token::Word(w) => Some(w),
            Token::LineBreak => None,
        });
        match last {
            Some(word) => {
                word.push_str(suffix);
                self.refresh_line_length();
                true
            }
            None => false,
        }
    }

    /// Words as plain strings, without the line break
    pub fn word_texts(&self) -> Vec<&str> {
        self.words
            .iter()
            .filter_map(|t| match t {
                Token::Word(w) => Some(w.as_str()),
                Token::LineBreak => None,
            })
            .collect()
    }

    /// Index (in word count) at which the second line starts, if any
    pub fn break_position(&self) -> Option<usize> {
        let mut words_before = 0;
        for token in &self.words {
            match token {
                Token::Word(_) => words_before += 1,
                Token::LineBreak => return Some(words_before),
            }
        }
        None
    }

    /// Move the line break so the second line starts at word `position`
    pub fn set_break_position(&mut self, position: usize) {
        let words: Vec<String> = self.word_texts().into_iter().map(str::to_string).collect();
        self.words = Vec::with_capacity(words.len() + 1);
        for (i, word) in words.into_iter().enumerate() {
            if i == position && i > 0 {
                self.words.push(Token::LineBreak);
            }
            self.words.push(Token::Word(word));
        }
        self.refresh_line_length();
    }

    /// Rendered text with the line break as `\n`
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut line_start = true;
        for token in &self.words {
            match token {
                Token::Word(w) => {
                    if !line_start {
                        out.push(' ');
                    }
                    out.push_str(w);
                    line_start = false;
                }
                Token::LineBreak => {
                    out.push('\n');
                    line_start = true;
                }
            }
        }
        out
    }

    /// Rendered text on a single line
    pub fn flat_text(&self) -> String {
        self.word_texts().join(" ")
    }

    fn refresh_line_length(&mut self) {
        let text = self.text();
        self.current_line_length = text.rsplit('\n').next().map_or(0, |l| l.chars().count());
    }
}

/// Output of rendering one page of aligned blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub content: String,
    /// Index to use for the first block of the next page
    pub next_index: usize,
    /// Blocks left out because they had no translation
    pub skipped: usize,
}

/// Render a page's translations starting at `start_index`
pub fn render_page(page: &Page, start_index: usize) -> RenderedPage {
    render_translations(&page.blocks, start_index)
}

/// Render translated blocks, leaving out any block without a translation
pub fn render_translations(blocks: &[Block], start_index: usize) -> RenderedPage {
    let mut content = String::new();
    let mut index = start_index;
    let mut skipped = 0;

    for block in blocks {
        match block.translation.as_deref() {
            Some(text) => {
                push_entry(&mut content, index, block, text);
                index += 1;
            }
            None => skipped += 1,
        }
    }

    RenderedPage {
        content,
        next_index: index,
        skipped,
    }
}

/// Render blocks in their original language, numbered from 1
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut content = String::new();
    for (index, block) in blocks.iter().enumerate() {
        push_entry(&mut content, index + 1, block, &block.text());
    }
    content
}

fn push_entry(out: &mut String, index: usize, block: &Block, text: &str) {
    out.push_str(&format!(
        "{}\n{} --> {}\n{}\n\n",
        index,
        block.start_time,
        block.end_time,
        text.trim()
    ));
}

/// Parse SRT content back into blocks
pub fn parse_srt(content: &str) -> Result<Vec<Block>> {
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");

    let mut blocks = Vec::new();
    let mut entry: Vec<&str> = Vec::new();

    for line in content.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !entry.is_empty() {
                blocks.push(parse_entry(&entry)?);
                entry.clear();
            }
        } else {
            entry.push(line);
        }
    }

    Ok(blocks)
}

fn parse_entry(lines: &[&str]) -> Result<Block> {
    let index = lines[0].trim();
    index.parse::<usize>().map_err(|_| {
        SubsyncError::InvalidSubtitle(format!("Expected entry number, found '{}'", index))
    })?;

    let timing = lines.get(1).ok_or_else(|| {
        SubsyncError::InvalidSubtitle(format!("Entry {} has no timing line", index))
    })?;
    let caps = TIMING_REGEX.captures(timing).ok_or_else(|| {
        SubsyncError::InvalidSubtitle(format!("Entry {} has malformed timing '{}'", index, timing))
    })?;
    let start: Timecode = caps[1].parse()?;
    let end: Timecode = caps[2].parse()?;
    if end < start {
        return Err(SubsyncError::InvalidSubtitle(format!(
            "Entry {} ends before it starts ({} --> {})",
            index, start, end
        )));
    }

    Ok(Block::from_text(&lines[2..].join("\n"), start, end))
}

/// Write SRT content to disk
pub async fn write_srt<P: AsRef<Path>>(content: &str, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Writing SRT file: {}", output_path.display());

    fs::write(output_path, content).await?;

    info!("SRT file written successfully");
    Ok(())
}
