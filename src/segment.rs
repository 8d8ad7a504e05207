use tracing::{debug, info, warn};

use crate::config::SegmentConfig;
use crate::error::Result;
use crate::subtitle::{Block, Timecode};
use crate::transcript::TranscriptItem;

const SENTENCE_TERMINALS: [char; 3] = ['.', '?', '!'];

fn ends_sentence(text: &str) -> bool {
    text.trim_end().ends_with(SENTENCE_TERMINALS)
}

/// Builds time-coded subtitle blocks from word-level transcript items
pub struct PhraseSegmenter {
    config: SegmentConfig,
}

impl PhraseSegmenter {
    pub fn new(config: SegmentConfig) -> Self {
        Self { config }
    }

    pub fn segment(&self, items: &[TranscriptItem]) -> Result<Vec<Block>> {
        info!("Creating blocks from {} transcript items", items.len());

        let mut blocks: Vec<Block> = Vec::new();
        let mut open: Option<Block> = None;

        for (position, item) in items.iter().enumerate() {
            item.validate(position)?;

            match item {
                TranscriptItem::Punctuation { content } => {
                    self.attach_punctuation(content, open.as_mut(), &mut blocks, position);

                    if ends_sentence(content) {
                        if let Some(mut block) = open.take() {
                            self.extend_before_pause(&mut block, items, position);
                            self.close(block, &mut blocks);
                        }
                    }
                }
                TranscriptItem::Pronunciation {
                    content,
                    start_time,
                    end_time,
                } => {
                    let word_len = content.chars().count();
                    let overflows = open.as_ref().is_some_and(|b| {
                        b.current_line_length > 0
                            && b.current_line_length + word_len + 1 > self.config.max_line_width
                    });

                    if overflows {
                        match open.take() {
                            Some(mut block) if block.line_count() == 1 => {
                                block.push_line_break();
                                open = Some(block);
                            }
                            Some(block) => self.close(block, &mut blocks),
                            None => {}
                        }
                    }

                    match open.as_mut() {
                        Some(block) => {
                            block.end_time = Timecode::from_secs(*end_time).max(block.start_time);
                            block.push_word(content);
                        }
                        None => {
                            let start = Timecode::from_secs(*start_time);
                            let mut block = Block::new(
                                start,
                                start.saturating_add_ms(self.config.provisional_duration_ms),
                            );
                            block.push_word(content);
                            open = Some(block);
                        }
                    }
                }
            }
        }

        if let Some(block) = open.take() {
            if !block.is_empty() {
                self.close(block, &mut blocks);
            }
        }

        info!("Created {} blocks", blocks.len());
        Ok(blocks)
    }

    /// Glue punctuation to the preceding word, which may sit in the last closed block
    fn attach_punctuation(
        &self,
        content: &str,
        open: Option<&mut Block>,
        blocks: &mut [Block],
        position: usize,
    ) {
        if open.is_some_and(|b| b.append_to_last_word(content)) {
            return;
        }
        if blocks.last_mut().is_some_and(|b| b.append_to_last_word(content)) {
            return;
        }
        warn!("Dropping punctuation '{}' at item {}: no preceding word", content, position);
    }

    /// Hold the block a little longer when a pause follows the sentence
    fn extend_before_pause(&self, block: &mut Block, items: &[TranscriptItem], position: usize) {
        let next_start = items[position + 1..].iter().find_map(TranscriptItem::start_time);

        if let Some(next_start) = next_start {
            let gap = Timecode::from_secs(next_start)
                .as_millis()
                .saturating_sub(block.end_time.as_millis());
            if gap > self.config.max_pause_ms {
                block.end_time = block.end_time.saturating_add_ms(self.config.max_pause_ms);
            }
        }
    }

    fn close(&self, mut block: Block, blocks: &mut Vec<Block>) {
        if block.line_count() == 2 {
            self.balance_lines(&mut block);
        }
        debug!(
            "Block {}: {} --> {} {:?}",
            blocks.len() + 1,
            block.start_time,
            block.end_time,
            block.text()
        );
        blocks.push(block);
    }

    /// Move the line break to the valid split nearest the middle of the block
    fn balance_lines(&self, block: &mut Block) {
        let Some(current_break) = block.break_position() else {
            return;
        };
        let words = block.word_texts();
        let max = self.config.max_line_width;

        if ends_sentence(&words[..current_break].join(" ")) {
            return;
        }

        let lengths: Vec<usize> = words.iter().map(|w| w.chars().count()).collect();
        let total = lengths.iter().sum::<usize>() + lengths.len().saturating_sub(1);
        let half = total as f64 / 2.0;

        // (split, distance from the middle, longer line)
        let mut best: Option<(usize, f64, usize)> = None;
        let mut first = 0;
        for split in 1..words.len() {
            first += lengths[split - 1] + usize::from(split > 1);
            let second = total - first - 1;
            if first > max || second > max {
                continue;
            }

            let distance = (first as f64 - half).abs();
            let longer = first.max(second);
            let better = match best {
                None => true,
                Some((_, best_distance, best_longer)) => {
                    distance < best_distance || (distance == best_distance && longer < best_longer)
                }
            };
            if better {
                best = Some((split, distance, longer));
            }
        }

        match best {
            Some((split, _, _)) if split != current_break => block.set_break_position(split),
            Some(_) => {}
            None => debug!("No balanced split within {} characters, keeping original break", max),
        }
    }
}
