use tracing::{debug, warn};

use crate::config::PageConfig;
use crate::subtitle::Block;

/// Consecutive blocks sent to the translation provider together
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub blocks: Vec<Block>,
    /// Flat texts of all blocks joined by a single space
    pub text: String,
}

impl Page {
    fn from_blocks(blocks: Vec<Block>) -> Self {
        let text = blocks
            .iter()
            .map(Block::flat_text)
            .collect::<Vec<_>>()
            .join(" ");
        Self { blocks, text }
    }

    /// Block texts one per line, the layout used for per-block translation
    pub fn block_lines(&self) -> String {
        self.blocks
            .iter()
            .map(Block::flat_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Groups blocks into pages bounded by a UTF-8 byte budget
pub struct PageSplitter {
    config: PageConfig,
}

impl PageSplitter {
    pub fn new(config: PageConfig) -> Self {
        Self { config }
    }

    pub fn split(&self, blocks: Vec<Block>) -> Vec<Page> {
        let budget = self.config.transit_budget_bytes;
        let mut pages = Vec::new();
        let mut current: Vec<Block> = Vec::new();
        let mut current_bytes = 0;

        for block in blocks {
            let block_bytes = block.flat_text().len();
            // One separator byte between blocks in the page text
            let added = if current.is_empty() { block_bytes } else { block_bytes + 1 };

            if !current.is_empty() && current_bytes + added > budget {
                pages.push(Page::from_blocks(std::mem::take(&mut current)));
                current_bytes = 0;
            }

            if current.is_empty() && block_bytes > budget {
                warn!(
                    "Block of {} bytes exceeds the transit budget of {} bytes, sending it alone",
                    block_bytes, budget
                );
            }

            current_bytes += if current.is_empty() { block_bytes } else { block_bytes + 1 };
            current.push(block);
        }

        if !current.is_empty() {
            pages.push(Page::from_blocks(current));
        }

        debug!("Split subtitles into {} pages (budget {} bytes)", pages.len(), budget);
        pages
    }
}
