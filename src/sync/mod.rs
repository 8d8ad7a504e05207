// Realignment of a full-page translation onto subtitle block boundaries
//
// Each page is translated twice: once as a whole (good translation, no
// timing) and once block by block (weaker translation, but one per block).
// The syncer walks the whole-page tokens and hands each block the span
// that best resembles that block's own translation:
// - cursor: read position over the page tokens
// - window: recent distances used to detect a plateau and pick the best span

pub mod cursor;
pub mod window;

use tracing::{debug, info, warn};

pub use cursor::TokenCursor;
pub use window::AlignmentWindow;

use crate::config::SyncConfig;
use crate::error::{Result, SubsyncError};
use crate::page::Page;
use crate::similarity::{MetricFactory, SimilarityMetric};
use crate::wrap::LineWrapper;

/// How a block's translation was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A candidate matched the block translation exactly
    Exact,
    /// Best span among the recent window of candidates
    BestInWindow,
    /// No similarity found; span ends where the next block starts matching
    ForwardMatch,
    /// Last block of the page, given every leftover token
    Remainder,
    /// No tokens were left for this block
    Unassigned,
}

/// Outcome of aligning one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub resolutions: Vec<Resolution>,
    pub tokens_consumed: usize,
    pub tokens_total: usize,
}

impl SyncReport {
    pub fn count(&self, resolution: Resolution) -> usize {
        self.resolutions.iter().filter(|r| **r == resolution).count()
    }
}

pub struct AlignmentSyncer {
    metric: Box<dyn SimilarityMetric>,
    config: SyncConfig,
    wrapper: LineWrapper,
}

impl AlignmentSyncer {
    pub fn new(metric: Box<dyn SimilarityMetric>, config: SyncConfig) -> Self {
        let wrapper = LineWrapper::new(config.max_line_width);
        Self {
            metric,
            config,
            wrapper,
        }
    }

    /// Create a syncer using the metric selected in the configuration
    pub fn from_config(config: SyncConfig) -> Self {
        Self::new(MetricFactory::create_metric(config.metric), config)
    }

    /// Fill every block's `translation` from the page's full translation
    pub fn sync_page(&self, full_translation: &str, page: &mut Page) -> Result<SyncReport> {
        let blocks = &mut page.blocks;
        let mut cursor = TokenCursor::new(full_translation);
        let mut report = SyncReport {
            tokens_total: cursor.total(),
            ..SyncReport::default()
        };

        let Some(last) = blocks.len().checked_sub(1) else {
            return Ok(report);
        };

        for (index, block) in blocks[..last].iter().enumerate() {
            if block.raw_translation.as_deref().is_none_or(|t| t.trim().is_empty()) {
                return Err(SubsyncError::DegenerateBlock { index });
            }
        }

        for index in 0..last {
            if cursor.is_exhausted() {
                warn!("No translated tokens left for block {}", index);
                blocks[index].translation = None;
                report.resolutions.push(Resolution::Unassigned);
                continue;
            }

            let reference = blocks[index].raw_translation.as_deref().unwrap_or_default();
            let next_reference = blocks[index + 1].raw_translation.as_deref();
            let (span, resolution) =
                self.match_block(index, reference, next_reference, cursor.remaining())?;

            let text = cursor.take(span).join(" ");
            debug!("Block {} ({:?}, {} tokens): {}", index, resolution, span, text);

            blocks[index].translation = Some(self.wrapper.wrap(&text));
            report.resolutions.push(resolution);
        }

        let rest = cursor.take_rest();
        if rest.is_empty() {
            warn!("No translated tokens left for the last block of the page");
            blocks[last].translation = None;
            report.resolutions.push(Resolution::Unassigned);
        } else {
            blocks[last].translation = Some(self.wrapper.wrap(&rest.join(" ")));
            report.resolutions.push(Resolution::Remainder);
        }

        report.tokens_consumed = cursor.position();
        info!(
            "Aligned {} blocks over {}/{} tokens: {} exact, {} best-in-window, {} forward-matched, {} unassigned",
            report.resolutions.len(),
            report.tokens_consumed,
            report.tokens_total,
            report.count(Resolution::Exact),
            report.count(Resolution::BestInWindow),
            report.count(Resolution::ForwardMatch),
            report.count(Resolution::Unassigned),
        );

        Ok(report)
    }

    /// Number of leading `tokens` that belong to the block at `index`
    fn match_block(
        &self,
        index: usize,
        reference: &str,
        next_reference: Option<&str>,
        tokens: &[&str],
    ) -> Result<(usize, Resolution)> {
        let mut window = AlignmentWindow::new(self.config.window_capacity);
        let mut candidate = String::new();
        let reference_len = reference.chars().count() as f64;

        for (i, token) in tokens.iter().enumerate() {
            if !candidate.is_empty() {
                candidate.push(' ');
            }
            candidate.push_str(token);
            let token_count = i + 1;

            let distance = self.metric.distance(reference, &candidate);
            if distance == 0.0 {
                return Ok((token_count, Resolution::Exact));
            }
            window.push(token_count, distance);

            let end_of_page = token_count == tokens.len();
            let plateau = window.is_full() && window.slope() >= 0.0;
            if !plateau && !end_of_page {
                continue;
            }

            if window.mean() >= 1.0 {
                let next_reference = next_reference
                    .filter(|t| !t.trim().is_empty())
                    .ok_or(SubsyncError::DegenerateBlock { index: index + 1 })?;

                let span = match self.forward_match(next_reference, tokens) {
                    Some(boundary) => boundary.max(1),
                    None => {
                        warn!(
                            "Block {} and its successor share nothing with the translation ({})",
                            index,
                            self.metric.name()
                        );
                        token_count
                    }
                };
                return Ok((span, Resolution::ForwardMatch));
            }

            let length_ratio = candidate.chars().count() as f64 / reference_len * 100.0;
            if length_ratio > self.config.length_ratio_threshold || end_of_page {
                let best = window.best_token_count().unwrap_or(token_count);
                return Ok((best, Resolution::BestInWindow));
            }
        }

        Ok((tokens.len(), Resolution::BestInWindow))
    }

    /// Index of the first token from which the candidate starts resembling the next block
    fn forward_match(&self, next_reference: &str, tokens: &[&str]) -> Option<usize> {
        let mut candidate = String::new();
        let mut total = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            if !candidate.is_empty() {
                candidate.push(' ');
            }
            candidate.push_str(token);

            total += self.metric.distance(next_reference, &candidate);
            if total / ((i + 1) as f64) < 1.0 {
                return Some(i);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricKind;
    use crate::page::PageSplitter;
    use crate::config::PageConfig;
    use crate::subtitle::{Block, Timecode};

    fn page_with(raw_translations: &[&str]) -> Page {
        let blocks = raw_translations
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let start = Timecode::from_millis(i as u64 * 2000);
                let mut block = Block::from_text("source text", start, start.saturating_add_ms(1500));
                block.raw_translation = Some(raw.to_string());
                block
            })
            .collect();
        PageSplitter::new(PageConfig::default())
            .split(blocks)
            .into_iter()
            .next()
            .unwrap()
    }

    fn translations(page: &Page) -> Vec<Option<&str>> {
        page.blocks.iter().map(|b| b.translation.as_deref()).collect()
    }

    fn syncer() -> AlignmentSyncer {
        AlignmentSyncer::from_config(SyncConfig::default())
    }

    /// Distances scripted by candidate length in tokens
    struct ScriptedMetric {
        by_token_count: Vec<f64>,
    }

    impl SimilarityMetric for ScriptedMetric {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn distance(&self, _reference: &str, candidate: &str) -> f64 {
            let count = candidate.split_whitespace().count();
            self.by_token_count.get(count - 1).copied().unwrap_or(0.9)
        }
    }

    #[test]
    fn exact_matches_consume_only_their_span() {
        let mut page = page_with(&["Hola mundo.", "¿Cómo estás?", "Bien."]);

        let report = syncer()
            .sync_page("Hola mundo. ¿Cómo estás? Bien.", &mut page)
            .unwrap();

        assert_eq!(
            translations(&page),
            vec![Some("Hola mundo."), Some("¿Cómo estás?"), Some("Bien.")]
        );
        assert_eq!(
            report.resolutions,
            vec![Resolution::Exact, Resolution::Exact, Resolution::Remainder]
        );
        assert_eq!(report.tokens_consumed, 5);
    }

    #[test]
    fn compressed_translation_picks_closest_span() {
        let mut page = page_with(&["El gato duerme en la casa", "y el perro ladra fuerte"]);

        let report = syncer()
            .sync_page("El gato duerme en casa y el perro ladra muy fuerte", &mut page)
            .unwrap();

        assert_eq!(
            translations(&page),
            vec![Some("El gato duerme en casa"), Some("y el perro ladra muy fuerte")]
        );
        assert_eq!(report.resolutions[0], Resolution::BestInWindow);
    }

    #[test]
    fn no_similarity_falls_back_to_forward_match() {
        let mut page = page_with(&["zzz qqq", "Hola mundo entero", "Adiós"]);
        let full = "aa bb cc dd ee ff gg hh ii jj kk ll mm Hola mundo entero Adiós";

        let report = syncer().sync_page(full, &mut page).unwrap();

        assert_eq!(report.resolutions[0], Resolution::ForwardMatch);
        assert_eq!(
            translations(&page),
            vec![
                Some("aa bb cc dd ee ff gg hh ii jj kk ll mm"),
                Some("Hola mundo entero"),
                Some("Adiós"),
            ]
        );
        assert_eq!(page.blocks[0].translation.as_deref().map(|t| t.lines().count()), Some(1));
    }

    #[test]
    fn forward_match_at_first_token_still_takes_one() {
        let mut page = page_with(&["zzzz", "Hola mundo", "fin"]);

        let report = syncer().sync_page("Hola mundo fin", &mut page).unwrap();

        assert_eq!(translations(&page), vec![Some("Hola"), Some("mundo"), Some("fin")]);
        assert_eq!(report.resolutions[0], Resolution::ForwardMatch);
    }

    #[test]
    fn unmatched_successor_keeps_stopped_candidate() {
        let mut page = page_with(&["zzzz", "qqqq", "xxxx"]);

        let report = syncer().sync_page("Hola mundo fin", &mut page).unwrap();

        assert_eq!(translations(&page), vec![Some("Hola mundo fin"), None, None]);
        assert_eq!(
            report.resolutions,
            vec![Resolution::ForwardMatch, Resolution::Unassigned, Resolution::Unassigned]
        );
        assert_eq!(report.tokens_consumed, 3);
    }

    #[test]
    fn forward_match_needs_successor_translation() {
        let mut page = page_with(&["zzzz", ""]);
        let err = syncer().sync_page("Hola mundo", &mut page).unwrap_err();
        assert!(matches!(err, SubsyncError::DegenerateBlock { index: 1 }));
    }

    #[test]
    fn ties_resolve_to_the_longest_span() {
        let config = SyncConfig {
            window_capacity: 4,
            ..SyncConfig::default()
        };
        let metric = || ScriptedMetric {
            by_token_count: vec![0.5, 0.2, 0.4, 0.2, 0.6, 0.7],
        };

        for _ in 0..3 {
            let syncer = AlignmentSyncer::new(Box::new(metric()), config.clone());
            let mut page = page_with(&["r", "rest"]);

            let report = syncer.sync_page("t1 t2 t3 t4 t5 t6", &mut page).unwrap();

            assert_eq!(translations(&page), vec![Some("t1 t2 t3 t4"), Some("t5 t6")]);
            assert_eq!(report.resolutions[0], Resolution::BestInWindow);
        }
    }

    #[test]
    fn short_candidate_keeps_growing_past_plateau() {
        // Flat distances but the candidate is still shorter than the reference
        let config = SyncConfig {
            window_capacity: 2,
            ..SyncConfig::default()
        };
        let metric = ScriptedMetric {
            by_token_count: vec![0.5, 0.5, 0.5, 0.3, 0.3],
        };
        let syncer = AlignmentSyncer::new(Box::new(metric), config);
        let mut page = page_with(&["a reference of twenty", "rest"]);

        syncer.sync_page("aaaa bbbb cccc dddd eeee ffff", &mut page).unwrap();

        assert_eq!(
            translations(&page),
            vec![Some("aaaa bbbb cccc dddd eeee"), Some("ffff")]
        );
    }

    #[test]
    fn end_of_page_leaves_last_block_untranslated() {
        let mut page = page_with(&["Hola mundo", "Adiós"]);

        let report = syncer().sync_page("Hola mund", &mut page).unwrap();

        assert_eq!(translations(&page), vec![Some("Hola mund"), None]);
        assert_eq!(
            report.resolutions,
            vec![Resolution::BestInWindow, Resolution::Unassigned]
        );
    }

    #[test]
    fn long_spans_are_wrapped() {
        let mut page = page_with(&[
            "Esta es una frase bastante larga que no cabe en una sola línea",
            "Fin",
        ]);

        syncer()
            .sync_page(
                "Esta es una frase bastante larga que no cabe en una sola línea Fin",
                &mut page,
            )
            .unwrap();

        assert_eq!(
            page.blocks[0].translation.as_deref(),
            Some("Esta es una frase bastante larga\nque no cabe en una sola línea")
        );
        assert_eq!(page.blocks[1].translation.as_deref(), Some("Fin"));
    }

    #[test]
    fn single_block_page_gets_everything() {
        let mut page = page_with(&["whatever"]);
        let report = syncer().sync_page("todo el texto", &mut page).unwrap();
        assert_eq!(translations(&page), vec![Some("todo el texto")]);
        assert_eq!(report.resolutions, vec![Resolution::Remainder]);
    }

    #[test]
    fn empty_raw_translation_is_degenerate() {
        let mut page = page_with(&["Hola", "  ", "Adiós"]);
        let err = syncer().sync_page("Hola Adiós", &mut page).unwrap_err();
        assert!(matches!(err, SubsyncError::DegenerateBlock { index: 1 }));
    }

    #[test]
    fn blocks_without_tokens_are_unassigned() {
        let mut page = page_with(&["Hola", "Adiós", "Fin"]);
        let report = syncer().sync_page("Hola", &mut page).unwrap();

        assert_eq!(translations(&page), vec![Some("Hola"), None, None]);
        assert_eq!(report.count(Resolution::Unassigned), 2);
    }

    #[test]
    fn any_metric_can_drive_the_syncer() {
        for kind in [
            MetricKind::Jaccard,
            MetricKind::SorensenDice,
            MetricKind::Cosine,
            MetricKind::NormalizedLevenshtein,
        ] {
            let config = SyncConfig {
                metric: kind,
                ..SyncConfig::default()
            };
            let mut page = page_with(&["Hola mundo.", "Adiós."]);

            AlignmentSyncer::from_config(config)
                .sync_page("Hola mundo. Adiós.", &mut page)
                .unwrap();

            assert_eq!(translations(&page), vec![Some("Hola mundo."), Some("Adiós.")], "{:?}", kind);
        }
    }
}
