use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, SubsyncError};
use crate::page::{Page, PageSplitter};
use crate::segment::PhraseSegmenter;
use crate::subtitle::{Block, parse_srt, render_blocks, render_page, write_srt};
use crate::sync::{AlignmentSyncer, SyncReport};
use crate::transcript::Transcript;
use crate::translate::{Translator, TranslatorFactory};

pub struct Workflow {
    config: Config,
    translator: Box<dyn Translator>,
    segmenter: PhraseSegmenter,
    splitter: PageSplitter,
    syncer: AlignmentSyncer,
}

impl Workflow {
    pub fn new(config: Config, translator: Box<dyn Translator>) -> Result<Self> {
        config.validate()?;

        let segmenter = PhraseSegmenter::new(config.segment.clone());
        let splitter = PageSplitter::new(config.page.clone());
        let syncer = AlignmentSyncer::from_config(config.sync.clone());

        Ok(Self {
            config,
            translator,
            segmenter,
            splitter,
            syncer,
        })
    }

    /// Create a workflow backed by the configured translation provider
    pub fn from_config(config: Config) -> Result<Self> {
        let translator = TranslatorFactory::create_translator(config.translate.clone())?;
        Self::new(config, translator)
    }

    pub fn segment_transcript(&self, transcript: &Transcript) -> Result<Vec<Block>> {
        self.segmenter.segment(&transcript.items)
    }

    /// Segment a transcript file and write it as `{stem}_{language}.srt`
    pub async fn write_transcript_to_srt<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        transcript_path: P,
        source_language: &str,
        output_dir: Q,
    ) -> Result<PathBuf> {
        let transcript_path = transcript_path.as_ref();
        info!("Creating SRT from transcript: {}", transcript_path.display());

        let transcript = Transcript::from_file(transcript_path).await?;
        let blocks = self.segment_transcript(&transcript)?;

        let stem = file_stem(transcript_path)?;
        let output_path = output_dir
            .as_ref()
            .join(format!("{}_{}.srt", stem, source_language));

        write_srt(&render_blocks(&blocks), &output_path).await?;
        Ok(output_path)
    }

    /// Translate SRT content page by page, keeping every block's timing
    pub async fn translate_srt(
        &self,
        content: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String> {
        let blocks = parse_srt(content)?;
        let block_count = blocks.len();
        let pages = self.splitter.split(blocks);
        info!(
            "Translating {} blocks in {} pages from {} to {}",
            block_count,
            pages.len(),
            source_language,
            target_language
        );

        let pb = ProgressBar::new(pages.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages")
                .map(|style| style.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut output = String::new();
        let mut index = 1;

        for (page_no, mut page) in pages.into_iter().enumerate() {
            match self.translate_page(&mut page, source_language, target_language).await {
                Ok(_) => {
                    let rendered = render_page(&page, index);
                    if rendered.skipped > 0 {
                        warn!(
                            "Page {}: {} blocks had no translation and were left out",
                            page_no + 1,
                            rendered.skipped
                        );
                    }
                    output.push_str(&rendered.content);
                    index = rendered.next_index;
                }
                Err(e) if self.config.sync.isolate_page_failures => {
                    warn!("Skipping page {}: {}", page_no + 1, e);
                }
                Err(e) => {
                    pb.abandon();
                    return Err(e);
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!("Rendered {} translated blocks", index - 1);
        Ok(output)
    }

    async fn translate_page(
        &self,
        page: &mut Page,
        source_language: &str,
        target_language: &str,
    ) -> Result<SyncReport> {
        let full = self
            .translator
            .translate(&page.text, source_language, target_language)
            .await?;

        self.attach_raw_translations(page, source_language, target_language).await?;

        self.syncer.sync_page(&full.translated_text, page)
    }

    /// Translate each block on its own and store it as the block's raw translation
    async fn attach_raw_translations(
        &self,
        page: &mut Page,
        source_language: &str,
        target_language: &str,
    ) -> Result<()> {
        let batch = self
            .translator
            .translate(&page.block_lines(), source_language, target_language)
            .await?;

        let lines: Vec<&str> = batch
            .translated_text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        if lines.len() == page.blocks.len() {
            for (block, line) in page.blocks.iter_mut().zip(lines) {
                block.raw_translation = Some(line.to_string());
            }
            return Ok(());
        }

        warn!(
            "Provider returned {} lines for {} blocks, translating blocks one by one",
            lines.len(),
            page.blocks.len()
        );
        for block in page.blocks.iter_mut() {
            let single = self
                .translator
                .translate(&block.flat_text(), source_language, target_language)
                .await?;
            block.raw_translation = Some(single.translated_text.trim().to_string());
        }
        Ok(())
    }

    pub async fn translate_srt_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source_path: P,
        output_path: Q,
        source_language: &str,
        target_language: &str,
    ) -> Result<()> {
        let source_path = source_path.as_ref();
        if !source_path.exists() {
            return Err(SubsyncError::FileNotFound(source_path.display().to_string()));
        }

        let content = fs::read_to_string(source_path).await?;
        let translated = self
            .translate_srt(&content, source_language, target_language)
            .await?;

        write_srt(&translated, output_path).await
    }

    /// Build the source SRT for a transcript and translate it into every target language
    pub async fn process_transcript<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        transcript_path: P,
        source_language: &str,
        target_languages: &[String],
        output_dir: Option<Q>,
    ) -> Result<Vec<PathBuf>> {
        let transcript_path = transcript_path.as_ref();
        info!("Processing transcript: {}", transcript_path.display());

        if !transcript_path.exists() {
            return Err(SubsyncError::FileNotFound(transcript_path.display().to_string()));
        }

        // Determine output directory
        let output_dir = match output_dir {
            Some(dir) => dir.as_ref().to_path_buf(),
            None => transcript_path
                .parent()
                .ok_or_else(|| SubsyncError::Config("Cannot determine output directory".to_string()))?
                .to_path_buf(),
        };
        fs::create_dir_all(&output_dir).await?;

        let source_srt = self
            .write_transcript_to_srt(transcript_path, source_language, &output_dir)
            .await?;
        let stem = file_stem(transcript_path)?;

        let mut outputs = vec![source_srt.clone()];
        for target_language in target_languages {
            let target_srt = output_dir.join(format!("{}_{}.srt", stem, target_language));
            self.translate_srt_file(&source_srt, &target_srt, source_language, target_language)
                .await?;
            info!("Completed processing for language: {}", target_language);
            outputs.push(target_srt);
        }

        Ok(outputs)
    }

    /// Process every transcript (`*.json`) in a directory
    pub async fn process_directory<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_dir: P,
        source_language: &str,
        target_languages: &[String],
        output_dir: Option<Q>,
    ) -> Result<usize> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(SubsyncError::Config("Input path is not a directory".to_string()));
        }

        let output_dir = match output_dir {
            Some(dir) => dir.as_ref().to_path_buf(),
            None => input_dir.to_path_buf(),
        };

        let mut transcripts = Vec::new();
        for entry in WalkDir::new(input_dir).into_iter().filter_map(|e| e.ok()) {
            let is_json = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if is_json {
                transcripts.push(entry.path().to_path_buf());
            }
        }

        info!("Found {} transcripts to process", transcripts.len());

        let mut processed = 0;
        for transcript in transcripts {
            match self
                .process_transcript(&transcript, source_language, target_languages, Some(&output_dir))
                .await
            {
                Ok(_) => {
                    processed += 1;
                    info!("Successfully processed: {}", transcript.display());
                }
                Err(e) => warn!("Failed to process {}: {}", transcript.display(), e),
            }
        }

        Ok(processed)
    }
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| SubsyncError::Config(format!("Invalid filename: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{MockTranslator, Translation};
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use std::collections::HashMap;

    const SOURCE_SRT: &str = "1\n00:00:00,000 --> 00:00:01,000\nHello world.\n\n\
                              2\n00:00:01,500 --> 00:00:03,000\nHow are you?\n\n\
                              3\n00:00:03,500 --> 00:00:05,000\nFine thanks.\n\n\
                              4\n00:00:05,500 --> 00:00:06,000\nSee you.\n\n";

    const TRANSCRIPT: &str = r#"{"results": {
        "transcripts": [{"transcript": "Hello world."}],
        "items": [
            {"type": "pronunciation", "start_time": "0.0", "end_time": "0.4", "alternatives": [{"content": "Hello"}]},
            {"type": "pronunciation", "start_time": "0.5", "end_time": "0.9", "alternatives": [{"content": "world"}]},
            {"type": "punctuation", "alternatives": [{"content": "."}]}
        ]
    }}"#;

    fn scripted(responses: &[(&str, &str)]) -> Box<dyn Translator> {
        let responses: HashMap<String, String> = responses
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut mock = MockTranslator::new();
        mock.expect_translate().returning(move |text, _, _| {
            responses
                .get(text)
                .map(|t| Translation::new(t.clone()))
                .ok_or_else(|| SubsyncError::Translation(format!("unexpected text: {:?}", text)))
        });
        Box::new(mock)
    }

    fn workflow(config: Config, responses: &[(&str, &str)]) -> Workflow {
        Workflow::new(config, scripted(responses)).unwrap()
    }

    fn small_pages(isolate: bool) -> Config {
        let mut config = Config::default();
        config.page.transit_budget_bytes = 30;
        config.sync.isolate_page_failures = isolate;
        config
    }

    #[tokio::test]
    async fn translates_single_page_keeping_timing() {
        let wf = workflow(
            Config::default(),
            &[
                (
                    "Hello world. How are you? Fine thanks. See you.",
                    "Hola mundo. ¿Cómo estás? Bien gracias. Nos vemos.",
                ),
                (
                    "Hello world.\nHow are you?\nFine thanks.\nSee you.",
                    "Hola mundo.\n¿Cómo estás?\nBien gracias.\nNos vemos.",
                ),
            ],
        );

        let output = wf.translate_srt(SOURCE_SRT, "en", "es").await.unwrap();

        assert_eq!(
            output,
            "1\n00:00:00,000 --> 00:00:01,000\nHola mundo.\n\n\
             2\n00:00:01,500 --> 00:00:03,000\n¿Cómo estás?\n\n\
             3\n00:00:03,500 --> 00:00:05,000\nBien gracias.\n\n\
             4\n00:00:05,500 --> 00:00:06,000\nNos vemos.\n\n"
        );
    }

    #[tokio::test]
    async fn numbering_continues_across_pages() {
        let wf = workflow(
            small_pages(false),
            &[
                ("Hello world. How are you?", "Hola mundo. ¿Cómo estás?"),
                ("Hello world.\nHow are you?", "Hola mundo.\n¿Cómo estás?"),
                ("Fine thanks. See you.", "Bien gracias. Nos vemos."),
                ("Fine thanks.\nSee you.", "Bien gracias.\nNos vemos."),
            ],
        );

        let output = wf.translate_srt(SOURCE_SRT, "en", "es").await.unwrap();
        let indices: Vec<&str> = output.split("\n\n").filter_map(|e| e.lines().next()).collect();

        assert_eq!(indices, vec!["1", "2", "3", "4"]);
        assert!(output.contains("4\n00:00:05,500 --> 00:00:06,000\nNos vemos.\n\n"));
    }

    #[tokio::test]
    async fn mismatched_batch_falls_back_to_single_blocks() {
        let wf = workflow(
            small_pages(false),
            &[
                ("Hello world. How are you?", "Hola mundo. ¿Cómo estás?"),
                ("Hello world.\nHow are you?", "Hola mundo. ¿Cómo estás?"),
                ("Hello world.", "Hola mundo."),
                ("How are you?", "¿Cómo estás?"),
                ("Fine thanks. See you.", "Bien gracias. Nos vemos."),
                ("Fine thanks.\nSee you.", "Bien gracias.\nNos vemos."),
            ],
        );

        let output = wf.translate_srt(SOURCE_SRT, "en", "es").await.unwrap();
        assert!(output.starts_with("1\n00:00:00,000 --> 00:00:01,000\nHola mundo.\n\n"));
    }

    fn failing_second_page() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Hello world. How are you?", "Hola mundo. ¿Cómo estás?"),
            ("Hello world.\nHow are you?", "Hola mundo.\n¿Cómo estás?"),
            ("Fine thanks. See you.", "Bien gracias. Nos vemos."),
            ("Fine thanks.\nSee you.", "Nos vemos."),
            ("Fine thanks.", ""),
            ("See you.", "Nos vemos."),
        ]
    }

    #[tokio::test]
    async fn degenerate_page_aborts_by_default() {
        let wf = workflow(small_pages(false), &failing_second_page());
        let err = wf.translate_srt(SOURCE_SRT, "en", "es").await.unwrap_err();
        assert!(matches!(err, SubsyncError::DegenerateBlock { index: 0 }));
    }

    #[tokio::test]
    async fn isolated_page_failure_keeps_other_pages() {
        let wf = workflow(small_pages(true), &failing_second_page());

        let output = wf.translate_srt(SOURCE_SRT, "en", "es").await.unwrap();

        assert_eq!(
            output,
            "1\n00:00:00,000 --> 00:00:01,000\nHola mundo.\n\n\
             2\n00:00:01,500 --> 00:00:03,000\n¿Cómo estás?\n\n"
        );
    }

    #[tokio::test]
    async fn writes_source_srt_from_transcript() {
        let temp = TempDir::new().unwrap();
        let transcript = temp.child("talk.json");
        transcript.write_str(TRANSCRIPT).unwrap();

        let wf = workflow(Config::default(), &[]);
        let srt = wf
            .write_transcript_to_srt(transcript.path(), "en", temp.path())
            .await
            .unwrap();

        assert_eq!(srt, temp.path().join("talk_en.srt"));
        temp.child("talk_en.srt")
            .assert("1\n00:00:00,000 --> 00:00:00,900\nHello world.\n\n");
    }

    #[tokio::test]
    async fn processes_directory_of_transcripts() {
        let input = TempDir::new().unwrap();
        input.child("talk.json").write_str(TRANSCRIPT).unwrap();
        input.child("notes.txt").write_str("ignored").unwrap();
        let output = TempDir::new().unwrap();

        let wf = workflow(Config::default(), &[("Hello world.", "Hola mundo.")]);
        let processed = wf
            .process_directory(input.path(), "en", &["es".to_string()], Some(output.path()))
            .await
            .unwrap();

        assert_eq!(processed, 1);
        let source = std::fs::read_to_string(output.path().join("talk_en.srt")).unwrap();
        assert!(source.contains("Hello world."));
        output
            .child("talk_es.srt")
            .assert("1\n00:00:00,000 --> 00:00:00,900\nHola mundo.\n\n");
    }

    #[test]
    fn missing_source_file_is_reported() {
        let wf = workflow(Config::default(), &[]);
        let err = tokio_test::block_on(wf.translate_srt_file(
            "/no/such/file.srt",
            "/tmp/out.srt",
            "en",
            "es",
        ))
        .unwrap_err();
        assert!(matches!(err, SubsyncError::FileNotFound(_)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = Config::default();
        config.sync.window_capacity = 1;
        assert!(matches!(
            Workflow::new(config, scripted(&[])),
            Err(SubsyncError::Config(_))
        ));
    }
}
