use anyhow::{Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::checkpoint::CheckpointStore;
use crate::file_utils::{DocumentFiles, FileManager};
use crate::markup::IgnoreTags;
use crate::translation::{
    CharRatioCounter, Coordinator, Document, DocumentReport, RateLimiter, Splitter, SubFile,
    Translator,
};

// @module: Application controller for document directories

/// Options for one directory run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Where translated files go; `<input>-<target_language>` when `None`
    pub output_dir: Option<PathBuf>,
    /// Overwrite assets already present in the output directory
    pub force_overwrite: bool,
    /// Forget the document's checkpoint before starting
    pub restart: bool,
    /// Skip sub-files recorded in the checkpoint and record new ones
    pub resume: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            force_overwrite: false,
            restart: false,
            resume: true,
        }
    }
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Translation backend
    translator: Arc<dyn Translator>,
    // @field: Process-wide admission gate for provider calls
    limiter: Arc<RateLimiter>,
}

impl Controller {
    // @method: Create a controller around an existing translator
    pub fn with_translator(config: Config, translator: Arc<dyn Translator>) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(config.cooldown()));
        Ok(Self {
            config,
            translator,
            limiter,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open the checkpoint store named in the configuration
    pub fn open_checkpoint(&self) -> CheckpointStore {
        CheckpointStore::open(&self.config.checkpoint.state_file)
    }

    fn coordinator(&self) -> Result<Coordinator> {
        let chunking = &self.config.chunking;
        let counter = Arc::new(CharRatioCounter::new(chunking.chars_per_token));
        let splitter = Splitter::new(chunking.token_budget, counter)?;
        let ignore_tags = IgnoreTags::with_extra(&chunking.extra_ignore_tags)?;

        Ok(Coordinator::new(
            self.translator.clone(),
            self.limiter.clone(),
            splitter,
            ignore_tags,
            self.config.retry_policy(),
        ))
    }

    /// Translate every markup file under `input_dir` into the output directory
    pub async fn run_folder(&self, input_dir: &Path, options: &RunOptions) -> Result<DocumentReport> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| {
                FileManager::default_output_dir(
                    FileManager::normalize_path(input_dir),
                    &self.config.target_language,
                )
            });
        if FileManager::normalize_path(&output_dir) == FileManager::normalize_path(input_dir) {
            return Err(anyhow!("Output directory must differ from the input directory"));
        }
        FileManager::ensure_dir(&output_dir)?;

        let files = FileManager::find_document_files(input_dir, Some(&output_dir))?;
        info!(
            "Found {} markup file(s) and {} other file(s) in {:?}",
            files.markup.len(),
            files.assets.len(),
            input_dir
        );
        self.copy_assets(input_dir, &output_dir, &files, options.force_overwrite)?;

        let document = Self::load_document(input_dir, &files)?;

        let mut checkpoint = if self.config.checkpoint.enabled && options.resume {
            let mut store = self.open_checkpoint();
            if options.restart {
                info!("Restarting {} from scratch", document.id);
                store.clear(Some(&document.id))?;
            }
            Some(store)
        } else {
            None
        };

        let already_done = checkpoint
            .as_ref()
            .map_or(0, |store| Self::resumed_count(&document, store));
        if already_done > 0 {
            info!("Resuming: {} file(s) already translated", already_done);
        }

        let progress_bar = ProgressBar::new(document.subfiles.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_position(already_done as u64);

        let coordinator = self.coordinator()?;
        let report = coordinator
            .translate_document(&document, checkpoint.as_mut(), |outcome| {
                let target = output_dir.join(&outcome.subfile_id);
                FileManager::write_to_file(&target, &outcome.markup)?;
                if let Some(warning) = &outcome.integrity {
                    warn!("{}: {}", outcome.subfile_id, warning);
                }
                progress_bar.set_message(outcome.subfile_id.clone());
                progress_bar.inc(1);
                Ok(())
            })
            .await?;
        progress_bar.inc(report.failed.len() as u64);
        progress_bar.finish_and_clear();

        for (subfile_id, reason) in &report.failed {
            error!("Copied {} untranslated: {}", subfile_id, reason);
            FileManager::copy_file(input_dir.join(subfile_id), output_dir.join(subfile_id))?;
        }

        info!(
            "Finished {:?} in {:.1}s: {} translated, {} skipped, {} incomplete, {} failed",
            output_dir,
            start_time.elapsed().as_secs_f64(),
            report.translated.len(),
            report.skipped.len(),
            report.incomplete.len(),
            report.failed.len()
        );
        if !report.is_complete() {
            warn!("Some files were not fully translated; run again to retry them");
        }
        Ok(report)
    }

    fn load_document(input_dir: &Path, files: &DocumentFiles) -> Result<Document> {
        let subfiles = files
            .markup
            .iter()
            .map(|relative| {
                let path = input_dir.join(relative);
                let id = FileManager::relative_id(input_dir, &path)?;
                let markup = FileManager::read_to_string(&path)?;
                Ok(SubFile::new(id, markup))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Document {
            id: FileManager::document_id(input_dir),
            subfiles,
        })
    }

    // @returns: Sub-files on disk that the checkpoint already has
    fn resumed_count(document: &Document, store: &CheckpointStore) -> usize {
        document
            .subfiles
            .iter()
            .filter(|subfile| store.is_processed(&document.id, &subfile.id))
            .count()
    }

    fn copy_assets(&self, input_dir: &Path, output_dir: &Path, files: &DocumentFiles, force_overwrite: bool) -> Result<()> {
        for relative in &files.assets {
            let target = output_dir.join(relative);
            if target.exists() && !force_overwrite {
                debug!("Keeping existing {:?}", target);
                continue;
            }
            FileManager::copy_file(input_dir.join(relative), &target)?;
        }
        Ok(())
    }
}
