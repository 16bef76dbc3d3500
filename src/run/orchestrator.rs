//! End-to-end run orchestration.
//!
//! Drives the state machine `Idle → VariantBuilding → Transcribing →
//! Matching → Reporting → Done | Failed`. Every stage past variant building
//! is fail-soft: individual items may drop (logged, empty in the report) and
//! only an undecodable source fails the run. The orchestrator owns the run
//! directory; every intermediate asset lives there and is released (or
//! archived) together at run end.

use crate::config::Config;
use crate::enhance::builder::{BuildOptions, VariantSet, build_variants};
use crate::error::{CatchwordError, Result};
use crate::filter::FilterEngine;
use crate::matcher::{KeywordMatcher, MatchResult};
use crate::run::report::{TranscriptionRecord, render_report};
use crate::stt::backend::SttBackend;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    VariantBuilding,
    Transcribing,
    Matching,
    Reporting,
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::VariantBuilding => "variant-building",
            RunPhase::Transcribing => "transcribing",
            RunPhase::Matching => "matching",
            RunPhase::Reporting => "reporting",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything a completed run hands back to its caller.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_dir: PathBuf,
    pub report_path: PathBuf,
    pub report_text: String,
    pub variants: VariantSet,
    pub transcriptions: Vec<TranscriptionRecord>,
    pub match_result: Option<MatchResult>,
}

/// Drives one source asset through the whole pipeline.
pub struct Orchestrator {
    engine: Arc<dyn FilterEngine>,
    backends: Vec<Arc<dyn SttBackend>>,
    matcher: KeywordMatcher,
    config: Config,
    cancelled: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<dyn FilterEngine>,
        backends: Vec<Arc<dyn SttBackend>>,
        matcher: KeywordMatcher,
        config: Config,
    ) -> Self {
        Self {
            engine,
            backends,
            matcher,
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag that stops new filter/transcription calls when set.
    /// In-flight calls drain and their results are kept.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    fn transition(from: RunPhase, to: RunPhase) -> RunPhase {
        info!(%from, %to, "run phase");
        to
    }

    /// Run the full pipeline on `source`.
    ///
    /// Partial failures inside a stage drop single items and show up as
    /// empty report entries; only `InputUnreadable` (or a fully empty
    /// variant set) fails the run, in which case the run directory is
    /// removed and no report is produced.
    pub async fn process_audio(&self, source: &Path) -> Result<RunOutcome> {
        let mut phase = RunPhase::Idle;
        let run_dir = self.create_run_dir()?;

        phase = Self::transition(phase, RunPhase::VariantBuilding);
        let build_options = BuildOptions {
            pad_leading_ms: self.config.run.pad_leading_ms,
            pad_trailing_ms: self.config.run.pad_trailing_ms,
            filter_jobs: self.config.run.filter_jobs,
            cancelled: Arc::clone(&self.cancelled),
        };
        let variants = match build_variants(
            Arc::clone(&self.engine),
            source,
            &run_dir,
            &build_options,
        )
        .await
        {
            Ok(set) if !set.is_empty() => set,
            Ok(_) => {
                Self::transition(phase, RunPhase::Failed);
                self.discard_run_dir(&run_dir);
                return Err(CatchwordError::InputUnreadable {
                    path: source.display().to_string(),
                    message: "no variant could be produced".to_string(),
                });
            }
            Err(e) => {
                Self::transition(phase, RunPhase::Failed);
                self.discard_run_dir(&run_dir);
                return Err(e);
            }
        };
        info!(count = variants.len(), "variant set built");

        phase = Self::transition(phase, RunPhase::Transcribing);
        let transcriptions = self.transcribe_all(&variants).await;

        phase = if self.matcher.is_enabled() {
            let phase = Self::transition(phase, RunPhase::Matching);
            Self::transition(phase, RunPhase::Reporting)
        } else {
            Self::transition(phase, RunPhase::Reporting)
        };
        let match_result = if self.matcher.is_enabled() {
            self.select_match(&transcriptions)
        } else {
            None
        };

        let report_text = render_report(
            &source.display().to_string(),
            &transcriptions,
            match_result.as_ref(),
            self.matcher.is_enabled(),
        );
        let report_path = run_dir.join("report.txt");
        std::fs::write(&report_path, &report_text)?;

        Self::transition(phase, RunPhase::Done);
        Ok(RunOutcome {
            run_dir,
            report_path,
            report_text,
            variants,
            transcriptions,
            match_result,
        })
    }

    /// Transcribe every variant against every enabled backend under the
    /// transcription pool. Results come back in canonical order (variant
    /// order × backend order) no matter how the calls interleave.
    async fn transcribe_all(&self, variants: &VariantSet) -> Vec<TranscriptionRecord> {
        let backend_count = self.backends.len();
        let mut records: Vec<TranscriptionRecord> = Vec::new();
        for asset in variants.iter() {
            for backend in &self.backends {
                records.push(TranscriptionRecord::new(
                    asset.label(),
                    backend.id(),
                    String::new(),
                ));
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.run.transcribe_jobs.max(1)));
        let timeout = Duration::from_secs(self.config.stt.timeout_secs);
        let language = self.config.stt.language.clone();
        let mut jobs: JoinSet<(usize, String, Option<f32>)> = JoinSet::new();

        for (vi, asset) in variants.iter().enumerate() {
            for (bi, backend) in self.backends.iter().enumerate() {
                let index = vi * backend_count + bi;
                let asset = asset.clone();
                let backend = Arc::clone(backend);
                let semaphore = Arc::clone(&semaphore);
                let cancelled = Arc::clone(&self.cancelled);
                let language = language.clone();

                jobs.spawn(async move {
                    let Ok(_permit) = semaphore.acquire().await else {
                        return (index, String::new(), None);
                    };
                    if cancelled.load(Ordering::SeqCst) {
                        debug!(variant = asset.label(), backend = backend.id(), "skipped: cancelled");
                        return (index, String::new(), None);
                    }

                    let call = backend.transcribe(&asset, &language);
                    match tokio::time::timeout(timeout, call).await {
                        Ok(Ok(result)) => {
                            if result.text.is_empty() {
                                debug!(
                                    variant = asset.label(),
                                    backend = backend.id(),
                                    "no speech understood"
                                );
                            } else {
                                info!(
                                    variant = asset.label(),
                                    backend = backend.id(),
                                    text = %result.text,
                                    "transcribed"
                                );
                            }
                            (index, result.text, result.confidence)
                        }
                        Ok(Err(e)) => {
                            warn!(
                                variant = asset.label(),
                                backend = backend.id(),
                                error = %e,
                                "backend failed"
                            );
                            (index, String::new(), None)
                        }
                        Err(_) => {
                            warn!(
                                variant = asset.label(),
                                backend = backend.id(),
                                "backend timed out"
                            );
                            (index, String::new(), None)
                        }
                    }
                });
            }
        }

        while let Some(result) = jobs.join_next().await {
            match result {
                Ok((index, text, confidence)) => {
                    records[index].text = text;
                    records[index].confidence = confidence;
                }
                Err(e) => warn!(error = %e, "transcription task panicked"),
            }
        }

        records
    }

    /// Pick the single best (keyword, record) pairing across all
    /// transcriptions. Ties on score resolve to the earliest record in
    /// canonical order, then to vocabulary order within a record.
    fn select_match(&self, records: &[TranscriptionRecord]) -> Option<MatchResult> {
        let mut best: Option<MatchResult> = None;
        for record in records {
            if let Some((keyword, score)) = self.matcher.best_match(&record.text)
                && best.as_ref().is_none_or(|b| score > b.score)
            {
                best = Some(MatchResult {
                    keyword: keyword.to_string(),
                    score,
                    variant: record.variant.clone(),
                    backend: record.backend.clone(),
                });
            }
        }
        best
    }

    /// Create the timestamped run directory under the output root.
    fn create_run_dir(&self) -> Result<PathBuf> {
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        std::fs::create_dir_all(&self.config.run.output_dir)?;

        let mut candidate = self.config.run.output_dir.join(&stamp);
        let mut suffix = 1;
        while candidate.exists() {
            suffix += 1;
            candidate = self
                .config
                .run
                .output_dir
                .join(format!("{}-{}", stamp, suffix));
        }
        std::fs::create_dir(&candidate)?;
        Ok(candidate)
    }

    fn discard_run_dir(&self, run_dir: &Path) {
        if let Err(e) = std::fs::remove_dir_all(run_dir) {
            warn!(dir = %run_dir.display(), error = %e, "failed to remove run directory");
        }
    }
}
