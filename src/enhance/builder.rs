//! Variant construction: expanding one source asset into the full set of
//! enhanced copies.
//!
//! Independent variants run under a CPU-sized permit pool; each combined
//! chain is a single ordered unit, and the two chains may run concurrently
//! with each other. A failed step drops only its own variant (or the rest of
//! its own chain) and is logged — sibling variants are unaffected. Only an
//! undecodable source is fatal.

use crate::audio::asset::{AudioAsset, AudioBuffer};
use crate::audio::{normalize, pad};
use crate::enhance::catalog::{PlannedVariant, VariantKind, variant_plan};
use crate::enhance::spec::{EnhancementKind, EnhancementSpec, Strength};
use crate::error::{CatchwordError, Result};
use crate::filter::FilterEngine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Ordered mapping from deterministic label to produced asset.
///
/// Insertion order is the canonical report order; labels are unique within
/// a run.
#[derive(Debug, Clone, Default)]
pub struct VariantSet {
    entries: Vec<AudioAsset>,
}

impl VariantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an asset, enforcing label uniqueness.
    pub fn push(&mut self, asset: AudioAsset) -> Result<()> {
        if self.entries.iter().any(|e| e.label() == asset.label()) {
            return Err(CatchwordError::Other(format!(
                "duplicate variant label: {}",
                asset.label()
            )));
        }
        self.entries.push(asset);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AudioAsset> {
        self.entries.iter()
    }

    pub fn get(&self, label: &str) -> Option<&AudioAsset> {
        self.entries.iter().find(|e| e.label() == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label()).collect()
    }
}

/// Knobs for variant construction.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub pad_leading_ms: u32,
    pub pad_trailing_ms: u32,
    /// Bounded pool size for engine invocations (0 = available CPU cores).
    pub filter_jobs: usize,
    /// Checked before each new engine call; in-flight calls drain.
    pub cancelled: Arc<AtomicBool>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            pad_leading_ms: crate::defaults::PAD_LEADING_MS,
            pad_trailing_ms: crate::defaults::PAD_TRAILING_MS,
            filter_jobs: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl BuildOptions {
    fn permits(&self) -> usize {
        if self.filter_jobs > 0 {
            self.filter_jobs
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2)
        }
    }
}

/// Expand `source` into the full variant set inside `run_dir`.
///
/// Returns `InputUnreadable` if the source cannot be decoded at all;
/// every other failure drops a single variant and is logged.
pub async fn build_variants(
    engine: Arc<dyn FilterEngine>,
    source: &Path,
    run_dir: &Path,
    options: &BuildOptions,
) -> Result<VariantSet> {
    let plan = variant_plan();
    let mut produced: Vec<Option<AudioAsset>> = vec![None; plan.len()];

    // Baselines: decode the source once, re-encode it into the run directory,
    // and derive the padded copy. Decode failure here is the fatal case.
    let buffer = AudioBuffer::load(source)?;
    debug!(
        duration_secs = buffer.duration_secs(),
        sample_rate = buffer.sample_rate,
        channels = buffer.channels,
        "source decoded"
    );

    let original_path = run_dir.join("original.wav");
    buffer.store(&original_path)?;
    produced[0] = Some(AudioAsset::new("original", &original_path));

    let padded_buffer = pad::pad(&buffer, options.pad_leading_ms, options.pad_trailing_ms);
    let padded_path = run_dir.join("padded.wav");
    padded_buffer.store(&padded_path)?;
    produced[1] = Some(AudioAsset::new("padded", &padded_path));

    let work_dir = run_dir.join("work");
    std::fs::create_dir_all(&work_dir)?;

    let semaphore = Arc::new(Semaphore::new(options.permits()));
    let mut jobs: JoinSet<(usize, Option<AudioAsset>)> = JoinSet::new();

    // Independent single-spec variants: each starts from the original or
    // padded baseline, never from another enhancement's output.
    for (index, planned) in plan.iter().enumerate() {
        let VariantKind::Single { spec, padded_input } = planned.kind else {
            continue;
        };
        let input = if padded_input {
            padded_path.clone()
        } else {
            original_path.clone()
        };
        let output = run_dir.join(format!("{}.wav", planned.label));
        let label = planned.label.clone();
        let engine = Arc::clone(&engine);
        let semaphore = Arc::clone(&semaphore);
        let cancelled = Arc::clone(&options.cancelled);

        jobs.spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return (index, None);
            };
            if cancelled.load(Ordering::SeqCst) {
                debug!(label, "skipping variant: run cancelled");
                return (index, None);
            }
            match engine
                .apply(&input, &spec.filter_expression(), &output)
                .await
            {
                Ok(()) => (index, Some(AudioAsset::new(label, output))),
                Err(e) => {
                    warn!(label, error = %e, "variant dropped");
                    (index, None)
                }
            }
        });
    }

    // Combined chains: one ordered unit per strength. The two chains may run
    // concurrently with each other but never interleave internally.
    let mut chains: JoinSet<(Strength, Option<AudioAsset>, Option<AudioAsset>)> = JoinSet::new();
    for strength in Strength::ALL {
        let engine = Arc::clone(&engine);
        let semaphore = Arc::clone(&semaphore);
        let cancelled = Arc::clone(&options.cancelled);
        let work_dir = work_dir.clone();
        let run_dir = run_dir.to_path_buf();
        let original = original_path.clone();
        let pad_leading = options.pad_leading_ms;
        let pad_trailing = options.pad_trailing_ms;

        chains.spawn(async move {
            match run_chain(
                engine,
                semaphore,
                cancelled,
                strength,
                &original,
                &work_dir,
                &run_dir,
                pad_leading,
                pad_trailing,
            )
            .await
            {
                Ok((combined, combined_padded)) => (strength, Some(combined), Some(combined_padded)),
                Err(e) => {
                    warn!(chain = %format!("combined-{}", strength), error = %e, "chain abandoned");
                    (strength, None, None)
                }
            }
        });
    }

    while let Some(result) = jobs.join_next().await {
        match result {
            Ok((index, asset)) => produced[index] = asset,
            Err(e) => warn!(error = %e, "variant task panicked"),
        }
    }

    while let Some(result) = chains.join_next().await {
        match result {
            Ok((strength, combined, combined_padded)) => {
                let label = format!("combined-{}", strength);
                let padded_label = format!("combined-{}-padded", strength);
                for (slot_label, asset) in [(label, combined), (padded_label, combined_padded)] {
                    if let Some(index) = plan.iter().position(|v| v.label == slot_label) {
                        produced[index] = asset;
                    }
                }
            }
            Err(e) => warn!(error = %e, "chain task panicked"),
        }
    }

    let mut set = VariantSet::new();
    for asset in produced.into_iter().flatten() {
        set.push(asset)?;
    }
    Ok(set)
}

/// Run one combined chain: the five kinds in catalog order, each consuming
/// the previous link's output, finished with in-memory level normalization
/// and a padded counterpart of the final result.
///
/// A failure at any link abandons the remaining links — no usable
/// intermediate exists past the failing one.
#[allow(clippy::too_many_arguments)]
async fn run_chain(
    engine: Arc<dyn FilterEngine>,
    semaphore: Arc<Semaphore>,
    cancelled: Arc<AtomicBool>,
    strength: Strength,
    original: &Path,
    work_dir: &Path,
    run_dir: &Path,
    pad_leading_ms: u32,
    pad_trailing_ms: u32,
) -> Result<(AudioAsset, AudioAsset)> {
    let chain_label = format!("combined-{}", strength);
    let mut current: PathBuf = original.to_path_buf();

    for (step, kind) in EnhancementKind::ALL.into_iter().enumerate() {
        if cancelled.load(Ordering::SeqCst) {
            return Err(CatchwordError::ChainAbandoned {
                chain: chain_label,
                step: "cancelled".to_string(),
            });
        }

        let spec = EnhancementSpec::new(kind, strength);
        let output = work_dir.join(format!("{}-{}-{}.wav", chain_label, step + 1, kind.slug()));

        let _permit = semaphore
            .acquire()
            .await
            .map_err(|e| CatchwordError::Other(e.to_string()))?;
        engine
            .apply(&current, &spec.filter_expression(), &output)
            .await
            .map_err(|_| CatchwordError::ChainAbandoned {
                chain: chain_label.clone(),
                step: kind.slug().to_string(),
            })?;
        current = output;
    }

    // Final link: level normalization, in memory.
    let buffer = AudioBuffer::load(&current).map_err(|_| CatchwordError::ChainAbandoned {
        chain: chain_label.clone(),
        step: "normalize".to_string(),
    })?;
    let normalized = normalize::normalize(&buffer);

    let combined_path = run_dir.join(format!("{}.wav", chain_label));
    normalized.store(&combined_path)?;

    let padded = pad::pad(&normalized, pad_leading_ms, pad_trailing_ms);
    let padded_path = run_dir.join(format!("{}-padded.wav", chain_label));
    padded.store(&padded_path)?;

    Ok((
        AudioAsset::new(chain_label.clone(), combined_path),
        AudioAsset::new(format!("{}-padded", chain_label), padded_path),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::MockFilterEngine;
    use tempfile::tempdir;

    fn write_source(dir: &Path) -> PathBuf {
        let buffer = AudioBuffer {
            samples: (0..16000).map(|i| ((i % 200) * 50) as i16).collect(),
            sample_rate: 16000,
            channels: 1,
        };
        let path = dir.join("source.wav");
        buffer.store(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn full_plan_is_produced_with_healthy_engine() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path());
        let run_dir = dir.path().join("run");
        std::fs::create_dir_all(&run_dir).unwrap();

        let engine = Arc::new(MockFilterEngine::new());
        let set = build_variants(engine, &source, &run_dir, &BuildOptions::default())
            .await
            .unwrap();

        assert_eq!(set.len(), 26);
        let expected: Vec<String> = variant_plan().into_iter().map(|v| v.label).collect();
        let actual: Vec<String> = set.labels().iter().map(|s| s.to_string()).collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn label_set_is_identical_across_runs() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path());

        let mut label_sets = Vec::new();
        for run in 0..2 {
            let run_dir = dir.path().join(format!("run{}", run));
            std::fs::create_dir_all(&run_dir).unwrap();
            let engine = Arc::new(MockFilterEngine::new());
            let set = build_variants(engine, &source, &run_dir, &BuildOptions::default())
                .await
                .unwrap();
            label_sets.push(
                set.labels()
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>(),
            );
        }
        assert_eq!(label_sets[0], label_sets[1]);
    }

    #[tokio::test]
    async fn single_filter_failure_drops_exactly_two_variants() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path());
        let run_dir = dir.path().join("run");
        std::fs::create_dir_all(&run_dir).unwrap();

        // The strong noise-suppress expression appears in two singles and in
        // the strong chain's second link.
        let engine = Arc::new(MockFilterEngine::new().failing_on("afftdn=nf=-38"));
        let set = build_variants(engine, &source, &run_dir, &BuildOptions::default())
            .await
            .unwrap();

        // denoise-strong and padded-denoise-strong drop; the strong chain is
        // abandoned (both its variants); everything else survives.
        assert!(set.get("denoise-strong").is_none());
        assert!(set.get("padded-denoise-strong").is_none());
        assert!(set.get("combined-strong").is_none());
        assert!(set.get("combined-strong-padded").is_none());

        assert!(set.get("denoise-weak").is_some());
        assert!(set.get("combined-weak").is_some());
        assert!(set.get("combined-weak-padded").is_some());
        assert_eq!(set.len(), 26 - 4);
    }

    #[tokio::test]
    async fn chain_failure_leaves_single_variants_intact() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path());
        let run_dir = dir.path().join("run");
        std::fs::create_dir_all(&run_dir).unwrap();

        // dynaudnorm weak settings appear in the weak singles and weak chain.
        let engine = Arc::new(MockFilterEngine::new().failing_on("dynaudnorm=f=500"));
        let set = build_variants(engine, &source, &run_dir, &BuildOptions::default())
            .await
            .unwrap();

        assert!(set.get("dynnorm-weak").is_none());
        assert!(set.get("padded-dynnorm-weak").is_none());
        assert!(set.get("combined-weak").is_none());
        assert!(set.get("combined-weak-padded").is_none());

        // Strong chain and strong dynnorm singles unaffected
        assert!(set.get("dynnorm-strong").is_some());
        assert!(set.get("combined-strong").is_some());
        assert_eq!(set.len(), 26 - 4);
    }

    #[tokio::test]
    async fn undecodable_source_is_fatal() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("broken.wav");
        std::fs::write(&source, b"not audio").unwrap();
        let run_dir = dir.path().join("run");
        std::fs::create_dir_all(&run_dir).unwrap();

        let engine = Arc::new(MockFilterEngine::new());
        let err = build_variants(engine, &source, &run_dir, &BuildOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatchwordError::InputUnreadable { .. }));
    }

    #[tokio::test]
    async fn cancelled_run_keeps_baselines_only() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path());
        let run_dir = dir.path().join("run");
        std::fs::create_dir_all(&run_dir).unwrap();

        let options = BuildOptions {
            cancelled: Arc::new(AtomicBool::new(true)),
            ..BuildOptions::default()
        };
        let engine = Arc::new(MockFilterEngine::new());
        let set = build_variants(engine, &source, &run_dir, &options)
            .await
            .unwrap();

        // Baselines are produced before cancellation takes effect; no new
        // engine calls are issued.
        assert_eq!(set.labels(), vec!["original", "padded"]);
    }

    #[test]
    fn variant_set_rejects_duplicate_labels() {
        let mut set = VariantSet::new();
        set.push(AudioAsset::new("original", "/tmp/a.wav")).unwrap();
        let err = set
            .push(AudioAsset::new("original", "/tmp/b.wav"))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate variant label"));
    }
}
