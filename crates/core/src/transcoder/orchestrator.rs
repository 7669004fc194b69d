//! The transcode orchestrator: one source in, one published HLS set out.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::codec::{file_name_of, Encoder, RenditionArtifact};
use crate::ladder::RenditionPlan;
use crate::manifest::{ManifestBuilder, MasterManifest};
use crate::metrics;
use crate::storage::{join_key, ObjectMetadata, ObjectStorage};

use super::config::TranscodeConfig;
use super::error::TranscodeError;
use super::types::{ProcessingResult, RunProgress, RunStage, SourceReference};
use super::workspace::ScratchWorkspace;

/// One local file and the key it is published under.
#[derive(Debug, Clone)]
struct UploadItem {
    path: PathBuf,
    key: String,
    metadata: ObjectMetadata,
}

/// What a successful run body hands back.
struct Published {
    uploaded_keys: Vec<String>,
    master_key: String,
}

/// Drives fetch, encode, manifest, push and cleanup for a source.
///
/// Collaborators are injected; the orchestrator holds no global state and
/// can be shared behind an `Arc` by any number of callers.
pub struct TranscodeOrchestrator {
    encoder: Arc<dyn Encoder>,
    storage: Arc<dyn ObjectStorage>,
    plan: Arc<RenditionPlan>,
    manifest: ManifestBuilder,
    config: TranscodeConfig,
    run_slots: Arc<Semaphore>,
}

impl TranscodeOrchestrator {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        storage: Arc<dyn ObjectStorage>,
        plan: Arc<RenditionPlan>,
        config: TranscodeConfig,
    ) -> Self {
        let run_slots = Arc::new(Semaphore::new(config.max_concurrent_runs.max(1)));
        Self {
            encoder,
            storage,
            plan,
            manifest: ManifestBuilder::new(),
            config,
            run_slots,
        }
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    pub fn plan(&self) -> &RenditionPlan {
        &self.plan
    }

    pub fn storage(&self) -> &Arc<dyn ObjectStorage> {
        &self.storage
    }

    pub fn encoder(&self) -> &Arc<dyn Encoder> {
        &self.encoder
    }

    /// Processes one source. Never fails; the outcome is in the result.
    pub async fn process(&self, source: &SourceReference) -> ProcessingResult {
        self.run(source, None).await
    }

    /// Like [`process`](Self::process), reporting every stage transition.
    pub async fn process_with_progress(
        &self,
        source: &SourceReference,
        progress_tx: mpsc::Sender<RunProgress>,
    ) -> ProcessingResult {
        self.run(source, Some(progress_tx)).await
    }

    async fn run(
        &self,
        source: &SourceReference,
        progress_tx: Option<mpsc::Sender<RunProgress>>,
    ) -> ProcessingResult {
        let run_id = Uuid::new_v4().simple().to_string();
        let short_id = &run_id[..8];
        let span = info_span!(
            "transcode",
            bucket = %source.bucket,
            key = %source.key,
            run_id = %short_id
        );
        self.run_inner(source, progress_tx.as_ref())
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        source: &SourceReference,
        progress_tx: Option<&mpsc::Sender<RunProgress>>,
    ) -> ProcessingResult {
        // The semaphore is never closed, so acquire cannot fail.
        let _permit = self.run_slots.acquire().await.ok();
        let start = Instant::now();
        info!("Starting transcode run");

        let workspace = match ScratchWorkspace::create(
            &self.config.scratch_dir,
            source.base_name(),
            source.extension(),
        )
        .await
        {
            Ok(workspace) => workspace,
            Err(e) => {
                let result = self.finish(source, Err(e), None, start);
                notify(progress_tx, RunProgress::Done { success: false }).await;
                return result;
            }
        };

        let mut stage = RunStage::Fetching;
        let timed = tokio::time::timeout(
            self.config.run_timeout(),
            self.execute(source, &workspace, &mut stage, progress_tx),
        )
        .await;
        let outcome = match timed {
            Ok(outcome) => outcome,
            Err(_) => Err(TranscodeError::DeadlineExceeded {
                timeout_secs: self.config.run_timeout_secs,
                stage,
            }),
        };

        notify(progress_tx, RunProgress::CleaningUp).await;
        let cleanup_warning = match workspace.release().await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Failed to remove scratch workspace");
                metrics::CLEANUP_WARNINGS.inc();
                Some(e.to_string())
            }
        };

        let result = self.finish(source, outcome, cleanup_warning, start);
        notify(
            progress_tx,
            RunProgress::Done {
                success: result.success,
            },
        )
        .await;
        result
    }

    fn finish(
        &self,
        source: &SourceReference,
        outcome: Result<Published, TranscodeError>,
        cleanup_warning: Option<String>,
        start: Instant,
    ) -> ProcessingResult {
        let elapsed = start.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;

        let result = match outcome {
            Ok(published) => {
                let manifest_url = self
                    .storage
                    .object_url(&source.bucket, &published.master_key);
                info!(
                    elapsed_ms,
                    objects = published.uploaded_keys.len(),
                    manifest_url = %manifest_url,
                    "Transcode run succeeded"
                );
                metrics::RUNS_TOTAL.with_label_values(&["success"]).inc();
                metrics::RUN_DURATION
                    .with_label_values(&["success"])
                    .observe(elapsed.as_secs_f64());
                ProcessingResult::succeeded(
                    source,
                    published.uploaded_keys,
                    manifest_url,
                    elapsed_ms,
                )
            }
            Err(e) => {
                error!(
                    elapsed_ms,
                    stage = %e.stage(),
                    kind = e.kind(),
                    error = %e,
                    "Transcode run failed"
                );
                metrics::RUNS_TOTAL.with_label_values(&[e.kind()]).inc();
                metrics::RUN_DURATION
                    .with_label_values(&["failed"])
                    .observe(elapsed.as_secs_f64());
                ProcessingResult::failed(source, e.report(), e.stage(), elapsed_ms)
            }
        };

        result.with_cleanup_warning(cleanup_warning)
    }

    /// Everything between workspace creation and cleanup.
    ///
    /// `stage` is kept current so a deadline can report where it hit.
    async fn execute(
        &self,
        source: &SourceReference,
        workspace: &ScratchWorkspace,
        stage: &mut RunStage,
        progress_tx: Option<&mpsc::Sender<RunProgress>>,
    ) -> Result<Published, TranscodeError> {
        // Fetching
        *stage = RunStage::Fetching;
        notify(
            progress_tx,
            RunProgress::Fetching {
                key: source.key.clone(),
            },
        )
        .await;

        if let (Some(size), Some(limit)) = (source.size, self.config.max_source_bytes) {
            if size > limit {
                return Err(TranscodeError::SourceTooLarge { size, limit });
            }
        }

        let fetched = self
            .storage
            .fetch(&source.bucket, &source.key, workspace.input_path())
            .await
            .map_err(TranscodeError::Fetch)?;
        debug!(bytes = fetched, "Fetched source");

        // Encoding, one tier at a time in ladder order
        let base_name = source.base_name();
        let total = self.plan.len();
        let mut artifacts = Vec::with_capacity(total);

        for (idx, rendition) in self.plan.tiers().iter().enumerate() {
            *stage = RunStage::Encoding;
            notify(
                progress_tx,
                RunProgress::Encoding {
                    index: idx + 1,
                    total,
                    tier: rendition.name.clone(),
                },
            )
            .await;

            let tier_start = Instant::now();
            let produced = self
                .encoder
                .produce(
                    workspace.input_path(),
                    workspace.output_dir(),
                    base_name,
                    rendition,
                )
                .await;
            metrics::RENDITION_DURATION
                .with_label_values(&[rendition.name.as_str()])
                .observe(tier_start.elapsed().as_secs_f64());

            match produced {
                Ok(artifact) => {
                    metrics::RENDITIONS_TOTAL
                        .with_label_values(&[rendition.name.as_str(), "success"])
                        .inc();
                    debug!(
                        tier = %rendition.name,
                        segments = artifact.segments.len(),
                        duration_ms = artifact.duration_ms,
                        "Tier encoded"
                    );
                    artifacts.push(artifact);
                }
                Err(e) => {
                    metrics::RENDITIONS_TOTAL
                        .with_label_values(&[rendition.name.as_str(), "failed"])
                        .inc();
                    if let Some(diagnostics) = e.diagnostics() {
                        debug!(tier = %rendition.name, stderr = %diagnostics, "Encoder diagnostics");
                    }
                    return Err(e.into());
                }
            }
        }

        // Manifesting
        *stage = RunStage::Manifesting;
        notify(progress_tx, RunProgress::Manifesting).await;
        let master = self
            .manifest
            .build(base_name, &artifacts, workspace.output_dir())
            .await?;

        // Pushing
        *stage = RunStage::Pushing;
        let (uploads, master_key) = self.upload_plan(source, &master, &artifacts);
        if let Some(collision) = uploads.iter().find(|item| item.key == source.key) {
            return Err(TranscodeError::SourceOverwrite {
                key: collision.key.clone(),
            });
        }

        let uploaded_keys = self.push_all(source, &uploads, progress_tx).await?;

        Ok(Published {
            uploaded_keys,
            master_key,
        })
    }

    /// Every output file with its key, in upload order.
    fn upload_plan(
        &self,
        source: &SourceReference,
        master: &MasterManifest,
        artifacts: &[RenditionArtifact],
    ) -> (Vec<UploadItem>, String) {
        let dir = source.directory();
        let master_item = UploadItem {
            path: master.path.clone(),
            key: join_key(dir, &file_name_of(&master.path)),
            metadata: ObjectMetadata::playlist(),
        };
        let master_key = master_item.key.clone();

        let playlists = artifacts.iter().map(|a| UploadItem {
            path: a.playlist_path.clone(),
            key: join_key(dir, &a.playlist_file_name()),
            metadata: ObjectMetadata::playlist(),
        });
        let segments = artifacts.iter().flat_map(|a| {
            a.segments.iter().map(|segment| UploadItem {
                path: segment.clone(),
                key: join_key(dir, &file_name_of(segment)),
                metadata: ObjectMetadata::segment(),
            })
        });

        let mut items = Vec::new();
        if !self.config.master_manifest_last {
            items.push(master_item.clone());
        }
        items.extend(playlists);
        items.extend(segments);
        if self.config.master_manifest_last {
            items.push(master_item);
        }

        (items, master_key)
    }

    /// Uploads sequentially, stopping at the first failure.
    async fn push_all(
        &self,
        source: &SourceReference,
        uploads: &[UploadItem],
        progress_tx: Option<&mpsc::Sender<RunProgress>>,
    ) -> Result<Vec<String>, TranscodeError> {
        let total = uploads.len();
        let mut uploaded = Vec::with_capacity(total);
        notify(progress_tx, RunProgress::Pushing { uploaded: 0, total }).await;

        for item in uploads {
            match self
                .storage
                .push(&item.path, &source.bucket, &item.key, &item.metadata)
                .await
            {
                Ok(receipt) => {
                    metrics::OBJECTS_UPLOADED.inc();
                    metrics::BYTES_UPLOADED.inc_by(receipt.size_bytes);
                    uploaded.push(item.key.clone());
                    notify(
                        progress_tx,
                        RunProgress::Pushing {
                            uploaded: uploaded.len(),
                            total,
                        },
                    )
                    .await;
                }
                Err(source_err) => {
                    if !uploaded.is_empty() {
                        // Already-published objects stay; without a complete
                        // set behind the master playlist they are unreachable.
                        warn!(
                            orphaned = uploaded.len(),
                            failed_key = %item.key,
                            "Upload aborted after partial publish"
                        );
                    }
                    return Err(TranscodeError::Push {
                        key: item.key.clone(),
                        source: source_err,
                    });
                }
            }
        }

        Ok(uploaded)
    }
}

async fn notify(progress_tx: Option<&mpsc::Sender<RunProgress>>, progress: RunProgress) {
    if let Some(tx) = progress_tx {
        let _ = tx.send(progress).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockEncoder, MockStorage};
    use tempfile::TempDir;

    fn orchestrator(
        temp: &TempDir,
        encoder: MockEncoder,
        storage: Arc<MockStorage>,
        config: TranscodeConfig,
    ) -> TranscodeOrchestrator {
        let config = TranscodeConfig {
            scratch_dir: temp.path().join("scratch"),
            ..config
        };
        TranscodeOrchestrator::new(
            Arc::new(encoder),
            storage,
            Arc::new(RenditionPlan::standard()),
            config,
        )
    }

    #[tokio::test]
    async fn test_upload_order_master_first() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(MockStorage::new());
        storage.insert("media", "courses/101/lecture.mp4", b"source".to_vec()).await;
        let orch = orchestrator(
            &temp,
            MockEncoder::new(),
            storage.clone(),
            TranscodeConfig::default(),
        );

        let result = orch
            .process(&SourceReference::new("media", "courses/101/lecture.mp4"))
            .await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.uploaded_keys[0], "courses/101/lecture.m3u8");
        assert_eq!(result.uploaded_keys[1], "courses/101/lecture_480p.m3u8");
        assert_eq!(result.uploaded_keys[2], "courses/101/lecture_720p.m3u8");
        assert_eq!(result.uploaded_keys[3], "courses/101/lecture_1080p.m3u8");
        assert!(result.uploaded_keys[4..].iter().all(|k| k.ends_with(".ts")));
        assert_eq!(
            result.manifest_url.as_deref(),
            Some("mock://media/courses/101/lecture.m3u8")
        );
    }

    #[tokio::test]
    async fn test_upload_order_master_last() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(MockStorage::new());
        storage.insert("media", "lecture.mp4", b"source".to_vec()).await;
        let config = TranscodeConfig {
            master_manifest_last: true,
            ..Default::default()
        };
        let orch = orchestrator(&temp, MockEncoder::new(), storage.clone(), config);

        let result = orch
            .process(&SourceReference::new("media", "lecture.mp4"))
            .await;

        assert!(result.success);
        assert_eq!(result.uploaded_keys.first().unwrap(), "lecture_480p.m3u8");
        assert_eq!(result.uploaded_keys.last().unwrap(), "lecture.m3u8");
    }

    #[tokio::test]
    async fn test_source_too_large_skips_fetch() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(MockStorage::new());
        storage.insert("media", "big.mp4", b"source".to_vec()).await;
        let config = TranscodeConfig {
            max_source_bytes: Some(100),
            ..Default::default()
        };
        let orch = orchestrator(&temp, MockEncoder::new(), storage.clone(), config);

        let result = orch
            .process(&SourceReference::new("media", "big.mp4").with_size(101))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_kind(), Some("fetch_failure"));
        assert_eq!(storage.fetch_count().await, 0);
    }

    #[tokio::test]
    async fn test_source_key_collision_is_refused() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(MockStorage::new());
        // A source whose own key looks like the master playlist it would produce.
        storage.insert("media", "clip.m3u8.m3u8", b"source".to_vec()).await;
        let config = TranscodeConfig {
            accepted_suffixes: vec![".m3u8".to_string()],
            ..Default::default()
        };
        let orch = orchestrator(&temp, MockEncoder::new(), storage.clone(), config);

        let result = orch
            .process(&SourceReference::new("media", "clip.m3u8.m3u8"))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_kind(), Some("push_failure"));
        assert!(storage.pushed_keys().await.is_empty());
        assert_eq!(
            storage.get("media", "clip.m3u8.m3u8").await.as_deref(),
            Some(&b"source"[..])
        );
    }

    #[tokio::test]
    async fn test_deadline_exceeded_still_cleans_up() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(MockStorage::new());
        storage.insert("media", "slow.mp4", b"source".to_vec()).await;
        let config = TranscodeConfig {
            run_timeout_secs: 1,
            ..Default::default()
        };
        let encoder = MockEncoder::new().with_delay(std::time::Duration::from_secs(5));
        let orch = orchestrator(&temp, encoder, storage.clone(), config);

        let result = orch
            .process(&SourceReference::new("media", "slow.mp4"))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_kind(), Some("deadline_exceeded"));
        assert_eq!(result.failed_stage, Some(RunStage::Encoding));
        assert!(storage.pushed_keys().await.is_empty());
        let leftovers = std::fs::read_dir(temp.path().join("scratch")).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
