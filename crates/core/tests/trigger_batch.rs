//! Notification batch integration tests.
//!
//! These tests feed object-created notifications through the trigger
//! adapter and check:
//! - Key decoding and suffix filtering
//! - Mixed batches (skips, successes, failures) in record order
//! - A failing record never stopping the rest of the batch
//! - End-to-end publishing into a filesystem-backed bucket

use std::sync::Arc;

use tempfile::TempDir;

use hlsforge_core::{
    testing::{
        fixtures::{event_with_records, object_created_event},
        MockEncoder, MockStorage,
    },
    LocalStorage, ObjectStorage, RenditionPlan, SkipReason, TranscodeConfig,
    TranscodeOrchestrator, TriggerAdapter, TriggerEvent,
};

const BUCKET: &str = "media";

struct BatchHarness {
    adapter: TriggerAdapter,
    encoder: Arc<MockEncoder>,
    storage: Arc<MockStorage>,
    _temp_dir: TempDir,
}

impl BatchHarness {
    async fn new(encoder: MockEncoder) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = TranscodeConfig::with_scratch_dir(temp_dir.path().join("scratch"));

        let encoder = Arc::new(encoder);
        let storage = Arc::new(MockStorage::new());
        let orchestrator = Arc::new(TranscodeOrchestrator::new(
            encoder.clone(),
            storage.clone(),
            Arc::new(RenditionPlan::standard()),
            config,
        ));

        Self {
            adapter: TriggerAdapter::new(orchestrator),
            encoder,
            storage,
            _temp_dir: temp_dir,
        }
    }
}

#[tokio::test]
async fn test_url_encoded_key_is_decoded_before_processing() {
    let harness = BatchHarness::new(MockEncoder::new()).await;
    harness
        .storage
        .insert(BUCKET, "talks/Week 1/intro (final).mp4", b"v".to_vec())
        .await;

    let event = object_created_event(BUCKET, "talks/Week+1/intro+%28final%29.mp4", 1);
    let report = harness.adapter.handle(&event).await;

    assert!(report.skipped.is_empty());
    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.source_key, "talks/Week 1/intro (final).mp4");
    assert!(harness
        .storage
        .pushed_keys()
        .await
        .contains(&"talks/Week 1/intro (final).m3u8".to_string()));
}

#[tokio::test]
async fn test_mixed_batch_reports_in_record_order() {
    let harness = BatchHarness::new(MockEncoder::new()).await;
    harness.storage.insert(BUCKET, "a/one.mp4", b"1".to_vec()).await;
    harness.storage.insert(BUCKET, "b/two.MP4", b"2".to_vec()).await;

    let event = event_with_records(&[
        (BUCKET, "a/one.mp4", 1, "ObjectCreated:Put"),
        (BUCKET, "a/notes.txt", 1, "ObjectCreated:Put"),
        (BUCKET, "a/old.mp4", 1, "ObjectRemoved:Delete"),
        (BUCKET, "b/two.MP4", 1, "s3:ObjectCreated:CompleteMultipartUpload"),
        (BUCKET, "bad%FF%FEkey.mp4", 1, "ObjectCreated:Put"),
        (BUCKET, "c/absent.mp4", 1, "ObjectCreated:Put"),
    ]);
    let report = harness.adapter.handle(&event).await;

    let processed: Vec<_> = report
        .results
        .iter()
        .map(|r| (r.source_key.as_str(), r.success))
        .collect();
    assert_eq!(
        processed,
        vec![
            ("a/one.mp4", true),
            ("b/two.MP4", true),
            ("c/absent.mp4", false),
        ]
    );
    assert_eq!(report.failed_count(), 1);
    assert!(!report.all_succeeded());
    assert_eq!(report.results[2].error_kind(), Some("fetch_failure"));

    let skipped: Vec<_> = report.skipped.iter().map(|s| s.reason).collect();
    assert_eq!(
        skipped,
        vec![
            SkipReason::UnsupportedSuffix,
            SkipReason::UnsupportedEvent,
            SkipReason::InvalidKey,
        ]
    );
}

#[tokio::test]
async fn test_failing_record_does_not_stop_batch() {
    let harness = BatchHarness::new(MockEncoder::new().fail_on_tier("1080p")).await;
    harness.storage.insert(BUCKET, "x/first.mp4", b"1".to_vec()).await;
    harness.storage.insert(BUCKET, "x/second.mp4", b"2".to_vec()).await;

    let event = event_with_records(&[
        (BUCKET, "x/first.mp4", 1, "ObjectCreated:Put"),
        (BUCKET, "x/second.mp4", 1, "ObjectCreated:Put"),
    ]);
    let report = harness.adapter.handle(&event).await;

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.failed_count(), 2);
    // Both records reached the encoder.
    assert_eq!(harness.encoder.call_count().await, 6);
    assert!(harness.storage.pushed_keys().await.is_empty());
}

#[tokio::test]
async fn test_empty_notification_is_a_no_op() {
    let harness = BatchHarness::new(MockEncoder::new()).await;

    let event = TriggerEvent::from_json(r#"{"Records": []}"#).unwrap();
    let report = harness.adapter.handle(&event).await;

    assert!(report.results.is_empty());
    assert!(report.skipped.is_empty());
    assert!(report.all_succeeded());
    assert_eq!(harness.encoder.call_count().await, 0);
}

#[tokio::test]
async fn test_local_bucket_end_to_end() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let local = Arc::new(LocalStorage::with_root(temp.path().join("buckets")));

    let source_path = local.object_path(BUCKET, "courses/101/lecture.mp4").unwrap();
    std::fs::create_dir_all(source_path.parent().unwrap()).unwrap();
    std::fs::write(&source_path, b"lecture source").unwrap();

    let orchestrator = Arc::new(TranscodeOrchestrator::new(
        Arc::new(MockEncoder::new()),
        local.clone(),
        Arc::new(RenditionPlan::standard()),
        TranscodeConfig::with_scratch_dir(temp.path().join("scratch")),
    ));
    let adapter = TriggerAdapter::new(orchestrator);

    let report = adapter
        .handle(&object_created_event(BUCKET, "courses/101/lecture.mp4", 14))
        .await;
    assert!(report.all_succeeded());

    let listed: Vec<String> = local
        .list(BUCKET, "courses/101/")
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.key)
        .collect();
    // source + 4 playlists + 9 segments
    assert_eq!(listed.len(), 14);
    assert!(listed.contains(&"courses/101/lecture.m3u8".to_string()));
    assert!(listed.contains(&"courses/101/lecture_480p_000.ts".to_string()));

    assert_eq!(std::fs::read(&source_path).unwrap(), b"lecture source");
    let master =
        std::fs::read_to_string(local.object_path(BUCKET, "courses/101/lecture.m3u8").unwrap())
            .unwrap();
    assert!(master.starts_with("#EXTM3U"));
    assert!(master.contains("lecture_1080p.m3u8"));

    let scratch_left = std::fs::read_dir(temp.path().join("scratch"))
        .map(|d| d.count())
        .unwrap_or(0);
    assert_eq!(scratch_left, 0);
}
