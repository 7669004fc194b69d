//! Turns a notification batch into orchestration runs.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::metrics;
use crate::transcoder::{ProcessingResult, SourceReference, TranscodeOrchestrator};

use super::event::{EventRecord, TriggerEvent};

/// Why a record was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The key does not end in an accepted suffix.
    UnsupportedSuffix,
    /// The record is not an object-created notification.
    UnsupportedEvent,
    /// The key cannot be decoded or contains control characters.
    InvalidKey,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedSuffix => "unsupported_suffix",
            Self::UnsupportedEvent => "unsupported_event",
            Self::InvalidKey => "invalid_key",
        }
    }
}

/// A record that never reached the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub bucket: String,
    /// Decoded key when decoding succeeded, raw key otherwise.
    pub key: String,
    pub reason: SkipReason,
}

/// Outcome of one notification batch.
///
/// `results` has exactly one entry per processed record, in record order.
/// Skipped records appear only in `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<ProcessingResult>,
    pub skipped: Vec<SkippedRecord>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Filters notification records and runs the orchestrator for each eligible
/// one, sequentially.
pub struct TriggerAdapter {
    orchestrator: Arc<TranscodeOrchestrator>,
}

impl TriggerAdapter {
    pub fn new(orchestrator: Arc<TranscodeOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<TranscodeOrchestrator> {
        &self.orchestrator
    }

    /// Decides whether a record is eligible.
    pub fn classify(&self, record: &EventRecord) -> Result<SourceReference, SkippedRecord> {
        let bucket = record.s3.bucket.name.clone();
        let skip = |key: String, reason| SkippedRecord {
            bucket: bucket.clone(),
            key,
            reason,
        };

        let key = match record.decoded_key() {
            Ok(key) => key,
            Err(_) => return Err(skip(record.s3.object.key.clone(), SkipReason::InvalidKey)),
        };
        if !record.is_object_created() {
            return Err(skip(key, SkipReason::UnsupportedEvent));
        }
        if !self.orchestrator.config().accepts(&key) {
            return Err(skip(key, SkipReason::UnsupportedSuffix));
        }

        let mut source = SourceReference::new(bucket.clone(), key);
        source.size = record.s3.object.size;
        Ok(source)
    }

    /// Processes every eligible record in order. One failure never stops the
    /// rest of the batch.
    pub async fn handle(&self, event: &TriggerEvent) -> BatchReport {
        let mut report = BatchReport::default();

        for record in &event.records {
            match self.classify(record) {
                Ok(source) => {
                    let result = self.orchestrator.process(&source).await;
                    report.results.push(result);
                }
                Err(skipped) => {
                    debug!(
                        bucket = %skipped.bucket,
                        key = %skipped.key,
                        reason = skipped.reason.as_str(),
                        "Skipping notification record"
                    );
                    metrics::RECORDS_SKIPPED
                        .with_label_values(&[skipped.reason.as_str()])
                        .inc();
                    report.skipped.push(skipped);
                }
            }
        }

        info!(
            records = event.records.len(),
            processed = report.results.len(),
            failed = report.failed_count(),
            skipped = report.skipped.len(),
            "Notification batch handled"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::RenditionPlan;
    use crate::testing::fixtures::event_with_records;
    use crate::testing::{MockEncoder, MockStorage};
    use crate::transcoder::TranscodeConfig;

    fn adapter() -> TriggerAdapter {
        let orchestrator = TranscodeOrchestrator::new(
            Arc::new(MockEncoder::new()),
            Arc::new(MockStorage::new()),
            Arc::new(RenditionPlan::standard()),
            TranscodeConfig::default(),
        );
        TriggerAdapter::new(Arc::new(orchestrator))
    }

    #[test]
    fn test_classify() {
        let adapter = adapter();
        let event = event_with_records(&[
            ("media", "courses/101/My+Talk.MP4", 42, "ObjectCreated:Put"),
            ("media", "thumbnail.png", 1, "ObjectCreated:Put"),
            ("media", "old.mp4", 1, "ObjectRemoved:Delete"),
            ("media", "bad%FF.mp4", 1, "ObjectCreated:Put"),
        ]);

        let source = adapter.classify(&event.records[0]).unwrap();
        assert_eq!(source.key, "courses/101/My Talk.MP4");
        assert_eq!(source.size, Some(42));

        let reasons: Vec<_> = event.records[1..]
            .iter()
            .map(|r| adapter.classify(r).unwrap_err().reason)
            .collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::UnsupportedSuffix,
                SkipReason::UnsupportedEvent,
                SkipReason::InvalidKey
            ]
        );
    }

    #[tokio::test]
    async fn test_all_skipped_batch_runs_nothing() {
        let adapter = adapter();
        let event = event_with_records(&[("media", "thumbnail.png", 1, "ObjectCreated:Put")]);

        let report = adapter.handle(&event).await;
        assert!(report.results.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason.as_str(), "unsupported_suffix");
        assert!(report.all_succeeded());
    }

    #[tokio::test]
    async fn test_key_with_newline_is_skipped() {
        let adapter = adapter();
        let event = event_with_records(&[(
            "media",
            "courses/clip%0A#EXT-X-ENDLIST.mp4",
            1,
            "ObjectCreated:Put",
        )]);

        let skipped = adapter.classify(&event.records[0]).unwrap_err();
        assert_eq!(skipped.reason, SkipReason::InvalidKey);
        assert_eq!(skipped.key, "courses/clip%0A#EXT-X-ENDLIST.mp4");

        let report = adapter.handle(&event).await;
        assert!(report.results.is_empty());
        assert_eq!(report.skipped[0].reason.as_str(), "invalid_key");
    }
}
