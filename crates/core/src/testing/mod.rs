//! Testing utilities and mock implementations.
//!
//! Mocks for the two injected collaborators of the orchestrator, so runs can
//! be exercised end to end without ffmpeg or an object store.
//!
//! # Example
//!
//! ```rust,ignore
//! use hlsforge_core::testing::{MockEncoder, MockStorage};
//!
//! let encoder = Arc::new(MockEncoder::new());
//! let storage = Arc::new(MockStorage::new());
//! storage.insert("media", "courses/101/lecture.mp4", b"...".to_vec()).await;
//!
//! let orchestrator = TranscodeOrchestrator::new(encoder, storage, plan, config);
//! ```

mod mock_encoder;
mod mock_storage;

pub use mock_encoder::{MockEncoder, RecordedEncode};
pub use mock_storage::{InjectedFailure, MockStorage, RecordedPush};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::trigger::TriggerEvent;

    /// An S3 `ObjectCreated:Put` notification for one object.
    ///
    /// `key` is URL-encoded the way S3 sends it.
    pub fn object_created_event(bucket: &str, encoded_key: &str, size: u64) -> TriggerEvent {
        event_with_records(&[(bucket, encoded_key, size, "ObjectCreated:Put")])
    }

    /// A notification carrying several records of `(bucket, encoded_key, size, event_name)`.
    pub fn event_with_records(records: &[(&str, &str, u64, &str)]) -> TriggerEvent {
        let records: Vec<serde_json::Value> = records
            .iter()
            .map(|(bucket, key, size, event_name)| {
                serde_json::json!({
                    "eventVersion": "2.1",
                    "eventSource": "aws:s3",
                    "eventName": event_name,
                    "s3": {
                        "bucket": { "name": bucket },
                        "object": { "key": key, "size": size }
                    }
                })
            })
            .collect();

        serde_json::from_value(serde_json::json!({ "Records": records }))
            .unwrap_or_default()
    }
}
