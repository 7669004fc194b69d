//! Trigger module: object-created notifications in, one processing result per
//! eligible object out.

mod adapter;
mod error;
mod event;

pub use adapter::{BatchReport, SkipReason, SkippedRecord, TriggerAdapter};
pub use error::TriggerError;
pub use event::{decode_key, BucketEntity, EventRecord, ObjectEntity, S3Entity, TriggerEvent};
