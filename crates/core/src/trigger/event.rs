//! Object-created notification envelope.

use serde::{Deserialize, Serialize};

use super::error::TriggerError;

/// A batch of storage notifications, in the S3 event format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

/// One notification record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: String,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntity {
    /// URL-encoded key, as delivered.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl TriggerEvent {
    /// Parses a JSON notification body.
    pub fn from_json(body: &str) -> Result<Self, TriggerError> {
        serde_json::from_str(body).map_err(|e| TriggerError::Malformed(e.to_string()))
    }
}

impl EventRecord {
    /// Whether this record announces a newly created object.
    ///
    /// Accepts both `ObjectCreated:Put` and the `s3:`-prefixed form some
    /// S3-compatible stores send.
    pub fn is_object_created(&self) -> bool {
        let name = self
            .event_name
            .strip_prefix("s3:")
            .unwrap_or(&self.event_name);
        name.starts_with("ObjectCreated:")
    }

    /// The decoded object key.
    pub fn decoded_key(&self) -> Result<String, TriggerError> {
        decode_key(&self.s3.object.key)
    }
}

/// Decodes a notification key: `+` becomes a space, then percent-decoding.
///
/// Keys that decode to control characters are refused; their base name ends
/// up verbatim in playlist lines.
pub fn decode_key(raw: &str) -> Result<String, TriggerError> {
    let spaced = raw.replace('+', " ");
    let decoded = urlencoding::decode(&spaced).map_err(|e| TriggerError::InvalidKey {
        key: raw.to_string(),
        reason: e.to_string(),
    })?;
    if decoded.is_empty() {
        return Err(TriggerError::InvalidKey {
            key: raw.to_string(),
            reason: "empty key".to_string(),
        });
    }
    if decoded.chars().any(char::is_control) {
        return Err(TriggerError::InvalidKey {
            key: raw.to_string(),
            reason: "control character in key".to_string(),
        });
    }
    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Records": [
            {
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "us-east-1",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "bucket": { "name": "media", "arn": "arn:aws:s3:::media" },
                    "object": { "key": "courses/101/My+Lecture%281%29.mp4", "size": 1048576, "eTag": "abc" }
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_s3_notification() {
        let event = TriggerEvent::from_json(SAMPLE).unwrap();
        assert_eq!(event.records.len(), 1);
        let record = &event.records[0];
        assert!(record.is_object_created());
        assert_eq!(record.s3.bucket.name, "media");
        assert_eq!(record.s3.object.size, Some(1048576));
        assert_eq!(record.decoded_key().unwrap(), "courses/101/My Lecture(1).mp4");
    }

    #[test]
    fn test_decode_key() {
        assert_eq!(decode_key("lecture.mp4").unwrap(), "lecture.mp4");
        assert_eq!(decode_key("a+b.mp4").unwrap(), "a b.mp4");
        // A literal plus arrives encoded.
        assert_eq!(decode_key("a%2Bb.mp4").unwrap(), "a+b.mp4");
        assert_eq!(decode_key("caf%C3%A9.mp4").unwrap(), "café.mp4");
        assert!(decode_key("bad%FF.mp4").is_err());
        assert!(decode_key("").is_err());
    }

    #[test]
    fn test_decode_key_rejects_control_characters() {
        for raw in ["clip%0A.mp4", "clip%0D%0A.mp4", "tab%09name.mp4", "nul%00.mp4"] {
            let err = decode_key(raw).unwrap_err();
            assert!(err.to_string().contains("control character"), "{}", raw);
        }
        assert_eq!(decode_key("caf%C3%A9+%231.mp4").unwrap(), "café #1.mp4");
    }

    #[test]
    fn test_event_name_forms() {
        let mut event = TriggerEvent::from_json(SAMPLE).unwrap();
        let record = &mut event.records[0];

        record.event_name = "s3:ObjectCreated:CompleteMultipartUpload".to_string();
        assert!(record.is_object_created());

        record.event_name = "ObjectRemoved:Delete".to_string();
        assert!(!record.is_object_created());
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            TriggerEvent::from_json("{not json"),
            Err(TriggerError::Malformed(_))
        ));
        let empty = TriggerEvent::from_json("{}").unwrap();
        assert!(empty.records.is_empty());
    }
}
