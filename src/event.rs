use aws_lambda_events::event::s3::S3Event;
use thiserror::Error;

/// The object a creation notification points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("event contains no records")]
    NoRecords,
    #[error("record is missing the bucket name")]
    MissingBucket,
    #[error("record is missing the object key")]
    MissingKey,
}

impl ObjectRef {
    /// Pulls bucket and key out of the first record of an S3 creation
    /// event. A malformed envelope is the one fatal failure of the
    /// pipeline: there is no key to safely act on.
    pub fn from_event(event: &S3Event) -> Result<Self, EnvelopeError> {
        let record = event.records.first().ok_or(EnvelopeError::NoRecords)?;
        let bucket = record
            .s3
            .bucket
            .name
            .clone()
            .ok_or(EnvelopeError::MissingBucket)?;
        let key = record
            .s3
            .object
            .key
            .clone()
            .ok_or(EnvelopeError::MissingKey)?;
        Ok(Self { bucket, key })
    }
}
