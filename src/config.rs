use anyhow::{Context, Result};

/// Settings for the command pipeline handler. Read once at startup,
/// shared read-only across invocations.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub instance_id: String,
    pub from_email: String,
    pub to_email: String,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            instance_id: required("EC2_INSTANCE_ID")?,
            from_email: required("SES_FROM_EMAIL")?,
            to_email: required("SES_TO_EMAIL")?,
        })
    }
}

/// Settings for the upload-URL handler.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub bucket: String,
}

impl UploadConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bucket: required("S3_BUCKET_NAME")?,
        })
    }
}

/// Settings for the instance-status handler.
#[derive(Debug, Clone)]
pub struct StatusConfig {
    pub instance_id: String,
}

impl StatusConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            instance_id: required("EC2_INSTANCE_ID")?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing environment variable {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_reports_missing_key() {
        let err = required("EC2_CONTROL_UNSET_VAR_FOR_TEST").unwrap_err();
        assert!(err.to_string().contains("EC2_CONTROL_UNSET_VAR_FOR_TEST"));
    }

    #[test]
    fn required_reads_present_key() {
        std::env::set_var("EC2_CONTROL_SET_VAR_FOR_TEST", "i-0123");
        assert_eq!(required("EC2_CONTROL_SET_VAR_FOR_TEST").unwrap(), "i-0123");
    }
}
