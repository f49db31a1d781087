use std::sync::Arc;
use std::time::Duration;

use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use http::{HeaderMap, HeaderValue};
use serde_json::json;
use tracing::{error, warn};

use crate::config::UploadConfig;
use crate::store::ObjectStore;

pub const ALLOWED_CONTENT_TYPE: &str = "application/json";
pub const URL_EXPIRY: Duration = Duration::from_secs(60);

/// Issues short-lived presigned PUT URLs for command files. The key is
/// the caller's filename unchanged; content type and expiry are fixed.
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    config: UploadConfig,
}

impl UploadService {
    pub fn new(store: Arc<dyn ObjectStore>, config: UploadConfig) -> Self {
        Self { store, config }
    }

    pub async fn handle(&self, request: &ApiGatewayProxyRequest) -> ApiGatewayProxyResponse {
        let key = match validate_request(request.body.as_deref()) {
            Ok(key) => key,
            Err(msg) => {
                warn!(error = %msg, "rejecting upload request");
                return json_response(400, json!({ "error": msg }), false);
            }
        };

        match self
            .store
            .presign_put(&self.config.bucket, &key, ALLOWED_CONTENT_TYPE, URL_EXPIRY)
            .await
        {
            Ok(url) => json_response(200, json!({ "uploadURL": url, "s3Key": key }), true),
            Err(e) => {
                // The cause stays in the log; the caller gets a fixed body.
                error!(key = %key, error = %e, "could not generate upload URL");
                json_response(500, json!({ "error": "Could not generate upload URL" }), false)
            }
        }
    }
}

/// Checks the request body and returns the object key to presign for.
fn validate_request(body: Option<&str>) -> Result<String, String> {
    let data: serde_json::Value = serde_json::from_str(body.unwrap_or("{}"))
        .map_err(|e| format!("Invalid request body: {e}"))?;
    let filename = data
        .get("filename")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "Missing 'filename' in request body".to_string())?;
    if !filename.ends_with(".json") {
        return Err("File must be a .json file".to_string());
    }
    Ok(filename.to_string())
}

fn json_response(status: i64, body: serde_json::Value, cors: bool) -> ApiGatewayProxyResponse {
    let mut headers = HeaderMap::new();
    if cors {
        headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
        headers.insert(
            "Access-Control-Allow-Headers",
            HeaderValue::from_static("Content-Type"),
        );
    }
    ApiGatewayProxyResponse {
        status_code: status,
        headers,
        multi_value_headers: HeaderMap::new(),
        body: Some(Body::Text(body.to_string())),
        is_base64_encoded: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockObjectStore;
    use anyhow::anyhow;
    use mockall::predicate::eq;

    fn request(body: Option<&str>) -> ApiGatewayProxyRequest {
        ApiGatewayProxyRequest {
            body: body.map(String::from),
            ..Default::default()
        }
    }

    fn body_json(resp: &ApiGatewayProxyResponse) -> serde_json::Value {
        match resp.body.as_ref().unwrap() {
            Body::Text(text) => serde_json::from_str(text).unwrap(),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    fn service(store: MockObjectStore) -> UploadService {
        UploadService::new(
            Arc::new(store),
            UploadConfig {
                bucket: "uploads".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn issues_url_for_json_filename() {
        let mut store = MockObjectStore::new();
        store
            .expect_presign_put()
            .with(
                eq("uploads"),
                eq("a.json"),
                eq(ALLOWED_CONTENT_TYPE),
                eq(URL_EXPIRY),
            )
            .times(1)
            .returning(|_, _, _, _| Ok("https://uploads.s3.amazonaws.com/a.json?sig".to_string()));

        let resp = service(store)
            .handle(&request(Some(r#"{"filename":"a.json"}"#)))
            .await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(
            resp.headers.get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
        let body = body_json(&resp);
        assert_eq!(body["s3Key"], "a.json");
        assert!(!body["uploadURL"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_json_filename_without_presigning() {
        // No presign expectation set: the store must not be contacted.
        let resp = service(MockObjectStore::new())
            .handle(&request(Some(r#"{"filename":"a.txt"}"#)))
            .await;
        assert_eq!(resp.status_code, 400);
        assert!(body_json(&resp)["error"]
            .as_str()
            .unwrap()
            .contains(".json"));
    }

    #[tokio::test]
    async fn rejects_missing_filename() {
        let resp = service(MockObjectStore::new())
            .handle(&request(Some(r#"{"other":"x"}"#)))
            .await;
        assert_eq!(resp.status_code, 400);
        assert!(body_json(&resp)["error"]
            .as_str()
            .unwrap()
            .contains("filename"));
    }

    #[tokio::test]
    async fn rejects_absent_body() {
        let resp = service(MockObjectStore::new()).handle(&request(None)).await;
        assert_eq!(resp.status_code, 400);
    }

    #[tokio::test]
    async fn presign_failure_yields_generic_server_error() {
        let mut store = MockObjectStore::new();
        store
            .expect_presign_put()
            .times(1)
            .returning(|_, _, _, _| Err(anyhow!("credentials expired")));

        let resp = service(store)
            .handle(&request(Some(r#"{"filename":"a.json"}"#)))
            .await;
        assert_eq!(resp.status_code, 500);
        let body = body_json(&resp);
        assert_eq!(body["error"], "Could not generate upload URL");
        assert!(!body["error"].as_str().unwrap().contains("credentials"));
    }
}
