use crate::error::ApiError;
use crate::model::ComplianceResult;
use crate::request::ComplianceRequest;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::time::Duration;

/// Path of the scoring endpoint, relative to the server URL.
pub const CHECK_PATH: &str = "/api/v1/compliance/check";

/// Request timeout for a compliance check.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for the remote compliance scoring API.
///
/// Performs exactly one attempt per [`check`](ComplianceClient::check).
/// Checks are not safe to replay blindly, so retrying is left to the caller.
pub struct ComplianceClient {
    client: reqwest::Client,
    server_url: String,
    api_key: String,
    timeout: Duration,
}

impl ComplianceClient {
    pub fn new(server_url: &str, api_key: &str) -> Result<Self, ApiError> {
        Self::with_timeout(server_url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        server_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let server_url = server_url.trim().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("cerberus-ci/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Unreachable {
                url: server_url.clone(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            server_url,
            api_key: api_key.to_string(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.server_url, CHECK_PATH)
    }

    /// Send one compliance check and parse the response.
    pub async fn check(&self, request: &ComplianceRequest) -> Result<ComplianceResult, ApiError> {
        request.validate()?;

        let url = self.endpoint();
        tracing::info!(
            url = %url,
            frameworks = %request.frameworks.join(","),
            mode = %request.mode,
            files = request.context.changes.len(),
            "sending compliance check"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.unreachable(&url, e))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "compliance server responded");

        let body = response
            .text()
            .await
            .map_err(|e| self.unreachable(&url, e))?;

        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: server_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
            });
        }

        parse_result(&body)
    }

    fn unreachable(&self, url: &str, error: reqwest::Error) -> ApiError {
        let reason = if error.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs())
        } else {
            error.to_string()
        };
        ApiError::Unreachable {
            url: url.to_string(),
            reason,
        }
    }
}

/// Parse a 2xx body. Missing fields default; a body that is not a JSON
/// object is an error.
pub fn parse_result(body: &str) -> Result<ComplianceResult, ApiError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
    if !value.is_object() {
        return Err(ApiError::InvalidResponse(
            "expected a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Message to surface from an error body: a JSON `message`/`error` field
/// when present, otherwise the raw text.
fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let candidates = [
            &json["message"],
            &json["error"]["message"],
            &json["error"],
            &json["detail"],
        ];
        for candidate in candidates {
            if let Some(text) = candidate.as_str() {
                return Some(text.to_string());
            }
        }
    }

    Some(trimmed.to_string())
}

/// One-shot convenience wrapper: build a client and perform a single check.
pub async fn check(
    server_url: &str,
    api_key: &str,
    request: &ComplianceRequest,
) -> Result<ComplianceResult, ApiError> {
    ComplianceClient::new(server_url, api_key)?
        .check(request)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let client = ComplianceClient::new("https://api.cerberus-ai.com/", "k").unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.cerberus-ai.com/api/v1/compliance/check"
        );
    }

    #[test]
    fn test_server_message_extraction() {
        assert_eq!(
            server_message(r#"{"message":"Invalid API key"}"#).as_deref(),
            Some("Invalid API key")
        );
        assert_eq!(
            server_message(r#"{"error":{"message":"quota exceeded"}}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(
            server_message(r#"{"error":"forbidden"}"#).as_deref(),
            Some("forbidden")
        );
        assert_eq!(
            server_message("502 Bad Gateway\n").as_deref(),
            Some("502 Bad Gateway")
        );
        assert_eq!(server_message("   "), None);
    }

    #[test]
    fn test_parse_result_defaults_missing_fields() {
        let result = parse_result(r#"{"violations":[{"ruleId":"E8-1","severity":"High"}]}"#).unwrap();
        assert_eq!(result.compliance_score, 0.0);
        assert!(result.frameworks_checked.is_empty());
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn test_parse_result_accepts_null_fields() {
        let result =
            parse_result(r#"{"complianceScore":null,"frameworksChecked":null,"violations":[]}"#)
                .unwrap();
        assert_eq!(result.compliance_score, 0.0);
        assert!(result.frameworks_checked.is_empty());

        let result = parse_result(r#"{"violations":[{"ruleId":"X","severity":null}]}"#).unwrap();
        assert_eq!(result.violations[0].severity.icon(), "⚪");
        assert_eq!(result.violations[0].severity.ordinal(), -1);

        let result = parse_result(r#"{"violations":null,"reportUrl":null}"#).unwrap();
        assert!(result.violations.is_empty());
        assert!(result.report_url.is_none());
    }

    #[test]
    fn test_parse_result_rejects_non_objects() {
        assert!(matches!(
            parse_result("<html>oops</html>"),
            Err(ApiError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_result("[]"),
            Err(ApiError::InvalidResponse(_))
        ));
    }
}
