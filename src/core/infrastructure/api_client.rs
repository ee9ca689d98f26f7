//! Internal HTTP client that signs CloudStack commands and follows async jobs.

use crate::{
    core::domain::{
        error::{AutoscalerError, AutoscalerResult},
        value_object::cloudstack_url::CloudstackUrl,
    },
    core::infrastructure::config::CloudstackConfig,
    nodegroup::application::{
        request::QueryParams,
        response::async_job_response::{
            AsyncJobResponse, JOB_STATUS_PENDING, JOB_STATUS_SUCCEEDED,
            QueryAsyncJobResultResponse,
        },
    },
};
use base64::{Engine, engine::general_purpose::STANDARD};
use governor::{DefaultDirectRateLimiter, Quota};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::Value;
use sha1::Sha1;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

type HmacSha1 = Hmac<Sha1>;

/// Internal HTTP client that calls the CloudStack query API.
///
/// Every command is sent as a signed GET request: the parameters are sorted,
/// url-encoded and lower-cased, then signed with HMAC-SHA1 using the account
/// secret. Asynchronous commands return a job id which is polled through
/// `queryAsyncJobResult` until the job finishes or `async_timeout` elapses.
#[derive(Debug)]
pub struct ApiClient {
    http_client: Client,
    endpoint: CloudstackUrl,
    api_key: String,
    api_secret: String,
    async_timeout: Duration,
    poll_interval: Duration,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl ApiClient {
    /// Creates a new `ApiClient` from a validated configuration.
    ///
    /// # Errors
    /// Returns `AutoscalerError::Validation` if the configuration is invalid and
    /// `AutoscalerError::Connection` if the HTTP client cannot be built.
    pub fn new(config: &CloudstackConfig) -> AutoscalerResult<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()
            .map_err(|e| AutoscalerError::Connection(e.to_string()))?;

        let rate_limiter = match config.rate_limit {
            Some(rl) => {
                let per_second = non_zero(rl.requests_per_second, "requests_per_second")?;
                let burst = non_zero(rl.burst_size, "burst_size")?;
                let quota = Quota::per_second(per_second).allow_burst(burst);
                Some(Arc::new(DefaultDirectRateLimiter::direct(quota)))
            }
            None => None,
        };

        Ok(Self {
            http_client,
            endpoint: config.endpoint()?,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            async_timeout: config.async_timeout(),
            poll_interval: config.poll_interval(),
            rate_limiter,
        })
    }

    /// Returns the API endpoint this client talks to.
    pub fn endpoint(&self) -> &CloudstackUrl {
        &self.endpoint
    }

    /// Runs a synchronous command and deserializes the body inside the
    /// response envelope.
    ///
    /// # Errors
    /// Returns `AutoscalerError::Api` for CloudStack error envelopes and
    /// `AutoscalerError::Connection` for transport or parsing failures.
    pub async fn get<T>(&self, command: &str, params: QueryParams) -> AutoscalerResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.execute_request(command, params).await?;
        serde_json::from_value(body).map_err(|e| {
            AutoscalerError::Connection(format!("Failed to parse {} response: {}", command, e))
        })
    }

    /// Starts an asynchronous command and returns its job handle.
    pub async fn start_async(
        &self,
        command: &str,
        params: QueryParams,
    ) -> AutoscalerResult<AsyncJobResponse> {
        self.get(command, params).await
    }

    /// Polls an async job until it completes and returns its `jobresult`.
    ///
    /// # Errors
    /// Returns `AutoscalerError::AsyncJob` on timeout and
    /// `AutoscalerError::Api` when the job itself failed.
    pub async fn wait_for_job(&self, job_id: &str) -> AutoscalerResult<Value> {
        let started = Instant::now();
        loop {
            let params = QueryParams::from([("jobid".to_string(), job_id.to_string())]);
            let result: QueryAsyncJobResultResponse =
                self.get("queryAsyncJobResult", params).await?;

            match result.jobstatus {
                JOB_STATUS_PENDING => {
                    if started.elapsed() >= self.async_timeout {
                        return Err(AutoscalerError::AsyncJob(format!(
                            "timeout while waiting for async job {} to finish",
                            job_id
                        )));
                    }
                    tokio::time::sleep(self.poll_interval).await;
                }
                JOB_STATUS_SUCCEEDED => return Ok(result.jobresult.unwrap_or(Value::Null)),
                _ => return Err(job_failure(job_id, result.jobresult.as_ref())),
            }
        }
    }

    /// Core request execution: rate limit, sign, send, unwrap the envelope.
    async fn execute_request(&self, command: &str, params: QueryParams) -> AutoscalerResult<Value> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let url = self.signed_url(command, params)?;
        debug!(command, "calling CloudStack API");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AutoscalerError::Connection(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AutoscalerError::Connection(format!("Failed to read response: {}", e)))?;

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => unwrap_envelope(body, status.as_u16()),
            Err(_) if !status.is_success() => Err(AutoscalerError::Api {
                code: status.as_u16(),
                message: text,
            }),
            Err(e) => Err(AutoscalerError::Connection(format!(
                "Failed to parse response: {}",
                e
            ))),
        }
    }

    /// Builds the full signed URL of a command.
    fn signed_url(&self, command: &str, mut params: QueryParams) -> AutoscalerResult<String> {
        params.insert("command".to_string(), command.to_string());
        params.insert("response".to_string(), "json".to_string());
        params.insert("apikey".to_string(), self.api_key.clone());

        let query = encode_query(&params);
        let signature = sign(&query, &self.api_secret)?;
        let signature: String =
            url::form_urlencoded::byte_serialize(signature.as_bytes()).collect();

        let base = self.endpoint.as_url().as_str().trim_end_matches('?');
        Ok(format!("{}?{}&signature={}", base, query, signature))
    }
}

fn non_zero(value: u32, field: &str) -> AutoscalerResult<NonZeroU32> {
    NonZeroU32::new(value).ok_or_else(|| {
        crate::core::domain::error::ValidationError::Field {
            field: field.to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into()
    })
}

/// Url-encodes sorted params, using `%20` for spaces as CloudStack expects.
pub(crate) fn encode_query(params: &QueryParams) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
        .replace('+', "%20")
}

/// Computes the request signature of an encoded query string.
pub(crate) fn sign(query: &str, secret: &str) -> AutoscalerResult<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| AutoscalerError::Connection(format!("Invalid API secret: {}", e)))?;
    mac.update(query.to_lowercase().as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Strips the single-key envelope (`{"listzonesresponse": {...}}`) and turns
/// CloudStack error bodies into `AutoscalerError::Api`.
fn unwrap_envelope(body: Value, status: u16) -> AutoscalerResult<Value> {
    let inner = match body {
        Value::Object(map) if map.len() == 1 => map.into_iter().next().map(|(_, v)| v),
        _ => None,
    }
    .ok_or_else(|| AutoscalerError::Connection("Unexpected response format".to_string()))?;

    if let Some(code) = inner.get("errorcode").and_then(Value::as_u64) {
        return Err(AutoscalerError::Api {
            code: u16::try_from(code).unwrap_or(status),
            message: error_text(&inner),
        });
    }
    if !(200..300).contains(&status) {
        return Err(AutoscalerError::Api {
            code: status,
            message: inner.to_string(),
        });
    }
    Ok(inner)
}

fn job_failure(job_id: &str, result: Option<&Value>) -> AutoscalerError {
    match result {
        Some(result) => AutoscalerError::Api {
            code: result
                .get("errorcode")
                .and_then(Value::as_u64)
                .and_then(|c| u16::try_from(c).ok())
                .unwrap_or(530),
            message: error_text(result),
        },
        None => AutoscalerError::AsyncJob(format!("async job {} failed", job_id)),
    }
}

fn error_text(body: &Value) -> String {
    body.get("errortext")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::infrastructure::config::RateLimitConfig;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn create_test_config(server_url: &str) -> CloudstackConfig {
        CloudstackConfig {
            api_key: "testkey".to_string(),
            api_secret: "testsecret".to_string(),
            url: format!("{}/client/api", server_url),
            async_timeout_secs: 1,
            poll_interval_ms: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_encode_query_uses_percent_20() {
        let params = QueryParams::from([
            ("name".to_string(), "my vm".to_string()),
            ("a".to_string(), "x,y".to_string()),
        ]);
        assert_eq!(encode_query(&params), "a=x%2Cy&name=my%20vm");
    }

    #[test]
    fn test_sign_is_case_insensitive_on_query() {
        let lower = sign("apikey=abc&command=listzones", "secret").unwrap();
        let mixed = sign("apikey=ABC&command=listZones", "secret").unwrap();
        assert_eq!(lower, mixed);
        assert!(!lower.is_empty());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = CloudstackConfig::default();
        assert!(matches!(
            ApiClient::new(&config),
            Err(AutoscalerError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_success() {
        let mock_server = MockServer::start().await;
        let client = ApiClient::new(&create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(path("/client/api"))
            .and(query_param("command", "listZones"))
            .and(query_param("apikey", "testkey"))
            .and(query_param("response", "json"))
            .and(query_param("id", "zone1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "listzonesresponse": {"count": 1, "zone": [{"id": "zone1", "name": "z"}]}
            })))
            .mount(&mock_server)
            .await;

        let params = QueryParams::from([("id".to_string(), "zone1".to_string())]);
        let result: Value = client.get("listZones", params).await.unwrap();
        assert_eq!(result["zone"][0]["name"], "z");
    }

    #[tokio::test]
    async fn test_error_envelope_maps_to_api_error() {
        let mock_server = MockServer::start().await;
        let client = ApiClient::new(&create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(path("/client/api"))
            .respond_with(ResponseTemplate::new(431).set_body_json(serde_json::json!({
                "destroyvirtualmachineresponse": {
                    "errorcode": 431,
                    "cserrorcode": 9999,
                    "errortext": "Invalid parameter id value=vm1 due to incorrect long value format, or entity does not exist"
                }
            })))
            .mount(&mock_server)
            .await;

        let err = client
            .get::<Value>("destroyVirtualMachine", QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AutoscalerError::Api { code: 431, .. }));
        assert!(err.is_not_found("vm1"));
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let mock_server = MockServer::start().await;
        let client = ApiClient::new(&create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&mock_server)
            .await;

        let err = client
            .get::<Value>("listZones", QueryParams::new())
            .await
            .unwrap_err();
        assert!(
            matches!(err, AutoscalerError::Api { code: 503, ref message } if message == "unavailable")
        );
    }

    #[tokio::test]
    async fn test_wait_for_job_polls_until_done() {
        let mock_server = MockServer::start().await;
        let client = ApiClient::new(&create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(query_param("command", "queryAsyncJobResult"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "queryasyncjobresultresponse": {"jobid": "job1", "jobstatus": 0}
            })))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("command", "queryAsyncJobResult"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "queryasyncjobresultresponse": {
                    "jobid": "job1",
                    "jobstatus": 1,
                    "jobresult": {"success": true}
                }
            })))
            .mount(&mock_server)
            .await;

        let result = client.wait_for_job("job1").await.unwrap();
        assert_eq!(result["success"], true);
    }

    #[tokio::test]
    async fn test_wait_for_job_failure() {
        let mock_server = MockServer::start().await;
        let client = ApiClient::new(&create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(query_param("command", "queryAsyncJobResult"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "queryasyncjobresultresponse": {
                    "jobid": "job1",
                    "jobstatus": 2,
                    "jobresult": {"errorcode": 530, "errortext": "insufficient capacity"}
                }
            })))
            .mount(&mock_server)
            .await;

        let err = client.wait_for_job("job1").await.unwrap_err();
        assert_eq!(err.to_string(), "CloudStack API error 530: insufficient capacity");
    }

    #[tokio::test]
    async fn test_wait_for_job_timeout() {
        let mock_server = MockServer::start().await;
        let client = ApiClient::new(&create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(query_param("command", "queryAsyncJobResult"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "queryasyncjobresultresponse": {"jobid": "job1", "jobstatus": 0}
            })))
            .mount(&mock_server)
            .await;

        let err = client.wait_for_job("job1").await.unwrap_err();
        assert!(matches!(err, AutoscalerError::AsyncJob(_)));
    }

    #[tokio::test]
    async fn test_rate_limiting_delays_requests() {
        use std::time::Instant;

        let mock_server = MockServer::start().await;
        let config = CloudstackConfig {
            rate_limit: Some(RateLimitConfig {
                requests_per_second: 2,
                burst_size: 2,
            }),
            ..create_test_config(&mock_server.uri())
        };
        let client = ApiClient::new(&config).unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "listzonesresponse": {}
            })))
            .expect(4)
            .mount(&mock_server)
            .await;

        let start = Instant::now();
        let (r1, r2) = tokio::join!(
            client.get::<Value>("listZones", QueryParams::new()),
            client.get::<Value>("listZones", QueryParams::new())
        );
        r1.unwrap();
        r2.unwrap();
        assert!(start.elapsed() < Duration::from_millis(500));

        let start = Instant::now();
        let (r3, r4) = tokio::join!(
            client.get::<Value>("listZones", QueryParams::new()),
            client.get::<Value>("listZones", QueryParams::new())
        );
        r3.unwrap();
        r4.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(900));
    }
}
