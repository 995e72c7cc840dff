//! Remote analysis API client
//!
//! Submits a capture reference to the analysis service and returns its
//! [`AnalysisResult`] envelope. PPG and face scans go to separate endpoints.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::MeasurementSource;
use crate::config::RemoteConfig;
use crate::error::ScanError;
use crate::types::{AnalysisResult, CaptureDescriptor, ScanMode};

pub const PPG_ANALYZE_PATH: &str = "/ppg/analyze";
pub const FACE_ANALYZE_PATH: &str = "/face/analyze";

const USER_AGENT: &str = concat!("vitalscan/", env!("CARGO_PKG_VERSION"));

/// Placeholder video reference sent when the descriptor carries none
const PLACEHOLDER_VIDEO_URI: &str = "mock://video-path";

/// Request body for both analyze endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub uri: String,
    /// Recording length in seconds
    pub duration: f64,
}

impl RawSample {
    pub fn from_descriptor(descriptor: &CaptureDescriptor) -> Self {
        Self {
            uri: descriptor
                .video_uri
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_VIDEO_URI.to_string()),
            duration: descriptor.duration_seconds,
        }
    }
}

/// Analysis API client
pub struct RemoteAnalysisSource {
    http_client: reqwest::Client,
    base_url: String,
}

impl RemoteAnalysisSource {
    pub fn new(config: &RemoteConfig) -> Result<Self, ScanError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full endpoint URL for `mode`
    pub fn endpoint(&self, mode: ScanMode) -> String {
        let path = match mode {
            ScanMode::Ppg => PPG_ANALYZE_PATH,
            ScanMode::Face => FACE_ANALYZE_PATH,
        };
        format!("{}{}", self.base_url, path)
    }

    pub async fn submit_ppg_data(&self, sample: &RawSample) -> Result<AnalysisResult, ScanError> {
        self.post(ScanMode::Ppg, sample).await
    }

    pub async fn submit_face_data(&self, sample: &RawSample) -> Result<AnalysisResult, ScanError> {
        self.post(ScanMode::Face, sample).await
    }

    async fn post(&self, mode: ScanMode, sample: &RawSample) -> Result<AnalysisResult, ScanError> {
        let url = self.endpoint(mode);
        tracing::debug!(%url, uri = %sample.uri, duration = sample.duration, "submitting scan");

        let response = self.http_client.post(&url).json(sample).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "analysis API returned error status");
            return Err(ScanError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let result: AnalysisResult = serde_json::from_str(&body)?;
        if !result.success {
            return Err(ScanError::AnalysisRejected(result.message));
        }

        tracing::debug!(mode = %mode, "analysis API accepted scan");
        Ok(result)
    }
}

impl MeasurementSource for RemoteAnalysisSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn measure(
        &self,
        descriptor: &CaptureDescriptor,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, ScanError> {
        descriptor.validate()?;
        let sample = RawSample::from_descriptor(descriptor);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScanError::Cancelled),
            result = self.post(descriptor.mode, &sample) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the request it received
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{addr}/api/v1"), handle)
    }

    fn source(base_url: String) -> RemoteAnalysisSource {
        RemoteAnalysisSource::new(&RemoteConfig {
            base_url,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoints() {
        let source = source("http://localhost:3000/api/v1/".to_string());
        assert_eq!(
            source.endpoint(ScanMode::Ppg),
            "http://localhost:3000/api/v1/ppg/analyze"
        );
        assert_eq!(
            source.endpoint(ScanMode::Face),
            "http://localhost:3000/api/v1/face/analyze"
        );
    }

    #[test]
    fn test_raw_sample_body() {
        let sample = RawSample::from_descriptor(&CaptureDescriptor::face());
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"uri": "mock://video-path", "duration": 45.0})
        );

        let sample = RawSample::from_descriptor(
            &CaptureDescriptor::ppg().with_video_uri("file:///tmp/scan.mp4"),
        );
        assert_eq!(sample.uri, "file:///tmp/scan.mp4");
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"success":true,"data":{"bpm":72,"hrv":45,"quality":0.87,"confidence":"high"},"message":"Analysis completed successfully"}"#,
        )
        .await;

        let result = source(base_url)
            .submit_ppg_data(&RawSample::from_descriptor(&CaptureDescriptor::ppg()))
            .await
            .unwrap();

        assert_eq!(result.data.bpm, Some(72.0));
        assert_eq!(result.message, "Analysis completed successfully");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/v1/ppg/analyze"));
        assert!(request.contains(r#""duration":30.0"#));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let (base_url, _server) =
            serve_once("HTTP/1.1 500 Internal Server Error", r#"{"error":"boom"}"#).await;

        let result = source(base_url)
            .submit_face_data(&RawSample::from_descriptor(&CaptureDescriptor::face()))
            .await;

        match result {
            Err(ScanError::Api { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope_is_rejected() {
        let (base_url, _server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"success":false,"data":{},"message":"No face detected"}"#,
        )
        .await;

        let result = source(base_url)
            .measure(&CaptureDescriptor::face(), &CancellationToken::new())
            .await;

        match result {
            Err(ScanError::AnalysisRejected(message)) => assert_eq!(message, "No face detected"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let (base_url, _server) = serve_once("HTTP/1.1 200 OK", "not json").await;

        let result = source(base_url)
            .measure(&CaptureDescriptor::ppg(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ScanError::JsonError(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_submission() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Nothing listens on this port; cancellation wins regardless
        let result = source("http://127.0.0.1:9/api/v1".to_string())
            .measure(&CaptureDescriptor::ppg(), &cancel)
            .await;
        assert!(matches!(result, Err(ScanError::Cancelled)));
    }
}
