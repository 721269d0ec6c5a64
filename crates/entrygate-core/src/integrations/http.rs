//! HTTP adapter for the submission backend.
//!
//! Endpoints (relative to `backend.base_url`):
//! - `GET  submissions/recent?window_hours=N` -> `[SubmissionRecord]`
//! - `POST submissions` with `{ ...payload, overrideToken }` -> `SubmissionRecord`
//!
//! A 4xx answer to a submit is a rejection; its JSON `reason` (or raw body)
//! is handed to the user unchanged.

use std::time::Duration as StdDuration;

use chrono::Duration;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use super::traits::SubmissionBackend;
use crate::error::{CoreError, NetworkError, SubmitError};
use crate::reward::OverrideToken;
use crate::storage::BackendConfig;
use crate::submission::{SubmissionPayload, SubmissionRecord};

pub struct HttpBackend {
    base_url: Url,
    client: Client,
    runtime: tokio::runtime::Runtime,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    #[serde(flatten)]
    payload: &'a SubmissionPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    override_token: Option<&'a str>,
}

#[derive(Deserialize)]
struct RejectionBody {
    reason: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, CoreError> {
        // `Url::join` replaces the last segment unless the base ends in '/'.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| CoreError::Custom(format!("invalid backend url '{base}': {e}")))?;
        let client = Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .build()
            .map_err(NetworkError::from)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            base_url,
            client,
            runtime,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, NetworkError> {
        self.base_url
            .join(path)
            .map_err(|e| NetworkError::Transport(format!("bad endpoint '{path}': {e}")))
    }
}

impl SubmissionBackend for HttpBackend {
    fn list_recent(&self, window: Duration) -> Result<Vec<SubmissionRecord>, NetworkError> {
        let mut url = self.endpoint("submissions/recent")?;
        url.query_pairs_mut()
            .append_pair("window_hours", &window.num_hours().to_string());

        self.runtime.block_on(async {
            let resp = self.client.get(url).send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(NetworkError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            let records = resp.json::<Vec<SubmissionRecord>>().await?;
            Ok(records)
        })
    }

    fn submit(
        &self,
        payload: &SubmissionPayload,
        override_token: Option<&OverrideToken>,
    ) -> Result<SubmissionRecord, SubmitError> {
        let url = self.endpoint("submissions")?;
        let body = SubmitBody {
            payload,
            override_token: override_token.map(OverrideToken::as_str),
        };

        self.runtime.block_on(async {
            let resp = self
                .client
                .post(url)
                .json(&body)
                .send()
                .await
                .map_err(NetworkError::from)?;
            let status = resp.status();

            if status.is_success() {
                let record = resp
                    .json::<SubmissionRecord>()
                    .await
                    .map_err(NetworkError::from)?;
                return Ok(record);
            }

            let text = resp.text().await.unwrap_or_default();
            if status.is_client_error() && status != StatusCode::REQUEST_TIMEOUT {
                let reason = serde_json::from_str::<RejectionBody>(&text)
                    .map(|r| r.reason)
                    .unwrap_or(text);
                return Err(SubmitError::Rejected { reason });
            }

            Err(NetworkError::Status {
                status: status.as_u16(),
                body: text,
            }
            .into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::SubmissionStatus;
    use mockito::Matcher;

    fn backend(server: &mockito::Server) -> HttpBackend {
        HttpBackend::new(&BackendConfig {
            base_url: format!("{}/api", server.url()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn list_recent_parses_records() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/submissions/recent")
            .match_query(Matcher::UrlEncoded("window_hours".into(), "24".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"id":"a","status":"approved","createdAt":"2026-01-01T00:00:00Z","statusChangedAt":"2026-01-01T01:00:00Z"},
                    {"id":"b","status":"pending"}
                ]"#,
            )
            .create();

        let records = backend(&server).list_recent(Duration::hours(24)).unwrap();
        mock.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, SubmissionStatus::Approved);
        assert!(records[1].created_at.is_none());
    }

    #[test]
    fn list_recent_maps_server_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/submissions/recent")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("maintenance")
            .create();

        let err = backend(&server).list_recent(Duration::hours(24)).unwrap_err();
        assert_eq!(
            err,
            NetworkError::Status {
                status: 503,
                body: "maintenance".into()
            }
        );
    }

    #[test]
    fn submit_sends_override_token() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/submissions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "title": "Hello",
                "overrideToken": "tok-1"
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"n1","status":"pending","createdAt":"2026-01-01T00:00:00Z"}"#)
            .create();

        let payload = SubmissionPayload {
            title: "Hello".into(),
            ..SubmissionPayload::default()
        };
        let token = OverrideToken::from("tok-1");
        let record = backend(&server).submit(&payload, Some(&token)).unwrap();
        mock.assert();
        assert!(record.is_pending());
    }

    #[test]
    fn submit_rejection_surfaces_reason() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/submissions")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reason":"title already used today"}"#)
            .create();

        let err = backend(&server)
            .submit(&SubmissionPayload::default(), None)
            .unwrap_err();
        assert_eq!(
            err,
            SubmitError::Rejected {
                reason: "title already used today".into()
            }
        );
    }

    #[test]
    fn unreachable_backend_is_a_network_error() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 1,
        })
        .unwrap();
        let err = backend.list_recent(Duration::hours(24)).unwrap_err();
        assert!(matches!(err, NetworkError::Transport(_) | NetworkError::Timeout));
    }
}
