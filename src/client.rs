//! Scoring backend client.
//!
//! Submits the résumé as multipart form data and hands the raw JSON body back
//! to the orchestrator. The backend is treated as a single fallible async
//! operation; no interpretation of the payload happens here.

use crate::analysis::AnalysisRequest;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!("rescore/", env!("CARGO_PKG_VERSION"), " (https://github.com/cladam/rescore)");

/// Upper bound on the scoring call: upload plus model processing
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("scoring request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("scoring backend returned an unreadable body (status {status}): {detail}")]
    UnreadableBody { status: u16, detail: String },
}

/// HTTP client for the scoring backend.
pub struct ScoreClient {
    http: Client,
}

impl ScoreClient {
    pub fn new() -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// Submit a résumé for analysis and return the raw response payload.
    ///
    /// Non-2xx responses are not failures here: the backend has been seen
    /// returning a usable analysis alongside an error status, so any body that
    /// parses as JSON is handed back. Transport errors, timeouts, and bodies
    /// that are not JSON are the only error cases.
    pub async fn analyze(&self, api_base: &str, request: &AnalysisRequest) -> Result<Value, ClientError> {
        let url = format!("{}/api/analyze-resume", api_base);

        let resume_part = Part::bytes(request.resume.clone())
            .file_name(request.file_name.clone())
            .mime_str("application/pdf")?;

        let mut form = Form::new().part("resume", resume_part);
        if let Some(email) = &request.email {
            form = form.text("email", email.clone());
        }
        if let Some(phone) = &request.phone {
            form = form.text("phone", phone.clone());
        }
        if let Some(job_role) = &request.job_role {
            form = form.text("job_role", job_role.clone());
        }

        debug!(url = %url, file = %request.file_name, "submitting resume for analysis");

        let response = self.http.post(&url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(status = %status, bytes = body.len(), "scoring backend responded");

        serde_json::from_str(&body).map_err(|e| ClientError::UnreadableBody {
            status: status.as_u16(),
            detail: e.to_string(),
        })
    }
}
