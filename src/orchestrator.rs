//! The analysis-request lifecycle.
//!
//! Owns the state machine driving one submission: `Idle → Uploading →
//! Processing → Success | Error`, with `reset()` returning to `Idle`. The
//! chosen failure policy is always-fallback: any failure to obtain a usable
//! analysis payload after the request is attempted yields a synthesized
//! fallback result on the `Success` path. The `Error` state is reserved for
//! the one precondition failure, a missing backend address, which is caught
//! before any network attempt.

use crate::analysis::{self, AnalysisRequest, AnalysisResult};
use crate::client::ScoreClient;
use crate::config::Config;
use crate::notifier::{EmailNotifier, EmailReport};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("an analysis is already in progress")]
    Busy,
    #[error(transparent)]
    Client(#[from] crate::client::ClientError),
    #[error(transparent)]
    Notifier(#[from] crate::notifier::NotifierError),
}

/// The finite set of states the analysis flow can be in.
///
/// Exactly one is active at a time; the presentation layer renders whichever
/// it finds and holds no logic of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Uploading,
    Processing,
    Success,
    Error,
}

/// Drives one submission at a time from form input to rendered result.
pub struct Orchestrator {
    config: Config,
    client: ScoreClient,
    notifier: Option<Arc<EmailNotifier>>,
    state: AnalysisState,
    result: Option<AnalysisResult>,
    error: Option<String>,
    email_sent: Arc<AtomicBool>,
    // Bumped on every submit and reset; a stale email completion from a
    // superseded session must not flip the current flag.
    generation: Arc<AtomicU64>,
    email_task: Option<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(config: Config) -> Result<Self, OrchestratorError> {
        let client = ScoreClient::new()?;
        let notifier = EmailNotifier::from_config(&config)?.map(Arc::new);
        if notifier.is_none() {
            info!("email credentials not configured, report delivery disabled");
        }

        Ok(Self {
            config,
            client,
            notifier,
            state: AnalysisState::Idle,
            result: None,
            error: None,
            email_sent: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            email_task: None,
        })
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn email_sent(&self) -> bool {
        self.email_sent.load(Ordering::SeqCst)
    }

    /// Whether report delivery is configured at all
    pub fn email_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// Run one submission through the state machine.
    ///
    /// Rejects re-submission while a request is in flight. On return the
    /// orchestrator is in `Success` (with a result, possibly the fallback) or
    /// `Error` (backend address missing); the email follow-up, if any, is
    /// still running in the background.
    pub async fn submit(&mut self, request: AnalysisRequest) -> Result<(), OrchestratorError> {
        if matches!(
            self.state,
            AnalysisState::Uploading | AnalysisState::Processing
        ) {
            warn!("submission rejected, analysis already in progress");
            return Err(OrchestratorError::Busy);
        }

        // Clear anything left over from the previous submission.
        self.result = None;
        self.error = None;
        self.email_sent.store(false, Ordering::SeqCst);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.state = AnalysisState::Uploading;

        // Precondition: without a backend address no request is attempted.
        let api_base = match self.config.api_base() {
            Ok(base) => base,
            Err(e) => {
                self.error = Some(e.to_string());
                self.state = AnalysisState::Error;
                return Ok(());
            }
        };

        self.state = AnalysisState::Processing;

        let result = match self.client.analyze(&api_base, &request).await {
            Ok(payload) => match analysis::normalize(&payload) {
                Some(result) => result,
                None => {
                    warn!("backend payload carried no usable analysis, substituting fallback");
                    AnalysisResult::fallback(request.email.as_deref())
                }
            },
            Err(e) => {
                warn!(error = %e, "scoring request failed, substituting fallback");
                AnalysisResult::fallback(request.email.as_deref())
            }
        };

        self.result = Some(result);
        self.state = AnalysisState::Success;
        self.spawn_email_followup(&request, generation);

        Ok(())
    }

    /// Return to `Idle`, clearing result, error, and the email flag.
    ///
    /// Any still-running email task is left to finish detached; the
    /// generation bump keeps its completion from touching the new session.
    pub fn reset(&mut self) {
        self.state = AnalysisState::Idle;
        self.result = None;
        self.error = None;
        self.email_sent.store(false, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.email_task = None;
    }

    /// Wait for the in-flight email send, if any, and report the flag.
    ///
    /// The flow never needs this; the binary calls it after rendering so the
    /// send can finish before the process exits.
    pub async fn settle_email(&mut self) -> bool {
        if let Some(task) = self.email_task.take() {
            let _ = task.await;
        }
        self.email_sent()
    }

    /// Fire the best-effort report email without gating the flow.
    fn spawn_email_followup(&mut self, request: &AnalysisRequest, generation: u64) {
        let result = match &self.result {
            Some(result) => result,
            None => return,
        };

        let target = match target_email(request.email.as_deref(), result) {
            Some(target) => target,
            None => {
                info!("no recipient address available, skipping report email");
                return;
            }
        };

        let notifier = match &self.notifier {
            Some(notifier) => Arc::clone(notifier),
            None => {
                info!("email not configured, skipping report email");
                return;
            }
        };

        let report = EmailReport::from_result(
            target,
            request.phone.clone(),
            request.job_role.clone(),
            result,
        );
        let flag = Arc::clone(&self.email_sent);
        let current = Arc::clone(&self.generation);

        self.email_task = Some(tokio::spawn(async move {
            match notifier.send(&report).await {
                Ok(()) => {
                    if mark_email_sent(&flag, &current, generation) {
                        info!(to = %report.to_email, "analysis report emailed");
                    } else {
                        info!("email delivery confirmed for a superseded session, ignored");
                    }
                }
                Err(e) => warn!(error = %e, "report email failed, continuing without it"),
            }
        }));
    }
}

/// Pick the report recipient: the address the user typed wins, otherwise the
/// one the backend extracted from the résumé text.
fn target_email(user_email: Option<&str>, result: &AnalysisResult) -> Option<String> {
    user_email
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .or_else(|| {
            result
                .extracted_email
                .as_deref()
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .map(str::to_string)
        })
}

/// Flip the sent flag only if the session that spawned the send is still live.
fn mark_email_sent(flag: &AtomicBool, generation: &AtomicU64, expected: u64) -> bool {
    if generation.load(Ordering::SeqCst) == expected {
        flag.store(true, Ordering::SeqCst);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, EmailConfig};

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            resume: b"%PDF-1.7 test".to_vec(),
            file_name: "resume.pdf".to_string(),
            email: Some("pat@example.com".to_string()),
            phone: None,
            job_role: None,
        }
    }

    fn config_with_base(base: Option<&str>) -> Config {
        Config {
            api: ApiConfig {
                base_url: base.map(str::to_string),
            },
            email: EmailConfig::default(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_backend_address_errors_without_a_request() {
        let mut orchestrator = Orchestrator::new(config_with_base(None)).unwrap();

        orchestrator.submit(request()).await.unwrap();

        assert_eq!(orchestrator.state(), AnalysisState::Error);
        assert!(orchestrator.result().is_none());
        assert!(orchestrator.error().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn network_rejection_falls_back_to_success() {
        // Nothing listens on the discard port, the connection is refused.
        let mut orchestrator =
            Orchestrator::new(config_with_base(Some("http://127.0.0.1:9"))).unwrap();

        orchestrator.submit(request()).await.unwrap();

        assert_eq!(orchestrator.state(), AnalysisState::Success);
        let result = orchestrator.result().unwrap();
        assert!(result.is_fallback);
        assert_eq!(result.ats_score, 0);
        assert_eq!(result.extracted_email.as_deref(), Some("pat@example.com"));
        assert!(orchestrator.error().is_none());
    }

    #[tokio::test]
    async fn reset_returns_to_idle_and_clears_everything() {
        let mut orchestrator =
            Orchestrator::new(config_with_base(Some("http://127.0.0.1:9"))).unwrap();
        orchestrator.submit(request()).await.unwrap();

        orchestrator.reset();

        assert_eq!(orchestrator.state(), AnalysisState::Idle);
        assert!(orchestrator.result().is_none());
        assert!(orchestrator.error().is_none());
        assert!(!orchestrator.email_sent());
    }

    #[tokio::test]
    async fn submission_is_rejected_while_in_flight() {
        let mut orchestrator =
            Orchestrator::new(config_with_base(Some("http://127.0.0.1:9"))).unwrap();
        orchestrator.state = AnalysisState::Processing;

        let err = orchestrator.submit(request()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Busy));
        assert_eq!(orchestrator.state(), AnalysisState::Processing);
    }

    #[test]
    fn recipient_prefers_user_address_over_extracted() {
        let mut result = AnalysisResult::fallback(None);
        result.extracted_email = Some("from-resume@example.com".to_string());

        assert_eq!(
            target_email(Some("typed@example.com"), &result).as_deref(),
            Some("typed@example.com")
        );
        assert_eq!(
            target_email(Some("  "), &result).as_deref(),
            Some("from-resume@example.com")
        );
        assert_eq!(
            target_email(None, &result).as_deref(),
            Some("from-resume@example.com")
        );

        result.extracted_email = None;
        assert_eq!(target_email(None, &result), None);
    }

    #[test]
    fn stale_email_completion_cannot_flip_the_flag() {
        let flag = AtomicBool::new(false);
        let generation = AtomicU64::new(3);

        // Completion from a superseded session.
        assert!(!mark_email_sent(&flag, &generation, 2));
        assert!(!flag.load(Ordering::SeqCst));

        // Completion from the live session.
        assert!(mark_email_sent(&flag, &generation, 3));
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn settle_email_reports_false_when_nothing_was_sent() {
        let mut orchestrator =
            Orchestrator::new(config_with_base(Some("http://127.0.0.1:9"))).unwrap();
        orchestrator.submit(request()).await.unwrap();

        // No email credentials configured, so no task was spawned.
        assert!(!orchestrator.settle_email().await);
    }
}
