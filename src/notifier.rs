//! Best-effort email delivery through the EmailJS REST API.
//!
//! The notifier is strictly auxiliary: a failed or skipped send is logged and
//! forgotten, and its outcome never feeds back into the analysis flow.

use crate::analysis::AnalysisResult;
use crate::config::Config;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("email send failed: {0}")]
    SendFailed(#[from] reqwest::Error),
    #[error("email provider rejected the send (status {status}): {detail}")]
    Rejected { status: u16, detail: String },
}

/// Everything the email template needs for one report.
#[derive(Debug, Clone)]
pub struct EmailReport {
    pub to_email: String,
    pub phone: Option<String>,
    pub job_role: Option<String>,
    pub ats_score: i64,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

impl EmailReport {
    /// Assemble a report for a recipient from a normalized result.
    pub fn from_result(
        to_email: String,
        phone: Option<String>,
        job_role: Option<String>,
        result: &AnalysisResult,
    ) -> Self {
        Self {
            to_email,
            phone,
            job_role,
            ats_score: result.ats_score,
            summary: result.overall_summary.clone(),
            strengths: result.strengths.clone(),
            weaknesses: result.missing_or_weak_areas.clone(),
            suggestions: result.improvement_suggestions.clone(),
        }
    }
}

/// EmailJS client holding the provider credentials.
pub struct EmailNotifier {
    http: Client,
    service_id: String,
    template_id: String,
    public_key: String,
}

impl EmailNotifier {
    /// Build a notifier from config, or `None` when any credential is absent.
    ///
    /// Missing credentials disable the email step silently; they are never an
    /// error surfaced to the user.
    pub fn from_config(config: &Config) -> Result<Option<Self>, NotifierError> {
        let (service_id, template_id, public_key) = match (
            &config.email.service_id,
            &config.email.template_id,
            &config.email.public_key,
        ) {
            (Some(s), Some(t), Some(k)) => (s.clone(), t.clone(), k.clone()),
            _ => return Ok(None),
        };

        let http = Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Some(Self {
            http,
            service_id,
            template_id,
            public_key,
        }))
    }

    /// Send one analysis report. Succeeds only on confirmed delivery.
    pub async fn send(&self, report: &EmailReport) -> Result<(), NotifierError> {
        let user_name = report
            .to_email
            .split('@')
            .next()
            .unwrap_or(&report.to_email)
            .to_string();

        let body = json!({
            "service_id": self.service_id,
            "template_id": self.template_id,
            "user_id": self.public_key,
            "template_params": {
                "to_email": report.to_email,
                "user_name": user_name,
                "job_role": report.job_role.as_deref().unwrap_or("General Evaluation"),
                "ats_score": report.ats_score,
                "report": format_report(report),
            }
        });

        debug!(to = %report.to_email, "sending analysis report email");

        let response = self.http.post(EMAILJS_SEND_URL).json(&body).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(NotifierError::Rejected {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

/// Render the report body for the email template.
///
/// The template accepts HTML; sections with no content are omitted entirely.
fn format_report(report: &EmailReport) -> String {
    let mut html = String::new();

    html.push_str("<h2>SUMMARY</h2>");
    html.push_str(&format!("<p>{}</p>", report.summary));

    push_section(&mut html, "KEY STRENGTHS", &report.strengths);
    push_section(&mut html, "AREAS FOR IMPROVEMENT", &report.weaknesses);
    push_section(&mut html, "RECOMMENDATIONS", &report.suggestions);

    html
}

fn push_section(html: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    html.push_str(&format!("<h3>{}</h3><ul>", title));
    for item in items {
        html.push_str(&format!("<li>{}</li>", item));
    }
    html.push_str("</ul>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> EmailReport {
        EmailReport {
            to_email: "dana@example.com".to_string(),
            phone: None,
            job_role: Some("Data Engineer".to_string()),
            ats_score: 77,
            summary: "Good coverage of core skills.".to_string(),
            strengths: vec!["Strong SQL background".to_string()],
            weaknesses: vec![],
            suggestions: vec!["Quantify project impact".to_string()],
        }
    }

    #[test]
    fn report_body_includes_populated_sections_only() {
        let body = format_report(&sample_report());
        assert!(body.contains("SUMMARY"));
        assert!(body.contains("Good coverage of core skills."));
        assert!(body.contains("KEY STRENGTHS"));
        assert!(body.contains("Strong SQL background"));
        assert!(body.contains("RECOMMENDATIONS"));
        assert!(!body.contains("AREAS FOR IMPROVEMENT"));
    }

    #[test]
    fn missing_credentials_yield_no_notifier() {
        let config = Config::default();
        assert!(EmailNotifier::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn report_pulls_fields_from_result() {
        let result = AnalysisResult {
            ats_score: 64,
            overall_summary: "Decent".to_string(),
            strengths: vec!["A".to_string()],
            missing_or_weak_areas: vec!["B".to_string()],
            ats_keyword_gaps: vec![],
            improvement_suggestions: vec!["C".to_string()],
            structure_feedback: vec![],
            final_recommendation: "Revise".to_string(),
            is_fallback: false,
            extracted_email: None,
        };
        let report = EmailReport::from_result("x@y.io".to_string(), None, None, &result);
        assert_eq!(report.ats_score, 64);
        assert_eq!(report.weaknesses, vec!["B".to_string()]);
        assert_eq!(report.suggestions, vec!["C".to_string()]);
    }
}
