//! Form collection and validation.
//!
//! All input validation happens here, before a request reaches the
//! orchestrator; the orchestrator itself never re-checks file type, size, or
//! addresses.

use crate::analysis::AnalysisRequest;
use std::path::Path;
use thiserror::Error;

/// Maximum accepted résumé size (10 MiB)
pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("failed to read resume file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("only PDF files are accepted")]
    NotAPdf,
    #[error("file size must be less than 10MB (got {0})")]
    TooLarge(String),
    #[error("please enter a valid email address: {0}")]
    InvalidEmail(String),
}

/// Validate inputs and assemble a submission request.
///
/// `email` is required for the report delivery, `phone` and `job_role` are
/// optional and passed through untouched.
pub async fn collect(
    resume_path: &Path,
    email: &str,
    phone: Option<String>,
    job_role: Option<String>,
) -> Result<AnalysisRequest, FormError> {
    let resume = tokio::fs::read(resume_path).await?;

    if !is_pdf(&resume) {
        return Err(FormError::NotAPdf);
    }
    if resume.len() > MAX_RESUME_BYTES {
        return Err(FormError::TooLarge(format_file_size(resume.len())));
    }

    let email = email.trim();
    if !is_valid_email(email) {
        return Err(FormError::InvalidEmail(email.to_string()));
    }

    let file_name = resume_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume.pdf".to_string());

    Ok(AnalysisRequest {
        resume,
        file_name,
        email: Some(email.to_string()),
        phone: phone.filter(|p| !p.trim().is_empty()),
        job_role: job_role.filter(|r| !r.trim().is_empty()),
    })
}

/// Check the PDF magic header rather than trusting the file extension
fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Minimal shape check: non-empty local part, one `@`, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    if local.is_empty() || local.contains(char::is_whitespace) {
        return false;
    }

    let mut domain_parts = domain.rsplitn(2, '.');
    match (domain_parts.next(), domain_parts.next()) {
        (Some(tld), Some(name)) => {
            !tld.is_empty()
                && !name.is_empty()
                && !domain.contains(char::is_whitespace)
        }
        _ => false,
    }
}

/// Human-readable file size for error messages
fn format_file_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes >= KIB * KIB {
        format!("{:.2} MB", bytes / (KIB * KIB))
    } else if bytes >= KIB {
        format!("{:.2} KB", bytes / KIB)
    } else {
        format!("{} Bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn accepts_a_valid_pdf_submission() {
        let file = write_temp(b"%PDF-1.7 minimal body");
        let request = collect(
            file.path(),
            "sam@example.com",
            Some("  ".to_string()),
            Some("Backend Engineer".to_string()),
        )
        .await
        .unwrap();

        assert_eq!(request.email.as_deref(), Some("sam@example.com"));
        assert_eq!(request.phone, None);
        assert_eq!(request.job_role.as_deref(), Some("Backend Engineer"));
        assert!(request.resume.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn rejects_non_pdf_content() {
        let file = write_temp(b"<!DOCTYPE html><html></html>");
        let err = collect(file.path(), "sam@example.com", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FormError::NotAPdf));
    }

    #[tokio::test]
    async fn rejects_bad_email() {
        let file = write_temp(b"%PDF-1.7");
        let err = collect(file.path(), "not-an-address", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FormError::InvalidEmail(_)));
    }

    #[test]
    fn email_shape_checks() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.io"));
        assert!(!is_valid_email("a@b@c.io"));
        assert!(!is_valid_email("a@.co"));
    }

    #[test]
    fn file_sizes_format_for_messages() {
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(11 * 1024 * 1024), "11.00 MB");
    }
}
