use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use ureq::http::Response;
use ureq::unversioned::multipart::{Form, Part};
use ureq::{Agent, Body};

use super::{AnalysisResponse, Backend, SendRequest, SendSummary, SmtpCheck};
use crate::config::ServerSettings;
use crate::error::{ReminderError, Result};
use crate::reminder::ReminderRecord;
use crate::session::SpreadsheetFile;

/// Blocking HTTP client for the reminder backend
pub struct HttpBackend {
    agent: Agent,
    base_url: String,
}

impl HttpBackend {
    pub fn new(settings: &ServerSettings) -> Self {
        // Error statuses still carry a JSON body with the server's message
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport_error(url: &str, err: ureq::Error) -> ReminderError {
    ReminderError::Http {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

/// File field of the upload form, sent with its original name
fn spreadsheet_part<'a>(url: &str, file: &'a SpreadsheetFile) -> Result<Part<'a>> {
    Part::bytes(&file.bytes)
        .file_name(&file.name)
        .mime_str("application/octet-stream")
        .map_err(|e| transport_error(url, e))
}

/// Pull the human-readable message out of an error body
fn error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json["message"]
        .as_str()
        .or_else(|| json["error"].as_str())
        .map(str::to_string)
}

/// Decode a JSON response, turning error statuses into `Server` errors
fn read_response<T: DeserializeOwned>(url: &str, mut response: Response<Body>) -> Result<T> {
    let status = response.status();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| transport_error(url, e))?;

    debug!(url, status = status.as_u16(), bytes = body.len(), "response received");

    if !status.is_success() {
        let message = error_message(&body)
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
        return Err(ReminderError::Server {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| ReminderError::InvalidResponse(e.to_string()))
}

impl Backend for HttpBackend {
    fn analyze(
        &self,
        clients: &SpreadsheetFile,
        portfolio: &SpreadsheetFile,
    ) -> Result<AnalysisResponse> {
        let url = self.url("/procesar-excel");
        let form = Form::new()
            .part("file1", spreadsheet_part(&url, clients)?)
            .part("file2", spreadsheet_part(&url, portfolio)?);

        info!(
            %url,
            bytes = clients.size() + portfolio.size(),
            "uploading spreadsheets"
        );
        let response = self
            .agent
            .post(&url)
            .send(form)
            .map_err(|e| transport_error(&url, e))?;

        read_response(&url, response)
    }

    fn send(&self, records: &[ReminderRecord]) -> Result<SendSummary> {
        let url = self.url("/enviar-correos");
        let payload = serde_json::to_string(&SendRequest { records })
            .map_err(|e| ReminderError::InvalidResponse(e.to_string()))?;

        info!(%url, records = records.len(), "requesting email dispatch");
        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .send(payload.as_bytes())
            .map_err(|e| transport_error(&url, e))?;

        read_response(&url, response)
    }

    fn smtp_check(&self) -> Result<SmtpCheck> {
        let url = self.url("/test-email");
        info!(%url, "requesting SMTP self-test");
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| transport_error(&url, e))?;

        // The self-test reports failures as 4xx/5xx with a full body
        match read_response::<SmtpCheck>(&url, response) {
            Err(ReminderError::Server { message, .. }) => Ok(SmtpCheck {
                success: false,
                message: Some(message),
                error: None,
                details: None,
            }),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"success": false, "message": "Faltan archivos."}"#).as_deref(),
            Some("Faltan archivos.")
        );
        assert_eq!(
            error_message(r#"{"success": false, "error": "boom"}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(error_message("<html>oops</html>"), None);
        assert_eq!(error_message(r#"{"success": false}"#), None);
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let backend = HttpBackend::new(&ServerSettings {
            base_url: "http://localhost:5000/".to_string(),
            timeout_secs: 5,
        });
        assert_eq!(backend.base_url(), "http://localhost:5000");
        assert_eq!(backend.url("/test-email"), "http://localhost:5000/test-email");
    }
}
