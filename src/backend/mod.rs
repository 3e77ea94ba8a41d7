mod http;

pub use http::HttpBackend;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reminder::ReminderRecord;
use crate::session::SpreadsheetFile;

/// The remote service that parses spreadsheets and sends reminder emails
pub trait Backend {
    /// Upload both spreadsheets and get the reminder records back
    fn analyze(&self, clients: &SpreadsheetFile, portfolio: &SpreadsheetFile)
        -> Result<AnalysisResponse>;

    /// Ask the backend to email the given records, one message per client
    fn send(&self, records: &[ReminderRecord]) -> Result<SendSummary>;

    /// Trigger the backend's SMTP self-test
    fn smtp_check(&self) -> Result<SmtpCheck>;
}

/// Per-status counters computed by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalysisStats {
    #[serde(default)]
    pub total: usize,
    #[serde(rename = "vencidas", default)]
    pub overdue: usize,
    #[serde(rename = "proximas", default)]
    pub upcoming: usize,
    #[serde(rename = "no_vencidas", default)]
    pub not_due: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(rename = "recordatorios", default)]
    pub records: Vec<ReminderRecord>,
    #[serde(default)]
    pub stats: AnalysisStats,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of the send request
#[derive(Debug, Serialize)]
pub struct SendRequest<'a> {
    #[serde(rename = "recordatorios")]
    pub records: &'a [ReminderRecord],
}

/// Outcome of one email, as reported by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct SendResult {
    #[serde(rename = "destinatario", default)]
    pub recipient: Option<String>,
    #[serde(rename = "cliente", default)]
    pub client: Option<String>,
    #[serde(rename = "facturas", default)]
    pub invoices: usize,
    #[serde(rename = "vencidas", default)]
    pub overdue: usize,
    #[serde(rename = "proximas", default)]
    pub upcoming: usize,
    #[serde(rename = "no_vencidas", default)]
    pub not_due: usize,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendSummary {
    #[serde(default)]
    pub total: usize,
    #[serde(rename = "exitosos", default)]
    pub succeeded: usize,
    #[serde(rename = "fallidos", default)]
    pub failed: usize,
    #[serde(rename = "resultados", default)]
    pub results: Vec<SendResult>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SendSummary {
    /// Fold the summary of another batch into this one
    pub fn merge(&mut self, other: SendSummary) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.results.extend(other.results);
        if other.message.is_some() {
            self.message = other.message;
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &SendResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpCheck {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(rename = "detalles", default)]
    pub details: Option<serde_json::Value>,
}
