//! Working state of one reminder run: the two uploaded spreadsheets, the
//! records returned by the last analysis and the client groups derived from
//! them.

use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::backend::{AnalysisStats, Backend, SendSummary};
use crate::error::{ReminderError, Result};
use crate::reminder::{
    distinct_keys, filter_groups, group_by_client, select_records, split_by_status, ClientGroup,
    ClientKey, ReminderRecord, SplitGroups,
};

/// A spreadsheet read from disk, ready for upload
#[derive(Debug, Clone)]
pub struct SpreadsheetFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SpreadsheetFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Which upload slot a file goes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Clients and sellers directory
    Clients,
    /// Aged portfolio ("Cartera por edades")
    Portfolio,
}

/// Result of an analysis run
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Records were returned and grouped
    Analyzed { records: usize, clients: usize },
    /// The backend found nothing to remind about
    Empty(String),
}

/// Accepts `.xlsx` and `.xls` in any letter case
pub fn is_spreadsheet_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".xlsx") || lower.ends_with(".xls")
}

#[derive(Debug, Default)]
pub struct Session {
    clients_file: Option<SpreadsheetFile>,
    portfolio_file: Option<SpreadsheetFile>,
    records: Vec<ReminderRecord>,
    stats: AnalysisStats,
    groups: Vec<ClientGroup>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a spreadsheet into a slot. The name is checked before the file is
    /// touched, so a wrong type never reaches the backend.
    pub fn load_file(&mut self, slot: Slot, path: &Path) -> Result<&SpreadsheetFile> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !is_spreadsheet_name(&name) {
            return Err(ReminderError::InvalidFileType(path.display().to_string()));
        }

        let bytes = fs::read(path)?;
        info!(file = %name, bytes = bytes.len(), ?slot, "spreadsheet loaded");

        let file = SpreadsheetFile { name, bytes };
        let target = match slot {
            Slot::Clients => &mut self.clients_file,
            Slot::Portfolio => &mut self.portfolio_file,
        };
        Ok(target.insert(file))
    }

    pub fn file(&self, slot: Slot) -> Option<&SpreadsheetFile> {
        match slot {
            Slot::Clients => self.clients_file.as_ref(),
            Slot::Portfolio => self.portfolio_file.as_ref(),
        }
    }

    /// Both spreadsheets are loaded
    pub fn is_ready(&self) -> bool {
        self.clients_file.is_some() && self.portfolio_file.is_some()
    }

    /// Upload both spreadsheets and rebuild the client groups from the answer.
    ///
    /// Takes `&mut self`, so a session never has two requests in flight.
    pub fn analyze(&mut self, backend: &dyn Backend) -> Result<Outcome> {
        let (Some(clients), Some(portfolio)) = (&self.clients_file, &self.portfolio_file) else {
            return Err(ReminderError::FilesNotReady);
        };
        let response = backend.analyze(clients, portfolio)?;

        if !response.success {
            return Err(ReminderError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        self.stats = response.stats;
        self.records = response.records;
        self.groups = group_by_client(&self.records);

        if self.records.is_empty() {
            let message = response
                .message
                .unwrap_or_else(|| "No invoices with an assigned email were found.".to_string());
            return Ok(Outcome::Empty(message));
        }

        Ok(Outcome::Analyzed {
            records: self.records.len(),
            clients: self.groups.len(),
        })
    }

    /// Replace the analysis with records obtained elsewhere
    pub fn set_records(&mut self, records: Vec<ReminderRecord>, stats: AnalysisStats) {
        self.groups = group_by_client(&records);
        self.records = records;
        self.stats = stats;
    }

    pub fn stats(&self) -> &AnalysisStats {
        &self.stats
    }

    pub fn groups(&self) -> &[ClientGroup] {
        &self.groups
    }

    /// Groups whose client name contains the filter text
    pub fn visible_groups(&self, filter: Option<&str>) -> Vec<&ClientGroup> {
        filter_groups(&self.groups, filter)
    }

    /// Overdue / upcoming partition of the current records
    pub fn split_view(&self) -> SplitGroups {
        split_by_status(&self.records)
    }

    /// Send reminders for the selected clients, at most `batch_size` clients
    /// per request. Batches go out one after another.
    ///
    /// If a batch fails after others went through, the error is
    /// `PartialSend` and carries what was already delivered.
    pub fn send(
        &self,
        backend: &dyn Backend,
        selection: &[ClientKey],
        batch_size: usize,
    ) -> Result<SendSummary> {
        if selection.is_empty() {
            return Err(ReminderError::NothingSelected);
        }
        if batch_size == 0 {
            return Err(ReminderError::InvalidBatchSize);
        }
        send_batches(backend, &self.records, selection, batch_size)
    }
}

fn send_batches(
    backend: &dyn Backend,
    records: &[ReminderRecord],
    selection: &[ClientKey],
    batch_size: usize,
) -> Result<SendSummary> {
    // One key per normalized client, so no record lands in two batches
    let keys = distinct_keys(selection);
    let batches = keys.chunks(batch_size);
    let count = batches.len();
    let mut summary = SendSummary::default();
    let mut sent_batches = 0;

    for (idx, clients) in batches.enumerate() {
        let batch = select_records(records, clients);
        if batch.is_empty() {
            warn!(batch = idx + 1, "selected clients have no invoices; batch skipped");
            continue;
        }
        info!(
            batch = idx + 1,
            of = count,
            clients = clients.len(),
            records = batch.len(),
            "sending batch"
        );
        match backend.send(&batch) {
            Ok(result) => {
                summary.merge(result);
                sent_batches += 1;
            }
            Err(err) if sent_batches == 0 => return Err(err),
            Err(err) => {
                warn!(batch = idx + 1, of = count, error = %err, "batch failed");
                return Err(ReminderError::PartialSend {
                    batch: idx + 1,
                    of: count,
                    delivered: Box::new(summary),
                    source: Box::new(err),
                });
            }
        }
    }

    Ok(summary)
}
