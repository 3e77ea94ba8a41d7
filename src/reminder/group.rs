use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::record::{ReminderRecord, Status};

/// Per-client aggregate of reminders, keyed by (client name, client email)
#[derive(Debug, Clone)]
pub struct ClientGroup {
    pub client: String,
    pub client_email: String,
    pub seller: String,
    pub seller_email: String,
    pub branch: String,
    pub overdue: Vec<ReminderRecord>,
    pub upcoming: Vec<ReminderRecord>,
    pub not_due: Vec<ReminderRecord>,
    pub overdue_count: usize,
    pub upcoming_count: usize,
    pub not_due_count: usize,
    /// Records whose status tag is not one of the three known buckets
    pub unclassified_count: usize,
    pub total_invoices: usize,
    pub total_balance: f64,
    pub credit_limit: f64,
}

impl ClientGroup {
    fn new(record: &ReminderRecord) -> Self {
        Self {
            client: record.client.clone(),
            client_email: record.client_email.clone(),
            seller: record.seller.clone(),
            seller_email: record.seller_email.clone(),
            branch: record.branch.clone(),
            overdue: Vec::new(),
            upcoming: Vec::new(),
            not_due: Vec::new(),
            overdue_count: 0,
            upcoming_count: 0,
            not_due_count: 0,
            unclassified_count: 0,
            total_invoices: 0,
            total_balance: 0.0,
            credit_limit: record.credit_limit.unwrap_or(0.0),
        }
    }

    fn push(&mut self, record: &ReminderRecord) {
        match &record.status {
            Status::Overdue => {
                self.overdue.push(record.clone());
                self.overdue_count += 1;
            }
            Status::Upcoming => {
                self.upcoming.push(record.clone());
                self.upcoming_count += 1;
            }
            Status::NotDue => {
                self.not_due.push(record.clone());
                self.not_due_count += 1;
            }
            Status::Other(tag) => {
                warn!(
                    client = %record.client,
                    invoice = %record.invoice_number,
                    status = %tag,
                    "unrecognized status; invoice counted in totals only"
                );
                self.unclassified_count += 1;
            }
        }
        self.total_invoices += 1;
        self.total_balance += record.balance;
    }

    /// Credit limit minus total outstanding balance
    pub fn available_credit(&self) -> f64 {
        self.credit_limit - self.total_balance
    }
}

// Serialized by hand so JSON output also carries the derived available credit
impl Serialize for ClientGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ClientGroup", 17)?;
        state.serialize_field("client", &self.client)?;
        state.serialize_field("client_email", &self.client_email)?;
        state.serialize_field("seller", &self.seller)?;
        state.serialize_field("seller_email", &self.seller_email)?;
        state.serialize_field("branch", &self.branch)?;
        state.serialize_field("overdue", &self.overdue)?;
        state.serialize_field("upcoming", &self.upcoming)?;
        state.serialize_field("not_due", &self.not_due)?;
        state.serialize_field("overdue_count", &self.overdue_count)?;
        state.serialize_field("upcoming_count", &self.upcoming_count)?;
        state.serialize_field("not_due_count", &self.not_due_count)?;
        state.serialize_field("unclassified_count", &self.unclassified_count)?;
        state.serialize_field("total_invoices", &self.total_invoices)?;
        state.serialize_field("total_balance", &self.total_balance)?;
        state.serialize_field("credit_limit", &self.credit_limit)?;
        state.serialize_field("available_credit", &self.available_credit())?;
        state.end()
    }
}

/// Group records by exact client name + email, then order by overdue count
/// (descending, stable).
pub fn group_by_client(records: &[ReminderRecord]) -> Vec<ClientGroup> {
    let mut groups: Vec<ClientGroup> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for record in records {
        // Groups stay in first-encounter order for the stable sort below
        let idx = *index
            .entry((record.client.as_str(), record.client_email.as_str()))
            .or_insert_with(|| {
                groups.push(ClientGroup::new(record));
                groups.len() - 1
            });
        groups[idx].push(record);
    }

    groups.sort_by(|a, b| b.overdue_count.cmp(&a.overdue_count));

    debug!(
        records = records.len(),
        clients = groups.len(),
        "grouped reminders by client"
    );

    groups
}

/// Trim and lowercase text for selection matching; missing text is empty.
pub fn normalize_text(value: Option<&str>) -> String {
    match value {
        Some(text) => text.trim().to_lowercase(),
        None => String::new(),
    }
}
