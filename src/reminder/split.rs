use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use super::record::{ReminderRecord, Status};

/// Due dates arrive as `dd/mm/yyyy`
const DUE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Per-client group inside a single status partition
#[derive(Debug, Clone, Serialize)]
pub struct StatusGroup {
    pub client: String,
    pub client_email: String,
    pub seller: String,
    pub seller_email: String,
    pub branch: String,
    pub invoices: Vec<ReminderRecord>,
    pub total_balance: f64,
    pub earliest_due: Option<NaiveDate>,
}

/// Overdue and upcoming reminders partitioned into their own client lists
#[derive(Debug, Clone, Serialize, Default)]
pub struct SplitGroups {
    pub overdue: Vec<StatusGroup>,
    pub upcoming: Vec<StatusGroup>,
}

pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DUE_DATE_FORMAT).ok()
}

/// Partition records into overdue and upcoming client groups, each ordered by
/// earliest due date. Not-due and unrecognized records are left out.
pub fn split_by_status(records: &[ReminderRecord]) -> SplitGroups {
    let overdue: Vec<&ReminderRecord> = records
        .iter()
        .filter(|r| r.status == Status::Overdue)
        .collect();
    let upcoming: Vec<&ReminderRecord> = records
        .iter()
        .filter(|r| r.status == Status::Upcoming)
        .collect();

    SplitGroups {
        overdue: group_partition(&overdue),
        upcoming: group_partition(&upcoming),
    }
}

fn group_partition(records: &[&ReminderRecord]) -> Vec<StatusGroup> {
    let mut groups: Vec<StatusGroup> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for record in records {
        let idx = *index
            .entry((record.client.as_str(), record.client_email.as_str()))
            .or_insert_with(|| {
                groups.push(StatusGroup {
                    client: record.client.clone(),
                    client_email: record.client_email.clone(),
                    seller: record.seller.clone(),
                    seller_email: record.seller_email.clone(),
                    branch: record.branch.clone(),
                    invoices: Vec::new(),
                    total_balance: 0.0,
                    earliest_due: None,
                });
                groups.len() - 1
            });

        let group = &mut groups[idx];
        group.invoices.push((*record).clone());
        group.total_balance += record.balance;
        if let Some(due) = parse_due_date(&record.due_date) {
            group.earliest_due = Some(match group.earliest_due {
                Some(current) => current.min(due),
                None => due,
            });
        }
    }

    // Undated groups go last
    groups.sort_by_key(|g| (g.earliest_due.is_none(), g.earliest_due));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::group::tests::record;

    fn due(mut r: ReminderRecord, date: &str) -> ReminderRecord {
        r.due_date = date.to_string();
        r
    }

    #[test]
    fn parses_day_month_year() {
        assert_eq!(
            parse_due_date("05/11/2026"),
            NaiveDate::from_ymd_opt(2026, 11, 5)
        );
        assert_eq!(parse_due_date("2026-11-05"), None);
        assert_eq!(parse_due_date("N/A"), None);
    }

    #[test]
    fn partitions_and_orders_by_earliest_due_date() {
        let records = vec![
            due(record("Late", "l@x.com", "vencido", 10.0), "20/09/2026"),
            due(record("Early", "e@x.com", "vencido", 20.0), "02/09/2026"),
            due(record("Late", "l@x.com", "vencido", 30.0), "01/08/2026"),
            due(record("Soon", "s@x.com", "proximo", 40.0), "21/10/2026"),
            due(record("Calm", "c@x.com", "no_vencido", 50.0), "30/12/2026"),
        ];

        let split = split_by_status(&records);
        let overdue: Vec<&str> = split.overdue.iter().map(|g| g.client.as_str()).collect();
        assert_eq!(overdue, ["Late", "Early"]);
        assert_eq!(split.overdue[0].total_balance, 40.0);
        assert_eq!(split.overdue[0].earliest_due, NaiveDate::from_ymd_opt(2026, 8, 1));

        assert_eq!(split.upcoming.len(), 1);
        assert_eq!(split.upcoming[0].client, "Soon");
    }

    #[test]
    fn undated_groups_sort_last_in_encounter_order() {
        let records = vec![
            due(record("NoDateA", "a@x.com", "proximo", 1.0), "N/A"),
            due(record("Dated", "d@x.com", "proximo", 1.0), "25/10/2026"),
            due(record("NoDateB", "b@x.com", "proximo", 1.0), ""),
        ];

        let split = split_by_status(&records);
        let order: Vec<&str> = split.upcoming.iter().map(|g| g.client.as_str()).collect();
        assert_eq!(order, ["Dated", "NoDateA", "NoDateB"]);
        assert!(split.overdue.is_empty());
    }

    #[test]
    fn empty_input_gives_empty_partitions() {
        let split = split_by_status(&[]);
        assert!(split.overdue.is_empty() && split.upcoming.is_empty());
    }
}
