//! Terminal views over grouped reminders.
//!
//! Each table has its own row type; the reminder model itself carries no
//! formatting.

use tabled::{settings::Style, Table, Tabled};

use crate::backend::{AnalysisStats, SendSummary, SmtpCheck};
use crate::config::DisplaySettings;
use crate::reminder::{ClientGroup, ReminderRecord, SplitGroups, Status, StatusGroup};
use crate::session::SpreadsheetFile;

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "SELLER")]
    seller: String,
    #[tabled(rename = "INVOICES")]
    invoices: usize,
    #[tabled(rename = "OVERDUE")]
    overdue: usize,
    #[tabled(rename = "UPCOMING")]
    upcoming: usize,
    #[tabled(rename = "NOT DUE")]
    not_due: usize,
    #[tabled(rename = "BALANCE")]
    balance: String,
    #[tabled(rename = "AVAILABLE CREDIT")]
    available: String,
}

#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "INVOICE")]
    number: String,
    #[tabled(rename = "ISSUED")]
    issued: String,
    #[tabled(rename = "DUE")]
    due: String,
    #[tabled(rename = "DAYS")]
    days: i64,
    #[tabled(rename = "BALANCE")]
    balance: String,
    #[tabled(rename = "BRANCH")]
    branch: String,
}

#[derive(Tabled)]
struct StatusGroupRow {
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "SELLER")]
    seller: String,
    #[tabled(rename = "INVOICES")]
    invoices: usize,
    #[tabled(rename = "EARLIEST DUE")]
    earliest_due: String,
    #[tabled(rename = "BALANCE")]
    balance: String,
}

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "RECIPIENT")]
    recipient: String,
    #[tabled(rename = "INVOICES")]
    invoices: usize,
    #[tabled(rename = "ERROR")]
    error: String,
}

/// Whole currency units with grouped thousands, e.g. `$1.250.000`
pub fn format_money(value: f64, display: &DisplaySettings) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(&display.thousands_separator);
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}{}{grouped}", display.currency_symbol)
}

/// Human-readable size in Bytes/KB/MB/GB (1024 based, at most two decimals)
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

pub fn render_loaded_file(label: &str, file: &SpreadsheetFile) -> String {
    format!(
        "✓ {label}: {} ({})",
        file.name,
        format_file_size(file.size())
    )
}

pub fn render_stats(stats: &AnalysisStats) -> String {
    format!(
        "Invoices: {}  |  Overdue: {}  |  Upcoming: {}  |  Not due: {}",
        stats.total, stats.overdue, stats.upcoming, stats.not_due
    )
}

/// One row per client, numbered for reference
pub fn render_clients(groups: &[&ClientGroup], display: &DisplaySettings) -> String {
    let rows: Vec<ClientRow> = groups
        .iter()
        .enumerate()
        .map(|(idx, g)| ClientRow {
            index: idx + 1,
            client: g.client.clone(),
            email: g.client_email.clone(),
            seller: g.seller.clone(),
            invoices: g.total_invoices,
            overdue: g.overdue_count,
            upcoming: g.upcoming_count,
            not_due: g.not_due_count,
            balance: format_money(g.total_balance, display),
            available: format_money(g.available_credit(), display),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_invoices(invoices: &[ReminderRecord], display: &DisplaySettings) -> String {
    let rows: Vec<InvoiceRow> = invoices
        .iter()
        .map(|r| InvoiceRow {
            number: r.invoice_number.clone(),
            issued: r.issue_date.clone(),
            due: r.due_date.clone(),
            days: r.days,
            balance: format_money(r.balance, display),
            branch: if r.branch.is_empty() {
                "N/A".to_string()
            } else {
                r.branch.clone()
            },
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Invoice tables for one client, one per non-empty bucket, with subtotals
pub fn render_client_details(group: &ClientGroup, display: &DisplaySettings) -> String {
    let buckets = [
        (Status::Overdue, &group.overdue),
        (Status::Upcoming, &group.upcoming),
        (Status::NotDue, &group.not_due),
    ];

    let mut out = format!(
        "{} <{}>  seller: {}",
        group.client, group.client_email, group.seller
    );
    for (title, invoices) in buckets {
        if invoices.is_empty() {
            continue;
        }
        let subtotal: f64 = invoices.iter().map(|r| r.balance).sum();
        out.push_str(&format!("\n\n{} ({})\n", title, invoices.len()));
        out.push_str(&render_invoices(invoices, display));
        out.push_str(&format!("\nSubtotal: {}", format_money(subtotal, display)));
    }
    if group.unclassified_count > 0 {
        out.push_str(&format!(
            "\n\n{} invoice(s) with an unrecognized status are included in the totals only",
            group.unclassified_count
        ));
    }
    out
}

fn render_status_groups(groups: &[StatusGroup], display: &DisplaySettings) -> String {
    let rows: Vec<StatusGroupRow> = groups
        .iter()
        .map(|g| StatusGroupRow {
            client: g.client.clone(),
            email: g.client_email.clone(),
            seller: g.seller.clone(),
            invoices: g.invoices.len(),
            earliest_due: g
                .earliest_due
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            balance: format_money(g.total_balance, display),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Overdue and upcoming client tables, ordered by earliest due date
pub fn render_split(split: &SplitGroups, display: &DisplaySettings) -> String {
    let mut out = String::new();
    let sections = [
        (Status::Overdue, &split.overdue),
        (Status::Upcoming, &split.upcoming),
    ];
    for (title, groups) in sections {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&format!("{} ({} clients)\n", title, groups.len()));
        if groups.is_empty() {
            out.push_str("  none");
        } else {
            out.push_str(&render_status_groups(groups, display));
        }
    }
    out
}

pub fn render_send_summary(summary: &SendSummary) -> String {
    let mut out = format!(
        "Emails: {}  |  Sent: {}  |  Failed: {}",
        summary.total, summary.succeeded, summary.failed
    );

    let rows: Vec<FailureRow> = summary
        .failures()
        .map(|r| FailureRow {
            client: r.client.clone().unwrap_or_default(),
            recipient: r.recipient.clone().unwrap_or_default(),
            invoices: r.invoices,
            error: r.error.clone().unwrap_or_else(|| "unknown".to_string()),
        })
        .collect();

    if !rows.is_empty() {
        out.push_str("\n\nFailed deliveries:\n");
        out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
    }
    out
}

pub fn render_smtp_check(check: &SmtpCheck) -> String {
    let mut out = if check.success {
        format!("SMTP OK: {}", check.message.as_deref().unwrap_or("test email sent"))
    } else {
        format!(
            "SMTP FAILED: {}",
            check.message.as_deref().unwrap_or("test email not sent")
        )
    };
    if let Some(error) = &check.error {
        out.push_str(&format!("\n  Error: {error}"));
    }
    match &check.details {
        Some(serde_json::Value::Object(map)) => {
            for (key, value) in map {
                let value = value
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string());
                out.push_str(&format!("\n  {key}: {value}"));
            }
        }
        Some(serde_json::Value::String(text)) => out.push_str(&format!("\n  {text}")),
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::{group_by_client, split_by_status, ReminderRecord};

    fn display() -> DisplaySettings {
        DisplaySettings::default()
    }

    fn record(client: &str, status: &str, balance: f64, due: &str) -> ReminderRecord {
        serde_json::from_value(serde_json::json!({
            "cliente": client,
            "correo_cliente": format!("{}@x.com", client.to_lowercase()),
            "vendedor": "Laura",
            "numero_factura": format!("FE-{}", balance),
            "fecha_vencimiento": due,
            "dias": -2,
            "estado": status,
            "saldo_numerico": balance,
            "cupo": 1000000.0,
        }))
        .unwrap()
    }

    #[test]
    fn formats_money_with_thousands_separator() {
        assert_eq!(format_money(0.0, &display()), "$0");
        assert_eq!(format_money(999.4, &display()), "$999");
        assert_eq!(format_money(1250000.0, &display()), "$1.250.000");
        assert_eq!(format_money(-45300.6, &display()), "-$45.301");

        let usd = DisplaySettings {
            currency_symbol: "US$".to_string(),
            thousands_separator: ",".to_string(),
            ..DisplaySettings::default()
        };
        assert_eq!(format_money(1234567.0, &usd), "US$1,234,567");
    }

    #[test]
    fn formats_file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(1_288_490_189), "1.2 GB");
    }

    #[test]
    fn client_table_lists_counts_and_credit() {
        let groups = group_by_client(&[
            record("Acme", "vencido", 400000.0, "01/10/2026"),
            record("Acme", "proximo", 100000.0, "20/10/2026"),
        ]);
        let visible: Vec<&ClientGroup> = groups.iter().collect();
        let table = render_clients(&visible, &display());
        assert!(table.contains("CLIENT"));
        assert!(table.contains("Acme"));
        assert!(table.contains("acme@x.com"));
        assert!(table.contains("$500.000"));
    }

    #[test]
    fn details_skip_empty_buckets() {
        let groups = group_by_client(&[
            record("Acme", "vencido", 400.0, "01/10/2026"),
            record("Acme", "vencido", 100.0, "02/10/2026"),
        ]);
        let details = render_client_details(&groups[0], &display());
        assert!(details.contains("OVERDUE (2)"));
        assert!(details.contains("Subtotal: $500"));
        assert!(!details.contains("UPCOMING"));
        assert!(!details.contains("NOT DUE"));
    }

    #[test]
    fn split_view_marks_empty_partitions() {
        let split = split_by_status(&[record("Acme", "vencido", 1.0, "01/10/2026")]);
        let out = render_split(&split, &display());
        assert!(out.contains("OVERDUE (1 clients)"));
        assert!(out.contains("01/10/2026"));
        assert!(out.contains("UPCOMING (0 clients)\n  none"));
    }

    #[test]
    fn send_summary_lists_failures_only() {
        let summary: SendSummary = serde_json::from_str(
            r#"{"total": 2, "exitosos": 1, "fallidos": 1, "resultados": [
                {"destinatario": "a@x.com", "cliente": "Acme", "facturas": 2, "success": true},
                {"destinatario": "bad", "cliente": "Beta", "facturas": 1, "success": false,
                 "error": "invalid recipient"}
            ]}"#,
        )
        .unwrap();
        let out = render_send_summary(&summary);
        assert!(out.starts_with("Emails: 2  |  Sent: 1  |  Failed: 1"));
        assert!(out.contains("invalid recipient"));
        assert!(!out.contains("Acme"));
    }

    #[test]
    fn smtp_check_shows_details() {
        let check: SmtpCheck = serde_json::from_str(
            r#"{"success": true, "message": "sent", "detalles": {"servidor": "smtp.gmail.com", "puerto": 587}}"#,
        )
        .unwrap();
        let out = render_smtp_check(&check);
        assert!(out.starts_with("SMTP OK: sent"));
        assert!(out.contains("servidor: smtp.gmail.com"));
        assert!(out.contains("puerto: 587"));
    }
}
