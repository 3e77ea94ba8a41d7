use serde::{Deserialize, Serialize};
use std::fmt;

/// Due-date classification of a reminder, as tagged by the backend.
///
/// Unknown tags are kept verbatim in `Other` so the record can be sent back
/// to the backend unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Overdue,
    Upcoming,
    NotDue,
    Other(String),
}

impl Status {
    pub fn as_tag(&self) -> &str {
        match self {
            Status::Overdue => "vencido",
            Status::Upcoming => "proximo",
            Status::NotDue => "no_vencido",
            Status::Other(tag) => tag,
        }
    }
}

impl From<String> for Status {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "vencido" => Status::Overdue,
            "proximo" => Status::Upcoming,
            "no_vencido" => Status::NotDue,
            _ => Status::Other(tag),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_tag().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Overdue => write!(f, "OVERDUE"),
            Status::Upcoming => write!(f, "UPCOMING"),
            Status::NotDue => write!(f, "NOT DUE"),
            Status::Other(tag) => write!(f, "?{tag}"),
        }
    }
}

/// One invoice line returned by the analysis endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    #[serde(rename = "cliente")]
    pub client: String,
    #[serde(rename = "correo_cliente")]
    pub client_email: String,
    #[serde(rename = "vendedor", default)]
    pub seller: String,
    #[serde(rename = "correo_vendedor", default)]
    pub seller_email: String,
    #[serde(rename = "local", default)]
    pub branch: String,
    #[serde(rename = "numero_factura", default)]
    pub invoice_number: String,
    #[serde(rename = "fecha_emision", default)]
    pub issue_date: String,
    /// Formatted as `dd/mm/yyyy`
    #[serde(rename = "fecha_vencimiento", default)]
    pub due_date: String,
    /// Days until due; zero or negative means due today or overdue
    #[serde(rename = "dias", default)]
    pub days: i64,
    #[serde(rename = "saldo", default)]
    pub balance_display: String,
    #[serde(rename = "saldo_numerico", default)]
    pub balance: f64,
    #[serde(rename = "estado")]
    pub status: Status,
    #[serde(rename = "cupo", default, skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_record() {
        let json = r#"{
            "cliente": "Carnes del Valle",
            "correo_cliente": "pagos@carnesvalle.co",
            "vendedor": "Laura",
            "correo_vendedor": "laura@lomarosa.co",
            "local": "Cali",
            "numero_factura": "FE-1001",
            "fecha_emision": "01/09/2026",
            "fecha_vencimiento": "01/10/2026",
            "dias": -17,
            "saldo": "$1,250,000",
            "saldo_numerico": 1250000.0,
            "estado": "vencido",
            "badge_class": "badge-danger",
            "cupo": 5000000
        }"#;

        let record: ReminderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.client, "Carnes del Valle");
        assert_eq!(record.status, Status::Overdue);
        assert_eq!(record.days, -17);
        assert_eq!(record.credit_limit, Some(5_000_000.0));
    }

    #[test]
    fn unknown_status_survives_reserialization() {
        let json = r#"{"cliente":"A","correo_cliente":"a@x.com","estado":"anulado"}"#;
        let record: ReminderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, Status::Other("anulado".to_string()));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["estado"], "anulado");
        assert!(value.get("cupo").is_none());
    }

    #[test]
    fn known_tags_map_both_ways() {
        for tag in ["vencido", "proximo", "no_vencido"] {
            let status = Status::from(tag.to_string());
            assert!(!matches!(status, Status::Other(_)));
            assert_eq!(String::from(status), tag);
        }
    }

    #[test]
    fn status_labels() {
        assert_eq!(Status::NotDue.to_string(), "NOT DUE");
        assert_eq!(Status::Other("anulado".to_string()).to_string(), "?anulado");
    }
}
