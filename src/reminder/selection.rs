use std::collections::HashSet;
use std::str::FromStr;

use super::group::{normalize_text, ClientGroup};
use super::record::ReminderRecord;
use crate::error::ReminderError;

/// A client picked for sending, identified by its name and email text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey {
    pub name: String,
    pub email: String,
}

impl ClientKey {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn of(group: &ClientGroup) -> Self {
        Self::new(group.client.clone(), group.client_email.clone())
    }

    /// The (name, email) pair as compared by `matches`
    pub fn normalized(&self) -> (String, String) {
        (
            normalize_text(Some(&self.name)),
            normalize_text(Some(&self.email)),
        )
    }

    /// Trim/case-insensitive match on both name and email
    pub fn matches(&self, client: &str, email: &str) -> bool {
        normalize_text(Some(&self.name)) == normalize_text(Some(client))
            && normalize_text(Some(&self.email)) == normalize_text(Some(email))
    }
}

impl FromStr for ClientKey {
    type Err = ReminderError;

    /// Parse "Name|email"; the email is everything after the last '|'
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (name, email) = input
            .rsplit_once('|')
            .ok_or_else(|| ReminderError::InvalidClientKey(input.to_string()))?;
        if name.trim().is_empty() || email.trim().is_empty() {
            return Err(ReminderError::InvalidClientKey(input.to_string()));
        }
        Ok(Self::new(name, email))
    }
}

/// Groups whose client name contains `filter` (case-insensitive)
pub fn filter_groups<'a>(groups: &'a [ClientGroup], filter: Option<&str>) -> Vec<&'a ClientGroup> {
    let needle = filter.unwrap_or("").to_lowercase();
    groups
        .iter()
        .filter(|g| g.client.to_lowercase().contains(&needle))
        .collect()
}

/// Pick clients among the visible groups.
///
/// With no `include` keys every visible group is selected. `exclude` keys are
/// removed afterwards. Keys naming a client that is not visible are ignored.
pub fn select_clients(
    visible: &[&ClientGroup],
    include: &[ClientKey],
    exclude: &[ClientKey],
) -> Vec<ClientKey> {
    visible
        .iter()
        .filter(|g| include.is_empty() || include.iter().any(|k| k.matches(&g.client, &g.client_email)))
        .filter(|g| !exclude.iter().any(|k| k.matches(&g.client, &g.client_email)))
        .map(|g| ClientKey::of(g))
        .collect()
}

/// Drop keys that match the same records as an earlier key.
///
/// Groups split on exact text, so `Acme|a@x.com` and `acme|a@x.com` are two
/// groups but pick the same records. Keeping one of them means each record
/// is claimed by exactly one key.
pub fn distinct_keys(selection: &[ClientKey]) -> Vec<ClientKey> {
    let mut seen = HashSet::new();
    selection
        .iter()
        .filter(|k| seen.insert(k.normalized()))
        .cloned()
        .collect()
}

/// Records belonging to any of the selected clients, in their original order
pub fn select_records(records: &[ReminderRecord], selection: &[ClientKey]) -> Vec<ReminderRecord> {
    records
        .iter()
        .filter(|r| selection.iter().any(|k| k.matches(&r.client, &r.client_email)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::group::group_by_client;
    use crate::reminder::group::tests::record;

    #[test]
    fn parses_name_email_pair() {
        let key: ClientKey = "Carnes del Valle|pagos@carnesvalle.co".parse().unwrap();
        assert_eq!(key.name, "Carnes del Valle");
        assert_eq!(key.email, "pagos@carnesvalle.co");

        let key: ClientKey = "A|B Ltda|b@x.com".parse().unwrap();
        assert_eq!(key.name, "A|B Ltda");

        assert!("no-separator".parse::<ClientKey>().is_err());
        assert!("|a@x.com".parse::<ClientKey>().is_err());
        assert!("Name| ".parse::<ClientKey>().is_err());
    }

    #[test]
    fn selection_matching_ignores_case_and_padding() {
        let records = vec![
            record("Acme", "Pagos@Acme.co", "vencido", 1.0),
            record("Other", "o@x.com", "vencido", 2.0),
            record("Acme", "pagos@acme.co", "proximo", 3.0),
        ];
        let selection = vec![ClientKey::new(" acme ", "PAGOS@acme.co ")];

        let picked = select_records(&records, &selection);
        assert_eq!(picked.len(), 2);
        assert!(picked.iter().all(|r| r.client == "Acme"));
    }

    #[test]
    fn selection_requires_both_name_and_email() {
        let records = vec![
            record("Acme", "a@x.com", "vencido", 1.0),
            record("Acme", "other@x.com", "vencido", 2.0),
        ];
        let picked = select_records(&records, &[ClientKey::new("Acme", "a@x.com")]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].client_email, "a@x.com");
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let groups = group_by_client(&[
            record("Carnes del Valle", "c@x.com", "vencido", 1.0),
            record("Supermercado Norte", "s@x.com", "vencido", 1.0),
        ]);

        let visible = filter_groups(&groups, Some("VALLE"));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].client, "Carnes del Valle");
        assert_eq!(filter_groups(&groups, None).len(), 2);
        assert!(filter_groups(&groups, Some("zzz")).is_empty());
    }

    #[test]
    fn default_selection_is_every_visible_client() {
        let groups = group_by_client(&[
            record("A", "a@x.com", "vencido", 1.0),
            record("B", "b@x.com", "vencido", 1.0),
            record("C", "c@x.com", "vencido", 1.0),
        ]);
        let visible = filter_groups(&groups, None);

        assert_eq!(select_clients(&visible, &[], &[]).len(), 3);

        let without_b = select_clients(&visible, &[], &[ClientKey::new("b", "B@x.com")]);
        assert_eq!(without_b.len(), 2);
        assert!(without_b.iter().all(|k| k.name != "B"));

        let only_c = select_clients(&visible, &[ClientKey::new("C", "c@x.com")], &[]);
        assert_eq!(only_c, vec![ClientKey::new("C", "c@x.com")]);
    }

    #[test]
    fn distinct_keys_collapse_case_variants() {
        let selection = vec![
            ClientKey::new("Acme", "a@x.com"),
            ClientKey::new("B", "b@x.com"),
            ClientKey::new(" acme", "A@X.com"),
        ];
        let distinct = distinct_keys(&selection);
        assert_eq!(
            distinct,
            vec![ClientKey::new("Acme", "a@x.com"), ClientKey::new("B", "b@x.com")]
        );
    }

    #[test]
    fn hidden_clients_cannot_be_selected() {
        let groups = group_by_client(&[
            record("Alpha", "a@x.com", "vencido", 1.0),
            record("Beta", "b@x.com", "vencido", 1.0),
        ]);
        let visible = filter_groups(&groups, Some("alpha"));
        let picked = select_clients(&visible, &[ClientKey::new("Beta", "b@x.com")], &[]);
        assert!(picked.is_empty());
    }
}
