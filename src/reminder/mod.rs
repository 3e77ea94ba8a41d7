mod group;
mod record;
mod selection;
mod split;

pub use group::{group_by_client, normalize_text, ClientGroup};
pub use record::{ReminderRecord, Status};
pub use selection::{distinct_keys, filter_groups, select_clients, select_records, ClientKey};
pub use split::{parse_due_date, split_by_status, SplitGroups, StatusGroup};
