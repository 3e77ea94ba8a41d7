pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod reminder;
pub mod render;
pub mod session;

pub use backend::{Backend, HttpBackend, SendSummary};
pub use config::{Config, ViewMode};
pub use error::{ReminderError, Result};
pub use reminder::{group_by_client, normalize_text, ClientGroup, ClientKey, ReminderRecord};
pub use session::{Session, Slot};
