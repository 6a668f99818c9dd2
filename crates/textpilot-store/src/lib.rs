pub mod history_store;
pub mod keys;
pub mod settings_store;

pub use history_store::{HistoryEntry, HistoryStore, NewHistoryEntry, UsageStats, word_count};
pub use settings_store::{SettingChange, SettingsStore};
