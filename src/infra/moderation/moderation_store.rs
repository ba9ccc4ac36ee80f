// Implementations for the moderation ports.

pub mod content_record;
pub mod in_memory;
pub mod notifier;
pub mod sqlite_content;
pub mod sqlite_store;

// Re-export for convenience
pub use in_memory::{InMemoryContentAdapter, InMemoryModerationStore};
pub use notifier::LogNotifier;
pub use sqlite_store::SqliteModerationDb;
