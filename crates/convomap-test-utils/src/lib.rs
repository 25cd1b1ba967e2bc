//! Test helpers shared across convomap crates.

pub mod embedder;
pub mod fixtures;
pub mod index;
pub mod reporter;
pub mod store;

pub use embedder::FixedEmbedder;
pub use fixtures::{conversation, historical_rows, message};
pub use index::StubIndexService;
pub use reporter::RecordingReporter;
pub use store::StubConversationStore;
