//! HTTP clients for the engine's external collaborators.
//!
//! Each client wraps one `reqwest::Client` session constructed from config at
//! process start, and maps remote failures into the structured error kinds in
//! `convomap-core` at this boundary only.

mod embedding;
mod index;
mod store;

pub use embedding::HttpEmbeddingClient;
pub use index::HttpIndexService;
pub use store::HttpConversationStore;
