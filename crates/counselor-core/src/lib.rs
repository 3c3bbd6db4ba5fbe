pub mod ai;
pub mod config;
pub mod controller;
pub mod error;
pub mod state;

// Re-export main types for convenience
pub use ai::{ChatBackend, ChatRequest, CounselorClient};
pub use config::Config;
pub use controller::ConversationController;
pub use error::RequestFailure;
pub use state::{
    ConversationState, Message, RenderState, ScrollTarget, Sender, DEFAULT_GREETING,
    FALLBACK_MESSAGE,
};
