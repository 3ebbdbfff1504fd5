pub mod desktop;
pub mod info;
pub mod llm;
pub mod memory;
pub mod transcribe;

pub use desktop::{DesktopAction, DesktopControl, DisabledDesktop, SystemDesktop};
pub use llm::{IntentVerdict, LlmClient, LlmError};
pub use memory::ConversationMemory;
pub use transcribe::{TranscribeError, Transcriber};
