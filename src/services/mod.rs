// Service exports
pub mod conversations;
pub mod llm;
pub mod profiles;
pub mod session;

pub use conversations::{parse_conversation, placeholder_conversation, ConversationSimulator};
pub use llm::{ChatCompletion, ChatMessage, ChatRequest, LlmError, OpenAiClient};
pub use profiles::ProfileGenerator;
pub use session::{OperationGuard, Progress, SessionError, SessionSnapshot, SessionStore};
