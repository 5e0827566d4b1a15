// LLM abstraction layer

pub mod provider;
pub mod openai;
pub mod tools;
pub mod invoker;

pub use provider::*;
pub use tools::{Tool, ToolSet};
pub use invoker::{CompletionInvoker, GenerationParams, StageResult, StageWarning};
pub use crate::types::*;
