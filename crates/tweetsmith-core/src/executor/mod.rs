//! ============================================================================
//! Executor Module - Outbound API Executors
//! ============================================================================
//! - CompletionExecutor: promo text via an OpenAI-compatible chat API (Groq)
//! - TwitterExecutor: profile lookup and posting via Twitter API v2
//! ============================================================================

mod completion;
mod twitter;

pub use completion::CompletionExecutor;
pub use twitter::TwitterExecutor;
