//! Booking query agent.
//!
//! - `parser`: model-assisted interpreter behind the same contract as the
//!   rule-based parser, plus the factory that picks one from configuration
//! - `openai`: chat-completions transport for the model
//! - `runtime`: the `BookingQueryAgent` facade that interprets, summarizes and
//!   renders the answer
//!
//! The model only translates text into a date range and currency. Totals and
//! conversions are always computed deterministically by the core.

pub mod llm;
pub mod openai;
pub mod parser;
pub mod runtime;

pub use llm::{FunctionCall, FunctionCallRequest, FunctionSpec, LlmClient};
pub use openai::OpenAiClient;
pub use parser::{create_parser, LlmQueryParser};
pub use runtime::{render_message, BookingQueryAgent, HttpBookingQueryAgent};
