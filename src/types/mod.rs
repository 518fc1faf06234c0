//! 类型系统模块：网关对外暴露的统一数据类型。
//!
//! # Types Module
//!
//! Provider-agnostic types exchanged between the gateway and its callers. Nothing in here knows
//! about any vendor's wire format.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat turn with role, content and optional usage / stop reason |
//! | [`MessageRole`] | Closed role set (system, user, assistant) |
//! | [`GenerationParameters`] | Sparse, type-checked generation knobs |
//! | [`ChatRequest`] | One provider call: model, credentials, messages, parameters |
//!
//! ## Example
//!
//! ```rust
//! use ai_gateway::types::{ChatRequest, Credentials, GenerationParameters, Message};
//!
//! let mut request = ChatRequest::new("minimax", "abab5.5-chat");
//! request.credentials = Credentials::new("api-key", "group-id");
//! request.messages = vec![Message::system("Be brief."), Message::user("Hello")];
//! request.parameters = GenerationParameters::new().temperature(0.3);
//! ```

pub mod message;
pub mod params;
pub mod request;

pub use message::{Message, MessageBuilder, MessageRole, Usage};
pub use params::GenerationParameters;
pub use request::{ChatRequest, Credentials};
