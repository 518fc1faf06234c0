//! # ai-gateway
//!
//! 统一的大模型厂商网关：把与厂商无关的请求翻译成具体厂商的线协议，并把响应与错误码还原为统一模型。
//!
//! Normalizing gateway for heterogeneous LLM provider APIs.
//!
//! ## Overview
//!
//! Callers build one provider-agnostic [`ChatRequest`] (model, credentials, messages,
//! generation parameters, stream flag). A provider driver translates it into the vendor's wire
//! format, the transport issues the HTTP call, and the driver translates the vendor's response,
//! or its vendor-specific error codes, back into a uniform [`Message`] / [`Error`].
//!
//! - **Uniform messages**: fully assembled [`Message`] values, never mutated after hand-out
//! - **Uniform errors**: a closed taxonomy ([`ErrorKind`]) shared by every provider
//! - **Streaming**: lazy, finite message streams; dropping one closes the connection
//! - **Pluggable drivers**: one [`drivers::ProviderDriver`] per vendor, selected by provider id
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_gateway::{Gateway, Message};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> ai_gateway::Result<()> {
//!     let gateway = Gateway::new()?;
//!
//!     let reply = gateway
//!         .chat("minimax", "abab5.5-chat")
//!         .credentials("your-api-key", "your-group-id")
//!         .messages(vec![Message::user("Hello")])
//!         .execute()
//!         .await?;
//!     println!("{}", reply.content());
//!
//!     let mut stream = gateway
//!         .chat("minimax", "abab5.5-chat")
//!         .credentials("your-api-key", "your-group-id")
//!         .message(Message::user("Tell me a story"))
//!         .execute_stream()
//!         .await?;
//!     while let Some(msg) = stream.next().await {
//!         print!("{}", msg?.content());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Gateway entry point and builders |
//! | [`drivers`] | Provider driver trait and the MiniMax driver |
//! | [`registry`] | Provider id to driver mapping |
//! | [`transport`] | HTTP transport with timeouts and pre-response retry |
//! | [`pipeline`] | Line framing and streamed response decoding |
//! | [`types`] | Messages, parameters and requests |
//! | [`callback`] | Retrieval query / hit-count side channel |
//! | [`config`] | Serde configuration with environment overrides |

pub mod callback;
pub mod client;
pub mod config;
pub mod drivers;
pub mod error_code;
pub mod pipeline;
pub mod registry;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{ChatRequestBuilder, ChatResponse, Gateway, GatewayBuilder};
pub use config::GatewayConfig;
pub use error_code::ErrorKind;
pub use pipeline::MessageStream;
pub use types::{
    message::{Message, MessageRole, Usage},
    params::GenerationParameters,
    request::{ChatRequest, Credentials},
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
