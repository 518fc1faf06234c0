//! 网关入口：请求构建、调用执行与响应分发。
//!
//! Gateway entry point. [`Gateway::invoke`] takes a provider-agnostic [`crate::ChatRequest`]
//! and returns either one message or a lazy stream of them; [`ChatRequestBuilder`] is the
//! fluent front-end for the same call.

pub mod builder;
pub mod chat;
pub mod core;

pub use builder::GatewayBuilder;
pub use chat::ChatRequestBuilder;
pub use self::core::{ChatResponse, Gateway, REQUEST_ID_HEADER};
