use crate::pipeline::MessageStream;
use crate::types::message::Message;
use crate::types::params::GenerationParameters;
use crate::types::request::{ChatRequest, Credentials};
use crate::Result;
use serde_json::Value;

use super::core::Gateway;

/// Builder for chat requests.
pub struct ChatRequestBuilder<'a> {
    gateway: &'a Gateway,
    request: ChatRequest,
}

impl<'a> ChatRequestBuilder<'a> {
    pub(crate) fn new(gateway: &'a Gateway, request: ChatRequest) -> Self {
        Self { gateway, request }
    }

    pub fn credentials(
        mut self,
        api_key: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        self.request.credentials = Credentials::new(api_key, account_id);
        self
    }

    /// Replace the conversation.
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.request.messages = messages;
        self
    }

    /// Append one message.
    pub fn message(mut self, message: Message) -> Self {
        self.request.messages.push(message);
        self
    }

    pub fn parameters(mut self, parameters: GenerationParameters) -> Self {
        self.request.parameters = parameters;
        self
    }

    /// Take parameters from a loosely typed JSON object; mistyped entries are dropped.
    pub fn parameters_json(mut self, parameters: &Value) -> Self {
        self.request.parameters = GenerationParameters::from_value(parameters);
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.request.parameters.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.request.parameters.max_tokens = Some(max);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.request.parameters.top_p = Some(top_p);
        self
    }

    pub fn web_search(mut self, enable: bool) -> Self {
        self.request.parameters.enable_web_search = enable;
        self
    }

    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.request.stop = Some(stop);
        self
    }

    /// Caller identity, used for log correlation.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.request.user = Some(user.into());
        self
    }

    /// Enable streaming.
    pub fn stream(mut self) -> Self {
        self.request.stream = true;
        self
    }

    pub fn into_request(self) -> ChatRequest {
        self.request
    }

    /// Execute the request and return one aggregated message.
    ///
    /// With streaming enabled the stream is drained and collected.
    pub async fn execute(self) -> Result<Message> {
        self.gateway.invoke(self.request).await?.collect().await
    }

    /// Execute the request as a streamed call.
    pub async fn execute_stream(mut self) -> Result<MessageStream> {
        self.request.stream = true;
        Ok(self.gateway.invoke(self.request).await?.into_stream())
    }
}
