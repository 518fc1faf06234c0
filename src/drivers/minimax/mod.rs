//! MiniMax chatcompletion_pro 驱动：请求构建、响应解码与错误码映射
//!
//! MiniMax `chatcompletion_pro` driver. Differences from OpenAI-style APIs:
//! - The account (group) id is a query parameter of the endpoint URL.
//! - The system prompt travels as `bot_setting[0].content`, not as a message.
//! - Turns are `{sender_type, sender_name, text}` with `USER` / `BOT` senders.
//! - Failures arrive inside a 200 response as `base_resp.status_code != 0`.
//! - A streamed call ends with an envelope whose top-level `reply` holds the full text.
//! - Only `usage.total_tokens` is reported, so prompt tokens are always 0.

pub mod errors;
pub mod wire;

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::config::MinimaxConfig;
use crate::error::{Error, ErrorContext};
use crate::error_code::ErrorKind;
use crate::types::message::{Message, MessageBuilder, MessageRole, Usage};
use crate::types::request::ChatRequest;
use crate::Result;

use super::{DriverRequest, ProviderDriver, StreamStep};
use wire::{
    BotSetting, ChatCompletionProRequest, ChatCompletionProResponse, ReplyConstraints, SENDER_BOT,
    WEB_SEARCH_PLUGIN,
};

pub const PROVIDER_ID: &str = "minimax";
const CHAT_PATH: &str = "/v1/text/chatcompletion_pro";

#[derive(Debug, Clone)]
pub struct MinimaxDriver {
    config: MinimaxConfig,
    endpoint: Url,
}

impl MinimaxDriver {
    pub fn new(config: MinimaxConfig) -> Result<Self> {
        config.validate()?;
        let raw = format!("{}{}", config.base_url.trim_end_matches('/'), CHAT_PATH);
        let endpoint = Url::parse(&raw)
            .map_err(|e| Error::bad_request(format!("invalid MiniMax endpoint '{}': {}", raw, e)))?;
        Ok(Self { config, endpoint })
    }

    pub fn config(&self) -> &MinimaxConfig {
        &self.config
    }

    fn endpoint_for(&self, group_id: &str) -> String {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("GroupId", group_id);
        url.into()
    }

    fn final_message(envelope: &ChatCompletionProResponse, content: String) -> Message {
        let total = envelope.total_tokens();
        MessageBuilder::new(MessageRole::Assistant)
            .content(content)
            .usage(Usage {
                prompt_tokens: 0,
                completion_tokens: total,
                total_tokens: total,
            })
            .stop_reason(envelope.first_finish_reason())
            .build()
    }

    fn decode_envelope(payload: &[u8]) -> Result<ChatCompletionProResponse> {
        serde_json::from_slice(payload).map_err(|e| {
            let excerpt: String = String::from_utf8_lossy(payload).chars().take(256).collect();
            Error::with_context(
                ErrorKind::Unknown,
                format!("malformed MiniMax response: {}", e),
                ErrorContext::new()
                    .with_details(excerpt)
                    .with_source(PROVIDER_ID),
            )
        })
    }

    fn check_status(envelope: &ChatCompletionProResponse) -> Result<()> {
        match envelope.failure() {
            Some(status) => Err(errors::classify(status.status_code, &status.status_msg)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProviderDriver for MinimaxDriver {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn supported_models(&self) -> &[String] {
        &self.config.models
    }

    fn build_request(&self, request: &ChatRequest) -> Result<DriverRequest> {
        if !self.supports_model(&request.model) {
            return Err(Error::bad_request(format!("Invalid model: {}", request.model)));
        }

        if !request.credentials.is_complete() {
            return Err(Error::invalid_credentials("Invalid API key or group ID"));
        }

        let mut turns = request.messages.as_slice();
        if turns.is_empty() {
            return Err(Error::bad_request("at least one message required"));
        }

        let mut persona = self.config.default_persona.clone();
        if turns[0].role() == MessageRole::System {
            if !turns[0].content().is_empty() {
                persona = turns[0].content().to_string();
            }
            turns = &turns[1..];
        }

        if turns.is_empty() {
            return Err(Error::bad_request("at least one user message required"));
        }

        let bot_name = self.config.bot_name.as_str();
        let messages = turns
            .iter()
            .map(|m| wire::to_wire(m, bot_name))
            .collect::<Result<Vec<_>>>()?;

        if let Some(stop) = request.stop.as_ref().filter(|s| !s.is_empty()) {
            debug!(
                count = stop.len(),
                "chatcompletion_pro has no stop field; stop sequences ignored"
            );
        }

        let params = &request.parameters;
        let plugins = if params.enable_web_search {
            vec![WEB_SEARCH_PLUGIN.to_string()]
        } else {
            Vec::new()
        };

        let body = ChatCompletionProRequest {
            model: request.model.clone(),
            messages,
            bot_setting: vec![BotSetting {
                bot_name: bot_name.to_string(),
                content: persona,
            }],
            reply_constraints: ReplyConstraints {
                sender_type: SENDER_BOT.to_string(),
                sender_name: bot_name.to_string(),
            },
            stream: request.stream,
            tokens_to_generate: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            plugins,
        };

        let body = serde_json::to_value(&body)
            .map_err(|e| Error::bad_request(format!("failed to encode MiniMax body: {}", e)))?;

        let mut headers = HashMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", request.credentials.api_key),
        );

        Ok(DriverRequest {
            url: self.endpoint_for(&request.credentials.account_id),
            headers,
            body,
            stream: request.stream,
        })
    }

    fn parse_response(&self, body: &[u8]) -> Result<Message> {
        let envelope = Self::decode_envelope(body)?;
        Self::check_status(&envelope)?;

        let reply = envelope.reply.clone().ok_or_else(|| {
            Error::with_context(
                ErrorKind::Unknown,
                "MiniMax response carries no reply",
                ErrorContext::new().with_source(PROVIDER_ID),
            )
        })?;

        Ok(Self::final_message(&envelope, reply))
    }

    fn parse_stream_line(&self, payload: &str) -> Result<StreamStep> {
        let envelope = Self::decode_envelope(payload.as_bytes())?;
        Self::check_status(&envelope)?;

        if envelope.reply.as_deref().is_some_and(|r| !r.is_empty()) {
            return Ok(StreamStep::Final(Self::final_message(&envelope, String::new())));
        }

        let deltas = envelope
            .choices
            .iter()
            .filter_map(|c| c.delta_text())
            .map(Message::assistant)
            .collect();
        Ok(StreamStep::Deltas(deltas))
    }

    fn classify_error(&self, code: i64, message: &str) -> Error {
        errors::classify(code, message)
    }

    fn parse_error_envelope(&self, body: &[u8]) -> Option<Error> {
        let envelope: ChatCompletionProResponse = serde_json::from_slice(body).ok()?;
        envelope
            .failure()
            .map(|status| errors::classify(status.status_code, &status.status_msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::params::GenerationParameters;
    use crate::types::request::Credentials;
    use serde_json::json;

    fn driver() -> MinimaxDriver {
        MinimaxDriver::new(MinimaxConfig::default()).unwrap()
    }

    fn request(messages: Vec<Message>) -> ChatRequest {
        let mut req = ChatRequest::new(PROVIDER_ID, "abab5.5-chat");
        req.credentials = Credentials::new("sk-test", "1234567");
        req.messages = messages;
        req
    }

    #[test]
    fn test_build_request_url_and_auth() {
        let req = driver().build_request(&request(vec![Message::user("hi")])).unwrap();
        assert_eq!(
            req.url,
            "https://api.minimax.chat/v1/text/chatcompletion_pro?GroupId=1234567"
        );
        assert_eq!(req.headers["Authorization"], "Bearer sk-test");
        assert!(!req.stream);
    }

    #[test]
    fn test_build_request_body_shape() {
        let mut r = request(vec![Message::user("hi"), Message::assistant("hello")]);
        r.stream = true;
        r.parameters = GenerationParameters::new()
            .max_tokens(256)
            .temperature(0.7)
            .web_search(true);
        let body = driver().build_request(&r).unwrap().body;

        assert_eq!(body["model"], "abab5.5-chat");
        assert_eq!(body["stream"], true);
        assert_eq!(body["tokens_to_generate"], 256);
        assert_eq!(body["temperature"], 0.7);
        assert!(body.get("top_p").is_none());
        assert_eq!(body["plugins"], json!(["plugin_web_search"]));
        assert_eq!(
            body["bot_setting"],
            json!([{"bot_name": "专家", "content": "你是一个什么都懂的专家"}])
        );
        assert_eq!(
            body["reply_constraints"],
            json!({"sender_type": "BOT", "sender_name": "专家"})
        );
        assert_eq!(
            body["messages"],
            json!([
                {"sender_type": "USER", "sender_name": "我", "text": "hi"},
                {"sender_type": "BOT", "sender_name": "专家", "text": "hello"}
            ])
        );
    }

    #[test]
    fn test_empty_system_keeps_default_persona() {
        let r = request(vec![Message::system(""), Message::user("hi")]);
        let body = driver().build_request(&r).unwrap().body;
        assert_eq!(body["bot_setting"][0]["content"], "你是一个什么都懂的专家");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_validation_order() {
        let d = driver();

        let mut r = request(vec![]);
        r.model = "gpt-4".into();
        r.credentials = Credentials::default();
        assert_eq!(d.build_request(&r).unwrap_err().kind(), ErrorKind::BadRequest);

        let mut r = request(vec![]);
        r.credentials = Credentials::new("sk", "");
        assert_eq!(
            d.build_request(&r).unwrap_err().kind(),
            ErrorKind::InvalidCredentials
        );

        let err = d.build_request(&request(vec![])).unwrap_err();
        assert_eq!(err.message(), "at least one message required");
    }

    #[test]
    fn test_late_system_message_rejected() {
        let r = request(vec![Message::user("hi"), Message::system("late")]);
        let err = driver().build_request(&r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_parse_response() {
        let body = json!({
            "reply": "你好",
            "choices": [{"messages": [{"sender_type": "BOT", "text": "你好"}], "finish_reason": "stop"}],
            "usage": {"total_tokens": 42},
            "base_resp": {"status_code": 0, "status_msg": ""}
        });
        let msg = driver()
            .parse_response(body.to_string().as_bytes())
            .unwrap();
        assert_eq!(msg.role(), MessageRole::Assistant);
        assert_eq!(msg.content(), "你好");
        assert_eq!(
            msg.usage().copied(),
            Some(Usage {
                prompt_tokens: 0,
                completion_tokens: 42,
                total_tokens: 42
            })
        );
        assert_eq!(msg.stop_reason(), Some("stop"));
    }

    #[test]
    fn test_parse_response_vendor_error() {
        let body = json!({"base_resp": {"status_code": 1008, "status_msg": "insufficient balance"}});
        let err = driver()
            .parse_response(body.to_string().as_bytes())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(err.message(), "insufficient balance");
    }

    #[test]
    fn test_parse_response_garbled() {
        let err = driver().parse_response(b"<html>bad gateway</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);

        let err = driver().parse_response(b"{\"choices\": []}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_parse_stream_line_deltas() {
        let line = json!({
            "choices": [
                {"messages": [{"sender_type": "BOT", "text": "Hel"}]},
                {"messages": [{"sender_type": "BOT", "text": ""}]}
            ],
            "reply": ""
        });
        match driver().parse_stream_line(&line.to_string()).unwrap() {
            StreamStep::Deltas(d) => {
                assert_eq!(d, vec![Message::assistant("Hel")]);
                assert!(d[0].usage().is_none());
            }
            other => panic!("expected deltas, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_stream_line_final() {
        let line = json!({
            "reply": "Hello",
            "choices": [{"messages": [{"sender_type": "BOT", "text": "Hello"}], "finish_reason": "stop"}],
            "usage": {"total_tokens": 9},
            "base_resp": {"status_code": 0, "status_msg": "success"}
        });
        match driver().parse_stream_line(&line.to_string()).unwrap() {
            StreamStep::Final(m) => {
                assert_eq!(m.content(), "");
                assert_eq!(m.usage().map(|u| u.completion_tokens), Some(9));
                assert_eq!(m.stop_reason(), Some("stop"));
            }
            other => panic!("expected final, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_envelope() {
        let d = driver();
        let err = d
            .parse_error_envelope(br#"{"base_resp":{"status_code":1002,"status_msg":"rpm limit"}}"#)
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(d.parse_error_envelope(b"upstream connect error").is_none());
        assert!(d
            .parse_error_envelope(br#"{"base_resp":{"status_code":0,"status_msg":""}}"#)
            .is_none());
    }
}
