//! MiniMax chatcompletion_pro wire format.

use serde::{Deserialize, Serialize};

use crate::types::message::{Message, MessageRole};
use crate::{Error, Result};

pub const SENDER_USER: &str = "USER";
pub const SENDER_BOT: &str = "BOT";
/// Sender name used for every user turn.
pub const USER_SENDER_NAME: &str = "我";
pub const WEB_SEARCH_PLUGIN: &str = "plugin_web_search";

/// One conversation turn as MiniMax expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimaxMessage {
    pub sender_type: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub text: String,
}

/// Translate a uniform turn into a MiniMax turn spoken by `bot_name` or the user.
///
/// System messages never reach the wire; they are folded into `bot_setting` beforehand.
pub fn to_wire(message: &Message, bot_name: &str) -> Result<MinimaxMessage> {
    if message.content().is_empty() {
        return Err(Error::bad_request(format!(
            "{} message content must not be empty",
            message.role()
        )));
    }

    let (sender_type, sender_name) = match message.role() {
        MessageRole::User => (SENDER_USER, USER_SENDER_NAME),
        MessageRole::Assistant => (SENDER_BOT, bot_name),
        MessageRole::System => {
            return Err(Error::bad_request(
                "system message is only supported as the first message",
            ))
        }
    };

    Ok(MinimaxMessage {
        sender_type: sender_type.to_string(),
        sender_name: sender_name.to_string(),
        text: message.content().to_string(),
    })
}

/// Translate a MiniMax turn back into a uniform message.
pub fn from_wire(message: MinimaxMessage) -> Result<Message> {
    let role = match message.sender_type.as_str() {
        SENDER_USER => MessageRole::User,
        SENDER_BOT => MessageRole::Assistant,
        other => {
            return Err(Error::bad_request(format!(
                "unknown MiniMax sender_type: {}",
                other
            )))
        }
    };
    Ok(Message::new(role, message.text))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotSetting {
    pub bot_name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyConstraints {
    pub sender_type: String,
    pub sender_name: String,
}

/// Request body of `POST /v1/text/chatcompletion_pro`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionProRequest {
    pub model: String,
    pub messages: Vec<MinimaxMessage>,
    pub bot_setting: Vec<BotSetting>,
    pub reply_constraints: ReplyConstraints,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_to_generate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,
}

/// Response envelope; the same shape is used for full responses and for each streamed line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionProResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<UsageBlock>,
    #[serde(default)]
    pub base_resp: Option<BaseResp>,
}

impl ChatCompletionProResponse {
    /// Vendor status, when the envelope reports a failure.
    pub fn failure(&self) -> Option<&BaseResp> {
        self.base_resp.as_ref().filter(|b| b.status_code != 0)
    }

    pub fn total_tokens(&self) -> u64 {
        self.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0)
    }

    pub fn first_finish_reason(&self) -> Option<String> {
        self.choices.first().and_then(|c| c.finish_reason.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub messages: Vec<ChoiceMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl Choice {
    /// Text of the first message in this choice, if non-empty.
    pub fn delta_text(&self) -> Option<&str> {
        self.messages
            .first()
            .map(|m| m.text.as_str())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub sender_type: Option<String>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UsageBlock {
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseResp {
    pub status_code: i64,
    #[serde(default)]
    pub status_msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_code::ErrorKind;

    #[test]
    fn test_user_and_bot_senders() {
        let user = to_wire(&Message::user("hi"), "专家").unwrap();
        assert_eq!(user.sender_type, "USER");
        assert_eq!(user.sender_name, "我");

        let bot = to_wire(&Message::assistant("hello"), "专家").unwrap();
        assert_eq!(bot.sender_type, "BOT");
        assert_eq!(bot.sender_name, "专家");
    }

    #[test]
    fn test_empty_content_rejected() {
        let err = to_wire(&Message::user(""), "专家").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_system_not_sent_on_wire() {
        let err = to_wire(&Message::system("persona"), "专家").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_unknown_sender_type_rejected() {
        let err = from_wire(MinimaxMessage {
            sender_type: "FUNCTION".into(),
            sender_name: "search".into(),
            text: "{}".into(),
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_inbound_empty_text_is_valid() {
        let msg = from_wire(MinimaxMessage {
            sender_type: "BOT".into(),
            sender_name: String::new(),
            text: String::new(),
        })
        .unwrap();
        assert_eq!(msg.role(), MessageRole::Assistant);
        assert_eq!(msg.content(), "");
    }

    #[test]
    fn test_request_omits_absent_knobs() {
        let body = ChatCompletionProRequest {
            model: "abab5.5-chat".into(),
            messages: vec![],
            bot_setting: vec![],
            reply_constraints: ReplyConstraints {
                sender_type: SENDER_BOT.into(),
                sender_name: "专家".into(),
            },
            stream: false,
            tokens_to_generate: None,
            temperature: None,
            top_p: None,
            plugins: vec![],
        };
        let v = serde_json::to_value(&body).unwrap();
        assert!(v.get("temperature").is_none());
        assert!(v.get("plugins").is_none());
        assert_eq!(v["stream"], false);
    }
}
