//! Conversation types for the Realtime API.
//!
//! Client-side items ([`Item`]) are strict: each message role only accepts
//! the content parts that role may carry, so an assistant message holding
//! input audio does not type-check. Server-side items ([`ResponseItem`]) are
//! lenient mirrors of what the server reports.

use serde::{Deserialize, Serialize};

// ============================================================================
// Shared Enums
// ============================================================================

/// Status of a conversation item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    InProgress,
    Completed,
    Incomplete,
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

// ============================================================================
// Content Parts (client items)
// ============================================================================

/// Text supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTextContentPart {
    pub text: String,
}

/// Audio supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioContentPart {
    /// Base64-encoded audio
    pub audio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

/// Text attributed to the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTextContentPart {
    pub text: String,
}

/// Content allowed in system messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemContentPart {
    #[serde(rename = "input_text")]
    InputText(InputTextContentPart),
}

/// Content allowed in user messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserContentPart {
    InputText(InputTextContentPart),
    InputAudio(InputAudioContentPart),
}

/// Content allowed in assistant messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AssistantContentPart {
    #[serde(rename = "text")]
    Text(OutputTextContentPart),
}

impl InputTextContentPart {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl InputAudioContentPart {
    pub fn new(audio: impl Into<String>) -> Self {
        Self {
            audio: audio.into(),
            transcript: None,
        }
    }
}

impl OutputTextContentPart {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<InputTextContentPart> for SystemContentPart {
    fn from(part: InputTextContentPart) -> Self {
        Self::InputText(part)
    }
}

impl From<InputTextContentPart> for UserContentPart {
    fn from(part: InputTextContentPart) -> Self {
        Self::InputText(part)
    }
}

impl From<InputAudioContentPart> for UserContentPart {
    fn from(part: InputAudioContentPart) -> Self {
        Self::InputAudio(part)
    }
}

impl From<OutputTextContentPart> for AssistantContentPart {
    fn from(part: OutputTextContentPart) -> Self {
        Self::Text(part)
    }
}

// ============================================================================
// Message Items (client)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessageItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: Vec<SystemContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessageItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: Vec<UserContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessageItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: Vec<AssistantContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

impl SystemMessageItem {
    pub fn new(content: impl IntoIterator<Item = impl Into<SystemContentPart>>) -> Self {
        Self {
            id: None,
            content: content.into_iter().map(Into::into).collect(),
            status: None,
        }
    }
}

impl UserMessageItem {
    pub fn new(content: impl IntoIterator<Item = impl Into<UserContentPart>>) -> Self {
        Self {
            id: None,
            content: content.into_iter().map(Into::into).collect(),
            status: None,
        }
    }
}

impl AssistantMessageItem {
    pub fn new(content: impl IntoIterator<Item = impl Into<AssistantContentPart>>) -> Self {
        Self {
            id: None,
            content: content.into_iter().map(Into::into).collect(),
            status: None,
        }
    }
}

/// A message, discriminated by `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum MessageItem {
    System(SystemMessageItem),
    User(UserMessageItem),
    Assistant(AssistantMessageItem),
}

impl MessageItem {
    pub fn role(&self) -> Role {
        match self {
            Self::System(_) => Role::System,
            Self::User(_) => Role::User,
            Self::Assistant(_) => Role::Assistant,
        }
    }
}

// ============================================================================
// Function Call Items (client)
// ============================================================================

/// A function call made by the assistant, replayed into the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub call_id: String,
    /// JSON-encoded arguments
    pub arguments: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

/// The result of a function call, returned by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallOutputItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub call_id: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

// ============================================================================
// Item (client, main type)
// ============================================================================

/// A conversation item sent by the client in `conversation.item.create`
/// and `response.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Message(MessageItem),
    FunctionCall(FunctionCallItem),
    FunctionCallOutput(FunctionCallOutputItem),
}

impl Item {
    /// A system message with a single text part.
    pub fn system_text(text: impl Into<String>) -> Self {
        Self::Message(MessageItem::System(SystemMessageItem::new([
            InputTextContentPart::new(text),
        ])))
    }

    /// A user message with a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::Message(MessageItem::User(UserMessageItem::new([
            InputTextContentPart::new(text),
        ])))
    }

    /// A user message with a single base64 audio part.
    pub fn user_audio(audio: impl Into<String>) -> Self {
        Self::Message(MessageItem::User(UserMessageItem::new([
            InputAudioContentPart::new(audio),
        ])))
    }

    /// An assistant message with a single text part.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::Message(MessageItem::Assistant(AssistantMessageItem::new([
            OutputTextContentPart::new(text),
        ])))
    }

    pub fn function_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::FunctionCallOutput(FunctionCallOutputItem {
            id: None,
            call_id: call_id.into(),
            output: output.into(),
            status: None,
        })
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Message(MessageItem::System(m)) => m.id.as_deref(),
            Self::Message(MessageItem::User(m)) => m.id.as_deref(),
            Self::Message(MessageItem::Assistant(m)) => m.id.as_deref(),
            Self::FunctionCall(f) => f.id.as_deref(),
            Self::FunctionCallOutput(f) => f.id.as_deref(),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Message(message) => Some(message.role()),
            _ => None,
        }
    }
}

impl From<MessageItem> for Item {
    fn from(message: MessageItem) -> Self {
        Self::Message(message)
    }
}

impl From<FunctionCallItem> for Item {
    fn from(call: FunctionCallItem) -> Self {
        Self::FunctionCall(call)
    }
}

impl From<FunctionCallOutputItem> for Item {
    fn from(output: FunctionCallOutputItem) -> Self {
        Self::FunctionCallOutput(output)
    }
}

// ============================================================================
// Response Items (server)
// ============================================================================

/// Content part as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseContentPart {
    InputText {
        text: String,
    },
    InputAudio {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
    },
    Text {
        text: String,
    },
    Audio {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
    },
}

impl ResponseContentPart {
    /// Text or transcript carried by this part, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::InputText { text } | Self::Text { text } => Some(text),
            Self::InputAudio { transcript } | Self::Audio { transcript } => transcript.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessageItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ResponseContentPart>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFunctionCallItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    pub name: String,
    pub call_id: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFunctionCallOutputItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub call_id: String,
    pub output: String,
}

/// A conversation item as reported in `conversation.item.created` and
/// `response.done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseItem {
    Message(ResponseMessageItem),
    FunctionCall(ResponseFunctionCallItem),
    FunctionCallOutput(ResponseFunctionCallOutputItem),
}

impl ResponseItem {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Message(m) => m.id.as_deref(),
            Self::FunctionCall(f) => f.id.as_deref(),
            Self::FunctionCallOutput(f) => f.id.as_deref(),
        }
    }

    /// Returns `(call_id, name, arguments)` for function call items.
    pub fn as_function_call(&self) -> Option<(&str, &str, &str)> {
        match self {
            Self::FunctionCall(f) => Some((&f.call_id, &f.name, &f.arguments)),
            _ => None,
        }
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self, Self::FunctionCall(_))
    }
}
