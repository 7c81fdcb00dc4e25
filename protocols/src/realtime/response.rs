//! Response types for the Realtime API.
//!
//! This module contains the `response.create` parameters sent by the client
//! and the [`Response`] object the server reports in `response.created` and
//! `response.done`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    conversation::{Item, ResponseItem},
    session::{AudioFormat, MaxTokens, Modality, Temperature, ToolChoice, Voice},
};
use crate::error::ValidationResult;

// ============================================================================
// Response Create Parameters (Request)
// ============================================================================

fn default_true() -> bool {
    true
}

/// Parameters for `response.create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCreateParams {
    /// Commit the pending input audio buffer before responding
    #[serde(default = "default_true")]
    pub commit: bool,

    /// Cancel any response still in progress
    #[serde(default = "default_true")]
    pub cancel_previous: bool,

    /// Items appended to the conversation before responding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append_input_items: Option<Vec<Item>>,

    /// Items used as the only input for this response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_items: Option<Vec<Item>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<BTreeSet<Modality>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Temperature>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<MaxTokens>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<AudioFormat>,
}

impl Default for ResponseCreateParams {
    fn default() -> Self {
        Self {
            commit: true,
            cancel_previous: true,
            append_input_items: None,
            input_items: None,
            instructions: None,
            modalities: None,
            voice: None,
            temperature: None,
            max_output_tokens: None,
            tools: None,
            tool_choice: None,
            output_audio_format: None,
        }
    }
}

impl ResponseCreateParams {
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_temperature(mut self, value: f64) -> ValidationResult<Self> {
        self.temperature = Some(Temperature::new(value)?);
        Ok(self)
    }

    pub fn append_item(mut self, item: Item) -> Self {
        self.append_input_items.get_or_insert_with(Vec::new).push(item);
        self
    }
}

// ============================================================================
// Response Status
// ============================================================================

/// Status of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Response is being generated
    InProgress,
    /// Response completed successfully
    Completed,
    /// Response was cancelled
    Cancelled,
    /// Response generation was interrupted
    Incomplete,
    /// Response failed due to an error
    Failed,
}

impl ResponseStatus {
    /// Whether the response can still produce output.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

// ============================================================================
// Response Status Details
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledReason {
    TurnDetected,
    ClientCancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompleteReason {
    MaxOutputTokens,
    ContentFilter,
}

/// Details about why a response ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseStatusDetails {
    Cancelled { reason: CancelledReason },
    Incomplete { reason: IncompleteReason },
    /// The error payload is passed through as-is
    Failed { error: Value },
}

impl ResponseStatusDetails {
    /// The status these details belong to.
    pub fn status(&self) -> ResponseStatus {
        match self {
            Self::Cancelled { .. } => ResponseStatus::Cancelled,
            Self::Incomplete { .. } => ResponseStatus::Incomplete,
            Self::Failed { .. } => ResponseStatus::Failed,
        }
    }
}

// ============================================================================
// Usage Statistics
// ============================================================================

/// Token usage statistics for a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_token_details: Option<InputTokenDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_token_details: Option<OutputTokenDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTokenDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_tokens: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTokenDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_tokens: Option<u64>,
}

// ============================================================================
// Response Object
// ============================================================================

fn default_object() -> String {
    Response::OBJECT.to_string()
}

/// A response object returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,

    /// Always `realtime.response`
    #[serde(default = "default_object")]
    pub object: String,

    pub status: ResponseStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_details: Option<ResponseStatusDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<ResponseItem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Response {
    pub const OBJECT: &'static str = "realtime.response";

    pub fn new(id: impl Into<String>, status: ResponseStatus) -> Self {
        Self {
            id: id.into(),
            object: default_object(),
            status,
            status_details: None,
            output: None,
            usage: None,
        }
    }

    /// Output items in order, empty when the server sent none.
    pub fn output_items(&self) -> &[ResponseItem] {
        self.output.as_deref().unwrap_or_default()
    }
}
