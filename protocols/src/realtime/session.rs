//! Session configuration and types for the Realtime API.
//!
//! This module contains the `session.update` parameters sent by the client,
//! the full [`Session`] snapshot returned in `session.created` and
//! `session.updated`, and the supporting enums (modalities, audio formats,
//! turn detection, tool choice).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationResult};

/// Voices are free-form names; the server decides which ones exist.
pub type Voice = String;

// ============================================================================
// Session Update Parameters (Request)
// ============================================================================

/// Session configuration for `session.update` commands.
///
/// All fields are optional - only specified fields will be updated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdateParams {
    /// Model to use for the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Enabled modalities (deduplicated, unordered)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<BTreeSet<Modality>>,

    /// Voice for audio output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,

    /// System instructions for the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Format of audio sent by the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<AudioFormat>,

    /// Format of audio produced by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<AudioFormat>,

    /// Input audio transcription configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,

    /// Turn detection configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,

    /// Tools available to the model (opaque JSON definitions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,

    /// How the model should choose tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Temperature>,

    /// Maximum output tokens per response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_response_output_tokens: Option<MaxTokens>,

    /// Vendor-specific extension fields (`chat_mode`, `tts_source`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta_fields: Option<Map<String, Value>>,
}

impl SessionUpdateParams {
    /// Set the enabled modalities.
    pub fn with_modalities(mut self, modalities: impl IntoIterator<Item = Modality>) -> Self {
        self.modalities = Some(modalities.into_iter().collect());
        self
    }

    /// Set the turn detection policy.
    pub fn with_turn_detection(mut self, turn_detection: TurnDetection) -> Self {
        self.turn_detection = Some(turn_detection);
        self
    }

    /// Set the sampling temperature, rejecting values outside `[0, 1.2]`.
    pub fn with_temperature(mut self, value: f64) -> ValidationResult<Self> {
        self.temperature = Some(Temperature::new(value)?);
        Ok(self)
    }

    /// Insert a single beta field.
    pub fn with_beta_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.beta_fields
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Whether turn detection is explicitly disabled (`{"type": "none"}`).
    pub fn disables_turn_detection(&self) -> bool {
        matches!(self.turn_detection, Some(TurnDetection::Disabled))
    }
}

// ============================================================================
// Full Session Object (Response)
// ============================================================================

/// Full session object returned in `session.created` and `session.updated` events.
///
/// The client never edits a session in place; every `session.updated` event
/// carries a replacement snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for the session
    pub id: String,
    /// The model being used
    pub model: String,
    /// Enabled modalities
    pub modalities: BTreeSet<Modality>,
    /// System instructions
    pub instructions: String,
    /// Voice used for audio output
    pub voice: Voice,
    /// Format of client audio
    pub input_audio_format: AudioFormat,
    /// Format of server audio
    pub output_audio_format: AudioFormat,
    /// Input audio transcription configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,
    /// Turn detection configuration (`null` when the server runs without VAD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,
    /// Available tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    /// Tool choice policy
    pub tool_choice: ToolChoice,
    /// Sampling temperature
    pub temperature: Temperature,
    /// Maximum output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<MaxTokens>,
    /// Vendor-specific extension fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta_fields: Option<Map<String, Value>>,
}

impl Session {
    /// Look up a beta field by name.
    pub fn beta_field(&self, key: &str) -> Option<&Value> {
        self.beta_fields.as_ref().and_then(|fields| fields.get(key))
    }

    pub fn supports(&self, modality: Modality) -> bool {
        self.modalities.contains(&modality)
    }
}

// ============================================================================
// Validated Scalars
// ============================================================================

/// Sampling temperature, guaranteed to lie in `[0, 1.2]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Temperature(f64);

impl Temperature {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 1.2;

    pub fn new(value: f64) -> ValidationResult<Self> {
        check_range("temperature", value, Self::MIN, Self::MAX).map(Self)
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Temperature {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Temperature> for f64 {
    fn from(value: Temperature) -> Self {
        value.0
    }
}

/// Server VAD activation threshold, guaranteed to lie in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct VadThreshold(f64);

impl VadThreshold {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 1.0;

    pub fn new(value: f64) -> ValidationResult<Self> {
        check_range("threshold", value, Self::MIN, Self::MAX).map(Self)
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for VadThreshold {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VadThreshold> for f64 {
    fn from(value: VadThreshold) -> Self {
        value.0
    }
}

// NaN fails both comparisons and is rejected along with out-of-range values.
fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> ValidationResult<f64> {
    if value >= min && value <= max {
        Ok(value)
    } else {
        Err(ValidationError::out_of_range(field, value, min, max))
    }
}

// ============================================================================
// Supporting Types
// ============================================================================

// --- Modality ---

/// Content channels a session can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Audio,
}

// --- Audio Format ---

/// Audio container/encoding for input and output audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    Wav,
    Mp3,
    Pcm,
}

// --- Input Audio Transcription ---

/// Input audio transcription configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioTranscription {
    /// The transcription model (e.g. "whisper-1")
    pub model: String,
    /// Whether transcription is enabled (reported by some deployments)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl InputAudioTranscription {
    pub fn whisper() -> Self {
        Self {
            model: "whisper-1".to_string(),
            enabled: None,
        }
    }
}

// --- Turn Detection ---

/// Turn detection configuration.
///
/// Controls how the start and end of user speech is detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnDetection {
    /// Turn detection disabled; the client commits audio manually
    #[serde(rename = "none")]
    Disabled,
    /// Server-side voice activity detection
    ServerVad(ServerVad),
    /// The client runs its own VAD and commits turns itself
    ClientVad,
}

impl TurnDetection {
    pub fn server_vad() -> Self {
        Self::ServerVad(ServerVad::default())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Disabled => "none",
            Self::ServerVad(_) => "server_vad",
            Self::ClientVad => "client_vad",
        }
    }
}

/// Server VAD tuning knobs. Unset fields use server defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerVad {
    /// Activation threshold (0.0-1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<VadThreshold>,
    /// Audio to include before detected speech (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_padding_ms: Option<u32>,
    /// Silence needed to end a turn (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silence_duration_ms: Option<u32>,
}

impl ServerVad {
    /// Build a server VAD config with the given activation threshold.
    pub fn with_threshold(threshold: f64) -> ValidationResult<Self> {
        Ok(Self {
            threshold: Some(VadThreshold::new(threshold)?),
            ..Default::default()
        })
    }

    pub fn prefix_padding_ms(mut self, ms: u32) -> Self {
        self.prefix_padding_ms = Some(ms);
        self
    }

    pub fn silence_duration_ms(mut self, ms: u32) -> Self {
        self.silence_duration_ms = Some(ms);
        self
    }
}

impl From<ServerVad> for TurnDetection {
    fn from(vad: ServerVad) -> Self {
        Self::ServerVad(vad)
    }
}

// --- Tool Choice ---

/// Tool choice configuration.
///
/// Either a fixed keyword or a specific function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolChoice {
    Mode(ToolChoiceMode),
    Function(FunctionToolChoice),
}

/// Tool choice keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoiceMode {
    /// Let the model decide whether to call tools
    Auto,
    /// Don't call any tools
    None,
    /// Force the model to call a tool
    Required,
    /// Empty string; the server falls back to its default
    #[serde(rename = "")]
    Unset,
}

/// Force a specific function: `{"type": "function", "function": "<name>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionToolChoice {
    #[serde(rename = "type")]
    pub r#type: FunctionType,
    pub function: String,
}

/// The `type` of a function tool or tool choice. Always `"function"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionType {
    #[default]
    #[serde(rename = "function")]
    Function,
}

impl Default for ToolChoice {
    fn default() -> Self {
        Self::Mode(ToolChoiceMode::Auto)
    }
}

impl ToolChoice {
    pub fn auto() -> Self {
        Self::Mode(ToolChoiceMode::Auto)
    }

    pub fn none() -> Self {
        Self::Mode(ToolChoiceMode::None)
    }

    pub fn required() -> Self {
        Self::Mode(ToolChoiceMode::Required)
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::Function(FunctionToolChoice {
            r#type: FunctionType::Function,
            function: name.into(),
        })
    }
}

// --- Function Tools ---

/// A function tool definition.
///
/// Tools travel as opaque JSON in [`SessionUpdateParams::tools`]; this type
/// builds the common function shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub r#type: FunctionType,
    pub name: String,
    pub description: String,
    /// JSON Schema for the function parameters
    pub parameters: Value,
}

impl FunctionTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            r#type: FunctionType::Function,
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// The JSON object carried in [`SessionUpdateParams::tools`].
    pub fn into_value(self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

// --- Max Tokens ---

/// Maximum output tokens: a specific number or "inf" for unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MaxTokens {
    #[default]
    Inf,
    Limit(u32),
}

impl Serialize for MaxTokens {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Inf => serializer.serialize_str("inf"),
            Self::Limit(n) => serializer.serialize_u32(*n),
        }
    }
}

impl<'de> Deserialize<'de> for MaxTokens {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct MaxTokensVisitor;

        impl Visitor<'_> for MaxTokensVisitor {
            type Value = MaxTokens;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("\"inf\" or a non-negative integer")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value == "inf" {
                    Ok(MaxTokens::Inf)
                } else {
                    Err(de::Error::custom(format!("expected \"inf\", got \"{value}\"")))
                }
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u32::try_from(value)
                    .map(MaxTokens::Limit)
                    .map_err(|_| de::Error::custom(format!("value {value} is too large for u32")))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u32::try_from(value)
                    .map(MaxTokens::Limit)
                    .map_err(|_| de::Error::custom(format!("value {value} is out of range")))
            }
        }

        deserializer.deserialize_any(MaxTokensVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_temperature_bounds_are_inclusive() {
        assert!(Temperature::new(0.0).is_ok());
        assert!(Temperature::new(1.2).is_ok());
        assert!(Temperature::new(-0.01).is_err());
        assert!(Temperature::new(f64::NAN).is_err());

        let err = Temperature::new(5.0).unwrap_err();
        assert_eq!(err.field(), Some("temperature"));
        assert!(err.to_string().contains("1.2"));
    }

    #[test]
    fn test_server_vad_threshold_range() {
        assert!(ServerVad::with_threshold(0.85).is_ok());
        let err = ServerVad::with_threshold(1.5).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange {
                field: "threshold",
                ..
            }
        ));
    }

    #[test]
    fn test_server_vad_threshold_strict_typing() {
        let vad: TurnDetection = serde_json::from_value(json!({
            "type": "server_vad",
            "threshold": 1,
        }))
        .unwrap();
        assert_eq!(
            vad,
            TurnDetection::ServerVad(ServerVad {
                threshold: Some(VadThreshold::new(1.0).unwrap()),
                ..Default::default()
            })
        );

        let result: Result<TurnDetection, _> = serde_json::from_value(json!({
            "type": "server_vad",
            "threshold": "0.5",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_turn_detection_wire_shapes() {
        assert_eq!(
            serde_json::to_value(TurnDetection::Disabled).unwrap(),
            json!({"type": "none"})
        );
        assert_eq!(
            serde_json::to_value(TurnDetection::ClientVad).unwrap(),
            json!({"type": "client_vad"})
        );
        let vad = ServerVad::with_threshold(0.5)
            .unwrap()
            .silence_duration_ms(500);
        assert_eq!(
            serde_json::to_value(TurnDetection::from(vad)).unwrap(),
            json!({"type": "server_vad", "threshold": 0.5, "silence_duration_ms": 500})
        );
    }

    #[test]
    fn test_turn_detection_requires_known_type() {
        assert!(serde_json::from_value::<TurnDetection>(json!({})).is_err());
        assert!(serde_json::from_value::<TurnDetection>(json!({"type": "semantic_vad"})).is_err());
    }

    #[test]
    fn test_modalities_are_deduplicated() {
        let params: SessionUpdateParams = serde_json::from_value(json!({
            "modalities": ["audio", "text", "audio"]
        }))
        .unwrap();
        let modalities = params.modalities.unwrap();
        assert_eq!(modalities.len(), 2);
        assert!(modalities.contains(&Modality::Audio));

        let bad: Result<SessionUpdateParams, _> =
            serde_json::from_value(json!({"modalities": ["video"]}));
        assert!(bad.is_err());
    }

    #[test]
    fn test_tool_choice_representations() {
        assert_eq!(serde_json::to_value(ToolChoice::auto()).unwrap(), json!("auto"));
        assert_eq!(
            serde_json::to_value(ToolChoice::Mode(ToolChoiceMode::Unset)).unwrap(),
            json!("")
        );
        assert_eq!(
            serde_json::to_value(ToolChoice::function("get_weather")).unwrap(),
            json!({"type": "function", "function": "get_weather"})
        );

        let parsed: ToolChoice = serde_json::from_value(json!("required")).unwrap();
        assert_eq!(parsed, ToolChoice::required());
        let parsed: ToolChoice =
            serde_json::from_value(json!({"type": "function", "function": "f"})).unwrap();
        assert_eq!(parsed, ToolChoice::function("f"));
    }

    #[test]
    fn test_max_tokens_serde() {
        assert_eq!(serde_json::to_value(MaxTokens::Inf).unwrap(), json!("inf"));
        assert_eq!(serde_json::to_value(MaxTokens::Limit(256)).unwrap(), json!(256));
        assert_eq!(
            serde_json::from_value::<MaxTokens>(json!(4096)).unwrap(),
            MaxTokens::Limit(4096)
        );
        assert!(serde_json::from_value::<MaxTokens>(json!("lots")).is_err());
        assert!(serde_json::from_value::<MaxTokens>(json!(-1)).is_err());
    }

    #[test]
    fn test_session_update_params_omit_unset_fields() {
        let params = SessionUpdateParams {
            input_audio_format: Some(AudioFormat::Wav),
            output_audio_format: Some(AudioFormat::Pcm),
            ..Default::default()
        }
        .with_modalities([Modality::Audio, Modality::Text])
        .with_turn_detection(TurnDetection::ClientVad)
        .with_beta_field("chat_mode", "video_passive")
        .with_beta_field("auto_search", false);

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            json!({
                "modalities": ["text", "audio"],
                "input_audio_format": "wav",
                "output_audio_format": "pcm",
                "turn_detection": {"type": "client_vad"},
                "beta_fields": {"chat_mode": "video_passive", "auto_search": false},
            })
        );
    }

    #[test]
    fn test_session_deserialization() {
        let session: Session = serde_json::from_value(json!({
            "id": "sess_1",
            "object": "realtime.session",
            "model": "glm-realtime",
            "modalities": ["audio", "text"],
            "instructions": "",
            "voice": "default",
            "input_audio_format": "wav",
            "output_audio_format": "pcm",
            "input_audio_transcription": null,
            "turn_detection": null,
            "tools": null,
            "tool_choice": "auto",
            "temperature": 0.05,
            "max_output_tokens": "inf",
            "beta_fields": {"chat_mode": "audio"}
        }))
        .unwrap();

        assert_eq!(session.id, "sess_1");
        assert!(session.supports(Modality::Audio));
        assert!(session.turn_detection.is_none());
        assert_eq!(session.max_output_tokens, Some(MaxTokens::Inf));
        assert_eq!(session.beta_field("chat_mode"), Some(&json!("audio")));
    }

    #[test]
    fn test_session_rejects_out_of_range_temperature() {
        let result: Result<Session, _> = serde_json::from_value(json!({
            "id": "sess_1",
            "model": "glm-realtime",
            "modalities": ["text"],
            "instructions": "",
            "voice": "default",
            "input_audio_format": "wav",
            "output_audio_format": "pcm",
            "tool_choice": "auto",
            "temperature": 5.0
        }));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_function_tool_value() {
        let tool = FunctionTool::new(
            "phone_call",
            "Place a phone call",
            json!({"type": "object", "properties": {"name": {"type": "string"}}}),
        );
        let value = tool.clone().into_value().unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["name"], "phone_call");

        let parsed: FunctionTool = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, tool);
    }

    #[test]
    fn test_function_shapes_reject_other_types() {
        let choice: Result<ToolChoice, _> =
            serde_json::from_value(json!({"type": "bogus", "function": "f"}));
        assert!(choice.is_err());
        let choice: Result<FunctionToolChoice, _> =
            serde_json::from_value(json!({"function": "f"}));
        assert!(choice.is_err());

        let tool: Result<FunctionTool, _> = serde_json::from_value(json!({
            "type": "retrieval",
            "name": "lookup",
            "description": "Search documents",
            "parameters": {}
        }));
        assert!(tool.is_err());
    }
}
