//! Media helpers for building append events.
//!
//! Audio is carried as opaque WAV containers: the client only reads the
//! RIFF header to learn the sample layout and re-wraps PCM windows for
//! streaming. No decoding or resampling happens here.

use std::{
    path::Path,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use realtime_protocol::realtime::ClientEvent;
use thiserror::Error;

/// Samples per streamed window when feeding server-side VAD.
pub const DEFAULT_WINDOW_SAMPLES: usize = 1536;
/// Interval between streamed windows.
pub const DEFAULT_STEP: Duration = Duration::from_millis(32);

const WAV_HEADER_LEN: usize = 44;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a RIFF/WAVE file")]
    NotWav,

    #[error("WAV file is truncated")]
    Truncated,

    #[error("WAV file has no {0} chunk")]
    MissingChunk(&'static str),

    #[error("Unsupported WAV format: {0}")]
    Unsupported(String),
}

pub type MediaResult<T> = Result<T, MediaError>;

/// Base64 with the standard alphabet and padding, as the API expects.
pub fn encode_base64(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// Read a file and base64-encode its bytes unchanged.
pub fn read_base64(path: impl AsRef<Path>) -> MediaResult<String> {
    read_bytes(path.as_ref()).map(encode_base64)
}

fn read_bytes(path: &Path) -> MediaResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| MediaError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Wall-clock milliseconds since the Unix epoch, for `client_timestamp`.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Sample layout of a PCM WAV stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Bytes per sample frame across all channels.
    pub fn block_align(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// A parsed WAV file: its format and the raw PCM payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavAudio {
    pub format: WavFormat,
    pub pcm: Vec<u8>,
}

impl WavAudio {
    pub fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        Self::parse(&read_bytes(path.as_ref())?)
    }

    /// Walk the RIFF chunks for `fmt ` and `data`. Only integer PCM is
    /// accepted.
    pub fn parse(bytes: &[u8]) -> MediaResult<Self> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(MediaError::NotWav);
        }

        let mut format = None;
        let mut pos = 12;
        while pos + 8 <= bytes.len() {
            let id = &bytes[pos..pos + 4];
            let len = u32_at(bytes, pos + 4)? as usize;
            let body_start = pos + 8;
            let body_end = body_start.checked_add(len).ok_or(MediaError::Truncated)?;

            match id {
                b"fmt " => {
                    let body = bytes.get(body_start..body_end).ok_or(MediaError::Truncated)?;
                    format = Some(parse_fmt(body)?);
                }
                b"data" => {
                    let format = format.ok_or(MediaError::MissingChunk("fmt "))?;
                    // Streaming writers leave the length unset; take the rest.
                    let end = body_end.min(bytes.len());
                    return Ok(Self {
                        format,
                        pcm: bytes[body_start..end].to_vec(),
                    });
                }
                _ => {}
            }
            // Chunks are word aligned.
            pos = body_end + (len & 1);
        }
        Err(MediaError::MissingChunk("data"))
    }

    pub fn duration(&self) -> Duration {
        let byte_rate = self.format.byte_rate();
        if byte_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.pcm.len() as f64 / byte_rate as f64)
    }
}

fn u16_at(bytes: &[u8], pos: usize) -> MediaResult<u16> {
    bytes
        .get(pos..pos + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(MediaError::Truncated)
}

fn u32_at(bytes: &[u8], pos: usize) -> MediaResult<u32> {
    bytes
        .get(pos..pos + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(MediaError::Truncated)
}

fn parse_fmt(body: &[u8]) -> MediaResult<WavFormat> {
    let audio_format = u16_at(body, 0)?;
    // 1 = PCM, 0xFFFE = WAVE_FORMAT_EXTENSIBLE
    if audio_format != 1 && audio_format != 0xFFFE {
        return Err(MediaError::Unsupported(format!("format tag {audio_format:#x}")));
    }
    let format = WavFormat {
        channels: u16_at(body, 2)?,
        sample_rate: u32_at(body, 4)?,
        bits_per_sample: u16_at(body, 14)?,
    };
    if format.channels == 0 || format.bits_per_sample == 0 || format.bits_per_sample % 8 != 0 {
        return Err(MediaError::Unsupported(format!(
            "{} channels at {} bits",
            format.channels, format.bits_per_sample
        )));
    }
    Ok(format)
}

/// Wrap raw PCM in a canonical 44-byte WAV header.
pub fn encode_wav(format: WavFormat, pcm: &[u8]) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let mut out = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&format.byte_rate().to_le_bytes());
    out.extend_from_slice(&(format.block_align() as u16).to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// Slices PCM into fixed-size windows for streaming to server VAD.
///
/// A new window starts every `step` worth of samples and spans
/// `window_samples`, so consecutive windows overlap whenever the window is
/// longer than the step. Each window is re-wrapped as a WAV container,
/// base64-encoded and stamped with the wall clock at the time it is pulled.
#[derive(Debug, Clone)]
pub struct AudioChunker {
    audio: WavAudio,
    window_samples: usize,
    step: Duration,
    step_samples: usize,
    offset: usize,
}

impl AudioChunker {
    pub fn new(audio: WavAudio) -> Self {
        Self::with_window(audio, DEFAULT_WINDOW_SAMPLES, DEFAULT_STEP)
    }

    pub fn with_window(audio: WavAudio, window_samples: usize, step: Duration) -> Self {
        let step_samples =
            (audio.format.sample_rate as u128 * step.as_millis() / 1000).max(1) as usize;
        Self {
            audio,
            window_samples: window_samples.max(1),
            step,
            step_samples,
            offset: 0,
        }
    }

    /// How often [`crate::session::paced`] should pull the next window.
    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn step_samples(&self) -> usize {
        self.step_samples
    }

    /// The next window's WAV bytes, without encoding.
    fn next_window(&mut self) -> Option<Vec<u8>> {
        let block = self.audio.format.block_align();
        let start = self.offset * block;
        if start >= self.audio.pcm.len() {
            return None;
        }
        let end = (start + self.window_samples * block).min(self.audio.pcm.len());
        self.offset += self.step_samples;
        Some(encode_wav(self.audio.format, &self.audio.pcm[start..end]))
    }
}

impl Iterator for AudioChunker {
    type Item = ClientEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let wav = self.next_window()?;
        Some(ClientEvent::audio_append(encode_base64(wav)).with_client_timestamp(now_millis()))
    }
}
