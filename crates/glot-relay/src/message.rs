//! Wire messages between a surface and the relay.
//!
//! A *surface* is the page-embedded widget that owns a selection. It
//! talks to the relay in small JSON messages tagged by an `action`
//! string:
//!
//! - surface → relay: `{"action": "<task>", "text": "..."}` to start a
//!   task, or `{"action": "stop-streaming"}` to cancel the active one;
//! - relay → surface: `{"action": "<task>-chunk", "content": "..."}`,
//!   `{"action": "<task>-done"}`, or
//!   `{"action": "<task>-error", "error": "..."}`.
//!
//! Both directions are modeled as closed enums and dispatched with
//! exhaustive matches; the task namespace in outbound actions keeps a
//! surface handling concurrent task types from cross-wiring results.

use glot_core::TaskKind;
use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A request sent by a surface to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum SurfaceRequest {
    /// Explain the selected word.
    #[serde(rename = "word-learning")]
    WordLearning {
        /// The selected text.
        text: String,
    },
    /// Translate and explain the selected phrase.
    #[serde(rename = "phrase-learning")]
    PhraseLearning {
        /// The selected text.
        text: String,
    },
    /// Translate the selected Chinese text into English.
    #[serde(rename = "translate")]
    Translate {
        /// The selected text.
        text: String,
    },
    /// Check the selected English expression.
    #[serde(rename = "check")]
    Check {
        /// The selected text.
        text: String,
    },
    /// Cancel the sender's active request, if any.
    #[serde(rename = "stop-streaming")]
    StopStreaming,
}

/// A message sent by the relay to a surface.
///
/// Serializes to the `{action, content?, error?}` wire shape, with the
/// action composed from the task namespace and the message kind (e.g.
/// `"translate-chunk"`, `"check-error"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceMessage {
    /// One incremental fragment of the result.
    Chunk {
        /// The task this fragment belongs to.
        task: TaskKind,
        /// The fragment text.
        content: String,
    },
    /// The task finished; no further messages will follow.
    Done {
        /// The task that finished.
        task: TaskKind,
    },
    /// The task failed; no further messages will follow.
    Error {
        /// The task that failed.
        task: TaskKind,
        /// A human-readable description of the failure.
        error: String,
    },
}

impl SurfaceMessage {
    /// The wire action string for this message.
    pub fn action(&self) -> String {
        match self {
            Self::Chunk { task, .. } => format!("{}-chunk", task.action()),
            Self::Done { task } => format!("{}-done", task.action()),
            Self::Error { task, .. } => format!("{}-error", task.action()),
        }
    }

    /// The task namespace this message belongs to.
    pub fn task(&self) -> TaskKind {
        match self {
            Self::Chunk { task, .. } | Self::Done { task } | Self::Error { task, .. } => *task,
        }
    }
}

impl Serialize for SurfaceMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Chunk { content, .. } => {
                let mut s = serializer.serialize_struct("SurfaceMessage", 2)?;
                s.serialize_field("action", &self.action())?;
                s.serialize_field("content", content)?;
                s.end()
            }
            Self::Done { .. } => {
                let mut s = serializer.serialize_struct("SurfaceMessage", 1)?;
                s.serialize_field("action", &self.action())?;
                s.end()
            }
            Self::Error { error, .. } => {
                let mut s = serializer.serialize_struct("SurfaceMessage", 2)?;
                s.serialize_field("action", &self.action())?;
                s.serialize_field("error", error)?;
                s.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for SurfaceMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            action: String,
            #[serde(default)]
            content: Option<String>,
            #[serde(default)]
            error: Option<String>,
        }

        let raw = Raw::deserialize(deserializer)?;

        if let Some(prefix) = raw.action.strip_suffix("-chunk") {
            let task = task_from_prefix::<D>(prefix, &raw.action)?;
            let content = raw
                .content
                .ok_or_else(|| D::Error::missing_field("content"))?;
            return Ok(Self::Chunk { task, content });
        }
        if let Some(prefix) = raw.action.strip_suffix("-done") {
            let task = task_from_prefix::<D>(prefix, &raw.action)?;
            return Ok(Self::Done { task });
        }
        if let Some(prefix) = raw.action.strip_suffix("-error") {
            let task = task_from_prefix::<D>(prefix, &raw.action)?;
            let error = raw.error.ok_or_else(|| D::Error::missing_field("error"))?;
            return Ok(Self::Error { task, error });
        }
        Err(D::Error::custom(format!(
            "unknown surface message action: {}",
            raw.action
        )))
    }
}

fn task_from_prefix<'de, D: Deserializer<'de>>(
    prefix: &str,
    action: &str,
) -> Result<TaskKind, D::Error> {
    TaskKind::from_action(prefix)
        .ok_or_else(|| D::Error::custom(format!("unknown task namespace in action: {action}")))
}
