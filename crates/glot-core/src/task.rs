//! Tasks and prompt construction.
//!
//! Each assist action the user can trigger on a text selection is a
//! [`TaskKind`]. A task fixes everything about the request except the
//! selected text itself: the system persona, the user-prompt template,
//! and the sampling constants. Building messages is pure — no I/O, no
//! failure modes.
//!
//! Empty or whitespace-only selections are the caller's responsibility
//! to reject before building a prompt; the builder interpolates whatever
//! it is given.

use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, ChatParams};

/// Sampling temperature shared by all streaming tasks.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Temperature for the one-shot directional translation.
const TRANSLATION_TEMPERATURE: f32 = 0.3;

/// Token cap for the one-shot directional translation.
const TRANSLATION_MAX_TOKENS: u32 = 1000;

/// One of the four assist actions a surface can request.
///
/// The serialized form doubles as the wire action name
/// (`"word-learning"`, `"phrase-learning"`, `"translate"`, `"check"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Explain a single English word for a Chinese-speaking learner.
    WordLearning,
    /// Translate and explain an English phrase or sentence.
    PhraseLearning,
    /// Translate Chinese text into idiomatic English.
    Translate,
    /// Check an English expression for clarity and naturalness.
    Check,
}

impl TaskKind {
    /// All task kinds, in a fixed order. Handy for exhaustive tests.
    pub const ALL: [TaskKind; 4] = [
        TaskKind::WordLearning,
        TaskKind::PhraseLearning,
        TaskKind::Translate,
        TaskKind::Check,
    ];

    /// The wire action name for this task.
    pub fn action(self) -> &'static str {
        match self {
            Self::WordLearning => "word-learning",
            Self::PhraseLearning => "phrase-learning",
            Self::Translate => "translate",
            Self::Check => "check",
        }
    }

    /// Parses a wire action name back into a task kind.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "word-learning" => Some(Self::WordLearning),
            "phrase-learning" => Some(Self::PhraseLearning),
            "translate" => Some(Self::Translate),
            "check" => Some(Self::Check),
            _ => None,
        }
    }

    /// Sampling temperature for this task.
    pub fn temperature(self) -> f32 {
        DEFAULT_TEMPERATURE
    }

    /// Token budget for this task's response.
    pub fn max_tokens(self) -> u32 {
        match self {
            Self::WordLearning | Self::PhraseLearning => 2000,
            Self::Translate | Self::Check => 2500,
        }
    }

    /// The fixed system persona for this task.
    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::WordLearning => {
                "You are an expert English teacher and linguist. Provide detailed, \
                 structured explanations of English words in Chinese, including \
                 pronunciation, meanings, etymology, and usage examples."
            }
            Self::PhraseLearning => {
                "You are an expert English teacher and translator. Provide accurate \
                 translations and helpful explanations for English phrases and \
                 sentences in Chinese."
            }
            Self::Translate => {
                "You are an expert English translator and linguist specializing in \
                 translating Chinese to native, idiomatic English. You provide the \
                 most natural English expressions with detailed explanations and \
                 alternative options."
            }
            Self::Check => {
                "You are an expert English language editor and native speaker \
                 consultant. You evaluate English expressions for clarity and \
                 naturalness, providing detailed feedback and the most idiomatic \
                 alternatives."
            }
        }
    }

    /// Interpolates the selected text into this task's user-prompt
    /// template.
    pub fn user_prompt(self, text: &str) -> String {
        match self {
            Self::WordLearning => format!(
                "Explain the English word below for a Chinese-speaking learner. \
                 Cover its pronunciation, part of speech, core meanings, etymology, \
                 and a few example sentences with Chinese translations.\n\n\
                 Word:\n{text}"
            ),
            Self::PhraseLearning => format!(
                "Translate the English phrase or sentence below into Chinese, then \
                 explain its structure, key expressions, and typical usage.\n\n\
                 Phrase:\n{text}"
            ),
            Self::Translate => format!(
                "Translate the following Chinese text into natural, idiomatic \
                 English. Give the best translation first, then briefly explain the \
                 key word choices and offer one or two alternative phrasings.\n\n\
                 Text to translate:\n{text}"
            ),
            Self::Check => format!(
                "Evaluate whether the following English expression is clear and \
                 natural. Point out any grammar or usage problems, then give the \
                 most idiomatic way a native speaker would phrase it.\n\n\
                 Expression to check:\n{text}"
            ),
        }
    }

    /// Builds the message list for this task: system persona first, then
    /// the user prompt with the selected text interpolated.
    pub fn messages(self, text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(self.user_prompt(text)),
        ]
    }

    /// Bundles the message list with this task's sampling constants.
    pub fn params(self, text: &str) -> ChatParams {
        ChatParams {
            messages: self.messages(text),
            temperature: Some(self.temperature()),
            max_tokens: Some(self.max_tokens()),
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.action())
    }
}

/// A language endpoint for the one-shot directional translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Chinese.
    Zh,
    /// English.
    En,
}

impl Lang {
    /// The language name as it appears in the prompt.
    fn prompt_name(self) -> &'static str {
        match self {
            Self::Zh => "中文",
            Self::En => "English",
        }
    }
}

/// Builds the message pair for a one-shot directional translation.
///
/// Unlike the streaming tasks, the result is expected as a single
/// response with no commentary.
pub fn translation_messages(text: &str, source: Lang, target: Lang) -> Vec<ChatMessage> {
    let prompt = format!(
        "Please translate the following {} text to {}. Only provide the \
         translation without any explanations or additional text.\n\n\
         Text to translate:\n{text}",
        source.prompt_name(),
        target.prompt_name(),
    );
    vec![
        ChatMessage::system(
            "You are a professional translator specializing in Chinese and English \
             translation. Provide accurate, natural, and contextually appropriate \
             translations.",
        ),
        ChatMessage::user(prompt),
    ]
}

/// Bundles [`translation_messages`] with the one-shot sampling constants.
pub fn translation_params(text: &str, source: Lang, target: Lang) -> ChatParams {
    ChatParams {
        messages: translation_messages(text, source, target),
        temperature: Some(TRANSLATION_TEMPERATURE),
        max_tokens: Some(TRANSLATION_MAX_TOKENS),
    }
}
