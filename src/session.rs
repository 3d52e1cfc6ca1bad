//! Process-lifetime session state
//!
//! Each chat mode owns its own transcript. Finished transcripts can be
//! archived into a bounded history. Only [`PersistedState`] is meant to
//! outlive the process; transcripts and history are not part of it.

use crate::conversation::{Conversation, Message};
use crate::documents::{DocumentStore, DocumentSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum number of archived chats kept
pub const HISTORY_LIMIT: usize = 50;

/// Characters of the first message used in an archive title
const TITLE_PREVIEW_CHARS: usize = 40;

/// A chat surface with its own transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    General,
    Live,
    Code,
    Document,
}

impl ChatMode {
    /// Modes in the order they are checked when archiving without a mode
    pub const ALL: [ChatMode; 4] = [
        ChatMode::General,
        ChatMode::Live,
        ChatMode::Code,
        ChatMode::Document,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::General => "general",
            ChatMode::Live => "live",
            ChatMode::Code => "code",
            ChatMode::Document => "document",
        }
    }

    /// Label used in archive titles
    pub fn label(&self) -> &'static str {
        match self {
            ChatMode::General => "AI Chat",
            ChatMode::Live => "Live Chat",
            ChatMode::Code => "Code Chat",
            ChatMode::Document => "Document Chat",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "general" => Ok(ChatMode::General),
            "live" => Ok(ChatMode::Live),
            "code" => Ok(ChatMode::Code),
            "document" => Ok(ChatMode::Document),
            other => Err(format!(
                "Unknown chat mode '{}'. Expected one of: general, live, code, document",
                other
            )),
        }
    }
}

/// An archived transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: Uuid,
    pub mode: ChatMode,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}

impl ChatRecord {
    fn new(mode: ChatMode, messages: Vec<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            title: archive_title(mode, &messages),
            message_count: messages.len(),
            messages,
            created_at: Utc::now(),
        }
    }
}

fn archive_title(mode: ChatMode, messages: &[Message]) -> String {
    match messages.first() {
        Some(first) => {
            let preview: String = first.content.chars().take(TITLE_PREVIEW_CHARS).collect();
            format!("{}: {}...", mode.label(), preview)
        }
        None => format!("{}: New Conversation", mode.label()),
    }
}

/// Client-facing feature switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    pub voice_chat: bool,
    pub file_upload: bool,
    pub code_review: bool,
    pub image_generation: bool,
    pub document_analysis: bool,
    pub multi_modal: bool,
    pub chat_history: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            voice_chat: true,
            file_upload: true,
            code_review: true,
            image_generation: true,
            document_analysis: true,
            multi_modal: true,
            chat_history: true,
        }
    }
}

/// Partial update to [`FeatureToggles`]; absent fields are left alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct FeatureUpdate {
    pub voice_chat: Option<bool>,
    pub file_upload: Option<bool>,
    pub code_review: Option<bool>,
    pub image_generation: Option<bool>,
    pub document_analysis: Option<bool>,
    pub multi_modal: Option<bool>,
    pub chat_history: Option<bool>,
}

impl FeatureToggles {
    pub fn apply(&mut self, update: FeatureUpdate) {
        let fields = [
            (&mut self.voice_chat, update.voice_chat),
            (&mut self.file_upload, update.file_upload),
            (&mut self.code_review, update.code_review),
            (&mut self.image_generation, update.image_generation),
            (&mut self.document_analysis, update.document_analysis),
            (&mut self.multi_modal, update.multi_modal),
            (&mut self.chat_history, update.chat_history),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

/// The subset of state designated as persistable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub display_name: String,
    pub features: FeatureToggles,
    pub documents: Vec<DocumentSummary>,
}

/// All mutable state shared by request handlers
#[derive(Debug, Clone)]
pub struct SessionState {
    display_name: String,
    features: FeatureToggles,
    transcripts: HashMap<ChatMode, Conversation>,
    history: Vec<ChatRecord>,
    documents: DocumentStore,
}

impl SessionState {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            features: FeatureToggles::default(),
            transcripts: HashMap::new(),
            history: Vec::new(),
            documents: DocumentStore::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Change the display name; blank names are rejected
    pub fn set_display_name(&mut self, name: &str) -> Result<(), String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err("display_name must not be blank".to_string());
        }
        self.display_name = trimmed.to_string();
        Ok(())
    }

    pub fn features(&self) -> FeatureToggles {
        self.features
    }

    pub fn update_features(&mut self, update: FeatureUpdate) -> FeatureToggles {
        self.features.apply(update);
        self.features
    }

    /// Transcript of a mode (empty if nothing was said yet)
    pub fn transcript(&self, mode: ChatMode) -> Conversation {
        self.transcripts.get(&mode).cloned().unwrap_or_default()
    }

    pub fn append(&mut self, mode: ChatMode, message: Message) {
        self.transcripts.entry(mode).or_default().push(message);
    }

    pub fn clear_transcript(&mut self, mode: ChatMode) {
        self.transcripts.remove(&mode);
    }

    /// Archive the transcript of `mode`, or of the first non-empty mode
    ///
    /// Returns `None` when there is nothing to archive. The transcript
    /// itself is left in place.
    pub fn archive(&mut self, mode: Option<ChatMode>) -> Option<ChatRecord> {
        let mode = match mode {
            Some(mode) => mode,
            None => ChatMode::ALL
                .into_iter()
                .find(|m| self.transcripts.get(m).is_some_and(|c| !c.is_empty()))?,
        };
        let conversation = self.transcripts.get(&mode).filter(|c| !c.is_empty())?;

        let record = ChatRecord::new(mode, conversation.messages().to_vec());
        self.history.insert(0, record.clone());
        self.history.truncate(HISTORY_LIMIT);
        Some(record)
    }

    /// Archived chats, newest first
    pub fn history(&self) -> &[ChatRecord] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut DocumentStore {
        &mut self.documents
    }

    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            display_name: self.display_name.clone(),
            features: self.features,
            documents: self.documents.summaries(),
        }
    }
}
