use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

macro_rules! text_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

text_newtype!(TemplateId);
text_newtype!(ArchiveFilename);

pub const DEFAULT_TEMPLATE_ID: &str = "professional";

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscussionPoint {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub task: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Structured minutes as produced by the generation service.
///
/// Field names follow the backend's snake_case JSON. Lists missing from a
/// response (or sent as `null`) deserialize as empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MinutesDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attendees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discussion_points: Vec<DiscussionPoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub decisions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action_items: Vec<ActionItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub next_steps: Vec<String>,
}

impl MinutesDocument {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or("Meeting Minutes")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFile {
    pub filename: ArchiveFilename,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub template: Option<TemplateId>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl UserFile {
    /// The backend writes naive UTC ISO-8601 timestamps; RFC 3339 is accepted as well.
    pub fn created_at_parsed(&self) -> Option<NaiveDateTime> {
        let raw = self.created_at.as_deref()?.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.naive_utc())
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AiProvider {
    #[default]
    OpenAI,
    Anthropic,
    Google,
    Mistral,
}

impl AiProvider {
    pub const ALL: [AiProvider; 4] = [
        AiProvider::OpenAI,
        AiProvider::Anthropic,
        AiProvider::Google,
        AiProvider::Mistral,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AiProvider::OpenAI => "OpenAI",
            AiProvider::Anthropic => "Anthropic",
            AiProvider::Google => "Google Gemini",
            AiProvider::Mistral => "Mistral",
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, AiProvider::OpenAI)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|provider| {
            raw.eq_ignore_ascii_case(provider.wire_name()) || raw.eq_ignore_ascii_case(provider.label())
        })
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            AiProvider::OpenAI => "OpenAI",
            AiProvider::Anthropic => "Anthropic",
            AiProvider::Google => "Google",
            AiProvider::Mistral => "Mistral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub ai_provider: AiProvider,
    #[serde(default, deserialize_with = "null_as_default")]
    pub api_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub characters_processed: u64,
    #[serde(default)]
    pub audio_seconds_processed: u64,
    #[serde(default)]
    pub transcripts_generated: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub ai_config: AiConfig,
    #[serde(default)]
    pub stats: UsageStats,
}

impl UserProfile {
    pub fn has_ai_credential(&self) -> bool {
        !self.ai_config.api_key.trim().is_empty()
    }
}
