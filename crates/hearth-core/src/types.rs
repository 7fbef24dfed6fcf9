use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HearthError;

// =============================================================================
// Personas
// =============================================================================

/// The family member the user is talking to.
///
/// Closed set. Chosen when a session opens and fixed for its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    #[default]
    Mother,
    Father,
    Brother,
    Sister,
}

impl Persona {
    /// All personas in display order.
    pub const ALL: [Persona; 4] = [
        Persona::Mother,
        Persona::Father,
        Persona::Brother,
        Persona::Sister,
    ];

    /// Wire identifier used by the chat and history services.
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Mother => "mother",
            Persona::Father => "father",
            Persona::Brother => "brother",
            Persona::Sister => "sister",
        }
    }

    /// Parse leniently: unknown identifiers fall back to [`Persona::Mother`].
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    /// Static display and voice-tuning data for this persona.
    pub fn profile(&self) -> &'static PersonaProfile {
        match self {
            Persona::Mother => &MOTHER,
            Persona::Father => &FATHER,
            Persona::Brother => &BROTHER,
            Persona::Sister => &SISTER,
        }
    }

    /// Voice parameters tuned for this persona.
    pub fn voice_params(&self) -> VoiceParams {
        let profile = self.profile();
        VoiceParams {
            gender: profile.voice_gender,
            pitch: profile.pitch,
            ..VoiceParams::default()
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = HearthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mother" => Ok(Persona::Mother),
            "father" => Ok(Persona::Father),
            "brother" => Ok(Persona::Brother),
            "sister" => Ok(Persona::Sister),
            _ => Err(HearthError::UnknownPersona(s.to_string())),
        }
    }
}

/// Read-only lookup data for a persona.
#[derive(Debug, PartialEq)]
pub struct PersonaProfile {
    pub label: &'static str,
    pub tagline: &'static str,
    pub avatar: &'static str,
    /// First assistant message of every session.
    pub greeting: &'static str,
    pub voice_gender: VoiceGender,
    /// Pitch bias handed to speech synthesis (1.0 = platform default).
    pub pitch: f32,
}

static MOTHER: PersonaProfile = PersonaProfile {
    label: "Mom",
    tagline: "Warm, caring, always has time for you",
    avatar: "\u{1f469}",
    greeting: "Hi sweetheart! \u{1f338} I'm so happy you're here. How are you doing? Have you eaten today?",
    voice_gender: VoiceGender::Female,
    pitch: 1.2,
};

static FATHER: PersonaProfile = PersonaProfile {
    label: "Dad",
    tagline: "Steady advice, quiet support",
    avatar: "\u{1f468}",
    greeting: "Hey. Good to see you. What's on your mind?",
    voice_gender: VoiceGender::Male,
    pitch: 0.9,
};

static BROTHER: PersonaProfile = PersonaProfile {
    label: "Brother",
    tagline: "Jokes, banter, and always on your side",
    avatar: "\u{1f9d1}",
    greeting: "Yo!! Finally you showed up \u{1f604} What's up? Talk to me bro!",
    voice_gender: VoiceGender::Male,
    pitch: 0.9,
};

static SISTER: PersonaProfile = PersonaProfile {
    label: "Sister",
    tagline: "Your best friend who gets it",
    avatar: "\u{1f467}",
    greeting: "Oh my gosh HI! I was literally just thinking about you! \u{1f970} How are you??",
    voice_gender: VoiceGender::Female,
    pitch: 1.2,
};

// =============================================================================
// Voice tuning
// =============================================================================

/// Which kind of platform voice a persona prefers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceGender {
    Female,
    Male,
}

/// Parameters for a single synthesized utterance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    pub gender: VoiceGender,
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            gender: VoiceGender::Female,
            pitch: 1.0,
            rate: 0.95,
            volume: 1.0,
        }
    }
}

// =============================================================================
// Messages
// =============================================================================

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Emotion label attached to an assistant reply by the chat service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionTag(pub String);

impl EmotionTag {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The fixed positive tag carried by session greetings.
    pub fn happy() -> Self {
        Self("happy".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Neutral tags are not worth showing next to a message.
    pub fn is_neutral(&self) -> bool {
        self.0.is_empty() || self.0.eq_ignore_ascii_case("neutral")
    }
}

impl fmt::Display for EmotionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-session message identifier. Strictly increasing in append order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message as recorded in a conversation log. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub emotion: Option<EmotionTag>,
    pub created_at: DateTime<Utc>,
}

/// A message that has not been appended yet.
///
/// The log assigns the id, and the creation time when none is given.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageDraft {
    pub role: Role,
    pub content: String,
    pub emotion: Option<EmotionTag>,
    pub created_at: Option<DateTime<Utc>>,
}

impl MessageDraft {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            emotion: None,
            created_at: None,
        }
    }

    pub fn assistant(content: impl Into<String>, emotion: Option<EmotionTag>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            emotion,
            created_at: None,
        }
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Unique identifier for a conversation session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
