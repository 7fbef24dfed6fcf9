//! Error types for speech capture and synthesis.

/// Errors reported by speech backends and controllers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("speech is not supported on this platform")]
    Unsupported,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("no speech detected")]
    NoSpeech,
    #[error("speech device error: {0}")]
    Device(String),
}

impl SpeechError {
    /// Map a platform recognition error code onto the taxonomy.
    ///
    /// Codes follow the browser recognition API (`not-allowed`, `no-speech`,
    /// `audio-capture`, ...). Anything unrecognised is a device error.
    pub fn from_platform_code(code: &str) -> Self {
        match code {
            "not-allowed" | "service-not-allowed" => SpeechError::PermissionDenied,
            "no-speech" => SpeechError::NoSpeech,
            "language-not-supported" => SpeechError::Unsupported,
            other => SpeechError::Device(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_error_display() {
        assert_eq!(
            SpeechError::Unsupported.to_string(),
            "speech is not supported on this platform"
        );
        assert_eq!(
            SpeechError::PermissionDenied.to_string(),
            "microphone permission denied"
        );
        assert_eq!(SpeechError::NoSpeech.to_string(), "no speech detected");
        assert_eq!(
            SpeechError::Device("audio-capture".to_string()).to_string(),
            "speech device error: audio-capture"
        );
    }

    #[test]
    fn test_from_platform_code() {
        assert_eq!(
            SpeechError::from_platform_code("not-allowed"),
            SpeechError::PermissionDenied
        );
        assert_eq!(
            SpeechError::from_platform_code("no-speech"),
            SpeechError::NoSpeech
        );
        assert_eq!(
            SpeechError::from_platform_code("language-not-supported"),
            SpeechError::Unsupported
        );
        assert_eq!(
            SpeechError::from_platform_code("network"),
            SpeechError::Device("network".to_string())
        );
    }
}
