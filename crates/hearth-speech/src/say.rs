//! Speech output through a command-line synthesizer (`say` on macOS).

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::SpeechError;
use crate::output::{SpeechOutput, Utterance, VoiceInfo};

/// Words per minute the synthesizer uses at rate 1.0.
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// Speaks by spawning a synthesizer process per utterance.
///
/// The child is killed when the playback future is dropped, so cancelling
/// an utterance silences it immediately.
#[derive(Debug, Clone)]
pub struct SayCommandOutput {
    program: String,
    voices: Vec<VoiceInfo>,
}

impl SayCommandOutput {
    /// Create an output with no known voices (platform default only).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            voices: Vec::new(),
        }
    }

    /// Create an output and ask the synthesizer which voices it has.
    ///
    /// A synthesizer that cannot list voices still works with its default.
    pub async fn discover(program: impl Into<String>) -> Self {
        let program = program.into();
        let voices = match Command::new(&program)
            .args(["-v", "?"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
        {
            Ok(output) if output.status.success() => {
                parse_voice_list(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                tracing::debug!(status = %output.status, "Voice listing failed");
                Vec::new()
            }
            Err(e) => {
                tracing::debug!(program = %program, error = %e, "Synthesizer not available");
                Vec::new()
            }
        };
        tracing::info!(program = %program, voices = voices.len(), "Speech synthesizer ready");
        Self { program, voices }
    }

    fn build_command(&self, utterance: &Utterance) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(voice) = &utterance.voice {
            cmd.arg("-v").arg(&voice.name);
        }
        let wpm = (BASE_WORDS_PER_MINUTE * utterance.params.rate).round().max(1.0) as u32;
        cmd.arg("-r").arg(wpm.to_string());
        cmd.arg(&utterance.text);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl SpeechOutput for SayCommandOutput {
    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        let mut child = self.build_command(&utterance).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpeechError::Unsupported
            } else {
                SpeechError::Device(e.to_string())
            }
        })?;
        let status = child
            .wait()
            .await
            .map_err(|e| SpeechError::Device(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(SpeechError::Device(format!("{} exited with {}", self.program, status)))
        }
    }
}

/// Parse `say -v ?` output.
///
/// Lines look like `Samantha            en_US    # Hello! My name is Samantha.`
/// Voice names may contain spaces; the language code is the last field
/// before the `#`.
fn parse_voice_list(listing: &str) -> Vec<VoiceInfo> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim();
            let (name, language) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(VoiceInfo::new(name, language.replace('_', "-")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::VoiceParams;

    #[test]
    fn test_parse_voice_list() {
        let listing = "\
Daniel              en_GB    # Hello! My name is Daniel.
Bad News            en_US    # The light you see at the end of the tunnel is the headlamp.
Samantha            en_US    # Hello! My name is Samantha.

garbage
";
        let voices = parse_voice_list(listing);
        assert_eq!(
            voices,
            vec![
                VoiceInfo::new("Daniel", "en-GB"),
                VoiceInfo::new("Bad News", "en-US"),
                VoiceInfo::new("Samantha", "en-US"),
            ]
        );
    }

    #[test]
    fn test_build_command_args() {
        let output = SayCommandOutput::new("say");
        let utterance = Utterance {
            text: "hello there".to_string(),
            voice: Some(VoiceInfo::new("Samantha", "en-US")),
            params: VoiceParams {
                rate: 1.0,
                ..VoiceParams::default()
            },
        };
        let cmd = output.build_command(&utterance);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(args, vec!["-v", "Samantha", "-r", "175", "hello there"]);
    }

    #[test]
    fn test_build_command_default_voice() {
        let output = SayCommandOutput::new("say");
        let utterance = Utterance {
            text: "hi".to_string(),
            voice: None,
            params: VoiceParams::default(),
        };
        let cmd = output.build_command(&utterance);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(args, vec!["-r", "166", "hi"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_unsupported() {
        let output = SayCommandOutput::new("hearth-definitely-not-a-real-synthesizer");
        let utterance = Utterance {
            text: "hi".to_string(),
            voice: None,
            params: VoiceParams::default(),
        };
        assert_eq!(output.speak(utterance).await, Err(SpeechError::Unsupported));
    }

    #[tokio::test]
    async fn test_discover_missing_program_has_no_voices() {
        let output = SayCommandOutput::discover("hearth-definitely-not-a-real-synthesizer").await;
        assert!(output.voices().is_empty());
    }
}
