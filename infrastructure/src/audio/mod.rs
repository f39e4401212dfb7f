//! Audio playback through an external player command.

use crate::config::FileAudioConfig;
use std::path::Path;
use std::process::{Command, Stdio};
use tavern_application::{AudioPlayer, PlaybackError};
use tracing::debug;

/// Placeholder in the argument list that receives the clip path.
const PATH_PLACEHOLDER: &str = "{path}";

/// Plays a clip by running e.g. `ffplay -nodisp -autoexit -loglevel quiet <path>`
/// and waiting for it to exit.
#[derive(Debug, Clone)]
pub struct CommandAudioPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandAudioPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &FileAudioConfig) -> Self {
        Self::new(&config.command, config.args.clone())
    }

    fn build_args(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace(PATH_PLACEHOLDER, &path))
            .collect();
        if !self.args.iter().any(|arg| arg.contains(PATH_PLACEHOLDER)) {
            args.push(path.into_owned());
        }
        args
    }
}

impl Default for CommandAudioPlayer {
    fn default() -> Self {
        Self::from_config(&FileAudioConfig::default())
    }
}

impl AudioPlayer for CommandAudioPlayer {
    fn play(&self, path: &Path) -> Result<(), PlaybackError> {
        if !path.exists() {
            return Err(PlaybackError::NotFound(path.to_path_buf()));
        }

        let args = self.build_args(path);
        debug!(program = %self.program, ?args, "Playing clip");
        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| PlaybackError::Spawn(format!("{}: {e}", self.program)))?;

        if status.success() {
            Ok(())
        } else {
            Err(PlaybackError::Failed(status.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_invocation() {
        let player = CommandAudioPlayer::default();
        assert_eq!(player.program, "ffplay");
        assert_eq!(
            player.build_args(Path::new("/tmp/a.mp3")),
            vec!["-nodisp", "-autoexit", "-loglevel", "quiet", "/tmp/a.mp3"]
        );
    }

    #[test]
    fn test_path_appended_without_placeholder() {
        let player = CommandAudioPlayer::new("mpv", vec!["--no-video".into()]);
        assert_eq!(
            player.build_args(Path::new("clip.mp3")),
            vec!["--no-video", "clip.mp3"]
        );
    }

    #[test]
    fn test_missing_file() {
        let player = CommandAudioPlayer::default();
        let err = player.play(Path::new("/nonexistent/clip.mp3")).unwrap_err();
        assert!(matches!(err, PlaybackError::NotFound(_)));
    }

    #[test]
    fn test_missing_program() {
        let clip = tempfile::NamedTempFile::new().unwrap();
        let player = CommandAudioPlayer::new("tavern-no-such-player", Vec::new());
        assert!(matches!(
            player.play(clip.path()),
            Err(PlaybackError::Spawn(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_is_checked() {
        let clip = tempfile::NamedTempFile::new().unwrap();
        assert!(CommandAudioPlayer::new("true", Vec::new()).play(clip.path()).is_ok());
        assert!(matches!(
            CommandAudioPlayer::new("false", Vec::new()).play(clip.path()),
            Err(PlaybackError::Failed(_))
        ));
    }
}
