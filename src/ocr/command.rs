//! External command OCR engine
//!
//! Wraps any program (an EasyOCR sidecar script, a cloud CLI, ...) that takes
//! an image path and prints a single JSON object on stdout:
//!
//! ```json
//! {"text": "recognized text", "confidence": 0.87}
//! ```

use super::config::{CommandSettings, IMAGE_PLACEHOLDER};
use super::{spawn_error, OcrBackend, OcrReading, TempImage};
use crate::domain::BackendError;
use image::DynamicImage;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Deserialize)]
struct CommandOutput {
    text: String,
    confidence: f64,
}

/// OCR engine backed by an external program
pub struct CommandBackend {
    settings: CommandSettings,
}

impl CommandBackend {
    pub fn new(settings: CommandSettings) -> Self {
        Self { settings }
    }

    /// Arguments with the image path substituted (or appended)
    fn arguments(&self, image_path: &Path) -> Vec<String> {
        let path = image_path.to_string_lossy();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .settings
            .args
            .iter()
            .map(|arg| {
                if arg.contains(IMAGE_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(IMAGE_PLACEHOLDER, &path)
                } else {
                    arg.clone()
                }
            })
            .collect();

        if !substituted {
            args.push(path.to_string());
        }
        args
    }
}

impl OcrBackend for CommandBackend {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn extract(&self, image: &DynamicImage) -> Result<OcrReading, BackendError> {
        let temp = TempImage::write(image, &self.settings.name)?;
        let args = self.arguments(temp.path());

        tracing::debug!(
            engine = %self.settings.name,
            program = %self.settings.program,
            "Running OCR command"
        );

        let output = Command::new(&self.settings.program)
            .args(&args)
            .output()
            .map_err(|e| spawn_error(&self.settings.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Execution(format!(
                "{} exited with {}: {}",
                self.settings.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the JSON object printed by a command engine
pub fn parse_output(stdout: &str) -> Result<OcrReading, BackendError> {
    let parsed: CommandOutput = serde_json::from_str(stdout.trim())
        .map_err(|e| BackendError::InvalidOutput(format!("Expected JSON text/confidence: {e}")))?;
    Ok(OcrReading::new(parsed.text, parsed.confidence))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(args: &[&str]) -> CommandBackend {
        CommandBackend::new(CommandSettings {
            name: "sidecar".to_string(),
            program: "ocr-sidecar".to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_placeholder_substituted() {
        let args = backend(&["--input={image}", "--json"]).arguments(Path::new("/tmp/a.png"));
        assert_eq!(args, vec!["--input=/tmp/a.png", "--json"]);
    }

    #[test]
    fn test_path_appended_without_placeholder() {
        let args = backend(&["--json"]).arguments(Path::new("/tmp/a.png"));
        assert_eq!(args, vec!["--json", "/tmp/a.png"]);
    }

    #[test]
    fn test_parse_output() {
        let reading = parse_output("{\"text\": \"hello world\", \"confidence\": 0.9}\n").unwrap();
        assert_eq!(reading, OcrReading::new("hello world", 0.9));
    }

    #[test]
    fn test_parse_output_rejects_plain_text() {
        let err = parse_output("hello world").unwrap_err();
        assert!(matches!(err, BackendError::InvalidOutput(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_program_and_reads_json() {
        let backend = CommandBackend::new(CommandSettings {
            name: "echo".to_string(),
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "test -f \"$1\" && echo '{\"text\":\"from sidecar\",\"confidence\":0.75}'".to_string(),
                "sh".to_string(),
                "{image}".to_string(),
            ],
        });

        let reading = backend.extract(&DynamicImage::new_luma8(4, 4)).unwrap();
        assert_eq!(reading.text, "from sidecar");
        assert_eq!(reading.confidence, 0.75);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_execution_error() {
        let backend = CommandBackend::new(CommandSettings {
            name: "fail".to_string(),
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo oops >&2; exit 3".to_string()],
        });

        let err = backend.extract(&DynamicImage::new_luma8(4, 4)).unwrap_err();
        assert!(matches!(err, BackendError::Execution(ref m) if m.contains("oops")));
    }
}
