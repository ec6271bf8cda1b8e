//! Tesseract OCR engine (CLI wrapper)

use super::config::TesseractSettings;
use super::{spawn_error, OcrBackend, OcrReading, TempImage};
use crate::domain::BackendError;
use image::DynamicImage;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

/// Runs the `tesseract` binary and parses its TSV output
pub struct TesseractBackend {
    name: String,
    settings: TesseractSettings,
}

impl TesseractBackend {
    pub fn new(settings: TesseractSettings) -> Self {
        let name = settings
            .name
            .clone()
            .unwrap_or_else(|| "tesseract".to_string());
        Self { name, settings }
    }

    fn binary_path(&self) -> &str {
        self.settings.binary_path.as_deref().unwrap_or("tesseract")
    }

    /// Version string reported by `tesseract --version`
    pub fn version(&self) -> Result<String, BackendError> {
        let output = Command::new(self.binary_path())
            .arg("--version")
            .output()
            .map_err(|e| spawn_error(self.binary_path(), e))?;

        // older releases print the version on stderr
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).to_string()
        } else {
            String::from_utf8_lossy(&output.stdout).to_string()
        };

        text.lines()
            .next()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .ok_or_else(|| BackendError::InvalidOutput("empty version output".to_string()))
    }

    fn recognize_file(&self, image_path: &Path) -> Result<String, BackendError> {
        let mut cmd = Command::new(self.binary_path());
        cmd.arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.settings.lang)
            .arg("--psm")
            .arg(self.settings.psm.to_string())
            .arg("--oem")
            .arg(self.settings.oem.to_string())
            .arg("tsv");

        if let Some(tessdata_path) = &self.settings.tessdata_path {
            cmd.env("TESSDATA_PREFIX", tessdata_path);
        }

        tracing::debug!(
            binary = %self.binary_path(),
            lang = %self.settings.lang,
            psm = self.settings.psm,
            oem = self.settings.oem,
            "Running tesseract"
        );

        let output = cmd
            .output()
            .map_err(|e| spawn_error(self.binary_path(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Execution(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, image: &DynamicImage) -> Result<OcrReading, BackendError> {
        let started = Instant::now();
        let temp = TempImage::write(image, &self.name)?;
        let tsv = self.recognize_file(temp.path())?;
        let reading = parse_tsv(&tsv, self.settings.min_word_confidence)?;

        tracing::debug!(
            engine = %self.name,
            confidence = reading.confidence,
            duration_ms = started.elapsed().as_millis() as u64,
            "Tesseract recognition complete"
        );

        Ok(reading)
    }
}

/// Parse Tesseract TSV output into text and mean word confidence.
///
/// Columns: `level page_num block_num par_num line_num word_num left top
/// width height conf text`. Only word rows (level 5) with confidence above
/// `min_word_confidence` are kept. Line breaks follow Tesseract's
/// block/paragraph/line numbering.
pub fn parse_tsv(tsv: &str, min_word_confidence: f64) -> Result<OcrReading, BackendError> {
    let mut lines = tsv.lines();
    match lines.next() {
        Some(header) if header.starts_with("level") => {}
        _ => {
            return Err(BackendError::InvalidOutput(
                "missing TSV header".to_string(),
            ))
        }
    }

    let mut text = String::new();
    let mut confidence_sum = 0.0;
    let mut word_count = 0usize;
    let mut current_line: Option<(u32, u32, u32, u32)> = None;

    for line in lines {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }

        let level: i32 = cols[0].parse().unwrap_or(-1);
        let conf: f64 = cols[10].parse().unwrap_or(-1.0);
        let word = cols[11].trim();

        if level != 5 || word.is_empty() || conf <= min_word_confidence {
            continue;
        }

        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );

        match current_line {
            Some(previous) if previous == key => text.push(' '),
            Some(_) => text.push('\n'),
            None => {}
        }
        current_line = Some(key);

        text.push_str(word);
        confidence_sum += conf;
        word_count += 1;
    }

    let confidence = if word_count == 0 {
        0.0
    } else {
        confidence_sum / word_count as f64 / 100.0
    };

    Ok(OcrReading { text, confidence })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word(block: u32, line: u32, conf: f64, text: &str) -> String {
        format!("5\t1\t{block}\t1\t{line}\t1\t0\t0\t10\t10\t{conf}\t{text}")
    }

    #[test]
    fn test_parse_tsv_joins_words_and_lines() {
        let tsv = [
            HEADER.to_string(),
            "1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t".to_string(),
            word(1, 1, 90.0, "Patient:"),
            word(1, 1, 80.0, "Jane"),
            word(1, 2, 70.0, "MRN"),
        ]
        .join("\n");

        let reading = parse_tsv(&tsv, 30.0).unwrap();
        assert_eq!(reading.text, "Patient: Jane\nMRN");
        assert!((reading.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_parse_tsv_drops_low_confidence_words() {
        let tsv = [
            HEADER.to_string(),
            word(1, 1, 95.0, "clear"),
            word(1, 1, 12.0, "sm#dge"),
            word(1, 1, 30.0, "edge"),
        ]
        .join("\n");

        let reading = parse_tsv(&tsv, 30.0).unwrap();
        assert_eq!(reading.text, "clear");
        assert!((reading.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_parse_tsv_no_words() {
        let reading = parse_tsv(HEADER, 30.0).unwrap();
        assert!(reading.text.is_empty());
        assert_eq!(reading.confidence, 0.0);
    }

    #[test]
    fn test_parse_tsv_rejects_garbage() {
        assert!(parse_tsv("not tsv output", 30.0).is_err());
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let backend = TesseractBackend::new(TesseractSettings {
            binary_path: Some("/nonexistent/inkguard-tesseract".to_string()),
            ..Default::default()
        });
        let err = backend.extract(&DynamicImage::new_luma8(4, 4)).unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }
}
