//! Redacted image rendering
//!
//! OCR backends report text, not word boxes, so [`GridRedactor`] estimates
//! where a match sits on the page: the cleaned text is laid out on a grid of
//! at least 100 columns by 50 rows stretched over the image, one text line
//! per row, and every grid cell covered by a match is obscured.

use super::RedactionMethod;
use crate::domain::{PiiMatch, RedactionError};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const GRID_COLUMNS: usize = 100;
const GRID_ROWS: usize = 50;
const JPEG_QUALITY: u8 = 95;
const BLUR_SIGMA: f32 = 8.0;
const PIXEL_BLOCK: u32 = 8;

/// Renders a copy of the page with PII regions obscured
pub trait ImageRedactor: Send + Sync {
    /// Write the redacted image to `output_path` and return the path written
    fn render_redacted(
        &self,
        image: &DynamicImage,
        matches: &[PiiMatch],
        text: &str,
        method: RedactionMethod,
        output_path: &Path,
    ) -> Result<PathBuf, RedactionError>;
}

/// `redacted_<stem>.jpg` for an input image path
pub fn redacted_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    format!("redacted_{stem}.jpg")
}

/// Pixel rectangle on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Character grid laid over the page
#[derive(Debug, Clone)]
pub struct TextGrid {
    /// `(row, column)` of every character; `None` for line breaks
    cells: Vec<Option<(usize, usize)>>,
    columns: usize,
    rows: usize,
}

impl TextGrid {
    pub fn layout(text: &str) -> Self {
        let mut cells = Vec::with_capacity(text.len());
        let (mut row, mut col) = (0usize, 0usize);

        for ch in text.chars() {
            if col == GRID_COLUMNS {
                row += 1;
                col = 0;
            }
            if ch == '\n' {
                cells.push(None);
                row += 1;
                col = 0;
            } else {
                cells.push(Some((row, col)));
                col += 1;
            }
        }

        Self {
            cells,
            columns: GRID_COLUMNS,
            rows: GRID_ROWS.max(row + 1),
        }
    }

    /// Runs of cells covered by `[start, end)`, one per grid row
    fn runs(&self, start: usize, end: usize) -> Vec<(usize, usize, usize)> {
        let mut runs: Vec<(usize, usize, usize)> = Vec::new();
        let end = end.min(self.cells.len());

        let covered = self.cells.get(start..end).unwrap_or(&[]);
        for &(row, col) in covered.iter().flatten() {
            match runs.last_mut() {
                Some((r, _, last)) if *r == row && *last == col => *last = col + 1,
                _ => runs.push((row, col, col + 1)),
            }
        }
        runs
    }

    /// Page regions covered by a match
    pub fn regions(&self, m: &PiiMatch, width: u32, height: u32) -> Vec<Region> {
        let cell_w = width as f64 / self.columns as f64;
        let cell_h = height as f64 / self.rows as f64;

        self.runs(m.start_pos(), m.end_pos())
            .into_iter()
            .filter_map(|(row, first, last)| {
                let x1 = ((first as f64 * cell_w).floor() as u32).min(width);
                let x2 = ((last as f64 * cell_w).ceil() as u32).min(width);
                let y1 = ((row as f64 * cell_h).floor() as u32).min(height);
                let y2 = (((row + 1) as f64 * cell_h).ceil() as u32).min(height);
                (x2 > x1 && y2 > y1).then_some(Region {
                    x: x1,
                    y: y1,
                    width: x2 - x1,
                    height: y2 - y1,
                })
            })
            .collect()
    }
}

/// Grid-estimate redactor writing JPEG output
#[derive(Debug, Clone, Default)]
pub struct GridRedactor;

impl GridRedactor {
    pub fn new() -> Self {
        Self
    }

    fn obscure(&self, page: &mut RgbImage, region: Region, method: RedactionMethod) {
        match method {
            RedactionMethod::BlackBox => {
                let rect = Rect::at(region.x as i32, region.y as i32)
                    .of_size(region.width, region.height);
                draw_filled_rect_mut(page, rect, Rgb([0, 0, 0]));
            }
            RedactionMethod::Blur => {
                let patch = imageops::crop_imm(&*page, region.x, region.y, region.width, region.height)
                    .to_image();
                let blurred = imageops::blur(&patch, BLUR_SIGMA);
                imageops::replace(page, &blurred, region.x as i64, region.y as i64);
            }
            RedactionMethod::Pixelate => {
                let patch = imageops::crop_imm(&*page, region.x, region.y, region.width, region.height)
                    .to_image();
                let small = imageops::resize(
                    &patch,
                    (region.width / PIXEL_BLOCK).max(1),
                    (region.height / PIXEL_BLOCK).max(1),
                    FilterType::Nearest,
                );
                let blocky =
                    imageops::resize(&small, region.width, region.height, FilterType::Nearest);
                imageops::replace(page, &blocky, region.x as i64, region.y as i64);
            }
        }
    }
}

impl ImageRedactor for GridRedactor {
    fn render_redacted(
        &self,
        image: &DynamicImage,
        matches: &[PiiMatch],
        text: &str,
        method: RedactionMethod,
        output_path: &Path,
    ) -> Result<PathBuf, RedactionError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RedactionError::OutputLocation {
                path: parent.display().to_string(),
                message: e.to_string(),
            })?;
        }

        let mut page = image.to_rgb8();
        let (width, height) = page.dimensions();
        let grid = TextGrid::layout(text);

        let mut regions = 0usize;
        for m in matches {
            for region in grid.regions(m, width, height) {
                self.obscure(&mut page, region, method);
                regions += 1;
            }
        }

        let file = File::create(output_path).map_err(|e| RedactionError::OutputLocation {
            path: output_path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut writer = BufWriter::new(file);
        page.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY))?;
        writer
            .flush()
            .map_err(|e| RedactionError::Write(e.to_string()))?;

        tracing::info!(
            method = %method,
            matches = matches.len(),
            regions,
            path = %output_path.display(),
            "Redacted image written"
        );

        Ok(output_path.to_path_buf())
    }
}
