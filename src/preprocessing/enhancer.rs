//! Default document enhancer

use super::{Enhancement, ImageEnhancer, PreprocessingConfig};
use crate::domain::PreprocessingError;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::equalize_histogram;
use imageproc::edges::canny;
use imageproc::filter::median_filter;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::hough::{detect_lines, LineDetectionOptions};

/// Skew below this many degrees is left alone
const MIN_SKEW_DEGREES: f32 = 0.5;

/// Lines further than this from horizontal are not text baselines
const MAX_SKEW_DEGREES: f32 = 45.0;

/// Grayscale, deskew, contrast equalization and median denoising
#[derive(Debug, Clone, Default)]
pub struct DocumentEnhancer {
    config: PreprocessingConfig,
}

impl DocumentEnhancer {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }
}

impl ImageEnhancer for DocumentEnhancer {
    fn improve(&self, image: &DynamicImage) -> Result<Enhancement, PreprocessingError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(PreprocessingError::UnsupportedDimensions { width, height });
        }

        if !self.config.enabled {
            return Ok(Enhancement {
                image: image.clone(),
                operations: Vec::new(),
            });
        }

        let mut operations = vec!["grayscale".to_string()];
        let mut gray = image.to_luma8();

        if self.config.deskew {
            if let Some(angle) = estimate_skew(&gray) {
                gray = rotate_about_center(
                    &gray,
                    -angle.to_radians(),
                    Interpolation::Bilinear,
                    Luma([255u8]),
                );
                operations.push(format!("deskew({angle:.1}deg)"));
            }
        }

        if self.config.equalize_contrast {
            gray = equalize_histogram(&gray);
            operations.push("equalize_histogram".to_string());
        }

        if self.config.denoise && self.config.median_radius > 0 {
            let radius = self.config.median_radius;
            gray = median_filter(&gray, radius, radius);
            operations.push(format!("median_filter(r={radius})"));
        }

        tracing::debug!(width, height, operations = ?operations, "Image enhanced");

        Ok(Enhancement {
            image: DynamicImage::ImageLuma8(gray),
            operations,
        })
    }
}

/// Median skew of near-horizontal lines in degrees, clockwise positive.
///
/// Returns `None` when no line is found or the skew is negligible.
pub fn estimate_skew(gray: &GrayImage) -> Option<f32> {
    let edges = canny(gray, 50.0, 150.0);
    let lines = detect_lines(
        &edges,
        LineDetectionOptions {
            vote_threshold: 100,
            suppression_radius: 8,
        },
    );

    // horizontal lines have their normal at 90 degrees
    let mut angles: Vec<f32> = lines
        .iter()
        .map(|line| line.angle_in_degrees as f32 - 90.0)
        .filter(|angle| angle.abs() < MAX_SKEW_DEGREES)
        .collect();

    if angles.is_empty() {
        return None;
    }

    angles.sort_by(|a, b| a.total_cmp(b));
    let median = angles[angles.len() / 2];

    (median.abs() > MIN_SKEW_DEGREES).then_some(median)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn page() -> DynamicImage {
        let mut img = RgbImage::from_pixel(64, 48, image::Rgb([200, 200, 200]));
        for x in 8..56 {
            img.put_pixel(x, 20, image::Rgb([10, 10, 10]));
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_improve_returns_grayscale_same_size() {
        let enhancer = DocumentEnhancer::default();
        let enhancement = enhancer.improve(&page()).unwrap();

        assert_eq!(enhancement.image.width(), 64);
        assert_eq!(enhancement.image.height(), 48);
        assert!(matches!(enhancement.image, DynamicImage::ImageLuma8(_)));
        assert_eq!(enhancement.operations[0], "grayscale");
        assert!(enhancement
            .operations
            .iter()
            .any(|op| op == "equalize_histogram"));
    }

    #[test]
    fn test_disabled_passes_image_through() {
        let enhancer = DocumentEnhancer::new(PreprocessingConfig {
            enabled: false,
            ..Default::default()
        });
        let original = page();
        let enhancement = enhancer.improve(&original).unwrap();

        assert!(enhancement.operations.is_empty());
        assert_eq!(enhancement.image.as_bytes(), original.as_bytes());
    }

    #[test]
    fn test_zero_sized_image_rejected() {
        let enhancer = DocumentEnhancer::default();
        let err = enhancer.improve(&DynamicImage::new_luma8(0, 0)).unwrap_err();
        assert!(matches!(
            err,
            PreprocessingError::UnsupportedDimensions { .. }
        ));
    }

    #[test]
    fn test_blank_page_has_no_skew() {
        let blank = GrayImage::from_pixel(32, 32, Luma([255]));
        assert_eq!(estimate_skew(&blank), None);
    }
}
