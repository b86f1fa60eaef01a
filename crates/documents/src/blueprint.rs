//! Floor-area estimation from blueprint drawings.
//!
//! The drawing is reduced to an edge map, the outer contours are traced and
//! their enclosed areas summed. A `Scale: N` annotation found by OCR converts
//! pixel area to real-world units.

use crate::kind::DocumentKind;
use crate::ocr::{OcrEngine, PageLayout};
use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage};
use imageproc::contours::find_contours;
use imageproc::point::Point;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

const BLUR_SIGMA: f32 = 1.1;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AreaEstimate {
    pub estimated_area: f64,
    pub scale: f64,
    pub pixel_area: f64,
}

impl AreaEstimate {
    pub fn to_json(&self) -> Value {
        json!({
            "estimated_area": self.estimated_area,
            "scale": self.scale,
            "pixel_area": self.pixel_area,
        })
    }
}

/// Finds the scale factor in OCR output.
///
/// The first line mentioning "scale" (any case) that splits on `:` into
/// exactly two parts, with a right part made of digits and dots, wins.
/// Defaults to `1.0`.
pub fn parse_scale(ocr_text: &str) -> f64 {
    for line in ocr_text.lines() {
        if !line.to_lowercase().contains("scale") {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() != 2 {
            continue;
        }
        let value = parts[1].trim();
        let digits = value.replace('.', "");
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if let Ok(scale) = value.parse::<f64>() {
            return scale;
        }
    }
    1.0
}

/// Grayscale, Gaussian blur and Canny edge detection.
pub fn edge_map(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    let blurred = imageproc::filter::gaussian_blur_f32(&gray, BLUR_SIGMA);
    imageproc::edges::canny(&blurred, CANNY_LOW, CANNY_HIGH)
}

/// Sum of the areas enclosed by the outermost contours of a binary image.
pub fn contour_area(binary: &GrayImage) -> f64 {
    find_contours::<i32>(binary)
        .iter()
        .filter(|contour| contour.parent.is_none())
        .map(|contour| polygon_area(&contour.points))
        .sum()
}

/// Shoelace formula; the polygon is closed implicitly.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice_area.abs() as f64 / 2.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn estimate_area_from_image(image: &DynamicImage, scale: f64) -> AreaEstimate {
    let pixel_area = contour_area(&edge_map(image));
    AreaEstimate {
        estimated_area: round2(pixel_area * scale * scale),
        scale,
        pixel_area,
    }
}

/// Estimates the floor area of a blueprint image or PDF (first page).
pub async fn estimate_area(path: &Path, ocr: &dyn OcrEngine) -> Result<AreaEstimate> {
    let pages_dir = tempfile::tempdir().context("Failed to create temporary directory")?;

    let image_path: PathBuf = match DocumentKind::from_path(path) {
        Some(DocumentKind::Image) => path.to_path_buf(),
        Some(DocumentKind::Pdf) => ocr
            .rasterize_pdf(path, pages_dir.path(), true)
            .await?
            .into_iter()
            .next()
            .with_context(|| format!("No pages rendered from {}", path.display()))?,
        _ => anyhow::bail!("Blueprint must be a PDF or image: {}", path.display()),
    };

    let scale_text = ocr.recognize(&image_path, PageLayout::Auto).await?;
    let scale = parse_scale(&scale_text);
    info!("Detected blueprint scale 1:{}", scale);

    let estimate = tokio::task::spawn_blocking(move || -> Result<AreaEstimate> {
        let image = image::open(&image_path)
            .with_context(|| format!("Failed to open blueprint {}", image_path.display()))?;
        Ok(estimate_area_from_image(&image, scale))
    })
    .await
    .map_err(|e| anyhow::anyhow!("Blueprint processing aborted: {}", e))??;

    info!("Estimated blueprint area: {:.2} sq units", estimate.estimated_area);
    Ok(estimate)
}
