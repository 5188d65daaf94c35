use rayon::prelude::*;
use image::RgbImage;

use crate::processing::histogram::{luma_plane, plane_histogram};

// Progi decyzyjne (skala 0..255)
pub const UNDEREXPOSED_MEAN: f64 = 80.0;
pub const OVEREXPOSED_MEAN: f64 = 180.0;
pub const LOW_CONTRAST_STD: f64 = 40.0;
pub const CLIPPING_PCT: f64 = 2.0;

pub const LINE_UNDEREXPOSED: &str = "underexposed";
pub const LINE_OVEREXPOSED: &str = "overexposed";
pub const LINE_BRIGHTNESS_OK: &str = "brightness OK";
pub const LINE_LOW_CONTRAST: &str = "low contrast";
pub const LINE_CONTRAST_OK: &str = "contrast OK";
pub const LINE_BLACK_CLIPPING: &str = "significant black-pixel clipping";
pub const LINE_WHITE_CLIPPING: &str = "significant white-pixel clipping";

/// Quality statistics of a single photograph plus the verdict of the
/// decision table.
#[derive(Debug, Clone)]
pub struct QualityReport {
    pub mean: f64,
    pub std_dev: f64,
    pub black_pct: f64,
    pub white_pct: f64,
    pub diagnostics: Vec<String>,
    pub needs_fix: bool,
}

/// Computes the four scalar statistics from the luma plane of `image` and
/// applies the decision table. Deterministic, no side effects.
pub fn diagnose(image: &RgbImage) -> QualityReport {
    let plane = luma_plane(image);
    diagnose_plane(&plane)
}

/// Diagnosis over a raw intensity plane. Caller guarantees a non-empty plane.
pub fn diagnose_plane(plane: &[u8]) -> QualityReport {
    debug_assert!(!plane.is_empty());
    let total = plane.len() as f64;

    let sum: f64 = plane.par_iter().map(|&v| v as f64).sum();
    let mean = sum / total;

    // odchylenie standardowe populacyjne
    let var = plane
        .par_iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / total;
    let std_dev = var.sqrt();

    let bins = plane_histogram(plane);
    let black_pct = bins[0] as f64 / total * 100.0;
    let white_pct = bins[255] as f64 / total * 100.0;

    let (diagnostics, needs_fix) = classify(mean, std_dev, black_pct, white_pct);

    QualityReport {
        mean,
        std_dev,
        black_pct,
        white_pct,
        diagnostics,
        needs_fix,
    }
}

/// The fixed, ordered decision table. Clipping never sets the flag.
fn classify(mean: f64, std_dev: f64, black_pct: f64, white_pct: f64) -> (Vec<String>, bool) {
    let mut lines = Vec::with_capacity(4);
    let mut needs_fix = false;

    if mean < UNDEREXPOSED_MEAN {
        lines.push(LINE_UNDEREXPOSED.to_string());
        needs_fix = true;
    } else if mean > OVEREXPOSED_MEAN {
        lines.push(LINE_OVEREXPOSED.to_string());
        needs_fix = true;
    } else {
        lines.push(LINE_BRIGHTNESS_OK.to_string());
    }

    if std_dev < LOW_CONTRAST_STD {
        lines.push(LINE_LOW_CONTRAST.to_string());
        needs_fix = true;
    } else {
        lines.push(LINE_CONTRAST_OK.to_string());
    }

    if black_pct > CLIPPING_PCT {
        lines.push(LINE_BLACK_CLIPPING.to_string());
    }
    if white_pct > CLIPPING_PCT {
        lines.push(LINE_WHITE_CLIPPING.to_string());
    }

    (lines, needs_fix)
}
