use std::path::Path;

use anyhow::Context;
use image::RgbImage;

/// Naglowek identyfikujacy klienta przy pobieraniu zdjecia.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Downloads and decodes a photograph. Any non-2xx status or undecodable
/// body is an error; the caller decides whether to fall back.
///
/// The `image` decoder hands the pixels back in RGB order regardless of the
/// on-wire byte layout, so every consumer downstream can assume RGB.
pub fn fetch_from_url(url: &str) -> anyhow::Result<RgbImage> {
    let client = reqwest::blocking::Client::new();
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .with_context(|| format!("GET {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("HTTP {status} for {url}");
    }

    let bytes = response.bytes().context("reading response body")?;
    let decoded = image::load_from_memory(&bytes)
        .context("response body is not a decodable image")?;
    Ok(decoded.to_rgb8())
}

/// Reads and decodes a photograph from disk, normalized to RGB.
pub fn load_local(path: &Path) -> anyhow::Result<RgbImage> {
    let decoded = image::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(decoded.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_load_local_missing_file() {
        let result = load_local(Path::new("definitely-not-here.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_local_rejects_garbage() {
        let path = std::env::temp_dir().join("fotodiag_garbage_input");
        std::fs::write(&path, b"to nie jest obraz").unwrap();
        assert!(load_local(&path).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_local_round_trip() {
        let path = std::env::temp_dir().join("fotodiag_round_trip.png");
        let img = RgbImage::from_fn(5, 4, |x, y| Rgb([x as u8 * 40, y as u8 * 50, 7]));
        img.save(&path).unwrap();

        let loaded = load_local(&path).unwrap();
        assert_eq!(loaded.dimensions(), (5, 4));
        assert_eq!(loaded.get_pixel(2, 3), img.get_pixel(2, 3));
        std::fs::remove_file(&path).ok();
    }
}
