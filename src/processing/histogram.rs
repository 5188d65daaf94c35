use rayon::prelude::*;
use image::RgbImage;

pub const BIN_COUNT: usize = 256;

/// Wagi luminancji (Rec.601), takie same jak w konwersji RGB->GRAY.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

/// Derives the grayscale intensity plane of an image (one u8 per pixel).
pub fn luma_plane(image: &RgbImage) -> Vec<u8> {
    image
        .as_raw()
        .par_chunks_exact(3)
        .map(|px| luma(px[0], px[1], px[2]))
        .collect()
}

/// 256-bucket histogram of a single intensity plane.
pub fn plane_histogram(plane: &[u8]) -> Vec<u32> {
    let chunk_size = (plane.len() / rayon::current_num_threads()).max(1024);
    plane
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut local = vec![0u32; BIN_COUNT];
            for &v in chunk {
                local[v as usize] += 1;
            }
            local
        })
        .reduce(
            || vec![0u32; BIN_COUNT],
            |mut acc, local| {
                for i in 0..BIN_COUNT {
                    acc[i] += local[i];
                }
                acc
            },
        )
}

#[derive(Debug, Clone)]
pub struct HistogramData {
    pub red_bins: Vec<u32>,
    pub green_bins: Vec<u32>,
    pub blue_bins: Vec<u32>,
    pub luminance_bins: Vec<u32>,
    pub total_pixels: u32,
}

impl HistogramData {
    /// Computes all four channel histograms in one parallel sweep.
    pub fn compute_from_rgb(image: &RgbImage) -> Self {
        let pixels = image.as_raw();
        let pixel_count = pixels.len() / 3;

        let chunk_size = (pixel_count / rayon::current_num_threads()).max(1024);
        let results: Vec<_> = pixels
            .par_chunks_exact(3)
            .chunks(chunk_size)
            .map(|chunk| {
                let mut local_r = vec![0u32; BIN_COUNT];
                let mut local_g = vec![0u32; BIN_COUNT];
                let mut local_b = vec![0u32; BIN_COUNT];
                let mut local_lum = vec![0u32; BIN_COUNT];

                for px in chunk {
                    local_r[px[0] as usize] += 1;
                    local_g[px[1] as usize] += 1;
                    local_b[px[2] as usize] += 1;
                    local_lum[luma(px[0], px[1], px[2]) as usize] += 1;
                }

                (local_r, local_g, local_b, local_lum)
            })
            .collect();

        let mut hist = HistogramData {
            red_bins: vec![0; BIN_COUNT],
            green_bins: vec![0; BIN_COUNT],
            blue_bins: vec![0; BIN_COUNT],
            luminance_bins: vec![0; BIN_COUNT],
            total_pixels: pixel_count as u32,
        };

        // Merge results
        for (local_r, local_g, local_b, local_lum) in results {
            for i in 0..BIN_COUNT {
                hist.red_bins[i] += local_r[i];
                hist.green_bins[i] += local_g[i];
                hist.blue_bins[i] += local_b[i];
                hist.luminance_bins[i] += local_lum[i];
            }
        }

        hist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        // 0.299*255 = 76.245
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn test_histogram_basic() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([255, 255, 255]));
        img.put_pixel(0, 1, Rgb([128, 128, 128]));
        img.put_pixel(1, 1, Rgb([128, 0, 255]));

        let hist = HistogramData::compute_from_rgb(&img);
        assert_eq!(hist.total_pixels, 4);
        assert_eq!(hist.red_bins[0], 1);
        assert_eq!(hist.red_bins[128], 2);
        assert_eq!(hist.red_bins[255], 1);
        assert_eq!(hist.green_bins[0], 2);
        assert_eq!(hist.blue_bins[255], 2);
        // kazdy kanal sumuje sie do liczby pikseli
        for bins in [&hist.red_bins, &hist.green_bins, &hist.blue_bins, &hist.luminance_bins] {
            assert_eq!(bins.iter().sum::<u32>(), 4);
        }
    }

    #[test]
    fn test_plane_histogram_matches_luminance_bins() {
        let img = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 13]));
        let hist = HistogramData::compute_from_rgb(&img);
        let plane = luma_plane(&img);
        let direct = plane_histogram(&plane);
        assert_eq!(direct, hist.luminance_bins);
    }
}
