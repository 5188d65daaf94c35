//! CLAHE: kafelkowa, ograniczona korekcja kontrastu na kanale luminancji.

use rayon::prelude::*;
use image::RgbImage;

use crate::processing::color::{lab_planes_to_rgb, rgb_to_lab_planes};

pub const CLIP_LIMIT: f32 = 3.0;
pub const TILE_GRID: (usize, usize) = (8, 8);

const BINS: usize = 256;

/// Local contrast enhancement of a photograph. The image is converted to
/// Lab, CLAHE runs on the L plane only and the chroma planes pass through
/// untouched, so hue and saturation survive the correction.
pub fn enhance(image: &RgbImage) -> RgbImage {
    let mut planes = rgb_to_lab_planes(image);
    planes.l = clahe_plane(
        &planes.l,
        planes.width as usize,
        planes.height as usize,
        TILE_GRID,
        CLIP_LIMIT,
    );
    lab_planes_to_rgb(&planes)
}

/// CLAHE over a single 8-bit plane.
///
/// `clip_limit` follows the OpenCV convention: the per-tile bucket cap is
/// `max(1, clip_limit * tile_area / 256)`.
pub fn clahe_plane(
    plane: &[u8],
    width: usize,
    height: usize,
    tiles: (usize, usize),
    clip_limit: f32,
) -> Vec<u8> {
    let (tiles_x, tiles_y) = tiles;
    assert!(tiles_x > 0 && tiles_y > 0);
    assert_eq!(plane.len(), width * height);

    let tile_w = width.div_ceil(tiles_x);
    let tile_h = height.div_ceil(tiles_y);
    let padded_w = tile_w * tiles_x;
    let padded_h = tile_h * tiles_y;

    // dopelnienie lustrzane, aby kazdy kafel byl pelny
    let padded: Vec<u8> = if padded_w == width && padded_h == height {
        plane.to_vec()
    } else {
        mirror_extend(plane, width, height, padded_w, padded_h)
    };

    let tile_area = tile_w * tile_h;
    let clip = ((clip_limit * tile_area as f32 / BINS as f32).max(1.0)) as u32;
    let lut_scale = (BINS as f32 - 1.0) / tile_area as f32;

    let luts: Vec<[u8; BINS]> = (0..tiles_x * tiles_y)
        .into_par_iter()
        .map(|idx| {
            let tx = idx % tiles_x;
            let ty = idx / tiles_x;
            tile_lut(&padded, padded_w, tile_w, tile_h, tx, ty, clip, lut_scale)
        })
        .collect();

    // interpolacja dwuliniowa miedzy czterema sasiednimi LUT-ami
    let mut out = vec![0u8; width * height];
    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let wy = fy - fy.floor();
        let ty0 = (fy.floor() as i32).clamp(0, tiles_y as i32 - 1) as usize;
        let ty1 = (fy.floor() as i32 + 1).clamp(0, tiles_y as i32 - 1) as usize;

        for (x, dst) in row.iter_mut().enumerate() {
            let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let wx = fx - fx.floor();
            let tx0 = (fx.floor() as i32).clamp(0, tiles_x as i32 - 1) as usize;
            let tx1 = (fx.floor() as i32 + 1).clamp(0, tiles_x as i32 - 1) as usize;

            let v = plane[y * width + x] as usize;
            let lut00 = luts[ty0 * tiles_x + tx0][v] as f32;
            let lut10 = luts[ty0 * tiles_x + tx1][v] as f32;
            let lut01 = luts[ty1 * tiles_x + tx0][v] as f32;
            let lut11 = luts[ty1 * tiles_x + tx1][v] as f32;

            let top = lut00 * (1.0 - wx) + lut10 * wx;
            let bottom = lut01 * (1.0 - wx) + lut11 * wx;
            *dst = (top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8;
        }
    });

    out
}

/// Histogram LUT of one tile: clip, redistribute, cumulate, scale.
fn tile_lut(
    padded: &[u8],
    padded_w: usize,
    tile_w: usize,
    tile_h: usize,
    tile_x: usize,
    tile_y: usize,
    clip: u32,
    lut_scale: f32,
) -> [u8; BINS] {
    let mut hist = [0u32; BINS];
    let x0 = tile_x * tile_w;
    let y0 = tile_y * tile_h;
    for y in y0..y0 + tile_h {
        let row = &padded[y * padded_w + x0..y * padded_w + x0 + tile_w];
        for &v in row {
            hist[v as usize] += 1;
        }
    }

    // przytnij histogram
    let mut clipped: u32 = 0;
    for bucket in hist.iter_mut() {
        if *bucket > clip {
            clipped += *bucket - clip;
            *bucket = clip;
        }
    }

    // rozdziel przyciete piksele
    let redist_batch = clipped / BINS as u32;
    let mut residual = (clipped - redist_batch * BINS as u32) as usize;
    if redist_batch > 0 {
        for bucket in hist.iter_mut() {
            *bucket += redist_batch;
        }
    }
    if residual != 0 {
        let residual_step = (BINS / residual).max(1);
        let mut i = 0;
        while i < BINS && residual > 0 {
            hist[i] += 1;
            i += residual_step;
            residual -= 1;
        }
    }

    // dystrybuanta -> LUT
    let mut lut = [0u8; BINS];
    let mut sum = 0u32;
    for (i, &count) in hist.iter().enumerate() {
        sum += count;
        lut[i] = (sum as f32 * lut_scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Mirror-extends a plane to `new_w` x `new_h` (boundary reflection).
fn mirror_extend(plane: &[u8], width: usize, height: usize, new_w: usize, new_h: usize) -> Vec<u8> {
    let max_x = width as i32 - 1;
    let max_y = height as i32 - 1;
    let mut out = vec![0u8; new_w * new_h];
    for y in 0..new_h {
        let src_y = (max_y - (y as i32 - max_y).abs()).clamp(0, max_y) as usize;
        for x in 0..new_w {
            let src_x = (max_x - (x as i32 - max_x).abs()).clamp(0, max_x) as usize;
            out[y * new_w + x] = plane[src_y * width + src_x];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::color::rgb_to_lab_planes;
    use image::Rgb;

    #[test]
    fn test_output_dimensions_match_input() {
        // wymiary niepodzielne przez siatke kafli
        let plane: Vec<u8> = (0..37 * 23).map(|i| (i % 251) as u8).collect();
        let out = clahe_plane(&plane, 37, 23, TILE_GRID, CLIP_LIMIT);
        assert_eq!(out.len(), plane.len());

        let img = RgbImage::from_fn(37, 23, |x, y| Rgb([(x * 7) as u8, (y * 11) as u8, 40]));
        let enhanced = enhance(&img);
        assert_eq!(enhanced.dimensions(), img.dimensions());
    }

    #[test]
    fn test_uniform_plane_stays_uniform() {
        let plane = vec![100u8; 128 * 128];
        let out = clahe_plane(&plane, 128, 128, TILE_GRID, CLIP_LIMIT);
        let first = out[0];
        assert!(out.iter().all(|&v| v == first));
        // redystrybucja przycietej masy przesuwa dystrybuante o kilka pozycji
        assert!((first as i32 - 100).abs() <= 5, "uniform drifted to {first}");
    }

    #[test]
    fn test_low_contrast_plane_gets_stretched() {
        // wąski zakres 110..145, po CLAHE rozstep musi wzrosnac
        let plane: Vec<u8> = (0..64 * 64).map(|i| 110 + (i % 36) as u8).collect();
        let out = clahe_plane(&plane, 64, 64, TILE_GRID, CLIP_LIMIT);
        let in_span = 35;
        let out_min = *out.iter().min().unwrap();
        let out_max = *out.iter().max().unwrap();
        println!("span before: {in_span}, after: {}", out_max - out_min);
        assert!(out_max - out_min > in_span);
    }

    #[test]
    fn test_enhance_keeps_gray_neutral() {
        // obraz szary pozostaje szary: chrominancja nietknieta
        let img = RgbImage::from_fn(64, 64, |x, y| {
            let v = 100 + ((x + y) % 30) as u8;
            Rgb([v, v, v])
        });
        let enhanced = enhance(&img);
        for px in enhanced.pixels() {
            let Rgb([r, g, b]) = *px;
            let max = r.max(g).max(b) as i32;
            let min = r.min(g).min(b) as i32;
            assert!(max - min <= 1, "gray pixel drifted: {r},{g},{b}");
        }
    }

    #[test]
    fn test_repeated_enhance_preserves_chroma_planes() {
        // lekko ciepla tonacja: duze rozjasnienie L nie wypada z gamutu
        let img = RgbImage::from_fn(48, 48, |x, y| {
            let v = 90 + ((x * 7 + y * 11) % 40) as u8;
            Rgb([v + 6, v, v - 6])
        });
        let once = enhance(&img);
        let twice = enhance(&once);

        let planes_once = rgb_to_lab_planes(&once);
        let planes_twice = rgb_to_lab_planes(&twice);
        for (a1, a2) in planes_once.a.iter().zip(planes_twice.a.iter()) {
            assert!((*a1 as i32 - *a2 as i32).abs() <= 2);
        }
        for (b1, b2) in planes_once.b.iter().zip(planes_twice.b.iter()) {
            assert!((*b1 as i32 - *b2 as i32).abs() <= 2);
        }
    }
}
