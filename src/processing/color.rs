//! Konwersje sRGB <-> CIE Lab (D65) na planach 8-bitowych.
//!
//! Lab is quantized the OpenCV way: L 0..100 scaled to 0..255, a/b offset
//! by 128. Gray pixels (r == g == b) sit exactly at a = b = 128.

use rayon::prelude::*;
use image::RgbImage;

const D65_X: f32 = 0.95047;
const D65_Y: f32 = 1.00000;
const D65_Z: f32 = 1.08883;

// sRGB <-> XYZ (D65)
const SRGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];

const XYZ_TO_SRGB: [[f32; 3]; 3] = [
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
];

#[inline]
fn srgb_eotf(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn srgb_oetf(v: f32) -> f32 {
    if v <= 0.0031308 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn lab_f(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    const DELTA_CUBED: f32 = DELTA * DELTA * DELTA;
    if t > DELTA_CUBED {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

#[inline]
fn lab_f_inv(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

/// Rozdzielone plany L/a/b jednego obrazu.
#[derive(Debug, Clone)]
pub struct LabPlanes {
    pub l: Vec<u8>,
    pub a: Vec<u8>,
    pub b: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[inline]
fn lab8_from_srgb8(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let rl = srgb_eotf(r as f32 / 255.0);
    let gl = srgb_eotf(g as f32 / 255.0);
    let bl = srgb_eotf(b as f32 / 255.0);

    let x = SRGB_TO_XYZ[0][0] * rl + SRGB_TO_XYZ[0][1] * gl + SRGB_TO_XYZ[0][2] * bl;
    let y = SRGB_TO_XYZ[1][0] * rl + SRGB_TO_XYZ[1][1] * gl + SRGB_TO_XYZ[1][2] * bl;
    let z = SRGB_TO_XYZ[2][0] * rl + SRGB_TO_XYZ[2][1] * gl + SRGB_TO_XYZ[2][2] * bl;

    let fx = lab_f(x / D65_X);
    let fy = lab_f(y / D65_Y);
    let fz = lab_f(z / D65_Z);

    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);

    (
        (l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8,
        (a + 128.0).round().clamp(0.0, 255.0) as u8,
        (b + 128.0).round().clamp(0.0, 255.0) as u8,
    )
}

#[inline]
fn srgb8_from_lab8(l8: u8, a8: u8, b8: u8) -> (u8, u8, u8) {
    let l = l8 as f32 * 100.0 / 255.0;
    let a = a8 as f32 - 128.0;
    let b = b8 as f32 - 128.0;

    let fy = (l + 16.0) / 116.0;
    let fx = a / 500.0 + fy;
    let fz = fy - b / 200.0;

    let x = D65_X * lab_f_inv(fx);
    let y = D65_Y * lab_f_inv(fy);
    let z = D65_Z * lab_f_inv(fz);

    let rl = XYZ_TO_SRGB[0][0] * x + XYZ_TO_SRGB[0][1] * y + XYZ_TO_SRGB[0][2] * z;
    let gl = XYZ_TO_SRGB[1][0] * x + XYZ_TO_SRGB[1][1] * y + XYZ_TO_SRGB[1][2] * z;
    let bl = XYZ_TO_SRGB[2][0] * x + XYZ_TO_SRGB[2][1] * y + XYZ_TO_SRGB[2][2] * z;

    // kolory spoza gamutu obcinamy do zakresu
    (
        (srgb_oetf(rl.clamp(0.0, 1.0)) * 255.0).round() as u8,
        (srgb_oetf(gl.clamp(0.0, 1.0)) * 255.0).round() as u8,
        (srgb_oetf(bl.clamp(0.0, 1.0)) * 255.0).round() as u8,
    )
}

/// Splits an sRGB image into 8-bit L/a/b planes.
pub fn rgb_to_lab_planes(image: &RgbImage) -> LabPlanes {
    let lab: Vec<(u8, u8, u8)> = image
        .as_raw()
        .par_chunks_exact(3)
        .map(|px| lab8_from_srgb8(px[0], px[1], px[2]))
        .collect();

    let mut planes = LabPlanes {
        l: Vec::with_capacity(lab.len()),
        a: Vec::with_capacity(lab.len()),
        b: Vec::with_capacity(lab.len()),
        width: image.width(),
        height: image.height(),
    };
    for (l, a, b) in lab {
        planes.l.push(l);
        planes.a.push(a);
        planes.b.push(b);
    }
    planes
}

/// Merges 8-bit L/a/b planes back into an sRGB image.
pub fn lab_planes_to_rgb(planes: &LabPlanes) -> RgbImage {
    let mut out = RgbImage::new(planes.width, planes.height);
    let buffer: &mut [u8] = &mut out;
    buffer
        .par_chunks_exact_mut(3)
        .zip(
            planes
                .l
                .par_iter()
                .zip(planes.a.par_iter())
                .zip(planes.b.par_iter()),
        )
        .for_each(|(px, ((&l, &a), &b))| {
            let (r, g, bl) = srgb8_from_lab8(l, a, b);
            px[0] = r;
            px[1] = g;
            px[2] = bl;
        });
    out
}
