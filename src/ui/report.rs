use anyhow::anyhow;
use image::RgbImage;
use slint::{ComponentHandle, Image, Rgba8Pixel, SharedPixelBuffer};

use crate::processing::histogram::HistogramData;
use crate::{CompareWindow, OverviewWindow};

/// Kopiuje piksele RGB do bufora Slint (alpha = 255).
fn to_slint_image(image: &RgbImage) -> Image {
    let mut buffer = SharedPixelBuffer::<Rgba8Pixel>::new(image.width(), image.height());
    let slice = buffer.make_mut_slice();
    for (dst, px) in slice.iter_mut().zip(image.as_raw().chunks_exact(3)) {
        *dst = Rgba8Pixel {
            r: px[0],
            g: px[1],
            b: px[2],
            a: 255,
        };
    }
    Image::from_rgba8(buffer)
}

/// Buduje komendy SVG dla krzywej histogramu w viewboxie 256x100.
/// Wartosci sa normalizowane do najwyzszego slupka.
fn polyline_commands(bins: &[u32]) -> String {
    let peak = bins.iter().copied().max().unwrap_or(0).max(1) as f32;
    let mut cmds = String::with_capacity(bins.len() * 12);
    for (i, &count) in bins.iter().enumerate() {
        let y = 100.0 - count as f32 / peak * 100.0;
        if i == 0 {
            cmds.push_str(&format!("M 0 {y:.1}"));
        } else {
            cmds.push_str(&format!(" L {i} {y:.1}"));
        }
    }
    cmds
}

/// Shows the 2x2 overview: photo, luminance histogram, RGB histograms and
/// the console note. Blocks until the window is closed.
pub fn show_overview(image: &RgbImage, hist: &HistogramData) -> anyhow::Result<()> {
    let ui = OverviewWindow::new().map_err(|e| anyhow!("creating overview window: {e}"))?;

    ui.set_photo(to_slint_image(image));
    ui.set_gray_commands(polyline_commands(&hist.luminance_bins).into());
    ui.set_red_commands(polyline_commands(&hist.red_bins).into());
    ui.set_green_commands(polyline_commands(&hist.green_bins).into());
    ui.set_blue_commands(polyline_commands(&hist.blue_bins).into());

    ui.run().map_err(|e| anyhow!("overview window: {e}"))?;
    Ok(())
}

/// Shows the stacked before/after comparison. Blocks until closed.
pub fn show_comparison(original: &RgbImage, enhanced: &RgbImage) -> anyhow::Result<()> {
    let ui = CompareWindow::new().map_err(|e| anyhow!("creating compare window: {e}"))?;

    ui.set_original(to_slint_image(original));
    ui.set_enhanced(to_slint_image(enhanced));

    ui.run().map_err(|e| anyhow!("compare window: {e}"))?;
    Ok(())
}
