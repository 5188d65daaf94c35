slint::include_modules!();

mod io;
mod processing;
mod ui;

use std::path::Path;

use anyhow::Context;
use image::RgbImage;

use crate::io::image_source;
use crate::processing::clahe;
use crate::processing::histogram::HistogramData;
use crate::processing::quality::{self, QualityReport};

const PHOTO_URL: &str = "https://upload.wikimedia.org/wikipedia/commons/b/b0/N%C3%B8rre_Vorup%C3%B8r_Coast_one_third_sky_2012-11-18.jpg";
const FALLBACK_PATH: &str = "Coast.jpg";

fn main() -> anyhow::Result<()> {
    // Panic ma trafic do konsoli, a nie zniknac razem z oknem
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
    }));

    rayon::ThreadPoolBuilder::new()
        .num_threads((num_cpus::get() - 1).max(1))
        .build_global()
        .expect("Failed to initialize thread pool");

    let image = obtain_image()?;

    let hist = HistogramData::compute_from_rgb(&image);
    ui::report::show_overview(&image, &hist)?;

    let report = quality::diagnose(&image);
    print_report(&report);

    if report.needs_fix {
        println!("\nApplying CLAHE correction.");
        let improved = clahe::enhance(&image);
        ui::report::show_comparison(&image, &improved)?;
    } else {
        println!("\nNo correction applied.");
    }

    Ok(())
}

/// Pobranie z sieci, awaryjnie plik lokalny. Dopiero brak obu jest bledem.
fn obtain_image() -> anyhow::Result<RgbImage> {
    println!("Fetching photo from URL...");
    match image_source::fetch_from_url(PHOTO_URL) {
        Ok(img) => {
            println!("Remote fetch OK ({}x{}).", img.width(), img.height());
            Ok(img)
        }
        Err(e) => {
            eprintln!("[warn][fetch] {e:#}");
            println!("Falling back to local file {FALLBACK_PATH}.");
            let img = image_source::load_local(Path::new(FALLBACK_PATH))
                .context("local fallback failed")?;
            println!("Local fallback OK ({}x{}).", img.width(), img.height());
            Ok(img)
        }
    }
}

fn print_report(report: &QualityReport) {
    println!("\nAnalysis:");
    println!("Mean brightness: {:.2}", report.mean);
    println!("Contrast (std): {:.2}", report.std_dev);
    println!("Black %: {:.2}", report.black_pct);
    println!("White %: {:.2}", report.white_pct);
    for line in &report.diagnostics {
        println!("- {line}");
    }
}
