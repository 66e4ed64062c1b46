use feature_stab::config::corners::DetectCornersConfig;
use feature_stab::config::load_config;
use feature_stab::corners::CornerDetector;
use feature_stab::diagnostics::timing::elapsed_ms;
use feature_stab::diagnostics::{CornerReport, InputDescriptor, TimingBreakdown};
use feature_stab::image::io::{load_grayscale_image, save_strength_map, write_json_file};
use feature_stab::image::ImageF32;
use std::env;
use std::path::Path;
use std::time::Instant;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config: DetectCornersConfig = load_config(Path::new(&config_path))?;

    let gray = load_grayscale_image(&config.input)?;
    let view = gray.as_view();
    let total = Instant::now();
    let mut timings = TimingBreakdown::default();

    let mut detector = timings.measure("init", || {
        CornerDetector::with_params(view.w, view.h, &config.detector)
    });
    let corners = if config.float_input {
        let float = timings.measure("convert", || ImageF32::from_u8(&view));
        timings.measure("detect", || detector.detect(&float, None))
    } else {
        timings.measure("detect", || detector.detect(&view, None))
    };
    timings.total_ms = elapsed_ms(total);

    let report = CornerReport {
        input: InputDescriptor {
            width: view.w,
            height: view.h,
        },
        max_corners: detector.max_corners(),
        threshold: detector.last_threshold(),
        corner_count: corners.len(),
        corners,
        timings,
    };
    write_json_file(&config.output.corners_json, &report)?;
    println!(
        "Detected {} corners (max {}) in {:.2} ms; saved to {}",
        report.corner_count,
        report.max_corners,
        report.timings.total_ms,
        config.output.corners_json.display()
    );

    if let Some(path) = &config.output.strength_image {
        save_strength_map(detector.strength(), path)?;
        println!("Saved strength map to {}", path.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: detect_corners <config.json>".to_string()
}
