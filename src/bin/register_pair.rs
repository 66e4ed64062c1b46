use feature_stab::config::load_config;
use feature_stab::config::registration::RegisterPairConfig;
use feature_stab::diagnostics::{InputDescriptor, MatchedPair, RegistrationReport};
use feature_stab::image::io::{load_grayscale_image, write_json_file};
use feature_stab::registration::FrameRegistration;
use std::env;
use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config: RegisterPairConfig = load_config(Path::new(&config_path))?;

    let reference = load_grayscale_image(&config.reference)?;
    let inspection = load_grayscale_image(&config.inspection)?;
    if (reference.width(), reference.height()) != (inspection.width(), inspection.height()) {
        return Err(format!(
            "Image sizes differ: {}x{} vs {}x{}",
            reference.width(),
            reference.height(),
            inspection.width(),
            inspection.height()
        ));
    }

    let params = config.registration;
    let mut registration =
        FrameRegistration::new(reference.width(), reference.height(), params);
    registration.add_frame(&reference.as_view(), true);
    let result = registration.add_frame(&inspection.as_view(), false);

    // Corner coordinates live at working resolution.
    let scale = if params.quarter_resolution { 2.0 } else { 1.0 };
    let ref_corners = registration.reference_corners();
    let ins_corners = registration.inspection_corners();
    let matches = registration
        .matches()
        .iter()
        .enumerate()
        .map(|(i, m)| MatchedPair {
            reference: [ref_corners[m.a].x * scale, ref_corners[m.a].y * scale],
            inspection: [ins_corners[m.b].x * scale, ins_corners[m.b].y * scale],
            score: m.score,
            inlier: result.inlier_indices.binary_search(&i).is_ok(),
        })
        .collect();

    let report = RegistrationReport {
        reference: InputDescriptor {
            width: reference.width(),
            height: reference.height(),
        },
        inspection: InputDescriptor {
            width: inspection.width(),
            height: inspection.height(),
        },
        homography_type: params.homography_type,
        homography: result.h_ref_to_ins,
        statistics: result.statistics,
        reference_corners: ref_corners.len(),
        inspection_corners: ins_corners.len(),
        inlier_count: result.nr_inliers,
        matches,
        timings: result.timing,
    };
    write_json_file(&config.output.report_json, &report)?;
    println!(
        "Registered with {} matches, {} inliers; report saved to {}",
        result.nr_matches,
        result.nr_inliers,
        config.output.report_json.display()
    );
    Ok(())
}

fn usage() -> String {
    "Usage: register_pair <config.json>".to_string()
}
