use super::TimingBreakdown;
use crate::corners::Corner;
use crate::robust::{HomographyType, Statistics};
use nalgebra::Matrix3;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
}

/// Output of the `detect_corners` tool.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CornerReport {
    pub input: InputDescriptor,
    pub max_corners: usize,
    /// Threshold applied to the response map in the last call.
    pub threshold: f32,
    pub corner_count: usize,
    pub corners: Vec<Corner>,
    pub timings: TimingBreakdown,
}

/// A match expressed in pixel coordinates of both frames.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPair {
    pub reference: [f64; 2],
    pub inspection: [f64; 2],
    pub score: f64,
    pub inlier: bool,
}

/// Output of the `register_pair` tool.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReport {
    pub reference: InputDescriptor,
    pub inspection: InputDescriptor,
    pub homography_type: HomographyType,
    /// Reference to inspection transform in full-resolution pixels.
    pub homography: Matrix3<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    pub reference_corners: usize,
    pub inspection_corners: usize,
    pub inlier_count: usize,
    pub matches: Vec<MatchedPair>,
    pub timings: TimingBreakdown,
}
