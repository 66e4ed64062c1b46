use crate::corners::DetectorParams;
use serde::Deserialize;
use std::path::PathBuf;

/// Config of the `detect_corners` tool.
#[derive(Debug, Deserialize)]
pub struct DetectCornersConfig {
    pub input: PathBuf,
    #[serde(default)]
    pub detector: DetectorParams,
    /// Run on the float conversion of the image instead of the bytes.
    #[serde(default)]
    pub float_input: bool,
    pub output: CornerOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct CornerOutputConfig {
    pub corners_json: PathBuf,
    /// Optional PNG of the Harris response normalized by its maximum.
    #[serde(default)]
    pub strength_image: Option<PathBuf>,
}
