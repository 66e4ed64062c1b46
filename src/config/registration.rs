use crate::registration::RegistrationParams;
use serde::Deserialize;
use std::path::PathBuf;

/// Config of the `register_pair` tool.
#[derive(Debug, Deserialize)]
pub struct RegisterPairConfig {
    pub reference: PathBuf,
    pub inspection: PathBuf,
    #[serde(default)]
    pub registration: RegistrationParams,
    pub output: RegistrationOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationOutputConfig {
    pub report_json: PathBuf,
}
