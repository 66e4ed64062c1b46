//! JSON configuration of the command-line tools.
pub mod corners;
pub mod registration;

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read and parse a JSON config file.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_names_the_path() {
        let err = load_config::<corners::DetectCornersConfig>(Path::new("/nonexistent/cfg.json"))
            .unwrap_err();
        assert!(err.contains("/nonexistent/cfg.json"), "{err}");
    }
}
