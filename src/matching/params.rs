use serde::{Deserialize, Serialize};

/// Correlation window size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchWindow {
    /// 5×5 samples.
    Small,
    /// 11×11 samples.
    #[default]
    Medium,
    /// 21×21 samples.
    Large,
}

impl PatchWindow {
    /// Window side length in pixels.
    pub const fn side(self) -> usize {
        match self {
            PatchWindow::Small => 5,
            PatchWindow::Medium => 11,
            PatchWindow::Large => 21,
        }
    }

    pub const fn radius(self) -> usize {
        self.side() / 2
    }

    /// Number of samples per patch.
    pub const fn len(self) -> usize {
        self.side() * self.side()
    }
}

/// Matcher options beyond the disparity and target count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherOptions {
    /// Separate vertical disparity as a fraction of the image height. When
    /// set, the search window is a rectangle instead of an ellipse.
    pub max_disparity_v: Option<f64>,
    pub window: PatchWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_sizes() {
        assert_eq!(PatchWindow::Small.len(), 25);
        assert_eq!(PatchWindow::Medium.radius(), 5);
        assert_eq!(PatchWindow::Large.len(), 441);
        let opts: MatcherOptions = serde_json::from_str(r#"{"window": "large"}"#).unwrap();
        assert_eq!(opts.window, PatchWindow::Large);
        assert_eq!(opts.max_disparity_v, None);
    }
}
