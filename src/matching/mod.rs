//! Corner matching by normalized cross-correlation with spatial bucketing.
//!
//! # Algorithm Outline
//! 1. Both corner lists are sorted into a grid of cells sized by the maximum
//!    disparity; each cell holds a bounded number of points.
//! 2. For every left point, every right point in the 3×3 neighbouring cells
//!    that passes the disparity test is scored by signed squared NCC.
//! 3. Each point remembers its best partner; a pair is reported only when the
//!    choice is mutual.
//!
//! The right corners can optionally be prewarped by a homography estimate so
//! that cells line up despite large motion.

pub mod buckets;
pub mod ncc;
pub mod params;
pub mod patch;
pub mod prewarp;

pub use ncc::{DisparityGate, PatchStats};
pub use params::{MatcherOptions, PatchWindow};
pub use prewarp::{AffinePatchWarp, AffineSampling, Prewarp};

use crate::corners::Corner;
use crate::homography::apply_homography;
use crate::image::ImageSample;
use buckets::{BucketGrid, PointInfo, Slot};
use log::{debug, warn};
use nalgebra::Matrix3;
use patch::PatchArena;
use serde::Serialize;

/// Bound on prewarped coordinates; anything beyond is outside every grid.
const MAX_WARPED: f64 = 1e9;

/// A mutually consistent correspondence between `corners_a[a]` and `corners_b[b]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Match {
    pub a: usize,
    pub b: usize,
    pub score: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PatchMatcher {
    w: usize,
    h: usize,
    bw: usize,
    bh: usize,
    nr_h: usize,
    nr_v: usize,
    target: usize,
    window: PatchWindow,
    gate: Option<DisparityGate>,
    left: BucketGrid,
    right: BucketGrid,
    patches: PatchArena,
}

impl PatchMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the matcher for `width × height` images. `max_disparity` is a
    /// fraction of the image width (and height unless
    /// `options.max_disparity_v` is set). Returns the maximum number of
    /// matches a call can produce.
    pub fn init(
        &mut self,
        width: usize,
        height: usize,
        max_disparity: f64,
        target_count: usize,
        options: &MatcherOptions,
    ) -> usize {
        let (wf, hf) = (width as f64, height as f64);
        let (gate, bw, bh, capacity) = match options.max_disparity_v {
            Some(disp_v) => (
                DisparityGate::rectangular(width, height, max_disparity, disp_v),
                ((max_disparity * wf) as usize).max(1),
                ((disp_v * hf) as usize).max(1),
                ((target_count as f64 * max_disparity * disp_v) as usize).max(1),
            ),
            None => (
                DisparityGate::elliptical(width, height, max_disparity),
                ((max_disparity * wf) as usize).max(1),
                ((max_disparity * hf) as usize).max(1),
                ((target_count as f64 * max_disparity * max_disparity) as usize).max(1),
            ),
        };
        self.w = width;
        self.h = height;
        self.bw = bw;
        self.bh = bh;
        self.nr_h = 1 + width.saturating_sub(1) / bw;
        self.nr_v = 1 + height.saturating_sub(1) / bh;
        self.target = target_count;
        self.window = options.window;
        self.gate = Some(gate);
        self.left = BucketGrid::new(self.nr_h, self.nr_v, capacity);
        self.right = BucketGrid::new(self.nr_h, self.nr_v, capacity);
        let max_patches = 2 * (self.nr_h + 2) * (self.nr_v + 2) * capacity;
        self.patches = PatchArena::with_capacity(self.window.len(), max_patches);
        debug!(
            "PatchMatcher::init {}x{} cells={}x{} cell_size={}x{} capacity={} window={}",
            width,
            height,
            self.nr_h,
            self.nr_v,
            bw,
            bh,
            capacity,
            self.window.side()
        );
        self.target
    }

    /// Match `corners_a` in `image_a` against `corners_b` in `image_b`.
    ///
    /// With a prewarp, right corners are bucketed and gated at their warped
    /// positions while their patches are still read around the original
    /// location.
    pub fn match_corners<I: ImageSample>(
        &mut self,
        image_a: &I,
        image_b: &I,
        corners_a: &[Corner],
        corners_b: &[Corner],
        prewarp: &Prewarp,
    ) -> Vec<Match> {
        let Some(gate) = self.gate else {
            warn!("PatchMatcher::match_corners called before init");
            return Vec::new();
        };
        self.patches.clear();
        self.fill_unwarped(Side::Left, image_a, corners_a);
        match prewarp {
            Prewarp::None => self.fill_unwarped(Side::Right, image_b, corners_b),
            Prewarp::Homography(h) => self.fill_prewarped(image_b, corners_b, h, None),
            Prewarp::Affine { h, sampling } => {
                if self.window != PatchWindow::Medium {
                    debug!("affine patch warping needs 11x11 windows; prewarping positions only");
                    self.fill_prewarped(image_b, corners_b, h, None);
                } else if let Some(warp) = AffinePatchWarp::new(h, *sampling, self.w, self.h) {
                    self.fill_prewarped(image_b, corners_b, h, Some(&warp));
                } else {
                    warn!("singular affine prewarp; matching without it");
                    self.fill_unwarped(Side::Right, image_b, corners_b);
                }
            }
        }

        self.score_neighbourhoods(gate);
        let matches = self.collect();
        debug!(
            "PatchMatcher: left={} right={} matches={}",
            self.left.total_points(),
            self.right.total_points(),
            matches.len()
        );
        matches
    }

    fn fill_unwarped<I: ImageSample>(&mut self, side: Side, image: &I, corners: &[Corner]) {
        let (bw, bh) = (self.bw as i64, self.bh as i64);
        let (nr_h, nr_v) = (self.nr_h as i64, self.nr_v as i64);
        let radius = self.window.radius();
        let grid = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        grid.clear();
        for (id, c) in corners.iter().enumerate() {
            let (xi, yi) = (c.x.round() as i64, c.y.round() as i64);
            if xi < 0 || yi < 0 || xi / bw >= nr_h || yi / bh >= nr_v {
                continue;
            }
            let Some(bucket) = grid.bucket_id(xi / bw, yi / bh) else {
                continue;
            };
            if grid.is_full(bucket) {
                continue;
            }
            let patch = self.patches.push_window(image, xi, yi, radius);
            grid.insert(bucket, point(xi, yi, id, patch));
        }
    }

    fn fill_prewarped<I: ImageSample>(
        &mut self,
        image: &I,
        corners: &[Corner],
        h: &Matrix3<f64>,
        warp: Option<&AffinePatchWarp>,
    ) {
        self.right.clear();
        let radius = self.window.radius();
        let (bw, bh) = (self.bw as i64, self.bh as i64);
        for (id, c) in corners.iter().enumerate() {
            let (xi, yi) = (c.x.round() as i64, c.y.round() as i64);
            let (wx, wy) = apply_homography(h, c.x, c.y);
            // Far-off or non-finite positions cannot land in the grid.
            if !wx.is_finite() || !wy.is_finite() || wx.abs() > MAX_WARPED || wy.abs() > MAX_WARPED {
                continue;
            }
            let (wxi, wyi) = (wx as i64, wy as i64);
            let bx = (wxi + bw) / bw - 1;
            let by = (wyi + bh) / bh - 1;
            let Some(bucket) = self.right.bucket_id(bx, by) else {
                continue;
            };
            if warp.is_some_and(|w| !w.contains(xi, yi)) {
                continue;
            }
            if self.right.is_full(bucket) {
                continue;
            }
            let patch = match warp {
                Some(w) => self.patches.push_samples(w.samples(image, xi, yi)),
                None => self.patches.push_window(image, xi, yi, radius),
            };
            self.right.insert(bucket, point(wxi, wyi, id, patch));
        }
    }

    fn score_neighbourhoods(&mut self, gate: DisparityGate) {
        let Self {
            left,
            right,
            patches,
            nr_h,
            nr_v,
            ..
        } = self;
        for by in 0..*nr_v {
            for bx in 0..*nr_h {
                let lb = left.interior_id(bx, by);
                for ls in 0..left.len_of(lb) {
                    let l_slot: Slot = (lb, ls);
                    for rb in right.neighbourhood(bx, by) {
                        for rs in 0..right.len_of(rb) {
                            let r_slot: Slot = (rb, rs);
                            let (lp, rp) = (*left.get(l_slot), *right.get(r_slot));
                            if !gate.admits(lp.x - rp.x, lp.y - rp.y) {
                                continue;
                            }
                            let s = ncc::score(
                                patches.samples(lp.patch),
                                patches.samples(rp.patch),
                                patches.stats(lp.patch),
                                patches.stats(rp.patch),
                            );
                            let l = left.get_mut(l_slot);
                            if l.best.is_none() || s > l.score {
                                l.score = s;
                                l.best = Some(r_slot);
                            }
                            let r = right.get_mut(r_slot);
                            if r.best.is_none() || s > r.score {
                                r.score = s;
                                r.best = Some(l_slot);
                            }
                        }
                    }
                }
            }
        }
    }

    fn collect(&self) -> Vec<Match> {
        let mut out = Vec::new();
        for by in 0..self.nr_v {
            for bx in 0..self.nr_h {
                let lb = self.left.interior_id(bx, by);
                for (ls, lp) in self.left.bucket(lb).iter().enumerate() {
                    let Some(r_slot) = lp.best else {
                        continue;
                    };
                    let rp = self.right.get(r_slot);
                    if rp.best == Some((lb, ls)) && out.len() < self.target {
                        out.push(Match {
                            a: lp.id,
                            b: rp.id,
                            score: lp.score,
                        });
                    }
                }
            }
        }
        out
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

fn point(x: i64, y: i64, id: usize, patch: usize) -> PointInfo {
    PointInfo {
        x,
        y,
        id,
        best: None,
        score: 0.0,
        patch,
    }
}
