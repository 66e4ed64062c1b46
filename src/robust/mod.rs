//! Robust transform estimation by preemptive RANSAC.
//!
//! [`estimate`] draws `nr_samples` minimal samples from a random subset of
//! the correspondences, turns each into one or more closed-form hypotheses
//! and scores all of them chunk by chunk with the Cauchy cost, halving the
//! surviving set after every chunk. The best survivor is then polished by
//! Levenberg–Marquardt (or used to drop outliers) and summarized by
//! [`Statistics`].
//!
//! All work happens in normalized coordinates `K⁻¹·x` and `Kp⁻¹·x'`; the
//! returned matrix maps pixels of the first image to pixels of the second.

pub mod cost;
pub mod family;
pub mod options;
pub mod polish;
pub mod rng;
pub mod stats;
pub mod stitch;

pub use family::HomographyType;
pub use options::EstimatorOptions;
pub use stats::Statistics;

use crate::homography::{invert_calibration, normalize_homography, squared_transfer_error};
use crate::linalg::{quickselect, safe_div};
use cost::cauchy_cost;
use log::{debug, warn};
use nalgebra::{Matrix3, Vector3};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rng::Lcg;

/// Result of [`estimate`].
#[derive(Clone, Debug, PartialEq)]
pub struct Estimate {
    /// Transform from pixels of the first image to pixels of the second.
    pub h: Matrix3<f64>,
    pub stats: Statistics,
    /// With outlier removal enabled: indices into the input of the evaluated
    /// correspondences that passed the gate, in evaluation order.
    pub inliers_kept: Option<Vec<usize>>,
    /// Hypotheses generated from the minimal samples.
    pub nr_hypotheses: usize,
}

fn normalize_point(k_inv: &Matrix3<f64>, p: [f64; 2]) -> [f64; 2] {
    let v = k_inv * Vector3::new(p[0], p[1], 1.0);
    [safe_div(v[0], v[2]), safe_div(v[1], v[2])]
}

/// Draw `count` distinct indices of `0..n` in random order.
fn random_subset(rng: &mut Lcg, n: usize, count: usize) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..n).collect();
    let mut picked = Vec::with_capacity(count);
    for _ in 0..count.min(n) {
        let pos = rng.next_int(pool.len() - 1);
        picked.push(pool.swap_remove(pos));
    }
    picked
}

fn generate_hypotheses(
    family: HomographyType,
    a: &[[f64; 2]],
    b: &[[f64; 2]],
    nr_samples: usize,
    rng: &mut Lcg,
) -> Vec<Matrix3<f64>> {
    let size = family.sample_size();
    let mut hyps = Vec::with_capacity(nr_samples);
    if a.len() < size {
        return hyps;
    }
    let mut idx = Vec::with_capacity(size);
    let mut sa = [[0.0; 2]; 4];
    let mut sb = [[0.0; 2]; 4];
    for _ in 0..nr_samples {
        rng.distinct_sample(size, a.len(), &mut idx);
        for (slot, &i) in idx.iter().enumerate() {
            sa[slot] = a[i];
            sb[slot] = b[i];
        }
        family.minimal_hypotheses(&sa[..size], &sb[..size], &mut hyps);
    }
    hyps
}

fn add_chunk_costs(costs: &mut [f64], hyps: &[Matrix3<f64>], a: &[[f64; 2]], b: &[[f64; 2]], k: f64) {
    #[cfg(feature = "parallel")]
    {
        costs
            .par_iter_mut()
            .zip(hyps.par_iter())
            .for_each(|(c, h)| *c += cauchy_cost(h, a, b, k));
    }
    #[cfg(not(feature = "parallel"))]
    {
        for (c, h) in costs.iter_mut().zip(hyps) {
            *c += cauchy_cost(h, a, b, k);
        }
    }
}

/// Preemptive scoring: returns the index of the lowest-cost survivor.
fn preemptive_select(
    hyps: &mut [Matrix3<f64>],
    a: &[[f64; 2]],
    b: &[[f64; 2]],
    k: f64,
    chunk_size: usize,
) -> Option<usize> {
    if hyps.is_empty() {
        return None;
    }
    let chunk = chunk_size.max(1);
    let point_count = a.len();
    let mut costs = vec![0.0; hyps.len()];
    let mut scratch = Vec::with_capacity(hyps.len());
    let mut alive = hyps.len();
    let mut start = 0;
    while alive > 1 && start < point_count {
        let end = (start + chunk).min(point_count);
        add_chunk_costs(
            &mut costs[..alive],
            &hyps[..alive],
            &a[start..end],
            &b[start..end],
            k,
        );
        start += chunk;
        if chunk < point_count {
            let keep = alive / 2;
            let pivot = quickselect(&costs[..alive], keep - 1, &mut scratch);
            let mut c = 0;
            for j in 0..alive {
                if c == keep {
                    break;
                }
                if costs[j] <= pivot {
                    costs.swap(c, j);
                    hyps.swap(c, j);
                    c += 1;
                }
            }
            alive = keep;
        }
    }
    debug!("preemptive scoring kept {alive} of {} hypotheses", hyps.len());
    costs[..alive]
        .iter()
        .enumerate()
        .min_by(|x, y| x.1.total_cmp(y.1))
        .map(|(i, _)| i)
}

/// Estimate the transform of `options.homography_type` mapping `points_a`
/// onto `points_b`.
///
/// `k` and `kp` are the calibration matrices of the two images. Pairs beyond
/// the shorter of the two slices are ignored. With no usable hypothesis the
/// identity is returned.
pub fn estimate(
    points_a: &[[f64; 2]],
    points_b: &[[f64; 2]],
    k: &Matrix3<f64>,
    kp: &Matrix3<f64>,
    options: &EstimatorOptions,
) -> Estimate {
    let family = options.homography_type;
    let n = points_a.len().min(points_b.len());
    let one_over_scale2 = options.one_over_scale2();
    let k_inv = invert_calibration(k);
    let kp_inv = invert_calibration(kp);

    let point_count = options
        .point_budget(n)
        .max(family.sample_size().min(n));
    let mut rng = Lcg::new(options.seed);
    let subset = random_subset(&mut rng, n, point_count);
    let xa: Vec<[f64; 2]> = subset.iter().map(|&i| normalize_point(&k_inv, points_a[i])).collect();
    let xb: Vec<[f64; 2]> = subset.iter().map(|&i| normalize_point(&kp_inv, points_b[i])).collect();

    let mut hyps = generate_hypotheses(family, &xa, &xb, options.nr_samples, &mut rng);
    let nr_hypotheses = hyps.len();
    let best = preemptive_select(&mut hyps, &xa, &xb, one_over_scale2, options.chunk_size);
    let mut h = match best {
        Some(i) => hyps[i],
        None => {
            warn!("estimate: no {family:?} hypothesis from {n} correspondences, using identity");
            Matrix3::identity()
        }
    };

    let m = point_count.min(options.max_points);
    let mut inliers_kept = None;
    if options.outlier_removal {
        let t2 = options.outlier_threshold * options.outlier_threshold;
        let kept: Vec<usize> = (0..point_count)
            .filter(|&i| squared_transfer_error(&h, xa[i], xb[i]) * one_over_scale2 <= t2)
            .map(|i| subset[i])
            .collect();
        debug!("estimate: outlier removal kept {} of {point_count}", kept.len());
        inliers_kept = Some(kept);
    } else if best.is_some() {
        let res = polish::polish(
            family,
            &h,
            &xa[..m],
            &xb[..m],
            one_over_scale2,
            options.max_iterations,
            options.improvement_requirement,
        );
        debug!(
            "estimate: polish {} iterations ({} accepted), cost {:.4}",
            res.iterations, res.accepted_steps, res.cost
        );
        h = res.h;
    }

    let stats = Statistics::compute(
        family,
        &h,
        &xa[..m],
        &xb[..m],
        one_over_scale2,
        options.outlier_threshold,
    );
    Estimate {
        h: normalize_homography(&(kp * h * k_inv)),
        stats,
        inliers_kept,
        nr_hypotheses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_is_a_permutation_prefix() {
        let mut rng = Lcg::new(1);
        let subset = random_subset(&mut rng, 10, 10);
        let mut sorted = subset.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
        assert!(random_subset(&mut rng, 0, 5).is_empty());
    }

    #[test]
    fn pruning_keeps_the_cheapest_half() {
        let a: Vec<[f64; 2]> = (0..8).map(|i| [i as f64, 0.0]).collect();
        let b = a.clone();
        let mut hyps: Vec<Matrix3<f64>> = (0..6)
            .map(|i| {
                let mut h = Matrix3::identity();
                h[(0, 2)] = i as f64 * 0.5;
                h
            })
            .collect();
        hyps.swap(0, 5);
        let best = preemptive_select(&mut hyps, &a, &b, 1.0, 2).expect("a survivor");
        assert_eq!(hyps[best], Matrix3::identity());
    }

    #[test]
    fn no_correspondences_yield_identity() {
        let est = estimate(&[], &[], &Matrix3::identity(), &Matrix3::identity(), &EstimatorOptions::default());
        assert_eq!(est.h, Matrix3::identity());
        assert_eq!(est.nr_hypotheses, 0);
        assert_eq!(est.stats.nr_points, 0);
    }
}
