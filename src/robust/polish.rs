//! Levenberg–Marquardt polish of a hypothesis under the Cauchy cost.
//!
//! Each residual `r = π(H·x) − x'` is replaced by `f = a(q)·r` with
//! `q = |r|²` and `a = √(ln(1 + k·q)/q)`, so that `|f|²` is exactly the
//! point's robust cost and plain Gauss–Newton normal equations apply.
use super::cost::cauchy_cost;
use super::family::{HomographyType, ModelPoint, ParamJacobian, MAX_PARAMS};
use crate::linalg::{safe_reciprocal, solve_damped_normal_equations};
use nalgebra::{Matrix3, Vector3};

const INITIAL_LAMBDA: f64 = 0.001;
/// Below this `k·q` the Taylor expansion of `a(q)` is used.
const SMALL_KQ: f64 = 1e-8;

/// Outcome of [`polish`].
#[derive(Clone, Copy, Debug)]
pub struct PolishResult {
    pub h: Matrix3<f64>,
    pub cost: f64,
    pub iterations: usize,
    pub accepted_steps: usize,
}

/// `a(q)` and `da/dq` of the Cauchy residual transform.
fn cauchy_weight(q: f64, k: f64) -> (f64, f64) {
    if k * q < SMALL_KQ {
        let sk = k.sqrt();
        return (sk, -0.25 * k * sk);
    }
    let log = (k * q).ln_1p();
    let a = (log / q).sqrt();
    let da = (k / ((1.0 + k * q) * q) - log / (q * q)) / (2.0 * a);
    (a, da)
}

/// Accumulate `JᵗJ` and `Jᵗf` over the nine homography entries.
fn normal_equations_9(
    h: &Matrix3<f64>,
    a: &[[f64; 2]],
    b: &[[f64; 2]],
    k: f64,
) -> ([[f64; 9]; 9], [f64; 9]) {
    let mut jtj = [[0.0; 9]; 9];
    let mut jtf = [0.0; 9];
    for (pa, pb) in a.iter().zip(b) {
        let v = h * Vector3::new(pa[0], pa[1], 1.0);
        let iw = safe_reciprocal(v[2]);
        let (px, py) = (v[0] * iw, v[1] * iw);
        let r = [px - pb[0], py - pb[1]];
        let q = r[0] * r[0] + r[1] * r[1];
        let (w, dw) = cauchy_weight(q, k);
        let f = [w * r[0], w * r[1]];
        // ∂f/∂r = a·I + 2·(da/dq)·r·rᵗ
        let jfp = [
            [w + 2.0 * dw * r[0] * r[0], 2.0 * dw * r[0] * r[1]],
            [2.0 * dw * r[1] * r[0], w + 2.0 * dw * r[1] * r[1]],
        ];
        // ∂r/∂H for the projected point.
        let xs = [pa[0] * iw, pa[1] * iw, iw];
        let mut jr = [[0.0; 9]; 2];
        for c in 0..3 {
            jr[0][c] = xs[c];
            jr[1][3 + c] = xs[c];
            jr[0][6 + c] = -px * xs[c];
            jr[1][6 + c] = -py * xs[c];
        }
        let mut jrow = [[0.0; 9]; 2];
        for (row, fp) in jrow.iter_mut().zip(&jfp) {
            for (c, out) in row.iter_mut().enumerate() {
                *out = fp[0] * jr[0][c] + fp[1] * jr[1][c];
            }
        }
        for i in 0..9 {
            jtf[i] += jrow[0][i] * f[0] + jrow[1][i] * f[1];
            for j in i..9 {
                jtj[i][j] += jrow[0][i] * jrow[0][j] + jrow[1][i] * jrow[1][j];
            }
        }
    }
    for i in 0..9 {
        for j in 0..i {
            jtj[i][j] = jtj[j][i];
        }
    }
    (jtj, jtf)
}

/// Project the 9-entry normal equations onto the family parameters:
/// `Eᵗ·JᵗJ·E` and `−Eᵗ·Jᵗf`, packed row-major with stride `np`.
fn reduce(
    jtj: &[[f64; 9]; 9],
    jtf: &[f64; 9],
    e: &ParamJacobian,
    np: usize,
) -> ([f64; MAX_PARAMS * MAX_PARAMS], [f64; MAX_PARAMS]) {
    let mut tmp = [[0.0; MAX_PARAMS]; 9];
    for k in 0..9 {
        for p in 0..np {
            tmp[k][p] = (0..9).map(|l| jtj[k][l] * e[l][p]).sum();
        }
    }
    let mut reduced = [0.0; MAX_PARAMS * MAX_PARAMS];
    let mut min_jtf = [0.0; MAX_PARAMS];
    for p in 0..np {
        for q in 0..np {
            reduced[p * np + q] = (0..9).map(|k| e[k][p] * tmp[k][q]).sum();
        }
        min_jtf[p] = -(0..9).map(|k| e[k][p] * jtf[k]).sum::<f64>();
    }
    (reduced, min_jtf)
}

/// Minimize the Cauchy cost of `family` over the pairs `(a[i], b[i])`,
/// starting from `h`.
///
/// The polish stops after `max_iterations` trial steps, or after two
/// consecutive accepted steps whose cost decrease falls below
/// `improvement_requirement` times the current cost. A step that does not
/// lower the cost is rejected and only increases the damping.
pub fn polish(
    family: HomographyType,
    h: &Matrix3<f64>,
    a: &[[f64; 2]],
    b: &[[f64; 2]],
    one_over_scale2: f64,
    max_iterations: usize,
    improvement_requirement: f64,
) -> PolishResult {
    let np = family.nr_parameters();
    let mut point: ModelPoint = family.model_point(h);
    let mut cost = cauchy_cost(&point.h, a, b, one_over_scale2);
    let mut lambda = INITIAL_LAMBDA;
    let mut stalled = 0;
    let mut iterations = 0;
    let mut accepted_steps = 0;

    let (jtj9, jtf9) = normal_equations_9(&point.h, a, b, one_over_scale2);
    let (mut jtj, mut min_jtf) = reduce(&jtj9, &jtf9, &family.parameter_jacobian(&point), np);

    while stalled < 2 && iterations < max_iterations {
        iterations += 1;
        let mut dx = [0.0; MAX_PARAMS];
        solve_damped_normal_equations(&mut dx, &jtj, &min_jtf, lambda, np);
        let candidate = family.apply_update(&point, &dx[..np]);
        let candidate_cost = cauchy_cost(&candidate.h, a, b, one_over_scale2);
        if candidate_cost < cost {
            if cost - candidate_cost < cost * improvement_requirement {
                stalled += 1;
            } else {
                stalled = 0;
            }
            lambda *= 0.1;
            point = candidate;
            cost = candidate_cost;
            accepted_steps += 1;
            let (jtj9, jtf9) = normal_equations_9(&point.h, a, b, one_over_scale2);
            (jtj, min_jtf) = reduce(&jtj9, &jtf9, &family.parameter_jacobian(&point), np);
        } else {
            lambda *= 10.0;
            stalled = 0;
        }
    }

    PolishResult {
        h: point.h,
        cost,
        iterations,
        accepted_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homography::apply_homography;

    #[test]
    fn weight_matches_its_definition() {
        let k = 3.0;
        for q in [1e-12, 1e-3, 0.5, 4.0] {
            let (a, da) = cauchy_weight(q, k);
            assert!((a * a * q - (k * q).ln_1p()).abs() < 1e-9, "q={q}");
            let eps = 1e-7 * q.max(1e-4);
            if q > 1e-6 {
                let (ap, _) = cauchy_weight(q + eps, k);
                let (am, _) = cauchy_weight(q - eps, k);
                let numeric = (ap - am) / (2.0 * eps);
                assert!((numeric - da).abs() < 1e-4 * da.abs().max(1.0), "q={q}: {numeric} vs {da}");
            }
        }
    }

    #[test]
    fn polish_recovers_perturbed_affine() {
        let truth = Matrix3::new(1.05, 0.1, 0.2, -0.08, 0.97, -0.1, 0.0, 0.0, 1.0);
        let a: Vec<[f64; 2]> = (0..40)
            .map(|i| [((i * 7) % 13) as f64 * 0.1 - 0.6, ((i * 5) % 11) as f64 * 0.1 - 0.5])
            .collect();
        let b: Vec<[f64; 2]> = a
            .iter()
            .map(|p| {
                let (x, y) = apply_homography(&truth, p[0], p[1]);
                [x, y]
            })
            .collect();
        let mut start = truth;
        start[(0, 2)] += 0.05;
        start[(1, 0)] -= 0.03;
        let k = 100.0;
        let before = cauchy_cost(&start, &a, &b, k);
        let res = polish(HomographyType::Affine, &start, &a, &b, k, 30, 0.0);
        assert!(res.cost < before * 1e-3, "cost {} from {before}", res.cost);
        assert!((res.h - truth).norm() < 1e-3, "polished {}", res.h);
        assert!(res.accepted_steps > 0);
    }

    #[test]
    fn exact_fit_is_left_alone() {
        let truth = Matrix3::new(1.0, 0.0, 3.0, 0.0, 1.0, -2.0, 0.0, 0.0, 1.0);
        let a = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]];
        let b = [[3.0, -2.0], [13.0, -2.0], [3.0, 8.0], [13.0, 8.0]];
        let res = polish(HomographyType::Translation, &truth, &a, &b, 1.0, 20, 0.0);
        assert_eq!(res.cost, 0.0);
        assert_eq!(res.h, truth);
        assert_eq!(res.iterations, 20);
    }
}
