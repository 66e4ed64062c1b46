/// Return the `k`-th smallest value (0-based) of `values`.
///
/// `values` is left untouched; the partition runs on `scratch`, which is
/// reused across calls to avoid reallocating. `k` is clamped to the last
/// index, and an empty input yields `0.0`.
pub fn quickselect(values: &[f64], k: usize, scratch: &mut Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    scratch.clear();
    scratch.extend_from_slice(values);
    let k = k.min(scratch.len() - 1);
    let (_, pivot, _) = scratch.select_nth_unstable_by(k, |a, b| a.total_cmp(b));
    *pivot
}
