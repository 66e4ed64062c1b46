use crate::image::ImageF32;

/// Quadratic refinement of a response peak at integer location `(x, y)`.
///
/// The location is returned unchanged when the local Hessian is ill
/// conditioned or the fitted offset exceeds one pixel on either axis.
pub fn refine(strength: &ImageF32, x: usize, y: usize) -> (f64, f64) {
    let s = |dx: isize, dy: isize| {
        strength.get((x as isize + dx) as usize, (y as isize + dy) as usize)
    };
    let center = s(0, 0);
    let fxx = s(-1, 0) - center - center + s(1, 0);
    let fyy = s(0, -1) - center - center + s(0, 1);
    let fxy = (s(-1, -1) - s(1, -1) - s(-1, 1) + s(1, 1)) / 4.0;
    let denom = (fxx * fyy - fxy * fxy) * 2.0;

    let (xd, yd) = (x as f64, y as f64);
    if denom.abs() <= f32::EPSILON {
        return (xd, yd);
    }
    let fx = s(1, 0) - s(-1, 0);
    let fy = s(0, 1) - s(0, -1);
    let dx = (fyy * fx - fxy * fy) / denom;
    let dy = (fxx * fy - fxy * fx) / denom;
    if dx.abs() > 1.0 || dy.abs() > 1.0 {
        return (xd, yd);
    }
    (xd - dx as f64, yd - dy as f64)
}
