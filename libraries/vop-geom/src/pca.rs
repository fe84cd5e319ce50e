use glam::DVec2;

/// Fits a 2D principal axis through `points_uv` and returns
/// `(major_extent, minor_extent)`, the spans of the point set along its
/// dominant and secondary axes.
///
/// Returns `(0.0, 0.0)` for an empty point set, matching the source
/// pipeline's guard against dividing by zero points.
pub fn pca_oriented_extents_uv(points_uv: &[DVec2]) -> (f64, f64) {
	let n = points_uv.len();
	if n == 0 {
		return (0.0, 0.0);
	}
	let n = n as f64;

	let mean = points_uv.iter().fold(DVec2::ZERO, |acc, p| acc + *p) / n;

	let mut sxx = 0.0;
	let mut syy = 0.0;
	let mut sxy = 0.0;
	for p in points_uv {
		let d = *p - mean;
		sxx += d.x * d.x;
		syy += d.y * d.y;
		sxy += d.x * d.y;
	}
	sxx /= n;
	syy /= n;
	sxy /= n;

	let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
	let (s, c) = theta.sin_cos();

	let mut min_a = f64::INFINITY;
	let mut max_a = f64::NEG_INFINITY;
	let mut min_b = f64::INFINITY;
	let mut max_b = f64::NEG_INFINITY;
	for p in points_uv {
		let d = *p - mean;
		let a = c * d.x + s * d.y;
		let b = -s * d.x + c * d.y;
		min_a = min_a.min(a);
		max_a = max_a.max(a);
		min_b = min_b.min(b);
		max_b = max_b.max(b);
	}

	(max_a - min_a, max_b - min_b)
}

/// Fits an oriented rectangle through `points_uv` via the same 2D PCA as
/// [`pca_oriented_extents_uv`], but returns its four corners (closed,
/// counterclockwise in the rotated frame) rather than just the extents.
/// Used to build OBB proxies and the `uv_obb_rect` silhouette strategy.
///
/// Returns `None` for fewer than two points, matching the source pipeline's
/// guard (a single point has no orientation to fit).
pub fn pca_oriented_rect_uv(points_uv: &[DVec2]) -> Option<[DVec2; 4]> {
	if points_uv.len() < 2 {
		return None;
	}
	let n = points_uv.len() as f64;
	let mean = points_uv.iter().fold(DVec2::ZERO, |acc, p| acc + *p) / n;

	let mut sxx = 0.0;
	let mut syy = 0.0;
	let mut sxy = 0.0;
	for p in points_uv {
		let d = *p - mean;
		sxx += d.x * d.x;
		syy += d.y * d.y;
		sxy += d.x * d.y;
	}
	sxx /= n;
	syy /= n;
	sxy /= n;

	let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
	let (s, c) = theta.sin_cos();
	let axis_u = DVec2::new(c, s);
	let axis_v = DVec2::new(-s, c);

	let mut min_a = f64::INFINITY;
	let mut max_a = f64::NEG_INFINITY;
	let mut min_b = f64::INFINITY;
	let mut max_b = f64::NEG_INFINITY;
	for p in points_uv {
		let d = *p - mean;
		let a = d.dot(axis_u);
		let b = d.dot(axis_v);
		min_a = min_a.min(a);
		max_a = max_a.max(a);
		min_b = min_b.min(b);
		max_b = max_b.max(b);
	}

	let corner = |a: f64, b: f64| mean + axis_u * a + axis_v * b;
	Some([corner(min_a, min_b), corner(max_a, min_b), corner(max_a, max_b), corner(min_a, max_b)])
}
