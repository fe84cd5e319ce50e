use glam::{DVec2, DVec3};

/// Even-odd point-in-polygon test over a closed or open ring of UV points.
/// The ring need not be explicitly closed (first point repeated at the
/// end); both forms give the same result since the closing edge is
/// synthesized either way.
pub fn point_in_polygon_uv(point: DVec2, ring: &[DVec2]) -> bool {
	if ring.len() < 3 {
		return false;
	}
	let mut inside = false;
	let mut j = ring.len() - 1;
	for i in 0..ring.len() {
		let pi = ring[i];
		let pj = ring[j];
		if (pi.y > point.y) != (pj.y > point.y) {
			let x_at_y = pi.x + (point.y - pi.y) * (pj.x - pi.x) / (pj.y - pi.y);
			if point.x < x_at_y {
				inside = !inside;
			}
		}
		j = i;
	}
	inside
}

/// Fits a plane through `points` (assumed near-coplanar, as a real face's
/// vertices are) via Newell's method and returns the depth (`w`) at
/// `(u, v)` by solving the plane equation for `w`.
///
/// Returns `None` when there are too few points or the plane is edge-on to
/// the view (`normal.z` near zero, so every depth along the view ray
/// solves the plane equation equally badly) — callers should fall back to
/// a conservative depth in that case.
pub fn plane_depth_at_uv(points: &[DVec3], u: f64, v: f64) -> Option<f64> {
	if points.len() < 3 {
		return None;
	}

	let mut normal = DVec3::ZERO;
	for i in 0..points.len() {
		let a = points[i];
		let b = points[(i + 1) % points.len()];
		normal.x += (a.y - b.y) * (a.z + b.z);
		normal.y += (a.z - b.z) * (a.x + b.x);
		normal.z += (a.x - b.x) * (a.y + b.y);
	}

	if normal.z.abs() < 1e-9 {
		return None;
	}

	let p0 = points[0];
	let w = p0.z - (normal.x * (u - p0.x) + normal.y * (v - p0.y)) / normal.z;
	Some(w)
}
