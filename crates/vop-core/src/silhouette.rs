use std::collections::HashMap;

use glam::{DVec2, DVec3};
use vop_cache::BoundedLru;
use vop_geom::{pca_oriented_rect_uv, ViewBasis};

use crate::classify::{classify_by_uv_pca, Mode};
use crate::config::Config;
use crate::host::{Element, GeometryOptions, GeometryPrimitive, Solid, ViewHandle};
use crate::raster::ViewRaster;

/// A single extracted silhouette loop: points are `(u, v, depth)` in view
/// space. `open` marks a polyline rather than a closed boundary (CAD import
/// curves); `is_hole` marks an interior boundary cut out of an outer loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SilhouetteLoop {
	pub points: Vec<DVec3>,
	pub is_hole: bool,
	pub open: bool,
	pub strategy: &'static str,
}

impl SilhouetteLoop {
	fn new(points: Vec<DVec3>, is_hole: bool, open: bool, strategy: &'static str) -> Self {
		Self { points, is_hole, open, strategy }
	}
}

/// The 8 corners of a world-space AABB given as `(min, max)`.
pub(crate) fn corners_world(min: DVec3, max: DVec3) -> [DVec3; 8] {
	[
		DVec3::new(min.x, min.y, min.z),
		DVec3::new(max.x, min.y, min.z),
		DVec3::new(max.x, max.y, min.z),
		DVec3::new(min.x, max.y, min.z),
		DVec3::new(min.x, min.y, max.z),
		DVec3::new(max.x, min.y, max.z),
		DVec3::new(max.x, max.y, max.z),
		DVec3::new(min.x, max.y, max.z),
	]
}

fn collect_solids(element: &dyn Element, options: &GeometryOptions) -> Vec<Solid> {
	element
		.geometry(options)
		.into_iter()
		.filter_map(|p| match p {
			GeometryPrimitive::Solid(s) => Some(s),
			GeometryPrimitive::Curve(_) => None,
		})
		.collect()
}

/// Axis-aligned bounding box silhouette, the ultimate fallback: always
/// succeeds given a bounding box with positive extent.
pub fn bbox_silhouette(min: DVec3, max: DVec3, basis: &ViewBasis) -> Vec<SilhouetteLoop> {
	let uvw: Vec<DVec3> = corners_world(min, max).iter().map(|p| basis.world_to_view(*p)).collect();
	let u_min = uvw.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
	let u_max = uvw.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
	let v_min = uvw.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
	let v_max = uvw.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
	let w_min = uvw.iter().map(|p| p.z).fold(f64::INFINITY, f64::min);

	if u_min >= u_max || v_min >= v_max {
		return Vec::new();
	}

	let points = vec![
		DVec3::new(u_min, v_min, w_min),
		DVec3::new(u_max, v_min, w_min),
		DVec3::new(u_max, v_max, w_min),
		DVec3::new(u_min, v_max, w_min),
		DVec3::new(u_min, v_min, w_min),
	];
	vec![SilhouetteLoop::new(points, false, false, "bbox")]
}

/// Oriented bounding box silhouette: convex hull of all 8 projected AABB
/// corners, at the nearest projected depth.
pub fn obb_silhouette(min: DVec3, max: DVec3, basis: &ViewBasis) -> Vec<SilhouetteLoop> {
	let uvw: Vec<DVec3> = corners_world(min, max).iter().map(|p| basis.world_to_view(*p)).collect();
	let w_min = uvw.iter().map(|p| p.z).fold(f64::INFINITY, f64::min);
	let uv: Vec<DVec2> = uvw.iter().map(|p| DVec2::new(p.x, p.y)).collect();

	let hull = convex_hull_2d(&uv);
	if hull.len() < 3 {
		return Vec::new();
	}

	let points = hull.into_iter().map(|p| DVec3::new(p.x, p.y, w_min)).collect();
	vec![SilhouetteLoop::new(points, false, false, "obb")]
}

/// A PCA-fitted oriented rectangle through the projected AABB corners, used
/// for LINEAR elements so a diagonal wall rasterizes as a thin oriented box
/// rather than a fat axis-aligned one.
pub fn uv_obb_rect_silhouette(min: DVec3, max: DVec3, basis: &ViewBasis) -> Vec<SilhouetteLoop> {
	let uvw: Vec<DVec3> = corners_world(min, max).iter().map(|p| basis.world_to_view(*p)).collect();
	let w_min = uvw.iter().map(|p| p.z).fold(f64::INFINITY, f64::min);
	let uv: Vec<DVec2> = uvw.iter().map(|p| DVec2::new(p.x, p.y)).collect();

	let Some(rect) = pca_oriented_rect_uv(&uv) else { return Vec::new() };
	let mut points: Vec<DVec3> = rect.iter().map(|p| DVec3::new(p.x, p.y, w_min)).collect();
	points.push(points[0]);
	vec![SilhouetteLoop::new(points, false, false, "uv_obb_rect")]
}

/// A thin oriented quad straddling a projected location curve, for diagonal
/// thin elements (braces, pipe runs) whose bounding box poorly represents
/// their footprint. `thickness_uv` is the full quad width in view units.
pub fn location_curve_obb_silhouette(p0: DVec3, p1: DVec3, basis: &ViewBasis, thickness_uv: f64) -> Vec<SilhouetteLoop> {
	let w0 = basis.world_to_view(p0);
	let w1 = basis.world_to_view(p1);
	let du = w1.x - w0.x;
	let dv = w1.y - w0.y;
	let len = (du * du + dv * dv).sqrt();
	if len <= 1e-9 {
		return Vec::new();
	}

	let nx = -dv / len;
	let ny = du / len;
	let t = thickness_uv * 0.5;
	let depth = w0.z.min(w1.z);

	let a = DVec3::new(w0.x + nx * t, w0.y + ny * t, depth);
	let b = DVec3::new(w1.x + nx * t, w1.y + ny * t, depth);
	let c = DVec3::new(w1.x - nx * t, w1.y - ny * t, depth);
	let d = DVec3::new(w0.x - nx * t, w0.y - ny * t, depth);

	vec![SilhouetteLoop::new(vec![a, b, c, d, a], false, false, "location_curve_obb")]
}

/// Open polylines extracted from CAD import curve primitives (DWG/DXF),
/// rasterized as edges only, never filled.
pub fn cad_curves_silhouette(primitives: &[GeometryPrimitive], basis: &ViewBasis, max_paths: usize, max_points_per_path: usize) -> Vec<SilhouetteLoop> {
	let mut loops = Vec::new();
	for primitive in primitives {
		if loops.len() >= max_paths {
			break;
		}
		let GeometryPrimitive::Curve(polyline) = primitive else { continue };
		let take = polyline.points.len().min(max_points_per_path);
		if take < 2 {
			continue;
		}
		let points: Vec<DVec3> = polyline.points[..take].iter().map(|p| basis.world_to_view(*p)).collect();
		loops.push(SilhouetteLoop::new(points, false, true, "cad_curves"));
	}
	loops
}

/// Whole front-facing planar face loops, outer boundary plus any interior
/// holes preserved. Best for floors/ceilings with openings, since it carries
/// the true face topology rather than an approximated outline.
pub fn planar_face_loops_silhouette(solids: &[Solid], basis: &ViewBasis) -> Vec<SilhouetteLoop> {
	let mut loops = Vec::new();
	for solid in solids {
		for face in &solid.faces {
			if !basis.is_front_facing(face.normal) {
				continue;
			}
			for (idx, loop_points) in face.loops.iter().enumerate() {
				if loop_points.len() < 3 {
					continue;
				}
				let is_hole = idx > 0;
				let mut points: Vec<DVec3> = loop_points.iter().map(|p| basis.world_to_view(*p)).collect();
				if points.first() != points.last() {
					points.push(points[0]);
				}
				loops.push(SilhouetteLoop::new(points, is_hole, false, "planar_face_loops"));
			}
		}
	}
	loops
}

type EdgeKey = [(i64, i64, i64); 2];

fn round_point(p: DVec3) -> (i64, i64, i64) {
	let r = |v: f64| (v * 1e6).round() as i64;
	(r(p.x), r(p.y), r(p.z))
}

fn edge_key(a: DVec3, b: DVec3) -> EdgeKey {
	let mut k = [round_point(a), round_point(b)];
	k.sort_unstable();
	k
}

/// True silhouette edges: boundary edges (belonging to exactly one face) and
/// front/back-transition edges (shared by a front-facing and a back-facing
/// face), preserving concave outlines that a convex-hull approximation would
/// round off.
pub fn silhouette_edges_silhouette(solids: &[Solid], basis: &ViewBasis) -> Vec<SilhouetteLoop> {
	let mut silhouette_points: Vec<DVec3> = Vec::new();

	for solid in solids {
		let mut edge_face_map: HashMap<EdgeKey, Vec<(DVec3, DVec3, bool)>> = HashMap::new();

		for face in &solid.faces {
			let is_front = basis.is_front_facing(face.normal);
			for loop_points in &face.loops {
				if loop_points.len() < 2 {
					continue;
				}
				for window in loop_points.windows(2) {
					let (a, b) = (window[0], window[1]);
					edge_face_map.entry(edge_key(a, b)).or_default().push((a, b, is_front));
				}
				let (last, first) = (*loop_points.last().unwrap(), loop_points[0]);
				if last != first {
					edge_face_map.entry(edge_key(last, first)).or_default().push((last, first, is_front));
				}
			}
		}

		for entries in edge_face_map.values() {
			let is_silhouette = match entries.len() {
				1 => true,
				2 => entries[0].2 != entries[1].2,
				_ => false,
			};
			if !is_silhouette {
				continue;
			}
			let (a, b, _) = entries[0];
			silhouette_points.push(basis.world_to_view(a));
			silhouette_points.push(basis.world_to_view(b));
		}
	}

	if silhouette_points.len() < 3 {
		return Vec::new();
	}

	let ordered = order_points_by_connectivity(&silhouette_points);
	if ordered.len() < 3 {
		return Vec::new();
	}
	vec![SilhouetteLoop::new(ordered, false, false, "silhouette_edges")]
}

/// Greedy nearest-neighbor loop ordering over silhouette edge endpoints.
///
/// This does not chain edges by shared topology, so a solid producing
/// multiple disjoint silhouette loops (e.g. a floor with a separate interior
/// opening traced as its own loop) gets stitched into a single path instead
/// of multiple loops. Proper edge chaining is an open problem inherited
/// as-is; `planar_face_loops_silhouette` is preferred whenever it succeeds
/// precisely because it does not have this limitation.
fn order_points_by_connectivity(points: &[DVec3]) -> Vec<DVec3> {
	if points.len() < 3 {
		return Vec::new();
	}

	let mut seen = std::collections::HashSet::new();
	let mut unique = Vec::new();
	for p in points {
		let key = ((p.x * 1e6).round() as i64, (p.y * 1e6).round() as i64);
		if seen.insert(key) {
			unique.push(*p);
		}
	}
	if unique.len() < 3 {
		return Vec::new();
	}

	let mut ordered = vec![unique[0]];
	let mut remaining: Vec<usize> = (1..unique.len()).collect();

	while !remaining.is_empty() {
		let current = *ordered.last().unwrap();
		let (pos, _) = remaining
			.iter()
			.enumerate()
			.map(|(pos, &idx)| {
				let p = unique[idx];
				let dist = (p.x - current.x).powi(2) + (p.y - current.y).powi(2);
				(pos, dist)
			})
			.min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
			.unwrap();
		let idx = remaining.remove(pos);
		ordered.push(unique[idx]);
	}

	if ordered.len() >= 3 && ordered[0] != *ordered.last().unwrap() {
		ordered.push(ordered[0]);
	}
	ordered
}

/// 2D convex hull via Andrew's monotone chain, ignoring depth. Points are
/// returned closed (first point repeated at the end).
fn convex_hull_2d(points: &[DVec2]) -> Vec<DVec2> {
	if points.len() < 3 {
		return Vec::new();
	}

	let mut pts: Vec<(i64, i64, DVec2)> = points.iter().map(|p| ((p.x * 1e9).round() as i64, (p.y * 1e9).round() as i64, *p)).collect();
	pts.sort_unstable_by_key(|&(x, y, _)| (x, y));
	pts.dedup_by_key(|&mut (x, y, _)| (x, y));
	let pts: Vec<DVec2> = pts.into_iter().map(|(_, _, p)| p).collect();
	if pts.len() < 3 {
		return Vec::new();
	}

	let cross = |o: DVec2, a: DVec2, b: DVec2| (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x);

	let mut lower: Vec<DVec2> = Vec::new();
	for &p in &pts {
		while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
			lower.pop();
		}
		lower.push(p);
	}

	let mut upper: Vec<DVec2> = Vec::new();
	for &p in pts.iter().rev() {
		while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
			upper.pop();
		}
		upper.push(p);
	}

	lower.pop();
	upper.pop();
	let mut hull = lower;
	hull.extend(upper);

	if hull.len() < 3 {
		return Vec::new();
	}
	if hull[0] != *hull.last().unwrap() {
		hull.push(hull[0]);
	}
	hull
}

/// Extracts an element's silhouette, trying strategies in the order
/// [`Config::silhouette_strategies`] gives for its UV mode, swallowing
/// per-strategy failures and falling back to `bbox` as the ultimate
/// guarantee. Tags the returned loops with the strategy that produced them.
pub fn get_element_silhouette(
	element: &dyn Element,
	view: &ViewHandle,
	basis: &ViewBasis,
	raster: &ViewRaster,
	cfg: &Config,
	mut cache: Option<&mut BoundedLru<u64, Vec<SilhouetteLoop>>>,
	cache_key: Option<u64>,
) -> Vec<SilhouetteLoop> {
	if let (Some(cache), Some(key)) = (cache.as_deref_mut(), cache_key) {
		if let Some(cached) = cache.get(&key) {
			return cached;
		}
	}

	let bbox = element.bounding_box(view);
	let mode = bbox
		.map(|(min, max, _)| {
			let uv: Vec<DVec2> = corners_world(min, max).iter().map(|p| basis.world_to_uv(*p)).collect();
			classify_by_uv_pca(&uv, cfg, raster.cell_size_ft)
		})
		.unwrap_or(Mode::Areal);

	let strategies = cfg.silhouette_strategies(mode);
	let geometry_options = GeometryOptions { view_direction: basis.forward, ..Default::default() };
	let mut solids: Option<Vec<Solid>> = None;
	let mut primitives: Option<Vec<GeometryPrimitive>> = None;

	for &name in strategies {
		let loops = match name {
			"bbox" => bbox.map(|(min, max, _)| bbox_silhouette(min, max, basis)).unwrap_or_default(),
			"obb" => bbox.map(|(min, max, _)| obb_silhouette(min, max, basis)).unwrap_or_default(),
			"uv_obb_rect" => bbox.map(|(min, max, _)| uv_obb_rect_silhouette(min, max, basis)).unwrap_or_default(),
			"planar_face_loops" => planar_face_loops_silhouette(solids.get_or_insert_with(|| collect_solids(element, &geometry_options)), basis),
			"silhouette_edges" => silhouette_edges_silhouette(solids.get_or_insert_with(|| collect_solids(element, &geometry_options)), basis),
			"cad_curves" => {
				let prims = primitives.get_or_insert_with(|| element.geometry(&geometry_options));
				cad_curves_silhouette(prims, basis, geometry_options.max_paths, geometry_options.max_points_per_path)
			}
			"location_curve_obb" => match element.location_curve() {
				Some((p0, p1)) => location_curve_obb_silhouette(p0, p1, basis, cfg.thin_max.max(1) as f64),
				None => Vec::new(),
			},
			_ => Vec::new(),
		};

		if !loops.is_empty() {
			if let (Some(cache), Some(key)) = (cache.as_deref_mut(), cache_key) {
				cache.set(key, loops.clone());
			}
			return loops;
		}
	}

	let mut fallback = bbox.map(|(min, max, _)| bbox_silhouette(min, max, basis)).unwrap_or_default();
	for l in &mut fallback {
		l.strategy = "bbox_fallback";
	}
	fallback
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::Face;
	use pretty_assertions::assert_eq;

	fn basis() -> ViewBasis {
		ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap()
	}

	#[test]
	fn bbox_silhouette_produces_closed_rectangle() {
		let loops = bbox_silhouette(DVec3::new(0.0, 0.0, 5.0), DVec3::new(10.0, 4.0, 5.0), &basis());
		assert_eq!(loops.len(), 1);
		assert_eq!(loops[0].points.len(), 5);
		assert_eq!(loops[0].points[0], loops[0].points[4]);
		assert_eq!(loops[0].strategy, "bbox");
	}

	#[test]
	fn degenerate_bbox_yields_no_loops() {
		let loops = bbox_silhouette(DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 5.0, 5.0), &basis());
		assert!(loops.is_empty());
	}

	#[test]
	fn convex_hull_of_square_has_four_corners() {
		let points = [DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0), DVec2::new(2.0, 2.0), DVec2::new(0.0, 2.0), DVec2::new(1.0, 1.0)];
		let hull = convex_hull_2d(&points);
		// Closed loop: 4 corners + repeated first point.
		assert_eq!(hull.len(), 5);
	}

	#[test]
	fn uv_obb_rect_matches_axis_aligned_extent_for_axis_aligned_box() {
		let loops = uv_obb_rect_silhouette(DVec3::new(0.0, 0.0, 2.0), DVec3::new(10.0, 2.0, 2.0), &basis());
		assert_eq!(loops.len(), 1);
		assert_eq!(loops[0].strategy, "uv_obb_rect");
	}

	#[test]
	fn location_curve_obb_produces_thin_quad() {
		let loops = location_curve_obb_silhouette(DVec3::new(0.0, 0.0, 1.0), DVec3::new(10.0, 0.0, 1.0), &basis(), 0.5);
		assert_eq!(loops.len(), 1);
		assert_eq!(loops[0].points.len(), 5);
	}

	#[test]
	fn planar_face_loops_skip_back_facing_faces() {
		let front = Face { loops: vec![vec![DVec3::new(0.0, 0.0, 1.0), DVec3::new(1.0, 0.0, 1.0), DVec3::new(1.0, 1.0, 1.0), DVec3::new(0.0, 1.0, 1.0)]], normal: -DVec3::Z };
		let back = Face { loops: vec![vec![DVec3::new(0.0, 0.0, 2.0), DVec3::new(1.0, 0.0, 2.0), DVec3::new(1.0, 1.0, 2.0)]], normal: DVec3::Z };
		let solids = vec![Solid { faces: vec![front, back] }];
		let loops = planar_face_loops_silhouette(&solids, &basis());
		assert_eq!(loops.len(), 1);
		assert!(!loops[0].is_hole);
	}

	#[test]
	fn silhouette_edges_detects_boundary_of_single_face() {
		let face = Face { loops: vec![vec![DVec3::new(0.0, 0.0, 1.0), DVec3::new(1.0, 0.0, 1.0), DVec3::new(1.0, 1.0, 1.0), DVec3::new(0.0, 1.0, 1.0)]], normal: -DVec3::Z };
		let solids = vec![Solid { faces: vec![face] }];
		let loops = silhouette_edges_silhouette(&solids, &basis());
		assert_eq!(loops.len(), 1);
		assert!(loops[0].points.len() >= 3);
	}
}
