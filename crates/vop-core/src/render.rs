use glam::DVec2;
use vop_cache::BoundedLru;
use vop_geom::{plane_depth_at_uv, point_in_polygon_uv, Bounds2D, CellRect, ViewBasis};

use crate::areal::extract_areal_geometry;
use crate::classify::{classify_element, Mode};
use crate::config::{Config, ProxyMaskMode};
use crate::diagnostics::StrategyDiagnostics;
use crate::host::{Element, ViewHandle};
use crate::raster::{CellWriteKind, ViewRaster};
use crate::silhouette::{corners_world, get_element_silhouette, SilhouetteLoop};
use crate::tilemap::TileMap;

fn mode_name(mode: Mode) -> &'static str {
	match mode {
		Mode::Tiny => "TINY",
		Mode::Linear => "LINEAR",
		Mode::Areal => "AREAL",
	}
}

fn cell_rect_from_uv_bounds(bounds: &Bounds2D, cell_size_ft: f64) -> CellRect {
	let i_min = (bounds.min.x / cell_size_ft).floor() as i64;
	let j_min = (bounds.min.y / cell_size_ft).floor() as i64;
	let i_max = (bounds.max.x / cell_size_ft).ceil() as i64 - 1;
	let j_max = (bounds.max.y / cell_size_ft).ceil() as i64 - 1;
	CellRect::new(i_min, j_min, i_max.max(i_min), j_max.max(j_min))
}

fn loops_uv_bounds(loops: &[SilhouetteLoop]) -> Bounds2D {
	Bounds2D::from_points(loops.iter().flat_map(|l| l.points.iter().map(|p| DVec2::new(p.x, p.y))))
}

fn loops_min_depth(loops: &[SilhouetteLoop]) -> f64 {
	loops.iter().flat_map(|l| l.points.iter().map(|p| p.z)).fold(f64::INFINITY, f64::min)
}

/// Groups a flat loop list into faces: each non-hole loop starts a face,
/// every following `is_hole` loop attaches to it. This mirrors the order
/// [`crate::silhouette::planar_face_loops_silhouette`] emits loops in (a
/// face's outer boundary immediately followed by its own holes), so a hole
/// is never rasterized against the wrong face's outer boundary. `open`
/// loops are edge-only and never fill, so they are dropped here.
fn group_into_faces(loops: &[SilhouetteLoop]) -> Vec<(&SilhouetteLoop, Vec<&SilhouetteLoop>)> {
	let mut faces: Vec<(&SilhouetteLoop, Vec<&SilhouetteLoop>)> = Vec::new();
	for l in loops {
		if l.open {
			continue;
		}
		if l.is_hole {
			if let Some(current) = faces.last_mut() {
				current.1.push(l);
			}
		} else {
			faces.push((l, Vec::new()));
		}
	}
	faces
}

/// Scan-converts one face (outer loop minus its holes) into the cells of
/// `[i_lo, i_hi] x [j_lo, j_hi]`, testing each cell's center against the
/// outer boundary and every hole with an even-odd point-in-polygon test.
///
/// Depth at a covered cell is plane-interpolated across the face when the
/// loop came from `planar_face_loops` (a real planar face, so the
/// interpolation is exact); every other AREAL strategy — and any face
/// whose plane is edge-on to the view — falls back to `conservative_depth`,
/// the minimum depth over the whole element's extracted geometry.
#[allow(clippy::too_many_arguments)]
fn rasterize_face(raster: &mut ViewRaster, outer: &SilhouetteLoop, holes: &[&SilhouetteLoop], cell_size_ft: f64, i_lo: i64, i_hi: i64, j_lo: i64, j_hi: i64, conservative_depth: f64, element_index: u32) {
	if i_lo > i_hi || j_lo > j_hi {
		return;
	}

	let outer_uv: Vec<DVec2> = outer.points.iter().map(|p| DVec2::new(p.x, p.y)).collect();
	let hole_uvs: Vec<Vec<DVec2>> = holes.iter().map(|h| h.points.iter().map(|p| DVec2::new(p.x, p.y)).collect()).collect();
	let is_planar_face = outer.strategy == "planar_face_loops";

	for j in j_lo..=j_hi {
		for i in i_lo..=i_hi {
			let u = (i as f64 + 0.5) * cell_size_ft;
			let v = (j as f64 + 0.5) * cell_size_ft;
			let center = DVec2::new(u, v);

			if !point_in_polygon_uv(center, &outer_uv) {
				continue;
			}
			if hole_uvs.iter().any(|hole| point_in_polygon_uv(center, hole)) {
				continue;
			}

			let depth = if is_planar_face { plane_depth_at_uv(&outer.points, u, v).unwrap_or(conservative_depth) } else { conservative_depth };
			raster.try_write_cell(i, j, depth, element_index, CellWriteKind::Fill);
		}
	}
}

/// Stamps a TINY/LINEAR proxy into the raster according to
/// [`Config::proxy_mask_mode`]: `Edges` traces only the rectangle's
/// boundary cells (as [`CellWriteKind::ProxyEdge`]); `Minmask` stamps the
/// smallest mask that still represents the element's footprint — a single
/// center cell for TINY, a thin band along the rectangle's long axis for
/// LINEAR.
fn stamp_proxy(raster: &mut ViewRaster, rect: &CellRect, depth: f64, element_index: u32, mode: Mode, cfg: &Config) {
	match cfg.proxy_mask_mode {
		ProxyMaskMode::Edges => {
			for (i, j) in rect.cells() {
				if i == rect.i_min || i == rect.i_max || j == rect.j_min || j == rect.j_max {
					raster.try_write_cell(i, j, depth, element_index, CellWriteKind::ProxyEdge);
				}
			}
		}
		ProxyMaskMode::Minmask => match mode {
			Mode::Tiny => {
				let (i, j) = rect.center_cell();
				raster.try_write_cell(i, j, depth, element_index, CellWriteKind::Proxy);
			}
			Mode::Linear => {
				let band = (cfg.linear_band_thickness_cells.round() as i64).max(1);
				let (ic, jc) = rect.center_cell();
				if rect.width_cells() >= rect.height_cells() {
					let j_lo = (jc - band / 2).max(rect.j_min);
					let j_hi = (jc + band / 2).min(rect.j_max);
					for i in rect.i_min..=rect.i_max {
						for j in j_lo..=j_hi {
							raster.try_write_cell(i, j, depth, element_index, CellWriteKind::Proxy);
						}
					}
				} else {
					let i_lo = (ic - band / 2).max(rect.i_min);
					let i_hi = (ic + band / 2).min(rect.i_max);
					for j in rect.j_min..=rect.j_max {
						for i in i_lo..=i_hi {
							raster.try_write_cell(i, j, depth, element_index, CellWriteKind::Proxy);
						}
					}
				}
			}
			Mode::Areal => unreachable!("areal elements are filled, not stamped as proxies"),
		},
	}
}

/// Renders every element into `raster`, nearest-first, skipping whole tiles
/// once [`TileMap::is_guaranteed_occluded`] reports that nothing covering
/// them could lose a depth test against the current element.
///
/// Elements without a resolvable bounding box for `view` are skipped; this
/// is the only per-element failure mode here, since silhouette and AREAL
/// extraction already swallow their own strategy failures down to a
/// guaranteed bbox fallback.
///
/// TINY/LINEAR silhouette lookups share one [`BoundedLru`] for the whole
/// view, sized from [`Config::geometry_cache_max_items`] (`0` disables it),
/// keyed by the element's interned raster metadata index.
pub fn render_view(elements: &[Box<dyn Element>], view: &ViewHandle, basis: &ViewBasis, cfg: &Config, raster: &mut ViewRaster, tilemap: &TileMap, mut diagnostics: Option<&mut StrategyDiagnostics>) {
	let mut order: Vec<(usize, f64)> = elements
		.iter()
		.enumerate()
		.filter_map(|(idx, element)| {
			element.bounding_box(view).map(|(min, max, _)| {
				let depth = corners_world(min, max).iter().map(|p| basis.depth(*p)).fold(f64::INFINITY, f64::min);
				(idx, depth)
			})
		})
		.collect();
	order.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

	let mut geometry_cache: BoundedLru<u64, Vec<SilhouetteLoop>> = BoundedLru::new(cfg.geometry_cache_max_items);
	let grid_area = raster.width * raster.height;

	for (idx, z_near) in order {
		let element = elements[idx].as_ref();
		let Some((min, max, _)) = element.bounding_box(view) else { continue };

		let category = element.category().unwrap_or("Unknown").to_string();
		let source = element.source();
		let element_index = raster.get_or_create_element_meta_index(element.id(), category.clone(), source);

		let uv: Vec<DVec2> = corners_world(min, max).iter().map(|p| basis.world_to_uv(*p)).collect();
		let mode = classify_element(&uv, cfg, raster.cell_size_ft, grid_area);

		if let Some(diag) = diagnostics.as_deref_mut() {
			diag.record_element_classification(element.id(), mode_name(mode), &category);
		}

		let loops = match mode {
			Mode::Areal => match extract_areal_geometry(element, view, basis, diagnostics.as_deref_mut()) {
				Some((loops, _confidence, _strategy)) => loops,
				None => continue,
			},
			Mode::Tiny | Mode::Linear => get_element_silhouette(element, view, basis, raster, cfg, Some(&mut geometry_cache), Some(element_index as u64)),
		};
		if loops.is_empty() {
			continue;
		}

		let bounds_uv = loops_uv_bounds(&loops);
		if bounds_uv.is_empty() {
			continue;
		}
		let conservative_depth = loops_min_depth(&loops);
		if !conservative_depth.is_finite() {
			continue;
		}

		let rect = cell_rect_from_uv_bounds(&bounds_uv, raster.cell_size_ft);

		match mode {
			Mode::Areal => {
				let faces = group_into_faces(&loops);
				for (tx, ty) in tilemap.tiles_overlapping(rect.i_min, rect.j_min, rect.i_max, rect.j_max) {
					if tilemap.is_guaranteed_occluded(raster, tx, ty, z_near) {
						continue;
					}
					let (ti_min, tj_min, ti_max, tj_max) = tilemap.tile_bounds(tx, ty);
					let i_lo = rect.i_min.max(ti_min);
					let i_hi = rect.i_max.min(ti_max);
					let j_lo = rect.j_min.max(tj_min);
					let j_hi = rect.j_max.min(tj_max);
					for (outer, holes) in &faces {
						rasterize_face(raster, outer, holes, raster.cell_size_ft, i_lo, i_hi, j_lo, j_hi, conservative_depth, element_index);
					}
				}
			}
			Mode::Tiny | Mode::Linear => {
				for (tx, ty) in tilemap.tiles_overlapping(rect.i_min, rect.j_min, rect.i_max, rect.j_max) {
					if tilemap.is_guaranteed_occluded(raster, tx, ty, z_near) {
						continue;
					}
					stamp_proxy(raster, &rect, conservative_depth, element_index, mode, cfg);
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::{BoundingBoxSource, GeometryOptions, GeometryPrimitive, GeometrySource};
	use crate::source::{SourceIdentity, SourceType};
	use glam::{DMat4, DVec3};

	struct Floor {
		min: DVec3,
		max: DVec3,
	}

	impl BoundingBoxSource for Floor {
		fn bounding_box(&self, _view: &ViewHandle) -> Option<(DVec3, DVec3, Option<DMat4>)> {
			Some((self.min, self.max, None))
		}
	}

	impl GeometrySource for Floor {
		fn geometry(&self, _options: &GeometryOptions) -> Vec<GeometryPrimitive> {
			Vec::new()
		}
	}

	impl Element for Floor {
		fn id(&self) -> Option<i64> {
			Some(1)
		}
		fn category(&self) -> Option<&str> {
			Some("Floors")
		}
		fn source(&self) -> SourceIdentity {
			SourceIdentity::new(SourceType::Host, "doc-1", None).unwrap()
		}
	}

	fn test_raster(w: i64, h: i64, cell_size: f64) -> ViewRaster {
		let basis = ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
		ViewRaster::new(w, h, cell_size, basis, Bounds2D::from_min_max(DVec2::ZERO, DVec2::new(w as f64 * cell_size, h as f64 * cell_size))).unwrap()
	}

	#[test]
	fn single_floor_fills_its_footprint() {
		let mut raster = test_raster(20, 20, 1.0);
		let basis = ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
		let tilemap = TileMap::new(20, 20, 8);
		let cfg = Config::default();
		let view = ViewHandle(1);

		let floor: Box<dyn Element> = Box::new(Floor { min: DVec3::new(0.0, 0.0, 5.0), max: DVec3::new(10.0, 10.0, 5.0) });
		let elements = vec![floor];

		render_view(&elements, &view, &basis, &cfg, &mut raster, &tilemap, None);

		assert!(raster.model_mask()[2 + 2 * 20]);
		assert!(!raster.model_mask()[15 + 15 * 20]);
	}

	#[test]
	fn nearer_floor_occludes_farther_one() {
		let mut raster = test_raster(20, 20, 1.0);
		let basis = ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
		let tilemap = TileMap::new(20, 20, 8);
		let cfg = Config::default();
		let view = ViewHandle(1);

		let far: Box<dyn Element> = Box::new(Floor { min: DVec3::new(0.0, 0.0, 10.0), max: DVec3::new(10.0, 10.0, 10.0) });
		let near: Box<dyn Element> = Box::new(Floor { min: DVec3::new(0.0, 0.0, 1.0), max: DVec3::new(10.0, 10.0, 1.0) });
		let elements = vec![far, near];

		render_view(&elements, &view, &basis, &cfg, &mut raster, &tilemap, None);

		let idx = raster.model_key()[2 + 2 * 20].unwrap();
		let meta = raster.element_meta(idx).unwrap();
		assert_eq!(meta.source.source_id, "doc-1");
		assert_eq!(raster.z_min()[2 + 2 * 20], 1.0);
	}

	#[test]
	fn element_without_bounding_box_is_skipped() {
		struct NoBbox;
		impl BoundingBoxSource for NoBbox {
			fn bounding_box(&self, _view: &ViewHandle) -> Option<(DVec3, DVec3, Option<DMat4>)> {
				None
			}
		}
		impl GeometrySource for NoBbox {
			fn geometry(&self, _options: &GeometryOptions) -> Vec<GeometryPrimitive> {
				Vec::new()
			}
		}
		impl Element for NoBbox {
			fn id(&self) -> Option<i64> {
				None
			}
			fn category(&self) -> Option<&str> {
				None
			}
			fn source(&self) -> SourceIdentity {
				SourceIdentity::new(SourceType::Host, "doc-1", None).unwrap()
			}
		}

		let mut raster = test_raster(4, 4, 1.0);
		let basis = ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
		let tilemap = TileMap::new(4, 4, 4);
		let cfg = Config::default();
		let view = ViewHandle(1);
		let elements: Vec<Box<dyn Element>> = vec![Box::new(NoBbox)];

		render_view(&elements, &view, &basis, &cfg, &mut raster, &tilemap, None);

		assert!(raster.model_mask().iter().all(|&m| !m));
	}
}
