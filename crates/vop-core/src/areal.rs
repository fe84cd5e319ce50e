use glam::DVec3;
use vop_geom::ViewBasis;

use crate::diagnostics::StrategyDiagnostics;
use crate::host::{Element, GeometryOptions, GeometryPrimitive, Solid, ViewHandle};
use crate::silhouette::{bbox_silhouette, obb_silhouette, planar_face_loops_silhouette, silhouette_edges_silhouette, SilhouetteLoop};

/// How much an AREAL extraction result should be trusted downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Confidence {
	High,
	Medium,
	Low,
}

impl Confidence {
	pub fn as_str(self) -> &'static str {
		match self {
			Confidence::High => "HIGH",
			Confidence::Medium => "MEDIUM",
			Confidence::Low => "LOW",
		}
	}
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

/// Extracts AREAL element geometry through a 3-tier confidence hierarchy:
///
/// 1. HIGH: planar face loops (preserves openings), then silhouette edges
///    (preserves concave outlines).
/// 2. LOW: oriented bounding box over the projected AABB corners. The
///    original pipeline's tier 2 deferred to an external collection layer
///    that could in principle produce a true geometry polygon at MEDIUM
///    confidence; that layer is a host/collector concern out of scope here,
///    so tier 2 never reports `Confidence::Medium` — only the OBB fallback
///    at `Confidence::Low`.
/// 3. LOW: pure axis-aligned bounding box, the ultimate guarantee.
///
/// Returns `None` if the element has no usable bounding box at all.
pub fn extract_areal_geometry(element: &dyn Element, view: &ViewHandle, basis: &ViewBasis, mut diagnostics: Option<&mut StrategyDiagnostics>) -> Option<(Vec<SilhouetteLoop>, Confidence, &'static str)> {
	let elem_id = element.id();
	let category = element.category().unwrap_or("Unknown").to_string();
	let geometry_options = GeometryOptions { view_direction: basis.forward, ..GeometryOptions::default() };

	let solids = collect_solids(element, &geometry_options);

	let planar = planar_face_loops_silhouette(&solids, basis);
	if !planar.is_empty() {
		if let Some(diag) = diagnostics.as_deref_mut() {
			diag.record_areal_strategy(elem_id, "planar_face", true, &category);
			diag.record_geometry_extraction(elem_id, "success", &category, None);
			diag.record_confidence(elem_id, Confidence::High.as_str(), &category);
		}
		return Some((planar, Confidence::High, "planar_face_loops"));
	}

	let edges = silhouette_edges_silhouette(&solids, basis);
	if !edges.is_empty() {
		if let Some(diag) = diagnostics.as_deref_mut() {
			diag.record_areal_strategy(elem_id, "silhouette", true, &category);
			diag.record_geometry_extraction(elem_id, "success", &category, None);
			diag.record_confidence(elem_id, Confidence::High.as_str(), &category);
		}
		return Some((edges, Confidence::High, "silhouette_edges"));
	}

	if let Some(diag) = diagnostics.as_deref_mut() {
		diag.record_areal_strategy(elem_id, "planar_face", false, &category);
		diag.record_areal_strategy(elem_id, "silhouette", false, &category);
	}

	let bbox = element.bounding_box(view);

	if let Some((min, max, _)) = bbox {
		let obb = obb_silhouette(min, max, basis);
		if !obb.is_empty() {
			if let Some(diag) = diagnostics.as_deref_mut() {
				diag.record_areal_strategy(elem_id, "bbox_obb_used", true, &category);
				diag.record_geometry_extraction(elem_id, "success", &category, None);
				diag.record_confidence(elem_id, Confidence::Low.as_str(), &category);
			}
			return Some((obb, Confidence::Low, "bbox_obb_used"));
		}
	}

	if let Some((min, max, _)) = bbox {
		let aabb = bbox_silhouette(min, max, basis);
		if !aabb.is_empty() {
			if let Some(diag) = diagnostics.as_deref_mut() {
				diag.record_areal_strategy(elem_id, "aabb_used", true, &category);
				diag.record_geometry_extraction(elem_id, "success", &category, Some("aabb_fallback"));
				diag.record_confidence(elem_id, Confidence::Low.as_str(), &category);
			}
			return Some((aabb, Confidence::Low, "aabb_fallback"));
		}
	}

	if let Some(diag) = diagnostics.as_deref_mut() {
		diag.record_geometry_extraction(elem_id, "failed_all_strategies", &category, Some("all AREAL extraction strategies failed"));
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::{BoundingBoxSource, Face, GeometrySource, Solid};
	use crate::source::{SourceIdentity, SourceType};
	use glam::DMat4;

	struct FloorWithHole {
		outer: Vec<DVec3>,
		hole: Vec<DVec3>,
	}

	impl BoundingBoxSource for FloorWithHole {
		fn bounding_box(&self, _view: &ViewHandle) -> Option<(DVec3, DVec3, Option<DMat4>)> {
			Some((DVec3::new(0.0, 0.0, 1.0), DVec3::new(10.0, 10.0, 1.0), None))
		}
	}

	impl GeometrySource for FloorWithHole {
		fn geometry(&self, _options: &GeometryOptions) -> Vec<GeometryPrimitive> {
			vec![GeometryPrimitive::Solid(Solid {
				faces: vec![
					Face { loops: vec![self.outer.clone(), self.hole.clone()], normal: -DVec3::Z },
				],
			})]
		}
	}

	impl Element for FloorWithHole {
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

	fn basis() -> ViewBasis {
		ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap()
	}

	#[test]
	fn planar_face_loops_wins_tier_one_and_preserves_hole() {
		let floor = FloorWithHole {
			outer: vec![DVec3::new(0.0, 0.0, 1.0), DVec3::new(10.0, 0.0, 1.0), DVec3::new(10.0, 10.0, 1.0), DVec3::new(0.0, 10.0, 1.0)],
			hole: vec![DVec3::new(4.0, 4.0, 1.0), DVec3::new(6.0, 4.0, 1.0), DVec3::new(6.0, 6.0, 1.0), DVec3::new(4.0, 6.0, 1.0)],
		};
		let view = ViewHandle(1);
		let (loops, confidence, strategy) = extract_areal_geometry(&floor, &view, &basis(), None).unwrap();
		assert_eq!(confidence, Confidence::High);
		assert_eq!(strategy, "planar_face_loops");
		assert!(loops.iter().any(|l| l.is_hole));
	}

	struct BboxOnly;

	impl BoundingBoxSource for BboxOnly {
		fn bounding_box(&self, _view: &ViewHandle) -> Option<(DVec3, DVec3, Option<DMat4>)> {
			Some((DVec3::new(0.0, 0.0, 2.0), DVec3::new(5.0, 5.0, 2.0), None))
		}
	}

	impl GeometrySource for BboxOnly {
		fn geometry(&self, _options: &GeometryOptions) -> Vec<GeometryPrimitive> {
			Vec::new()
		}
	}

	impl Element for BboxOnly {
		fn id(&self) -> Option<i64> {
			Some(2)
		}
		fn category(&self) -> Option<&str> {
			Some("Roofs")
		}
		fn source(&self) -> SourceIdentity {
			SourceIdentity::new(SourceType::Host, "doc-1", None).unwrap()
		}
	}

	#[test]
	fn falls_through_to_low_confidence_obb_without_geometry() {
		let elem = BboxOnly;
		let view = ViewHandle(2);
		let (_, confidence, strategy) = extract_areal_geometry(&elem, &view, &basis(), None).unwrap();
		assert_eq!(confidence, Confidence::Low);
		assert_eq!(strategy, "bbox_obb_used");
	}
}
