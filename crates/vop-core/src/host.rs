use crate::source::SourceIdentity;
use glam::{DMat4, DVec3};

/// Opaque per-view handle passed to host callbacks. The core never inspects
/// this; it exists purely so a host implementation can look up its own
/// view object.
pub struct ViewHandle(pub u64);

/// A single planar face of a solid: an outer boundary loop followed by zero
/// or more hole loops, plus the face's outward normal in world space.
#[derive(Debug, Clone)]
pub struct Face {
	pub loops: Vec<Vec<DVec3>>,
	pub normal: DVec3,
}

#[derive(Debug, Clone)]
pub struct Solid {
	pub faces: Vec<Face>,
}

/// An open or closed polyline, e.g. a CAD import curve or a location line.
#[derive(Debug, Clone)]
pub struct Polyline {
	pub points: Vec<DVec3>,
	pub closed: bool,
}

#[derive(Debug, Clone)]
pub enum GeometryPrimitive {
	Solid(Solid),
	Curve(Polyline),
}

/// Parameters the host uses to decide how much geometry detail to return.
/// Mirrors the original pipeline's use of `Options`/`ViewDetailLevel`.
#[derive(Debug, Clone, Copy)]
pub struct GeometryOptions {
	pub view_direction: DVec3,
	pub max_paths: usize,
	pub max_points_per_path: usize,
}

impl Default for GeometryOptions {
	fn default() -> Self {
		Self { view_direction: DVec3::NEG_Z, max_paths: 500, max_points_per_path: 200 }
	}
}

/// Supplies a world-space bounding box for an element within a view, plus an
/// optional transform (non-identity for elements coming from a linked
/// document).
pub trait BoundingBoxSource {
	fn bounding_box(&self, view: &ViewHandle) -> Option<(DVec3, DVec3, Option<DMat4>)>;
}

/// Supplies tessellated or analytic geometry for silhouette extraction.
pub trait GeometrySource {
	fn geometry(&self, options: &GeometryOptions) -> Vec<GeometryPrimitive>;
}

/// A single collected element, providing the minimum surface the core needs
/// to classify, extract, and render it.
pub trait Element: BoundingBoxSource + GeometrySource {
	fn id(&self) -> Option<i64>;
	fn category(&self) -> Option<&str>;
	fn link_transform(&self) -> Option<DMat4> {
		None
	}
	fn source(&self) -> SourceIdentity;

	/// Start/end of the element's location curve (if any), in world space.
	/// Used by the `location_curve_obb` silhouette strategy for thin
	/// diagonal elements (braces, pipe runs) whose bounding box poorly
	/// represents their footprint.
	fn location_curve(&self) -> Option<(DVec3, DVec3)> {
		None
	}
}

/// Collects every element a view should consider.
pub trait ElementCollector {
	fn collect(&self, view: &ViewHandle) -> Vec<Box<dyn Element>>;
}
