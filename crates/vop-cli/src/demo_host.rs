//! An in-memory, synthetic host implementation of `vop_core`'s collector
//! traits. Real host integrations (a CAD application binding) would query a
//! live document instead; this one exists purely to drive the CLI and its
//! integration tests without one.

use glam::{DMat4, DVec3};
use vop_core::{BoundingBoxSource, Element, ElementCollector, Face, GeometryOptions, GeometryPrimitive, Solid, SourceIdentity, SourceType, ViewHandle};

#[derive(Debug, Clone)]
pub struct DemoElement {
	pub id: i64,
	pub category: String,
	pub min: DVec3,
	pub max: DVec3,
	pub solid: Option<Solid>,
	pub location_curve: Option<(DVec3, DVec3)>,
	pub source: SourceIdentity,
}

impl DemoElement {
	pub fn new(id: i64, category: impl Into<String>, min: DVec3, max: DVec3) -> Self {
		Self { id, category: category.into(), min, max, solid: None, location_curve: None, source: SourceIdentity::new(SourceType::Host, "demo-doc", None).unwrap() }
	}

	pub fn with_solid(mut self, solid: Solid) -> Self {
		self.solid = Some(solid);
		self
	}

	pub fn with_location_curve(mut self, p0: DVec3, p1: DVec3) -> Self {
		self.location_curve = Some((p0, p1));
		self
	}
}

impl BoundingBoxSource for DemoElement {
	fn bounding_box(&self, _view: &ViewHandle) -> Option<(DVec3, DVec3, Option<DMat4>)> {
		Some((self.min, self.max, None))
	}
}

impl vop_core::GeometrySource for DemoElement {
	fn geometry(&self, _options: &GeometryOptions) -> Vec<GeometryPrimitive> {
		match &self.solid {
			Some(solid) => vec![GeometryPrimitive::Solid(solid.clone())],
			None => Vec::new(),
		}
	}
}

impl Element for DemoElement {
	fn id(&self) -> Option<i64> {
		Some(self.id)
	}
	fn category(&self) -> Option<&str> {
		Some(&self.category)
	}
	fn source(&self) -> SourceIdentity {
		self.source.clone()
	}
	fn location_curve(&self) -> Option<(DVec3, DVec3)> {
		self.location_curve
	}
}

pub struct DemoCollector {
	pub elements: Vec<DemoElement>,
}

impl ElementCollector for DemoCollector {
	fn collect(&self, _view: &ViewHandle) -> Vec<Box<dyn Element>> {
		self.elements.iter().cloned().map(|e| Box::new(e) as Box<dyn Element>).collect()
	}
}

fn rectangular_floor_solid(min: DVec3, max: DVec3, z: f64, hole: Option<(DVec3, DVec3)>) -> Solid {
	let outer = vec![DVec3::new(min.x, min.y, z), DVec3::new(max.x, min.y, z), DVec3::new(max.x, max.y, z), DVec3::new(min.x, max.y, z)];
	let mut loops = vec![outer];
	if let Some((hmin, hmax)) = hole {
		loops.push(vec![DVec3::new(hmin.x, hmin.y, z), DVec3::new(hmax.x, hmin.y, z), DVec3::new(hmax.x, hmax.y, z), DVec3::new(hmin.x, hmax.y, z)]);
	}
	Solid { faces: vec![Face { loops, normal: -DVec3::Z }] }
}

/// No elements at all: the raster should stay entirely unoccupied.
pub fn empty_view() -> DemoCollector {
	DemoCollector { elements: Vec::new() }
}

/// A single small door opening in a wall, a TINY/LINEAR-scale element.
pub fn single_door() -> DemoCollector {
	let door = DemoElement::new(1, "Doors", DVec3::new(4.0, 0.0, 2.0), DVec3::new(5.0, 0.2, 2.0));
	DemoCollector { elements: vec![door] }
}

/// An AREAL floor with a rectangular interior opening, exercising the
/// `planar_face_loops` strategy's hole preservation.
pub fn floor_with_opening() -> DemoCollector {
	let min = DVec3::new(0.0, 0.0, 10.0);
	let max = DVec3::new(40.0, 30.0, 10.0);
	let hole = (DVec3::new(15.0, 10.0, 10.0), DVec3::new(25.0, 20.0, 10.0));
	let solid = rectangular_floor_solid(min, max, 10.0, Some(hole));
	let floor = DemoElement::new(10, "Floors", min, max).with_solid(solid);
	DemoCollector { elements: vec![floor] }
}

/// Three overlapping walls at increasing depth: the renderer's nearest-wins
/// occlusion should leave only the nearest wall's footprint visible where
/// they overlap.
pub fn stacked_walls() -> DemoCollector {
	let elements = vec![
		DemoElement::new(20, "Walls", DVec3::new(0.0, 0.0, 30.0), DVec3::new(20.0, 1.0, 30.0)),
		DemoElement::new(21, "Walls", DVec3::new(0.0, 0.0, 20.0), DVec3::new(20.0, 1.0, 20.0)),
		DemoElement::new(22, "Walls", DVec3::new(0.0, 0.0, 10.0), DVec3::new(20.0, 1.0, 10.0)),
	];
	DemoCollector { elements }
}

/// A zero-area element (collapsed bounding box): a valid input the pipeline
/// must skip cleanly rather than panic on.
pub fn degenerate_element() -> DemoCollector {
	let degenerate = DemoElement::new(30, "Generic Models", DVec3::new(5.0, 5.0, 5.0), DVec3::new(5.0, 5.0, 5.0));
	let normal = DemoElement::new(31, "Walls", DVec3::new(0.0, 0.0, 5.0), DVec3::new(10.0, 1.0, 5.0));
	DemoCollector { elements: vec![degenerate, normal] }
}

/// A dense grid of small AREAL tiles, enough to overflow a small geometry
/// cache and exercise LRU eviction.
pub fn many_small_tiles(count: usize) -> DemoCollector {
	let mut elements = Vec::with_capacity(count);
	for i in 0..count {
		let x = (i as f64) * 3.0;
		let min = DVec3::new(x, 0.0, 40.0);
		let max = DVec3::new(x + 2.0, 2.0, 40.0);
		let solid = rectangular_floor_solid(min, max, 40.0, None);
		elements.push(DemoElement::new(100 + i as i64, "Floors", min, max).with_solid(solid));
	}
	DemoCollector { elements }
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn collect_clones_every_element_as_a_boxed_trait_object() {
		let collector = stacked_walls();
		let elements = collector.collect(&ViewHandle(1));
		assert_eq!(elements.len(), 3);
		assert_eq!(elements[0].category(), Some("Walls"));
	}

	#[test]
	fn floor_with_opening_carries_a_hole_loop() {
		let collector = floor_with_opening();
		let solid = collector.elements[0].solid.as_ref().unwrap();
		assert_eq!(solid.faces[0].loops.len(), 2);
	}

	#[test]
	fn many_small_tiles_produces_the_requested_count() {
		let collector = many_small_tiles(10);
		assert_eq!(collector.elements.len(), 10);
	}
}
