use crate::bounds::Bounds2D;
use glam::DVec2;

/// Precomputed oriented-bounding-box data attached to a [`CellRect`] during
/// element collection, so LINEAR-mode proxy construction never needs to
/// redo the PCA fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ObbData {
	/// Four corners of the fitted OBB in UV space, ordered so that
	/// `corners[0] -> corners[1]` and `corners[0] -> corners[3]` are the two
	/// orthogonal edges of the rectangle.
	pub obb_corners: [DVec2; 4],
}

/// An inclusive range of grid cell indices `[i_min, i_max] x [j_min, j_max]`.
///
/// Mirrors the original pipeline's `CellRect(i_min, j_min, i_max, j_max)`:
/// both bounds are inclusive, so a `CellRect` spanning a single cell has
/// `i_min == i_max` and `j_min == j_max`.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRect {
	pub i_min: i64,
	pub j_min: i64,
	pub i_max: i64,
	pub j_max: i64,
	pub obb_data: Option<ObbData>,
}

impl CellRect {
	pub fn new(i_min: i64, j_min: i64, i_max: i64, j_max: i64) -> Self {
		Self { i_min, j_min, i_max, j_max, obb_data: None }
	}

	pub fn with_obb_data(mut self, obb_data: ObbData) -> Self {
		self.obb_data = Some(obb_data);
		self
	}

	/// Number of cells spanned along U, inclusive of both ends.
	pub fn width_cells(&self) -> i64 {
		(self.i_max - self.i_min + 1).max(0)
	}

	/// Number of cells spanned along V, inclusive of both ends.
	pub fn height_cells(&self) -> i64 {
		(self.j_max - self.j_min + 1).max(0)
	}

	/// The integer cell nearest the rectangle's midpoint, used to stamp a
	/// single presence cell for TINY-mode proxies.
	pub fn center_cell(&self) -> (i64, i64) {
		(self.i_min + (self.i_max - self.i_min) / 2, self.j_min + (self.j_max - self.j_min) / 2)
	}

	/// Iterates every `(i, j)` cell index contained in this rectangle,
	/// row-major, matching the order the renderer writes in.
	pub fn cells(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
		(self.j_min..=self.j_max).flat_map(move |j| (self.i_min..=self.i_max).map(move |i| (i, j)))
	}

	pub fn to_bounds(&self) -> Bounds2D {
		Bounds2D::from_min_max(DVec2::new(self.i_min as f64, self.j_min as f64), DVec2::new((self.i_max + 1) as f64, (self.j_max + 1) as f64))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn single_cell_rect_has_unit_extent() {
		let rect = CellRect::new(5, 5, 5, 5);
		assert_eq!(rect.width_cells(), 1);
		assert_eq!(rect.height_cells(), 1);
		assert_eq!(rect.center_cell(), (5, 5));
	}

	#[test]
	fn five_by_five_rect_dimensions() {
		let rect = CellRect::new(0, 0, 4, 4);
		assert_eq!(rect.width_cells(), 5);
		assert_eq!(rect.height_cells(), 5);
		let bounds = rect.to_bounds();
		assert_eq!(bounds.max, DVec2::new(5.0, 5.0));
	}

	#[test]
	fn cells_iterator_covers_full_rect() {
		let rect = CellRect::new(0, 0, 1, 1);
		let cells: Vec<_> = rect.cells().collect();
		assert_eq!(cells.len(), 4);
		assert!(cells.contains(&(0, 0)));
		assert!(cells.contains(&(1, 1)));
	}
}
