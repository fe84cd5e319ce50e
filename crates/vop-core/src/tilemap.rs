use crate::raster::ViewRaster;

/// A coarse partition of a [`ViewRaster`] into `tile_size x tile_size`
/// blocks, used by the renderer to skip whole regions once they are fully
/// covered by nearer geometry instead of re-testing every cell.
///
/// `TileMap` holds no layer data of its own: it queries the raster's current
/// `model_mask` on demand. This keeps it trivially consistent with the
/// raster (there is no separate state that could drift), at the cost of an
/// O(tile area) scan per saturation check; acceptable since the renderer
/// only asks once per element per tile it overlaps.
pub struct TileMap {
	tile_size: i64,
	tiles_x: i64,
	tiles_y: i64,
	width: i64,
	height: i64,
}

impl TileMap {
	pub fn new(width: i64, height: i64, tile_size: u32) -> Self {
		let tile_size = (tile_size as i64).max(1);
		let tiles_x = width.div_ceil(tile_size);
		let tiles_y = height.div_ceil(tile_size);
		Self { tile_size, tiles_x, tiles_y, width, height }
	}

	pub fn tile_size(&self) -> i64 {
		self.tile_size
	}

	pub fn tiles_x(&self) -> i64 {
		self.tiles_x
	}

	pub fn tiles_y(&self) -> i64 {
		self.tiles_y
	}

	pub fn tile_of_cell(&self, i: i64, j: i64) -> (i64, i64) {
		(i.div_euclid(self.tile_size), j.div_euclid(self.tile_size))
	}

	/// Inclusive cell-index bounds of tile `(tx, ty)`, clamped to the
	/// raster's actual extent (the last row/column of tiles may be
	/// partial).
	pub fn tile_bounds(&self, tx: i64, ty: i64) -> (i64, i64, i64, i64) {
		let i_min = tx * self.tile_size;
		let j_min = ty * self.tile_size;
		let i_max = (i_min + self.tile_size - 1).min(self.width - 1);
		let j_max = (j_min + self.tile_size - 1).min(self.height - 1);
		(i_min, j_min, i_max, j_max)
	}

	/// The range of tiles overlapped by an inclusive cell rectangle.
	pub fn tiles_overlapping(&self, i_min: i64, j_min: i64, i_max: i64, j_max: i64) -> impl Iterator<Item = (i64, i64)> + '_ {
		let (tx_min, ty_min) = self.tile_of_cell(i_min.max(0), j_min.max(0));
		let (tx_max, ty_max) = self.tile_of_cell(i_max.min(self.width - 1), j_max.min(self.height - 1));
		(ty_min..=ty_max).flat_map(move |ty| (tx_min..=tx_max).map(move |tx| (tx, ty)))
	}

	/// A tile is saturated once every cell within its (clamped) bounds has
	/// `model_mask == true`: every cell has *some* opaque model geometry,
	/// though not necessarily geometry nearer than any given candidate.
	pub fn is_saturated(&self, raster: &ViewRaster, tx: i64, ty: i64) -> bool {
		let (i_min, j_min, i_max, j_max) = self.tile_bounds(tx, ty);
		let mask = raster.model_mask();
		for j in j_min..=j_max {
			for i in i_min..=i_max {
				if !mask[(i + j * raster.width) as usize] {
					return false;
				}
			}
		}
		true
	}

	/// Minimum `z_min` recorded over tile `(tx, ty)`'s cells, or
	/// `+infinity` if the tile has no written cells.
	pub fn z_min_tile(&self, raster: &ViewRaster, tx: i64, ty: i64) -> f64 {
		let (i_min, j_min, i_max, j_max) = self.tile_bounds(tx, ty);
		let z_min = raster.z_min();
		let mut min = f64::INFINITY;
		for j in j_min..=j_max {
			for i in i_min..=i_max {
				let z = z_min[(i + j * raster.width) as usize];
				if z < min {
					min = z;
				}
			}
		}
		min
	}

	/// A tile can safely be skipped by a candidate at depth `z_near` only
	/// when it is both fully covered (`is_saturated`) and everything
	/// covering it is strictly nearer than the candidate — otherwise the
	/// candidate might still win a depth test against some cell in the
	/// tile.
	pub fn is_guaranteed_occluded(&self, raster: &ViewRaster, tx: i64, ty: i64, z_near: f64) -> bool {
		self.is_saturated(raster, tx, ty) && self.z_min_tile(raster, tx, ty) < z_near
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::raster::CellWriteKind;
	use crate::source::{SourceIdentity, SourceType};
	use glam::{DVec2, DVec3};
	use pretty_assertions::assert_eq;
	use vop_geom::{Bounds2D, ViewBasis};

	fn test_raster(w: i64, h: i64) -> ViewRaster {
		let basis = ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
		ViewRaster::new(w, h, 1.0, basis, Bounds2D::from_min_max(DVec2::ZERO, DVec2::new(w as f64, h as f64))).unwrap()
	}

	#[test]
	fn tile_count_covers_partial_last_tile() {
		let tilemap = TileMap::new(20, 10, 8);
		assert_eq!(tilemap.tiles_x(), 3);
		assert_eq!(tilemap.tiles_y(), 2);
	}

	#[test]
	fn tile_bounds_clamp_to_raster_extent() {
		let tilemap = TileMap::new(20, 10, 8);
		assert_eq!(tilemap.tile_bounds(2, 1), (16, 8, 19, 9));
	}

	#[test]
	fn saturation_requires_every_cell_filled() {
		let mut raster = test_raster(4, 4);
		let tilemap = TileMap::new(4, 4, 4);
		let source = SourceIdentity::new(SourceType::Host, "doc-1", None).unwrap();
		let elem = raster.get_or_create_element_meta_index(Some(1), "Floors", source);

		for i in 0..4 {
			for j in 0..4 {
				raster.try_write_cell(i, j, 1.0, elem, CellWriteKind::Fill);
			}
		}
		assert!(tilemap.is_saturated(&raster, 0, 0));

		let mut partial = test_raster(4, 4);
		let source = SourceIdentity::new(SourceType::Host, "doc-1", None).unwrap();
		let elem = partial.get_or_create_element_meta_index(Some(1), "Floors", source);
		partial.try_write_cell(0, 0, 1.0, elem, CellWriteKind::Fill);
		assert!(!tilemap.is_saturated(&partial, 0, 0));
	}

	#[test]
	fn z_min_tile_is_infinite_until_a_cell_is_written() {
		let raster = test_raster(4, 4);
		let tilemap = TileMap::new(4, 4, 4);
		assert_eq!(tilemap.z_min_tile(&raster, 0, 0), f64::INFINITY);
	}

	#[test]
	fn saturated_tile_only_occludes_a_farther_candidate() {
		let mut raster = test_raster(4, 4);
		let tilemap = TileMap::new(4, 4, 4);
		let source = SourceIdentity::new(SourceType::Host, "doc-1", None).unwrap();
		let elem = raster.get_or_create_element_meta_index(Some(1), "Floors", source);

		for i in 0..4 {
			for j in 0..4 {
				raster.try_write_cell(i, j, 5.0, elem, CellWriteKind::Fill);
			}
		}

		assert_eq!(tilemap.z_min_tile(&raster, 0, 0), 5.0);
		assert!(tilemap.is_guaranteed_occluded(&raster, 0, 0, 10.0));
		assert!(!tilemap.is_guaranteed_occluded(&raster, 0, 0, 1.0));
	}
}
