use crate::error::{CoreError, CoreResult};
use crate::source::SourceIdentity;
use vop_geom::{Bounds2D, ViewBasis};

/// Interned metadata for an element that has written at least one cell.
/// Rasters store an index into this table rather than repeating the
/// element id/category/source on every cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementMeta {
	pub element_id: Option<i64>,
	pub category: String,
	pub source: SourceIdentity,
}

/// What kind of write a caller is making to a model cell.
///
/// `Fill` and `Proxy` compete for the shared depth buffer: whichever is
/// nearer wins, and only a strictly nearer element may overwrite an
/// already-written cell. `ProxyEdge` bypasses the depth test entirely and
/// only ever touches `model_proxy_key`: it traces the boundary of a
/// TINY/LINEAR element's proxy rectangle, which is independent of model
/// occlusion and must never promote a cell into `model_mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellWriteKind {
	Fill,
	Proxy,
	ProxyEdge,
}

/// An annotation type recorded independently of model occlusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnnoType {
	Tag,
	Dimension,
	TextNote,
	Symbol,
	Other,
}

/// The per-view occupancy raster.
///
/// Layers are parallel `Vec`s indexed by `i + j * width`, one entry per
/// cell. [`ViewRaster::try_write_cell`] is the *only* function permitted to
/// mutate `model_mask`, `model_edge_key`, `model_proxy_key`,
/// `model_proxy_mask`, or `z_min` — every other caller, including this
/// module's own annotation helpers, must go through it. This funnel is what
/// makes the depth-monotonicity invariant checkable by inspection rather
/// than by auditing every call site.
pub struct ViewRaster {
	pub width: i64,
	pub height: i64,
	pub cell_size_ft: f64,
	pub basis: ViewBasis,
	pub bounds: Bounds2D,

	model_mask: Vec<bool>,
	model_edge_key: Vec<Option<u32>>,
	model_proxy_key: Vec<Option<u32>>,
	model_proxy_mask: Vec<bool>,
	z_min: Vec<f64>,
	model_key: Vec<Option<u32>>,

	anno_key: Vec<Option<u32>>,
	anno_type: Vec<Option<AnnoType>>,
	anno_over_model: Vec<bool>,

	element_meta: Vec<ElementMeta>,
	finalized: bool,
}

impl ViewRaster {
	pub fn new(width: i64, height: i64, cell_size_ft: f64, basis: ViewBasis, bounds: Bounds2D) -> CoreResult<Self> {
		if width <= 0 || height <= 0 {
			return Err(CoreError::AllocationFailed(format!("raster dimensions must be positive, got {width}x{height}")));
		}
		let n = (width * height) as usize;
		Ok(Self {
			width,
			height,
			cell_size_ft,
			basis,
			bounds,
			model_mask: vec![false; n],
			model_edge_key: vec![None; n],
			model_proxy_key: vec![None; n],
			model_proxy_mask: vec![false; n],
			z_min: vec![f64::INFINITY; n],
			model_key: vec![None; n],
			anno_key: vec![None; n],
			anno_type: vec![None; n],
			anno_over_model: vec![false; n],
			element_meta: Vec::new(),
			finalized: false,
		})
	}

	pub fn len(&self) -> usize {
		self.model_mask.len()
	}

	pub fn is_empty(&self) -> bool {
		self.model_mask.is_empty()
	}

	fn index(&self, i: i64, j: i64) -> Option<usize> {
		if i < 0 || j < 0 || i >= self.width || j >= self.height {
			return None;
		}
		Some((i + j * self.width) as usize)
	}

	/// Interns element metadata, returning a stable index for use with
	/// [`ViewRaster::try_write_cell`].
	pub fn get_or_create_element_meta_index(&mut self, element_id: Option<i64>, category: impl Into<String>, source: SourceIdentity) -> u32 {
		let category = category.into();
		if let Some(pos) = self.element_meta.iter().position(|m| m.element_id == element_id && m.category == category && m.source == source) {
			return pos as u32;
		}
		self.element_meta.push(ElementMeta { element_id, category, source });
		(self.element_meta.len() - 1) as u32
	}

	pub fn element_meta(&self, index: u32) -> Option<&ElementMeta> {
		self.element_meta.get(index as usize)
	}

	/// The only mutator of model layers. Returns whether the write was
	/// accepted: always `true` for [`CellWriteKind::ProxyEdge`], and for
	/// `Fill`/`Proxy` only when `depth` is strictly nearer than whatever is
	/// currently recorded at this cell (or the cell has never been written).
	///
	/// Out-of-bounds `(i, j)` is treated as a no-op failure rather than a
	/// panic, since callers iterate rectangles that may overhang the grid
	/// edge by construction.
	pub fn try_write_cell(&mut self, i: i64, j: i64, depth: f64, element_index: u32, kind: CellWriteKind) -> bool {
		let Some(idx) = self.index(i, j) else { return false };

		match kind {
			CellWriteKind::ProxyEdge => {
				self.model_proxy_key[idx] = Some(element_index);
				true
			}
			CellWriteKind::Fill | CellWriteKind::Proxy => {
				if depth < self.z_min[idx] {
					self.z_min[idx] = depth;
					self.model_key[idx] = Some(element_index);
					match kind {
						CellWriteKind::Fill => {
							self.model_mask[idx] = true;
						}
						CellWriteKind::Proxy => {
							self.model_proxy_mask[idx] = true;
							self.model_proxy_key[idx] = Some(element_index);
						}
						CellWriteKind::ProxyEdge => unreachable!(),
					}
					true
				} else {
					false
				}
			}
		}
	}

	/// Annotation layers are independent of model occlusion: they are never
	/// depth-tested and never compete with `try_write_cell`. Last write at a
	/// cell wins.
	pub fn set_cell_annotation(&mut self, i: i64, j: i64, element_index: u32, anno_type: AnnoType) -> bool {
		let Some(idx) = self.index(i, j) else { return false };
		self.anno_key[idx] = Some(element_index);
		self.anno_type[idx] = Some(anno_type);
		true
	}

	/// Computes `anno_over_model` for every cell from the current model
	/// layers. Must run after all model and annotation writes for the view
	/// are complete; re-running is idempotent.
	pub fn finalize_anno_over_model(&mut self, over_model_includes_proxies: bool) {
		for idx in 0..self.anno_over_model.len() {
			let has_annotation = self.anno_key[idx].is_some();
			let over_model = self.model_mask[idx] || (over_model_includes_proxies && self.model_proxy_mask[idx]);
			self.anno_over_model[idx] = has_annotation && over_model;
		}
		self.finalized = true;
	}

	pub fn is_finalized(&self) -> bool {
		self.finalized
	}

	pub fn model_mask(&self) -> &[bool] {
		&self.model_mask
	}

	pub fn model_edge_key(&self) -> &[Option<u32>] {
		&self.model_edge_key
	}

	pub fn model_proxy_key(&self) -> &[Option<u32>] {
		&self.model_proxy_key
	}

	pub fn model_proxy_mask(&self) -> &[bool] {
		&self.model_proxy_mask
	}

	pub fn model_key(&self) -> &[Option<u32>] {
		&self.model_key
	}

	pub fn z_min(&self) -> &[f64] {
		&self.z_min
	}

	pub fn anno_key(&self) -> &[Option<u32>] {
		&self.anno_key
	}

	pub fn anno_type(&self) -> &[Option<AnnoType>] {
		&self.anno_type
	}

	pub fn anno_over_model(&self) -> &[bool] {
		&self.anno_over_model
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::source::SourceType;
	use glam::DVec3;
	use pretty_assertions::assert_eq;

	fn test_raster(w: i64, h: i64) -> ViewRaster {
		let basis = ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
		ViewRaster::new(w, h, 1.0, basis, Bounds2D::from_min_max(glam::DVec2::ZERO, glam::DVec2::new(w as f64, h as f64))).unwrap()
	}

	#[test]
	fn layer_lengths_match_cell_count() {
		let raster = test_raster(10, 8);
		assert_eq!(raster.len(), 80);
		assert_eq!(raster.model_mask().len(), 80);
		assert_eq!(raster.z_min().len(), 80);
	}

	#[test]
	fn nearer_write_wins_and_farther_is_rejected() {
		let mut raster = test_raster(4, 4);
		let source = SourceIdentity::new(SourceType::Host, "doc-1", None).unwrap();
		let a = raster.get_or_create_element_meta_index(Some(1), "Walls", source.clone());
		let b = raster.get_or_create_element_meta_index(Some(2), "Walls", source);

		assert!(raster.try_write_cell(1, 1, 5.0, a, CellWriteKind::Fill));
		assert!(!raster.try_write_cell(1, 1, 10.0, b, CellWriteKind::Fill));
		assert!(raster.try_write_cell(1, 1, 2.0, b, CellWriteKind::Fill));

		assert_eq!(raster.model_key()[1 + 1 * 4], Some(b));
		assert_eq!(raster.z_min()[1 + 1 * 4], 2.0);
	}

	#[test]
	fn out_of_bounds_write_is_rejected() {
		let mut raster = test_raster(2, 2);
		assert!(!raster.try_write_cell(5, 5, 1.0, 0, CellWriteKind::Fill));
	}

	#[test]
	fn proxy_edge_writes_bypass_depth_test() {
		let mut raster = test_raster(2, 2);
		assert!(raster.try_write_cell(0, 0, 100.0, 0, CellWriteKind::ProxyEdge));
		assert!(raster.try_write_cell(0, 0, 1.0, 1, CellWriteKind::ProxyEdge));
		assert_eq!(raster.model_proxy_key()[0], Some(1));
		assert!(!raster.model_mask()[0]);
	}

	#[test]
	fn annotation_over_model_requires_both_layers() {
		let mut raster = test_raster(2, 2);
		let source = SourceIdentity::new(SourceType::Host, "doc-1", None).unwrap();
		let elem = raster.get_or_create_element_meta_index(Some(1), "Floors", source);

		raster.try_write_cell(0, 0, 1.0, elem, CellWriteKind::Fill);
		raster.set_cell_annotation(0, 0, elem, AnnoType::Tag);
		raster.set_cell_annotation(1, 1, elem, AnnoType::Tag);

		raster.finalize_anno_over_model(true);

		assert!(raster.anno_over_model()[0]);
		assert!(!raster.anno_over_model()[1 + 1 * 2]);
	}
}
