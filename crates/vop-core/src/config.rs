use crate::error::{CoreError, CoreResult};

/// How a TINY/LINEAR proxy is stamped into the occupancy mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProxyMaskMode {
	/// Stamp only proxy edges (lightest).
	Edges,
	/// Minimal mask: TINY stamps its center cell, LINEAR stamps a thin band
	/// along its long axis.
	Minmask,
}

/// Pipeline configuration. Every field here is a tunable the original
/// implementation exposed; collector-level knobs (multi-category filters,
/// coarse spatial pre-filtering, view/element persistence caches) are
/// intentionally left to the host integration layer, which is out of scope
/// here.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
	pub tile_size: u32,
	pub adaptive_tile_size: bool,
	pub over_model_includes_proxies: bool,
	pub proxy_mask_mode: ProxyMaskMode,
	pub depth_eps_ft: f64,
	pub tiny_max: i64,
	pub thin_max: i64,
	pub cell_size_paper_in: f64,
	pub max_sheet_width_in: f64,
	pub max_sheet_height_in: f64,
	pub bounds_buffer_in: f64,
	pub include_linked_rvt: bool,
	pub include_dwg_imports: bool,
	pub linear_band_thickness_cells: f64,
	pub geometry_cache_max_items: usize,

	/// Reference cell size (feet) the tier-B margin-in-cells calculation is
	/// scaled against.
	pub tierb_cell_size_ref_ft: f64,
	/// Fraction of the grid's total cell area above which an AABB footprint
	/// is considered ambiguous regardless of thickness.
	pub tierb_area_fraction: f64,
	pub tierb_margin_cells_min: i64,
	pub tierb_margin_cells_max: i64,
	pub tierb_area_thresh_min: i64,
	pub tierb_area_thresh_max: i64,

	pub debug_dump_occlusion: bool,
	pub debug_dump_path: Option<String>,
	pub debug_dump_occlusion_image: bool,
	pub debug_dump_prefix: Option<String>,

	pub export_strategy_diagnostics: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			tile_size: 16,
			adaptive_tile_size: true,
			over_model_includes_proxies: true,
			proxy_mask_mode: ProxyMaskMode::Minmask,
			depth_eps_ft: 0.01,
			tiny_max: 2,
			thin_max: 2,
			cell_size_paper_in: 0.125,
			max_sheet_width_in: 48.0,
			max_sheet_height_in: 36.0,
			bounds_buffer_in: 0.0,
			include_linked_rvt: true,
			include_dwg_imports: true,
			linear_band_thickness_cells: 1.0,
			geometry_cache_max_items: 2048,
			tierb_cell_size_ref_ft: 1.0,
			tierb_area_fraction: 0.005,
			tierb_margin_cells_min: 1,
			tierb_margin_cells_max: 4,
			tierb_area_thresh_min: 50,
			tierb_area_thresh_max: 2000,
			debug_dump_occlusion: false,
			debug_dump_path: None,
			debug_dump_occlusion_image: true,
			debug_dump_prefix: None,
			export_strategy_diagnostics: false,
		}
	}
}

impl Config {
	/// Validates every documented constraint, mirroring the source
	/// pipeline's constructor-time `raise ValueError` checks.
	pub fn validate(&self) -> CoreResult<()> {
		if self.tile_size == 0 {
			return Err(CoreError::InvalidConfig("tile_size must be positive".into()));
		}
		if self.depth_eps_ft < 0.0 {
			return Err(CoreError::InvalidConfig("depth_eps_ft must be non-negative".into()));
		}
		if self.tiny_max < 0 || self.thin_max < 0 {
			return Err(CoreError::InvalidConfig("tiny_max and thin_max must be non-negative".into()));
		}
		if self.cell_size_paper_in <= 0.0 {
			return Err(CoreError::InvalidConfig("cell_size_paper_in must be positive".into()));
		}
		if self.max_sheet_width_in <= 0.0 || self.max_sheet_height_in <= 0.0 {
			return Err(CoreError::InvalidConfig("max_sheet dimensions must be positive".into()));
		}
		if self.bounds_buffer_in < 0.0 {
			return Err(CoreError::InvalidConfig("bounds_buffer_in must be non-negative".into()));
		}
		if self.linear_band_thickness_cells < 0.0 {
			return Err(CoreError::InvalidConfig("linear_band_thickness_cells must be non-negative".into()));
		}
		Ok(())
	}

	/// Maximum grid width in cells implied by the sheet size and paper cell
	/// size (e.g. 384 cells for a 48" Arch E sheet at 1/8").
	pub fn max_grid_cells_width(&self) -> i64 {
		(self.max_sheet_width_in / self.cell_size_paper_in) as i64
	}

	pub fn max_grid_cells_height(&self) -> i64 {
		(self.max_sheet_height_in / self.cell_size_paper_in) as i64
	}

	pub fn bounds_buffer_ft(&self) -> f64 {
		self.bounds_buffer_in / 12.0
	}

	/// Computes a power-of-two tile size in `[8, 64]` targeting roughly 2000
	/// tiles across the grid, or `self.tile_size` unchanged when adaptive
	/// sizing is disabled.
	pub fn compute_adaptive_tile_size(&self, grid_width: i64, grid_height: i64) -> u32 {
		if !self.adaptive_tile_size {
			return self.tile_size;
		}
		let total_cells = (grid_width.max(0) as f64) * (grid_height.max(0) as f64);
		if total_cells <= 0.0 {
			return self.tile_size;
		}
		let avg_dim = total_cells.sqrt();
		let target_tiles = 2000.0_f64;
		let ideal_tile_size = avg_dim / target_tiles.sqrt();
		let exponent = ideal_tile_size.max(1.0).log2().round();
		let tile_size = 2f64.powf(exponent).clamp(8.0, 64.0);
		tile_size as u32
	}

	/// Ordered silhouette strategy names for a UV mode, matching the
	/// original pipeline's per-mode fallback chains.
	pub fn silhouette_strategies(&self, mode: crate::classify::Mode) -> &'static [&'static str] {
		use crate::classify::Mode;
		match mode {
			Mode::Tiny => &["bbox"],
			Mode::Linear => &["uv_obb_rect", "obb", "bbox"],
			Mode::Areal => &["planar_face_loops", "silhouette_edges", "obb", "bbox"],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn defaults_match_reference_values() {
		let cfg = Config::default();
		assert_eq!(cfg.tile_size, 16);
		assert_eq!(cfg.max_grid_cells_width(), 384);
		assert_eq!(cfg.max_grid_cells_height(), 288);
		assert!(cfg.validate().is_ok());
	}

	#[test]
	fn zero_tile_size_is_rejected() {
		let cfg = Config { tile_size: 0, ..Config::default() };
		assert!(cfg.validate().is_err());
	}

	#[test]
	fn adaptive_tile_size_targets_known_bucket() {
		let cfg = Config::default();
		assert_eq!(cfg.compute_adaptive_tile_size(64, 64), 8);
		assert_eq!(cfg.compute_adaptive_tile_size(256, 256), 16);
		assert_eq!(cfg.compute_adaptive_tile_size(1024, 1024), 32);
	}
}
