//! Per-view driver: turns a view description and a config into a fully
//! rendered [`ViewRaster`], the way a host integration's view-processing
//! entry point would, minus the host binding itself.

use anyhow::{bail, Context, Result};
use glam::{DVec2, DVec3};
use vop_core::{Config, ElementCollector, StrategyDiagnostics, ViewHandle, ViewRaster};
use vop_geom::{Bounds2D, ViewBasis};

/// Everything the driver needs to know about a view that isn't in `Config`:
/// the host would otherwise supply this from `view.scale`, `view.crop_box`,
/// and the view's camera.
#[derive(Debug, Clone)]
pub struct ViewSpec {
	pub view_id: u64,
	pub view_name: String,
	/// Drawing scale, e.g. `96.0` for a 1/8" = 1'-0" plan.
	pub scale: f64,
	pub origin: DVec3,
	pub right: DVec3,
	pub up: DVec3,
	/// Crop rectangle in view UV feet.
	pub crop_min: DVec2,
	pub crop_max: DVec2,
}

/// A fully rendered view, ready for export.
pub struct ViewOutcome {
	pub view_id: u64,
	pub view_name: String,
	pub width: i64,
	pub height: i64,
	pub cell_size_ft: f64,
	pub tile_size: u32,
	pub total_elements: usize,
	pub filled_cells: usize,
	pub raster: ViewRaster,
	pub diagnostics: Option<StrategyDiagnostics>,
}

/// Runs one view end to end: validates `cfg`, sizes the grid from the
/// view's scale and crop box, collects elements, renders front-to-back, and
/// finalizes the annotation-over-model layer.
pub fn run_view(spec: &ViewSpec, cfg: &Config, collector: &dyn ElementCollector) -> Result<ViewOutcome> {
	cfg.validate().context("invalid configuration")?;

	let basis = ViewBasis::from_raw(spec.origin, spec.right, spec.up).with_context(|| format!("view {} has a degenerate camera basis", spec.view_id))?;

	if spec.scale <= 0.0 {
		bail!("view {} has a non-positive scale {}", spec.view_id, spec.scale);
	}
	let cell_size_ft = cfg.cell_size_paper_in * spec.scale / 12.0;

	let bounds = Bounds2D::from_min_max(spec.crop_min, spec.crop_max).buffered(cfg.bounds_buffer_ft());
	if bounds.is_empty() {
		bail!("view {} has an empty or inverted crop box", spec.view_id);
	}

	let width = ((bounds.width() / cell_size_ft).ceil() as i64).clamp(1, cfg.max_grid_cells_width());
	let height = ((bounds.height() / cell_size_ft).ceil() as i64).clamp(1, cfg.max_grid_cells_height());
	let tile_size = cfg.compute_adaptive_tile_size(width, height);

	let mut raster = ViewRaster::new(width, height, cell_size_ft, basis, bounds).context("failed to allocate view raster")?;
	let tilemap = vop_core::TileMap::new(width, height, tile_size);

	let view = ViewHandle(spec.view_id);
	let elements = collector.collect(&view);
	let total_elements = elements.len();

	let mut diagnostics = cfg.export_strategy_diagnostics.then(StrategyDiagnostics::new);

	let basis = raster.basis;
	vop_core::render_view(&elements, &view, &basis, cfg, &mut raster, &tilemap, diagnostics.as_mut());
	raster.finalize_anno_over_model(cfg.over_model_includes_proxies);

	let filled_cells = raster.model_mask().iter().filter(|&&m| m).count();

	Ok(ViewOutcome { view_id: spec.view_id, view_name: spec.view_name.clone(), width, height, cell_size_ft, tile_size, total_elements, filled_cells, raster, diagnostics })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::demo_host::single_door;
	use pretty_assertions::assert_eq;

	fn plan_view() -> ViewSpec {
		ViewSpec {
			view_id: 1,
			view_name: "Level 1".into(),
			scale: 96.0,
			origin: DVec3::ZERO,
			right: DVec3::X,
			up: DVec3::Y,
			crop_min: DVec2::new(0.0, 0.0),
			crop_max: DVec2::new(20.0, 20.0),
		}
	}

	#[test]
	fn cell_size_derives_from_scale_and_paper_size() {
		let cfg = Config::default();
		let outcome = run_view(&plan_view(), &cfg, &single_door()).unwrap();
		assert_eq!(outcome.cell_size_ft, cfg.cell_size_paper_in * 96.0 / 12.0);
	}

	#[test]
	fn non_positive_scale_is_rejected() {
		let mut spec = plan_view();
		spec.scale = 0.0;
		let cfg = Config::default();
		assert!(run_view(&spec, &cfg, &single_door()).is_err());
	}

	#[test]
	fn empty_crop_box_is_rejected() {
		let mut spec = plan_view();
		spec.crop_max = spec.crop_min;
		let cfg = Config::default();
		assert!(run_view(&spec, &cfg, &single_door()).is_err());
	}
}
