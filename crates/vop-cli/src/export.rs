//! CSV and PNG export for a rendered view, and CSV export for strategy
//! diagnostics (the latter forwards to [`vop_core::StrategyDiagnostics::export_to_csv`]).

use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgb};

use crate::driver::ViewOutcome;

/// Writes one row per cell: `i,j,model_mask,model_proxy_mask,z_min,anno_over_model`.
/// `z_min` is left blank for cells no element ever wrote.
pub fn export_raster_csv(path: &Path, outcome: &ViewOutcome) -> Result<()> {
	let mut writer = csv::Writer::from_path(path).with_context(|| format!("opening {}", path.display()))?;
	writer.write_record(["i", "j", "model_mask", "model_proxy_mask", "z_min", "anno_over_model"])?;

	let raster = &outcome.raster;
	for j in 0..raster.height {
		for i in 0..raster.width {
			let idx = (i + j * raster.width) as usize;
			let z_min = raster.z_min()[idx];
			let z_min_field = if z_min.is_finite() { z_min.to_string() } else { String::new() };
			writer.write_record([i.to_string(), j.to_string(), raster.model_mask()[idx].to_string(), raster.model_proxy_mask()[idx].to_string(), z_min_field, raster.anno_over_model()[idx].to_string()])?;
		}
	}
	writer.flush()?;
	Ok(())
}

/// Renders the view's model layers to a PNG: white background, black for
/// filled model cells, mid-gray for proxy cells, red for edge-only cells.
/// One pixel per cell; meant for quick visual inspection, not for precise
/// measurement.
pub fn export_raster_png(path: &Path, outcome: &ViewOutcome) -> Result<()> {
	let raster = &outcome.raster;
	let width = raster.width as u32;
	let height = raster.height as u32;

	let image = ImageBuffer::from_fn(width, height, |i, j| {
		let idx = (i as i64 + j as i64 * raster.width) as usize;
		if raster.model_mask()[idx] {
			Rgb([20u8, 20, 20])
		} else if raster.model_proxy_mask()[idx] {
			Rgb([150, 150, 150])
		} else if raster.model_edge_key()[idx].is_some() {
			Rgb([200, 40, 40])
		} else {
			Rgb([255, 255, 255])
		}
	});

	image.save(path).with_context(|| format!("writing {}", path.display()))?;
	Ok(())
}
