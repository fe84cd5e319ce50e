//! Exercises the CLI's demo host scenarios end to end through the driver,
//! matching the seed scenarios used to sanity-check the pipeline.

use glam::{DVec2, DVec3};
use pretty_assertions::assert_eq;
use vop_cli::demo_host;
use vop_cli::driver::{run_view, ViewSpec};
use vop_core::Config;

fn plan_view(crop_max: DVec2) -> ViewSpec {
	ViewSpec { view_id: 1, view_name: "test".into(), scale: 96.0, origin: DVec3::ZERO, right: DVec3::X, up: DVec3::Y, crop_min: DVec2::new(-5.0, -5.0), crop_max }
}

#[test]
fn empty_view_has_no_filled_cells() {
	let cfg = Config::default();
	let outcome = run_view(&plan_view(DVec2::new(55.0, 35.0)), &cfg, &demo_host::empty_view()).unwrap();
	assert_eq!(outcome.filled_cells, 0);
	assert_eq!(outcome.total_elements, 0);
}

#[test]
fn single_door_produces_a_proxy_but_no_fill() {
	let cfg = Config::default();
	let outcome = run_view(&plan_view(DVec2::new(55.0, 35.0)), &cfg, &demo_host::single_door()).unwrap();
	assert_eq!(outcome.total_elements, 1);
	assert_eq!(outcome.raster.model_mask().iter().filter(|&&m| m).count(), 0);
	assert!(outcome.raster.model_proxy_mask().iter().any(|&m| m));
}

#[test]
fn floor_with_opening_leaves_the_hole_unfilled() {
	let cfg = Config::default();
	let outcome = run_view(&plan_view(DVec2::new(55.0, 35.0)), &cfg, &demo_host::floor_with_opening()).unwrap();
	assert!(outcome.filled_cells > 0);

	let raster = &outcome.raster;
	let cell_size = outcome.cell_size_ft;
	let hole_center_uv = DVec2::new(20.0, 15.0);
	let i = ((hole_center_uv.x - raster.bounds.min.x) / cell_size) as i64;
	let j = ((hole_center_uv.y - raster.bounds.min.y) / cell_size) as i64;
	let idx = (i + j * raster.width) as usize;
	assert!(!raster.model_mask()[idx], "hole center should not be filled");
}

#[test]
fn stacked_walls_leave_only_the_nearest_visible() {
	let cfg = Config::default();
	let outcome = run_view(&plan_view(DVec2::new(55.0, 35.0)), &cfg, &demo_host::stacked_walls()).unwrap();

	let raster = &outcome.raster;
	let idx = raster.model_key().iter().position(|k| k.is_some()).expect("at least one written cell");
	let meta_idx = raster.model_key()[idx].unwrap();
	let meta = raster.element_meta(meta_idx).unwrap();
	assert_eq!(meta.element_id, Some(22), "nearest wall (z=10) should win occlusion");
}

#[test]
fn degenerate_element_does_not_panic_and_normal_element_still_renders() {
	let cfg = Config::default();
	let outcome = run_view(&plan_view(DVec2::new(55.0, 35.0)), &cfg, &demo_host::degenerate_element()).unwrap();
	assert_eq!(outcome.total_elements, 2);
	assert!(outcome.raster.model_proxy_mask().iter().any(|&m| m) || outcome.filled_cells > 0);
}

#[test]
fn many_small_tiles_overflow_a_small_geometry_cache_without_failing() {
	let mut cfg = Config::default();
	cfg.geometry_cache_max_items = 4;
	let count = 64;
	let outcome = run_view(&plan_view(DVec2::new(count as f64 * 3.0 + 5.0, 10.0)), &cfg, &demo_host::many_small_tiles(count)).unwrap();
	assert_eq!(outcome.total_elements, count);
	assert!(outcome.filled_cells > 0);
}
