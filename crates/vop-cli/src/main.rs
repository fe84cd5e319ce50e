use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use glam::{DVec2, DVec3};
use vop_core::{Config, ElementCollector};

use vop_cli::driver::{self, ViewSpec};
use vop_cli::{demo_host, export};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
	/// No elements: the raster stays entirely unoccupied.
	Empty,
	/// A single small TINY/LINEAR-scale door.
	SingleDoor,
	/// An AREAL floor with a rectangular interior opening.
	FloorWithOpening,
	/// Three overlapping walls at increasing depth.
	StackedWalls,
	/// A zero-area element alongside a normal one.
	Degenerate,
	/// A dense grid of small AREAL tiles, exercising geometry cache eviction.
	ManyTiles,
}

/// Renders one of several synthetic demo scenarios through the view
/// occupancy proxy raster pipeline and writes the result to disk.
#[derive(Debug, Parser)]
#[command(name = "vop", author, version, about)]
struct Cli {
	#[arg(value_enum)]
	scenario: Scenario,

	/// Directory to write raster.csv / raster.png / diagnostics.csv into.
	#[arg(long, default_value = "out")]
	out_dir: PathBuf,

	/// Drawing scale, e.g. 96 for 1/8" = 1'-0".
	#[arg(long, default_value_t = 96.0)]
	scale: f64,

	/// Element count for the `many-tiles` scenario.
	#[arg(long, default_value_t = 256)]
	tile_count: usize,

	/// Collect and export per-strategy extraction diagnostics.
	#[arg(long)]
	diagnostics: bool,
}

fn build_collector(scenario: Scenario, tile_count: usize) -> Box<dyn ElementCollector> {
	match scenario {
		Scenario::Empty => Box::new(demo_host::empty_view()),
		Scenario::SingleDoor => Box::new(demo_host::single_door()),
		Scenario::FloorWithOpening => Box::new(demo_host::floor_with_opening()),
		Scenario::StackedWalls => Box::new(demo_host::stacked_walls()),
		Scenario::Degenerate => Box::new(demo_host::degenerate_element()),
		Scenario::ManyTiles => Box::new(demo_host::many_small_tiles(tile_count)),
	}
}

fn crop_box_for(scenario: Scenario, tile_count: usize) -> (DVec2, DVec2) {
	match scenario {
		Scenario::ManyTiles => (DVec2::new(-5.0, -5.0), DVec2::new(tile_count as f64 * 3.0 + 5.0, 10.0)),
		_ => (DVec2::new(-5.0, -5.0), DVec2::new(55.0, 35.0)),
	}
}

fn main() -> Result<()> {
	env_logger::init();
	let args = Cli::parse();

	let cfg = Config { export_strategy_diagnostics: args.diagnostics, ..Config::default() };
	let collector = build_collector(args.scenario, args.tile_count);
	let (crop_min, crop_max) = crop_box_for(args.scenario, args.tile_count);

	let spec = ViewSpec {
		view_id: 1,
		view_name: format!("{:?}", args.scenario),
		scale: args.scale,
		origin: DVec3::ZERO,
		right: DVec3::X,
		up: DVec3::Y,
		crop_min,
		crop_max,
	};

	let outcome = driver::run_view(&spec, &cfg, collector.as_ref())?;

	log::info!(
		"view {} ({}x{} cells, tile {}): {} elements, {} filled cells",
		outcome.view_name,
		outcome.width,
		outcome.height,
		outcome.tile_size,
		outcome.total_elements,
		outcome.filled_cells
	);

	fs::create_dir_all(&args.out_dir)?;
	export::export_raster_csv(&args.out_dir.join("raster.csv"), &outcome)?;
	export::export_raster_png(&args.out_dir.join("raster.png"), &outcome)?;

	if let Some(diagnostics) = &outcome.diagnostics {
		diagnostics.log_summary();
		diagnostics.export_to_csv(&args.out_dir.join("diagnostics.csv"))?;
	}

	Ok(())
}
