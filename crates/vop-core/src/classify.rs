use crate::config::Config;
use glam::DVec2;
use vop_geom::pca_oriented_extents_uv;

/// Element classification based on UV footprint size.
///
/// - `Tiny`: both dimensions `<= tiny_max` cells.
/// - `Linear`: one dimension `<= thin_max`, the other larger (a wall, beam,
///   or pipe run).
/// - `Areal`: both dimensions exceed `thin_max` (a floor, ceiling, or roof).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
	Tiny,
	Linear,
	Areal,
}

/// Classifies an element from its axis-aligned UV footprint, given in grid
/// cells.
///
/// `u <= tiny_max && v <= tiny_max` is `Tiny`; otherwise `min(u, v) <=
/// thin_max && max(u, v) > thin_max` is `Linear`; otherwise `Areal`.
pub fn classify_by_uv(u: i64, v: i64, cfg: &Config) -> Mode {
	if u <= cfg.tiny_max && v <= cfg.tiny_max {
		return Mode::Tiny;
	}
	let min_dim = u.min(v);
	let max_dim = u.max(v);
	if min_dim <= cfg.thin_max && max_dim > cfg.thin_max {
		return Mode::Linear;
	}
	Mode::Areal
}

/// Classifies an element from its PCA-fitted oriented footprint rather than
/// its axis-aligned one, so a diagonal wall is not mistaken for `Areal`
/// purely because its AABB is wide in both axes.
pub fn classify_by_uv_pca(points_uv: &[DVec2], cfg: &Config, cell_size_uv: f64) -> Mode {
	let (major, minor) = pca_oriented_extents_uv(points_uv);
	let major_cells = (major / cell_size_uv) as i64;
	let minor_cells = (minor / cell_size_uv) as i64;

	if minor_cells <= cfg.tiny_max && major_cells <= cfg.tiny_max {
		return Mode::Tiny;
	}
	if minor_cells <= cfg.thin_max {
		return Mode::Linear;
	}
	Mode::Areal
}

/// Decides whether a tier-A AABB classification is ambiguous enough to
/// warrant a tier-B PCA re-check: either the minor-axis thickness sits just
/// above the `thin_max` threshold (within a cell-size-scaled margin), or the
/// AABB footprint covers more than a configured fraction of the grid.
pub fn tier_a_is_ambiguous(minor_cells: i64, aabb_area_cells: i64, grid_area: i64, cell_size_world: f64, cfg: &Config) -> bool {
	let t = cfg.thin_max;
	let margin_cells = ((cell_size_world / cfg.tierb_cell_size_ref_ft).round() as i64).clamp(cfg.tierb_margin_cells_min, cfg.tierb_margin_cells_max);
	let thickness_ambig = t < minor_cells && minor_cells <= t + margin_cells;

	let area_thresh = ((cfg.tierb_area_fraction * grid_area as f64).round() as i64).clamp(cfg.tierb_area_thresh_min, cfg.tierb_area_thresh_max);
	let area_ambig = aabb_area_cells >= area_thresh;

	thickness_ambig || area_ambig
}

/// Two-tier classification dispatch: the cheap axis-aligned channel
/// (`classify_by_uv`) decides first; only when [`tier_a_is_ambiguous`]
/// flags the result as borderline does the precise PCA channel
/// (`classify_by_uv_pca`) run and become authoritative. This keeps the PCA
/// fit — an O(n) pass over every projected point — off the hot path for
/// the overwhelming majority of elements whose AABB classification isn't
/// in question.
pub fn classify_element(uv_corners: &[DVec2], cfg: &Config, cell_size_world: f64, grid_area: i64) -> Mode {
	let u_min = uv_corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
	let u_max = uv_corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
	let v_min = uv_corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
	let v_max = uv_corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

	let u_cells = ((u_max - u_min).max(0.0) / cell_size_world).ceil() as i64;
	let v_cells = ((v_max - v_min).max(0.0) / cell_size_world).ceil() as i64;

	let tier_a = classify_by_uv(u_cells, v_cells, cfg);

	let minor_cells = u_cells.min(v_cells);
	let aabb_area_cells = u_cells * v_cells;
	if tier_a_is_ambiguous(minor_cells, aabb_area_cells, grid_area, cell_size_world, cfg) {
		return classify_by_uv_pca(uv_corners, cfg, cell_size_world);
	}
	tier_a
}
