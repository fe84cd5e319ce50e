//! View-space math primitives shared by the raster core: bounds, cell-grid
//! rectangles, 2D PCA fitting, and orthographic view bases.

mod basis;
mod bounds;
mod cell_rect;
mod pca;
mod polygon;

pub use basis::ViewBasis;
pub use bounds::Bounds2D;
pub use cell_rect::{CellRect, ObbData};
pub use pca::{pca_oriented_extents_uv, pca_oriented_rect_uv};
pub use polygon::{plane_depth_at_uv, point_in_polygon_uv};
