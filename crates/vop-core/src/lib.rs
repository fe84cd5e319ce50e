//! Per-view occupancy raster core.
//!
//! Given a collection of elements visible in an orthographic view, classifies
//! each by footprint size, extracts a 2D silhouette, and rasterizes it
//! front-to-back into a [`raster::ViewRaster`] with strict nearest-wins
//! depth occlusion.

pub mod areal;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod raster;
pub mod render;
pub mod silhouette;
pub mod source;
pub mod tilemap;

pub use areal::{extract_areal_geometry, Confidence};
pub use classify::{classify_by_uv, classify_by_uv_pca, tier_a_is_ambiguous, Mode};
pub use config::{Config, ProxyMaskMode};
pub use diagnostics::{Summary, StrategyDiagnostics};
pub use error::{CoreError, CoreResult};
pub use host::{BoundingBoxSource, Element, ElementCollector, Face, GeometryOptions, GeometryPrimitive, GeometrySource, Polyline, Solid, ViewHandle};
pub use raster::{AnnoType, CellWriteKind, ElementMeta, ViewRaster};
pub use render::render_view;
pub use silhouette::{get_element_silhouette, SilhouetteLoop};
pub use source::{SourceIdentity, SourceType};
pub use tilemap::TileMap;
