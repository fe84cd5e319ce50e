use thiserror::Error;

/// The error taxonomy for the raster core.
///
/// Most call sites never see these escape: per-element and per-strategy
/// failures are swallowed at the renderer (see `render.rs`) and folded into
/// diagnostics rather than aborting a run. `CoreError` exists so that the
/// swallow points are explicit `match`/`.ok()` calls over a typed error
/// rather than a bare `catch`, and so driver-level callers that *do* want to
/// fail fast (an unsupported view, a corrupted config) have something
/// concrete to propagate.
#[derive(Debug, Error)]
pub enum CoreError {
	/// The view itself can't be processed: a degenerate basis, a zero-area
	/// footprint, or a non-orthographic projection.
	#[error("unsupported view: {0}")]
	UnsupportedView(String),

	/// A single element failed to extract geometry from every configured
	/// strategy. Carries an element id for diagnostics; never fatal to the
	/// view.
	#[error("extraction failed for element {element_id:?}: {reason}")]
	ExtractionFailed { element_id: Option<i64>, reason: String },

	/// The bounded LRU cache or the strategy tracker hit an invariant
	/// violation. Like extraction failures, this degrades gracefully: the
	/// pipeline keeps running without the cache/tracker rather than
	/// aborting.
	#[error("subsystem failure: {0}")]
	SubsystemFailure(String),

	/// A source identity triple failed validation (§4.K): `source_type` not
	/// in `{HOST, LINK, DWG}`, or an empty `source_id`.
	#[error("invalid source identity: {0}")]
	InvalidSourceIdentity(String),

	/// Raster allocation failed, e.g. the requested grid exceeds the sheet's
	/// maximum cell budget.
	#[error("raster allocation failed: {0}")]
	AllocationFailed(String),

	/// A configuration value violated one of its documented constraints.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
