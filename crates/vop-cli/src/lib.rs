//! Library surface behind the `vop` binary: the demo host, per-view driver,
//! and CSV/PNG export, factored out so integration tests can drive them
//! directly.

pub mod demo_host;
pub mod driver;
pub mod export;
