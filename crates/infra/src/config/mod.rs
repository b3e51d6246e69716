//! Configuration loading
//!
//! File and environment overlays for [`xdr_domain::ClientConfig`].

pub mod loader;

pub use loader::{
    apply_overrides_from, load, load_from_env, load_from_file, probe_config_paths,
};
