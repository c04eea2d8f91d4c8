//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads; the config is installed once at
//! startup after CLI parsing.

use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

use super::SidecarConfig;

/// Global config storage.
static CONFIG: LazyLock<ArcSwap<SidecarConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(SidecarConfig::default()));

#[inline]
pub fn cfg() -> Arc<SidecarConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: SidecarConfig) -> Arc<SidecarConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
