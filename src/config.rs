//! Process-wide message configuration.
//!
//! Holds the global error map, the default locale and any registered locale
//! bundles. Bundles are supplied by the host; none ship with the crate.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::context::ErrorMap;
use crate::issue::RawIssue;

#[derive(Default)]
struct GlobalConfig {
    error_map: Option<ErrorMap>,
    locale: Option<String>,
    locales: HashMap<String, ErrorMap>,
}

static CONFIG: Lazy<RwLock<GlobalConfig>> = Lazy::new(|| RwLock::new(GlobalConfig::default()));

/// Install the process-wide error map, consulted after any context map.
pub fn set_error_map<F>(map: F)
where
    F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
{
    CONFIG.write().error_map = Some(Arc::new(map));
}

pub fn clear_error_map() {
    CONFIG.write().error_map = None;
}

/// Locale used when the parse context does not name one.
pub fn set_locale(locale: impl Into<String>) {
    CONFIG.write().locale = Some(locale.into());
}

/// Register a locale bundle under `locale`.
pub fn register_locale<F>(locale: impl Into<String>, map: F)
where
    F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
{
    CONFIG.write().locales.insert(locale.into(), Arc::new(map));
}

/// Drop every global error map, locale and bundle.
pub fn reset() {
    *CONFIG.write() = GlobalConfig::default();
}

/// Message from the global error map, else from the active locale bundle.
pub(crate) fn global_message(raw: &RawIssue, locale: Option<&str>) -> Option<String> {
    // Hooks run outside the lock so they may touch the config themselves.
    let (global, bundle) = {
        let cfg = CONFIG.read();
        let locale = locale.or(cfg.locale.as_deref());
        let bundle = locale.and_then(|id| cfg.locales.get(id).cloned());
        (cfg.error_map.clone(), bundle)
    };

    global
        .and_then(|map| map(raw).filter(|m| !m.is_empty()))
        .or_else(|| bundle.and_then(|map| map(raw).filter(|m| !m.is_empty())))
}
