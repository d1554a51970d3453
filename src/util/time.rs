//! Wall-clock time for draft timestamps.

/// Seconds since the UNIX epoch.
#[cfg(not(target_arch = "wasm32"))]
pub fn current_time_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Seconds since the UNIX epoch, from the page's navigation start plus its uptime.
#[cfg(target_arch = "wasm32")]
pub fn current_time_secs() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|perf| (perf.timing().navigation_start() + perf.now()) / 1000.0)
        .unwrap_or(0.0)
}

pub fn timestamp_secs() -> u64 {
    current_time_secs() as u64
}
