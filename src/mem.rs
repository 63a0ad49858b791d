use parking_lot::Mutex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use sysinfo::{System, SystemExt};

/// Cached, low-overhead memory watcher.
/// - Refreshes at most every `REFRESH_EVERY`.
/// - Uses available/total RAM to decide when to hold back new reads.
struct MemState {
    sys: System,
    last_check: Option<Instant>,
    last_frac: f64, // available / total (0.0..1.0)
}

static STATE: OnceLock<Mutex<MemState>> = OnceLock::new();
const REFRESH_EVERY: Duration = Duration::from_millis(500);
const MAX_WAIT: Duration = Duration::from_secs(5);

/// Returns a recent estimate of available memory fraction (0.0..1.0).
pub fn available_memory_fraction() -> f64 {
    let m = STATE.get_or_init(|| Mutex::new(MemState { sys: System::new(), last_check: None, last_frac: 1.0 }));
    let mut st = m.lock();
    let now = Instant::now();
    let stale = st.last_check.map_or(true, |t| now.duration_since(t) >= REFRESH_EVERY);
    if stale {
        st.sys.refresh_memory();
        let total = st.sys.total_memory() as f64;
        let avail = st.sys.available_memory() as f64;
        st.last_frac = if total > 0.0 { (avail / total).clamp(0.0, 1.0) } else { 1.0 };
        st.last_check = Some(now);
    }
    st.last_frac
}

/// Returns true if the cached available-memory fraction is below `threshold` (e.g., 0.10 for 10%).
pub fn is_low_memory(threshold: f64) -> bool {
    available_memory_fraction() < threshold
}

/// Cooperative backoff before dispatching more concurrent reads: waits in short
/// steps while memory is low, giving up after `MAX_WAIT` so a run never stalls.
pub fn throttle_low_memory(threshold: f64) {
    if threshold <= 0.0 {
        return;
    }
    let started = Instant::now();
    while is_low_memory(threshold) && started.elapsed() < MAX_WAIT {
        tracing::debug!("available memory below {:.0}%, delaying next batch of reads", threshold * 100.0);
        std::thread::sleep(Duration::from_millis(25));
    }
}
