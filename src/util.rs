use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Return true for transient/retriable I/O errors often seen on network shares
/// and Windows volumes (AV filter drivers, sharing violations, flaky SMB mounts).
fn is_retriable_io_error(e: &io::Error) -> bool {
    if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
        return true;
    }
    match e.raw_os_error() {
        // Common Windows transient codes:
        //   32  = Sharing violation
        //   33  = Lock violation
        //   53  = Network path not found (SMB blip)
        //   64  = Network name no longer available
        //   121 = Semaphore timeout (SMB)
        //   1117= I/O device error
        //   21  = Device not ready
        Some(32) | Some(33) | Some(53) | Some(64) | Some(121) | Some(1117) | Some(21) => true,
        _ => false,
    }
}

/// Open a file with retries/backoff for transient errors. `tries == 1` opens once.
pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    let mut last_err: Option<io::Error> = None;
    let tries = tries.max(1);
    for i in 0..tries {
        match File::open(path) {
            Ok(f) => return Ok(f),
            Err(e) if is_retriable_io_error(&e) && i + 1 < tries => {
                tracing::debug!("open {} failed ({e}), retry {}/{}", path.display(), i + 1, tries - 1);
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "open failed")))
}

/// Remove a file, succeeding if it doesn't exist.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Replace `dest` with `tmp`. If rename fails (e.g. across devices or due to
/// sharing), fall back to copy+remove.
pub fn replace_file(tmp: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(tmp, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(tmp, dest)?;
            remove_if_exists(tmp)
        }
    }
}
