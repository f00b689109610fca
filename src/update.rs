//! Update availability notice.
//!
//! Tracks whether a newer build of the game has been installed over the
//! running executable since startup. The app context owns one instance and
//! hands it to whichever screen needs to read or act on it.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Minimum gap between modification-time checks.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub struct UpdateNotice {
    watched: Option<PathBuf>,
    baseline: Option<SystemTime>,
    available: bool,
    last_poll: Option<Instant>,
}

impl UpdateNotice {
    /// Watch the running executable. `enabled = false` yields a notice that
    /// never reports anything.
    pub fn init(enabled: bool) -> Self {
        if !enabled {
            log::info!("update checks disabled");
            return Self::disabled();
        }
        Self::watching(std::env::current_exe().ok())
    }

    pub fn watching(path: Option<PathBuf>) -> Self {
        let baseline = path.as_deref().and_then(modified);
        if let Some(p) = &path {
            log::debug!("watching {} for updates", p.display());
        }
        UpdateNotice {
            watched: path,
            baseline,
            available: false,
            last_poll: None,
        }
    }

    pub fn disabled() -> Self {
        Self::watching(None)
    }

    /// Check the watched file, at most once per poll interval. Returns
    /// true only on the poll that first notices the change.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.available {
            return false;
        }
        if let Some(last) = self.last_poll {
            if now.saturating_duration_since(last) < POLL_INTERVAL {
                return false;
            }
        }
        self.last_poll = Some(now);

        let (Some(path), Some(baseline)) = (self.watched.as_deref(), self.baseline) else {
            return false;
        };
        match modified(path) {
            Some(current) if current > baseline => {
                log::info!("newer build detected at {}", path.display());
                self.mark_available();
                true
            }
            _ => false,
        }
    }

    pub fn mark_available(&mut self) {
        self.available = true;
    }

    /// Dismiss ("later"). The current file becomes the new baseline so the
    /// same build is not announced twice.
    pub fn clear(&mut self) {
        self.available = false;
        if let Some(path) = self.watched.as_deref() {
            self.baseline = modified(path).or(self.baseline);
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(path: &Path, at: SystemTime) {
        let f = File::options().write(true).open(path).unwrap();
        f.set_modified(at).unwrap();
    }

    fn watched_file() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typed-layup");
        std::fs::write(&path, b"v1").unwrap();
        touch(&path, SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000));
        (dir, path)
    }

    #[test]
    fn newer_file_is_reported_once() {
        let (_dir, path) = watched_file();
        let mut notice = UpdateNotice::watching(Some(path.clone()));
        let t0 = Instant::now();
        assert!(!notice.poll(t0));

        touch(&path, SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000));
        assert!(!notice.poll(t0 + Duration::from_millis(500)), "throttled");
        assert!(notice.poll(t0 + POLL_INTERVAL));
        assert!(notice.is_available());
        assert!(!notice.poll(t0 + POLL_INTERVAL * 2));
    }

    #[test]
    fn clear_rebaselines() {
        let (_dir, path) = watched_file();
        let mut notice = UpdateNotice::watching(Some(path.clone()));
        touch(&path, SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000));
        let t0 = Instant::now();
        assert!(notice.poll(t0));

        notice.clear();
        assert!(!notice.is_available());
        assert!(!notice.poll(t0 + POLL_INTERVAL));

        touch(&path, SystemTime::UNIX_EPOCH + Duration::from_secs(3_000_000));
        assert!(notice.poll(t0 + POLL_INTERVAL * 2));
    }

    #[test]
    fn disabled_never_fires_but_can_be_marked() {
        let mut notice = UpdateNotice::disabled();
        assert!(!notice.poll(Instant::now()));
        notice.mark_available();
        assert!(notice.is_available());
        notice.clear();
        assert!(!notice.is_available());
    }
}
