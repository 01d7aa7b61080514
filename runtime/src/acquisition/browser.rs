//! Locate a Chromium executable.

use std::path::{Path, PathBuf};

/// Environment variable that overrides discovery.
pub const CHROMIUM_PATH_ENV: &str = "VACANCY_FEED_CHROMIUM_PATH";

const PATH_NAMES: &[&str] = &["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"];

/// Find Chromium, in order: explicit path, `VACANCY_FEED_CHROMIUM_PATH`,
/// `~/.cache/vacancy-feed/chromium/`, then the usual names on `PATH`.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    if let Ok(p) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(cache) = dirs::cache_dir() {
        let base = cache.join("vacancy-feed").join("chromium");
        let candidates = if cfg!(target_os = "macos") {
            vec![
                base.join("Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                base.join("chrome"),
            ]
        } else {
            vec![base.join("chrome"), base.join("chrome-linux64/chrome")]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    PATH_NAMES.iter().find_map(|name| which::which(name).ok())
}

/// Chromium's self-reported version string, e.g. "Chromium 129.0.6668.58".
pub fn chromium_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!version.is_empty()).then_some(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("chrome");
        assert_eq!(find_chromium(Some(fake.as_path())), None);

        std::fs::write(&fake, b"").unwrap();
        assert_eq!(find_chromium(Some(fake.as_path())), Some(fake));
    }
}
