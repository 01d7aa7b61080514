//! Load and atomically replace the feed file.

use super::model::FeedDocument;
use super::rss::{from_rss, to_rss};
use crate::error::{FeedError, Result};
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Read the persisted feed. A missing file is `Ok(None)`; anything present
/// but unreadable as RSS is a `Deserialization` error.
pub fn load(path: &Path) -> Result<Option<FeedDocument>> {
    match std::fs::read_to_string(path) {
        Ok(xml) => {
            let doc = from_rss(&xml)?;
            debug!(path = %path.display(), entries = doc.len(), "loaded feed");
            Ok(Some(doc))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) if e.kind() == ErrorKind::InvalidData => Err(FeedError::Deserialization(format!(
            "{} is not valid UTF-8",
            path.display()
        ))),
        Err(e) => Err(FeedError::io(path, e)),
    }
}

/// Serialize and write the feed, replacing the old file in one rename.
pub fn save(path: &Path, doc: &FeedDocument) -> Result<()> {
    let xml = to_rss(doc)?;
    write_atomic(path, xml.as_bytes())
}

/// Write `bytes` to a temporary file beside `path`, then rename it over
/// `path`. A crash mid-write leaves the previous file intact.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| FeedError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| FeedError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| FeedError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| FeedError::io(tmp.path(), e))?;

    // NamedTempFile is created 0600; the feed is published, so keep it readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o7777)
            .unwrap_or(0o644);
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(mode))
            .map_err(|e| FeedError::io(tmp.path(), e))?;
    }

    tmp.persist(path).map_err(|e| FeedError::io(path, e.error))?;
    debug!(path = %path.display(), bytes = bytes.len(), "feed written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use crate::feed::model::{Channel, FeedEntry};

    fn doc() -> FeedDocument {
        FeedDocument {
            channel: Channel::from(&ChannelConfig::default()),
            entries: vec![FeedEntry {
                title: "Programme Specialist".to_string(),
                link: "https://www.unfpa.org/jobs/programme-specialist".to_string(),
                description: "UNFPA has a vacancy.".to_string(),
                guid: "0000000000000042".to_string(),
                pub_date: "Wed, 14 Oct 2026 06:00:00 +0000".to_string(),
                grade_label: "P-4".to_string(),
            }],
        }
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.xml")).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jobs.xml");
        save(&path, &doc()).unwrap();
        assert_eq!(load(&path).unwrap(), Some(doc()));

        // only the feed itself remains; the temporary was renamed away
        let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("jobs.xml")]);
    }

    #[test]
    fn test_corrupt_file_is_deserialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.xml");
        std::fs::write(&path, "<html><body>oops</body></html>").unwrap();
        assert_eq!(load(&path).unwrap_err().kind(), "deserialization_error");

        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert_eq!(load(&path).unwrap_err().kind(), "deserialization_error");
    }

    #[test]
    fn test_failed_serialization_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.xml");
        std::fs::write(&path, "previous").unwrap();

        let mut bad = doc();
        bad.channel.title.clear();
        assert!(save(&path, &bad).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.xml");
        save(&path, &doc()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
