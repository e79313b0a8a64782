//! Media directory scanning.

use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

const IMAGE_EXTENSIONS: &[&str] = &["gif", "png", "jpg", "jpeg", "webp"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a"];

/// Global image and sound pools.
///
/// Entries are `/`-separated paths relative to the media root, which is
/// also how rules and overlay URLs refer to them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaLibrary {
    pub images: Vec<String>,
    pub sounds: Vec<String>,
}

impl MediaLibrary {
    /// Build a library from explicit pools.
    pub fn new(images: Vec<String>, sounds: Vec<String>) -> Self {
        Self { images, sounds }
    }

    /// Recursively scan `root`, classifying files by extension.
    ///
    /// A missing or unreadable root yields empty pools.
    pub fn scan(root: &Path) -> Self {
        let mut library = Self::default();

        if !root.is_dir() {
            warn!(path = %root.display(), "Media path does not exist");
            return library;
        }

        if let Err(e) = library.scan_dir(root, root) {
            warn!(path = %root.display(), error = %e, "Failed to scan media directory");
        }

        library.images.sort();
        library.sounds.sort();

        info!(
            images = library.images.len(),
            sounds = library.sounds.len(),
            "Media library loaded"
        );
        library
    }

    /// Unreadable subdirectories are logged and skipped. Symlinked
    /// directories are not followed, so link cycles cannot recurse forever.
    fn scan_dir(&mut self, root: &Path, dir: &Path) -> io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Skipping unreadable media entry");
                    continue;
                }
            };
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                if let Err(e) = self.scan_dir(root, &path) {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable media directory");
                }
                continue;
            }
            if file_type.is_symlink() && path.is_dir() {
                debug!(path = %path.display(), "Not following symlinked media directory");
                continue;
            }

            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let ext = ext.to_ascii_lowercase();
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                self.images.push(relative);
            } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
                self.sounds.push(relative);
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.sounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_classifies_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("gifs/big")).unwrap();
        std::fs::create_dir_all(dir.path().join("audio")).unwrap();
        std::fs::write(dir.path().join("gifs/big/wow.GIF"), b"").unwrap();
        std::fs::write(dir.path().join("cat.png"), b"").unwrap();
        std::fs::write(dir.path().join("audio/ding.mp3"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let library = MediaLibrary::scan(dir.path());
        assert_eq!(library.images, vec!["cat.png", "gifs/big/wow.GIF"]);
        assert_eq!(library.sounds, vec!["audio/ding.mp3"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_is_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("gifs")).unwrap();
        std::fs::write(dir.path().join("gifs/wow.gif"), b"").unwrap();
        std::fs::write(dir.path().join("ding.mp3"), b"").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("gifs/loop")).unwrap();

        let library = MediaLibrary::scan(dir.path());
        assert_eq!(library.images, vec!["gifs/wow.gif"]);
        assert_eq!(library.sounds, vec!["ding.mp3"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_does_not_abort_scan() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("a_locked");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::write(locked.join("hidden.png"), b"").unwrap();
        std::fs::create_dir_all(dir.path().join("z_open")).unwrap();
        std::fs::write(dir.path().join("z_open/shown.png"), b"").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let library = MediaLibrary::scan(dir.path());
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert!(library.images.contains(&"z_open/shown.png".to_string()));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::scan(&dir.path().join("nope"));
        assert!(library.is_empty());
    }
}
