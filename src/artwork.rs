use std::path::{Path, PathBuf};
use tracing::warn;

/// Finds cover images that sit next to a song file on disk.
#[derive(Debug, Clone)]
pub struct ArtworkLocator {
    music_directory: PathBuf,
    cover_names: Vec<String>,
}

impl ArtworkLocator {
    pub fn new(music_directory: impl Into<PathBuf>, cover_names: Vec<String>) -> Self {
        Self {
            music_directory: music_directory.into(),
            cover_names,
        }
    }

    /// `song_file` is relative to the music directory, as the daemon reports it.
    /// Cover names are tried in order; the first one that exists wins.
    pub fn locate(&self, song_file: &str) -> Option<PathBuf> {
        if song_file.is_empty() {
            warn!(origin = "artwork", "song has no file path, using placeholder cover");
            return None;
        }

        let song_path = self.music_directory.join(song_file);
        let dir = song_path.parent().unwrap_or_else(|| Path::new(&self.music_directory));
        self.cover_names
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn locator(root: &Path) -> ArtworkLocator {
        ArtworkLocator::new(
            root,
            vec!["cover.jpg".into(), "cover.jpeg".into(), "cover.png".into()],
        )
    }

    #[test]
    fn test_first_matching_cover_wins() {
        let root = tempfile::tempdir().unwrap();
        let album = root.path().join("Artist/Album");
        fs::create_dir_all(&album).unwrap();
        fs::write(album.join("cover.png"), b"png").unwrap();
        fs::write(album.join("cover.jpeg"), b"jpeg").unwrap();

        let found = locator(root.path()).locate("Artist/Album/01 Track.flac");
        assert_eq!(found, Some(album.join("cover.jpeg")));
    }

    #[test]
    fn test_missing_cover_and_empty_path() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("Artist/Album")).unwrap();

        let locator = locator(root.path());
        assert_eq!(locator.locate("Artist/Album/01 Track.flac"), None);
        assert_eq!(locator.locate(""), None);
    }

    #[test]
    fn test_directory_named_like_cover_is_ignored() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("Album/cover.jpg")).unwrap();

        assert_eq!(locator(root.path()).locate("Album/track.mp3"), None);
    }
}
