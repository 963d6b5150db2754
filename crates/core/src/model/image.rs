use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("Image reference cannot be empty.")]
    Empty,
}

//
// ─── IMAGE REFERENCE ───────────────────────────────────────────────────────────
//

/// Where a scene illustration lives, as reported by the backend.
///
/// Some backends return a fetchable location, others only a prose
/// description of what the scene should look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Url(Url),
    FilePath(PathBuf),
    Description(String),
}

impl ImageRef {
    /// Classify a raw backend value.
    ///
    /// # Errors
    ///
    /// Returns `ImageRefError::Empty` for blank input.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ImageRefError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(ImageRefError::Empty);
        }

        if let Ok(url) = Url::parse(s) {
            if matches!(url.scheme(), "http" | "https" | "data" | "file") {
                return Ok(ImageRef::Url(url));
            }
        }

        let looks_like_path = !s.contains(char::is_whitespace)
            && (s.starts_with('/') || s.starts_with("./"))
            && Path::new(s).extension().is_some();
        if looks_like_path {
            return Ok(ImageRef::FilePath(PathBuf::from(s)));
        }

        Ok(ImageRef::Description(s.to_string()))
    }

    /// Value usable as an `<img src>`, if this reference is displayable.
    #[must_use]
    pub fn src(&self) -> Option<String> {
        match self {
            ImageRef::Url(u) => Some(u.to_string()),
            ImageRef::FilePath(p) => Some(p.display().to_string()),
            ImageRef::Description(_) => None,
        }
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            ImageRef::Description(d) => Some(d),
            _ => None,
        }
    }

    /// Anchor a file path onto the server that produced it.
    ///
    /// Other references are returned unchanged, as is a path the base cannot join.
    #[must_use]
    pub fn resolve_against(self, base: &Url) -> Self {
        match self {
            ImageRef::FilePath(path) => match base.join(&path.to_string_lossy()) {
                Ok(url) => ImageRef::Url(url),
                Err(_) => ImageRef::FilePath(path),
            },
            other => other,
        }
    }

    /// The raw value to echo back to the backend.
    #[must_use]
    pub fn as_raw(&self) -> String {
        match self {
            ImageRef::Url(u) => u.to_string(),
            ImageRef::FilePath(p) => p.display().to_string(),
            ImageRef::Description(d) => d.clone(),
        }
    }
}
