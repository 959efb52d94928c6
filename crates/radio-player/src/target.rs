//! Stream target locators.

/// An immutable stream locator the engine can be asked to play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamTarget {
    url: String,
    label: String,
}

impl StreamTarget {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }

    /// Build a target for a SomaFM-style icecast mount:
    /// `http://ice1.somafm.com/{id}-{bitrate}-{format}`.
    pub fn for_station(id: &str, bitrate: u32, format: &str) -> Self {
        Self {
            url: format!("http://ice1.somafm.com/{id}-{bitrate}-{format}"),
            label: id.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}
