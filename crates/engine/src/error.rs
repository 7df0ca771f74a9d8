use thiserror::Error;

/// Erreurs du chargement de resources (fetch, décodage, agrégat).
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to decode image {url}: {source}")]
    Image {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to decode model {url}: {source}")]
    Model {
        url: String,
        #[source]
        source: gltf::Error,
    },

    #[error("no decoder for {0} (expected .glb, .hdr or .png)")]
    UnsupportedExtension(String),

    #[error("all {0} requested resources failed to load")]
    AllFailed(usize),

    #[error("loader task for {url} aborted: {reason}")]
    Join { url: String, reason: String },
}

impl ResourceError {
    /// URL concernée, quand l'erreur porte sur une resource précise.
    pub fn url(&self) -> Option<&str> {
        match self {
            ResourceError::Fetch { url, .. }
            | ResourceError::Image { url, .. }
            | ResourceError::Model { url, .. }
            | ResourceError::Join { url, .. } => Some(url),
            ResourceError::UnsupportedExtension(url) => Some(url),
            ResourceError::AllFailed(_) => None,
        }
    }
}
