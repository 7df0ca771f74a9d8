use std::sync::Arc;

use crate::{Fetcher, ModelAsset, ResourceError};

/// Famille de décodeur, déduite de l'extension de l'URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// `.glb` -> graphe de scène
    Model,
    /// `.hdr` -> carte d'environnement
    Environment,
    /// `.png` -> texture
    Texture,
}

impl AssetKind {
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "glb" => Some(AssetKind::Model),
            "hdr" => Some(AssetKind::Environment),
            "png" => Some(AssetKind::Texture),
            _ => None,
        }
    }
}

/// Texture décodée en RGBA8 (côté CPU ; l'upload GPU appartient au renderer).
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub image: image::RgbaImage,
}

impl TextureAsset {
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Carte d'environnement HDR (équirectangulaire, RGBA f32 linéaire).
#[derive(Debug, Clone)]
pub struct EnvironmentMap {
    pub image: image::Rgba32FImage,
}

impl EnvironmentMap {
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Couleur moyenne (linéaire) de la carte, utile comme couleur de fond / ambiance.
    pub fn average_color(&self) -> [f32; 3] {
        let (w, h) = self.image.dimensions();
        let count = w as usize * h as usize;
        if count == 0 {
            return [0.0; 3];
        }
        let sum = self.image.pixels().fold([0.0f64; 3], |mut acc, px| {
            acc[0] += px[0] as f64;
            acc[1] += px[1] as f64;
            acc[2] += px[2] as f64;
            acc
        });
        sum.map(|c| (c / count as f64) as f32)
    }
}

/// Resource décodée, partagée via `Arc` depuis le cache.
#[derive(Debug, Clone)]
pub enum Asset {
    Model(ModelAsset),
    Environment(EnvironmentMap),
    Texture(TextureAsset),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Model(_) => AssetKind::Model,
            Asset::Environment(_) => AssetKind::Environment,
            Asset::Texture(_) => AssetKind::Texture,
        }
    }

    pub fn as_model(&self) -> Option<&ModelAsset> {
        match self {
            Asset::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_environment(&self) -> Option<&EnvironmentMap> {
        match self {
            Asset::Environment(env) => Some(env),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&TextureAsset> {
        match self {
            Asset::Texture(texture) => Some(texture),
            _ => None,
        }
    }
}

/// AssetLoader : responsable de transformer bytes en resources concrètes.
/// Il récupère les octets via le `Fetcher` puis choisit le décodeur selon l'extension.
#[derive(Clone)]
pub struct AssetLoader {
    fetcher: Arc<dyn Fetcher>,
}

impl AssetLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        AssetLoader { fetcher }
    }

    /// Charge les bytes d'une URL via le fetcher.
    pub fn load_bytes(&self, url: &str) -> Result<Vec<u8>, ResourceError> {
        self.fetcher.fetch(url).map_err(|source| ResourceError::Fetch {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch + décodage. L'extension est vérifiée avant le fetch pour ne pas télécharger
    /// un fichier qu'on ne saura pas lire.
    pub fn load(&self, url: &str) -> Result<Asset, ResourceError> {
        let kind = AssetKind::from_url(url)
            .ok_or_else(|| ResourceError::UnsupportedExtension(url.to_string()))?;
        let bytes = self.load_bytes(url)?;
        Self::decode(url, kind, &bytes)
    }

    pub fn decode(url: &str, kind: AssetKind, bytes: &[u8]) -> Result<Asset, ResourceError> {
        let image_err = |source| ResourceError::Image {
            url: url.to_string(),
            source,
        };
        match kind {
            AssetKind::Model => ModelAsset::from_glb(bytes)
                .map(Asset::Model)
                .map_err(|source| ResourceError::Model {
                    url: url.to_string(),
                    source,
                }),
            AssetKind::Environment => {
                let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Hdr)
                    .map_err(image_err)?;
                Ok(Asset::Environment(EnvironmentMap {
                    image: img.to_rgba32f(),
                }))
            }
            AssetKind::Texture => {
                let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
                    .map_err(image_err)?;
                Ok(Asset::Texture(TextureAsset {
                    image: img.to_rgba8(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 120, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn kind_from_url_ignores_query_and_case() {
        assert_eq!(AssetKind::from_url("/api/static/model.glb"), Some(AssetKind::Model));
        assert_eq!(AssetKind::from_url("https://cdn/sky.HDR?v=1"), Some(AssetKind::Environment));
        assert_eq!(AssetKind::from_url("/farm-pic/火焰.png"), Some(AssetKind::Texture));
        assert_eq!(AssetKind::from_url("/readme.txt"), None);
        assert_eq!(AssetKind::from_url("/no_extension"), None);
    }

    #[test]
    fn decodes_png_texture() {
        let asset = AssetLoader::decode("/t.png", AssetKind::Texture, &png_bytes(4, 2)).unwrap();
        let texture = asset.as_texture().unwrap();
        assert_eq!(texture.size(), (4, 2));
        assert_eq!(asset.kind(), AssetKind::Texture);
    }

    #[test]
    fn decodes_hdr_environment() {
        let red = image::Rgb([1.0f32, 0.0, 0.0]);
        let blue = image::Rgb([0.0f32, 0.0, 1.0]);
        let mut bytes = Vec::new();
        image::codecs::hdr::HdrEncoder::new(&mut bytes)
            .encode(&[red, blue, red, blue], 2, 2)
            .unwrap();

        let asset = AssetLoader::decode("/sky.hdr", AssetKind::Environment, &bytes).unwrap();
        assert_eq!(asset.kind(), AssetKind::Environment);
        let env = asset.as_environment().unwrap();
        assert_eq!(env.size(), (2, 2));
        let [r, g, b] = env.average_color();
        assert!((r - 0.5).abs() < 1e-2, "{r}");
        assert!(g.abs() < 1e-2, "{g}");
        assert!((b - 0.5).abs() < 1e-2, "{b}");
    }

    #[test]
    fn png_bytes_are_not_an_environment() {
        let err = AssetLoader::decode("/sky.hdr", AssetKind::Environment, &png_bytes(2, 2))
            .unwrap_err();
        assert!(matches!(err, ResourceError::Image { .. }));
    }

    #[test]
    fn corrupt_image_reports_url() {
        let err = AssetLoader::decode("/bad.png", AssetKind::Texture, b"nope").unwrap_err();
        assert_eq!(err.url(), Some("/bad.png"));
    }

    #[test]
    fn environment_average_color() {
        let image = image::Rgba32FImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgba([1.0, 0.0, 0.0, 1.0])
            } else {
                image::Rgba([0.0, 0.0, 1.0, 1.0])
            }
        });
        let env = EnvironmentMap { image };
        assert_eq!(env.average_color(), [0.5, 0.0, 0.5]);
    }
}
