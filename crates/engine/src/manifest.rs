//! Manifeste des resources : clés sémantiques ("models.truck") -> URL résolue.
//!
//! Les URLs sont résolues une seule fois, à la construction, vers le CDN ou vers le
//! préfixe du proxy local selon la configuration.

use std::collections::BTreeMap;

/// Options d'emplacement des resources statiques.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    pub cdn_base_url: String,
    pub proxy_prefix: String,
    pub use_proxy: bool,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            cdn_base_url: Self::DEFAULT_CDN_BASE_URL.to_string(),
            proxy_prefix: Self::DEFAULT_PROXY_PREFIX.to_string(),
            use_proxy: false,
        }
    }
}

impl ResourceConfig {
    pub const DEFAULT_CDN_BASE_URL: &str = "https://static.lyoko.cc";
    pub const DEFAULT_PROXY_PREFIX: &str = "/api/static";

    /// Préfixe actif : proxy local ou CDN.
    pub fn base(&self) -> &str {
        if self.use_proxy {
            &self.proxy_prefix
        } else {
            &self.cdn_base_url
        }
    }

    /// Résout un chemin ("/model.glb") en URL complète.
    pub fn resolve(&self, path: &str) -> String {
        let base = self.base().trim_end_matches('/');
        let url = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        if self.use_proxy {
            log::debug!("resource via proxy: {url}");
        } else {
            log::debug!("resource via cdn: {url}");
        }
        url
    }
}

/// Table figée des resources de la scène.
#[derive(Debug, Clone)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    /// Chemins relatifs au CDN, groupés par section.
    const LAYOUT: &[(&str, &str)] = &[
        ("models.main", "/model.glb"),
        ("models.truck", "/truck.glb"),
        ("models.tesla", "/tesla_model_x.glb"),
        ("models.aston", "/aston_martin_v8_vantage_v600.glb"),
        ("models.drone", "/dji_fvp.glb"),
        ("textures.ground", "/wispy-grass-meadow_albedo.png"),
        ("textures.flame", "/farm-pic/火焰.png"),
        ("textures.temperature", "/farm-pic/温度.png"),
        ("textures.infoBg", "/farm-pic/信息背景.png"),
        ("hdri.sky", "/qwantani_moonrise_puresky_2k.hdr"),
        ("beans.red", "/beans/红豆.png"),
        ("beans.green", "/beans/绿豆.png"),
        ("beans.yellow", "/beans/黄豆.png"),
        ("beans.black", "/beans/黑豆.png"),
    ];

    /// Resources à charger avant de pouvoir assembler la scène.
    pub const REQUIRED: &[&str] = &[
        "models.main",
        "hdri.sky",
        "textures.ground",
        "models.truck",
        "models.tesla",
        "models.aston",
        "models.drone",
    ];

    pub fn new(config: &ResourceConfig) -> Self {
        let entries = Self::LAYOUT
            .iter()
            .map(|(key, path)| (key.to_string(), config.resolve(path)))
            .collect();
        Self { entries }
    }

    /// Manifeste arbitraire (tests, outils).
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// URL associée à une clé pointée ("models.truck").
    pub fn url(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// URL d'une entrée dans une section ("models", "truck").
    pub fn section_url(&self, section: &str, name: &str) -> Option<&str> {
        self.url(&format!("{section}.{name}"))
    }

    /// URLs des resources obligatoires, dans l'ordre de chargement.
    pub fn required_urls(&self) -> Vec<String> {
        Self::REQUIRED
            .iter()
            .filter_map(|key| self.url(key).map(str::to_string))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
