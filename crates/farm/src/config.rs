use std::path::PathBuf;

use clap::Parser;
use engine::ResourceConfig;

/// Visualisation de la ferme : greniers, trafic, drone, incendies simulés.
#[derive(Debug, Clone, Parser)]
#[command(name = "farm", version, about)]
pub struct Config {
    /// Base des URLs quand le proxy est désactivé
    #[arg(long, env = "FARM_CDN_BASE_URL", default_value = "https://static.lyoko.cc")]
    pub cdn_base_url: String,

    /// Préfixe des URLs quand le proxy est activé
    #[arg(long, env = "FARM_PROXY_PREFIX", default_value = "/api/static")]
    pub proxy_prefix: String,

    #[arg(long, env = "FARM_USE_PROXY")]
    pub use_proxy: bool,

    /// Miroir local des fichiers statiques, monté sous le préfixe actif
    #[arg(long, env = "FARM_ASSET_ROOT", default_value = "assets")]
    pub asset_root: PathBuf,

    /// Graine des tirages aléatoires (progression simulée, incendies)
    #[arg(long, env = "FARM_SEED")]
    pub seed: Option<u64>,
}

impl Config {
    pub fn resources(&self) -> ResourceConfig {
        ResourceConfig {
            cdn_base_url: self.cdn_base_url.clone(),
            proxy_prefix: self.proxy_prefix.clone(),
            use_proxy: self.use_proxy,
        }
    }
}
