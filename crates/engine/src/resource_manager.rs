//! Cache de resources + chargement groupé avec progression agrégée.
//!
//! - Le cache est indexé par URL résolue et n'est jamais vidé pendant la session.
//! - `load_all` charge chaque URL distincte une seule fois, en parallèle (tâches bloquantes
//!   tokio), et publie la progression à chaque complétion et à chaque pas simulé.
//! - Un échec individuel est journalisé et compte quand même dans la progression ; seule
//!   une session où tout a échoué est une erreur.

use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use rand::{SeedableRng, rngs::SmallRng};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::{
    Asset, AssetLoader, EnvironmentMap, Fetcher, LoadProgress, Manifest, ModelAsset,
    ResourceError, TextureAsset,
};

pub type ProgressCallback = Box<dyn FnMut(f32) + Send>;

/// Bilan d'une session `load_all`.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// URLs distinctes demandées
    pub requested: usize,
    /// URLs disponibles dans le cache à la fin (y compris celles déjà en cache)
    pub loaded: Vec<String>,
    pub failed: Vec<ResourceError>,
}

pub struct ResourceManager {
    loader: AssetLoader,
    manifest: Manifest,
    cache: HashMap<String, Arc<Asset>>,
    on_progress: Option<ProgressCallback>,
    progress: LoadProgress,
    rng: SmallRng,
}

impl ResourceManager {
    pub fn new(fetcher: Arc<dyn Fetcher>, manifest: Manifest) -> Self {
        Self {
            loader: AssetLoader::new(fetcher),
            manifest,
            cache: HashMap::new(),
            on_progress: None,
            progress: LoadProgress::new(0),
            rng: SmallRng::from_entropy(),
        }
    }

    /// Graine fixe pour la progression simulée (tests, replays).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Un seul observateur ; un nouvel appel remplace le précédent.
    pub fn set_progress_callback(&mut self, callback: impl FnMut(f32) + Send + 'static) {
        self.on_progress = Some(Box::new(callback));
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn progress(&self) -> &LoadProgress {
        &self.progress
    }

    fn report(&mut self) {
        let value = self.progress.display();
        if let Some(callback) = self.on_progress.as_mut() {
            callback(value);
        }
    }

    /// Charge les resources obligatoires du manifeste.
    pub async fn load_required(&mut self) -> Result<LoadReport, ResourceError> {
        let urls = self.manifest.required_urls();
        self.load_all(&urls).await
    }

    /// Charge toutes les URLs (dédupliquées). Ne résout qu'une fois chaque complétion reçue.
    pub async fn load_all(&mut self, urls: &[String]) -> Result<LoadReport, ResourceError> {
        let mut seen = HashSet::new();
        let distinct: Vec<String> = urls
            .iter()
            .filter(|url| seen.insert(url.as_str()))
            .cloned()
            .collect();

        let mut report = LoadReport {
            requested: distinct.len(),
            ..Default::default()
        };
        self.progress = LoadProgress::new(distinct.len());

        let mut tasks = JoinSet::new();
        for url in distinct {
            if self.cache.contains_key(&url) {
                log::debug!("cache hit: {url}");
                self.progress.record_completion();
                report.loaded.push(url);
                continue;
            }
            let loader = self.loader.clone();
            tasks.spawn_blocking(move || {
                let result = std::panic::catch_unwind(AssertUnwindSafe(|| loader.load(&url)))
                    .unwrap_or_else(|_| {
                        Err(ResourceError::Join {
                            url: url.clone(),
                            reason: "decoder panicked".to_string(),
                        })
                    });
                (url, result)
            });
        }

        self.report();

        let mut next_tick = Instant::now() + LoadProgress::next_tick_delay(&mut self.rng);
        while !tasks.is_empty() {
            let simulating = self.progress.simulation_active();
            tokio::select! {
                joined = tasks.join_next() => {
                    match joined {
                        Some(Ok((url, Ok(asset)))) => {
                            log::info!("loaded {url}");
                            self.cache.insert(url.clone(), Arc::new(asset));
                            report.loaded.push(url);
                        }
                        Some(Ok((url, Err(err)))) => {
                            log::error!("failed to load {url}: {err}");
                            report.failed.push(err);
                        }
                        Some(Err(join_err)) => {
                            log::error!("loader task failed: {join_err}");
                            report.failed.push(ResourceError::Join {
                                url: String::new(),
                                reason: join_err.to_string(),
                            });
                        }
                        None => break,
                    }
                    self.progress.record_completion();
                    self.report();
                }
                _ = tokio::time::sleep_until(next_tick), if simulating => {
                    self.progress.advance_simulation(&mut self.rng);
                    self.report();
                    next_tick = Instant::now() + LoadProgress::next_tick_delay(&mut self.rng);
                }
            }
        }

        log::info!(
            "resource session done: {} loaded, {} failed",
            report.loaded.len(),
            report.failed.len()
        );

        if report.requested > 0 && report.loaded.is_empty() {
            return Err(ResourceError::AllFailed(report.requested));
        }
        Ok(report)
    }

    /// Charge une seule resource (ou la retourne depuis le cache) sans toucher à la progression.
    pub async fn load(&mut self, url: &str) -> Result<Arc<Asset>, ResourceError> {
        if let Some(asset) = self.cache.get(url) {
            return Ok(asset.clone());
        }
        let loader = self.loader.clone();
        let owned = url.to_string();
        let asset = tokio::task::spawn_blocking(move || loader.load(&owned))
            .await
            .map_err(|err| ResourceError::Join {
                url: url.to_string(),
                reason: err.to_string(),
            })??;
        let asset = Arc::new(asset);
        self.cache.insert(url.to_string(), asset.clone());
        Ok(asset)
    }

    /// Resource par URL exacte, ou par clé pointée du manifeste ("models.truck").
    pub fn get(&self, key_or_url: &str) -> Option<Arc<Asset>> {
        self.get_ref(key_or_url).cloned()
    }

    fn get_ref(&self, key_or_url: &str) -> Option<&Arc<Asset>> {
        if let Some(asset) = self.cache.get(key_or_url) {
            return Some(asset);
        }
        let url = self.manifest.url(key_or_url)?;
        self.cache.get(url)
    }

    /// Modèle de la section `models` ("truck", "main"...).
    pub fn model(&self, name: &str) -> Option<&ModelAsset> {
        let url = self.manifest.section_url("models", name)?;
        self.cache.get(url)?.as_model()
    }

    pub fn texture(&self, name: &str) -> Option<&TextureAsset> {
        self.texture_in("textures", name)
    }

    /// Texture d'une autre section ("beans", "red").
    pub fn texture_in(&self, section: &str, name: &str) -> Option<&TextureAsset> {
        let url = self.manifest.section_url(section, name)?;
        self.cache.get(url)?.as_texture()
    }

    pub fn environment(&self, name: &str) -> Option<&EnvironmentMap> {
        let url = self.manifest.section_url("hdri", name)?;
        self.cache.get(url)?.as_environment()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Mutex;

    use anyhow::anyhow;

    use super::*;

    const MINIMAL_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "name": "马路", "translation": [1.0, 2.0, 3.0] } ]
    }"#;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 200, 10, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Fetcher en mémoire qui compte les appels par URL.
    #[derive(Default)]
    struct CountingFetcher {
        files: HashMap<String, Vec<u8>>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl CountingFetcher {
        fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
            self.files.insert(url.to_string(), bytes);
            self
        }

        fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    impl Fetcher for CountingFetcher {
        fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
            *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
            self.files
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("404 {url}"))
        }
    }

    fn manifest() -> Manifest {
        Manifest::from_entries([
            ("models.main", "/s/model.glb"),
            ("models.truck", "/s/truck.glb"),
            ("models.tesla", "/s/tesla.glb"),
            ("models.aston", "/s/aston.glb"),
            ("models.drone", "/s/drone.glb"),
            ("textures.ground", "/s/ground.png"),
            ("hdri.sky", "/s/sky.hdr"),
        ])
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn recorder(manager: &mut ResourceManager) -> Arc<Mutex<Vec<f32>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        manager.set_progress_callback(move |p| sink.lock().unwrap().push(p));
        seen
    }

    #[tokio::test]
    async fn get_by_url_and_dotted_key_after_load() {
        let fetcher = Arc::new(
            CountingFetcher::default()
                .with("/s/model.glb", MINIMAL_GLTF.as_bytes().to_vec())
                .with("/s/ground.png", png_bytes()),
        );
        let mut manager = ResourceManager::new(fetcher, manifest()).with_seed(1);

        let report = manager
            .load_all(&urls(&["/s/model.glb", "/s/ground.png", "/s/truck.glb"]))
            .await
            .unwrap();
        assert_eq!(report.requested, 3);
        assert_eq!(report.failed.len(), 1);

        assert!(manager.get("/s/model.glb").is_some());
        assert!(manager.get("models.main").is_some());
        assert!(manager.model("main").unwrap().find("马路").is_some());
        assert!(manager.texture("ground").is_some());
        assert!(manager.get("models.truck").is_none());
        assert!(manager.get("models.nope").is_none());
        assert!(manager.environment("sky").is_none());
    }

    #[tokio::test]
    async fn same_url_is_fetched_once() {
        let fetcher = Arc::new(
            CountingFetcher::default().with("/s/model.glb", MINIMAL_GLTF.as_bytes().to_vec()),
        );
        let mut manager = ResourceManager::new(fetcher.clone(), manifest()).with_seed(2);

        // même URL deux fois dans le manifeste, puis une seconde session
        manager
            .load_all(&urls(&["/s/model.glb", "/s/model.glb"]))
            .await
            .unwrap();
        manager.load_all(&urls(&["/s/model.glb"])).await.unwrap();
        manager.load("/s/model.glb").await.unwrap();

        assert_eq!(fetcher.calls("/s/model.glb"), 1);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_100() {
        let fetcher = Arc::new(
            CountingFetcher::default()
                .with("/s/model.glb", MINIMAL_GLTF.as_bytes().to_vec())
                .with("/s/ground.png", png_bytes()),
        );
        let mut manager = ResourceManager::new(fetcher, manifest()).with_seed(3);
        let seen = recorder(&mut manager);

        manager
            .load_all(&urls(&["/s/model.glb", "/s/ground.png", "/s/sky.hdr"]))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
        assert!(seen.iter().all(|p| (0.0..=100.0).contains(p)));
        assert_eq!(*seen.last().unwrap(), 100.0);
    }

    #[tokio::test]
    async fn partial_failure_still_completes_session() {
        // 7 resources : 5 OK, 2 introuvables (truck, sky)
        let gltf = MINIMAL_GLTF.as_bytes().to_vec();
        let fetcher = Arc::new(
            CountingFetcher::default()
                .with("/s/model.glb", gltf.clone())
                .with("/s/tesla.glb", gltf.clone())
                .with("/s/aston.glb", gltf.clone())
                .with("/s/drone.glb", gltf)
                .with("/s/ground.png", png_bytes()),
        );
        let mut manager = ResourceManager::new(fetcher, manifest()).with_seed(4);
        let seen = recorder(&mut manager);

        let report = manager.load_required().await.unwrap();

        assert_eq!(report.requested, 7);
        assert_eq!(report.loaded.len(), 5);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(manager.progress().loaded(), 7);
        assert_eq!(*seen.lock().unwrap().last().unwrap(), 100.0);
        assert!(manager.get("/s/truck.glb").is_none());
        assert!(manager.get("/s/sky.hdr").is_none());
        assert!(manager.model("drone").is_some());
    }

    #[tokio::test]
    async fn everything_failing_is_an_error() {
        let fetcher = Arc::new(CountingFetcher::default());
        let mut manager = ResourceManager::new(fetcher, manifest()).with_seed(5);

        let err = manager
            .load_all(&urls(&["/s/model.glb", "/s/notes.txt"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::AllFailed(2)));
    }

    #[tokio::test]
    async fn unsupported_extension_is_not_fetched() {
        let fetcher = Arc::new(CountingFetcher::default().with("/s/notes.txt", b"hi".to_vec()));
        let mut manager = ResourceManager::new(fetcher.clone(), manifest()).with_seed(6);

        let _ = manager.load_all(&urls(&["/s/notes.txt"])).await;
        assert_eq!(fetcher.calls("/s/notes.txt"), 0);
    }
}
