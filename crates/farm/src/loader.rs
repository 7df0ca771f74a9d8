//! Chargement des resources hors du thread UI.
//!
//! Le chargement tourne sur le runtime tokio ; la progression et le résultat remontent
//! au thread winit par un canal crossbeam, lu une fois par frame.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use engine::{Manifest, ResourceManager, Vfs};

use crate::config::Config;

/// Resources chargées avec la scène mais dont l'absence ne la bloque pas.
const EXTRAS: &[&str] = &[
    "textures.flame",
    "textures.temperature",
    "textures.infoBg",
    "beans.red",
    "beans.green",
    "beans.yellow",
    "beans.black",
];

pub enum LoadEvent {
    Progress(f32),
    Ready(Box<ResourceManager>),
    Failed(String),
}

/// Lance le chargement sur le runtime courant.
pub fn spawn(config: &Config) -> Receiver<LoadEvent> {
    let (tx, rx) = unbounded();

    let resources = config.resources();
    let vfs = Vfs::new();
    vfs.mount_os(resources.base(), &config.asset_root, "asset-mirror");
    log::info!(
        "serving {} from {}",
        resources.base(),
        config.asset_root.display()
    );

    let manifest = Manifest::new(&resources);
    let mut manager = ResourceManager::new(Arc::new(vfs), manifest);
    if let Some(seed) = config.seed {
        manager = manager.with_seed(seed);
    }

    tokio::spawn(run(manager, tx));
    rx
}

fn session_urls(manifest: &Manifest) -> Vec<String> {
    let mut urls = manifest.required_urls();
    urls.extend(
        EXTRAS
            .iter()
            .filter_map(|key| manifest.url(key).map(str::to_string)),
    );
    urls
}

async fn run(mut manager: ResourceManager, tx: Sender<LoadEvent>) {
    let progress_tx = tx.clone();
    manager.set_progress_callback(move |percent| {
        // l'UI peut déjà être fermée
        let _ = progress_tx.send(LoadEvent::Progress(percent));
    });

    let urls = session_urls(manager.manifest());
    let event = match manager.load_all(&urls).await {
        Ok(report) => {
            for err in &report.failed {
                log::warn!("missing resource: {err}");
            }
            LoadEvent::Ready(Box::new(manager))
        }
        Err(err) => {
            log::error!("resource loading failed: {err}");
            LoadEvent::Failed(err.to_string())
        }
    };
    let _ = tx.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::ResourceConfig;

    #[test]
    fn session_covers_required_and_extras_once() {
        let manifest = Manifest::new(&ResourceConfig::default());
        let urls = session_urls(&manifest);
        assert_eq!(urls.len(), Manifest::REQUIRED.len() + EXTRAS.len());
        assert_eq!(urls[0], "https://static.lyoko.cc/model.glb");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_mirror_reports_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            cdn_base_url: "https://cdn.test".to_string(),
            proxy_prefix: "/api/static".to_string(),
            use_proxy: true,
            asset_root: dir.path().to_path_buf(),
            seed: Some(1),
        };

        let rx = spawn(&config);
        let mut failed = false;
        let mut last_progress = 0.0;
        while let Ok(event) = tokio::task::block_in_place(|| rx.recv()) {
            match event {
                LoadEvent::Progress(p) => {
                    assert!(p >= last_progress);
                    last_progress = p;
                }
                LoadEvent::Ready(_) => break,
                LoadEvent::Failed(_) => {
                    failed = true;
                    break;
                }
            }
        }
        assert!(failed);
        assert_eq!(last_progress, 100.0);
    }
}
