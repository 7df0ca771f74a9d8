use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result, anyhow};

/// Source d'octets pour une URL résolue du manifeste.
/// Implémenté par le `Vfs` ; les tests fournissent leurs propres fetchers (compteurs, échecs).
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Trait minimal pour un filesystem (peut être monté dans le VFS).
/// Tous les chemins passés aux méthodes sont relatifs au "root" du filesystem.
pub trait FileSystem: Send + Sync + 'static {
    /// Lis un fichier en tant que bytes bruts.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// Vérifie si un chemin existe dans ce filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Nom (pour debug).
    fn name(&self) -> &str;
}

/// Implementation basique qui mappe vers le système de fichiers OS.
/// Le `root` définit le répertoire racine de ce filesystem.
pub struct Ofs {
    root: PathBuf,
    name: String,
}

impl Ofs {
    /// Exemple : `Ofs::new("assets/static", "cdn_mirror")`
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Ofs {
            root: root.into(),
            name: name.into(),
        }
    }

    /// Résout un chemin relatif sous la racine. Les composants `..` sont refusés pour qu'une URL
    /// ne puisse pas sortir du miroir monté.
    fn resolve_path(&self, rel: &Path) -> Result<PathBuf> {
        use std::path::Component;

        let mut abs = self.root.clone();
        for component in rel.components() {
            match component {
                Component::Normal(part) => abs.push(part),
                Component::CurDir | Component::RootDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(anyhow!(
                        "Ofs({}) refuses path escaping its root: {:?}",
                        self.name,
                        rel
                    ));
                }
            }
        }
        Ok(abs)
    }
}

impl FileSystem for Ofs {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let abs = self.resolve_path(path)?;
        std::fs::read(&abs).with_context(|| format!("Ofs({}) failed to read {:?}", self.name, abs))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve_path(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Mount point utilisé par le VFS.
struct Mount {
    /// Préfixe d'URL auquel ce mount répond.
    /// Exemple : "https://static.lyoko.cc", "/api/static", "" (catch-all)
    prefix: String,
    fs: Arc<dyn FileSystem>,
}

impl Mount {
    /// Retourne le chemin relatif à donner au filesystem si l'URL est sous ce préfixe.
    /// Le préfixe doit s'arrêter sur une frontière de segment ("/api/static" ne matche pas "/api/statics").
    fn relative_path(&self, url: &str) -> Option<PathBuf> {
        let rest = url.strip_prefix(&self.prefix)?;
        let on_boundary = self.prefix.is_empty() || rest.is_empty() || rest.starts_with('/');
        if !on_boundary {
            return None;
        }
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        Some(PathBuf::from(rest.trim_start_matches('/')))
    }
}

/// Virtual File System : associe des préfixes d'URL à des filesystems locaux.
/// Priorité : le dernier mount ajouté a la priorité la plus haute.
#[derive(Clone, Default)]
pub struct Vfs {
    mounts: Arc<Mutex<Vec<Mount>>>,
}

impl Vfs {
    pub fn new() -> Self {
        Vfs {
            mounts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Monte un filesystem sur un préfixe d'URL (ex: "/api/static", "https://cdn.example", "" pour catch-all).
    pub fn mount(&self, prefix: impl Into<String>, fs: Arc<dyn FileSystem>) {
        let mount = Mount {
            prefix: prefix.into().trim_end_matches('/').to_string(),
            fs,
        };
        log::debug!("vfs: mounting {} on {:?}", mount.fs.name(), mount.prefix);
        self.lock_mounts().push(mount);
    }

    /// Monte un Ofs facilement (convenience).
    pub fn mount_os(
        &self,
        prefix: impl Into<String>,
        root: impl Into<PathBuf>,
        name: impl Into<String>,
    ) {
        let os = Ofs::new(root, name);
        self.mount(prefix, Arc::new(os));
    }

    /// Unmount par préfixe (supprime toutes les correspondances exactes).
    pub fn unmount(&self, prefix: &str) {
        let prefix = prefix.trim_end_matches('/');
        self.lock_mounts().retain(|m| m.prefix != prefix);
    }

    fn lock_mounts(&self) -> std::sync::MutexGuard<'_, Vec<Mount>> {
        // un panic pendant un push ne laisse pas la liste incohérente
        self.mounts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Résout le premier mount (ordre priorité) qui matche l'URL.
    fn resolve_mount_for(&self, url: &str) -> Option<(Arc<dyn FileSystem>, PathBuf)> {
        let mounts = self.lock_mounts();
        mounts
            .iter()
            .rev()
            .find_map(|m| m.relative_path(url).map(|rel| (m.fs.clone(), rel)))
    }

    /// Lit des bytes depuis le VFS.
    pub fn read_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let (fs, rel) = self
            .resolve_mount_for(url)
            .ok_or_else(|| anyhow!("no mount found for {:?}", url))?;
        fs.read_bytes(&rel)
            .with_context(|| format!("failed to read bytes from vfs url {:?}", url))
    }

    /// Vérifie si une URL existe dans le VFS (via le premier mount qui matche).
    pub fn exists(&self, url: &str) -> bool {
        self.resolve_mount_for(url)
            .map(|(fs, rel)| fs.exists(&rel))
            .unwrap_or(false)
    }

    /// Retourne les informations de debug sur les mounts (ordre: basse -> haute priorité).
    pub fn debug_list_mounts(&self) -> Vec<(String, String)> {
        self.lock_mounts()
            .iter()
            .map(|m| (m.prefix.clone(), m.fs.name().to_string()))
            .collect()
    }
}

impl Fetcher for Vfs {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.read_bytes(url)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn mount_and_read_by_url() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("farm-pic")).unwrap();
        std::fs::write(dir.path().join("model.glb"), "glb").unwrap();
        std::fs::write(dir.path().join("farm-pic/flame.png"), "png").unwrap();

        let vfs = Vfs::new();
        vfs.mount_os("https://static.lyoko.cc", dir.path(), "cdn_mirror");

        assert!(vfs.exists("https://static.lyoko.cc/model.glb"));
        assert_eq!(vfs.fetch("https://static.lyoko.cc/model.glb").unwrap(), b"glb");
        assert_eq!(
            vfs.fetch("https://static.lyoko.cc/farm-pic/flame.png?v=2").unwrap(),
            b"png"
        );
        assert!(vfs.fetch("https://other.cdn/model.glb").is_err());
    }

    #[test]
    fn prefix_matches_on_segment_boundary() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), "a").unwrap();

        let vfs = Vfs::new();
        vfs.mount_os("/api/static/", dir.path(), "proxy");

        assert!(vfs.exists("/api/static/a.png"));
        assert!(!vfs.exists("/api/statics/a.png"));
    }

    #[test]
    fn mount_priority() {
        // mount A then B; B should win because last mounted
        let dir_a = tempdir().unwrap();
        let dir_b = tempdir().unwrap();
        std::fs::write(dir_a.path().join("x.hdr"), "from_a").unwrap();
        std::fs::write(dir_b.path().join("x.hdr"), "from_b").unwrap();

        let vfs = Vfs::new();
        vfs.mount_os("/api/static", dir_a.path(), "A");
        vfs.mount_os("/api/static", dir_b.path(), "B");
        assert_eq!(vfs.read_bytes("/api/static/x.hdr").unwrap(), b"from_b");

        vfs.unmount("/api/static");
        assert!(vfs.debug_list_mounts().is_empty());
        assert!(vfs.read_bytes("/api/static/x.hdr").is_err());
    }

    #[test]
    fn parent_components_cannot_escape_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "nope").unwrap();

        let vfs = Vfs::new();
        vfs.mount_os("/api/static", &root, "proxy");
        assert!(vfs.read_bytes("/api/static/../secret.txt").is_err());
    }
}
