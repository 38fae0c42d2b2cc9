use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use anyhow::{bail, Context};
use chrono::{DateTime, Local, NaiveDateTime};
use image::DynamicImage;
use sha2::{Digest, Sha256};

use super::{sort_albums, sort_assets, Album, PhotoLibrary, Resource, ResourceKind};
use crate::asset::AssetRef;
use crate::date;

/// A library laid out on disk: every direct subdirectory of the root is an
/// album, the files directly inside it are its assets.
pub struct FolderLibrary {
    root: PathBuf,
    allow_guess: bool,
    /// asset id -> file, filled while enumerating albums
    index: RwLock<HashMap<String, PathBuf>>,
}

impl FolderLibrary {
    pub fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("photo library {} is not a readable directory", root.display());
        }
        fs::read_dir(&root).with_context(|| format!("cannot read photo library {}", root.display()))?;
        Ok(Self {
            root,
            allow_guess: true,
            index: RwLock::new(HashMap::new()),
        })
    }

    /// Disable capture dates guessed from file names.
    pub fn with_guess(mut self, allow_guess: bool) -> Self {
        self.allow_guess = allow_guess;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn asset_id(album: &str, file_name: &str) -> String {
        hex::encode(Sha256::digest(format!("{}/{}", album, file_name).as_bytes()))
    }

    fn locate(&self, id: &str) -> Option<PathBuf> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn load_asset(&self, album: &Album, path: &Path, file_name: &str) -> io::Result<AssetRef> {
        let meta = fs::metadata(path)?;
        let creation_date = date::capture_date(path, self.allow_guess)
            .or_else(|| meta.created().ok().map(local_time));
        Ok(AssetRef {
            id: Self::asset_id(&album.id, file_name),
            file_name: file_name.to_string(),
            creation_date,
            modification_date: meta.modified().ok().map(local_time),
        })
    }
}

fn local_time(t: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(t).naive_local()
}

fn kind_of(path: &Path) -> ResourceKind {
    match mime_guess::from_path(path).first() {
        Some(m) if m.type_() == mime_guess::mime::IMAGE => ResourceKind::Photo,
        Some(m) if m.type_() == mime_guess::mime::VIDEO => ResourceKind::Video,
        _ => ResourceKind::Other,
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

impl PhotoLibrary for FolderLibrary {
    fn albums(&self) -> anyhow::Result<Vec<Album>> {
        let mut albums = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!(path = %entry.path().display(), "skipping album with non UTF-8 name");
                continue;
            };
            if is_hidden(&name) {
                continue;
            }
            albums.push(Album { id: name.clone(), title: name });
        }
        sort_albums(&mut albums);
        Ok(albums)
    }

    fn assets(&self, album: &Album) -> anyhow::Result<Vec<AssetRef>> {
        let dir = self.root.join(&album.id);
        let entries = fs::read_dir(&dir).with_context(|| format!("cannot read album {}", album.title))?;

        let mut assets = Vec::new();
        let mut found = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || kind_of(&path) != ResourceKind::Photo {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if is_hidden(&file_name) {
                continue;
            }
            match self.load_asset(album, &path, &file_name) {
                Ok(asset) => {
                    found.push((asset.id.clone(), path));
                    assets.push(asset);
                }
                Err(err) => tracing::warn!(path = %path.display(), %err, "skipping unreadable photo"),
            }
        }

        self.index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(found);

        sort_assets(&mut assets);
        tracing::debug!(album = %album.title, count = assets.len(), "enumerated album");
        Ok(assets)
    }

    fn resources(&self, asset: &AssetRef) -> Vec<Resource> {
        let Some(path) = self.locate(&asset.id) else {
            return Vec::new();
        };
        if !path.is_file() {
            return Vec::new();
        }

        let mut resources = vec![Resource {
            asset_id: asset.id.clone(),
            kind: kind_of(&path),
            file_name: asset.file_name.clone(),
            source: path.clone(),
        }];

        // Live photo companion clip sharing the stem.
        for ext in ["mov", "MOV"] {
            let paired = path.with_extension(ext);
            if paired.is_file() {
                resources.push(Resource {
                    asset_id: asset.id.clone(),
                    kind: ResourceKind::Video,
                    file_name: paired
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    source: paired,
                });
                break;
            }
        }
        resources
    }

    fn write_resource(&self, resource: &Resource, dest: &Path) -> io::Result<()> {
        fs::copy(&resource.source, dest)?;
        Ok(())
    }

    fn preview(&self, asset: &AssetRef, max_edge: u32) -> Option<DynamicImage> {
        let path = self.locate(&asset.id)?;
        match image::open(&path) {
            Ok(img) => Some(img.thumbnail(max_edge, max_edge)),
            Err(err) => {
                tracing::warn!(id = %asset.id, %err, "cannot render preview");
                None
            }
        }
    }
}
