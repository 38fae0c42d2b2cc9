//! The photo library the pipeline reads from.
//!
//! The pipeline only needs a narrow slice of a library: enumerate albums and
//! their image assets, list the files backing an asset, copy one of them
//! somewhere, and render a small preview for the checklist.

pub mod folder;

use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::DynamicImage;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::asset::AssetRef;

pub use folder::FolderLibrary;

/// Edge length of the checklist thumbnails.
pub const PREVIEW_EDGE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Album {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResourceKind {
    Photo,
    Video,
    Other,
}

/// A file backing an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub asset_id: String,
    pub kind: ResourceKind,
    pub file_name: String,
    pub source: PathBuf,
}

pub trait PhotoLibrary: Send + Sync {
    /// All albums, sorted by display title.
    fn albums(&self) -> anyhow::Result<Vec<Album>>;

    /// Image assets of an album, oldest creation time first.
    fn assets(&self, album: &Album) -> anyhow::Result<Vec<AssetRef>>;

    /// Files backing an asset. Empty when the asset is gone.
    fn resources(&self, asset: &AssetRef) -> Vec<Resource>;

    /// Copy a resource to `dest`, blocking until done.
    fn write_resource(&self, resource: &Resource, dest: &Path) -> io::Result<()>;

    /// Bounded-size preview, `None` when the image cannot be decoded.
    fn preview(&self, asset: &AssetRef, max_edge: u32) -> Option<DynamicImage>;
}

/// Render the preview of `asset` into `dir` as `<short id>.jpg`.
/// `Ok(None)` when the library cannot produce a preview.
pub fn write_preview(
    library: &dyn PhotoLibrary,
    asset: &AssetRef,
    dir: &Path,
) -> anyhow::Result<Option<PathBuf>> {
    let Some(preview) = library.preview(asset, PREVIEW_EDGE) else {
        return Ok(None);
    };
    let dest = dir.join(format!("{}.jpg", asset.short_id()));
    preview
        .to_rgb8()
        .save(&dest)
        .with_context(|| format!("cannot write preview {}", dest.display()))?;
    Ok(Some(dest))
}

pub(crate) fn title_key(title: &str) -> String {
    title.nfc().collect::<String>().to_lowercase()
}

pub(crate) fn sort_albums(albums: &mut [Album]) {
    albums.sort_by_cached_key(|a| title_key(&a.title));
}

/// Creation time ascending; undated assets last, ties by file name.
pub(crate) fn sort_assets(assets: &mut [AssetRef]) {
    assets.sort_by(|a, b| {
        let by_date = match (&a.creation_date, &b.creation_date) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then_with(|| a.file_name.cmp(&b.file_name))
    });
}
