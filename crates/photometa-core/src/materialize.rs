use std::path::Path;

use tempfile::TempPath;

use crate::asset::AssetRef;
use crate::error::ExportError;
use crate::library::{PhotoLibrary, ResourceKind};

/// Copy the photo resource of `asset` into a fresh, uniquely named file
/// under `temp_dir`.
///
/// The returned [`TempPath`] deletes the file when dropped; callers that want
/// to keep it call [`TempPath::keep`]. The copy blocks until the library has
/// finished, including any remote fetch it needs.
pub fn materialize(
    library: &dyn PhotoLibrary,
    asset: &AssetRef,
    temp_dir: &Path,
) -> Result<TempPath, ExportError> {
    let resource = library
        .resources(asset)
        .into_iter()
        .find(|r| r.kind == ResourceKind::Photo)
        .ok_or(ExportError::ResourceNotFound)?;

    let ext = Path::new(&resource.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg");

    let temp = tempfile::Builder::new()
        .suffix(&format!("_temp.{}", ext))
        .tempfile_in(temp_dir)
        .map_err(|e| ExportError::ExportFailed(e.to_string()))?
        .into_temp_path();

    // On error `temp` is dropped here, which removes the partial file.
    library
        .write_resource(&resource, &temp)
        .map_err(|e| ExportError::ExportFailed(e.to_string()))?;

    tracing::debug!(id = %asset.id, temp = %temp.display(), "materialized");
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{Album, Resource};
    use image::DynamicImage;
    use std::io;
    use std::path::PathBuf;

    /// Library whose single asset may or may not have a photo resource,
    /// and whose copies can be made to fail.
    struct StubLibrary {
        kind: Option<ResourceKind>,
        fail_with: Option<io::ErrorKind>,
    }

    impl PhotoLibrary for StubLibrary {
        fn albums(&self) -> anyhow::Result<Vec<Album>> {
            Ok(vec![])
        }
        fn assets(&self, _: &Album) -> anyhow::Result<Vec<AssetRef>> {
            Ok(vec![])
        }
        fn resources(&self, asset: &AssetRef) -> Vec<Resource> {
            self.kind
                .map(|kind| Resource {
                    asset_id: asset.id.clone(),
                    kind,
                    file_name: "IMG_0042.PNG".to_string(),
                    source: PathBuf::from("/unused"),
                })
                .into_iter()
                .collect()
        }
        fn write_resource(&self, _: &Resource, dest: &Path) -> io::Result<()> {
            std::fs::write(dest, b"partial")?;
            match self.fail_with {
                Some(kind) => Err(io::Error::new(kind, "remote store unavailable")),
                None => Ok(()),
            }
        }
        fn preview(&self, _: &AssetRef, _: u32) -> Option<DynamicImage> {
            None
        }
    }

    fn asset() -> AssetRef {
        AssetRef {
            id: "asset-1".into(),
            file_name: "IMG_0042.PNG".into(),
            creation_date: None,
            modification_date: None,
        }
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_materialize_writes_unique_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let lib = StubLibrary { kind: Some(ResourceKind::Photo), fail_with: None };

        let a = materialize(&lib, &asset(), dir.path()).unwrap();
        let b = materialize(&lib, &asset(), dir.path()).unwrap();
        assert_ne!(a.to_path_buf(), b.to_path_buf());
        assert!(a.to_string_lossy().ends_with("_temp.PNG"));
        assert_eq!(std::fs::read(&a).unwrap(), b"partial");

        drop(a);
        drop(b);
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_no_photo_resource() {
        let dir = tempfile::tempdir().unwrap();
        for kind in [None, Some(ResourceKind::Video)] {
            let lib = StubLibrary { kind, fail_with: None };
            let err = materialize(&lib, &asset(), dir.path()).unwrap_err();
            assert_eq!(err, ExportError::ResourceNotFound);
        }
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_failed_copy_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let lib = StubLibrary {
            kind: Some(ResourceKind::Photo),
            fail_with: Some(io::ErrorKind::PermissionDenied),
        };
        let err = materialize(&lib, &asset(), dir.path()).unwrap_err();
        match err {
            ExportError::ExportFailed(detail) => assert!(detail.contains("remote store unavailable")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(entries(dir.path()), 0);
    }
}
