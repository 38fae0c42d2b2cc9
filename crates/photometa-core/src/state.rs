//! Everything the photo picker shows, as one explicit value.
//!
//! Handlers mirror the user's actions. The pipeline never touches this
//! struct; the UI feeds it [`BatchEvent`]s as they come back from the worker.

use std::collections::HashSet;

use serde::Serialize;

use crate::asset::{AssetRef, BatchJob, DateSource};
use crate::date::{format_display, format_exif_timestamp};
use crate::library::{Album, PhotoLibrary};
use crate::pipeline::BatchEvent;

/// Substrings that mark a status message as reporting a failure.
const FAILURE_MARKERS: &[&str] = &["Error", "error", "Erreur", "échoué"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageTone {
    Success,
    Failure,
}

pub fn message_tone(message: &str) -> MessageTone {
    if FAILURE_MARKERS.iter().any(|m| message.contains(m)) {
        MessageTone::Failure
    } else {
        MessageTone::Success
    }
}

/// One line of the photo checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoRow {
    pub id: String,
    /// Same prefix the failure details use
    pub short_id: String,
    pub file_name: String,
    pub selected: bool,
    pub created: String,
    pub modified: String,
    /// EXIF value the current date source would write
    pub applies: Option<String>,
}

impl PhotoRow {
    pub fn apply_label(&self, source: DateSource) -> String {
        match &self.applies {
            Some(value) => format!("Will apply ({}): {}", source.tag(), value),
            None => "Will apply: source date unknown".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub albums: Vec<Album>,
    pub selected_album: Option<Album>,
    pub photos: Vec<AssetRef>,
    pub selected_ids: HashSet<String>,
    pub date_source: DateSource,
    pub process_message: String,
    pub is_processing: bool,
}

impl AppState {
    pub fn load_albums(&mut self, library: &dyn PhotoLibrary) -> anyhow::Result<()> {
        self.albums = library.albums()?;
        Ok(())
    }

    /// Switch album: photos, selection and message start over.
    pub fn select_album(&mut self, library: &dyn PhotoLibrary, album: Option<Album>) -> anyhow::Result<()> {
        self.photos.clear();
        self.selected_ids.clear();
        self.process_message.clear();
        self.selected_album = album;
        if self.selected_album.is_some() {
            self.fetch_photos(library)?;
        }
        Ok(())
    }

    /// Reload the current album, keeping the selection of photos still there.
    pub fn refresh_photos(&mut self, library: &dyn PhotoLibrary) -> anyhow::Result<()> {
        if self.selected_album.is_none() {
            return Ok(());
        }
        tracing::debug!(album = ?self.selected_album.as_ref().map(|a| &a.title), "refreshing photos");
        self.process_message.clear();
        self.fetch_photos(library)
    }

    fn fetch_photos(&mut self, library: &dyn PhotoLibrary) -> anyhow::Result<()> {
        let Some(album) = &self.selected_album else {
            return Ok(());
        };
        self.photos = library.assets(album)?;
        let present: HashSet<&str> = self.photos.iter().map(|p| p.id.as_str()).collect();
        self.selected_ids.retain(|id| present.contains(id.as_str()));
        Ok(())
    }

    /// Flip one photo. Ids not in the current album are ignored.
    pub fn toggle_selection(&mut self, id: &str) -> bool {
        if !self.photos.iter().any(|p| p.id == id) {
            return false;
        }
        if !self.selected_ids.remove(id) {
            self.selected_ids.insert(id.to_string());
        }
        true
    }

    pub fn all_selected(&self) -> bool {
        self.selected_ids.len() == self.photos.len()
    }

    /// Everything selected becomes nothing; anything else becomes everything.
    pub fn toggle_select_all(&mut self) {
        if self.all_selected() {
            self.selected_ids.clear();
        } else {
            self.selected_ids = self.photos.iter().map(|p| p.id.clone()).collect();
        }
    }

    pub fn set_date_source(&mut self, source: DateSource) {
        self.date_source = source;
    }

    /// Look a photo up by full id, file name or unambiguous id prefix.
    pub fn find_photo(&self, needle: &str) -> Option<&AssetRef> {
        if let Some(p) = self.photos.iter().find(|p| p.id == needle || p.file_name == needle) {
            return Some(p);
        }
        let mut prefixed = self.photos.iter().filter(|p| p.id.starts_with(needle));
        match (prefixed.next(), prefixed.next()) {
            (Some(p), None) => Some(p),
            _ => None,
        }
    }

    pub fn can_apply(&self) -> bool {
        !self.selected_ids.is_empty() && !self.is_processing
    }

    /// Freeze the selection into a job, in album order. `None` while a batch
    /// is running or nothing is selected.
    pub fn begin_batch(&mut self) -> Option<BatchJob> {
        if !self.can_apply() {
            return None;
        }
        let assets: Vec<AssetRef> = self
            .photos
            .iter()
            .filter(|p| self.selected_ids.contains(&p.id))
            .cloned()
            .collect();
        let start = BatchEvent::Started {
            total: assets.len(),
            date_source: self.date_source,
        };
        self.is_processing = true;
        self.apply_event(&start);
        Some(BatchJob::new(assets, self.date_source))
    }

    pub fn apply_event(&mut self, event: &BatchEvent) {
        if let Some(message) = event.message() {
            self.process_message = message;
        }
        if let BatchEvent::Finished(_) = event {
            self.is_processing = false;
        }
    }

    pub fn message_tone(&self) -> MessageTone {
        message_tone(&self.process_message)
    }

    pub fn photo_rows(&self) -> Vec<PhotoRow> {
        self.photos
            .iter()
            .map(|p| PhotoRow {
                id: p.id.clone(),
                short_id: p.short_id(),
                file_name: p.file_name.clone(),
                selected: self.selected_ids.contains(&p.id),
                created: format_display(p.creation_date.as_ref()),
                modified: format_display(p.modification_date.as_ref()),
                applies: self.date_source.pick(p).map(|d| format_exif_timestamp(&d)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Resource;
    use crate::pipeline::BatchReport;
    use chrono::NaiveDate;
    use image::DynamicImage;
    use std::path::Path;
    use std::sync::Mutex;

    /// Library whose album content can be swapped between fetches.
    struct SwappableLibrary {
        photos: Mutex<Vec<AssetRef>>,
    }

    impl PhotoLibrary for SwappableLibrary {
        fn albums(&self) -> anyhow::Result<Vec<Album>> {
            Ok(vec![Album { id: "a".into(), title: "A".into() }])
        }
        fn assets(&self, _: &Album) -> anyhow::Result<Vec<AssetRef>> {
            Ok(self.photos.lock().unwrap().clone())
        }
        fn resources(&self, _: &AssetRef) -> Vec<Resource> {
            vec![]
        }
        fn write_resource(&self, _: &Resource, _: &Path) -> std::io::Result<()> {
            Ok(())
        }
        fn preview(&self, _: &AssetRef, _: u32) -> Option<DynamicImage> {
            None
        }
    }

    fn photo(id: &str, created: bool) -> AssetRef {
        let d = NaiveDate::from_ymd_opt(2018, 10, 1).unwrap().and_hms_opt(6, 7, 8).unwrap();
        AssetRef {
            id: id.to_string(),
            file_name: format!("{id}.jpg"),
            creation_date: created.then_some(d),
            modification_date: None,
        }
    }

    fn state_with(ids: &[&str]) -> (SwappableLibrary, AppState) {
        let lib = SwappableLibrary {
            photos: Mutex::new(ids.iter().map(|id| photo(id, true)).collect()),
        };
        let mut state = AppState::default();
        state.load_albums(&lib).unwrap();
        let album = state.albums[0].clone();
        state.select_album(&lib, Some(album)).unwrap();
        (lib, state)
    }

    #[test]
    fn test_toggle_select_all() {
        let (_lib, mut state) = state_with(&["p1", "p2", "p3"]);
        state.toggle_select_all();
        assert_eq!(state.selected_ids.len(), 3);
        state.toggle_select_all();
        assert!(state.selected_ids.is_empty());

        state.toggle_selection("p2");
        state.toggle_select_all();
        assert_eq!(state.selected_ids.len(), 3);
    }

    #[test]
    fn test_toggle_selection_ignores_unknown_ids() {
        let (_lib, mut state) = state_with(&["p1"]);
        assert!(!state.toggle_selection("elsewhere"));
        assert!(state.toggle_selection("p1"));
        assert!(state.selected_ids.contains("p1"));
        assert!(state.toggle_selection("p1"));
        assert!(state.selected_ids.is_empty());
    }

    #[test]
    fn test_refresh_keeps_surviving_selection() {
        let (lib, mut state) = state_with(&["p1", "p2"]);
        state.toggle_select_all();
        state.process_message = "stale".into();

        *lib.photos.lock().unwrap() = vec![photo("p2", true), photo("p3", true)];
        state.refresh_photos(&lib).unwrap();

        assert_eq!(state.photos.len(), 2);
        assert_eq!(state.selected_ids, HashSet::from(["p2".to_string()]));
        assert!(state.process_message.is_empty());
    }

    #[test]
    fn test_select_album_resets() {
        let (lib, mut state) = state_with(&["p1"]);
        state.toggle_select_all();
        state.select_album(&lib, None).unwrap();
        assert!(state.photos.is_empty());
        assert!(state.selected_ids.is_empty());
        assert!(state.selected_album.is_none());
    }

    #[test]
    fn test_begin_batch_guards_and_order() {
        let (_lib, mut state) = state_with(&["p1", "p2", "p3"]);
        assert!(state.begin_batch().is_none());

        state.toggle_selection("p3");
        state.toggle_selection("p1");
        let job = state.begin_batch().unwrap();
        let ids: Vec<_> = job.assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["p1", "p3"]);
        assert!(state.is_processing);
        assert!(!state.can_apply());
        assert!(state.begin_batch().is_none());
        assert_eq!(
            state.process_message,
            "Starting processing of 2 photo(s) using [Original creation date]..."
        );

        state.apply_event(&BatchEvent::Finished(BatchReport { successes: 2, ..Default::default() }));
        assert!(!state.is_processing);
        assert!(state.can_apply());
        assert_eq!(state.message_tone(), MessageTone::Success);
    }

    #[test]
    fn test_find_photo() {
        let (_lib, state) = state_with(&["abc123", "abd456"]);
        assert_eq!(state.find_photo("abc123").unwrap().id, "abc123");
        assert_eq!(state.find_photo("abd456.jpg").unwrap().id, "abd456");
        assert_eq!(state.find_photo("abc").unwrap().id, "abc123");
        assert!(state.find_photo("ab").is_none());
        assert!(state.find_photo("zzz").is_none());
    }

    #[test]
    fn test_rows_preview_applied_value() {
        let lib = SwappableLibrary {
            photos: Mutex::new(vec![photo("dated", true), photo("undated", false)]),
        };
        let mut state = AppState::default();
        state.select_album(&lib, Some(Album { id: "a".into(), title: "A".into() })).unwrap();
        state.toggle_selection("dated");

        let rows = state.photo_rows();
        assert!(rows[0].selected);
        assert_eq!(rows[0].applies.as_deref(), Some("2018:10:01 06:07:08"));
        assert_eq!(rows[0].apply_label(state.date_source), "Will apply (Orig): 2018:10:01 06:07:08");
        assert_eq!(rows[1].created, "Unknown");
        assert_eq!(rows[1].apply_label(state.date_source), "Will apply: source date unknown");

        state.set_date_source(DateSource::Modification);
        assert!(state.photo_rows().iter().all(|r| r.applies.is_none()));
    }

    #[test]
    fn test_rows_short_id_counts_characters() {
        let (_lib, state) = state_with(&["ééééééééé-long", "abc"]);
        let rows = state.photo_rows();
        assert_eq!(rows[0].short_id, "éééééééé");
        assert_eq!(rows[1].short_id, "abc");
    }

    #[test]
    fn test_message_tone() {
        assert_eq!(message_tone("2 successes."), MessageTone::Success);
        assert_eq!(message_tone("1 successes. 1 error(s).\nErrors:\nx: y"), MessageTone::Failure);
        assert_eq!(message_tone("L'export initial du fichier a échoué: x"), MessageTone::Failure);
        assert_eq!(message_tone("Processing [1/2]: abc..."), MessageTone::Success);
    }
}
