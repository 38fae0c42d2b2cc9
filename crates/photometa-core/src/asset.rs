use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Number of id characters shown in progress and failure messages.
pub const SHORT_ID_LEN: usize = 8;

/// One photo of the library as the pipeline sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Opaque stable identifier
    pub id: String,
    /// Original file name, for display and for naming collected results
    pub file_name: String,
    /// Capture time, local wall clock
    pub creation_date: Option<NaiveDateTime>,
    /// Last modification time, local wall clock
    pub modification_date: Option<NaiveDateTime>,
}

impl AssetRef {
    pub fn short_id(&self) -> String {
        self.id.chars().take(SHORT_ID_LEN).collect()
    }
}

/// Which of the two library timestamps gets written into EXIF.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DateSource {
    #[default]
    #[value(alias = "creation-date")]
    Creation,
    #[value(alias = "modification-date")]
    Modification,
}

impl DateSource {
    pub fn pick(self, asset: &AssetRef) -> Option<NaiveDateTime> {
        match self {
            DateSource::Creation => asset.creation_date,
            DateSource::Modification => asset.modification_date,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateSource::Creation => "Original creation date",
            DateSource::Modification => "Modification date (adjusted?)",
        }
    }

    /// Four-letter tag used in the "will apply" preview.
    pub fn tag(self) -> &'static str {
        &self.label()[..4]
    }
}

/// A fixed, ordered set of assets plus the date source for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub assets: Vec<AssetRef>,
    pub date_source: DateSource,
}

impl BatchJob {
    pub fn new(assets: Vec<AssetRef>, date_source: DateSource) -> Self {
        Self { assets, date_source }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn asset(created: bool, modified: bool) -> AssetRef {
        let dt = NaiveDate::from_ymd_opt(2020, 2, 29)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        AssetRef {
            id: "0123456789abcdef".to_string(),
            file_name: "IMG_0001.JPG".to_string(),
            creation_date: created.then_some(dt),
            modification_date: modified.then(|| dt + chrono::Duration::hours(1)),
        }
    }

    #[test]
    fn test_pick_follows_source() {
        let a = asset(true, true);
        assert_eq!(DateSource::Creation.pick(&a), a.creation_date);
        assert_eq!(DateSource::Modification.pick(&a), a.modification_date);
        assert_ne!(DateSource::Creation.pick(&a), DateSource::Modification.pick(&a));

        let b = asset(false, true);
        assert!(DateSource::Creation.pick(&b).is_none());
        assert!(DateSource::Modification.pick(&b).is_some());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(asset(true, true).short_id(), "01234567");
        let tiny = AssetRef { id: "ab".into(), ..asset(true, true) };
        assert_eq!(tiny.short_id(), "ab");
    }

    #[test]
    fn test_tag() {
        assert_eq!(DateSource::Creation.tag(), "Orig");
        assert_eq!(DateSource::Modification.tag(), "Modi");
    }
}
