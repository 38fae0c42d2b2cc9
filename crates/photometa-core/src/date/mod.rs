pub mod exif;
pub mod guess;

use std::path::Path;

use chrono::NaiveDateTime;

/// Layout ExifTool expects for DateTimeOriginal, CreateDate and ModifyDate.
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

const DISPLAY_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S";

/// Format a local wall-clock time for ExifTool. No timezone conversion happens:
/// the components are written exactly as stored.
pub fn format_exif_timestamp(date: &NaiveDateTime) -> String {
    date.format(EXIF_DATE_FORMAT).to_string()
}

/// Medium-length human display, `None` shown as "Unknown".
pub fn format_display(date: Option<&NaiveDateTime>) -> String {
    match date {
        Some(d) => d.format(DISPLAY_DATE_FORMAT).to_string(),
        None => "Unknown".to_string(),
    }
}

/// Resolve the capture date of an image file using embedded EXIF first,
/// then the file name.
pub fn capture_date(path: &Path, allow_guess: bool) -> Option<NaiveDateTime> {
    if let Some(date) = exif::read_exif_date(path) {
        return Some(date);
    }
    if !allow_guess {
        return None;
    }
    let filename = path.file_name().and_then(|n| n.to_str())?;
    guess::guess_date_from_filename(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_exif_timestamp_layout() {
        assert_eq!(format_exif_timestamp(&at(2023, 7, 4, 9, 5, 1)), "2023:07:04 09:05:01");
        assert_eq!(format_exif_timestamp(&at(1999, 12, 31, 23, 59, 59)), "1999:12:31 23:59:59");
    }

    #[test]
    fn test_display_unknown() {
        assert_eq!(format_display(None), "Unknown");
        assert_eq!(format_display(Some(&at(2021, 3, 9, 14, 0, 0))), "09 Mar 2021 14:00:00");
    }

    #[test]
    fn test_capture_date_falls_back_to_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMG_20190509_154733.jpg");
        std::fs::write(&path, b"not a real jpeg").unwrap();

        assert_eq!(capture_date(&path, true), Some(at(2019, 5, 9, 15, 47, 33)));

        assert!(capture_date(&path, false).is_none());
    }
}
