use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// Camera and messenger file naming schemes that embed a timestamp,
/// paired with the chrono layout of the captured `ts` group.
static NAME_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // IMG_20190509_154733, PXL_20230101_101010123
        (r"(?P<ts>(?:19|20)\d{2}[01]\d[0-3]\d_\d{6})", "%Y%m%d_%H%M%S"),
        // Screenshot_20190919-053857
        (r"(?P<ts>(?:19|20)\d{2}[01]\d[0-3]\d-\d{6})", "%Y%m%d-%H%M%S"),
        // signal-2020-10-26-163832
        (r"(?P<ts>(?:19|20)\d{2}-[01]\d-[0-3]\d-\d{6})", "%Y-%m-%d-%H%M%S"),
        // 2016-01-30 11.49.15 (Dropbox camera uploads)
        (r"(?P<ts>(?:19|20)\d{2}-[01]\d-[0-3]\d \d{2}\.\d{2}\.\d{2})", "%Y-%m-%d %H.%M.%S"),
        // 2016_01_30_11_49_15
        (r"(?P<ts>(?:19|20)\d{2}_[01]\d_[0-3]\d_\d{2}_\d{2}_\d{2})", "%Y_%m_%d_%H_%M_%S"),
    ]
    .into_iter()
    .map(|(re, layout)| (Regex::new(re).expect("static date pattern"), layout))
    .collect()
});

/// Guess a capture time from a file name such as `IMG_20190509_154733.jpg`.
pub fn guess_date_from_filename(filename: &str) -> Option<NaiveDateTime> {
    NAME_PATTERNS.iter().find_map(|(re, layout)| {
        let ts = re.captures(filename)?.name("ts")?;
        NaiveDateTime::parse_from_str(ts.as_str(), layout).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_patterns() {
        let dt = guess_date_from_filename("IMG_20190509_154733.jpg").unwrap();
        assert_eq!(dt.to_string(), "2019-05-09 15:47:33");
        assert!(guess_date_from_filename("Screenshot_20190919-053857.png").is_some());
        assert!(guess_date_from_filename("signal-2020-10-26-163832.jpg").is_some());
        assert!(guess_date_from_filename("2016-01-30 11.49.15.jpg").is_some());
        assert!(guess_date_from_filename("2016_01_30_11_49_15.heic").is_some());
        assert!(guess_date_from_filename("holiday.jpg").is_none());
    }

    #[test]
    fn test_invalid_calendar_date_is_rejected() {
        assert!(guess_date_from_filename("IMG_20191339_154733.jpg").is_none());
    }
}
