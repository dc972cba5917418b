//! Batch periods, listing URLs and record store file names.
//!
//! Store files are named `YC_<period letter><two-digit year>_scraped.json`,
//! e.g. `YC_W25_scraped.json` for the Winter 2025 batch.

use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

pub const STORE_PREFIX: &str = "YC";
pub const STORE_SUFFIX: &str = "scraped.json";
/// Harvested company links are kept next to the store under this suffix.
pub const REFERENCES_SUFFIX: &str = "companies.json";

/// Letter used for a period token nobody recognises.
pub const UNKNOWN_PERIOD_CHAR: char = '?';

pub const FIRST_YEAR: u16 = 2005;
pub const LATEST_YEAR: u16 = 2025;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchPeriod {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl BatchPeriod {
    pub fn code(&self) -> char {
        match self {
            BatchPeriod::Summer => 'S',
            BatchPeriod::Winter => 'W',
            BatchPeriod::Fall => 'F',
            BatchPeriod::Spring => 'X',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'S' => Some(BatchPeriod::Summer),
            'W' => Some(BatchPeriod::Winter),
            'F' => Some(BatchPeriod::Fall),
            'X' => Some(BatchPeriod::Spring),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BatchPeriod::Winter => "Winter",
            BatchPeriod::Spring => "Spring",
            BatchPeriod::Summer => "Summer",
            BatchPeriod::Fall => "Fall",
        }
    }
}

impl std::fmt::Display for BatchPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BatchPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" | "w" => Ok(BatchPeriod::Winter),
            "spring" | "x" => Ok(BatchPeriod::Spring),
            "summer" | "s" => Ok(BatchPeriod::Summer),
            "fall" | "f" => Ok(BatchPeriod::Fall),
            other => Err(format!("unknown batch period '{}'", other)),
        }
    }
}

/// Periods that ran in `year`, in calendar order. Empty outside the known range.
pub fn periods_for_year(year: u16) -> &'static [BatchPeriod] {
    use BatchPeriod::*;
    match year {
        2025 => &[Winter, Summer, Fall],
        2024 => &[Winter, Spring, Summer],
        2006..=2023 => &[Winter, Summer],
        2005 => &[Summer],
        _ => &[],
    }
}

pub fn is_valid_batch(period: BatchPeriod, year: u16) -> bool {
    periods_for_year(year).contains(&period)
}

/// Letter for a free-form period token; unknown tokens get `?`.
pub fn period_char(token: &str) -> char {
    match token.trim() {
        "Summer" => 'S',
        "Winter" => 'W',
        "Fall" => 'F',
        "Spring" => 'X',
        _ => UNKNOWN_PERIOD_CHAR,
    }
}

/// `YC_<letter><yy>_<suffix>` for a period token and a four-digit year.
pub fn store_filename(period_token: &str, year: u16) -> String {
    batch_filename(period_token, year, STORE_SUFFIX)
}

pub fn references_filename(period_token: &str, year: u16) -> String {
    batch_filename(period_token, year, REFERENCES_SUFFIX)
}

fn batch_filename(period_token: &str, year: u16, suffix: &str) -> String {
    format!(
        "{}_{}{:02}_{}",
        STORE_PREFIX,
        period_char(period_token),
        year % 100,
        suffix
    )
}

/// Listing URL for one batch, e.g. `.../companies?batch=Winter%202025`.
pub fn listing_url(
    base_url: &str,
    listing_path: &str,
    period: BatchPeriod,
    year: u16,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base_url)?.join(listing_path)?;
    let batch = format!("{} {}", period.name(), year);
    // Spaces as %20 rather than the form-encoded '+'.
    let encoded: String = url::form_urlencoded::byte_serialize(batch.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    url.set_query(Some(&format!("batch={}", encoded)));
    Ok(url.to_string())
}

/// Store file name derived from a listing URL's `batch` query parameter.
///
/// The year keeps its last two digits whatever its length, so `Summer 25`
/// and `Summer 2025` both give `YC_S25_scraped.json`. Missing parameter (or
/// an unparseable URL) gives `YC_UNKNOWN_scraped.json`; a value that is not
/// exactly `<Period> <digits>` gives `YC_INVALID_scraped.json`.
pub fn store_filename_from_listing_url(listing_url: &str) -> String {
    let Ok(url) = Url::parse(listing_url) else {
        return sentinel_filename("UNKNOWN");
    };
    let Some(batch) = url
        .query_pairs()
        .find(|(key, _)| key == "batch")
        .map(|(_, value)| value.into_owned())
    else {
        return sentinel_filename("UNKNOWN");
    };

    let parts: Vec<&str> = batch.split_whitespace().collect();
    let [period, year] = parts.as_slice() else {
        return sentinel_filename("INVALID");
    };
    if !year.chars().all(|c| c.is_ascii_digit()) {
        return sentinel_filename("INVALID");
    }
    let short = &year[year.len().saturating_sub(2)..];
    format!(
        "{}_{}{}_{}",
        STORE_PREFIX,
        period_char(period),
        short,
        STORE_SUFFIX
    )
}

fn sentinel_filename(tag: &str) -> String {
    format!("{}_{}_{}", STORE_PREFIX, tag, STORE_SUFFIX)
}

static RE_STORE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^YC_([A-Z])(\d{2})_scraped\.json$").unwrap());

/// Parses a store file name back into its period and year.
///
/// Years are assumed to be in the 2000s.
pub fn parse_store_filename(name: &str) -> Option<(BatchPeriod, u16)> {
    let caps = RE_STORE_FILE.captures(name)?;
    let period = BatchPeriod::from_code(caps[1].chars().next()?)?;
    let year = 2000 + caps[2].parse::<u16>().ok()?;
    Some((period, year))
}

/// Store files present in `dir`, sorted by name.
pub fn list_store_files(dir: &Path) -> std::io::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(&format!("{}_", STORE_PREFIX)) && name.ends_with(STORE_SUFFIX) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_filename_examples() {
        assert_eq!(store_filename("Winter", 2025), "YC_W25_scraped.json");
        assert_eq!(store_filename("Fall", 2005), "YC_F05_scraped.json");
        assert_eq!(store_filename("Summer", 2012), "YC_S12_scraped.json");
        assert_eq!(store_filename("Spring", 2024), "YC_X24_scraped.json");
    }

    #[test]
    fn test_unknown_period_gets_sentinel_char() {
        assert_eq!(store_filename("Autumn", 2019), "YC_?19_scraped.json");
        assert_eq!(store_filename("", 2019), "YC_?19_scraped.json");
    }

    #[test]
    fn test_filename_is_deterministic() {
        assert_eq!(store_filename("Winter", 2025), store_filename("Winter", 2025));
    }

    #[test]
    fn test_references_filename() {
        assert_eq!(references_filename("Summer", 2024), "YC_S24_companies.json");
    }

    #[test]
    fn test_filename_from_listing_url() {
        assert_eq!(
            store_filename_from_listing_url(
                "https://www.ycombinator.com/companies?batch=Summer%202025"
            ),
            "YC_S25_scraped.json"
        );
        assert_eq!(
            store_filename_from_listing_url("https://www.ycombinator.com/companies?batch=Winter+2007"),
            "YC_W07_scraped.json"
        );
    }

    #[test]
    fn test_filename_from_listing_url_with_short_year() {
        assert_eq!(
            store_filename_from_listing_url("https://www.ycombinator.com/companies?batch=Summer%2025"),
            "YC_S25_scraped.json"
        );
        assert_eq!(
            store_filename_from_listing_url("https://www.ycombinator.com/companies?batch=Fall%2005"),
            "YC_F05_scraped.json"
        );
        assert_eq!(
            store_filename_from_listing_url("https://www.ycombinator.com/companies?batch=Autumn%2025"),
            "YC_?25_scraped.json"
        );
    }

    #[test]
    fn test_filename_from_listing_url_sentinels() {
        assert_eq!(
            store_filename_from_listing_url("https://www.ycombinator.com/companies"),
            "YC_UNKNOWN_scraped.json"
        );
        assert_eq!(
            store_filename_from_listing_url("not a url"),
            "YC_UNKNOWN_scraped.json"
        );
        assert_eq!(
            store_filename_from_listing_url("https://www.ycombinator.com/companies?batch=Summer"),
            "YC_INVALID_scraped.json"
        );
        assert_eq!(
            store_filename_from_listing_url(
                "https://www.ycombinator.com/companies?batch=Summer%202025%20extra"
            ),
            "YC_INVALID_scraped.json"
        );
        assert_eq!(
            store_filename_from_listing_url("https://www.ycombinator.com/companies?batch=Summer%20XX"),
            "YC_INVALID_scraped.json"
        );
    }

    #[test]
    fn test_listing_url() {
        let url = listing_url(
            "https://www.ycombinator.com",
            "/companies",
            BatchPeriod::Winter,
            2025,
        )
        .unwrap();
        assert_eq!(url, "https://www.ycombinator.com/companies?batch=Winter%202025");
        assert_eq!(store_filename_from_listing_url(&url), "YC_W25_scraped.json");
    }

    #[test]
    fn test_periods_for_year() {
        use BatchPeriod::*;
        assert_eq!(periods_for_year(2025), &[Winter, Summer, Fall]);
        assert_eq!(periods_for_year(2024), &[Winter, Spring, Summer]);
        assert_eq!(periods_for_year(2015), &[Winter, Summer]);
        assert_eq!(periods_for_year(2005), &[Summer]);
        assert!(periods_for_year(2004).is_empty());
        assert!(periods_for_year(2026).is_empty());

        assert!(is_valid_batch(Fall, 2025));
        assert!(!is_valid_batch(Fall, 2024));
        assert!(!is_valid_batch(Winter, 2005));
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("winter".parse::<BatchPeriod>().unwrap(), BatchPeriod::Winter);
        assert_eq!("X".parse::<BatchPeriod>().unwrap(), BatchPeriod::Spring);
        assert!("autumn".parse::<BatchPeriod>().is_err());
    }

    #[test]
    fn test_parse_store_filename() {
        assert_eq!(
            parse_store_filename("YC_W25_scraped.json"),
            Some((BatchPeriod::Winter, 2025))
        );
        assert_eq!(
            parse_store_filename("YC_X24_scraped.json"),
            Some((BatchPeriod::Spring, 2024))
        );
        assert_eq!(parse_store_filename("YC_?19_scraped.json"), None);
        assert_eq!(parse_store_filename("YC_UNKNOWN_scraped.json"), None);
        assert_eq!(parse_store_filename("notes.json"), None);
    }

    #[test]
    fn test_list_store_files() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["YC_W25_scraped.json", "YC_S24_scraped.json", "YC_S24_companies.json", "other.json"] {
            std::fs::write(dir.path().join(name), "[]").unwrap();
        }
        std::fs::create_dir(dir.path().join("YC_dir_scraped.json")).unwrap();

        let names = list_store_files(dir.path()).unwrap();
        assert_eq!(names, vec!["YC_S24_scraped.json", "YC_W25_scraped.json"]);
    }

    #[test]
    fn test_list_store_files_missing_dir() {
        let names = list_store_files(Path::new("/nonexistent/linkreach-data")).unwrap();
        assert!(names.is_empty());
    }
}
