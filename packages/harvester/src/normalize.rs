//! Normalizers turning raw page text into canonical tokens.
//!
//! All functions here are pure. Extracted fragments go through [`clean`]
//! before any further processing.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::types::Status;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// `17 Agustus 1945`
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2})\s+([A-Za-z]+)\s+([0-9]{4})").expect("valid regex")
});

/// `1945-08-17` or `1945/8/17`
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_YMD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})[-/]([0-9]{1,2})[-/]([0-9]{1,2})").expect("valid regex")
});

/// `17-08-1945` or `17/8/1945`
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_DMY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2})[-/]([0-9]{1,2})[-/]([0-9]{4})").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)LN\s*([0-9]{4})\s*\(([^)]+)\)").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TLN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)TLN\s*\(([^)]+)\)").expect("valid regex"));

/// Collapse whitespace runs to a single space and trim.
///
/// # Examples
/// ```
/// use regwatch_harvester::normalize::clean;
///
/// assert_eq!(clean("  Undang-Undang\n\t Nomor 5 "), "Undang-Undang Nomor 5");
/// ```
pub fn clean(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Month number for an Indonesian (or English November) month name.
fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "januari" => 1,
        "februari" => 2,
        "maret" => 3,
        "april" => 4,
        "mei" => 5,
        "juni" => 6,
        "juli" => 7,
        "agustus" => 8,
        "september" => 9,
        "oktober" => 10,
        "nopember" | "november" => 11,
        "desember" => 12,
        _ => return None,
    };
    Some(month)
}

fn format_iso(year: &str, month: u32, day: &str) -> Option<String> {
    let year: i32 = year.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Parse a date as printed on the portal into `YYYY-MM-DD`.
///
/// Formats are tried in order: `D <bulan> YYYY`, `YYYY-M-D`, `D-M-YYYY`
/// (`/` works as separator for the numeric ones). Only the start of the
/// string has to match. Returns `None` for empty input, unmatched input, or
/// a match that is not a calendar date.
///
/// # Examples
/// ```
/// use regwatch_harvester::normalize::parse_date;
///
/// assert_eq!(parse_date("17 Agustus 1945").as_deref(), Some("1945-08-17"));
/// assert_eq!(parse_date("2024/1/5").as_deref(), Some("2024-01-05"));
/// assert_eq!(parse_date("5/1/2024").as_deref(), Some("2024-01-05"));
/// assert_eq!(parse_date("kemarin"), None);
/// ```
pub fn parse_date(s: &str) -> Option<String> {
    let s = clean(s);
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = DATE_MONTH_NAME.captures(&s) {
        if let Some(month) = month_number(&caps[2]) {
            return format_iso(&caps[3], month, &caps[1]);
        }
    }

    if let Some(caps) = DATE_YMD.captures(&s) {
        let month: u32 = caps[2].parse().ok()?;
        return format_iso(&caps[1], month, &caps[3]);
    }

    if let Some(caps) = DATE_DMY.captures(&s) {
        let month: u32 = caps[2].parse().ok()?;
        return format_iso(&caps[3], month, &caps[1]);
    }

    None
}

/// Derive the normalized status from the portal's status text.
///
/// Checks run in a fixed order because the phrases overlap: "tidak berlaku"
/// contains "berlaku", "dicabut sebagian" contains "dicabut".
///
/// # Examples
/// ```
/// use regwatch_harvester::normalize::normalize_status;
/// use regwatch_harvester::types::Status;
///
/// assert_eq!(normalize_status("Dicabut sebagian"), Some(Status::TidakBerlakuSebagian));
/// assert_eq!(normalize_status("Tidak Berlaku"), Some(Status::Dicabut));
/// assert_eq!(normalize_status("Masih Berlaku"), Some(Status::Berlaku));
/// ```
pub fn normalize_status(s: &str) -> Option<Status> {
    let t = clean(s).to_lowercase();
    if t.is_empty() {
        return None;
    }
    let has = |needle: &str| t.contains(needle);

    if has("tidak berlaku sebagian") || has("dicabut sebagian") {
        Some(Status::TidakBerlakuSebagian)
    } else if has("dicabut") || has("tidak berlaku") {
        Some(Status::Dicabut)
    } else if has("diubah") || has("perubahan") {
        Some(Status::Diubah)
    } else if has("berlaku") {
        Some(Status::Berlaku)
    } else {
        None
    }
}

/// Gazette citations collected from "sumber" rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Citation {
    pub ln: String,
    pub tln: String,
}

impl Citation {
    /// Absorb one "sumber" value.
    ///
    /// `LN <year> (<no>)` and `TLN (<no>)` are extracted independently and
    /// replace earlier values. When a pattern is missing and its field is
    /// still empty, a value that merely mentions "ln"/"tln" is kept verbatim.
    pub fn absorb(&mut self, value: &str) {
        if let Some(caps) = LN_PATTERN.captures(value) {
            self.ln = format!("LN {} ({})", &caps[1], &caps[2]);
        }
        if let Some(caps) = TLN_PATTERN.captures(value) {
            self.tln = format!("TLN ({})", &caps[1]);
        }

        let lower = value.to_lowercase();
        if self.ln.is_empty() && lower.contains("ln") {
            self.ln = value.to_string();
        }
        if self.tln.is_empty() && lower.contains("tln") {
            self.tln = value.to_string();
        }
    }
}

/// Parse a single "sumber" value into its citations.
///
/// # Examples
/// ```
/// use regwatch_harvester::normalize::parse_citation;
///
/// let c = parse_citation("LN 2020 (245), TLN (6573)");
/// assert_eq!(c.ln, "LN 2020 (245)");
/// assert_eq!(c.tln, "TLN (6573)");
/// ```
pub fn parse_citation(value: &str) -> Citation {
    let mut citation = Citation::default();
    citation.absorb(value);
    citation
}
