//! Detail page extraction.
//!
//! Detail pages differ a lot between regulation categories and years, so
//! every step below is optional: a missing card, row or pattern leaves the
//! corresponding fields unset and extraction carries on.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::builder::RecordBuilder;
use crate::html::{child_elements_with_class, element_text, find_card, resolve_url, selector};
use crate::normalize::{clean, parse_date};
use crate::types::{RegulationRecord, Relation, RelationKind};

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2"));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="description"]"#));
static DOWNLOAD_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a.download-file[href*=".pdf"]"#));
static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector(".row"));
static ROW_LABEL: LazyLock<Selector> = LazyLock::new(|| selector(".col-lg-3.fw-bold"));
static ROW_VALUE: LazyLock<Selector> = LazyLock::new(|| selector(".col-lg-9"));
static STATUS_CONTAINER: LazyLock<Selector> = LazyLock::new(|| selector(".container.fs-6"));
static SECTION_HEADER: LazyLock<Selector> = LazyLock::new(|| selector(".fw-semibold"));
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("ol li"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PDF_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.pdf($|\?)").expect("valid regex"));

/// `UU No. 5 Tahun 2020` inside a title.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TITLE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(uu|pp|perpres|permen|perda)[^\d]*([0-9a-zA-Z]+)\s*tahun\s*(\d{4})")
        .expect("valid regex")
});

/// `/Details/12345/uu-no-5-tahun-2020` inside a detail URL.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static URL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/details/\d+/(uu|pp|perpres|permen|perda)-no-([0-9a-zA-Z]+)-tahun-(\d{4})")
        .expect("valid regex")
});

/// Parse a regulation detail page.
///
/// `url` is the page's own address: it resolves relative links and serves
/// as the last source for jenis, nomor and tahun.
///
/// # Examples
/// ```
/// use regwatch_harvester::detail::parse_detail_page;
///
/// let record = parse_detail_page(
///     "<h1>Undang-undang Nomor 5 Tahun 2020</h1>",
///     "https://peraturan.bpk.go.id/Details/1/uu-no-5-tahun-2020",
/// );
/// assert_eq!(record.judul.as_deref(), Some("Undang-undang Nomor 5 Tahun 2020"));
/// assert_eq!(record.jenis.as_deref(), Some("UU"));
/// assert_eq!(record.tahun, Some(2020));
/// ```
pub fn parse_detail_page(html: &str, url: &str) -> RegulationRecord {
    let doc = Html::parse_document(html);
    let mut record = RecordBuilder::new();

    extract_title(&doc, &mut record);
    extract_summary(&doc, &mut record);
    extract_pdf_link(&doc, url, &mut record);

    if let Some(card) = find_card(&doc, &["metadata", "peraturan"]) {
        extract_metadata_card(card, &mut record);
    } else {
        tracing::debug!(url, "no metadata card");
    }

    if let Some(card) = find_card(&doc, &["status", "peraturan"]) {
        extract_status_card(card, url, &mut record);
    }

    if !record.has_natural_key() {
        if let Some(caps) = URL_KEY.captures(url) {
            record.fill_natural_key(&caps[1], &caps[2], &caps[3]);
        }
    }

    record.build(url)
}

fn extract_title(doc: &Html, record: &mut RecordBuilder) {
    if let Some(heading) = doc.select(&TITLE).next() {
        let title = element_text(heading);
        if !title.is_empty() {
            record.judul.fill(title);
        }
    }
}

fn extract_summary(doc: &Html, record: &mut RecordBuilder) {
    let content = doc
        .select(&META_DESCRIPTION)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(clean);
    if let Some(content) = content {
        record.tentang.fill(content);
    }
}

fn extract_pdf_link(doc: &Html, url: &str, record: &mut RecordBuilder) {
    let href = doc
        .select(&DOWNLOAD_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .or_else(|| {
            doc.select(&ANY_LINK)
                .filter_map(|a| a.value().attr("href"))
                .find(|href| PDF_HREF.is_match(href))
        });

    if let Some(pdf_url) = href.and_then(|h| resolve_url(url, h)) {
        record.pdf_url.fill(pdf_url);
    }
}

/// Walk the label/value rows of the "Metadata Peraturan" card.
fn extract_metadata_card(card: ElementRef<'_>, record: &mut RecordBuilder) {
    for row in card.select(&ROW) {
        let (Some(label_el), Some(value_el)) =
            (row.select(&ROW_LABEL).next(), row.select(&ROW_VALUE).next())
        else {
            continue;
        };

        let label = element_text(label_el).to_lowercase();
        let value = element_text(value_el);
        if label.is_empty() || value.is_empty() {
            continue;
        }

        apply_metadata_row(&label, value, record);
    }
}

/// Dispatch one metadata row on its lower-cased label.
fn apply_metadata_row(label: &str, value: String, record: &mut RecordBuilder) {
    match label {
        "judul" => {
            if let Some(caps) = TITLE_KEY.captures(&value) {
                record.fill_natural_key(&caps[1], &caps[2], &caps[3]);
            }
            record.judul.fill(value);
        }
        "t.e.u." | "teu" => {
            record.issuer.fill(value);
        }
        "nomor" => {
            record.nomor.fill(value);
        }
        "bentuk singkat" => {
            record.jenis.fill(value.to_uppercase());
        }
        "tahun" => {
            if let Ok(year) = value.parse() {
                record.tahun.fill(year);
            }
        }
        "tempat penetapan" | "lokasi" => {
            record.lokasi.fill(value);
        }
        "tanggal penetapan" => record.penetapan_date.replace_with(parse_date(&value)),
        "tanggal pengundangan" => record.pengundangan_date.replace_with(parse_date(&value)),
        "tanggal berlaku" => record.berlaku_date.replace_with(parse_date(&value)),
        "subjek" | "bidang" => {
            record.bidang.fill(value);
        }
        "status" => record.status_raw.replace(value),
        "sumber" => record.citation.absorb(&value),
        _ => {}
    }
}

/// Map a relation section header to its kind.
///
/// "mengubah" is checked first and "mencabut" last; "dicabut oleh" and
/// "diubah oleh" only share "oleh".
fn section_kind(header: &str) -> Option<RelationKind> {
    let header = header.to_lowercase();
    if header.contains("mengubah") {
        Some(RelationKind::Mengubah)
    } else if header.contains("dicabut oleh") {
        Some(RelationKind::DicabutOleh)
    } else if header.contains("diubah oleh") {
        Some(RelationKind::DiubahOleh)
    } else if header.contains("mencabut") {
        Some(RelationKind::Mencabut)
    } else {
        None
    }
}

/// Walk the "Status Peraturan" card, grouping list items under headers.
fn extract_status_card(card: ElementRef<'_>, url: &str, record: &mut RecordBuilder) {
    let container = card.select(&STATUS_CONTAINER).next().unwrap_or(card);
    let mut current: Option<RelationKind> = None;

    for row in child_elements_with_class(container, "row") {
        if let Some(header) = row.select(&SECTION_HEADER).next() {
            current = section_kind(&element_text(header));
            continue;
        }

        for item in row.select(&LIST_ITEM) {
            let link = item.select(&LINK).next();
            let text = element_text(link.unwrap_or(item));
            let target = link
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve_url(url, href));

            record.relations.push(
                current.unwrap_or(RelationKind::Mengubah),
                Relation { text, url: target },
            );
        }
    }
}
