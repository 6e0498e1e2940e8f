//! Partial record used while a detail page is being extracted.
//!
//! Several page regions can supply the same field. Each field is a [`Slot`]
//! and writers pick [`Slot::fill`] (first writer wins) or [`Slot::replace`]
//! (last writer wins), so the priority between sources is decided by the
//! order extraction steps run in.

use crate::normalize::{normalize_status, Citation};
use crate::types::{RegulationRecord, Relations};

/// A field that is either unset or set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot<T>(Option<T>);

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Slot<T> {
    /// Set the value if the slot is still unset.
    ///
    /// Returns `true` when the value was stored.
    ///
    /// # Examples
    /// ```
    /// use regwatch_harvester::builder::Slot;
    ///
    /// let mut nomor = Slot::default();
    /// assert!(nomor.fill("5"));
    /// assert!(!nomor.fill("7"));
    /// assert_eq!(nomor.get(), Some(&"5"));
    /// ```
    pub fn fill(&mut self, value: T) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(value);
        true
    }

    /// Set the value unconditionally.
    pub fn replace(&mut self, value: T) {
        self.0 = Some(value);
    }

    /// Set the value from an optional source; `None` leaves the slot as is.
    pub fn replace_with(&mut self, value: Option<T>) {
        if let Some(v) = value {
            self.0 = Some(v);
        }
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

/// Extraction state for one detail page.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    pub jenis: Slot<String>,
    pub nomor: Slot<String>,
    pub tahun: Slot<i32>,
    pub judul: Slot<String>,
    pub tentang: Slot<String>,
    pub issuer: Slot<String>,
    pub lokasi: Slot<String>,
    pub bidang: Slot<String>,
    pub penetapan_date: Slot<String>,
    pub pengundangan_date: Slot<String>,
    pub berlaku_date: Slot<String>,
    pub status_raw: Slot<String>,
    pub pdf_url: Slot<String>,
    pub citation: Citation,
    pub relations: Relations,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether jenis, nomor and tahun are all set.
    #[must_use]
    pub fn has_natural_key(&self) -> bool {
        self.jenis.is_set() && self.nomor.is_set() && self.tahun.is_set()
    }

    /// Fill unset natural key parts from a `(jenis, nomor, tahun)` match.
    ///
    /// Jenis is upper-cased; a year that does not parse is ignored.
    pub fn fill_natural_key(&mut self, jenis: &str, nomor: &str, tahun: &str) {
        self.jenis.fill(jenis.to_uppercase());
        self.nomor.fill(nomor.to_string());
        if let Ok(year) = tahun.parse() {
            self.tahun.fill(year);
        }
    }

    /// Finish the record; `status` is derived from `status_raw` here.
    pub fn build(self, detail_url: &str) -> RegulationRecord {
        let status_raw = self.status_raw.into_inner();
        let status = status_raw.as_deref().and_then(normalize_status);

        RegulationRecord {
            detail_url: detail_url.to_string(),
            jenis: self.jenis.into_inner(),
            nomor: self.nomor.into_inner(),
            tahun: self.tahun.into_inner(),
            judul: self.judul.into_inner(),
            tentang: self.tentang.into_inner().unwrap_or_default(),
            issuer: self.issuer.into_inner(),
            lokasi: self.lokasi.into_inner(),
            bidang: self.bidang.into_inner(),
            penetapan_date: self.penetapan_date.into_inner(),
            pengundangan_date: self.pengundangan_date.into_inner(),
            berlaku_date: self.berlaku_date.into_inner(),
            status_raw,
            status,
            ln: self.citation.ln,
            tln: self.citation.tln,
            pdf_url: self.pdf_url.into_inner(),
            relations: self.relations,
        }
    }
}
