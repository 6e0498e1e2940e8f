//! Core data types for the harvester.
//!
//! These types represent Indonesian regulations as published on the BPK
//! portal, with field names following the portal's own vocabulary.

use serde::{Deserialize, Serialize};

use crate::config::nomor_file_stem;

/// Normalized legal status of a regulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// In force (berlaku).
    Berlaku,

    /// Amended (diubah).
    Diubah,

    /// Revoked (dicabut).
    Dicabut,

    /// Partially no longer in force (tidak berlaku sebagian).
    TidakBerlakuSebagian,
}

impl Status {
    /// Get the stored string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Berlaku => "BERLAKU",
            Self::Diubah => "DIUBAH",
            Self::Dicabut => "DICABUT",
            Self::TidakBerlakuSebagian => "TIDAK_BERLAKU_SEBAGIAN",
        }
    }
}

/// Kind of cross-reference between two regulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// This regulation revokes the other.
    Mencabut,

    /// This regulation is revoked by the other.
    DicabutOleh,

    /// This regulation amends the other.
    Mengubah,

    /// This regulation is amended by the other.
    DiubahOleh,
}

impl RelationKind {
    /// All kinds, in storage order.
    pub const ALL: [RelationKind; 4] = [
        Self::Mencabut,
        Self::DicabutOleh,
        Self::Mengubah,
        Self::DiubahOleh,
    ];

    /// Get the stored string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mencabut => "MENCABUT",
            Self::DicabutOleh => "DICABUT_OLEH",
            Self::Mengubah => "MENGUBAH",
            Self::DiubahOleh => "DIUBAH_OLEH",
        }
    }
}

/// One related regulation as listed on the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Link text (usually the related regulation's citation).
    pub text: String,

    /// Absolute URL of the related detail page, if linked.
    pub url: Option<String>,
}

/// Relations grouped by kind, each list in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Relations {
    pub mencabut: Vec<Relation>,
    pub dicabut_oleh: Vec<Relation>,
    pub mengubah: Vec<Relation>,
    pub diubah_oleh: Vec<Relation>,
}

impl Relations {
    /// Entries of one kind.
    #[must_use]
    pub fn get(&self, kind: RelationKind) -> &[Relation] {
        match kind {
            RelationKind::Mencabut => &self.mencabut,
            RelationKind::DicabutOleh => &self.dicabut_oleh,
            RelationKind::Mengubah => &self.mengubah,
            RelationKind::DiubahOleh => &self.diubah_oleh,
        }
    }

    /// Append an entry to the list of one kind.
    pub fn push(&mut self, kind: RelationKind, relation: Relation) {
        let list = match kind {
            RelationKind::Mencabut => &mut self.mencabut,
            RelationKind::DicabutOleh => &mut self.dicabut_oleh,
            RelationKind::Mengubah => &mut self.mengubah,
            RelationKind::DiubahOleh => &mut self.diubah_oleh,
        };
        list.push(relation);
    }

    /// Every entry with its kind, kinds in [`RelationKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (RelationKind, &Relation)> {
        RelationKind::ALL
            .into_iter()
            .flat_map(move |kind| self.get(kind).iter().map(move |r| (kind, r)))
    }

    /// Total number of entries across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        RelationKind::ALL.iter().map(|k| self.get(*k).len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The (jenis, nomor, tahun) triple identifying a regulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaturalKey {
    pub jenis: String,
    pub nomor: String,
    pub tahun: i32,
}

impl NaturalKey {
    /// Storage path stem `{JENIS}/{tahun}/{nomor-stem}`, see [`nomor_file_stem`].
    ///
    /// # Examples
    /// ```
    /// use regwatch_harvester::types::NaturalKey;
    ///
    /// let key = NaturalKey { jenis: "uu".into(), nomor: "5".into(), tahun: 2020 };
    /// assert_eq!(key.storage_stem(), "UU/2020/5");
    /// ```
    #[must_use]
    pub fn storage_stem(&self) -> String {
        format!(
            "{}/{}/{}",
            self.jenis.to_uppercase(),
            self.tahun,
            nomor_file_stem(&self.nomor)
        )
    }

    /// Storage paths of the PDF and markdown artifacts.
    #[must_use]
    pub fn storage_paths(&self) -> (String, String) {
        let stem = self.storage_stem();
        (format!("{stem}.pdf"), format!("{stem}.md"))
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} tahun {}", self.jenis, self.nomor, self.tahun)
    }
}

/// Canonical record extracted from one detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationRecord {
    /// Detail page this record was extracted from.
    pub detail_url: String,

    /// Category code (UU, PP, PERPRES, PERMEN, PERDA, ...).
    pub jenis: Option<String>,

    /// Official number; free-form, not always numeric.
    pub nomor: Option<String>,

    /// Year of enactment.
    pub tahun: Option<i32>,

    pub judul: Option<String>,

    /// Summary; empty when the page has none.
    pub tentang: String,

    /// Issuing body (T.E.U.).
    pub issuer: Option<String>,

    /// Place of enactment.
    pub lokasi: Option<String>,

    /// Subject domain.
    pub bidang: Option<String>,

    /// Enactment date, `YYYY-MM-DD`.
    pub penetapan_date: Option<String>,

    /// Promulgation date, `YYYY-MM-DD`.
    pub pengundangan_date: Option<String>,

    /// Effective date, `YYYY-MM-DD`.
    pub berlaku_date: Option<String>,

    /// Status text as shown on the page.
    pub status_raw: Option<String>,

    /// Status derived from `status_raw`.
    pub status: Option<Status>,

    /// Lembaran Negara citation.
    pub ln: String,

    /// Tambahan Lembaran Negara citation.
    pub tln: String,

    pub pdf_url: Option<String>,

    pub relations: Relations,
}

impl RegulationRecord {
    /// The natural key, if all three parts were extracted.
    #[must_use]
    pub fn natural_key(&self) -> Option<NaturalKey> {
        match (&self.jenis, &self.nomor, self.tahun) {
            (Some(jenis), Some(nomor), Some(tahun)) => Some(NaturalKey {
                jenis: jenis.clone(),
                nomor: nomor.clone(),
                tahun,
            }),
            _ => None,
        }
    }
}
