//! Citation Styles Language (CSL) JSON item model.
//!
//! Produced by DOI content negotiation. Only item types that denote
//! citable papers may become local records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PaperRecord;

/// CSL item types accepted as paper records. Anything else (webpage,
/// dataset, software, ...) is rejected during conversion.
pub const CSL_PAPER_TYPES: &[&str] = &[
    "article",
    "article-journal",
    "article-magazine",
    "article-newspaper",
    "book",
    "chapter",
    "manuscript",
    "paper-conference",
    "report",
    "thesis",
];

/// A CSL JSON item as returned by `doi.org`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CslItem {
    /// CSL item type (e.g. "article-journal").
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,

    /// Item title.
    #[serde(default)]
    pub title: Option<String>,

    /// DOI, any case.
    #[serde(rename = "DOI", default)]
    pub doi: Option<String>,

    /// Landing page URL.
    #[serde(rename = "URL", default)]
    pub url: Option<String>,

    /// Abstract text.
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,

    /// Journal or proceedings title.
    #[serde(rename = "container-title", default)]
    pub container_title: Option<String>,

    /// Author list.
    #[serde(default)]
    pub author: Vec<CslAuthor>,

    /// Issue date in date-parts form.
    #[serde(default)]
    pub issued: Option<CslDate>,
}

/// A CSL author entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CslAuthor {
    /// Given (first) name.
    #[serde(default)]
    pub given: Option<String>,

    /// Family (last) name.
    #[serde(default)]
    pub family: Option<String>,

    /// Literal name for institutional authors.
    #[serde(default)]
    pub literal: Option<String>,
}

impl CslAuthor {
    /// Full display name.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        if let Some(ref literal) = self.literal {
            return Some(literal.clone());
        }
        match (&self.given, &self.family) {
            (Some(given), Some(family)) => Some(format!("{given} {family}")),
            (None, Some(family)) => Some(family.clone()),
            (Some(given), None) => Some(given.clone()),
            (None, None) => None,
        }
    }
}

/// A CSL date: `{"date-parts": [[year, month, day]]}` with month and day
/// optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CslDate {
    /// Date parts, outer list holds one entry for single dates.
    #[serde(rename = "date-parts", default)]
    pub date_parts: Vec<Vec<i32>>,
}

impl CslDate {
    /// Convert date-parts to a date, filling missing month/day with 1.
    #[must_use]
    pub fn as_naive_date(&self) -> Option<NaiveDate> {
        let parts = self.date_parts.first()?;
        let year = *parts.first()?;
        let month = parts.get(1).copied().unwrap_or(1);
        let day = parts.get(2).copied().unwrap_or(1);
        NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
    }
}

impl CslItem {
    /// Whether this item's type is accepted as a paper.
    #[must_use]
    pub fn is_paper_type(&self) -> bool {
        self.item_type.as_deref().is_some_and(|t| CSL_PAPER_TYPES.contains(&t))
    }

    /// Build a local record from this item.
    ///
    /// Returns `None` when the item type is not an accepted paper type.
    /// The DOI is lowercased; the raw item is kept on the record.
    #[must_use]
    pub fn into_record(self, source: &str) -> Option<PaperRecord> {
        if !self.is_paper_type() {
            return None;
        }

        let title = self.title.clone().unwrap_or_default();
        let raw = serde_json::to_value(&self).ok();

        let mut record = PaperRecord::new(title).externally_sourced(source);
        record.paper_title = self.title;
        if let Some(ref doi) = self.doi {
            record.set_doi(doi);
        }
        record.url = self.url;
        record.abstract_text = self.abstract_text;
        record.publish_date = self.issued.as_ref().and_then(CslDate::as_naive_date);
        record.raw_authors = self.author.iter().filter_map(CslAuthor::display_name).collect();
        record.csl_item = raw;
        Some(record)
    }
}
