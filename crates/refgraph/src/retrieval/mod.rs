//! Metadata retrieval for papers seeded with only a URL.
//!
//! A freshly uploaded paper may carry nothing but a landing page or PDF
//! link. The retriever probes the URL, orders the retrieval methods by
//! how likely they are to succeed for that kind of URL, and walks the
//! list until one yields metadata, journaling every attempt.

mod retriever;

pub use retriever::MetadataRetriever;

use serde::Serialize;

/// How a metadata retrieval was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetrievalMethod {
    /// CSL resolution of the paper's known DOI.
    CslDoi,
    /// CSL resolution of a DOI discovered in the landing page.
    CslUrl,
    /// CSL resolution of an identifier embedded in a PDF URL.
    CslPdfUrl,
    /// Crossref lookup of the paper's known DOI.
    CrossrefDoi,
    /// Crossref bibliographic query by title.
    CrossrefQuery,
    /// DOI scan over the leading bytes of the PDF itself.
    ParsePdf,
    /// Pull `citation_pdf_url` out of the journal landing page.
    PdfFromUrl,
}

impl RetrievalMethod {
    /// Stable label used in journals and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CslDoi => "CSL_DOI",
            Self::CslUrl => "CSL_URL",
            Self::CslPdfUrl => "CSL_PDF_URL",
            Self::CrossrefDoi => "CROSSREF_DOI",
            Self::CrossrefQuery => "CROSSREF_QUERY",
            Self::ParsePdf => "PARSE_PDF",
            Self::PdfFromUrl => "PDF_FROM_URL",
        }
    }
}

impl std::fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order retrieval methods for a seed URL.
///
/// DOI-bearing records try direct resolution first. PDF links favor
/// identifier extraction from the link and the file; landing pages favor
/// meta-tag scraping.
#[must_use]
pub fn method_priority_list(has_doi: bool, url_is_pdf: bool) -> Vec<RetrievalMethod> {
    let mut methods = Vec::new();

    if has_doi {
        methods.push(RetrievalMethod::CslDoi);
        methods.push(RetrievalMethod::CrossrefDoi);
    }

    if url_is_pdf {
        methods.push(RetrievalMethod::CslPdfUrl);
        methods.push(RetrievalMethod::ParsePdf);
        methods.push(RetrievalMethod::CrossrefQuery);
    } else {
        methods.push(RetrievalMethod::PdfFromUrl);
        methods.push(RetrievalMethod::CslUrl);
    }

    methods
}
