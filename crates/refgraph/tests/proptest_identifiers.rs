//! Property-based tests for identifier parsing and normalization.

use proptest::prelude::*;

use refgraph::models::PaperIdentifier;

proptest! {
    #[test]
    fn doi_normalization_is_idempotent(suffix in "[a-zA-Z0-9.]{1,24}") {
        let raw = format!("10.1234/{suffix}");
        let first = PaperIdentifier::doi(&raw).expect("valid DOI shape");
        let second = PaperIdentifier::doi(first.value()).expect("normalized DOI reparses");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn doi_is_lowercased(suffix in "[a-zA-Z0-9.]{1,24}") {
        let raw = format!("10.1234/{suffix}");
        let id = PaperIdentifier::doi(&raw).expect("valid DOI shape");
        prop_assert_eq!(id.value(), raw.to_lowercase().as_str());
    }

    #[test]
    fn doi_resolver_prefix_is_stripped(suffix in "[a-z0-9.]{1,24}") {
        let bare = format!("10.1234/{suffix}");
        let with_resolver = format!("https://doi.org/{bare}");
        prop_assert_eq!(
            PaperIdentifier::doi(&with_resolver),
            PaperIdentifier::doi(&bare)
        );
    }

    #[test]
    fn new_style_arxiv_roundtrips_through_display(id in "[0-9]{4}\\.[0-9]{4,5}") {
        let parsed = PaperIdentifier::arxiv(&id).expect("valid arXiv shape");
        prop_assert_eq!(parsed.value(), id.as_str());

        let display = parsed.to_string();
        prop_assert!(display.starts_with("arXiv:"));
        prop_assert_eq!(PaperIdentifier::parse(&display), Some(parsed));
    }

    #[test]
    fn doi_found_inside_surrounding_text(
        prefix in "[ a-zA-Z]{0,16}",
        suffix in "[a-z0-9]{1,16}",
    ) {
        let text = format!("{prefix} doi:10.5555/{suffix} trailing");
        let found = PaperIdentifier::find_doi_in_text(&text).expect("embedded DOI found");
        prop_assert_eq!(found.value(), format!("10.5555/{suffix}").as_str());
    }

    #[test]
    fn garbage_never_parses_as_doi(garbage in "[a-z ]{0,32}") {
        // No "10." prefix anywhere means no DOI can be extracted.
        prop_assert!(PaperIdentifier::doi(&garbage).is_none());
    }
}
