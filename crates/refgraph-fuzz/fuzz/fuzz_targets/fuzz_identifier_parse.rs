#![no_main]

use libfuzzer_sys::fuzz_target;
use refgraph::models::PaperIdentifier;

fuzz_target!(|data: &[u8]| {
    // Identifier parsing over arbitrary text must never panic
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = PaperIdentifier::parse(text);
        let _ = PaperIdentifier::find_doi_in_text(text);
    }
});
