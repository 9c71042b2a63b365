#![no_main]

use libfuzzer_sys::fuzz_target;
use refgraph::models::CslItem;

fuzz_target!(|data: &[u8]| {
    // Try to parse arbitrary bytes as a CSL item
    // Should never panic, only return Ok or Err
    if let Ok(item) = serde_json::from_slice::<CslItem>(data) {
        let _ = item.into_record("doi.org");
    }
});
