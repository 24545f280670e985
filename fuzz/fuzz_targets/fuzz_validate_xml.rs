#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // A document passing the structural check must also parse.
        if nfse::xml::validate_nfse_xml(s).is_ok() {
            assert!(nfse::xml::parse_nfse_xml(s).is_ok());
        }
    }
});
