#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything we regenerate from a parsed DPS must parse and pass the structural check.
        if let Ok(dps) = nfse::xml::parse_nfse_xml(s) {
            if let Ok(xml) = nfse::xml::generate_dps_xml(&dps) {
                assert!(nfse::xml::validate_nfse_xml(&xml).is_ok());
                assert!(nfse::xml::parse_nfse_xml(&xml).is_ok());
            }
        }
    }
});
