#![no_main]

use libfuzzer_sys::fuzz_target;
use asn1_tree::int::{convert_integer, min_twos_complement};

fuzz_target!(|data: &[u8]| {
    if !data.is_empty() {
        let min = min_twos_complement(data);
        // Trimming is idempotent and sign-preserving.
        assert_eq!(min_twos_complement(min), min);
        assert_eq!(min[0] & 0x80, data[0] & 0x80);
        assert!(!min.is_empty() && min.len() <= data.len());
    }

    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(enc) = convert_integer(text) {
            assert_eq!(min_twos_complement(&enc), enc.as_slice());
            assert!(enc.len() <= 8);
        }
    }
});
