#![no_main]

use libfuzzer_sys::fuzz_target;
use asn1_tree::der::{get_length_der, length_der};

fuzz_target!(|data: &[u8]| {
    if let Ok((len, hdr)) = get_length_der(data) {
        assert!(hdr >= 1 && hdr <= data.len());

        // Whatever decoded must re-encode to the very same octets.
        let mut enc = Vec::new();
        length_der(len, &mut enc);
        assert_eq!(enc.as_slice(), &data[..hdr]);
    }
});
