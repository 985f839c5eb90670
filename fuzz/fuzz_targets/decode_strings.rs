#![no_main]

use libfuzzer_sys::fuzz_target;
use asn1_tree::der::{get_bit_der, get_octet_der, octet_der, bit_der};
use asn1_tree::Error;

fuzz_target!(|data: &[u8]| {
    let mut buf = vec![0u8; data.len()];

    match get_octet_der(data, &mut buf) {
        Ok((len, consumed)) => {
            assert!(consumed <= data.len());
            let mut enc = Vec::new();
            octet_der(&buf[..len], &mut enc);
            assert_eq!(enc.as_slice(), &data[..consumed]);
        }
        Err(Error::Capacity { .. }) => {
            // A buffer the size of the input always suffices.
            unreachable!()
        }
        Err(_) => {}
    }

    if let Ok((bits, consumed)) = get_bit_der(data, &mut buf) {
        assert!(consumed <= data.len());
        let octets = bits.div_ceil(8);
        let mut enc = Vec::new();
        bit_der(&buf[..octets], bits, &mut enc);
        // Unused bits may need zeroing before the encodings agree; the
        // decoded prefix itself must round-trip.
        let mut redec = vec![0u8; enc.len()];
        let (bits2, _) = get_bit_der(&enc, &mut redec).unwrap();
        assert_eq!(bits, bits2);
    }
});
