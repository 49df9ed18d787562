//! Property: the delta-body size varint and the OFS_DELTA base-offset
//! encoding are distinct variable-length schemes and must not be unified.

use git_pack::delta::read_varint;
use git_pack::entry::{decode_ofs_delta_offset, encode_ofs_delta_offset};
use proptest::prelude::*;

proptest! {
    #[test]
    fn ofs_delta_offset_roundtrips_through_its_own_codec(offset in 0u64..=0xF_FFFF_FFFF) {
        let encoded = encode_ofs_delta_offset(offset);
        let (decoded, consumed) = decode_ofs_delta_offset(&encoded).unwrap();
        prop_assert_eq!(decoded, offset);
        prop_assert_eq!(consumed, encoded.len());
    }

    #[test]
    fn varint_and_ofs_delta_schemes_disagree_on_some_multibyte_input(a in 0u8..=255, b in 1u8..=127) {
        // A two-byte input with the continuation bit set on the first byte.
        // The plain base-128 varint (no per-continuation adjustment) and the
        // ofs-delta scheme (adds 1 per continuation byte before shifting)
        // must read this differently whenever the low byte is nonzero.
        let bytes = [a | 0x80, b];
        let (varint_value, _) = read_varint(&bytes).unwrap();
        let (ofs_value, _) = decode_ofs_delta_offset(&bytes).unwrap();
        prop_assert_ne!(varint_value as u64, ofs_value);
    }
}
