use proptest::prelude::*;

use diploma_types::{Identity, RequestId, RequestStatus, Timestamp};

proptest! {
    /// RequestId bincode roundtrip keeps the raw 16 bytes.
    #[test]
    fn request_id_bincode_roundtrip(bytes in prop::array::uniform16(0u8..)) {
        let id = RequestId::from_bytes(bytes);
        let encoded = bincode::serialize(&id).unwrap();
        let decoded: RequestId = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded.as_bytes(), &bytes);
    }

    /// The textual form always parses back to the same id.
    #[test]
    fn request_id_display_parses(bytes in prop::array::uniform16(0u8..)) {
        let id = RequestId::from_bytes(bytes);
        prop_assert_eq!(RequestId::parse(&id.to_string()).unwrap(), id);
    }

    /// Wallet-shaped identities are case-insensitive.
    #[test]
    fn wallet_identity_case_insensitive(hex in "[0-9a-fA-F]{40}") {
        let upper = Identity::new(format!("0x{}", hex.to_uppercase())).unwrap();
        let lower = Identity::new(format!("0x{}", hex.to_lowercase())).unwrap();
        prop_assert_eq!(upper, lower);
    }

    /// Identity construction is idempotent.
    #[test]
    fn identity_normalisation_idempotent(raw in "[ ]{0,2}[A-Za-z0-9_-]{1,30}[ ]{0,2}") {
        let once = Identity::new(&raw).unwrap();
        let twice = Identity::new(once.as_str()).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Timestamp elapsed_since saturates to 0 when now < self.
    #[test]
    fn timestamp_elapsed_since_saturates(
        base in 1u64..1_000_000,
        deficit in 1u64..1_000_000,
    ) {
        let later = Timestamp::new(base + deficit);
        let earlier = Timestamp::new(base);
        prop_assert_eq!(later.elapsed_since(earlier), 0);
    }

    /// Timestamp has_expired agrees with manual arithmetic.
    #[test]
    fn timestamp_has_expired(start in 0u64..1_000_000, ttl in 0u64..1_000, now in 0u64..2_000_000) {
        let t = Timestamp::new(start);
        prop_assert_eq!(t.has_expired(ttl, Timestamp::new(now)), now >= start + ttl);
    }
}

#[test]
fn status_bincode_roundtrip() {
    for status in RequestStatus::ALL {
        let encoded = bincode::serialize(&status).unwrap();
        let decoded: RequestStatus = bincode::deserialize(&encoded).unwrap();
        assert_eq!(decoded, status);
    }
}
