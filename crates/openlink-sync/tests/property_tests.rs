//! Property-based tests for the wire codecs and timing laws.

use proptest::prelude::*;

use openlink_sync::acad::find_chm_update;
use openlink_sync::chanmap::{ChanMapStore, ChannelMap, MIN_USED_CHANNELS};
use openlink_sync::syncinfo::{SYNC_INFO_LEN, SyncInfo};
use openlink_sync::timing::{
    TIMEOUT_UNIT_US, drift_ticks, supervision_reload, window_widening_periodic_us,
};

proptest! {
    /// Arbitrary ACAD bytes never panic and either parse into a full record
    /// or report absence.
    #[test]
    fn acad_scan_total_on_arbitrary_input(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = find_chm_update(&bytes);
    }

    /// Any 18-byte buffer decodes, the embedded clock-accuracy bits never
    /// leak into the channel map, and the derived values stay in range.
    #[test]
    fn syncinfo_decode_masks_sca(bytes in proptest::collection::vec(any::<u8>(), SYNC_INFO_LEN)) {
        let si = SyncInfo::decode(&bytes).expect("exact-length buffer decodes");
        prop_assert!(si.sca() <= 7);
        prop_assert!(si.offs <= 0x1FFF);
        let map = si.channel_map();
        prop_assert!(map.used_count() <= 37);
        let last = map.as_bytes().last().copied().unwrap_or(0);
        prop_assert_eq!(last & 0xE0, 0);
    }

    /// Wrong-length buffers never decode.
    #[test]
    fn syncinfo_rejects_wrong_length(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        prop_assume!(bytes.len() != SYNC_INFO_LEN);
        prop_assert!(SyncInfo::decode(&bytes).is_none());
    }

    /// The supervision reload covers the configured timeout: at least one
    /// event, and enough events that their span reaches the timeout.
    #[test]
    fn supervision_reload_covers_timeout(
        timeout_10ms in 1u16..=0x4000,
        interval_us in 7_500u32..=81_918_750,
    ) {
        let reload = supervision_reload(timeout_10ms, interval_us);
        prop_assert!(reload >= 1);

        let timeout_us = u64::from(timeout_10ms) * u64::from(TIMEOUT_UNIT_US);
        let covered = u64::from(reload) * u64::from(interval_us);
        prop_assert!(covered >= timeout_us);
        if reload > 1 {
            // One event fewer would fall short
            prop_assert!(u64::from(reload - 1) * u64::from(interval_us) < timeout_us);
        }
    }

    /// Drift splits are exclusive: never both directions at once.
    #[test]
    fn drift_ticks_exclusive(actual in any::<u32>(), expected in any::<u32>()) {
        let (plus, minus) = drift_ticks(actual, expected);
        prop_assert!(plus == 0 || minus == 0);
    }

    /// Widening grows monotonically with combined clock error.
    #[test]
    fn window_widening_monotonic(
        local in 1u16..=500,
        remote in 20u16..=500,
        interval_us in 7_500u32..=10_000_000,
    ) {
        let base = window_widening_periodic_us(local, remote, interval_us);
        let more = window_widening_periodic_us(local, remote + 1, interval_us);
        prop_assert!(more >= base);
        prop_assert!(base >= 1);
    }

    /// The store either stages a staged-map update or leaves everything
    /// untouched; the single-flight invariant holds across any operation
    /// sequence.
    #[test]
    fn chanmap_store_single_flight(
        maps in proptest::collection::vec(
            (proptest::array::uniform5(any::<u8>()), any::<u16>(), any::<bool>()),
            1..20,
        ),
    ) {
        let mut store = ChanMapStore::default();
        prop_assert!(store.install_active(ChannelMap::from_bytes([0xFF, 0xFF, 0xFF, 0xFF, 0x1F])));

        for (bytes, instant, activate) in maps {
            let map = ChannelMap::from_bytes(bytes);
            let before = store.staged().copied();
            let staged = store.stage(map, instant);

            if staged {
                prop_assert!(before.is_none());
                prop_assert!(map.used_count() >= MIN_USED_CHANNELS);
                prop_assert!(store.update_in_progress());
            } else if let Some(prev) = before {
                // Rejected while in flight: the staged entry is untouched
                prop_assert_eq!(store.staged().copied(), Some(prev));
            } else {
                prop_assert!(!store.update_in_progress());
            }

            if activate {
                store.activate();
                prop_assert!(!store.update_in_progress());
            }

            // The active map always satisfies the floor
            prop_assert!(store.active().used_count >= MIN_USED_CHANNELS);
        }
    }
}
