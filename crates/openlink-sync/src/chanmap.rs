//! Channel map bitmap and the double-buffered channel map store.
//!
//! A periodic train hops over the 37 data channels according to a bitmap the
//! remote publishes. Channel map changes arrive ahead of time with an
//! activation instant; until the instant is reached both the current and the
//! pending map must be retained, so the store keeps two buffered entries
//! indexed by `first` (active) and `last` (staged) cursors. This core only
//! stages updates; the radio-prepare step performs the switch when the event
//! counter reaches the staged instant.

/// Number of data channels covered by the map.
pub const DATA_CHANNEL_COUNT: usize = 37;

/// Bitmap length in bytes (37 bits, upper 3 bits of the last byte unused on
/// the air but carry the clock-accuracy field in the sync descriptor).
pub const CHANNEL_MAP_LEN: usize = 5;

/// Minimum usable channels for a map to be acceptable.
pub const MIN_USED_CHANNELS: u8 = 2;

/// 37-channel usage bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelMap {
    bytes: [u8; CHANNEL_MAP_LEN],
}

impl ChannelMap {
    /// Build from raw bitmap bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; CHANNEL_MAP_LEN]) -> Self {
        Self { bytes }
    }

    /// Raw bitmap bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CHANNEL_MAP_LEN] {
        &self.bytes
    }

    /// Whether a data channel index is marked used. Indices past 36 report
    /// unused.
    #[must_use]
    pub fn is_used(&self, channel: u8) -> bool {
        if usize::from(channel) >= DATA_CHANNEL_COUNT {
            return false;
        }
        let byte = usize::from(channel / 8);
        let bit = channel % 8;
        self.bytes.get(byte).is_some_and(|b| b & (1 << bit) != 0)
    }

    /// Mark a data channel used.
    pub fn set_used(&mut self, channel: u8) {
        if usize::from(channel) >= DATA_CHANNEL_COUNT {
            return;
        }
        let byte = usize::from(channel / 8);
        let bit = channel % 8;
        if let Some(b) = self.bytes.get_mut(byte) {
            *b |= 1 << bit;
        }
    }

    /// Number of used data channels. Bits above channel 36 are ignored.
    #[must_use]
    pub fn used_count(&self) -> u8 {
        let mut count = 0u8;
        for (i, b) in self.bytes.iter().enumerate() {
            let masked = if i == CHANNEL_MAP_LEN - 1 {
                b & 0x1F
            } else {
                *b
            };
            count = count.saturating_add(masked.count_ones() as u8);
        }
        count
    }

    /// Whether the map satisfies the minimum-usable-channels floor.
    #[must_use]
    pub fn has_channel_floor(&self) -> bool {
        self.used_count() >= MIN_USED_CHANNELS
    }
}

/// One buffered channel map with its derived count and activation instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChanMapEntry {
    /// The channel usage bitmap.
    pub map: ChannelMap,
    /// Derived usable-channel count.
    pub used_count: u8,
    /// Event-counter value at which this entry becomes effective. Meaningful
    /// only for a staged entry.
    pub instant: u16,
}

/// Double-buffered channel map store.
///
/// Invariant: an update is in progress iff `last != first`. A staged update
/// is rejected while one is already in progress. Activation (cursor
/// alignment) is the radio-prepare consumer's job, exposed here as
/// [`ChanMapStore::activate`] for that consumer and for tests.
#[derive(Debug, Default)]
pub struct ChanMapStore {
    even: ChanMapEntry,
    odd: ChanMapEntry,
    first: u8,
    last: u8,
}

impl ChanMapStore {
    fn entry(&self, cursor: u8) -> &ChanMapEntry {
        if cursor & 1 == 0 { &self.even } else { &self.odd }
    }

    fn entry_mut(&mut self, cursor: u8) -> &mut ChanMapEntry {
        if cursor & 1 == 0 {
            &mut self.even
        } else {
            &mut self.odd
        }
    }

    /// Align the cursors, discarding any staged update. Called when a sync
    /// context is initialized.
    pub fn align(&mut self) {
        self.last = self.first;
    }

    /// Whether an update is staged and not yet activated.
    #[must_use]
    pub fn update_in_progress(&self) -> bool {
        self.last != self.first
    }

    /// The currently active entry.
    #[must_use]
    pub fn active(&self) -> &ChanMapEntry {
        self.entry(self.first)
    }

    /// The staged entry, if an update is in progress.
    #[must_use]
    pub fn staged(&self) -> Option<&ChanMapEntry> {
        if !self.update_in_progress() {
            return None;
        }
        Some(self.entry(self.last))
    }

    /// Install a map as the active entry, in place, without staging.
    ///
    /// Used during setup when the context is not yet scheduled. Returns
    /// `false` (store unchanged) if the map is below the channel floor.
    #[must_use]
    pub fn install_active(&mut self, map: ChannelMap) -> bool {
        let used_count = map.used_count();
        if used_count < MIN_USED_CHANNELS {
            return false;
        }
        let first = self.first;
        *self.entry_mut(first) = ChanMapEntry {
            map,
            used_count,
            instant: 0,
        };
        self.last = self.first;
        true
    }

    /// Stage a future channel map switch at the given instant.
    ///
    /// Returns `false` (store unchanged) when an update is already in
    /// progress or the new map is below the channel floor. Only on success
    /// does the `last` cursor advance, marking the update in progress.
    #[must_use]
    pub fn stage(&mut self, map: ChannelMap, instant: u16) -> bool {
        if self.update_in_progress() {
            return false;
        }
        let used_count = map.used_count();
        if used_count < MIN_USED_CHANNELS {
            return false;
        }
        let next = (self.last + 1) & 1;
        *self.entry_mut(next) = ChanMapEntry {
            map,
            used_count,
            instant,
        };
        self.last = next;
        true
    }

    /// Activation predicate evaluated by the radio-prepare consumer.
    #[must_use]
    pub fn activation_due(&self, event_counter: u16) -> bool {
        self.staged().is_some_and(|e| e.instant == event_counter)
    }

    /// Switch to the staged entry. Consumer-side operation; a no-op when no
    /// update is in progress.
    pub fn activate(&mut self) {
        self.first = self.last;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_map() -> ChannelMap {
        ChannelMap::from_bytes([0xFF, 0xFF, 0xFF, 0xFF, 0x1F])
    }

    fn sparse_map(channels: &[u8]) -> ChannelMap {
        let mut map = ChannelMap::default();
        for &ch in channels {
            map.set_used(ch);
        }
        map
    }

    #[test]
    fn test_used_count_ignores_high_bits() {
        // Bits 37..40 set must not count
        let map = ChannelMap::from_bytes([0x00, 0x00, 0x00, 0x00, 0xE0]);
        assert_eq!(map.used_count(), 0);
        assert_eq!(full_map().used_count(), 37);
    }

    #[test]
    fn test_is_used_set_used() {
        let map = sparse_map(&[0, 12, 36]);
        assert!(map.is_used(0));
        assert!(map.is_used(12));
        assert!(map.is_used(36));
        assert!(!map.is_used(1));
        assert!(!map.is_used(37));
        assert!(!map.is_used(255));
    }

    #[test]
    fn test_channel_floor() {
        assert!(!sparse_map(&[5]).has_channel_floor());
        assert!(sparse_map(&[5, 6]).has_channel_floor());
    }

    #[test]
    fn test_install_active_rejects_below_floor() {
        let mut store = ChanMapStore::default();
        assert!(!store.install_active(sparse_map(&[3])));
        assert_eq!(store.active().used_count, 0);

        assert!(store.install_active(full_map()));
        assert_eq!(store.active().used_count, 37);
        assert!(!store.update_in_progress());
    }

    #[test]
    fn test_stage_single_flight() {
        let mut store = ChanMapStore::default();
        assert!(store.install_active(full_map()));

        assert!(store.stage(sparse_map(&[1, 2, 3]), 100));
        assert!(store.update_in_progress());
        assert_eq!(store.staged().unwrap().instant, 100);

        // Second staging rejected while in progress
        assert!(!store.stage(sparse_map(&[4, 5, 6]), 200));
        assert_eq!(store.staged().unwrap().instant, 100);

        // After activation a new update may be staged
        store.activate();
        assert!(!store.update_in_progress());
        assert_eq!(store.active().map, sparse_map(&[1, 2, 3]));
        assert!(store.stage(sparse_map(&[7, 8]), 300));
    }

    #[test]
    fn test_stage_rejects_below_floor() {
        let mut store = ChanMapStore::default();
        assert!(store.install_active(full_map()));
        assert!(!store.stage(sparse_map(&[9]), 50));
        assert!(!store.update_in_progress());
        assert_eq!(store.active().map, full_map());
    }

    #[test]
    fn test_activation_due() {
        let mut store = ChanMapStore::default();
        assert!(store.install_active(full_map()));
        assert!(!store.activation_due(7));

        assert!(store.stage(sparse_map(&[1, 2]), 7));
        assert!(!store.activation_due(6));
        assert!(store.activation_due(7));
    }

    #[test]
    fn test_align_discards_staged() {
        let mut store = ChanMapStore::default();
        assert!(store.install_active(full_map()));
        assert!(store.stage(sparse_map(&[1, 2]), 9));
        store.align();
        assert!(!store.update_in_progress());
    }
}
