//! Synchronization descriptor: the one-shot advertisement field describing a
//! periodic broadcast train.
//!
//! Wire layout (18 bytes, little-endian throughout):
//!
//! | bytes | field |
//! |---|---|
//! | 0..2  | offset\[13\], offset-units, offset-adjust, rfu |
//! | 2..4  | interval (1.25 ms units) |
//! | 4..9  | channel map (37 bits) with the remote SCA in bits 37..40 |
//! | 9..13 | access address |
//! | 13..16 | CRC init |
//! | 16..18 | event counter |

use crate::chanmap::{CHANNEL_MAP_LEN, ChannelMap};

/// Descriptor length on the wire.
pub const SYNC_INFO_LEN: usize = 18;

/// Byte of the sca+chm field carrying the SCA bits.
const SCA_BYTE: usize = CHANNEL_MAP_LEN - 1;

/// Mask of the SCA bits within [`SCA_BYTE`].
const SCA_MASK: u8 = 0xE0;

/// Bit position of the SCA value within [`SCA_BYTE`].
const SCA_SHIFT: u8 = 5;

/// Decoded synchronization descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncInfo {
    /// Offset from the referencing packet to the first periodic event, in
    /// offset units.
    pub offs: u16,
    /// Offset unit is 300 us when set, 30 us when clear.
    pub offs_units: bool,
    /// Offset exceeded the field range and carries a fixed adjustment.
    pub offs_adjust: bool,
    /// Periodic interval in 1.25 ms units.
    pub interval: u16,
    /// Channel map bytes with the embedded SCA field still in place.
    pub sca_chm: [u8; CHANNEL_MAP_LEN],
    /// Access address of the periodic train.
    pub access_addr: [u8; 4],
    /// CRC initialization value.
    pub crc_init: [u8; 3],
    /// Event counter of the referenced periodic event.
    pub event_counter: u16,
}

impl SyncInfo {
    /// Decode a descriptor from its wire form.
    ///
    /// Returns `None` when the buffer is not exactly [`SYNC_INFO_LEN`]
    /// bytes. Field values are not validated here; the channel floor is
    /// enforced at setup.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; SYNC_INFO_LEN] = bytes.try_into().ok()?;
        let [
            o0,
            o1,
            i0,
            i1,
            c0,
            c1,
            c2,
            c3,
            c4,
            a0,
            a1,
            a2,
            a3,
            r0,
            r1,
            r2,
            e0,
            e1,
        ] = *bytes;

        let offs_raw = u16::from_le_bytes([o0, o1]);
        Some(Self {
            offs: offs_raw & 0x1FFF,
            offs_units: offs_raw & 0x2000 != 0,
            offs_adjust: offs_raw & 0x4000 != 0,
            interval: u16::from_le_bytes([i0, i1]),
            sca_chm: [c0, c1, c2, c3, c4],
            access_addr: [a0, a1, a2, a3],
            crc_init: [r0, r1, r2],
            event_counter: u16::from_le_bytes([e0, e1]),
        })
    }

    /// The channel map with the embedded SCA bits masked out.
    #[must_use]
    pub fn channel_map(&self) -> ChannelMap {
        let mut bytes = self.sca_chm;
        if let Some(b) = bytes.get_mut(SCA_BYTE) {
            *b &= !SCA_MASK;
        }
        ChannelMap::from_bytes(bytes)
    }

    /// The remote's 3-bit sleep-clock accuracy value.
    #[must_use]
    pub fn sca(&self) -> u8 {
        self.sca_chm
            .get(SCA_BYTE)
            .map_or(0, |b| (b & SCA_MASK) >> SCA_SHIFT)
    }

    /// Periodic interval in microseconds.
    #[must_use]
    pub fn interval_us(&self) -> u32 {
        u32::from(self.interval) * crate::timing::PER_INT_UNIT_US
    }
}

/// CSA#2 channel identifier derived from the access address.
#[must_use]
pub fn channel_id(access_addr: [u8; 4]) -> u16 {
    let aa = u32::from_le_bytes(access_addr);
    ((aa >> 16) ^ (aa & 0xFFFF)) as u16
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn sample_bytes() -> [u8; SYNC_INFO_LEN] {
        let offs: u16 = 0x2000 | 245; // offset 245, units flag set
        let mut b = [0u8; SYNC_INFO_LEN];
        b[0..2].copy_from_slice(&offs.to_le_bytes());
        b[2..4].copy_from_slice(&800u16.to_le_bytes()); // 1 s interval
        b[4..9].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F | (0x03 << 5)]);
        b[9..13].copy_from_slice(&[0x17, 0x2A, 0x9C, 0x8E]);
        b[13..16].copy_from_slice(&[0x11, 0x22, 0x33]);
        b[16..18].copy_from_slice(&1000u16.to_le_bytes());
        b
    }

    #[test]
    fn test_decode_fields() {
        let si = SyncInfo::decode(&sample_bytes()).unwrap();
        assert_eq!(si.offs, 245);
        assert!(si.offs_units);
        assert!(!si.offs_adjust);
        assert_eq!(si.interval, 800);
        assert_eq!(si.interval_us(), 1_000_000);
        assert_eq!(si.access_addr, [0x17, 0x2A, 0x9C, 0x8E]);
        assert_eq!(si.crc_init, [0x11, 0x22, 0x33]);
        assert_eq!(si.event_counter, 1000);
    }

    #[test]
    fn test_decode_wrong_len() {
        assert!(SyncInfo::decode(&[0u8; 17]).is_none());
        assert!(SyncInfo::decode(&[0u8; 19]).is_none());
        assert!(SyncInfo::decode(&[]).is_none());
    }

    #[test]
    fn test_sca_extraction_and_masking() {
        let si = SyncInfo::decode(&sample_bytes()).unwrap();
        assert_eq!(si.sca(), 3);
        // Masked map keeps all 37 channels, drops the SCA bits
        let map = si.channel_map();
        assert_eq!(map.used_count(), 37);
        assert_eq!(map.as_bytes()[4], 0x1F);
    }

    #[test]
    fn test_offs_adjust_flag() {
        let mut b = sample_bytes();
        let offs: u16 = 0x4000 | 100;
        b[0..2].copy_from_slice(&offs.to_le_bytes());
        let si = SyncInfo::decode(&b).unwrap();
        assert!(si.offs_adjust);
        assert!(!si.offs_units);
        assert_eq!(si.offs, 100);
    }

    #[test]
    fn test_channel_id() {
        assert_eq!(channel_id([0, 0, 0, 0]), 0);
        let id = channel_id([0x17, 0x2A, 0x9C, 0x8E]);
        assert_eq!(id, 0x8E9C ^ 0x2A17);
    }
}
