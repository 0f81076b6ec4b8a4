//! Wire-format fixture builders for sync tests.

use openlink_sync::acad::{AD_TYPE_CHM_UPDATE_IND, CHM_UPDATE_IND_LEN};
use openlink_sync::manager::ScanRxMeta;
use openlink_sync::syncinfo::{SYNC_INFO_LEN, SyncInfo};
use openlink_sync::timing::Phy;

/// Builder for synchronization descriptor bytes.
#[derive(Debug, Clone)]
pub struct SyncInfoFixture {
    pub offs: u16,
    pub offs_units: bool,
    pub offs_adjust: bool,
    pub interval: u16,
    pub chm: [u8; 5],
    pub sca: u8,
    pub access_addr: [u8; 4],
    pub crc_init: [u8; 3],
    pub event_counter: u16,
}

impl Default for SyncInfoFixture {
    fn default() -> Self {
        Self {
            offs: 245,
            offs_units: false,
            offs_adjust: false,
            interval: 800, // 1 s
            chm: [0xFF, 0xFF, 0xFF, 0xFF, 0x1F],
            sca: 1,
            access_addr: [0x17, 0x2A, 0x9C, 0x8E],
            crc_init: [0x11, 0x22, 0x33],
            event_counter: 1000,
        }
    }
}

impl SyncInfoFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A descriptor whose channel map is below the usable floor.
    pub fn below_channel_floor() -> Self {
        Self {
            chm: [0x01, 0x00, 0x00, 0x00, 0x00],
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: u16) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_chm(mut self, chm: [u8; 5]) -> Self {
        self.chm = chm;
        self
    }

    /// Encode to the 18-byte wire form. The SCA value lands in the top
    /// three bits of the last channel map byte.
    pub fn to_bytes(&self) -> [u8; SYNC_INFO_LEN] {
        let mut offs_raw = self.offs & 0x1FFF;
        if self.offs_units {
            offs_raw |= 0x2000;
        }
        if self.offs_adjust {
            offs_raw |= 0x4000;
        }

        let mut bytes = [0u8; SYNC_INFO_LEN];
        bytes[0..2].copy_from_slice(&offs_raw.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.interval.to_le_bytes());
        bytes[4..9].copy_from_slice(&self.chm);
        bytes[8] = (bytes[8] & 0x1F) | ((self.sca & 0x07) << 5);
        bytes[9..13].copy_from_slice(&self.access_addr);
        bytes[13..16].copy_from_slice(&self.crc_init);
        bytes[16..18].copy_from_slice(&self.event_counter.to_le_bytes());
        bytes
    }

    /// Encode and decode back into the typed descriptor.
    pub fn decode(&self) -> SyncInfo {
        crate::must_some(SyncInfo::decode(&self.to_bytes()), "fixture must decode")
    }
}

/// Reception metadata with plausible defaults.
pub fn rx_meta() -> ScanRxMeta {
    ScanRxMeta {
        ticks_anchor: 100_000,
        radio_end_us: 1_000,
        phy: Phy::M1,
        pdu_len: 60,
    }
}

/// A well-formed channel map update indication record.
pub fn chm_update_record(map: [u8; 5], instant: u16) -> Vec<u8> {
    let mut rec = vec![(CHM_UPDATE_IND_LEN + 1) as u8, AD_TYPE_CHM_UPDATE_IND];
    rec.extend_from_slice(&map);
    rec.extend_from_slice(&instant.to_le_bytes());
    rec
}

/// An arbitrary AD record of the given type with a zero-filled payload.
pub fn filler_record(ad_type: u8, payload_len: u8) -> Vec<u8> {
    let mut rec = vec![payload_len + 1, ad_type];
    rec.extend(std::iter::repeat_n(0u8, usize::from(payload_len)));
    rec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_round_trips() {
        let fixture = SyncInfoFixture::new().with_interval(400);
        let si = fixture.decode();
        assert_eq!(si.interval, 400);
        assert_eq!(si.sca(), 1);
        assert_eq!(si.access_addr, fixture.access_addr);
        assert!(si.channel_map().has_channel_floor());
    }

    #[test]
    fn test_below_floor_fixture() {
        let si = SyncInfoFixture::below_channel_floor().decode();
        assert!(!si.channel_map().has_channel_floor());
    }

    #[test]
    fn test_chm_record_shape() {
        let rec = chm_update_record([0xFF, 0xFF, 0xFF, 0xFF, 0x1F], 7);
        assert_eq!(rec.len(), CHM_UPDATE_IND_LEN + 2);
        assert_eq!(rec[1], AD_TYPE_CHM_UPDATE_IND);
    }
}
