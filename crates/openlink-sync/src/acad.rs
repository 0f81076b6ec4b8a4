//! Additional controller advertising data (ACAD) record scanning.
//!
//! ACAD is a sequence of length-prefixed AD structures riding along a
//! received periodic packet: `len | type | payload` where `len` counts the
//! type byte and payload. The only record this core consumes is the channel
//! map update indication. The buffer originates from an untrusted remote
//! peer, so every malformed shape decodes to "not present" rather than an
//! error.

use crate::chanmap::{CHANNEL_MAP_LEN, ChannelMap};

/// AD type of the channel map update indication record.
pub const AD_TYPE_CHM_UPDATE_IND: u8 = 0x28;

/// Payload length of a channel map update indication: 5 map bytes plus a
/// little-endian activation instant.
pub const CHM_UPDATE_IND_LEN: usize = CHANNEL_MAP_LEN + 2;

/// Decoded channel map update indication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChmUpdateInd {
    /// The replacement channel map.
    pub map: ChannelMap,
    /// Absolute event-counter value at which the map becomes effective.
    pub instant: u16,
}

/// Scan an ACAD buffer for a channel map update indication.
///
/// Returns `None` when the buffer is exhausted without finding the record,
/// or when a candidate record's declared length does not match the
/// indication payload, or when the record is truncated. Scanning stops at
/// the first record with the matching type; its shape is then validated
/// strictly.
#[must_use]
pub fn find_chm_update(acad: &[u8]) -> Option<ChmUpdateInd> {
    let mut rest = acad;

    loop {
        let ad_len = usize::from(*rest.first()?);
        let ad_type = rest.get(1).copied();

        if ad_len != 0 && ad_type == Some(AD_TYPE_CHM_UPDATE_IND) {
            // Declared length covers the type byte and payload
            if ad_len != CHM_UPDATE_IND_LEN + 1 {
                return None;
            }
            let payload = rest.get(2..2 + CHM_UPDATE_IND_LEN)?;
            let map_bytes: [u8; CHANNEL_MAP_LEN] =
                payload.get(..CHANNEL_MAP_LEN)?.try_into().ok()?;
            let instant_bytes: [u8; 2] = payload.get(CHANNEL_MAP_LEN..)?.try_into().ok()?;
            return Some(ChmUpdateInd {
                map: ChannelMap::from_bytes(map_bytes),
                instant: u16::from_le_bytes(instant_bytes),
            });
        }

        // Skip over this record (length field plus declared length)
        rest = rest.get(ad_len + 1..)?;
        if rest.is_empty() {
            return None;
        }
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn chm_record(map: [u8; 5], instant: u16) -> Vec<u8> {
        let mut rec = vec![(CHM_UPDATE_IND_LEN + 1) as u8, AD_TYPE_CHM_UPDATE_IND];
        rec.extend_from_slice(&map);
        rec.extend_from_slice(&instant.to_le_bytes());
        rec
    }

    #[test]
    fn test_find_direct() {
        let acad = chm_record([0xFF, 0xFF, 0xFF, 0xFF, 0x1F], 500);
        let ind = find_chm_update(&acad).unwrap();
        assert_eq!(ind.instant, 500);
        assert_eq!(ind.map.used_count(), 37);
    }

    #[test]
    fn test_find_after_other_records() {
        // Preceding unrelated records: one empty-ish, one with payload
        let mut acad = vec![0x02, 0x0A, 0x00]; // tx power level record
        acad.extend_from_slice(&[0x03, 0x16, 0xAA, 0xBB]); // service data
        acad.extend_from_slice(&chm_record([0x03, 0, 0, 0, 0], 42));

        let ind = find_chm_update(&acad).unwrap();
        assert_eq!(ind.instant, 42);
        assert_eq!(ind.map.used_count(), 2);
    }

    #[test]
    fn test_absent_record() {
        let acad = [0x02, 0x0A, 0x00, 0x03, 0x16, 0xAA, 0xBB];
        assert!(find_chm_update(&acad).is_none());
        assert!(find_chm_update(&[]).is_none());
    }

    #[test]
    fn test_wrong_declared_length_rejected() {
        // Type matches but declared length is one short
        let mut acad = chm_record([0xFF; 5], 9);
        acad[0] = CHM_UPDATE_IND_LEN as u8;
        assert!(find_chm_update(&acad).is_none());

        // And one long
        let mut acad = chm_record([0xFF; 5], 9);
        acad[0] = (CHM_UPDATE_IND_LEN + 2) as u8;
        assert!(find_chm_update(&acad).is_none());
    }

    #[test]
    fn test_truncated_record_rejected() {
        let acad = chm_record([0xFF; 5], 9);
        assert!(find_chm_update(&acad[..acad.len() - 1]).is_none());
        assert!(find_chm_update(&acad[..3]).is_none());
    }

    #[test]
    fn test_zero_length_record_skipped() {
        // A zero length field cannot match; scanning advances by one byte
        let mut acad = vec![0x00];
        acad.extend_from_slice(&chm_record([0xFF; 5], 77));
        let ind = find_chm_update(&acad).unwrap();
        assert_eq!(ind.instant, 77);
    }

    #[test]
    fn test_skip_length_overruns_buffer() {
        // Record claims more bytes than remain
        let acad = [0x20, 0x16, 0x01];
        assert!(find_chm_update(&acad).is_none());
    }
}
