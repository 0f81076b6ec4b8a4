//! Timing constants and conversion helpers for periodic sync scheduling.
//!
//! All on-air and overhead figures are expressed in microseconds; the
//! periodic event scheduler counts in 32768 Hz ticks with a sub-tick
//! remainder, so conversions here carry the remainder explicitly instead of
//! rounding it away.

use serde::{Deserialize, Serialize};

/// Periodic interval unit (1.25 ms), the granularity of the descriptor's
/// interval field.
pub const PER_INT_UNIT_US: u32 = 1250;

/// Sync timeout unit (10 ms), the granularity of the host-supplied timeout.
pub const TIMEOUT_UNIT_US: u32 = 10_000;

/// Descriptor offset unit when the offset-units flag is clear.
pub const OFFS_UNIT_30_US: u32 = 30;

/// Descriptor offset unit when the offset-units flag is set.
pub const OFFS_UNIT_300_US: u32 = 300;

/// Adjustment added when the descriptor's offset-adjust flag is set
/// (offset field overflow, 8192 units of 300 us).
pub const OFFS_ADJUST_US: u32 = 2_457_600;

/// Inter-frame spacing between consecutive packets of an event.
pub const EVENT_IFS_US: u32 = 150;

/// Jitter budget subtracted from every first listen point.
pub const EVENT_JITTER_US: u32 = 16;

/// Scheduler resolution slack subtracted from every first listen point.
pub const TICKER_RES_MARGIN_US: u32 = 2;

/// Fixed radio ramp-up overhead at the start of a scheduled slot.
pub const EVENT_OVERHEAD_START_US: u32 = 40;

/// Fixed teardown overhead at the end of a scheduled slot.
pub const EVENT_OVERHEAD_END_US: u32 = 40;

/// High-frequency clock settle time budgeted before a slot starts.
pub const EVENT_OVERHEAD_XTAL_US: u32 = 1500;

/// Largest extended payload a periodic broadcast packet may carry.
pub const PDU_EXT_PAYLOAD_SIZE_MAX: u8 = 255;

/// Scheduler tick rate.
pub const TICKER_HZ: u32 = 32_768;

/// Radio PHY of a periodic broadcast train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phy {
    /// 1 Mbit/s uncoded
    #[default]
    M1,
    /// 2 Mbit/s uncoded
    M2,
    /// 125/500 kbit/s coded (S=8 assumed for worst case)
    Coded,
}

impl Phy {
    /// Receiver ready delay: time from radio start request to the radio
    /// actually listening, per PHY front-end.
    #[must_use]
    pub fn rx_ready_delay_us(self) -> u32 {
        match self {
            Phy::M1 => 140,
            Phy::M2 => 40,
            Phy::Coded => 120,
        }
    }
}

/// Convert microseconds to whole scheduler ticks (truncating).
#[must_use]
pub fn us_to_ticks(us: u32) -> u32 {
    let ticks = (u64::from(us) * u64::from(TICKER_HZ)) / 1_000_000;
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

/// Sub-tick remainder of a microsecond duration, in the scheduler's
/// fixed-point remainder unit (us * TICKER_HZ mod 1e6).
#[must_use]
pub fn ticker_remainder(us: u32) -> u32 {
    let rem = (u64::from(us) * u64::from(TICKER_HZ)) % 1_000_000;
    u32::try_from(rem).unwrap_or(0)
}

/// On-air duration of a broadcast packet with the given payload length.
///
/// Accounts for preamble, access address, header, payload and CRC at the
/// PHY's symbol rate; the coded figure assumes S=8 for the payload portion.
#[must_use]
pub fn pdu_airtime_us(payload_len: u8, phy: Phy) -> u32 {
    let len = u32::from(payload_len);
    match phy {
        // (1 preamble + 4 AA + 2 header + len + 3 CRC) octets at 1 us/bit
        Phy::M1 => 80 + len * 8,
        // 2-octet preamble, 0.5 us/bit
        Phy::M2 => 44 + len * 4,
        // FEC1 (preamble + AA + CI + TERM1) then FEC2 at S=8
        Phy::Coded => 376 + (43 + len * 8) * 8,
    }
}

/// Worst-case on-air duration for slot reservation.
#[must_use]
pub fn pdu_airtime_max_us(phy: Phy) -> u32 {
    pdu_airtime_us(PDU_EXT_PAYLOAD_SIZE_MAX, phy)
}

/// Sleep-clock accuracy in ppm for a 3-bit SCA field value.
#[must_use]
pub fn sca_ppm(sca: u8) -> u16 {
    match sca & 0x07 {
        0 => 500,
        1 => 250,
        2 => 150,
        3 => 100,
        4 => 75,
        5 => 50,
        6 => 30,
        _ => 20,
    }
}

/// Number of periodic events constituting supervision loss.
///
/// Rounds the timeout up to whole intervals, never less than one event.
#[must_use]
pub fn supervision_reload(timeout_10ms: u16, interval_us: u32) -> u16 {
    if interval_us == 0 {
        return 1;
    }
    let timeout_us = u64::from(timeout_10ms) * u64::from(TIMEOUT_UNIT_US);
    let events = timeout_us.div_ceil(u64::from(interval_us));
    u16::try_from(events.max(1)).unwrap_or(u16::MAX)
}

/// Per-interval window widening from combined clock inaccuracy, rounded up.
#[must_use]
pub fn window_widening_periodic_us(local_ppm: u16, remote_ppm: u16, interval_us: u32) -> u32 {
    let ppm = u64::from(local_ppm) + u64::from(remote_ppm);
    let widening = (ppm * u64::from(interval_us)).div_ceil(1_000_000);
    u32::try_from(widening).unwrap_or(u32::MAX)
}

/// Ceiling on accumulated window widening: half the interval minus the
/// inter-frame spacing.
#[must_use]
pub fn window_widening_max_us(interval_us: u32) -> u32 {
    (interval_us / 2).saturating_sub(EVENT_IFS_US)
}

/// Split a measured reception instant into drift-plus/drift-minus tick
/// corrections against the expected instant.
#[must_use]
pub fn drift_ticks(actual_us: u32, expected_us: u32) -> (u32, u32) {
    if actual_us >= expected_us {
        (us_to_ticks(actual_us - expected_us), 0)
    } else {
        (0, us_to_ticks(expected_us - actual_us))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_to_ticks() {
        assert_eq!(us_to_ticks(0), 0);
        // One second is exactly the tick rate
        assert_eq!(us_to_ticks(1_000_000), TICKER_HZ);
        // 1250 us * 32768 / 1e6 = 40.96 -> 40
        assert_eq!(us_to_ticks(PER_INT_UNIT_US), 40);
    }

    #[test]
    fn test_ticker_remainder() {
        assert_eq!(ticker_remainder(1_000_000), 0);
        // 1250 * 32768 = 40_960_000 -> remainder 960_000
        assert_eq!(ticker_remainder(PER_INT_UNIT_US), 960_000);
    }

    #[test]
    fn test_supervision_reload_rounds_up() {
        // interval 62.5 ms, timeout 200 ms -> 3.2 events -> 4
        assert_eq!(supervision_reload(20, 50 * PER_INT_UNIT_US), 4);
        // exact multiple stays exact
        assert_eq!(supervision_reload(25, 50 * PER_INT_UNIT_US), 4);
        // timeout shorter than one interval clamps to 1
        assert_eq!(supervision_reload(1, 1_000_000), 1);
    }

    #[test]
    fn test_supervision_reload_zero_interval() {
        assert_eq!(supervision_reload(10, 0), 1);
    }

    #[test]
    fn test_window_widening() {
        // (50 + 500) ppm over 1 s = 550 us
        assert_eq!(window_widening_periodic_us(50, 500, 1_000_000), 550);
        // rounds up
        assert_eq!(window_widening_periodic_us(50, 50, 10_001), 2);
        assert_eq!(window_widening_max_us(100_000), 50_000 - EVENT_IFS_US);
    }

    #[test]
    fn test_sca_ppm_table() {
        assert_eq!(sca_ppm(0), 500);
        assert_eq!(sca_ppm(7), 20);
        // only low 3 bits considered
        assert_eq!(sca_ppm(0x0F), 20);
    }

    #[test]
    fn test_airtime_monotonic_in_len() {
        for phy in [Phy::M1, Phy::M2, Phy::Coded] {
            assert!(pdu_airtime_us(10, phy) < pdu_airtime_us(200, phy));
            assert_eq!(pdu_airtime_max_us(phy), pdu_airtime_us(255, phy));
        }
    }

    #[test]
    fn test_drift_ticks_split() {
        let (plus, minus) = drift_ticks(1200, 1000);
        assert!(plus > 0);
        assert_eq!(minus, 0);

        let (plus, minus) = drift_ticks(1000, 1200);
        assert_eq!(plus, 0);
        assert!(minus > 0);

        assert_eq!(drift_ticks(500, 500), (0, 0));
    }

    #[test]
    fn test_rx_ready_delay_per_phy() {
        assert_ne!(Phy::M1.rx_ready_delay_us(), Phy::M2.rx_ready_delay_us());
    }
}
