use std::time::Duration;

use bigdecimal::{BigDecimal, FromPrimitive, One};

/*
    Pure numeric helpers: note/velocity resolution for the performance engine
    and beat arithmetic for the history exports.
*/

/// Apply a signed semitone interval to the anchor, saturating at the MIDI range.
pub fn resolve_note(anchor: u8, interval: i32) -> u8 {
    (anchor as i32 + interval).clamp(0, 127) as u8
}

/// Scale a base velocity by the global multiplier percentage.
pub fn scale_velocity(base: u8, multiplier_percent: u16) -> u8 {
    let scaled = (base as u32 * multiplier_percent as u32 + 50) / 100;
    scaled.clamp(1, 127) as u8
}

/// Map a 7-bit controller value into [min, max], snapped to the parameter's step.
pub fn scale_cc_value(value: u8, min: f32, max: f32, step: f32) -> f32 {
    let scaled = min + (value as f32 / 127.0) * (max - min);
    let snapped = if step > 0.0 {
        (scaled / step).round() * step
    } else {
        scaled
    };
    snapped.clamp(min.min(max), max.max(min))
}

// Round <source> to the nearest multiple of <fraction>, e.g. <0.73, 0.25> => <0.75>
pub fn round_to_nearest(source: BigDecimal, fraction: BigDecimal) -> BigDecimal {
    let multiplier = BigDecimal::one() / fraction.clone();
    let full_times = (source * multiplier).round(0);
    fraction * full_times
}

pub fn duration_to_beats(duration: Duration, bpm: i64) -> BigDecimal {
    // E.g. 60 / 120 = 2 beats per second
    let beats_per_second =
        BigDecimal::from_i64(60).unwrap() / BigDecimal::from_i64(bpm.max(1)).unwrap();
    let seconds_elapsed = BigDecimal::from_u128(duration.as_nanos()).unwrap()
        / BigDecimal::from_u64(1_000_000_000).unwrap();
    seconds_elapsed / beats_per_second
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn resolve_stays_in_midi_range() {
        assert_eq!(resolve_note(60, -4), 56);
        assert_eq!(resolve_note(60, 0), 60);
        assert_eq!(resolve_note(2, -12), 0);
        assert_eq!(resolve_note(120, 12), 127);

        for anchor in 0..=127u8 {
            for interval in [-127i32, -13, -1, 0, 1, 13, 127] {
                let resolved = resolve_note(anchor, interval);
                assert!(resolved <= 127);
                assert_eq!(resolved as i32, (anchor as i32 + interval).clamp(0, 127));
            }
        }
    }

    #[test]
    fn velocity_scaling_clamps() {
        assert_eq!(scale_velocity(100, 100), 100);
        assert_eq!(scale_velocity(100, 150), 127);
        assert_eq!(scale_velocity(100, 50), 50);
        assert_eq!(scale_velocity(1, 1), 1);

        for base in 1..=127u8 {
            for multiplier in [1u16, 50, 100, 200] {
                let vel = scale_velocity(base, multiplier);
                assert!((1..=127).contains(&vel));
            }
        }
    }

    #[test]
    fn velocity_scaling_rounds_to_nearest() {
        // 33 * 105 / 100 = 34.65 -> 35
        assert_eq!(scale_velocity(33, 105), 35);
        // 33 * 101 / 100 = 33.33 -> 33
        assert_eq!(scale_velocity(33, 101), 33);
    }

    #[test]
    fn cc_scaling_snaps_to_step() {
        // The classic cutoff case: [20, 20000] with step 10
        assert_eq!(scale_cc_value(64, 20.0, 20000.0, 10.0), 10090.0);
        assert_eq!(scale_cc_value(0, 20.0, 20000.0, 10.0), 20.0);
        assert_eq!(scale_cc_value(127, 20.0, 20000.0, 10.0), 20000.0);

        // Unit range, no step
        let mid = scale_cc_value(64, 0.0, 1.0, 0.0);
        assert!((mid - 0.5039).abs() < 0.001);
    }

    #[test]
    fn beat_rounding() {
        assert_eq!(
            round_to_nearest(
                BigDecimal::from_str("0.23").unwrap(),
                BigDecimal::from_str("0.25").unwrap(),
            ),
            BigDecimal::from_str("0.25").unwrap()
        );

        assert_eq!(
            round_to_nearest(
                BigDecimal::from_str("0.76").unwrap(),
                BigDecimal::from_str("0.25").unwrap(),
            ),
            BigDecimal::from_str("0.75").unwrap()
        );
    }

    #[test]
    fn beats_from_duration() {
        // At 120 bpm a half second is exactly one beat
        let beats = duration_to_beats(Duration::from_millis(500), 120);
        assert_eq!(beats, BigDecimal::from_str("1").unwrap());
    }
}
