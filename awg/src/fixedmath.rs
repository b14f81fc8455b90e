//! Integer math primitives used by the synthesizer.
//!
//! All of the output shaping is plain integer arithmetic with explicitly
//! chosen rounding, not floating point: the same command sequence must
//! produce the same DAC codes on every build, and the tick path has to stay
//! cheap on cores with no FPU.

use crate::{HostFreq, HostScalar, OUTPUT_MAX, OUTPUT_MID};

/// Divide with round-half-up: the quotient rounds away from zero when the
/// remainder is at least half the divisor.
pub const fn round_div(n: u32, d: u32) -> u32 {
    (n + d / 2) / d
}

/// Signed round-half-up division.  Halves round toward positive infinity,
/// so `-25 / 10` rounds to `-2` and `25 / 10` rounds to `3`.
pub(crate) const fn round_div_signed(n: i32, d: i32) -> i32 {
    (n + d / 2).div_euclid(d)
}

/// Convert a host frequency word into the per-tick phase increment.
///
/// The increment counts tenths of a Hertz, so a 1 Hz word (`0x0100`)
/// converts to 10 and the conversion round-trips exactly at whole numbers
/// of tenths.
pub fn frequency_to_increment(freq: HostFreq) -> u16 {
    round_div(freq.to_bits() as u32 * 10, 256) as u16
}

/// Convert a host full-scale fraction into an integer percentage in
/// `[0, 100]`.
///
/// `0x7FFF` maps to 100 and `0x4000` rounds up to 50.  Words with the sign
/// bit set are not valid on the wire and saturate to zero.
pub fn scalar_to_percent(scalar: HostScalar) -> u8 {
    let bits = scalar.to_bits();
    if bits < 0 {
        0
    } else {
        round_div(bits as u32 * 100, 32_767) as u8
    }
}

/// Scale a raw waveform value toward the midline by an integer percentage.
///
/// The deviation from [OUTPUT_MID] is divided by 100 before the percentage
/// multiply, truncating toward zero.  The truncation order is load-bearing:
/// scaling at 100 % quantizes the deviation to a multiple of 100, and a
/// second scaling pass then reproduces the single-pass result exactly.
pub(crate) fn scale_about_mid(raw: i32, percent: u8) -> i32 {
    let mid = OUTPUT_MID as i32;
    if raw > mid {
        mid + (raw - mid) / 100 * percent as i32
    } else {
        mid - (mid - raw) / 100 * percent as i32
    }
}

/// Amplitude/offset post-processing applied to every synthesis mode: scale
/// the raw value around the midline, add the signed offset in widened
/// arithmetic, and clamp into the DAC's `[0, OUTPUT_MAX]` span.
pub fn postprocess(raw: i32, amplitude_percent: u8, offset: i16) -> u16 {
    let shifted = scale_about_mid(raw, amplitude_percent) + offset as i32;
    shifted.clamp(0, OUTPUT_MAX as i32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_conversion_fixed_points() {
        assert_eq!(frequency_to_increment(HostFreq::from_bits(0)), 0);
        //1.0 Hz round-trips exactly
        assert_eq!(frequency_to_increment(HostFreq::from_bits(256)), 10);
        //0.25 Hz is 2.5 tenths and rounds up
        assert_eq!(frequency_to_increment(HostFreq::from_bits(64)), 3);
        //full-range word
        assert_eq!(frequency_to_increment(HostFreq::from_bits(u16::MAX)), 2560);
    }

    #[test]
    fn scalar_conversion_fixed_points() {
        assert_eq!(scalar_to_percent(HostScalar::from_bits(0)), 0);
        assert_eq!(scalar_to_percent(HostScalar::from_bits(0x7FFF)), 100);
        //the halfway word rounds up
        assert_eq!(scalar_to_percent(HostScalar::from_bits(0x4000)), 50);
        //negative fractions are not valid on the wire
        assert_eq!(scalar_to_percent(HostScalar::from_bits(-1i16)), 0);
    }

    #[test]
    fn scalar_conversion_monotonic_and_bounded() {
        let mut last = 0u8;
        for bits in 0..=0x7FFFu16 {
            let pct = scalar_to_percent(HostScalar::from_bits(bits as i16));
            assert!(pct <= 100);
            assert!(pct >= last);
            last = pct;
        }
    }

    #[test]
    fn signed_rounding_halves_toward_positive() {
        assert_eq!(round_div_signed(25, 10), 3);
        assert_eq!(round_div_signed(-25, 10), -2);
        assert_eq!(round_div_signed(-26, 10), -3);
        assert_eq!(round_div_signed(24, 10), 2);
    }

    #[test]
    fn postprocess_midline_is_amplitude_invariant() {
        for pct in 0..=100 {
            assert_eq!(postprocess(OUTPUT_MID as i32, pct, 0), OUTPUT_MID);
        }
    }

    #[test]
    fn postprocess_truncates_before_scaling() {
        //a deviation under 100 counts collapses to the midline
        assert_eq!(postprocess(OUTPUT_MID as i32 + 99, 100, 0), OUTPUT_MID);
        assert_eq!(postprocess(OUTPUT_MID as i32 - 99, 100, 0), OUTPUT_MID);
        //and a full-scale value loses the sub-100 residue
        assert_eq!(postprocess(OUTPUT_MAX as i32, 100, 0), 65_467);
        assert_eq!(postprocess(0, 100, 0), 67);
    }

    #[test]
    fn postprocess_offset_clamps() {
        assert_eq!(postprocess(OUTPUT_MAX as i32, 100, 32_767), OUTPUT_MAX);
        assert_eq!(postprocess(0, 100, -32_767), 0);
        assert_eq!(postprocess(OUTPUT_MID as i32, 100, 100), OUTPUT_MID + 100);
        assert_eq!(postprocess(OUTPUT_MID as i32, 100, -100), OUTPUT_MID - 100);
    }

    #[test]
    fn postprocess_output_always_in_range() {
        for raw in (-40_000i32..140_000).step_by(997) {
            for pct in [0u8, 33, 100] {
                for off in [-32_767i16, -1, 0, 1, 32_767] {
                    let out = postprocess(raw, pct, off);
                    assert!(out <= OUTPUT_MAX);
                }
            }
        }
    }
}
