//! The uploaded arbitrary wave: a bounded sample buffer replayed at a
//! frequency-derived resample rate with linear interpolation.

use arrayvec::ArrayVec;

use crate::fixedmath::{round_div, round_div_signed};
use crate::{Error, MAX_ARBITRARY_SAMPLES, OUTPUT_MAX, OUTPUT_MID};

/// Sub-steps of the phase index between two stored samples.
const STEPS_PER_SAMPLE: u16 = 10;

/// Ticks per second of the sampling timer, used to derive the resample
/// rate from the phase increment.
const TICK_RATE: u32 = 100_000;

/// A user-uploaded waveform and its playback cursor parameters.
///
/// Samples are stored bias-encoded: the host uploads signed values and the
/// buffer keeps them shifted up by [OUTPUT_MID], the same encoding the
/// periodic tables use, so the amplitude/offset stage treats every mode
/// identically.  The phase index runs over `len * 10` positions per
/// period; positions between two stored samples interpolate linearly in
/// tenths.
#[derive(Clone, Debug, Default)]
pub struct ArbitraryWave {
    samples: ArrayVec<u16, MAX_ARBITRARY_SAMPLES>,
    index_adder: u16,
}

impl ArbitraryWave {
    /// An empty buffer
    pub fn new() -> Self {
        Default::default()
    }

    /// Number of uploaded samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if nothing has been uploaded
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The per-tick step of the phase index in this mode
    pub fn index_adder(&self) -> u16 {
        self.index_adder
    }

    /// The phase modulus for this buffer: ten sub-steps per stored sample
    pub fn modulus(&self) -> u16 {
        (self.samples.len() as u16) * STEPS_PER_SAMPLE
    }

    /// The bias-encoded sample cells, in upload order
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Append one signed host sample, bias-encoding it into DAC counts.
    /// Fails once the buffer holds its maximum sample count.
    pub fn push(&mut self, sample: i16) -> Result<(), Error> {
        let biased = (sample as i32 + OUTPUT_MID as i32).clamp(0, OUTPUT_MAX as i32) as u16;
        self.samples.try_push(biased).map_err(|_| Error::BufferFull)
    }

    /// Forget all uploaded samples
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Recompute the index adder for the given phase increment: the
    /// increment fixes how many timer ticks one output period spans, and
    /// the adder spreads the buffer's `len * 10` phase positions across
    /// them.  A zero increment would divide by zero, so it fails and the
    /// previous adder stays in effect.
    pub fn recompute_index_adder(&mut self, increment: u16) -> Result<(), Error> {
        if increment == 0 {
            return Err(Error::ZeroFrequency);
        }
        let ticks_per_cycle = round_div(TICK_RATE, increment as u32);
        self.index_adder =
            round_div(self.samples.len() as u32 * 100, ticks_per_cycle) as u16;
        Ok(())
    }

    /// The bias-encoded value at a phase position, or `None` while the
    /// buffer is empty.  Positions are taken modulo the period; those that
    /// land between two stored samples interpolate linearly, rounding
    /// halves up, and the cell after the last sample wraps to the start of
    /// the next period.
    pub fn sample_at(&self, phase: u16) -> Option<u16> {
        if self.samples.is_empty() {
            return None;
        }
        let phase = phase % self.modulus();
        let cell = (phase / STEPS_PER_SAMPLE) as usize;
        let fraction = (phase % STEPS_PER_SAMPLE) as i32;
        let lo = self.samples[cell] as i32;
        if fraction == 0 {
            return Some(lo as u16);
        }
        let hi = self.samples[(cell + 1) % self.samples.len()] as i32;
        let interpolated =
            lo + round_div_signed((hi - lo) * fraction, STEPS_PER_SAMPLE as i32);
        Some(interpolated as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploaded(samples: &[i16]) -> ArbitraryWave {
        let mut arb = ArbitraryWave::new();
        for &s in samples {
            arb.push(s).unwrap();
        }
        arb
    }

    #[test]
    fn bias_encoding() {
        let arb = uploaded(&[0, 32_767, -32_767, -32_768]);
        assert_eq!(arb.samples(), &[32_767, 65_534, 0, 0]);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut arb = ArbitraryWave::new();
        for _ in 0..MAX_ARBITRARY_SAMPLES {
            arb.push(0).unwrap();
        }
        assert_eq!(arb.push(0), Err(Error::BufferFull));
        assert_eq!(arb.len(), MAX_ARBITRARY_SAMPLES);
    }

    #[test]
    fn exact_positions_return_stored_cells() {
        let arb = uploaded(&[-100, 0, 100]);
        assert_eq!(arb.modulus(), 30);
        assert_eq!(arb.sample_at(0), Some(32_667));
        assert_eq!(arb.sample_at(10), Some(32_767));
        assert_eq!(arb.sample_at(20), Some(32_867));
    }

    #[test]
    fn midpoint_interpolation() {
        //full-scale two-sample ramp: position 5 sits exactly between
        let arb = uploaded(&[-32_767, 32_767]);
        let mid = arb.sample_at(5).unwrap();
        assert!((mid as i32 - OUTPUT_MID as i32).abs() <= 1);
    }

    #[test]
    fn interpolation_is_linear_in_tenths() {
        let arb = uploaded(&[0, 10]);
        //cells are 32767 and 32777; each tenth adds one count
        for frac in 0..10u16 {
            assert_eq!(arb.sample_at(frac), Some(32_767 + frac));
        }
    }

    #[test]
    fn falling_segments_round_halves_up() {
        let arb = uploaded(&[10, 0]);
        //delta is -10 per cell, so position 5 is 32772 exactly
        assert_eq!(arb.sample_at(5), Some(32_772));
        let arb = uploaded(&[5, 0]);
        //position 5 is 32769.5 and the half rounds up
        assert_eq!(arb.sample_at(5), Some(32_770));
    }

    #[test]
    fn tail_interpolates_toward_period_start() {
        let arb = uploaded(&[0, 1_000]);
        //past the last sample the upper neighbor is cell zero again
        let v = arb.sample_at(15).unwrap();
        let lo = 32_767 + 1_000;
        let hi = 32_767;
        assert_eq!(v as i32, lo + round_div_signed((hi - lo) * 5, 10));
    }

    #[test]
    fn stale_phase_positions_wrap_instead_of_panicking() {
        //a failed adder recompute can leave a cursor from a larger modulus
        let arb = uploaded(&[0, 100]);
        assert_eq!(arb.sample_at(20), arb.sample_at(0));
        assert_eq!(arb.sample_at(9_999), arb.sample_at(9_999 % 20));
    }

    #[test]
    fn adder_recompute() {
        let mut arb = uploaded(&[0, 0]);
        //250 Hz: 2500 tenths -> 40 ticks per cycle -> adder 5
        arb.recompute_index_adder(2_500).unwrap();
        assert_eq!(arb.index_adder(), 5);
        //1 Hz: 10000 ticks per cycle; 200/10000 rounds to 0
        arb.recompute_index_adder(10).unwrap();
        assert_eq!(arb.index_adder(), 0);
    }

    #[test]
    fn zero_increment_keeps_previous_adder() {
        let mut arb = uploaded(&[0, 0]);
        arb.recompute_index_adder(2_500).unwrap();
        assert_eq!(arb.recompute_index_adder(0), Err(Error::ZeroFrequency));
        assert_eq!(arb.index_adder(), 5);
    }
}
