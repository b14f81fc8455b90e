//! Harmonic composite synthesis: up to five weighted, phase-shifted
//! multiples of the fundamental, summed into one raw value.

use serde::{Deserialize, Serialize};

use crate::fixedmath::scale_about_mid;
use crate::{tables, Error, MAX_HARMONICS, OUTPUT_MID, TABLE_LEN};

/// Weight and phase shift for one harmonic.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Harmonic {
    /// Scaling percentage applied to this harmonic around the midline
    pub amplitude_percent: u8,
    /// Phase shift in sine-table steps (1/10000 of a period)
    pub phase_offset: u16,
}

/// The harmonic parameters of one channel.
///
/// The set keeps a fixed array of five entries plus an active count.  The
/// count is derived from the protocol's writes: setting harmonic `i` makes
/// `i + 1` harmonics active, so writing a lower index after a higher one
/// shrinks the active set while the tail entries keep their old values.
/// That mirrors the wire protocol's observable behavior; hosts that want
/// all harmonics active must write the highest index last.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarmonicSet {
    entries: [Harmonic; MAX_HARMONICS],
    count: u8,
}

impl HarmonicSet {
    /// An empty set
    pub fn new() -> Self {
        Default::default()
    }

    /// Number of active harmonics
    pub fn count(&self) -> usize {
        self.count as usize
    }

    /// The active harmonics, fundamental first
    pub fn active(&self) -> &[Harmonic] {
        &self.entries[..self.count as usize]
    }

    /// Set one harmonic's amplitude percentage.  The active count becomes
    /// `index + 1`.
    pub fn set_amplitude(&mut self, index: usize, percent: u8) -> Result<(), Error> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(Error::InvalidHarmonicIndex)?;
        entry.amplitude_percent = percent.min(100);
        self.count = (index + 1) as u8;
        Ok(())
    }

    /// Set one harmonic's phase offset in table steps.  The active count
    /// becomes `index + 1`.
    pub fn set_phase(&mut self, index: usize, offset: u16) -> Result<(), Error> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(Error::InvalidHarmonicIndex)?;
        entry.phase_offset = offset;
        self.count = (index + 1) as u8;
        Ok(())
    }

    /// Compose the raw value for one phase position.
    ///
    /// Harmonic `i` reads the sine table at `i + 1` times the phase plus
    /// its own shift, scaled around the midline by its amplitude.  The
    /// fundamental contributes its full scaled value and every further
    /// harmonic adds its signed deviation from the midline, so a lone
    /// fundamental at 100 % reduces to the plain sine lookup.  With no
    /// harmonics active the composite rests on the midline.
    pub fn composite(&self, phase: u16) -> i32 {
        let mut sum = OUTPUT_MID as i32;
        for (i, h) in self.active().iter().enumerate() {
            let index =
                (phase as u32 * (i as u32 + 1) + h.phase_offset as u32) % TABLE_LEN as u32;
            let scaled = scale_about_mid(
                tables::SINE[index as usize] as i32,
                h.amplitude_percent,
            );
            if i == 0 {
                sum = scaled;
            } else {
                sum += scaled - OUTPUT_MID as i32;
            }
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_fundamental_at_full_amplitude_is_plain_sine() {
        let mut set = HarmonicSet::new();
        set.set_amplitude(0, 100).unwrap();
        for phase in [0u16, 1, 1_234, 2_500, 7_500, 9_999] {
            let composite = set.composite(phase);
            let plain = scale_about_mid(tables::SINE[phase as usize] as i32, 100);
            assert_eq!(composite, plain);
        }
    }

    #[test]
    fn phase_offset_shifts_the_lookup() {
        let mut set = HarmonicSet::new();
        set.set_amplitude(0, 100).unwrap();
        set.set_phase(0, 2_500).unwrap();
        assert_eq!(
            set.composite(0),
            scale_about_mid(tables::SINE[2_500] as i32, 100)
        );
        //offsets wrap at the table length
        set.set_phase(0, 12_500).unwrap();
        assert_eq!(
            set.composite(0),
            scale_about_mid(tables::SINE[2_500] as i32, 100)
        );
    }

    #[test]
    fn overtones_run_at_integer_multiples() {
        let mut set = HarmonicSet::new();
        set.set_amplitude(0, 0).unwrap();
        set.set_amplitude(1, 100).unwrap();
        let phase = 600u16;
        //a silent fundamental pins the midline; the second harmonic reads
        //the table at twice the phase
        let expected = OUTPUT_MID as i32
            + (scale_about_mid(tables::SINE[1_200] as i32, 100) - OUTPUT_MID as i32);
        assert_eq!(set.composite(phase), expected);
    }

    #[test]
    fn count_follows_last_written_index() {
        let mut set = HarmonicSet::new();
        set.set_amplitude(3, 40).unwrap();
        assert_eq!(set.count(), 4);
        //writing a lower index shrinks the active set
        set.set_amplitude(0, 100).unwrap();
        assert_eq!(set.count(), 1);
        //but the tail keeps its data and comes back with a high write
        set.set_phase(3, 0).unwrap();
        assert_eq!(set.count(), 4);
        assert_eq!(set.active()[3].amplitude_percent, 40);
    }

    #[test]
    fn index_past_the_last_harmonic_is_rejected() {
        let mut set = HarmonicSet::new();
        assert_eq!(
            set.set_amplitude(MAX_HARMONICS, 100),
            Err(Error::InvalidHarmonicIndex)
        );
        assert_eq!(set.set_phase(17, 0), Err(Error::InvalidHarmonicIndex));
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn empty_set_rests_on_the_midline() {
        assert_eq!(HarmonicSet::new().composite(4_321), OUTPUT_MID as i32);
    }
}
