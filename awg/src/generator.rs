//! The two-channel generator: command entry points and the tick path.

use crate::channel::{Channel, ChannelConfig, Waveform};
use crate::fixedmath::{frequency_to_increment, scalar_to_percent};
use crate::noise::EntropySource;
use crate::{Error, HostFreq, HostScalar, NUM_CHANNELS};

/// The waveform generator: one [Channel] per output.
///
/// The protocol handler owns (or borrows) this and applies configuration
/// commands; the timer tick calls [next_sample](Awg::next_sample) or
/// [frame](Awg::frame) and forwards the result to the DAC.  Every entry
/// point validates the channel number and reports
/// [Error::InvalidChannel] without side effects when it is out of range.
///
/// Commands that carry 16 bit quantities take them as the protocol's two
/// little-endian parameter bytes.
#[derive(Clone, Debug, Default)]
pub struct Awg {
    channels: [Channel; NUM_CHANNELS],
}

impl Awg {
    /// A generator with both channels in their power-on state
    pub fn new() -> Self {
        Default::default()
    }

    fn channel_mut(&mut self, channel: usize) -> Result<&mut Channel, Error> {
        self.channels.get_mut(channel).ok_or(Error::InvalidChannel)
    }

    /// Borrow one channel's state
    pub fn channel(&self, channel: usize) -> Result<&Channel, Error> {
        self.channels.get(channel).ok_or(Error::InvalidChannel)
    }

    /// Select a channel's waveform by wire code.  Codes without a defined
    /// waveform (including 4) are rejected and the channel is untouched.
    pub fn set_waveform_code(&mut self, channel: usize, code: u8) -> Result<(), Error> {
        //validate the channel before the code so a bad channel never
        //reports a code error
        self.channel_mut(channel)?;
        let waveform = Waveform::try_from(code).map_err(|e| {
            log::warn!("ch{}: rejected waveform code {}", channel, code);
            e
        })?;
        self.set_waveform(channel, waveform)
    }

    /// Select a channel's waveform.  This typed path also reaches
    /// [Waveform::Noise], which has no wire code.
    pub fn set_waveform(&mut self, channel: usize, waveform: Waveform) -> Result<(), Error> {
        self.channel_mut(channel)?.set_waveform(waveform);
        log::debug!("ch{}: waveform {}", channel, waveform);
        Ok(())
    }

    /// Set a channel's output frequency from the protocol's Q8.8 word.
    /// In arbitrary mode the resample adder follows the new frequency; a
    /// zero frequency keeps the previous adder in place.
    pub fn set_frequency(&mut self, channel: usize, low: u8, high: u8) -> Result<(), Error> {
        let word = HostFreq::from_bits(u16::from_le_bytes([low, high]));
        let increment = frequency_to_increment(word);
        self.channel_mut(channel)?.set_phase_increment(increment);
        log::debug!("ch{}: phase increment {}", channel, increment);
        Ok(())
    }

    /// Set a channel's amplitude from the protocol's Q0.15 full-scale
    /// fraction
    pub fn set_amplitude(&mut self, channel: usize, low: u8, high: u8) -> Result<(), Error> {
        let word = HostScalar::from_bits(i16::from_le_bytes([low, high]));
        self.channel_mut(channel)?
            .set_amplitude_percent(scalar_to_percent(word));
        Ok(())
    }

    /// Set a channel's offset.  The word is taken as a signed count of DAC
    /// steps and stored as-is.
    pub fn set_offset(&mut self, channel: usize, low: u8, high: u8) -> Result<(), Error> {
        self.channel_mut(channel)?
            .set_offset(i16::from_le_bytes([low, high]));
        Ok(())
    }

    /// Append one signed sample to a channel's arbitrary buffer
    pub fn append_arbitrary(&mut self, channel: usize, sample: i16) -> Result<(), Error> {
        self.channel_mut(channel)?.append_arbitrary(sample)
    }

    /// Drop a channel's uploaded arbitrary samples
    pub fn reset_arbitrary(&mut self, channel: usize) -> Result<(), Error> {
        self.channel_mut(channel)?.reset_arbitrary();
        Ok(())
    }

    /// Set one harmonic's amplitude from a Q0.15 full-scale fraction.
    /// Writing harmonic `index` makes `index + 1` harmonics active.
    pub fn set_harmonic_amplitude(
        &mut self,
        channel: usize,
        index: usize,
        word: u16,
    ) -> Result<(), Error> {
        let percent = scalar_to_percent(HostScalar::from_bits(word as i16));
        self.channel_mut(channel)?.set_harmonic_amplitude(index, percent)
    }

    /// Set one harmonic's phase offset in sine-table steps.  Writing
    /// harmonic `index` makes `index + 1` harmonics active.
    pub fn set_harmonic_phase(
        &mut self,
        channel: usize,
        index: usize,
        offset: u16,
    ) -> Result<(), Error> {
        self.channel_mut(channel)?.set_harmonic_phase(index, offset)
    }

    /// Switch a channel's arbitrary mode between buffer playback and
    /// harmonic synthesis
    pub fn set_harmonic_mode(&mut self, channel: usize, enabled: bool) -> Result<(), Error> {
        self.channel_mut(channel)?.set_harmonic_mode(enabled);
        Ok(())
    }

    /// Set a channel's forwarding flag
    pub fn set_active(&mut self, channel: usize, enabled: bool) -> Result<(), Error> {
        self.channel_mut(channel)?.set_active(enabled);
        Ok(())
    }

    /// Set both channels' forwarding flags at once
    pub fn set_all_active(&mut self, enabled: bool) {
        for ch in self.channels.iter_mut() {
            ch.set_active(enabled);
        }
    }

    /// Snapshot a channel's configuration for host-side persistence
    pub fn config(&self, channel: usize) -> Result<ChannelConfig, Error> {
        Ok(ChannelConfig::from(self.channel(channel)?))
    }

    /// Restore a channel configuration snapshot
    pub fn apply_config(&mut self, channel: usize, config: &ChannelConfig) -> Result<(), Error> {
        self.channel_mut(channel)?.apply_config(config);
        Ok(())
    }

    /// Produce the next sample for one channel, advancing its phase.  The
    /// result is clamped into the DAC span; whether to forward it is the
    /// caller's decision (see [Channel::is_active]).
    pub fn next_sample(
        &mut self,
        channel: usize,
        entropy: &mut dyn EntropySource,
    ) -> Result<u16, Error> {
        Ok(self.channel_mut(channel)?.next_sample(entropy))
    }

    /// Produce one tick's samples for both channels.  Every channel
    /// advances; inactive channels come back as `None` so the caller can
    /// forward `Some` values to the DAC directly.
    pub fn frame(&mut self, entropy: &mut dyn EntropySource) -> [Option<u16>; NUM_CHANNELS] {
        let mut out = [None; NUM_CHANNELS];
        for (ch, slot) in self.channels.iter_mut().zip(out.iter_mut()) {
            let sample = ch.next_sample(entropy);
            if ch.is_active() {
                *slot = Some(sample);
            }
        }
        out
    }
}
