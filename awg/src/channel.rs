//! Per-channel state and the per-tick synthesis dispatch.

use serde::{Deserialize, Serialize};

use crate::arbitrary::ArbitraryWave;
use crate::harmonic::HarmonicSet;
use crate::noise::{self, EntropySource};
use crate::{fixedmath, tables, Error, OUTPUT_MID, TABLE_LEN};

/// The waveform a channel synthesizes.
///
/// The discriminants are the wire protocol's waveform codes.  The protocol
/// only defines codes for the four periodic shapes and the arbitrary wave;
/// noise has no wire code and is reachable through the typed
/// [setter](crate::Awg::set_waveform) only.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Waveform {
    /// Sine wave is the power-on default
    #[default]
    Sine = 0,
    /// Square wave
    Square = 1,
    /// Triangle wave
    Triangle = 2,
    /// Sawtooth wave
    Sawtooth = 3,
    /// Centered pseudo-random noise
    Noise = 4,
    /// User-uploaded arbitrary wave (or its harmonic composite)
    Arbitrary = 5,
}

impl Waveform {
    /// Decode a wire protocol waveform code.  Returns `None` for codes the
    /// protocol does not define, including the unassigned code 4.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Sine),
            1 => Some(Self::Square),
            2 => Some(Self::Triangle),
            3 => Some(Self::Sawtooth),
            5 => Some(Self::Arbitrary),
            _ => None,
        }
    }
    /// The wire code of this waveform
    pub const fn code(&self) -> u8 {
        *self as u8
    }
    /// Name of the waveform, for logs and host UIs
    pub const fn to_str(&self) -> &'static str {
        ["Sine", "Square", "Triangle", "Sawtooth", "Noise", "Arbitrary"][*self as usize]
    }
}

impl core::fmt::Display for Waveform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.to_str())
    }
}

impl TryFrom<u8> for Waveform {
    type Error = Error;
    fn try_from(value: u8) -> Result<Self, Error> {
        Self::from_code(value).ok_or(Error::InvalidWaveform)
    }
}

/// State for one output channel.
///
/// A channel is created once at power-on and lives for the life of the
/// process; commands mutate it and the timer tick reads it.  The phase
/// index is a cursor into the active period (the 10 000-entry tables for
/// periodic and harmonic synthesis, ten sub-steps per stored sample for
/// arbitrary playback) and stays strictly below the active modulus.
#[derive(Clone, Debug)]
pub struct Channel {
    waveform: Waveform,
    phase: u16,
    increment: u16,
    amplitude: u8,
    offset: i16,
    active: bool,
    harmonic_mode: bool,
    harmonics: HarmonicSet,
    arb: ArbitraryWave,
}

/// One LSB of the host frequency word is 1/256 Hz; the power-on default of
/// 1 Hz therefore corresponds to a phase increment of 10.
const DEFAULT_INCREMENT: u16 = 10;

impl Default for Channel {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            phase: 0,
            increment: DEFAULT_INCREMENT,
            amplitude: 100,
            offset: 0,
            active: false,
            harmonic_mode: false,
            harmonics: HarmonicSet::default(),
            arb: ArbitraryWave::default(),
        }
    }
}

impl Channel {
    /// A channel in its power-on state: 1 Hz sine at full amplitude, zero
    /// offset, inactive.
    pub fn new() -> Self {
        Default::default()
    }

    /// The selected waveform
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }
    /// Current phase index
    pub fn phase_index(&self) -> u16 {
        self.phase
    }
    /// Per-tick phase increment, in tenths of a Hertz
    pub fn phase_increment(&self) -> u16 {
        self.increment
    }
    /// Amplitude scaling percentage in `[0, 100]`
    pub fn amplitude_percent(&self) -> u8 {
        self.amplitude
    }
    /// Signed output offset, in DAC counts
    pub fn offset(&self) -> i16 {
        self.offset
    }
    /// Whether the caller should forward this channel's samples to the DAC.
    /// An inactive channel keeps synthesizing (and keeps its phase moving);
    /// the flag only gates forwarding.
    pub fn is_active(&self) -> bool {
        self.active
    }
    /// Whether arbitrary mode plays the harmonic composite instead of the
    /// uploaded buffer
    pub fn harmonic_mode(&self) -> bool {
        self.harmonic_mode
    }
    /// The harmonic parameter set
    pub fn harmonics(&self) -> &HarmonicSet {
        &self.harmonics
    }
    /// The uploaded arbitrary wave
    pub fn arbitrary(&self) -> &ArbitraryWave {
        &self.arb
    }

    /// Select the waveform.  Entering arbitrary mode recomputes the index
    /// adder for the current frequency and restarts the wave.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        if waveform == Waveform::Arbitrary {
            self.refresh_arbitrary();
        }
    }

    /// Store a new phase increment.  In arbitrary mode this also
    /// recomputes the index adder, since the resample rate depends on the
    /// output frequency.
    pub fn set_phase_increment(&mut self, increment: u16) {
        self.increment = increment;
        if self.waveform == Waveform::Arbitrary {
            self.refresh_arbitrary();
        }
    }

    /// Set the amplitude percentage, saturating at 100
    pub fn set_amplitude_percent(&mut self, percent: u8) {
        self.amplitude = percent.min(100);
    }

    /// Set the signed output offset
    pub fn set_offset(&mut self, offset: i16) {
        self.offset = offset;
    }

    /// Set the forwarding flag
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Switch arbitrary mode between buffer playback and harmonic
    /// synthesis.  The phase restarts so the cursor is valid for the new
    /// modulus.
    pub fn set_harmonic_mode(&mut self, enabled: bool) {
        self.harmonic_mode = enabled;
        self.phase = 0;
    }

    /// Set one harmonic's amplitude percentage
    pub fn set_harmonic_amplitude(&mut self, index: usize, percent: u8) -> Result<(), Error> {
        self.harmonics.set_amplitude(index, percent)
    }

    /// Set one harmonic's phase offset, in table steps
    pub fn set_harmonic_phase(&mut self, index: usize, offset: u16) -> Result<(), Error> {
        self.harmonics.set_phase(index, offset)
    }

    /// Append one signed host sample to the arbitrary buffer.  On success
    /// the buffer is immediately playable: the index adder is recomputed
    /// for the new length and the wave restarts.
    pub fn append_arbitrary(&mut self, sample: i16) -> Result<(), Error> {
        self.arb.push(sample)?;
        self.refresh_arbitrary();
        Ok(())
    }

    /// Drop all uploaded arbitrary samples
    pub fn reset_arbitrary(&mut self) {
        self.arb.clear();
        self.phase = 0;
    }

    // Recompute the arbitrary index adder from the current increment and
    // buffer length, restarting the wave.  A zero increment keeps the
    // previous adder and phase.
    fn refresh_arbitrary(&mut self) {
        match self.arb.recompute_index_adder(self.increment) {
            Ok(()) => self.phase = 0,
            Err(_) => log::warn!("index adder unchanged: zero frequency increment"),
        }
    }

    /// Synthesize the next output sample and advance the phase.  The
    /// result is already amplitude/offset processed and clamped into
    /// `[0, OUTPUT_MAX]`.
    pub fn next_sample(&mut self, entropy: &mut dyn EntropySource) -> u16 {
        let raw = self.next_raw(entropy);
        fixedmath::postprocess(raw, self.amplitude, self.offset)
    }

    fn next_raw(&mut self, entropy: &mut dyn EntropySource) -> i32 {
        match self.waveform {
            Waveform::Sine => self.next_periodic(&tables::SINE),
            Waveform::Square => self.next_periodic(&tables::SQUARE),
            Waveform::Triangle => self.next_periodic(&tables::TRIANGLE),
            Waveform::Sawtooth => self.next_periodic(&tables::SAWTOOTH),
            Waveform::Noise => noise::centered_noise(entropy),
            Waveform::Arbitrary if self.harmonic_mode => {
                let sum = self.harmonics.composite(self.phase);
                // the composite runs against the sine table, so the phase
                // moves on the periodic modulus here
                self.advance(TABLE_LEN as u16, self.increment);
                sum
            }
            Waveform::Arbitrary => match self.arb.sample_at(self.phase) {
                Some(raw) => {
                    self.advance(self.arb.modulus(), self.arb.index_adder());
                    raw as i32
                }
                // nothing uploaded yet: hold the midline
                None => OUTPUT_MID as i32,
            },
        }
    }

    fn next_periodic(&mut self, table: &'static [u16; TABLE_LEN]) -> i32 {
        let raw = table[self.phase as usize] as i32;
        self.advance(TABLE_LEN as u16, self.increment);
        raw
    }

    fn advance(&mut self, modulus: u16, step: u16) {
        self.phase = (self.phase + step) % modulus;
    }
}

/// A host-persistable snapshot of a channel's configuration.
///
/// The arbitrary sample buffer is deliberately not part of the snapshot;
/// the host re-uploads wave data through the append command, the same way
/// it delivered it in the first place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Selected waveform
    pub waveform: Waveform,
    /// Per-tick phase increment
    pub phase_increment: u16,
    /// Amplitude percentage
    pub amplitude_percent: u8,
    /// Signed output offset
    pub offset: i16,
    /// Forwarding flag
    pub active: bool,
    /// Harmonic/buffer switch for arbitrary mode
    pub harmonic_mode: bool,
    /// Harmonic parameter set
    pub harmonics: HarmonicSet,
}

impl From<&Channel> for ChannelConfig {
    fn from(ch: &Channel) -> Self {
        Self {
            waveform: ch.waveform,
            phase_increment: ch.increment,
            amplitude_percent: ch.amplitude,
            offset: ch.offset,
            active: ch.active,
            harmonic_mode: ch.harmonic_mode,
            harmonics: ch.harmonics.clone(),
        }
    }
}

impl Channel {
    /// Restore a configuration snapshot.  The wave restarts from phase
    /// zero; in arbitrary mode the index adder is recomputed for the
    /// restored frequency (with the usual zero-frequency guard).
    pub fn apply_config(&mut self, config: &ChannelConfig) {
        self.waveform = config.waveform;
        self.increment = config.phase_increment;
        self.amplitude = config.amplitude_percent.min(100);
        self.offset = config.offset;
        self.active = config.active;
        self.harmonic_mode = config.harmonic_mode;
        self.harmonics = config.harmonics.clone();
        self.phase = 0;
        if self.waveform == Waveform::Arbitrary {
            self.refresh_arbitrary();
        }
    }
}
