//! Sample-synthesis core for a two-channel arbitrary waveform generator.
//!
//! A host configures each output channel over a byte-oriented command
//! protocol (waveform selection, frequency, amplitude, offset, arbitrary
//! sample uploads, harmonic parameters) and an external timer asks for one
//! output sample per channel per tick, which the caller forwards to the
//! DAC.  Everything in this crate is integer arithmetic: waveform values
//! are unsigned 16 bit DAC codes biased around [OUTPUT_MID], and every
//! scaling step has an explicit rounding rule, so the produced stream is
//! bit-exact across targets.
//!
//! The crate is `no_std` and performs no allocation, no blocking, and no
//! locking.  Both the tick path and the command path take `&mut self`, so
//! the borrow checker guarantees a configuration write can never tear a
//! sample mid-production; on an embedded target, wrap the [Awg] in
//! whatever interrupt-safe mutex the platform provides and call
//! [Awg::frame] from the timer handler.
//!
//! Hardware collaborators stay outside the crate: the serial protocol
//! parser delivers command bytes, the DAC sink consumes the returned
//! samples, and the entropy block feeding noise mode sits behind the
//! [EntropySource] trait (with [SoftEntropy] as a software stand-in).

#![no_std]
#![warn(missing_docs)]

pub mod fixedmath;
pub mod tables;

mod arbitrary;
mod channel;
mod generator;
mod harmonic;
mod noise;

pub use arbitrary::ArbitraryWave;
pub use channel::{Channel, ChannelConfig, Waveform};
pub use generator::Awg;
pub use harmonic::{Harmonic, HarmonicSet};
pub use noise::{EntropySource, SoftEntropy};

/// Frequency as received from the host protocol: an unsigned Q8.8 count of
/// Hertz, so one LSB is 1/256 Hz and `0x0100` is exactly 1 Hz.  The full
/// 16 bit range is accepted.
pub type HostFreq = fixed::types::U8F8;

/// Amplitude (and, on earlier firmware generations, offset) as received
/// from the host: a signed Q0.15 fraction of full scale.  Only the
/// non-negative half of the range is meaningful on the wire; `0x7FFF` maps
/// to 100 %.
pub type HostScalar = fixed::types::I1F15;

/// Entries in one full period of each periodic waveform table.
pub const TABLE_LEN: usize = 10_000;

/// Capacity of the per-channel arbitrary-wave sample buffer.
pub const MAX_ARBITRARY_SAMPLES: usize = 1_000;

/// Number of harmonics the composite synthesizer will stack.
pub const MAX_HARMONICS: usize = 5;

/// Number of output channels.
pub const NUM_CHANNELS: usize = 2;

/// Highest DAC code the synthesizer will emit.
pub const OUTPUT_MAX: u16 = 65_534;

/// DAC code of the waveform midline ("zero volts" at the output stage).
pub const OUTPUT_MID: u16 = 32_767;

/// Failures reported by the command and sample entry points.
///
/// Every operation on [Awg] validates its channel number first and reports
/// [Error::InvalidChannel] without side effects when it is out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The channel number is not one of the device's output channels.
    InvalidChannel,
    /// The waveform code is not one the wire protocol defines.
    InvalidWaveform,
    /// The harmonic index is past the last supported harmonic.
    InvalidHarmonicIndex,
    /// The arbitrary-wave buffer already holds its maximum sample count.
    BufferFull,
    /// An index-adder recompute was requested with a zero frequency
    /// increment; the previous adder is left in place.
    ZeroFrequency,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::InvalidChannel => "channel number out of range",
            Self::InvalidWaveform => "unrecognized waveform code",
            Self::InvalidHarmonicIndex => "harmonic index out of range",
            Self::BufferFull => "arbitrary wave buffer full",
            Self::ZeroFrequency => "zero frequency increment",
        })
    }
}
