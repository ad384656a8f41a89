//! Single-character peer commands
//!
//! Each inbound byte is one command. There is no framing or escaping; a
//! chunk read from the transport is parsed byte by byte and every byte is
//! actionable on its own.

use crate::limits::MAX_WINDOW_EXPONENT;
use std::fmt;

/// Output cadence menu selectable by the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleRate {
    Hz100,
    Hz50,
    Hz25,
    Hz20,
    Hz10,
}

impl SampleRate {
    /// All selectable rates, in command-letter order
    pub const ALL: [SampleRate; 5] = [
        SampleRate::Hz100,
        SampleRate::Hz50,
        SampleRate::Hz25,
        SampleRate::Hz20,
        SampleRate::Hz10,
    ];

    /// Frames per second
    pub fn hz(self) -> u32 {
        match self {
            SampleRate::Hz100 => 100,
            SampleRate::Hz50 => 50,
            SampleRate::Hz25 => 25,
            SampleRate::Hz20 => 20,
            SampleRate::Hz10 => 10,
        }
    }

    /// Interval between frames in milliseconds
    pub fn period_ms(self) -> u64 {
        1000 / self.hz() as u64
    }

    /// Command letter selecting this rate
    pub fn letter(self) -> u8 {
        match self {
            SampleRate::Hz100 => b'a',
            SampleRate::Hz50 => b'b',
            SampleRate::Hz25 => b'c',
            SampleRate::Hz20 => b'd',
            SampleRate::Hz10 => b'e',
        }
    }

    /// Rate with exactly this many frames per second
    pub fn from_hz(hz: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| rate.hz() == hz)
    }

    fn from_letter(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| rate.letter() == byte)
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.hz())
    }
}

/// A parsed command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `R`: start streaming
    Run,
    /// `S`: stop streaming
    Stop,
    /// `1`..`7`: average over 2^exponent samples
    Window { exponent: u32 },
    /// `a`..`e`: change output cadence
    Rate(SampleRate),
    /// NUL padding, silently ignored
    Nul,
    /// Anything else
    Unsupported(u8),
}

impl Command {
    /// Parse one byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'R' => Command::Run,
            b'S' => Command::Stop,
            0 => Command::Nul,
            b'1'..=b'7' => Command::Window {
                exponent: (byte - b'0') as u32,
            },
            other => match SampleRate::from_letter(other) {
                Some(rate) => Command::Rate(rate),
                None => Command::Unsupported(other),
            },
        }
    }

    /// Parse every byte of a chunk; never stops early
    pub fn parse_all(bytes: &[u8]) -> Vec<Command> {
        bytes.iter().copied().map(Command::from_byte).collect()
    }

    /// Window with the given sample count, if it is a supported power of two
    pub fn window(samples: usize) -> Option<Self> {
        if !samples.is_power_of_two() {
            return None;
        }
        let exponent = samples.trailing_zeros();
        (1..=MAX_WINDOW_EXPONENT)
            .contains(&exponent)
            .then_some(Command::Window { exponent })
    }

    /// Byte that encodes this command on the wire
    pub fn to_byte(self) -> u8 {
        match self {
            Command::Run => b'R',
            Command::Stop => b'S',
            Command::Window { exponent } => b'0' + exponent as u8,
            Command::Rate(rate) => rate.letter(),
            Command::Nul => 0,
            Command::Unsupported(byte) => byte,
        }
    }

    /// Sample count for a window command
    pub fn window_samples(self) -> Option<usize> {
        match self {
            Command::Window { exponent } => Some(1usize << exponent),
            _ => None,
        }
    }
}
