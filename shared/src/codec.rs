//! Fixed-size sample frame codec
//!
//! Every frame on the wire is exactly [`FRAME_SIZE`] bytes with no length
//! prefix or delimiter:
//! ```text
//! [0]      frame number (u8, wraps)
//! [1..=15] auxiliary channels, pinky..thumb, each Z/Y/X (i8)
//! [16..=18] palm accelerometer Y, Z, X (i8)
//! [19]     voltage (u8)
//! [20]     padding
//! [21..27] magnetometer X, Y, Z (u16 little-endian, value + 2048)
//! ```
//!
//! The layout lives in [`LAYOUT`]; a single reader/writer pair walks it, so
//! the palm axis order and the magnetometer bias are table entries rather
//! than offsets spread through the code.

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

/// Size of one encoded frame in bytes
pub const FRAME_SIZE: usize = 27;

/// Number of auxiliary single-byte channels (offsets 1..=15)
pub const AUX_CHANNELS: usize = 15;

/// Offset added to each magnetometer axis before encoding
pub const MAGNETOMETER_BIAS: i32 = 2048;

/// Errors that can occur during decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid frame length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// How a field's value maps onto its bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Unsigned byte
    U8,
    /// Two's complement byte
    I8,
    /// Little-endian u16 holding `value + bias`, narrowed to 16 bits
    BiasedU16Le { bias: i32 },
    /// Reserved byte, written as zero and never read
    Padding,
}

impl Encoding {
    /// Width of the encoded field in bytes
    pub const fn width(self) -> usize {
        match self {
            Encoding::U8 | Encoding::I8 | Encoding::Padding => 1,
            Encoding::BiasedU16Le { .. } => 2,
        }
    }
}

/// Spatial axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A named field of the frame layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FrameNumber,
    /// Auxiliary channel, numbered by its byte offset (1..=15)
    Channel(u8),
    Palm(Axis),
    Voltage,
    Padding,
    Magnetometer(Axis),
}

/// One row of the layout table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field: Field,
    pub offset: usize,
    pub encoding: Encoding,
}

impl FieldSpec {
    const fn new(name: &'static str, field: Field, offset: usize, encoding: Encoding) -> Self {
        Self {
            name,
            field,
            offset,
            encoding,
        }
    }
}

const MAG: Encoding = Encoding::BiasedU16Le {
    bias: MAGNETOMETER_BIAS,
};

/// Wire layout of a frame, in offset order
pub const LAYOUT: [FieldSpec; 24] = [
    FieldSpec::new("frame_no", Field::FrameNumber, 0, Encoding::U8),
    FieldSpec::new("pinky_z", Field::Channel(1), 1, Encoding::I8),
    FieldSpec::new("pinky_y", Field::Channel(2), 2, Encoding::I8),
    FieldSpec::new("pinky_x", Field::Channel(3), 3, Encoding::I8),
    FieldSpec::new("ring_z", Field::Channel(4), 4, Encoding::I8),
    FieldSpec::new("ring_y", Field::Channel(5), 5, Encoding::I8),
    FieldSpec::new("ring_x", Field::Channel(6), 6, Encoding::I8),
    FieldSpec::new("middle_z", Field::Channel(7), 7, Encoding::I8),
    FieldSpec::new("middle_y", Field::Channel(8), 8, Encoding::I8),
    FieldSpec::new("middle_x", Field::Channel(9), 9, Encoding::I8),
    FieldSpec::new("index_z", Field::Channel(10), 10, Encoding::I8),
    FieldSpec::new("index_y", Field::Channel(11), 11, Encoding::I8),
    FieldSpec::new("index_x", Field::Channel(12), 12, Encoding::I8),
    FieldSpec::new("thumb_z", Field::Channel(13), 13, Encoding::I8),
    FieldSpec::new("thumb_y", Field::Channel(14), 14, Encoding::I8),
    FieldSpec::new("thumb_x", Field::Channel(15), 15, Encoding::I8),
    // Palm accelerometer is stored Y, Z, X unlike the finger channels.
    FieldSpec::new("palm_y", Field::Palm(Axis::Y), 16, Encoding::I8),
    FieldSpec::new("palm_z", Field::Palm(Axis::Z), 17, Encoding::I8),
    FieldSpec::new("palm_x", Field::Palm(Axis::X), 18, Encoding::I8),
    FieldSpec::new("voltage", Field::Voltage, 19, Encoding::U8),
    FieldSpec::new("padding", Field::Padding, 20, Encoding::Padding),
    FieldSpec::new("mag_x", Field::Magnetometer(Axis::X), 21, MAG),
    FieldSpec::new("mag_y", Field::Magnetometer(Axis::Y), 23, MAG),
    FieldSpec::new("mag_z", Field::Magnetometer(Axis::Z), 25, MAG),
];

/// Look up the layout row for a field
pub fn field_spec(field: Field) -> Option<&'static FieldSpec> {
    LAYOUT.iter().find(|entry| entry.field == field)
}

fn write_field(data: &mut [u8; FRAME_SIZE], entry: &FieldSpec, value: i32) {
    let end = entry.offset + entry.encoding.width();
    if end > FRAME_SIZE {
        return;
    }
    let mut slot = &mut data[entry.offset..end];
    match entry.encoding {
        Encoding::U8 | Encoding::I8 => slot.put_u8(value as u8),
        Encoding::Padding => slot.put_u8(0),
        Encoding::BiasedU16Le { bias } => slot.put_u16_le(value.wrapping_add(bias) as u16),
    }
}

fn read_field(data: &[u8; FRAME_SIZE], entry: &FieldSpec) -> i32 {
    let end = entry.offset + entry.encoding.width();
    if end > FRAME_SIZE {
        return 0;
    }
    let mut slot = &data[entry.offset..end];
    match entry.encoding {
        Encoding::U8 => slot.get_u8() as i32,
        Encoding::I8 => slot.get_i8() as i32,
        Encoding::Padding => 0,
        Encoding::BiasedU16Le { bias } => slot.get_u16_le() as i32 - bias,
    }
}

/// A three-axis reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Axes<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Axes<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

/// Typed view of every field carried by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFields {
    pub frame_number: u8,
    /// Auxiliary channels in wire order (offset 1 first)
    pub channels: [i8; AUX_CHANNELS],
    pub accelerometer: Axes<i8>,
    pub voltage: u8,
    pub magnetometer: Axes<i16>,
}

/// One 27-byte sample frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    data: [u8; FRAME_SIZE],
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// Create a zeroed frame
    pub fn new() -> Self {
        Self {
            data: [0u8; FRAME_SIZE],
        }
    }

    /// Copy a frame out of a byte slice of exactly [`FRAME_SIZE`] bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let data: [u8; FRAME_SIZE] =
            bytes.try_into().map_err(|_| CodecError::InvalidLength {
                expected: FRAME_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self { data })
    }

    /// Build a frame from typed fields
    pub fn from_fields(fields: &FrameFields) -> Self {
        let mut frame = Self::new();
        frame.set_frame_number(fields.frame_number);
        for (i, value) in fields.channels.iter().enumerate() {
            frame.set(Field::Channel(i as u8 + 1), *value as i32);
        }
        let a = fields.accelerometer;
        frame.set_accelerometer(a.x, a.y, a.z);
        frame.set_voltage(fields.voltage);
        let m = fields.magnetometer;
        frame.set_magnetometer(m.x, m.y, m.z);
        frame
    }

    /// Read back all typed fields
    pub fn fields(&self) -> FrameFields {
        let mut channels = [0i8; AUX_CHANNELS];
        for (i, slot) in channels.iter_mut().enumerate() {
            *slot = self.get(Field::Channel(i as u8 + 1)) as i8;
        }
        FrameFields {
            frame_number: self.frame_number(),
            channels,
            accelerometer: self.accelerometer(),
            voltage: self.voltage(),
            magnetometer: self.magnetometer(),
        }
    }

    /// Raw wire bytes
    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.data
    }

    /// Read a field through the layout table
    pub fn get(&self, field: Field) -> i32 {
        field_spec(field)
            .map(|entry| read_field(&self.data, entry))
            .unwrap_or(0)
    }

    /// Write a field through the layout table; unknown fields are ignored
    pub fn set(&mut self, field: Field, value: i32) {
        if let Some(entry) = field_spec(field) {
            write_field(&mut self.data, entry, value);
        }
    }

    pub fn frame_number(&self) -> u8 {
        self.get(Field::FrameNumber) as u8
    }

    pub fn set_frame_number(&mut self, number: u8) {
        self.set(Field::FrameNumber, number as i32);
    }

    /// Auxiliary channel by offset (1..=15)
    pub fn channel(&self, number: u8) -> Option<i8> {
        field_spec(Field::Channel(number)).map(|entry| read_field(&self.data, entry) as i8)
    }

    pub fn set_channel(&mut self, number: u8, value: i8) {
        self.set(Field::Channel(number), value as i32);
    }

    pub fn accelerometer(&self) -> Axes<i8> {
        Axes::new(
            self.get(Field::Palm(Axis::X)) as i8,
            self.get(Field::Palm(Axis::Y)) as i8,
            self.get(Field::Palm(Axis::Z)) as i8,
        )
    }

    pub fn set_accelerometer(&mut self, x: i8, y: i8, z: i8) {
        self.set(Field::Palm(Axis::X), x as i32);
        self.set(Field::Palm(Axis::Y), y as i32);
        self.set(Field::Palm(Axis::Z), z as i32);
    }

    pub fn voltage(&self) -> u8 {
        self.get(Field::Voltage) as u8
    }

    pub fn set_voltage(&mut self, voltage: u8) {
        self.set(Field::Voltage, voltage as i32);
    }

    /// Magnetometer axes with the bias removed
    pub fn magnetometer(&self) -> Axes<i16> {
        Axes::new(
            self.get(Field::Magnetometer(Axis::X)) as i16,
            self.get(Field::Magnetometer(Axis::Y)) as i16,
            self.get(Field::Magnetometer(Axis::Z)) as i16,
        )
    }

    pub fn set_magnetometer(&mut self, x: i16, y: i16, z: i16) {
        self.set(Field::Magnetometer(Axis::X), x as i32);
        self.set(Field::Magnetometer(Axis::Y), y as i32);
        self.set(Field::Magnetometer(Axis::Z), z as i32);
    }
}

/// Encode typed fields into wire bytes
pub fn encode(fields: &FrameFields) -> [u8; FRAME_SIZE] {
    *Frame::from_fields(fields).as_bytes()
}

/// Decode wire bytes into typed fields
pub fn decode(bytes: &[u8]) -> Result<FrameFields, CodecError> {
    Frame::from_bytes(bytes).map(|frame| frame.fields())
}

/// Splits an undelimited byte stream into frames
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Partial frame data being accumulated
    buffer: BytesMut,
}

impl FrameDecoder {
    /// Create a new frame decoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(FRAME_SIZE * 16),
        }
    }

    /// Add data to the decoder buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete frame, if one is buffered
    ///
    /// Call this repeatedly until it returns `None` to drain all complete frames
    pub fn decode_next(&mut self) -> Option<Frame> {
        if self.buffer.len() < FRAME_SIZE {
            return None;
        }
        let bytes = self.buffer.split_to(FRAME_SIZE);
        Frame::from_bytes(&bytes).ok()
    }

    /// Get the current buffer length (for debugging)
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_fields() -> FrameFields {
        let mut channels = [0i8; AUX_CHANNELS];
        for (i, c) in channels.iter_mut().enumerate() {
            *c = i as i8 * 9 - 60;
        }
        FrameFields {
            frame_number: 200,
            channels,
            accelerometer: Axes::new(-127, 0, 127),
            voltage: 0xAB,
            magnetometer: Axes::new(-2048, 0, 2047),
        }
    }

    #[test]
    fn test_layout_is_contiguous_and_in_bounds() {
        let mut covered = [false; FRAME_SIZE];
        for entry in LAYOUT.iter() {
            for b in entry.offset..entry.offset + entry.encoding.width() {
                assert!(!covered[b], "byte {} claimed twice", b);
                covered[b] = true;
            }
        }
        assert!(covered.iter().all(|c| *c), "every byte has a field");
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let fields = sample_fields();
        let bytes = encode(&fields);
        assert_eq!(bytes.len(), FRAME_SIZE);
        assert_eq!(decode(&bytes).expect("decode failed"), fields);
    }

    #[test]
    fn test_palm_axis_order() {
        let mut frame = Frame::new();
        frame.set_accelerometer(10, 20, 30);
        let bytes = frame.as_bytes();
        assert_eq!(bytes[16], 20);
        assert_eq!(bytes[17], 30);
        assert_eq!(bytes[18], 10);
        assert_eq!(frame.accelerometer(), Axes::new(10, 20, 30));
    }

    #[test]
    fn test_negative_accelerometer_is_twos_complement() {
        let mut frame = Frame::new();
        frame.set_accelerometer(-1, -127, 0);
        assert_eq!(frame.as_bytes()[18], 0xFF);
        assert_eq!(frame.as_bytes()[16], 0x81);
    }

    #[test]
    fn test_magnetometer_bias_little_endian() {
        let mut frame = Frame::new();
        frame.set_magnetometer(-2048, 0, 1000);
        let bytes = frame.as_bytes();
        assert_eq!(&bytes[21..23], &[0x00, 0x00]);
        assert_eq!(&bytes[23..25], &[0x00, 0x08]);
        // 1000 + 2048 = 3048 = 0x0BE8
        assert_eq!(&bytes[25..27], &[0xE8, 0x0B]);
    }

    #[test]
    fn test_magnetometer_overflow_truncates() {
        let mut frame = Frame::new();
        frame.set_magnetometer(i16::MAX, 0, 0);
        // 32767 + 2048 = 34815 = 0x87FF, still fits in 16 bits
        assert_eq!(&frame.as_bytes()[21..23], &[0xFF, 0x87]);
        frame.set(Field::Magnetometer(Axis::Y), 65535);
        // 65535 + 2048 wraps to 2047
        assert_eq!(&frame.as_bytes()[23..25], &[0xFF, 0x07]);
    }

    #[test]
    fn test_padding_is_zeroed() {
        let mut bytes = [0xFFu8; FRAME_SIZE];
        bytes[20] = 0x5A;
        let fields = decode(&bytes).expect("decode failed");
        assert_eq!(encode(&fields)[20], 0);
    }

    #[test]
    fn test_invalid_length() {
        assert_eq!(
            decode(&[0u8; 26]),
            Err(CodecError::InvalidLength {
                expected: FRAME_SIZE,
                actual: 26
            })
        );
        assert!(matches!(
            Frame::from_bytes(&[0u8; 28]),
            Err(CodecError::InvalidLength { actual: 28, .. })
        ));
    }

    #[test]
    fn test_from_bytes_copies() {
        let mut source = [0u8; FRAME_SIZE];
        source[0] = 7;
        let frame = Frame::from_bytes(&source).expect("valid length");
        source[0] = 9;
        assert_eq!(frame.frame_number(), 7);
    }

    #[test]
    fn test_channels_by_offset() {
        let mut frame = Frame::new();
        frame.set_channel(1, -5);
        frame.set_channel(15, 99);
        assert_eq!(frame.as_bytes()[1], 0xFB);
        assert_eq!(frame.channel(15), Some(99));
        assert_eq!(frame.channel(0), None);
        assert_eq!(frame.channel(16), None);
        frame.set_channel(16, 1);
        assert_eq!(frame.as_bytes()[16], 0);
    }

    #[test]
    fn test_frame_decoder() {
        let first = encode(&sample_fields());
        let mut second_fields = sample_fields();
        second_fields.frame_number = 201;
        let second = encode(&second_fields);

        let mut decoder = FrameDecoder::new();
        decoder.extend(&first[..10]);
        assert!(decoder.decode_next().is_none());

        decoder.extend(&first[10..]);
        decoder.extend(&second[..5]);
        let frame = decoder.decode_next().expect("should have frame");
        assert_eq!(frame.frame_number(), 200);
        assert_eq!(decoder.buffer_len(), 5);

        decoder.extend(&second[5..]);
        assert_eq!(decoder.decode_next().map(|f| f.frame_number()), Some(201));
        assert!(decoder.decode_next().is_none());
    }

    proptest! {
        #[test]
        fn prop_magnetometer_wire_value(v in -2048i16..=2047) {
            let mut frame = Frame::new();
            frame.set_magnetometer(v, v, v);
            let expected = ((v as i32 + MAGNETOMETER_BIAS) & 0xFFFF) as u16;
            prop_assert_eq!(&frame.as_bytes()[21..23], &expected.to_le_bytes()[..]);
            prop_assert_eq!(frame.magnetometer().x, v);
        }

        #[test]
        fn prop_integer_fields_roundtrip(
            frame_number in any::<u8>(),
            voltage in any::<u8>(),
            channel in any::<i8>(),
            accel in any::<i8>(),
        ) {
            let mut fields = sample_fields();
            fields.frame_number = frame_number;
            fields.voltage = voltage;
            fields.channels[7] = channel;
            fields.accelerometer = Axes::new(accel, accel.wrapping_neg(), 0);
            prop_assert_eq!(decode(&encode(&fields)).unwrap(), fields);
        }
    }
}
