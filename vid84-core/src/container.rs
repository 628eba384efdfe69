//! 84VID container layout, validation and writing
//!
//! Container format:
//! ```text
//! ┌──────────┬──────┬─────────┬───────┬──────┬─────────────────┬─────┬──────┐
//! │ "84VID"  │ FPS  │ VERSION │ SCALE │ 0xFF │ x y x2 y2 ...   │ ... │ 0xFE │
//! │ 5B       │ 1B   │ 1B      │ 1B    │ 1B   │ 4B per rectangle│     │ 1B   │
//! └──────────┴──────┴─────────┴───────┴──────┴─────────────────┴─────┴──────┘
//! ```
//!
//! Every frame starts with 0xFF and the stream ends with a single 0xFE.
//! Frames have no length prefix; coordinate bytes never take a sentinel value.

use heapless::Vec;

/// Identifier at offset 0
pub const IDENTIFIER: [u8; 5] = *b"84VID";

/// Offset of the refresh rate byte
pub const REFRESH_RATE_OFFSET: usize = 5;

/// Offset of the format version byte
pub const VERSION_OFFSET: usize = 6;

/// Offset of the scale factor byte
pub const SCALE_FACTOR_OFFSET: usize = 7;

/// Header length in bytes
pub const HEADER_LEN: usize = 8;

/// Offset of the first frame-start sentinel
pub const FRAME_DATA_START: usize = HEADER_LEN;

/// The only supported format version
pub const FORMAT_VERSION: u8 = 1;

/// Highest accepted refresh rate (frames per second)
pub const MAX_REFRESH_RATE: u8 = 63;

/// Highest accepted integer down-scale factor
pub const MAX_SCALE_FACTOR: u8 = 6;

/// Sentinel: another frame follows
pub const FRAME_START: u8 = 0xFF;

/// Sentinel: end of stream, always the final byte
pub const END_OF_STREAM: u8 = 0xFE;

/// Whether a byte is one of the two reserved sentinel values
#[inline]
pub const fn is_sentinel(byte: u8) -> bool {
    byte == FRAME_START || byte == END_OF_STREAM
}

/// Reasons a container is refused
///
/// Any single reason refuses the whole container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ContainerError {
    /// Buffer shorter than the header
    TooShort,
    /// First five bytes are not "84VID"
    BadIdentifier,
    /// Refresh rate is 0 or above 63
    BadRefreshRate(u8),
    /// Format version is not 1
    UnsupportedVersion(u8),
    /// Scale factor is 0 or above 6
    BadScaleFactor(u8),
    /// Final byte is not 0xFE
    MissingEndMarker,
}

/// Validated header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    refresh_rate: u8,
    format_version: u8,
    scale_factor: u8,
}

impl Header {
    /// Build a version 1 header, checking field ranges
    pub fn new(refresh_rate: u8, scale_factor: u8) -> Result<Self, ContainerError> {
        Self::from_fields(refresh_rate, FORMAT_VERSION, scale_factor)
    }

    fn from_fields(
        refresh_rate: u8,
        format_version: u8,
        scale_factor: u8,
    ) -> Result<Self, ContainerError> {
        if refresh_rate == 0 || refresh_rate > MAX_REFRESH_RATE {
            return Err(ContainerError::BadRefreshRate(refresh_rate));
        }
        if format_version != FORMAT_VERSION {
            return Err(ContainerError::UnsupportedVersion(format_version));
        }
        if scale_factor == 0 || scale_factor > MAX_SCALE_FACTOR {
            return Err(ContainerError::BadScaleFactor(scale_factor));
        }

        Ok(Self {
            refresh_rate,
            format_version,
            scale_factor,
        })
    }

    /// Parse the header from the start of a buffer
    ///
    /// Only the header fields are checked; see [`Container::validate`] for the
    /// full container check.
    pub fn parse(bytes: &[u8]) -> Result<Self, ContainerError> {
        if bytes.len() < HEADER_LEN {
            return Err(ContainerError::TooShort);
        }
        if bytes[..IDENTIFIER.len()] != IDENTIFIER {
            return Err(ContainerError::BadIdentifier);
        }

        Self::from_fields(
            bytes[REFRESH_RATE_OFFSET],
            bytes[VERSION_OFFSET],
            bytes[SCALE_FACTOR_OFFSET],
        )
    }

    /// Target frames per second
    pub const fn refresh_rate(&self) -> u8 {
        self.refresh_rate
    }

    /// Format version (always 1)
    pub const fn format_version(&self) -> u8 {
        self.format_version
    }

    /// Integer factor applied to every decoded coordinate
    pub const fn scale_factor(&self) -> u8 {
        self.scale_factor
    }

    /// Per-frame time budget in whole milliseconds (truncating)
    pub const fn time_per_frame_ms(&self) -> u32 {
        1000 / self.refresh_rate as u32
    }

    /// Encode as the 8 header bytes
    pub const fn to_bytes(&self) -> [u8; HEADER_LEN] {
        [
            IDENTIFIER[0],
            IDENTIFIER[1],
            IDENTIFIER[2],
            IDENTIFIER[3],
            IDENTIFIER[4],
            self.refresh_rate,
            self.format_version,
            self.scale_factor,
        ]
    }
}

/// A container buffer that passed validation
///
/// The buffer is borrowed read-only for the whole playback.
#[derive(Debug, Clone, Copy)]
pub struct Container<'a> {
    data: &'a [u8],
    header: Header,
}

impl<'a> Container<'a> {
    /// Validate a complete container buffer
    ///
    /// Accepts iff the identifier is "84VID", the refresh rate is 1-63, the
    /// version is 1, the scale factor is 1-6 and the last byte is 0xFE.
    pub fn validate(data: &'a [u8]) -> Result<Self, ContainerError> {
        let header = Header::parse(data)?;

        if data.last() != Some(&END_OF_STREAM) {
            return Err(ContainerError::MissingEndMarker);
        }

        Ok(Self { data, header })
    }

    /// Validated header fields
    pub fn header(&self) -> Header {
        self.header
    }

    /// The whole container, header included
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Container length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a validated container
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Errors that can occur while writing a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError {
    /// Output buffer capacity exhausted
    BufferFull,
    /// A coordinate took a sentinel value
    ReservedCoordinate(u8),
    /// Rectangle pushed before the first frame was opened
    NoOpenFrame,
    /// Header field out of range
    InvalidHeader(ContainerError),
}

impl From<ContainerError> for WriteError {
    fn from(e: ContainerError) -> Self {
        WriteError::InvalidHeader(e)
    }
}

/// Builds a container into a fixed-capacity buffer
///
/// ```
/// use vid84_core::ContainerWriter;
///
/// let mut writer = ContainerWriter::<64>::new(12, 6).unwrap();
/// writer.begin_frame().unwrap();
/// writer.push_rect([10, 10, 20, 20]).unwrap();
/// let bytes = writer.finish().unwrap();
/// assert_eq!(bytes.len(), 8 + 1 + 4 + 1);
/// ```
#[derive(Debug, Clone)]
pub struct ContainerWriter<const N: usize> {
    bytes: Vec<u8, N>,
}

impl<const N: usize> ContainerWriter<N> {
    /// Start a container with the given header fields
    pub fn new(refresh_rate: u8, scale_factor: u8) -> Result<Self, WriteError> {
        let header = Header::new(refresh_rate, scale_factor)?;
        let mut bytes = Vec::new();
        bytes
            .extend_from_slice(&header.to_bytes())
            .map_err(|_| WriteError::BufferFull)?;
        Ok(Self { bytes })
    }

    /// Open a new frame (writes 0xFF)
    pub fn begin_frame(&mut self) -> Result<(), WriteError> {
        self.bytes
            .push(FRAME_START)
            .map_err(|_| WriteError::BufferFull)
    }

    /// Append one rectangle `[x, y, x2, y2]` to the open frame
    pub fn push_rect(&mut self, rect: [u8; 4]) -> Result<(), WriteError> {
        if self.bytes.len() == HEADER_LEN {
            return Err(WriteError::NoOpenFrame);
        }
        if let Some(&reserved) = rect.iter().find(|&&b| is_sentinel(b)) {
            return Err(WriteError::ReservedCoordinate(reserved));
        }
        self.bytes
            .extend_from_slice(&rect)
            .map_err(|_| WriteError::BufferFull)
    }

    /// Open a frame and append all of its rectangles
    pub fn push_frame(&mut self, rects: &[[u8; 4]]) -> Result<(), WriteError> {
        self.begin_frame()?;
        for &rect in rects {
            self.push_rect(rect)?;
        }
        Ok(())
    }

    /// Close the stream (writes 0xFE) and return the bytes
    pub fn finish(mut self) -> Result<Vec<u8, N>, WriteError> {
        self.bytes
            .push(END_OF_STREAM)
            .map_err(|_| WriteError::BufferFull)?;
        Ok(self.bytes)
    }
}
