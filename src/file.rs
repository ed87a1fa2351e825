//! JPEG/JFIF marker scanning and segment decoding.
//!
//! [`scan`] locates the next marker in a buffer that may end at an arbitrary position. The
//! returned [`Segment`] may extend past the end of the buffer; callers check
//! [`Segment::is_complete`] before decoding it with one of the `read_*` functions in this module.

#![allow(non_snake_case)]

#[cfg(test)]
mod tests;

use std::{fmt, mem};

use bytemuck::{AnyBitPattern, Pod, Zeroable};

use crate::error::{Error, Result};

/// Locates the next marker at or after `start`.
///
/// Fill bytes (`0xFF 0xFF`) and stuffed zero bytes (`0xFF 0x00`) are skipped. Returns `None` if no
/// complete `0xFF 0xXX` marker prefix exists before the end of `buf`.
///
/// The size of the returned segment is derived from its length field and is *not* checked against
/// the size of `buf`. If the length field itself is cut off, the segment reports a size of 4 bytes
/// (marker plus length field), which is also past the end of the buffer.
pub fn scan(buf: &[u8], start: usize) -> Option<Segment<'_>> {
    let mut position = start;
    loop {
        let found = buf
            .get(position..)?
            .windows(2)
            .position(|w| w[0] == 0xFF && w[1] != 0x00 && w[1] != 0xFF)?;

        let offset = position + found;
        let marker = Marker(buf[offset + 1]);

        let size = if marker.is_standalone() {
            2
        } else {
            match buf.get(offset + 2..offset + 4) {
                Some(&[hi, lo]) => {
                    let length = u16::from_be_bytes([hi, lo]);
                    if length < 2 {
                        log::debug!(
                            "skipping {:?} at offset {} with invalid segment length {}",
                            marker,
                            offset,
                            length
                        );
                        position = offset + 2;
                        continue;
                    }
                    2 + usize::from(length)
                }
                _ => 4,
            }
        };

        let end = buf.len().min(offset + size);
        return Some(Segment {
            marker,
            offset,
            size,
            data: &buf[offset..end],
        });
    }
}

/// A segment of a JPEG stream, introduced by a `0xFF 0xXX` marker.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    marker: Marker,
    offset: usize,
    size: usize,
    /// The bytes of the segment that are present in the buffer, starting at the marker.
    data: &'a [u8],
}

impl<'a> Segment<'a> {
    #[inline]
    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// Returns the offset of the segment's `0xFF 0xXX` marker in the input buffer.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the size of the segment in bytes, including the marker and the length field.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the offset of the first byte following this segment.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    /// Returns whether all bytes of the segment are present in the scanned buffer.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.size
    }

    /// Returns the value of the length field, which counts itself and the payload.
    ///
    /// Returns 0 for standalone markers, which have no length field.
    #[inline]
    pub fn length(&self) -> usize {
        if self.marker.is_standalone() {
            0
        } else {
            self.size - 2
        }
    }

    /// The payload bytes of this segment, excluding the `0xFF 0xXX` marker and the length field.
    ///
    /// For an incomplete segment this only contains the bytes that are available.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        self.data.get(4..).unwrap_or_default()
    }

    fn reader(&self) -> Reader<'a> {
        Reader {
            buf: self.payload(),
            position: 0,
        }
    }
}

#[derive(Debug)]
struct Reader<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> &'a [u8] {
        &self.buf[self.position..]
    }

    fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.buf.get(self.position).ok_or_else(Error::truncated)?;
        self.position += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let b = [self.read_u8()?, self.read_u8()?];
        Ok(u16::from_be_bytes(b))
    }

    fn read_slice(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining().len() < count {
            return Err(Error::truncated());
        }
        let slice = &self.remaining()[..count];
        self.position += count;
        Ok(slice)
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        self.read_slice(count).map(drop)
    }

    /// Reads a NUL-terminated string, consuming the terminator.
    fn read_cstr(&mut self) -> Result<&'a [u8]> {
        let len = self
            .remaining()
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::from("identifier string is not NUL-terminated"))?;
        let s = self.read_slice(len)?;
        self.position += 1;
        Ok(s)
    }

    fn read_objs<T: AnyBitPattern>(&mut self, count: usize) -> Result<&'a [T]> {
        assert_eq!(mem::align_of::<T>(), 1);

        let bytes = self.read_slice(count * mem::size_of::<T>())?;
        Ok(bytemuck::cast_slice(bytes))
    }
}

/// The `0xXX` byte of a `0xFF 0xXX` marker.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Marker(pub u8);

impl Marker {
    /// Temporary private use in arithmetic coding.
    pub const TEM: Self = Self(0x01);
    /// Define Huffman Tables.
    pub const DHT: Self = Self(0xC4);
    /// Define Arithmetic Coding conditioning.
    pub const DAC: Self = Self(0xCC);
    pub const RST0: Self = Self(0xD0);
    pub const RST7: Self = Self(0xD7);
    /// Start Of Image.
    pub const SOI: Self = Self(0xD8);
    /// End Of Image.
    pub const EOI: Self = Self(0xD9);
    /// Start Of Scan.
    pub const SOS: Self = Self(0xDA);
    /// Define Quantization Tables.
    pub const DQT: Self = Self(0xDB);
    /// Define Restart Interval.
    pub const DRI: Self = Self(0xDD);
    /// JFIF header and extensions.
    pub const APP0: Self = Self(0xE0);
    /// EXIF and XMP metadata.
    pub const APP1: Self = Self(0xE1);
    /// Adobe color transform.
    pub const APP14: Self = Self(0xEE);
    /// Comment.
    pub const COM: Self = Self(0xFE);

    /// Returns whether this marker stands alone, without a length field or payload.
    #[inline]
    pub fn is_standalone(self) -> bool {
        matches!(self.0, 0x01 | 0xD0..=0xD9)
    }

    /// Returns whether this is one of the `SOFn` frame header markers.
    #[inline]
    pub fn is_sof(self) -> bool {
        matches!(self.0, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF)
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::TEM => f.write_str("TEM"),
            Self::DHT => f.write_str("DHT"),
            Self::DAC => f.write_str("DAC"),
            Self::SOI => f.write_str("SOI"),
            Self::EOI => f.write_str("EOI"),
            Self::SOS => f.write_str("SOS"),
            Self::DQT => f.write_str("DQT"),
            Self::DRI => f.write_str("DRI"),
            Self::COM => f.write_str("COM"),
            Self(n @ 0xD0..=0xD7) => write!(f, "RST{}", n - 0xD0),
            Self(n) if self.is_sof() => write!(f, "SOF{}", n - 0xC0),
            Self(n @ 0xE0..=0xEF) => write!(f, "APP{}", n - 0xE0),
            _ => f
                .debug_tuple("Marker")
                .field(&format_args!("{:02x}", self.0))
                .finish(),
        }
    }
}

/// **SOF** Start Of Frame
#[derive(Debug)]
pub struct FrameHeader<'a> {
    sof: Marker,
    /// Sample precision in bits.
    P: u8,
    Y: u16,
    X: u16,
    components: &'a [FrameComponent],
}

impl<'a> FrameHeader<'a> {
    #[inline]
    pub fn sof(&self) -> Marker {
        self.sof
    }

    /// Returns the encoding process number (the `n` in `SOFn`).
    #[inline]
    pub fn sof_n(&self) -> u8 {
        self.sof.0 - 0xC0
    }

    /// Returns the sample precision in bits.
    #[inline]
    pub fn P(&self) -> u8 {
        self.P
    }

    /// Returns the number of lines in the image (the height of the frame).
    #[inline]
    pub fn Y(&self) -> u16 {
        self.Y
    }

    /// Returns the number of samples per line (the width of the frame).
    #[inline]
    pub fn X(&self) -> u16 {
        self.X
    }

    #[inline]
    pub fn components(&self) -> &'a [FrameComponent] {
        self.components
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct FrameComponent {
    Ci: u8,
    HiVi: u8,
    Tqi: u8,
}

impl FrameComponent {
    pub const fn new(Ci: u8, Hi: u8, Vi: u8, Tqi: u8) -> Self {
        Self {
            Ci,
            HiVi: (Hi << 4) | (Vi & 0xf),
            Tqi,
        }
    }

    /// Returns this component's component identifier.
    ///
    /// Encoders use this inconsistently: JFIF files number their components 1, 2 and 3, some
    /// encoders use the ASCII codes of `R`, `G` and `B`, and others use arbitrary values.
    #[inline]
    pub fn Ci(&self) -> u8 {
        self.Ci
    }

    /// Returns the horizontal sampling factor for this component.
    #[inline]
    pub fn Hi(&self) -> u8 {
        self.HiVi >> 4
    }

    /// Returns the vertical sampling factor for this component.
    #[inline]
    pub fn Vi(&self) -> u8 {
        self.HiVi & 0xf
    }

    /// Returns the index of the quantization table to use for this component.
    #[inline]
    pub fn Tqi(&self) -> u8 {
        self.Tqi
    }
}

impl fmt::Debug for FrameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameComponent")
            .field("Ci", &self.Ci)
            .field("Hi", &self.Hi())
            .field("Vi", &self.Vi())
            .field("Tqi", &self.Tqi)
            .finish()
    }
}

/// Decodes a `SOFn` frame header.
pub fn read_frame_header<'a>(segment: &Segment<'a>) -> Result<FrameHeader<'a>> {
    let mut reader = segment.reader();
    let P = reader.read_u8()?;
    let Y = reader.read_u16()?;
    let X = reader.read_u16()?;
    let num_components = reader.read_u8()?;
    let components = reader.read_objs::<FrameComponent>(num_components.into())?;
    Ok(FrameHeader {
        sof: segment.marker(),
        P,
        Y,
        X,
        components,
    })
}

/// Contents of an `APP0` segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DensityBlock {
    Jfif(Jfif),
    /// A `JFXX` extension segment. Its thumbnail is not decoded.
    Extension,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jfif {
    major_version: u8,
    minor_version: u8,
    unit: DensityUnit,
    xdensity: u16,
    ydensity: u16,
    xthumbnail: u8,
    ythumbnail: u8,
}

impl Jfif {
    #[inline]
    pub fn version(&self) -> (u8, u8) {
        (self.major_version, self.minor_version)
    }

    #[inline]
    pub fn unit(&self) -> DensityUnit {
        self.unit
    }

    #[inline]
    pub fn density_x(&self) -> u16 {
        self.xdensity
    }

    #[inline]
    pub fn density_y(&self) -> u16 {
        self.ydensity
    }

    #[inline]
    pub fn thumbnail_size(&self) -> (u8, u8) {
        (self.xthumbnail, self.ythumbnail)
    }

    /// Returns the density in pixels per inch, if the header specifies an absolute density.
    pub fn pixels_per_inch(&self) -> Option<(f64, f64)> {
        let (x, y) = (f64::from(self.xdensity), f64::from(self.ydensity));
        match self.unit {
            DensityUnit::DotsPerInch => Some((x, y)),
            DensityUnit::DotsPerCm => Some((x * 2.54, y * 2.54)),
            DensityUnit::None | DensityUnit::Unknown(_) => None,
        }
    }

    /// Returns the pixel aspect ratio, if the header specifies one instead of a density.
    pub fn pixel_aspect_ratio(&self) -> Option<(u16, u16)> {
        (self.unit == DensityUnit::None).then_some((self.xdensity, self.ydensity))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityUnit {
    /// The densities only specify the pixel aspect ratio.
    None,
    DotsPerInch,
    DotsPerCm,
    Unknown(u8),
}

/// Decodes an `APP0` segment containing a JFIF header or a JFIF extension.
pub fn read_density(segment: &Segment<'_>) -> Result<DensityBlock> {
    // Length of the interesting data in a JFIF header.
    const MIN_LENGTH: usize = 14;

    if segment.length() < MIN_LENGTH {
        return Err(Error::from(format!(
            "APP0 segment of {} bytes is too short",
            segment.length()
        )));
    }

    let mut reader = segment.reader();
    match reader.read_cstr()? {
        b"JFIF" => {}
        b"JFXX" => return Ok(DensityBlock::Extension),
        id => {
            return Err(Error::from(format!(
                "unknown APP0 identifier \"{}\"",
                id.escape_ascii()
            )))
        }
    }

    let major_version = reader.read_u8()?;
    let minor_version = reader.read_u8()?;
    let unit = match reader.read_u8()? {
        0 => DensityUnit::None,
        1 => DensityUnit::DotsPerInch,
        2 => DensityUnit::DotsPerCm,
        n => DensityUnit::Unknown(n),
    };
    let xdensity = reader.read_u16()?;
    let ydensity = reader.read_u16()?;
    let xthumbnail = reader.read_u8()?;
    let ythumbnail = reader.read_u8()?;
    Ok(DensityBlock::Jfif(Jfif {
        major_version,
        minor_version,
        unit,
        xdensity,
        ydensity,
        xthumbnail,
        ythumbnail,
    }))
}

/// The `APP14` color transform segment written by Adobe software.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adobe {
    transform: Option<u8>,
}

impl Adobe {
    /// Returns the color transform code, if the segment contains one.
    ///
    /// - 0: no transform (RGB or CMYK)
    /// - 1: YCbCr
    /// - 2: YCCK
    #[inline]
    pub fn transform(&self) -> Option<u8> {
        self.transform
    }
}

/// Decodes an `APP14` Adobe segment.
pub fn read_adobe(segment: &Segment<'_>) -> Result<Adobe> {
    const MIN_LENGTH: usize = 12;
    const ID: &[u8] = b"Adobe";

    if segment.length() < MIN_LENGTH {
        return Err(Error::from(format!(
            "APP14 segment of {} bytes is too short",
            segment.length()
        )));
    }

    let mut reader = segment.reader();
    if reader.read_slice(ID.len())? != ID {
        return Err(Error::from("APP14 segment is not an Adobe segment"));
    }

    // DCTEncodeVersion, APP14Flags0, APP14Flags1
    reader.skip(6)?;

    Ok(Adobe {
        transform: reader.read_u8().ok(),
    })
}

/// An `APP1` segment split into its identifying signature and the data following it.
#[derive(Debug, Clone, Copy)]
pub struct App1<'a> {
    signature: &'a str,
    data: &'a [u8],
}

impl<'a> App1<'a> {
    #[inline]
    pub fn signature(&self) -> &'a str {
        self.signature
    }

    /// The bytes following the signature's NUL terminator.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

/// Splits an `APP1` segment into its signature and payload.
pub fn read_app1<'a>(segment: &Segment<'a>) -> Result<App1<'a>> {
    let mut reader = segment.reader();
    let signature = std::str::from_utf8(reader.read_cstr()?)
        .map_err(|_| Error::from("APP1 signature is not valid UTF-8"))?;
    Ok(App1 {
        signature,
        data: reader.remaining(),
    })
}

/// Returns the raw text of a `COM` segment.
pub fn read_com<'a>(segment: &Segment<'a>) -> &'a [u8] {
    segment.payload()
}
