//! A minimal EXIF decoder.
//!
//! Only the textual descriptive fields and the orientation of IFD0 are extracted. The data starts
//! with a TIFF header.

use crate::tags::{names, TagList};

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;

const IMAGE_DESCRIPTION: u16 = 0x010E;
const MAKE: u16 = 0x010F;
const MODEL: u16 = 0x0110;
const ORIENTATION: u16 = 0x0112;
const SOFTWARE: u16 = 0x0131;
const DATE_TIME: u16 = 0x0132;
const ARTIST: u16 = 0x013B;
const COPYRIGHT: u16 = 0x8298;

#[derive(Clone, Copy)]
struct Tiff<'a> {
    data: &'a [u8],
    big_endian: bool,
}

impl<'a> Tiff<'a> {
    fn u16(&self, offset: usize) -> Option<u16> {
        let b: [u8; 2] = self.data.get(offset..offset + 2)?.try_into().ok()?;
        Some(if self.big_endian {
            u16::from_be_bytes(b)
        } else {
            u16::from_le_bytes(b)
        })
    }

    fn u32(&self, offset: usize) -> Option<u32> {
        let b: [u8; 4] = self.data.get(offset..offset + 4)?.try_into().ok()?;
        Some(if self.big_endian {
            u32::from_be_bytes(b)
        } else {
            u32::from_le_bytes(b)
        })
    }

    /// Reads the ASCII value of the IFD entry at `entry`.
    fn ascii(&self, entry: usize, count: usize) -> Option<String> {
        // Values of up to 4 bytes are stored inline.
        let start = if count <= 4 {
            entry + 8
        } else {
            usize::try_from(self.u32(entry + 8)?).ok()?
        };
        let bytes = self.data.get(start..start.checked_add(count)?)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let text = String::from_utf8_lossy(&bytes[..end]);
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

fn orientation_name(value: u16) -> Option<&'static str> {
    Some(match value {
        1 => "rotate-0",
        2 => "flip-rotate-0",
        3 => "rotate-180",
        4 => "flip-rotate-180",
        5 => "flip-rotate-270",
        6 => "rotate-90",
        7 => "flip-rotate-90",
        8 => "rotate-270",
        _ => return None,
    })
}

/// Decodes the EXIF data following the `Exif\0\0` signature.
pub fn decode_exif(data: &[u8]) -> Option<TagList> {
    let big_endian = match data.get(..2)? {
        b"MM" => true,
        b"II" => false,
        _ => return None,
    };
    let tiff = Tiff { data, big_endian };
    if tiff.u16(2)? != 42 {
        return None;
    }

    let ifd = usize::try_from(tiff.u32(4)?).ok()?;
    let count = usize::from(tiff.u16(ifd)?);

    let mut tags = TagList::new();
    for i in 0..count {
        let entry = ifd + 2 + i * 12;
        let (Some(tag), Some(ty), Some(n)) =
            (tiff.u16(entry), tiff.u16(entry + 2), tiff.u32(entry + 4))
        else {
            log::debug!("EXIF IFD0 truncated after {i} of {count} entries");
            break;
        };

        let name = match tag {
            IMAGE_DESCRIPTION => names::DESCRIPTION,
            MAKE => names::DEVICE_MANUFACTURER,
            MODEL => names::DEVICE_MODEL,
            SOFTWARE => names::APPLICATION_NAME,
            DATE_TIME => names::DATE_TIME,
            ARTIST => names::ARTIST,
            COPYRIGHT => names::COPYRIGHT,
            ORIENTATION if ty == TYPE_SHORT => {
                if let Some(orientation) = tiff.u16(entry + 8).and_then(orientation_name) {
                    tags.insert(names::IMAGE_ORIENTATION, orientation);
                }
                continue;
            }
            _ => continue,
        };

        if ty != TYPE_ASCII {
            continue;
        }
        if let Some(text) = usize::try_from(n).ok().and_then(|n| tiff.ascii(entry, n)) {
            tags.insert(name, text);
        }
    }

    (!tags.is_empty()).then_some(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a little- or big-endian TIFF structure with the given IFD0 entries.
    fn tiff(big_endian: bool, entries: &[(u16, u16, &[u8])]) -> Vec<u8> {
        let u16b = |v: u16| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
        let u32b = |v: u32| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };

        let mut out = Vec::new();
        out.extend_from_slice(if big_endian { b"MM" } else { b"II" });
        out.extend_from_slice(&u16b(42));
        out.extend_from_slice(&u32b(8));
        out.extend_from_slice(&u16b(entries.len() as u16));

        let mut extra = Vec::new();
        let extra_start = 8 + 2 + entries.len() * 12 + 4;
        for &(tag, ty, value) in entries {
            out.extend_from_slice(&u16b(tag));
            out.extend_from_slice(&u16b(ty));
            let count = if ty == TYPE_SHORT { 1 } else { value.len() };
            out.extend_from_slice(&u32b(count as u32));
            if value.len() <= 4 {
                let mut inline = [0; 4];
                inline[..value.len()].copy_from_slice(value);
                out.extend_from_slice(&inline);
            } else {
                out.extend_from_slice(&u32b((extra_start + extra.len()) as u32));
                extra.extend_from_slice(value);
            }
        }
        out.extend_from_slice(&[0; 4]); // next IFD
        out.extend_from_slice(&extra);
        out
    }

    #[test]
    fn ascii_and_orientation() {
        for big_endian in [false, true] {
            let orientation = if big_endian { [0, 6] } else { [6, 0] };
            let data = tiff(
                big_endian,
                &[
                    (MAKE, TYPE_ASCII, b"Acme Cameras\0"),
                    (MODEL, TYPE_ASCII, b"X1\0"),
                    (ORIENTATION, TYPE_SHORT, &orientation),
                    (0x9999, TYPE_ASCII, b"ignored\0"),
                ],
            );
            let tags = decode_exif(&data).unwrap();
            assert_eq!(tags.get_str(names::DEVICE_MANUFACTURER), Some("Acme Cameras"));
            assert_eq!(tags.get_str(names::DEVICE_MODEL), Some("X1"));
            assert_eq!(tags.get_str(names::IMAGE_ORIENTATION), Some("rotate-90"));
            assert_eq!(tags.len(), 3);
        }
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(decode_exif(b"").is_none());
        assert!(decode_exif(b"XX\x2a\x00\x08\x00\x00\x00").is_none());
        assert!(decode_exif(b"II\x2b\x00\x08\x00\x00\x00").is_none());
        // IFD offset out of bounds.
        assert!(decode_exif(b"II\x2a\x00\xff\x00\x00\x00").is_none());
    }

    #[test]
    fn no_known_tags() {
        let data = tiff(false, &[(0x9999, TYPE_ASCII, b"ignored\0")]);
        assert!(decode_exif(&data).is_none());
    }

    #[test]
    fn out_of_bounds_value_is_skipped() {
        let mut data = tiff(false, &[(ARTIST, TYPE_ASCII, b"Somebody\0")]);
        data.truncate(data.len() - 4);
        assert!(decode_exif(&data).is_none());
    }
}
