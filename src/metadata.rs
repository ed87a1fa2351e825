//! `APP1` metadata decoding.
//!
//! `APP1` segments start with a NUL-terminated signature identifying their contents. Decoders are
//! registered in a [`MetadataRegistry`] under a signature suffix and are handed the bytes that
//! follow the signature.

mod exif;
mod xmp;

use std::{borrow::Cow, fmt};

use crate::{
    error::{Error, Result},
    file::{self, Segment},
    tags::TagList,
};

pub use exif::decode_exif;
pub use xmp::decode_xmp;

/// Signature of EXIF segments. It is followed by a second NUL byte.
pub const EXIF_SIGNATURE: &str = "Exif";
/// Signature of XMP segments.
pub const XMP_SIGNATURE: &str = "http://ns.adobe.com/xap/1.0/";

/// Turns the contents of an `APP1` segment into tags.
pub trait MetadataDecoder: Send + Sync {
    /// Decodes `data`, returning `None` if it is malformed.
    fn decode(&self, data: &[u8]) -> Option<TagList>;
}

impl<F> MetadataDecoder for F
where
    F: Fn(&[u8]) -> Option<TagList> + Send + Sync,
{
    fn decode(&self, data: &[u8]) -> Option<TagList> {
        self(data)
    }
}

struct Entry {
    suffix: Cow<'static, str>,
    skip: usize,
    decoder: Box<dyn MetadataDecoder>,
}

/// The set of known `APP1` decoders, looked up by signature suffix.
pub struct MetadataRegistry {
    entries: Vec<Entry>,
}

impl MetadataRegistry {
    /// Creates a registry without any decoders.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers `decoder` for segments whose signature ends with `suffix`.
    ///
    /// `skip` bytes following the signature's NUL terminator are dropped before the data is handed
    /// to the decoder. Decoders registered first take precedence.
    pub fn register(
        &mut self,
        suffix: impl Into<Cow<'static, str>>,
        skip: usize,
        decoder: impl MetadataDecoder + 'static,
    ) {
        self.entries.push(Entry {
            suffix: suffix.into(),
            skip,
            decoder: Box::new(decoder),
        });
    }

    /// Decodes an `APP1` segment.
    ///
    /// Returns `Ok(None)` if no decoder is registered for the segment's signature, or if the decoder
    /// rejected the data. Only segments without a valid signature, or too short to skip the
    /// decoder's padding, result in an error.
    pub fn decode(&self, segment: &Segment<'_>) -> Result<Option<TagList>> {
        let app1 = file::read_app1(segment)?;
        let signature = app1.signature();

        let Some(entry) = self.entries.iter().find(|e| signature.ends_with(&*e.suffix)) else {
            log::debug!("ignoring APP1 segment with signature '{signature}'");
            return Ok(None);
        };

        let data = app1
            .data()
            .get(entry.skip..)
            .ok_or_else(Error::truncated)?;

        match entry.decoder.decode(data) {
            Some(tags) => {
                log::trace!("parsed APP1 '{signature}': {tags}");
                Ok(Some(tags))
            }
            None => {
                log::info!("failed to parse APP1 '{signature}' ({} bytes)", data.len());
                Ok(None)
            }
        }
    }
}

impl Default for MetadataRegistry {
    /// Creates a registry with the built-in EXIF and XMP decoders.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(EXIF_SIGNATURE, 1, decode_exif);
        registry.register(XMP_SIGNATURE, 0, decode_xmp);
        registry
    }
}

impl fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.suffix))
            .finish()
    }
}
