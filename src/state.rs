//! Per-picture parser state.

use crate::{
    colorspace::{self, Colorspace},
    error::{Error, Result},
    file::{self, DensityBlock, Marker, Segment},
    metadata::MetadataRegistry,
    sampling::Sampling,
    tags::{names, TagList},
    text,
};

/// The markers encountered in the current picture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub soi: bool,
    pub sof: bool,
    pub sos: bool,
    pub jfif: bool,
    pub adobe: bool,
}

impl Flags {
    pub const NONE: Self = Self {
        soi: false,
        sof: false,
        sos: false,
        jfif: false,
        adobe: false,
    };

    /// The markers every well-formed picture contains.
    pub const VALID_PICTURE: Self = Self {
        soi: true,
        sof: true,
        sos: true,
        ..Self::NONE
    };

    /// Returns whether every flag set in `other` is also set in `self`.
    pub fn contains(self, other: Flags) -> bool {
        (self.soi || !other.soi)
            && (self.sof || !other.sof)
            && (self.sos || !other.sos)
            && (self.jfif || !other.jfif)
            && (self.adobe || !other.adobe)
    }
}

/// Collaborators consulted while decoding segments.
pub(crate) struct Decoders {
    pub metadata: MetadataRegistry,
    pub text_encoding_env: Vec<String>,
}

/// Everything known about the picture currently being parsed.
///
/// This is reset to its [`Default`] after every emitted picture and on flushes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamState {
    pub(crate) flags: Flags,
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) colorspace: Option<Colorspace>,
    pub(crate) sampling: Option<Sampling>,
    pub(crate) adobe_transform: u8,
    pub(crate) x_density: u16,
    pub(crate) y_density: u16,
    /// `n` of the `SOFn` marker.
    pub(crate) sof: Option<u8>,
    pub(crate) tags: Option<TagList>,
    /// Where to resume scanning in the next buffer.
    pub(crate) last_offset: usize,
}

impl StreamState {
    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    pub fn colorspace(&self) -> Option<Colorspace> {
        self.colorspace
    }

    #[inline]
    pub fn sampling(&self) -> Option<Sampling> {
        self.sampling
    }

    #[inline]
    pub fn sof(&self) -> Option<u8> {
        self.sof
    }

    /// Returns the tags collected so far.
    #[inline]
    pub fn tags(&self) -> Option<&TagList> {
        self.tags.as_ref()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    fn tag_list(&mut self) -> &mut TagList {
        self.tags.get_or_insert_with(TagList::new)
    }

    /// Handles an `SOI` marker.
    ///
    /// Only the collected tags are dropped. Everything else stays until the picture ends, so a
    /// frame header following a second `SOI` is still a duplicate.
    pub(crate) fn start_picture(&mut self) {
        if self.flags.soi {
            log::debug!("SOI marker in unfinished picture");
        }
        self.tags = None;
        self.flags.soi = true;
    }

    /// Updates the state with a complete segment other than `SOI` and `EOI`.
    ///
    /// Only errors that abort the stream are returned. Other malformed segments are logged and
    /// skipped.
    pub(crate) fn apply(&mut self, segment: &Segment<'_>, decoders: &Decoders) -> Result<()> {
        let marker = segment.marker();
        match marker {
            Marker::SOS => {
                if !self.flags.sof {
                    log::warn!("SOS marker without SOF one");
                }
                self.flags.sos = true;
            }
            Marker::COM => self.apply_com(segment, decoders),
            Marker::APP0 => {
                if let Err(e) = self.apply_app0(segment) {
                    log::warn!("failed to parse APP0 segment: {e}");
                }
            }
            Marker::APP1 => match decoders.metadata.decode(segment) {
                Ok(Some(tags)) => self.tag_list().merge_replace(tags),
                Ok(None) => {}
                Err(e) => log::warn!("failed to parse APP1 segment: {e}"),
            },
            Marker::APP14 => match file::read_adobe(segment) {
                Ok(adobe) => {
                    self.flags.adobe = true;
                    if let Some(transform) = adobe.transform() {
                        self.adobe_transform = transform;
                    }
                }
                Err(e) => log::warn!("failed to parse APP14 segment: {e}"),
            },
            // Table definitions need no interpretation, but must not end the SOF search.
            Marker::DHT | Marker::DAC => {}
            _ if marker.is_sof() => self.apply_sof(segment)?,
            _ => {}
        }
        Ok(())
    }

    fn apply_sof(&mut self, segment: &Segment<'_>) -> Result<()> {
        if self.flags.sof {
            return Err(Error::duplicate_frame_header());
        }

        let hdr = file::read_frame_header(segment).map_err(Error::invalid_frame_header)?;
        let (colorspace, sampling) =
            colorspace::infer(hdr.components(), self.flags, self.adobe_transform);

        self.width = hdr.X();
        self.height = hdr.Y();
        self.colorspace = colorspace;
        self.sampling = sampling;
        self.sof = Some(hdr.sof_n());
        self.flags.sof = true;

        log::info!(
            "{:?} [{}x{}] {} components - {}",
            hdr.sof(),
            self.width,
            self.height,
            hdr.components().len(),
            colorspace.map_or("unknown colorspace", Colorspace::as_str),
        );
        Ok(())
    }

    fn apply_app0(&mut self, segment: &Segment<'_>) -> Result<()> {
        match file::read_density(segment)? {
            DensityBlock::Jfif(_) if self.flags.jfif => {
                Err(Error::from("duplicate JFIF header"))
            }
            DensityBlock::Jfif(jfif) => {
                let (major, minor) = jfif.version();
                log::debug!("JFIF {major}.{minor:02} header");
                self.flags.jfif = true;

                if let Some((x, y)) = jfif.pixel_aspect_ratio() {
                    self.x_density = x;
                    self.y_density = y;
                } else if let Some((h, v)) = jfif.pixels_per_inch() {
                    let tags = self.tag_list();
                    tags.insert(names::IMAGE_HORIZONTAL_PPI, h);
                    tags.insert(names::IMAGE_VERTICAL_PPI, v);
                }

                if jfif.thumbnail_size().0 > 0 && jfif.thumbnail_size().1 > 0 {
                    log::debug!("embedded JFIF thumbnail ignored");
                }
                Ok(())
            }
            DensityBlock::Extension if !self.flags.jfif => {
                Err(Error::from("JFXX segment without preceding JFIF header"))
            }
            DensityBlock::Extension => Ok(()),
        }
    }

    fn apply_com(&mut self, segment: &Segment<'_>, decoders: &Decoders) {
        let raw = file::read_com(segment);
        match text::freeform_to_utf8(raw, &decoders.text_encoding_env) {
            Some(comment) => {
                log::info!("comment found: {comment}");
                self.tag_list().insert(names::COMMENT, comment);
            }
            None => log::debug!("dropping COM segment of {} bytes", raw.len()),
        }
    }
}
