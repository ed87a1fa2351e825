//! A streaming parser that splits a JPEG byte stream (such as Motion JPEG) into pictures.
//!
//! [`JpegParse`] is fed a buffer of accumulated input and reports whether leading bytes should be
//! discarded, whether more data is needed, or that a complete picture was found at the start of
//! the buffer. Each picture comes with its [`Caps`] (dimensions, colorspace, chroma subsampling,
//! pixel aspect ratio) and the metadata [`TagList`] collected from its `APPn` and `COM` segments.
//!
//! [`FrameSplitter`] wraps a [`JpegParse`] with an accumulation buffer, for callers that just want
//! to push chunks of data and get owned pictures back.

mod caps;
mod colorspace;
mod error;
pub mod file;
pub mod metadata;
mod sampling;
mod splitter;
mod state;
pub mod tags;
pub mod text;


use std::borrow::Cow;

use crate::{
    file::Marker,
    metadata::{MetadataDecoder, MetadataRegistry},
    state::Decoders,
};

pub use crate::{
    caps::{Caps, Fraction},
    colorspace::{infer, Colorspace},
    error::{Error, ErrorKind, Result},
    sampling::{yuv_sampling, Sampling},
    splitter::{FrameSplitter, ParsedFrame},
    state::{Flags, StreamState},
    tags::{TagList, TagValue},
};

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Frame rate attached to the [`Caps`] of every picture. Does not affect parsing.
    pub framerate: Fraction,
    /// Environment variables naming the encoding of `COM` segments that aren't UTF-8.
    ///
    /// See [`text::freeform_to_utf8`].
    pub text_encoding_env: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            framerate: Fraction::new(0, 1),
            text_encoding_env: text::DEFAULT_ENCODING_ENV
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Result of a call to [`JpegParse::handle_frame`].
#[derive(Debug)]
pub enum Step {
    /// The given number of leading bytes are garbage and should be dropped before calling
    /// [`JpegParse::handle_frame`] again.
    Skip(usize),
    /// The buffer does not contain a complete picture yet. All bytes must be retained and more
    /// data appended.
    NeedMoreData,
    /// The buffer starts with a complete picture.
    Frame(Frame),
}

/// A complete picture at the start of the buffer passed to [`JpegParse::handle_frame`].
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Size of the picture in bytes, from the start of its `SOI` marker to the end of its `EOI`
    /// marker.
    pub size: usize,
    pub caps: Caps,
    /// `false` if `caps` are identical to the ones of the previous picture.
    pub caps_changed: bool,
    pub tags: TagList,
    /// `false` if the picture lacks an `SOI`, `SOFn` or `SOS` marker. Such pictures are still
    /// emitted, since decoders can often cope with them.
    pub valid: bool,
}

/// A JPEG stream parser.
///
/// One instance handles one stream. The buffer passed to [`JpegParse::handle_frame`] must start
/// with the bytes that were passed last time, minus any bytes skipped or emitted as a [`Frame`].
pub struct JpegParse {
    /// The framerate from [`Settings`], restored by [`JpegParse::start`].
    initial_framerate: Fraction,
    framerate: Fraction,
    decoders: Decoders,
    state: StreamState,
    prev_caps: Option<Caps>,
}

impl JpegParse {
    pub fn new(settings: Settings) -> Self {
        Self {
            initial_framerate: settings.framerate,
            framerate: settings.framerate,
            decoders: Decoders {
                metadata: MetadataRegistry::default(),
                text_encoding_env: settings.text_encoding_env,
            },
            state: StreamState::default(),
            prev_caps: None,
        }
    }

    /// Registers an additional `APP1` metadata decoder.
    ///
    /// See [`MetadataRegistry::register`].
    pub fn register_metadata_decoder(
        &mut self,
        suffix: impl Into<Cow<'static, str>>,
        skip: usize,
        decoder: impl MetadataDecoder + 'static,
    ) {
        self.decoders.metadata.register(suffix, skip, decoder);
    }

    pub fn set_framerate(&mut self, framerate: Fraction) {
        self.framerate = framerate;
    }

    /// Returns the state of the picture currently being parsed.
    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Prepares the parser for a new stream.
    ///
    /// Also undoes [`JpegParse::set_framerate`].
    pub fn start(&mut self) {
        self.state.reset();
        self.framerate = self.initial_framerate;
        self.prev_caps = None;
    }

    /// Discards the picture currently being parsed, without emitting it.
    ///
    /// Must be called when the caller drops its buffered data, eg. after seeking.
    pub fn flush(&mut self) {
        log::debug!("flushing parser state");
        self.state.reset();
    }

    /// Releases the collected tags and forgets the previously announced [`Caps`].
    pub fn stop(&mut self) {
        self.state.tags = None;
        self.prev_caps = None;
    }

    /// Parses as much of `buf` as possible.
    ///
    /// Returns an error if the stream is malformed beyond recovery (eg. a picture with two frame
    /// headers). The parser is reset afterwards, so that it can be used for another stream.
    pub fn handle_frame(&mut self, buf: &[u8]) -> Result<Step> {
        let mut offset = self.state.last_offset;
        if offset > 0 {
            // A marker might have been split between the previous buffer and this one.
            offset -= 1;
        }

        while offset < buf.len() {
            let Some(segment) = file::scan(buf, offset) else {
                if !self.state.flags.soi {
                    // No SOI in here. Skip everything except a trailing 0xFF, which could be the
                    // first half of the SOI marker.
                    let skip = buf.len() - usize::from(buf.last() == Some(&0xFF));
                    if skip == 0 {
                        return Ok(Step::NeedMoreData);
                    }
                    log::debug!("skipping {skip} bytes");
                    self.state.last_offset = 0;
                    return Ok(Step::Skip(skip));
                }

                // Everything after an SOI belongs to the picture.
                self.state.last_offset = buf.len();
                return Ok(Step::NeedMoreData);
            };

            let marker = segment.marker();
            if !self.state.flags.soi && marker != Marker::SOI {
                offset = segment.offset() + 2;
                continue;
            }

            if !segment.is_complete() {
                log::debug!(
                    "incomplete segment: {:?} [offset {}]",
                    marker,
                    segment.offset()
                );
                self.state.last_offset = segment.offset();
                return Ok(Step::NeedMoreData);
            }

            offset = segment.end();
            log::trace!(
                "marker found: {:?} [offset {} / size {}]",
                marker,
                segment.offset(),
                segment.size()
            );

            match marker {
                Marker::SOI => {
                    self.state.start_picture();
                    if segment.offset() > 0 {
                        log::debug!("skipping {} bytes before SOI", segment.offset());
                        self.state.last_offset = 2;
                        return Ok(Step::Skip(segment.offset()));
                    }
                }
                Marker::EOI => return Ok(Step::Frame(self.finish_frame(segment.end()))),
                _ => {
                    if let Err(e) = self.state.apply(&segment, &self.decoders) {
                        log::error!("{e}");
                        self.state.reset();
                        return Err(e);
                    }
                }
            }
        }

        self.state.last_offset = offset;
        Ok(Step::NeedMoreData)
    }

    fn caps(&self) -> Caps {
        let state = &self.state;
        let has_size = state.width > 0;
        Caps {
            width: has_size.then_some(state.width.into()),
            height: has_size.then_some(state.height.into()),
            sof_marker: state.sof,
            colorspace: state.colorspace,
            sampling: state.sampling,
            framerate: self.framerate,
            pixel_aspect_ratio: (state.x_density > 0 && state.y_density > 0).then(|| {
                Fraction::new(state.x_density.into(), state.y_density.into())
            }),
        }
    }

    fn finish_frame(&mut self, size: usize) -> Frame {
        let caps = self.caps();
        let caps_changed = self.prev_caps.as_ref() != Some(&caps);
        if caps_changed {
            log::debug!("setting caps to {caps}");
            self.prev_caps = Some(caps.clone());
        }

        let valid = self.state.flags.contains(Flags::VALID_PICTURE);
        if !valid {
            log::warn!("potentially invalid picture");
        }

        let tags = self.state.tags.take().unwrap_or_default();
        self.state.reset();

        Frame {
            size,
            caps,
            caps_changed,
            tags,
            valid,
        }
    }
}

impl Default for JpegParse {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
