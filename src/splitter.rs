use crate::{
    caps::Caps,
    error::Result,
    tags::TagList,
    JpegParse, Settings, Step,
};

/// The parser never looks at fewer bytes than this.
const MIN_FRAME_SIZE: usize = 2;

/// A picture split off the input stream by a [`FrameSplitter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFrame {
    /// The picture, from `SOI` to `EOI` marker inclusive.
    pub data: Vec<u8>,
    pub caps: Caps,
    pub caps_changed: bool,
    pub tags: TagList,
    pub valid: bool,
}

/// Splits a JPEG stream delivered in arbitrary chunks into pictures.
///
/// ```
/// # fn main() -> jpegparse::Result<()> {
/// let mut splitter = jpegparse::FrameSplitter::default();
/// splitter.push(&[0x00, 0xFF, 0xD8, 0xFF]);
/// assert!(splitter.next_frame()?.is_none());
/// splitter.push(&[0xD9]);
/// let frame = splitter.next_frame()?.unwrap();
/// assert_eq!(frame.data, [0xFF, 0xD8, 0xFF, 0xD9]);
/// assert_eq!(splitter.skipped(), 1);
/// # Ok(())
/// # }
/// ```
pub struct FrameSplitter {
    parser: JpegParse,
    buf: Vec<u8>,
    skipped: usize,
}

impl FrameSplitter {
    pub fn new(settings: Settings) -> Self {
        Self::with_parser(JpegParse::new(settings))
    }

    pub fn with_parser(parser: JpegParse) -> Self {
        Self {
            parser,
            buf: Vec::new(),
            skipped: 0,
        }
    }

    pub fn parser(&self) -> &JpegParse {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut JpegParse {
        &mut self.parser
    }

    /// Returns the total number of garbage bytes discarded so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Returns the bytes that are buffered but not yet part of an emitted picture.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Appends a chunk of input data.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Returns the next complete picture, or `None` if more data is needed.
    ///
    /// On error, all buffered data is discarded along with the parser state.
    pub fn next_frame(&mut self) -> Result<Option<ParsedFrame>> {
        loop {
            if self.buf.len() < MIN_FRAME_SIZE {
                return Ok(None);
            }

            match self.parser.handle_frame(&self.buf) {
                Ok(Step::Skip(n)) => {
                    self.buf.drain(..n);
                    self.skipped += n;
                }
                Ok(Step::NeedMoreData) => return Ok(None),
                Ok(Step::Frame(frame)) => {
                    let data = self.buf.drain(..frame.size).collect();
                    return Ok(Some(ParsedFrame {
                        data,
                        caps: frame.caps,
                        caps_changed: frame.caps_changed,
                        tags: frame.tags,
                        valid: frame.valid,
                    }));
                }
                Err(e) => {
                    self.buf.clear();
                    return Err(e);
                }
            }
        }
    }

    /// Drops all buffered data and the state of the current picture.
    pub fn flush(&mut self) {
        self.buf.clear();
        self.parser.flush();
    }

    /// Ends the stream, returning any data that did not form a complete picture.
    pub fn finish(mut self) -> Vec<u8> {
        self.parser.stop();
        std::mem::take(&mut self.buf)
    }
}

impl Default for FrameSplitter {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
