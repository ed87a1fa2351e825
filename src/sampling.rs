//! Chroma subsampling classification.

use std::fmt;

use crate::file::FrameComponent;

/// How the color components of an image are sampled relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sampling {
    /// Full resolution, non-YCbCr components.
    Rgb,
    Ycbcr444,
    Ycbcr422,
    Ycbcr420,
    Ycbcr411,
    Ycbcr410,
    Grayscale,
}

impl Sampling {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Ycbcr444 => "YCbCr-4:4:4",
            Self::Ycbcr422 => "YCbCr-4:2:2",
            Self::Ycbcr420 => "YCbCr-4:2:0",
            Self::Ycbcr411 => "YCbCr-4:1:1",
            Self::Ycbcr410 => "YCbCr-4:1:0",
            Self::Grayscale => "GRAYSCALE",
        }
    }
}

impl fmt::Display for Sampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Entry {
    h: [u8; 3],
    v: [u8; 3],
    sampling: Sampling,
}

const fn entry(h: [u8; 3], v: [u8; 3], sampling: Sampling) -> Entry {
    Entry { h, v, sampling }
}

/// Maps the `Hi`/`Vi` factors of the Y, Cb and Cr components to the sampling scheme they encode.
///
/// See <https://zpl.fi/chroma-subsampling-and-jpeg-sampling-factors/>. 4:4:0 has no named scheme
/// and is not listed.
#[rustfmt::skip]
const SUBSAMPLING_TABLE: &[Entry] = &[
    entry([1, 1, 1], [1, 1, 1], Sampling::Ycbcr444),
    entry([2, 2, 2], [1, 1, 1], Sampling::Ycbcr444),
    entry([3, 3, 3], [1, 1, 1], Sampling::Ycbcr444),
    entry([1, 1, 1], [2, 2, 2], Sampling::Ycbcr444),
    entry([1, 1, 1], [3, 3, 3], Sampling::Ycbcr444),
    entry([2, 1, 1], [1, 1, 1], Sampling::Ycbcr422),
    entry([2, 1, 1], [2, 2, 2], Sampling::Ycbcr422),
    entry([4, 2, 2], [1, 1, 1], Sampling::Ycbcr422),
    entry([2, 1, 1], [2, 1, 1], Sampling::Ycbcr420),
    entry([4, 1, 1], [1, 1, 1], Sampling::Ycbcr411),
    entry([4, 1, 1], [2, 1, 1], Sampling::Ycbcr410),
];

/// Looks up the sampling scheme of a 3-component YCbCr frame.
///
/// Returns `None` if `components` does not contain exactly 3 components, or if their sampling
/// factors don't match any known scheme.
pub fn yuv_sampling(components: &[FrameComponent]) -> Option<Sampling> {
    let [y, cb, cr] = components else {
        return None;
    };
    let h = [y.Hi(), cb.Hi(), cr.Hi()];
    let v = [y.Vi(), cb.Vi(), cr.Vi()];

    SUBSAMPLING_TABLE
        .iter()
        .find(|e| e.h == h && e.v == v)
        .map(|e| e.sampling)
}
