//! Colorspace inference from frame headers and `APPn` markers.
//!
//! JPEG itself does not record the colorspace of the encoded image. It has to be guessed from the
//! number of components, the component identifiers, and the presence of JFIF and Adobe markers.
//! See <https://entropymine.wordpress.com/2018/10/22/how-is-a-jpeg-images-color-type-determined/>
//! and T.872 section 6.1.

use std::fmt;

use crate::{
    file::FrameComponent,
    sampling::{yuv_sampling, Sampling},
    state::Flags,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Colorspace {
    Rgb,
    Yuv,
    Gray,
    Cmyk,
    Ycck,
}

impl Colorspace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rgb => "sRGB",
            Self::Yuv => "sYUV",
            Self::Gray => "GRAY",
            Self::Cmyk => "CMYK",
            Self::Ycck => "YCCK",
        }
    }
}

impl fmt::Display for Colorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a frame by colorspace and chroma subsampling.
///
/// `flags` tells whether JFIF or Adobe segments preceded the frame header, and `adobe_transform`
/// is the transform code of the Adobe segment (only consulted if one was seen).
///
/// Unrecognized Adobe transform codes and component identifiers fall back to the most common
/// classification (YCbCr for 3 components, YCCK for 4 components with an Adobe segment), since
/// encoders fill in those fields inconsistently.
pub fn infer(
    components: &[FrameComponent],
    flags: Flags,
    adobe_transform: u8,
) -> (Option<Colorspace>, Option<Sampling>) {
    let yuv = || (Some(Colorspace::Yuv), yuv_sampling(components));
    let rgb = (Some(Colorspace::Rgb), Some(Sampling::Rgb));

    match components {
        [_] => (Some(Colorspace::Gray), Some(Sampling::Grayscale)),
        [c0, c1, c2] => {
            if flags.jfif {
                yuv()
            } else if flags.adobe {
                match adobe_transform {
                    0 => rgb,
                    1 => yuv(),
                    t => {
                        log::debug!("unknown Adobe color transform code {t}");
                        yuv()
                    }
                }
            } else {
                match [c0.Ci(), c1.Ci(), c2.Ci()] {
                    [1, 2, 3] => yuv(),
                    [b'R', b'G', b'B'] => rgb,
                    ids => {
                        log::debug!("unrecognized component IDs {ids:?}");
                        yuv()
                    }
                }
            }
        }
        [_, _, _, _] => {
            let colorspace = if flags.adobe {
                match adobe_transform {
                    0 => Colorspace::Cmyk,
                    2 => Colorspace::Ycck,
                    t => {
                        log::debug!("unknown Adobe color transform code {t}");
                        Colorspace::Ycck
                    }
                }
            } else {
                Colorspace::Cmyk
            };
            (Some(colorspace), None)
        }
        _ => {
            log::warn!("unknown color space with {} components", components.len());
            (None, None)
        }
    }
}
