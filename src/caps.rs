use std::fmt;

use crate::{colorspace::Colorspace, sampling::Sampling};

/// A rational number, used for frame rates and pixel aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    pub num: u32,
    pub den: u32,
}

impl Fraction {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// The attributes announced for a parsed picture.
///
/// Two pictures with equal `Caps` can be handled by the same downstream configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Caps {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// `n` of the `SOFn` marker, identifying the encoding process.
    pub sof_marker: Option<u8>,
    pub colorspace: Option<Colorspace>,
    pub sampling: Option<Sampling>,
    pub framerate: Fraction,
    pub pixel_aspect_ratio: Option<Fraction>,
}

impl fmt::Display for Caps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("image/jpeg, parsed=true")?;
        if let (Some(w), Some(h)) = (self.width, self.height) {
            write!(f, ", width={w}, height={h}")?;
        }
        if let Some(sof) = self.sof_marker {
            write!(f, ", sof-marker={sof}")?;
        }
        if let Some(colorspace) = self.colorspace {
            write!(f, ", colorspace={colorspace}")?;
        }
        if let Some(sampling) = self.sampling {
            write!(f, ", sampling={sampling}")?;
        }
        write!(f, ", framerate={}", self.framerate)?;
        if let Some(par) = self.pixel_aspect_ratio {
            write!(f, ", pixel-aspect-ratio={par}")?;
        }
        Ok(())
    }
}
