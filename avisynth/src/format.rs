//! Pixel formats and planes.

use std::fmt::{self, Display};
use std::os::raw::c_int;

use avisynth_sys as ffi;

/// A frame plane.
///
/// Interleaved formats and greyscale have a single plane, addressed as `Y`. Planar RGB stores
/// green, blue and red in that order.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Plane {
    Y,
    U,
    V,
    A,
    R,
    G,
    B,
}

impl Plane {
    #[inline]
    pub(crate) fn ffi_type(self) -> c_int {
        match self {
            Plane::Y => ffi::AVS_PLANAR_Y,
            Plane::U => ffi::AVS_PLANAR_U,
            Plane::V => ffi::AVS_PLANAR_V,
            Plane::A => ffi::AVS_PLANAR_A,
            Plane::R => ffi::AVS_PLANAR_R,
            Plane::G => ffi::AVS_PLANAR_G,
            Plane::B => ffi::AVS_PLANAR_B,
        }
    }
}

/// A pixel format bitmask.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct PixelType(pub u32);

macro_rules! preset_formats {
    ($($name:ident = $value:path),* $(,)?) => {
        /// Pixel formats known to the engine.
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
        pub enum PresetFormat {
            $($name = $value,)*
        }

        impl PresetFormat {
            const ALL: &'static [PresetFormat] = &[$(PresetFormat::$name,)*];

            /// Returns the name the engine uses for this format.
            #[inline]
            pub fn name(self) -> &'static str {
                match self {
                    $(PresetFormat::$name => stringify!($name),)*
                }
            }
        }
    };
}

preset_formats! {
    Unknown = ffi::AVS_CS_UNKNOWN,

    BGR24 = ffi::AVS_CS_BGR24,
    BGR32 = ffi::AVS_CS_BGR32,
    BGR48 = ffi::AVS_CS_BGR48,
    BGR64 = ffi::AVS_CS_BGR64,
    YUY2 = ffi::AVS_CS_YUY2,
    RAW32 = ffi::AVS_CS_RAW32,

    YV24 = ffi::AVS_CS_YV24,
    YV16 = ffi::AVS_CS_YV16,
    YV12 = ffi::AVS_CS_YV12,
    I420 = ffi::AVS_CS_I420,
    YV411 = ffi::AVS_CS_YV411,
    YUV9 = ffi::AVS_CS_YUV9,
    Y8 = ffi::AVS_CS_Y8,

    YUV444P10 = ffi::AVS_CS_YUV444P10,
    YUV422P10 = ffi::AVS_CS_YUV422P10,
    YUV420P10 = ffi::AVS_CS_YUV420P10,
    Y10 = ffi::AVS_CS_Y10,
    YUV444P12 = ffi::AVS_CS_YUV444P12,
    YUV422P12 = ffi::AVS_CS_YUV422P12,
    YUV420P12 = ffi::AVS_CS_YUV420P12,
    Y12 = ffi::AVS_CS_Y12,
    YUV444P14 = ffi::AVS_CS_YUV444P14,
    YUV422P14 = ffi::AVS_CS_YUV422P14,
    YUV420P14 = ffi::AVS_CS_YUV420P14,
    Y14 = ffi::AVS_CS_Y14,
    YUV444P16 = ffi::AVS_CS_YUV444P16,
    YUV422P16 = ffi::AVS_CS_YUV422P16,
    YUV420P16 = ffi::AVS_CS_YUV420P16,
    Y16 = ffi::AVS_CS_Y16,
    YUV444PS = ffi::AVS_CS_YUV444PS,
    YUV422PS = ffi::AVS_CS_YUV422PS,
    YUV420PS = ffi::AVS_CS_YUV420PS,
    Y32 = ffi::AVS_CS_Y32,

    RGBP = ffi::AVS_CS_RGBP,
    RGBP10 = ffi::AVS_CS_RGBP10,
    RGBP12 = ffi::AVS_CS_RGBP12,
    RGBP14 = ffi::AVS_CS_RGBP14,
    RGBP16 = ffi::AVS_CS_RGBP16,
    RGBPS = ffi::AVS_CS_RGBPS,
    RGBAP = ffi::AVS_CS_RGBAP,
    RGBAP10 = ffi::AVS_CS_RGBAP10,
    RGBAP12 = ffi::AVS_CS_RGBAP12,
    RGBAP14 = ffi::AVS_CS_RGBAP14,
    RGBAP16 = ffi::AVS_CS_RGBAP16,
    RGBAPS = ffi::AVS_CS_RGBAPS,

    YUVA444 = ffi::AVS_CS_YUVA444,
    YUVA422 = ffi::AVS_CS_YUVA422,
    YUVA420 = ffi::AVS_CS_YUVA420,
    YUVA444P10 = ffi::AVS_CS_YUVA444P10,
    YUVA422P10 = ffi::AVS_CS_YUVA422P10,
    YUVA420P10 = ffi::AVS_CS_YUVA420P10,
    YUVA444P16 = ffi::AVS_CS_YUVA444P16,
    YUVA422P16 = ffi::AVS_CS_YUVA422P16,
    YUVA420P16 = ffi::AVS_CS_YUVA420P16,
    YUVA444PS = ffi::AVS_CS_YUVA444PS,
    YUVA422PS = ffi::AVS_CS_YUVA422PS,
    YUVA420PS = ffi::AVS_CS_YUVA420PS,
}

impl PresetFormat {
    /// Looks up the preset with exactly this bitmask.
    #[inline]
    pub fn from_pixel_type(pixel_type: PixelType) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|&format| format as u32 == pixel_type.0)
    }
}

impl From<PresetFormat> for PixelType {
    #[inline]
    fn from(x: PresetFormat) -> Self {
        PixelType(x as u32)
    }
}

impl Display for PresetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match PresetFormat::from_pixel_type(*self) {
            Some(format) => write!(f, "{}", format),
            None => write!(f, "pixel type {:#010x}", self.0),
        }
    }
}

const PLANES_Y: &[Plane] = &[Plane::Y];
const PLANES_YUV: &[Plane] = &[Plane::Y, Plane::U, Plane::V];
const PLANES_YUVA: &[Plane] = &[Plane::Y, Plane::U, Plane::V, Plane::A];
const PLANES_RGB: &[Plane] = &[Plane::G, Plane::B, Plane::R];
const PLANES_RGBA: &[Plane] = &[Plane::G, Plane::B, Plane::R, Plane::A];

impl PixelType {
    #[inline]
    fn has(self, flags: u32) -> bool {
        self.0 & flags == flags
    }

    #[inline]
    fn sample_bits(self) -> u32 {
        self.0 & ffi::AVS_CS_SAMPLE_BITS_MASK
    }

    /// Compares the planar layout ignoring the sample bit depth.
    #[inline]
    fn planar_layout_is(self, generic: u32) -> bool {
        self.0 & ffi::AVS_CS_PLANAR_MASK & !ffi::AVS_CS_SAMPLE_BITS_MASK
            == generic & ffi::AVS_CS_PLANAR_FILTER
    }

    #[inline]
    pub fn is_unknown(self) -> bool {
        self.0 == ffi::AVS_CS_UNKNOWN
    }

    #[inline]
    pub fn is_rgb(self) -> bool {
        self.0 & ffi::AVS_CS_BGR != 0
    }

    #[inline]
    pub fn is_rgb24(self) -> bool {
        self.has(ffi::AVS_CS_BGR24) && self.sample_bits() == ffi::AVS_CS_SAMPLE_BITS_8
    }

    #[inline]
    pub fn is_rgb32(self) -> bool {
        self.has(ffi::AVS_CS_BGR32) && self.sample_bits() == ffi::AVS_CS_SAMPLE_BITS_8
    }

    #[inline]
    pub fn is_rgb48(self) -> bool {
        self.has(ffi::AVS_CS_BGR24) && self.sample_bits() == ffi::AVS_CS_SAMPLE_BITS_16
    }

    #[inline]
    pub fn is_rgb64(self) -> bool {
        self.has(ffi::AVS_CS_BGR32) && self.sample_bits() == ffi::AVS_CS_SAMPLE_BITS_16
    }

    #[inline]
    pub fn is_yuv(self) -> bool {
        self.0 & ffi::AVS_CS_YUV != 0
    }

    #[inline]
    pub fn is_yuva(self) -> bool {
        self.0 & ffi::AVS_CS_YUVA != 0
    }

    #[inline]
    pub fn is_yuy2(self) -> bool {
        self.has(ffi::AVS_CS_YUY2)
    }

    #[inline]
    pub fn is_yv24(self) -> bool {
        self.0 & ffi::AVS_CS_PLANAR_MASK == ffi::AVS_CS_YV24 & ffi::AVS_CS_PLANAR_FILTER
    }

    #[inline]
    pub fn is_yv16(self) -> bool {
        self.0 & ffi::AVS_CS_PLANAR_MASK == ffi::AVS_CS_YV16 & ffi::AVS_CS_PLANAR_FILTER
    }

    /// Also true for I420, which only differs in plane order.
    #[inline]
    pub fn is_yv12(self) -> bool {
        self.0 & ffi::AVS_CS_PLANAR_MASK == ffi::AVS_CS_YV12 & ffi::AVS_CS_PLANAR_FILTER
    }

    #[inline]
    pub fn is_yv411(self) -> bool {
        self.0 & ffi::AVS_CS_PLANAR_MASK == ffi::AVS_CS_YV411 & ffi::AVS_CS_PLANAR_FILTER
    }

    #[inline]
    pub fn is_y8(self) -> bool {
        self.0 & ffi::AVS_CS_PLANAR_MASK == ffi::AVS_CS_Y8 & ffi::AVS_CS_PLANAR_FILTER
    }

    /// Greyscale of any bit depth.
    #[inline]
    pub fn is_y(self) -> bool {
        self.planar_layout_is(ffi::AVS_CS_GENERIC_Y)
    }

    #[inline]
    pub fn is_444(self) -> bool {
        self.planar_layout_is(ffi::AVS_CS_GENERIC_YUV444)
            || self.planar_layout_is(ffi::AVS_CS_GENERIC_YUVA444)
    }

    #[inline]
    pub fn is_422(self) -> bool {
        self.planar_layout_is(ffi::AVS_CS_GENERIC_YUV422)
            || self.planar_layout_is(ffi::AVS_CS_GENERIC_YUVA422)
    }

    #[inline]
    pub fn is_420(self) -> bool {
        self.planar_layout_is(ffi::AVS_CS_GENERIC_YUV420)
            || self.planar_layout_is(ffi::AVS_CS_GENERIC_YUVA420)
    }

    #[inline]
    pub fn is_planar(self) -> bool {
        self.0 & ffi::AVS_CS_PLANAR != 0
    }

    /// A packed format: every component of a pixel is stored together in one plane.
    #[inline]
    pub fn is_interleaved(self) -> bool {
        !self.is_unknown() && !self.is_planar()
    }

    #[inline]
    pub fn is_planar_rgb(self) -> bool {
        self.is_planar() && self.is_rgb() && self.has(ffi::AVS_CS_RGB_TYPE)
    }

    #[inline]
    pub fn is_planar_rgba(self) -> bool {
        self.is_planar() && self.is_rgb() && self.has(ffi::AVS_CS_RGBA_TYPE)
    }

    #[inline]
    pub fn is_v_plane_first(self) -> bool {
        !self.is_y()
            && self.is_planar()
            && self.0 & (ffi::AVS_CS_VPLANEFIRST | ffi::AVS_CS_UPLANEFIRST)
                == ffi::AVS_CS_VPLANEFIRST
    }

    /// Checks whether this format belongs to `color_space`, ignoring the plane order of planar
    /// formats.
    #[inline]
    pub fn is_color_space(self, color_space: PixelType) -> bool {
        if self.is_planar() {
            self.0 & ffi::AVS_CS_PLANAR_MASK == color_space.0 & ffi::AVS_CS_PLANAR_FILTER
        } else {
            self.has(color_space.0)
        }
    }

    /// Size of one component in bytes, 0 for unsupported bit depths.
    #[inline]
    pub fn component_size(self) -> usize {
        match self.sample_bits() {
            ffi::AVS_CS_SAMPLE_BITS_8 => 1,
            ffi::AVS_CS_SAMPLE_BITS_10
            | ffi::AVS_CS_SAMPLE_BITS_12
            | ffi::AVS_CS_SAMPLE_BITS_14
            | ffi::AVS_CS_SAMPLE_BITS_16 => 2,
            ffi::AVS_CS_SAMPLE_BITS_32 => 4,
            _ => 0,
        }
    }

    #[inline]
    pub fn bits_per_component(self) -> u32 {
        match self.sample_bits() {
            ffi::AVS_CS_SAMPLE_BITS_8 => 8,
            ffi::AVS_CS_SAMPLE_BITS_10 => 10,
            ffi::AVS_CS_SAMPLE_BITS_12 => 12,
            ffi::AVS_CS_SAMPLE_BITS_14 => 14,
            ffi::AVS_CS_SAMPLE_BITS_16 => 16,
            ffi::AVS_CS_SAMPLE_BITS_32 => 32,
            _ => 0,
        }
    }

    /// 32-bit formats store floating point samples.
    #[inline]
    pub fn is_float(self) -> bool {
        self.sample_bits() == ffi::AVS_CS_SAMPLE_BITS_32
    }

    #[inline]
    pub fn num_components(self) -> usize {
        if self.is_unknown() {
            0
        } else if self.is_rgb32() || self.is_rgb64() || self.is_yuva() || self.is_planar_rgba() {
            4
        } else if self.is_y() {
            1
        } else {
            3
        }
    }

    /// The planes a frame of this format has, in storage order.
    #[inline]
    pub fn planes(self) -> &'static [Plane] {
        if self.is_unknown() {
            &[]
        } else if !self.is_planar() || self.is_y() {
            PLANES_Y
        } else if self.is_planar_rgba() {
            PLANES_RGBA
        } else if self.is_planar_rgb() {
            PLANES_RGB
        } else if self.is_yuva() {
            PLANES_YUVA
        } else {
            PLANES_YUV
        }
    }

    #[inline]
    pub fn has_plane(self, plane: Plane) -> bool {
        self.planes().contains(&plane)
    }

    /// Returns the preset name, if this is a known format.
    #[inline]
    pub fn name(self) -> Option<&'static str> {
        PresetFormat::from_pixel_type(self).map(PresetFormat::name)
    }
}
