//! Clip formats.

use avisynth_sys as ffi;

use crate::format::{PixelType, Plane};

/// Audio sample formats.
#[repr(i32)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum SampleType {
    Int8 = ffi::AVS_SAMPLE_INT8,
    Int16 = ffi::AVS_SAMPLE_INT16,
    Int24 = ffi::AVS_SAMPLE_INT24,
    Int32 = ffi::AVS_SAMPLE_INT32,
    Float = ffi::AVS_SAMPLE_FLOAT,
}

impl SampleType {
    /// Size of one sample of one channel in bytes.
    #[inline]
    pub fn bytes(self) -> usize {
        match self {
            SampleType::Int8 => 1,
            SampleType::Int16 => 2,
            SampleType::Int24 => 3,
            SampleType::Int32 | SampleType::Float => 4,
        }
    }
}

/// Interlacing flags of `VideoInfo::image_type`.
pub mod image_type {
    use avisynth_sys as ffi;

    pub const BFF: i32 = ffi::AVS_IT_BFF;
    pub const TFF: i32 = ffi::AVS_IT_TFF;
    pub const FIELD_BASED: i32 = ffi::AVS_IT_FIELDBASED;
}

/// A clip's video and audio format.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct VideoInfo {
    /// 0 means no video.
    pub width: i32,
    pub height: i32,
    pub fps_numerator: u32,
    pub fps_denominator: u32,
    pub num_frames: i32,
    pub pixel_type: PixelType,
    /// 0 means no audio.
    pub audio_samples_per_second: i32,
    /// An `AVS_SAMPLE_*` flag.
    pub sample_type: i32,
    pub num_audio_samples: i64,
    pub nchannels: i32,
    /// A combination of the `image_type` flags.
    pub image_type: i32,
}

impl From<ffi::AVS_VideoInfo> for VideoInfo {
    #[inline]
    fn from(x: ffi::AVS_VideoInfo) -> Self {
        Self {
            width: x.width,
            height: x.height,
            fps_numerator: x.fps_numerator,
            fps_denominator: x.fps_denominator,
            num_frames: x.num_frames,
            pixel_type: PixelType(x.pixel_type),
            audio_samples_per_second: x.audio_samples_per_second,
            sample_type: x.sample_type,
            num_audio_samples: x.num_audio_samples,
            nchannels: x.nchannels,
            image_type: x.image_type,
        }
    }
}

impl From<VideoInfo> for ffi::AVS_VideoInfo {
    #[inline]
    fn from(x: VideoInfo) -> Self {
        Self {
            width: x.width,
            height: x.height,
            fps_numerator: x.fps_numerator,
            fps_denominator: x.fps_denominator,
            num_frames: x.num_frames,
            pixel_type: x.pixel_type.0,
            audio_samples_per_second: x.audio_samples_per_second,
            sample_type: x.sample_type,
            num_audio_samples: x.num_audio_samples,
            nchannels: x.nchannels,
            image_type: x.image_type,
        }
    }
}

/// Clamps a wide intermediate result to the `i64` range.
#[inline]
fn saturate(x: i128) -> i64 {
    x.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl VideoInfo {
    #[inline]
    pub fn has_video(&self) -> bool {
        self.width != 0
    }

    #[inline]
    pub fn has_audio(&self) -> bool {
        self.audio_samples_per_second != 0
    }

    #[inline]
    pub fn is_same_colorspace(&self, other: &VideoInfo) -> bool {
        self.pixel_type == other.pixel_type
            || (self.pixel_type.is_planar()
                && self.pixel_type.0 & ffi::AVS_CS_PLANAR_FILTER
                    == other.pixel_type.0 & ffi::AVS_CS_PLANAR_FILTER)
    }

    /// Horizontal subsampling of `plane` as a power of two.
    ///
    /// `None` if the format has no such plane.
    pub fn plane_width_subsampling(&self, plane: Plane) -> Option<u32> {
        let pixel_type = self.pixel_type;
        match plane {
            Plane::U | Plane::V => {
                if pixel_type.is_yuy2() {
                    Some(1)
                } else if pixel_type.is_planar()
                    && !pixel_type.is_y()
                    && (pixel_type.is_yuv() || pixel_type.is_yuva())
                {
                    Some(((pixel_type.0 >> ffi::AVS_CS_SHIFT_SUB_WIDTH) + 1) & 3)
                } else {
                    None
                }
            }
            _ if pixel_type.has_plane(plane) => Some(0),
            _ => None,
        }
    }

    /// Vertical subsampling of `plane` as a power of two.
    ///
    /// `None` if the format has no such plane.
    pub fn plane_height_subsampling(&self, plane: Plane) -> Option<u32> {
        let pixel_type = self.pixel_type;
        match plane {
            Plane::U | Plane::V => {
                if pixel_type.is_yuy2() {
                    Some(0)
                } else if pixel_type.is_planar()
                    && !pixel_type.is_y()
                    && (pixel_type.is_yuv() || pixel_type.is_yuva())
                {
                    Some(((pixel_type.0 >> ffi::AVS_CS_SHIFT_SUB_HEIGHT) + 1) & 3)
                } else {
                    None
                }
            }
            _ if pixel_type.has_plane(plane) => Some(0),
            _ => None,
        }
    }

    /// Average number of bits per pixel over all planes.
    pub fn bits_per_pixel(&self) -> u32 {
        let pixel_type = self.pixel_type;
        if pixel_type.is_planar() {
            let bits = pixel_type.component_size() as u32 * 8;
            if pixel_type.is_y() {
                bits
            } else if pixel_type.is_planar_rgba() {
                4 * bits
            } else if pixel_type.is_planar_rgb() {
                3 * bits
            } else {
                let shift = self.plane_width_subsampling(Plane::U).unwrap_or(0)
                    + self.plane_height_subsampling(Plane::U).unwrap_or(0);
                let full_size_planes = if pixel_type.is_yuva() { 2 } else { 1 };
                (((full_size_planes << shift) + 2) * bits) >> shift
            }
        } else if pixel_type.is_rgb24() {
            24
        } else if pixel_type.is_rgb32() || pixel_type.0 == ffi::AVS_CS_RAW32 {
            32
        } else if pixel_type.is_rgb48() {
            48
        } else if pixel_type.is_rgb64() {
            64
        } else if pixel_type.is_yuy2() {
            16
        } else {
            0
        }
    }

    /// Bytes taken by `pixels` pixels of the first plane.
    #[inline]
    pub fn bytes_from_pixels(&self, pixels: i64) -> i64 {
        if self.pixel_type.is_planar() {
            saturate(pixels as i128 * self.pixel_type.component_size() as i128)
        } else {
            saturate(pixels as i128 * (self.bits_per_pixel() / 8) as i128)
        }
    }

    /// Width of a row of `plane` in bytes, 0 if the format has no such plane.
    pub fn row_size(&self, plane: Plane) -> i64 {
        let row_size = self.bytes_from_pixels(self.width as i64);
        match plane {
            Plane::U | Plane::V => match self.plane_width_subsampling(plane) {
                Some(shift) if self.pixel_type.is_planar() => row_size >> shift,
                _ => 0,
            },
            _ if self.pixel_type.has_plane(plane) => row_size,
            _ => 0,
        }
    }

    /// Size of an uncompressed frame with rows padded to 4 bytes.
    pub fn bmp_size(&self) -> i64 {
        let height = self.height as i64;
        let align4 = |x: i64| (x + 3) & !3;
        let pixel_type = self.pixel_type;

        if pixel_type.is_planar() && !pixel_type.is_y() {
            let plane_bytes = align4(self.row_size(pixel_type.planes()[0])) * height;
            if pixel_type.is_planar_rgb() || pixel_type.is_planar_rgba() {
                return plane_bytes * pixel_type.planes().len() as i64;
            }

            let shift = self.plane_width_subsampling(Plane::U).unwrap_or(0)
                + self.plane_height_subsampling(Plane::U).unwrap_or(0);
            let chroma_bytes = plane_bytes >> shift;
            let alpha_bytes = if pixel_type.is_yuva() { plane_bytes } else { 0 };
            return plane_bytes + 2 * chroma_bytes + alpha_bytes;
        }

        height * align4(self.row_size(Plane::Y))
    }

    #[inline]
    pub fn sample_format(&self) -> Option<SampleType> {
        match self.sample_type {
            ffi::AVS_SAMPLE_INT8 => Some(SampleType::Int8),
            ffi::AVS_SAMPLE_INT16 => Some(SampleType::Int16),
            ffi::AVS_SAMPLE_INT24 => Some(SampleType::Int24),
            ffi::AVS_SAMPLE_INT32 => Some(SampleType::Int32),
            ffi::AVS_SAMPLE_FLOAT => Some(SampleType::Float),
            _ => None,
        }
    }

    #[inline]
    pub fn is_sample_type(&self, sample_type: SampleType) -> bool {
        self.sample_type & sample_type as i32 != 0
    }

    /// 0 for an unknown sample format.
    #[inline]
    pub fn bytes_per_channel_sample(&self) -> usize {
        self.sample_format().map_or(0, SampleType::bytes)
    }

    #[inline]
    pub fn bytes_per_audio_sample(&self) -> usize {
        self.bytes_per_channel_sample() * self.nchannels.max(0) as usize
    }

    #[inline]
    pub fn audio_channels(&self) -> i32 {
        if self.has_audio() { self.nchannels } else { 0 }
    }

    /// Index of the first audio sample of frame `frames`, 0 without a valid frame rate.
    #[inline]
    pub fn audio_samples_from_frames(&self, frames: i64) -> i64 {
        if self.fps_numerator == 0 || self.fps_denominator == 0 || !self.has_video() {
            return 0;
        }
        saturate(
            frames as i128 * self.audio_samples_per_second as i128 * self.fps_denominator as i128
                / self.fps_numerator as i128,
        )
    }

    /// Index of the frame playing at audio sample `samples`, 0 without a valid frame rate.
    #[inline]
    pub fn frames_from_audio_samples(&self, samples: i64) -> i64 {
        if self.fps_denominator == 0 || !self.has_audio() {
            return 0;
        }
        saturate(
            samples as i128 * self.fps_numerator as i128
                / (self.fps_denominator as i128 * self.audio_samples_per_second as i128),
        )
    }

    #[inline]
    pub fn audio_samples_from_bytes(&self, bytes: i64) -> i64 {
        match self.bytes_per_audio_sample() {
            0 => 0,
            _ if !self.has_audio() => 0,
            bytes_per_sample => bytes / bytes_per_sample as i64,
        }
    }

    #[inline]
    pub fn bytes_from_audio_samples(&self, samples: i64) -> i64 {
        saturate(samples as i128 * self.bytes_per_audio_sample() as i128)
    }

    #[inline]
    pub fn is_field_based(&self) -> bool {
        self.image_type & image_type::FIELD_BASED != 0
    }

    /// Whether a field-based clip declares its field order.
    #[inline]
    pub fn is_parity_known(&self) -> bool {
        self.is_field_based() && self.has_field_order()
    }

    /// Whether either field order flag is set, for field or frame-based clips.
    #[inline]
    pub fn has_field_order(&self) -> bool {
        self.image_type & (image_type::BFF | image_type::TFF) != 0
    }

    #[inline]
    pub fn is_bff(&self) -> bool {
        self.image_type & image_type::BFF != 0
    }

    #[inline]
    pub fn is_tff(&self) -> bool {
        self.image_type & image_type::TFF != 0
    }

    #[inline]
    pub fn set_field_based(&mut self, field_based: bool) {
        if field_based {
            self.image_type |= image_type::FIELD_BASED;
        } else {
            self.image_type &= !image_type::FIELD_BASED;
        }
    }

    #[inline]
    pub fn set_property(&mut self, property: i32) {
        self.image_type |= property;
    }

    #[inline]
    pub fn clear_property(&mut self, property: i32) {
        self.image_type &= !property;
    }

    /// Sets the frame rate, reduced to lowest terms. A zero term gives 0/1.
    pub fn set_fps(&mut self, numerator: u32, denominator: u32) {
        if numerator == 0 || denominator == 0 {
            self.fps_numerator = 0;
            self.fps_denominator = 1;
            return;
        }

        let (mut x, mut y) = (numerator, denominator);
        while y != 0 {
            let t = x % y;
            x = y;
            y = t;
        }
        self.fps_numerator = numerator / x;
        self.fps_denominator = denominator / x;
    }

    /// Frame rate in frames per second, 0 without a valid frame rate.
    #[inline]
    pub fn fps(&self) -> f64 {
        if self.fps_denominator == 0 {
            0.0
        } else {
            self.fps_numerator as f64 / self.fps_denominator as f64
        }
    }
}
