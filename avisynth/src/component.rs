//! Valid pixel component types.

use crate::format::PixelType;

/// A trait for possible pixel components.
///
/// # Safety
/// Implementing this trait allows retrieving slices of pixel data from the frame for the target
/// type, so the target type must be valid for the given pixel type.
pub unsafe trait Component: Copy {
    /// Returns whether this component is valid for this pixel type.
    fn is_valid(pixel_type: PixelType) -> bool;
}

unsafe impl Component for u8 {
    #[inline]
    fn is_valid(pixel_type: PixelType) -> bool {
        pixel_type.component_size() == 1
    }
}

unsafe impl Component for u16 {
    #[inline]
    fn is_valid(pixel_type: PixelType) -> bool {
        pixel_type.component_size() == 2
    }
}

unsafe impl Component for f32 {
    #[inline]
    fn is_valid(pixel_type: PixelType) -> bool {
        pixel_type.is_float()
    }
}
