//! Video frames.

use std::fmt;
use std::mem;
use std::ptr::NonNull;
use std::slice;

use avisynth_sys as ffi;

use crate::component::Component;
use crate::environment::ScriptEnvironment;
use crate::error::{Error, Result};
use crate::format::{PixelType, Plane};

/// A reference to a frame.
///
/// Cloning takes a new reference sharing the pixel buffer, which makes both copies read-only
/// until one is dropped or replaced with `ScriptEnvironment::make_writable()`.
pub struct VideoFrame<'env> {
    env: &'env ScriptEnvironment,
    handle: NonNull<ffi::AVS_VideoFrame>,
    pixel_type: PixelType,
}

unsafe impl Send for VideoFrame<'_> {}
unsafe impl Sync for VideoFrame<'_> {}

impl Drop for VideoFrame<'_> {
    #[inline]
    fn drop(&mut self) {
        let _guard = self.env.lock();
        unsafe {
            self.env.api().release_video_frame(self.handle.as_ptr());
        }
    }
}

impl Clone for VideoFrame<'_> {
    #[inline]
    fn clone(&self) -> Self {
        let _guard = self.env.lock();
        let handle = unsafe { self.env.api().copy_video_frame(self.handle.as_ptr()) };
        Self {
            env: self.env,
            handle: NonNull::new(handle).expect("the engine couldn't copy a frame"),
            pixel_type: self.pixel_type,
        }
    }
}

impl fmt::Debug for VideoFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoFrame")
            .field("handle", &self.handle)
            .field("pixel_type", &self.pixel_type)
            .finish()
    }
}

impl<'env> VideoFrame<'env> {
    /// Wraps a frame reference.
    ///
    /// # Safety
    /// The caller must ensure `handle` is a reference owned by the caller, produced by `env`,
    /// with the given pixel type.
    #[inline]
    pub(crate) unsafe fn from_ptr(
        env: &'env ScriptEnvironment,
        handle: NonNull<ffi::AVS_VideoFrame>,
        pixel_type: PixelType,
    ) -> Self {
        Self {
            env,
            handle,
            pixel_type,
        }
    }

    /// Replaces the handle without releasing the old one.
    ///
    /// # Safety
    /// The old reference must have been released or transferred by the engine.
    #[inline]
    pub(crate) unsafe fn replace_handle(&mut self, handle: NonNull<ffi::AVS_VideoFrame>) {
        self.handle = handle;
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut ffi::AVS_VideoFrame {
        self.handle.as_ptr()
    }

    #[inline]
    pub(crate) fn env(&self) -> &'env ScriptEnvironment {
        self.env
    }

    #[inline]
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// The planes of this frame, in storage order.
    #[inline]
    pub fn planes(&self) -> &'static [Plane] {
        self.pixel_type.planes()
    }

    /// Fails before any native call if the format has no such plane.
    #[inline]
    fn check_plane(&self, plane: Plane) -> Result<()> {
        if self.pixel_type.has_plane(plane) {
            Ok(())
        } else {
            Err(Error::InvalidPlane {
                plane,
                pixel_type: self.pixel_type,
            })
        }
    }

    /// Returns the distance between rows of `plane` in bytes.
    #[inline]
    pub fn pitch(&self, plane: Plane) -> Result<usize> {
        self.check_plane(plane)?;
        let _guard = self.env.lock();
        let pitch = unsafe { self.env.api().get_pitch_p(self.handle.as_ptr(), plane.ffi_type()) };
        Ok(pitch.max(0) as usize)
    }

    /// Returns the width of `plane` in bytes.
    #[inline]
    pub fn row_size(&self, plane: Plane) -> Result<usize> {
        self.check_plane(plane)?;
        let _guard = self.env.lock();
        let row_size =
            unsafe { self.env.api().get_row_size_p(self.handle.as_ptr(), plane.ffi_type()) };
        Ok(row_size.max(0) as usize)
    }

    /// Returns the height of `plane` in rows.
    #[inline]
    pub fn height(&self, plane: Plane) -> Result<usize> {
        self.check_plane(plane)?;
        let _guard = self.env.lock();
        let height = unsafe { self.env.api().get_height_p(self.handle.as_ptr(), plane.ffi_type()) };
        Ok(height.max(0) as usize)
    }

    /// Returns a pointer to the first row of `plane`.
    #[inline]
    pub fn read_ptr(&self, plane: Plane) -> Result<*const u8> {
        self.check_plane(plane)?;
        let _guard = self.env.lock();
        Ok(unsafe {
            self.env
                .api()
                .get_read_ptr_p(self.handle.as_ptr(), plane.ffi_type())
        })
    }

    /// Returns a writable pointer to the first row of `plane`.
    ///
    /// Fails if the frame is shared, see `ScriptEnvironment::make_writable()`.
    pub fn write_ptr(&mut self, plane: Plane) -> Result<*mut u8> {
        self.check_plane(plane)?;
        let _guard = self.env.lock();
        if !self.is_writable() {
            return Err(Error::FrameNotWritable);
        }

        let ptr = unsafe {
            self.env
                .api()
                .get_write_ptr_p(self.handle.as_ptr(), plane.ffi_type())
        };
        if ptr.is_null() {
            Err(Error::FrameNotWritable)
        } else {
            Ok(ptr)
        }
    }

    /// Returns whether neither the frame nor its buffer is shared.
    #[inline]
    pub fn is_writable(&self) -> bool {
        let _guard = self.env.lock();
        unsafe { self.env.api().is_writable(self.handle.as_ptr()) != 0 }
    }

    /// Number of bytes spanned by `height` rows.
    #[inline]
    fn plane_len(pitch: usize, row_size: usize, height: usize) -> usize {
        if height == 0 {
            0
        } else {
            pitch * (height - 1) + row_size
        }
    }

    /// Returns the bytes of `plane`, including the padding between rows.
    pub fn plane_data(&self, plane: Plane) -> Result<&[u8]> {
        let pitch = self.pitch(plane)?;
        let row_size = self.row_size(plane)?;
        let height = self.height(plane)?;
        let len = Self::plane_len(pitch, row_size, height);
        if len == 0 {
            return Ok(&[]);
        }

        let ptr = self.read_ptr(plane)?;
        Ok(unsafe { slice::from_raw_parts(ptr, len) })
    }

    /// Returns a row of `plane` as pixel components.
    ///
    /// # Panics
    /// Panics if `T` doesn't match the pixel type or `row` is out of bounds.
    pub fn plane_row<T: Component>(&self, plane: Plane, row: usize) -> Result<&[T]> {
        assert!(T::is_valid(self.pixel_type));

        let height = self.height(plane)?;
        assert!(row < height);

        let pitch = self.pitch(plane)?;
        let row_size = self.row_size(plane)?;
        let ptr = self.read_ptr(plane)?;

        let data = unsafe { ptr.add(pitch * row) };
        debug_assert_eq!(data as usize % mem::align_of::<T>(), 0);
        Ok(unsafe { slice::from_raw_parts(data as *const T, row_size / mem::size_of::<T>()) })
    }

    /// Returns a mutable row of `plane` as pixel components.
    ///
    /// # Panics
    /// Panics if `T` doesn't match the pixel type or `row` is out of bounds.
    pub fn plane_row_mut<T: Component>(&mut self, plane: Plane, row: usize) -> Result<&mut [T]> {
        assert!(T::is_valid(self.pixel_type));

        let height = self.height(plane)?;
        assert!(row < height);

        let pitch = self.pitch(plane)?;
        let row_size = self.row_size(plane)?;
        let ptr = self.write_ptr(plane)?;

        let data = unsafe { ptr.add(pitch * row) };
        debug_assert_eq!(data as usize % mem::align_of::<T>(), 0);
        Ok(unsafe { slice::from_raw_parts_mut(data as *mut T, row_size / mem::size_of::<T>()) })
    }

    /// Copies every plane into one buffer, in storage order and without row padding.
    pub fn to_packed(&self) -> Result<Vec<u8>> {
        let mut layout = Vec::with_capacity(self.planes().len());
        for &plane in self.planes() {
            layout.push((plane, self.row_size(plane)?, self.height(plane)?));
        }

        let total = layout.iter().map(|&(_, row_size, height)| row_size * height).sum();
        let mut packed = vec![0u8; total];

        let mut offset = 0;
        for (plane, row_size, height) in layout {
            let size = row_size * height;
            self.env.bit_blt(
                &mut packed[offset..offset + size],
                row_size,
                self.plane_data(plane)?,
                self.pitch(plane)?,
                row_size,
                height,
            )?;
            offset += size;
        }

        Ok(packed)
    }
}
