//! Clips.

use std::fmt;
use std::os::raw::c_int;
use std::ptr::NonNull;

use avisynth_sys as ffi;
use parking_lot::Mutex;
use tracing::warn;

use crate::environment::ScriptEnvironment;
use crate::error::{Error, Result, native_message};
use crate::frame::VideoFrame;
use crate::video_info::VideoInfo;

/// Field order of a frame.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Parity {
    TopFirst,
    BottomFirst,
    /// The clip is field-based but declares no field order.
    Unknown,
    /// The clip is frame-based and declares no field order.
    FrameBased,
}

/// Cache hints understood by `Clip::set_cache_hints()`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CacheHint {
    Nothing = ffi::AVS_CACHE_NOTHING,
    Window = ffi::AVS_CACHE_WINDOW,
    Generic = ffi::AVS_CACHE_GENERIC,
    ForceGeneric = ffi::AVS_CACHE_FORCE_GENERIC,
    GetPolicy = ffi::AVS_CACHE_GET_POLICY,
    GetWindow = ffi::AVS_CACHE_GET_WINDOW,
    GetRange = ffi::AVS_CACHE_GET_RANGE,
    Audio = ffi::AVS_CACHE_AUDIO,
    AudioNothing = ffi::AVS_CACHE_AUDIO_NOTHING,
    AudioNone = ffi::AVS_CACHE_AUDIO_NONE,
    AudioAuto = ffi::AVS_CACHE_AUDIO_AUTO,
    GetAudioPolicy = ffi::AVS_CACHE_GET_AUDIO_POLICY,
    GetAudioSize = ffi::AVS_CACHE_GET_AUDIO_SIZE,
    PrefetchFrame = ffi::AVS_CACHE_PREFETCH_FRAME,
    PrefetchGo = ffi::AVS_CACHE_PREFETCH_GO,
    GetChildCacheMode = ffi::AVS_CACHE_GETCHILD_CACHE_MODE,
    GetChildCacheSize = ffi::AVS_CACHE_GETCHILD_CACHE_SIZE,
    GetChildAudioMode = ffi::AVS_CACHE_GETCHILD_AUDIO_MODE,
    GetChildAudioSize = ffi::AVS_CACHE_GETCHILD_AUDIO_SIZE,
    GetChildCost = ffi::AVS_CACHE_GETCHILD_COST,
    GetChildThreadMode = ffi::AVS_CACHE_GETCHILD_THREAD_MODE,
    GetChildAccessCost = ffi::AVS_CACHE_GETCHILD_ACCESS_COST,
}

/// Threading behavior a filter reports about itself.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ThreadMode {
    Unsafe,
    Class,
    Safe,
    Own,
    /// The filter didn't answer the query.
    Unknown(i32),
}

impl ThreadMode {
    /// Only fully thread-safe filters may be called concurrently without serialization.
    #[inline]
    pub fn is_thread_safe(self) -> bool {
        self == ThreadMode::Safe
    }
}

/// Per-frame cost a filter reports about itself.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CacheCost {
    Zero,
    Unit,
    Low,
    Medium,
    High,
    Unknown(i32),
}

/// A reference to a clip.
///
/// Cloning takes a new native reference; dropping releases it.
pub struct Clip<'env> {
    env: &'env ScriptEnvironment,
    handle: NonNull<ffi::AVS_Clip>,
    last_error: Mutex<Option<String>>,
}

unsafe impl Send for Clip<'_> {}
unsafe impl Sync for Clip<'_> {}

impl Drop for Clip<'_> {
    #[inline]
    fn drop(&mut self) {
        let _guard = self.env.lock();
        unsafe {
            self.env.api().release_clip(self.handle.as_ptr());
        }
    }
}

impl Clone for Clip<'_> {
    #[inline]
    fn clone(&self) -> Self {
        let _guard = self.env.lock();
        let handle = unsafe { self.env.api().copy_clip(self.handle.as_ptr()) };
        Self {
            env: self.env,
            handle: NonNull::new(handle).expect("the engine couldn't copy a clip"),
            last_error: Mutex::new(None),
        }
    }
}

impl fmt::Debug for Clip<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clip")
            .field("handle", &self.handle)
            .field("video_info", &self.video_info())
            .finish()
    }
}

impl<'env> Clip<'env> {
    /// Wraps a clip reference.
    ///
    /// # Safety
    /// The caller must ensure `handle` is a reference owned by the caller and produced by `env`.
    #[inline]
    pub(crate) unsafe fn from_ptr(
        env: &'env ScriptEnvironment,
        handle: NonNull<ffi::AVS_Clip>,
    ) -> Self {
        Self {
            env,
            handle,
            last_error: Mutex::new(None),
        }
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut ffi::AVS_Clip {
        self.handle.as_ptr()
    }

    /// Returns the environment this clip belongs to.
    #[inline]
    pub fn env(&self) -> &'env ScriptEnvironment {
        self.env
    }

    /// Returns the clip's format.
    #[inline]
    pub fn video_info(&self) -> VideoInfo {
        let _guard = self.env.lock();
        unsafe { VideoInfo::from(*self.env.api().get_video_info(self.handle.as_ptr())) }
    }

    /// Returns the interface version of the filter behind this clip.
    #[inline]
    pub fn version(&self) -> i32 {
        let _guard = self.env.lock();
        unsafe { self.env.api().get_version(self.handle.as_ptr()) }
    }

    /// Returns the error of the last failed frame request, cleared by a successful one.
    #[inline]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Produces a frame.
    pub fn get_frame(&self, n: usize) -> Result<VideoFrame<'env>> {
        let index = match c_int::try_from(n) {
            Ok(index) => index,
            Err(_) => {
                let message = format!("frame {} is out of range", n);
                warn!(frame = n, %message, "couldn't get a frame");
                *self.last_error.lock() = Some(message.clone());
                return Err(Error::FrameDecodeError(message));
            }
        };

        let api = self.env.api();
        let _guard = self.env.lock();
        let frame = unsafe { api.get_frame(self.handle.as_ptr(), index) };
        // Read right away, the next call on this clip overwrites it.
        let error = unsafe { native_message(api.clip_get_error(self.handle.as_ptr())) };

        match (NonNull::new(frame), error) {
            (Some(frame), None) => {
                *self.last_error.lock() = None;
                let pixel_type = self.video_info().pixel_type;
                Ok(unsafe { VideoFrame::from_ptr(self.env, frame, pixel_type) })
            }
            (frame, error) => {
                if let Some(frame) = frame {
                    unsafe { api.release_video_frame(frame.as_ptr()) };
                }
                let message = error.unwrap_or_else(|| "the engine returned no frame".to_owned());
                warn!(frame = n, %message, "couldn't get a frame");
                *self.last_error.lock() = Some(message.clone());
                Err(Error::FrameDecodeError(message))
            }
        }
    }

    /// Returns the field order of frame `n`.
    pub fn parity(&self, n: usize) -> Parity {
        let vi = self.video_info();
        if !vi.has_field_order() {
            return if vi.is_field_based() {
                Parity::Unknown
            } else {
                Parity::FrameBased
            };
        }

        let n = n.min(i32::MAX as usize) as c_int;
        let _guard = self.env.lock();
        if unsafe { self.env.api().get_parity(self.handle.as_ptr(), n) } != 0 {
            Parity::TopFirst
        } else {
            Parity::BottomFirst
        }
    }

    /// Reads `count` audio samples starting at sample `start`.
    ///
    /// A negative `start` is clamped to 0, and a request past the last sample is cut short, so
    /// the buffer may hold fewer than `count` samples.
    pub fn get_audio(&self, start: i64, count: i64) -> Result<Vec<u8>> {
        let vi = self.video_info();
        if !vi.has_audio() {
            return Err(Error::NoAudioTrack);
        }

        let start = start.max(0);
        let count = count.min(vi.num_audio_samples.saturating_sub(start));
        if count <= 0 {
            return Ok(Vec::new());
        }

        let size = usize::try_from(vi.bytes_from_audio_samples(count))
            .ok()
            .filter(|&size| size > 0)
            .ok_or_else(|| {
                Error::AudioDecodeError(format!("can't buffer {} samples of this format", count))
            })?;
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size).map_err(|err| {
            Error::AudioDecodeError(format!("can't buffer {} samples: {}", count, err))
        })?;
        buffer.resize(size, 0);

        let api = self.env.api();
        let _guard = self.env.lock();
        let rv = unsafe {
            api.get_audio(self.handle.as_ptr(), buffer.as_mut_ptr().cast(), start, count)
        };
        if rv != 0 {
            let message = unsafe { native_message(api.clip_get_error(self.handle.as_ptr())) }
                .unwrap_or_else(|| "the engine couldn't produce audio".to_owned());
            warn!(start, count, %message, "couldn't get audio");
            return Err(Error::AudioDecodeError(message));
        }

        Ok(buffer)
    }

    /// Reads the audio samples that play during frame `n`.
    pub fn audio_for_frame(&self, n: usize) -> Result<Vec<u8>> {
        let vi = self.video_info();
        let n = i64::try_from(n).unwrap_or(i64::MAX - 1);
        let start = vi.audio_samples_from_frames(n);
        let end = vi.audio_samples_from_frames(n + 1);
        self.get_audio(start, end - start)
    }

    /// Sends a cache hint to the clip and returns its answer.
    #[inline]
    pub fn set_cache_hints(&self, hint: CacheHint, frame_range: i32) -> i32 {
        let _guard = self.env.lock();
        unsafe {
            self.env
                .api()
                .set_cache_hints(self.handle.as_ptr(), hint as c_int, frame_range)
        }
    }

    /// Queries how the filter behind this clip may be called from multiple threads.
    pub fn thread_mode(&self) -> ThreadMode {
        match self.set_cache_hints(CacheHint::GetChildThreadMode, 0) {
            ffi::AVS_CACHE_THREAD_UNSAFE => ThreadMode::Unsafe,
            ffi::AVS_CACHE_THREAD_CLASS => ThreadMode::Class,
            ffi::AVS_CACHE_THREAD_SAFE => ThreadMode::Safe,
            ffi::AVS_CACHE_THREAD_OWN => ThreadMode::Own,
            other => ThreadMode::Unknown(other),
        }
    }

    /// Queries the per-frame cost of the filter behind this clip.
    pub fn cost(&self) -> CacheCost {
        match self.set_cache_hints(CacheHint::GetChildCost, 0) {
            ffi::AVS_CACHE_COST_ZERO => CacheCost::Zero,
            ffi::AVS_CACHE_COST_UNIT => CacheCost::Unit,
            ffi::AVS_CACHE_COST_LOW => CacheCost::Low,
            ffi::AVS_CACHE_COST_MED => CacheCost::Medium,
            ffi::AVS_CACHE_COST_HI => CacheCost::High,
            other => CacheCost::Unknown(other),
        }
    }
}
