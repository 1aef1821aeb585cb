//! The loaded engine library and its entry points.

use std::fmt;
use std::os::raw::{c_char, c_int, c_void};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use avisynth_sys as ffi;
use avisynth_sys::libloading::Library;
use parking_lot::Mutex;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fallback;

/// Which optional entry points the engine provides natively.
///
/// Missing ones are served by software fallbacks.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Capabilities {
    pub get_error: bool,
    pub bit_blt: bool,
    pub get_pitch_p: bool,
    pub get_row_size_p: bool,
    pub get_height_p: bool,
    pub get_read_ptr_p: bool,
    pub get_write_ptr_p: bool,
    pub is_writable: bool,
    pub save_string: bool,
    pub add_function: bool,
    pub at_exit: bool,
    pub subframe: bool,
    pub subframe_planar: bool,
}

struct Inner {
    functions: ffi::AvisynthFunctions,

    get_error: ffi::avs_get_error_func,
    bit_blt: ffi::avs_bit_blt_func,
    get_pitch_p: ffi::avs_get_pitch_p_func,
    get_row_size_p: ffi::avs_get_row_size_p_func,
    get_height_p: ffi::avs_get_height_p_func,
    get_read_ptr_p: ffi::avs_get_read_ptr_p_func,
    get_write_ptr_p: ffi::avs_get_write_ptr_p_func,
    is_writable: ffi::avs_is_writable_func,

    capabilities: Capabilities,

    // Keeps the entry points valid.
    library: Option<(Library, PathBuf)>,
}

/// A handle to the engine's entry points.
///
/// Cloning is cheap. The library stays loaded for as long as a clone exists.
#[derive(Clone)]
pub struct API {
    inner: Arc<Inner>,
}

impl fmt::Debug for API {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("API")
            .field("library", &self.library_path())
            .field("capabilities", &self.inner.capabilities)
            .finish()
    }
}

/// The API loaded by `API::get()`.
static CACHED_API: Mutex<Option<API>> = Mutex::new(None);

macro_rules! resolve {
    ($functions:expr, $capabilities:expr, $field:ident => $name:ident, $fallback:path) => {
        match $functions.$field {
            Some(function) => {
                $capabilities.$name = true;
                function
            }
            None => {
                debug!(entry_point = stringify!($field), "using the software fallback");
                $fallback
            }
        }
    };
}

impl API {
    /// Retrieves the engine API, loading the library on first use.
    ///
    /// The library location is read with `Config::from_env()`. The result is cached for the
    /// lifetime of the process.
    pub fn get() -> Result<Self> {
        let mut cached = CACHED_API.lock();
        if let Some(api) = cached.as_ref() {
            return Ok(api.clone());
        }

        let api = Self::load(&Config::from_env())?;
        *cached = Some(api.clone());
        Ok(api)
    }

    /// Loads the engine library described by `config`, bypassing the cache.
    pub fn load(config: &Config) -> Result<Self> {
        let (library, path) = unsafe {
            ffi::open_library(config.library_dir.as_deref(), config.library_name.as_deref())
        }
        .map_err(|err| Error::NativeLibraryUnavailable {
            reason: err.to_string(),
        })?;

        let functions = unsafe { ffi::AvisynthFunctions::load(&library) }.map_err(|err| {
            Error::NativeLibraryUnavailable {
                reason: format!("{}: {}", path.display(), err),
            }
        })?;

        debug!(path = %path.display(), "loaded the AviSynth library");
        Ok(Self::new(functions, Some((library, path))))
    }

    /// Wraps an already resolved function table.
    ///
    /// # Safety
    /// Every function pointer must implement the C interface contract and stay valid for the
    /// lifetime of the returned API and everything created through it.
    pub unsafe fn from_functions(functions: ffi::AvisynthFunctions) -> Self {
        Self::new(functions, None)
    }

    fn new(functions: ffi::AvisynthFunctions, library: Option<(Library, PathBuf)>) -> Self {
        let mut capabilities = Capabilities::default();

        let get_error = resolve!(
            functions,
            capabilities,
            avs_get_error => get_error,
            fallback::get_error
        );
        let bit_blt = resolve!(
            functions,
            capabilities,
            avs_bit_blt => bit_blt,
            fallback::bit_blt
        );
        let get_pitch_p = resolve!(
            functions,
            capabilities,
            avs_get_pitch_p => get_pitch_p,
            fallback::get_pitch_p
        );
        let get_row_size_p = resolve!(
            functions,
            capabilities,
            avs_get_row_size_p => get_row_size_p,
            fallback::get_row_size_p
        );
        let get_height_p = resolve!(
            functions,
            capabilities,
            avs_get_height_p => get_height_p,
            fallback::get_height_p
        );
        let get_read_ptr_p = resolve!(
            functions,
            capabilities,
            avs_get_read_ptr_p => get_read_ptr_p,
            fallback::get_read_ptr_p
        );
        let get_write_ptr_p = resolve!(
            functions,
            capabilities,
            avs_get_write_ptr_p => get_write_ptr_p,
            fallback::get_write_ptr_p
        );
        let is_writable = resolve!(
            functions,
            capabilities,
            avs_is_writable => is_writable,
            fallback::is_writable
        );

        capabilities.save_string = functions.avs_save_string.is_some();
        capabilities.add_function = functions.avs_add_function.is_some();
        capabilities.at_exit = functions.avs_at_exit.is_some();
        capabilities.subframe = functions.avs_subframe.is_some();
        capabilities.subframe_planar = functions.avs_subframe_planar.is_some();

        Self {
            inner: Arc::new(Inner {
                functions,
                get_error,
                bit_blt,
                get_pitch_p,
                get_row_size_p,
                get_height_p,
                get_read_ptr_p,
                get_write_ptr_p,
                is_writable,
                capabilities,
                library,
            }),
        }
    }

    /// Returns which optional entry points are native.
    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.inner.capabilities
    }

    /// Returns the path of the loaded library, if the API was loaded from one.
    #[inline]
    pub fn library_path(&self) -> Option<&Path> {
        self.inner.library.as_ref().map(|(_, path)| path.as_path())
    }

    #[inline]
    fn functions(&self) -> &ffi::AvisynthFunctions {
        &self.inner.functions
    }

    /// Creates a script environment.
    ///
    /// # Safety
    /// The returned pointer, if not null, must be released with `delete_script_environment()`.
    #[inline]
    pub(crate) unsafe fn create_script_environment(
        &self,
        version: c_int,
    ) -> *mut ffi::AVS_ScriptEnvironment {
        (self.functions().avs_create_script_environment)(version)
    }

    /// Deletes a script environment.
    ///
    /// # Safety
    /// The caller must ensure `env` is valid and not used afterwards.
    #[inline]
    pub(crate) unsafe fn delete_script_environment(&self, env: *mut ffi::AVS_ScriptEnvironment) {
        (self.functions().avs_delete_script_environment)(env)
    }

    /// Returns the environment's last error message, or null.
    ///
    /// # Safety
    /// The caller must ensure `env` is valid.
    #[inline]
    pub(crate) unsafe fn get_error(&self, env: *mut ffi::AVS_ScriptEnvironment) -> *const c_char {
        (self.inner.get_error)(env)
    }

    /// # Safety
    /// The caller must ensure `env` is valid.
    #[inline]
    pub(crate) unsafe fn check_version(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        version: c_int,
    ) -> c_int {
        (self.functions().avs_check_version)(env, version)
    }

    /// # Safety
    /// The caller must ensure `env` is valid.
    #[inline]
    pub(crate) unsafe fn get_cpu_flags(&self, env: *mut ffi::AVS_ScriptEnvironment) -> c_int {
        (self.functions().avs_get_cpu_flags)(env)
    }

    /// # Safety
    /// The caller must ensure `env` and `name` are valid.
    #[inline]
    pub(crate) unsafe fn function_exists(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        name: *const c_char,
    ) -> c_int {
        (self.functions().avs_function_exists)(env, name)
    }

    /// Invokes a script function.
    ///
    /// # Safety
    /// The caller must ensure all pointers are valid, `arg_names` is null or has as many entries
    /// as `args` has elements, and the returned value is released.
    #[inline]
    pub(crate) unsafe fn invoke(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        name: *const c_char,
        args: ffi::AVS_Value,
        arg_names: *const *const c_char,
    ) -> ffi::AVS_Value {
        (self.functions().avs_invoke)(env, name, args, arg_names)
    }

    /// # Safety
    /// The caller must ensure `env` and `name` are valid and the returned value is released.
    #[inline]
    pub(crate) unsafe fn get_var(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        name: *const c_char,
    ) -> ffi::AVS_Value {
        (self.functions().avs_get_var)(env, name)
    }

    /// # Safety
    /// The caller must ensure `env` is valid and `name` and any string in `value` outlive the
    /// environment.
    #[inline]
    pub(crate) unsafe fn set_var(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        name: *const c_char,
        value: ffi::AVS_Value,
    ) -> c_int {
        (self.functions().avs_set_var)(env, name, value)
    }

    /// # Safety
    /// Same as `set_var()`.
    #[inline]
    pub(crate) unsafe fn set_global_var(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        name: *const c_char,
        value: ffi::AVS_Value,
    ) -> c_int {
        (self.functions().avs_set_global_var)(env, name, value)
    }

    /// # Safety
    /// The caller must ensure `env` and `vi` are valid.
    #[inline]
    pub(crate) unsafe fn new_video_frame_a(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        vi: *const ffi::AVS_VideoInfo,
        align: c_int,
    ) -> *mut ffi::AVS_VideoFrame {
        (self.functions().avs_new_video_frame_a)(env, vi, align)
    }

    /// Replaces `*frame` with a writable copy if it is shared.
    ///
    /// # Safety
    /// The caller must ensure `env` and `*frame` are valid.
    #[inline]
    pub(crate) unsafe fn make_writable(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        frame: *mut *mut ffi::AVS_VideoFrame,
    ) -> c_int {
        (self.functions().avs_make_writable)(env, frame)
    }

    /// # Safety
    /// The caller must ensure both regions are valid for `height` rows of `row_size` bytes with
    /// the given pitches.
    #[inline]
    #[allow(clippy::too_many_arguments)]
    pub(crate) unsafe fn bit_blt(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        dstp: *mut u8,
        dst_pitch: c_int,
        srcp: *const u8,
        src_pitch: c_int,
        row_size: c_int,
        height: c_int,
    ) {
        (self.inner.bit_blt)(env, dstp, dst_pitch, srcp, src_pitch, row_size, height)
    }

    /// # Safety
    /// The caller must ensure `env` is valid.
    #[inline]
    pub(crate) unsafe fn set_memory_max(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        megabytes: c_int,
    ) -> c_int {
        (self.functions().avs_set_memory_max)(env, megabytes)
    }

    /// # Safety
    /// The caller must ensure `env` and `dir` are valid.
    #[inline]
    pub(crate) unsafe fn set_working_dir(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        dir: *const c_char,
    ) -> c_int {
        (self.functions().avs_set_working_dir)(env, dir)
    }

    /// Takes a new reference to the clip stored in `value`.
    ///
    /// # Safety
    /// The caller must ensure `value` holds a clip and `env` is valid.
    #[inline]
    pub(crate) unsafe fn take_clip(
        &self,
        value: ffi::AVS_Value,
        env: *mut ffi::AVS_ScriptEnvironment,
    ) -> *mut ffi::AVS_Clip {
        (self.functions().avs_take_clip)(value, env)
    }

    /// Stores a new reference to `clip` in `value`.
    ///
    /// # Safety
    /// The caller must ensure `clip` is valid and `value` is eventually released.
    #[inline]
    pub(crate) unsafe fn set_to_clip(&self, value: *mut ffi::AVS_Value, clip: *mut ffi::AVS_Clip) {
        (self.functions().avs_set_to_clip)(value, clip)
    }

    /// # Safety
    /// The caller must ensure `clip` is valid.
    #[inline]
    pub(crate) unsafe fn copy_clip(&self, clip: *mut ffi::AVS_Clip) -> *mut ffi::AVS_Clip {
        (self.functions().avs_copy_clip)(clip)
    }

    /// # Safety
    /// The caller must ensure `clip` is valid and not used afterwards.
    #[inline]
    pub(crate) unsafe fn release_clip(&self, clip: *mut ffi::AVS_Clip) {
        (self.functions().avs_release_clip)(clip)
    }

    /// # Safety
    /// The caller must ensure `clip` is valid.
    #[inline]
    pub(crate) unsafe fn clip_get_error(&self, clip: *mut ffi::AVS_Clip) -> *const c_char {
        (self.functions().avs_clip_get_error)(clip)
    }

    /// # Safety
    /// The caller must ensure `clip` is valid.
    #[inline]
    pub(crate) unsafe fn get_video_info(
        &self,
        clip: *mut ffi::AVS_Clip,
    ) -> *const ffi::AVS_VideoInfo {
        (self.functions().avs_get_video_info)(clip)
    }

    /// # Safety
    /// The caller must ensure `clip` is valid.
    #[inline]
    pub(crate) unsafe fn get_version(&self, clip: *mut ffi::AVS_Clip) -> c_int {
        (self.functions().avs_get_version)(clip)
    }

    /// # Safety
    /// The caller must ensure `clip` is valid and the returned frame is released.
    #[inline]
    pub(crate) unsafe fn get_frame(
        &self,
        clip: *mut ffi::AVS_Clip,
        n: c_int,
    ) -> *mut ffi::AVS_VideoFrame {
        (self.functions().avs_get_frame)(clip, n)
    }

    /// # Safety
    /// The caller must ensure `clip` is valid.
    #[inline]
    pub(crate) unsafe fn get_parity(&self, clip: *mut ffi::AVS_Clip, n: c_int) -> c_int {
        (self.functions().avs_get_parity)(clip, n)
    }

    /// # Safety
    /// The caller must ensure `clip` is valid and `buf` holds `count` audio samples.
    #[inline]
    pub(crate) unsafe fn get_audio(
        &self,
        clip: *mut ffi::AVS_Clip,
        buf: *mut c_void,
        start: i64,
        count: i64,
    ) -> c_int {
        (self.functions().avs_get_audio)(clip, buf, start, count)
    }

    /// # Safety
    /// The caller must ensure `clip` is valid.
    #[inline]
    pub(crate) unsafe fn set_cache_hints(
        &self,
        clip: *mut ffi::AVS_Clip,
        hints: c_int,
        frame_range: c_int,
    ) -> c_int {
        (self.functions().avs_set_cache_hints)(clip, hints, frame_range)
    }

    /// # Safety
    /// The caller must ensure `frame` is valid.
    #[inline]
    pub(crate) unsafe fn copy_video_frame(
        &self,
        frame: *mut ffi::AVS_VideoFrame,
    ) -> *mut ffi::AVS_VideoFrame {
        (self.functions().avs_copy_video_frame)(frame)
    }

    /// # Safety
    /// The caller must ensure `frame` is valid and not used afterwards.
    #[inline]
    pub(crate) unsafe fn release_video_frame(&self, frame: *mut ffi::AVS_VideoFrame) {
        (self.functions().avs_release_video_frame)(frame)
    }

    /// # Safety
    /// The caller must ensure `frame` is valid.
    #[inline]
    pub(crate) unsafe fn get_pitch_p(
        &self,
        frame: *const ffi::AVS_VideoFrame,
        plane: c_int,
    ) -> c_int {
        (self.inner.get_pitch_p)(frame, plane)
    }

    /// # Safety
    /// The caller must ensure `frame` is valid.
    #[inline]
    pub(crate) unsafe fn get_row_size_p(
        &self,
        frame: *const ffi::AVS_VideoFrame,
        plane: c_int,
    ) -> c_int {
        (self.inner.get_row_size_p)(frame, plane)
    }

    /// # Safety
    /// The caller must ensure `frame` is valid.
    #[inline]
    pub(crate) unsafe fn get_height_p(
        &self,
        frame: *const ffi::AVS_VideoFrame,
        plane: c_int,
    ) -> c_int {
        (self.inner.get_height_p)(frame, plane)
    }

    /// # Safety
    /// The caller must ensure `frame` is valid and `plane` exists in it.
    #[inline]
    pub(crate) unsafe fn get_read_ptr_p(
        &self,
        frame: *const ffi::AVS_VideoFrame,
        plane: c_int,
    ) -> *const u8 {
        (self.inner.get_read_ptr_p)(frame, plane)
    }

    /// # Safety
    /// The caller must ensure `frame` is valid and `plane` exists in it.
    #[inline]
    pub(crate) unsafe fn get_write_ptr_p(
        &self,
        frame: *mut ffi::AVS_VideoFrame,
        plane: c_int,
    ) -> *mut u8 {
        (self.inner.get_write_ptr_p)(frame, plane)
    }

    /// # Safety
    /// The caller must ensure `frame` is valid.
    #[inline]
    pub(crate) unsafe fn is_writable(&self, frame: *const ffi::AVS_VideoFrame) -> c_int {
        (self.inner.is_writable)(frame)
    }

    /// Copies `length` bytes into a string owned by the environment.
    ///
    /// Returns `None` if the engine lacks the entry point.
    ///
    /// # Safety
    /// The caller must ensure `env` is valid and `s` holds `length` bytes.
    #[inline]
    pub(crate) unsafe fn save_string(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        s: *const c_char,
        length: c_int,
    ) -> Option<*const c_char> {
        self.functions()
            .avs_save_string
            .map(|save_string| save_string(env, s, length))
    }

    /// Registers a script function.
    ///
    /// Returns `None` if the engine lacks the entry point.
    ///
    /// # Safety
    /// The caller must ensure `env`, `name` and `params` are valid, and that `user_data` stays
    /// valid for as long as the environment can call `apply`.
    #[inline]
    pub(crate) unsafe fn add_function(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        name: *const c_char,
        params: *const c_char,
        apply: ffi::AVS_ApplyFunc,
        user_data: *mut c_void,
    ) -> Option<c_int> {
        self.functions()
            .avs_add_function
            .map(|add_function| add_function(env, name, params, apply, user_data))
    }

    /// Registers a function called when the environment is deleted.
    ///
    /// Returns `None` if the engine lacks the entry point.
    ///
    /// # Safety
    /// The caller must ensure `env` is valid and `user_data` outlives the environment.
    #[inline]
    pub(crate) unsafe fn at_exit(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        function: ffi::AVS_ShutdownFunc,
        user_data: *mut c_void,
    ) -> Option<()> {
        self.functions()
            .avs_at_exit
            .map(|at_exit| at_exit(env, function, user_data))
    }

    /// Creates a frame sharing the buffer of `src`.
    ///
    /// Returns `None` if the engine lacks the entry point.
    ///
    /// # Safety
    /// The caller must ensure `env` and `src` are valid and release the returned frame.
    #[inline]
    pub(crate) unsafe fn subframe(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        src: *mut ffi::AVS_VideoFrame,
        rel_offset: c_int,
        new_pitch: c_int,
        new_row_size: c_int,
        new_height: c_int,
    ) -> Option<*mut ffi::AVS_VideoFrame> {
        self.functions().avs_subframe.map(|subframe| {
            subframe(env, src, rel_offset, new_pitch, new_row_size, new_height)
        })
    }

    /// Planar version of `subframe()`.
    ///
    /// # Safety
    /// Same as `subframe()`.
    #[inline]
    #[allow(clippy::too_many_arguments)]
    pub(crate) unsafe fn subframe_planar(
        &self,
        env: *mut ffi::AVS_ScriptEnvironment,
        src: *mut ffi::AVS_VideoFrame,
        rel_offset: c_int,
        new_pitch: c_int,
        new_row_size: c_int,
        new_height: c_int,
        rel_offset_u: c_int,
        rel_offset_v: c_int,
        new_pitch_uv: c_int,
    ) -> Option<*mut ffi::AVS_VideoFrame> {
        self.functions().avs_subframe_planar.map(|subframe_planar| {
            subframe_planar(
                env,
                src,
                rel_offset,
                new_pitch,
                new_row_size,
                new_height,
                rel_offset_u,
                rel_offset_v,
                new_pitch_uv,
            )
        })
    }

    /// Releases a value returned by the engine.
    ///
    /// # Safety
    /// The caller must ensure `value` was produced by the engine and is not used afterwards.
    #[inline]
    pub(crate) unsafe fn release_value(&self, value: ffi::AVS_Value) {
        (self.functions().avs_release_value)(value)
    }
}
