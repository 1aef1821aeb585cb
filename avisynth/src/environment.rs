//! The script environment.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use avisynth_sys as ffi;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, trace};

use crate::api::API;
use crate::config::Config;
use crate::error::{Error, Result, native_message};
use crate::format::Plane;
use crate::frame::VideoFrame;
use crate::function::{self, FunctionData, ShutdownData};
use crate::text;
use crate::value::{NativeValue, Value};
use crate::video_info::VideoInfo;

/// State shared between an environment and the views of it handed to script functions.
pub(crate) struct Shared {
    serial: ReentrantMutex<()>,
    // Strings the engine may keep pointers to. Freed after the native environment.
    pinned: Mutex<Vec<CString>>,
    functions: Mutex<Vec<Box<FunctionData>>>,
    shutdown: Mutex<Vec<Box<ShutdownData>>>,
}

impl Shared {
    #[inline]
    pub(crate) fn pin(&self, string: CString) -> *const c_char {
        let ptr = string.as_ptr();
        self.pinned.lock().push(string);
        ptr
    }
}

/// A script environment, the root of every clip, frame and value.
///
/// Native calls made through one environment, and through the clips and frames it produced,
/// are serialized with a reentrant lock, so an environment can be shared between threads.
pub struct ScriptEnvironment {
    api: API,
    handle: NonNull<ffi::AVS_ScriptEnvironment>,
    interface_version: i32,
    shared: Arc<Shared>,
    // False for the views passed to script functions, which the engine deletes itself.
    owned: bool,
}

unsafe impl Send for ScriptEnvironment {}
unsafe impl Sync for ScriptEnvironment {}

impl Drop for ScriptEnvironment {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }

        let _guard = self.shared.serial.lock();
        unsafe {
            self.api.delete_script_environment(self.handle.as_ptr());
        }
        debug!(
            pinned_strings = self.shared.pinned.lock().len(),
            functions = self.shared.functions.lock().len(),
            "deleted a script environment"
        );
    }
}

impl std::fmt::Debug for ScriptEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEnvironment")
            .field("handle", &self.handle)
            .field("interface_version", &self.interface_version)
            .finish()
    }
}

#[inline]
fn c_int_from(value: usize, what: &str) -> Result<c_int> {
    c_int::try_from(value).map_err(|_| {
        Error::UnsupportedValueType(format!("{} {} doesn't fit in a C int", what, value))
    })
}

impl ScriptEnvironment {
    /// Creates an environment using the process-wide API, see `API::get()`.
    #[inline]
    pub fn new(interface_version: i32) -> Result<Self> {
        Self::with_api(API::get()?, interface_version)
    }

    /// Creates an environment, loading the library and applying the settings from `config`.
    pub fn with_config(config: &Config) -> Result<Self> {
        let api = if config.has_library_override() {
            API::load(config)?
        } else {
            API::get()?
        };

        let env = Self::with_api(api, config.interface_version)?;
        if let Some(megabytes) = config.memory_max {
            env.set_memory_max(megabytes);
        }
        if let Some(ref dir) = config.working_dir {
            env.set_working_dir(dir)?;
        }
        Ok(env)
    }

    /// Creates an environment through the given API.
    pub fn with_api(api: API, interface_version: i32) -> Result<Self> {
        let handle = unsafe { api.create_script_environment(interface_version) };
        let handle = NonNull::new(handle).ok_or_else(|| Error::IncompatibleInterface {
            requested: interface_version,
            message: "the engine returned no environment".to_owned(),
        })?;

        // The engine hands out an environment with an error set when it refuses the version.
        if let Some(message) = unsafe { native_message(api.get_error(handle.as_ptr())) } {
            unsafe {
                api.delete_script_environment(handle.as_ptr());
            }
            return Err(Error::IncompatibleInterface {
                requested: interface_version,
                message,
            });
        }

        debug!(interface_version, "created a script environment");
        Ok(Self {
            api,
            handle,
            interface_version,
            shared: Arc::new(Shared {
                serial: ReentrantMutex::new(()),
                pinned: Mutex::new(Vec::new()),
                functions: Mutex::new(Vec::new()),
                shutdown: Mutex::new(Vec::new()),
            }),
            owned: true,
        })
    }

    /// Wraps an environment the engine passes to a script function.
    ///
    /// # Safety
    /// `handle` must stay valid for as long as the returned view is alive.
    #[inline]
    pub(crate) unsafe fn lent(
        api: API,
        handle: NonNull<ffi::AVS_ScriptEnvironment>,
        interface_version: i32,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            api,
            handle,
            interface_version,
            shared,
            owned: false,
        }
    }

    #[inline]
    pub fn api(&self) -> &API {
        &self.api
    }

    /// The interface version this environment was created with.
    #[inline]
    pub fn interface_version(&self) -> i32 {
        self.interface_version
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut ffi::AVS_ScriptEnvironment {
        self.handle.as_ptr()
    }

    /// Locks the environment for a sequence of native calls.
    #[inline]
    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.shared.serial.lock()
    }

    /// Keeps `string` alive until the environment is dropped and returns its address.
    #[inline]
    pub(crate) fn pin(&self, string: CString) -> *const c_char {
        self.shared.pin(string)
    }

    /// Retrieves the environment's error message, if any.
    #[inline]
    pub fn error(&self) -> Option<String> {
        let _guard = self.lock();
        unsafe { native_message(self.api.get_error(self.as_ptr())) }
    }

    /// Invokes a script function.
    ///
    /// `args` is an array of arguments or a single argument. `arg_names`, if given, holds one
    /// entry per argument: `None` for positional ones and the parameter name for named ones.
    ///
    /// An error value returned by the engine is turned into `Error::ScriptError`.
    pub fn invoke<'env>(
        &'env self,
        name: &str,
        args: &Value<'env>,
        arg_names: Option<&[Option<&str>]>,
    ) -> Result<Value<'env>> {
        let function = CString::new(text::encode(name))?;

        let names = match arg_names {
            None => None,
            Some(names) => {
                if names.len() != args.array_size() {
                    return Err(Error::ArgumentNameCount {
                        args: args.array_size(),
                        names: names.len(),
                    });
                }
                Some(
                    names
                        .iter()
                        .map(|name| name.map(|name| CString::new(text::encode(name))).transpose())
                        .collect::<std::result::Result<Vec<_>, _>>()?,
                )
            }
        };
        let name_ptrs = names.as_ref().map(|names| {
            names
                .iter()
                .map(|name| name.as_ref().map_or(ptr::null(), |name| name.as_ptr()))
                .collect::<Vec<_>>()
        });

        let _guard = self.lock();
        let native_args = args.to_native(self)?;

        trace!(function = name, args = args.array_size(), "invoke");
        let rv = unsafe {
            self.api.invoke(
                self.as_ptr(),
                function.as_ptr(),
                native_args.as_raw(),
                name_ptrs.as_ref().map_or(ptr::null(), |ptrs| ptrs.as_ptr()),
            )
        };
        let rv = unsafe { NativeValue::from_engine(self, rv) };
        drop(native_args);

        match rv.into_value()? {
            Value::Error(message) => Err(Error::ScriptError(text::decode(&message).into_owned())),
            value => Ok(value),
        }
    }

    /// Evaluates a script, as the `Eval` function does.
    ///
    /// `name` is used in error messages in place of a file name.
    pub fn eval<'env>(&'env self, script: &str, name: Option<&str>) -> Result<Value<'env>> {
        let mut args = vec![Value::from(script)];
        if let Some(name) = name {
            args.push(Value::from(name));
        }
        self.invoke("Eval", &Value::Array(args), None)
    }

    /// Retrieves a script variable.
    pub fn get_var<'env>(&'env self, name: &str) -> Result<Value<'env>> {
        let c_name = CString::new(text::encode(name))?;

        let _guard = self.lock();
        let rv = unsafe { self.api.get_var(self.as_ptr(), c_name.as_ptr()) };
        let rv = unsafe { NativeValue::from_engine(self, rv) };
        if !rv.is_defined() {
            return Err(Error::VariableNotFound(name.to_owned()));
        }

        match rv.into_value()? {
            Value::Error(message) => Err(Error::ScriptError(text::decode(&message).into_owned())),
            value => Ok(value),
        }
    }

    fn set_variable(&self, name: &str, value: &Value<'_>, global: bool) -> Result<()> {
        let name = self.pin(CString::new(text::encode(name))?);

        let _guard = self.lock();
        let native = value.to_native(self)?;
        let rv = unsafe {
            if global {
                self.api.set_global_var(self.as_ptr(), name, native.as_raw())
            } else {
                self.api.set_var(self.as_ptr(), name, native.as_raw())
            }
        };

        if rv < 0 {
            let message = self
                .error()
                .unwrap_or_else(|| "couldn't set the variable".to_owned());
            return Err(Error::ScriptError(message));
        }
        Ok(())
    }

    /// Sets a variable in the current scope.
    #[inline]
    pub fn set_var(&self, name: &str, value: &Value<'_>) -> Result<()> {
        self.set_variable(name, value, false)
    }

    /// Sets a global variable.
    #[inline]
    pub fn set_global_var(&self, name: &str, value: &Value<'_>) -> Result<()> {
        self.set_variable(name, value, true)
    }

    /// Checks whether a script function with this name exists.
    pub fn function_exists(&self, name: &str) -> Result<bool> {
        let name = CString::new(text::encode(name))?;
        let _guard = self.lock();
        Ok(unsafe { self.api.function_exists(self.as_ptr(), name.as_ptr()) } != 0)
    }

    /// Checks whether the engine supports at least this interface version.
    #[inline]
    pub fn check_version(&self, version: i32) -> bool {
        let _guard = self.lock();
        unsafe { self.api.check_version(self.as_ptr(), version) == 0 }
    }

    #[inline]
    pub fn cpu_flags(&self) -> i32 {
        let _guard = self.lock();
        unsafe { self.api.get_cpu_flags(self.as_ptr()) }
    }

    /// Copies `height` rows of `row_size` bytes between buffers with possibly different pitches.
    pub fn bit_blt(
        &self,
        dst: &mut [u8],
        dst_pitch: usize,
        src: &[u8],
        src_pitch: usize,
        row_size: usize,
        height: usize,
    ) -> Result<()> {
        if row_size == 0 || height == 0 {
            return Ok(());
        }

        let required = |pitch: usize| {
            (height - 1)
                .checked_mul(pitch)
                .and_then(|x| x.checked_add(row_size))
                .unwrap_or(usize::MAX)
        };
        let checks = [
            (required(dst_pitch), dst.len()),
            (required(src_pitch), src.len()),
        ];
        for (required, actual) in checks {
            if actual < required {
                return Err(Error::BufferTooSmall { required, actual });
            }
        }

        let dst_pitch = c_int_from(dst_pitch, "pitch")?;
        let src_pitch = c_int_from(src_pitch, "pitch")?;
        let row_size = c_int_from(row_size, "row size")?;
        let height = c_int_from(height, "height")?;

        let _guard = self.lock();
        unsafe {
            self.api.bit_blt(
                self.as_ptr(),
                dst.as_mut_ptr(),
                dst_pitch,
                src.as_ptr(),
                src_pitch,
                row_size,
                height,
            );
        }
        Ok(())
    }

    /// Sets the frame cache limit in megabytes and returns the limit in effect.
    #[inline]
    pub fn set_memory_max(&self, megabytes: i32) -> i32 {
        let _guard = self.lock();
        let rv = unsafe { self.api.set_memory_max(self.as_ptr(), megabytes) };
        debug!(requested = megabytes, effective = rv, "set the memory limit");
        rv
    }

    /// Changes the directory scripts resolve relative paths against.
    ///
    /// On Windows the path must be representable in the active code page.
    pub fn set_working_dir(&self, dir: &Path) -> Result<()> {
        let c_dir = CString::new(text::encode_path(dir)?)?;

        let _guard = self.lock();
        let rv = unsafe { self.api.set_working_dir(self.as_ptr(), c_dir.as_ptr()) };
        if rv != 0 {
            return Err(Error::WorkingDirectory(dir.to_path_buf()));
        }
        Ok(())
    }

    /// Makes `frame` writable, replacing it with a private copy if it is shared.
    ///
    /// Returns whether a copy was made.
    pub fn make_writable(&self, frame: &mut VideoFrame<'_>) -> Result<bool> {
        if !std::ptr::eq(frame.env(), self) {
            return Err(Error::ForeignEnvironment);
        }

        let _guard = self.lock();
        let mut ptr = frame.as_ptr();
        let copied = unsafe { self.api.make_writable(self.as_ptr(), &mut ptr) } != 0;
        match NonNull::new(ptr) {
            Some(ptr) => {
                unsafe { frame.replace_handle(ptr) };
                Ok(copied)
            }
            None => Err(Error::FrameAllocationFailed),
        }
    }

    /// Allocates a new frame of the given format.
    pub fn new_video_frame(&self, vi: &VideoInfo) -> Result<VideoFrame<'_>> {
        let raw = ffi::AVS_VideoInfo::from(*vi);

        let _guard = self.lock();
        let ptr = unsafe { self.api.new_video_frame_a(self.as_ptr(), &raw, ffi::AVS_FRAME_ALIGN) };
        let ptr = NonNull::new(ptr).ok_or(Error::FrameAllocationFailed)?;
        Ok(unsafe { VideoFrame::from_ptr(self, ptr, vi.pixel_type) })
    }

    /// Registers a script function implemented in Rust.
    ///
    /// `params` lists the parameters in the engine's notation, `"ci[scale]f"` for example.
    /// Arguments arrive in declaration order, omitted optional ones as `Value::Undefined`. An
    /// error returned by `function` is raised as a script error, and so is an array result.
    /// The function stays registered until the environment is dropped.
    pub fn add_function<F>(&self, name: &str, params: &str, function: F) -> Result<()>
    where
        F: for<'env> Fn(&'env ScriptEnvironment, &[Value<'env>]) -> Result<Value<'env>>
            + Send
            + Sync
            + 'static,
    {
        if !self.api.capabilities().add_function {
            return Err(Error::MissingEntryPoint("avs_add_function"));
        }

        let c_name = CString::new(text::encode(name))?;
        let c_params = CString::new(text::encode(params))?;
        let data = Box::new(FunctionData {
            name: name.to_owned(),
            api: self.api.clone(),
            interface_version: self.interface_version,
            shared: Arc::downgrade(&self.shared),
            function: Box::new(function),
        });
        let user_data = &*data as *const FunctionData as *mut c_void;

        let _guard = self.lock();
        let name_ptr = self.pin(c_name);
        let params_ptr = self.pin(c_params);
        self.shared.functions.lock().push(data);

        let rv = unsafe {
            self.api.add_function(
                self.as_ptr(),
                name_ptr,
                params_ptr,
                Some(function::apply),
                user_data,
            )
        };
        if rv != Some(0) {
            let message = self
                .error()
                .unwrap_or_else(|| format!("couldn't register {}", name));
            return Err(Error::ScriptError(message));
        }

        debug!(function = name, params, "registered a script function");
        Ok(())
    }

    /// Runs `function` when the native environment is deleted.
    pub fn at_exit<F>(&self, function: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.api.capabilities().at_exit {
            return Err(Error::MissingEntryPoint("avs_at_exit"));
        }

        let function: Box<dyn FnOnce() + Send> = Box::new(function);
        let data = Box::new(ShutdownData {
            function: Mutex::new(Some(function)),
        });
        let user_data = &*data as *const ShutdownData as *mut c_void;

        let _guard = self.lock();
        self.shared.shutdown.lock().push(data);
        unsafe {
            self.api
                .at_exit(self.as_ptr(), Some(function::shutdown), user_data);
        }
        Ok(())
    }

    /// Stores a copy of `bytes` that lives as long as the environment.
    ///
    /// Engines without string storage get a copy kept by the environment itself.
    pub fn save_string(&self, bytes: &[u8]) -> Result<&CStr> {
        let string = CString::new(bytes)?;
        let length = c_int_from(bytes.len(), "string length")?;

        let _guard = self.lock();
        let saved = unsafe { self.api.save_string(self.as_ptr(), string.as_ptr(), length) };
        let ptr = match saved {
            Some(ptr) if !ptr.is_null() => ptr,
            _ => self.pin(string),
        };
        Ok(unsafe { CStr::from_ptr(ptr) })
    }

    /// Creates a frame viewing a region of the buffer of `src`, which must have one plane.
    ///
    /// The region starts `rel_offset` bytes into the plane and has to lie within it. The two
    /// frames aren't writable while they share the buffer.
    pub fn subframe<'env>(
        &'env self,
        src: &VideoFrame<'env>,
        rel_offset: usize,
        new_pitch: usize,
        new_row_size: usize,
        new_height: usize,
    ) -> Result<VideoFrame<'env>> {
        if src.planes().len() != 1 {
            return Err(Error::InvalidSubframe(format!(
                "{} has {} planes, use subframe_planar()",
                src.pixel_type(),
                src.planes().len()
            )));
        }
        check_region_args(new_pitch, new_row_size, new_height)?;

        let rel_offset = c_int_from(rel_offset, "offset")?;
        let new_pitch = c_int_from(new_pitch, "pitch")?;
        let new_row_size = c_int_from(new_row_size, "row size")?;
        let new_height = c_int_from(new_height, "height")?;

        self.checked_subframe(src, "avs_subframe", || unsafe {
            self.api.subframe(
                self.as_ptr(),
                src.as_ptr(),
                rel_offset,
                new_pitch,
                new_row_size,
                new_height,
            )
        })
    }

    /// Creates a frame viewing a region of the buffer of `src`, which must have three planes.
    ///
    /// The offsets are relative to the start of each plane. The engine derives the row size
    /// and height of the second and third planes from the first, scaled by the subsampling.
    /// Every region has to lie within its plane.
    #[allow(clippy::too_many_arguments)]
    pub fn subframe_planar<'env>(
        &'env self,
        src: &VideoFrame<'env>,
        rel_offset: usize,
        new_pitch: usize,
        new_row_size: usize,
        new_height: usize,
        rel_offset_u: usize,
        rel_offset_v: usize,
        new_pitch_uv: usize,
    ) -> Result<VideoFrame<'env>> {
        if src.planes().len() != 3 {
            return Err(Error::InvalidSubframe(format!(
                "{} has {} planes, subframe_planar() needs 3",
                src.pixel_type(),
                src.planes().len()
            )));
        }
        check_region_args(new_pitch, new_row_size, new_height)?;

        let rel_offset = c_int_from(rel_offset, "offset")?;
        let new_pitch = c_int_from(new_pitch, "pitch")?;
        let new_row_size = c_int_from(new_row_size, "row size")?;
        let new_height = c_int_from(new_height, "height")?;
        let rel_offset_u = c_int_from(rel_offset_u, "offset")?;
        let rel_offset_v = c_int_from(rel_offset_v, "offset")?;
        let new_pitch_uv = c_int_from(new_pitch_uv, "pitch")?;

        self.checked_subframe(src, "avs_subframe_planar", || unsafe {
            self.api.subframe_planar(
                self.as_ptr(),
                src.as_ptr(),
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

    /// Runs a subframe call and checks every plane of the result lies within `src`.
    fn checked_subframe<'env>(
        &'env self,
        src: &VideoFrame<'env>,
        entry_point: &'static str,
        call: impl FnOnce() -> Option<*mut ffi::AVS_VideoFrame>,
    ) -> Result<VideoFrame<'env>> {
        if !ptr::eq(src.env(), self) {
            return Err(Error::ForeignEnvironment);
        }

        let _guard = self.lock();
        let ptr = call().ok_or(Error::MissingEntryPoint(entry_point))?;
        let ptr = NonNull::new(ptr).ok_or(Error::FrameAllocationFailed)?;
        let frame = unsafe { VideoFrame::from_ptr(self, ptr, src.pixel_type()) };

        for &plane in src.planes() {
            check_region(src, &frame, plane)?;
        }
        Ok(frame)
    }
}

/// Number of bytes spanned by `height` rows.
#[inline]
fn span(pitch: usize, row_size: usize, height: usize) -> Option<usize> {
    match height {
        0 => Some(0),
        _ => (height - 1).checked_mul(pitch)?.checked_add(row_size),
    }
}

fn check_region_args(pitch: usize, row_size: usize, height: usize) -> Result<()> {
    if row_size == 0 || height == 0 {
        return Err(Error::InvalidSubframe("the region is empty".to_owned()));
    }
    if pitch < row_size {
        return Err(Error::InvalidSubframe(format!(
            "pitch {} is smaller than the row size {}",
            pitch, row_size
        )));
    }
    Ok(())
}

/// Checks the `plane` region of `sub` lies within the same plane of `src`.
fn check_region(src: &VideoFrame<'_>, sub: &VideoFrame<'_>, plane: Plane) -> Result<()> {
    let available = span(src.pitch(plane)?, src.row_size(plane)?, src.height(plane)?);
    let needed = span(sub.pitch(plane)?, sub.row_size(plane)?, sub.height(plane)?);
    let offset = (sub.read_ptr(plane)? as usize).checked_sub(src.read_ptr(plane)? as usize);

    match (available, needed, offset) {
        (Some(available), Some(needed), Some(offset))
            if offset.checked_add(needed).is_some_and(|end| end <= available) =>
        {
            Ok(())
        }
        _ => Err(Error::InvalidSubframe(format!(
            "the {:?} plane region falls outside the source frame",
            plane
        ))),
    }
}
