//! An in-process engine implementing the C interface, so the bindings can be exercised without
//! the AviSynth library installed.
//!
//! The plane accessors, `avs_bit_blt` and `avs_is_writable` are left out so they go through the
//! software fallbacks.

use std::cell::Cell;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_short, c_void};
use std::path::Path;
use std::ptr;
use std::slice;
use std::sync::atomic::{AtomicI32, Ordering};

use parking_lot::Mutex;

use crate::api::API;
use crate::clip::Clip;
use crate::environment::ScriptEnvironment;
use crate::ffi;
use crate::format::{Plane, PresetFormat};
use crate::frame::VideoFrame;
use crate::video_info::VideoInfo;

/// The newest interface version the mock accepts.
pub const MAX_INTERFACE_VERSION: c_int = 8;
pub const CPU_FLAGS: c_int = 0x2f;
pub const DEFAULT_MEMORY_MAX: c_int = 512;
pub const VERSION_STRING: &CStr = c"AviSynth mock 1.0";

const FUNCTIONS: &[&str] = &["BlankClip", "Identity", "VersionString", "Throw", "Eval"];

thread_local! {
    static CREATED: Cell<usize> = const { Cell::new(0) };
    static DELETED: Cell<usize> = const { Cell::new(0) };
}

/// Environments created on this thread so far.
pub fn created_environments() -> usize {
    CREATED.with(Cell::get)
}

/// Environments deleted on this thread so far.
pub fn deleted_environments() -> usize {
    DELETED.with(Cell::get)
}

struct MockEnv {
    error: Option<CString>,
    memory_max: AtomicI32,
    live_clips: AtomicI32,
    strings: Mutex<Vec<CString>>,
    vars: Mutex<HashMap<Vec<u8>, ffi::AVS_Value>>,
    globals: Mutex<HashMap<Vec<u8>, ffi::AVS_Value>>,
    functions: Mutex<HashMap<String, (ffi::AVS_ApplyFunc, *mut c_void)>>,
    exits: Mutex<Vec<(ffi::AVS_ShutdownFunc, *mut c_void)>>,
}

impl MockEnv {
    /// Keeps a string alive until the environment is deleted.
    fn keep(&self, string: CString) -> *const c_char {
        let ptr = string.as_ptr();
        self.strings.lock().push(string);
        ptr
    }

    fn save_string(&self, string: String) -> *const c_char {
        self.keep(CString::new(string.replace('\0', " ")).unwrap())
    }

    fn error_value(&self, message: String) -> ffi::AVS_Value {
        ffi::AVS_Value {
            type_: ffi::AVS_VALUE_ERROR,
            array_size: 0,
            d: ffi::AVS_Value__bindgen_ty_1 {
                string: self.save_string(message),
            },
        }
    }
}

struct MockClip {
    refs: AtomicI32,
    env: *const MockEnv,
    vi: ffi::AVS_VideoInfo,
    error: Mutex<Option<CString>>,
}

impl MockClip {
    fn set_error(&self, message: Option<String>) {
        *self.error.lock() = message.map(|message| CString::new(message).unwrap());
    }
}

#[inline]
unsafe fn mock_env<'a>(env: *mut ffi::AVS_ScriptEnvironment) -> &'a MockEnv {
    &*(env as *const MockEnv)
}

#[inline]
unsafe fn mock_clip<'a>(clip: *mut ffi::AVS_Clip) -> &'a MockClip {
    &*(clip as *const MockClip)
}

unsafe fn string_arg(value: &ffi::AVS_Value) -> Option<String> {
    if value.type_ == ffi::AVS_VALUE_STRING && !value.d.string.is_null() {
        Some(CStr::from_ptr(value.d.string).to_string_lossy().into_owned())
    } else {
        None
    }
}

fn int_arg(value: &ffi::AVS_Value) -> Option<c_int> {
    if value.type_ == ffi::AVS_VALUE_INT {
        Some(unsafe { value.d.integer })
    } else {
        None
    }
}

fn clip_value(clip: *mut ffi::AVS_Clip) -> ffi::AVS_Value {
    ffi::AVS_Value {
        type_: ffi::AVS_VALUE_CLIP,
        array_size: 0,
        d: ffi::AVS_Value__bindgen_ty_1 { clip },
    }
}

fn new_clip(env: &MockEnv, vi: ffi::AVS_VideoInfo) -> *mut ffi::AVS_Clip {
    env.live_clips.fetch_add(1, Ordering::SeqCst);
    Box::into_raw(Box::new(MockClip {
        refs: AtomicI32::new(1),
        env,
        vi,
        error: Mutex::new(None),
    })) as *mut ffi::AVS_Clip
}

/// Deep copy owned by the mock. Strings are shared, they outlive every value.
unsafe fn copy_value(value: &ffi::AVS_Value) -> ffi::AVS_Value {
    match value.type_ {
        ffi::AVS_VALUE_CLIP => {
            copy_clip(value.d.clip);
            *value
        }
        ffi::AVS_VALUE_ARRAY => {
            let elements = slice::from_raw_parts(value.d.array, value.array_size as usize)
                .iter()
                .map(|element| copy_value(element))
                .collect::<Box<[_]>>();
            ffi::AVS_Value {
                type_: ffi::AVS_VALUE_ARRAY,
                array_size: value.array_size,
                d: ffi::AVS_Value__bindgen_ty_1 {
                    array: Box::into_raw(elements) as *const ffi::AVS_Value,
                },
            }
        }
        _ => *value,
    }
}

struct Args {
    positional: Vec<ffi::AVS_Value>,
    named: Vec<(String, ffi::AVS_Value)>,
}

unsafe fn split_args(args: ffi::AVS_Value, arg_names: *const *const c_char) -> Args {
    let values = match args.type_ {
        ffi::AVS_VALUE_VOID => Vec::new(),
        ffi::AVS_VALUE_ARRAY if args.array_size == 0 => Vec::new(),
        ffi::AVS_VALUE_ARRAY => {
            slice::from_raw_parts(args.d.array, args.array_size as usize).to_vec()
        }
        _ => vec![args],
    };

    let mut split = Args {
        positional: Vec::new(),
        named: Vec::new(),
    };
    for (i, value) in values.into_iter().enumerate() {
        let name = if arg_names.is_null() {
            ptr::null()
        } else {
            *arg_names.add(i)
        };
        if name.is_null() {
            split.positional.push(value);
        } else {
            let name = CStr::from_ptr(name).to_string_lossy().to_lowercase();
            split.named.push((name, value));
        }
    }
    split
}

fn parse_pixel_type(name: &str) -> Option<PresetFormat> {
    let name = match name.to_uppercase().as_str() {
        "RGB24" => "BGR24".to_owned(),
        "RGB32" => "BGR32".to_owned(),
        other => other.to_owned(),
    };
    [
        PresetFormat::BGR24,
        PresetFormat::BGR32,
        PresetFormat::YUY2,
        PresetFormat::YV12,
        PresetFormat::YV16,
        PresetFormat::YV24,
        PresetFormat::Y8,
        PresetFormat::YUV420P16,
        PresetFormat::YUV444PS,
        PresetFormat::RGBP,
        PresetFormat::RGBAP,
        PresetFormat::YUVA420,
    ]
    .into_iter()
    .find(|format| format.name() == name)
}

unsafe fn blank_clip(env: &MockEnv, args: Args) -> ffi::AVS_Value {
    let positional = |i: usize, default: c_int| {
        args.positional
            .get(i)
            .and_then(int_arg)
            .unwrap_or(default)
    };

    let mut vi = VideoInfo {
        width: positional(0, 640),
        height: positional(1, 480),
        fps_numerator: 24,
        fps_denominator: 1,
        num_frames: positional(2, 240),
        pixel_type: PresetFormat::BGR32.into(),
        ..VideoInfo::default()
    };

    for (name, value) in &args.named {
        match name.as_str() {
            "pixel_type" => match string_arg(value).as_deref().and_then(parse_pixel_type) {
                Some(format) => vi.pixel_type = format.into(),
                None => return env.error_value("BlankClip: invalid pixel_type".to_owned()),
            },
            "audio_rate" => {
                vi.audio_samples_per_second = int_arg(value).unwrap_or(0);
                if vi.nchannels == 0 {
                    vi.nchannels = 2;
                }
                vi.sample_type = ffi::AVS_SAMPLE_INT16;
            }
            "channels" => vi.nchannels = int_arg(value).unwrap_or(0),
            "image_type" => vi.image_type = int_arg(value).unwrap_or(0),
            "fps" => vi.fps_numerator = int_arg(value).unwrap_or(0) as u32,
            _ => {
                let message = format!("BlankClip does not have a named argument \"{}\"", name);
                return env.error_value(message);
            }
        }
    }
    if vi.has_audio() {
        vi.num_audio_samples = vi.audio_samples_from_frames(vi.num_frames as i64);
    }

    clip_value(new_clip(env, vi.into()))
}

unsafe fn eval(env: &MockEnv, args: Args) -> ffi::AVS_Value {
    let script = args.positional.first().and_then(|v| string_arg(v)).unwrap_or_default();
    let name = args.positional.get(1).and_then(|v| string_arg(v));
    let script = script.trim();

    if script.eq_ignore_ascii_case("BlankClip()") {
        return blank_clip(
            env,
            Args {
                positional: Vec::new(),
                named: Vec::new(),
            },
        );
    }
    if let Ok(x) = script.parse::<c_int>() {
        return ffi::AVS_Value {
            type_: ffi::AVS_VALUE_INT,
            array_size: 0,
            d: ffi::AVS_Value__bindgen_ty_1 { integer: x },
        };
    }

    let message = format!("I don't know what \"{}\" means", script);
    env.error_value(match name {
        Some(name) => format!("{}\n({})", message, name),
        None => message,
    })
}

// Frames.

fn alloc_frame(vi: &VideoInfo, fill: u8) -> *mut ffi::AVS_VideoFrame {
    let pixel_type = vi.pixel_type;
    let align = |x: i64| ((x + 63) & !63) as c_int;

    let height = vi.height;
    let first = pixel_type.planes().first().copied().unwrap_or(Plane::Y);
    let row_size = vi.row_size(first) as c_int;
    let pitch = align(row_size as i64);

    let (row_size_uv, height_uv) = if pixel_type.is_planar_rgb() || pixel_type.is_planar_rgba() {
        (row_size, height)
    } else if pixel_type.is_planar() && !pixel_type.is_y() {
        let shift = vi.plane_height_subsampling(Plane::U).unwrap_or(0);
        (vi.row_size(Plane::U) as c_int, height >> shift)
    } else {
        (0, 0)
    };
    let pitch_uv = align(row_size_uv as i64);

    let (row_size_a, pitch_a) = if pixel_type.is_yuva() || pixel_type.is_planar_rgba() {
        (row_size, pitch)
    } else {
        (0, 0)
    };

    let offset_u = pitch * height;
    let offset_v = offset_u + pitch_uv * height_uv;
    let offset_a = offset_v + pitch_uv * height_uv;
    let size = offset_a + pitch_a * height;

    let data = vec![fill; size.max(0) as usize].into_boxed_slice();
    let data_size = data.len() as c_int;
    let vfb = Box::into_raw(Box::new(ffi::AVS_VideoFrameBuffer {
        data: Box::into_raw(data) as *mut u8,
        data_size,
        sequence_number: 0,
        refcount: 1,
    }));

    Box::into_raw(Box::new(ffi::AVS_VideoFrame {
        refcount: 1,
        vfb,
        offset: 0,
        pitch,
        row_size,
        height,
        offsetU: offset_u,
        offsetV: offset_v,
        pitchUV: pitch_uv,
        row_sizeUV: row_size_uv,
        heightUV: height_uv,
        offsetA: offset_a,
        pitchA: pitch_a,
        row_sizeA: row_size_a,
    }))
}

unsafe fn copy_frame_data(frame: *mut ffi::AVS_VideoFrame) -> *mut ffi::AVS_VideoFrame {
    let old = &*frame;
    let old_vfb = &*old.vfb;
    let data = slice::from_raw_parts(old_vfb.data, old_vfb.data_size as usize)
        .to_vec()
        .into_boxed_slice();
    let vfb = Box::into_raw(Box::new(ffi::AVS_VideoFrameBuffer {
        data: Box::into_raw(data) as *mut u8,
        data_size: old_vfb.data_size,
        sequence_number: 0,
        refcount: 1,
    }));

    Box::into_raw(Box::new(ffi::AVS_VideoFrame {
        refcount: 1,
        vfb,
        ..*old
    }))
}

// Entry points.

unsafe extern "system" fn create_script_environment(
    version: c_int,
) -> *mut ffi::AVS_ScriptEnvironment {
    if version <= 0 {
        return ptr::null_mut();
    }

    let error = (version > MAX_INTERFACE_VERSION).then(|| {
        CString::new(format!("interface version {} is not supported", version)).unwrap()
    });
    CREATED.with(|count| count.set(count.get() + 1));
    Box::into_raw(Box::new(MockEnv {
        error,
        memory_max: AtomicI32::new(DEFAULT_MEMORY_MAX),
        live_clips: AtomicI32::new(0),
        strings: Mutex::new(Vec::new()),
        vars: Mutex::new(HashMap::new()),
        globals: Mutex::new(HashMap::new()),
        functions: Mutex::new(HashMap::new()),
        exits: Mutex::new(Vec::new()),
    })) as *mut ffi::AVS_ScriptEnvironment
}

unsafe extern "system" fn delete_script_environment(env: *mut ffi::AVS_ScriptEnvironment) {
    // Last registered runs first.
    let exits = std::mem::take(&mut *mock_env(env).exits.lock());
    for (function, user_data) in exits.into_iter().rev() {
        if let Some(function) = function {
            function(user_data, env);
        }
    }

    let stored = {
        let env = mock_env(env);
        let mut stored = env.vars.lock().drain().map(|(_, v)| v).collect::<Vec<_>>();
        stored.extend(env.globals.lock().drain().map(|(_, v)| v));
        stored
    };
    for value in stored {
        release_value(value);
    }

    drop(Box::from_raw(env as *mut MockEnv));
    DELETED.with(|count| count.set(count.get() + 1));
}

unsafe extern "system" fn get_error(env: *mut ffi::AVS_ScriptEnvironment) -> *const c_char {
    mock_env(env)
        .error
        .as_ref()
        .map_or(ptr::null(), |error| error.as_ptr())
}

unsafe extern "system" fn check_version(
    _env: *mut ffi::AVS_ScriptEnvironment,
    version: c_int,
) -> c_int {
    if version <= MAX_INTERFACE_VERSION { 0 } else { -1 }
}

unsafe extern "system" fn get_cpu_flags(_env: *mut ffi::AVS_ScriptEnvironment) -> c_int {
    CPU_FLAGS
}

unsafe extern "system" fn function_exists(
    env: *mut ffi::AVS_ScriptEnvironment,
    name: *const c_char,
) -> c_int {
    let name = CStr::from_ptr(name).to_string_lossy();
    let registered = mock_env(env)
        .functions
        .lock()
        .contains_key(&name.to_lowercase());
    (registered
        || FUNCTIONS
            .iter()
            .any(|function| function.eq_ignore_ascii_case(&name))) as c_int
}

/// Calls a registered function with its positional arguments.
unsafe fn call_function(
    env: *mut ffi::AVS_ScriptEnvironment,
    apply: ffi::AVS_ApplyFunc,
    user_data: *mut c_void,
    args: Args,
) -> ffi::AVS_Value {
    let Some(apply) = apply else {
        return ffi::AVS_Value::VOID;
    };

    let array = ffi::AVS_Value {
        type_: ffi::AVS_VALUE_ARRAY,
        array_size: args.positional.len() as c_short,
        d: ffi::AVS_Value__bindgen_ty_1 {
            array: args.positional.as_ptr(),
        },
    };
    let rv = apply(env, array, user_data);

    // Copied, then the function's value released, as the engine does.
    let copy = copy_value(&rv);
    release_value(rv);
    copy
}

unsafe extern "system" fn invoke(
    env: *mut ffi::AVS_ScriptEnvironment,
    name: *const c_char,
    args: ffi::AVS_Value,
    arg_names: *const *const c_char,
) -> ffi::AVS_Value {
    let env_ptr = env;
    let env = mock_env(env);
    let name = CStr::from_ptr(name).to_string_lossy();
    let args = split_args(args, arg_names);

    match name.to_lowercase().as_str() {
        "blankclip" => blank_clip(env, args),
        "identity" => match args.positional.first() {
            Some(value) => copy_value(value),
            None => ffi::AVS_Value::VOID,
        },
        "versionstring" => ffi::AVS_Value {
            type_: ffi::AVS_VALUE_STRING,
            array_size: 0,
            d: ffi::AVS_Value__bindgen_ty_1 {
                string: VERSION_STRING.as_ptr(),
            },
        },
        "throw" => {
            let message = args.positional.first().and_then(|v| string_arg(v));
            env.error_value(message.unwrap_or_else(|| "Throw: no message".to_owned()))
        }
        "eval" => eval(env, args),
        lowercase => {
            let registered = env.functions.lock().get(lowercase).copied();
            match registered {
                Some((apply, user_data)) => call_function(env_ptr, apply, user_data, args),
                None => env.error_value(format!("there is no function named \"{}\"", name)),
            }
        }
    }
}

unsafe fn get_variable(env: &MockEnv, name: &[u8]) -> ffi::AVS_Value {
    let local = env.vars.lock().get(name).copied();
    match local.or_else(|| env.globals.lock().get(name).copied()) {
        Some(value) => copy_value(&value),
        None => ffi::AVS_Value::VOID,
    }
}

unsafe extern "system" fn get_var(
    env: *mut ffi::AVS_ScriptEnvironment,
    name: *const c_char,
) -> ffi::AVS_Value {
    get_variable(mock_env(env), CStr::from_ptr(name).to_bytes())
}

unsafe fn set_variable(
    env: *mut ffi::AVS_ScriptEnvironment,
    name: *const c_char,
    value: ffi::AVS_Value,
    global: bool,
) -> c_int {
    let env = mock_env(env);
    let name = CStr::from_ptr(name).to_bytes();
    if name.eq_ignore_ascii_case(b"last") && global {
        return -1;
    }

    let map = if global { &env.globals } else { &env.vars };
    let old = map.lock().insert(name.to_vec(), copy_value(&value));
    match old {
        Some(old) => {
            release_value(old);
            0
        }
        None => 1,
    }
}

unsafe extern "system" fn set_var(
    env: *mut ffi::AVS_ScriptEnvironment,
    name: *const c_char,
    value: ffi::AVS_Value,
) -> c_int {
    set_variable(env, name, value, false)
}

unsafe extern "system" fn set_global_var(
    env: *mut ffi::AVS_ScriptEnvironment,
    name: *const c_char,
    value: ffi::AVS_Value,
) -> c_int {
    set_variable(env, name, value, true)
}

unsafe extern "system" fn new_video_frame_a(
    _env: *mut ffi::AVS_ScriptEnvironment,
    vi: *const ffi::AVS_VideoInfo,
    _align: c_int,
) -> *mut ffi::AVS_VideoFrame {
    alloc_frame(&VideoInfo::from(*vi), 0)
}

unsafe extern "system" fn make_writable(
    _env: *mut ffi::AVS_ScriptEnvironment,
    pvf: *mut *mut ffi::AVS_VideoFrame,
) -> c_int {
    let frame = *pvf;
    if (*frame).refcount == 1 && (*(*frame).vfb).refcount == 1 {
        return 0;
    }

    *pvf = copy_frame_data(frame);
    release_video_frame(frame);
    1
}

unsafe extern "system" fn set_memory_max(
    env: *mut ffi::AVS_ScriptEnvironment,
    mem: c_int,
) -> c_int {
    let env = mock_env(env);
    if mem > 0 {
        env.memory_max.store(mem, Ordering::SeqCst);
    }
    env.memory_max.load(Ordering::SeqCst)
}

unsafe extern "system" fn set_working_dir(
    _env: *mut ffi::AVS_ScriptEnvironment,
    dir: *const c_char,
) -> c_int {
    let dir = CStr::from_ptr(dir).to_string_lossy().into_owned();
    if Path::new(&dir).is_dir() { 0 } else { 1 }
}

unsafe extern "system" fn take_clip(
    value: ffi::AVS_Value,
    _env: *mut ffi::AVS_ScriptEnvironment,
) -> *mut ffi::AVS_Clip {
    copy_clip(value.d.clip)
}

unsafe extern "system" fn set_to_clip(value: *mut ffi::AVS_Value, clip: *mut ffi::AVS_Clip) {
    *value = clip_value(copy_clip(clip));
}

unsafe extern "system" fn copy_clip(clip: *mut ffi::AVS_Clip) -> *mut ffi::AVS_Clip {
    mock_clip(clip).refs.fetch_add(1, Ordering::SeqCst);
    clip
}

unsafe extern "system" fn release_clip(clip: *mut ffi::AVS_Clip) {
    let mock = mock_clip(clip);
    if mock.refs.fetch_sub(1, Ordering::SeqCst) == 1 {
        (*mock.env).live_clips.fetch_sub(1, Ordering::SeqCst);
        drop(Box::from_raw(clip as *mut MockClip));
    }
}

unsafe extern "system" fn clip_get_error(clip: *mut ffi::AVS_Clip) -> *const c_char {
    // Points into the clip, valid until the next call on it.
    mock_clip(clip)
        .error
        .lock()
        .as_ref()
        .map_or(ptr::null(), |error| error.as_ptr())
}

unsafe extern "system" fn get_video_info(clip: *mut ffi::AVS_Clip) -> *const ffi::AVS_VideoInfo {
    &mock_clip(clip).vi
}

unsafe extern "system" fn get_version(_clip: *mut ffi::AVS_Clip) -> c_int {
    ffi::AVISYNTH_INTERFACE_VERSION
}

unsafe extern "system" fn get_frame(
    clip: *mut ffi::AVS_Clip,
    n: c_int,
) -> *mut ffi::AVS_VideoFrame {
    let mock = mock_clip(clip);
    if n < 0 || n >= mock.vi.num_frames {
        mock.set_error(Some(format!("frame {} is out of range", n)));
        return ptr::null_mut();
    }

    mock.set_error(None);
    alloc_frame(&VideoInfo::from(mock.vi), n as u8)
}

unsafe extern "system" fn get_parity(clip: *mut ffi::AVS_Clip, _n: c_int) -> c_int {
    (mock_clip(clip).vi.image_type & ffi::AVS_IT_TFF != 0) as c_int
}

/// Byte `i` of the stream is `i as u8`.
unsafe extern "system" fn get_audio(
    clip: *mut ffi::AVS_Clip,
    buf: *mut c_void,
    start: i64,
    count: i64,
) -> c_int {
    let mock = mock_clip(clip);
    if start + count > mock.vi.num_audio_samples {
        mock.set_error(Some("audio request past the end of the clip".to_owned()));
        return -1;
    }
    if mock.vi.nchannels > 8 {
        mock.set_error(Some("the mock can't produce more than 8 channels".to_owned()));
        return -1;
    }

    mock.set_error(None);
    let bytes_per_sample = VideoInfo::from(mock.vi).bytes_per_audio_sample() as i64;
    let first = start * bytes_per_sample;
    let buf = slice::from_raw_parts_mut(buf as *mut u8, (count * bytes_per_sample) as usize);
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = (first + i as i64) as u8;
    }
    0
}

unsafe extern "system" fn set_cache_hints(
    _clip: *mut ffi::AVS_Clip,
    hint: c_int,
    _frame_range: c_int,
) -> c_int {
    match hint {
        ffi::AVS_CACHE_GETCHILD_THREAD_MODE => ffi::AVS_CACHE_THREAD_SAFE,
        ffi::AVS_CACHE_GETCHILD_COST => ffi::AVS_CACHE_COST_UNIT,
        _ => 0,
    }
}

unsafe extern "system" fn copy_video_frame(
    frame: *mut ffi::AVS_VideoFrame,
) -> *mut ffi::AVS_VideoFrame {
    (*frame).refcount += 1;
    frame
}

unsafe extern "system" fn release_video_frame(frame: *mut ffi::AVS_VideoFrame) {
    (*frame).refcount -= 1;
    if (*frame).refcount > 0 {
        return;
    }

    let vfb = (*frame).vfb;
    (*vfb).refcount -= 1;
    if (*vfb).refcount == 0 {
        let data = ptr::slice_from_raw_parts_mut((*vfb).data, (*vfb).data_size as usize);
        drop(Box::from_raw(data));
        drop(Box::from_raw(vfb));
    }
    drop(Box::from_raw(frame));
}

unsafe extern "system" fn save_string(
    env: *mut ffi::AVS_ScriptEnvironment,
    s: *const c_char,
    length: c_int,
) -> *const c_char {
    let bytes = if length < 0 {
        CStr::from_ptr(s).to_bytes()
    } else {
        slice::from_raw_parts(s as *const u8, length as usize)
    };
    mock_env(env).keep(CString::new(bytes.to_vec()).unwrap())
}

unsafe extern "system" fn add_function(
    env: *mut ffi::AVS_ScriptEnvironment,
    name: *const c_char,
    _params: *const c_char,
    apply: ffi::AVS_ApplyFunc,
    user_data: *mut c_void,
) -> c_int {
    let name = CStr::from_ptr(name).to_string_lossy().to_lowercase();
    mock_env(env).functions.lock().insert(name, (apply, user_data));
    0
}

unsafe extern "system" fn at_exit(
    env: *mut ffi::AVS_ScriptEnvironment,
    function: ffi::AVS_ShutdownFunc,
    user_data: *mut c_void,
) {
    mock_env(env).exits.lock().push((function, user_data));
}

/// A new frame sharing the buffer of `src`.
unsafe fn share_buffer(
    src: *mut ffi::AVS_VideoFrame,
    frame: ffi::AVS_VideoFrame,
) -> *mut ffi::AVS_VideoFrame {
    (*(*src).vfb).refcount += 1;
    Box::into_raw(Box::new(frame))
}

unsafe extern "system" fn subframe(
    _env: *mut ffi::AVS_ScriptEnvironment,
    src: *mut ffi::AVS_VideoFrame,
    rel_offset: c_int,
    new_pitch: c_int,
    new_row_size: c_int,
    new_height: c_int,
) -> *mut ffi::AVS_VideoFrame {
    let old = &*src;
    let frame = ffi::AVS_VideoFrame {
        refcount: 1,
        vfb: old.vfb,
        offset: old.offset + rel_offset,
        pitch: new_pitch,
        row_size: new_row_size,
        height: new_height,
        offsetU: 0,
        offsetV: 0,
        pitchUV: 0,
        row_sizeUV: 0,
        heightUV: 0,
        offsetA: 0,
        pitchA: 0,
        row_sizeA: 0,
    };
    share_buffer(src, frame)
}

#[allow(clippy::too_many_arguments)]
unsafe extern "system" fn subframe_planar(
    _env: *mut ffi::AVS_ScriptEnvironment,
    src: *mut ffi::AVS_VideoFrame,
    rel_offset: c_int,
    new_pitch: c_int,
    new_row_size: c_int,
    new_height: c_int,
    rel_offset_u: c_int,
    rel_offset_v: c_int,
    new_pitch_uv: c_int,
) -> *mut ffi::AVS_VideoFrame {
    let old = &*src;
    let frame = ffi::AVS_VideoFrame {
        refcount: 1,
        vfb: old.vfb,
        offset: old.offset + rel_offset,
        pitch: new_pitch,
        row_size: new_row_size,
        height: new_height,
        offsetU: old.offsetU + rel_offset_u,
        offsetV: old.offsetV + rel_offset_v,
        pitchUV: new_pitch_uv,
        row_sizeUV: new_row_size * old.row_sizeUV / old.row_size.max(1),
        heightUV: new_height * old.heightUV / old.height.max(1),
        offsetA: 0,
        pitchA: 0,
        row_sizeA: 0,
    };
    share_buffer(src, frame)
}

unsafe extern "system" fn release_value(value: ffi::AVS_Value) {
    match value.type_ {
        ffi::AVS_VALUE_CLIP => release_clip(value.d.clip),
        ffi::AVS_VALUE_ARRAY if value.array_size > 0 => {
            let elements = ptr::slice_from_raw_parts_mut(
                value.d.array as *mut ffi::AVS_Value,
                value.array_size as usize,
            );
            let elements = Box::from_raw(elements);
            for element in elements.iter() {
                release_value(*element);
            }
        }
        _ => {}
    }
}

/// The mock's function table.
pub fn functions() -> ffi::AvisynthFunctions {
    ffi::AvisynthFunctions {
        avs_create_script_environment: create_script_environment,
        avs_delete_script_environment: delete_script_environment,
        avs_check_version: check_version,
        avs_get_cpu_flags: get_cpu_flags,
        avs_function_exists: function_exists,
        avs_invoke: invoke,
        avs_get_var: get_var,
        avs_set_var: set_var,
        avs_set_global_var: set_global_var,
        avs_new_video_frame_a: new_video_frame_a,
        avs_make_writable: make_writable,
        avs_set_memory_max: set_memory_max,
        avs_set_working_dir: set_working_dir,
        avs_take_clip: take_clip,
        avs_set_to_clip: set_to_clip,
        avs_copy_clip: copy_clip,
        avs_release_clip: release_clip,
        avs_clip_get_error: clip_get_error,
        avs_get_video_info: get_video_info,
        avs_get_version: get_version,
        avs_get_frame: get_frame,
        avs_get_parity: get_parity,
        avs_get_audio: get_audio,
        avs_set_cache_hints: set_cache_hints,
        avs_copy_video_frame: copy_video_frame,
        avs_release_video_frame: release_video_frame,
        avs_release_value: release_value,

        avs_get_error: Some(get_error as ffi::avs_get_error_func),
        avs_bit_blt: None,
        avs_get_pitch_p: None,
        avs_get_row_size_p: None,
        avs_get_height_p: None,
        avs_get_read_ptr_p: None,
        avs_get_write_ptr_p: None,
        avs_is_writable: None,
        avs_save_string: Some(save_string as ffi::avs_save_string_func),
        avs_add_function: Some(add_function as ffi::avs_add_function_func),
        avs_at_exit: Some(at_exit as ffi::avs_at_exit_func),
        avs_subframe: Some(subframe as ffi::avs_subframe_func),
        avs_subframe_planar: Some(subframe_planar as ffi::avs_subframe_planar_func),
        avs_new_c_filter: None,
    }
}

pub fn api() -> API {
    unsafe { API::from_functions(functions()) }
}

/// A fresh mock environment.
pub fn environment(interface_version: i32) -> ScriptEnvironment {
    ScriptEnvironment::with_api(api(), interface_version).unwrap()
}

/// Clips of `env` that haven't been freed.
pub fn live_clips(env: &ScriptEnvironment) -> i32 {
    unsafe { mock_env(env.as_ptr()).live_clips.load(Ordering::SeqCst) }
}

/// Native references held on the clip.
pub fn clip_refs(clip: &Clip<'_>) -> i32 {
    unsafe { mock_clip(clip.as_ptr()).refs.load(Ordering::SeqCst) }
}

/// Native references held on the frame.
pub fn frame_refs(frame: &VideoFrame<'_>) -> c_int {
    unsafe { (*frame.as_ptr()).refcount }
}

/// Sequence number of the frame's buffer, bumped by every write to the main plane.
pub fn frame_sequence(frame: &VideoFrame<'_>) -> c_int {
    unsafe { (*(*frame.as_ptr()).vfb).sequence_number }
}
