//! Raw bindings for the AviSynth C interface (`avisynth_c.h`), usable with AviSynth, AviSynth+
//! and AvxSynth.
//!
//! Nothing here is linked at build time. The entry points are resolved at run time from the
//! shared library, see [`AvisynthFunctions::load`] and [`open_library`].

#![allow(non_camel_case_types, non_upper_case_globals, non_snake_case)]

use std::os::raw::{c_char, c_int, c_short, c_uint, c_void};

mod loader;
pub use self::loader::{LoadError, SymbolError, library_candidates, open_library};

pub use libloading;

/// The interface version requested when none is given explicitly.
pub const AVISYNTH_INTERFACE_VERSION: c_int = 6;

// Sample types.
pub const AVS_SAMPLE_INT8: c_int = 1 << 0;
pub const AVS_SAMPLE_INT16: c_int = 1 << 1;
pub const AVS_SAMPLE_INT24: c_int = 1 << 2;
pub const AVS_SAMPLE_INT32: c_int = 1 << 3;
pub const AVS_SAMPLE_FLOAT: c_int = 1 << 4;

// Plane selectors.
pub const AVS_DEFAULT_PLANE: c_int = 0;
pub const AVS_PLANAR_Y: c_int = 1 << 0;
pub const AVS_PLANAR_U: c_int = 1 << 1;
pub const AVS_PLANAR_V: c_int = 1 << 2;
pub const AVS_PLANAR_ALIGNED: c_int = 1 << 3;
pub const AVS_PLANAR_Y_ALIGNED: c_int = AVS_PLANAR_Y | AVS_PLANAR_ALIGNED;
pub const AVS_PLANAR_U_ALIGNED: c_int = AVS_PLANAR_U | AVS_PLANAR_ALIGNED;
pub const AVS_PLANAR_V_ALIGNED: c_int = AVS_PLANAR_V | AVS_PLANAR_ALIGNED;
pub const AVS_PLANAR_A: c_int = 1 << 4;
pub const AVS_PLANAR_R: c_int = 1 << 5;
pub const AVS_PLANAR_G: c_int = 1 << 6;
pub const AVS_PLANAR_B: c_int = 1 << 7;

// Colorspace properties.
pub const AVS_CS_YUVA: c_uint = 1 << 27;
pub const AVS_CS_BGR: c_uint = 1 << 28;
pub const AVS_CS_YUV: c_uint = 1 << 29;
pub const AVS_CS_INTERLEAVED: c_uint = 1 << 30;
pub const AVS_CS_PLANAR: c_uint = 1 << 31;

pub const AVS_CS_SHIFT_SUB_WIDTH: c_uint = 0;
pub const AVS_CS_SHIFT_SUB_HEIGHT: c_uint = 8;
pub const AVS_CS_SHIFT_SAMPLE_BITS: c_uint = 16;

pub const AVS_CS_SUB_WIDTH_MASK: c_uint = 7 << AVS_CS_SHIFT_SUB_WIDTH;
pub const AVS_CS_SUB_WIDTH_1: c_uint = 3 << AVS_CS_SHIFT_SUB_WIDTH;
pub const AVS_CS_SUB_WIDTH_2: c_uint = 0 << AVS_CS_SHIFT_SUB_WIDTH;
pub const AVS_CS_SUB_WIDTH_4: c_uint = 1 << AVS_CS_SHIFT_SUB_WIDTH;

pub const AVS_CS_VPLANEFIRST: c_uint = 1 << 3;
pub const AVS_CS_UPLANEFIRST: c_uint = 1 << 4;

pub const AVS_CS_SUB_HEIGHT_MASK: c_uint = 7 << AVS_CS_SHIFT_SUB_HEIGHT;
pub const AVS_CS_SUB_HEIGHT_1: c_uint = 3 << AVS_CS_SHIFT_SUB_HEIGHT;
pub const AVS_CS_SUB_HEIGHT_2: c_uint = 0 << AVS_CS_SHIFT_SUB_HEIGHT;
pub const AVS_CS_SUB_HEIGHT_4: c_uint = 1 << AVS_CS_SHIFT_SUB_HEIGHT;

pub const AVS_CS_SAMPLE_BITS_MASK: c_uint = 7 << AVS_CS_SHIFT_SAMPLE_BITS;
pub const AVS_CS_SAMPLE_BITS_8: c_uint = 0 << AVS_CS_SHIFT_SAMPLE_BITS;
pub const AVS_CS_SAMPLE_BITS_10: c_uint = 5 << AVS_CS_SHIFT_SAMPLE_BITS;
pub const AVS_CS_SAMPLE_BITS_12: c_uint = 6 << AVS_CS_SHIFT_SAMPLE_BITS;
pub const AVS_CS_SAMPLE_BITS_14: c_uint = 7 << AVS_CS_SHIFT_SAMPLE_BITS;
pub const AVS_CS_SAMPLE_BITS_16: c_uint = 1 << AVS_CS_SHIFT_SAMPLE_BITS;
pub const AVS_CS_SAMPLE_BITS_32: c_uint = 2 << AVS_CS_SHIFT_SAMPLE_BITS;

pub const AVS_CS_PLANAR_MASK: c_uint = AVS_CS_PLANAR
    | AVS_CS_INTERLEAVED
    | AVS_CS_YUV
    | AVS_CS_BGR
    | AVS_CS_YUVA
    | AVS_CS_SAMPLE_BITS_MASK
    | AVS_CS_SUB_HEIGHT_MASK
    | AVS_CS_SUB_WIDTH_MASK;
pub const AVS_CS_PLANAR_FILTER: c_uint = !(AVS_CS_VPLANEFIRST | AVS_CS_UPLANEFIRST);

pub const AVS_CS_RGB_TYPE: c_uint = 1 << 0;
pub const AVS_CS_RGBA_TYPE: c_uint = 1 << 1;

pub const AVS_CS_GENERIC_YUV420: c_uint =
    AVS_CS_PLANAR | AVS_CS_YUV | AVS_CS_VPLANEFIRST | AVS_CS_SUB_HEIGHT_2 | AVS_CS_SUB_WIDTH_2;
pub const AVS_CS_GENERIC_YUV422: c_uint =
    AVS_CS_PLANAR | AVS_CS_YUV | AVS_CS_VPLANEFIRST | AVS_CS_SUB_HEIGHT_1 | AVS_CS_SUB_WIDTH_2;
pub const AVS_CS_GENERIC_YUV444: c_uint =
    AVS_CS_PLANAR | AVS_CS_YUV | AVS_CS_VPLANEFIRST | AVS_CS_SUB_HEIGHT_1 | AVS_CS_SUB_WIDTH_1;
pub const AVS_CS_GENERIC_Y: c_uint = AVS_CS_PLANAR | AVS_CS_INTERLEAVED | AVS_CS_YUV;
pub const AVS_CS_GENERIC_RGBP: c_uint = AVS_CS_PLANAR | AVS_CS_BGR | AVS_CS_RGB_TYPE;
pub const AVS_CS_GENERIC_RGBAP: c_uint = AVS_CS_PLANAR | AVS_CS_BGR | AVS_CS_RGBA_TYPE;
pub const AVS_CS_GENERIC_YUVA420: c_uint =
    AVS_CS_PLANAR | AVS_CS_YUVA | AVS_CS_VPLANEFIRST | AVS_CS_SUB_HEIGHT_2 | AVS_CS_SUB_WIDTH_2;
pub const AVS_CS_GENERIC_YUVA422: c_uint =
    AVS_CS_PLANAR | AVS_CS_YUVA | AVS_CS_VPLANEFIRST | AVS_CS_SUB_HEIGHT_1 | AVS_CS_SUB_WIDTH_2;
pub const AVS_CS_GENERIC_YUVA444: c_uint =
    AVS_CS_PLANAR | AVS_CS_YUVA | AVS_CS_VPLANEFIRST | AVS_CS_SUB_HEIGHT_1 | AVS_CS_SUB_WIDTH_1;

// Specific colorspaces.
pub const AVS_CS_UNKNOWN: c_uint = 0;
pub const AVS_CS_BGR24: c_uint = AVS_CS_RGB_TYPE | AVS_CS_BGR | AVS_CS_INTERLEAVED;
pub const AVS_CS_BGR32: c_uint = AVS_CS_RGBA_TYPE | AVS_CS_BGR | AVS_CS_INTERLEAVED;
pub const AVS_CS_YUY2: c_uint = 1 << 2 | AVS_CS_YUV | AVS_CS_INTERLEAVED;
pub const AVS_CS_RAW32: c_uint = 1 << 5 | AVS_CS_INTERLEAVED;

pub const AVS_CS_YV24: c_uint = AVS_CS_GENERIC_YUV444 | AVS_CS_SAMPLE_BITS_8;
pub const AVS_CS_YV16: c_uint = AVS_CS_GENERIC_YUV422 | AVS_CS_SAMPLE_BITS_8;
pub const AVS_CS_YV12: c_uint = AVS_CS_GENERIC_YUV420 | AVS_CS_SAMPLE_BITS_8;
pub const AVS_CS_I420: c_uint = AVS_CS_PLANAR
    | AVS_CS_YUV
    | AVS_CS_SAMPLE_BITS_8
    | AVS_CS_UPLANEFIRST
    | AVS_CS_SUB_HEIGHT_2
    | AVS_CS_SUB_WIDTH_2;
pub const AVS_CS_IYUV: c_uint = AVS_CS_I420;
pub const AVS_CS_YV411: c_uint = AVS_CS_PLANAR
    | AVS_CS_YUV
    | AVS_CS_SAMPLE_BITS_8
    | AVS_CS_VPLANEFIRST
    | AVS_CS_SUB_HEIGHT_1
    | AVS_CS_SUB_WIDTH_4;
pub const AVS_CS_YUV9: c_uint = AVS_CS_PLANAR
    | AVS_CS_YUV
    | AVS_CS_SAMPLE_BITS_8
    | AVS_CS_VPLANEFIRST
    | AVS_CS_SUB_HEIGHT_4
    | AVS_CS_SUB_WIDTH_4;
pub const AVS_CS_Y8: c_uint = AVS_CS_GENERIC_Y | AVS_CS_SAMPLE_BITS_8;

pub const AVS_CS_YUV444P10: c_uint = AVS_CS_GENERIC_YUV444 | AVS_CS_SAMPLE_BITS_10;
pub const AVS_CS_YUV422P10: c_uint = AVS_CS_GENERIC_YUV422 | AVS_CS_SAMPLE_BITS_10;
pub const AVS_CS_YUV420P10: c_uint = AVS_CS_GENERIC_YUV420 | AVS_CS_SAMPLE_BITS_10;
pub const AVS_CS_Y10: c_uint = AVS_CS_GENERIC_Y | AVS_CS_SAMPLE_BITS_10;
pub const AVS_CS_YUV444P12: c_uint = AVS_CS_GENERIC_YUV444 | AVS_CS_SAMPLE_BITS_12;
pub const AVS_CS_YUV422P12: c_uint = AVS_CS_GENERIC_YUV422 | AVS_CS_SAMPLE_BITS_12;
pub const AVS_CS_YUV420P12: c_uint = AVS_CS_GENERIC_YUV420 | AVS_CS_SAMPLE_BITS_12;
pub const AVS_CS_Y12: c_uint = AVS_CS_GENERIC_Y | AVS_CS_SAMPLE_BITS_12;
pub const AVS_CS_YUV444P14: c_uint = AVS_CS_GENERIC_YUV444 | AVS_CS_SAMPLE_BITS_14;
pub const AVS_CS_YUV422P14: c_uint = AVS_CS_GENERIC_YUV422 | AVS_CS_SAMPLE_BITS_14;
pub const AVS_CS_YUV420P14: c_uint = AVS_CS_GENERIC_YUV420 | AVS_CS_SAMPLE_BITS_14;
pub const AVS_CS_Y14: c_uint = AVS_CS_GENERIC_Y | AVS_CS_SAMPLE_BITS_14;
pub const AVS_CS_YUV444P16: c_uint = AVS_CS_GENERIC_YUV444 | AVS_CS_SAMPLE_BITS_16;
pub const AVS_CS_YUV422P16: c_uint = AVS_CS_GENERIC_YUV422 | AVS_CS_SAMPLE_BITS_16;
pub const AVS_CS_YUV420P16: c_uint = AVS_CS_GENERIC_YUV420 | AVS_CS_SAMPLE_BITS_16;
pub const AVS_CS_Y16: c_uint = AVS_CS_GENERIC_Y | AVS_CS_SAMPLE_BITS_16;
pub const AVS_CS_YUV444PS: c_uint = AVS_CS_GENERIC_YUV444 | AVS_CS_SAMPLE_BITS_32;
pub const AVS_CS_YUV422PS: c_uint = AVS_CS_GENERIC_YUV422 | AVS_CS_SAMPLE_BITS_32;
pub const AVS_CS_YUV420PS: c_uint = AVS_CS_GENERIC_YUV420 | AVS_CS_SAMPLE_BITS_32;
pub const AVS_CS_Y32: c_uint = AVS_CS_GENERIC_Y | AVS_CS_SAMPLE_BITS_32;

pub const AVS_CS_BGR48: c_uint =
    AVS_CS_RGB_TYPE | AVS_CS_BGR | AVS_CS_INTERLEAVED | AVS_CS_SAMPLE_BITS_16;
pub const AVS_CS_BGR64: c_uint =
    AVS_CS_RGBA_TYPE | AVS_CS_BGR | AVS_CS_INTERLEAVED | AVS_CS_SAMPLE_BITS_16;

pub const AVS_CS_RGBP: c_uint = AVS_CS_GENERIC_RGBP | AVS_CS_SAMPLE_BITS_8;
pub const AVS_CS_RGBP10: c_uint = AVS_CS_GENERIC_RGBP | AVS_CS_SAMPLE_BITS_10;
pub const AVS_CS_RGBP12: c_uint = AVS_CS_GENERIC_RGBP | AVS_CS_SAMPLE_BITS_12;
pub const AVS_CS_RGBP14: c_uint = AVS_CS_GENERIC_RGBP | AVS_CS_SAMPLE_BITS_14;
pub const AVS_CS_RGBP16: c_uint = AVS_CS_GENERIC_RGBP | AVS_CS_SAMPLE_BITS_16;
pub const AVS_CS_RGBPS: c_uint = AVS_CS_GENERIC_RGBP | AVS_CS_SAMPLE_BITS_32;

pub const AVS_CS_RGBAP: c_uint = AVS_CS_GENERIC_RGBAP | AVS_CS_SAMPLE_BITS_8;
pub const AVS_CS_RGBAP10: c_uint = AVS_CS_GENERIC_RGBAP | AVS_CS_SAMPLE_BITS_10;
pub const AVS_CS_RGBAP12: c_uint = AVS_CS_GENERIC_RGBAP | AVS_CS_SAMPLE_BITS_12;
pub const AVS_CS_RGBAP14: c_uint = AVS_CS_GENERIC_RGBAP | AVS_CS_SAMPLE_BITS_14;
pub const AVS_CS_RGBAP16: c_uint = AVS_CS_GENERIC_RGBAP | AVS_CS_SAMPLE_BITS_16;
pub const AVS_CS_RGBAPS: c_uint = AVS_CS_GENERIC_RGBAP | AVS_CS_SAMPLE_BITS_32;

pub const AVS_CS_YUVA444: c_uint = AVS_CS_GENERIC_YUVA444 | AVS_CS_SAMPLE_BITS_8;
pub const AVS_CS_YUVA422: c_uint = AVS_CS_GENERIC_YUVA422 | AVS_CS_SAMPLE_BITS_8;
pub const AVS_CS_YUVA420: c_uint = AVS_CS_GENERIC_YUVA420 | AVS_CS_SAMPLE_BITS_8;
pub const AVS_CS_YUVA444P10: c_uint = AVS_CS_GENERIC_YUVA444 | AVS_CS_SAMPLE_BITS_10;
pub const AVS_CS_YUVA422P10: c_uint = AVS_CS_GENERIC_YUVA422 | AVS_CS_SAMPLE_BITS_10;
pub const AVS_CS_YUVA420P10: c_uint = AVS_CS_GENERIC_YUVA420 | AVS_CS_SAMPLE_BITS_10;
pub const AVS_CS_YUVA444P16: c_uint = AVS_CS_GENERIC_YUVA444 | AVS_CS_SAMPLE_BITS_16;
pub const AVS_CS_YUVA422P16: c_uint = AVS_CS_GENERIC_YUVA422 | AVS_CS_SAMPLE_BITS_16;
pub const AVS_CS_YUVA420P16: c_uint = AVS_CS_GENERIC_YUVA420 | AVS_CS_SAMPLE_BITS_16;
pub const AVS_CS_YUVA444PS: c_uint = AVS_CS_GENERIC_YUVA444 | AVS_CS_SAMPLE_BITS_32;
pub const AVS_CS_YUVA422PS: c_uint = AVS_CS_GENERIC_YUVA422 | AVS_CS_SAMPLE_BITS_32;
pub const AVS_CS_YUVA420PS: c_uint = AVS_CS_GENERIC_YUVA420 | AVS_CS_SAMPLE_BITS_32;

// Image types.
pub const AVS_IT_BFF: c_int = 1 << 0;
pub const AVS_IT_TFF: c_int = 1 << 1;
pub const AVS_IT_FIELDBASED: c_int = 1 << 2;

// Cache hints.
pub const AVS_CACHE_NOTHING: c_int = 10;
pub const AVS_CACHE_WINDOW: c_int = 11;
pub const AVS_CACHE_GENERIC: c_int = 12;
pub const AVS_CACHE_FORCE_GENERIC: c_int = 13;
pub const AVS_CACHE_GET_POLICY: c_int = 30;
pub const AVS_CACHE_GET_WINDOW: c_int = 31;
pub const AVS_CACHE_GET_RANGE: c_int = 32;
pub const AVS_CACHE_AUDIO: c_int = 50;
pub const AVS_CACHE_AUDIO_NOTHING: c_int = 51;
pub const AVS_CACHE_AUDIO_NONE: c_int = 52;
pub const AVS_CACHE_AUDIO_AUTO: c_int = 53;
pub const AVS_CACHE_GET_AUDIO_POLICY: c_int = 70;
pub const AVS_CACHE_GET_AUDIO_SIZE: c_int = 71;
pub const AVS_CACHE_PREFETCH_FRAME: c_int = 100;
pub const AVS_CACHE_PREFETCH_GO: c_int = 101;
pub const AVS_CACHE_GETCHILD_CACHE_MODE: c_int = 200;
pub const AVS_CACHE_GETCHILD_CACHE_SIZE: c_int = 201;
pub const AVS_CACHE_GETCHILD_AUDIO_MODE: c_int = 202;
pub const AVS_CACHE_GETCHILD_AUDIO_SIZE: c_int = 203;
pub const AVS_CACHE_GETCHILD_COST: c_int = 220;
pub const AVS_CACHE_COST_ZERO: c_int = 221;
pub const AVS_CACHE_COST_UNIT: c_int = 222;
pub const AVS_CACHE_COST_LOW: c_int = 223;
pub const AVS_CACHE_COST_MED: c_int = 224;
pub const AVS_CACHE_COST_HI: c_int = 225;
pub const AVS_CACHE_GETCHILD_THREAD_MODE: c_int = 240;
pub const AVS_CACHE_THREAD_UNSAFE: c_int = 241;
pub const AVS_CACHE_THREAD_CLASS: c_int = 242;
pub const AVS_CACHE_THREAD_SAFE: c_int = 243;
pub const AVS_CACHE_THREAD_OWN: c_int = 244;
pub const AVS_CACHE_GETCHILD_ACCESS_COST: c_int = 260;
pub const AVS_CACHE_ACCESS_RAND: c_int = 261;
pub const AVS_CACHE_ACCESS_SEQ0: c_int = 262;
pub const AVS_CACHE_ACCESS_SEQ1: c_int = 263;

pub const AVS_FRAME_ALIGN: c_int = 64;

// `AVS_Value` type tags.
pub const AVS_VALUE_VOID: c_short = b'v' as c_short;
pub const AVS_VALUE_CLIP: c_short = b'c' as c_short;
pub const AVS_VALUE_BOOL: c_short = b'b' as c_short;
pub const AVS_VALUE_INT: c_short = b'i' as c_short;
pub const AVS_VALUE_FLOAT: c_short = b'f' as c_short;
pub const AVS_VALUE_STRING: c_short = b's' as c_short;
pub const AVS_VALUE_ERROR: c_short = b'e' as c_short;
pub const AVS_VALUE_ARRAY: c_short = b'a' as c_short;
#[cfg(not(windows))]
pub const AVS_VALUE_LONG: c_short = b'l' as c_short;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct AVS_ScriptEnvironment {
    _unused: [u8; 0],
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct AVS_Clip {
    _unused: [u8; 0],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AVS_VideoInfo {
    /// 0 means no video.
    pub width: c_int,
    pub height: c_int,
    pub fps_numerator: c_uint,
    pub fps_denominator: c_uint,
    pub num_frames: c_int,
    pub pixel_type: c_uint,
    /// 0 means no audio.
    pub audio_samples_per_second: c_int,
    pub sample_type: c_int,
    pub num_audio_samples: i64,
    pub nchannels: c_int,
    pub image_type: c_int,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct AVS_VideoFrameBuffer {
    pub data: *mut u8,
    pub data_size: c_int,
    pub sequence_number: c_int,
    pub refcount: c_int,
}

/// The engine discourages reading this structure directly; it is only done by the software
/// fallbacks for engines that lack the `*_p` accessors.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct AVS_VideoFrame {
    pub refcount: c_int,
    pub vfb: *mut AVS_VideoFrameBuffer,
    pub offset: c_int,
    pub pitch: c_int,
    pub row_size: c_int,
    pub height: c_int,
    pub offsetU: c_int,
    pub offsetV: c_int,
    pub pitchUV: c_int,
    pub row_sizeUV: c_int,
    pub heightUV: c_int,
    /// Alpha plane support, `pitchA` and `row_sizeA` are 0 if there is none.
    pub offsetA: c_int,
    pub pitchA: c_int,
    pub row_sizeA: c_int,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub union AVS_Value__bindgen_ty_1 {
    pub clip: *mut AVS_Clip,
    pub boolean: c_char,
    pub integer: c_int,
    pub floating_pt: f32,
    pub string: *const c_char,
    pub array: *const AVS_Value,
    /// AvxSynth and the AviSynth+ unix builds extend the union with a 64-bit integer.
    #[cfg(not(windows))]
    pub longlong: i64,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct AVS_Value {
    pub type_: c_short,
    pub array_size: c_short,
    pub d: AVS_Value__bindgen_ty_1,
}

impl AVS_Value {
    /// A void value.
    pub const VOID: AVS_Value = AVS_Value {
        type_: AVS_VALUE_VOID,
        array_size: 0,
        d: AVS_Value__bindgen_ty_1 { integer: 0 },
    };
}

impl std::fmt::Debug for AVS_Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AVS_Value")
            .field("type_", &(self.type_ as u8 as char))
            .field("array_size", &self.array_size)
            .finish_non_exhaustive()
    }
}

// Filter callbacks, used by C filters created with `avs_new_c_filter`.
pub type AVS_GetFrameCallback =
    Option<unsafe extern "system" fn(fi: *mut AVS_FilterInfo, n: c_int) -> *mut AVS_VideoFrame>;
pub type AVS_GetParityCallback =
    Option<unsafe extern "system" fn(fi: *mut AVS_FilterInfo, n: c_int) -> c_int>;
pub type AVS_GetAudioCallback = Option<
    unsafe extern "system" fn(
        fi: *mut AVS_FilterInfo,
        buf: *mut c_void,
        start: i64,
        count: i64,
    ) -> c_int,
>;
pub type AVS_SetCacheHintsCallback = Option<
    unsafe extern "system" fn(
        fi: *mut AVS_FilterInfo,
        cachehints: c_int,
        frame_range: c_int,
    ) -> c_int,
>;
pub type AVS_FreeFilterCallback = Option<unsafe extern "system" fn(fi: *mut AVS_FilterInfo)>;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct AVS_FilterInfo {
    pub child: *mut AVS_Clip,
    pub vi: AVS_VideoInfo,
    pub env: *mut AVS_ScriptEnvironment,
    pub get_frame: AVS_GetFrameCallback,
    pub get_parity: AVS_GetParityCallback,
    pub get_audio: AVS_GetAudioCallback,
    pub set_cache_hints: AVS_SetCacheHintsCallback,
    pub free_filter: AVS_FreeFilterCallback,
    /// Should be set whenever there is an error to report.
    pub error: *const c_char,
    pub user_data: *mut c_void,
}

pub type AVS_ApplyFunc = Option<
    unsafe extern "system" fn(
        env: *mut AVS_ScriptEnvironment,
        args: AVS_Value,
        user_data: *mut c_void,
    ) -> AVS_Value,
>;
pub type AVS_ShutdownFunc =
    Option<unsafe extern "system" fn(user_data: *mut c_void, env: *mut AVS_ScriptEnvironment)>;

// Entry points.
pub type avs_create_script_environment_func =
    unsafe extern "system" fn(version: c_int) -> *mut AVS_ScriptEnvironment;
pub type avs_delete_script_environment_func =
    unsafe extern "system" fn(env: *mut AVS_ScriptEnvironment);
pub type avs_get_error_func =
    unsafe extern "system" fn(env: *mut AVS_ScriptEnvironment) -> *const c_char;
pub type avs_check_version_func =
    unsafe extern "system" fn(env: *mut AVS_ScriptEnvironment, version: c_int) -> c_int;
pub type avs_get_cpu_flags_func =
    unsafe extern "system" fn(env: *mut AVS_ScriptEnvironment) -> c_int;
pub type avs_function_exists_func =
    unsafe extern "system" fn(env: *mut AVS_ScriptEnvironment, name: *const c_char) -> c_int;
pub type avs_invoke_func = unsafe extern "system" fn(
    env: *mut AVS_ScriptEnvironment,
    name: *const c_char,
    args: AVS_Value,
    arg_names: *const *const c_char,
) -> AVS_Value;
pub type avs_get_var_func =
    unsafe extern "system" fn(env: *mut AVS_ScriptEnvironment, name: *const c_char) -> AVS_Value;
pub type avs_set_var_func = unsafe extern "system" fn(
    env: *mut AVS_ScriptEnvironment,
    name: *const c_char,
    val: AVS_Value,
) -> c_int;
pub type avs_set_global_var_func = avs_set_var_func;
pub type avs_new_video_frame_a_func = unsafe extern "system" fn(
    env: *mut AVS_ScriptEnvironment,
    vi: *const AVS_VideoInfo,
    align: c_int,
) -> *mut AVS_VideoFrame;
pub type avs_make_writable_func = unsafe extern "system" fn(
    env: *mut AVS_ScriptEnvironment,
    pvf: *mut *mut AVS_VideoFrame,
) -> c_int;
pub type avs_bit_blt_func = unsafe extern "system" fn(
    env: *mut AVS_ScriptEnvironment,
    dstp: *mut u8,
    dst_pitch: c_int,
    srcp: *const u8,
    src_pitch: c_int,
    row_size: c_int,
    height: c_int,
);
pub type avs_set_memory_max_func =
    unsafe extern "system" fn(env: *mut AVS_ScriptEnvironment, mem: c_int) -> c_int;
pub type avs_set_working_dir_func =
    unsafe extern "system" fn(env: *mut AVS_ScriptEnvironment, newdir: *const c_char) -> c_int;

pub type avs_take_clip_func =
    unsafe extern "system" fn(v: AVS_Value, env: *mut AVS_ScriptEnvironment) -> *mut AVS_Clip;
pub type avs_set_to_clip_func = unsafe extern "system" fn(v: *mut AVS_Value, c: *mut AVS_Clip);
pub type avs_copy_clip_func = unsafe extern "system" fn(c: *mut AVS_Clip) -> *mut AVS_Clip;
pub type avs_release_clip_func = unsafe extern "system" fn(c: *mut AVS_Clip);
pub type avs_clip_get_error_func = unsafe extern "system" fn(c: *mut AVS_Clip) -> *const c_char;
pub type avs_get_video_info_func =
    unsafe extern "system" fn(c: *mut AVS_Clip) -> *const AVS_VideoInfo;
pub type avs_get_version_func = unsafe extern "system" fn(c: *mut AVS_Clip) -> c_int;
pub type avs_get_frame_func =
    unsafe extern "system" fn(c: *mut AVS_Clip, n: c_int) -> *mut AVS_VideoFrame;
pub type avs_get_parity_func = unsafe extern "system" fn(c: *mut AVS_Clip, n: c_int) -> c_int;
pub type avs_get_audio_func = unsafe extern "system" fn(
    c: *mut AVS_Clip,
    buf: *mut c_void,
    start: i64,
    count: i64,
) -> c_int;
pub type avs_set_cache_hints_func =
    unsafe extern "system" fn(c: *mut AVS_Clip, cachehints: c_int, frame_range: c_int) -> c_int;

pub type avs_copy_video_frame_func =
    unsafe extern "system" fn(f: *mut AVS_VideoFrame) -> *mut AVS_VideoFrame;
pub type avs_release_video_frame_func = unsafe extern "system" fn(f: *mut AVS_VideoFrame);
pub type avs_get_pitch_p_func =
    unsafe extern "system" fn(p: *const AVS_VideoFrame, plane: c_int) -> c_int;
pub type avs_get_row_size_p_func = avs_get_pitch_p_func;
pub type avs_get_height_p_func = avs_get_pitch_p_func;
pub type avs_get_read_ptr_p_func =
    unsafe extern "system" fn(p: *const AVS_VideoFrame, plane: c_int) -> *const u8;
pub type avs_get_write_ptr_p_func =
    unsafe extern "system" fn(p: *mut AVS_VideoFrame, plane: c_int) -> *mut u8;
pub type avs_is_writable_func = unsafe extern "system" fn(p: *const AVS_VideoFrame) -> c_int;

pub type avs_release_value_func = unsafe extern "system" fn(v: AVS_Value);

pub type avs_save_string_func = unsafe extern "system" fn(
    env: *mut AVS_ScriptEnvironment,
    s: *const c_char,
    length: c_int,
) -> *const c_char;
pub type avs_add_function_func = unsafe extern "system" fn(
    env: *mut AVS_ScriptEnvironment,
    name: *const c_char,
    params: *const c_char,
    apply: AVS_ApplyFunc,
    user_data: *mut c_void,
) -> c_int;
pub type avs_at_exit_func = unsafe extern "system" fn(
    env: *mut AVS_ScriptEnvironment,
    function: AVS_ShutdownFunc,
    user_data: *mut c_void,
);
pub type avs_subframe_func = unsafe extern "system" fn(
    env: *mut AVS_ScriptEnvironment,
    src: *mut AVS_VideoFrame,
    rel_offset: c_int,
    new_pitch: c_int,
    new_row_size: c_int,
    new_height: c_int,
) -> *mut AVS_VideoFrame;
pub type avs_subframe_planar_func = unsafe extern "system" fn(
    env: *mut AVS_ScriptEnvironment,
    src: *mut AVS_VideoFrame,
    rel_offset: c_int,
    new_pitch: c_int,
    new_row_size: c_int,
    new_height: c_int,
    rel_offsetU: c_int,
    rel_offsetV: c_int,
    new_pitchUV: c_int,
) -> *mut AVS_VideoFrame;
pub type avs_new_c_filter_func = unsafe extern "system" fn(
    env: *mut AVS_ScriptEnvironment,
    fi: *mut *mut AVS_FilterInfo,
    child: AVS_Value,
    store_child: c_int,
) -> *mut AVS_Clip;

/// The entry points of the C interface.
///
/// Optional entry points only exist in newer interface versions.
#[derive(Debug, Clone, Copy)]
pub struct AvisynthFunctions {
    pub avs_create_script_environment: avs_create_script_environment_func,
    pub avs_delete_script_environment: avs_delete_script_environment_func,
    pub avs_check_version: avs_check_version_func,
    pub avs_get_cpu_flags: avs_get_cpu_flags_func,
    pub avs_function_exists: avs_function_exists_func,
    pub avs_invoke: avs_invoke_func,
    pub avs_get_var: avs_get_var_func,
    pub avs_set_var: avs_set_var_func,
    pub avs_set_global_var: avs_set_global_var_func,
    pub avs_new_video_frame_a: avs_new_video_frame_a_func,
    pub avs_make_writable: avs_make_writable_func,
    pub avs_set_memory_max: avs_set_memory_max_func,
    pub avs_set_working_dir: avs_set_working_dir_func,
    pub avs_take_clip: avs_take_clip_func,
    pub avs_set_to_clip: avs_set_to_clip_func,
    pub avs_copy_clip: avs_copy_clip_func,
    pub avs_release_clip: avs_release_clip_func,
    pub avs_clip_get_error: avs_clip_get_error_func,
    pub avs_get_video_info: avs_get_video_info_func,
    pub avs_get_version: avs_get_version_func,
    pub avs_get_frame: avs_get_frame_func,
    pub avs_get_parity: avs_get_parity_func,
    pub avs_get_audio: avs_get_audio_func,
    pub avs_set_cache_hints: avs_set_cache_hints_func,
    pub avs_copy_video_frame: avs_copy_video_frame_func,
    pub avs_release_video_frame: avs_release_video_frame_func,
    pub avs_release_value: avs_release_value_func,

    pub avs_get_error: Option<avs_get_error_func>,
    pub avs_bit_blt: Option<avs_bit_blt_func>,
    pub avs_get_pitch_p: Option<avs_get_pitch_p_func>,
    pub avs_get_row_size_p: Option<avs_get_row_size_p_func>,
    pub avs_get_height_p: Option<avs_get_height_p_func>,
    pub avs_get_read_ptr_p: Option<avs_get_read_ptr_p_func>,
    pub avs_get_write_ptr_p: Option<avs_get_write_ptr_p_func>,
    pub avs_is_writable: Option<avs_is_writable_func>,
    pub avs_save_string: Option<avs_save_string_func>,
    pub avs_add_function: Option<avs_add_function_func>,
    pub avs_at_exit: Option<avs_at_exit_func>,
    pub avs_subframe: Option<avs_subframe_func>,
    pub avs_subframe_planar: Option<avs_subframe_planar_func>,
    pub avs_new_c_filter: Option<avs_new_c_filter_func>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, offset_of, size_of};

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn bindgen_test_layout_AVS_Value() {
        assert_eq!(size_of::<AVS_Value>(), 16);
        assert_eq!(align_of::<AVS_Value>(), 8);
        assert_eq!(offset_of!(AVS_Value, type_), 0);
        assert_eq!(offset_of!(AVS_Value, array_size), 2);
        assert_eq!(offset_of!(AVS_Value, d), 8);
    }

    #[test]
    #[cfg(all(target_pointer_width = "32", windows))]
    fn bindgen_test_layout_AVS_Value() {
        assert_eq!(size_of::<AVS_Value>(), 8);
        assert_eq!(offset_of!(AVS_Value, d), 4);
    }

    #[test]
    fn bindgen_test_layout_AVS_VideoInfo() {
        assert_eq!(size_of::<AVS_VideoInfo>(), 48);
        assert_eq!(offset_of!(AVS_VideoInfo, pixel_type), 20);
        assert_eq!(offset_of!(AVS_VideoInfo, num_audio_samples), 32);
        assert_eq!(offset_of!(AVS_VideoInfo, nchannels), 40);
        assert_eq!(offset_of!(AVS_VideoInfo, image_type), 44);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn bindgen_test_layout_AVS_VideoFrame() {
        assert_eq!(offset_of!(AVS_VideoFrame, vfb), 8);
        assert_eq!(offset_of!(AVS_VideoFrame, offset), 16);
        assert_eq!(offset_of!(AVS_VideoFrame, row_sizeA), 60);
        assert_eq!(size_of::<AVS_VideoFrame>(), 64);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn bindgen_test_layout_AVS_FilterInfo() {
        assert_eq!(offset_of!(AVS_FilterInfo, vi), 8);
        assert_eq!(offset_of!(AVS_FilterInfo, env), 56);
        assert_eq!(offset_of!(AVS_FilterInfo, free_filter), 96);
        assert_eq!(offset_of!(AVS_FilterInfo, user_data), 112);
        assert_eq!(size_of::<AVS_FilterInfo>(), 120);
    }

    #[test]
    fn colorspace_constants() {
        assert_eq!(AVS_CS_BGR24 as i32, 1342177281);
        assert_eq!(AVS_CS_BGR32 as i32, 1342177282);
        assert_eq!(AVS_CS_BGR48 as i32, 1342242817);
        assert_eq!(AVS_CS_YUV420P10 as i32, -1610285048);
        assert_eq!(AVS_CS_Y16 as i32, -536805376);
    }
}
