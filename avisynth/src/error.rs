//! The error type shared by every fallible operation.

use std::ffi::{CStr, NulError};
use std::os::raw::c_char;
use std::path::PathBuf;
use std::result;

use thiserror::Error;

use crate::format::{PixelType, Plane};
use crate::text;

/// The error type for AviSynth operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Couldn't load the AviSynth library: {reason}")]
    NativeLibraryUnavailable { reason: String },
    #[error("The engine refused interface version {requested}: {message}")]
    IncompatibleInterface { requested: i32, message: String },
    #[error("This value has no native representation: {0}")]
    UnsupportedValueType(String),
    #[error("Wrong value type: expected {expected}, found {found}")]
    WrongValueType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Script error: {0}")]
    ScriptError(String),
    #[error("The requested variable `{0}` is not defined")]
    VariableNotFound(String),
    #[error("Couldn't get the frame: {0}")]
    FrameDecodeError(String),
    #[error("The clip has no audio")]
    NoAudioTrack,
    #[error("Couldn't get the audio: {0}")]
    AudioDecodeError(String),
    #[error("Plane {plane:?} doesn't exist in {pixel_type}")]
    InvalidPlane { plane: Plane, pixel_type: PixelType },
    #[error("The frame is shared and can't be written to")]
    FrameNotWritable,
    #[error("Couldn't allocate a new frame")]
    FrameAllocationFailed,
    #[error("The clip belongs to a different script environment")]
    ForeignEnvironment,
    #[error("Got {names} argument names for {args} arguments")]
    ArgumentNameCount { args: usize, names: usize },
    #[error("Buffer too small: {required} bytes required, {actual} given")]
    BufferTooSmall { required: usize, actual: usize },
    #[error("Couldn't change the working directory to {}", .0.display())]
    WorkingDirectory(PathBuf),
    #[error("The path is not valid Unicode")]
    PathInvalidUnicode,
    #[error("The engine doesn't export {0}")]
    MissingEntryPoint(&'static str),
    #[error("Invalid subframe: {0}")]
    InvalidSubframe(String),
    #[error("Couldn't convert to a C string")]
    CStringConversion(#[source] NulError),
}

impl From<NulError> for Error {
    #[inline]
    fn from(x: NulError) -> Self {
        Error::CStringConversion(x)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Decodes a native message, replacing invalid sequences.
///
/// # Safety
/// `ptr` must be null or point to a valid null-terminated string.
#[inline]
pub(crate) unsafe fn native_message(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(text::decode(unsafe { CStr::from_ptr(ptr) }.to_bytes()).into_owned())
    }
}
