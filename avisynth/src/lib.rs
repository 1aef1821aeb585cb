//! A safe wrapper for the [AviSynth](https://avs-plus.net/) C interface, written in Rust. Works
//! with AviSynth 2.6, AviSynth+ and AvxSynth.
//!
//! The engine library is loaded at run time, so nothing needs to be linked when building. Entry
//! points that only newer engines export are replaced with software implementations when
//! missing, see [`api::Capabilities`].
//!
//! ## Functionality
//!
//! Scripts can be evaluated and script functions invoked, variables read and written, clips
//! queried for their format, frames retrieved and their planes read or written, and audio read.
//! Script functions can be implemented in Rust with
//! [`ScriptEnvironment::add_function()`](environment::ScriptEnvironment::add_function).
//!
//! For an example usage see `examples/avsinfo.rs`, which prints a clip's format and dumps
//! frames.
//!
//! ## Short example
//!
//! ```no_run
//! # use avisynth::prelude::*;
//! # fn foo() -> Result<(), avisynth::Error> {
//! let env = ScriptEnvironment::new(6)?;
//! let clip = env
//!     .invoke("BlankClip", &Value::from(vec![Value::from(640), Value::from(480)]), None)?
//!     .into_clip()?;
//! let frame = clip.get_frame(0)?;
//!
//! println!("{}×{}, {}", clip.video_info().width, clip.video_info().height, frame.pixel_type());
//! # Ok(())
//! # }
//! # fn main() {
//! # }
//! ```
//!
//! ## Lifetimes
//!
//! Every clip, frame and value borrows the [`ScriptEnvironment`] it came from, so the
//! environment is always dropped last.
//!
//! ## Finding the library
//!
//! By default `avisynth.dll`, `libavisynth.so` / `libavxsynth.so` or `libavisynth.dylib` is
//! looked up through the system library search path. The `AVISYNTH_LIB_DIR` and
//! `AVISYNTH_LIB_NAME` environment variables override the directory and the file name, see
//! [`config::Config`].
//!
//! ## Strings
//!
//! The engine works with narrow strings: UTF-8 everywhere except Windows, where it uses the
//! active ANSI code page. `&str` arguments and [`Value::as_str()`](value::Value::as_str) convert
//! accordingly, [`Value::as_bytes()`](value::Value::as_bytes) gives the raw bytes.

#![allow(unsafe_op_in_unsafe_fn)]

#[doc(hidden)]
pub use avisynth_sys as ffi;

pub mod api;
pub mod clip;
pub mod component;
pub mod config;
pub mod environment;
pub mod error;
mod fallback;
pub mod format;
pub mod frame;
mod function;
mod text;
pub mod value;
pub mod video_info;

pub use self::environment::ScriptEnvironment;
pub use self::error::{Error, Result};

pub mod prelude {
    //! The AviSynth prelude.
    //!
    //! Contains the types you most likely want to import anyway.
    pub use super::api::API;
    pub use super::clip::{CacheHint, Clip, Parity};
    pub use super::component::Component;
    pub use super::config::Config;
    pub use super::environment::ScriptEnvironment;
    pub use super::error::Error;
    pub use super::format::{PixelType, Plane, PresetFormat};
    pub use super::frame::VideoFrame;
    pub use super::value::{Value, ValueType};
    pub use super::video_info::VideoInfo;
}
