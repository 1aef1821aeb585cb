//! Script functions and exit callbacks implemented in Rust.

use std::ffi::CString;
use std::os::raw::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::process;
use std::ptr::NonNull;
use std::sync::Weak;

use avisynth_sys as ffi;
use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::api::API;
use crate::environment::{ScriptEnvironment, Shared};
use crate::error::{Error, Result};
use crate::text;
use crate::value::{self, Value};

/// A script function implemented in Rust.
///
/// The environment passed in is a view of the one the function was registered with, valid for
/// the duration of the call.
pub(crate) type Function =
    dyn for<'env> Fn(&'env ScriptEnvironment, &[Value<'env>]) -> Result<Value<'env>> + Send + Sync;

/// Container for the data of a registered script function.
pub(crate) struct FunctionData {
    pub name: String,
    pub api: API,
    pub interface_version: i32,
    // The environment owns this data, so it can't own the environment back.
    pub shared: Weak<Shared>,
    pub function: Box<Function>,
}

/// Container for an exit callback. Taken on the first call.
pub(crate) struct ShutdownData {
    pub function: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

#[inline]
fn error_value(message: *const std::os::raw::c_char) -> ffi::AVS_Value {
    ffi::AVS_Value {
        type_: ffi::AVS_VALUE_ERROR,
        array_size: 0,
        d: ffi::AVS_Value__bindgen_ty_1 { string: message },
    }
}

/// Decodes the arguments, runs the function and encodes its result for the engine.
fn run(
    data: &FunctionData,
    env: &ScriptEnvironment,
    args: &ffi::AVS_Value,
) -> Result<ffi::AVS_Value> {
    let args = match unsafe { value::decode(env, args)? } {
        Value::Array(args) => args,
        Value::Undefined => Vec::new(),
        arg => vec![arg],
    };

    let rv = (data.function)(env, &args)?;
    if let Value::Array(_) = rv {
        // The engine would free the elements itself.
        return Err(Error::UnsupportedValueType(
            "script functions can't return arrays".to_owned(),
        ));
    }

    rv.to_native(env)?.into_engine()
}

/// Calls a registered script function.
pub(crate) unsafe extern "system" fn apply(
    env: *mut ffi::AVS_ScriptEnvironment,
    args: ffi::AVS_Value,
    user_data: *mut c_void,
) -> ffi::AVS_Value {
    let closure = move || {
        let data = unsafe { &*(user_data as *const FunctionData) };

        let (Some(shared), Some(handle)) = (data.shared.upgrade(), NonNull::new(env)) else {
            return error_value(c"the script function outlived its environment".as_ptr());
        };

        trace!(function = %data.name, "calling a script function");
        let view = unsafe {
            ScriptEnvironment::lent(
                data.api.clone(),
                handle,
                data.interface_version,
                shared.clone(),
            )
        };

        match run(data, &view, &args) {
            Ok(rv) => rv,
            Err(err) => {
                warn!(function = %data.name, error = %err, "script function failed");
                let buf = format!("{}: {}", data.name, err).replace('\0', "\\0");
                let buf = CString::new(text::encode(&buf)).unwrap_or_default();
                // Pinned since the engine raises the message after this returns.
                error_value(shared.pin(buf))
            }
        }
    };

    match panic::catch_unwind(AssertUnwindSafe(closure)) {
        Ok(rv) => rv,
        Err(_) => process::abort(),
    }
}

/// Runs an exit callback.
pub(crate) unsafe extern "system" fn shutdown(
    user_data: *mut c_void,
    _env: *mut ffi::AVS_ScriptEnvironment,
) {
    let closure = move || {
        let data = unsafe { &*(user_data as *const ShutdownData) };
        let function = data.function.lock().take();
        if let Some(function) = function {
            function();
        }
    };

    if panic::catch_unwind(AssertUnwindSafe(closure)).is_err() {
        process::abort();
    }
}
