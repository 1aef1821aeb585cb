//! Script values and their native representation.

use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::fmt;
use std::mem;
use std::os::raw::{c_char, c_short};
use std::ptr::{self, NonNull};
use std::slice;

use avisynth_sys as ffi;

use crate::clip::Clip;
use crate::environment::ScriptEnvironment;
use crate::error::{Error, Result};
use crate::text;

/// Types of defined values.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    String,
    Error,
    Clip,
    Array,
}

impl ValueType {
    /// Returns the native type tag.
    #[inline]
    pub fn tag(self) -> c_short {
        match self {
            ValueType::Bool => ffi::AVS_VALUE_BOOL,
            ValueType::Int => ffi::AVS_VALUE_INT,
            ValueType::Float => ffi::AVS_VALUE_FLOAT,
            ValueType::String => ffi::AVS_VALUE_STRING,
            ValueType::Error => ffi::AVS_VALUE_ERROR,
            ValueType::Clip => ffi::AVS_VALUE_CLIP,
            ValueType::Array => ffi::AVS_VALUE_ARRAY,
        }
    }

    /// Maps a native type tag, `None` for void and unknown tags.
    #[inline]
    pub fn from_tag(tag: c_short) -> Option<Self> {
        match tag {
            ffi::AVS_VALUE_BOOL => Some(ValueType::Bool),
            ffi::AVS_VALUE_INT => Some(ValueType::Int),
            #[cfg(not(windows))]
            ffi::AVS_VALUE_LONG => Some(ValueType::Int),
            ffi::AVS_VALUE_FLOAT => Some(ValueType::Float),
            ffi::AVS_VALUE_STRING => Some(ValueType::String),
            ffi::AVS_VALUE_ERROR => Some(ValueType::Error),
            ffi::AVS_VALUE_CLIP => Some(ValueType::Clip),
            ffi::AVS_VALUE_ARRAY => Some(ValueType::Array),
            _ => None,
        }
    }

    #[inline]
    fn name(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Error => "error",
            ValueType::Clip => "clip",
            ValueType::Array => "array",
        }
    }
}

/// A script value.
///
/// Clips are compared by handle: two handles to the same clip obtained separately may compare
/// unequal.
#[derive(Debug, Clone)]
pub enum Value<'env> {
    Undefined,
    Bool(bool),
    Int(i32),
    /// The engine stores single precision floats.
    Float(f32),
    String(Vec<u8>),
    Error(Vec<u8>),
    Clip(Clip<'env>),
    Array(Vec<Value<'env>>),
}

impl<'env> PartialEq for Value<'env> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Clip(a), Value::Clip(b)) => a.as_ptr() == b.as_ptr(),
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for Value<'_> {
    #[inline]
    fn default() -> Self {
        Value::Undefined
    }
}

impl<'env> Value<'env> {
    /// Returns the type of this value, `None` if it is undefined.
    #[inline]
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Undefined => None,
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Int(_) => Some(ValueType::Int),
            Value::Float(_) => Some(ValueType::Float),
            Value::String(_) => Some(ValueType::String),
            Value::Error(_) => Some(ValueType::Error),
            Value::Clip(_) => Some(ValueType::Clip),
            Value::Array(_) => Some(ValueType::Array),
        }
    }

    #[inline]
    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Undefined)
    }

    /// Number of elements of an array, 1 for anything else.
    #[inline]
    pub fn array_size(&self) -> usize {
        match self {
            Value::Array(values) => values.len(),
            _ => 1,
        }
    }

    #[inline]
    fn wrong_type(&self, expected: ValueType) -> Error {
        Error::WrongValueType {
            expected: expected.name(),
            found: self.value_type().map_or("undefined", ValueType::name),
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Result<bool> {
        match *self {
            Value::Bool(x) => Ok(x),
            _ => Err(self.wrong_type(ValueType::Bool)),
        }
    }

    #[inline]
    pub fn as_int(&self) -> Result<i32> {
        match *self {
            Value::Int(x) => Ok(x),
            _ => Err(self.wrong_type(ValueType::Int)),
        }
    }

    /// Ints are also accepted, like the engine does.
    #[inline]
    pub fn as_float(&self) -> Result<f32> {
        match *self {
            Value::Float(x) => Ok(x),
            Value::Int(x) => Ok(x as f32),
            _ => Err(self.wrong_type(ValueType::Float)),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Value::String(x) => Ok(x),
            _ => Err(self.wrong_type(ValueType::String)),
        }
    }

    /// Returns the string decoded from the engine's encoding, replacing invalid sequences.
    #[inline]
    pub fn as_str(&self) -> Result<Cow<'_, str>> {
        self.as_bytes().map(text::decode)
    }

    #[inline]
    pub fn as_error(&self) -> Result<Cow<'_, str>> {
        match self {
            Value::Error(x) => Ok(text::decode(x)),
            _ => Err(self.wrong_type(ValueType::Error)),
        }
    }

    #[inline]
    pub fn as_clip(&self) -> Result<&Clip<'env>> {
        match self {
            Value::Clip(x) => Ok(x),
            _ => Err(self.wrong_type(ValueType::Clip)),
        }
    }

    #[inline]
    pub fn into_clip(self) -> Result<Clip<'env>> {
        match self {
            Value::Clip(x) => Ok(x),
            _ => Err(self.wrong_type(ValueType::Clip)),
        }
    }

    #[inline]
    pub fn as_array(&self) -> Result<&[Value<'env>]> {
        match self {
            Value::Array(x) => Ok(x),
            _ => Err(self.wrong_type(ValueType::Array)),
        }
    }

    /// Converts this value into the native representation.
    ///
    /// Strings are pinned in `env` because the engine keeps the pointers. Clips take a new
    /// reference which the returned value releases when dropped.
    pub fn to_native<'a>(&self, env: &'a ScriptEnvironment) -> Result<NativeValue<'a>> {
        let plain = |type_: c_short, d: ffi::AVS_Value__bindgen_ty_1| NativeValue {
            raw: ffi::AVS_Value {
                type_,
                array_size: 0,
                d,
            },
            env,
            storage: Storage::Plain,
        };

        let value = match self {
            Value::Undefined => NativeValue {
                raw: ffi::AVS_Value::VOID,
                env,
                storage: Storage::Plain,
            },
            Value::Bool(x) => plain(
                ffi::AVS_VALUE_BOOL,
                ffi::AVS_Value__bindgen_ty_1 {
                    boolean: *x as c_char,
                },
            ),
            Value::Int(x) => plain(
                ffi::AVS_VALUE_INT,
                ffi::AVS_Value__bindgen_ty_1 { integer: *x },
            ),
            Value::Float(x) => plain(
                ffi::AVS_VALUE_FLOAT,
                ffi::AVS_Value__bindgen_ty_1 { floating_pt: *x },
            ),
            Value::String(bytes) | Value::Error(bytes) => {
                let string = CString::new(bytes.clone()).map_err(|_| {
                    Error::UnsupportedValueType("strings can't contain NUL bytes".to_owned())
                })?;
                let type_ = if let Value::String(_) = self {
                    ffi::AVS_VALUE_STRING
                } else {
                    ffi::AVS_VALUE_ERROR
                };
                plain(
                    type_,
                    ffi::AVS_Value__bindgen_ty_1 {
                        string: env.pin(string),
                    },
                )
            }
            Value::Clip(clip) => {
                if !ptr::eq(clip.env(), env) {
                    return Err(Error::ForeignEnvironment);
                }

                let mut raw = ffi::AVS_Value::VOID;
                let _guard = env.lock();
                unsafe {
                    env.api().set_to_clip(&mut raw, clip.as_ptr());
                }
                NativeValue {
                    raw,
                    env,
                    storage: Storage::Owned,
                }
            }
            Value::Array(values) => {
                let array_size = c_short::try_from(values.len()).map_err(|_| {
                    Error::UnsupportedValueType(format!(
                        "arrays are limited to {} elements, got {}",
                        c_short::MAX,
                        values.len()
                    ))
                })?;
                let children = values
                    .iter()
                    .map(|value| value.to_native(env))
                    .collect::<Result<Vec<_>>>()?;
                let elements = children
                    .iter()
                    .map(|child| child.raw)
                    .collect::<Box<[ffi::AVS_Value]>>();

                NativeValue {
                    raw: ffi::AVS_Value {
                        type_: ffi::AVS_VALUE_ARRAY,
                        array_size,
                        d: ffi::AVS_Value__bindgen_ty_1 {
                            array: elements.as_ptr(),
                        },
                    },
                    env,
                    storage: Storage::Array {
                        _children: children,
                        _elements: elements,
                    },
                }
            }
        };

        Ok(value)
    }
}

impl<'env> From<bool> for Value<'env> {
    #[inline]
    fn from(x: bool) -> Self {
        Value::Bool(x)
    }
}

impl<'env> From<i32> for Value<'env> {
    #[inline]
    fn from(x: i32) -> Self {
        Value::Int(x)
    }
}

impl<'env> TryFrom<i64> for Value<'env> {
    type Error = Error;

    #[inline]
    fn try_from(x: i64) -> Result<Self> {
        i32::try_from(x).map(Value::Int).map_err(|_| {
            Error::UnsupportedValueType(format!("{} doesn't fit in a 32-bit int", x))
        })
    }
}

impl<'env> From<f32> for Value<'env> {
    #[inline]
    fn from(x: f32) -> Self {
        Value::Float(x)
    }
}

/// Truncated to single precision.
impl<'env> From<f64> for Value<'env> {
    #[inline]
    fn from(x: f64) -> Self {
        Value::Float(x as f32)
    }
}

/// Encoded the way the engine expects, see `as_str()`.
impl<'env> From<&str> for Value<'env> {
    #[inline]
    fn from(x: &str) -> Self {
        Value::String(text::encode(x).into_owned())
    }
}

impl<'env> From<String> for Value<'env> {
    #[inline]
    fn from(x: String) -> Self {
        match text::encode(&x) {
            Cow::Borrowed(_) => Value::String(x.into_bytes()),
            Cow::Owned(bytes) => Value::String(bytes),
        }
    }
}

impl<'env> From<&[u8]> for Value<'env> {
    #[inline]
    fn from(x: &[u8]) -> Self {
        Value::String(x.to_vec())
    }
}

impl<'env> From<Vec<u8>> for Value<'env> {
    #[inline]
    fn from(x: Vec<u8>) -> Self {
        Value::String(x)
    }
}

impl<'env> From<Clip<'env>> for Value<'env> {
    #[inline]
    fn from(x: Clip<'env>) -> Self {
        Value::Clip(x)
    }
}

impl<'env> From<Vec<Value<'env>>> for Value<'env> {
    #[inline]
    fn from(x: Vec<Value<'env>>) -> Self {
        Value::Array(x)
    }
}

enum Storage<'env> {
    /// Nothing to release: scalars and pinned strings.
    Plain,
    /// Released with `avs_release_value`: values returned by the engine and host clips.
    Owned,
    /// A host-built array. The engine never owned the element storage, so only the elements
    /// are released.
    Array {
        _children: Vec<NativeValue<'env>>,
        _elements: Box<[ffi::AVS_Value]>,
    },
}

/// A value in the native representation.
pub struct NativeValue<'env> {
    raw: ffi::AVS_Value,
    env: &'env ScriptEnvironment,
    storage: Storage<'env>,
}

impl fmt::Debug for NativeValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeValue").field("raw", &self.raw).finish()
    }
}

impl Drop for NativeValue<'_> {
    fn drop(&mut self) {
        if let Storage::Owned = self.storage {
            let _guard = self.env.lock();
            unsafe {
                self.env.api().release_value(self.raw);
            }
        }
    }
}

impl<'env> NativeValue<'env> {
    /// Wraps a value returned by the engine.
    ///
    /// # Safety
    /// `raw` must be a valid value produced by `env` that nothing else releases.
    #[inline]
    pub(crate) unsafe fn from_engine(env: &'env ScriptEnvironment, raw: ffi::AVS_Value) -> Self {
        Self {
            raw,
            env,
            storage: Storage::Owned,
        }
    }

    /// Returns the raw value. It stays valid for as long as `self` is alive.
    #[inline]
    pub fn as_raw(&self) -> ffi::AVS_Value {
        self.raw
    }

    /// Returns the type of this value, `None` if it is void or has an unknown tag.
    #[inline]
    pub fn value_type(&self) -> Option<ValueType> {
        ValueType::from_tag(self.raw.type_)
    }

    #[inline]
    pub fn is_defined(&self) -> bool {
        self.raw.type_ != ffi::AVS_VALUE_VOID
    }

    /// Converts the value back, taking new references to any clips, and releases it.
    #[inline]
    pub fn into_value(self) -> Result<Value<'env>> {
        unsafe { decode(self.env, &self.raw) }
    }

    /// Hands the value over to the engine, which releases it.
    ///
    /// Host-built arrays can't be handed over since the engine would free their storage.
    pub(crate) fn into_engine(self) -> Result<ffi::AVS_Value> {
        if let Storage::Array { .. } = self.storage {
            return Err(Error::UnsupportedValueType(
                "arrays can't be handed over to the engine".to_owned(),
            ));
        }

        let raw = self.raw;
        // The ownership is transferred to the engine.
        mem::forget(self);
        Ok(raw)
    }
}

/// Decodes `raw`, taking a new reference to every clip in it.
///
/// # Safety
/// `raw` must be a valid value of `env`.
pub(crate) unsafe fn decode<'env>(
    env: &'env ScriptEnvironment,
    raw: &ffi::AVS_Value,
) -> Result<Value<'env>> {
    let value = match raw.type_ {
        ffi::AVS_VALUE_VOID => Value::Undefined,
        ffi::AVS_VALUE_BOOL => Value::Bool(raw.d.boolean != 0),
        ffi::AVS_VALUE_INT => Value::Int(raw.d.integer),
        #[cfg(not(windows))]
        ffi::AVS_VALUE_LONG => {
            let x = raw.d.longlong;
            Value::Int(i32::try_from(x).map_err(|_| {
                Error::UnsupportedValueType(format!("{} doesn't fit in a 32-bit int", x))
            })?)
        }
        ffi::AVS_VALUE_FLOAT => Value::Float(raw.d.floating_pt),
        ffi::AVS_VALUE_STRING => Value::String(bytes(raw.d.string)),
        ffi::AVS_VALUE_ERROR => Value::Error(bytes(raw.d.string)),
        ffi::AVS_VALUE_CLIP => {
            let _guard = env.lock();
            let handle = env.api().take_clip(*raw, env.as_ptr());
            let handle = NonNull::new(handle)
                .ok_or_else(|| Error::UnsupportedValueType("null clip".to_owned()))?;
            Value::Clip(Clip::from_ptr(env, handle))
        }
        ffi::AVS_VALUE_ARRAY => {
            let len = usize::try_from(raw.array_size).unwrap_or(0);
            let elements = if len == 0 || raw.d.array.is_null() {
                &[][..]
            } else {
                slice::from_raw_parts(raw.d.array, len)
            };
            Value::Array(
                elements
                    .iter()
                    .map(|element| decode(env, element))
                    .collect::<Result<_>>()?,
            )
        }
        tag => {
            return Err(Error::UnsupportedValueType(format!(
                "unknown value tag {:?}",
                tag as u8 as char
            )));
        }
    };

    Ok(value)
}

#[inline]
unsafe fn bytes(ptr: *const c_char) -> Vec<u8> {
    if ptr.is_null() {
        Vec::new()
    } else {
        CStr::from_ptr(ptr).to_bytes().to_vec()
    }
}
