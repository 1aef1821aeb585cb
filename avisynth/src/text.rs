//! Conversions between Rust strings and the engine's narrow strings.
//!
//! On Windows the engine reads and writes strings in the active ANSI code page, elsewhere in
//! UTF-8. Characters the code page can't represent are replaced by the system default
//! character.

use std::borrow::Cow;
use std::path::Path;

#[cfg(not(unix))]
use crate::error::Error;
use crate::error::Result;

/// Decodes a string produced by the engine.
#[inline]
pub(crate) fn decode(bytes: &[u8]) -> Cow<'_, str> {
    #[cfg(windows)]
    {
        if !bytes.is_ascii() {
            if let Some(text) = code_page::decode(bytes) {
                return Cow::Owned(text);
            }
        }
    }
    String::from_utf8_lossy(bytes)
}

/// Encodes a string for the engine.
#[inline]
pub(crate) fn encode(text: &str) -> Cow<'_, [u8]> {
    #[cfg(windows)]
    {
        if !text.is_ascii() {
            let wide = text.encode_utf16().collect::<Vec<_>>();
            if let Some(bytes) = code_page::encode(&wide) {
                return Cow::Owned(bytes);
            }
        }
    }
    Cow::Borrowed(text.as_bytes())
}

/// Encodes a path for the engine.
#[cfg(unix)]
pub(crate) fn encode_path(path: &Path) -> Result<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;
    Ok(path.as_os_str().as_bytes().to_vec())
}

/// Encodes a path for the engine.
#[cfg(windows)]
pub(crate) fn encode_path(path: &Path) -> Result<Vec<u8>> {
    use std::os::windows::ffi::OsStrExt;
    let wide = path.as_os_str().encode_wide().collect::<Vec<_>>();
    code_page::encode(&wide).ok_or(Error::PathInvalidUnicode)
}

/// Encodes a path for the engine.
#[cfg(not(any(unix, windows)))]
pub(crate) fn encode_path(path: &Path) -> Result<Vec<u8>> {
    path.to_str()
        .map(|path| path.as_bytes().to_vec())
        .ok_or(Error::PathInvalidUnicode)
}

#[cfg(windows)]
mod code_page {
    use std::os::raw::{c_char, c_int, c_uint};
    use std::ptr;

    const CP_ACP: c_uint = 0;

    #[link(name = "kernel32")]
    unsafe extern "system" {
        fn MultiByteToWideChar(
            code_page: c_uint,
            flags: u32,
            src: *const c_char,
            src_len: c_int,
            dst: *mut u16,
            dst_len: c_int,
        ) -> c_int;

        fn WideCharToMultiByte(
            code_page: c_uint,
            flags: u32,
            src: *const u16,
            src_len: c_int,
            dst: *mut c_char,
            dst_len: c_int,
            default_char: *const c_char,
            used_default_char: *mut c_int,
        ) -> c_int;
    }

    pub(super) fn decode(bytes: &[u8]) -> Option<String> {
        let len = c_int::try_from(bytes.len()).ok()?;
        let src = bytes.as_ptr().cast();

        let wide_len = unsafe { MultiByteToWideChar(CP_ACP, 0, src, len, ptr::null_mut(), 0) };
        if wide_len <= 0 {
            return None;
        }

        let mut wide = vec![0u16; wide_len as usize];
        let written =
            unsafe { MultiByteToWideChar(CP_ACP, 0, src, len, wide.as_mut_ptr(), wide_len) };
        if written <= 0 {
            return None;
        }
        wide.truncate(written as usize);
        Some(String::from_utf16_lossy(&wide))
    }

    pub(super) fn encode(wide: &[u16]) -> Option<Vec<u8>> {
        if wide.is_empty() {
            return Some(Vec::new());
        }

        let len = c_int::try_from(wide.len()).ok()?;
        let src = wide.as_ptr();

        let narrow_len = unsafe {
            WideCharToMultiByte(
                CP_ACP,
                0,
                src,
                len,
                ptr::null_mut(),
                0,
                ptr::null(),
                ptr::null_mut(),
            )
        };
        if narrow_len <= 0 {
            return None;
        }

        let mut narrow = vec![0u8; narrow_len as usize];
        let written = unsafe {
            WideCharToMultiByte(
                CP_ACP,
                0,
                src,
                len,
                narrow.as_mut_ptr().cast(),
                narrow_len,
                ptr::null(),
                ptr::null_mut(),
            )
        };
        if written <= 0 {
            return None;
        }
        narrow.truncate(written as usize);
        Some(narrow)
    }
}
