//! Software replacements for the optional entry points.
//!
//! Old engines lack the `*_p` frame accessors, so these read the documented `AVS_VideoFrame`
//! layout directly. Each function has the signature of the entry point it replaces.

use std::os::raw::{c_char, c_int};
use std::ptr;

use avisynth_sys as ffi;

pub(crate) unsafe extern "system" fn get_error(
    _env: *mut ffi::AVS_ScriptEnvironment,
) -> *const c_char {
    ptr::null()
}

pub(crate) unsafe extern "system" fn bit_blt(
    _env: *mut ffi::AVS_ScriptEnvironment,
    dstp: *mut u8,
    dst_pitch: c_int,
    srcp: *const u8,
    src_pitch: c_int,
    row_size: c_int,
    height: c_int,
) {
    if row_size <= 0 || height <= 0 {
        return;
    }

    if dst_pitch == src_pitch && src_pitch == row_size {
        ptr::copy_nonoverlapping(srcp, dstp, row_size as usize * height as usize);
        return;
    }

    for y in 0..height as isize {
        ptr::copy_nonoverlapping(
            srcp.offset(y * src_pitch as isize),
            dstp.offset(y * dst_pitch as isize),
            row_size as usize,
        );
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Slot {
    Main,
    Second,
    Third,
    Alpha,
}

#[inline]
fn slot(plane: c_int) -> Slot {
    match plane & !ffi::AVS_PLANAR_ALIGNED {
        ffi::AVS_PLANAR_U | ffi::AVS_PLANAR_B => Slot::Second,
        ffi::AVS_PLANAR_V | ffi::AVS_PLANAR_R => Slot::Third,
        ffi::AVS_PLANAR_A => Slot::Alpha,
        _ => Slot::Main,
    }
}

#[inline]
fn offset(frame: &ffi::AVS_VideoFrame, plane: c_int) -> isize {
    (match slot(plane) {
        Slot::Main => frame.offset,
        Slot::Second => frame.offsetU,
        Slot::Third => frame.offsetV,
        Slot::Alpha => frame.offsetA,
    }) as isize
}

pub(crate) unsafe extern "system" fn get_pitch_p(
    p: *const ffi::AVS_VideoFrame,
    plane: c_int,
) -> c_int {
    let frame = &*p;
    match slot(plane) {
        Slot::Main => frame.pitch,
        Slot::Second | Slot::Third => frame.pitchUV,
        Slot::Alpha => frame.pitchA,
    }
}

pub(crate) unsafe extern "system" fn get_row_size_p(
    p: *const ffi::AVS_VideoFrame,
    plane: c_int,
) -> c_int {
    let frame = &*p;
    let (row_size, pitch) = match slot(plane) {
        Slot::Main => (frame.row_size, frame.pitch),
        Slot::Second | Slot::Third if frame.pitchUV == 0 => return 0,
        Slot::Second | Slot::Third => (frame.row_sizeUV, frame.pitchUV),
        Slot::Alpha if frame.pitchA == 0 => return 0,
        Slot::Alpha => (frame.row_sizeA, frame.pitchA),
    };

    // Aligned requests round up to the frame alignment when the padding allows it.
    if plane & ffi::AVS_PLANAR_ALIGNED != 0 {
        let aligned = (row_size + ffi::AVS_FRAME_ALIGN - 1) & !(ffi::AVS_FRAME_ALIGN - 1);
        if aligned <= pitch {
            return aligned;
        }
    }
    row_size
}

pub(crate) unsafe extern "system" fn get_height_p(
    p: *const ffi::AVS_VideoFrame,
    plane: c_int,
) -> c_int {
    let frame = &*p;
    match slot(plane) {
        Slot::Main => frame.height,
        Slot::Second | Slot::Third if frame.pitchUV == 0 => 0,
        Slot::Second | Slot::Third => frame.heightUV,
        Slot::Alpha if frame.pitchA == 0 => 0,
        Slot::Alpha => frame.height,
    }
}

pub(crate) unsafe extern "system" fn get_read_ptr_p(
    p: *const ffi::AVS_VideoFrame,
    plane: c_int,
) -> *const u8 {
    let frame = &*p;
    if frame.vfb.is_null() {
        return ptr::null();
    }
    (*frame.vfb).data.offset(offset(frame, plane))
}

pub(crate) unsafe extern "system" fn is_writable(p: *const ffi::AVS_VideoFrame) -> c_int {
    let frame = &*p;
    (frame.refcount == 1 && !frame.vfb.is_null() && (*frame.vfb).refcount == 1) as c_int
}

pub(crate) unsafe extern "system" fn get_write_ptr_p(
    p: *mut ffi::AVS_VideoFrame,
    plane: c_int,
) -> *mut u8 {
    if is_writable(p) == 0 {
        return ptr::null_mut();
    }

    let frame = &*p;
    let vfb = &mut *frame.vfb;
    // Writing the main plane invalidates cached copies of the buffer.
    if slot(plane) == Slot::Main {
        vfb.sequence_number = vfb.sequence_number.wrapping_add(1);
    }
    vfb.data.offset(offset(frame, plane))
}
