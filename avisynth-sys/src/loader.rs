use std::error::Error;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use libloading::Library;

use super::AvisynthFunctions;

/// A required entry point is missing from the library.
#[derive(Debug)]
pub struct SymbolError {
    pub name: &'static str,
    pub source: libloading::Error,
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "missing entry point {}: {}",
            self.name.trim_end_matches('\0'),
            self.source
        )
    }
}

impl Error for SymbolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// None of the candidate libraries could be opened.
#[derive(Debug)]
pub struct LoadError {
    pub tried: Vec<PathBuf>,
    pub source: Option<libloading::Error>,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "couldn't load the AviSynth library (tried")?;
        for (i, path) in self.tried.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, path.display())?;
        }
        write!(f, ")")?;
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn Error + 'static))
    }
}

/// Library file names tried, in order, on the current platform.
pub fn library_candidates() -> &'static [&'static str] {
    if cfg!(windows) {
        &["avisynth.dll"]
    } else if cfg!(target_os = "macos") {
        &["libavisynth.dylib", "libavxsynth.dylib"]
    } else {
        &["libavisynth.so", "libavxsynth.so"]
    }
}

#[cfg(all(unix, feature = "rtld-global"))]
unsafe fn open(path: &Path) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};

    let library = unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_GLOBAL)? };
    Ok(library.into())
}

#[cfg(not(all(unix, feature = "rtld-global")))]
unsafe fn open(path: &Path) -> Result<Library, libloading::Error> {
    unsafe { Library::new(path) }
}

/// Opens the AviSynth shared library.
///
/// When `name` is given only that file name is tried, otherwise every entry of
/// [`library_candidates`] is tried in order. When `dir` is given names are joined onto it,
/// otherwise the system search path is used.
///
/// # Safety
/// Opening a library runs its initialization routines.
pub unsafe fn open_library(
    dir: Option<&Path>,
    name: Option<&OsStr>,
) -> Result<(Library, PathBuf), LoadError> {
    let names: Vec<&OsStr> = match name {
        Some(name) => vec![name],
        None => library_candidates().iter().map(OsStr::new).collect(),
    };

    let mut tried = Vec::with_capacity(names.len());
    let mut last_error = None;
    for name in names {
        let path = match dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };
        match unsafe { open(&path) } {
            Ok(library) => return Ok((library, path)),
            Err(err) => {
                tried.push(path);
                last_error = Some(err);
            }
        }
    }

    Err(LoadError {
        tried,
        source: last_error,
    })
}

unsafe fn required<T: Copy>(library: &Library, name: &'static str) -> Result<T, SymbolError> {
    let symbol = unsafe { library.get::<T>(name.as_bytes()) }
        .map_err(|source| SymbolError { name, source })?;
    Ok(*symbol)
}

unsafe fn optional<T: Copy>(library: &Library, name: &'static str) -> Option<T> {
    unsafe { library.get::<T>(name.as_bytes()) }
        .ok()
        .map(|symbol| *symbol)
}

macro_rules! load_functions {
    ($library:expr; required { $($req:ident),* $(,)? } optional { $($opt:ident),* $(,)? }) => {
        AvisynthFunctions {
            $($req: unsafe { required($library, concat!(stringify!($req), "\0"))? },)*
            $($opt: unsafe { optional($library, concat!(stringify!($opt), "\0")) },)*
        }
    };
}

impl AvisynthFunctions {
    /// Resolves every entry point from `library`.
    ///
    /// Fails if a required entry point is missing; missing optional ones are left as `None`.
    ///
    /// # Safety
    /// `library` must be an AviSynth C interface library and must outlive every use of the
    /// returned pointers.
    pub unsafe fn load(library: &Library) -> Result<Self, SymbolError> {
        Ok(load_functions!(library;
            required {
                avs_create_script_environment,
                avs_delete_script_environment,
                avs_check_version,
                avs_get_cpu_flags,
                avs_function_exists,
                avs_invoke,
                avs_get_var,
                avs_set_var,
                avs_set_global_var,
                avs_new_video_frame_a,
                avs_make_writable,
                avs_set_memory_max,
                avs_set_working_dir,
                avs_take_clip,
                avs_set_to_clip,
                avs_copy_clip,
                avs_release_clip,
                avs_clip_get_error,
                avs_get_video_info,
                avs_get_version,
                avs_get_frame,
                avs_get_parity,
                avs_get_audio,
                avs_set_cache_hints,
                avs_copy_video_frame,
                avs_release_video_frame,
                avs_release_value,
            }
            optional {
                avs_get_error,
                avs_bit_blt,
                avs_get_pitch_p,
                avs_get_row_size_p,
                avs_get_height_p,
                avs_get_read_ptr_p,
                avs_get_write_ptr_p,
                avs_is_writable,
                avs_save_string,
                avs_add_function,
                avs_at_exit,
                avs_subframe,
                avs_subframe_planar,
                avs_new_c_filter,
            }
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_lists_every_candidate() {
        let dir = Path::new("/nonexistent-avisynth-dir");
        let err = unsafe { open_library(Some(dir), None) }.unwrap_err();
        assert_eq!(err.tried.len(), library_candidates().len());
        assert!(err.tried.iter().all(|p| p.starts_with(dir)));
        assert!(err.source.is_some());
        assert!(err.to_string().starts_with("couldn't load the AviSynth library"));
    }

    #[test]
    fn explicit_name_is_the_only_candidate() {
        let err = unsafe { open_library(None, Some(OsStr::new("libnot-avisynth-at-all.so"))) }
            .unwrap_err();
        assert_eq!(err.tried, vec![PathBuf::from("libnot-avisynth-at-all.so")]);
    }
}
