//! Shared-library backed module opener.

use libloading::Library;

use crate::modules::loader::ModuleOpener;

/// Opens modules with the platform dynamic loader and keeps them resident
/// for as long as the opener lives.
#[derive(Debug, Default)]
pub struct DynamicLibraryOpener {
    libraries: Vec<(String, Library)>,
}

impl DynamicLibraryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the modules opened so far, in load order.
    pub fn loaded(&self) -> impl Iterator<Item = &str> {
        self.libraries.iter().map(|(name, _)| name.as_str())
    }
}

impl ModuleOpener for DynamicLibraryOpener {
    fn open(&mut self, module: &str) -> Result<(), String> {
        let library = open_global(module).map_err(|e| e.to_string())?;
        self.libraries.push((module.to_string(), library));
        Ok(())
    }
}

/// Symbols become visible to modules opened later.
#[cfg(unix)]
fn open_global(path: &str) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};

    // SAFETY: module initialisers are generated code trusted by the process.
    let library = unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_GLOBAL)? };
    Ok(Library::from(library))
}

#[cfg(not(unix))]
fn open_global(path: &str) -> Result<Library, libloading::Error> {
    // SAFETY: module initialisers are generated code trusted by the process.
    unsafe { Library::new(path) }
}
