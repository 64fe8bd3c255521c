/// Oracle Instant Client detection and initialization
///
/// This module handles Oracle client library detection, validation, and loading.
/// The `oracle` crate loads the client through ODPI-C on first connect; priming
/// it here with RTLD_GLOBAL lets a client installed outside the system search
/// path be found.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

/// Static reference to the Oracle client library (loaded via libloading)
static ORACLE_CLIENT: OnceLock<Mutex<Option<libloading::Library>>> = OnceLock::new();

/// Outcome of the first initialization attempt in this process
static CLIENT_INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Default Oracle Instant Client installation path (user-space, no sudo)
const DEFAULT_ORACLE_PATH: &str = "~/oracle/instantclient";

/// System-wide location used by the Instant Client zip/rpm instructions
const SYSTEM_ORACLE_PATH: &str = "/opt/oracle/instantclient";

/// Oracle client library filename
#[cfg(target_os = "macos")]
pub const ORACLE_LIB_NAME: &str = "libclntsh.dylib";

#[cfg(target_os = "windows")]
pub const ORACLE_LIB_NAME: &str = "oci.dll";

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const ORACLE_LIB_NAME: &str = "libclntsh.so";

/// Environment variable the platform loader consults for shared libraries
#[cfg(target_os = "macos")]
const LIBRARY_PATH_VAR: &str = "DYLD_LIBRARY_PATH";

#[cfg(target_os = "windows")]
const LIBRARY_PATH_VAR: &str = "PATH";

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

fn expand_home(p: &str) -> PathBuf {
    if let Some(rest) = p.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(p)
}

/// Resolves the Oracle client directory path
///
/// # Arguments
/// * `custom_path` - Optional custom directory path. If None, the known
///   install locations are searched.
///
/// # Returns
/// Resolved PathBuf with tilde expansion applied
pub fn resolve_client_path(custom_path: Option<&str>) -> PathBuf {
    // If a custom path is provided, expand and return it directly
    if let Some(path_str) = custom_path {
        return expand_home(path_str);
    }

    // 1) Next to the binary: <prefix>/bin/oracle-node -> <prefix>/lib/instantclient
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(prefix) = exe_path.parent().and_then(|bin| bin.parent()) {
            let bundled = prefix.join("lib").join("instantclient");
            if bundled.join(ORACLE_LIB_NAME).exists() {
                return bundled;
            }
        }
    }

    // 2) User-space default
    let user_dir = expand_home(DEFAULT_ORACLE_PATH);
    if user_dir.join(ORACLE_LIB_NAME).exists() {
        return user_dir;
    }

    // 3) System-wide install
    let system_dir = PathBuf::from(SYSTEM_ORACLE_PATH);
    if system_dir.join(ORACLE_LIB_NAME).exists() {
        return system_dir;
    }

    // 4) Fallback: ~/lib (used by installs that symlinked libraries)
    if let Some(home) = dirs::home_dir() {
        let lib_dir = home.join("lib");
        if lib_dir.join(ORACLE_LIB_NAME).exists() {
            return lib_dir;
        }
    }

    // If nothing is found, return the user default (so diagnostics show the expected location)
    user_dir
}

/// Checks if Oracle Instant Client is ready to use
///
/// Verifies that the Oracle client library exists at the expected location
/// without loading it.
///
/// # Returns
/// `true` if the client library file exists, `false` otherwise
pub fn check_client_ready(custom_path: Option<&str>) -> bool {
    let client_dir = resolve_client_path(custom_path);
    let lib_path = client_dir.join(ORACLE_LIB_NAME);

    if !lib_path.exists() {
        log::debug!("Oracle client library not found at: {:?}", lib_path);
        return false;
    }

    if !lib_path.is_file() {
        log::warn!("Oracle client library path exists but is not a file: {:?}", lib_path);
        return false;
    }

    // A dangling symlink reports exists() == false above, so a symlink here resolves
    if lib_path.is_symlink() {
        match std::fs::read_link(&lib_path) {
            Ok(target) => log::info!("Oracle client library found (symlink): {:?} -> {:?}", lib_path, target),
            Err(e) => {
                log::warn!("Failed to read symlink target: {:?} - {}", lib_path, e);
                return false;
            }
        }
    } else {
        log::info!("Oracle client library found: {:?}", lib_path);
    }

    // Instant Client libraries are tens of megabytes; anything under 1MB is a stub
    match std::fs::metadata(&lib_path) {
        Ok(metadata) => {
            let size = metadata.len();
            if size < 1_048_576 {
                log::warn!("Oracle client library file is suspiciously small ({} bytes): {:?}",
                          size, lib_path);
                return false;
            }
            log::debug!("Oracle client library size: {} bytes", size);
        }
        Err(e) => {
            log::warn!("Failed to get file metadata: {:?} - {}", lib_path, e);
            return false;
        }
    }

    true
}

/// Primes (loads) the Oracle client library into memory
///
/// Loads the library and keeps it in the static ORACLE_CLIENT slot for the
/// lifetime of the process. Also points the platform loader variable at the
/// client directory so ODPI-C resolves dependent libraries from there.
///
/// # Returns
/// `Ok(())` if successful, or an error message describing what went wrong
pub fn prime_client(custom_path: Option<&str>) -> Result<(), String> {
    let client_dir = resolve_client_path(custom_path);
    let lib_path = client_dir.join(ORACLE_LIB_NAME);

    if !lib_path.exists() {
        return Err(format!(
            "Oracle client library not found at: {}. Please install Oracle Instant Client.",
            lib_path.display()
        ));
    }

    // Set the library path BEFORE loading the library
    std::env::set_var(LIBRARY_PATH_VAR, client_dir.to_string_lossy().to_string());
    log::info!("Set {} to: {:?}", LIBRARY_PATH_VAR, client_dir);

    // RTLD_GLOBAL makes the symbols visible to ODPI-C's own dlopen
    #[cfg(unix)]
    let library = unsafe {
        use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};
        let unix_lib = UnixLibrary::open(Some(&lib_path), RTLD_NOW | RTLD_GLOBAL)
            .map_err(|e| format!("Failed to load Oracle client library: {}", e))?;
        libloading::Library::from(unix_lib)
    };

    #[cfg(not(unix))]
    let library = unsafe {
        libloading::Library::new(&lib_path)
            .map_err(|e| format!("Failed to load Oracle client library: {}", e))?
    };

    let mutex = ORACLE_CLIENT.get_or_init(|| Mutex::new(None));
    let mut guard = mutex.lock().map_err(|e| {
        format!("Failed to acquire lock on Oracle client: {}", e)
    })?;

    *guard = Some(library);

    log::info!("Oracle client library loaded from: {:?}", lib_path);
    Ok(())
}

/// Checks if the Oracle client has been primed (loaded)
pub fn is_client_primed() -> bool {
    if let Some(mutex) = ORACLE_CLIENT.get() {
        if let Ok(guard) = mutex.lock() {
            return guard.is_some();
        }
    }
    false
}

/// Best-effort, once-per-process client initialization
///
/// Safe to call before every connection: only the first call does any work
/// and later calls return immediately. A failure is logged and otherwise
/// ignored, since the driver can still find a client on the system search
/// path. Returns whether the client ended up primed.
pub fn init_client(custom_path: Option<&str>) -> bool {
    let result = CLIENT_INIT.get_or_init(|| {
        log::info!("Initializing Oracle client...");
        prime_client(custom_path)
    });
    if let Err(e) = result {
        log::debug!("Oracle client priming skipped: {}", e);
    }
    is_client_primed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_client_path_custom() {
        let custom = "/opt/custom/instantclient";
        let path = resolve_client_path(Some(custom));
        assert_eq!(path.to_string_lossy(), custom);
    }

    #[test]
    fn test_resolve_client_path_expands_home() {
        if let Some(home) = dirs::home_dir() {
            let path = resolve_client_path(Some("~/ic"));
            assert_eq!(path, home.join("ic"));
        }
    }

    #[test]
    fn test_check_client_ready_missing_dir() {
        assert!(!check_client_ready(Some("/nonexistent/oracle/instantclient")));
    }
}
