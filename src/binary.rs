//! Locates the platform-specific renderer executable.
//!
//! Resolution order, first match wins: caller override, a system-installed
//! binary found via `which`/`where` (with a Debian/Ubuntu headless
//! workaround), then a vendored per-OS/arch binary. The resolved path is
//! cached for the process lifetime; tests reset it explicitly.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use crate::error::{PdfError, PdfResult};

/// Name of the external renderer executable.
pub const BINARY_NAME: &str = "wkhtmltopdf";

static BINARY: Mutex<Option<PathBuf>> = Mutex::new(None);

fn cache() -> std::sync::MutexGuard<'static, Option<PathBuf>> {
    BINARY.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Override the renderer binary for the whole process.
pub fn set_binary(path: impl Into<PathBuf>) {
    *cache() = Some(path.into());
}

/// Forget the cached/overridden binary path so the next resolution probes
/// again. Intended for tests.
pub fn reset_binary_cache() {
    *cache() = None;
}

/// Return the cached binary path, resolving it on first use.
pub fn resolve_binary() -> PdfResult<PathBuf> {
    let mut cached = cache();
    if let Some(path) = cached.as_ref() {
        return Ok(path.clone());
    }
    let path = BinaryLocator::new().resolve()?;
    *cached = Some(path.clone());
    Ok(path)
}

/// Test whether `command` can be found by the shell. Works on Windows,
/// Linux and Unix: an existing file path counts, otherwise `where`/`which`
/// is asked.
pub fn command_exists(command: &str) -> bool {
    let command = command.trim_matches('"');
    if Path::new(command).exists() {
        return true;
    }

    let probe = if cfg!(windows) { "where" } else { "which" };
    Command::new(probe)
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt as _;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.exists()
}

/// The kernel/OS version string used to recognize Debian/Ubuntu systems,
/// where the stock binary cannot run headless.
fn os_version_string() -> String {
    if cfg!(target_os = "linux") {
        std::fs::read_to_string("/proc/version").unwrap_or_default()
    } else {
        String::new()
    }
}

fn is_debian_family(os_version: &str) -> bool {
    let lowered = os_version.to_ascii_lowercase();
    lowered.contains("ubuntu") || lowered.contains("debian")
}

/// Uncached binary discovery.
///
/// The vendor directory holds the bundled fallback binaries; the wrapper
/// script runs the system binary under `xvfb-run` on Debian/Ubuntu.
#[derive(Clone, Debug)]
pub struct BinaryLocator {
    vendor_dir: PathBuf,
    wrapper_script: PathBuf,
}

impl Default for BinaryLocator {
    fn default() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            vendor_dir: exe_dir.join("vendor"),
            wrapper_script: exe_dir.join("wkhtmltopdf.sh"),
        }
    }
}

impl BinaryLocator {
    /// A locator with the default vendor directory and wrapper script
    /// (both next to the current executable).
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `dir` as the vendored-binaries root.
    pub fn with_vendor_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.vendor_dir = dir.into();
        self
    }

    /// Use `script` as the Debian/Ubuntu xvfb wrapper.
    pub fn with_wrapper_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.wrapper_script = script.into();
        self
    }

    /// Resolve the renderer binary, without touching the process-wide cache.
    pub fn resolve(&self) -> PdfResult<PathBuf> {
        if command_exists(BINARY_NAME) {
            if is_debian_family(&os_version_string()) {
                // The distro build of wkhtmltopdf is linked against X and
                // cannot run headless; route through xvfb-run instead.
                if !command_exists("xvfb-run") {
                    return Err(PdfError::MissingDependency(
                        "xvfb-run is required to use the system wkhtmltopdf on Debian/Ubuntu"
                            .to_string(),
                    ));
                }
                if !is_executable(&self.wrapper_script) {
                    return Err(PdfError::BinaryNotExecutable(self.wrapper_script.clone()));
                }
                return Ok(self.wrapper_script.clone());
            }
            return Ok(PathBuf::from(BINARY_NAME));
        }

        let vendored = self.vendored_candidate();
        if !vendored.exists() {
            return Err(PdfError::BinaryNotFound(vendored));
        }
        Ok(vendored)
    }

    /// The expected path of the bundled binary for this OS/architecture.
    fn vendored_candidate(&self) -> PathBuf {
        let is_64bit = std::env::consts::ARCH.contains("64");
        if cfg!(windows) {
            let bits = if is_64bit { "64bit" } else { "32bit" };
            self.vendor_dir
                .join("wkhtmltopdf-windows")
                .join("bin")
                .join(bits)
                .join("wkhtmltopdf.exe")
        } else {
            let suffix = if is_64bit { "amd64" } else { "i386" };
            self.vendor_dir
                .join(format!("wkhtmltopdf-{suffix}"))
                .join("bin")
                .join(format!("wkhtmltopdf{suffix}"))
        }
    }
}
