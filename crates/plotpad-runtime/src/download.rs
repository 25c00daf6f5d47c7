//! Download manager for the CPython-WASI runtime and extension packages.
//!
//! Archives are fetched from the pinned release on first use, verified
//! against pinned SHA-256 checksums, and extracted into the user cache
//! directory. Subsequent sessions reuse the cache without touching the
//! network.

use crate::bootstrap::RuntimeConfig;
use crate::error::BootstrapError;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// CPython WASI build version the engine is pinned to.
pub(crate) const RUNTIME_VERSION: &str = "3.13.2";

/// Base URL the runtime archive and extension packages are fetched from.
pub(crate) const BASE_URL: &str =
    "https://github.com/plotpad/python-wasi-dist/releases/download";

/// Expected SHA256 checksum of the runtime archive.
const RUNTIME_SHA256: &str = "ec14d81352b544017edf60d24ce6f0972da9b8b654d5ba09178ad8125ff366f4";

/// A pinned extension package archive.
struct PackageSpec {
    name: &'static str,
    version: &'static str,
    sha256: &'static str,
}

/// Extension packages the execution harness requires, installed in order.
const EXTENSION_PACKAGES: &[PackageSpec] = &[
    PackageSpec {
        name: "numpy",
        version: "2.2.1",
        sha256: "102be61a4e4a9c4afcbfbcfbb6a62933f73f9923029b283a5852de6bc8748b1c",
    },
    PackageSpec {
        name: "matplotlib",
        version: "3.10.0",
        sha256: "a28ee175bb10fa69727267e033ec1ed7b3d3a3db07394aec670056e90a313440",
    },
];

/// Cache directory holding the extracted runtime and packages.
fn cache_root(config: &RuntimeConfig) -> Result<PathBuf, BootstrapError> {
    if let Some(dir) = &config.cache_dir {
        return Ok(dir.clone());
    }
    let base = dirs::cache_dir().ok_or_else(|| {
        BootstrapError::Download("could not determine cache directory".to_string())
    })?;
    Ok(base.join("plotpad").join("python-wasi"))
}

/// Path to the python.wasm file.
pub(crate) fn runtime_wasm_path(config: &RuntimeConfig) -> Result<PathBuf, BootstrapError> {
    Ok(cache_root(config)?.join("python.wasm"))
}

/// Path to the Python standard library.
pub(crate) fn stdlib_path(config: &RuntimeConfig) -> Result<PathBuf, BootstrapError> {
    Ok(cache_root(config)?.join("lib"))
}

/// Path to the extension package install directory.
pub(crate) fn site_packages_path(config: &RuntimeConfig) -> Result<PathBuf, BootstrapError> {
    Ok(cache_root(config)?.join("site-packages"))
}

fn runtime_url(config: &RuntimeConfig) -> String {
    format!(
        "{}/v{}/python-{}-wasi.zip",
        config.base_url, config.version, config.version
    )
}

fn package_url(config: &RuntimeConfig, package: &PackageSpec) -> String {
    format!(
        "{}/v{}/{}-{}-wasi.zip",
        config.base_url, config.version, package.name, package.version
    )
}

/// Ensure the Python runtime archive is downloaded and extracted.
///
/// Returns the path to the python.wasm file.
pub(crate) fn ensure_runtime(config: &RuntimeConfig) -> Result<PathBuf, BootstrapError> {
    let wasm_path = runtime_wasm_path(config)?;

    if wasm_path.exists() {
        tracing::debug!(path = %wasm_path.display(), "Python runtime already cached");
        return Ok(wasm_path);
    }

    tracing::info!(version = %config.version, "downloading Python runtime");
    fetch_archive(
        &runtime_url(config),
        &cache_root(config)?,
        RUNTIME_SHA256,
        "runtime",
    )?;

    if !wasm_path.exists() {
        return Err(BootstrapError::Download(
            "python.wasm not found after extraction".to_string(),
        ));
    }

    Ok(wasm_path)
}

/// Ensure every extension package is downloaded and extracted.
///
/// Returns the site-packages directory mapped into each run's `PYTHONPATH`.
pub(crate) fn ensure_packages(config: &RuntimeConfig) -> Result<PathBuf, BootstrapError> {
    let site_packages = site_packages_path(config)?;
    fs::create_dir_all(&site_packages)?;

    for package in EXTENSION_PACKAGES {
        if site_packages.join(package.name).exists() {
            tracing::debug!(name = package.name, "extension package already cached");
            continue;
        }

        tracing::info!(
            name = package.name,
            version = package.version,
            "installing extension package"
        );
        fetch_archive(
            &package_url(config, package),
            &site_packages,
            package.sha256,
            package.name,
        )
        .map_err(|err| match err {
            err @ BootstrapError::ChecksumMismatch { .. } => err,
            other => BootstrapError::Package {
                name: package.name.to_string(),
                reason: other.to_string(),
            },
        })?;

        if !site_packages.join(package.name).exists() {
            return Err(BootstrapError::Package {
                name: package.name.to_string(),
                reason: "package directory not found after extraction".to_string(),
            });
        }
    }

    Ok(site_packages)
}

/// Download a zip archive, verify its checksum, and extract it into `dest`.
fn fetch_archive(
    url: &str,
    dest: &Path,
    expected_sha256: &str,
    label: &str,
) -> Result<(), BootstrapError> {
    fs::create_dir_all(dest)?;

    // Stream to a temp file to avoid holding the archive in memory
    let archive_path = dest.join(format!("{label}.zip.tmp"));
    let mut response = ureq::get(url)
        .call()
        .map_err(|e| BootstrapError::Download(format!("HTTP request failed: {e}")))?;

    {
        let mut archive_file = File::create(&archive_path)
            .map_err(|e| BootstrapError::Download(format!("failed to create temp file: {e}")))?;
        let mut reader = response.body_mut().as_reader();
        io::copy(&mut reader, &mut archive_file)
            .map_err(|e| BootstrapError::Download(format!("failed to download: {e}")))?;
    }

    let actual = file_sha256(&archive_path)?;
    if actual != expected_sha256 {
        let _ = fs::remove_file(&archive_path);
        return Err(BootstrapError::ChecksumMismatch {
            name: label.to_string(),
            expected: expected_sha256.to_string(),
            actual,
        });
    }
    tracing::debug!(label, "checksum verified");

    extract_zip(&archive_path, dest)?;
    let _ = fs::remove_file(&archive_path);

    Ok(())
}

/// SHA-256 of a file's contents, as a lowercase hex string.
fn file_sha256(path: &Path) -> Result<String, BootstrapError> {
    let file = File::open(path)
        .map_err(|e| BootstrapError::Download(format!("failed to open temp file: {e}")))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| BootstrapError::Download(format!("failed to read temp file: {e}")))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Extract a zip archive into `dest`, skipping entries that escape it.
fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), BootstrapError> {
    let archive_file = File::open(archive_path)
        .map_err(|e| BootstrapError::Download(format!("failed to open zip: {e}")))?;
    let mut archive = zip::ZipArchive::new(archive_file)
        .map_err(|e| BootstrapError::Download(format!("failed to open zip: {e}")))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| BootstrapError::Download(format!("failed to read zip entry: {e}")))?;

        let outpath = match file.enclosed_name() {
            Some(path) => dest.join(path),
            None => continue,
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)?;
            io::copy(&mut file, &mut outfile)?;
        }
    }

    tracing::debug!(dest = %dest.display(), "archive extracted");
    Ok(())
}

/// Encode bytes as hex string.
mod hex {
    use std::fmt::Write;

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().fold(String::new(), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
    }
}
