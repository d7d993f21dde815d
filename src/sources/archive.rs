//! Archive repositories: download, verify and extract.

use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use url::Url;

use crate::sources::FetchError;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};
use crate::util::hash::{digest_matches, sha256_bytes};

/// Supported archive encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Detect the format from the file name at the end of a URL.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string());
        let file_name = path.rsplit('/').next().unwrap_or_default().to_lowercase();

        if file_name.ends_with(".tar.gz") || file_name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if file_name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }

    /// Extract `data` into `dest`.
    pub fn extract(&self, data: &[u8], dest: &Path, strip_prefix: Option<&str>) -> Result<()> {
        match self {
            ArchiveFormat::TarGz => extract_tarball(data, dest, strip_prefix),
            ArchiveFormat::Zip => extract_zip(data, dest, strip_prefix),
        }
    }
}

/// Download, verify and extract one candidate URL into `dest`.
///
/// A failure after extraction started leaves no partial directory behind.
pub fn fetch_archive(
    url: &str,
    dest: &Path,
    strip_prefix: Option<&str>,
    sha256: Option<&str>,
    offline: bool,
) -> Result<(), FetchError> {
    let format = ArchiveFormat::from_url(url).ok_or_else(|| FetchError::ArchiveFormat {
        url: url.to_string(),
    })?;

    let data = download(url, offline)?;

    if let Some(expected) = sha256 {
        let actual = sha256_bytes(&data);
        if !digest_matches(&actual, expected) {
            return Err(FetchError::Checksum {
                url: url.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        tracing::debug!("Archive hash verified: {}", &actual[..16]);
    }

    format.extract(&data, dest, strip_prefix).map_err(|e| {
        if let Err(cleanup) = remove_dir_all_if_exists(dest) {
            tracing::warn!("{:#}", cleanup);
        }
        FetchError::Extraction {
            url: url.to_string(),
            message: format!("{:#}", e),
        }
    })?;

    tracing::info!(
        "Extracted {} to {} (strip_prefix: {:?})",
        url,
        dest.display(),
        strip_prefix
    );

    Ok(())
}

/// Read the bytes behind a URL. `file://` is read from disk, `http(s)`
/// goes over the network unless `offline`.
pub fn download(url: &str, offline: bool) -> Result<Vec<u8>, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::Network {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    match parsed.scheme() {
        "file" => {
            let path = parsed.to_file_path().map_err(|_| FetchError::Network {
                url: url.to_string(),
                message: "not a local file path".to_string(),
            })?;
            std::fs::read(&path).map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: format!("{}: {}", path.display(), e),
            })
        }
        "http" | "https" => {
            if offline {
                return Err(FetchError::Offline {
                    url: url.to_string(),
                });
            }

            tracing::info!("Downloading {}", url);
            let response = reqwest::blocking::get(url).map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

            if !response.status().is_success() {
                return Err(FetchError::HttpStatus {
                    url: url.to_string(),
                    status: response.status().as_u16(),
                });
            }

            response
                .bytes()
                .map(|b| b.to_vec())
                .map_err(|e| FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                })
        }
        other => Err(FetchError::Network {
            url: url.to_string(),
            message: format!("unsupported URL scheme `{}`", other),
        }),
    }
}

/// Apply `strip_prefix` to an archive entry path.
///
/// Returns `None` for entries that disappear (the prefix directory
/// itself). Entries outside the prefix are kept as they are.
fn strip_entry(path: &str, strip_prefix: Option<&str>) -> Option<String> {
    let normalized = path.replace('\\', "/");
    let stripped = match strip_prefix.map(|p| p.trim_end_matches('/')) {
        Some(prefix) if !prefix.is_empty() => {
            if normalized.trim_end_matches('/') == prefix {
                return None;
            }
            match normalized.strip_prefix(&format!("{}/", prefix)) {
                Some(rest) => rest.to_string(),
                None => normalized,
            }
        }
        _ => normalized,
    };

    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}

/// Join an archive entry onto `dest`, refusing anything that would land
/// outside it.
fn entry_destination(dest: &Path, entry: &str) -> Result<PathBuf> {
    let relative = Path::new(entry);
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => bail!("archive entry escapes destination directory: {}", entry),
        }
    }
    Ok(dest.join(relative))
}

/// Check that a link stored at `entry` with target `target` stays inside
/// the extraction root. Symlink targets are relative to the link's own
/// directory.
fn link_stays_inside(entry: &str, target: &Path) -> bool {
    let mut depth = Path::new(entry).components().count().saturating_sub(1);
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Create the parent directory of `output_path`, refusing to do so when
/// the nearest existing ancestor resolves outside `dest` (for example
/// through a symlink extracted earlier).
fn prepare_parent(dest: &Path, output_path: &Path) -> Result<()> {
    let canonical_dest = dest
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", dest.display()))?;

    let Some(parent) = output_path.parent() else {
        return Ok(());
    };
    let existing = parent.ancestors().find(|a| a.exists()).unwrap_or(dest);
    let resolved = existing
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", existing.display()))?;
    if !resolved.starts_with(&canonical_dest) {
        bail!(
            "archive entry escapes destination directory: {}",
            output_path.display()
        );
    }

    ensure_dir(parent)
}

/// Extract a gzip-compressed tarball, stripping `strip_prefix` from every
/// entry path.
pub fn extract_tarball(data: &[u8], dest: &Path, strip_prefix: Option<&str>) -> Result<()> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));
    ensure_dir(dest)?;

    for entry in archive.entries().context("failed to read tarball entries")? {
        let mut entry = entry.context("failed to read tarball entry")?;
        let entry_path = entry.path().context("failed to get entry path")?;
        let entry_path_str = entry_path.to_string_lossy().into_owned();

        let Some(stripped) = strip_entry(&entry_path_str, strip_prefix) else {
            continue;
        };
        let output_path = entry_destination(dest, &stripped)?;
        prepare_parent(dest, &output_path)?;

        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory => ensure_dir(&output_path)?,
            tar::EntryType::Regular | tar::EntryType::Continuous => {
                entry.unpack(&output_path).with_context(|| {
                    format!("failed to extract file: {}", output_path.display())
                })?;
            }
            tar::EntryType::Link => {
                // Hard link targets name another entry of the same archive.
                let target = entry
                    .link_name()
                    .context("failed to read link target")?
                    .map(|t| t.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let source = strip_entry(&target, strip_prefix)
                    .map(|t| entry_destination(dest, &t))
                    .transpose()?
                    .ok_or_else(|| anyhow::anyhow!("hard link without a target: {}", stripped))?;
                prepare_parent(dest, &source)?;
                std::fs::hard_link(&source, &output_path).with_context(|| {
                    format!("failed to create hard link: {}", output_path.display())
                })?;
            }
            #[cfg(unix)]
            tar::EntryType::Symlink => {
                if let Ok(Some(target)) = entry.link_name() {
                    if !link_stays_inside(&stripped, &target) {
                        bail!(
                            "archive symlink escapes destination directory: {} -> {}",
                            stripped,
                            target.display()
                        );
                    }
                    std::os::unix::fs::symlink(target.as_ref(), &output_path).with_context(
                        || format!("failed to create symlink: {}", output_path.display()),
                    )?;
                }
            }
            _ => {
                tracing::debug!(
                    "Skipping unsupported entry type {:?}: {}",
                    entry_type,
                    entry_path_str
                );
            }
        }
    }

    Ok(())
}

/// Extract a zip archive, stripping `strip_prefix` from every entry path.
pub fn extract_zip(data: &[u8], dest: &Path, strip_prefix: Option<&str>) -> Result<()> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).context("failed to read zip archive")?;
    ensure_dir(dest)?;

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .with_context(|| format!("failed to read zip entry {}", index))?;
        let name = file.name().to_string();

        let Some(stripped) = strip_entry(&name, strip_prefix) else {
            continue;
        };
        let output_path = entry_destination(dest, &stripped)?;

        prepare_parent(dest, &output_path)?;

        if file.is_dir() {
            ensure_dir(&output_path)?;
            continue;
        }

        let mut contents = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut contents)
            .with_context(|| format!("failed to read zip entry: {}", name))?;
        std::fs::write(&output_path, contents)
            .with_context(|| format!("failed to extract file: {}", output_path.display()))?;
    }

    Ok(())
}
