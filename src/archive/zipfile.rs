//! ZIP archive prober
//!
//! Reads the archive into memory once and builds a fresh `ZipArchive` over
//! that buffer for every probe, so workers share nothing mutable.
//!
//! A password is only accepted after every entry has been decrypted and
//! read to the end. ZipCrypto's header check passes for roughly 1 in 256
//! wrong passwords; reading the full entry forces the CRC (or the AES
//! authentication code) to be verified.

use crate::archive::ArchiveProber;
use crate::error::{ArchiveError, ProbeError, ProbeResult};
use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

type MemArchive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Probes a ZIP archive held in memory
#[derive(Debug)]
pub struct ZipProber {
    /// Path the archive was read from
    path: PathBuf,

    /// Raw archive bytes
    data: Arc<[u8]>,

    /// Number of entries in the central directory
    entries: usize,

    /// Number of encrypted entries
    encrypted_entries: usize,

    /// Where to extract on success (nothing is written if unset)
    extract_to: Option<PathBuf>,

    /// Set by the first successful probe that extracts
    extracted: AtomicBool,
}

impl ZipProber {
    /// Open and validate an archive
    ///
    /// Fails with `NotFound` if the path does not exist and with `Invalid`
    /// if the container cannot be read, independent of any password.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(ArchiveError::NotFound { path });
        }

        let invalid = |reason: String| ArchiveError::Invalid {
            path: path.clone(),
            reason,
        };

        let data: Arc<[u8]> = fs::read(&path).map_err(|e| invalid(e.to_string()))?.into();

        let (entries, encrypted_entries) =
            count_entries(&data).map_err(|e| invalid(e.to_string()))?;

        if entries == 0 {
            return Err(invalid("archive contains no entries".into()));
        }

        if encrypted_entries == 0 {
            warn!(
                path = %path.display(),
                "Archive has no encrypted entries; any password will be accepted"
            );
        }

        debug!(
            path = %path.display(),
            bytes = data.len(),
            entries,
            encrypted_entries,
            "Archive opened"
        );

        Ok(Self {
            path,
            data,
            entries,
            encrypted_entries,
            extract_to: None,
            extracted: AtomicBool::new(false),
        })
    }

    /// Extract the archive into `dir` when a password is found
    pub fn with_extract_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extract_to = Some(dir.into());
        self
    }

    /// Path the archive was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive size in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Total entries
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Encrypted entries
    pub fn encrypted_entries(&self) -> usize {
        self.encrypted_entries
    }

    fn archive(&self) -> Result<MemArchive<'_>, ProbeError> {
        ZipArchive::new(Cursor::new(&self.data[..])).map_err(|e| ProbeError::Other(e.to_string()))
    }

    /// Decrypt and fully read every entry
    fn verify(&self, password: &str) -> ProbeResult {
        let mut archive = self.archive()?;

        for index in 0..archive.len() {
            let mut entry = open_entry(&mut archive, index, password)?;
            if entry.is_dir() {
                continue;
            }

            let encrypted = entry.encrypted();
            io::copy(&mut entry, &mut io::sink()).map_err(|e| {
                if encrypted {
                    // Header check passed but the data did not decrypt cleanly
                    ProbeError::WrongPassword
                } else {
                    ProbeError::Other(e.to_string())
                }
            })?;
        }

        Ok(())
    }

    /// Write every entry below `dir`, returning the number of files written
    fn extract(&self, password: &str, dir: &Path) -> Result<usize, ProbeError> {
        let io_err = |e: io::Error| ProbeError::Other(e.to_string());
        let mut archive = self.archive()?;
        let mut written = 0;

        fs::create_dir_all(dir).map_err(io_err)?;

        for index in 0..archive.len() {
            let mut entry = open_entry(&mut archive, index, password)?;

            let Some(relative) = entry.enclosed_name() else {
                warn!(name = entry.name(), "Skipping entry that escapes the extraction directory");
                continue;
            };
            let target = dir.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&target).map_err(io_err)?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }

            let mut out = File::create(&target).map_err(io_err)?;
            io::copy(&mut entry, &mut out).map_err(io_err)?;
            written += 1;
        }

        Ok(written)
    }
}

impl ArchiveProber for ZipProber {
    fn probe(&self, password: &str) -> ProbeResult {
        self.verify(password)?;

        if let Some(dir) = &self.extract_to {
            if !self.extracted.swap(true, Ordering::SeqCst) {
                match self.extract(password, dir) {
                    Ok(files) => {
                        info!(dir = %dir.display(), files, "Archive extracted");
                    }
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "Extraction failed after password was verified");
                    }
                }
            }
        }

        Ok(())
    }
}

/// Count all entries and the encrypted ones
fn count_entries(data: &[u8]) -> Result<(usize, usize), ZipError> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let mut encrypted = 0;

    for index in 0..archive.len() {
        if archive.by_index_raw(index)?.encrypted() {
            encrypted += 1;
        }
    }

    Ok((archive.len(), encrypted))
}

/// Open entry `index`, decrypting it if needed
fn open_entry<'a, 'd>(
    archive: &'a mut MemArchive<'d>,
    index: usize,
    password: &str,
) -> Result<ZipFile<'a, Cursor<&'d [u8]>>, ProbeError> {
    let encrypted = archive
        .by_index_raw(index)
        .map_err(|e| ProbeError::Other(e.to_string()))?
        .encrypted();

    let entry = if encrypted {
        archive.by_index_decrypt(index, password.as_bytes())
    } else {
        archive.by_index(index)
    };

    entry.map_err(|e| match e {
        ZipError::InvalidPassword => ProbeError::WrongPassword,
        other => ProbeError::Other(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::{AesMode, ZipWriter};

    fn write_archive(path: &Path, password: &'static str) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        let options = || SimpleFileOptions::default().with_aes_encryption(AesMode::Aes256, password);

        writer.start_file("secret.txt", options()).unwrap();
        writer.write_all(b"the treasure is buried").unwrap();
        writer.start_file("nested/notes.txt", options()).unwrap();
        writer.write_all(b"second entry").unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_open_missing_archive() {
        let err = ZipProber::open("/definitely/not/here.zip").unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound { .. }));
    }

    #[test]
    fn test_open_garbage_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.zip");
        fs::write(&path, b"this is not a zip archive").unwrap();

        let err = ZipProber::open(&path).unwrap_err();
        assert!(matches!(err, ArchiveError::Invalid { .. }));
    }

    #[test]
    fn test_open_empty_archive_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.zip");
        ZipWriter::new(File::create(&path).unwrap()).finish().unwrap();

        let err = ZipProber::open(&path).unwrap_err();
        assert!(matches!(err, ArchiveError::Invalid { ref reason, .. } if reason.contains("no entries")));
    }

    #[test]
    fn test_probe_right_and_wrong_password() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locked.zip");
        write_archive(&path, "12ab");

        let prober = ZipProber::open(&path).unwrap();
        assert_eq!(prober.entries(), 2);
        assert_eq!(prober.encrypted_entries(), 2);

        assert!(prober.probe("12ab").is_ok());
        assert!(prober.probe("ab12").is_err());
        assert!(prober.probe("").is_err());
    }

    #[test]
    fn test_extracts_on_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locked.zip");
        let out = dir.path().join("out");
        write_archive(&path, "cab");

        let prober = ZipProber::open(&path).unwrap().with_extract_dir(&out);
        assert!(prober.probe("abc").is_err());
        assert!(!out.exists());

        prober.probe("cab").unwrap();
        assert_eq!(
            fs::read_to_string(out.join("secret.txt")).unwrap(),
            "the treasure is buried"
        );
        assert_eq!(
            fs::read_to_string(out.join("nested/notes.txt")).unwrap(),
            "second entry"
        );
    }
}
