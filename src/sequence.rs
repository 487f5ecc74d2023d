//! Durable invoice number counter.
//!
//! The counter file holds the number of invoices issued so far. Allocation
//! reads it, writes back the incremented value and returns that value, all
//! under an exclusive lock on the file.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct InvoiceSequence {
    path: PathBuf,
}

impl InvoiceSequence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the counter holding `0` if it does not exist yet. An existing
    /// counter is never touched.
    ///
    /// The `0` is written to a sibling temp file first and linked into place,
    /// so the counter never appears empty to a concurrent reader.
    pub fn ensure_initialized(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

        let mut staged = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
        staged
            .write_all(b"0")
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| Error::io(staged.path(), e))?;

        match staged.persist_noclobber(&self.path) {
            Ok(_) => {
                info!(path = %self.path.display(), "initialized invoice counter");
                Ok(())
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(Error::io(&self.path, e.error)),
        }
    }

    /// The number of invoices issued so far.
    pub fn current(&self) -> Result<u64> {
        let mut file = File::open(&self.path).map_err(|e| Error::io(&self.path, e))?;
        file.lock_shared().map_err(|e| Error::io(&self.path, e))?;
        self.read_value(&mut file)
    }

    /// Reserves the next invoice number and persists it before returning.
    pub fn allocate_next(&self) -> Result<u64> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        // Released when `file` is dropped.
        file.lock().map_err(|e| Error::io(&self.path, e))?;

        let current = self.read_value(&mut file)?;
        let next = current.checked_add(1).ok_or_else(|| Error::CorruptCounter {
            path: self.path.clone(),
            content: current.to_string(),
        })?;

        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.set_len(0))
            .and_then(|_| file.write_all(next.to_string().as_bytes()))
            .and_then(|_| file.sync_all())
            .map_err(|e| Error::io(&self.path, e))?;

        info!(number = next, "allocated invoice number");
        Ok(next)
    }

    fn read_value(&self, file: &mut File) -> Result<u64> {
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::io(&self.path, e))?;
        content
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::CorruptCounter {
                path: self.path.clone(),
                content: content.trim().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as Kind;
    use proptest::prelude::*;
    use std::fs;

    fn sequence_in(dir: &tempfile::TempDir) -> InvoiceSequence {
        InvoiceSequence::new(dir.path().join("invoice_number.txt"))
    }

    #[test]
    fn starts_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let seq = sequence_in(&dir);
        seq.ensure_initialized().unwrap();

        assert_eq!(fs::read_to_string(seq.path()).unwrap(), "0");
        assert_eq!(seq.allocate_next().unwrap(), 1);
        assert_eq!(seq.allocate_next().unwrap(), 2);
        assert_eq!(seq.current().unwrap(), 2);
    }

    #[test]
    fn initialization_never_resets_an_existing_counter() {
        let dir = tempfile::tempdir().unwrap();
        let seq = sequence_in(&dir);
        seq.ensure_initialized().unwrap();
        seq.allocate_next().unwrap();
        seq.allocate_next().unwrap();

        seq.ensure_initialized().unwrap();
        seq.ensure_initialized().unwrap();
        assert_eq!(seq.current().unwrap(), 2);
    }

    #[test]
    fn counter_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice_number.txt");
        fs::write(&path, "41\n").unwrap();

        let last = InvoiceSequence::new(&path).allocate_next().unwrap();
        assert_eq!(last, 42);
        assert_eq!(fs::read_to_string(&path).unwrap(), "42");
        assert_eq!(InvoiceSequence::new(&path).current().unwrap(), 42);
    }

    #[test]
    fn shorter_value_overwrites_instead_of_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice_number.txt");
        fs::write(&path, "   9   ").unwrap();

        assert_eq!(InvoiceSequence::new(&path).allocate_next().unwrap(), 10);
        assert_eq!(fs::read_to_string(&path).unwrap(), "10");
    }

    #[test]
    fn corrupt_counter_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice_number.txt");
        fs::write(&path, "twelve").unwrap();

        let err = InvoiceSequence::new(&path).allocate_next().unwrap_err();
        assert_eq!(err.kind(), Kind::CorruptCounter);
        assert_eq!(fs::read_to_string(&path).unwrap(), "twelve");
    }

    #[test]
    fn missing_counter_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sequence_in(&dir).allocate_next().unwrap_err();
        assert_eq!(err.kind(), Kind::Io);
    }

    #[test]
    fn concurrent_allocations_never_repeat() {
        const WRITERS: u64 = 8;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice_number.txt");
        sequence_in(&dir).ensure_initialized().unwrap();

        let handles: Vec<_> = (0..WRITERS)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || InvoiceSequence::new(path).allocate_next().unwrap())
            })
            .collect();
        let mut issued: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        issued.sort_unstable();

        assert_eq!(issued, (1..=WRITERS).collect::<Vec<_>>());
        assert_eq!(InvoiceSequence::new(&path).current().unwrap(), WRITERS);
    }

    #[test]
    fn racing_initialization_is_never_seen_empty() {
        const WRITERS: u64 = 8;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books").join("invoice_number.txt");
        let barrier = std::sync::Arc::new(std::sync::Barrier::new(WRITERS as usize));

        let handles: Vec<_> = (0..WRITERS)
            .map(|_| {
                let path = path.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    let seq = InvoiceSequence::new(path);
                    barrier.wait();
                    seq.ensure_initialized().unwrap();
                    seq.allocate_next().unwrap()
                })
            })
            .collect();
        let mut issued: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        issued.sort_unstable();

        assert_eq!(issued, (1..=WRITERS).collect::<Vec<_>>());
        assert_eq!(fs::read_to_string(&path).unwrap(), WRITERS.to_string());
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    proptest! {
        #[test]
        fn allocations_are_gapless(start in 0u64..100_000, count in 1usize..16) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("invoice_number.txt");
            fs::write(&path, start.to_string()).unwrap();
            let seq = InvoiceSequence::new(&path);

            let issued: Vec<u64> = (0..count).map(|_| seq.allocate_next().unwrap()).collect();
            let expected: Vec<u64> = (1..=count as u64).map(|n| start + n).collect();
            prop_assert_eq!(issued, expected);
            prop_assert_eq!(seq.current().unwrap(), start + count as u64);
        }
    }
}
