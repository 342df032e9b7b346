use std::ffi::c_void;
use std::fs::File;
use std::io;
use std::path::Path;
use std::ptr;

use log::warn;
use rustix::mm::{MapFlags, ProtFlags};

use crate::{page_count, PcError, PcResult, ResidencyBitmap, ResidencySource};

/// Reads page residency from the kernel with `mincore(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MincoreSource;

/// A shared, inaccessible mapping of a file, unmapped on drop.
struct Mapping {
    addr: *mut c_void,
    len: usize,
}

impl Mapping {
    fn new(file: &File, len: usize) -> io::Result<Mapping> {
        // SAFETY: the kernel picks the address, so no existing mapping is replaced.  PROT_NONE
        // means the range can never be dereferenced, which also keeps pages from being faulted
        // in by the inspection itself.
        let addr = unsafe { rustix::mm::mmap(ptr::null_mut(), len, ProtFlags::empty(), MapFlags::SHARED, file, 0)? };
        Ok(Mapping { addr, len })
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // SAFETY: addr and len are exactly what mmap returned, and nothing borrows the range.
        if let Err(e) = unsafe { rustix::mm::munmap(self.addr, self.len) } {
            warn!("munmap of {} bytes at {:p} failed: {}", self.len, self.addr, e);
        }
    }
}

impl ResidencySource for MincoreSource {
    fn residency(&self, path: &Path, file: &File, len: u64) -> PcResult<ResidencyBitmap> {
        let map_len = usize::try_from(len).map_err(|_| {
            PcError::Map(
                io::Error::new(io::ErrorKind::InvalidInput, "file is larger than the address space"),
                path.to_path_buf(),
            )
        })?;

        let mapping = Mapping::new(file, map_len).map_err(|e| PcError::Map(e, path.to_path_buf()))?;

        // one byte per page, only the LSB is defined
        let pages = page_count(len, crate::page_size()) as usize;
        let mut vec = vec![0u8; pages];

        // SAFETY: the range is our own mapping of map_len bytes, and vec has room for one byte
        // per page of it.
        let ret = unsafe { libc::mincore(mapping.addr, map_len, vec.as_mut_ptr()) };
        if ret != 0 {
            return Err(PcError::ResidencyQuery(io::Error::last_os_error(), path.to_path_buf()));
        }

        Ok(ResidencyBitmap::from_mincore_vec(&vec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_zero_length_mapping() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"x").unwrap();

        // mmap(2) rejects a zero length with EINVAL
        match MincoreSource.residency(file.path(), file.as_file(), 0) {
            Err(PcError::Map(e, p)) => {
                assert_eq!(e.raw_os_error(), Some(libc::EINVAL));
                assert_eq!(p, file.path());
            }
            x => panic!("Unexpected return value: {:?}", x),
        }
    }

    #[test]
    fn test_unmappable_file() {
        // regular sysfs attributes report a size but can't be mapped
        let candidates = ["/sys/kernel/uevent_seqnum", "/sys/kernel/kexec_loaded", "/sys/power/state"];
        let path = match candidates
            .iter()
            .map(Path::new)
            .find(|p| p.metadata().map(|m| m.is_file() && m.len() > 0).unwrap_or(false))
        {
            Some(path) => path,
            None => {
                println!("no sysfs attribute available, skipping");
                return;
            }
        };

        let err = crate::probe(path).unwrap_err();
        assert!(matches!(err, PcError::Map(_, ref p) if p == path), "{:?}", err);
        assert!(err.is_per_file());
    }
}
