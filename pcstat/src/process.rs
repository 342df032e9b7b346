//! Access to the parts of `/proc/<pid>/` needed to inspect a process's mapped files.
//!
//! ```rust,no_run
//! # use pcstat::process::Process;
//! let init = Process::new(1).unwrap();
//! for path in init.mapped_files().unwrap() {
//!     println!("{}", path.display());
//! }
//! ```

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rustix::fd::OwnedFd;
use rustix::fs::{Mode, OFlags};

use crate::{FromRead, MappedFiles, MountNamespaceId, PcError, PcResult};

/// A process in `/proc/<pid>`.
///
/// **Note** The `Process` struct holds an open file descriptor to its `/proc/<pid>` directory,
/// so that everything read through it comes from the same process even if the pid is reused.
/// The descriptor also keeps working after the calling process changes mount namespace.
#[derive(Debug)]
pub struct Process {
    fd: OwnedFd,
    pub pid: i32,
    root: PathBuf,
}

impl Process {
    /// Returns a `Process` based on a specified PID.
    ///
    /// This can fail if the process doesn't exist, or if you don't have permission to access it.
    pub fn new(pid: i32) -> PcResult<Process> {
        let root = PathBuf::from("/proc").join(pid.to_string());
        Self::new_with_root(root)
    }

    /// Returns a `Process` based on a specified `/proc/<pid>` path.
    pub fn new_with_root(root: PathBuf) -> PcResult<Process> {
        let fd = rustix::fs::openat(
            rustix::fs::CWD,
            &root,
            OFlags::PATH | OFlags::DIRECTORY | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(|e| PcError::Io(e.into(), Some(root.clone())))?;

        let pid = root
            .file_name()
            .and_then(|s| s.to_string_lossy().parse::<i32>().ok())
            .or_else(|| {
                rustix::fs::readlinkat(rustix::fs::CWD, &root, Vec::new())
                    .ok()
                    .and_then(|s| s.to_string_lossy().parse::<i32>().ok())
            });
        let pid = match pid {
            Some(pid) => pid,
            None => {
                return Err(PcError::Io(
                    io::Error::new(io::ErrorKind::NotFound, "not a process directory"),
                    Some(root),
                ))
            }
        };

        Ok(Process { fd, pid, root })
    }

    /// Returns a `Process` for the currently running process, through `/proc/self`.
    pub fn myself() -> PcResult<Process> {
        Self::new_with_root(PathBuf::from("/proc/self"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn open_relative(&self, path: &str) -> io::Result<File> {
        let fd = rustix::fs::openat(&self.fd, path, OFlags::RDONLY | OFlags::CLOEXEC, Mode::empty())?;
        Ok(File::from(fd))
    }

    /// Returns the distinct files mapped into this process, from `/proc/<pid>/maps`.
    pub fn mapped_files(&self) -> PcResult<MappedFiles> {
        let path = self.root.join("maps");
        let file = self
            .open_relative("maps")
            .map_err(|e| PcError::Io(e, Some(path.clone())))?;
        MappedFiles::from_read(file).map_err(|e| e.with_path(&path))
    }

    /// Reads the id of this process's mount namespace from the `/proc/<pid>/ns/mnt` link.
    pub fn mount_namespace(&self) -> PcResult<MountNamespaceId> {
        let path = self.root.join("ns/mnt");
        let link = rustix::fs::readlinkat(&self.fd, "ns/mnt", Vec::new())
            .map_err(|e| PcError::NamespaceLookup(e.into(), Some(path.clone())))?;
        MountNamespaceId::from_str(&link.to_string_lossy()).map_err(|e| e.with_path(&path))
    }

    /// Opens `/proc/<pid>/ns/mnt`, for use with `setns(2)`.
    pub(crate) fn open_mount_namespace(&self) -> io::Result<OwnedFd> {
        Ok(rustix::fs::openat(
            &self.fd,
            "ns/mnt",
            OFlags::RDONLY | OFlags::CLOEXEC,
            Mode::empty(),
        )?)
    }
}

/// Returns the distinct files mapped into the process `pid`.
pub fn list_mapped_files(pid: i32) -> PcResult<MappedFiles> {
    Process::new(pid)?.mapped_files()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_myself() {
        let me = Process::myself().unwrap();
        assert_eq!(me.pid, std::process::id() as i32);
    }

    #[test]
    fn test_self_mapped_files() {
        let files = Process::myself().unwrap().mapped_files().unwrap();
        assert!(!files.is_empty());
        assert!(files.iter().all(|p| p.is_absolute()));

        let exe = std::env::current_exe().unwrap();
        let exe_has_space = exe.to_string_lossy().contains(char::is_whitespace);
        if !exe_has_space {
            assert!(files.contains(&exe), "{:?} not in {:?}", exe, files);
        }
    }

    #[test]
    fn test_missing_process() {
        match list_mapped_files(i32::MAX) {
            Err(PcError::Io(e, Some(p))) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert_eq!(p, Path::new("/proc/2147483647"));
            }
            x => panic!("Unexpected return value: {:?}", x),
        }
    }

    #[test]
    fn test_synthetic_maps() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("4242");
        fs::create_dir(&root).unwrap();
        fs::write(
            root.join("maps"),
            "00400000-00452000 r-xp 00000000 08:02 173521      /usr/bin/dbus-daemon\n\
             00651000-00652000 r--p 00051000 08:02 173521      /usr/bin/dbus-daemon\n\
             00e03000-00e24000 rw-p 00000000 00:00 0           [heap]\n\
             35b1800000-35b1820000 r-xp 00000000 08:02 135522  /usr/lib64/ld-2.15.so\n",
        )
        .unwrap();

        let process = Process::new_with_root(root).unwrap();
        assert_eq!(process.pid, 4242);

        let files = process.mapped_files().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains("/usr/bin/dbus-daemon"));
        assert!(files.contains("/usr/lib64/ld-2.15.so"));
    }

    #[test]
    fn test_synthetic_maps_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("4243");
        fs::create_dir(&root).unwrap();
        fs::write(
            root.join("maps"),
            &b"00400000-00452000 r-xp 00000000 08:02 173521 /usr/bin/dbus-daemon\n\
               7f1c2a000000-7f1c2a2e9000 r--p 00000000 fd:01 3149367 /data/caf\xe9.db\n"[..],
        )
        .unwrap();

        let files = Process::new_with_root(root).unwrap().mapped_files().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains(OsStr::from_bytes(b"/data/caf\xe9.db")));
    }

    #[test]
    fn test_synthetic_maps_missing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("17");
        fs::create_dir(&root).unwrap();

        let process = Process::new_with_root(root.clone()).unwrap();
        match process.mapped_files() {
            Err(PcError::Io(_, Some(p))) => assert_eq!(p, root.join("maps")),
            x => panic!("Unexpected return value: {:?}", x),
        }
    }

    #[test]
    fn test_self_mount_namespace() {
        let me = Process::myself().unwrap();
        match me.mount_namespace() {
            Ok(ns) => println!("{}", ns),
            // namespaces may not be compiled into the kernel
            Err(PcError::NamespaceLookup(e, _)) => println!("no mount namespace: {}", e),
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }
}
