//! Entering the mount namespace of another process.
//!
//! Paths read from `/proc/<pid>/maps` are relative to that process's mount namespace.  For a
//! process in a container they usually name different files (or none at all) in ours, so before
//! probing them the caller has to move into the target's namespace with `setns(2)`.
//!
//! `setns(2)` with a mount namespace fails with `EINVAL` in a multi-threaded process, so the
//! switch should happen before any threads are spawned.  It also needs `CAP_SYS_ADMIN` and
//! `CAP_SYS_CHROOT`.

use log::{debug, info};
use rustix::fd::AsFd;
use rustix::thread::LinkNameSpaceType;

use crate::process::Process;
use crate::{MountNamespaceId, PcError, PcResult};

/// What [`MountNamespaceGate::ensure_namespace`] did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NamespaceOutcome {
    /// Both processes share a mount namespace; nothing to do.
    Shared,
    /// One of the namespace ids couldn't be read, so nothing was done.
    Unavailable,
    /// The calling process moved from `from` into `to`.
    Switched {
        from: MountNamespaceId,
        to: MountNamespaceId,
    },
    /// An earlier call already switched; a process only ever switches once.
    AlreadySwitched,
}

/// Moves the calling process into a target process's mount namespace, at most once.
#[derive(Debug, Default)]
pub struct MountNamespaceGate {
    switched_to: Option<i32>,
}

impl MountNamespaceGate {
    pub fn new() -> Self {
        MountNamespaceGate::default()
    }

    /// True once a switch has succeeded.
    pub fn has_switched(&self) -> bool {
        self.switched_to.is_some()
    }

    /// Makes sure the calling process is in the mount namespace of `pid`.
    ///
    /// If either namespace id can't be read (no namespace support, or no permission to look at
    /// `pid`), this logs and returns [`NamespaceOutcome::Unavailable`] so that callers can carry
    /// on in their own namespace.  A failed switch is returned as
    /// [`PcError::NamespaceSwitch`].
    pub fn ensure_namespace(&mut self, pid: i32) -> PcResult<NamespaceOutcome> {
        if self.has_switched() {
            return Ok(NamespaceOutcome::AlreadySwitched);
        }

        let target = match Process::new(pid) {
            Ok(p) => p,
            Err(e) => {
                debug!("can't look up the mount namespace of pid {}: {}", pid, e);
                return Ok(NamespaceOutcome::Unavailable);
            }
        };
        let myself = match Process::myself() {
            Ok(p) => p,
            Err(e) => {
                debug!("can't look up our own mount namespace: {}", e);
                return Ok(NamespaceOutcome::Unavailable);
            }
        };

        self.ensure_process(&myself, &target)
    }

    /// Like [`ensure_namespace`](Self::ensure_namespace), with both processes already opened.
    ///
    /// Opening `target` before the switch keeps its `/proc` entry reachable afterwards, even
    /// when the new namespace has no `/proc` of its own.
    pub fn ensure_process(&mut self, myself: &Process, target: &Process) -> PcResult<NamespaceOutcome> {
        if self.has_switched() {
            return Ok(NamespaceOutcome::AlreadySwitched);
        }

        let (mine, theirs) = match (myself.mount_namespace(), target.mount_namespace()) {
            (Ok(mine), Ok(theirs)) => (mine, theirs),
            (Err(e), _) | (_, Err(e)) => {
                debug!("mount namespace lookup failed: {}", e);
                return Ok(NamespaceOutcome::Unavailable);
            }
        };

        if mine == theirs {
            debug!("pid {} shares our mount namespace {}", target.pid, mine);
            return Ok(NamespaceOutcome::Shared);
        }

        let ns = target
            .open_mount_namespace()
            .map_err(|e| PcError::NamespaceSwitch(e, target.pid))?;
        rustix::thread::move_into_link_name_space(ns.as_fd(), Some(LinkNameSpaceType::Mount))
            .map_err(|e| PcError::NamespaceSwitch(e.into(), target.pid))?;

        self.switched_to = Some(target.pid);
        info!("moved from mount namespace {} to {} of pid {}", mine, theirs, target.pid);

        Ok(NamespaceOutcome::Switched { from: mine, to: theirs })
    }
}
