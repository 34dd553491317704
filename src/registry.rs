/*
 * Copyright 2026 vmpager Contributors
 *
 * This file is part of vmpager.
 *
 * vmpager is free software: you can redistribute it and/or modify it under the
 * terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or (at your option) any later
 * version.
 *
 * vmpager is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
 * A PARTICULAR PURPOSE. See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * vmpager. If not, see <https://www.gnu.org/licenses/>.
 */

//! The process registry: an insertion-ordered collection of [`Process`]es,
//! iterable as a ring for the global replacement clock.
//!
//! `spec.md` §4.3 requires insert-at-end, lookup-by-pid, remove-by-pid, and
//! successor-of with wraparound. A thin `Vec<Pid>` carries the ring order
//! and a `HashMap` carries the actual records; this is the "thin
//! linked-list helper" `spec.md` §1 calls design-internal, built on `std`
//! collections rather than an intrusive list since this crate targets the
//! host rather than a `no_std` allocator.

use crate::{error::CreateError, process::Process, Pid};
use std::collections::HashMap;

/// An insertion-ordered, cyclically-iterable set of processes.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    order: Vec<Pid>,
    processes: HashMap<Pid, Process>,
    /// Bumped on every removal. Lets [`crate::cursor::ReplacementCursor`]
    /// detect that the process it was pointing at is gone and resync.
    epoch: u64,
}

impl ProcessRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered processes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry holds no processes.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The current epoch, bumped on every [`Self::remove`].
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Registers `process` at the end of the ring.
    ///
    /// Fails if its pid is already registered.
    pub fn insert(&mut self, process: Process) -> Result<(), CreateError> {
        let pid = process.pid();
        if self.processes.contains_key(&pid) {
            return Err(CreateError::DuplicatePid(pid));
        }
        self.order.push(pid);
        self.processes.insert(pid, process);
        Ok(())
    }

    /// Whether `pid` is registered.
    pub fn contains(&self, pid: Pid) -> bool {
        self.processes.contains_key(&pid)
    }

    /// Looks up a process by pid.
    pub fn get(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(&pid)
    }

    /// Looks up a process by pid, mutably.
    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.processes.get_mut(&pid)
    }

    /// Removes `pid` from the registry, returning its record if present.
    ///
    /// Idempotent: removing an unregistered pid is a no-op returning `None`,
    /// matching `spec.md` §4.1's "idempotent for unknown pid" for `destroy`.
    pub fn remove(&mut self, pid: Pid) -> Option<Process> {
        let process = self.processes.remove(&pid)?;
        self.order.retain(|&p| p != pid);
        self.epoch += 1;
        Some(process)
    }

    /// The first process in ring order, if any.
    pub fn head(&self) -> Option<Pid> {
        self.order.first().copied()
    }

    /// The process following `pid` in ring order, wrapping to the head.
    ///
    /// Returns `None` if `pid` is not registered or the registry is empty
    /// (a lone registered process is its own successor).
    pub fn successor(&self, pid: Pid) -> Option<Pid> {
        let idx = self.order.iter().position(|&p| p == pid)?;
        self.order.get((idx + 1) % self.order.len()).copied()
    }

    /// Iterates over registered pids in ring order.
    pub fn pids(&self) -> impl Iterator<Item = Pid> + '_ {
        self.order.iter().copied()
    }
}
