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

//! The global second-chance (clock) replacement cursor.
//!
//! `spec.md` §4.5 and §9: the cursor is a `(process, page_index)` pair
//! sweeping across *all* resident pages of *all* processes — not just the
//! faulting process, which `spec.md` §4.5 calls out as the bug in one of
//! the two divergent implementations it was distilled from. Since there is
//! no garbage collector backing this crate, the cursor cannot hold a
//! reference into the registry across calls: it stores a pid and
//! revalidates against the registry's epoch on every use, restarting from
//! the head if the process it pointed to was removed by an intervening
//! `destroy`.

use crate::{
    mmu::{Protection, RawProt},
    registry::ProcessRegistry, Mmu, Pid,
};

/// A victim page-table slot selected for eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Victim {
    /// The owning process.
    pub pid: Pid,
    /// The slot index within that process's page table.
    pub slot: usize,
}

/// The global clock cursor.
#[derive(Debug, Default)]
pub struct ReplacementCursor {
    /// Process the cursor currently points into, if initialised.
    current: Option<Pid>,
    /// Slot last inspected within `current`'s page table, or `-1` if the
    /// cursor has just moved onto `current` and not yet inspected a slot.
    slot: i64,
    /// The registry epoch the cursor was last synchronised against.
    epoch: u64,
}

impl ReplacementCursor {
    /// Creates a cursor in its initial `(none, -1)` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called before `pid` is actually removed from `registry`.
    ///
    /// If the cursor currently points at `pid`, it is moved to `pid`'s
    /// successor with `slot` reset to `-1`, so the next sweep resumes
    /// fairly instead of restarting from the registry head. `pid` is its
    /// own successor when it is the sole registered process; in that case
    /// there is nothing left to resume into, so the cursor is cleared and
    /// `revalidate` restarts it from the head (whatever that head is by the
    /// time `evict` next runs) instead of being left pointing at a pid that
    /// is about to be removed.
    pub fn handle_removal(&mut self, pid: Pid, registry: &ProcessRegistry) {
        if self.current == Some(pid) {
            self.current = registry.successor(pid).filter(|&next| next != pid);
            self.slot = -1;
        }
    }

    /// Resynchronises the cursor's epoch after a removal has taken effect.
    pub fn resync_epoch(&mut self, registry: &ProcessRegistry) {
        self.epoch = registry.epoch();
    }

    /// Runs the second-chance sweep to select and demote a victim page.
    ///
    /// Precondition: at least one resident page exists somewhere in
    /// `registry` (callers only evict when the frame table is exhausted,
    /// which implies this).
    pub fn evict(&mut self, registry: &mut ProcessRegistry, mmu: &mut dyn Mmu) -> Victim {
        self.revalidate(registry);
        loop {
            let pid = self
                .current
                .expect("evict() called with no resident pages in the system");
            let process = registry
                .get_mut(pid)
                .expect("cursor points at a process no longer registered");
            let reserved = process.page_table().reserved_count();
            let next_slot = self.slot + 1;
            if reserved == 0 || next_slot as usize >= reserved {
                // Exhausted this process's reserved range: move to its successor.
                self.current = registry.successor(pid);
                self.slot = -1;
                continue;
            }
            self.slot = next_slot;
            let slot = next_slot as usize;
            let pte = process.page_table_mut().get_mut(slot);
            if !pte.resident {
                continue;
            }
            if pte.referenced {
                pte.referenced = false;
                let vaddr = pte.vaddr;
                pte.prot = Protection::None;
                mmu.chprot(pid, vaddr, Protection::None.to_raw());
                continue;
            }
            self.epoch = registry.epoch();
            return Victim { pid, slot };
        }
    }

    /// Resets the cursor to the registry head if it is uninitialised or
    /// stale (i.e. an intervening removal was not routed through
    /// [`Self::handle_removal`], e.g. on first use).
    fn revalidate(&mut self, registry: &ProcessRegistry) {
        let stale = self.epoch != registry.epoch()
            && !self.current.is_some_and(|pid| registry.contains(pid));
        if self.current.is_none() || stale {
            self.current = registry.head();
            self.slot = -1;
        }
        self.epoch = registry.epoch();
    }
}
