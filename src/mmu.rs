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

//! The external MMU ABI the core consumes.
//!
//! `spec.md` §1 treats the MMU simulator as an out-of-scope collaborator
//! specified only by the interface the core calls into. [`Mmu`] is that
//! interface. The core holds its global lock for the full duration of every
//! call it makes through this trait, so implementors must not call back
//! into the [`crate::Pager`] they are attached to (`spec.md` §5).

use crate::{addr::VirtAddr, Pid};
use bitflags::bitflags;

bitflags! {
    /// The protection bits as they cross the MMU boundary.
    ///
    /// The core itself never does bitwise arithmetic on protection; it
    /// reasons in terms of [`Protection`] and converts at the boundary only,
    /// per `spec.md` §9's design note that "arithmetic-OR behaviour of the
    /// MMU ABI is an implementation detail of the boundary, not the core".
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RawProt: u8 {
        /// Read access permitted.
        const READ = 0b01;
        /// Write access permitted.
        const WRITE = 0b10;
    }
}

/// A page's protection level, as tracked by a page-table entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Protection {
    /// No access: any access traps.
    #[default]
    None,
    /// Read-only: a write traps.
    Read,
    /// Read and write: nothing traps.
    ReadWrite,
}

impl Protection {
    /// Converts to the raw bitflag representation used at the MMU boundary.
    pub fn to_raw(self) -> RawProt {
        match self {
            Protection::None => RawProt::empty(),
            Protection::Read => RawProt::READ,
            Protection::ReadWrite => RawProt::READ | RawProt::WRITE,
        }
    }
}

/// The external memory management unit ABI.
///
/// Every method corresponds one-to-one with an entry in `spec.md` §6's "MMU
/// ABI" table. Protection crosses this boundary as [`RawProt`], not
/// [`Protection`]: the core converts at the call site via
/// [`Protection::to_raw`] and never hands the tagged variant itself across
/// the trait.
pub trait Mmu {
    /// Installs a mapping for `pid`'s page at `vaddr` onto physical `frame`
    /// with protection `prot`.
    fn resident(&mut self, pid: Pid, vaddr: VirtAddr, frame: usize, prot: RawProt);

    /// Removes the mapping for `pid`'s page at `vaddr`.
    fn nonresident(&mut self, pid: Pid, vaddr: VirtAddr);

    /// Changes the protection of `pid`'s page at `vaddr` to `prot`.
    fn chprot(&mut self, pid: Pid, vaddr: VirtAddr, prot: RawProt);

    /// Zeroes the physical frame at index `frame`.
    fn zero_fill(&mut self, frame: usize);

    /// Copies backing-store block `block` into physical frame `frame`.
    fn disk_read(&mut self, block: usize, frame: usize);

    /// Copies physical frame `frame` into backing-store block `block`.
    fn disk_write(&mut self, block: usize, frame: usize);

    /// Returns the host-provided physical memory buffer, `nframes * page_size` bytes.
    fn pmem(&self) -> &[u8];
}
