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

//! The virtual address range and page size supplied by the embedding.
//!
//! `spec.md` calls these `UVM_BASEADDR`, `UVM_MAXADDR` and the host page
//! size. Rather than file-scope constants, they are captured here and
//! threaded through explicitly, the way [`crate::pager::Pager`] threads its
//! state rather than relying on statics.

use crate::{addr::VirtAddr, error::ConfigError};

/// The virtual address range and page size every process is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerConfig {
    /// Inclusive lower bound of every process's virtual address space.
    base_addr: VirtAddr,
    /// Inclusive upper bound of every process's virtual address space.
    max_addr: VirtAddr,
    /// Page size in bytes, a power of two.
    page_size: usize,
    /// Number of pages per process, derived from the range and page size.
    pages_per_process: usize,
}

impl PagerConfig {
    /// Builds a configuration from the embedding's constants.
    ///
    /// Fails if `base_addr > max_addr`, if `page_size` is not a non-zero
    /// power of two, or if the range does not hold a whole number of pages.
    pub fn new(base_addr: usize, max_addr: usize, page_size: usize) -> Result<Self, ConfigError> {
        if base_addr > max_addr {
            return Err(ConfigError::EmptyRange {
                base: base_addr,
                max: max_addr,
            });
        }
        if page_size == 0 || !page_size.is_power_of_two() {
            return Err(ConfigError::InvalidPageSize(page_size));
        }
        let span = max_addr - base_addr + 1;
        if span % page_size != 0 {
            return Err(ConfigError::UnalignedRange { page_size });
        }
        Ok(Self {
            base_addr: VirtAddr(base_addr),
            max_addr: VirtAddr(max_addr),
            page_size,
            pages_per_process: span / page_size,
        })
    }

    /// Inclusive lower bound of every process's virtual address space.
    pub fn base_addr(&self) -> VirtAddr {
        self.base_addr
    }

    /// Inclusive upper bound of every process's virtual address space.
    pub fn max_addr(&self) -> VirtAddr {
        self.max_addr
    }

    /// Page size in bytes.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages per process (`NP` in `spec.md`).
    pub fn pages_per_process(&self) -> usize {
        self.pages_per_process
    }

    /// Returns the page-aligned virtual address of page `index`.
    pub fn vaddr_of(&self, index: usize) -> VirtAddr {
        self.base_addr + index * self.page_size
    }
}
