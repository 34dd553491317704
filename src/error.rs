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

//! Error types for the pager core.
//!
//! Most public operations keep the plain-value return shapes their ABI
//! specifies (`Option`, `i32`, `()`); these types cover the few places that
//! are genuinely fallible in a way worth naming.

use thiserror::Error;

/// Returned by [`crate::PagerConfig::new`] when the embedding supplies an
/// inconsistent virtual address range or page size.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `base > max`, i.e. the virtual range is empty or inverted.
    #[error("virtual address range is empty or inverted (base {base:#x} > max {max:#x})")]
    EmptyRange {
        /// The requested base address.
        base: usize,
        /// The requested maximum address.
        max: usize,
    },
    /// The page size is zero or not a power of two.
    #[error("page size {0:#x} is not a non-zero power of two")]
    InvalidPageSize(usize),
    /// The virtual range does not hold a whole number of pages.
    #[error("virtual range is not a whole number of {page_size:#x}-byte pages")]
    UnalignedRange {
        /// The page size that did not evenly divide the range.
        page_size: usize,
    },
}

/// Returned by [`crate::Pager::new`] when `nframes` or `nblocks` is
/// non-positive. `spec.md` §7 treats this as fatal: the embedding is
/// expected to propagate this to process exit, not recover from it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitError {
    /// `nframes` was zero or negative.
    #[error("nframes must be positive, got {0}")]
    InvalidFrameCount(i64),
    /// `nblocks` was zero or negative.
    #[error("nblocks must be positive, got {0}")]
    InvalidBlockCount(i64),
}

/// Returned by [`crate::Pager::create`] when the requested pid is already
/// registered.
///
/// `spec.md` §4.1 leaves this case unspecified ("the tests will not do
/// this"); this crate resolves the open question by rejecting the call
/// instead of invoking undefined behaviour. See `DESIGN.md`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreateError {
    /// The pid is already registered.
    #[error("pid {0} is already registered")]
    DuplicatePid(crate::Pid),
}
