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

//! A user-space demand-paging virtual memory manager.
//!
//! This crate multiplexes a fixed pool of physical frames and backing-store
//! blocks across multiple processes, each owning an independent virtual
//! address space. Every page event of every process is mediated through an
//! external [`mmu::Mmu`] implementation supplied by the embedding: the core
//! never touches real memory or disk itself, it only decides what the MMU
//! should do and in which order.
//!
//! The [`Pager`] type is the sole entry point. It serialises every operation
//! behind a single lock (see [`sync`]), exactly as `spec.md` §5 requires:
//! no operation is observable as partially applied from another thread.

pub mod addr;
pub mod block_table;
pub mod config;
pub mod cursor;
pub mod error;
pub mod fault;
pub mod frame_table;
pub mod mmu;
pub mod page_table;
pub mod pager;
pub mod process;
pub mod registry;
pub mod sync;

pub use addr::VirtAddr;
pub use config::PagerConfig;
pub use error::{ConfigError, CreateError, InitError};
pub use mmu::{Mmu, Protection, RawProt};
pub use pager::Pager;

/// Process identifier, opaque to the core beyond equality and ordering.
pub type Pid = i32;
