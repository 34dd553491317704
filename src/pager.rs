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

//! The public pager API: `spec.md` §4.1's `init`/`create`/`extend`/`fault`/
//! `syslog`/`destroy`, each acquiring the global lock on entry and releasing
//! it on every exit path, including early returns.

use crate::{
    addr::VirtAddr, block_table::BlockTable, config::PagerConfig, cursor::ReplacementCursor,
    error::{CreateError, InitError}, fault::FaultContext, frame_table::FrameTable,
    process::Process, registry::ProcessRegistry, sync::Lock, Mmu, Pid,
};

#[derive(Debug)]
struct PagerState<M: Mmu> {
    config: PagerConfig,
    frames: FrameTable,
    blocks: BlockTable,
    registry: ProcessRegistry,
    cursor: ReplacementCursor,
    mmu: M,
}

/// A demand-paging virtual memory manager core, generic over its MMU.
///
/// One [`Pager`] owns one frame pool, one block pool, and every process
/// sharing them; every method acquires the single global lock described in
/// `spec.md` §5 for its entire body.
#[derive(Debug)]
pub struct Pager<M: Mmu> {
    state: Lock<PagerState<M>>,
}

impl<M: Mmu> Pager<M> {
    /// Creates a pager (`spec.md`'s `init`), failing if `nframes` or
    /// `nblocks` is not positive.
    pub fn new(config: PagerConfig, nframes: i64, nblocks: i64, mmu: M) -> Result<Self, InitError> {
        if nframes <= 0 {
            return Err(InitError::InvalidFrameCount(nframes));
        }
        if nblocks <= 0 {
            return Err(InitError::InvalidBlockCount(nblocks));
        }
        log::info!("pager initialised with {nframes} frames and {nblocks} blocks");
        Ok(Self {
            state: Lock::new(PagerState {
                config,
                frames: FrameTable::new(nframes as usize),
                blocks: BlockTable::new(nblocks as usize),
                registry: ProcessRegistry::new(),
                cursor: ReplacementCursor::new(),
                mmu,
            }),
        })
    }

    /// Registers a new process with an empty page table.
    ///
    /// Fails if `pid` is already registered (`spec.md` §4.1 leaves this
    /// unspecified; see [`CreateError`] and `DESIGN.md`).
    pub fn create(&self, pid: Pid) -> Result<(), CreateError> {
        let mut state = self.state.lock();
        let pages_per_process = state.config.pages_per_process();
        state.registry.insert(Process::new(pid, pages_per_process))?;
        log::info!("created process {pid}");
        Ok(())
    }

    /// Reserves the next page of `pid`'s virtual address space and binds it
    /// to a fresh backing block. No frame is touched and no MMU call is made.
    ///
    /// Returns `None` if `pid` is unregistered, if every page of its address
    /// space is already reserved, or if no backing block is free.
    pub fn extend(&self, pid: Pid) -> Option<VirtAddr> {
        let mut state = self.state.lock();
        let state = &mut *state;
        let process = state.registry.get_mut(pid)?;
        if process.page_table().reserved_count() >= process.page_table().len() {
            log::warn!("process {pid} extended past its page table capacity");
            return None;
        }
        let block = match state.blocks.alloc(pid) {
            Some(block) => block,
            None => {
                log::warn!("extend({pid}) failed: no free backing block");
                return None;
            }
        };
        let vaddr = state.config.vaddr_of(process.page_table().reserved_count());
        let slot = process
            .page_table_mut()
            .reserve_next(vaddr, block)
            .expect("capacity checked above");
        log::debug!("process {pid} reserved slot {slot} ({vaddr:?}) bound to block {block}");
        Some(vaddr)
    }

    /// Handles a fault raised by the MMU for `pid` at `addr`.
    pub fn fault(&self, pid: Pid, addr: VirtAddr) {
        let mut state = self.state.lock();
        let PagerState {
            config,
            frames,
            registry,
            cursor,
            mmu,
            ..
        } = &mut *state;
        let mut ctx = FaultContext {
            config,
            registry,
            frames,
            cursor,
            mmu,
        };
        ctx.fault(pid, addr);
    }

    /// Dumps `len` bytes starting at `addr` as lowercase hex, via the MMU's
    /// exposed physical memory buffer.
    ///
    /// `addr.is_none()` (the ABI's null address) is a no-op returning `0`.
    /// Returns `-1`, emitting nothing, if the range is not wholly contained
    /// in one resident, reserved page (`spec.md` §9 restricts `syslog` to a
    /// single PTE).
    pub fn syslog(&self, pid: Pid, addr: Option<VirtAddr>, len: usize) -> i32 {
        let Some(addr) = addr else {
            return 0;
        };
        if len == 0 {
            return 0;
        }
        let state = self.state.lock();
        let Some(process) = state.registry.get(pid) else {
            return -1;
        };
        let Some(slot) =
            process
                .page_table()
                .slot_for_addr(addr, state.config.base_addr(), state.config.page_size())
        else {
            return -1;
        };
        let pte = process.page_table().get(slot);
        if !pte.resident {
            return -1;
        }
        let page_end = pte.vaddr + state.config.page_size();
        if addr + len > page_end {
            log::warn!("syslog({pid}) range crosses a page boundary");
            return -1;
        }
        let frame = pte.frame.expect("resident PTE missing its frame");
        let offset = addr - pte.vaddr;
        let phys_base = frame * state.config.page_size() + offset;
        let pmem = state.mmu.pmem();
        let mut out = String::with_capacity(len * 2 + 1);
        for byte in &pmem[phys_base..phys_base + len] {
            out.push_str(&format!("{byte:02x}"));
        }
        out.push('\n');
        print!("{out}");
        0
    }

    /// Reclaims every frame and block owned by `pid` and removes it from
    /// the registry. A no-op if `pid` is not registered.
    pub fn destroy(&self, pid: Pid) {
        let mut state = self.state.lock();
        let PagerState {
            registry,
            cursor,
            frames,
            blocks,
            ..
        } = &mut *state;
        cursor.handle_removal(pid, registry);
        if registry.remove(pid).is_none() {
            return;
        }
        cursor.resync_epoch(registry);
        let freed_frames = frames.free_all_owned_by(pid);
        let freed_blocks = blocks.free_all_owned_by(pid);
        log::info!("destroyed process {pid}, reclaimed {freed_frames} frames and {freed_blocks} blocks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmu::RawProt;

    #[derive(Debug)]
    struct TestMmu {
        pmem: Vec<u8>,
        page_size: usize,
    }

    impl TestMmu {
        fn new(nframes: usize, page_size: usize) -> Self {
            Self {
                pmem: vec![0; nframes * page_size],
                page_size,
            }
        }
    }

    impl Mmu for TestMmu {
        fn resident(&mut self, _: Pid, _: VirtAddr, _: usize, _: RawProt) {}
        fn nonresident(&mut self, _: Pid, _: VirtAddr) {}
        fn chprot(&mut self, _: Pid, _: VirtAddr, _: RawProt) {}
        fn zero_fill(&mut self, frame: usize) {
            let start = frame * self.page_size;
            self.pmem[start..start + self.page_size].fill(0);
        }
        fn disk_read(&mut self, _: usize, _: usize) {}
        fn disk_write(&mut self, _: usize, _: usize) {}
        fn pmem(&self) -> &[u8] {
            &self.pmem
        }
    }

    fn config() -> PagerConfig {
        PagerConfig::new(0x600000000000, 0x600000000000 + 4 * 0x1000 - 1, 0x1000).unwrap()
    }

    #[test]
    fn create_extend_fault_syslog_round_trip() {
        let cfg = config();
        let pager = Pager::new(cfg, 2, 4, TestMmu::new(2, cfg.page_size())).unwrap();
        pager.create(1).unwrap();
        let addr = pager.extend(1).unwrap();
        assert_eq!(addr, cfg.base_addr());
        pager.fault(1, addr);
        assert_eq!(pager.syslog(1, Some(addr), 4), 0);
    }

    #[test]
    fn extend_past_block_capacity_returns_none() {
        let cfg = config();
        let pager = Pager::new(cfg, 2, 1, TestMmu::new(2, cfg.page_size())).unwrap();
        pager.create(1).unwrap();
        assert!(pager.extend(1).is_some());
        assert!(pager.extend(1).is_none());
    }

    #[test]
    fn syslog_on_non_resident_page_fails() {
        let cfg = config();
        let pager = Pager::new(cfg, 2, 4, TestMmu::new(2, cfg.page_size())).unwrap();
        pager.create(1).unwrap();
        let addr = pager.extend(1).unwrap();
        assert_eq!(pager.syslog(1, Some(addr), 4), -1);
    }

    #[test]
    fn syslog_null_address_is_a_noop_success() {
        let cfg = config();
        let pager = Pager::new(cfg, 2, 4, TestMmu::new(2, cfg.page_size())).unwrap();
        assert_eq!(pager.syslog(1, None, 10), 0);
    }

    #[test]
    fn destroy_reclaims_resources_and_is_idempotent() {
        let cfg = config();
        let pager = Pager::new(cfg, 2, 4, TestMmu::new(2, cfg.page_size())).unwrap();
        pager.create(1).unwrap();
        let addr = pager.extend(1).unwrap();
        pager.fault(1, addr);
        pager.destroy(1);
        pager.destroy(1); // idempotent
    }

    #[test]
    fn new_rejects_non_positive_counts() {
        let cfg = config();
        assert_eq!(
            Pager::new(cfg, 0, 4, TestMmu::new(1, cfg.page_size())).unwrap_err(),
            InitError::InvalidFrameCount(0)
        );
        assert_eq!(
            Pager::new(cfg, 2, -1, TestMmu::new(2, cfg.page_size())).unwrap_err(),
            InitError::InvalidBlockCount(-1)
        );
    }
}
