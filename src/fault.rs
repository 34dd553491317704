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

//! The per-access fault state machine.
//!
//! `spec.md` §4.4's four-row table is implemented as a single match over
//! `(resident, prot)`, collapsing the "never loaded" and "was evicted" rows
//! into one branch: both need a frame and a load, differing only in whether
//! the load source is `zero_fill` or `disk_read`, which is exactly what
//! [`crate::page_table::Pte::block_written`] records.

use crate::{
    addr::VirtAddr, config::PagerConfig, cursor::ReplacementCursor, frame_table::FrameTable,
    mmu::Protection, registry::ProcessRegistry, Mmu, Pid,
};

/// Bundles the state a fault needs to touch, borrowed for the duration of one call.
pub struct FaultContext<'a> {
    /// The embedding's address range and page size.
    pub config: &'a PagerConfig,
    /// All registered processes.
    pub registry: &'a mut ProcessRegistry,
    /// The physical frame allocator.
    pub frames: &'a mut FrameTable,
    /// The global replacement cursor.
    pub cursor: &'a mut ReplacementCursor,
    /// The external MMU.
    pub mmu: &'a mut dyn Mmu,
}

impl<'a> FaultContext<'a> {
    /// Handles one fault on `pid` at `addr`.
    ///
    /// A no-op if `pid` is unregistered or `addr` falls outside any reserved
    /// page, per `spec.md` §4.4 ("the embedding guarantees it will only
    /// fault previously-extended addresses").
    pub fn fault(&mut self, pid: Pid, addr: VirtAddr) {
        let Some(process) = self.registry.get(pid) else {
            return;
        };
        let Some(slot) = process
            .page_table()
            .slot_for_addr(addr, self.config.base_addr(), self.config.page_size())
        else {
            return;
        };
        let pte = *process.page_table().get(slot);

        match (pte.resident, pte.prot) {
            (false, _) => self.load(pid, slot, pte.block_written),
            (true, Protection::None) => self.upgrade_to_read(pid, slot),
            (true, Protection::Read) => self.upgrade_to_write(pid, slot),
            (true, Protection::ReadWrite) => {
                // Already at maximum protection; nothing traps here.
            }
        }
    }

    fn upgrade_to_read(&mut self, pid: Pid, slot: usize) {
        let process = self.registry.get_mut(pid).expect("process vanished mid-fault");
        let pte = process.page_table_mut().get_mut(slot);
        pte.prot = Protection::Read;
        pte.referenced = true;
        let vaddr = pte.vaddr;
        self.mmu.chprot(pid, vaddr, Protection::Read.to_raw());
    }

    fn upgrade_to_write(&mut self, pid: Pid, slot: usize) {
        let process = self.registry.get_mut(pid).expect("process vanished mid-fault");
        let pte = process.page_table_mut().get_mut(slot);
        pte.prot = Protection::ReadWrite;
        pte.referenced = true;
        pte.dirty = true;
        let vaddr = pte.vaddr;
        self.mmu.chprot(pid, vaddr, Protection::ReadWrite.to_raw());
    }

    fn load(&mut self, pid: Pid, slot: usize, block_written: bool) {
        let frame = match self.frames.alloc(pid) {
            Some(frame) => frame,
            None => self.evict_one(pid),
        };

        let process = self.registry.get_mut(pid).expect("process vanished mid-fault");
        let pte = process.page_table_mut().get_mut(slot);
        let block = pte.block.expect("reserved PTE missing its block");
        if block_written {
            self.mmu.disk_read(block, frame);
        } else {
            self.mmu.zero_fill(frame);
        }
        self.mmu.resident(pid, pte.vaddr, frame, Protection::Read.to_raw());
        pte.resident = true;
        pte.frame = Some(frame);
        pte.prot = Protection::Read;
        pte.referenced = true;
        pte.dirty = false;
        process.note_frame_allocated();
    }

    /// Runs the clock sweep, demotes the victim, and hands its now-free
    /// frame to `pid`. Only called when [`FrameTable::alloc`] has just
    /// failed, so the freed frame is guaranteed to be the sole free one.
    fn evict_one(&mut self, pid: Pid) -> usize {
        let victim = self.cursor.evict(self.registry, self.mmu);

        let victim_process = self
            .registry
            .get_mut(victim.pid)
            .expect("cursor selected an unregistered process");
        let victim_pte = victim_process.page_table_mut().get_mut(victim.slot);
        let victim_frame = victim_pte.frame.take().expect("victim PTE was not resident");
        if victim_pte.dirty {
            let block = victim_pte.block.expect("reserved PTE missing its block");
            self.mmu.disk_write(block, victim_frame);
            victim_pte.dirty = false;
            victim_pte.block_written = true;
        }
        let victim_vaddr = victim_pte.vaddr;
        victim_pte.resident = false;
        victim_pte.prot = Protection::None;
        self.mmu.nonresident(victim.pid, victim_vaddr);
        victim_process.note_frame_freed();

        self.frames.free(victim_frame);
        self.frames
            .alloc(pid)
            .expect("frame just freed by eviction must be available")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mmu::RawProt, process::Process};

    #[derive(Default)]
    struct RecordingMmu {
        calls: Vec<String>,
    }

    impl Mmu for RecordingMmu {
        fn resident(&mut self, pid: Pid, vaddr: VirtAddr, frame: usize, prot: RawProt) {
            self.calls.push(format!("resident({pid},{vaddr:?},{frame},{prot:?})"));
        }
        fn nonresident(&mut self, pid: Pid, vaddr: VirtAddr) {
            self.calls.push(format!("nonresident({pid},{vaddr:?})"));
        }
        fn chprot(&mut self, pid: Pid, vaddr: VirtAddr, prot: RawProt) {
            self.calls.push(format!("chprot({pid},{vaddr:?},{prot:?})"));
        }
        fn zero_fill(&mut self, frame: usize) {
            self.calls.push(format!("zero_fill({frame})"));
        }
        fn disk_read(&mut self, block: usize, frame: usize) {
            self.calls.push(format!("disk_read({block},{frame})"));
        }
        fn disk_write(&mut self, block: usize, frame: usize) {
            self.calls.push(format!("disk_write({block},{frame})"));
        }
        fn pmem(&self) -> &[u8] {
            &[]
        }
    }

    fn config() -> PagerConfig {
        PagerConfig::new(0x600000000000, 0x600000000000 + 4 * 0x1000 - 1, 0x1000).unwrap()
    }

    fn extended_process(pid: Pid, cfg: &PagerConfig, pages: usize) -> Process {
        let mut p = Process::new(pid, cfg.pages_per_process());
        for i in 0..pages {
            p.page_table_mut().reserve_next(cfg.vaddr_of(i), i).unwrap();
        }
        p
    }

    #[test]
    fn first_fault_zero_fills_and_grants_read() {
        let cfg = config();
        let mut registry = ProcessRegistry::new();
        registry.insert(extended_process(1, &cfg, 1)).unwrap();
        let mut frames = FrameTable::new(2);
        let mut cursor = ReplacementCursor::new();
        let mut mmu = RecordingMmu::default();
        let mut ctx = FaultContext {
            config: &cfg,
            registry: &mut registry,
            frames: &mut frames,
            cursor: &mut cursor,
            mmu: &mut mmu,
        };
        let addr = cfg.vaddr_of(0);
        ctx.fault(1, addr);

        assert_eq!(
            mmu.calls,
            vec!["zero_fill(0)".to_string(), format!("resident(1,{addr:?},0,{:?})", Protection::Read.to_raw())]
        );
        let pte = registry.get(1).unwrap().page_table().get(0);
        assert!(pte.resident);
        assert_eq!(pte.prot, Protection::Read);
    }

    #[test]
    fn second_fault_upgrades_to_readwrite_and_marks_dirty() {
        let cfg = config();
        let mut registry = ProcessRegistry::new();
        registry.insert(extended_process(1, &cfg, 1)).unwrap();
        let mut frames = FrameTable::new(2);
        let mut cursor = ReplacementCursor::new();
        let mut mmu = RecordingMmu::default();
        let addr = cfg.vaddr_of(0);
        {
            let mut ctx = FaultContext {
                config: &cfg,
                registry: &mut registry,
                frames: &mut frames,
                cursor: &mut cursor,
                mmu: &mut mmu,
            };
            ctx.fault(1, addr);
            ctx.fault(1, addr);
        }
        let pte = registry.get(1).unwrap().page_table().get(0);
        assert_eq!(pte.prot, Protection::ReadWrite);
        assert!(pte.dirty);
    }

    #[test]
    fn exhaustion_evicts_dirty_victim_then_loads_faulting_page() {
        let cfg = config();
        let mut registry = ProcessRegistry::new();
        registry.insert(extended_process(1, &cfg, 2)).unwrap();
        let mut frames = FrameTable::new(1);
        let mut cursor = ReplacementCursor::new();
        let mut mmu = RecordingMmu::default();
        let a = cfg.vaddr_of(0);
        let b = cfg.vaddr_of(1);
        {
            let mut ctx = FaultContext {
                config: &cfg,
                registry: &mut registry,
                frames: &mut frames,
                cursor: &mut cursor,
                mmu: &mut mmu,
            };
            ctx.fault(1, a); // resident, frame 0
            ctx.fault(1, a); // dirty
        }
        mmu.calls.clear();
        {
            let mut ctx = FaultContext {
                config: &cfg,
                registry: &mut registry,
                frames: &mut frames,
                cursor: &mut cursor,
                mmu: &mut mmu,
            };
            ctx.fault(1, b); // exhausted: evicts a, loads b
        }
        assert!(mmu.calls.contains(&"disk_write(0,0)".to_string()));
        assert!(mmu.calls.contains(&format!("nonresident(1,{a:?})")));
        assert!(mmu.calls.contains(&"zero_fill(0)".to_string()));
        let pte_a = registry.get(1).unwrap().page_table().get(0);
        assert!(!pte_a.resident);
        assert!(pte_a.block_written);
        let pte_b = registry.get(1).unwrap().page_table().get(1);
        assert!(pte_b.resident);
    }

    #[test]
    fn reload_of_evicted_page_uses_disk_read() {
        let cfg = config();
        let mut registry = ProcessRegistry::new();
        registry.insert(extended_process(1, &cfg, 2)).unwrap();
        let mut frames = FrameTable::new(1);
        let mut cursor = ReplacementCursor::new();
        let mut mmu = RecordingMmu::default();
        let a = cfg.vaddr_of(0);
        let b = cfg.vaddr_of(1);
        {
            let mut ctx = FaultContext {
                config: &cfg,
                registry: &mut registry,
                frames: &mut frames,
                cursor: &mut cursor,
                mmu: &mut mmu,
            };
            ctx.fault(1, a);
            ctx.fault(1, a);
            ctx.fault(1, b);
        }
        mmu.calls.clear();
        {
            let mut ctx = FaultContext {
                config: &cfg,
                registry: &mut registry,
                frames: &mut frames,
                cursor: &mut cursor,
                mmu: &mut mmu,
            };
            ctx.fault(1, a);
        }
        assert!(mmu.calls.iter().any(|c| c.starts_with("disk_read(0,")));
    }

    #[test]
    fn fault_on_unreserved_address_is_a_noop() {
        let cfg = config();
        let mut registry = ProcessRegistry::new();
        registry.insert(Process::new(1, cfg.pages_per_process())).unwrap();
        let mut frames = FrameTable::new(1);
        let mut cursor = ReplacementCursor::new();
        let mut mmu = RecordingMmu::default();
        let mut ctx = FaultContext {
            config: &cfg,
            registry: &mut registry,
            frames: &mut frames,
            cursor: &mut cursor,
            mmu: &mut mmu,
        };
        ctx.fault(1, cfg.vaddr_of(0));
        assert!(mmu.calls.is_empty());
    }
}
