//! Register groups, CSR address allocation and the address decoder.

use crate::error::BankError;
use crate::register::{Register, RegisterKind};
use crate::symtab::{SymbolEntry, SymbolKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};
use weft_ir::{Circuit, Expr, SignalDb, SignalId, SignalRef, Stmt, SYS_DOMAIN};

/// Group name reserved for the bus master.
pub const MASTER_NAME: &str = "master";

/// The CSR-side interface of a bus bridge.
///
/// Addresses are word addresses. A read returns the addressed word on
/// `dat_r` one cycle later; a write with `we` high updates the addressed word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrBus {
    /// Word address.
    pub adr: SignalId,
    /// Write enable.
    pub we: SignalId,
    /// Write data.
    pub dat_w: SignalId,
    /// Read data.
    pub dat_r: SignalId,
}

impl CsrBus {
    /// Allocates the bus signals.
    pub fn new(db: &mut SignalDb, address_width: u32, data_width: u32) -> Self {
        Self {
            adr: db.alloc("csr_adr", address_width),
            we: db.alloc("csr_we", 1),
            dat_w: db.alloc("csr_dat_w", data_width),
            dat_r: db.alloc("csr_dat_r", data_width),
        }
    }

    /// Every bus signal.
    pub fn signals(&self) -> [SignalId; 4] {
        [self.adr, self.we, self.dat_w, self.dat_r]
    }
}

/// Where a register group landed in the CSR word space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAllocation {
    /// Group name.
    pub name: String,
    /// Group UID.
    pub uid: u32,
    /// First word of the group's block.
    pub offset: u64,
    /// Words in the block.
    pub words: u64,
    /// Words per register slot.
    pub stride: u32,
}

/// A named, uniquely identified set of registers from one component.
#[derive(Debug, Clone)]
pub struct RegisterGroup {
    allocation: GroupAllocation,
    registers: Vec<Register>,
}

impl RegisterGroup {
    /// Group name.
    pub fn name(&self) -> &str {
        &self.allocation.name
    }

    /// Group UID.
    pub fn uid(&self) -> u32 {
        self.allocation.uid
    }

    /// Placement in the word space.
    pub fn allocation(&self) -> &GroupAllocation {
        &self.allocation
    }

    /// Registers in declared order.
    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    /// Looks up a register by name.
    pub fn register(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|r| r.name() == name)
    }

    /// Word address of the first (most significant) word of a register.
    pub fn word_address(&self, name: &str) -> Option<u64> {
        let index = self.registers.iter().position(|r| r.name() == name)?;
        Some(self.allocation.offset + index as u64 * u64::from(self.allocation.stride))
    }
}

/// Allocates register groups and generates their address decoder.
///
/// Every register of a group occupies a slot of `stride` words, where
/// `stride` is the widest register's width divided by the data width,
/// rounded up. Groups are laid end to end in request order from word 0.
/// Multi-word registers put their most significant word at the lowest
/// address.
#[derive(Debug)]
pub struct CsrManager {
    data_width: u32,
    groups: Vec<RegisterGroup>,
    next_word: u64,
    master: Option<CsrBus>,
}

impl CsrManager {
    /// Creates a manager for a bus of `data_width` bits.
    pub fn new(data_width: u32) -> Self {
        Self {
            data_width,
            groups: Vec::new(),
            next_word: 0,
            master: None,
        }
    }

    /// Bus data width in bits.
    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    /// Bytes covered by one bus word.
    pub fn bytes_per_word(&self) -> u64 {
        u64::from(self.data_width.div_ceil(8))
    }

    /// Requests a register group.
    ///
    /// The registers' signals are scoped with the group name.
    pub fn request(
        &mut self,
        db: &mut SignalDb,
        name: impl Into<String>,
        uid: u32,
        registers: Vec<Register>,
    ) -> Result<GroupAllocation, BankError> {
        let name = name.into();
        if name == MASTER_NAME {
            return Err(BankError::ReservedGroupName { name });
        }
        if self.groups.iter().any(|g| g.name() == name) {
            return Err(BankError::DuplicateGroupName { name });
        }
        if let Some(existing) = self.groups.iter().find(|g| g.uid() == uid) {
            return Err(BankError::DuplicateUid {
                uid,
                group: name,
                existing: existing.name().to_string(),
            });
        }
        if registers.is_empty() {
            return Err(BankError::EmptyGroup { name });
        }
        let mut seen = HashSet::new();
        for reg in &registers {
            if !seen.insert(reg.name()) {
                return Err(BankError::DuplicateRegister {
                    group: name,
                    register: reg.name().to_string(),
                });
            }
            if reg.is_raw() && reg.width() > self.data_width {
                return Err(BankError::RawTooWide {
                    group: name,
                    register: reg.name().to_string(),
                    width: reg.width(),
                    data_width: self.data_width,
                });
            }
        }

        let widest = registers.iter().map(Register::width).max().unwrap_or(1);
        let stride = widest.div_ceil(self.data_width);
        let allocation = GroupAllocation {
            name: name.clone(),
            uid,
            offset: self.next_word,
            words: u64::from(stride) * registers.len() as u64,
            stride,
        };
        self.next_word += allocation.words;

        let signals: Vec<SignalId> = registers.iter().flat_map(Register::signals).collect();
        db.push_scope(&signals, &name);
        debug!(
            group = %name,
            uid,
            offset = allocation.offset,
            words = allocation.words,
            "allocated register group"
        );

        self.groups.push(RegisterGroup {
            allocation: allocation.clone(),
            registers,
        });
        Ok(allocation)
    }

    /// Group placements in request order.
    pub fn allocations(&self) -> Vec<GroupAllocation> {
        self.groups.iter().map(|g| g.allocation.clone()).collect()
    }

    /// Looks up a group by name.
    pub fn group(&self, name: &str) -> Option<&RegisterGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    /// Total words allocated.
    pub fn words(&self) -> u64 {
        self.next_word
    }

    /// Attaches the bus bridge's CSR interface.
    pub fn attach_master(&mut self, bus: CsrBus) {
        self.master = Some(bus);
    }

    /// The attached master, if any.
    pub fn master(&self) -> Option<&CsrBus> {
        self.master.as_ref()
    }

    /// Generates the address decoder behind the master.
    pub fn fragment(&self, db: &SignalDb) -> Result<Circuit, BankError> {
        let bus = self.master.ok_or(BankError::NoMaster)?;
        let address_width = db.width(bus.adr);
        if address_width < 64 && self.next_word > 1u64 << address_width {
            return Err(BankError::AddressOverflow {
                words: self.next_word,
                address_width,
            });
        }
        let dw = self.data_width;

        let mut strobes = Vec::new();
        let mut writes = Vec::new();
        let mut reads = vec![Stmt::assign(bus.dat_r, Expr::constant(0, dw))];

        for group in &self.groups {
            let stride = group.allocation.stride;
            for (index, reg) in group.registers.iter().enumerate() {
                let slot = group.allocation.offset + index as u64 * u64::from(stride);
                let width = reg.width();
                if let RegisterKind::Raw { re, .. } = reg.kind() {
                    strobes.push(Stmt::assign(*re, Expr::bit(false)));
                }
                for word in 0..stride {
                    let low = (stride - 1 - word) * dw;
                    if low >= width {
                        continue;
                    }
                    let high = (low + dw).min(width) - 1;
                    let selected = Expr::signal(bus.adr).equals(Expr::constant(slot + u64::from(word), address_width));
                    let write = Expr::signal(bus.we).and(selected.clone());
                    let data_in = Expr::slice(bus.dat_w, high - low, 0);

                    let (readback, on_write) = match *reg.kind() {
                        RegisterKind::Field { storage } => (
                            bits(storage, width, high, low),
                            vec![Stmt::assign(target(storage, width, high, low), data_in)],
                        ),
                        RegisterKind::Raw { re, r, w } => (
                            bits(w, width, high, low),
                            vec![Stmt::assign(re, Expr::bit(true)), Stmt::assign(r, data_in)],
                        ),
                    };
                    writes.push(Stmt::when(write, on_write));
                    reads.push(Stmt::when(
                        selected,
                        vec![Stmt::assign(bus.dat_r, zero_extend(readback, high - low + 1, dw))],
                    ));
                }
            }
        }

        let mut c = Circuit::new();
        for stmt in strobes.into_iter().chain(writes).chain(reads) {
            c.sync(SYS_DOMAIN, stmt);
        }
        info!(
            groups = self.groups.len(),
            words = self.next_word,
            "generated CSR decoder"
        );
        Ok(c)
    }

    /// One `csr` entry per group, in request order.
    ///
    /// Fails if the groups need more than `span` bytes or an address does
    /// not fit in 64 bits.
    pub fn symtab(&self, base: u64, span: u64) -> Result<Vec<SymbolEntry>, BankError> {
        let bpw = self.bytes_per_word();
        let overflow = |needed: u64| BankError::RegionOverflow {
            kind: "csr",
            needed,
            span,
        };
        let needed = self.next_word.checked_mul(bpw).ok_or_else(|| overflow(u64::MAX))?;
        if needed > span {
            return Err(overflow(needed));
        }
        base.checked_add(needed).ok_or_else(|| overflow(needed))?;
        Ok(self
            .groups
            .iter()
            .map(|g| SymbolEntry {
                name: g.name().to_string(),
                kind: SymbolKind::Csr,
                base: base + g.allocation.offset * bpw,
                size: g.allocation.words * bpw,
                uid: Some(g.uid()),
            })
            .collect())
    }
}

fn bits(signal: SignalId, width: u32, high: u32, low: u32) -> Expr {
    if low == 0 && high + 1 == width {
        Expr::signal(signal)
    } else {
        Expr::slice(signal, high, low)
    }
}

fn target(signal: SignalId, width: u32, high: u32, low: u32) -> SignalRef {
    if low == 0 && high + 1 == width {
        SignalRef::Signal(signal)
    } else {
        SignalRef::Slice { signal, high, low }
    }
}

fn zero_extend(value: Expr, width: u32, to: u32) -> Expr {
    if width < to {
        Expr::Concat(vec![Expr::constant(0, to - width), value])
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(db: &mut SignalDb, widths: &[u32]) -> Vec<Register> {
        widths
            .iter()
            .enumerate()
            .map(|(i, w)| Register::field(db, format!("r{i}"), *w, 0).unwrap())
            .collect()
    }

    #[test]
    fn blocks_laid_end_to_end() {
        let mut db = SignalDb::new();
        let mut csrs = CsrManager::new(16);
        let regs = group(&mut db, &[16]);
        csrs.request(&mut db, "a", 1, regs).unwrap();
        let regs = group(&mut db, &[8, 24]);
        csrs.request(&mut db, "b", 2, regs).unwrap();
        let regs = group(&mut db, &[1, 1, 1]);
        csrs.request(&mut db, "c", 3, regs).unwrap();

        let allocs = csrs.allocations();
        let layout: Vec<_> = allocs.iter().map(|a| (a.name.as_str(), a.offset, a.words, a.stride)).collect();
        assert_eq!(layout, vec![("a", 0, 1, 1), ("b", 1, 4, 2), ("c", 5, 3, 1)]);
        assert_eq!(csrs.words(), 8);
        assert_eq!(csrs.group("b").unwrap().word_address("r1"), Some(3));
    }

    #[test]
    fn request_order_fixes_addresses() {
        let build = |order: &[&str]| {
            let mut db = SignalDb::new();
            let mut csrs = CsrManager::new(16);
            for (uid, name) in order.iter().enumerate() {
                let regs = group(&mut db, &[32]);
                csrs.request(&mut db, *name, uid as u32, regs).unwrap();
            }
            csrs.symtab(0x0800_0000, 0x1000).unwrap()
        };
        let first = build(&["x", "y"]);
        let again = build(&["x", "y"]);
        assert_eq!(first, again);
        assert_eq!(first[1].base, 0x0800_0004);
        let swapped = build(&["y", "x"]);
        assert_eq!(swapped[0].name, "y");
        assert_eq!(swapped[0].base, 0x0800_0000);
    }

    #[test]
    fn duplicate_uid_rejected() {
        let mut db = SignalDb::new();
        let mut csrs = CsrManager::new(16);
        let regs = group(&mut db, &[8]);
        csrs.request(&mut db, "wc", 7, regs).unwrap();
        let regs = group(&mut db, &[8]);
        let err = csrs.request(&mut db, "wg", 7, regs).unwrap_err();
        assert_eq!(
            err,
            BankError::DuplicateUid {
                uid: 7,
                group: "wg".into(),
                existing: "wc".into()
            }
        );
        assert_eq!(csrs.allocations().len(), 1);
    }

    #[test]
    fn group_name_rules() {
        let mut db = SignalDb::new();
        let mut csrs = CsrManager::new(16);
        let regs = group(&mut db, &[8]);
        assert!(matches!(
            csrs.request(&mut db, "master", 1, regs),
            Err(BankError::ReservedGroupName { .. })
        ));
        let regs = group(&mut db, &[8]);
        csrs.request(&mut db, "wc", 1, regs).unwrap();
        let regs = group(&mut db, &[8]);
        assert!(matches!(
            csrs.request(&mut db, "wc", 2, regs),
            Err(BankError::DuplicateGroupName { .. })
        ));
        assert!(matches!(
            csrs.request(&mut db, "empty", 3, Vec::new()),
            Err(BankError::EmptyGroup { .. })
        ));
    }

    #[test]
    fn raw_wider_than_bus_rejected() {
        let mut db = SignalDb::new();
        let mut csrs = CsrManager::new(8);
        let regs = vec![Register::raw(&mut db, "cmd", 9).unwrap()];
        assert!(matches!(
            csrs.request(&mut db, "g", 1, regs),
            Err(BankError::RawTooWide { width: 9, .. })
        ));
    }

    #[test]
    fn register_signals_scoped_by_group() {
        let mut db = SignalDb::new();
        let mut csrs = CsrManager::new(16);
        let reg = Register::field(&mut db, "depth", 16, 0).unwrap();
        let storage = reg.storage().unwrap();
        csrs.request(&mut db, "wc", 1, vec![reg]).unwrap();
        assert_eq!(db[storage].scoped_name(), "wc_depth");
    }

    #[test]
    fn symtab_uses_byte_addresses() {
        let mut db = SignalDb::new();
        let mut csrs = CsrManager::new(16);
        let regs = group(&mut db, &[16, 16]);
        csrs.request(&mut db, "a", 10, regs).unwrap();
        let regs = group(&mut db, &[40]);
        csrs.request(&mut db, "b", 11, regs).unwrap();
        let tab = csrs.symtab(0x0800_0000, 0x0800_0000).unwrap();
        assert_eq!((tab[0].base, tab[0].size, tab[0].uid), (0x0800_0000, 4, Some(10)));
        assert_eq!((tab[1].base, tab[1].size), (0x0800_0004, 6));
    }

    #[test]
    fn symtab_region_overflow() {
        let mut db = SignalDb::new();
        let mut csrs = CsrManager::new(16);
        let regs = group(&mut db, &[64]);
        csrs.request(&mut db, "a", 1, regs).unwrap();
        assert!(matches!(
            csrs.symtab(0, 4),
            Err(BankError::RegionOverflow { needed: 8, .. })
        ));
    }

    #[test]
    fn symtab_base_near_address_limit() {
        let mut db = SignalDb::new();
        let mut csrs = CsrManager::new(16);
        let regs = group(&mut db, &[16, 16]);
        csrs.request(&mut db, "a", 1, regs).unwrap();
        assert!(matches!(
            csrs.symtab(u64::MAX - 1, 0x100),
            Err(BankError::RegionOverflow { kind: "csr", needed: 4, .. })
        ));
        let tab = csrs.symtab(u64::MAX - 4, 0x100).unwrap();
        assert_eq!(tab[0].end(), u64::MAX);
    }

    #[test]
    fn decoder_needs_master() {
        let db = SignalDb::new();
        assert_eq!(CsrManager::new(16).fragment(&db), Err(BankError::NoMaster));
    }

    #[test]
    fn decoder_address_overflow() {
        let mut db = SignalDb::new();
        let mut csrs = CsrManager::new(8);
        let regs = group(&mut db, &[8, 8, 8]);
        csrs.request(&mut db, "a", 1, regs).unwrap();
        csrs.attach_master(CsrBus::new(&mut db, 1, 8));
        assert!(matches!(
            csrs.fragment(&db),
            Err(BankError::AddressOverflow { words: 3, address_width: 1 })
        ));
    }

    fn then_targets(stmts: &[Stmt]) -> Vec<SignalRef> {
        stmts
            .iter()
            .filter_map(|s| match s {
                Stmt::If { then_body, .. } => Some(then_body),
                _ => None,
            })
            .flatten()
            .filter_map(|s| match s {
                Stmt::Assign { target, .. } => Some(*target),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn msb_word_at_lowest_address() {
        let mut db = SignalDb::new();
        let mut csrs = CsrManager::new(16);
        let reg = Register::field(&mut db, "wide", 24, 0).unwrap();
        let storage = reg.storage().unwrap();
        csrs.request(&mut db, "g", 1, vec![reg]).unwrap();
        let bus = CsrBus::new(&mut db, 14, 16);
        csrs.attach_master(bus);
        let c = csrs.fragment(&db).unwrap();
        let stmts = &c.sync[SYS_DOMAIN];

        let writes: Vec<_> = then_targets(stmts)
            .into_iter()
            .filter(|t| t.signal() == storage)
            .collect();
        assert_eq!(
            writes,
            vec![
                SignalRef::Slice { signal: storage, high: 23, low: 16 },
                SignalRef::Slice { signal: storage, high: 15, low: 0 },
            ]
        );
        match &stmts[0] {
            Stmt::If { condition, .. } => {
                let mut read = std::collections::BTreeSet::new();
                condition.collect_signals(&mut read);
                assert!(read.contains(&bus.we));
            }
            other => panic!("expected write decode, got {other:?}"),
        }
    }

    #[test]
    fn raw_write_pulses_strobe() {
        let mut db = SignalDb::new();
        let mut csrs = CsrManager::new(16);
        let reg = Register::raw(&mut db, "arm", 1).unwrap();
        let RegisterKind::Raw { re, r, w } = *reg.kind() else {
            panic!("raw register expected");
        };
        csrs.request(&mut db, "wc", 1, vec![reg]).unwrap();
        csrs.attach_master(CsrBus::new(&mut db, 14, 16));
        let c = csrs.fragment(&db).unwrap();
        let targets = c.sync_targets();
        assert!(targets.contains(&re));
        assert!(targets.contains(&r));
        assert!(!targets.contains(&w));
        assert_eq!(
            c.sync[SYS_DOMAIN][0],
            Stmt::assign(re, Expr::bit(false))
        );
    }
}
