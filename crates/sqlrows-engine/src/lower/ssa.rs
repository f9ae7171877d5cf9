//! On-the-fly SSA construction.
//!
//! Variables are renamed per block while the CFG is being built. Reading a
//! variable in a block without a local definition walks to the
//! predecessors; blocks whose predecessors are not all known yet
//! ("unsealed") get placeholder phis that are completed when the block is
//! sealed. Trivial phis (all operands the same value or the phi itself)
//! are removed once the function is complete.

use rustc_hash::{FxHashMap, FxHashSet};

use super::Lowerer;
use crate::checker::ObjectId;
use crate::ir::{BlockId, Function, InstrKind, ValueDef, ValueId};
use crate::types::TypeId;

/// A variable tracked in SSA form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum Var {
    /// Local variable, parameter or named result
    Object(ObjectId),
    /// Compiler temporary (value of a short-circuit expression)
    Temp(u32),
}

#[derive(Debug, Default)]
pub(super) struct SsaState {
    current_defs: FxHashMap<(Var, BlockId), ValueId>,
    incomplete: FxHashMap<BlockId, Vec<(Var, ValueId)>>,
    sealed: FxHashSet<BlockId>,
    temps: Vec<TypeId>,
}

impl Lowerer<'_> {
    pub(super) fn new_temp(&mut self, ty: TypeId) -> Var {
        self.ssa.temps.push(ty);
        Var::Temp(self.ssa.temps.len() as u32 - 1)
    }

    fn var_type(&self, var: Var) -> TypeId {
        match var {
            Var::Object(object) => self.cx.objects.get(object).ty,
            Var::Temp(index) => self
                .ssa
                .temps
                .get(index as usize)
                .copied()
                .unwrap_or_else(|| self.cx.types.invalid()),
        }
    }

    pub(super) fn write_var(&mut self, var: Var, block: BlockId, value: ValueId) {
        self.ssa.current_defs.insert((var, block), value);
    }

    pub(super) fn read_var(&mut self, var: Var, block: BlockId) -> ValueId {
        match self.ssa.current_defs.get(&(var, block)) {
            Some(&value) => value,
            None => self.read_var_recursive(var, block),
        }
    }

    fn read_var_recursive(&mut self, var: Var, block: BlockId) -> ValueId {
        let ty = self.var_type(var);
        let value = if !self.ssa.sealed.contains(&block) {
            let phi = self.func.insert_phi(block, ty, self.func.span);
            self.ssa.incomplete.entry(block).or_default().push((var, phi));
            phi
        } else {
            let preds = self.func.block(block).preds.clone();
            match preds.as_slice() {
                [] => self.func.new_value(ty, ValueDef::Undef),
                [pred] => self.read_var(var, *pred),
                _ => {
                    let phi = self.func.insert_phi(block, ty, self.func.span);
                    self.write_var(var, block, phi);
                    self.add_phi_operands(var, block, phi);
                    phi
                }
            }
        };
        self.write_var(var, block, value);
        value
    }

    fn add_phi_operands(&mut self, var: Var, block: BlockId, phi: ValueId) {
        let preds = self.func.block(block).preds.clone();
        let mut edges = Vec::with_capacity(preds.len());
        for pred in preds {
            edges.push((pred, self.read_var(var, pred)));
        }
        let instr = self
            .func
            .block_mut(block)
            .instructions
            .iter_mut()
            .find(|i| i.dest == Some(phi));
        if let Some(instr) = instr {
            if let InstrKind::Phi { edges: slot } = &mut instr.kind {
                *slot = edges;
            }
        }
    }

    /// Declare that every predecessor of `block` is known.
    pub(super) fn seal(&mut self, block: BlockId) {
        if !self.ssa.sealed.insert(block) {
            return;
        }
        for (var, phi) in self.ssa.incomplete.remove(&block).unwrap_or_default() {
            self.add_phi_operands(var, block, phi);
        }
    }

    pub(super) fn seal_all(&mut self) {
        for b in 0..self.func.block_count() {
            self.seal(BlockId(b as u32));
        }
    }
}

/// Replace phis whose operands are all one value (ignoring the phi itself)
/// by that value, until none are left.
pub(super) fn eliminate_trivial_phis(func: &mut Function) {
    fn resolve(mut v: ValueId, map: &FxHashMap<ValueId, ValueId>) -> ValueId {
        while let Some(&next) = map.get(&v) {
            v = next;
        }
        v
    }

    let mut replaced: FxHashMap<ValueId, ValueId> = FxHashMap::default();
    loop {
        let mut changed = false;
        // Phis with no operand besides themselves become undefined values.
        let mut undefined: Vec<ValueId> = Vec::new();
        for block in func.blocks() {
            for instr in block.instructions.iter().take_while(|i| i.is_phi()) {
                let (Some(dest), InstrKind::Phi { edges }) = (instr.dest, &instr.kind) else {
                    continue;
                };
                if replaced.contains_key(&dest) {
                    continue;
                }
                let mut same = None;
                let mut is_trivial = true;
                for &(_, v) in edges {
                    let v = resolve(v, &replaced);
                    if v == dest || Some(v) == same {
                        continue;
                    }
                    if same.is_some() {
                        is_trivial = false;
                        break;
                    }
                    same = Some(v);
                }
                match (is_trivial, same) {
                    (false, _) => {}
                    (true, Some(v)) => {
                        replaced.insert(dest, v);
                        changed = true;
                    }
                    (true, None) => undefined.push(dest),
                }
            }
        }
        for phi in undefined {
            let ty = func.value(phi).ty;
            let undef = func.new_value(ty, ValueDef::Undef);
            replaced.insert(phi, undef);
            changed = true;
        }
        if !changed {
            break;
        }
    }
    func.replace_uses(&replaced);
    func.retain_instructions(|i| !(i.is_phi() && i.dest.is_some_and(|d| replaced.contains_key(&d))));
}
