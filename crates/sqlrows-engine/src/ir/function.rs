//! IR functions
//!
//! A function owns its blocks and values. Blocks are stored densely so a
//! [`BlockId`] is an index; the entry block is always `b0`.

use rustc_hash::{FxHashMap, FxHashSet};

use super::block::{BasicBlock, BlockId, Terminator};
use super::instr::{InstrKind, Instruction};
use super::value::{Constant, ValueData, ValueDef, ValueId};
use crate::parser::Span;
use crate::types::{FuncId, TypeId};

#[derive(Debug, Clone)]
pub struct Function {
    /// Qualified display name: `f`, `T.m` or `(*T).m`
    pub name: String,
    /// Declared function object; `None` for the synthetic package initializer
    pub func: Option<FuncId>,
    pub span: Span,
    pub params: Vec<ValueId>,
    values: Vec<ValueData>,
    blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn new(name: impl Into<String>, func: Option<FuncId>, span: Span) -> Self {
        Self {
            name: name.into(),
            func,
            span,
            params: Vec::new(),
            values: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    pub fn add_block(&mut self, comment: Option<&'static str>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(id, comment));
        id
    }

    /// # Panics
    ///
    /// Panics if `id` is not a block of this function.
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }

    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.0 as usize]
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn new_value(&mut self, ty: TypeId, def: ValueDef) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueData { ty, def });
        id
    }

    pub fn add_param(&mut self, ty: TypeId) -> ValueId {
        let v = self.new_value(ty, ValueDef::Param(self.params.len()));
        self.params.push(v);
        v
    }

    pub fn constant(&mut self, value: Constant, ty: TypeId) -> ValueId {
        self.new_value(ty, ValueDef::Const(value))
    }

    pub fn constant_of(&self, id: ValueId) -> Option<&Constant> {
        match &self.value(id).def {
            ValueDef::Const(c) => Some(c),
            _ => None,
        }
    }

    /// The instruction defining `id`, if it is an instruction result.
    pub fn def_instr(&self, id: ValueId) -> Option<&Instruction> {
        match self.value(id).def {
            ValueDef::Instr { block, index } => self.blocks.get(block.index())?.instructions.get(index),
            _ => None,
        }
    }

    /// Append a value-producing instruction.
    pub fn push_value(&mut self, block: BlockId, kind: InstrKind, ty: TypeId, span: Span) -> ValueId {
        let index = self.block(block).instructions.len();
        let dest = self.new_value(ty, ValueDef::Instr { block, index });
        self.block_mut(block).instructions.push(Instruction {
            dest: Some(dest),
            kind,
            span,
        });
        dest
    }

    /// Append an instruction executed for its effect only.
    pub fn push_effect(&mut self, block: BlockId, kind: InstrKind, span: Span) {
        self.block_mut(block).instructions.push(Instruction {
            dest: None,
            kind,
            span,
        });
    }

    /// Insert an empty phi at the head of `block`.
    pub fn insert_phi(&mut self, block: BlockId, ty: TypeId, span: Span) -> ValueId {
        let dest = self.new_value(ty, ValueDef::Instr { block, index: 0 });
        self.block_mut(block).instructions.insert(
            0,
            Instruction {
                dest: Some(dest),
                kind: InstrKind::Phi { edges: Vec::new() },
                span,
            },
        );
        self.reindex_block(block);
        dest
    }

    /// Set the terminator of `block` and record it as predecessor of each
    /// successor.
    pub fn terminate(&mut self, block: BlockId, terminator: Terminator) {
        for succ in terminator.successors() {
            self.block_mut(succ).preds.push(block);
        }
        self.block_mut(block).terminator = terminator;
    }

    /// Position to report a finding about the instruction at `index`.
    ///
    /// Extracting a tuple element has no position of its own; it reports at
    /// the call that produced the tuple.
    pub fn diagnostic_span(&self, block: BlockId, index: usize) -> Span {
        let instr = &self.block(block).instructions[index];
        match instr.kind {
            InstrKind::Extract { tuple, .. } => self.def_instr(tuple).map_or(instr.span, |t| t.span),
            _ => instr.span,
        }
    }

    /// Redirect every use of a key of `replacements` to its value,
    /// following chains.
    pub fn replace_uses(&mut self, replacements: &FxHashMap<ValueId, ValueId>) {
        if replacements.is_empty() {
            return;
        }
        let mut resolve = |mut v: ValueId| {
            let mut steps = 0;
            while let Some(&next) = replacements.get(&v) {
                if next == v || steps > replacements.len() {
                    break;
                }
                v = next;
                steps += 1;
            }
            v
        };
        for block in &mut self.blocks {
            for instr in &mut block.instructions {
                instr.map_operands(&mut resolve);
            }
            block.terminator.map_operands(&mut resolve);
        }
    }

    /// Blocks reachable from the entry, in depth-first preorder.
    pub fn reachable(&self) -> Vec<BlockId> {
        let mut order = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![self.entry()];
        while let Some(b) = stack.pop() {
            if !seen.insert(b) {
                continue;
            }
            order.push(b);
            for succ in self.block(b).successors().into_iter().rev() {
                if !seen.contains(&succ) {
                    stack.push(succ);
                }
            }
        }
        order
    }

    /// Drop blocks unreachable from the entry and renumber the rest densely.
    pub fn remove_unreachable_blocks(&mut self) {
        let mut live: Vec<BlockId> = self.reachable();
        live.sort();
        if live.len() == self.blocks.len() {
            return;
        }
        let remap: FxHashMap<BlockId, BlockId> = live
            .iter()
            .enumerate()
            .map(|(i, &old)| (old, BlockId(i as u32)))
            .collect();
        let old_blocks = std::mem::take(&mut self.blocks);
        for mut block in old_blocks {
            let Some(&new_id) = remap.get(&block.id) else {
                continue;
            };
            block.id = new_id;
            block.preds = block.preds.iter().filter_map(|p| remap.get(p).copied()).collect();
            for instr in &mut block.instructions {
                if let InstrKind::Phi { edges } = &mut instr.kind {
                    edges.retain(|(pred, _)| remap.contains_key(pred));
                    for (pred, _) in edges.iter_mut() {
                        *pred = remap[&*pred];
                    }
                }
            }
            block.terminator.map_blocks(&|b| remap.get(&b).copied().unwrap_or(b));
            self.blocks.push(block);
        }
        for b in 0..self.blocks.len() {
            self.reindex_block(BlockId(b as u32));
        }
    }

    /// Keep only the instructions `keep` accepts.
    pub fn retain_instructions(&mut self, mut keep: impl FnMut(&Instruction) -> bool) {
        for b in 0..self.blocks.len() {
            self.blocks[b].instructions.retain(&mut keep);
            self.reindex_block(BlockId(b as u32));
        }
    }

    fn reindex_block(&mut self, block: BlockId) {
        let dests: Vec<(usize, ValueId)> = self
            .block(block)
            .instructions
            .iter()
            .enumerate()
            .filter_map(|(i, instr)| instr.dest.map(|d| (i, d)))
            .collect();
        for (index, dest) in dests {
            self.values[dest.0 as usize].def = ValueDef::Instr { block, index };
        }
    }

    /// Structural checks: every block is terminated, successors exist,
    /// predecessor lists match the edges and phis sit at block heads.
    pub fn validate(&self) -> Result<(), String> {
        if self.blocks.is_empty() {
            return Err(format!("function {} has no blocks", self.name));
        }
        let mut edges: FxHashMap<BlockId, Vec<BlockId>> = FxHashMap::default();
        for block in &self.blocks {
            if !block.is_terminated() {
                return Err(format!("block {} is not terminated", block.id));
            }
            for succ in block.successors() {
                if succ.index() >= self.blocks.len() {
                    return Err(format!("block {} references non-existent successor {}", block.id, succ));
                }
                edges.entry(succ).or_default().push(block.id);
            }
            let mut in_head = true;
            for instr in &block.instructions {
                if instr.is_phi() && !in_head {
                    return Err(format!("phi after non-phi instruction in block {}", block.id));
                }
                in_head &= instr.is_phi();
            }
        }
        for block in &self.blocks {
            let mut expected = edges.remove(&block.id).unwrap_or_default();
            let mut actual = block.preds.clone();
            expected.sort();
            actual.sort();
            if expected != actual {
                return Err(format!("predecessors of block {} do not match its incoming edges", block.id));
            }
        }
        Ok(())
    }
}
