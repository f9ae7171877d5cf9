//! Loop bookkeeping for `break` and `continue`.

use crate::ir::BlockId;

#[derive(Debug, Clone, Copy)]
pub struct LoopContext {
    /// Target of `break`
    pub break_block: BlockId,
    /// Target of `continue` (the post statement block)
    pub continue_block: BlockId,
}

#[derive(Debug, Default)]
pub struct LoopStack {
    stack: Vec<LoopContext>,
}

impl LoopStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ctx: LoopContext) {
        self.stack.push(ctx);
    }

    pub fn pop(&mut self) -> Option<LoopContext> {
        self.stack.pop()
    }

    /// Innermost enclosing loop.
    pub fn current(&self) -> Option<&LoopContext> {
        self.stack.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost_loop_wins() {
        let mut loops = LoopStack::new();
        assert!(loops.current().is_none());
        loops.push(LoopContext {
            break_block: BlockId(3),
            continue_block: BlockId(2),
        });
        loops.push(LoopContext {
            break_block: BlockId(7),
            continue_block: BlockId(6),
        });
        assert_eq!(loops.current().map(|l| l.break_block), Some(BlockId(7)));
        loops.pop();
        assert_eq!(loops.current().map(|l| l.continue_block), Some(BlockId(2)));
    }
}
