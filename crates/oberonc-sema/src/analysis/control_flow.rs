//! Control flow graph construction and analysis.
//!
//! Used by the validator for definite-return checking (spec §4.5): a
//! `Procedure` with a declared return type must reach a `RETURN` with a
//! value on every path.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{CaseStmt, ExitStmt, ForLoopStmt, IfLoopMode, IfLoopStmt, NodeID, Procedure, ReturnStmt};
use rustc_hash::FxHashSet;

/// A basic block in a [`ControlFlowGraph`].
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: usize,
    pub statements: Vec<NodeID>,
    pub successors: Vec<usize>,
    pub predecessors: Vec<usize>,
    /// Whether this block ends with `RETURN` or `EXIT`.
    pub has_terminator: bool,
}

/// Control flow graph for one [`Procedure`] body.
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    blocks: Vec<BasicBlock>,
    entry_block: usize,
    /// Blocks ending in a value-carrying `RETURN`.
    exit_blocks: Vec<usize>,
    reachable: Option<FxHashSet<usize>>,
}

impl ControlFlowGraph {
    #[must_use]
    pub const fn new() -> Self { Self { blocks: Vec::new(), entry_block: 0, exit_blocks: Vec::new(), reachable: None } }

    pub fn add_block(&mut self) -> usize {
        let id = self.blocks.len();
        self.blocks.push(BasicBlock { id, statements: Vec::new(), successors: Vec::new(), predecessors: Vec::new(), has_terminator: false });
        id
    }

    pub fn add_edge(&mut self, from: usize, to: usize) {
        if let Some(b) = self.blocks.get_mut(from)
            && !b.successors.contains(&to)
        {
            b.successors.push(to);
        }
        if let Some(b) = self.blocks.get_mut(to)
            && !b.predecessors.contains(&from)
        {
            b.predecessors.push(from);
        }
    }

    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] { &self.blocks }

    #[must_use]
    pub fn entry_block(&self) -> &BasicBlock { &self.blocks[self.entry_block] }

    #[must_use]
    pub fn exit_blocks(&self) -> &[usize] { &self.exit_blocks }

    #[must_use]
    pub fn get_block(&self, id: usize) -> Option<&BasicBlock> { self.blocks.get(id) }

    pub fn compute_reachable(&mut self) -> &FxHashSet<usize> {
        if self.reachable.is_none() {
            let mut reachable = FxHashSet::default();
            let mut stack = vec![self.entry_block];
            while let Some(id) = stack.pop() {
                if reachable.insert(id)
                    && let Some(block) = self.blocks.get(id)
                {
                    for &succ in &block.successors {
                        if !reachable.contains(&succ) {
                            stack.push(succ);
                        }
                    }
                }
            }
            self.reachable = Some(reachable);
        }
        self.reachable.as_ref().unwrap_or_else(|| unreachable!())
    }

    pub fn is_reachable(&mut self, block_id: usize) -> bool { self.compute_reachable().contains(&block_id) }

    /// Whether every path from the entry block reaches a value-`RETURN` exit
    /// (spec §4.5's `missing-return` check).
    #[must_use]
    pub fn all_paths_reach_exit(&self) -> bool {
        if self.exit_blocks.is_empty() {
            return false;
        }
        let mut visited = FxHashSet::default();
        let mut complete_cache = FxHashSet::default();
        self.is_block_complete(self.entry_block, &mut visited, &mut complete_cache)
    }

    fn check_block_complete(&self, block_id: usize, visited: &mut FxHashSet<usize>, complete_cache: &mut FxHashSet<usize>) -> bool {
        let Some(block) = self.blocks.get(block_id) else { return false };
        if self.exit_blocks.contains(&block_id) {
            return true;
        }
        if block.has_terminator {
            return false;
        }
        if block.successors.is_empty() {
            return false;
        }
        block.successors.iter().all(|&succ| self.is_block_complete(succ, visited, complete_cache))
    }

    fn is_block_complete(&self, block_id: usize, visited: &mut FxHashSet<usize>, complete_cache: &mut FxHashSet<usize>) -> bool {
        if complete_cache.contains(&block_id) {
            return true;
        }
        if !visited.insert(block_id) {
            return false;
        }
        let result = self.check_block_complete(block_id, visited, complete_cache);
        let _ = visited.remove(&block_id);
        if result {
            let _ = complete_cache.insert(block_id);
        }
        result
    }

    fn process_body(&mut self, ast: &AST, body: &[NodeID], start: usize, loop_stack: &mut Vec<usize>) -> usize {
        let mut current = start;
        for &stmt in body {
            current = self.process_statement(ast, stmt, current, loop_stack);
        }
        current
    }

    fn process_return(&mut self, stmt_id: NodeID, current: usize, has_value: bool) -> usize {
        if let Some(b) = self.blocks.get_mut(current) {
            b.statements.push(stmt_id);
            b.has_terminator = true;
        }
        if has_value {
            self.exit_blocks.push(current);
        }
        self.add_block()
    }

    fn process_exit(&mut self, stmt_id: NodeID, current: usize, loop_stack: &[usize]) -> usize {
        if let Some(b) = self.blocks.get_mut(current) {
            b.statements.push(stmt_id);
            b.has_terminator = true;
        }
        if let Some(&loop_exit) = loop_stack.last() {
            self.add_edge(current, loop_exit);
        }
        self.add_block()
    }

    fn process_if(&mut self, ast: &AST, stmt_id: NodeID, stmt: &IfLoopStmt, current: usize, loop_stack: &mut Vec<usize>) -> usize {
        if let Some(b) = self.blocks.get_mut(current) {
            b.statements.push(stmt_id);
        }
        let then_block = self.add_block();
        self.add_edge(current, then_block);
        let then_exit = self.process_body(ast, &stmt.body, then_block, loop_stack);

        let merge = self.add_block();
        if let Some(b) = self.blocks.get(then_exit)
            && !b.has_terminator
        {
            self.add_edge(then_exit, merge);
        }

        match stmt.else_branch {
            Some(else_id) => {
                let else_block = self.add_block();
                self.add_edge(current, else_block);
                let else_exit = self.process_statement(ast, else_id, else_block, loop_stack);
                if let Some(b) = self.blocks.get(else_exit)
                    && !b.has_terminator
                {
                    self.add_edge(else_exit, merge);
                }
            }
            None => self.add_edge(current, merge),
        }
        merge
    }

    fn process_while_repeat(&mut self, ast: &AST, stmt: &IfLoopStmt, current: usize, loop_stack: &mut Vec<usize>) -> usize {
        let cond_block = self.add_block();
        self.add_edge(current, cond_block);
        let body_block = self.add_block();
        let exit_block = self.add_block();
        self.add_edge(cond_block, body_block);
        self.add_edge(cond_block, exit_block);

        loop_stack.push(exit_block);
        let body_exit = self.process_body(ast, &stmt.body, body_block, loop_stack);
        let _ = loop_stack.pop();

        if let Some(b) = self.blocks.get(body_exit)
            && !b.has_terminator
        {
            self.add_edge(body_exit, cond_block);
        }
        exit_block
    }

    fn process_loop(&mut self, ast: &AST, stmt: &IfLoopStmt, current: usize, loop_stack: &mut Vec<usize>) -> usize {
        let body_block = self.add_block();
        let exit_block = self.add_block();
        self.add_edge(current, body_block);

        loop_stack.push(exit_block);
        let body_exit = self.process_body(ast, &stmt.body, body_block, loop_stack);
        let _ = loop_stack.pop();

        if let Some(b) = self.blocks.get(body_exit)
            && !b.has_terminator
        {
            self.add_edge(body_exit, body_block);
        }
        exit_block
    }

    fn process_for(&mut self, ast: &AST, stmt: &ForLoopStmt, current: usize, loop_stack: &mut Vec<usize>) -> usize {
        let cond_block = self.add_block();
        self.add_edge(current, cond_block);
        let body_block = self.add_block();
        let exit_block = self.add_block();
        self.add_edge(cond_block, body_block);
        self.add_edge(cond_block, exit_block);

        loop_stack.push(exit_block);
        let body_exit = self.process_body(ast, &stmt.body, body_block, loop_stack);
        let _ = loop_stack.pop();

        if let Some(b) = self.blocks.get(body_exit)
            && !b.has_terminator
        {
            self.add_edge(body_exit, cond_block);
        }
        exit_block
    }

    fn process_case(&mut self, ast: &AST, stmt_id: NodeID, stmt: &CaseStmt, current: usize, loop_stack: &mut Vec<usize>) -> usize {
        if let Some(b) = self.blocks.get_mut(current) {
            b.statements.push(stmt_id);
        }
        let merge = self.add_block();

        for arm in &stmt.arms {
            let arm_block = self.add_block();
            self.add_edge(current, arm_block);
            let arm_exit = self.process_body(ast, &arm.body, arm_block, loop_stack);
            if let Some(b) = self.blocks.get(arm_exit)
                && !b.has_terminator
            {
                self.add_edge(arm_exit, merge);
            }
        }

        match &stmt.else_body {
            Some(else_body) => {
                let else_block = self.add_block();
                self.add_edge(current, else_block);
                let else_exit = self.process_body(ast, else_body, else_block, loop_stack);
                if let Some(b) = self.blocks.get(else_exit)
                    && !b.has_terminator
                {
                    self.add_edge(else_exit, merge);
                }
            }
            None => self.add_edge(current, merge),
        }
        merge
    }

    fn process_statement(&mut self, ast: &AST, stmt_id: NodeID, current: usize, loop_stack: &mut Vec<usize>) -> usize {
        if let Ok(ret) = ast.get_as::<ReturnStmt>(stmt_id) {
            let has_value = ret.value.is_some();
            return self.process_return(stmt_id, current, has_value);
        }
        if ast.get_as::<ExitStmt>(stmt_id).is_ok() {
            return self.process_exit(stmt_id, current, loop_stack);
        }
        if let Ok(if_loop) = ast.get_as::<IfLoopStmt>(stmt_id).cloned() {
            return match if_loop.mode {
                IfLoopMode::If | IfLoopMode::With => self.process_if(ast, stmt_id, &if_loop, current, loop_stack),
                IfLoopMode::While | IfLoopMode::Repeat => self.process_while_repeat(ast, &if_loop, current, loop_stack),
                IfLoopMode::Loop => self.process_loop(ast, &if_loop, current, loop_stack),
            };
        }
        if let Ok(for_loop) = ast.get_as::<ForLoopStmt>(stmt_id).cloned() {
            return self.process_for(ast, &for_loop, current, loop_stack);
        }
        if let Ok(case) = ast.get_as::<CaseStmt>(stmt_id).cloned() {
            return self.process_case(ast, stmt_id, &case, current, loop_stack);
        }

        if let Some(b) = self.blocks.get_mut(current) {
            b.statements.push(stmt_id);
        }
        current
    }

    /// Builds a CFG from a procedure's body.
    #[must_use]
    pub fn build_from_procedure(ast: &AST, proc_id: NodeID) -> Self {
        let mut cfg = Self::new();
        let entry = cfg.add_block();
        cfg.entry_block = entry;

        let Ok(proc) = ast.get_as::<Procedure>(proc_id) else { return cfg };
        let mut current = entry;
        let mut loop_stack = Vec::new();
        for &stmt_id in &proc.body {
            current = cfg.process_statement(ast, stmt_id, current, &mut loop_stack);
        }
        let _ = current;
        cfg
    }
}

impl Default for ControlFlowGraph {
    fn default() -> Self { Self::new() }
}
