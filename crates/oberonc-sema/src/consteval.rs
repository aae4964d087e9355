//! Constant-expression folding shared by the type resolver's array-length
//! check (spec §4.3 step 5) and the checker's `CASE` label overlap check
//! (spec §4.4): literals, unary/binary arithmetic, and named `CONST`
//! references fold down to an `i64`.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{AnyNode, BinOp, Const, LiteralValue, NodeID, UnOp};

/// Recursion cap against malformed or cyclic constant chains — a named
/// constant can reference another, but never this deep in practice.
const MAX_DEPTH: u32 = 64;

/// Folds `node_id` to an `i64` if it denotes a constant integer (or
/// character) expression. Named-constant references are resolved through
/// `resolve`, since the type resolver and the checker each have their own
/// identifier-resolution mechanics. Returns `None` for anything that isn't a
/// foldable constant expression (a variable read, a real literal, ...).
pub fn eval_const_int(ast: &AST, node_id: NodeID, resolve: &mut impl FnMut(NodeID) -> Option<NodeID>) -> Option<i64> {
    eval(ast, node_id, resolve, 0)
}

fn eval(ast: &AST, node_id: NodeID, resolve: &mut impl FnMut(NodeID) -> Option<NodeID>, depth: u32) -> Option<i64> {
    if depth > MAX_DEPTH {
        return None;
    }
    match ast.get_node(node_id)? {
        AnyNode::LiteralExpr(lit) => match lit.value {
            LiteralValue::Integer(n) => Some(n),
            LiteralValue::Character(c) => Some(i64::from(c as u32)),
            _ => None,
        },
        AnyNode::UnExpr(u) if u.op == UnOp::Neg => eval(ast, u.operand, resolve, depth + 1).map(|v| -v),
        AnyNode::BinExpr(b) => {
            let op = b.op;
            let (lhs_id, rhs_id) = (b.lhs, b.rhs);
            let lhs = eval(ast, lhs_id, resolve, depth + 1)?;
            let rhs = eval(ast, rhs_id, resolve, depth + 1)?;
            match op {
                BinOp::Add => Some(lhs + rhs),
                BinOp::Sub => Some(lhs - rhs),
                BinOp::Mul => Some(lhs * rhs),
                BinOp::Div if rhs != 0 => Some(lhs.div_euclid(rhs)),
                BinOp::Mod if rhs != 0 => Some(lhs.rem_euclid(rhs)),
                _ => None,
            }
        }
        AnyNode::IdentLeafExpr(_) | AnyNode::IdentSelExpr(_) => {
            let target = resolve(node_id)?;
            let value_id = ast.get_as::<Const>(target).ok()?.value;
            eval(ast, value_id, resolve, depth + 1)
        }
        _ => None,
    }
}
