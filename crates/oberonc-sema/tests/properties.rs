//! Property tests for the numeric promotion order (spec §4.4.1) and
//! record-extension transitivity (spec §4.1 / §8).

use oberonc_ast::nodes::{BaseTypeKind, NodeID};
use oberonc_sema::symbol::{ScopeKind, SymbolTable};
use oberonc_source::types::Span;
use proptest::prelude::*;

const NUMERIC_KINDS: [BaseTypeKind; 6] = [
    BaseTypeKind::Byte,
    BaseTypeKind::ShortInt,
    BaseTypeKind::Integer,
    BaseTypeKind::LongInt,
    BaseTypeKind::Real,
    BaseTypeKind::LongReal,
];

fn numeric_kind() -> impl Strategy<Value = BaseTypeKind> { (0usize..NUMERIC_KINDS.len()).prop_map(|i| NUMERIC_KINDS[i]) }

fn fake_node(index: u32) -> NodeID { NodeID::new(index, 0) }

proptest! {
    /// Rank is a total order over the numeric kinds: reflexive, antisymmetric
    /// and consistent with `BYTE < SHORTINT < INTEGER < LONGINT < REAL < LONGREAL`.
    #[test]
    fn numeric_rank_orders_the_promotion_chain(a in numeric_kind(), b in numeric_kind()) {
        let (ra, rb) = (a.numeric_rank().unwrap(), b.numeric_rank().unwrap());
        prop_assert_eq!(ra == rb, a == b);
        prop_assert_eq!(ra < rb, NUMERIC_KINDS.iter().position(|k| *k == a) < NUMERIC_KINDS.iter().position(|k| *k == b));
    }

    /// Widening a chain of three kinds is transitive: if a <= b and b <= c then a <= c.
    #[test]
    fn numeric_rank_is_transitive(a in numeric_kind(), b in numeric_kind(), c in numeric_kind()) {
        let (ra, rb, rc) = (a.numeric_rank().unwrap(), b.numeric_rank().unwrap(), c.numeric_rank().unwrap());
        if ra <= rb && rb <= rc {
            prop_assert!(ra <= rc);
        }
    }

    /// A chain of `depth` record scopes linked by `set_base_scope` makes every
    /// ancestor's member visible from the bottom of the chain, regardless of
    /// how many links are stacked (spec §4.1's extension-transitivity property).
    #[test]
    fn extension_chain_lookup_reaches_every_ancestor(depth in 1usize..8) {
        let mut table = SymbolTable::new();
        let module_scope = table.current_scope().unwrap();

        let mut scopes = Vec::with_capacity(depth);
        let mut parent = module_scope;
        for level in 0..depth {
            let scope = table.create_scope(ScopeKind::Record, Some(parent));
            if level > 0 {
                table.set_base_scope(scope, *scopes.last().unwrap());
            }
            table.enter_scope(scope);
            table.declare(format!("field{level}"), fake_node(level as u32 + 1), Span::default()).unwrap();
            table.exit_scope();
            scopes.push(scope);
            parent = scope;
        }

        let deepest = *scopes.last().unwrap();
        for level in 0..depth {
            prop_assert_eq!(table.lookup_from(deepest, &format!("field{level}")), Some(fake_node(level as u32 + 1)));
        }
        prop_assert_eq!(table.lookup_from(deepest, "nonexistent"), None);
    }
}
