//! Snapshot of `Type::Proc`'s `Display` rendering with mixed parameter modes
//! (spec §4.4.2): locks down the `VAR`/`CONST` prefix placement together
//! rather than one assertion per mode.

use oberonc_ast::nodes::{BaseTypeKind, ParamMode};
use oberonc_sema::types::Type;

#[test]
fn proc_type_display_shows_var_and_const_prefixes() {
    let ty = Type::Proc {
        params: vec![Type::Base(BaseTypeKind::Integer), Type::Base(BaseTypeKind::Real), Type::Base(BaseTypeKind::Boolean)],
        param_modes: vec![ParamMode::Value, ParamMode::ByRef, ParamMode::ByConstRef],
        return_type: Some(Box::new(Type::Base(BaseTypeKind::Integer))),
    };

    insta::assert_snapshot!(ty.to_string(), @"PROCEDURE(INTEGER, VAR REAL, CONST BOOLEAN): INTEGER");
}
