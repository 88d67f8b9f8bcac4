//! Scope propagation over expression trees

use crate::parser::ast::{ArgBinding, Expr};
use crate::semantic::scope::ScopeId;

/// Rewrite the `scope` of every variable and address-of leaf under `expr`.
///
/// Descends through every composite variant, including call arguments and
/// their bindings. Applying it twice with the same scope changes nothing.
pub fn propagate_scope(expr: &mut Expr, scope: &ScopeId) {
    match expr {
        Expr::Variable { scope: leaf, .. } | Expr::Address { scope: leaf, .. } => {
            if leaf != scope {
                *leaf = scope.clone();
            }
        }
        Expr::MemberAccess { object, .. } => propagate_scope(object, scope),
        Expr::ArrayAccess { array, index } => {
            propagate_scope(array, scope);
            propagate_scope(index, scope);
        }
        Expr::Comparison { left, right, .. } | Expr::Binary { left, right, .. } => {
            propagate_scope(left, scope);
            propagate_scope(right, scope);
        }
        Expr::FunctionCall {
            args,
            arg_param_map,
            ..
        } => {
            propagate_all(args, scope);
            propagate_bindings(arg_param_map, scope);
        }
        Expr::MethodCall {
            object,
            args,
            arg_param_map,
            ..
        } => {
            propagate_scope(object, scope);
            propagate_all(args, scope);
            propagate_bindings(arg_param_map, scope);
        }
        Expr::NewObject {
            constructor_args,
            arg_param_map,
            ..
        } => {
            propagate_all(constructor_args, scope);
            propagate_bindings(arg_param_map, scope);
        }
        Expr::Number { .. }
        | Expr::Str { .. }
        | Expr::Char { .. }
        | Expr::Nullptr
        | Expr::NewArray { .. } => {}
    }
}

pub fn propagate_all(exprs: &mut [Expr], scope: &ScopeId) {
    for expr in exprs {
        propagate_scope(expr, scope);
    }
}

pub fn propagate_bindings(bindings: &mut [ArgBinding], scope: &ScopeId) {
    for binding in bindings {
        propagate_scope(&mut binding.arg_value, scope);
    }
}

/// Every variable leaf under `expr`, in traversal order.
pub fn variable_leaves(expr: &Expr) -> Vec<&Expr> {
    let mut leaves = Vec::new();
    collect_leaves(expr, &mut leaves);
    leaves
}

fn collect_leaves<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Variable { .. } | Expr::Address { .. } => out.push(expr),
        Expr::MemberAccess { object, .. } => collect_leaves(object, out),
        Expr::ArrayAccess { array, index } => {
            collect_leaves(array, out);
            collect_leaves(index, out);
        }
        Expr::Comparison { left, right, .. } | Expr::Binary { left, right, .. } => {
            collect_leaves(left, out);
            collect_leaves(right, out);
        }
        Expr::FunctionCall {
            args,
            arg_param_map,
            ..
        }
        | Expr::NewObject {
            constructor_args: args,
            arg_param_map,
            ..
        } => {
            args.iter().for_each(|a| collect_leaves(a, out));
            arg_param_map
                .iter()
                .for_each(|b| collect_leaves(&b.arg_value, out));
        }
        Expr::MethodCall {
            object,
            args,
            arg_param_map,
            ..
        } => {
            collect_leaves(object, out);
            args.iter().for_each(|a| collect_leaves(a, out));
            arg_param_map
                .iter()
                .for_each(|b| collect_leaves(&b.arg_value, out));
        }
        Expr::Number { .. }
        | Expr::Str { .. }
        | Expr::Char { .. }
        | Expr::Nullptr
        | Expr::NewArray { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{AccessOperator, ComparisonOp, Number};

    fn var(name: &str) -> Expr {
        Expr::Variable {
            name: name.to_string(),
            scope: ScopeId::Global,
            class_type: None,
        }
    }

    fn scope_of(expr: &Expr) -> &ScopeId {
        match expr {
            Expr::Variable { scope, .. } | Expr::Address { scope, .. } => scope,
            other => panic!("not a leaf: {:?}", other),
        }
    }

    #[test]
    fn test_reaches_deeply_nested_leaves() {
        // obj.check(a < b.c[i]) with a binding for the argument
        let cond = Expr::Comparison {
            left: Box::new(var("a")),
            operator: ComparisonOp::Lt,
            right: Box::new(Expr::ArrayAccess {
                array: Box::new(Expr::MemberAccess {
                    object: Box::new(var("b")),
                    member: "c".to_string(),
                    operator: AccessOperator::Dot,
                }),
                index: Box::new(var("i")),
            }),
        };
        let mut call = Expr::MethodCall {
            object: Box::new(var("obj")),
            method: "check".to_string(),
            operator: AccessOperator::Dot,
            args: vec![cond.clone()],
            arg_param_map: vec![ArgBinding {
                param_name: "ok".to_string(),
                arg_value: cond,
            }],
        };

        let scope = ScopeId::WhileBody;
        propagate_scope(&mut call, &scope);

        let leaves = variable_leaves(&call);
        assert_eq!(leaves.len(), 7);
        assert!(leaves.iter().all(|leaf| scope_of(leaf) == &scope));
    }

    #[test]
    fn test_idempotent() {
        let mut expr = Expr::Binary {
            left: Box::new(var("x")),
            operator: crate::parser::ast::ArithmeticOp::Add,
            right: Box::new(Expr::Number {
                value: Number::Int(1),
            }),
        };
        let scope = ScopeId::main();

        propagate_scope(&mut expr, &scope);
        let once = expr.clone();
        propagate_scope(&mut expr, &scope);

        assert_eq!(expr, once);
    }

    #[test]
    fn test_literals_untouched() {
        let mut expr = Expr::NewArray {
            data_type: "int".to_string(),
            size: 4,
        };
        let before = expr.clone();
        propagate_scope(&mut expr, &ScopeId::IfBody);
        assert_eq!(expr, before);
    }
}
