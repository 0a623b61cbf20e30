//! Fold-versus-defer behavior across every operator.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tessera_core::refs::{derive_binary, derive_concat, derive_unary};
use tessera_core::{BinaryOp, Leaf, RefCore, RuntimeSource, UnaryOp};

const ALL_BINARY: [BinaryOp; 12] = [
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
    BinaryOp::Eq,
    BinaryOp::Ne,
    BinaryOp::Gt,
    BinaryOp::Ge,
    BinaryOp::Lt,
    BinaryOp::Le,
    BinaryOp::And,
    BinaryOp::Or,
];

fn known(name: &str, v: Value) -> RefCore {
    RefCore::known(name, v)
}

fn leaf_names(r: &RefCore) -> Vec<String> {
    r.expr()
        .expect("derived ref should be unknown")
        .leaves()
        .into_iter()
        .map(|leaf| match leaf {
            Leaf::Var(var) => format!("var:{}", var.name),
            Leaf::TaskOutput(task) => format!("task:{task}"),
        })
        .collect()
}

#[test]
fn integer_ops_fold_to_direct_evaluation() {
    let pairs = [(7_i64, 3_i64), (-7, 2), (0, 5), (i64::MAX, 1), (12, -4)];
    for (a, b) in pairs {
        let lhs = known("a", json!(a));
        let rhs = known("b", json!(b));
        let cases = [
            (BinaryOp::Add, a.checked_add(b)),
            (BinaryOp::Sub, a.checked_sub(b)),
            (BinaryOp::Mul, a.checked_mul(b)),
            (BinaryOp::Div, a.checked_div(b)),
        ];
        for (op, expected) in cases {
            let result = derive_binary(op, &lhs, &rhs);
            match expected {
                Some(v) => {
                    let r = result.unwrap();
                    assert!(r.is_known(), "{op:?} on {a}, {b}");
                    assert_eq!(r.value(), Some(&json!(v)));
                    assert_eq!(r.expression(), None);
                }
                None => assert!(result.is_err(), "{op:?} on {a}, {b} should overflow"),
            }
        }
        let comparisons = [
            (BinaryOp::Eq, a == b),
            (BinaryOp::Ne, a != b),
            (BinaryOp::Gt, a > b),
            (BinaryOp::Ge, a >= b),
            (BinaryOp::Lt, a < b),
            (BinaryOp::Le, a <= b),
        ];
        for (op, expected) in comparisons {
            let r = derive_binary(op, &lhs, &rhs).unwrap();
            assert_eq!(r.value(), Some(&json!(expected)), "{op:?} on {a}, {b}");
        }
    }
}

#[test]
fn string_and_bool_ops_fold_to_direct_evaluation() {
    let words = ["apple", "Apple", "banana", ""];
    for a in words {
        for b in words {
            let lhs = known("a", json!(a));
            let rhs = known("b", json!(b));
            assert_eq!(
                derive_binary(BinaryOp::Lt, &lhs, &rhs).unwrap().value(),
                Some(&json!(a.as_bytes() < b.as_bytes()))
            );
            assert_eq!(
                derive_binary(BinaryOp::Eq, &lhs, &rhs).unwrap().value(),
                Some(&json!(a == b))
            );
            assert_eq!(
                derive_concat(&[&lhs, &rhs]).value(),
                Some(&json!(format!("{a}{b}")))
            );
        }
        let r = known("w", json!(a));
        assert_eq!(
            derive_unary(UnaryOp::Upper, &r).unwrap().value(),
            Some(&json!(a.to_ascii_uppercase()))
        );
        assert_eq!(
            derive_unary(UnaryOp::Lower, &r).unwrap().value(),
            Some(&json!(a.to_ascii_lowercase()))
        );
    }

    for a in [true, false] {
        for b in [true, false] {
            let lhs = known("a", json!(a));
            let rhs = known("b", json!(b));
            assert_eq!(
                derive_binary(BinaryOp::And, &lhs, &rhs).unwrap().value(),
                Some(&json!(a && b))
            );
            assert_eq!(
                derive_binary(BinaryOp::Or, &lhs, &rhs).unwrap().value(),
                Some(&json!(a || b))
            );
        }
        assert_eq!(
            derive_unary(UnaryOp::Not, &known("a", json!(a))).unwrap().value(),
            Some(&json!(!a))
        );
    }
}

#[test]
fn unknown_operands_appear_once_in_order() {
    let var = RefCore::runtime("limit", RuntimeSource::Env("LIMIT".into()));
    let out = RefCore::task_output("fetch", vec!["count".into()]);
    let lit = known("k", json!(2));

    for op in ALL_BINARY {
        let both = derive_binary(op, &var, &out).unwrap();
        assert!(!both.is_known());
        assert_eq!(leaf_names(&both), vec!["var:limit", "task:fetch"], "{op:?}");

        let swapped = derive_binary(op, &out, &var).unwrap();
        assert_eq!(leaf_names(&swapped), vec!["task:fetch", "var:limit"], "{op:?}");

        let mixed = derive_binary(op, &lit, &var).unwrap();
        assert_eq!(leaf_names(&mixed), vec!["var:limit"], "{op:?}");
        let text = mixed.expression().unwrap();
        assert_eq!(text.matches("$context.limit").count(), 1, "{text}");
        let prefix = if op == BinaryOp::Div { "${ (2 " } else { "${ 2 " };
        assert!(text.starts_with(prefix), "{text}");
    }

    for op in [UnaryOp::Not, UnaryOp::Upper, UnaryOp::Lower] {
        let r = derive_unary(op, &out).unwrap();
        assert_eq!(leaf_names(&r), vec!["task:fetch"]);
    }

    let cat = derive_concat(&[&known("p", json!("n=")), &var, &known("s", json!("!")), &out]);
    assert_eq!(leaf_names(&cat), vec!["var:limit", "task:fetch"]);
    assert_eq!(
        cat.expression().unwrap(),
        "${ \"n=\" + $context.limit + \"!\" + $context.fetch.count }"
    );
}

#[test]
fn division_folds_and_defers_with_the_same_truncation() {
    let n = RefCore::runtime("n", RuntimeSource::Input("n".into()));
    for (a, b) in [(7_i64, 2_i64), (-7, 2), (7, -2), (9, 3), (1, 4)] {
        // The deferred form divides as floats, then truncates toward zero.
        let runtime = (a as f64 / b as f64).trunc() as i64;
        let folded = derive_binary(BinaryOp::Div, &known("a", json!(a)), &known("b", json!(b)))
            .unwrap();
        assert_eq!(folded.value(), Some(&json!(runtime)), "{a} / {b}");

        let deferred = derive_binary(BinaryOp::Div, &n, &known("b", json!(b))).unwrap();
        assert_eq!(
            deferred.expression().unwrap(),
            format!("${{ ($context.n / {b} | trunc) }}")
        );
    }
}

#[test]
fn unknown_stays_unknown_through_chains() {
    let var = RefCore::runtime("n", RuntimeSource::Input("n".into()));
    let one = known("one", json!(1));
    let mut r = derive_binary(BinaryOp::Add, &var, &one).unwrap();
    for _ in 0..5 {
        r = derive_binary(BinaryOp::Mul, &r, &one).unwrap();
        assert!(!r.is_known());
    }
    assert_eq!(leaf_names(&r), vec!["var:n"]);
}
