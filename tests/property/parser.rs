// Property tests for parser invariants:
// 1. Parse determinism: the same source always yields the same tree
// 2. No panics on arbitrary token soup
// 3. Rebalancing: precedence decides the shape of `a op b op c`

use eec::parser::ast::sexpr;
use eec::parser::parse_source;
use eec::span::FileId;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Op::Add | Op::Sub => 1,
            Op::Mul | Op::Div => 2,
        }
    }
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Add), Just(Op::Sub), Just(Op::Mul), Just(Op::Div)]
}

// Small, mostly valid programs
fn arb_program() -> impl Strategy<Value = String> {
    prop_oneof![
        (1..100u32).prop_map(|n| format!("function f{n}(x: int): int {{ return x + {n}; }}")),
        (1..100u32).prop_map(|n| format!("struct S{n} {{ value: int }}")),
        (1..100i32, 1..100i32).prop_map(|(a, b)| format!("let x = {a} + {b} * {a};")),
        (1..10u32).prop_map(|n| format!("let i = 0; while (i < {n}) {{ i += 1; }}")),
        (1..10u32).prop_map(|n| format!("enum E{n} {{ A, B = {n}, C(int) }}")),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn parse_is_deterministic(source in arb_program()) {
        let first = parse_source(FileId(0), source.as_str());
        let second = parse_source(FileId(0), source.as_str());
        prop_assert_eq!(first.is_ok(), second.is_ok());
        if let (Ok(a), Ok(b)) = (first, second) {
            let a: Vec<String> = a.iter().map(sexpr).collect();
            let b: Vec<String> = b.iter().map(sexpr).collect();
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn generated_programs_parse(source in arb_program()) {
        prop_assert!(parse_source(FileId(0), source.as_str()).is_ok(), "{}", source);
    }

    #[test]
    fn parser_does_not_panic(source in "[a-z0-9 (){}\\[\\];:=+*/.<>,!\"-]{0,48}") {
        let _ = parse_source(FileId(0), source.as_str());
    }

    #[test]
    fn higher_precedence_binds_tighter(op1 in arb_op(), op2 in arb_op()) {
        let source = format!("a {} b {} c", op1.symbol(), op2.symbol());
        let stmts = parse_source(FileId(0), source.as_str()).unwrap();
        prop_assert_eq!(stmts.len(), 1);
        let expected = if op2.precedence() > op1.precedence() {
            format!("{}(a, {}(b, c))", op1.name(), op2.name())
        } else {
            format!("{}({}(a, b), c)", op2.name(), op1.name())
        };
        prop_assert_eq!(sexpr(&stmts[0]), expected);
    }
}
