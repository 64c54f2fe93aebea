// Property tests for generic specialization: one emitted body per distinct
// argument list, named densely from zero.

use eec::config::CompilationSettings;
use eec::diagnostics::CollectingSink;
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Literal {
    Int,
    Float,
    Str,
}

impl Literal {
    fn text(self, n: usize) -> String {
        match self {
            Literal::Int => n.to_string(),
            Literal::Float => format!("{n}.5"),
            Literal::Str => format!("\"s{n}\""),
        }
    }
}

fn arb_literal() -> impl Strategy<Value = Literal> {
    prop_oneof![Just(Literal::Int), Just(Literal::Float), Just(Literal::Str)]
}

fn program(calls: &[Literal]) -> String {
    let mut source = String::from("function id<T>(x: T): T { return x; }");
    for (i, lit) in calls.iter().enumerate() {
        source += &format!(" let v{i} = id({});", lit.text(i));
    }
    source
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn one_specialization_per_distinct_type(calls in prop::collection::vec(arb_literal(), 1..8)) {
        let mut sink = CollectingSink::default();
        let js = eec::compile_source(&program(&calls), &CompilationSettings::default(), &mut sink).unwrap();
        let distinct: HashSet<Literal> = calls.iter().copied().collect();
        prop_assert_eq!(js.matches("function generic_").count(), distinct.len());
        for n in 0..distinct.len() {
            let declared = format!("function generic_{n}_id(x)");
            prop_assert!(js.contains(&declared), "{}", js);
        }
        prop_assert!(sink.errors.is_empty());
    }

    #[test]
    fn first_use_gets_the_first_name(calls in prop::collection::vec(arb_literal(), 1..8)) {
        let mut sink = CollectingSink::default();
        let js = eec::compile_source(&program(&calls), &CompilationSettings::default(), &mut sink).unwrap();
        let first_call = format!("let v0 = generic_0_id({})", calls[0].text(0));
        prop_assert!(js.contains(&first_call), "{}", js);
    }
}
