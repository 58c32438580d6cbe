//! Property-based tests for the resolver and hex formatting

use constgen::{
    resolve_all, substitute_pass, ConstantRecord, ConstantsError, HexLiteral, Substitution,
};
use proptest::prelude::*;

fn symbol_stem() -> impl Strategy<Value = String> {
    "CK[AKOT]_[A-Z]{2,8}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Display and FromStr agree for every value
    #[test]
    fn hex_literal_display_parses_back(value in any::<u64>()) {
        let text = HexLiteral(value).to_string();
        prop_assert!(text.starts_with("0x"));
        prop_assert!(text.len() >= 10);
        prop_assert_eq!(text.parse::<HexLiteral>().unwrap(), HexLiteral(value));
    }

    /// Decimal literals evaluate to themselves
    #[test]
    fn decimal_literals_resolve_to_value(value in 0u64..=u32::MAX as u64) {
        let mut records = vec![ConstantRecord::new("CKA_X", format!("{value}UL"))];
        resolve_all(&mut records).unwrap();
        prop_assert_eq!(records[0].resolved_value(), Some(HexLiteral(value)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A name that is a prefix of another never corrupts the longer one
    #[test]
    fn prefix_names_resolve_independently(
        stem in symbol_stem(),
        suffix in "_[A-Z]{1,6}",
        base in 0u64..0x1000_0000,
        offset in 1u64..0x100,
    ) {
        let short = stem.clone();
        let long = format!("{stem}{suffix}");
        let mut records = vec![
            ConstantRecord::new(long.clone(), format!("({short} + {offset})")),
            ConstantRecord::new(short.clone(), format!("{base:#x}")),
            ConstantRecord::new("CKZ_USER", format!("({long} | {short})")),
        ];
        resolve_all(&mut records).unwrap();

        prop_assert_eq!(records[0].resolved_value(), Some(HexLiteral(base + offset)));
        prop_assert_eq!(records[1].resolved_value(), Some(HexLiteral(base)));
        prop_assert_eq!(
            records[2].resolved_value(),
            Some(HexLiteral((base + offset) | base))
        );
    }

    /// Mutual references fail as cycles instead of looping
    #[test]
    fn mutual_references_fail(a in symbol_stem(), b in symbol_stem()) {
        prop_assume!(!a.contains(&b) && !b.contains(&a));
        let mut records = vec![
            ConstantRecord::new(a.clone(), format!("({b} + 1)")),
            ConstantRecord::new(b.clone(), format!("({a} + 1)")),
        ];
        let result = resolve_all(&mut records);
        let is_cycle = matches!(result, Err(ConstantsError::CyclicReference { .. }));
        prop_assert!(is_cycle);
    }

    /// Without a pass limit a cycle never reaches a fixed point
    #[test]
    fn unbounded_passes_never_settle(passes in 1usize..16) {
        let table = vec![Substitution::new("B", "(A)"), Substitution::new("A", "(B)")];
        let mut value = "A".to_string();
        let mut steps = Vec::new();

        for _ in 0..passes {
            prop_assert!(substitute_pass(&mut value, &table, &mut steps));
        }
        prop_assert_eq!(steps.len(), passes * 2 - 1);
    }
}
