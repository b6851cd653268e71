//! Property-based tests for formula generation and parsing.
//!
//! A generated formula must parse back into the data it was generated from,
//! and generating again must reproduce the same text, whatever the free-text
//! fields contain.

use proptest::prelude::*;
use ranked_searcher_homebrew::{BinaryInfo, FormulaData, FormulaGenerator, parse_formula};
use ranked_searcher_release::Target;
use std::collections::BTreeMap;

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Free text mixing quotes, backslashes, interpolation markers and line breaks.
fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        proptest::collection::vec(
            proptest::sample::select(vec![
                "a", " ", "\"", "\\", "#", "{", "}", "#{", "\n", "\r", "\t", "end", "do",
            ]),
            0..24,
        )
        .prop_map(|parts| parts.concat()),
    ]
}

fn formula(desc: String, license: Option<String>, test_args: Vec<String>) -> FormulaData {
    let mut binaries = BTreeMap::new();
    binaries.insert(
        Target::LinuxIntel,
        BinaryInfo {
            url: "https://example.com/ranked-searcher-0.0.2-linux-x86_64.tar.gz".to_string(),
            sha256: "c".repeat(64),
        },
    );
    FormulaData {
        class_name: "RankedSearcher".to_string(),
        desc,
        homepage: "https://example.com".to_string(),
        version: "0.0.2".to_string(),
        license,
        binary_name: "ranked-searcher".to_string(),
        test_args,
        binaries,
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn generated_formula_parses_back(
        desc in text_strategy(),
        license in proptest::option::of(text_strategy()),
        test_args in proptest::collection::vec(text_strategy(), 0..3),
    ) {
        let data = formula(desc, license, test_args);
        let generated = FormulaGenerator::generate(&data);

        let parsed = parse_formula(&generated);
        prop_assert!(parsed.is_ok(), "failed to parse:\n{generated}");
        let parsed = parsed.unwrap();
        prop_assert_eq!(&parsed, &data);
        prop_assert_eq!(FormulaGenerator::generate(&parsed), generated);
    }
}
