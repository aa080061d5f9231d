use super::common::load_cases;
use schemata::Target;
use schemata::fragment::{Fragment, and_merge, or_merge};
use serde_json::Value;

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum Op {
    And,
    Or,
}

#[derive(Debug, serde::Deserialize)]
struct MergeCase {
    name: String,
    op: Op,
    #[serde(default)]
    target: Target,
    fragments: Vec<Value>,
    expected: Value,
}

#[test]
fn merge_suite() {
    let cases: Vec<MergeCase> = load_cases("merge.yaml");
    assert!(!cases.is_empty());

    let mut failed = Vec::new();
    for case in &cases {
        let fragments = case.fragments.iter().cloned().map(Fragment::from_value);
        let merged = match case.op {
            Op::And => and_merge(fragments, case.target),
            Op::Or => or_merge(fragments, case.target),
        };
        let actual = merged.to_value().unwrap_or(Value::Null);
        if actual != case.expected {
            failed.push(format!(
                "{} ({:?}, {:?}): expected {}, got {}",
                case.name, case.op, case.target, case.expected, actual
            ));
        }
    }

    eprintln!("merge: {} passed, {} failed", cases.len() - failed.len(), failed.len());
    assert!(failed.is_empty(), "merge cases failed:\n{}", failed.join("\n"));
}

#[test]
fn rendered_merges_read_back_unchanged() {
    let cases: Vec<MergeCase> = load_cases("merge.yaml");
    for case in cases.into_iter().filter(|c| c.expected.is_object()) {
        let fragment = Fragment::from_value(case.expected.clone());
        assert_eq!(fragment.to_value(), Some(case.expected), "{}", case.name);
    }
}
