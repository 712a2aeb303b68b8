//! Evaluation of the seven attribute test operators.

use crate::ast::AttrTest;

/// Tests an attribute value against an expected literal. `actual` is `None`
/// when the candidate has no such attribute: that fails every test except
/// `!=`, which it passes.
pub fn matches(op: AttrTest, actual: Option<&str>, expected: &str) -> bool {
    if op == AttrTest::NotEqual {
        return actual != Some(expected);
    }
    let Some(value) = actual else {
        return false;
    };
    match op {
        AttrTest::Exact => value == expected,
        AttrTest::PrefixMatch => value.starts_with(expected),
        AttrTest::SuffixMatch => value.ends_with(expected),
        AttrTest::Contains => value.contains(expected),
        AttrTest::DashMatch => value
            .strip_prefix(expected)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('-')),
        AttrTest::WordMatch => value.split_whitespace().any(|word| word == expected),
        AttrTest::NotEqual => unreachable!("handled above"),
    }
}
