//! Proptest generators for property-based testing.

use proptest::prelude::*;

/// A name accepted by `validate_name`, possibly padded with spaces.
pub fn valid_name() -> impl Strategy<Value = String> {
    "[A-Za-zÀ-ÿ][A-Za-zÀ-ÿ' -]{0,20}[A-Za-zÀ-ÿ]".prop_flat_map(|core| {
        (Just(core), " {0,2}", " {0,2}").prop_map(|(core, pre, post)| format!("{pre}{core}{post}"))
    })
}

/// A name rejected by `validate_name`.
pub fn invalid_name() -> impl Strategy<Value = String> {
    prop_oneof![
        // Too short.
        "[A-Za-z]?",
        // Disallowed character somewhere.
        "[A-Za-z]{1,8}[0-9_@!.,;:?]{1,3}[A-Za-z]{0,8}",
        // Only whitespace.
        " {0,5}",
    ]
}

/// One submission: a name and an index into the session list.
#[derive(Debug, Clone)]
pub struct Submission {
    pub name: String,
    pub session: usize,
}

/// Sequences of submissions over `sessions` sessions, drawn from a small
/// name pool so duplicates are common.
pub fn submissions(
    sessions: usize,
    max_len: usize,
) -> impl Strategy<Value = Vec<Submission>> {
    let pool = prop::sample::select(vec![
        "Ann", "ann", "Bob", "Cid", "Dee", "Eve", "Fay", "Gus", "Hal", "Ivy", "Jo", "Kim",
        "Lou", "Max", "Ned", "Oda",
    ]);
    prop::collection::vec(
        (pool, 0..sessions.max(1)).prop_map(|(name, session)| Submission {
            name: name.to_string(),
            session,
        }),
        0..=max_len,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::validate_name;

    proptest! {
        #[test]
        fn test_valid_names_validate(name in valid_name()) {
            prop_assert!(validate_name(&name).is_ok(), "{:?}", name);
        }

        #[test]
        fn test_invalid_names_rejected(name in invalid_name()) {
            prop_assert!(validate_name(&name).is_err(), "{:?}", name);
        }
    }
}
