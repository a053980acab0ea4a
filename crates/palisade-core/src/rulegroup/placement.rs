// ── Placement validation ──
//
// Pure computation over the scope's actual rule ordering: does the owned
// group still sit where its positional contract demands? The reconciler
// maps the outcome to recovery actions (accept drift, truncate, recreate,
// or surface a positional error); nothing here touches the device.

use crate::rulegroup::position::MoveKeyword;

/// Outcome of checking an actual rule ordering against a group's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Group contiguous and the keyword predicate holds.
    Satisfied,
    /// Group contiguous but the keyword predicate fails; the recorded
    /// keyword downgrades to none rather than forcing a rewrite.
    Drifted,
    /// A relative keyword was requested and the anchor rule is gone.
    AnchorMissing,
    /// The first owned rule is absent; the group no longer exists.
    GroupMissing,
    /// Contiguity broke after `observed` rules; the rest were lost or a
    /// foreign rule interleaved.
    Truncated { observed: usize },
}

/// Evaluate the positional contract of `desired` against `actual`.
pub fn evaluate(
    actual: &[String],
    desired: &[String],
    keyword: MoveKeyword,
    anchor: Option<&str>,
) -> Placement {
    let Some(first) = desired.first() else {
        return Placement::GroupMissing;
    };
    let Some(f_idx) = actual.iter().position(|n| n == first) else {
        return Placement::GroupMissing;
    };

    let o_idx = if keyword.is_relative() {
        let anchor = anchor.unwrap_or("");
        match actual.iter().position(|n| n == anchor) {
            Some(idx) => Some(idx),
            None => return Placement::AnchorMissing,
        }
    } else {
        None
    };

    let mut observed = 0;
    for (i, name) in desired.iter().enumerate() {
        if actual.get(f_idx + i) == Some(name) {
            observed += 1;
        } else {
            break;
        }
    }
    if observed < desired.len() {
        return Placement::Truncated { observed };
    }

    let n = desired.len();
    let satisfied = match keyword {
        MoveKeyword::None => true,
        MoveKeyword::Top => f_idx == 0,
        MoveKeyword::Bottom => f_idx + n == actual.len(),
        MoveKeyword::Before => o_idx.is_some_and(|o| o > f_idx + n - 1),
        MoveKeyword::After => o_idx.is_some_and(|o| o < f_idx),
        MoveKeyword::DirectlyBefore => o_idx.is_some_and(|o| o == f_idx + n),
        MoveKeyword::DirectlyAfter => o_idx.is_some_and(|o| f_idx > 0 && o == f_idx - 1),
    };

    if satisfied {
        Placement::Satisfied
    } else {
        Placement::Drifted
    }
}
