//! Parameter search combinations
//!
//! A learner may declare several parameter value sets; tuning evaluates
//! the full cross product of those sets (and of any searched round
//! counts).

use cognate_ldsl_ast::{ParameterSet, Rounds};
use serde::{Deserialize, Serialize};

/// One concrete point in the parameter search space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterAssignment {
    /// Parameter name → chosen value, in declaration order
    pub values: Vec<(String, String)>,
    /// Round count this assignment is evaluated with
    pub rounds: u32,
}

/// Cross product of all parameter sets, in odometer order.
///
/// An empty set list yields the single empty assignment; a set with no
/// values yields nothing.
pub fn combinations(sets: &[ParameterSet]) -> Vec<Vec<(String, String)>> {
    if sets.iter().any(|s| s.values.is_empty()) {
        return Vec::new();
    }

    let lengths: Vec<usize> = sets.iter().map(|s| s.values.len()).collect();
    let mut indices = vec![0usize; sets.len()];
    let mut out = Vec::new();

    loop {
        out.push(
            sets.iter()
                .zip(&indices)
                .map(|(s, &i)| (s.parameter.clone(), s.values[i].clone()))
                .collect(),
        );
        if !increment(&mut indices, &lengths) {
            break;
        }
    }

    out
}

/// Round counts to evaluate during a search
pub fn round_candidates(rounds: &Option<Rounds>) -> Vec<u32> {
    match rounds {
        Some(Rounds::Fixed(n)) => vec![*n],
        Some(Rounds::Search(set)) => {
            let mut sorted = set.clone();
            sorted.sort_unstable();
            sorted
        }
        None => vec![1],
    }
}

/// Odometer increment over `indices`, bounded per position by `maxes`.
/// Returns false once every combination has been produced.
fn increment(indices: &mut [usize], maxes: &[usize]) -> bool {
    let mut i = 0;
    while i < indices.len() {
        indices[i] += 1;
        if indices[i] == maxes[i] {
            indices[i] = 0;
            i += 1;
        } else {
            return true;
        }
    }
    false
}
