//! Revision statuses
//!
//! Every declaration is classified on a three-point lattice. Within a run a
//! status only ever moves up the order, never down.

use std::fmt;
use std::fmt::Write as _;

use cognate_ldsl_ast::{CountPolicy, Name};
use indexmap::IndexMap;

/// Per-declaration revision classification
///
/// Total order `Unaffected < Affected < Revised`; propagation joins with
/// the maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum RevisionStatus {
    #[default]
    Unaffected,
    Affected,
    Revised,
}

impl RevisionStatus {
    /// Monotonic join: raise to `other` if it is higher
    pub fn promote(&mut self, other: RevisionStatus) {
        if other > *self {
            *self = other;
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RevisionStatus::Unaffected => "unaffected",
            RevisionStatus::Affected => "affected",
            RevisionStatus::Revised => "revised",
        }
    }
}

impl fmt::Display for RevisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Facet-level revision state of a learner
///
/// A learner's expensive steps are separable: feature extraction, dataset
/// pruning, and the learning algorithm itself are independently revisable.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnerRevision {
    pub features: RevisionStatus,
    pub pruning: RevisionStatus,
    pub learning: RevisionStatus,
    /// Round training resumes at; greater than 1 only when the round count
    /// increased and everything else is provably unaffected
    pub starting_round: u32,
    /// Only the generated code changed; no retraining required
    pub code_only: bool,
    /// Count policy from the previous run, when the pruning facet was
    /// revised; the trainer uses it to decide whether feature counts must
    /// be recomputed
    pub previous_counts: Option<CountPolicy>,
}

impl Default for LearnerRevision {
    fn default() -> Self {
        Self {
            features: RevisionStatus::Unaffected,
            pruning: RevisionStatus::Unaffected,
            learning: RevisionStatus::Unaffected,
            starting_round: 1,
            code_only: false,
            previous_counts: None,
        }
    }
}

impl LearnerRevision {
    /// Force every facet to at least `Affected`, preserving `Revised`.
    /// Invalidates incremental round resumption.
    pub fn force_affected(&mut self) {
        self.features.promote(RevisionStatus::Affected);
        self.pruning.promote(RevisionStatus::Affected);
        self.learning.promote(RevisionStatus::Affected);
        self.starting_round = 1;
    }
}

/// Output of the revision oracle
#[derive(Debug, Default)]
pub struct RevisionReport {
    statuses: IndexMap<Name, RevisionStatus>,
    learners: IndexMap<Name, LearnerRevision>,
    /// True iff no specification changed since the compiler was last run;
    /// when set, the entire compile and train pipeline can be skipped
    pub no_changes: bool,
}

impl RevisionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, name: &Name) -> RevisionStatus {
        self.statuses.get(name).copied().unwrap_or_default()
    }

    pub fn has_status(&self, name: &Name) -> bool {
        self.statuses.contains_key(name)
    }

    pub fn set_status(&mut self, name: &Name, status: RevisionStatus) {
        self.statuses.insert(name.clone(), status);
    }

    pub fn statuses(&self) -> impl Iterator<Item = (&Name, RevisionStatus)> {
        self.statuses.iter().map(|(n, s)| (n, *s))
    }

    pub fn learner(&self, name: &Name) -> Option<&LearnerRevision> {
        self.learners.get(name)
    }

    pub fn learner_mut(&mut self, name: &Name) -> &mut LearnerRevision {
        self.learners.entry(name.clone()).or_default()
    }

    /// Diagnostic dump for `--revision-status`
    pub fn format(&self) -> String {
        let mut out = String::new();
        for (name, status) in &self.statuses {
            let _ = writeln!(out, "{name}: {status}");
            if let Some(facets) = self.learners.get(name) {
                let _ = writeln!(out, "  features: {}", facets.features);
                let _ = writeln!(out, "  pruning: {}", facets.pruning);
                let _ = writeln!(out, "  learning: {}", facets.learning);
                let _ = writeln!(out, "  starting round: {}", facets.starting_round);
                let _ = writeln!(out, "  only code generation: {}", facets.code_only);
            }
        }
        if self.no_changes {
            let _ = writeln!(out, "no changes since last run");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_order() {
        assert!(RevisionStatus::Unaffected < RevisionStatus::Affected);
        assert!(RevisionStatus::Affected < RevisionStatus::Revised);
    }

    #[test]
    fn test_promote_is_monotonic() {
        let mut status = RevisionStatus::Affected;
        status.promote(RevisionStatus::Unaffected);
        assert_eq!(status, RevisionStatus::Affected);
        status.promote(RevisionStatus::Revised);
        assert_eq!(status, RevisionStatus::Revised);
        status.promote(RevisionStatus::Affected);
        assert_eq!(status, RevisionStatus::Revised);
    }

    #[test]
    fn test_force_affected_preserves_revised() {
        let mut facets = LearnerRevision {
            learning: RevisionStatus::Revised,
            starting_round: 4,
            ..Default::default()
        };
        facets.force_affected();
        assert_eq!(facets.features, RevisionStatus::Affected);
        assert_eq!(facets.pruning, RevisionStatus::Affected);
        assert_eq!(facets.learning, RevisionStatus::Revised);
        assert_eq!(facets.starting_round, 1);
    }

    #[test]
    fn test_report_format_includes_facets() {
        let mut report = RevisionReport::new();
        let name = Name::from("tagger");
        report.set_status(&name, RevisionStatus::Affected);
        report.learner_mut(&name).learning = RevisionStatus::Revised;

        let dump = report.format();
        assert!(dump.contains("tagger: affected"));
        assert!(dump.contains("  learning: revised"));
    }
}
