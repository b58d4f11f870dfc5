use std::fmt;
use std::time::Duration;

use super::resolved::Resolved;

/// Detailed resolution report returned by
/// [`RuleSet::resolve_detailed()`](super::ruleset::RuleSet::resolve_detailed).
///
/// Contains the results, the candidate rule numbers the index produced, the
/// rules that matched, and the wall-clock duration of the resolution.
#[derive(Debug, Clone)]
#[must_use]
pub struct ResolutionReport {
    results: Vec<Resolved>,
    candidates: Vec<usize>,
    matched: Vec<usize>,
    duration: Duration,
}

impl ResolutionReport {
    pub(crate) fn new(
        results: Vec<Resolved>,
        candidates: Vec<usize>,
        matched: Vec<usize>,
        duration: Duration,
    ) -> Self {
        Self {
            results,
            candidates,
            matched,
            duration,
        }
    }

    /// Same as [`RuleSet::resolve()`](super::ruleset::RuleSet::resolve).
    #[must_use]
    pub fn results(&self) -> &[Resolved] {
        &self.results
    }

    #[must_use]
    pub fn into_results(self) -> Vec<Resolved> {
        self.results
    }

    /// Rule numbers looked up from the element's original tags, ascending.
    #[must_use]
    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    /// Rule numbers whose condition held, in the order they ran. Rules that
    /// only ran actions are included.
    #[must_use]
    pub fn matched(&self) -> &[usize] {
        &self.matched
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

fn join(numbers: &[usize]) -> String {
    numbers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "types: [")?;
        for (i, r) in self.results.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", r.feature_type())?;
        }
        write!(f, "]")?;
        write!(f, ", candidates: [{}]", join(&self.candidates))?;
        write!(f, ", matched: [{}]", join(&self.matched))?;
        write!(f, ", duration: {:?}", self.duration)
    }
}
