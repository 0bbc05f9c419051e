//! Best-match selection among probed candidates.

use crate::domain::entities::ProbedCandidate;

/// Winner of a bill, or the explicit absence of one.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Winner(ProbedCandidate),
    NoMatch,
}

/// Picks the candidate with the highest engagement, then the highest
/// similarity. Candidates below `engagement_floor` are never eligible.
///
/// On a full tie the earlier candidate (provider order, newest first) wins.
pub fn select_best(candidates: Vec<ProbedCandidate>, engagement_floor: u32) -> Selection {
    let mut best: Option<ProbedCandidate> = None;

    for candidate in candidates
        .into_iter()
        .filter(|c| c.engagement >= engagement_floor)
    {
        let replace = match &best {
            None => true,
            Some(current) => {
                candidate.engagement > current.engagement
                    || (candidate.engagement == current.engagement
                        && candidate.similarity > current.similarity)
            }
        };
        if replace {
            best = Some(candidate);
        }
    }

    best.map_or(Selection::NoMatch, Selection::Winner)
}
