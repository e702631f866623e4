use crate::*;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

pub const MIN_CANDIDATE_AGE: u8 = 25;

/// Election lifecycle status
///
/// The stored status is a cache derived from the time bounds. It is refreshed
/// via [`Election::reconcile_status`] and never trusted for window checks;
/// those always go through [`Election::effective_status`].
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElectionStatus {
    Upcoming,
    Live,
    Ended,
}

impl std::fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ElectionStatus::Upcoming => "UPCOMING",
            ElectionStatus::Live => "LIVE",
            ElectionStatus::Ended => "ENDED",
        };
        write!(f, "{}", name)
    }
}

/// A candidate standing in exactly one election
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub party: String,
    pub symbol: String,
    pub age: u8,
    pub vote_count: u64,
}

impl Candidate {
    pub fn new(name: &str, party: &str, symbol: &str, age: u8) -> Self {
        Candidate {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            party: party.to_owned(),
            symbol: symbol.to_owned(),
            age,
            vote_count: 0,
        }
    }
}

/// A constituency-scoped election
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Election {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub constituency: String,
    pub status: ElectionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    /// Candidates in ballot order
    pub candidates: IndexMap<Uuid, Candidate>,
}

impl Election {
    pub fn new(
        title: &str,
        description: &str,
        constituency: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let mut election = Election {
            id: Uuid::new_v4(),
            title: title.to_owned(),
            description: description.to_owned(),
            constituency: constituency.to_owned(),
            status: ElectionStatus::Upcoming,
            start_time,
            end_time,
            candidates: IndexMap::new(),
        };
        election.reconcile_status(Utc::now());
        election
    }

    /// Attach a candidate, preserving ballot order
    pub fn add_candidate(&mut self, candidate: Candidate) -> Result<(), Error> {
        if candidate.age < MIN_CANDIDATE_AGE {
            return Err(Error::CandidateUnderage(MIN_CANDIDATE_AGE));
        }
        self.candidates.insert(candidate.id, candidate);
        Ok(())
    }

    /// Get a candidate with the given ID
    pub fn get_candidate(&self, candidate_id: Uuid) -> Option<&Candidate> {
        self.candidates.get(&candidate_id)
    }

    /// The status derived from the time bounds alone
    pub fn effective_status(&self, now: DateTime<Utc>) -> ElectionStatus {
        if now < self.start_time {
            ElectionStatus::Upcoming
        } else if now <= self.end_time {
            ElectionStatus::Live
        } else {
            ElectionStatus::Ended
        }
    }

    /// Refresh the cached status from the time bounds
    pub fn reconcile_status(&mut self, now: DateTime<Utc>) {
        self.status = self.effective_status(now);
    }

    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == ElectionStatus::Live
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use chrono::Duration;

    fn live_election() -> Election {
        let now = Utc::now();
        Election::new(
            "General Election",
            "Lower house",
            "North Ward",
            now - Duration::hours(1),
            now + Duration::hours(1),
        )
    }

    #[test]
    fn test_status_from_time_bounds() {
        let election = live_election();

        let before = election.start_time - Duration::minutes(1);
        let during = election.start_time + Duration::minutes(1);
        let after = election.end_time + Duration::minutes(1);

        assert_eq!(election.effective_status(before), ElectionStatus::Upcoming);
        assert_eq!(election.effective_status(during), ElectionStatus::Live);
        assert_eq!(election.effective_status(after), ElectionStatus::Ended);

        // The window is inclusive of its end instant
        assert_eq!(
            election.effective_status(election.end_time),
            ElectionStatus::Live
        );

        assert!(election.is_open_at(during));
        assert!(!election.is_open_at(after));
    }

    #[test]
    fn test_reconcile_overrides_stale_cache() {
        let mut election = live_election();

        // A stale cached status must never survive reconciliation
        election.status = ElectionStatus::Upcoming;
        election.reconcile_status(Utc::now());
        assert_eq!(election.status, ElectionStatus::Live);
    }

    #[test]
    fn test_underage_candidate_rejected() {
        let mut election = live_election();

        let underage = Candidate::new("Too Young", "Youth Party", "sapling", 24);
        assert!(matches!(
            election.add_candidate(underage),
            Err(Error::CandidateUnderage(_))
        ));

        let of_age = Candidate::new("Old Enough", "Silver Party", "oak", 25);
        election.add_candidate(of_age).unwrap();
        assert_eq!(election.candidates.len(), 1);
    }

    #[test]
    fn test_candidates_keep_ballot_order() {
        let mut election = live_election();
        let names = ["Alpha", "Beta", "Gamma"];

        for name in &names {
            election
                .add_candidate(Candidate::new(name, "Party", "symbol", 40))
                .unwrap();
        }

        let listed: Vec<&str> = election
            .candidates
            .values()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(listed, names);
    }
}
