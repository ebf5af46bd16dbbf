use serde::{Deserialize, Serialize};

/// A user's standing reaction on an entity (spot or review). Stored as a
/// nullable boolean - true is a like, false a dislike, absent row means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionState {
    #[default]
    Unset,
    Liked,
    Disliked,
}

impl ReactionState {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => ReactionState::Liked,
            Some(false) => ReactionState::Disliked,
            None => ReactionState::Unset,
        }
    }

    pub fn as_flag(self) -> Option<bool> {
        match self {
            ReactionState::Liked => Some(true),
            ReactionState::Disliked => Some(false),
            ReactionState::Unset => None,
        }
    }
}

/// The requested action - a click on either thumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn from_is_liked(is_liked: bool) -> Self {
        if is_liked {
            Reaction::Like
        } else {
            Reaction::Dislike
        }
    }

    fn state(self) -> ReactionState {
        match self {
            Reaction::Like => ReactionState::Liked,
            Reaction::Dislike => ReactionState::Disliked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counts {
    pub likes: i64,
    pub dislikes: i64,
}

impl Counts {
    pub fn new(likes: i64, dislikes: i64) -> Self {
        Counts { likes, dislikes }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    pub state: ReactionState,
    pub counts: Counts,
}

/// Next state after a click: repeating the current reaction toggles it off,
/// anything else adopts the requested reaction.
pub fn next_state(existing: ReactionState, requested: Reaction) -> ReactionState {
    if existing == requested.state() {
        ReactionState::Unset
    } else {
        requested.state()
    }
}

/// Computes the state transition together with the counter deltas. Total over
/// all three states and both requests; counters are floored at zero even
/// though correct call sequencing never drives them negative.
pub fn reconcile(existing: ReactionState, requested: Reaction, counts: Counts) -> Reconciled {
    let state = next_state(existing, requested);
    let mut counts = counts;
    match existing {
        ReactionState::Liked => counts.likes = dec(counts.likes),
        ReactionState::Disliked => counts.dislikes = dec(counts.dislikes),
        ReactionState::Unset => {}
    }
    match state {
        ReactionState::Liked => counts.likes += 1,
        ReactionState::Disliked => counts.dislikes += 1,
        ReactionState::Unset => {}
    }
    Reconciled { state, counts }
}

fn dec(count: i64) -> i64 {
    (count - 1).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use ReactionState::{Disliked, Liked, Unset};

    #[test]
    fn test_all_six_transitions() {
        let counts = Counts::new(3, 3);
        let cases = [
            (Unset, Reaction::Like, Liked, Counts::new(4, 3)),
            (Unset, Reaction::Dislike, Disliked, Counts::new(3, 4)),
            (Liked, Reaction::Like, Unset, Counts::new(2, 3)),
            (Liked, Reaction::Dislike, Disliked, Counts::new(2, 4)),
            (Disliked, Reaction::Dislike, Unset, Counts::new(3, 2)),
            (Disliked, Reaction::Like, Liked, Counts::new(4, 2)),
        ];
        for (existing, requested, state, expected) in cases {
            let result = reconcile(existing, requested, counts);
            assert_eq!(result.state, state, "{existing:?} + {requested:?}");
            assert_eq!(result.counts, expected, "{existing:?} + {requested:?}");
        }
    }

    #[test]
    fn test_toggle_on_then_off_nets_to_zero() {
        let counts = Counts::new(0, 0);
        let liked = reconcile(Unset, Reaction::Like, counts);
        assert_eq!(liked.state, Liked);
        assert_eq!(liked.counts, Counts::new(1, 0));

        let unset = reconcile(liked.state, Reaction::Like, liked.counts);
        assert_eq!(unset.state, Unset);
        assert_eq!(unset.counts, counts);
    }

    #[test]
    fn test_switch_preserves_total() {
        // liked review with 5 likes and 2 dislikes, user clicks dislike
        let result = reconcile(Liked, Reaction::Dislike, Counts::new(5, 2));
        assert_eq!(result.state, Disliked);
        assert_eq!(result.counts, Counts::new(4, 3));
        assert_eq!(
            result.counts.likes + result.counts.dislikes,
            5 + 2,
            "a switch moves one interaction, it never creates or drops one"
        );
    }

    #[test]
    fn test_counters_floor_at_zero() {
        // stale zero counts must not go negative
        let result = reconcile(Liked, Reaction::Like, Counts::new(0, 0));
        assert_eq!(result.counts, Counts::new(0, 0));
        let result = reconcile(Disliked, Reaction::Like, Counts::new(0, 0));
        assert_eq!(result.counts, Counts::new(1, 0));
    }

    #[test]
    fn test_flag_round_trip() {
        for state in [Unset, Liked, Disliked] {
            assert_eq!(ReactionState::from_flag(state.as_flag()), state);
        }
        assert_eq!(Reaction::from_is_liked(true), Reaction::Like);
        assert_eq!(Reaction::from_is_liked(false), Reaction::Dislike);
    }
}
