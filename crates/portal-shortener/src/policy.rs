use std::ops::RangeInclusive;

use portal_core::shortcode::MAX_LENGTH;

/// What to do when a derived code is already taken by a different URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Fail with a collision error.
    #[default]
    Reject,
    /// Retry with the code one character longer, up to `max_length`.
    ExtendLength { max_length: usize },
}

impl CollisionPolicy {
    /// Code lengths to try, in order, for a code whose default length is
    /// `default_length`.
    pub fn candidate_lengths(&self, default_length: usize) -> RangeInclusive<usize> {
        let last = match *self {
            CollisionPolicy::Reject => default_length,
            CollisionPolicy::ExtendLength { max_length } => {
                max_length.clamp(default_length, MAX_LENGTH.max(default_length))
            }
        };
        default_length..=last
    }
}
