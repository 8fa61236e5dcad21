//! Version clock used to order conflicting writes of the same note.
//!
//! Two candidates are compared by `updated_at` first and `version_num` second.
//! Pin and folder changes bump only the version, so two devices that agree on
//! the content timestamp still order those writes correctly.

use std::cmp::Ordering;

/// `(updated_at, version_num)`; the derived `Ord` compares fields in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionClock {
    pub updated_at: i64,
    pub version_num: i64,
}

impl VersionClock {
    #[must_use]
    pub const fn new(updated_at: i64, version_num: i64) -> Self {
        Self {
            updated_at,
            version_num,
        }
    }
}

/// Which side of a comparison carries the newer write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

/// Pick the newer of two clocks. Exact ties go to the remote side.
#[must_use]
pub fn newer(local: VersionClock, remote: VersionClock) -> Side {
    match local.cmp(&remote) {
        Ordering::Greater => Side::Local,
        Ordering::Less | Ordering::Equal => Side::Remote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_timestamp_wins_regardless_of_version() {
        let local = VersionClock::new(200, 1);
        let remote = VersionClock::new(100, 9);
        assert_eq!(newer(local, remote), Side::Local);
    }

    #[test]
    fn version_breaks_timestamp_tie() {
        let local = VersionClock::new(100, 3);
        let remote = VersionClock::new(100, 5);
        assert_eq!(newer(local, remote), Side::Remote);
        assert_eq!(newer(remote, local), Side::Local);
    }

    #[test]
    fn exact_tie_prefers_remote() {
        let clock = VersionClock::new(100, 2);
        assert_eq!(newer(clock, clock), Side::Remote);
    }
}
