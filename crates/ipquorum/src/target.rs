use {
    derive_more::{Debug, Display},
    std::{num::NonZeroUsize, str::FromStr},
    strum_macros::EnumIs,
};

/// How many successful answers a race waits for.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, EnumIs)]
pub enum ConfidenceTarget {
    /// Stop once this many successes arrived. Capped by the catalog size.
    #[display("{_0}")]
    Exactly(NonZeroUsize),
    /// Wait for every probe to finish.
    #[display("all")]
    All,
}

#[derive(Clone, PartialEq, Eq, Debug, Display)]
#[display("confidence must be a positive number or \"all\", got: {_0:?}")]
pub struct ConfidenceTargetError(String);

impl std::error::Error for ConfidenceTargetError {}

impl ConfidenceTarget {
    /// Returns `Exactly(n)` or `None` if `n` is zero.
    pub fn exactly(n: usize) -> Option<Self> {
        NonZeroUsize::new(n).map(Self::Exactly)
    }

    /// The number of successes the race can actually wait for
    /// against a catalog of `catalog_size` endpoints.
    pub fn effective(&self, catalog_size: usize) -> usize {
        match self {
            Self::Exactly(k) => k.get().min(catalog_size),
            Self::All => catalog_size,
        }
    }
}

impl FromStr for ConfidenceTarget {
    type Err = ConfidenceTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        s.parse::<NonZeroUsize>()
            .map(Self::Exactly)
            .map_err(|_| ConfidenceTargetError(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!("all".parse::<ConfidenceTarget>(), Ok(ConfidenceTarget::All));
        assert_eq!(" ALL ".parse::<ConfidenceTarget>(), Ok(ConfidenceTarget::All));
        assert_eq!("3".parse::<ConfidenceTarget>(), Ok(ConfidenceTarget::exactly(3).unwrap()));

        for bad in ["0", "-1", "", "many", "2.5"] {
            assert!(bad.parse::<ConfidenceTarget>().is_err(), "{bad:?} must be rejected");
        }
    }

    #[test]
    fn display_round_trips() {
        for target in [ConfidenceTarget::All, ConfidenceTarget::exactly(7).unwrap()] {
            assert_eq!(target.to_string().parse::<ConfidenceTarget>(), Ok(target));
        }
    }

    #[test]
    fn effective_is_capped_by_catalog() {
        assert_eq!(ConfidenceTarget::exactly(3).unwrap().effective(10), 3);
        assert_eq!(ConfidenceTarget::exactly(30).unwrap().effective(10), 10);
        assert_eq!(ConfidenceTarget::All.effective(10), 10);
    }
}
