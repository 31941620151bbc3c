//! The fourteen grouping policies and the size rules that follow from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownPolicyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    HeterogeneousTeams,
    RandomTeams,
    MixedAbilityTeams,
    SimilarAbilityTeams,
    SameSexTeams,
    MixedSexTeams,
    HighLowPairs,
    HighMediumPairs,
    RandomPairs,
    SimilarAbilityPairs,
    SameSexPairs,
    MixedSexPairs,
    RandomTwoTeams,
    BalancedTwoTeams,
}

/// Which size rules a policy's groups follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFamily {
    Teams,
    Pairs,
    TwoTeams,
}

impl Policy {
    pub const ALL: [Policy; 14] = [
        Policy::HeterogeneousTeams,
        Policy::RandomTeams,
        Policy::MixedAbilityTeams,
        Policy::SimilarAbilityTeams,
        Policy::SameSexTeams,
        Policy::MixedSexTeams,
        Policy::HighLowPairs,
        Policy::HighMediumPairs,
        Policy::RandomPairs,
        Policy::SimilarAbilityPairs,
        Policy::SameSexPairs,
        Policy::MixedSexPairs,
        Policy::RandomTwoTeams,
        Policy::BalancedTwoTeams,
    ];

    /// Tool name as used on the command line and in saved data.
    pub fn name(self) -> &'static str {
        match self {
            Policy::HeterogeneousTeams => "heterogeneous-teams",
            Policy::RandomTeams => "random-teams",
            Policy::MixedAbilityTeams => "mixed-ability-teams",
            Policy::SimilarAbilityTeams => "similar-ability-teams",
            Policy::SameSexTeams => "same-sex-teams",
            Policy::MixedSexTeams => "mixed-sex-teams",
            Policy::HighLowPairs => "high-low-pairs",
            Policy::HighMediumPairs => "high-medium-pairs",
            Policy::RandomPairs => "random-pairs",
            Policy::SimilarAbilityPairs => "similar-ability-pairs",
            Policy::SameSexPairs => "same-sex-pairs",
            Policy::MixedSexPairs => "mixed-sex-pairs",
            Policy::RandomTwoTeams => "random-two-teams",
            Policy::BalancedTwoTeams => "balanced-two-teams",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Policy::HeterogeneousTeams => "Heterogeneous Teams",
            Policy::RandomTeams => "Random Teams",
            Policy::MixedAbilityTeams => "Mixed Ability Teams",
            Policy::SimilarAbilityTeams => "Similar Ability Teams",
            Policy::SameSexTeams => "Same Sex Teams",
            Policy::MixedSexTeams => "Mixed Sex Teams",
            Policy::HighLowPairs => "High-Low Pairs",
            Policy::HighMediumPairs => "High-Medium Pairs",
            Policy::RandomPairs => "Random Pairs",
            Policy::SimilarAbilityPairs => "Similar Ability Pairs",
            Policy::SameSexPairs => "Same Sex Pairs",
            Policy::MixedSexPairs => "Mixed Sex Pairs",
            Policy::RandomTwoTeams => "Random Two Teams",
            Policy::BalancedTwoTeams => "Balanced Two Teams",
        }
    }

    pub fn family(self) -> PolicyFamily {
        match self {
            Policy::HighLowPairs
            | Policy::HighMediumPairs
            | Policy::RandomPairs
            | Policy::SimilarAbilityPairs
            | Policy::SameSexPairs
            | Policy::MixedSexPairs => PolicyFamily::Pairs,
            Policy::RandomTwoTeams | Policy::BalancedTwoTeams => PolicyFamily::TwoTeams,
            _ => PolicyFamily::Teams,
        }
    }

    /// Largest group an edit may grow; `None` means unbounded.
    pub fn max_group_size(self) -> Option<usize> {
        match self.family() {
            PolicyFamily::Pairs => Some(2),
            PolicyFamily::TwoTeams => None,
            PolicyFamily::Teams => Some(5),
        }
    }

    /// Smallest non-empty group accepted on save.
    pub fn min_group_size(self) -> usize {
        match self.family() {
            PolicyFamily::Pairs => 2,
            PolicyFamily::TwoTeams | PolicyFamily::Teams => 1,
        }
    }

    /// Group size aimed for when regrouping by round robin.
    pub fn target_group_size(self) -> usize {
        match self.family() {
            PolicyFamily::Pairs => 2,
            PolicyFamily::TwoTeams | PolicyFamily::Teams => 4,
        }
    }

    /// Label for a single group when rendered.
    pub fn group_label(self) -> &'static str {
        match self.family() {
            PolicyFamily::Pairs => "Pair",
            PolicyFamily::TwoTeams | PolicyFamily::Teams => "Team",
        }
    }

    /// Whether the policy shuffles its input.
    pub fn is_randomized(self) -> bool {
        matches!(
            self,
            Policy::RandomTeams
                | Policy::MixedSexTeams
                | Policy::RandomPairs
                | Policy::SameSexPairs
                | Policy::MixedSexPairs
                | Policy::RandomTwoTeams
        )
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = UnknownPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Policy::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPolicyError(s.to_string()))
    }
}
