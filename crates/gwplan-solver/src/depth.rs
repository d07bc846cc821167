use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Named search effort presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDepth {
    Quick,
    #[default]
    Standard,
    Deep,
}

/// Concrete beam limits behind a [`SearchDepth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    /// States kept after each gameweek layer.
    pub beam_width: usize,
    /// Best replacements considered for each sellable player.
    pub replacements_per_player: usize,
    pub max_transfers_per_gameweek: usize,
    /// Transfer sets expanded per state per gameweek.
    pub transfer_sets_per_state: usize,
    /// Top single moves that are combined into multi-transfer sets.
    pub combination_pool: usize,
}

impl SearchDepth {
    pub const fn limits(self) -> SearchLimits {
        match self {
            SearchDepth::Quick => SearchLimits {
                beam_width: 8,
                replacements_per_player: 2,
                max_transfers_per_gameweek: 1,
                transfer_sets_per_state: 12,
                combination_pool: 10,
            },
            SearchDepth::Standard => SearchLimits {
                beam_width: 24,
                replacements_per_player: 3,
                max_transfers_per_gameweek: 2,
                transfer_sets_per_state: 40,
                combination_pool: 16,
            },
            SearchDepth::Deep => SearchLimits {
                beam_width: 64,
                replacements_per_player: 5,
                max_transfers_per_gameweek: 3,
                transfer_sets_per_state: 120,
                combination_pool: 24,
            },
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SearchDepth::Quick => "quick",
            SearchDepth::Standard => "standard",
            SearchDepth::Deep => "deep",
        }
    }
}

impl fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SearchDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(SearchDepth::Quick),
            "standard" => Ok(SearchDepth::Standard),
            "deep" => Ok(SearchDepth::Deep),
            other => Err(format!("unknown search depth '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deeper_searches_are_wider() {
        let quick = SearchDepth::Quick.limits();
        let standard = SearchDepth::Standard.limits();
        let deep = SearchDepth::Deep.limits();
        assert!(quick.beam_width < standard.beam_width);
        assert!(standard.beam_width < deep.beam_width);
        assert!(quick.max_transfers_per_gameweek <= standard.max_transfers_per_gameweek);
        assert!(standard.max_transfers_per_gameweek <= deep.max_transfers_per_gameweek);
    }

    #[test]
    fn parses_names() {
        assert_eq!("Deep".parse::<SearchDepth>().unwrap(), SearchDepth::Deep);
        assert!("exhaustive".parse::<SearchDepth>().is_err());
        assert_eq!(SearchDepth::default(), SearchDepth::Standard);
    }
}
