use serde::{Deserialize, Serialize};

/// Immutable content of a cell, produced once by a generator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hint {
    Mine,
    Count(u8),
}

impl Hint {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    /// Adjacent mine count, `None` for a mine.
    pub const fn count(self) -> Option<u8> {
        match self {
            Self::Mine => None,
            Self::Count(count) => Some(count),
        }
    }
}

impl Default for Hint {
    fn default() -> Self {
        Self::Count(0)
    }
}

/// Canonical player-visible state stored by the reveal engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverTag {
    Hidden,
    Flagged,
    Questioned,
    Revealed(u8),
    /// The mine whose reveal lost the game.
    Exploded,
}

impl CoverTag {
    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed(_) | Self::Exploded)
    }

    /// Whether the cell carries a player annotation.
    pub const fn is_marked(self) -> bool {
        matches!(self, Self::Flagged | Self::Questioned)
    }

    /// Next tag in the `Hidden -> Flagged -> Questioned -> Hidden` cycle.
    pub const fn next_mark(self) -> Option<Self> {
        match self {
            Self::Hidden => Some(Self::Flagged),
            Self::Flagged => Some(Self::Questioned),
            Self::Questioned => Some(Self::Hidden),
            Self::Revealed(_) | Self::Exploded => None,
        }
    }
}

impl Default for CoverTag {
    fn default() -> Self {
        Self::Hidden
    }
}

/// What a presentation layer should draw for a cell.
///
/// While the game runs this mirrors [`CoverTag`]. Once the game is over the hidden
/// layout is exposed: unflagged mines become `Mine` on a loss (or `Flag` on a win)
/// and flags on safe cells become `IncorrectFlag`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayTile {
    Closed,
    Flag,
    Question,
    Open(u8),
    Exploded,
    Mine,
    IncorrectFlag,
}

impl DisplayTile {
    /// Whether the tile is visually closed.
    pub const fn is_closed(self) -> bool {
        use DisplayTile::*;
        match self {
            Closed => true,
            Flag => true,
            Question => true,
            IncorrectFlag => true,
            Open(_) => false,
            Exploded => false,
            Mine => false,
        }
    }
}

impl From<CoverTag> for DisplayTile {
    fn from(tag: CoverTag) -> Self {
        match tag {
            CoverTag::Hidden => Self::Closed,
            CoverTag::Flagged => Self::Flag,
            CoverTag::Questioned => Self::Question,
            CoverTag::Revealed(count) => Self::Open(count),
            CoverTag::Exploded => Self::Exploded,
        }
    }
}

impl Default for DisplayTile {
    fn default() -> Self {
        Self::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_cycle_returns_to_hidden() {
        let mut tag = CoverTag::Hidden;
        let mut seen = Vec::new();
        for _ in 0..3 {
            tag = tag.next_mark().unwrap();
            seen.push(tag);
        }
        assert_eq!(
            seen,
            vec![CoverTag::Flagged, CoverTag::Questioned, CoverTag::Hidden]
        );
    }

    #[test]
    fn revealed_tags_cannot_be_marked() {
        assert_eq!(CoverTag::Revealed(3).next_mark(), None);
        assert_eq!(CoverTag::Exploded.next_mark(), None);
    }

    #[test]
    fn display_mirrors_cover() {
        assert_eq!(DisplayTile::from(CoverTag::Revealed(2)), DisplayTile::Open(2));
        assert!(DisplayTile::from(CoverTag::Flagged).is_closed());
        assert!(!DisplayTile::from(CoverTag::Exploded).is_closed());
    }
}
