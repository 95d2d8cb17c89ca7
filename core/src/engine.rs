use core::num::Saturating;
use hashbrown::HashSet;
use ndarray::Array2;
use smallvec::smallvec;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::*;

/// Mutable cover state of one game, bound to a shared [`HintField`].
#[derive(Clone, Debug, PartialEq)]
pub struct RevealEngine {
    field: Arc<HintField>,
    cover: Array2<CoverTag>,
    revealed_count: Saturating<CellCount>,
    flagged_count: Saturating<CellCount>,
    correctly_flagged: Saturating<CellCount>,
    outcome: GameOutcome,
    triggered_mine: Option<Coord2>,
    win_rule: WinRule,
}

impl RevealEngine {
    pub fn new(field: impl Into<Arc<HintField>>) -> Self {
        Self::with_win_rule(field, WinRule::default())
    }

    pub fn with_win_rule(field: impl Into<Arc<HintField>>, win_rule: WinRule) -> Self {
        let field = field.into();
        let size = field.size();
        Self {
            field,
            cover: Array2::default(size.to_nd_index()),
            revealed_count: Saturating(0),
            flagged_count: Saturating(0),
            correctly_flagged: Saturating(0),
            outcome: GameOutcome::InProgress,
            triggered_mine: None,
            win_rule,
        }
    }

    pub fn field(&self) -> &Arc<HintField> {
        &self.field
    }

    pub fn win_rule(&self) -> WinRule {
        self.win_rule
    }

    pub fn outcome(&self) -> GameOutcome {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_finished()
    }

    pub fn size(&self) -> Coord2 {
        self.field.size()
    }

    pub fn total_mines(&self) -> CellCount {
        self.field.mine_count()
    }

    /// Mines minus flags placed, negative when the player over-flags.
    pub fn remaining_mine_count(&self) -> isize {
        (self.field.mine_count() as isize) - (self.flagged_count.0 as isize)
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count.0
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count.0
    }

    /// Flags that sit on actual mines.
    pub fn correctly_flagged_count(&self) -> CellCount {
        self.correctly_flagged.0
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn cell_at(&self, coords: Coord2) -> Result<CoverTag> {
        let coords = self.field.validate_coords(coords)?;
        Ok(self.cover[coords.to_nd_index()])
    }

    /// Cover tags in flat index order.
    pub fn cells(&self) -> impl Iterator<Item = (Coord2, CoverTag)> + '_ {
        self.cover
            .indexed_iter()
            .map(|((row, column), &tag)| ((column as Coord, row as Coord), tag))
    }

    pub fn display_at(&self, coords: Coord2) -> Result<DisplayTile> {
        let coords = self.field.validate_coords(coords)?;
        Ok(self.display_unchecked(coords))
    }

    /// Display tiles for the whole board in flat index order.
    pub fn display(&self) -> impl Iterator<Item = (Coord2, DisplayTile)> + '_ {
        self.cells()
            .map(move |(coords, _)| (coords, self.display_unchecked(coords)))
    }

    fn display_unchecked(&self, coords: Coord2) -> DisplayTile {
        use CoverTag::*;

        let tag = self.cover[coords.to_nd_index()];
        let has_mine = self.field.contains_mine(coords);

        match (self.outcome, tag, has_mine) {
            (GameOutcome::InProgress, _, _) => tag.into(),
            (GameOutcome::Lost, Hidden | Questioned, true) => DisplayTile::Mine,
            (GameOutcome::Won, Hidden | Questioned, true) => DisplayTile::Flag,
            (_, Flagged, false) => DisplayTile::IncorrectFlag,
            _ => tag.into(),
        }
    }

    /// Uncovers a hidden cell, flooding outwards when it has no adjacent mines.
    ///
    /// Marked or already revealed cells are left alone, as is everything once the game
    /// has ended.
    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealResult> {
        let coords = self.field.validate_coords(coords)?;

        if self.outcome.is_finished() || self.cover[coords.to_nd_index()] != CoverTag::Hidden {
            return Ok(self.no_change());
        }

        let mut changed = ChangeSet::new();
        match self.field[coords] {
            Hint::Mine => {
                log::debug!("Mine hit at {:?}", coords);
                self.cover[coords.to_nd_index()] = CoverTag::Exploded;
                self.triggered_mine = Some(coords);
                changed.push((coords, CoverTag::Exploded));
            }
            Hint::Count(count) => {
                log::debug!("Reveal cell at {:?}, mine count: {}", coords, count);
                self.uncover(coords, count, &mut changed);
                if count == 0 {
                    self.flood_fill(coords, &mut changed);
                }
            }
        }

        Ok(self.finish_update(changed))
    }

    /// Cycles `Hidden -> Flagged -> Questioned -> Hidden`.
    pub fn toggle_mark(&mut self, coords: Coord2) -> Result<RevealResult> {
        use CoverTag::*;

        let coords = self.field.validate_coords(coords)?;

        if self.outcome.is_finished() {
            return Ok(self.no_change());
        }

        let tag = self.cover[coords.to_nd_index()];
        let Some(next) = tag.next_mark() else {
            return Ok(self.no_change());
        };
        let has_mine = self.field.contains_mine(coords);

        match (tag, next) {
            (_, Flagged) => {
                self.flagged_count += 1;
                if has_mine {
                    self.correctly_flagged += 1;
                }
            }
            (Flagged, _) => {
                self.flagged_count -= 1;
                if has_mine {
                    self.correctly_flagged -= 1;
                }
            }
            _ => {}
        }
        self.cover[coords.to_nd_index()] = next;
        log::debug!("Mark cell at {:?}: {:?} -> {:?}", coords, tag, next);

        Ok(self.finish_update(smallvec![(coords, next)]))
    }

    fn uncover(&mut self, coords: Coord2, count: u8, changed: &mut ChangeSet) {
        let tag = CoverTag::Revealed(count);
        self.cover[coords.to_nd_index()] = tag;
        self.revealed_count += 1;
        changed.push((coords, tag));
    }

    /// Breadth-first expansion from a revealed 0-valued `seed`.
    ///
    /// Every hidden neighbor of an expanding cell is revealed; 0-valued ones expand in
    /// turn. Marked 0-valued cells keep their mark but still expand.
    fn flood_fill(&mut self, seed: Coord2, changed: &mut ChangeSet) {
        let mut visited: HashSet<Coord2> = HashSet::new();
        visited.insert(seed);
        let mut frontier = VecDeque::from([seed]);

        while let Some(source) = frontier.pop_front() {
            for pos in self.field.iter_neighbors(source) {
                if !visited.insert(pos) {
                    continue;
                }

                let Some(count) = self.field[pos].count() else {
                    continue;
                };

                let tag = self.cover[pos.to_nd_index()];
                if tag.is_revealed() {
                    continue;
                } else if tag.is_marked() {
                    log::trace!("Keeping mark at {:?}", pos);
                } else {
                    self.uncover(pos, count, changed);
                    log::trace!("Flood revealed cell at {:?}, mine count: {}", pos, count);
                }

                if count == 0 {
                    frontier.push_back(pos);
                }
            }
        }
    }

    fn finish_update(&mut self, changed: ChangeSet) -> RevealResult {
        let previous = self.outcome;
        self.outcome = self.evaluate_outcome();

        let transition = (previous != self.outcome).then_some(self.outcome);
        if let Some(outcome) = transition {
            log::debug!(
                "Game ended: {:?}, revealed {} of {} safe cells",
                outcome,
                self.revealed_count.0,
                self.field.safe_cell_count()
            );
        }

        RevealResult {
            changed,
            outcome: self.outcome,
            mines_left: self.remaining_mine_count(),
            transition,
        }
    }

    fn evaluate_outcome(&self) -> GameOutcome {
        if self.triggered_mine.is_some() {
            return GameOutcome::Lost;
        }

        let won = match self.win_rule {
            WinRule::RevealAllSafe => self.revealed_count.0 == self.field.safe_cell_count(),
            WinRule::FlagAllMines => {
                self.correctly_flagged.0 == self.field.mine_count()
                    && !self.cover.iter().any(|&tag| tag == CoverTag::Hidden)
            }
        };

        if won {
            GameOutcome::Won
        } else {
            GameOutcome::InProgress
        }
    }

    fn no_change(&self) -> RevealResult {
        RevealResult {
            changed: ChangeSet::new(),
            outcome: self.outcome,
            mines_left: self.remaining_mine_count(),
            transition: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(size: Coord2, mines: &[Coord2]) -> RevealEngine {
        RevealEngine::new(HintField::from_mine_coords(size, mines).unwrap())
    }

    fn changed_coords(result: &RevealResult) -> Vec<Coord2> {
        let mut coords: Vec<_> = result.changed.iter().map(|&(pos, _)| pos).collect();
        coords.sort();
        coords
    }

    fn snapshot(engine: &RevealEngine) -> Vec<CoverTag> {
        engine.cells().map(|(_, tag)| tag).collect()
    }

    #[test]
    fn reveal_hits_mine_and_sets_triggered_cell() {
        let mut engine = engine((2, 2), &[(0, 0)]);

        let result = engine.reveal((0, 0)).unwrap();

        assert_eq!(result.changed.as_slice(), &[((0, 0), CoverTag::Exploded)]);
        assert_eq!(result.outcome, GameOutcome::Lost);
        assert_eq!(result.transition, Some(GameOutcome::Lost));
        assert_eq!(engine.outcome(), GameOutcome::Lost);
        assert_eq!(engine.triggered_mine(), Some((0, 0)));
    }

    #[test]
    fn reveal_numbered_cell_opens_only_that_cell() {
        let mut engine = engine((3, 3), &[(2, 2)]);

        let result = engine.reveal((1, 1)).unwrap();

        assert_eq!(result.changed.as_slice(), &[((1, 1), CoverTag::Revealed(1))]);
        assert_eq!(result.outcome, GameOutcome::InProgress);
        assert_eq!(result.transition, None);
        assert_eq!(engine.cell_at((0, 0)), Ok(CoverTag::Hidden));
    }

    #[test]
    fn empty_board_is_won_in_one_reveal() {
        for index in 0..25 {
            let mut engine = engine((5, 5), &[]);
            let coords = coords_of(index, (5, 5)).unwrap();

            let result = engine.reveal(coords).unwrap();

            assert_eq!(result.changed.len(), 25);
            assert_eq!(result.outcome, GameOutcome::Won);
            assert_eq!(result.transition, Some(GameOutcome::Won));
            assert!(engine.cells().all(|(_, tag)| tag == CoverTag::Revealed(0)));
        }
    }

    #[test]
    fn flood_fill_stops_at_numbered_ring() {
        // mine at flat index 12 is the center of a 5x5 board
        let mine = coords_of(12, (5, 5)).unwrap();
        let mut engine = engine((5, 5), &[mine]);

        let result = engine.reveal(coords_of(0, (5, 5)).unwrap()).unwrap();

        assert_eq!(result.changed.len(), 24);
        assert!(!changed_coords(&result).contains(&mine));
        assert_eq!(engine.cell_at(mine), Ok(CoverTag::Hidden));
        for (coords, tag) in engine.cells() {
            if coords == mine {
                continue;
            }
            let ring = coords.0.abs_diff(2) <= 1 && coords.1.abs_diff(2) <= 1;
            let expected = if ring { 1 } else { 0 };
            assert_eq!(tag, CoverTag::Revealed(expected), "at {coords:?}");
        }
        assert_eq!(engine.outcome(), GameOutcome::Won);
    }

    #[test]
    fn flood_fill_reveals_region_and_border_only() {
        // 5x3 board, mines in the right column:
        // 0 0 1 * *
        // 0 0 2 5 *
        // 0 0 1 * *
        let mines = &[(3, 0), (4, 0), (4, 1), (3, 2), (4, 2)];
        let mut engine = engine((5, 3), mines);

        let result = engine.reveal((0, 1)).unwrap();

        let mut expected = vec![];
        for x in 0..3 {
            for y in 0..3 {
                expected.push((x, y));
            }
        }
        assert_eq!(changed_coords(&result), expected);
        assert_eq!(engine.cell_at((2, 1)), Ok(CoverTag::Revealed(2)));
        assert_eq!(engine.cell_at((3, 1)), Ok(CoverTag::Hidden));
        assert_eq!(result.outcome, GameOutcome::InProgress);
    }

    #[test]
    fn flood_fill_is_idempotent() {
        // (3, 4) sits between both mines and is not reached by the flood
        let mut engine = engine((5, 5), &[(2, 4), (4, 4)]);
        let first = engine.reveal((0, 0)).unwrap();
        assert_eq!(first.outcome, GameOutcome::InProgress);
        assert_eq!(engine.cell_at((3, 4)), Ok(CoverTag::Hidden));
        let before = snapshot(&engine);

        for &(coords, _) in first.changed.iter() {
            let again = engine.reveal(coords).unwrap();
            assert!(!again.has_update());
        }

        assert_eq!(snapshot(&engine), before);
    }

    #[test]
    fn flood_fill_keeps_marks() {
        let mut engine = engine((5, 5), &[(4, 4)]);
        engine.toggle_mark((2, 2)).unwrap();
        engine.toggle_mark((1, 0)).unwrap();
        engine.toggle_mark((1, 0)).unwrap();

        let result = engine.reveal((0, 0)).unwrap();

        assert!(!changed_coords(&result).contains(&(2, 2)));
        assert!(!changed_coords(&result).contains(&(1, 0)));
        assert_eq!(engine.cell_at((2, 2)), Ok(CoverTag::Flagged));
        assert_eq!(engine.cell_at((1, 0)), Ok(CoverTag::Questioned));
        // marked zero cells do not stop the flood
        assert_eq!(engine.cell_at((4, 0)), Ok(CoverTag::Revealed(0)));
        assert_eq!(engine.cell_at((3, 3)), Ok(CoverTag::Revealed(1)));
        assert_eq!(engine.outcome(), GameOutcome::InProgress);
    }

    #[test]
    fn flood_fill_passes_through_flagged_chokepoint() {
        // single row, the flag at (2, 0) is the only link between both halves
        let mut engine = engine((5, 1), &[]);
        engine.toggle_mark((2, 0)).unwrap();

        let result = engine.reveal((0, 0)).unwrap();

        assert_eq!(changed_coords(&result), vec![(0, 0), (1, 0), (3, 0), (4, 0)]);
        assert_eq!(engine.cell_at((2, 0)), Ok(CoverTag::Flagged));
        assert_eq!(result.outcome, GameOutcome::InProgress);
    }

    #[test]
    fn flagged_mine_cannot_be_revealed_until_unflagged() {
        let mut engine = engine((3, 3), &[(1, 1)]);
        engine.toggle_mark((1, 1)).unwrap();

        let result = engine.reveal((1, 1)).unwrap();
        assert!(!result.has_update());
        assert_eq!(engine.outcome(), GameOutcome::InProgress);

        engine.toggle_mark((1, 1)).unwrap();
        engine.toggle_mark((1, 1)).unwrap();
        assert_eq!(engine.cell_at((1, 1)), Ok(CoverTag::Hidden));

        let result = engine.reveal((1, 1)).unwrap();
        assert_eq!(result.outcome, GameOutcome::Lost);
    }

    #[test]
    fn toggle_mark_cycles_and_counts() {
        let mut engine = engine((3, 3), &[(0, 0)]);

        let result = engine.toggle_mark((0, 0)).unwrap();
        assert_eq!(result.changed.as_slice(), &[((0, 0), CoverTag::Flagged)]);
        assert_eq!(result.mines_left, 0);
        assert_eq!(engine.correctly_flagged_count(), 1);

        let result = engine.toggle_mark((0, 0)).unwrap();
        assert_eq!(result.changed.as_slice(), &[((0, 0), CoverTag::Questioned)]);
        assert_eq!(result.mines_left, 1);
        assert_eq!(engine.correctly_flagged_count(), 0);

        let result = engine.toggle_mark((0, 0)).unwrap();
        assert_eq!(result.changed.as_slice(), &[((0, 0), CoverTag::Hidden)]);
        assert_eq!(engine.flagged_count(), 0);
    }

    #[test]
    fn toggle_mark_ignores_revealed_cells() {
        let mut engine = engine((3, 3), &[(0, 0)]);
        engine.reveal((1, 1)).unwrap();

        let result = engine.toggle_mark((1, 1)).unwrap();

        assert!(!result.has_update());
        assert_eq!(engine.cell_at((1, 1)), Ok(CoverTag::Revealed(1)));
    }

    #[test]
    fn over_flagging_goes_negative() {
        let mut engine = engine((3, 3), &[(0, 0)]);
        engine.toggle_mark((1, 1)).unwrap();
        let result = engine.toggle_mark((2, 2)).unwrap();

        assert_eq!(result.mines_left, -1);
        assert_eq!(engine.remaining_mine_count(), -1);
        assert_eq!(engine.correctly_flagged_count(), 0);
    }

    #[test]
    fn flagging_every_mine_does_not_win() {
        let mines = &[(0, 0), (2, 2)];
        let mut engine = engine((3, 3), mines);
        for &mine in mines {
            engine.toggle_mark(mine).unwrap();
        }

        assert_eq!(engine.remaining_mine_count(), 0);
        assert_eq!(engine.outcome(), GameOutcome::InProgress);
    }

    #[test]
    fn winning_ignores_flags() {
        let mut engine = engine((2, 1), &[(0, 0)]);

        let result = engine.reveal((1, 0)).unwrap();

        assert_eq!(result.outcome, GameOutcome::Won);
        assert_eq!(engine.cell_at((0, 0)), Ok(CoverTag::Hidden));
        assert_eq!(engine.remaining_mine_count(), 1);
    }

    #[test]
    fn finished_game_ignores_moves() {
        let mut engine = engine((3, 3), &[(0, 0)]);
        engine.reveal((0, 0)).unwrap();
        let before = snapshot(&engine);

        assert!(!engine.reveal((2, 2)).unwrap().has_update());
        assert!(!engine.toggle_mark((1, 1)).unwrap().has_update());
        assert_eq!(engine.reveal((2, 2)).unwrap().transition, None);
        assert_eq!(snapshot(&engine), before);
        assert_eq!(engine.outcome(), GameOutcome::Lost);

        let mut engine = self::engine((2, 1), &[(0, 0)]);
        engine.reveal((1, 0)).unwrap();
        assert!(!engine.toggle_mark((0, 0)).unwrap().has_update());
        assert_eq!(engine.outcome(), GameOutcome::Won);
    }

    #[test]
    fn out_of_bounds_is_rejected_without_mutation() {
        let mut engine = engine((3, 2), &[(0, 0)]);

        assert_eq!(
            engine.reveal((3, 0)),
            Err(GameError::OutOfBounds { coords: (3, 0) })
        );
        assert_eq!(
            engine.toggle_mark((0, 2)),
            Err(GameError::OutOfBounds { coords: (0, 2) })
        );
        assert!(engine.cells().all(|(_, tag)| tag == CoverTag::Hidden));
        assert_eq!(engine.flagged_count(), 0);
    }

    #[test]
    fn lost_display_exposes_mines_and_wrong_flags() {
        let mut engine = engine((3, 3), &[(0, 0), (2, 2), (2, 0)]);
        engine.toggle_mark((2, 2)).unwrap();
        engine.toggle_mark((1, 1)).unwrap();
        engine.toggle_mark((2, 0)).unwrap();
        engine.toggle_mark((2, 0)).unwrap();
        assert_eq!(engine.display_at((0, 0)), Ok(DisplayTile::Closed));

        engine.reveal((0, 0)).unwrap();

        assert_eq!(engine.display_at((0, 0)), Ok(DisplayTile::Exploded));
        assert_eq!(engine.display_at((2, 2)), Ok(DisplayTile::Flag));
        assert_eq!(engine.display_at((1, 1)), Ok(DisplayTile::IncorrectFlag));
        assert_eq!(engine.display_at((2, 0)), Ok(DisplayTile::Mine));
        assert_eq!(engine.display_at((0, 1)), Ok(DisplayTile::Closed));
    }

    #[test]
    fn won_display_flags_remaining_mines() {
        let mut engine = engine((2, 1), &[(0, 0)]);
        engine.reveal((1, 0)).unwrap();

        let tiles: Vec<_> = engine.display().collect();
        assert_eq!(
            tiles,
            vec![((0, 0), DisplayTile::Flag), ((1, 0), DisplayTile::Open(1))]
        );
    }

    #[test]
    fn flag_all_mines_rule_needs_flags() {
        let field = HintField::from_mine_coords((2, 1), &[(0, 0)]).unwrap();
        let mut engine = RevealEngine::with_win_rule(field, WinRule::FlagAllMines);

        let result = engine.reveal((1, 0)).unwrap();
        assert_eq!(result.outcome, GameOutcome::InProgress);

        let result = engine.toggle_mark((0, 0)).unwrap();
        assert_eq!(result.outcome, GameOutcome::Won);
        assert_eq!(result.transition, Some(GameOutcome::Won));
    }

    #[test]
    fn flag_all_mines_rule_accepts_wrong_flags() {
        let field = HintField::from_mine_coords((3, 1), &[(0, 0)]).unwrap();
        let mut engine = RevealEngine::with_win_rule(field, WinRule::FlagAllMines);

        engine.toggle_mark((0, 0)).unwrap();
        engine.toggle_mark((2, 0)).unwrap();
        assert_eq!(engine.outcome(), GameOutcome::InProgress);

        engine.reveal((1, 0)).unwrap();
        assert_eq!(engine.outcome(), GameOutcome::Won);
    }

    #[test]
    fn flag_all_mines_rule_ignores_questioned_cells() {
        let field = HintField::from_mine_coords((3, 1), &[(0, 0)]).unwrap();
        let mut engine = RevealEngine::with_win_rule(field, WinRule::FlagAllMines);

        engine.toggle_mark((2, 0)).unwrap();
        engine.toggle_mark((2, 0)).unwrap();
        engine.reveal((1, 0)).unwrap();
        assert_eq!(engine.cell_at((2, 0)), Ok(CoverTag::Questioned));
        assert_eq!(engine.outcome(), GameOutcome::InProgress);

        let result = engine.toggle_mark((0, 0)).unwrap();
        assert_eq!(result.changed.as_slice(), &[((0, 0), CoverTag::Flagged)]);
        assert_eq!(result.outcome, GameOutcome::Won);
        assert_eq!(result.transition, Some(GameOutcome::Won));
    }

    #[test]
    fn flag_all_mines_rule_blocked_by_hidden_cell() {
        let field = HintField::from_mine_coords((3, 1), &[(0, 0)]).unwrap();
        let mut engine = RevealEngine::with_win_rule(field, WinRule::FlagAllMines);

        engine.toggle_mark((0, 0)).unwrap();
        let result = engine.reveal((1, 0)).unwrap();

        assert_eq!(engine.cell_at((2, 0)), Ok(CoverTag::Hidden));
        assert_eq!(result.outcome, GameOutcome::InProgress);
        assert_eq!(result.transition, None);
        assert_eq!(engine.correctly_flagged_count(), engine.total_mines());
    }

    #[test]
    fn field_is_shared_read_only() {
        let field = Arc::new(HintField::from_mine_coords((3, 3), &[(1, 1)]).unwrap());
        let mut engine = RevealEngine::new(Arc::clone(&field));

        engine.reveal((0, 0)).unwrap();

        assert_eq!(Arc::strong_count(&field), 2);
        assert_eq!(field.hint_at((0, 0)), Hint::Count(1));
    }
}
