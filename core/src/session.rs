use chrono::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// Player name used when none is given.
pub const DEFAULT_PLAYER: &str = "Player";

/// Logical player input, already mapped to a cell by the presentation layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Reveal(Coord2),
    ToggleMark(Coord2),
    Quit,
}

/// Everything a renderer needs after one action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub changed: Vec<(Coord2, DisplayTile)>,
    pub outcome: GameOutcome,
    pub mines_left: isize,
    pub elapsed_secs: u32,
    /// Set on the frame whose action ended the game.
    pub just_ended: bool,
}

/// One game from first click to score, with its timer and player.
#[derive(Clone, Debug)]
pub struct Session {
    engine: RevealEngine,
    player: String,
    /// Set by the first action that changes the board, not when the session opens.
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    closed: bool,
}

impl Session {
    pub fn new(engine: RevealEngine, player: impl Into<String>) -> Self {
        Self {
            engine,
            player: player.into(),
            started_at: None,
            ended_at: None,
            closed: false,
        }
    }

    /// Generates a fresh field from `seed` and starts a session on it.
    pub fn start(config: GameConfig, seed: u64, player: impl Into<String>) -> Result<Self> {
        let field = RandomFieldGenerator::new(seed).generate(config)?;
        log::debug!("Session seed: {}", seed);
        Ok(Self::new(RevealEngine::new(field), player))
    }

    pub fn engine(&self) -> &RevealEngine {
        &self.engine
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn outcome(&self) -> GameOutcome {
        self.engine.outcome()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// When the first board-changing action (a reveal or a mark) happened.
    ///
    /// Opening the session or acting on an unchangeable cell does not start the clock,
    /// so times are shorter than ones measured from when the board was shown.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn apply(&mut self, action: Action) -> Result<Frame> {
        self.apply_at(action, Utc::now())
    }

    /// Applies `action` as if it happened at `now`.
    pub fn apply_at(&mut self, action: Action, now: DateTime<Utc>) -> Result<Frame> {
        if self.closed {
            return Ok(self.frame(Vec::new(), false, now));
        }

        let result = match action {
            Action::Reveal(coords) => self.engine.reveal(coords)?,
            Action::ToggleMark(coords) => self.engine.toggle_mark(coords)?,
            Action::Quit => {
                log::debug!("Session closed by player");
                self.closed = true;
                return Ok(self.frame(Vec::new(), false, now));
            }
        };

        if result.has_update() && self.started_at.is_none() {
            log::debug!("started at {}", now);
            self.started_at = Some(now);
        }

        if let Some(outcome) = result.transition {
            log::debug!("ended at {} with {:?}", now, outcome);
            self.ended_at = Some(now);
            // the end of a game can expose cells that did not change cover
            let changed = self.engine.display().collect();
            return Ok(self.frame(changed, true, now));
        }

        let changed = result
            .changed
            .iter()
            .map(|&(coords, tag)| (coords, DisplayTile::from(tag)))
            .collect();
        Ok(self.frame(changed, false, now))
    }

    /// How many seconds have passed since the game started, 0 if it hasn't started.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        if let Some(started_at) = self.started_at {
            (self.ended_at.unwrap_or(now) - started_at)
                .num_seconds()
                .clamp(0, i64::from(u32::MAX)) as u32
        } else {
            0
        }
    }

    /// Score of a won game, `None` for any other state.
    pub fn score_record(&self) -> Option<ScoreRecord> {
        if self.engine.outcome() != GameOutcome::Won {
            return None;
        }
        let ended_at = self.ended_at?;
        Some(ScoreRecord {
            date: ended_at.date_naive(),
            player: self.player.clone(),
            elapsed_secs: self.elapsed_secs(ended_at),
        })
    }

    fn frame(
        &self,
        changed: Vec<(Coord2, DisplayTile)>,
        just_ended: bool,
        now: DateTime<Utc>,
    ) -> Frame {
        Frame {
            changed,
            outcome: self.engine.outcome(),
            mines_left: self.engine.remaining_mine_count(),
            elapsed_secs: self.elapsed_secs(now),
            just_ended,
        }
    }
}
