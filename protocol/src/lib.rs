//! JSON messages between a presentation layer and a [`Session`].

use clearfield_core::{Action, Coord, DisplayTile, Frame, GameOutcome, Session};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid message")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, ProtocolError>;

/// Input from the player, already mapped from pixels to a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    PrimaryActivate { x: Coord, y: Coord },
    SecondaryActivate { x: Coord, y: Coord },
    Quit,
}

impl From<ClientMessage> for Action {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::PrimaryActivate { x, y } => Action::Reveal((x, y)),
            ClientMessage::SecondaryActivate { x, y } => Action::ToggleMark((x, y)),
            ClientMessage::Quit => Action::Quit,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPatch {
    pub x: Coord,
    pub y: Coord,
    pub tile: DisplayTile,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Frame {
        changed: Vec<CellPatch>,
        outcome: GameOutcome,
        mines_left: isize,
        elapsed_secs: u32,
        just_ended: bool,
    },
    Error {
        message: String,
    },
}

impl From<Frame> for ServerMessage {
    fn from(frame: Frame) -> Self {
        let changed = frame
            .changed
            .into_iter()
            .map(|((x, y), tile)| CellPatch { x, y, tile })
            .collect();
        Self::Frame {
            changed,
            outcome: frame.outcome,
            mines_left: frame.mines_left,
            elapsed_secs: frame.elapsed_secs,
            just_ended: frame.just_ended,
        }
    }
}

/// Applies one client message, turning rejected moves into an error message.
pub fn handle_message(session: &mut Session, message: ClientMessage) -> ServerMessage {
    log::trace!("Handling {:?}", message);
    match session.apply(message.into()) {
        Ok(frame) => frame.into(),
        Err(err) => {
            log::warn!("Rejected {:?}: {}", message, err);
            ServerMessage::Error {
                message: err.to_string(),
            }
        }
    }
}

pub fn from_json<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T> {
    Ok(serde_json::from_str(text)?)
}

pub fn to_json<T: Serialize>(message: &T) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}
