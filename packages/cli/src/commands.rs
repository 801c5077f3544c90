use std::fmt;
use std::path::PathBuf;

use shared::services::chess_service::ChessService;
use shared::services::session_service::SessionCommand;

pub const HELP: &str = "\
Commands:
  move <from> <to> [q|r|b|n]   play a move, e.g. `move e2 e4`
  click <square>               select a piece, then click its destination
  mark <square>                toggle a mark on a square
  board | history              show the board or the move list
  offer-draw | accept-draw | decline-draw | resign
  export <file>                write the move list as JSON
  import <file>                replay an exported game
  next | prev | goto <ply>     step through the replay
  live                         leave the replay
  help | quit";

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Session(SessionCommand),
    ExportTo(PathBuf),
    ImportFrom(PathBuf),
    Board,
    History,
    Help,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandError(pub String);

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CommandError {}

fn square(value: Option<&str>, what: &str) -> Result<chess::Square, CommandError> {
    let value = value.ok_or_else(|| CommandError(format!("Missing {} square", what)))?;
    ChessService::parse_square(value).map_err(|e| CommandError(e.to_string()))
}

fn path(value: Option<&str>) -> Result<PathBuf, CommandError> {
    value
        .map(PathBuf::from)
        .ok_or_else(|| CommandError("Missing file name".to_string()))
}

pub fn parse(line: &str) -> Result<Input, CommandError> {
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Ok(Input::Empty);
    };

    let input = match keyword.to_ascii_lowercase().as_str() {
        "move" | "m" => {
            let from = square(words.next(), "origin")?;
            let to = square(words.next(), "destination")?;
            let promotion = words
                .next()
                .map(ChessService::parse_promotion)
                .transpose()
                .map_err(|e| CommandError(e.to_string()))?;
            Input::Session(SessionCommand::Move {
                from,
                to,
                promotion,
            })
        }
        "click" | "c" => Input::Session(SessionCommand::Click(square(words.next(), "target")?)),
        "mark" => Input::Session(SessionCommand::Mark(square(words.next(), "target")?)),
        "offer-draw" => Input::Session(SessionCommand::OfferDraw),
        "accept-draw" => Input::Session(SessionCommand::AcceptDraw),
        "decline-draw" => Input::Session(SessionCommand::DeclineDraw),
        "resign" => Input::Session(SessionCommand::Resign),
        "export" => Input::ExportTo(path(words.next())?),
        "import" => Input::ImportFrom(path(words.next())?),
        "next" | "n" => Input::Session(SessionCommand::Next),
        "prev" | "p" => Input::Session(SessionCommand::Previous),
        "goto" => {
            let ply = words
                .next()
                .ok_or_else(|| CommandError("Missing ply".to_string()))?
                .parse()
                .map_err(|_| CommandError("Ply must be a number".to_string()))?;
            Input::Session(SessionCommand::GoTo(ply))
        }
        "live" => Input::Session(SessionCommand::Live),
        "board" | "b" => Input::Board,
        "history" | "h" => Input::History,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Session(SessionCommand::Quit),
        other => return Err(CommandError(format!("Unknown command `{}`", other))),
    };

    if let Some(extra) = words.next() {
        return Err(CommandError(format!("Unexpected argument `{}`", extra)));
    }
    Ok(input)
}
