use chess::{Color, File, Piece, Rank, Square};

use shared::models::chess_move::HistoryEntry;
use shared::models::game::PlayerColor;
use shared::models::profile::Profile;
use shared::services::session_controller::GameSessionController;
use shared::services::session_service::Notice;

fn piece_char(piece: Piece, color: Color) -> char {
    let c = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    if color == Color::White {
        c.to_ascii_uppercase()
    } else {
        c
    }
}

/// Text board seen from `orientation`'s side.
///
/// `[x]` is the selected square, `(x)` a square the selection can move to
/// and `<x>` a marked square.
pub fn render_board(controller: &GameSessionController, orientation: PlayerColor) -> String {
    let position = controller.displayed_position();
    let selection = controller.selection();
    let marks = controller.annotations();

    let ranks: Vec<usize> = match orientation {
        PlayerColor::White => (0..8).rev().collect(),
        PlayerColor::Black => (0..8).collect(),
    };
    let files: Vec<usize> = match orientation {
        PlayerColor::White => (0..8).collect(),
        PlayerColor::Black => (0..8).rev().collect(),
    };

    let mut out = String::from("  +------------------------+\n");
    for rank in &ranks {
        out.push_str(&format!("{} |", rank + 1));
        for file in &files {
            let square = Square::make_square(Rank::from_index(*rank), File::from_index(*file));
            let symbol = position
                .piece_at(square)
                .map_or('.', |(piece, color)| piece_char(piece, color));
            let cell = if selection.map_or(false, |s| s.from == square) {
                format!("[{}]", symbol)
            } else if selection.map_or(false, |s| s.targets.contains(&square)) {
                format!("({})", symbol)
            } else if marks.contains(&square) {
                format!("<{}>", symbol)
            } else {
                format!(" {} ", symbol)
            };
            out.push_str(&cell);
        }
        out.push_str("|\n");
    }
    out.push_str("  +------------------------+\n   ");
    for file in &files {
        out.push_str(&format!(" {} ", (b'a' + *file as u8) as char));
    }
    out.push('\n');
    out
}

/// Move list in numbered pairs: `1. e4 e5`.
pub fn render_history(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "No moves yet".to_string();
    }
    history
        .chunks(2)
        .enumerate()
        .map(|(index, pair)| {
            let notations: Vec<&str> = pair.iter().map(|entry| entry.notation.as_str()).collect();
            format!("{}. {}", index + 1, notations.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_status(controller: &GameSessionController) -> String {
    if let Some(replay) = controller.replay() {
        return format!(
            "Replaying {} ({}/{})",
            replay.game_id(),
            replay.ply(),
            replay.len()
        );
    }

    let mut line = format!(
        "{} | {} to move",
        controller.status(),
        controller.color_to_move()
    );
    if let Some(offered_by) = controller.draw_offered_by() {
        line.push_str(&format!(" | draw offered by {}", offered_by));
    }
    line
}

pub fn render_players(white: Option<&Profile>, black: Option<&Profile>) -> String {
    let label = |profile: Option<&Profile>| match profile {
        Some(profile) => format!("{} ({})", profile.display_name(), profile.rating),
        None => "waiting for player".to_string(),
    };
    format!("White: {}  vs  Black: {}", label(white), label(black))
}

pub fn celebration(winner: PlayerColor) -> String {
    format!(
        "\n  *  .  *  .  *  .  *  .  *\n   CHECKMATE! {} wins\n  *  .  *  .  *  .  *  .  *\n",
        winner
    )
}

/// Line shown for a notice, if any. The board is redrawn separately.
pub fn render_notice(notice: &Notice) -> Option<String> {
    let text = match notice {
        Notice::Moved(committed) => format!("{}. {}", committed.move_number, committed.notation),
        Notice::Rejected(rejection) => format!("Move rejected: {}", rejection),
        Notice::Selected(selection) if selection.targets.is_empty() => {
            format!("{} has no moves", selection.from)
        }
        Notice::Selected(selection) => {
            let targets: Vec<String> = selection.targets.iter().map(|s| s.to_string()).collect();
            format!("{} can move to {}", selection.from, targets.join(" "))
        }
        Notice::SelectionCleared => return None,
        Notice::Marked { square, marked } => {
            format!("{} {}", square, if *marked { "marked" } else { "unmarked" })
        }
        Notice::RemoteMove { notation } => format!("Opponent played {}", notation),
        Notice::Checkmate { winner } => celebration(*winner),
        Notice::Stalemate => "Stalemate".to_string(),
        Notice::StatusChanged(status) => format!("Game is now {}", status),
        Notice::DrawOffered(color) => format!(
            "{} offers a draw (accept-draw / decline-draw)",
            color
        ),
        Notice::DrawDeclined => "Your draw offer was declined".to_string(),
        Notice::Exported(document) => format!("Exported {} moves", document.moves.len()),
        Notice::ReplayStarted { moves } => {
            format!("Replay loaded with {} moves (next / prev / goto / live)", moves)
        }
        Notice::ReplayAt { ply, notation } => match notation {
            Some(notation) => format!("Ply {}: {}", ply, notation),
            None => "Starting position".to_string(),
        },
        Notice::ReplayEnded => "Back to the live game".to_string(),
        Notice::Unavailable(msg) => msg.clone(),
        Notice::Failed(msg) => format!("Error: {}", msg),
        Notice::Disconnected => "Lost the connection to the game feed".to_string(),
        Notice::Left { discarded_moves } => {
            if *discarded_moves {
                "Left the game; its move log was discarded".to_string()
            } else {
                "Goodbye".to_string()
            }
        }
    };
    Some(text)
}

/// Whether a notice changes what the board shows.
pub fn redraws_board(notice: &Notice) -> bool {
    matches!(
        notice,
        Notice::Moved(_)
            | Notice::Selected(_)
            | Notice::Marked { .. }
            | Notice::RemoteMove { .. }
            | Notice::ReplayStarted { .. }
            | Notice::ReplayAt { .. }
            | Notice::ReplayEnded
    )
}
