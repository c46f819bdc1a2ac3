use std::io::{BufRead, Write};

use clap::Parser;
use drag_board::{
    BoardConfig, Color, Controller, GameStatus, LocalAuthority, Move, Outcome, Point,
    PointerButton, Square, DEFAULT_CELL_SIZE,
};

const INSTRUCTIONS: &str = "\
    Enter one pointer event per line, coordinates in pixels from the board's top-left:\n    \
      down <x> <y> [button]   press (button 0 is primary, 2 is secondary)\n    \
      move <x> <y>            move the pointer\n    \
      up <x> <y> [button]     release\n    \
      right                   right click\n    \
      drag <from> <to>        press and release on the centres of two squares, e.g. \"drag e2 e4\"\n    \
      show                    print the board\n    \
      reset                   start a new game\n\
";

/// Arguments to the harness
#[derive(Parser, Debug)]
#[command(
    name = "drag-board harness",
    about = "Drives a board controller with scripted pointer events, \
        backed by an in-process chess rules engine."
)]
struct Cli {
    /// Width of a board cell in pixels
    #[arg(short, long, default_value_t = DEFAULT_CELL_SIZE)]
    cell_size: f64,
    /// 10 is everything and 0 is nothing
    #[arg(short, long, default_value = "0")]
    log_level: u8,
    /// Starting position; the standard one if not given
    #[arg(short, long)]
    fen: Option<String>,
    /// Only print committed moves and the result
    #[arg(short, long)]
    quiet: bool,
}

enum Command {
    Down(Point, PointerButton),
    Move(Point),
    Up(Point, PointerButton),
    Right,
    Drag(Square, Square),
    Show,
    Reset,
}

fn parse_square(s: &str) -> Option<Square> {
    let &[file, rank] = s.as_bytes() else { return None; };
    Square::new(file.checked_sub(b'a')?, rank.checked_sub(b'1')?)
}

fn parse_command(line: &str) -> Option<Command> {
    let words = line.split_whitespace().collect::<Vec<_>>();
    let point = |i: usize| -> Option<Point> {
        Some(Point::new(words.get(i)?.parse().ok()?, words.get(i + 1)?.parse().ok()?))
    };
    let button = |i: usize| -> Option<PointerButton> {
        match words.get(i) {
            None => Some(PointerButton::Primary),
            Some(b) => b.parse().ok().map(PointerButton::from_dom),
        }
    };
    match *words.first()? {
        "down" if words.len() <= 4 => Some(Command::Down(point(1)?, button(3)?)),
        "move" if words.len() == 3 => Some(Command::Move(point(1)?)),
        "up" if words.len() <= 4 => Some(Command::Up(point(1)?, button(3)?)),
        "right" if words.len() == 1 => Some(Command::Right),
        "drag" if words.len() == 3 =>
            Some(Command::Drag(parse_square(words[1])?, parse_square(words[2])?)),
        "show" if words.len() == 1 => Some(Command::Show),
        "reset" if words.len() == 1 => Some(Command::Reset),
        _ => None,
    }
}

fn new_authority(cli: &Cli) -> Result<LocalAuthority, drag_board::AuthorityError> {
    match &cli.fen {
        Some(fen) => LocalAuthority::from_fen(fen, cli.log_level),
        None => Ok(LocalAuthority::new(cli.log_level)),
    }
}

fn main() {
    let cli = Cli::parse();

    let mut authority = match new_authority(&cli) {
        Ok(authority) => authority,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let config = BoardConfig { cell_size: cli.cell_size, log_level: cli.log_level };
    let mut board = match Controller::with_update(config, Vec::<Move>::new(), authority.update()) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    if !cli.quiet {
        println!("{}", INSTRUCTIONS);
        println!("{}", board.render());
    }

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break; };
        if line.trim().is_empty() { continue; }
        let Some(command) = parse_command(&line) else {
            println!("Invalid input.");
            println!("{}", INSTRUCTIONS);
            continue;
        };

        let outcome = match command {
            Command::Down(at, button) => board.pointer_down(at, button),
            Command::Move(at) => board.pointer_move(at),
            Command::Up(at, button) => board.pointer_up(at, button),
            Command::Right => board.right_click(),
            Command::Drag(from, to) => {
                let (from, to) = (board.geometry().center_of(from), board.geometry().center_of(to));
                board.pointer_down(from, PointerButton::Primary);
                board.pointer_up(to, PointerButton::Primary)
            }
            Command::Show => {
                println!("{}", board.render());
                continue;
            }
            Command::Reset => {
                authority = match new_authority(&cli) {
                    Ok(authority) => authority,
                    Err(e) => {
                        eprintln!("{}", e);
                        break;
                    }
                };
                board.reset(authority.update())
            }
        };

        // Answer every submission before the next event
        for mv in std::mem::take(board.sink_mut()) {
            match authority.apply(mv) {
                Ok(update) => {
                    println!("{}", mv);
                    board.push_update(update);
                }
                Err(e) => {
                    println!("Rejected: {}", e);
                    board.abandon_submission();
                }
            }
        }

        if !cli.quiet && outcome.needs_redraw() {
            println!("{:?}", outcome);
            if matches!(outcome, Outcome::Committed(_) | Outcome::Cancelled { .. } | Outcome::Lifted(_)) {
                println!("{}", board.render());
            }
        }
        let _ = std::io::stdout().flush();

        match authority.status() {
            GameStatus::InProgress => {}
            GameStatus::Checkmate { winner: Color::White } => { println!("white wins"); break; }
            GameStatus::Checkmate { winner: Color::Black } => { println!("black wins"); break; }
            GameStatus::Stalemate => { println!("stalemate"); break; }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert!(matches!(parse_command("down 10 20"), Some(Command::Down(_, PointerButton::Primary))));
        assert!(matches!(parse_command("down 10 20 2"), Some(Command::Down(_, PointerButton::Secondary))));
        assert!(matches!(parse_command("up -5.5 20"), Some(Command::Up(p, _)) if p.x == -5.5));
        assert!(matches!(parse_command("drag e2 e4"), Some(Command::Drag(a, b))
            if a.index() == 12 && b.index() == 28));
        assert!(parse_command("drag e9 e4").is_none());
        assert!(parse_command("move 1").is_none());
        assert!(parse_command("jump").is_none());
    }
}
