//! Line commands typed on stdin.

use crate::player::RowId;
use crate::sync::Request;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  next | prev          skip forward or back
  toggle               play or pause
  stop                 stop playback
  seek <x> <width>     seek to x out of width along the track
  play <id>            play the playlist row with this id
  sort <id>...         move these rows to the top, in order
  remove <id>...       remove these rows
  clear                empty the playlist
  connect              try to (re)connect
  status | list        show the player or the playlist
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Request(Request),
    Status,
    List,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("'{command}' needs {what}")]
    Missing {
        command: &'static str,
        what: &'static str,
    },
    #[error("'{0}' is not a number")]
    NotANumber(String),
}

fn number(word: &str) -> Result<u32, InputError> {
    word.parse()
        .map_err(|_| InputError::NotANumber(word.to_string()))
}

fn ids<'a>(
    command: &'static str,
    words: impl Iterator<Item = &'a str>,
) -> Result<Vec<RowId>, InputError> {
    let ids = words.map(|w| number(w).map(RowId)).collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err(InputError::Missing {
            command,
            what: "at least one row id",
        });
    }
    Ok(ids)
}

/// `Ok(None)` for a blank line.
pub fn parse_line(line: &str) -> Result<Option<Input>, InputError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let input = match command {
        "next" | "n" => Input::Request(Request::Next),
        "prev" | "previous" | "p" => Input::Request(Request::Previous),
        "toggle" | "t" => Input::Request(Request::PlayOrPause),
        "stop" => Input::Request(Request::Stop),
        "seek" => {
            let (Some(x), Some(width)) = (words.next(), words.next()) else {
                return Err(InputError::Missing {
                    command: "seek",
                    what: "a position and a width",
                });
            };
            Input::Request(Request::SeekAt {
                x: number(x)?,
                width: number(width)?,
            })
        }
        "play" => {
            let id = words.next().ok_or(InputError::Missing {
                command: "play",
                what: "a row id",
            })?;
            Input::Request(Request::ChangeTrack(RowId(number(id)?)))
        }
        "sort" => Input::Request(Request::SortPlaylist(ids("sort", words)?)),
        "remove" | "rm" => Input::Request(Request::RemovePlaylist(ids("remove", words)?)),
        "clear" => Input::Request(Request::ClearPlaylist),
        "connect" => Input::Request(Request::ConnectionRefresh),
        "status" | "s" => Input::Status,
        "list" | "ls" => Input::List,
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => return Err(InputError::Unknown(other.to_string())),
    };
    Ok(Some(input))
}
