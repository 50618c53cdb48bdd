//! Line-oriented command language read from stdin.

use anyhow::{bail, Context, Result};
use vireo_core::SessionCommand;

/// A parsed driver command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCommand {
    /// Forwarded to the session as is.
    Session(SessionCommand),
    /// Connect to a device by id (resolved against discovered/configured devices).
    Connect(String),
    /// Disconnect a device by id.
    Disconnect(String),
    /// Print the current state.
    State,
    Quit,
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<DriverCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb, args.as_slice()) {
        ("init", [id]) => DriverCommand::Session(SessionCommand::InitSingle {
            id: id.to_string(),
        }),
        ("playlist", [start, ids @ ..]) if !ids.is_empty() => {
            let start_index = start
                .parse()
                .with_context(|| format!("invalid start index: {start}"))?;
            DriverCommand::Session(SessionCommand::InitPlaylist {
                ids: ids.iter().map(|id| id.to_string()).collect(),
                start_index,
            })
        }
        ("open", []) => DriverCommand::Session(SessionCommand::OpenDevicePicker),
        ("close", []) => DriverCommand::Session(SessionCommand::CloseDevicePicker),
        ("connect", [device]) => DriverCommand::Connect(device.to_string()),
        ("disconnect", [device]) => DriverCommand::Disconnect(device.to_string()),
        ("record", []) => DriverCommand::Session(SessionCommand::ToggleRecording),
        ("fav", [url]) => DriverCommand::Session(SessionCommand::ToggleFavourite {
            url: url.to_string(),
        }),
        ("install", [uri]) => DriverCommand::Session(SessionCommand::InstallMedia {
            uri: uri.to_string(),
        }),
        ("uninstall", []) => DriverCommand::Session(SessionCommand::UninstallMedia),
        ("mute", []) => DriverCommand::Session(SessionCommand::ToggleMute),
        ("state", []) => DriverCommand::State,
        ("quit" | "exit", []) => DriverCommand::Quit,
        _ => bail!("unrecognized command: {line}"),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_playlist_with_start_index() {
        let command = parse_line("playlist 1 a b c").unwrap().unwrap();
        assert_eq!(
            command,
            DriverCommand::Session(SessionCommand::InitPlaylist {
                ids: vec!["a".into(), "b".into(), "c".into()],
                start_index: 1,
            })
        );
    }

    #[test]
    fn out_of_range_start_index_is_kept() {
        let command = parse_line("playlist 9 a").unwrap().unwrap();
        assert!(matches!(
            command,
            DriverCommand::Session(SessionCommand::InitPlaylist { start_index: 9, .. })
        ));
    }

    #[test]
    fn parses_device_commands() {
        assert_eq!(
            parse_line("connect tv").unwrap(),
            Some(DriverCommand::Connect("tv".into()))
        );
        assert_eq!(
            parse_line("  disconnect tv  ").unwrap(),
            Some(DriverCommand::Disconnect("tv".into()))
        );
    }

    #[test]
    fn skips_blank_lines_and_comments() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# open the picker").unwrap(), None);
    }

    #[test]
    fn rejects_unknown_or_malformed_commands() {
        assert!(parse_line("rewind").is_err());
        assert!(parse_line("init").is_err());
        assert!(parse_line("playlist x a").is_err());
        assert!(parse_line("playlist 0").is_err());
        assert!(parse_line("mute now").is_err());
    }
}
