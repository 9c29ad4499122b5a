//! Line commands read by `fbmirror run`.
//!
//! ```text
//! down X Y
//! move X Y [held]
//! up X Y
//! button NAME
//! key CODE
//! expose
//! quit
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use anyhow::{anyhow, bail, Context};
use fbmirror_session::UiEvent;
use fbmirror_types::HardwareButton;

/// Parse one line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> anyhow::Result<Option<UiEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let event = match command.to_ascii_lowercase().as_str() {
        "down" => {
            let (x, y) = point(&args, 2)?;
            UiEvent::PointerDown { x, y }
        }
        "move" => {
            let (x, y) = point(&args, 3)?;
            let held = match args.get(2) {
                None => false,
                Some(&"held") => true,
                Some(other) => bail!("expected `held`, got `{other}`"),
            };
            UiEvent::PointerMove { x, y, held }
        }
        "up" => {
            let (x, y) = point(&args, 2)?;
            UiEvent::PointerUp { x, y }
        }
        "button" => {
            let [name] = args.as_slice() else {
                bail!("usage: button NAME");
            };
            UiEvent::Button(name.parse::<HardwareButton>()?)
        }
        "key" => {
            let [code] = args.as_slice() else {
                bail!("usage: key CODE");
            };
            UiEvent::Key(code.parse().with_context(|| format!("invalid key code `{code}`"))?)
        }
        "expose" => UiEvent::Expose,
        "quit" | "exit" => UiEvent::Shutdown,
        other => bail!("unknown command `{other}`"),
    };
    Ok(Some(event))
}

fn point(args: &[&str], max_args: usize) -> anyhow::Result<(i32, i32)> {
    if args.len() < 2 || args.len() > max_args {
        bail!("expected X Y coordinates");
    }
    let coord = |s: &str| {
        s.parse::<i32>()
            .map_err(|e| anyhow!("invalid coordinate `{s}`: {e}"))
    };
    Ok((coord(args[0])?, coord(args[1])?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pointer_commands() {
        assert_eq!(
            parse_line("down 10 20").unwrap(),
            Some(UiEvent::PointerDown { x: 10, y: 20 })
        );
        assert_eq!(
            parse_line("  move 1 2 held ").unwrap(),
            Some(UiEvent::PointerMove { x: 1, y: 2, held: true })
        );
        assert_eq!(
            parse_line("move 1 2").unwrap(),
            Some(UiEvent::PointerMove { x: 1, y: 2, held: false })
        );
        assert_eq!(
            parse_line("UP 3 4").unwrap(),
            Some(UiEvent::PointerUp { x: 3, y: 4 })
        );
    }

    #[test]
    fn parses_buttons_and_keys() {
        assert_eq!(
            parse_line("button volume_up").unwrap(),
            Some(UiEvent::Button(HardwareButton::VolumeUp))
        );
        assert_eq!(parse_line("key 158").unwrap(), Some(UiEvent::Key(158)));
        assert_eq!(parse_line("expose").unwrap(), Some(UiEvent::Expose));
        assert_eq!(parse_line("quit").unwrap(), Some(UiEvent::Shutdown));
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# tap back").unwrap(), None);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_line("down 10").is_err());
        assert!(parse_line("down x 10").is_err());
        assert!(parse_line("move 1 2 pressed").is_err());
        assert!(parse_line("button jump").is_err());
        assert!(parse_line("key 70000").is_err());
        assert!(parse_line("dance").is_err());
    }
}
