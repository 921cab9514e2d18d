#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List { json: bool },
    Now,
    Watch(WatchOptions),
    Help,
    Version,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Title fragments; every upcoming run matching one gets a reminder.
    pub remind: Vec<String>,
    /// Print the current-event notice after every refresh.
    pub notify_current: bool,
}

pub fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(first) = args.next() else {
        return Ok(Command::List { json: false });
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-V" | "--version" => Ok(Command::Version),
        "list" => {
            let mut json = false;
            for arg in args {
                match arg.as_str() {
                    "--json" => json = true,
                    _ => return Err(format!("Unknown argument: {arg}")),
                }
            }
            Ok(Command::List { json })
        }
        "now" => match args.next() {
            None => Ok(Command::Now),
            Some(arg) => Err(format!("Unknown argument: {arg}")),
        },
        "watch" => {
            let mut options = WatchOptions::default();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--notify-current" => options.notify_current = true,
                    "--remind" => match args.next() {
                        Some(text) if !text.trim().is_empty() => options.remind.push(text),
                        _ => return Err("--remind needs a game title".into()),
                    },
                    _ => return Err(format!("Unknown argument: {arg}")),
                }
            }
            Ok(Command::Watch(options))
        }
        _ => Err(format!("Unknown argument: {first}")),
    }
}

pub fn usage_text() -> &'static str {
    "gdq-schedule - Games Done Quick schedule in your terminal

Usage:
  gdq-schedule [list] [--json]
  gdq-schedule now
  gdq-schedule watch [--remind <title>]... [--notify-current]
  gdq-schedule --help
  gdq-schedule --version

Environment:
  GDQ_SCHEDULE_URL    Schedule page URL (default https://gamesdonequick.com/schedule)
  GDQ_SCHEDULE_HTML   Path to a saved schedule page, read instead of the network
  GDQ_REFRESH_SECS    Re-fetch interval in watch mode (default 600, minimum 30)
  GDQ_CLOCK_SECS      Clock tick in watch mode (default 60)
  GDQ_LOG_LEVEL       Default log level (default warn); RUST_LOG overrides"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_lists_schedule() {
        assert_eq!(parse(&[]), Ok(Command::List { json: false }));
        assert_eq!(parse(&["list", "--json"]), Ok(Command::List { json: true }));
    }

    #[test]
    fn watch_collects_reminders() {
        assert_eq!(
            parse(&["watch", "--remind", "Mario", "--notify-current", "--remind", "zelda"]),
            Ok(Command::Watch(WatchOptions {
                remind: vec!["Mario".into(), "zelda".into()],
                notify_current: true,
            }))
        );
    }

    #[test]
    fn remind_without_title_is_rejected() {
        assert!(parse(&["watch", "--remind"]).is_err());
        assert!(parse(&["watch", "--remind", " "]).is_err());
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        assert_eq!(parse(&["--frobnicate"]), Err("Unknown argument: --frobnicate".into()));
        assert!(parse(&["now", "extra"]).is_err());
        assert!(parse(&["list", "--xml"]).is_err());
    }

    #[test]
    fn help_and_version() {
        assert_eq!(parse(&["-h"]), Ok(Command::Help));
        assert_eq!(parse(&["--version"]), Ok(Command::Version));
    }
}
