//! Command-line argument parsing.

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Send one message and stream the reply
    Send { chat_id: i64, content: String },
    /// Arguments could not be understood
    Invalid(String),
}

/// Usage text printed for `--help` and on bad arguments.
pub const USAGE: &str = "usage: streamchat <chat-id> <message...>\n       streamchat --version";

/// Parse command-line arguments.
///
/// # Examples
///
/// ```
/// use streamchat::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["streamchat".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let args: Vec<String> = args.skip(1).collect();

    if args.iter().any(|a| a == "--version" || a == "-V") {
        return CliCommand::Version;
    }
    if args.iter().any(|a| a == "--help" || a == "-h") {
        return CliCommand::Help;
    }

    let Some((first, rest)) = args.split_first() else {
        return CliCommand::Invalid("missing chat id".to_string());
    };
    let Ok(chat_id) = first.parse::<i64>() else {
        return CliCommand::Invalid(format!("invalid chat id: {}", first));
    };

    let content = rest.join(" ");
    if content.trim().is_empty() {
        return CliCommand::Invalid("missing message".to_string());
    }

    CliCommand::Send { chat_id, content }
}
