use std::path::PathBuf;

use chatline::filter::CategoryFilter;
use chatline::models::MessageId;

/// Something the user typed into the composer.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Text(String),
    Filter(CategoryFilter),
    /// Empty query leaves search mode
    Search(String),
    Older,
    Favorite(MessageId),
    Pin(MessageId),
    Unpin,
    Send(Vec<PathBuf>),
    Zip(Vec<PathBuf>),
    Voice(PathBuf),
    Geo,
    /// Zero-based index into the sticker set
    Sticker(usize),
    Emoji(usize),
    Encrypt,
    Decrypt {
        id: MessageId,
        passphrase: Option<String>,
    },
    Import(PathBuf),
    Export,
    Help,
    Quit,
}

pub const HELP: &[(&str, &str)] = &[
    ("/filter <all|favorites|type>", "Show only one category"),
    ("/search <text>", "Search on the server (empty to clear)"),
    ("/older", "Load older messages (or PageUp at the top)"),
    ("/fav <id>", "Toggle favorite"),
    ("/pin <id>", "Pin a message"),
    ("/unpin", "Hide the pinned banner"),
    ("/send <path>...", "Upload files one by one"),
    ("/zip <path>...", "Upload files as one ZIP archive"),
    ("/voice <path>", "Send an audio recording"),
    ("/geo", "Share your location"),
    ("/sticker <n>", "Send sticker n"),
    ("/emoji <n>", "Insert emoji n"),
    ("/encrypt", "Toggle passphrase encryption"),
    ("/decrypt <id> [pass]", "Show the plaintext of a secret message"),
    ("/import <path>", "Import an exported history"),
    ("/export", "Show the export link"),
    ("/quit", "Leave (or Esc)"),
];

/// Parse one line from the composer. `Ok(None)` for blank input.
pub fn parse(line: &str) -> Result<Option<UserCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.starts_with('/') {
        return Ok(Some(UserCommand::Text(line.to_string())));
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match name {
        "/filter" => UserCommand::Filter(
            first(&args, "/filter needs a category")?
                .parse::<CategoryFilter>()
                .map_err(|e| e.user_message())?,
        ),
        "/search" => UserCommand::Search(rest.to_string()),
        "/older" => UserCommand::Older,
        "/fav" => UserCommand::Favorite(id_arg(&args, "/fav")?),
        "/pin" => UserCommand::Pin(id_arg(&args, "/pin")?),
        "/unpin" => UserCommand::Unpin,
        "/send" => UserCommand::Send(paths(&args, "/send")?),
        "/zip" => UserCommand::Zip(paths(&args, "/zip")?),
        "/voice" => UserCommand::Voice(PathBuf::from(first(&args, "/voice needs a file")?)),
        "/geo" => UserCommand::Geo,
        "/sticker" => UserCommand::Sticker(number_arg(&args, "/sticker")?),
        "/emoji" => UserCommand::Emoji(number_arg(&args, "/emoji")?),
        "/encrypt" => UserCommand::Encrypt,
        "/decrypt" => UserCommand::Decrypt {
            id: id_arg(&args, "/decrypt")?,
            passphrase: args.get(1).map(|p| p.to_string()),
        },
        "/import" => UserCommand::Import(PathBuf::from(first(&args, "/import needs a file")?)),
        "/export" => UserCommand::Export,
        "/help" => UserCommand::Help,
        "/quit" => UserCommand::Quit,
        other => return Err(format!("Unknown command {} (try /help)", other)),
    };
    Ok(Some(command))
}

fn first<'a>(args: &[&'a str], missing: &str) -> Result<&'a str, String> {
    args.first().copied().ok_or_else(|| missing.to_string())
}

fn id_arg(args: &[&str], command: &str) -> Result<MessageId, String> {
    let raw = first(args, &format!("{} needs a message id", command))?;
    raw.parse::<MessageId>().map_err(|e| e.to_string())
}

// Palettes are numbered from 1 on screen
fn number_arg(args: &[&str], command: &str) -> Result<usize, String> {
    let raw = first(args, &format!("{} needs a number", command))?;
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("{}: \"{}\" is not a number from 1", command, raw)),
    }
}

fn paths(args: &[&str], command: &str) -> Result<Vec<PathBuf>, String> {
    if args.is_empty() {
        return Err(format!("{} needs at least one file", command));
    }
    Ok(args.iter().map(PathBuf::from).collect())
}
