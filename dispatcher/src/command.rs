//! Command parsing: `/name[@botname] [args]`.

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name without the leading `/` or `@botname` suffix.
    pub name: String,
    /// `@botname` suffix, if present.
    pub mention: Option<String>,
    /// Trimmed text after the command token.
    pub args: String,
}

/// Parses the command at the start of `text`.
///
/// Returns `None` when the text is not a command, or when it is addressed to another bot
/// (`/cmd@other_bot`). When `bot_username` is unknown every suffix is accepted.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let rest = text.strip_prefix('/')?;
    let (token, args) = match rest.find(char::is_whitespace) {
        Some(i) => (&rest[..i], rest[i..].trim()),
        None => (rest, ""),
    };
    let (name, mention) = match token.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (token, None),
    };
    if name.is_empty() {
        return None;
    }
    if let (Some(mention), Some(username)) = (mention, bot_username) {
        if !mention.eq_ignore_ascii_case(username) {
            return None;
        }
    }
    Some(Command {
        name: name.to_string(),
        mention: mention.map(str::to_string),
        args: args.to_string(),
    })
}
