use crate::errors::ParseError;

/// Longest accepted input line, terminator included.
pub const MAX_LINE: usize = 1024;
/// Most whitespace-separated tokens one line may hold.
pub const MAX_TOKENS: usize = 512;
/// Most entries the argument vector may hold.
pub const MAX_ARGS: usize = 512;

/// Trailing argument that asks for background execution.
pub const BACKGROUND_MARKER: &str = "&";

/// How an output redirection opens its file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// `>`
    #[default]
    Truncate,
    /// `>>`
    Append,
}

/// Represents a parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command and its arguments. Never empty; the first entry is the path exactly as
    /// typed, and a trailing `&` is kept here.
    pub argv: Vec<String>,
    /// Input redirection file, if any.
    pub infile: Option<String>,
    /// Output redirection file, if any.
    pub outfile: Option<String>,
    /// Meaningful only when `outfile` is set.
    pub mode: OutputMode,
}

impl Command {
    /// The first argument as typed, directory prefix included.
    pub fn path(&self) -> &str {
        &self.argv[0]
    }

    /// The first argument with any directory prefix removed.
    pub fn program_name(&self) -> &str {
        let path = self.path();
        path.rsplit('/').next().unwrap_or(path)
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn is_background(&self) -> bool {
        self.argv.last().map(String::as_str) == Some(BACKGROUND_MARKER)
    }
}

/// Parses one input line.
///
/// Returns `Ok(None)` for a blank line, which the caller skips silently, and
/// `Ok(Some(command))` when there is something to run. A token containing `<`
/// takes the next token as the input file; a token containing `>>` or `>` does the
/// same for the output file. Each direction may appear once, and an operator may not
/// stand where a file name is expected.
pub fn parse_command_line(line: &str) -> Result<Option<Command>, ParseError> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut argv = Vec::new();
    let mut infile = None;
    let mut outfile = None;
    let mut mode = OutputMode::Truncate;
    // Set while the next token is the file operand of the previous operator.
    let mut awaiting_file = false;

    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1);
        if token.contains('<') {
            let file = next.ok_or(ParseError::MissingRedirectFile)?;
            if infile.is_some() {
                return Err(ParseError::MultipleInputs);
            }
            if awaiting_file {
                return Err(ParseError::ConsecutiveRedirects);
            }
            infile = Some(file.to_string());
            awaiting_file = true;
        } else if token.contains('>') {
            let file = next.ok_or(ParseError::MissingRedirectFile)?;
            if outfile.is_some() {
                return Err(ParseError::MultipleOutputs);
            }
            if awaiting_file {
                return Err(ParseError::ConsecutiveRedirects);
            }
            outfile = Some(file.to_string());
            mode = if token.contains(">>") {
                OutputMode::Append
            } else {
                OutputMode::Truncate
            };
            awaiting_file = true;
        } else if awaiting_file {
            awaiting_file = false;
        } else {
            if argv.len() >= MAX_ARGS {
                return Err(ParseError::TooManyArgs);
            }
            argv.push(token.to_string());
        }
    }

    if argv.is_empty() {
        return Err(ParseError::NoCommand);
    }
    Ok(Some(Command {
        argv,
        infile,
        outfile,
        mode,
    }))
}

/// Splits a line on spaces and tabs after dropping its trailing newline. A token that
/// was only the terminator therefore disappears.
fn tokenize(line: &str) -> Result<Vec<&str>, ParseError> {
    if line.len() > MAX_LINE {
        return Err(ParseError::LineTooLong);
    }
    if line.contains('\0') {
        return Err(ParseError::InteriorNul);
    }
    let line = line.strip_suffix('\n').unwrap_or(line);
    let tokens: Vec<&str> = line
        .split(|c| c == ' ' || c == '\t')
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.len() > MAX_TOKENS {
        return Err(ParseError::TooManyTokens);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        parse_command_line(line).unwrap().unwrap()
    }

    #[test]
    fn tokenize_splits_on_blanks() {
        assert_eq!(tokenize("ls -l\n").unwrap(), vec!["ls", "-l"]);
        assert_eq!(tokenize(" \tls\t\t-l  ").unwrap(), vec!["ls", "-l"]);
    }

    #[test]
    fn tokenize_keeps_quotes_literal() {
        assert_eq!(
            tokenize("echo \"hello world\"").unwrap(),
            vec!["echo", "\"hello", "world\""]
        );
    }

    #[test]
    fn redirects_both_directions() {
        let cmd = parse("echo hi < in.txt > out.txt\n");
        assert_eq!(cmd.argv, vec!["echo", "hi"]);
        assert_eq!(cmd.infile.as_deref(), Some("in.txt"));
        assert_eq!(cmd.outfile.as_deref(), Some("out.txt"));
        assert_eq!(cmd.mode, OutputMode::Truncate);
    }

    #[test]
    fn double_angle_appends() {
        let cmd = parse("cmd >> out\n");
        assert_eq!(cmd.argv, vec!["cmd"]);
        assert_eq!(cmd.outfile.as_deref(), Some("out"));
        assert_eq!(cmd.mode, OutputMode::Append);
    }

    #[test]
    fn redirect_may_come_first() {
        let cmd = parse("< in /bin/cat -n\n");
        assert_eq!(cmd.argv, vec!["/bin/cat", "-n"]);
        assert_eq!(cmd.infile.as_deref(), Some("in"));
        assert_eq!(cmd.outfile, None);
    }

    #[test]
    fn operator_glued_to_a_word_is_still_an_operator() {
        // The whole token is the operator; the file is always the following token.
        let cmd = parse("sort a>b c\n");
        assert_eq!(cmd.argv, vec!["sort"]);
        assert_eq!(cmd.outfile.as_deref(), Some("c"));
    }

    #[test]
    fn missing_redirect_file() {
        assert_eq!(parse_command_line("cmd <\n"), Err(ParseError::MissingRedirectFile));
        assert_eq!(parse_command_line("cmd >>"), Err(ParseError::MissingRedirectFile));
        assert_eq!(parse_command_line("cmd > \n"), Err(ParseError::MissingRedirectFile));
    }

    #[test]
    fn duplicate_redirects() {
        assert_eq!(parse_command_line("cmd < a < b\n"), Err(ParseError::MultipleInputs));
        assert_eq!(parse_command_line("cmd > a >> b\n"), Err(ParseError::MultipleOutputs));
    }

    #[test]
    fn consecutive_redirects() {
        assert_eq!(
            parse_command_line("cmd < > out\n"),
            Err(ParseError::ConsecutiveRedirects)
        );
        assert_eq!(
            parse_command_line("cmd > < in\n"),
            Err(ParseError::ConsecutiveRedirects)
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_command_line(""), Ok(None));
        assert_eq!(parse_command_line("\n"), Ok(None));
        assert_eq!(parse_command_line(" \t \n"), Ok(None));
    }

    #[test]
    fn only_redirections_is_no_command() {
        assert_eq!(parse_command_line("< in > out\n"), Err(ParseError::NoCommand));
    }

    #[test]
    fn strips_terminator_from_last_argument() {
        let cmd = parse("/bin/sleep 5 &\n");
        assert_eq!(cmd.argv, vec!["/bin/sleep", "5", "&"]);
        assert!(cmd.is_background());
        assert!(!parse("sleep 5&\n").is_background());
    }

    #[test]
    fn path_and_program_name() {
        let cmd = parse("/usr/bin/env -i\n");
        assert_eq!(cmd.path(), "/usr/bin/env");
        assert_eq!(cmd.program_name(), "env");
        assert_eq!(cmd.args(), ["-i"]);
        assert_eq!(parse("ls\n").program_name(), "ls");
    }

    #[test]
    fn enforces_bounds() {
        let long = "a".repeat(MAX_LINE + 1);
        assert_eq!(parse_command_line(&long), Err(ParseError::LineTooLong));

        // A full-length line holds at most MAX_TOKENS single-byte words.
        let exactly = "a ".repeat(MAX_TOKENS);
        assert_eq!(exactly.len(), MAX_LINE);
        assert_eq!(parse(&exactly).argv.len(), MAX_ARGS);

        assert_eq!(parse_command_line("a\0b"), Err(ParseError::InteriorNul));
    }
}
