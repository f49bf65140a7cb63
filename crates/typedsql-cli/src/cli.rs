use std::path::PathBuf;

pub const DEFAULT_CONFIG: &str = "typedsql.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Tokenize,
    Fmt,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Tokenize(TokenizeArgs),
    Fmt(FmtArgs),
}

#[derive(Debug, Clone)]
pub struct TokenizeArgs {
    pub config: PathBuf,
    /// `None` reads stdin.
    pub file: Option<PathBuf>,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct FmtArgs {
    pub config: PathBuf,
    pub file: Option<PathBuf>,
    pub extra_indent: usize,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1).map(String::as_str);

    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first {
        "-h" | "--help" | "help" => Ok(Command::Help(HelpTopic::Root)),
        "tokenize" => parse_tokenize(it),
        "fmt" => parse_fmt(it),
        other => anyhow::bail!("unknown command: {other}"),
    }
}

fn parse_config_flag<'a>(
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<Option<PathBuf>> {
    if token == "--config" {
        let Some(v) = it.next() else {
            anyhow::bail!("--config requires a value");
        };
        return Ok(Some(PathBuf::from(v)));
    }
    if let Some(v) = token.strip_prefix("--config=") {
        return Ok(Some(PathBuf::from(v)));
    }
    Ok(None)
}

fn set_file(file: &mut Option<PathBuf>, token: &str) -> anyhow::Result<()> {
    if let Some(existing) = file {
        anyhow::bail!(
            "only one input file is accepted (got {} and {token})",
            existing.display()
        );
    }
    *file = Some(PathBuf::from(token));
    Ok(())
}

fn parse_tokenize<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut file: Option<PathBuf> = None;
    let mut json = false;

    while let Some(token) = it.next() {
        if let Some(path) = parse_config_flag(token, &mut it)? {
            config = path;
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Tokenize)),
            "--json" => json = true,
            "-" => {}
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other => set_file(&mut file, other)?,
        }
    }

    Ok(Command::Tokenize(TokenizeArgs { config, file, json }))
}

fn parse_fmt<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut file: Option<PathBuf> = None;
    let mut extra_indent = 0usize;

    while let Some(token) = it.next() {
        if let Some(path) = parse_config_flag(token, &mut it)? {
            config = path;
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Fmt)),
            "--extra-indent" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--extra-indent requires a value");
                };
                extra_indent = parse_indent(v)?;
            }
            _ if token.starts_with("--extra-indent=") => {
                extra_indent = parse_indent(token.trim_start_matches("--extra-indent="))?;
            }
            "-" => {}
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other => set_file(&mut file, other)?,
        }
    }

    Ok(Command::Fmt(FmtArgs {
        config,
        file,
        extra_indent,
    }))
}

fn parse_indent(v: &str) -> anyhow::Result<usize> {
    v.parse::<usize>()
        .map_err(|_| anyhow::anyhow!("--extra-indent must be a non-negative integer, got: {v}"))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "typedsql - tools for raw SQL fragments

USAGE:
  typedsql <COMMAND> [OPTIONS]

COMMANDS:
  tokenize   Split a SQL fragment into tokens
  fmt        Re-indent a SQL fragment the way the renderer embeds it

Run `typedsql <COMMAND> --help` for command options.

ENVIRONMENT:
  TYPEDSQL_LOG   tracing filter, e.g. typedsql=trace"
            );
        }
        HelpTopic::Tokenize => {
            println!(
                "typedsql tokenize - split a SQL fragment into tokens

USAGE:
  typedsql tokenize [FILE] [OPTIONS]

Reads stdin when FILE is omitted or `-`.

OPTIONS:
  --config <FILE>   Config file path (default: typedsql.toml, optional)
  --json            Print tokens as JSON
  -h, --help        Print help"
            );
        }
        HelpTopic::Fmt => {
            println!(
                "typedsql fmt - re-indent a SQL fragment

USAGE:
  typedsql fmt [FILE] [OPTIONS]

Reads stdin when FILE is omitted or `-`. The fragment is checked with the
tokenizer, stripped of its common indentation, and printed with continuation
lines shifted right by one column plus the extra indent.

OPTIONS:
  --config <FILE>          Config file path (default: typedsql.toml, optional)
  --extra-indent <N>       Additional continuation indent (default: 0)
  -h, --help               Print help"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("typedsql")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn no_args_prints_root_help() {
        let cmd = parse_args(&args(&[])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Root)));
    }

    #[test]
    fn parse_tokenize_with_file_and_json() {
        let cmd = parse_args(&args(&["tokenize", "--json", "q.sql", "--config=conf.toml"])).unwrap();
        let Command::Tokenize(t) = cmd else {
            panic!("expected tokenize");
        };
        assert!(t.json);
        assert_eq!(t.file, Some(PathBuf::from("q.sql")));
        assert_eq!(t.config, PathBuf::from("conf.toml"));
    }

    #[test]
    fn parse_fmt_defaults_to_stdin() {
        let cmd = parse_args(&args(&["fmt", "--extra-indent", "4"])).unwrap();
        let Command::Fmt(f) = cmd else {
            panic!("expected fmt");
        };
        assert_eq!(f.file, None);
        assert_eq!(f.extra_indent, 4);
        assert_eq!(f.config, PathBuf::from(DEFAULT_CONFIG));
    }

    #[test]
    fn subcommand_help() {
        let cmd = parse_args(&args(&["fmt", "-h"])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Fmt)));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse_args(&args(&["lint"])).is_err());
        assert!(parse_args(&args(&["tokenize", "--verbose"])).is_err());
        assert!(parse_args(&args(&["tokenize", "a.sql", "b.sql"])).is_err());
        assert!(parse_args(&args(&["fmt", "--extra-indent=-1"])).is_err());
        assert!(parse_args(&args(&["fmt", "--config"])).is_err());
    }
}
