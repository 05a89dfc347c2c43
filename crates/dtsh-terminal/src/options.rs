//! Command options, parameters, and GNU getopt style argv parsing.
//!
//! Definitions are static: a command declares its [`OptionSpec`]s and an
//! optional [`ParamSpec`]. Each invocation parses argv into a fresh
//! [`ParsedArgs`], so nothing is carried over from one command line to the
//! next.

use dtsh_types::error::{DtshError, Result};

/// Whether an option is a boolean flag or expects a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Flag,
    /// Takes exactly one value, shown as `<placeholder>` in usage text.
    Arg { placeholder: &'static str },
}

/// A command option, with a short (`-x`) and/or long (`--xxx`) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub short: Option<char>,
    pub long: Option<&'static str>,
    pub brief: &'static str,
    pub kind: OptionKind,
}

impl OptionSpec {
    pub const fn flag(short: Option<char>, long: Option<&'static str>, brief: &'static str) -> Self {
        Self {
            short,
            long,
            brief,
            kind: OptionKind::Flag,
        }
    }

    pub const fn arg(
        short: Option<char>,
        long: Option<&'static str>,
        placeholder: &'static str,
        brief: &'static str,
    ) -> Self {
        Self {
            short,
            long,
            brief,
            kind: OptionKind::Arg { placeholder },
        }
    }

    pub fn is_flag(&self) -> bool {
        self.kind == OptionKind::Flag
    }

    /// Usage form, e.g. `-h --help` or `--order-by <key>`.
    pub fn usage(&self) -> String {
        let mut names = Vec::with_capacity(2);
        if let Some(short) = self.short {
            names.push(format!("-{short}"));
        }
        if let Some(long) = self.long {
            names.push(format!("--{long}"));
        }
        let mut text = names.join(" ");
        if let OptionKind::Arg { placeholder } = self.kind {
            text.push_str(&format!(" <{placeholder}>"));
        }
        text
    }

    /// Preferred name on the command line: `-x` if the option has a short
    /// form, `--xxx` otherwise.
    pub fn display_name(&self) -> String {
        match (self.short, self.long) {
            (Some(short), _) => format!("-{short}"),
            (None, Some(long)) => format!("--{long}"),
            (None, None) => String::new(),
        }
    }
}

/// Implicit on every command.
pub const HELP: OptionSpec = OptionSpec::flag(Some('h'), Some("help"), "print command usage");

/// Implicit on commands that support paging.
pub const PAGER: OptionSpec = OptionSpec::flag(None, Some("pager"), "page command output");

/// How many positional parameters a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Zero or one.
    Optional,
    /// Exactly one.
    Required,
    /// Any number.
    Variadic,
}

/// What a positional parameter designates; drives auto-completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    NodePath,
    AliasName,
    ChosenName,
}

/// The positional parameter of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub brief: &'static str,
    pub arity: Arity,
    pub kind: ParamKind,
}

impl ParamSpec {
    pub fn usage(&self) -> String {
        match self.arity {
            Arity::Optional => format!("[{}]", self.name),
            Arity::Required => format!("<{}>", self.name),
            Arity::Variadic => format!("[{}]...", self.name),
        }
    }
}

/// Options and parameters set by one command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    options: Vec<(OptionSpec, Option<String>)>,
    pub params: Vec<String>,
    /// The help flag was given: print usage instead of executing.
    pub help: bool,
}

impl ParsedArgs {
    /// Whether the flag was given.
    pub fn flag(&self, spec: &OptionSpec) -> bool {
        self.options.iter().any(|(s, _)| s == spec)
    }

    /// Value of the last occurrence of an argument option.
    pub fn value(&self, spec: &OptionSpec) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(s, _)| s == spec)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn pager(&self) -> bool {
        self.flag(&PAGER)
    }
}

fn find_long<'o>(command: &str, options: &'o [OptionSpec], name: &str) -> Result<&'o OptionSpec> {
    if let Some(exact) = options.iter().find(|o| o.long == Some(name)) {
        return Ok(exact);
    }
    let mut candidates = options
        .iter()
        .filter(|o| o.long.is_some_and(|long| long.starts_with(name)));
    match (candidates.next(), candidates.next()) {
        (Some(only), None) if !name.is_empty() => Ok(only),
        (Some(_), Some(_)) => Err(DtshError::usage(command, format!("option '--{name}' is ambiguous"))),
        _ => Err(DtshError::usage(command, format!("unrecognized option '--{name}'"))),
    }
}

/// Parse `argv` against a command's options and parameter.
///
/// Options may appear anywhere; `--` ends option parsing. When the help flag
/// is present the parameter arity is not checked.
pub fn parse_argv(
    command: &str,
    options: &[OptionSpec],
    param: Option<&ParamSpec>,
    argv: &[String],
) -> Result<ParsedArgs> {
    let mut parsed = ParsedArgs::default();
    let mut tokens = argv.iter();
    let mut only_params = false;

    while let Some(token) = tokens.next() {
        if only_params || token == "-" || !token.starts_with('-') {
            parsed.params.push(token.clone());
            continue;
        }
        if token == "--" {
            only_params = true;
            continue;
        }

        if let Some(long) = token.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (long, None),
            };
            let spec = find_long(command, options, name)?;
            let full = spec.long.unwrap_or(name);
            let value = match spec.kind {
                OptionKind::Flag if inline.is_some() => {
                    return Err(DtshError::usage(
                        command,
                        format!("option '--{full}' doesn't allow an argument"),
                    ));
                },
                OptionKind::Flag => None,
                OptionKind::Arg { .. } => match inline.or_else(|| tokens.next().cloned()) {
                    Some(value) => Some(value),
                    None => {
                        return Err(DtshError::usage(
                            command,
                            format!("option '--{full}' requires an argument"),
                        ));
                    },
                },
            };
            parsed.options.push((*spec, value));
            continue;
        }

        // Cluster of short options: -rR, -E -i, --order-by's -o style values.
        let cluster = &token[1..];
        for (i, c) in cluster.char_indices() {
            let spec = options
                .iter()
                .find(|o| o.short == Some(c))
                .ok_or_else(|| DtshError::usage(command, format!("unrecognized option '-{c}'")))?;
            if spec.is_flag() {
                parsed.options.push((*spec, None));
                continue;
            }
            let rest = &cluster[i + c.len_utf8()..];
            let value = if rest.is_empty() {
                tokens
                    .next()
                    .cloned()
                    .ok_or_else(|| DtshError::usage(command, format!("option '-{c}' requires an argument")))?
            } else {
                rest.to_string()
            };
            parsed.options.push((*spec, Some(value)));
            break;
        }
    }

    parsed.help = parsed.flag(&HELP);
    if !parsed.help {
        check_arity(command, param, &parsed.params)?;
    }
    Ok(parsed)
}

fn check_arity(command: &str, param: Option<&ParamSpec>, params: &[String]) -> Result<()> {
    let too_many = || DtshError::usage(command, "too many parameters");
    match param {
        None if !params.is_empty() => Err(too_many()),
        None => Ok(()),
        Some(spec) => match (spec.arity, params.len()) {
            (Arity::Required, 0) => Err(DtshError::usage(command, format!("missing parameter '{}'", spec.name))),
            (Arity::Optional | Arity::Required, n) if n > 1 => Err(too_many()),
            _ => Ok(()),
        },
    }
}

/// One-line synopsis: `ls [-d] [-r] [--order-by <key>] [path]...`.
pub fn synopsis(command: &str, options: &[OptionSpec], param: Option<&ParamSpec>) -> String {
    let mut text = command.to_string();
    for option in options {
        text.push_str(&format!(" [{}]", option.usage()));
    }
    if let Some(param) = param {
        text.push(' ');
        text.push_str(&param.usage());
    }
    text
}

/// Full help text: description, synopsis, then one line per option.
pub fn help_text(
    command: &str,
    description: &str,
    options: &[OptionSpec],
    param: Option<&ParamSpec>,
) -> String {
    let mut lines = vec![
        format!("{command}: {description}"),
        String::new(),
        format!("usage: {}", synopsis(command, options, param)),
    ];
    if !options.is_empty() {
        let width = options.iter().map(|o| o.usage().len()).max().unwrap_or(0);
        lines.push(String::new());
        lines.push("options:".to_string());
        for option in options {
            lines.push(format!("  {:<width$}  {}", option.usage(), option.brief));
        }
    }
    if let Some(param) = param {
        lines.push(String::new());
        lines.push(format!("  {}  {}", param.name, param.brief));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const REVERSE: OptionSpec = OptionSpec::flag(Some('r'), None, "reverse command output");
    const RECURSIVE: OptionSpec = OptionSpec::flag(Some('R'), None, "list recursively");
    const ENABLED_ONLY: OptionSpec = OptionSpec::flag(None, Some("enabled-only"), "filter out disabled nodes");
    const ORDER_BY: OptionSpec = OptionSpec::arg(None, Some("order-by"), "key", "sort nodes or branches");
    const DEPTH: OptionSpec = OptionSpec::arg(Some('D'), Some("fixed-depth"), "depth", "limit devicetree depth");
    const OR: OptionSpec = OptionSpec::flag(None, Some("OR"), "match any criterion instead of all");
    const ON_BUS: OptionSpec = OptionSpec::arg(None, Some("on-bus"), "pattern", "match bus of appearance");

    const PATHS: ParamSpec = ParamSpec {
        name: "path",
        brief: "devicetree path",
        arity: Arity::Variadic,
        kind: ParamKind::NodePath,
    };
    const ONE: ParamSpec = ParamSpec {
        name: "path",
        brief: "devicetree path",
        arity: Arity::Required,
        kind: ParamKind::NodePath,
    };

    fn options() -> Vec<OptionSpec> {
        vec![REVERSE, RECURSIVE, ENABLED_ONLY, ORDER_BY, DEPTH, OR, ON_BUS, HELP, PAGER]
    }

    fn argv(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn parse(line: &str) -> Result<ParsedArgs> {
        parse_argv("ls", &options(), Some(&PATHS), &argv(line))
    }

    fn usage_message(err: DtshError) -> String {
        match err {
            DtshError::Usage { command, message } => {
                assert_eq!(command, "ls");
                message
            },
            other => panic!("expected usage error, got {other:?}"),
        }
    }

    #[test]
    fn flags_and_params_interleave() {
        let args = parse("/soc -r --enabled-only /leds").unwrap();
        assert!(args.flag(&REVERSE));
        assert!(args.flag(&ENABLED_ONLY));
        assert!(!args.flag(&RECURSIVE));
        assert_eq!(args.params, ["/soc", "/leds"]);
        assert!(!args.help);
    }

    #[test]
    fn short_flags_cluster() {
        let args = parse("-rR").unwrap();
        assert!(args.flag(&REVERSE));
        assert!(args.flag(&RECURSIVE));
    }

    #[test]
    fn long_arg_forms() {
        assert_eq!(parse("--order-by N").unwrap().value(&ORDER_BY), Some("N"));
        assert_eq!(parse("--order-by=a").unwrap().value(&ORDER_BY), Some("a"));
        // Last occurrence wins.
        assert_eq!(parse("--order-by a --order-by p").unwrap().value(&ORDER_BY), Some("p"));
    }

    #[test]
    fn short_arg_forms() {
        assert_eq!(parse("-D 2").unwrap().value(&DEPTH), Some("2"));
        assert_eq!(parse("-D2").unwrap().value(&DEPTH), Some("2"));
        assert_eq!(parse("-rD3").unwrap().value(&DEPTH), Some("3"));
    }

    #[test]
    fn arg_value_may_start_with_dash() {
        assert_eq!(parse("--on-bus -x").unwrap().value(&ON_BUS), Some("-x"));
    }

    #[test]
    fn unique_long_prefix() {
        assert!(parse("--enabled").unwrap().flag(&ENABLED_ONLY));
        assert_eq!(parse("--order b").unwrap().value(&ORDER_BY), Some("b"));
    }

    #[test]
    fn ambiguous_long_prefix() {
        let msg = usage_message(parse("--o x").unwrap_err());
        assert_eq!(msg, "option '--o' is ambiguous");
    }

    #[test]
    fn unknown_option_names_token() {
        assert_eq!(usage_message(parse("-x").unwrap_err()), "unrecognized option '-x'");
        assert_eq!(usage_message(parse("-rx").unwrap_err()), "unrecognized option '-x'");
        assert_eq!(usage_message(parse("--nope").unwrap_err()), "unrecognized option '--nope'");
    }

    #[test]
    fn missing_value() {
        assert_eq!(
            usage_message(parse("--order-by").unwrap_err()),
            "option '--order-by' requires an argument"
        );
        assert_eq!(usage_message(parse("-D").unwrap_err()), "option '-D' requires an argument");
    }

    #[test]
    fn flag_with_value() {
        assert_eq!(
            usage_message(parse("--enabled-only=yes").unwrap_err()),
            "option '--enabled-only' doesn't allow an argument"
        );
    }

    #[test]
    fn double_dash_ends_options() {
        let args = parse("-r -- -R").unwrap();
        assert!(args.flag(&REVERSE));
        assert!(!args.flag(&RECURSIVE));
        assert_eq!(args.params, ["-R"]);
    }

    #[test]
    fn help_is_not_an_error() {
        let args = parse_argv("ls", &options(), Some(&ONE), &argv("-h")).unwrap();
        assert!(args.help);
        // Arity is not checked when asking for help.
        let args = parse_argv("ls", &options(), None, &argv("a b --help")).unwrap();
        assert!(args.help);
    }

    #[test]
    fn arity() {
        let none = parse_argv("pwd", &[HELP], None, &argv("/soc")).unwrap_err();
        assert_eq!(format!("{none}"), "pwd: too many parameters");

        let missing = parse_argv("ls", &[HELP], Some(&ONE), &[]).unwrap_err();
        assert_eq!(usage_message(missing), "missing parameter 'path'");
        let extra = parse_argv("ls", &[HELP], Some(&ONE), &argv("a b")).unwrap_err();
        assert_eq!(usage_message(extra), "too many parameters");

        let optional = ParamSpec {
            arity: Arity::Optional,
            ..ONE
        };
        assert!(parse_argv("cd", &[HELP], Some(&optional), &[]).is_ok());
        assert!(parse_argv("cd", &[HELP], Some(&optional), &argv("a b")).is_err());
        assert_eq!(parse("a b c").unwrap().params.len(), 3);
    }

    #[test]
    fn fresh_state_per_parse() {
        let first = parse("-r /soc").unwrap();
        let second = parse("/leds").unwrap();
        assert!(first.flag(&REVERSE));
        assert!(!second.flag(&REVERSE));
        assert_eq!(second.params, ["/leds"]);
    }

    #[test]
    fn synopsis_and_help() {
        let opts = [REVERSE, ORDER_BY, HELP];
        assert_eq!(
            synopsis("ls", &opts, Some(&PATHS)),
            "ls [-r] [--order-by <key>] [-h --help] [path]..."
        );
        let help = help_text("ls", "list branch contents", &opts, Some(&PATHS));
        assert!(help.starts_with("ls: list branch contents\n"));
        assert!(help.contains("  --order-by <key>  sort nodes or branches"));
        assert!(help.contains("  -r                reverse command output"));
    }
}
