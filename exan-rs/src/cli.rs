//! Command-line argument parsing.
//!
//! Usage:
//!   exan [-e<script>] [-f<file>] [-D<name>=<value>]... [-s<scale>] [-r<rounding>]
//!        [-c<config>] [-td]

use std::io::Read;
use std::path::PathBuf;

use crate::config::{check_scale, EvalConfig, Rounding};
use crate::expression::Expression;
use crate::value::Value;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Where the script comes from.
    pub script: ScriptSource,
    /// Initial variables (`-D<name>=<value>`), in command-line order.
    pub defines: Vec<(String, String)>,
    /// Division scale override (`-s<scale>`).
    pub scale: Option<i64>,
    /// Rounding override (`-r<mode>`).
    pub rounding: Option<Rounding>,
    /// Config-file specification.
    pub config: ConfigFile,
    /// Print the variable table after evaluating (`-t`).
    pub print_table: bool,
    /// Debug logging (`-d`).
    pub debug: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum ScriptSource {
    /// Read the script from standard input (default).
    #[default]
    Stdin,
    /// `-e<script>`.
    Inline(String),
    /// `-f<file>`.
    File(PathBuf),
}

/// How to choose the config file.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum ConfigFile {
    /// Look for `exanrc` in the user config directory, then the current
    /// directory (default).
    #[default]
    Search,
    /// `-c<file>`: load this specific file.
    Explicit(PathBuf),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        if !arg.starts_with('-') || arg == "-" {
            return Err(format!("unexpected argument: {arg}"));
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            let flag = chars[j];
            match flag {
                't' => args.print_table = true,
                'd' => args.debug = true,

                // Flags with a value: -x<value> or -x <value>
                'e' | 'f' | 'D' | 's' | 'r' | 'c' => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(format!("-{flag} requires an argument"));
                    };
                    apply_value(&mut args, flag, value)?;
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    Ok(args)
}

fn apply_value(args: &mut CliArgs, flag: char, value: String) -> Result<(), String> {
    match flag {
        'e' | 'f' if args.script != ScriptSource::Stdin => {
            return Err("only one of -e and -f may be given".to_owned());
        }
        'e' => args.script = ScriptSource::Inline(value),
        'f' => args.script = ScriptSource::File(PathBuf::from(value)),
        'D' => {
            let (name, val) = value
                .split_once('=')
                .ok_or_else(|| format!("-D expects name=value, got '{value}'"))?;
            args.defines.push((name.trim().to_owned(), val.to_owned()));
        }
        's' => {
            let scale = value
                .parse()
                .map_err(|_| format!("invalid scale: {value}"))?;
            args.scale = Some(check_scale(scale)?);
        }
        'r' => args.rounding = Some(value.parse()?),
        'c' => args.config = ConfigFile::Explicit(PathBuf::from(value)),
        _ => return Err(format!("unknown option: -{flag}")),
    }
    Ok(())
}

// ── Setup helpers ─────────────────────────────────────────────────────────────

/// Search for the config file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    let user = directories::ProjectDirs::from("", "", "exan").map(|d| d.config_dir().join("exanrc"));
    user.into_iter()
        .chain([PathBuf::from("./exanrc")])
        .find(|p| p.exists())
}

/// Build the evaluation settings: config file first, then flag overrides.
///
/// Returns the settings and any warnings about the config file.
pub fn build_config(args: &CliArgs) -> (EvalConfig, Vec<String>) {
    let path = match &args.config {
        ConfigFile::Explicit(p) => Some(p.clone()),
        ConfigFile::Search => find_user_config(),
    };

    let mut warnings = Vec::new();
    let mut config = match path {
        None => EvalConfig::default(),
        Some(path) => match EvalConfig::load_file(&path) {
            Ok((config, errors)) => {
                warnings.extend(errors.iter().map(|e| format!("{}: {e}", path.display())));
                config
            }
            Err(e) => {
                warnings.push(format!("{}: {e}", path.display()));
                EvalConfig::default()
            }
        },
    };

    if let Some(scale) = args.scale {
        config.division_scale = scale;
    }
    if let Some(rounding) = args.rounding {
        config.rounding = rounding;
    }
    (config, warnings)
}

/// Read the script text named by `source`.
pub fn read_script(source: &ScriptSource) -> std::io::Result<String> {
    match source {
        ScriptSource::Inline(s) => Ok(s.clone()),
        ScriptSource::File(path) => std::fs::read_to_string(path),
        ScriptSource::Stdin => {
            let mut s = String::new();
            std::io::stdin().read_to_string(&mut s)?;
            Ok(s)
        }
    }
}

/// Assemble the expression: source, `-D` variables and settings.
pub fn build_expression(source: String, args: &CliArgs, config: EvalConfig) -> Expression {
    let mut expr = Expression::new(source);
    for (name, value) in &args.defines {
        expr.set_variable(name.clone(), Value::parse_literal(value));
    }
    expr.set_config(config);
    expr
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn empty_args() {
        let a = parse_argv(&argv(&[])).unwrap();
        assert_eq!(a.script, ScriptSource::Stdin);
        assert_eq!(a.config, ConfigFile::Search);
        assert!(!a.print_table);
    }

    #[test]
    fn inline_script() {
        let a = parse_argv(&argv(&["-e", "1 + 2"])).unwrap();
        assert_eq!(a.script, ScriptSource::Inline("1 + 2".into()));
        let a = parse_argv(&argv(&["-ex = 1"])).unwrap();
        assert_eq!(a.script, ScriptSource::Inline("x = 1".into()));
    }

    #[test]
    fn script_file() {
        let a = parse_argv(&argv(&["-f", "calc.exan"])).unwrap();
        assert_eq!(a.script, ScriptSource::File(PathBuf::from("calc.exan")));
    }

    #[test]
    fn only_one_script_source() {
        assert!(parse_argv(&argv(&["-e", "1", "-f", "x"])).is_err());
    }

    #[test]
    fn defines_keep_order() {
        let a = parse_argv(&argv(&["-Da=1", "-D", "b = \"two\""])).unwrap();
        assert_eq!(
            a.defines,
            vec![("a".into(), "1".into()), ("b".into(), " \"two\"".into())]
        );
        assert!(parse_argv(&argv(&["-Dnovalue"])).is_err());
    }

    #[test]
    fn numeric_settings() {
        let a = parse_argv(&argv(&["-s4", "-r", "half_even"])).unwrap();
        assert_eq!(a.scale, Some(4));
        assert_eq!(a.rounding, Some(Rounding::HalfEven));
        assert!(parse_argv(&argv(&["-sx"])).is_err());
        assert!(parse_argv(&argv(&["-s100000000"])).is_err());
        assert!(parse_argv(&argv(&["-rsideways"])).is_err());
    }

    #[test]
    fn combined_bool_flags() {
        let a = parse_argv(&argv(&["-td"])).unwrap();
        assert!(a.print_table && a.debug);
    }

    #[test]
    fn missing_value() {
        assert!(parse_argv(&argv(&["-e"])).is_err());
    }

    #[test]
    fn unknown_flag_and_positional() {
        assert!(parse_argv(&argv(&["-z"])).is_err());
        assert!(parse_argv(&argv(&["stray"])).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "division_scale = 3").unwrap();
        writeln!(f, "rounding = floor").unwrap();
        writeln!(f, "bogus = 1").unwrap();
        let path = f.path().to_string_lossy().into_owned();

        let args = parse_argv(&argv(&["-c", &path, "-s", "6"])).unwrap();
        let (config, warnings) = build_config(&args);
        assert_eq!(config.division_scale, 6);
        assert_eq!(config.rounding, Rounding::Floor);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("unknown setting 'bogus'"));
    }

    #[test]
    fn missing_config_file_warns() {
        let args = parse_argv(&argv(&["-c", "/nonexistent/exanrc"])).unwrap();
        let (config, warnings) = build_config(&args);
        assert_eq!(config, EvalConfig::default());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn script_from_file_with_defines() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "area = w * h ## rectangle").unwrap();
        let path = f.path().to_string_lossy().into_owned();
        let args = parse_argv(&argv(&["-f", &path, "-Dw=3", "-Dh=2.5"])).unwrap();

        let source = read_script(&args.script).unwrap();
        let mut expr = build_expression(source, &args, EvalConfig::default());
        assert_eq!(expr.evaluate().unwrap().unwrap().to_string(), "7.5");
    }
}
