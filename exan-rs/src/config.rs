//! Evaluation settings and the `exanrc` configuration file parser.
//!
//! The file is line oriented:
//!
//! | Line | Action |
//! |------|--------|
//! | `division_scale = <n>` | fractional digits kept by `/` |
//! | `rounding = <mode>` | `up`, `down`, `ceiling`, `floor`, `half_up`, `half_down`, `half_even` |
//! | `max_depth = <n>` | limit on working-stack height and branch nesting |
//! | Lines starting with `##` or `;` | comment, ignored |
//!
//! Unknown keys and malformed values are reported per line and skipped; the
//! rest of the file still applies.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use bigdecimal::RoundingMode;

// ── Rounding ──────────────────────────────────────────────────────────────────

/// Rounding applied when a quotient has more fractional digits than the
/// configured scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Away from zero.
    Up,
    /// Toward zero.
    Down,
    Ceiling,
    Floor,
    #[default]
    HalfUp,
    HalfDown,
    HalfEven,
}

impl Rounding {
    pub fn name(self) -> &'static str {
        match self {
            Rounding::Up => "up",
            Rounding::Down => "down",
            Rounding::Ceiling => "ceiling",
            Rounding::Floor => "floor",
            Rounding::HalfUp => "half_up",
            Rounding::HalfDown => "half_down",
            Rounding::HalfEven => "half_even",
        }
    }
}

impl From<Rounding> for RoundingMode {
    fn from(r: Rounding) -> Self {
        match r {
            Rounding::Up => RoundingMode::Up,
            Rounding::Down => RoundingMode::Down,
            Rounding::Ceiling => RoundingMode::Ceiling,
            Rounding::Floor => RoundingMode::Floor,
            Rounding::HalfUp => RoundingMode::HalfUp,
            Rounding::HalfDown => RoundingMode::HalfDown,
            Rounding::HalfEven => RoundingMode::HalfEven,
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rounding {
    type Err = String;

    /// Accepts `half_up`, `half-up`, `HALF_UP` and `halfup` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        Ok(match key.as_str() {
            "up" => Rounding::Up,
            "down" => Rounding::Down,
            "ceiling" => Rounding::Ceiling,
            "floor" => Rounding::Floor,
            "halfup" => Rounding::HalfUp,
            "halfdown" => Rounding::HalfDown,
            "halfeven" => Rounding::HalfEven,
            _ => return Err(format!("unknown rounding mode '{s}'")),
        })
    }
}

// ── EvalConfig ────────────────────────────────────────────────────────────────

/// Settings consulted by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalConfig {
    /// Fractional digits kept by numeric division.
    pub division_scale: i64,
    /// Rounding applied by division and `round()`.
    pub rounding: Rounding,
    /// Maximum height of any working stack, and of the context chain.
    pub max_depth: usize,
}

pub const DEFAULT_DIVISION_SCALE: i64 = 16;
pub const DEFAULT_MAX_DEPTH: usize = 10_000;
/// Largest magnitude accepted for a division or `round()` scale.
pub const MAX_SCALE: i64 = 10_000;

/// Check that `scale` is within `-MAX_SCALE..=MAX_SCALE`.
pub fn check_scale(scale: i64) -> Result<i64, String> {
    if !(-MAX_SCALE..=MAX_SCALE).contains(&scale) {
        return Err(format!("scale {scale} is outside -{MAX_SCALE}..={MAX_SCALE}"));
    }
    Ok(scale)
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            division_scale: DEFAULT_DIVISION_SCALE,
            rounding: Rounding::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the division scale, clamped to `MAX_SCALE`, and rounding mode.
    pub fn with_division(mut self, scale: i64, rounding: Rounding) -> Self {
        self.division_scale = scale.clamp(-MAX_SCALE, MAX_SCALE);
        self.rounding = rounding;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Apply a single `key = value` setting.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "division_scale" | "scale" => {
                let scale = value
                    .parse()
                    .map_err(|_| format!("{key}: expected an integer, got '{value}'"))?;
                self.division_scale = check_scale(scale).map_err(|e| format!("{key}: {e}"))?;
            }
            "rounding" => self.rounding = value.parse()?,
            "max_depth" => {
                let depth: usize = value
                    .parse()
                    .map_err(|_| format!("{key}: expected a positive integer, got '{value}'"))?;
                if depth == 0 {
                    return Err(format!("{key}: must be at least 1"));
                }
                self.max_depth = depth;
            }
            _ => return Err(format!("unknown setting '{key}'")),
        }
        Ok(())
    }
}

// ── Config file ───────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl EvalConfig {
    /// Parse config text on top of the defaults.
    ///
    /// Returns the resulting config together with any per-line errors.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = EvalConfig::default();
        let errors = config.apply_str(s);
        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// Apply config text on top of the current settings.
    pub fn apply_str(&mut self, s: &str) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with("##") || line.starts_with(';') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected 'name = value', got '{line}'"),
                });
                continue;
            };

            if let Err(message) = self.set(key.trim(), value.trim()) {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        errors
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let c = EvalConfig::default();
        assert_eq!(c.division_scale, 16);
        assert_eq!(c.rounding, Rounding::HalfUp);
        assert_eq!(c.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn rounding_names() {
        assert_eq!("half_even".parse::<Rounding>(), Ok(Rounding::HalfEven));
        assert_eq!("HALF-UP".parse::<Rounding>(), Ok(Rounding::HalfUp));
        assert_eq!("Floor".parse::<Rounding>(), Ok(Rounding::Floor));
        assert!("sideways".parse::<Rounding>().is_err());
        assert_eq!(Rounding::HalfDown.to_string(), "half_down");
    }

    #[test]
    fn load_settings() {
        let (c, errors) = EvalConfig::load_str("division_scale = 4\nrounding = down\nmax_depth=64\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(c.division_scale, 4);
        assert_eq!(c.rounding, Rounding::Down);
        assert_eq!(c.max_depth, 64);
    }

    #[test]
    fn comments_and_blank_lines() {
        let (c, errors) = EvalConfig::load_str("## header\n\n; old style\nscale = 2\n");
        assert!(errors.is_empty());
        assert_eq!(c.division_scale, 2);
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let (c, errors) = EvalConfig::load_str("scale = x\nfoo = 1\nnonsense\nrounding = floor\n");
        assert_eq!(c.division_scale, 16);
        assert_eq!(c.rounding, Rounding::Floor);
        let lines: Vec<usize> = errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert!(errors[1].to_string().contains("unknown setting 'foo'"));
    }

    #[test]
    fn oversized_scale_rejected() {
        let (c, errors) = EvalConfig::load_str("division_scale = 100000000\nscale = -9223372036854775808");
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("outside"), "{errors:?}");
        assert_eq!(c.division_scale, DEFAULT_DIVISION_SCALE);
        assert_eq!(EvalConfig::new().with_division(i64::MAX, Rounding::Up).division_scale, MAX_SCALE);
    }

    #[test]
    fn rounding_maps_to_decimal_modes() {
        assert_eq!(RoundingMode::from(Rounding::HalfEven), RoundingMode::HalfEven);
        assert_eq!(RoundingMode::from(Rounding::Ceiling), RoundingMode::Ceiling);
    }

    #[test]
    fn zero_depth_rejected() {
        let (c, errors) = EvalConfig::load_str("max_depth = 0");
        assert_eq!(errors.len(), 1);
        assert_eq!(c.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "division_scale = 3").unwrap();
        writeln!(f, "rounding = half_even").unwrap();
        let (c, errors) = EvalConfig::load_file(f.path()).unwrap();
        assert!(errors.is_empty());
        assert_eq!(c, EvalConfig::new().with_division(3, Rounding::HalfEven));
    }
}
