//! Value and unit extraction from a single line of text.
//!
//! Parsing is an ordered chain of [`ValueRule`]s; the first rule that matches
//! wins and later rules are never consulted. Rules are pure, so the same line
//! always parses to the same value.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const NUMBER: &str = r"[+-]?\d+\.?\d*";
const UNIT: &str = r"[\p{L}°%/]+";
/// Range connector, including its surrounding whitespace. A bare hyphen
/// only connects when attached to the first bound (`1.5-6.0`) or spaced on
/// both sides (`1.5 - 6.0`); ` -40` is a signed number, not a connector.
const RANGE_SEP: &str = r"(?:\s*to\s*|\s*–\s*|-\s*|\s+-\s+)";

/// A value (scalar, or range serialized as `"<a> to <b>"`) and its unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedValue {
    pub value: String,
    /// Empty when the line carries no unit.
    pub unit: String,
}

impl ParsedValue {
    pub fn scalar(value: &str, unit: Option<&str>) -> Self {
        Self {
            value: value.trim().to_string(),
            unit: unit.map(str::trim).unwrap_or_default().to_string(),
        }
    }

    pub fn range(low: &str, high: &str, unit: Option<&str>) -> Self {
        Self {
            value: format!("{} to {}", low.trim(), high.trim()),
            unit: unit.map(str::trim).unwrap_or_default().to_string(),
        }
    }

    pub fn is_range(&self) -> bool {
        self.value.contains(" to ")
    }
}

impl fmt::Display for ParsedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}

pub trait ValueRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn try_parse(&self, line: &str) -> Option<ParsedValue>;
}

/// A regex rule with fixed capture-group roles.
pub struct PatternRule {
    name: &'static str,
    regex: Regex,
    low: usize,
    high: Option<usize>,
    /// Candidate unit groups, first non-empty wins.
    units: &'static [usize],
}

impl PatternRule {
    pub fn new(
        name: &'static str,
        regex: Regex,
        low: usize,
        high: Option<usize>,
        units: &'static [usize],
    ) -> Self {
        Self {
            name,
            regex,
            low,
            high,
            units,
        }
    }
}

impl ValueRule for PatternRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_parse(&self, line: &str) -> Option<ParsedValue> {
        let caps = self.regex.captures(line)?;
        let low = caps.get(self.low)?.as_str();
        let unit = self
            .units
            .iter()
            .filter_map(|&group| caps.get(group))
            .map(|m| m.as_str())
            .find(|unit| !unit.trim().is_empty());

        match self.high.and_then(|group| caps.get(group)) {
            Some(high) => Some(ParsedValue::range(low, high.as_str(), unit)),
            None => Some(ParsedValue::scalar(low, unit)),
        }
    }
}

impl fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRule")
            .field("name", &self.name)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

fn pattern(template: &str) -> Regex {
    let source = template
        .replace("{num}", NUMBER)
        .replace("{unit}", UNIT)
        .replace("{sep}", RANGE_SEP);
    Regex::new(&source).unwrap_or_else(|e| panic!("invalid value pattern {}: {}", source, e))
}

/// `| 4.5 | | 60 | V |`: min, blank or dashed typ, max and unit columns.
static TABLE_MIN_MAX: Lazy<Regex> = Lazy::new(|| {
    pattern(r"\|\s*({num})\s*\|\s*(?:-|–)?\s*\|\s*({num})\s*\|\s*({unit})?\s*\|")
});

/// `| 3.5 | A |`
static TABLE_SCALAR: Lazy<Regex> = Lazy::new(|| pattern(r"\|\s*({num})\s*\|\s*({unit})?\s*\|"));

/// `| 1.5 to 6.0 | V |`
static TABLE_RANGE: Lazy<Regex> =
    Lazy::new(|| pattern(r"\|\s*({num}){sep}({num})\s*\|\s*({unit})?\s*\|"));

/// `Input Voltage: 1.5V to 6.0V`
static COLON_RANGE: Lazy<Regex> =
    Lazy::new(|| pattern(r"[:=]\s*({num})(?:\s*({unit}))?{sep}({num})\s*({unit})?"));

/// `Output Current: 3.5A`
static COLON_SCALAR: Lazy<Regex> = Lazy::new(|| pattern(r"[:=]\s*({num})\s*({unit})?"));

/// `Junction temperature 125 °C`, a number at the end of the line.
static TRAILING: Lazy<Regex> = Lazy::new(|| {
    pattern(r"(?:^|[\s|:=,;])({num})(?:{sep}({num}))?\s*({unit})?\s*\|?\s*$")
});

/// The ordered rule chain.
pub struct ValueParser {
    rules: Vec<Box<dyn ValueRule>>,
}

impl Default for ValueParser {
    fn default() -> Self {
        let rules: Vec<Box<dyn ValueRule>> = vec![
            Box::new(PatternRule::new(
                "table_min_max",
                TABLE_MIN_MAX.clone(),
                1,
                Some(2),
                &[3],
            )),
            Box::new(PatternRule::new(
                "table_scalar",
                TABLE_SCALAR.clone(),
                1,
                None,
                &[2],
            )),
            Box::new(PatternRule::new(
                "table_range",
                TABLE_RANGE.clone(),
                1,
                Some(2),
                &[3],
            )),
            Box::new(PatternRule::new(
                "colon_range",
                COLON_RANGE.clone(),
                1,
                Some(3),
                &[2, 4],
            )),
            Box::new(PatternRule::new(
                "colon_scalar",
                COLON_SCALAR.clone(),
                1,
                None,
                &[2],
            )),
            Box::new(PatternRule::new(
                "trailing",
                TRAILING.clone(),
                1,
                Some(2),
                &[3],
            )),
        ];
        Self { rules }
    }
}

impl ValueParser {
    /// An empty chain; every line parses to `None` until rules are added.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule after the existing ones.
    pub fn with_rule(mut self, rule: impl ValueRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn parse(&self, line: &str) -> Option<ParsedValue> {
        self.parse_with_rule(line).map(|(_, parsed)| parsed)
    }

    /// Like [`parse`](Self::parse) but also reports which rule matched.
    pub fn parse_with_rule(&self, line: &str) -> Option<(&'static str, ParsedValue)> {
        self.rules
            .iter()
            .find_map(|rule| rule.try_parse(line).map(|parsed| (rule.name(), parsed)))
    }
}

impl fmt::Debug for ValueParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueParser")
            .field("rules", &self.rule_names())
            .finish()
    }
}

static DEFAULT_PARSER: Lazy<ValueParser> = Lazy::new(ValueParser::default);

/// Parse a line with the default rule chain.
pub fn parse_value(line: &str) -> Option<ParsedValue> {
    DEFAULT_PARSER.parse(line)
}
