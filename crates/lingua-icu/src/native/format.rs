//! Number formats
//!
//! `NumberFormat` is the abstract native base; the concrete object is either
//! a pattern-driven `DecimalFormat` or a rule-based spellout format. Both
//! live in one struct whose `kind` decides the dynamic type reported through
//! RTTI.

use std::fmt;

use lingua_core::{native_any, ErrorEnvelope, NativeObject, NativeTypeInfo};
use lingua_sdk::{ParseError, StatusCode};
use parking_lot::RwLock;

use super::alloc::Tracked;
use super::locale::Locale;
use super::NativeResult;

/// RTTI of the abstract `Format`
pub static FORMAT: NativeTypeInfo = NativeTypeInfo::root("Format");
/// RTTI of the abstract `NumberFormat`
pub static NUMBER_FORMAT: NativeTypeInfo = NativeTypeInfo::derived("NumberFormat", &FORMAT);
/// RTTI of `DecimalFormat`
pub static DECIMAL_FORMAT: NativeTypeInfo = NativeTypeInfo::derived("DecimalFormat", &NUMBER_FORMAT);
/// RTTI of `RuleBasedNumberFormat`
pub static RULE_BASED_NUMBER_FORMAT: NativeTypeInfo =
    NativeTypeInfo::derived("RuleBasedNumberFormat", &NUMBER_FORMAT);

const DEFAULT_PATTERN: &str = "#,##0.###";
const SPELLOUT_RULES: &str = "%spellout-numbering";
/// Most fraction digits a double can carry
pub const MAX_FRACTION_DIGITS: usize = 340;

/// Styles accepted by `NumberFormat::create_instance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberStyle {
    /// Decimal from an explicit pattern
    PatternDecimal = 0,
    /// Plain decimal
    Decimal = 1,
    /// Currency
    Currency = 2,
    /// Percent
    Percent = 3,
    /// Scientific
    Scientific = 4,
    /// Numbers spelled out in words
    Spellout = 5,
}

impl NumberStyle {
    /// Style from its numeric code
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => NumberStyle::PatternDecimal,
            1 => NumberStyle::Decimal,
            2 => NumberStyle::Currency,
            3 => NumberStyle::Percent,
            4 => NumberStyle::Scientific,
            5 => NumberStyle::Spellout,
            _ => return None,
        })
    }

    fn pattern(self) -> &'static str {
        match self {
            NumberStyle::PatternDecimal | NumberStyle::Decimal | NumberStyle::Spellout => DEFAULT_PATTERN,
            NumberStyle::Currency => "¤#,##0.00",
            NumberStyle::Percent => "#,##0%",
            NumberStyle::Scientific => "#E0",
        }
    }
}

/// A parsed number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integral value
    Int(i64),
    /// Anything else
    Double(f64),
}

impl Number {
    fn from_f64(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            Number::Int(value as i64)
        } else {
            Number::Double(value)
        }
    }
}

/// Result of `NumberFormat::parse`
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// The number, when any digits were read
    pub number: Option<Number>,
    /// Where parsing stopped
    pub index: usize,
    /// Status and parse record (a record with success status marks
    /// unparsed trailing text)
    pub envelope: ErrorEnvelope,
}

/// Compiled decimal pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    prefix: String,
    suffix: String,
    grouping: usize,
    grouping_used: bool,
    min_int: usize,
    min_frac: usize,
    max_frac: usize,
    percent: bool,
    exponent: Option<usize>,
}

impl Pattern {
    /// Compile `text`; failures carry the offending offset
    pub fn parse(text: &str) -> NativeResult<Self> {
        let chars: Vec<char> = text.chars().collect();
        let fail = |status: StatusCode, offset: usize| {
            Err(ErrorEnvelope::with_parse(status, ParseError::at(text, offset)))
        };
        let is_number_char = |c: char| matches!(c, '#' | '0'..='9' | ',' | '.' | 'E');

        let mut pattern = Pattern {
            prefix: String::new(),
            suffix: String::new(),
            grouping: 0,
            grouping_used: false,
            min_int: 0,
            min_frac: 0,
            max_frac: 0,
            percent: false,
            exponent: None,
        };

        let mut i = 0;
        while i < chars.len() && !is_number_char(chars[i]) {
            pattern.prefix.push(chars[i]);
            i += 1;
        }
        if i == chars.len() {
            return fail(StatusCode::PATTERN_SYNTAX_ERROR, i);
        }

        let mut decimal_at = None;
        let mut last_comma = None;
        let mut int_digits = 0;
        let mut seen_zero = false;
        let mut optional_frac = false;
        while i < chars.len() && is_number_char(chars[i]) {
            let c = chars[i];
            match c {
                '.' if decimal_at.is_some() => return fail(StatusCode::MULTIPLE_DECIMAL_SEPARATORS, i),
                '.' => decimal_at = Some(i),
                ',' if decimal_at.is_some() => return fail(StatusCode::UNEXPECTED_TOKEN, i),
                ',' => last_comma = Some(int_digits),
                'E' if pattern.exponent.is_some() => return fail(StatusCode::MULTIPLE_EXPONENTIAL_SYMBOLS, i),
                'E' => {
                    let zeros = chars[i + 1..].iter().take_while(|&&c| c == '0').count();
                    if zeros == 0 {
                        return fail(StatusCode::MALFORMED_EXPONENTIAL_PATTERN, i + 1);
                    }
                    pattern.exponent = Some(zeros);
                    i += zeros;
                    if chars.get(i + 1) == Some(&'E') {
                        return fail(StatusCode::MULTIPLE_EXPONENTIAL_SYMBOLS, i + 1);
                    }
                }
                _ if pattern.exponent.is_some() => return fail(StatusCode::MALFORMED_EXPONENTIAL_PATTERN, i),
                '#' if decimal_at.is_none() => {
                    if seen_zero {
                        return fail(StatusCode::UNEXPECTED_TOKEN, i);
                    }
                    int_digits += 1;
                }
                '#' => {
                    optional_frac = true;
                    pattern.max_frac += 1;
                }
                _ if decimal_at.is_none() => {
                    seen_zero = true;
                    int_digits += 1;
                    pattern.min_int += 1;
                }
                _ => {
                    if optional_frac {
                        return fail(StatusCode::UNEXPECTED_TOKEN, i);
                    }
                    pattern.min_frac += 1;
                    pattern.max_frac += 1;
                }
            }
            i += 1;
        }
        if int_digits == 0 && pattern.max_frac == 0 {
            return fail(StatusCode::PATTERN_SYNTAX_ERROR, i);
        }
        if let Some(at) = last_comma {
            pattern.grouping = int_digits - at;
            pattern.grouping_used = pattern.grouping > 0;
        }

        pattern.max_frac = pattern.max_frac.min(MAX_FRACTION_DIGITS);
        pattern.min_frac = pattern.min_frac.min(pattern.max_frac);
        pattern.suffix = chars[i..].iter().collect();
        let percents = pattern.prefix.matches('%').count() + pattern.suffix.matches('%').count();
        if percents > 1 {
            let offset = chars
                .iter()
                .enumerate()
                .filter(|(_, c)| **c == '%')
                .nth(1)
                .map_or(i, |(at, _)| at);
            return fail(StatusCode::MULTIPLE_PERCENT_SYMBOLS, offset);
        }
        pattern.percent = percents == 1;
        Ok(pattern)
    }

    /// Canonical pattern text
    pub fn to_pattern(&self) -> String {
        let mut out = self.prefix.clone();
        let width = if self.grouping_used {
            self.min_int.max(self.grouping + 1)
        } else {
            self.min_int.max(1)
        };
        for i in (0..width).rev() {
            out.push(if i < self.min_int { '0' } else { '#' });
            if self.grouping_used && i == self.grouping && i > 0 {
                out.push(',');
            }
        }
        if self.max_frac > 0 {
            out.push('.');
            out.extend(std::iter::repeat('0').take(self.min_frac));
            out.extend(std::iter::repeat('#').take(self.max_frac - self.min_frac));
        }
        if let Some(digits) = self.exponent {
            out.push('E');
            out.extend(std::iter::repeat('0').take(digits));
        }
        out.push_str(&self.suffix);
        out
    }
}

/// Formatting rules of the concrete object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Decimal,
    Spellout,
}

/// Number format object
pub struct NumberFormat {
    kind: Kind,
    locale: Locale,
    pattern: RwLock<Pattern>,
    _tracked: Tracked,
}

impl NumberFormat {
    /// Decimal format for `locale`, from `pattern` or the default pattern
    pub fn decimal(locale: Locale, pattern: Option<&str>) -> NativeResult<Self> {
        let pattern = Pattern::parse(pattern.unwrap_or(DEFAULT_PATTERN))?;
        Ok(Self::with_kind(Kind::Decimal, locale, pattern))
    }

    /// Factory: the concrete class depends on `style`
    pub fn create_instance(locale: Locale, style: i32) -> NativeResult<Self> {
        let style = NumberStyle::from_code(style).ok_or(ErrorEnvelope::new(StatusCode::ILLEGAL_ARGUMENT_ERROR))?;
        let pattern = Pattern::parse(style.pattern())?;
        let kind = match style {
            NumberStyle::Spellout => Kind::Spellout,
            _ => Kind::Decimal,
        };
        Ok(Self::with_kind(kind, locale, pattern))
    }

    fn with_kind(kind: Kind, locale: Locale, pattern: Pattern) -> Self {
        Self {
            kind,
            locale,
            pattern: RwLock::new(pattern),
            _tracked: Tracked::new(),
        }
    }

    /// Whether this is a rule-based (spellout) format
    pub fn is_rule_based(&self) -> bool {
        self.kind == Kind::Spellout
    }

    /// Locale of the format
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Replace the pattern; the old one stays on failure
    pub fn apply_pattern(&self, text: &str) -> NativeResult<()> {
        if self.is_rule_based() {
            return Err(ErrorEnvelope::new(StatusCode::UNSUPPORTED_ERROR));
        }
        *self.pattern.write() = Pattern::parse(text)?;
        Ok(())
    }

    /// Pattern (or rule set name) of the format
    pub fn to_pattern(&self) -> String {
        match self.kind {
            Kind::Decimal => self.pattern.read().to_pattern(),
            Kind::Spellout => SPELLOUT_RULES.to_string(),
        }
    }

    /// Maximum number of fraction digits
    pub fn max_fraction_digits(&self) -> usize {
        self.pattern.read().max_frac
    }

    /// Set the maximum number of fraction digits, clamped to
    /// `0..=MAX_FRACTION_DIGITS`
    pub fn set_max_fraction_digits(&self, digits: i32) {
        let mut pattern = self.pattern.write();
        pattern.max_frac = usize::try_from(digits).unwrap_or(0).min(MAX_FRACTION_DIGITS);
        pattern.min_frac = pattern.min_frac.min(pattern.max_frac);
    }

    /// Whether grouping separators are written
    pub fn is_grouping_used(&self) -> bool {
        self.pattern.read().grouping_used
    }

    /// Turn grouping on or off
    pub fn set_grouping_used(&self, used: bool) {
        let mut pattern = self.pattern.write();
        if pattern.grouping == 0 {
            pattern.grouping = 3;
        }
        pattern.grouping_used = used;
    }

    /// Format a double
    pub fn format_f64(&self, value: f64) -> String {
        if !value.is_finite() {
            return if value.is_nan() {
                "NaN".to_string()
            } else if value > 0.0 {
                "∞".to_string()
            } else {
                "-∞".to_string()
            };
        }
        if self.kind == Kind::Spellout {
            return spell_f64(value);
        }
        let pattern = self.pattern.read();
        let value = if pattern.percent { value * 100.0 } else { value };
        if let Some(digits) = pattern.exponent {
            return self.format_scientific(&pattern, value, digits);
        }
        let text = format!("{:.*}", pattern.max_frac, value.abs());
        let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
        let negative = value < 0.0 && text.chars().any(|c| c.is_ascii_digit() && c != '0');
        self.assemble(&pattern, negative, int, frac, "")
    }

    /// Format an integer without going through floating point
    pub fn format_i64(&self, value: i64) -> String {
        if self.kind == Kind::Spellout {
            return spell_i64(value);
        }
        let pattern = self.pattern.read();
        if pattern.exponent.is_some() {
            drop(pattern);
            return self.format_f64(value as f64);
        }
        let scaled = i128::from(value) * if pattern.percent { 100 } else { 1 };
        let digits = scaled.unsigned_abs().to_string();
        self.assemble(&pattern, scaled < 0, &digits, "", "")
    }

    fn format_scientific(&self, pattern: &Pattern, value: f64, exponent_digits: usize) -> String {
        let int_width = pattern.min_int.max(1) as i32;
        let mut exponent = if value == 0.0 {
            0
        } else {
            value.abs().log10().floor() as i32 - (int_width - 1)
        };
        let mut mantissa = value.abs() / 10f64.powi(exponent);
        let mut text = format!("{:.*}", pattern.max_frac, mantissa);
        // rounding may carry into a new digit
        if mantissa != 0.0 && text.split('.').next().map_or(0, str::len) > int_width as usize {
            exponent += 1;
            mantissa /= 10.0;
            text = format!("{:.*}", pattern.max_frac, mantissa);
        }
        let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
        let exp = format!(
            "E{}{:0width$}",
            if exponent < 0 { "-" } else { "" },
            exponent.unsigned_abs(),
            width = exponent_digits
        );
        self.assemble(pattern, value < 0.0, int, frac, &exp)
    }

    /// Sign, prefix, digits, `exp` and suffix, with locale symbols
    fn assemble(&self, pattern: &Pattern, negative: bool, int: &str, frac: &str, exp: &str) -> String {
        let symbols = self.locale.symbols();
        let mut frac = frac.to_string();
        while frac.len() > pattern.min_frac && frac.ends_with('0') {
            frac.pop();
        }
        while frac.len() < pattern.min_frac {
            frac.push('0');
        }

        let int = int.trim_start_matches('0');
        let mut int = format!("{:0>width$}", int, width = pattern.min_int);
        if int.is_empty() && frac.is_empty() {
            int.push('0');
        }
        if pattern.grouping_used && pattern.grouping > 0 && pattern.exponent.is_none() {
            int = group(&int, pattern.grouping, symbols.grouping);
        }

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&pattern.prefix.replace('¤', symbols.currency));
        out.push_str(&int);
        if !frac.is_empty() {
            out.push(symbols.decimal);
            out.push_str(&frac);
        }
        out.push_str(exp);
        out.push_str(&pattern.suffix.replace('¤', symbols.currency));
        out
    }

    /// Parse a number starting at `start` (a character offset).
    ///
    /// No digits is a failure carrying a parse record; unparsed trailing
    /// text is reported as a record with a success status.
    pub fn parse(&self, text: &str, start: usize) -> ParseOutcome {
        let chars: Vec<char> = text.chars().collect();
        let parsed = match self.kind {
            Kind::Decimal => self.parse_decimal(&chars, start.min(chars.len())),
            Kind::Spellout => parse_spelled(&chars, start.min(chars.len())),
        };
        match parsed {
            None => ParseOutcome {
                number: None,
                index: start,
                envelope: ErrorEnvelope::with_parse(StatusCode::INVALID_FORMAT_ERROR, ParseError::at(text, start)),
            },
            Some((number, end)) if end < chars.len() => ParseOutcome {
                number: Some(number),
                index: end,
                envelope: ErrorEnvelope::with_parse(StatusCode::ZERO_ERROR, ParseError::at(text, end)),
            },
            Some((number, end)) => ParseOutcome {
                number: Some(number),
                index: end,
                envelope: ErrorEnvelope::ok(),
            },
        }
    }

    fn parse_decimal(&self, chars: &[char], start: usize) -> Option<(Number, usize)> {
        let pattern = self.pattern.read();
        let symbols = self.locale.symbols();
        let mut i = start;
        let negative = chars.get(i) == Some(&'-');
        if negative {
            i += 1;
        }
        let prefix: Vec<char> = pattern.prefix.replace('¤', symbols.currency).chars().collect();
        if !prefix.is_empty() && chars[i..].starts_with(&prefix) {
            i += prefix.len();
        }

        let mut digits = String::new();
        let mut seen_decimal = false;
        while let Some(&c) = chars.get(i) {
            if c.is_ascii_digit() {
                digits.push(c);
            } else if c == symbols.decimal && !seen_decimal {
                seen_decimal = true;
                digits.push('.');
            } else if !(c == symbols.grouping && !seen_decimal && !digits.is_empty()) {
                break;
            }
            i += 1;
        }
        if !digits.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        if chars.get(i) == Some(&'E') {
            let mut exp = String::from("e");
            let mut j = i + 1;
            if let Some(&sign) = chars.get(j).filter(|c| **c == '-' || **c == '+') {
                exp.push(sign);
                j += 1;
            }
            let before = exp.len();
            while let Some(&c) = chars.get(j).filter(|c| c.is_ascii_digit()) {
                exp.push(c);
                j += 1;
            }
            if exp.len() > before {
                digits.push_str(&exp);
                i = j;
            }
        }

        let mut value: f64 = digits.parse().ok()?;
        let suffix: Vec<char> = pattern.suffix.replace('¤', symbols.currency).chars().collect();
        if !suffix.is_empty() && chars[i..].starts_with(&suffix) {
            i += suffix.len();
            if pattern.percent {
                value /= 100.0;
            }
        }
        if negative {
            value = -value;
        }
        Some((Number::from_f64(value), i))
    }
}

fn group(int: &str, size: usize, separator: char) -> String {
    let len = int.len();
    let mut out = String::with_capacity(len + len / size);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (len - i) % size == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

const SMALL: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven", "twelve",
    "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen", "nineteen",
];
const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];
const SCALES: [(u64, &str); 6] = [
    (1_000_000_000_000_000_000, "quintillion"),
    (1_000_000_000_000_000, "quadrillion"),
    (1_000_000_000_000, "trillion"),
    (1_000_000_000, "billion"),
    (1_000_000, "million"),
    (1_000, "thousand"),
];

fn spell_u64(n: u64) -> String {
    if n < 20 {
        return SMALL[n as usize].to_string();
    }
    if n < 100 {
        let tens = TENS[(n / 10) as usize];
        return match n % 10 {
            0 => tens.to_string(),
            unit => format!("{}-{}", tens, SMALL[unit as usize]),
        };
    }
    if n < 1000 {
        let head = format!("{} hundred", SMALL[(n / 100) as usize]);
        return match n % 100 {
            0 => head,
            rest => format!("{} {}", head, spell_u64(rest)),
        };
    }
    for (scale, name) in SCALES {
        if n >= scale {
            let head = format!("{} {}", spell_u64(n / scale), name);
            return match n % scale {
                0 => head,
                rest => format!("{} {}", head, spell_u64(rest)),
            };
        }
    }
    String::new()
}

fn spell_i64(n: i64) -> String {
    if n < 0 {
        format!("minus {}", spell_u64(n.unsigned_abs()))
    } else {
        spell_u64(n as u64)
    }
}

fn spell_f64(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        return spell_i64(value as i64);
    }
    let text = format!("{}", value.abs());
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let mut out = String::new();
    if value < 0.0 {
        out.push_str("minus ");
    }
    out.push_str(&spell_u64(int.parse().unwrap_or(0)));
    out.push_str(" point");
    for digit in frac.chars().filter_map(|c| c.to_digit(10)) {
        out.push(' ');
        out.push_str(SMALL[digit as usize]);
    }
    out
}

fn word_value(word: &str) -> Option<u64> {
    if let Some(n) = SMALL.iter().position(|w| *w == word) {
        return Some(n as u64);
    }
    TENS.iter()
        .position(|w| !w.is_empty() && *w == word)
        .map(|n| n as u64 * 10)
}

/// Read spelled-out integers ("minus forty-two", "one thousand two")
fn parse_spelled(chars: &[char], start: usize) -> Option<(Number, usize)> {
    let mut i = start;
    let mut total: u64 = 0;
    let mut current: u64 = 0;
    let mut negative = false;
    let mut any = false;
    let mut end = start;

    loop {
        while chars.get(i).map_or(false, |c| *c == ' ' || *c == '-') {
            i += 1;
        }
        let word_start = i;
        while chars.get(i).map_or(false, |c| c.is_ascii_alphabetic()) {
            i += 1;
        }
        if word_start == i {
            break;
        }
        let word: String = chars[word_start..i].iter().collect::<String>().to_ascii_lowercase();
        match word.as_str() {
            "minus" if !any => negative = true,
            "hundred" if any => current = current.checked_mul(100)?,
            _ => {
                if let Some((scale, _)) = SCALES.iter().find(|(_, name)| *name == word) {
                    if !any {
                        break;
                    }
                    total = total.checked_add(current.checked_mul(*scale)?)?;
                    current = 0;
                } else if let Some(value) = word_value(&word) {
                    current += value;
                    any = true;
                } else {
                    break;
                }
            }
        }
        end = i;
    }
    if !any {
        return None;
    }
    let value = i64::try_from(total + current).ok()?;
    Some((Number::Int(if negative { -value } else { value }), end))
}

impl Clone for NumberFormat {
    fn clone(&self) -> Self {
        Self::with_kind(self.kind, self.locale.clone(), self.pattern.read().clone())
    }
}

impl fmt::Debug for NumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumberFormat")
            .field("kind", &self.kind)
            .field("locale", &self.locale)
            .field("pattern", &self.to_pattern())
            .finish()
    }
}

impl NativeObject for NumberFormat {
    fn type_info(&self) -> &'static NativeTypeInfo {
        match self.kind {
            Kind::Decimal => &DECIMAL_FORMAT,
            Kind::Spellout => &RULE_BASED_NUMBER_FORMAT,
        }
    }

    fn clone_native(&self) -> Option<Box<dyn NativeObject>> {
        Some(Box::new(self.clone()))
    }

    fn native_eq(&self, other: &dyn NativeObject) -> Option<bool> {
        let other = match other.downcast_ref::<NumberFormat>() {
            Some(other) => other,
            None => return Some(false),
        };
        if std::ptr::eq(self, other) {
            return Some(true);
        }
        Some(self.kind == other.kind && self.locale == other.locale && *self.pattern.read() == *other.pattern.read())
    }

    native_any!();
}
