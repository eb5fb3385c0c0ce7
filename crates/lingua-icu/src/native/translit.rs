//! Filters and transliterators
//!
//! `UnicodeFilter` and `Transliterator` are abstract native classes. Host
//! code can implement either one: the native object then holds an
//! `UpcallProxy` and forwards its virtual calls (`contains`,
//! `handleTransliterate`) to the host object.
//!
//! A transliterator owns its filter. Replaced filters are retired, not
//! released, until the transliterator itself goes away, since host wrappers
//! returned by `get_filter` may still observe them.

use std::fmt;
use std::ptr::NonNull;

use lingua_core::{as_wrapper, native_any, ErrorEnvelope, NativeObject, NativeTypeInfo, UpcallProxy};
use lingua_sdk::{BridgeError, HostValue, ParseError, StatusCode};
use parking_lot::Mutex;

use super::alloc::Tracked;
use super::unistr::UnicodeString;
use super::NativeResult;

/// RTTI of the abstract `UnicodeFilter`
pub static UNICODE_FILTER: NativeTypeInfo = NativeTypeInfo::root("UnicodeFilter");
/// RTTI of `UnicodeSet`
pub static UNICODE_SET: NativeTypeInfo = NativeTypeInfo::derived("UnicodeSet", &UNICODE_FILTER);
/// RTTI of host-implemented filters
pub static HOST_FILTER: NativeTypeInfo = NativeTypeInfo::derived("HostUnicodeFilter", &UNICODE_FILTER);

/// RTTI of the abstract `Transliterator`
pub static TRANSLITERATOR: NativeTypeInfo = NativeTypeInfo::root("Transliterator");
/// RTTI of the case mapping transliterators
pub static CASE_MAP_TRANSLITERATOR: NativeTypeInfo =
    NativeTypeInfo::derived("CaseMapTransliterator", &TRANSLITERATOR);
/// RTTI of the identity transliterator
pub static NULL_TRANSLITERATOR: NativeTypeInfo = NativeTypeInfo::derived("NullTransliterator", &TRANSLITERATOR);
/// RTTI of host-implemented transliterators
pub static HOST_TRANSLITERATOR: NativeTypeInfo =
    NativeTypeInfo::derived("HostTransliterator", &TRANSLITERATOR);

/// The virtual interface of `UnicodeFilter`
pub trait Filter: NativeObject {
    /// Whether the filter selects `c`
    fn contains(&self, c: char) -> bool;

    /// Polymorphic copy
    fn clone_filter(&self) -> Box<dyn Filter>;

    /// Upcast to the native object
    fn as_native(&self) -> &(dyn NativeObject + 'static);
}

/// Recover the filter interface of an adopted native object
pub fn into_filter(obj: Box<dyn NativeObject>) -> Option<Box<dyn Filter>> {
    let id = obj.type_info().id();
    if id == UNICODE_SET.id() {
        obj.into_any().downcast::<UnicodeSet>().ok().map(|set| set as Box<dyn Filter>)
    } else if id == HOST_FILTER.id() {
        obj.into_any().downcast::<HostFilter>().ok().map(|filter| filter as Box<dyn Filter>)
    } else {
        None
    }
}

/// A set of code points written as `[a-z]`, `[^aeiou]`, `[abc\-]`
#[derive(Clone)]
pub struct UnicodeSet {
    ranges: Vec<(char, char)>,
    negated: bool,
    _tracked: Tracked,
}

impl UnicodeSet {
    /// The empty set
    pub fn new() -> Self {
        Self {
            ranges: Vec::new(),
            negated: false,
            _tracked: Tracked::new(),
        }
    }

    /// Compile a set pattern
    pub fn from_pattern(text: &str) -> NativeResult<Self> {
        let chars: Vec<char> = text.chars().collect();
        let fail = |status: StatusCode, offset: usize| {
            Err(ErrorEnvelope::with_parse(status, ParseError::at(text, offset)))
        };
        if chars.first() != Some(&'[') {
            return fail(StatusCode::MALFORMED_SET, 0);
        }

        let mut set = Self::new();
        let mut i = 1;
        if chars.get(i) == Some(&'^') {
            set.negated = true;
            i += 1;
        }
        let mut pending: Option<char> = None;
        loop {
            let c = match chars.get(i) {
                Some(&']') => break,
                Some(&'\\') => {
                    i += 1;
                    match chars.get(i) {
                        Some(&c) => c,
                        None => return fail(StatusCode::TRAILING_BACKSLASH, i - 1),
                    }
                }
                Some(&'-') if pending.is_some() && chars.get(i + 1) != Some(&']') => {
                    i += 1;
                    let end = match chars.get(i) {
                        Some(&'\\') => {
                            i += 1;
                            match chars.get(i) {
                                Some(&c) => c,
                                None => return fail(StatusCode::TRAILING_BACKSLASH, i - 1),
                            }
                        }
                        Some(&c) if c != '[' => c,
                        _ => return fail(StatusCode::MALFORMED_SET, i),
                    };
                    let start = pending.take().unwrap_or(end);
                    if end < start {
                        return fail(StatusCode::MALFORMED_SET, i);
                    }
                    set.ranges.push((start, end));
                    i += 1;
                    continue;
                }
                Some(&'[') => return fail(StatusCode::MALFORMED_SET, i),
                Some(&c) => c,
                None => return fail(StatusCode::MALFORMED_SET, i),
            };
            if let Some(previous) = pending.replace(c) {
                set.ranges.push((previous, previous));
            }
            i += 1;
        }
        if let Some(last) = pending {
            set.ranges.push((last, last));
        }
        if i + 1 != chars.len() {
            return fail(StatusCode::MALFORMED_SET, i + 1);
        }
        set.ranges.sort_unstable();
        Ok(set)
    }

    /// Pattern text of the set
    pub fn to_pattern(&self) -> String {
        let escape = |c: char, out: &mut String| {
            if matches!(c, '[' | ']' | '-' | '^' | '\\') {
                out.push('\\');
            }
            out.push(c);
        };
        let mut out = String::from("[");
        if self.negated {
            out.push('^');
        }
        for &(start, end) in &self.ranges {
            escape(start, &mut out);
            if end != start {
                out.push('-');
                escape(end, &mut out);
            }
        }
        out.push(']');
        out
    }

    /// Number of code points in the set
    pub fn size(&self) -> usize {
        let listed: usize = merged(&self.ranges)
            .iter()
            .map(|&(start, end)| (end as usize) - (start as usize) + 1)
            .sum();
        if self.negated {
            0x110000 - 0x800 - listed
        } else {
            listed
        }
    }

    /// Membership test
    pub fn contains_char(&self, c: char) -> bool {
        let listed = self.ranges.iter().any(|&(start, end)| start <= c && c <= end);
        listed != self.negated
    }
}

fn merged(ranges: &[(char, char)]) -> Vec<(char, char)> {
    let mut out: Vec<(char, char)> = Vec::with_capacity(ranges.len());
    for &(start, end) in ranges {
        match out.last_mut() {
            Some(last) if (start as u32) <= (last.1 as u32) + 1 => last.1 = last.1.max(end),
            _ => out.push((start, end)),
        }
    }
    out
}

impl Default for UnicodeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UnicodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnicodeSet({})", self.to_pattern())
    }
}

impl NativeObject for UnicodeSet {
    fn type_info(&self) -> &'static NativeTypeInfo {
        &UNICODE_SET
    }

    fn clone_native(&self) -> Option<Box<dyn NativeObject>> {
        Some(Box::new(self.clone()))
    }

    fn native_eq(&self, other: &dyn NativeObject) -> Option<bool> {
        Some(other.downcast_ref::<UnicodeSet>().map_or(false, |other| {
            self.negated == other.negated && merged(&self.ranges) == merged(&other.ranges)
        }))
    }

    native_any!();
}

impl Filter for UnicodeSet {
    fn contains(&self, c: char) -> bool {
        self.contains_char(c)
    }

    fn clone_filter(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }

    fn as_native(&self) -> &(dyn NativeObject + 'static) {
        self
    }
}

/// Filter implemented by a host object's `contains(ch)` method
#[derive(Clone)]
pub struct HostFilter {
    proxy: UpcallProxy,
    _tracked: Tracked,
}

impl HostFilter {
    /// Filter forwarding to `proxy`
    pub fn new(proxy: UpcallProxy) -> Self {
        Self {
            proxy,
            _tracked: Tracked::new(),
        }
    }

    /// The proxy to the host object
    pub fn proxy(&self) -> &UpcallProxy {
        &self.proxy
    }
}

impl fmt::Debug for HostFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFilter").field("proxy", &self.proxy).finish()
    }
}

impl NativeObject for HostFilter {
    fn type_info(&self) -> &'static NativeTypeInfo {
        &HOST_FILTER
    }

    fn clone_native(&self) -> Option<Box<dyn NativeObject>> {
        Some(Box::new(self.clone()))
    }

    native_any!();
}

impl Filter for HostFilter {
    fn contains(&self, c: char) -> bool {
        self.proxy.upcall("contains", &[HostValue::from(c.to_string())], false)
    }

    fn clone_filter(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }

    fn as_native(&self) -> &(dyn NativeObject + 'static) {
        self
    }
}

/// Direction of a transliterator id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// As written
    Forward = 0,
    /// Inverse transform
    Reverse = 1,
}

impl Direction {
    /// Direction from its numeric code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Direction::Forward),
            1 => Some(Direction::Reverse),
            _ => None,
        }
    }
}

#[derive(Clone)]
enum Rule {
    Upper,
    Lower,
    Null,
    Host(UpcallProxy),
}

/// Text transform with an optional filter
pub struct Transliterator {
    id: String,
    rule: Rule,
    filter: Mutex<Option<Box<dyn Filter>>>,
    retired: Mutex<Vec<Box<dyn Filter>>>,
    _tracked: Tracked,
}

impl Transliterator {
    fn with_rule(id: String, rule: Rule) -> Self {
        Self {
            id,
            rule,
            filter: Mutex::new(None),
            retired: Mutex::new(Vec::new()),
            _tracked: Tracked::new(),
        }
    }

    /// Factory for the built-in ids (`Any-Upper`, `Any-Lower`, `Any-Null`)
    pub fn create_instance(id: &str, direction: Direction) -> NativeResult<Self> {
        let (source, target) = id.split_once('-').unwrap_or(("Any", id));
        let rule = match target.to_ascii_lowercase().as_str() {
            "upper" => Rule::Upper,
            "lower" => Rule::Lower,
            "null" => Rule::Null,
            _ => return Err(ErrorEnvelope::with_parse(StatusCode::INVALID_ID, ParseError::at(id, 0))),
        };
        let canonical = format!("{}-{}", source, target);
        Ok(match (direction, rule) {
            (Direction::Forward, rule) => Self::with_rule(canonical, rule),
            (Direction::Reverse, Rule::Upper) => Self::with_rule(format!("{}-Lower", source), Rule::Lower),
            (Direction::Reverse, Rule::Lower) => Self::with_rule(format!("{}-Upper", source), Rule::Upper),
            (Direction::Reverse, rule) => Self::with_rule(canonical, rule),
        })
    }

    /// Transliterator implemented by a host object's
    /// `handleTransliterate(text)` method
    pub fn host(id: &str, proxy: UpcallProxy) -> Self {
        proxy.attach();
        Self::with_rule(id.to_string(), Rule::Host(proxy))
    }

    /// Transliterator id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The proxy of a host-implemented rule
    pub fn rule_proxy(&self) -> Option<&UpcallProxy> {
        match &self.rule {
            Rule::Host(proxy) => Some(proxy),
            _ => None,
        }
    }

    /// The proxy of a host-implemented filter
    pub fn filter_proxy(&self) -> Option<UpcallProxy> {
        self.filter
            .lock()
            .as_ref()
            .and_then(|filter| filter.as_native().downcast_ref::<HostFilter>())
            .map(|filter| filter.proxy().clone())
    }

    /// Most recent upcall failure of the rule or the filter
    pub fn last_upcall_error(&self) -> Option<BridgeError> {
        self.rule_proxy()
            .and_then(UpcallProxy::last_error)
            .or_else(|| self.filter_proxy().and_then(|proxy| proxy.last_error()))
    }

    /// Take ownership of `filter` (or remove the filter)
    pub fn adopt_filter(&self, filter: Option<Box<dyn Filter>>) {
        if let Some(proxy) = filter
            .as_ref()
            .and_then(|filter| filter.as_native().downcast_ref::<HostFilter>())
            .map(HostFilter::proxy)
        {
            proxy.attach();
        }
        let previous = std::mem::replace(&mut *self.filter.lock(), filter);
        if let Some(previous) = previous {
            self.retired.lock().push(previous);
        }
    }

    /// The owned filter, as a native pointer valid while `self` lives
    pub fn filter_ptr(&self) -> Option<NonNull<dyn NativeObject>> {
        self.filter.lock().as_ref().map(|filter| NonNull::from(filter.as_native()))
    }

    /// Transform `text`; only runs selected by the filter are changed
    pub fn transliterate(&self, text: &str) -> String {
        let filter = self.filter.lock().as_ref().map(|filter| filter.clone_filter());
        let filter = match filter {
            Some(filter) => filter,
            None => return self.apply(text),
        };

        let mut out = String::with_capacity(text.len());
        let mut run = String::new();
        for c in text.chars() {
            if filter.contains(c) {
                run.push(c);
            } else {
                if !run.is_empty() {
                    out.push_str(&self.apply(&run));
                    run.clear();
                }
                out.push(c);
            }
        }
        if !run.is_empty() {
            out.push_str(&self.apply(&run));
        }
        out
    }

    fn apply(&self, text: &str) -> String {
        match &self.rule {
            Rule::Upper => text.to_uppercase(),
            Rule::Lower => text.to_lowercase(),
            Rule::Null => text.to_string(),
            Rule::Host(proxy) => {
                let arg = match proxy.wrap_arg(Box::new(UnicodeString::new(text)), "UnicodeString") {
                    Ok(arg) => arg,
                    Err(err) => {
                        log::warn!("{}: cannot pass text to host: {}", self.id, err);
                        return text.to_string();
                    }
                };
                proxy.upcall("handleTransliterate", &[arg.clone()], ());
                as_wrapper(&arg)
                    .and_then(|wrapper| wrapper.handle().get())
                    .and_then(|native| native.as_text())
                    .unwrap_or_else(|| text.to_string())
            }
        }
    }
}

impl Clone for Transliterator {
    fn clone(&self) -> Self {
        let copy = Self::with_rule(self.id.clone(), self.rule.clone());
        *copy.filter.lock() = self.filter.lock().as_ref().map(|filter| filter.clone_filter());
        copy
    }
}

impl fmt::Debug for Transliterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transliterator")
            .field("id", &self.id)
            .field("type", &self.type_info().name())
            .field("filtered", &self.filter.lock().is_some())
            .finish()
    }
}

impl NativeObject for Transliterator {
    fn type_info(&self) -> &'static NativeTypeInfo {
        match self.rule {
            Rule::Upper | Rule::Lower => &CASE_MAP_TRANSLITERATOR,
            Rule::Null => &NULL_TRANSLITERATOR,
            Rule::Host(_) => &HOST_TRANSLITERATOR,
        }
    }

    fn clone_native(&self) -> Option<Box<dyn NativeObject>> {
        Some(Box::new(self.clone()))
    }

    native_any!();
}
