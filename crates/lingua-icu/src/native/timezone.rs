//! Time zones and the process default zone

use std::fmt;
use std::sync::Arc;

use lingua_core::{native_any, NativeObject, NativeTypeInfo, Singleton};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::alloc::Tracked;

/// RTTI of the abstract `TimeZone`
pub static TIME_ZONE: NativeTypeInfo = NativeTypeInfo::root("TimeZone");
/// RTTI of zones from the zone database
pub static OLSON_TIME_ZONE: NativeTypeInfo = NativeTypeInfo::derived("OlsonTimeZone", &TIME_ZONE);
/// RTTI of fixed-offset zones
pub static SIMPLE_TIME_ZONE: NativeTypeInfo = NativeTypeInfo::derived("SimpleTimeZone", &TIME_ZONE);

/// Id reported for unknown zones
pub const UNKNOWN_ZONE: &str = "Etc/Unknown";

const HOUR: i32 = 3_600_000;

const ZONES: [(&str, i32); 7] = [
    ("UTC", 0),
    ("Etc/GMT", 0),
    ("Europe/London", 0),
    ("Europe/Paris", HOUR),
    ("America/New_York", -5 * HOUR),
    ("America/Los_Angeles", -8 * HOUR),
    ("Asia/Tokyo", 9 * HOUR),
];

static DEFAULT_ZONE: Lazy<Singleton<TimeZone>> = Lazy::new(|| Singleton::new(TimeZone::create("UTC")));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Olson,
    Simple,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct State {
    id: String,
    raw_offset: i32,
}

/// A time zone with a raw offset in milliseconds
pub struct TimeZone {
    kind: Kind,
    state: RwLock<State>,
    _tracked: Tracked,
}

impl TimeZone {
    fn with_kind(kind: Kind, id: String, raw_offset: i32) -> Self {
        Self {
            kind,
            state: RwLock::new(State { id, raw_offset }),
            _tracked: Tracked::new(),
        }
    }

    /// Factory: database ids give an Olson zone, `GMT+hh:mm` a simple zone,
    /// anything else the unknown zone
    pub fn create(id: &str) -> Self {
        if let Some((_, offset)) = ZONES.iter().find(|(name, _)| *name == id) {
            return Self::with_kind(Kind::Olson, id.to_string(), *offset);
        }
        match parse_custom(id) {
            Some(offset) => Self::with_kind(Kind::Simple, custom_id(offset), offset),
            None => {
                log::debug!("unknown time zone {:?}", id);
                Self::with_kind(Kind::Olson, UNKNOWN_ZONE.to_string(), 0)
            }
        }
    }

    /// Fixed-offset zone
    pub fn simple(raw_offset: i32, id: &str) -> Self {
        Self::with_kind(Kind::Simple, id.to_string(), raw_offset)
    }

    /// Ids of the zone database
    pub fn available_ids() -> Vec<&'static str> {
        ZONES.iter().map(|(id, _)| *id).collect()
    }

    /// Zone id
    pub fn id(&self) -> String {
        self.state.read().id.clone()
    }

    /// Change the zone id
    pub fn set_id(&self, id: &str) {
        self.state.write().id = id.to_string();
    }

    /// Offset from GMT in milliseconds
    pub fn raw_offset(&self) -> i32 {
        self.state.read().raw_offset
    }

    /// Change the offset
    pub fn set_raw_offset(&self, offset: i32) {
        self.state.write().raw_offset = offset;
    }

    /// Same offset rules, regardless of id
    pub fn has_same_rules(&self, other: &TimeZone) -> bool {
        self.raw_offset() == other.raw_offset()
    }

    /// Copy of the process default zone
    pub fn default_zone() -> TimeZone {
        TimeZone::clone(&DEFAULT_ZONE.get())
    }

    /// Replace the default zone with a copy of `zone`
    pub fn set_default(zone: &TimeZone) {
        DEFAULT_ZONE.set(Arc::new(zone.clone()));
    }

    /// Replace the default zone, taking ownership of `zone`
    pub fn adopt_default(zone: Box<TimeZone>) {
        log::debug!("default time zone is now {}", zone.id());
        DEFAULT_ZONE.set(Arc::from(zone));
    }
}

fn parse_custom(id: &str) -> Option<i32> {
    let rest = id.strip_prefix("GMT")?;
    let sign = match rest.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let rest = &rest[1..];
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) if m.len() == 2 => (field(h)?, field(m)?),
        Some(_) => return None,
        None if rest.len() <= 2 => (field(rest)?, 0),
        None if rest.len() == 4 => (field(rest.get(..2)?)?, field(rest.get(2..)?)?),
        None => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * HOUR + minutes * 60_000))
}

/// One or two ASCII digits
fn field(text: &str) -> Option<i32> {
    if text.is_empty() || text.len() > 2 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn custom_id(offset: i32) -> String {
    let minutes = offset.abs() / 60_000;
    format!(
        "GMT{}{:02}:{:02}",
        if offset < 0 { '-' } else { '+' },
        minutes / 60,
        minutes % 60
    )
}

impl Clone for TimeZone {
    fn clone(&self) -> Self {
        let state = self.state.read().clone();
        Self::with_kind(self.kind, state.id, state.raw_offset)
    }
}

impl fmt::Debug for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        write!(f, "TimeZone({:?}, {}, {})", self.kind, state.id, state.raw_offset)
    }
}

impl NativeObject for TimeZone {
    fn type_info(&self) -> &'static NativeTypeInfo {
        match self.kind {
            Kind::Olson => &OLSON_TIME_ZONE,
            Kind::Simple => &SIMPLE_TIME_ZONE,
        }
    }

    fn clone_native(&self) -> Option<Box<dyn NativeObject>> {
        Some(Box::new(self.clone()))
    }

    fn native_eq(&self, other: &dyn NativeObject) -> Option<bool> {
        Some(other.downcast_ref::<TimeZone>().map_or(false, |other| {
            std::ptr::eq(self, other) || (self.kind == other.kind && *self.state.read() == *other.state.read())
        }))
    }

    native_any!();
}
