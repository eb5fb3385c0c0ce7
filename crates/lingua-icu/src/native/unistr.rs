//! Mutable UTF-16 string

use std::cmp::Ordering;
use std::fmt;

use lingua_core::{native_any, NativeObject, NativeTypeInfo};
use parking_lot::RwLock;

use super::alloc::Tracked;

/// RTTI of `UnicodeString`
pub static UNICODE_STRING: NativeTypeInfo = NativeTypeInfo::root("UnicodeString");

/// Mutable string with UTF-16 indexing
pub struct UnicodeString {
    text: RwLock<String>,
    _tracked: Tracked,
}

impl UnicodeString {
    /// New string
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: RwLock::new(text.into()),
            _tracked: Tracked::new(),
        }
    }

    /// Copy of the contents
    pub fn text(&self) -> String {
        self.text.read().clone()
    }

    /// Replace the contents
    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.write() = text.into();
    }

    /// Length in UTF-16 code units
    pub fn length(&self) -> usize {
        self.text.read().encode_utf16().count()
    }

    /// Code unit at `index`
    pub fn char_at(&self, index: usize) -> Option<u16> {
        self.text.read().encode_utf16().nth(index)
    }

    /// Append text
    pub fn append(&self, text: &str) {
        self.text.write().push_str(text);
    }

    /// Uppercase in place
    pub fn to_upper(&self) {
        let mut text = self.text.write();
        *text = text.to_uppercase();
    }

    /// Lowercase in place
    pub fn to_lower(&self) {
        let mut text = self.text.write();
        *text = text.to_lowercase();
    }

    /// Code-unit order
    pub fn compare(&self, other: &UnicodeString) -> Ordering {
        if std::ptr::eq(self, other) {
            return Ordering::Equal;
        }
        let a = self.text.read();
        let b = other.text.read();
        a.encode_utf16().cmp(b.encode_utf16())
    }
}

impl Clone for UnicodeString {
    fn clone(&self) -> Self {
        Self::new(self.text())
    }
}

impl fmt::Debug for UnicodeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnicodeString({:?})", *self.text.read())
    }
}

impl NativeObject for UnicodeString {
    fn type_info(&self) -> &'static NativeTypeInfo {
        &UNICODE_STRING
    }

    fn clone_native(&self) -> Option<Box<dyn NativeObject>> {
        Some(Box::new(self.clone()))
    }

    fn native_eq(&self, other: &dyn NativeObject) -> Option<bool> {
        self.native_cmp(other).map(|ord| ord == Ordering::Equal).or(Some(false))
    }

    fn native_cmp(&self, other: &dyn NativeObject) -> Option<Ordering> {
        other.downcast_ref::<UnicodeString>().map(|other| self.compare(other))
    }

    fn as_text(&self) -> Option<String> {
        Some(self.text())
    }

    native_any!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_length() {
        let s = UnicodeString::new("a\u{1F600}");
        assert_eq!(s.length(), 3);
        assert_eq!(s.char_at(0), Some(u16::from(b'a')));
        assert_eq!(s.char_at(3), None);
    }

    #[test]
    fn test_in_place_mutation() {
        let s = UnicodeString::new("Hello");
        s.append(", World");
        s.to_upper();
        assert_eq!(s.text(), "HELLO, WORLD");
    }

    #[test]
    fn test_ordering() {
        let a = UnicodeString::new("abc");
        let b = UnicodeString::new("abd");
        assert_eq!(a.native_cmp(&b), Some(Ordering::Less));
        assert_eq!(a.native_eq(&a.clone()), Some(true));
        assert_eq!(a.compare(&a), Ordering::Equal);
    }
}
