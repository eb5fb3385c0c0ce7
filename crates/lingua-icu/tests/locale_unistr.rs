//! `Locale` and `UnicodeString`: value classes with native equality

mod common;

use std::cmp::Ordering;

use common::{bridge, call, locale, text, unicode_string};
use lingua_core::{BridgeError, HostValue, StatusCode};

#[test]
fn test_locale_constructors() {
    let bridge = bridge();
    let default = bridge.construct("Locale", &[]).unwrap();
    assert_eq!(text(&call(&bridge, &default, "getName", &[])), "en_US");

    let parts = bridge
        .construct("Locale", &[HostValue::str("FR"), HostValue::str("ca")])
        .unwrap();
    assert_eq!(text(&call(&bridge, &parts, "getLanguage", &[])), "fr");
    assert_eq!(text(&call(&bridge, &parts, "getCountry", &[])), "CA");
    assert_eq!(text(&call(&bridge, &parts, "getVariant", &[])), "");

    let named = bridge
        .call_static("Locale", "createFromName", &[HostValue::str("fr-CA")])
        .unwrap();
    assert_eq!(named.type_name(), "Locale");
    assert!(bridge.equals(&named, &parts));
    assert!(!named.is(&parts));
    assert!(!bridge.equals(&named, &locale(&bridge, "fr_FR")));

    let err = bridge.construct("Locale", &[HostValue::Int(1)]).unwrap_err();
    assert!(bridge.raise(err).is_instance("InvalidArgsError"));
}

#[test]
fn test_locale_has_no_ordering() {
    let bridge = bridge();
    let err = bridge
        .compare(&locale(&bridge, "de_DE"), &locale(&bridge, "en_US"))
        .unwrap_err();
    assert!(matches!(err, BridgeError::TypeMismatch { .. }));
}

#[test]
fn test_unicode_string_mutation_returns_receiver() {
    let bridge = bridge();
    let s = unicode_string(&bridge, "Hello");
    let same = call(&bridge, &s, "append", &[HostValue::str(", World")]);
    assert!(same.is(&s));
    let same = call(&bridge, &s, "toUpper", &[]);
    assert!(same.is(&s));
    assert_eq!(text(&call(&bridge, &s, "__str__", &[])), "HELLO, WORLD");

    // Text parameters accept another UnicodeString
    let tail = unicode_string(&bridge, "!");
    call(&bridge, &s, "append", &[tail]);
    assert_eq!(text(&call(&bridge, &s, "__str__", &[])), "HELLO, WORLD!");

    let empty = bridge.construct("UnicodeString", &[]).unwrap();
    assert_eq!(call(&bridge, &empty, "length", &[]).as_int(), Some(0));
}

#[test]
fn test_unicode_string_utf16_indexing() {
    let bridge = bridge();
    let s = unicode_string(&bridge, "a\u{1F600}");
    assert_eq!(call(&bridge, &s, "length", &[]).as_int(), Some(3));
    assert_eq!(call(&bridge, &s, "charAt", &[HostValue::Int(0)]).as_int(), Some('a' as i64));
    assert_eq!(call(&bridge, &s, "charAt", &[HostValue::Int(1)]).as_int(), Some(0xD83D));

    for index in [3, -1] {
        let err = bridge
            .call_method(&s, "charAt", &[HostValue::Int(index)])
            .unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::INDEX_OUTOFBOUNDS_ERROR));
        assert!(bridge.raise(err).is_instance("ICUError"));
    }
    let err = bridge
        .call_method(&s, "charAt", &[HostValue::Float(1.0)])
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_unicode_string_ordering() {
    let bridge = bridge();
    let apple = unicode_string(&bridge, "apple");
    let banana = unicode_string(&bridge, "banana");
    assert_eq!(bridge.compare(&apple, &banana).unwrap(), Ordering::Less);
    assert_eq!(bridge.compare(&banana, &apple).unwrap(), Ordering::Greater);
    assert!(bridge.equals(&apple, &unicode_string(&bridge, "apple")));
    assert!(!bridge.equals(&apple, &banana));
}
