//! Every native object is released exactly once, whichever side owns it

mod common;

use common::{bridge, call, locale, text, unicode_string};
use lingua_core::{as_wrapper, BridgeError, HostValue};
use lingua_icu::native::alloc_stats;

fn is_detached(value: &HostValue) -> bool {
    as_wrapper(value).unwrap().handle().is_detached()
}

#[test]
fn test_host_owned_objects_are_released_once() {
    let bridge = bridge();
    let start = alloc_stats();
    {
        let german = locale(&bridge, "de_DE");
        let format = bridge.construct("DecimalFormat", &[german.clone()]).unwrap();
        let copy = call(&bridge, &format, "clone", &[]);
        let buffer = unicode_string(&bridge, "n=");
        call(&bridge, &copy, "format", &[HostValue::Int(7), buffer.clone()]);
        let back = call(&bridge, &format, "getLocale", &[]);
        assert!(bridge.equals(&back, &german));
        assert!(alloc_stats().since(start).live() >= 5);
    }
    let stats = alloc_stats().since(start);
    assert!(stats.allocated > 0);
    assert_eq!(stats.live(), 0);
    assert_eq!(stats.allocated, stats.released);
}

#[test]
fn test_failed_calls_release_temporaries() {
    let bridge = bridge();
    let start = alloc_stats();
    {
        let format = bridge.construct("DecimalFormat", &[HostValue::str("#,##0.00")]).unwrap();
        assert!(bridge
            .call_method(&format, "applyPattern", &[HostValue::str("0..0")])
            .is_err());
        assert!(bridge
            .construct("UnicodeSet", &[HostValue::str("[a-")])
            .is_err());
        assert!(bridge
            .call_static("Transliterator", "createInstance", &[HostValue::str("Any-Klingon")])
            .is_err());
    }
    assert_eq!(alloc_stats().since(start).live(), 0);
}

#[test]
fn test_adopted_filter_is_owned_by_the_transliterator() {
    let bridge = bridge();
    let start = alloc_stats();
    {
        let upper = bridge
            .call_static("Transliterator", "createInstance", &[HostValue::str("Any-Upper")])
            .unwrap();
        let set = bridge.construct("UnicodeSet", &[HostValue::str("[a-c]")]).unwrap();
        call(&bridge, &upper, "adoptFilter", &[set.clone()]);

        // the host wrapper gave its object away
        assert!(is_detached(&set));
        let err = bridge.call_method(&set, "size", &[]).unwrap_err();
        assert!(matches!(err, BridgeError::OwnershipViolation(_)));
        let err = bridge
            .call_method(&upper, "adoptFilter", &[set.clone()])
            .unwrap_err();
        assert!(matches!(err, BridgeError::OwnershipViolation(_)));

        assert_eq!(text(&call(&bridge, &upper, "transliterate", &[HostValue::str("abcxyz")])), "ABCxyz");

        // borrowed view keeps the transliterator alive
        let view = call(&bridge, &upper, "getFilter", &[]);
        assert_eq!(view.type_name(), "UnicodeSet");
        assert!(!as_wrapper(&view).unwrap().handle().is_owned());
        drop(upper);
        assert_eq!(text(&call(&bridge, &view, "toPattern", &[])), "[a-c]");
        assert_eq!(alloc_stats().since(start).live(), 2);
        drop(view);
        drop(set);
    }
    let stats = alloc_stats().since(start);
    assert_eq!(stats.live(), 0);
    assert_eq!(stats.allocated, stats.released);
}

#[test]
fn test_replaced_filters_live_until_owner_drops() {
    let bridge = bridge();
    let start = alloc_stats();
    let upper = bridge
        .call_static("Transliterator", "createInstance", &[HostValue::str("Any-Upper")])
        .unwrap();
    for pattern in ["[a]", "[b]"] {
        let set = bridge.construct("UnicodeSet", &[HostValue::str(pattern)]).unwrap();
        call(&bridge, &upper, "adoptFilter", &[set]);
    }
    call(&bridge, &upper, "adoptFilter", &[HostValue::None]);
    assert!(call(&bridge, &upper, "getFilter", &[]).is_none());
    assert_eq!(text(&call(&bridge, &upper, "transliterate", &[HostValue::str("ab")])), "AB");
    assert_eq!(alloc_stats().since(start).live(), 3);

    drop(upper);
    assert_eq!(alloc_stats().since(start).live(), 0);
}

#[test]
fn test_adopting_a_borrowed_view_is_rejected() {
    let bridge = bridge();
    let upper = bridge
        .call_static("Transliterator", "createInstance", &[HostValue::str("Any-Upper")])
        .unwrap();
    let lower = bridge
        .call_static("Transliterator", "createInstance", &[HostValue::str("Any-Lower")])
        .unwrap();
    let set = bridge.construct("UnicodeSet", &[HostValue::str("[xyz]")]).unwrap();
    call(&bridge, &upper, "adoptFilter", &[set]);

    let view = call(&bridge, &upper, "getFilter", &[]);
    let err = bridge.call_method(&lower, "adoptFilter", &[view.clone()]).unwrap_err();
    assert!(matches!(err, BridgeError::OwnershipViolation(_)));
    assert!(!is_detached(&view));
    assert_eq!(call(&bridge, &view, "size", &[]).as_int(), Some(3));
}
