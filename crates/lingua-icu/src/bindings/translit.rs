//! `UnicodeFilter`, `UnicodeSet` and `Transliterator`
//!
//! Constructing `UnicodeFilter` or `Transliterator` with a host object
//! creates a native object whose virtual methods call back into that host
//! object. `adoptFilter` transfers a filter to the transliterator;
//! `getFilter` returns a borrowed view that keeps the transliterator alive.

use lingua_core::{
    BridgeError, BridgeResult, CallFrame, HostClass, HostValue, ModuleBuilder, NativeObject, Param, StatusCode,
    UpcallProxy,
};

use super::{clone_this, Translated};
use crate::native::translit::{TRANSLITERATOR, UNICODE_FILTER, UNICODE_SET};
use crate::native::{into_filter, Direction, Filter, HostFilter, Transliterator, UnicodeSet, UnicodeString};

fn this<'a>(frame: &CallFrame<'a>) -> BridgeResult<&'a Transliterator> {
    frame.this::<Transliterator>()
}

fn as_filter(native: &dyn NativeObject) -> Option<&dyn Filter> {
    if let Some(set) = native.downcast_ref::<UnicodeSet>() {
        Some(set)
    } else if let Some(filter) = native.downcast_ref::<HostFilter>() {
        Some(filter)
    } else {
        None
    }
}

fn contains(frame: &CallFrame<'_>, c: Option<char>) -> BridgeResult<HostValue> {
    let policy = frame.bridge().options().ownership_policy;
    let native = frame.this_wrapper()?.native(policy)?;
    let filter = as_filter(native).ok_or_else(|| BridgeError::TypeMismatch {
        expected: "UnicodeFilter".to_string(),
        got: native.type_info().name().to_string(),
    })?;
    Ok(HostValue::Bool(c.map_or(false, |c| filter.contains(c))))
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn create(frame: &CallFrame<'_>, direction: i32) -> BridgeResult<HostValue> {
    let direction = Direction::from_code(direction)
        .ok_or_else(|| BridgeError::status(StatusCode::ILLEGAL_ARGUMENT_ERROR))?;
    let transliterator = Transliterator::create_instance(frame.str(0)?, direction).translated()?;
    frame.wrap(Box::new(transliterator), "Transliterator")
}

fn adopt_filter(frame: &CallFrame<'_>) -> BridgeResult<HostValue> {
    let transliterator = this(frame)?;
    let filter = if frame.is_none(0) {
        None
    } else {
        let adopted = frame.adopt(0)?;
        let got = adopted.type_info().name();
        Some(into_filter(adopted).ok_or_else(|| BridgeError::TypeMismatch {
            expected: "UnicodeFilter".to_string(),
            got: got.to_string(),
        })?)
    };
    transliterator.adopt_filter(filter);
    Ok(HostValue::None)
}

fn get_filter(frame: &CallFrame<'_>) -> BridgeResult<HostValue> {
    match this(frame)?.filter_ptr() {
        // SAFETY: the transliterator keeps every filter it adopted until it
        // is dropped, and the returned wrapper keeps the receiver alive.
        Some(ptr) => unsafe { frame.wrap_member(ptr, "UnicodeFilter") },
        None => Ok(HostValue::None),
    }
}

pub(super) fn register(module: &mut ModuleBuilder) -> BridgeResult<()> {
    let unicode_filter = HostClass::builder("UnicodeFilter", &UNICODE_FILTER)
        .init(|m| {
            m.sig([Param::Host], |f| {
                let proxy = UpcallProxy::new(f.host(0)?.clone(), f.bridge());
                f.instance(Box::new(HostFilter::new(proxy)))
            })
        })
        .method("contains", |m| {
            m.sig([Param::Str], |f| contains(f, single_char(f.str(0)?)))
                .sig([Param::Int32], |f| {
                    let c = u32::try_from(f.i32(0)?).ok().and_then(char::from_u32);
                    contains(f, c)
                })
        })
        .method("clone", |m| m.no_args(|f| clone_this(f, "UnicodeFilter")))
        .build();

    let unicode_set = HostClass::builder("UnicodeSet", &UNICODE_SET)
        .base(&unicode_filter)
        .init(|m| {
            m.no_args(|f| f.instance(Box::new(UnicodeSet::new())))
                .sig([Param::Text], |f| {
                    let set = UnicodeSet::from_pattern(f.str(0)?).translated()?;
                    f.instance(Box::new(set))
                })
        })
        .method("toPattern", |m| {
            m.no_args(|f| Ok(HostValue::from(f.this::<UnicodeSet>()?.to_pattern())))
        })
        .method("size", |m| m.no_args(|f| Ok(HostValue::Int(f.this::<UnicodeSet>()?.size() as i64))))
        .rich_compare()
        .build();

    let transliterator = HostClass::builder("Transliterator", &TRANSLITERATOR)
        .init(|m| {
            m.sig([Param::Str, Param::Host], |f| {
                let proxy = UpcallProxy::new(f.host(1)?.clone(), f.bridge());
                f.instance(Box::new(Transliterator::host(f.str(0)?, proxy)))
            })
        })
        .method("getID", |m| m.no_args(|f| Ok(HostValue::from(this(f)?.id()))))
        .method("transliterate", |m| {
            m.sig([Param::Object("UnicodeString")], |f| {
                let text = f.native::<UnicodeString>(0)?;
                text.set_text(this(f)?.transliterate(&text.text()));
                Ok(f.arg(0)?.clone())
            })
            .sig([Param::Str], |f| Ok(HostValue::from(this(f)?.transliterate(f.str(0)?))))
        })
        .method("adoptFilter", |m| {
            m.sig([Param::optional(Param::Adopt("UnicodeFilter"))], adopt_filter)
        })
        .method("getFilter", |m| m.no_args(get_filter))
        .method("getLastUpcallError", |m| {
            m.no_args(|f| {
                Ok(this(f)?
                    .last_upcall_error()
                    .map_or(HostValue::None, |err| HostValue::from(err.to_string())))
            })
        })
        .method("clone", |m| m.no_args(|f| clone_this(f, "Transliterator")))
        .static_method("createInstance", |m| {
            m.sig([Param::Str], |f| create(f, Direction::Forward as i32))
                .sig([Param::Str, Param::Int32], |f| create(f, f.i32(1)?))
        })
        .build();

    module
        .add_class(unicode_filter)
        .add_class(unicode_set)
        .add_class(transliterator);

    module.int_constants(
        "UTransDirection",
        &[
            ("UTRANS_FORWARD", Direction::Forward as i64),
            ("UTRANS_REVERSE", Direction::Reverse as i64),
        ],
    );
    Ok(())
}
