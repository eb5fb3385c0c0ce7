//! `UnicodeString`

use lingua_core::{BridgeResult, CallFrame, ErrorEnvelope, HostClass, HostValue, ModuleBuilder, Param, StatusCode};

use super::Translated;
use crate::native::unistr::UNICODE_STRING;
use crate::native::UnicodeString;

/// Run an in-place mutation and return the receiver itself
fn mutate(frame: &CallFrame<'_>, op: impl Fn(&UnicodeString)) -> BridgeResult<HostValue> {
    op(frame.this::<UnicodeString>()?);
    Ok(frame.this_value()?.clone())
}

pub(super) fn register(module: &mut ModuleBuilder) -> BridgeResult<()> {
    let class = HostClass::builder("UnicodeString", &UNICODE_STRING)
        .init(|m| {
            m.no_args(|f| f.instance(Box::new(UnicodeString::new(""))))
                .sig([Param::Text], |f| f.instance(Box::new(UnicodeString::new(f.str(0)?))))
        })
        .method("length", |m| {
            m.no_args(|f| Ok(HostValue::Int(f.this::<UnicodeString>()?.length() as i64)))
        })
        .method("charAt", |m| {
            m.sig([Param::Int32], |f| {
                let text = f.this::<UnicodeString>()?;
                let unit = usize::try_from(f.i32(0)?)
                    .ok()
                    .and_then(|index| text.char_at(index))
                    .ok_or_else(|| ErrorEnvelope::new(StatusCode::INDEX_OUTOFBOUNDS_ERROR))
                    .translated()?;
                Ok(HostValue::Int(i64::from(unit)))
            })
        })
        .method("append", |m| {
            m.sig([Param::Text], |f| {
                let text = f.str(0)?;
                mutate(f, |s| s.append(text))
            })
        })
        .method("toUpper", |m| m.no_args(|f| mutate(f, UnicodeString::to_upper)))
        .method("toLower", |m| m.no_args(|f| mutate(f, UnicodeString::to_lower)))
        .method("__str__", |m| {
            m.no_args(|f| Ok(HostValue::from(f.this::<UnicodeString>()?.text())))
        })
        .rich_compare()
        .build();

    module.add_class(class);
    Ok(())
}
