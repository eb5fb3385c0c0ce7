//! `Locale`

use lingua_core::{BridgeResult, CallFrame, HostClass, HostValue, ModuleBuilder, Param};

use crate::native::locale::LOCALE;
use crate::native::Locale;

/// Optional leading `Locale` argument, the default locale when absent
pub(crate) fn locale_arg(frame: &CallFrame<'_>, index: usize) -> BridgeResult<Locale> {
    if frame.len() > index {
        Ok(frame.native::<Locale>(index)?.clone())
    } else {
        Ok(Locale::default_locale())
    }
}

fn getter(frame: &CallFrame<'_>, get: impl Fn(&Locale) -> String) -> BridgeResult<HostValue> {
    Ok(HostValue::from(get(frame.this::<Locale>()?)))
}

pub(super) fn register(module: &mut ModuleBuilder) -> BridgeResult<()> {
    let class = HostClass::builder("Locale", &LOCALE)
        .init(|m| {
            m.no_args(|f| f.instance(Box::new(Locale::default_locale())))
                .sig([Param::Str], |f| f.instance(Box::new(Locale::from_name(f.str(0)?))))
                .sig([Param::Str, Param::Str], |f| {
                    f.instance(Box::new(Locale::new(f.str(0)?, f.str(1)?, "")))
                })
                .sig([Param::Str, Param::Str, Param::Str], |f| {
                    f.instance(Box::new(Locale::new(f.str(0)?, f.str(1)?, f.str(2)?)))
                })
        })
        .method("getName", |m| m.no_args(|f| getter(f, Locale::name)))
        .method("getLanguage", |m| m.no_args(|f| getter(f, |l| l.language().to_string())))
        .method("getCountry", |m| m.no_args(|f| getter(f, |l| l.country().to_string())))
        .method("getVariant", |m| m.no_args(|f| getter(f, |l| l.variant().to_string())))
        .static_method("getDefault", |m| m.no_args(|f| f.instance(Box::new(Locale::default_locale()))))
        .static_method("createFromName", |m| {
            m.sig([Param::Str], |f| f.instance(Box::new(Locale::from_name(f.str(0)?))))
        })
        .rich_compare()
        .build();

    module.add_class(class);
    Ok(())
}
