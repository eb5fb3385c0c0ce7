//! `Format`, `NumberFormat` and `DecimalFormat`
//!
//! `Format` and `NumberFormat` are abstract; the factories return whatever
//! concrete format the native library builds, wrapped as the most-derived
//! registered class. Rule-based formats have no host class of their own and
//! surface as `NumberFormat`.

use lingua_core::{BridgeResult, CallFrame, HostClass, HostValue, MethodBuilder, ModuleBuilder, Param, WarningResult};

use super::locale::locale_arg;
use super::{clone_this, offset_arg, Translated};
use crate::native::format::{DECIMAL_FORMAT, FORMAT, NUMBER_FORMAT};
use crate::native::{Locale, Number, NumberFormat, NumberStyle, UnicodeString};

fn this<'a>(frame: &CallFrame<'a>) -> BridgeResult<&'a NumberFormat> {
    frame.this::<NumberFormat>()
}

/// Factory taking an optional `Locale` first argument
fn create(frame: &CallFrame<'_>, style: i32) -> BridgeResult<HostValue> {
    let format = NumberFormat::create_instance(locale_arg(frame, 0)?, style).translated()?;
    frame.wrap(Box::new(format), "NumberFormat")
}

fn factory(style: NumberStyle) -> impl Fn(MethodBuilder) -> MethodBuilder {
    move |m| {
        m.no_args(move |f| create(f, style as i32))
            .sig([Param::Object("Locale")], move |f| create(f, style as i32))
    }
}

/// Append `text` to the `UnicodeString` argument and return that argument
fn append_to(frame: &CallFrame<'_>, index: usize, text: &str) -> BridgeResult<HostValue> {
    frame.native::<UnicodeString>(index)?.append(text);
    Ok(frame.arg(index)?.clone())
}

fn parse(frame: &CallFrame<'_>, start: usize) -> BridgeResult<HostValue> {
    let outcome = this(frame)?.parse(frame.str(0)?, start);
    let status = frame.check(outcome.envelope)?;
    let value = match outcome.number {
        Some(Number::Int(i)) => HostValue::Int(i),
        Some(Number::Double(d)) => HostValue::Float(d),
        None => HostValue::None,
    };
    Ok(WarningResult::wrap(value, status))
}

fn decimal(frame: &CallFrame<'_>, locale: Locale, pattern: Option<&str>) -> BridgeResult<HostValue> {
    let format = NumberFormat::decimal(locale, pattern).translated()?;
    frame.instance(Box::new(format))
}

pub(super) fn register(module: &mut ModuleBuilder) -> BridgeResult<()> {
    let format = HostClass::builder("Format", &FORMAT)
        .method("clone", |m| m.no_args(|f| clone_this(f, "Format")))
        .rich_compare()
        .build();

    let number_format = HostClass::builder("NumberFormat", &NUMBER_FORMAT)
        .base(&format)
        .method("format", |m| {
            m.sig([Param::Int64], |f| Ok(HostValue::from(this(f)?.format_i64(f.i64(0)?))))
                .sig([Param::Double], |f| Ok(HostValue::from(this(f)?.format_f64(f.f64(0)?))))
                .sig([Param::Int64, Param::Object("UnicodeString")], |f| {
                    append_to(f, 1, &this(f)?.format_i64(f.i64(0)?))
                })
                .sig([Param::Double, Param::Object("UnicodeString")], |f| {
                    append_to(f, 1, &this(f)?.format_f64(f.f64(0)?))
                })
        })
        .method("parse", |m| {
            m.sig([Param::Str], |f| parse(f, 0))
                .sig([Param::Str, Param::Int32], |f| parse(f, offset_arg(f, 1)?))
        })
        .method("getMaximumFractionDigits", |m| {
            m.no_args(|f| Ok(HostValue::Int(this(f)?.max_fraction_digits() as i64)))
        })
        .method("setMaximumFractionDigits", |m| {
            m.sig([Param::Int32], |f| {
                this(f)?.set_max_fraction_digits(f.i32(0)?);
                Ok(HostValue::None)
            })
        })
        .method("isGroupingUsed", |m| m.no_args(|f| Ok(HostValue::Bool(this(f)?.is_grouping_used()))))
        .method("setGroupingUsed", |m| {
            m.sig([Param::Bool], |f| {
                this(f)?.set_grouping_used(f.bool(0)?);
                Ok(HostValue::None)
            })
        })
        .method("getLocale", |m| {
            m.no_args(|f| f.wrap(Box::new(this(f)?.locale().clone()), "Locale"))
        })
        .static_method("createInstance", |m| {
            factory(NumberStyle::Decimal)(m)
                .sig([Param::Object("Locale"), Param::Int32], |f| create(f, f.i32(1)?))
        })
        .static_method("createCurrencyInstance", factory(NumberStyle::Currency))
        .static_method("createPercentInstance", factory(NumberStyle::Percent))
        .static_method("createScientificInstance", factory(NumberStyle::Scientific))
        .build();

    let decimal_format = HostClass::builder("DecimalFormat", &DECIMAL_FORMAT)
        .base(&number_format)
        .init(|m| {
            m.no_args(|f| decimal(f, Locale::default_locale(), None))
                .sig([Param::Object("Locale")], |f| decimal(f, f.native::<Locale>(0)?.clone(), None))
                .sig([Param::Text], |f| decimal(f, Locale::default_locale(), Some(f.str(0)?)))
                .sig([Param::Text, Param::Object("Locale")], |f| {
                    decimal(f, f.native::<Locale>(1)?.clone(), Some(f.str(0)?))
                })
        })
        .method("applyPattern", |m| {
            m.sig([Param::Text], |f| {
                this(f)?.apply_pattern(f.str(0)?).translated()?;
                Ok(HostValue::None)
            })
        })
        .method("toPattern", |m| {
            m.no_args(|f| Ok(HostValue::from(this(f)?.to_pattern())))
                .sig([Param::Object("UnicodeString")], |f| append_to(f, 0, &this(f)?.to_pattern()))
        })
        .build();

    module
        .add_class(format)
        .add_class(number_format)
        .add_class(decimal_format);

    module.int_constants(
        "UNumberFormatStyle",
        &[
            ("PATTERN_DECIMAL", NumberStyle::PatternDecimal as i64),
            ("DECIMAL", NumberStyle::Decimal as i64),
            ("CURRENCY", NumberStyle::Currency as i64),
            ("PERCENT", NumberStyle::Percent as i64),
            ("SCIENTIFIC", NumberStyle::Scientific as i64),
            ("SPELLOUT", NumberStyle::Spellout as i64),
            ("DEFAULT", NumberStyle::Decimal as i64),
        ],
    );
    module.int_constants(
        "NumberFormat",
        &[
            ("kIntegerField", 0),
            ("kFractionField", 1),
            ("kDecimalSeparatorField", 2),
            ("kExponentSymbolField", 3),
        ],
    );
    Ok(())
}
