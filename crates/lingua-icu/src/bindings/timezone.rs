//! `TimeZone` and `SimpleTimeZone`
//!
//! The default zone is a process-wide native object. `getDefault` hands out
//! a copy, `setDefault` copies its argument and `adoptDefault` takes the
//! argument over, leaving the host wrapper detached.

use lingua_core::{BridgeResult, CallFrame, HostClass, HostValue, ModuleBuilder, Param};

use super::clone_this;
use crate::native::timezone::{SIMPLE_TIME_ZONE, TIME_ZONE};
use crate::native::TimeZone;

fn this<'a>(frame: &CallFrame<'a>) -> BridgeResult<&'a TimeZone> {
    frame.this::<TimeZone>()
}

pub(super) fn register(module: &mut ModuleBuilder) -> BridgeResult<()> {
    let time_zone = HostClass::builder("TimeZone", &TIME_ZONE)
        .method("getID", |m| m.no_args(|f| Ok(HostValue::from(this(f)?.id()))))
        .method("setID", |m| {
            m.sig([Param::Text], |f| {
                this(f)?.set_id(f.str(0)?);
                Ok(HostValue::None)
            })
        })
        .method("getRawOffset", |m| m.no_args(|f| Ok(HostValue::from(this(f)?.raw_offset()))))
        .method("setRawOffset", |m| {
            m.sig([Param::Int32], |f| {
                this(f)?.set_raw_offset(f.i32(0)?);
                Ok(HostValue::None)
            })
        })
        .method("hasSameRules", |m| {
            m.sig([Param::Object("TimeZone")], |f| {
                Ok(HostValue::Bool(this(f)?.has_same_rules(f.native::<TimeZone>(0)?)))
            })
        })
        .method("clone", |m| m.no_args(|f| clone_this(f, "TimeZone")))
        .static_method("createTimeZone", |m| {
            m.sig([Param::Text], |f| f.wrap(Box::new(TimeZone::create(f.str(0)?)), "TimeZone"))
        })
        .static_method("getAvailableIDs", |m| {
            m.no_args(|_| {
                let ids: Vec<HostValue> = TimeZone::available_ids().into_iter().map(HostValue::from).collect();
                Ok(HostValue::list(ids))
            })
        })
        .static_method("getDefault", |m| {
            m.no_args(|f| f.wrap(Box::new(TimeZone::default_zone()), "TimeZone"))
        })
        .static_method("setDefault", |m| {
            m.sig([Param::Object("TimeZone")], |f| {
                TimeZone::set_default(f.native::<TimeZone>(0)?);
                Ok(HostValue::None)
            })
        })
        .static_method("adoptDefault", |m| {
            m.sig([Param::Adopt("TimeZone")], |f| {
                TimeZone::adopt_default(f.adopt_as::<TimeZone>(0)?);
                Ok(HostValue::None)
            })
        })
        .rich_compare()
        .build();

    let simple_time_zone = HostClass::builder("SimpleTimeZone", &SIMPLE_TIME_ZONE)
        .base(&time_zone)
        .init(|m| {
            m.sig([Param::Int32, Param::Text], |f| {
                f.instance(Box::new(TimeZone::simple(f.i32(0)?, f.str(1)?)))
            })
        })
        .build();

    module.add_class(time_zone).add_class(simple_time_zone);
    Ok(())
}
