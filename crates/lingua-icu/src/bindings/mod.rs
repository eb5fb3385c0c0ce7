//! Host bindings of the class families
//!
//! Each submodule registers one family with the module builder: host
//! classes in base-first order, their ordered call signatures and the
//! family's constant tables.

use lingua_core::{
    translate, Bridge, BridgeError, BridgeOptions, BridgeResult, CallFrame, Constant, HostEnvironment, HostValue,
    ModuleBuilder, StatusCode,
};

use crate::native::NativeResult;

mod format;
mod locale;
mod timezone;
mod translit;
mod unistr;

/// Name of the host module
pub const MODULE_NAME: &str = "icu";

/// Initialize the module with options read from the environment
pub fn init_module(env: &dyn HostEnvironment) -> BridgeResult<Bridge> {
    init_module_with(env, BridgeOptions::from_env())
}

/// Initialize the module with explicit options
pub fn init_module_with(env: &dyn HostEnvironment, options: BridgeOptions) -> BridgeResult<Bridge> {
    let mut module = ModuleBuilder::new(MODULE_NAME, env)?;
    module.options(options);
    module.constant("ICU", "VERSION", Constant::Str(env!("CARGO_PKG_VERSION")));

    locale::register(&mut module)?;
    unistr::register(&mut module)?;
    format::register(&mut module)?;
    timezone::register(&mut module)?;
    translit::register(&mut module)?;

    Ok(module.build())
}

/// Status translation for fallible native calls
pub(crate) trait Translated<T> {
    fn translated(self) -> BridgeResult<T>;
}

impl<T> Translated<T> for NativeResult<T> {
    fn translated(self) -> BridgeResult<T> {
        self.or_else(|envelope| {
            let status = envelope.status;
            translate(envelope)?;
            Err(BridgeError::status(status))
        })
    }
}

/// Polymorphic `clone()` of the receiver, wrapped below `declared`
pub(crate) fn clone_this(frame: &CallFrame<'_>, declared: &str) -> BridgeResult<HostValue> {
    let policy = frame.bridge().options().ownership_policy;
    let copy = frame
        .this_wrapper()?
        .native(policy)?
        .clone_native()
        .ok_or_else(|| BridgeError::status(StatusCode::UNSUPPORTED_ERROR))?;
    frame.wrap(copy, declared)
}

/// Character offset argument; negative offsets are illegal
pub(crate) fn offset_arg(frame: &CallFrame<'_>, index: usize) -> BridgeResult<usize> {
    usize::try_from(frame.i32(index)?).map_err(|_| BridgeError::status(StatusCode::ILLEGAL_ARGUMENT_ERROR))
}
