//! Engine tests against a small synthetic native library

use std::cell::Cell;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use lingua_core::{
    as_wrapper, Bridge, BridgeError, BridgeOptions, BridgeResult, Constant, HostClass, HostEnvironment,
    HostObject, HostValue, ModuleBuilder, NativeObject, NativeTypeInfo, OwnershipPolicy, Param, ProxyState,
    UpcallProxy,
};
use parking_lot::Mutex;

static SHAPE: NativeTypeInfo = NativeTypeInfo::root("Shape");
static CIRCLE: NativeTypeInfo = NativeTypeInfo::derived("Circle", &SHAPE);
static SQUARE: NativeTypeInfo = NativeTypeInfo::derived("Square", &SHAPE);
static BUFFER: NativeTypeInfo = NativeTypeInfo::root("Buffer");
static NOTIFIER: NativeTypeInfo = NativeTypeInfo::root("Notifier");
static HOLDER: NativeTypeInfo = NativeTypeInfo::root("Holder");

thread_local! {
    static FIGURES_DROPPED: Cell<usize> = Cell::new(0);
}

fn figures_dropped() -> usize {
    FIGURES_DROPPED.with(Cell::get)
}

struct Figure {
    info: &'static NativeTypeInfo,
    size: f64,
}

impl Drop for Figure {
    fn drop(&mut self) {
        FIGURES_DROPPED.with(|n| n.set(n.get() + 1));
    }
}

impl NativeObject for Figure {
    fn type_info(&self) -> &'static NativeTypeInfo {
        self.info
    }

    fn clone_native(&self) -> Option<Box<dyn NativeObject>> {
        Some(Box::new(Figure {
            info: self.info,
            size: self.size,
        }))
    }

    fn native_eq(&self, other: &dyn NativeObject) -> Option<bool> {
        let other = other.downcast_ref::<Figure>()?;
        Some(self.info.id() == other.info.id() && self.size == other.size)
    }

    fn native_cmp(&self, other: &dyn NativeObject) -> Option<Ordering> {
        self.size.partial_cmp(&other.downcast_ref::<Figure>()?.size)
    }

    lingua_core::native_any!();
}

struct Buffer(Mutex<String>);

impl NativeObject for Buffer {
    fn type_info(&self) -> &'static NativeTypeInfo {
        &BUFFER
    }

    fn as_text(&self) -> Option<String> {
        Some(self.0.lock().clone())
    }

    lingua_core::native_any!();
}

struct Notifier(UpcallProxy);

impl NativeObject for Notifier {
    fn type_info(&self) -> &'static NativeTypeInfo {
        &NOTIFIER
    }

    lingua_core::native_any!();
}

impl Notifier {
    fn fire(&self, value: i64) -> i64 {
        self.0.upcall("onEvent", &[HostValue::Int(value)], -1)
    }
}

#[derive(Default)]
struct Holder(Mutex<Vec<Box<dyn NativeObject>>>);

impl NativeObject for Holder {
    fn type_info(&self) -> &'static NativeTypeInfo {
        &HOLDER
    }

    lingua_core::native_any!();
}

struct TestHost;

impl HostEnvironment for TestHost {
    fn exception_base(&self, name: &str) -> Option<String> {
        Some(format!("builtins.{}", name))
    }
}

struct NoValueError;

impl HostEnvironment for NoValueError {
    fn exception_base(&self, name: &str) -> Option<String> {
        (name == "Exception").then(|| name.to_string())
    }
}

fn figure_kind(kind: &str) -> BridgeResult<&'static NativeTypeInfo> {
    match kind {
        "circle" => Ok(&CIRCLE),
        "square" => Ok(&SQUARE),
        "shape" => Ok(&SHAPE),
        _ => Err(BridgeError::status(lingua_core::StatusCode::ILLEGAL_ARGUMENT_ERROR)),
    }
}

fn bridge_with(options: BridgeOptions) -> Bridge {
    let mut module = ModuleBuilder::new("shapes", &TestHost).unwrap();
    module.options(options);

    let shape = HostClass::builder("Shape", &SHAPE)
        .method("size", |m| {
            m.no_args(|f| Ok(HostValue::Float(f.this::<Figure>()?.size)))
        })
        .method("clone", |m| {
            m.no_args(|f| {
                let copy = f.this::<Figure>()?.clone_native().ok_or("not cloneable")?;
                f.wrap(copy, "Shape")
            })
        })
        .static_method("create", |m| {
            m.sig([Param::Str, Param::Double], |f| {
                let info = figure_kind(f.str(0)?)?;
                f.wrap(Box::new(Figure { info, size: f.f64(1)? }), "Shape")
            })
        })
        .rich_compare()
        .build();
    module.add_class(Arc::clone(&shape));

    let circle = HostClass::builder("Circle", &CIRCLE)
        .base(&shape)
        .init(|m| {
            m.no_args(|f| f.instance(Box::new(Figure { info: &CIRCLE, size: 1.0 })))
                .sig([Param::Double], |f| {
                    f.instance(Box::new(Figure {
                        info: &CIRCLE,
                        size: f.f64(0)?,
                    }))
                })
        })
        .method("radius", |m| {
            m.no_args(|f| Ok(HostValue::Float(f.this::<Figure>()?.size / 2.0)))
        })
        .build();
    module.add_class(circle);

    module.add_class(
        HostClass::builder("Buffer", &BUFFER)
            .init(|m| {
                m.no_args(|f| f.instance(Box::new(Buffer(Mutex::new(String::new())))))
                    .sig([Param::Str], |f| f.instance(Box::new(Buffer(Mutex::new(f.str(0)?.to_string())))))
            })
            .method("append", |m| {
                m.sig([Param::Text], |f| {
                    f.this::<Buffer>()?.0.lock().push_str(f.str(0)?);
                    Ok(f.this_value()?.clone())
                })
            })
            .method("text", |m| {
                m.no_args(|f| Ok(HostValue::str(f.this::<Buffer>()?.0.lock().as_str())))
            })
            .build(),
    );

    module.add_class(
        HostClass::builder("Notifier", &NOTIFIER)
            .init(|m| {
                m.sig([Param::Host], |f| {
                    let proxy = UpcallProxy::new(f.host(0)?.clone(), f.bridge());
                    proxy.attach();
                    f.instance(Box::new(Notifier(proxy)))
                })
            })
            .method("fire", |m| {
                m.sig([Param::Int64], |f| Ok(HostValue::Int(f.this::<Notifier>()?.fire(f.i64(0)?))))
            })
            .build(),
    );

    module.add_class(
        HostClass::builder("Holder", &HOLDER)
            .init(|m| m.no_args(|f| f.instance(Box::new(Holder::default()))))
            .method("adopt", |m| {
                m.sig([Param::Adopt("Shape")], |f| {
                    let adopted = f.adopt(0)?;
                    f.this::<Holder>()?.0.lock().push(adopted);
                    Ok(HostValue::None)
                })
            })
            .method("count", |m| {
                m.no_args(|f| Ok(HostValue::Int(f.this::<Holder>()?.0.lock().len() as i64)))
            })
            .build(),
    );

    module.constant("Shape", "kCircle", Constant::Int(1));
    module.int_constants("Shape", &[("kSquare", 2), ("kCircle", 3)]);
    module.constant("Shape", "kName", Constant::Str("shape"));

    module.build()
}

fn bridge() -> Bridge {
    bridge_with(BridgeOptions::new().with_ownership_policy(OwnershipPolicy::Leak))
}

fn class_of(value: &HostValue) -> &str {
    value.type_name()
}

#[test]
fn test_module_requires_exception_bases() {
    let err = ModuleBuilder::new("shapes", &NoValueError).err().unwrap();
    assert!(matches!(err, BridgeError::Module(ref msg) if msg.contains("ValueError")));
}

#[test]
fn test_constructor_signatures() {
    let bridge = bridge();
    let default = bridge.construct("Circle", &[]).unwrap();
    assert_eq!(bridge.call_method(&default, "size", &[]).unwrap().as_float(), Some(1.0));

    let sized = bridge.construct("Circle", &[HostValue::Float(4.0)]).unwrap();
    let radius = bridge.call_method(&sized, "radius", &[]).unwrap();
    assert_eq!(radius.as_float(), Some(2.0));

    let err = bridge.construct("Circle", &[HostValue::str("big")]).unwrap_err();
    assert_eq!(err.to_string(), "Circle.__init__(): invalid arguments (str)");
    let exc = bridge.raise(err);
    assert!(exc.is_instance("InvalidArgsError"));
    assert!(exc.is_instance("builtins.ValueError"));
}

#[test]
fn test_abstract_class_has_no_constructor() {
    let bridge = bridge();
    let err = bridge.construct("Shape", &[]).unwrap_err();
    assert!(matches!(err, BridgeError::Abstract(ref name) if name == "Shape"));
}

#[test]
fn test_factory_polymorphism() {
    let bridge = bridge();
    let circle = bridge
        .call_static("Shape", "create", &[HostValue::str("circle"), HostValue::Float(6.0)])
        .unwrap();
    assert_eq!(class_of(&circle), "Circle");
    assert_eq!(bridge.call_method(&circle, "radius", &[]).unwrap().as_float(), Some(3.0));

    let square = bridge
        .call_static("Shape", "create", &[HostValue::str("square"), HostValue::Float(2.0)])
        .unwrap();
    assert_eq!(class_of(&square), "Shape");
    assert_eq!(bridge.call_method(&square, "size", &[]).unwrap().as_float(), Some(2.0));
    let err = bridge.call_method(&square, "radius", &[]).unwrap_err();
    assert!(matches!(err, BridgeError::NoSuchMethod { .. }));
}

#[test]
fn test_factory_status_failure() {
    let bridge = bridge();
    let err = bridge
        .call_static("Shape", "create", &[HostValue::str("blob"), HostValue::Float(1.0)])
        .unwrap_err();
    let exc = bridge.raise(err);
    assert!(exc.is_instance("ICUError"));
    assert_eq!(exc.status(), Some(lingua_core::StatusCode::ILLEGAL_ARGUMENT_ERROR));
}

#[test]
fn test_clone_round_trip_is_equal() {
    let bridge = bridge();
    let circle = bridge.construct("Circle", &[HostValue::Float(2.0)]).unwrap();
    let copy = bridge.call_method(&circle, "clone", &[]).unwrap();
    assert_eq!(class_of(&copy), "Circle");
    assert!(!circle.is(&copy));
    assert!(bridge.equals(&circle, &copy));

    let bigger = bridge.construct("Circle", &[HostValue::Float(3.0)]).unwrap();
    assert!(!bridge.equals(&circle, &bigger));
    assert_eq!(bridge.compare(&circle, &bigger).unwrap(), Ordering::Less);
}

#[test]
fn test_output_argument_identity() {
    let bridge = bridge();
    let buffer = bridge.construct("Buffer", &[HostValue::str("ab")]).unwrap();
    let returned = bridge.call_method(&buffer, "append", &[HostValue::str("cd")]).unwrap();
    assert!(returned.is(&buffer));

    let other = bridge.construct("Buffer", &[HostValue::str("ef")]).unwrap();
    bridge.call_method(&buffer, "append", &[other]).unwrap();
    let text = bridge.call_method(&buffer, "text", &[]).unwrap();
    assert_eq!(text.as_str(), Some("abcdef"));
}

#[test]
fn test_adoption_detaches_wrapper() {
    let bridge = bridge();
    let holder = bridge.construct("Holder", &[]).unwrap();
    let circle = bridge.construct("Circle", &[HostValue::Float(1.0)]).unwrap();

    bridge.call_method(&holder, "adopt", &[circle.clone()]).unwrap();
    assert_eq!(bridge.call_method(&holder, "count", &[]).unwrap().as_int(), Some(1));

    let wrapper = as_wrapper(&circle).unwrap();
    assert!(wrapper.handle().is_detached());
    let err = bridge.call_method(&circle, "size", &[]).unwrap_err();
    assert!(matches!(err, BridgeError::OwnershipViolation(_)));

    let err = bridge.call_method(&holder, "adopt", &[circle]).unwrap_err();
    assert!(matches!(err, BridgeError::OwnershipViolation(_)));
    assert_eq!(bridge.call_method(&holder, "count", &[]).unwrap().as_int(), Some(1));
}

#[test]
fn test_adopted_object_released_by_its_owner() {
    let bridge = bridge();
    let before = figures_dropped();
    {
        let holder = bridge.construct("Holder", &[]).unwrap();
        let circle = bridge.construct("Circle", &[]).unwrap();
        bridge.call_method(&holder, "adopt", &[circle.clone()]).unwrap();
        drop(circle);
        assert_eq!(figures_dropped(), before);
    }
    assert_eq!(figures_dropped(), before + 1);
}

#[test]
fn test_constants_last_value_wins() {
    let bridge = bridge();
    assert_eq!(bridge.constant("Shape", "kCircle").unwrap().as_int(), Some(3));
    assert_eq!(bridge.constant("Shape", "kName").unwrap().as_str(), Some("shape"));
    let names: Vec<_> = bridge.constants("Shape").into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["kCircle", "kSquare", "kName"]);
    assert!(bridge.constant("Shape", "kOval").is_none());
}

struct Doubler;

impl HostObject for Doubler {
    fn type_name(&self) -> &str {
        "Doubler"
    }

    fn call_method(&self, name: &str, args: &[HostValue]) -> BridgeResult<HostValue> {
        match name {
            "onEvent" => Ok(HostValue::Int(args[0].as_int().unwrap_or(0) * 2)),
            _ => Err(BridgeError::NoSuchMethod {
                class: "Doubler".into(),
                method: name.into(),
            }),
        }
    }

    fn has_method(&self, name: &str) -> bool {
        name == "onEvent"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

struct Raising;

impl HostObject for Raising {
    fn type_name(&self) -> &str {
        "Raising"
    }

    fn call_method(&self, _name: &str, _args: &[HostValue]) -> BridgeResult<HostValue> {
        Err(BridgeError::host("KeyError", "missing"))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

struct Panicking;

impl HostObject for Panicking {
    fn type_name(&self) -> &str {
        "Panicking"
    }

    fn call_method(&self, _name: &str, _args: &[HostValue]) -> BridgeResult<HostValue> {
        panic!("host bug")
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

struct WrongType;

impl HostObject for WrongType {
    fn type_name(&self) -> &str {
        "WrongType"
    }

    fn call_method(&self, _name: &str, _args: &[HostValue]) -> BridgeResult<HostValue> {
        Ok(HostValue::str("not a number"))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

struct Reentrant {
    bridge: Bridge,
    notifier: Mutex<Option<HostValue>>,
    calls: AtomicUsize,
}

impl HostObject for Reentrant {
    fn type_name(&self) -> &str {
        "Reentrant"
    }

    fn call_method(&self, _name: &str, args: &[HostValue]) -> BridgeResult<HostValue> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let notifier = self.notifier.lock().clone().ok_or("not connected")?;
        self.bridge.call_method(&notifier, "fire", args)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn notifier_proxy(notifier: &HostValue, bridge: &Bridge) -> UpcallProxy {
    let policy = bridge.options().ownership_policy;
    as_wrapper(notifier)
        .unwrap()
        .downcast::<Notifier>(policy)
        .unwrap()
        .0
        .clone()
}

#[test]
fn test_upcall_dispatches_to_host() {
    let bridge = bridge();
    let notifier = bridge.construct("Notifier", &[HostValue::object(Doubler)]).unwrap();
    let result = bridge.call_method(&notifier, "fire", &[HostValue::Int(21)]).unwrap();
    assert_eq!(result.as_int(), Some(42));
    assert!(notifier_proxy(&notifier, &bridge).last_error().is_none());
}

#[test]
fn test_upcall_failure_is_swallowed_and_recorded() {
    let bridge = bridge();
    let notifier = bridge.construct("Notifier", &[HostValue::object(Raising)]).unwrap();
    let result = bridge.call_method(&notifier, "fire", &[HostValue::Int(1)]).unwrap();
    assert_eq!(result.as_int(), Some(-1));

    let proxy = notifier_proxy(&notifier, &bridge);
    match proxy.take_last_error() {
        Some(BridgeError::UpcallFailed { method, reason }) => {
            assert_eq!(method, "onEvent");
            assert!(reason.contains("KeyError"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(proxy.last_error().is_none());
}

#[test]
fn test_upcall_panic_does_not_unwind() {
    let bridge = bridge();
    let notifier = bridge.construct("Notifier", &[HostValue::object(Panicking)]).unwrap();
    let result = bridge.call_method(&notifier, "fire", &[HostValue::Int(1)]).unwrap();
    assert_eq!(result.as_int(), Some(-1));
    let err = notifier_proxy(&notifier, &bridge).last_error();
    assert!(matches!(err, Some(BridgeError::Panic(ref msg)) if msg == "host bug"));
}

#[test]
fn test_upcall_bad_result_uses_default() {
    let bridge = bridge();
    let notifier = bridge.construct("Notifier", &[HostValue::object(WrongType)]).unwrap();
    let result = bridge.call_method(&notifier, "fire", &[HostValue::Int(1)]).unwrap();
    assert_eq!(result.as_int(), Some(-1));
    assert!(matches!(
        notifier_proxy(&notifier, &bridge).last_error(),
        Some(BridgeError::UpcallFailed { .. })
    ));
}

#[test]
fn test_upcall_depth_is_bounded() {
    let bridge = bridge_with(
        BridgeOptions::new()
            .with_ownership_policy(OwnershipPolicy::Leak)
            .with_max_upcall_depth(4),
    );
    let host = Arc::new(Reentrant {
        bridge: bridge.clone(),
        notifier: Mutex::new(None),
        calls: AtomicUsize::new(0),
    });
    let notifier = bridge
        .construct("Notifier", &[HostValue::Object(host.clone())])
        .unwrap();
    *host.notifier.lock() = Some(notifier.clone());

    let result = bridge.call_method(&notifier, "fire", &[HostValue::Int(1)]).unwrap();
    assert_eq!(result.as_int(), Some(-1));
    assert_eq!(host.calls.load(AtomicOrdering::SeqCst), 4);
    assert!(matches!(
        notifier_proxy(&notifier, &bridge).last_error(),
        Some(BridgeError::UpcallDepthExceeded { limit: 4, .. })
    ));

    host.notifier.lock().take();
}

#[test]
fn test_proxy_state_machine() {
    let bridge = bridge();
    let proxy = UpcallProxy::new(HostValue::object(Doubler), &bridge);
    let weak = proxy.downgrade();
    assert_eq!(weak.state(), ProxyState::Unattached);

    proxy.attach();
    assert_eq!(weak.state(), ProxyState::Active);
    assert!(weak.is(&proxy));

    let clone = proxy.clone();
    assert!(clone.same_proxy(&proxy));
    drop(proxy);
    assert_eq!(weak.state(), ProxyState::Active);
    assert_eq!(clone.upcall("onEvent", &[HostValue::Int(5)], 0i64), 10);

    drop(clone);
    assert_eq!(weak.state(), ProxyState::Released);
}

#[test]
fn test_proxy_keeps_host_object_alive() {
    let bridge = bridge();
    let host: Arc<dyn HostObject> = Arc::new(Doubler);
    let weak_host = Arc::downgrade(&host);
    let notifier = bridge.construct("Notifier", &[HostValue::Object(host)]).unwrap();
    assert!(weak_host.upgrade().is_some());
    drop(notifier);
    assert!(weak_host.upgrade().is_none());
}
