//! Integration tests for `cget` / `configure`
//!
//! Tests cover:
//! - Option listing under shadowing and multiple inheritance
//! - Agreement between `cget` and `configure -option`
//! - Config hooks, rollback and per-option atomicity
//! - Delegation of composite classes to a widget delegate

use std::cell::RefCell;
use std::rc::Rc;

use strata_engine::{
    ClassBuilder, ClassId, ClassKind, DispatchError, DispatchResult, EngineOptions, Interp,
    ObjectId, Protection, Value, WidgetDelegate,
};

fn args(items: &[&str]) -> Vec<Value> {
    items.iter().map(|s| Value::from(*s)).collect()
}

fn color_widget(interp: &mut Interp) -> ObjectId {
    let id = ClassBuilder::new("Widget")
        .public_with_config("color", Some(Value::from("red")), |interp| {
            let color = interp.get_var("color")?;
            interp.set_var("shadow", color.to_string().to_uppercase())
        })
        .variable("shadow", Protection::Private, None)
        .method("shadow", |interp, _args| interp.get_var("shadow"))
        .build(interp)
        .unwrap();
    interp.create_object(id, "w", &[]).unwrap()
}

#[test]
fn test_color_hook_scenario() {
    let mut interp = Interp::new();
    let w = color_widget(&mut interp);

    interp.invoke(w, "configure", &args(&["-color", "blue"])).unwrap();
    assert_eq!(interp.invoke(w, "cget", &args(&["-color"])).unwrap(), Value::from("blue"));
    assert_eq!(interp.invoke(w, "shadow", &[]).unwrap(), Value::from("BLUE"));
}

#[test]
fn test_configure_is_idempotent() {
    let mut interp = Interp::new();
    let w = color_widget(&mut interp);
    for _ in 0..2 {
        let result = interp.invoke(w, "configure", &args(&["-color", "green"])).unwrap();
        assert!(result.is_empty());
        assert_eq!(interp.invoke(w, "cget", &args(&["-color"])).unwrap(), Value::from("green"));
    }
}

#[test]
fn test_cget_matches_configure_triple() {
    let mut interp = Interp::new();
    ClassBuilder::new("Base")
        .public("x", Some(Value::from("1")))
        .public("unset", None)
        .build(&mut interp)
        .unwrap();
    let derived = ClassBuilder::new("Derived")
        .inherit("Base")
        .public("x", Some(Value::from("2")))
        .build(&mut interp)
        .unwrap();
    let obj = interp.create_object(derived, "d", &[]).unwrap();
    interp.invoke(obj, "configure", &args(&["-Base::x", "9"])).unwrap();

    for option in ["-x", "-Base::x", "-unset"] {
        let cget = interp.invoke(obj, "cget", &args(&[option])).unwrap();
        let triple = interp.invoke(obj, "configure", &args(&[option])).unwrap();
        let triple = triple.as_list().unwrap();
        assert_eq!(triple.len(), 3);
        assert_eq!(triple[2], cget, "{option}");
    }
}

#[test]
fn test_configure_lists_shadowed_options_once() {
    let mut interp = Interp::new();
    ClassBuilder::new("Root")
        .public("r", Some(Value::from("root")))
        .build(&mut interp)
        .unwrap();
    ClassBuilder::new("Left")
        .inherit("Root")
        .public("x", Some(Value::from("left")))
        .build(&mut interp)
        .unwrap();
    ClassBuilder::new("Right")
        .inherit("Root")
        .public("x", Some(Value::from("right")))
        .build(&mut interp)
        .unwrap();
    let bottom = ClassBuilder::new("Bottom")
        .inherit("Left")
        .inherit("Right")
        .public("b", None)
        .variable("internal", Protection::Protected, Some(Value::from("i")))
        .build(&mut interp)
        .unwrap();
    let obj = interp.create_object(bottom, "b", &[]).unwrap();

    let listing = interp.invoke(obj, "configure", &[]).unwrap();
    let names: Vec<String> = listing
        .as_list()
        .unwrap()
        .iter()
        .map(|triple| triple.as_list().unwrap()[0].to_string())
        .collect();
    assert_eq!(names, vec!["-b", "-x", "-r", "-Right::x"]);

    assert_eq!(
        listing.to_string(),
        "{-b <undefined> <undefined>} {-x left left} {-r root root} {-Right::x right right}"
    );
}

#[test]
fn test_failed_hook_restores_value_and_keeps_earlier_pairs() {
    let mut interp = Interp::new();
    let id = ClassBuilder::new("Gauge")
        .public("label", Some(Value::from("none")))
        .public_with_config("level", Some(Value::from("0")), |interp| {
            let level = interp.get_var("level")?;
            match level.to_string().parse::<i64>() {
                Ok(_) => Ok(()),
                Err(_) => Err(DispatchError::script(format!("expected integer but got \"{}\"", level))),
            }
        })
        .public("units", Some(Value::from("mm")))
        .build(&mut interp)
        .unwrap();
    let obj = interp.create_object(id, "g", &[]).unwrap();

    let err = interp
        .invoke(obj, "configure", &args(&["-label", "fuel", "-level", "high", "-units", "in"]))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "expected integer but got \"high\"\n    (error in configuration of public variable \"::Gauge::level\")"
    );
    assert!(err.is_side_effect_error());

    let cget = |interp: &mut Interp, option: &str| {
        interp.invoke(obj, "cget", &args(&[option])).unwrap().to_string()
    };
    assert_eq!(cget(&mut interp, "-label"), "fuel");
    assert_eq!(cget(&mut interp, "-level"), "0");
    assert_eq!(cget(&mut interp, "-units"), "mm");
}

#[test]
fn test_unknown_option_aborts_remaining_pairs() {
    let mut interp = Interp::new();
    let w = color_widget(&mut interp);
    let err = interp
        .invoke(w, "configure", &args(&["-color", "blue", "-size", "3"]))
        .unwrap_err();
    assert_eq!(err.to_string(), "unknown option \"-size\"");
    assert_eq!(interp.invoke(w, "cget", &args(&["-color"])).unwrap(), Value::from("blue"));
}

#[test]
fn test_custom_undefined_marker() {
    let options = EngineOptions::from_toml_str("undefined_marker = \"<unset>\"").unwrap();
    let mut interp = Interp::with_options(options);
    let id = ClassBuilder::new("Blank")
        .public("value", None)
        .build(&mut interp)
        .unwrap();
    let obj = interp.create_object(id, "b", &[]).unwrap();
    assert_eq!(interp.invoke(obj, "cget", &args(&["-value"])).unwrap(), Value::from("<unset>"));
}

struct RecordingDelegate {
    calls: Rc<RefCell<Vec<String>>>,
}

impl WidgetDelegate for RecordingDelegate {
    fn configure(
        &self,
        interp: &mut Interp,
        class: ClassId,
        object: ObjectId,
        args: &[Value],
    ) -> DispatchResult<Value> {
        let class = interp.class(class)?;
        let object = interp.object(object)?;
        self.calls.borrow_mut().push(format!(
            "{} {} {}",
            class.full_name,
            object.name,
            Value::list(args.iter().cloned())
        ));
        Ok(Value::from("delegated"))
    }
}

#[test]
fn test_widget_forwards_to_delegate() {
    let mut interp = Interp::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    interp.set_widget_delegate(RecordingDelegate {
        calls: Rc::clone(&calls),
    });

    let button = ClassBuilder::new("Button")
        .kind(ClassKind::Widget)
        .public("text", Some(Value::from("ok")))
        .build(&mut interp)
        .unwrap();
    let plain = ClassBuilder::new("Plain")
        .public("text", Some(Value::from("plain")))
        .build(&mut interp)
        .unwrap();
    let b = interp.create_object(button, ".b", &[]).unwrap();
    let p = interp.create_object(plain, "p", &[]).unwrap();

    assert_eq!(
        interp.invoke(b, "configure", &args(&["-text", "go"])).unwrap(),
        Value::from("delegated")
    );
    assert_eq!(interp.invoke(b, "cget", &args(&["-text"])).unwrap(), Value::from("delegated"));
    assert_eq!(interp.invoke(p, "cget", &args(&["-text"])).unwrap(), Value::from("plain"));

    assert_eq!(
        *calls.borrow(),
        vec!["::Button .b configure -text go", "::Button .b cget -text"]
    );
}

#[test]
fn test_widget_cget_arity_checked_before_delegate() {
    let mut interp = Interp::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    interp.set_widget_delegate(RecordingDelegate {
        calls: Rc::clone(&calls),
    });
    let button = ClassBuilder::new("Button")
        .kind(ClassKind::Widget)
        .public("text", Some(Value::from("ok")))
        .build(&mut interp)
        .unwrap();
    let b = interp.create_object(button, ".b", &[]).unwrap();

    for bad in [args(&[]), args(&["-text", "extra"])] {
        let err = interp.invoke(b, "cget", &bad).unwrap_err();
        assert!(err.is_usage_error());
        assert_eq!(err.to_string(), "improper usage: should be \"object cget -option\"");
    }
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_widget_without_delegate_uses_builtin_logic() {
    let mut interp = Interp::new();
    let button = ClassBuilder::new("Button")
        .kind(ClassKind::Widget)
        .public("text", Some(Value::from("ok")))
        .build(&mut interp)
        .unwrap();
    let b = interp.create_object(button, ".b", &[]).unwrap();
    assert_eq!(interp.invoke(b, "cget", &args(&["-text"])).unwrap(), Value::from("ok"));

    // hull and options storage are protected, so they are not options
    let listing = interp.invoke(b, "configure", &[]).unwrap();
    assert_eq!(listing.to_string(), "{-text ok ok}");
}
