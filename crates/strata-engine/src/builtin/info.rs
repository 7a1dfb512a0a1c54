//! `info` and `isa`

use std::rc::Rc;

use crate::class::{Class, MemberFunc};
use crate::error::{DispatchError, DispatchResult};
use crate::interp::Interp;
use crate::object::ObjectId;
use crate::value::Value;

const ISA_USAGE: &str = "improper usage: should be \"object isa className\"";
const ISA_ARGS: &str = "wrong # args: should be \"object isa className\"";
const INFO_SUBCOMMANDS: &str = "class, component, function, heritage, inherit, or variable";

/// `isa className`
pub fn isa(interp: &mut Interp, args: &[Value]) -> DispatchResult<Value> {
    let (_, object) = interp.get_context()?;
    let obj = object.ok_or_else(|| DispatchError::Usage(ISA_USAGE.to_string()))?;
    let [class_name] = args else {
        return Err(DispatchError::Usage(ISA_ARGS.to_string()));
    };
    let target = interp.resolve_class(&class_name.to_string(), true)?;
    Ok(Value::from(interp.object_isa(obj, target)?))
}

/// `info option ?arg arg ...?`
pub fn info(interp: &mut Interp, args: &[Value]) -> DispatchResult<Value> {
    let (class_id, object) = interp.get_context()?;
    let class = match object {
        Some(obj) => interp.object_class(obj)?,
        None => interp.class(class_id)?,
    };
    let Some((subcommand, rest)) = args.split_first() else {
        return Err(DispatchError::Usage(
            "wrong # args: should be \"object info option ?arg arg ...?\"".to_string(),
        ));
    };

    match (subcommand.to_string().as_str(), rest) {
        ("class", []) => Ok(Value::from(class.full_name.as_str())),
        ("heritage", []) => full_names(interp, class.heritage()),
        ("inherit", []) => full_names(interp, &class.supers),
        ("function", []) => {
            let mut names = Vec::new();
            for owner in ancestors(interp, &class)? {
                names.extend(owner.functions().map(|f| Value::from(f.full_name.as_str())));
            }
            Ok(Value::List(names))
        }
        ("function", [name]) => {
            let name = name.to_string();
            let func = class
                .resolve_cmd(&name)
                .cloned()
                .or_else(|| find_special(interp, &class, &name))
                .ok_or_else(|| DispatchError::NoSuchMember {
                    name: name.clone(),
                    class: class.full_name.clone(),
                })?;
            Ok(describe_function(&func))
        }
        ("variable", []) => {
            let mut names = Vec::new();
            for owner in ancestors(interp, &class)? {
                names.extend(owner.variables().map(|v| Value::from(v.full_name.as_str())));
            }
            Ok(Value::List(names))
        }
        ("variable", [name]) => describe_variable(interp, &class, object, &name.to_string()),
        ("component", []) => {
            let mut names = Vec::new();
            for owner in ancestors(interp, &class)? {
                names.extend(owner.components().map(|c| Value::from(c.name.as_str())));
            }
            Ok(Value::List(names))
        }
        ("class" | "heritage" | "inherit" | "component", _) | ("function" | "variable", _) => {
            Err(DispatchError::Usage(format!(
                "wrong # args: should be \"object info {} ?name?\"",
                subcommand
            )))
        }
        (other, _) => Err(DispatchError::Usage(format!(
            "bad option \"{}\": must be {}",
            other, INFO_SUBCOMMANDS
        ))),
    }
}

fn ancestors(interp: &Interp, class: &Class) -> DispatchResult<Vec<Rc<Class>>> {
    class.heritage().iter().map(|id| interp.class(*id)).collect()
}

fn full_names(interp: &Interp, ids: &[crate::class::ClassId]) -> DispatchResult<Value> {
    let mut names = Vec::with_capacity(ids.len());
    for id in ids {
        names.push(Value::from(interp.class(*id)?.full_name.as_str()));
    }
    Ok(Value::List(names))
}

/// Constructors and destructors are not in the virtual table
fn find_special(interp: &Interp, class: &Class, name: &str) -> Option<Rc<MemberFunc>> {
    class
        .heritage()
        .iter()
        .filter_map(|id| interp.class(*id).ok())
        .find_map(|owner| owner.function(name).cloned())
}

fn describe_function(func: &MemberFunc) -> Value {
    let kind = if func.is_builtin() {
        "builtin"
    } else if func.is_constructor() {
        "constructor"
    } else if func.is_destructor() {
        "destructor"
    } else if func.is_common() {
        "proc"
    } else {
        "method"
    };
    Value::list([
        Value::from(func.protection.to_string()),
        Value::from(kind),
        Value::from(func.full_name.as_str()),
        Value::from(func.usage.clone().unwrap_or_default()),
    ])
}

fn describe_variable(
    interp: &Interp,
    class: &Class,
    object: Option<ObjectId>,
    name: &str,
) -> DispatchResult<Value> {
    let lookup = class
        .resolve_var(name)
        .ok_or_else(|| DispatchError::NoSuchMember {
            name: name.to_string(),
            class: class.full_name.clone(),
        })?;
    let marker = || Value::from(interp.options().undefined_marker.as_str());
    let var = &lookup.variable;
    let current = match object {
        Some(obj) => interp.object(obj)?.var(&var.full_name).cloned().unwrap_or_else(marker),
        None => marker(),
    };
    Ok(Value::list([
        Value::from(var.protection.to_string()),
        Value::from(var.full_name.as_str()),
        var.init.clone().unwrap_or_else(marker),
        current,
    ]))
}
