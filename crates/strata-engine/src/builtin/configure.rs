//! `cget` and `configure`
//!
//! Public variables are projected as options named by their least-qualified
//! unambiguous name in the object's most-derived class. Option lookup always
//! uses that class's resolution table, even when the builtin itself was
//! inherited from a base class.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::class::{Class, VarLookup};
use crate::error::{DispatchError, DispatchResult};
use crate::interp::{CallFrame, FrameKind, Interp};
use crate::object::ObjectId;
use crate::value::Value;

const CGET_USAGE: &str = "improper usage: should be \"object cget -option\"";
const CONFIGURE_USAGE: &str =
    "improper usage: should be \"object configure ?-option? ?value -option value...?\"";

/// Object and virtual scope of a `cget`/`configure` call
fn option_scope(interp: &Interp, usage: &str) -> DispatchResult<(ObjectId, Rc<Class>)> {
    let (_, object) = interp.get_context()?;
    let obj = object.ok_or_else(|| DispatchError::Usage(usage.to_string()))?;
    let class = interp.object_class(obj)?;
    Ok((obj, class))
}

/// Forward to the composite delegate when the object's class is not a plain
/// class and a delegate is installed
fn delegate(
    interp: &mut Interp,
    class: &Class,
    obj: ObjectId,
    method: &str,
    args: &[Value],
) -> Option<DispatchResult<Value>> {
    if class.is_plain_class() {
        return None;
    }
    let delegate = interp.widget_delegate()?;
    let mut forwarded = Vec::with_capacity(args.len() + 1);
    forwarded.push(Value::from(method));
    forwarded.extend_from_slice(args);
    debug!(
        target: "strata::widget",
        class = %class.full_name,
        method,
        "forwarding to widget delegate"
    );
    Some(delegate.configure(interp, class.id, obj, &forwarded))
}

/// Resolve `-name` to a public variable of `class`
fn lookup_option<'c>(class: &'c Class, token: &str) -> DispatchResult<&'c Rc<VarLookup>> {
    token
        .strip_prefix('-')
        .and_then(|name| class.resolve_var(name))
        .filter(|lookup| lookup.variable.is_public())
        .ok_or_else(|| DispatchError::UnknownOption(token.to_string()))
}

fn current_or_marker(interp: &Interp, obj: ObjectId, full_name: &str) -> DispatchResult<Value> {
    Ok(interp
        .object(obj)?
        .var(full_name)
        .cloned()
        .unwrap_or_else(|| Value::from(interp.options().undefined_marker.as_str())))
}

/// `{-name default current}` for one public variable
pub fn report_public_option(
    interp: &Interp,
    obj: ObjectId,
    lookup: &VarLookup,
) -> DispatchResult<Value> {
    let var = &lookup.variable;
    let default = var
        .init
        .clone()
        .unwrap_or_else(|| Value::from(interp.options().undefined_marker.as_str()));
    let current = current_or_marker(interp, obj, &var.full_name)?;
    Ok(Value::list([
        Value::from(format!("-{}", lookup.least_qual_name)),
        default,
        current,
    ]))
}

/// `cget -option`
pub fn cget(interp: &mut Interp, args: &[Value]) -> DispatchResult<Value> {
    let (obj, class) = option_scope(interp, CGET_USAGE)?;
    let [token] = args else {
        return Err(DispatchError::Usage(CGET_USAGE.to_string()));
    };
    if let Some(result) = delegate(interp, &class, obj, "cget", args) {
        return result;
    }
    let lookup = lookup_option(&class, &token.to_string())?;
    current_or_marker(interp, obj, &lookup.variable.full_name)
}

/// `configure ?-option? ?value -option value...?`
pub fn configure(interp: &mut Interp, args: &[Value]) -> DispatchResult<Value> {
    let (obj, class) = option_scope(interp, CONFIGURE_USAGE)?;
    if let Some(result) = delegate(interp, &class, obj, "configure", args) {
        return result;
    }

    match args {
        [] => list_options(interp, &class, obj),
        [token] => {
            let token = token.to_string();
            if !token.starts_with('-') {
                return Err(DispatchError::Usage(CONFIGURE_USAGE.to_string()));
            }
            let lookup = lookup_option(&class, &token)?;
            report_public_option(interp, obj, lookup)
        }
        _ => {
            for pair in args.chunks(2) {
                let token = pair[0].to_string();
                let lookup = lookup_option(&class, &token)?;
                let Some(value) = pair.get(1) else {
                    return Err(DispatchError::Usage(format!(
                        "value for \"{}\" missing",
                        token
                    )));
                };
                assign_option(interp, obj, lookup, value.clone())?;
            }
            Ok(Value::empty())
        }
    }
}

/// Every public option visible from `class`, in heritage order
fn list_options(interp: &Interp, class: &Class, obj: ObjectId) -> DispatchResult<Value> {
    let mut report = Vec::new();
    for class_id in class.heritage() {
        let owner = interp.class(*class_id)?;
        for var in owner.variables().filter(|var| var.is_public()) {
            if let Some(lookup) = class.resolve_var(&var.full_name) {
                report.push(report_public_option(interp, obj, lookup)?);
            }
        }
    }
    Ok(Value::List(report))
}

/// Assign one option and run its config hook, restoring the prior value
/// if the hook fails
fn assign_option(
    interp: &mut Interp,
    obj: ObjectId,
    lookup: &VarLookup,
    value: Value,
) -> DispatchResult<()> {
    let var = Rc::clone(&lookup.variable);
    let previous = interp.object_mut(obj)?.set_var(&var.full_name, value);
    debug!(
        target: "strata::configure",
        variable = %var.full_name,
        object = %obj,
        "option assigned"
    );

    let Some(hook) = var.config.clone() else {
        return Ok(());
    };
    let frame = CallFrame::new(var.class_id, Some(obj), None, FrameKind::ConfigHook);
    let Err(err) = interp.run_frame(frame, |interp| hook(interp)) else {
        return Ok(());
    };

    warn!(
        target: "strata::configure",
        variable = %var.full_name,
        error = %err,
        "config hook failed; restoring previous value"
    );
    if let Ok(object) = interp.object_mut(obj) {
        match previous {
            Some(previous) => {
                object.set_var(&var.full_name, previous);
            }
            None => {
                object.unset_var(&var.full_name);
            }
        }
    }
    Err(DispatchError::Config {
        variable: var.full_name.clone(),
        source: Box::new(err),
    })
}
