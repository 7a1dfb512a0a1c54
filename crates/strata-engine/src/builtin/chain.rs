//! `chain`: call the next more general implementation of the running member
//!
//! The search path is the heritage of the object's class (or of the frame
//! class for class-level calls), starting just after the class whose member
//! is running. The first class on that path that defines a member of the
//! same simple name is the target. Finding none is not an error: `chain`
//! in a root class does nothing, and neither does `chain` inside a config
//! hook or an evaluation frame.

use std::rc::Rc;

use tracing::debug;

use crate::class::{simple_name, HierIter, MemberFunc, CONSTRUCTOR, CONSTRUCTOR_INIT};
use crate::error::{DispatchError, DispatchResult};
use crate::interp::{FrameKind, Interp};
use crate::value::Value;

impl Interp {
    /// Invoke the next more general implementation of the running member
    pub fn chain(&mut self, args: &[Value]) -> DispatchResult<Value> {
        chain(self, args)
    }
}

/// Find the implementation `chain` would call from the current frame
pub fn chain_target(interp: &Interp) -> DispatchResult<Option<Rc<MemberFunc>>> {
    let frame = interp.current_frame().ok_or_else(|| {
        DispatchError::Context("cannot chain functions outside of a class context".to_string())
    })?;
    if matches!(frame.kind, FrameKind::ConfigHook | FrameKind::Eval) {
        return Ok(None);
    }
    let Some(member) = frame.member.as_deref() else {
        return Ok(None);
    };
    let name = match simple_name(member) {
        CONSTRUCTOR_INIT => CONSTRUCTOR,
        name => name,
    };

    let owner = match frame.object {
        Some(obj) => interp.object_class(obj)?,
        None => interp.class(frame.class_id)?,
    };
    let mut iter = HierIter::new(owner.heritage());
    if !iter.skip_past(frame.class_id) {
        return Ok(None);
    }
    for class_id in iter {
        let class = interp.class(class_id)?;
        if let Some(func) = class.function(name) {
            return Ok(Some(Rc::clone(func)));
        }
    }
    Ok(None)
}

/// `chain ?arg arg ...?`
pub fn chain(interp: &mut Interp, args: &[Value]) -> DispatchResult<Value> {
    let Some(target) = chain_target(interp)? else {
        debug!(target: "strata::chain", "no more general implementation; chain is a no-op");
        return Ok(Value::empty());
    };
    let (_, object) = interp.get_context()?;
    debug!(target: "strata::chain", target = %target.full_name, "chaining");

    if target.is_constructor() {
        let Some(obj) = interp.constructing_object().or(object) else {
            return Err(DispatchError::Context(format!(
                "cannot chain to \"{}\" without an object context",
                target.full_name
            )));
        };
        return interp.run_constructor(&target, obj, args);
    }

    if target.is_destructor() {
        if let Some(obj) = object {
            if !interp.object_mut(obj)?.mark_destructed(target.class_id) {
                return Ok(Value::empty());
            }
        }
    }

    let object = if target.is_common() { None } else { object };
    interp.call_member(&target, object, &target.full_name, args)
}
