//! Composite classes
//!
//! Widget and widget-adaptor classes get two extra members when they are
//! built: the `hull` component, a named slot bound to the delegate object
//! that owns the real widget, and the protected options-storage variable.
//! Their `cget`/`configure` calls go to the installed [`WidgetDelegate`]
//! instead of the public-variable projection.

use std::rc::Rc;

use tracing::debug;

use crate::class::{Class, ClassFlags, ClassId, ClassKind, Component, Protection, Variable};
use crate::error::{DispatchError, DispatchResult};
use crate::interp::Interp;
use crate::object::ObjectId;
use crate::value::Value;

/// Handles `cget`/`configure` for composite classes
pub trait WidgetDelegate {
    /// Handle a forwarded call; `args` starts with the method name
    fn configure(
        &self,
        interp: &mut Interp,
        class: ClassId,
        object: ObjectId,
        args: &[Value],
    ) -> DispatchResult<Value>;
}

/// Final flag set for a class of `kind`
///
/// Widgets get a frame hull unless a frame or toplevel was requested. Only
/// widgets carry hull flags.
pub fn hull_flags(kind: ClassKind, flags: ClassFlags) -> ClassFlags {
    let hull = ClassFlags::WIDGET_FRAME | ClassFlags::WIDGET_TOPLEVEL;
    match kind {
        ClassKind::Widget if !flags.intersects(hull) => flags | ClassFlags::WIDGET_FRAME,
        ClassKind::Widget => flags,
        _ => flags - hull,
    }
}

/// Add component `name` backed by a protected variable of the same name
///
/// Returns `false` and changes nothing if the class already has the
/// component. A user-defined variable of that name is reused as the backing
/// variable.
pub fn install_component(class: &mut Class, name: &str) -> DispatchResult<bool> {
    if class.component(name).is_some() {
        return Ok(false);
    }
    let existing = class.variable(name).map(|var| var.full_name.clone());
    let variable = match existing {
        Some(existing) => existing,
        None => {
            let full_name = class.member_full_name(name);
            class.add_variable(Variable {
                class_id: class.id,
                name: name.to_string(),
                full_name: full_name.clone(),
                protection: Protection::Protected,
                init: None,
                config: None,
            })?;
            full_name
        }
    };
    class.add_component(Component {
        class_id: class.id,
        name: name.to_string(),
        variable,
    })?;
    debug!(target: "strata::widget", class = %class.full_name, component = name, "component installed");
    Ok(true)
}

/// Add the protected options-storage variable
///
/// Returns `false` if the class already defines a variable of that name.
pub fn install_options_storage(class: &mut Class, name: &str) -> DispatchResult<bool> {
    if class.variable(name).is_some() {
        return Ok(false);
    }
    let full_name = class.member_full_name(name);
    class.add_variable(Variable {
        class_id: class.id,
        name: name.to_string(),
        full_name,
        protection: Protection::Protected,
        init: None,
        config: None,
    })?;
    debug!(target: "strata::widget", class = %class.full_name, variable = name, "options storage installed");
    Ok(true)
}

impl Interp {
    fn find_component(&self, obj: ObjectId, name: &str) -> DispatchResult<Rc<Component>> {
        let class = self.object_class(obj)?;
        for class_id in class.heritage() {
            if let Some(component) = self.class(*class_id)?.component(name) {
                return Ok(Rc::clone(component));
            }
        }
        Err(DispatchError::UnknownComponent(name.to_string()))
    }

    /// Bind component `name` of `obj` to the delegate object `target`
    pub fn bind_component(&mut self, obj: ObjectId, name: &str, target: ObjectId) -> DispatchResult<()> {
        let component = self.find_component(obj, name)?;
        let target_name = self.object(target)?.name.clone();
        self.object_mut(obj)?
            .set_var(&component.variable, Value::from(target_name));
        debug!(target: "strata::widget", object = %obj, component = name, "component bound");
        Ok(())
    }

    /// Object bound to component `name` of `obj`, if bound and still alive
    pub fn component(&self, obj: ObjectId, name: &str) -> DispatchResult<Option<ObjectId>> {
        let component = self.find_component(obj, name)?;
        Ok(self
            .object(obj)?
            .var(&component.variable)
            .and_then(|bound| self.find_object(&bound.to_string())))
    }
}
