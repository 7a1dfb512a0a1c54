//! Class construction
//!
//! [`ClassBuilder`] stands in for the declarative class-definition parser:
//! it collects members, then [`build`](ClassBuilder::build) runs the build
//! phase in a fixed order:
//!
//! 1. resolve superclasses and compute the heritage
//! 2. add the user-defined functions and variables
//! 3. install the builtin methods not already defined in the heritage
//! 4. for composite kinds, install the hull component and options storage
//! 5. build the variable and function resolution tables
//! 6. register the class

use std::rc::Rc;

use tracing::debug;

use super::{
    linearize, Class, ClassFlags, ClassId, ClassKind, FunctionFlags, MemberBody, MemberFunc,
    MethodFn, Protection, Variable, CONSTRUCTOR, DESTRUCTOR,
};
use crate::builtin;
use crate::error::{DispatchError, DispatchResult};
use crate::interp::Interp;
use crate::value::Value;
use crate::widget;

struct PendingFunc {
    name: String,
    protection: Protection,
    flags: FunctionFlags,
    body: MethodFn,
    initializer: Option<MethodFn>,
}

struct PendingVar {
    name: String,
    protection: Protection,
    init: Option<Value>,
    config: Option<super::ConfigHook>,
}

/// Collects a class definition and builds it into an [`Interp`]
pub struct ClassBuilder {
    name: String,
    kind: ClassKind,
    extra_flags: ClassFlags,
    supers: Vec<String>,
    functions: Vec<PendingFunc>,
    variables: Vec<PendingVar>,
}

impl ClassBuilder {
    /// Start a plain class definition
    ///
    /// `name` may be qualified (`ui::Button`); it is anchored at the global
    /// namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            extra_flags: ClassFlags::empty(),
            supers: Vec::new(),
            functions: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// Set the kind of class-defining command
    pub fn kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }

    /// Request a toplevel hull instead of the default frame (widgets only)
    pub fn toplevel(mut self) -> Self {
        self.extra_flags |= ClassFlags::WIDGET_TOPLEVEL;
        self
    }

    /// Add a direct superclass; order of calls is declaration order
    pub fn inherit(mut self, class: impl Into<String>) -> Self {
        self.supers.push(class.into());
        self
    }

    /// Add a public method
    pub fn method<F>(self, name: &str, body: F) -> Self
    where
        F: Fn(&mut Interp, &[Value]) -> DispatchResult<Value> + 'static,
    {
        self.method_with(name, Protection::Public, body)
    }

    /// Add a method with the given protection
    pub fn method_with<F>(mut self, name: &str, protection: Protection, body: F) -> Self
    where
        F: Fn(&mut Interp, &[Value]) -> DispatchResult<Value> + 'static,
    {
        self.functions.push(PendingFunc {
            name: name.to_string(),
            protection,
            flags: FunctionFlags::empty(),
            body: Rc::new(body),
            initializer: None,
        });
        self
    }

    /// Add a public class-level procedure
    pub fn proc<F>(mut self, name: &str, body: F) -> Self
    where
        F: Fn(&mut Interp, &[Value]) -> DispatchResult<Value> + 'static,
    {
        self.functions.push(PendingFunc {
            name: name.to_string(),
            protection: Protection::Public,
            flags: FunctionFlags::COMMON,
            body: Rc::new(body),
            initializer: None,
        });
        self
    }

    /// Add a constructor
    pub fn constructor<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut Interp, &[Value]) -> DispatchResult<Value> + 'static,
    {
        self.functions.push(PendingFunc {
            name: CONSTRUCTOR.to_string(),
            protection: Protection::Public,
            flags: FunctionFlags::CONSTRUCTOR,
            body: Rc::new(body),
            initializer: None,
        });
        self
    }

    /// Add a constructor with an initializer that runs before base classes
    /// are constructed
    pub fn constructor_with_init<I, F>(mut self, init: I, body: F) -> Self
    where
        I: Fn(&mut Interp, &[Value]) -> DispatchResult<Value> + 'static,
        F: Fn(&mut Interp, &[Value]) -> DispatchResult<Value> + 'static,
    {
        self.functions.push(PendingFunc {
            name: CONSTRUCTOR.to_string(),
            protection: Protection::Public,
            flags: FunctionFlags::CONSTRUCTOR,
            body: Rc::new(body),
            initializer: Some(Rc::new(init)),
        });
        self
    }

    /// Add a destructor
    pub fn destructor<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut Interp, &[Value]) -> DispatchResult<Value> + 'static,
    {
        self.functions.push(PendingFunc {
            name: DESTRUCTOR.to_string(),
            protection: Protection::Public,
            flags: FunctionFlags::DESTRUCTOR,
            body: Rc::new(body),
            initializer: None,
        });
        self
    }

    /// Add a variable
    pub fn variable(mut self, name: &str, protection: Protection, init: Option<Value>) -> Self {
        self.variables.push(PendingVar {
            name: name.to_string(),
            protection,
            init,
            config: None,
        });
        self
    }

    /// Add a public variable (a configuration option)
    pub fn public(self, name: &str, init: Option<Value>) -> Self {
        self.variable(name, Protection::Public, init)
    }

    /// Add a public variable with config code run after each `configure`
    pub fn public_with_config<F>(mut self, name: &str, init: Option<Value>, config: F) -> Self
    where
        F: Fn(&mut Interp) -> DispatchResult<()> + 'static,
    {
        self.variables.push(PendingVar {
            name: name.to_string(),
            protection: Protection::Public,
            init,
            config: Some(Rc::new(config)),
        });
        self
    }

    /// Build the class and register it
    pub fn build(self, interp: &mut Interp) -> DispatchResult<ClassId> {
        let full_name = if self.name.starts_with("::") {
            self.name.clone()
        } else {
            format!("::{}", self.name)
        };
        let registry = interp.classes();
        if registry.get_by_full_name(&full_name).is_some() {
            return Err(DispatchError::Creation(format!(
                "class \"{}\" already exists",
                full_name
            )));
        }

        let mut supers: Vec<ClassId> = Vec::with_capacity(self.supers.len());
        for super_name in &self.supers {
            let super_id = registry
                .lookup(super_name)
                .ok_or_else(|| DispatchError::UnknownClass(super_name.clone()))?;
            if supers.contains(&super_id) {
                return Err(DispatchError::Creation(format!(
                    "class \"{}\" inherits base class \"{}\" more than once",
                    full_name, super_name
                )));
            }
            supers.push(super_id);
        }

        let id = registry.next_class_id();
        let flags = widget::hull_flags(self.kind, self.kind.flags() | self.extra_flags);
        let heritage = linearize(id, &supers, registry);
        let mut class = Class::new(id, full_name, supers, flags, heritage);

        for func in self.functions {
            if func.name.contains("::") {
                return Err(DispatchError::Creation(format!(
                    "bad member name \"{}\"",
                    func.name
                )));
            }
            let full_name = class.member_full_name(&func.name);
            class.add_function(MemberFunc {
                class_id: id,
                name: func.name,
                full_name,
                protection: func.protection,
                flags: func.flags,
                usage: None,
                registration: None,
                body: MemberBody::User(func.body),
                initializer: func.initializer,
            })?;
        }

        for var in self.variables {
            if var.name.contains("::") {
                return Err(DispatchError::Creation(format!(
                    "bad variable name \"{}\"",
                    var.name
                )));
            }
            let full_name = class.member_full_name(&var.name);
            class.add_variable(Variable {
                class_id: id,
                name: var.name,
                full_name,
                protection: var.protection,
                init: var.init,
                config: var.config,
            })?;
        }

        let options = interp.options();
        builtin::install_builtins(&mut class, registry, options)?;
        if self.kind.is_composite() {
            widget::install_component(&mut class, &options.hull_component)?;
            widget::install_options_storage(&mut class, &options.options_variable)?;
        }
        class.build_virtual_tables(registry);

        debug!(
            target: "strata::class",
            class = %class.full_name,
            heritage = class.heritage().len(),
            "class built"
        );
        Ok(interp.register_class(class))
    }
}
