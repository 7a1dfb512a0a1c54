//! Interpreter surface
//!
//! [`Interp`] owns everything the dispatch layer reads and writes: the class
//! registry, the live objects with their variable storage, and the explicit
//! call stack. Member bodies receive `&mut Interp` and reach the dispatch
//! layer through it (`invoke`, `chain`, `get_var`, ...).
//!
//! Member bodies run with no outstanding borrow of interpreter state: the
//! body `Rc` is cloned out of the class before the frame is pushed, so a body
//! may freely define classes, create objects or re-enter `configure`.

pub mod frame;

pub use frame::{CallFrame, CallStack, FrameKind};

use std::rc::Rc;

use tracing::debug;

use crate::builtin;
use crate::class::{
    Class, ClassId, ClassRegistry, HierIter, MemberBody, MemberFunc, Protection, Variable,
    CONSTRUCTOR, CONSTRUCTOR_INIT, DESTRUCTOR,
};
use crate::error::{DispatchError, DispatchResult};
use crate::object::{Object, ObjectId, ObjectTable};
use crate::options::EngineOptions;
use crate::value::Value;
use crate::widget::WidgetDelegate;

/// Defines classes on demand
///
/// Consulted by `isa` when a class name does not resolve. Returning
/// `Ok(false)` means nothing was loaded; the lookup is retried either way.
pub trait ClassLoader {
    /// Try to define the class `name`
    fn autoload(&self, interp: &mut Interp, name: &str) -> DispatchResult<bool>;
}

/// Interpreter state shared by every member call
pub struct Interp {
    classes: ClassRegistry,
    objects: ObjectTable,
    stack: CallStack,
    options: EngineOptions,
    loader: Option<Rc<dyn ClassLoader>>,
    widget_delegate: Option<Rc<dyn WidgetDelegate>>,
    /// Objects whose construction is in progress, innermost last
    constructing: Vec<ObjectId>,
}

impl Interp {
    /// Create an interpreter with default options
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Create an interpreter with the given options
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            classes: ClassRegistry::new(),
            objects: ObjectTable::new(),
            stack: CallStack::new(options.max_call_depth),
            options,
            loader: None,
            widget_delegate: None,
            constructing: Vec::new(),
        }
    }

    /// Engine options
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Class registry
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub(crate) fn register_class(&mut self, class: Class) -> ClassId {
        self.classes.register_class(class)
    }

    /// Get a class by ID
    pub fn class(&self, id: ClassId) -> DispatchResult<Rc<Class>> {
        self.classes
            .get(id)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownClass(id.to_string()))
    }

    /// Find a class by full, relative or unambiguous simple name
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.classes.lookup(name)
    }

    /// Find a class, asking the class loader once if it is not defined
    pub fn resolve_class(&mut self, name: &str, autoload: bool) -> DispatchResult<ClassId> {
        if let Some(id) = self.find_class(name) {
            return Ok(id);
        }
        if autoload && self.options.autoload {
            if let Some(loader) = self.loader.clone() {
                let loaded = loader.autoload(self, name)?;
                debug!(target: "strata::class", class = name, loaded, "autoload attempted");
                if let Some(id) = self.find_class(name) {
                    return Ok(id);
                }
            }
        }
        Err(DispatchError::UnknownClass(name.to_string()))
    }

    /// Install the autoload collaborator
    pub fn set_class_loader(&mut self, loader: impl ClassLoader + 'static) {
        self.loader = Some(Rc::new(loader));
    }

    /// Install the composite configuration delegate
    pub fn set_widget_delegate(&mut self, delegate: impl WidgetDelegate + 'static) {
        self.widget_delegate = Some(Rc::new(delegate));
    }

    /// Composite configuration delegate, if installed
    pub fn widget_delegate(&self) -> Option<Rc<dyn WidgetDelegate>> {
        self.widget_delegate.clone()
    }

    /// Get an object by ID
    pub fn object(&self, id: ObjectId) -> DispatchResult<&Object> {
        self.objects
            .get(id)
            .ok_or_else(|| DispatchError::NoSuchObject(id.to_string()))
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> DispatchResult<&mut Object> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| DispatchError::NoSuchObject(id.to_string()))
    }

    /// Find an object by access name
    pub fn find_object(&self, name: &str) -> Option<ObjectId> {
        self.objects.find(name)
    }

    /// Number of live objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Most-derived class of an object
    pub fn object_class(&self, id: ObjectId) -> DispatchResult<Rc<Class>> {
        let class_id = self.object(id)?.class_id;
        self.class(class_id)
    }

    /// Check if `class` is in the heritage of the object's class
    pub fn object_isa(&self, id: ObjectId, class: ClassId) -> DispatchResult<bool> {
        Ok(self.object_class(id)?.heritage().contains(&class))
    }

    /// Innermost call frame
    pub fn current_frame(&self) -> Option<&CallFrame> {
        self.stack.current()
    }

    /// Number of active member calls
    pub fn call_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Class scope and object of the innermost call
    pub fn get_context(&self) -> DispatchResult<(ClassId, Option<ObjectId>)> {
        self.stack
            .current()
            .map(|frame| (frame.class_id, frame.object))
            .ok_or_else(|| {
                DispatchError::Context("namespace \"::\" is not a class namespace".to_string())
            })
    }

    /// Object currently under construction, if any
    pub(crate) fn constructing_object(&self) -> Option<ObjectId> {
        self.constructing.last().copied()
    }

    // ===== Object lifecycle =====

    /// Create an object of `class` named `name`, passing `args` to the
    /// most-derived constructor
    pub fn create_object(
        &mut self,
        class_id: ClassId,
        name: &str,
        args: &[Value],
    ) -> DispatchResult<ObjectId> {
        let class = self.class(class_id)?;
        if self.objects.find(name).is_some() {
            return Err(DispatchError::ObjectExists(name.to_string()));
        }
        if !args.is_empty() && class.function(CONSTRUCTOR).is_none() {
            return Err(DispatchError::Usage(format!(
                "wrong # args: should be \"{} objName\"",
                class.name
            )));
        }

        let obj = self.objects.insert(name, class_id);
        for ancestor_id in HierIter::new(class.heritage()) {
            let ancestor = self.class(ancestor_id)?;
            let object = self.object_mut(obj)?;
            for var in ancestor.variables() {
                if let Some(init) = &var.init {
                    object.set_var(&var.full_name, init.clone());
                }
            }
        }

        self.constructing.push(obj);
        let result = self.construct_class(obj, class_id, args);
        self.constructing.pop();

        match result {
            Ok(()) => {
                debug!(target: "strata::object", object = name, class = %class.full_name, "object created");
                Ok(obj)
            }
            Err(err) => {
                self.objects.remove(obj);
                debug!(target: "strata::object", object = name, error = %err, "construction failed; object deleted");
                Err(err)
            }
        }
    }

    /// Run destructors most-derived first, then remove the object
    pub fn delete_object(&mut self, obj: ObjectId) -> DispatchResult<()> {
        let class = self.object_class(obj)?;
        for class_id in HierIter::new(class.heritage()) {
            let owner = self.class(class_id)?;
            let Some(dtor) = owner.function(DESTRUCTOR).cloned() else {
                continue;
            };
            // a destructor reached earlier through `chain` is not run again
            if !self.object_mut(obj)?.mark_destructed(class_id) {
                continue;
            }
            if let Err(err) = self.call_member(&dtor, Some(obj), DESTRUCTOR, &[]) {
                self.object_mut(obj)?.clear_destructed();
                return Err(err);
            }
        }
        if let Some(object) = self.objects.remove(obj) {
            debug!(target: "strata::object", object = %object.name, "object deleted");
        }
        Ok(())
    }

    fn construct_class(&mut self, obj: ObjectId, class_id: ClassId, args: &[Value]) -> DispatchResult<()> {
        if self.object(obj)?.is_constructed(class_id) {
            return Ok(());
        }
        let class = self.class(class_id)?;
        match class.function(CONSTRUCTOR).cloned() {
            Some(ctor) => self.run_constructor(&ctor, obj, args).map(|_| ()),
            None => {
                self.object_mut(obj)?.mark_constructed(class_id);
                for super_id in &class.supers {
                    self.construct_class(obj, *super_id, &[])?;
                }
                Ok(())
            }
        }
    }

    /// Run one class's constructor: initializer, base classes, then body
    ///
    /// Base classes already constructed for this object are skipped, so
    /// chaining to a constructor never runs it twice.
    pub(crate) fn run_constructor(
        &mut self,
        ctor: &Rc<MemberFunc>,
        obj: ObjectId,
        args: &[Value],
    ) -> DispatchResult<Value> {
        if !self.object_mut(obj)?.mark_constructed(ctor.class_id) {
            return Ok(Value::empty());
        }
        if let Some(init) = ctor.initializer.clone() {
            let frame = CallFrame::new(
                ctor.class_id,
                Some(obj),
                Some(CONSTRUCTOR_INIT.to_string()),
                FrameKind::Constructor,
            );
            self.run_frame(frame, |interp| init(interp, args))?;
        }
        let class = self.class(ctor.class_id)?;
        for super_id in &class.supers {
            self.construct_class(obj, *super_id, &[])?;
        }
        self.call_member(ctor, Some(obj), CONSTRUCTOR, args)
    }

    // ===== Invocation =====

    /// Call a member on an object through its virtual table
    ///
    /// A qualified name (`Base::greet`) reaches that class's implementation
    /// even when the object's class overrides it.
    pub fn invoke(&mut self, obj: ObjectId, method: &str, args: &[Value]) -> DispatchResult<Value> {
        let class = self.object_class(obj)?;
        let func = match class.resolve_cmd(method) {
            Some(func) => Rc::clone(func),
            None => {
                return Err(DispatchError::UnknownMethod {
                    name: method.to_string(),
                    candidates: class.public_method_names(),
                })
            }
        };
        self.check_access(&func, method, &class)?;
        let object = if func.is_common() { None } else { Some(obj) };
        self.call_member(&func, object, method, args)
    }

    /// Call a member at class level, with no object context
    pub fn invoke_proc(&mut self, class_id: ClassId, name: &str, args: &[Value]) -> DispatchResult<Value> {
        let class = self.class(class_id)?;
        let func = match class.resolve_cmd(name) {
            Some(func) => Rc::clone(func),
            None => {
                return Err(DispatchError::UnknownMethod {
                    name: name.to_string(),
                    candidates: class.public_method_names(),
                })
            }
        };
        self.check_access(&func, name, &class)?;
        if !func.is_common() && !func.is_builtin() {
            return Err(DispatchError::Context(format!(
                "cannot access object-specific info without an object context: \"{}\"",
                func.full_name
            )));
        }
        self.call_member(&func, None, name, args)
    }

    fn check_access(&self, func: &MemberFunc, invoked_as: &str, target: &Class) -> DispatchResult<()> {
        let caller = self.stack.current().map(|frame| frame.class_id);
        let allowed = match func.protection {
            Protection::Public => true,
            Protection::Protected => caller.map_or(false, |id| target.heritage().contains(&id)),
            Protection::Private => caller == Some(func.class_id),
        };
        if allowed {
            Ok(())
        } else {
            Err(DispatchError::Protection {
                name: invoked_as.to_string(),
                protection: func.protection,
            })
        }
    }

    /// Run a member body in a new frame scoped to its declaring class
    pub(crate) fn call_member(
        &mut self,
        func: &Rc<MemberFunc>,
        object: Option<ObjectId>,
        invoked_as: &str,
        args: &[Value],
    ) -> DispatchResult<Value> {
        let kind = if func.is_builtin() {
            FrameKind::Builtin
        } else if func.is_constructor() {
            FrameKind::Constructor
        } else if func.is_destructor() {
            FrameKind::Destructor
        } else if object.is_none() {
            FrameKind::Proc
        } else {
            FrameKind::Method
        };
        let frame = CallFrame::new(func.class_id, object, Some(invoked_as.to_string()), kind);
        let func = Rc::clone(func);
        self.run_frame(frame, |interp| match &func.body {
            MemberBody::User(body) => body(interp, args),
            MemberBody::Builtin(kind) => builtin::dispatch(interp, *kind, args),
        })
    }

    /// Push `frame`, run `f`, and pop the frame whatever the outcome
    pub(crate) fn run_frame<T>(
        &mut self,
        frame: CallFrame,
        f: impl FnOnce(&mut Interp) -> DispatchResult<T>,
    ) -> DispatchResult<T> {
        self.stack.push(frame)?;
        let result = f(self);
        self.stack.pop();
        result
    }

    /// Run `f` in the scope of `class`, optionally against `object`
    ///
    /// The frame has no member name, so `chain` inside it does nothing.
    pub fn eval_in<T>(
        &mut self,
        class_id: ClassId,
        object: Option<ObjectId>,
        f: impl FnOnce(&mut Interp) -> DispatchResult<T>,
    ) -> DispatchResult<T> {
        self.class(class_id)?;
        if let Some(obj) = object {
            self.object(obj)?;
        }
        self.run_frame(CallFrame::new(class_id, object, None, FrameKind::Eval), f)
    }

    // ===== Variables =====

    fn scoped_var(&self, name: &str) -> DispatchResult<(ObjectId, Rc<Variable>)> {
        let frame = self.stack.current().ok_or_else(|| {
            DispatchError::Context(format!(
                "can't access \"{}\": not in a class context",
                name
            ))
        })?;
        let class = self.class(frame.class_id)?;
        let lookup = class
            .resolve_var(name)
            .ok_or_else(|| DispatchError::NoSuchVariable(name.to_string()))?;
        if !lookup.accessible {
            return Err(DispatchError::Inaccessible(name.to_string()));
        }
        let obj = frame.object.ok_or_else(|| {
            DispatchError::Context(format!(
                "can't access \"{}\": cannot access object-specific info without an object context",
                name
            ))
        })?;
        Ok((obj, Rc::clone(&lookup.variable)))
    }

    /// Read a variable visible from the current class scope
    pub fn get_var(&self, name: &str) -> DispatchResult<Value> {
        let (obj, var) = self.scoped_var(name)?;
        self.object(obj)?
            .var(&var.full_name)
            .cloned()
            .ok_or_else(|| DispatchError::NoSuchVariable(name.to_string()))
    }

    /// Assign a variable visible from the current class scope
    pub fn set_var(&mut self, name: &str, value: impl Into<Value>) -> DispatchResult<()> {
        let (obj, var) = self.scoped_var(name)?;
        self.object_mut(obj)?.set_var(&var.full_name, value.into());
        Ok(())
    }

    /// Unset a variable visible from the current class scope
    pub fn unset_var(&mut self, name: &str) -> DispatchResult<()> {
        let (obj, var) = self.scoped_var(name)?;
        self.object_mut(obj)?
            .unset_var(&var.full_name)
            .map(|_| ())
            .ok_or_else(|| DispatchError::NoSuchVariable(name.to_string()))
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::options::DEFAULT_MAX_CALL_DEPTH;
    use std::cell::RefCell;

    #[test]
    fn test_context_outside_class() {
        let interp = Interp::new();
        assert!(interp.get_context().unwrap_err().is_context_error());
    }

    #[test]
    fn test_context_inside_method_and_proc() {
        let mut interp = Interp::new();
        let id = ClassBuilder::new("Sample")
            .method("where", |interp, _args| {
                let (class, obj) = interp.get_context()?;
                Ok(Value::list([
                    Value::from(class.as_usize() as i64),
                    Value::from(obj.is_some()),
                ]))
            })
            .proc("classwhere", |interp, _args| {
                let (_, obj) = interp.get_context()?;
                Ok(Value::from(obj.is_some()))
            })
            .build(&mut interp)
            .unwrap();
        let obj = interp.create_object(id, "p", &[]).unwrap();

        let result = interp.invoke(obj, "where", &[]).unwrap();
        assert_eq!(result.to_string(), format!("{} 1", id.as_usize()));
        assert_eq!(interp.invoke(obj, "classwhere", &[]).unwrap(), Value::from(false));
        assert_eq!(interp.invoke_proc(id, "classwhere", &[]).unwrap(), Value::from(false));
        assert_eq!(interp.call_depth(), 0);
    }

    #[test]
    fn test_object_name_collision() {
        let mut interp = Interp::new();
        let id = ClassBuilder::new("Thing").build(&mut interp).unwrap();
        interp.create_object(id, "t", &[]).unwrap();
        let err = interp.create_object(id, "t", &[]).unwrap_err();
        assert_eq!(err, DispatchError::ObjectExists("t".to_string()));
    }

    #[test]
    fn test_construction_order_and_args() {
        let log = Rc::new(RefCell::new(Vec::<String>::new()));
        let mut interp = Interp::new();

        let l = Rc::clone(&log);
        ClassBuilder::new("Base")
            .constructor(move |_i, args| {
                l.borrow_mut().push(format!("base({})", args.len()));
                Ok(Value::empty())
            })
            .build(&mut interp)
            .unwrap();
        let l1 = Rc::clone(&log);
        let l2 = Rc::clone(&log);
        let derived = ClassBuilder::new("Derived")
            .inherit("Base")
            .constructor_with_init(
                move |interp, _args| {
                    let frame = interp.current_frame().unwrap();
                    l1.borrow_mut()
                        .push(format!("init:{}", frame.member.clone().unwrap_or_default()));
                    Ok(Value::empty())
                },
                move |_i, args| {
                    l2.borrow_mut().push(format!("derived({})", args[0]));
                    Ok(Value::empty())
                },
            )
            .build(&mut interp)
            .unwrap();

        interp.create_object(derived, "d", &[Value::from("x")]).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["init:___constructor_init", "base(0)", "derived(x)"]
        );
    }

    #[test]
    fn test_failed_constructor_deletes_object() {
        let mut interp = Interp::new();
        let id = ClassBuilder::new("Fragile")
            .constructor(|_i, _a| Err(DispatchError::script("boom")))
            .build(&mut interp)
            .unwrap();
        let err = interp.create_object(id, "f", &[]).unwrap_err();
        assert_eq!(err, DispatchError::script("boom"));
        assert!(interp.find_object("f").is_none());
        assert_eq!(interp.object_count(), 0);
    }

    #[test]
    fn test_destructors_most_derived_first() {
        let log = Rc::new(RefCell::new(Vec::<&'static str>::new()));
        let mut interp = Interp::new();
        let l = Rc::clone(&log);
        ClassBuilder::new("Base")
            .destructor(move |_i, _a| {
                l.borrow_mut().push("base");
                Ok(Value::empty())
            })
            .build(&mut interp)
            .unwrap();
        let l = Rc::clone(&log);
        let derived = ClassBuilder::new("Derived")
            .inherit("Base")
            .destructor(move |_i, _a| {
                l.borrow_mut().push("derived");
                Ok(Value::empty())
            })
            .build(&mut interp)
            .unwrap();

        let obj = interp.create_object(derived, "d", &[]).unwrap();
        interp.delete_object(obj).unwrap();
        assert_eq!(*log.borrow(), vec!["derived", "base"]);
        assert!(interp.object(obj).is_err());
    }

    #[test]
    fn test_protection() {
        let mut interp = Interp::new();
        let base = ClassBuilder::new("Vault")
            .method_with("secret", Protection::Private, |_i, _a| Ok(Value::from("s")))
            .method_with("guarded", Protection::Protected, |_i, _a| Ok(Value::from("g")))
            .method("reveal", |interp, _a| {
                let (_, obj) = interp.get_context()?;
                let obj = obj.ok_or("no object")?;
                interp.invoke(obj, "secret", &[])
            })
            .build(&mut interp)
            .unwrap();
        let obj = interp.create_object(base, "v", &[]).unwrap();

        let err = interp.invoke(obj, "secret", &[]).unwrap_err();
        assert!(matches!(err, DispatchError::Protection { .. }));
        assert!(interp.invoke(obj, "guarded", &[]).is_err());
        assert_eq!(interp.invoke(obj, "reveal", &[]).unwrap(), Value::from("s"));
    }

    #[test]
    fn test_unknown_method_lists_public_names() {
        let mut interp = Interp::new();
        let id = ClassBuilder::new("Small")
            .method("go", |_i, _a| Ok(Value::empty()))
            .build(&mut interp)
            .unwrap();
        let obj = interp.create_object(id, "s", &[]).unwrap();
        match interp.invoke(obj, "fly", &[]).unwrap_err() {
            DispatchError::UnknownMethod { name, candidates } => {
                assert_eq!(name, "fly");
                assert_eq!(candidates, vec!["cget", "configure", "go", "info", "isa"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_variable_access_and_privacy() {
        let mut interp = Interp::new();
        ClassBuilder::new("Base")
            .variable("hidden", Protection::Private, Some(Value::from("h")))
            .variable("shared", Protection::Protected, Some(Value::from("s")))
            .build(&mut interp)
            .unwrap();
        let derived = ClassBuilder::new("Derived")
            .inherit("Base")
            .method("peek", |interp, args| interp.get_var(args[0].as_str().unwrap_or("")))
            .build(&mut interp)
            .unwrap();
        let obj = interp.create_object(derived, "d", &[]).unwrap();

        assert_eq!(interp.invoke(obj, "peek", &[Value::from("shared")]).unwrap(), Value::from("s"));
        assert_eq!(
            interp.invoke(obj, "peek", &[Value::from("hidden")]).unwrap_err(),
            DispatchError::Inaccessible("hidden".to_string())
        );
        assert!(interp.invoke(obj, "peek", &[Value::from("nope")]).unwrap_err().is_resolution_error());
    }

    #[test]
    fn test_call_depth_limit() {
        let mut opts = EngineOptions::default();
        opts.max_call_depth = 16;
        let mut interp = Interp::with_options(opts);
        let id = ClassBuilder::new("Loop")
            .method("spin", |interp, _a| {
                let (_, obj) = interp.get_context()?;
                interp.invoke(obj.ok_or("no object")?, "spin", &[])
            })
            .build(&mut interp)
            .unwrap();
        let obj = interp.create_object(id, "l", &[]).unwrap();
        let err = interp.invoke(obj, "spin", &[]).unwrap_err();
        assert!(err.is_usage_error());
        assert_eq!(interp.call_depth(), 0);
    }

    #[test]
    fn test_runaway_recursion_stops_at_default_depth() {
        let deepest = Rc::new(std::cell::Cell::new(0));
        let seen = Rc::clone(&deepest);
        let mut interp = Interp::new();
        let id = ClassBuilder::new("Loop")
            .method("spin", move |interp, _a| {
                seen.set(seen.get().max(interp.call_depth()));
                let (_, obj) = interp.get_context()?;
                interp.invoke(obj.ok_or("no object")?, "spin", &[])
            })
            .build(&mut interp)
            .unwrap();
        let obj = interp.create_object(id, "l", &[]).unwrap();

        let err = interp.invoke(obj, "spin", &[]).unwrap_err();
        assert!(err.is_usage_error());
        assert_eq!(err.to_string(), "too many nested evaluations (infinite loop?)");
        assert_eq!(deepest.get(), DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(interp.call_depth(), 0);
    }
}
