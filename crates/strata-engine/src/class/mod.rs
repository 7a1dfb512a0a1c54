//! Class model
//!
//! A [`Class`] is assembled by [`ClassBuilder`], finished by the builtin and
//! composite installers, and then frozen into the [`ClassRegistry`]. After
//! registration a class never changes, so dispatch can share it as
//! `Rc<Class>` across re-entrant calls.
//!
//! Two resolution tables are derived once per class from its heritage:
//!
//! - `resolve_vars`: every name (simple or qualified) by which a variable is
//!   reachable from the class's scope. The most-derived declaration claims
//!   the simple name; shadowed variables stay reachable through a more
//!   qualified name.
//! - `resolve_cmds`: the virtual function table, built the same way over
//!   member functions (constructors and destructors excluded).

pub mod builder;
pub mod hierarchy;
pub mod member;
pub mod registry;

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

pub use builder::ClassBuilder;
pub use hierarchy::{linearize, HierIter};
pub use member::{
    qualified_names, simple_name, Component, ConfigHook, FunctionFlags, MemberBody, MemberFunc,
    MemberTable, MethodFn, VarLookup, Variable, CONSTRUCTOR, CONSTRUCTOR_INIT, DESTRUCTOR,
};
pub use registry::ClassRegistry;

use crate::error::{DispatchError, DispatchResult};

/// Class handle (index into the class registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub usize);

impl ClassId {
    /// Get the raw index
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protection {
    /// Visible everywhere; public variables are configuration options
    Public,
    /// Visible to the declaring class and its relatives
    Protected,
    /// Visible to the declaring class only
    Private,
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protection::Public => "public",
            Protection::Protected => "protected",
            Protection::Private => "private",
        })
    }
}

bitflags::bitflags! {
    /// Flags describing what kind of class this is
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClassFlags: u32 {
        /// Plain class
        const CLASS = 1 << 0;
        /// Type (class-like, no instance widget)
        const TYPE = 1 << 1;
        /// Composite widget built around a hull
        const WIDGET = 1 << 2;
        /// Widget whose hull is a frame
        const WIDGET_FRAME = 1 << 3;
        /// Widget whose hull is a toplevel
        const WIDGET_TOPLEVEL = 1 << 4;
        /// Widget that adapts an existing hull
        const WIDGET_ADAPTOR = 1 << 5;
    }
}

/// Kind of class-defining command that created a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassKind {
    /// `class`
    #[default]
    Class,
    /// `type`
    Type,
    /// `widget`
    Widget,
    /// `widgetadaptor`
    WidgetAdaptor,
}

impl ClassKind {
    /// Flag recorded for this kind
    pub fn flags(self) -> ClassFlags {
        match self {
            ClassKind::Class => ClassFlags::CLASS,
            ClassKind::Type => ClassFlags::TYPE,
            ClassKind::Widget => ClassFlags::WIDGET,
            ClassKind::WidgetAdaptor => ClassFlags::WIDGET_ADAPTOR,
        }
    }

    /// Whether classes of this kind own a hull component and options storage
    pub fn is_composite(self) -> bool {
        matches!(self, ClassKind::Widget | ClassKind::WidgetAdaptor)
    }
}

/// Class definition
#[derive(Debug)]
pub struct Class {
    /// Class ID (unique identifier)
    pub id: ClassId,
    /// Simple name
    pub name: String,
    /// Fully-qualified name (`::ns::Name`)
    pub full_name: String,
    /// Direct superclasses in declaration order
    pub supers: Vec<ClassId>,
    /// Kind flags
    pub flags: ClassFlags,
    /// Cached linearization: this class first, then ancestors
    heritage: Vec<ClassId>,
    functions: MemberTable<Rc<MemberFunc>>,
    variables: MemberTable<Rc<Variable>>,
    components: MemberTable<Rc<Component>>,
    resolve_vars: FxHashMap<String, Rc<VarLookup>>,
    resolve_cmds: FxHashMap<String, Rc<MemberFunc>>,
}

impl Class {
    /// Create an empty class record; `heritage` must start with `id`
    pub fn new(
        id: ClassId,
        full_name: String,
        supers: Vec<ClassId>,
        flags: ClassFlags,
        heritage: Vec<ClassId>,
    ) -> Self {
        Self {
            id,
            name: simple_name(&full_name).to_string(),
            full_name,
            supers,
            flags,
            heritage,
            functions: MemberTable::new(),
            variables: MemberTable::new(),
            components: MemberTable::new(),
            resolve_vars: FxHashMap::default(),
            resolve_cmds: FxHashMap::default(),
        }
    }

    /// This class followed by its ancestors, each once
    pub fn heritage(&self) -> &[ClassId] {
        &self.heritage
    }

    /// Check if this is a plain class (not a type or widget)
    pub fn is_plain_class(&self) -> bool {
        self.flags.contains(ClassFlags::CLASS)
    }

    /// Full name a member of this class gets
    pub fn member_full_name(&self, name: &str) -> String {
        format!("{}::{}", self.full_name, name)
    }

    /// Add a member function; fails if the simple name is taken
    pub fn add_function(&mut self, func: MemberFunc) -> DispatchResult<Rc<MemberFunc>> {
        let name = func.name.clone();
        let func = Rc::new(func);
        self.functions
            .insert(&name, Rc::clone(&func))
            .map_err(|_| {
                DispatchError::Creation(format!(
                    "member function \"{}\" already defined in class \"{}\"",
                    name, self.full_name
                ))
            })?;
        Ok(func)
    }

    /// Add a member variable; fails if the simple name is taken
    pub fn add_variable(&mut self, var: Variable) -> DispatchResult<Rc<Variable>> {
        let name = var.name.clone();
        let var = Rc::new(var);
        self.variables
            .insert(&name, Rc::clone(&var))
            .map_err(|_| {
                DispatchError::Creation(format!(
                    "variable name \"{}\" already defined in class \"{}\"",
                    name, self.full_name
                ))
            })?;
        Ok(var)
    }

    /// Add a component; fails if the name is taken
    pub fn add_component(&mut self, component: Component) -> DispatchResult<Rc<Component>> {
        let name = component.name.clone();
        let component = Rc::new(component);
        self.components
            .insert(&name, Rc::clone(&component))
            .map_err(|_| {
                DispatchError::Creation(format!(
                    "component \"{}\" already defined in class \"{}\"",
                    name, self.full_name
                ))
            })?;
        Ok(component)
    }

    /// Own member function by simple name
    pub fn function(&self, name: &str) -> Option<&Rc<MemberFunc>> {
        self.functions.get(name)
    }

    /// Check if this class itself defines a function
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    /// Own member functions in creation order
    pub fn functions(&self) -> impl Iterator<Item = &Rc<MemberFunc>> {
        self.functions.iter()
    }

    /// Own variable by simple name
    pub fn variable(&self, name: &str) -> Option<&Rc<Variable>> {
        self.variables.get(name)
    }

    /// Own variables in creation order
    pub fn variables(&self) -> impl Iterator<Item = &Rc<Variable>> {
        self.variables.iter()
    }

    /// Own component by name
    pub fn component(&self, name: &str) -> Option<&Rc<Component>> {
        self.components.get(name)
    }

    /// Own components in creation order
    pub fn components(&self) -> impl Iterator<Item = &Rc<Component>> {
        self.components.iter()
    }

    /// Resolve a variable name as seen from this class's scope
    pub fn resolve_var(&self, name: &str) -> Option<&Rc<VarLookup>> {
        self.resolve_vars.get(name)
    }

    /// Resolve a member function name through the virtual table
    pub fn resolve_cmd(&self, name: &str) -> Option<&Rc<MemberFunc>> {
        self.resolve_cmds.get(name)
    }

    /// Simple names of public methods reachable through the virtual table
    pub fn public_method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .resolve_cmds
            .iter()
            .filter(|(key, func)| {
                key.as_str() == func.name && func.protection == Protection::Public
            })
            .map(|(key, _)| key.clone())
            .collect();
        names.sort();
        names
    }

    /// Build `resolve_vars` and `resolve_cmds` from the heritage
    ///
    /// `registry` must hold every ancestor; this class itself may be
    /// unregistered.
    pub(crate) fn build_virtual_tables(&mut self, registry: &ClassRegistry) {
        let mut vars: FxHashMap<String, Rc<VarLookup>> = FxHashMap::default();
        let mut cmds: FxHashMap<String, Rc<MemberFunc>> = FxHashMap::default();

        for class_id in HierIter::new(&self.heritage) {
            let class = if class_id == self.id {
                &*self
            } else {
                match registry.get(class_id) {
                    Some(class) => &**class,
                    None => continue,
                }
            };

            for var in class.variables() {
                let names: Vec<String> = qualified_names(&var.full_name)
                    .into_iter()
                    .filter(|n| !vars.contains_key(n))
                    .collect();
                let Some(least) = names.first() else {
                    continue;
                };
                let lookup = Rc::new(VarLookup {
                    variable: Rc::clone(var),
                    least_qual_name: least.clone(),
                    usage: names.len(),
                    accessible: var.protection != Protection::Private || var.class_id == self.id,
                });
                for name in names {
                    vars.insert(name, Rc::clone(&lookup));
                }
            }

            for func in class.functions() {
                if func.is_constructor() || func.is_destructor() {
                    continue;
                }
                for name in qualified_names(&func.full_name) {
                    cmds.entry(name).or_insert_with(|| Rc::clone(func));
                }
            }
        }

        self.resolve_vars = vars;
        self.resolve_cmds = cmds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(class_id: ClassId, class: &str, name: &str, protection: Protection) -> Variable {
        Variable {
            class_id,
            name: name.to_string(),
            full_name: format!("{}::{}", class, name),
            protection,
            init: None,
            config: None,
        }
    }

    #[test]
    fn test_kind_flags() {
        assert_eq!(ClassKind::Class.flags(), ClassFlags::CLASS);
        assert!(ClassKind::Widget.is_composite());
        assert!(ClassKind::WidgetAdaptor.is_composite());
        assert!(!ClassKind::Type.is_composite());
    }

    #[test]
    fn test_duplicate_variable_rejected() {
        let id = ClassId(0);
        let mut class = Class::new(id, "::Point".to_string(), vec![], ClassFlags::CLASS, vec![id]);
        class.add_variable(var(id, "::Point", "x", Protection::Public)).unwrap();
        let err = class
            .add_variable(var(id, "::Point", "x", Protection::Public))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Creation(_)));
    }

    #[test]
    fn test_shadowed_variable_gets_qualified_name() {
        let base_id = ClassId(0);
        let mut registry = ClassRegistry::new();
        let mut base = Class::new(
            base_id,
            "::Base".to_string(),
            vec![],
            ClassFlags::CLASS,
            vec![base_id],
        );
        base.add_variable(var(base_id, "::Base", "x", Protection::Public)).unwrap();
        base.add_variable(var(base_id, "::Base", "secret", Protection::Private)).unwrap();
        base.build_virtual_tables(&registry);
        registry.register_class(base);

        let derived_id = ClassId(1);
        let mut derived = Class::new(
            derived_id,
            "::Derived".to_string(),
            vec![base_id],
            ClassFlags::CLASS,
            vec![derived_id, base_id],
        );
        derived.add_variable(var(derived_id, "::Derived", "x", Protection::Public)).unwrap();
        derived.build_virtual_tables(&registry);

        let own = derived.resolve_var("x").unwrap();
        assert_eq!(own.variable.full_name, "::Derived::x");
        assert_eq!(own.least_qual_name, "x");

        let shadowed = derived.resolve_var("::Base::x").unwrap();
        assert_eq!(shadowed.least_qual_name, "Base::x");
        assert_eq!(shadowed.usage, 2);

        assert!(!derived.resolve_var("secret").unwrap().accessible);
    }
}
