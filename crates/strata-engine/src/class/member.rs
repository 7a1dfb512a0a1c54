//! Member functions, variables, components and the tables that hold them

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::{ClassId, Protection};
use crate::builtin::BuiltinKind;
use crate::error::DispatchResult;
use crate::interp::Interp;
use crate::value::Value;

/// Body of a user-defined member function
pub type MethodFn = Rc<dyn Fn(&mut Interp, &[Value]) -> DispatchResult<Value>>;

/// Code run after a public variable is assigned through `configure`
pub type ConfigHook = Rc<dyn Fn(&mut Interp) -> DispatchResult<()>>;

/// Simple name of constructors
pub const CONSTRUCTOR: &str = "constructor";

/// Simple name of destructors
pub const DESTRUCTOR: &str = "destructor";

/// Frame name under which a constructor initializer runs
pub const CONSTRUCTOR_INIT: &str = "___constructor_init";

bitflags::bitflags! {
    /// Flags describing a member function
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FunctionFlags: u32 {
        /// Runs when an object is created
        const CONSTRUCTOR = 1 << 0;
        /// Runs when an object is deleted
        const DESTRUCTOR = 1 << 1;
        /// Installed by the engine rather than defined by the class
        const BUILTIN = 1 << 2;
        /// Class-level procedure (no object context)
        const COMMON = 1 << 3;
    }
}

/// Implementation of a member function
#[derive(Clone)]
pub enum MemberBody {
    /// Closure supplied by the class definition
    User(MethodFn),
    /// Engine-provided implementation
    Builtin(BuiltinKind),
}

impl fmt::Debug for MemberBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberBody::User(_) => f.write_str("User(..)"),
            MemberBody::Builtin(kind) => f.debug_tuple("Builtin").field(kind).finish(),
        }
    }
}

/// A method or proc owned by a class
#[derive(Clone)]
pub struct MemberFunc {
    /// Declaring class
    pub class_id: ClassId,
    /// Simple name
    pub name: String,
    /// Fully-qualified name (`::ns::Class::name`)
    pub full_name: String,
    /// Visibility
    pub protection: Protection,
    /// Kind flags
    pub flags: FunctionFlags,
    /// Argument description shown in usage errors
    pub usage: Option<String>,
    /// Registration name of the builtin implementation
    pub registration: Option<String>,
    /// Implementation
    pub body: MemberBody,
    /// Constructor initializer, run before base classes are constructed
    pub initializer: Option<MethodFn>,
}

impl fmt::Debug for MemberFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberFunc")
            .field("full_name", &self.full_name)
            .field("protection", &self.protection)
            .field("flags", &self.flags)
            .field("body", &self.body)
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}

impl MemberFunc {
    /// Check if this is a constructor
    pub fn is_constructor(&self) -> bool {
        self.flags.contains(FunctionFlags::CONSTRUCTOR)
    }

    /// Check if this is a destructor
    pub fn is_destructor(&self) -> bool {
        self.flags.contains(FunctionFlags::DESTRUCTOR)
    }

    /// Check if this was installed by the engine
    pub fn is_builtin(&self) -> bool {
        self.flags.contains(FunctionFlags::BUILTIN)
    }

    /// Check if this is a class-level procedure
    pub fn is_common(&self) -> bool {
        self.flags.contains(FunctionFlags::COMMON)
    }
}

/// A member variable owned by a class
#[derive(Clone)]
pub struct Variable {
    /// Declaring class
    pub class_id: ClassId,
    /// Simple name
    pub name: String,
    /// Fully-qualified name
    pub full_name: String,
    /// Visibility
    pub protection: Protection,
    /// Initial value; unset when `None`
    pub init: Option<Value>,
    /// Code run after `configure` assigns the variable
    pub config: Option<ConfigHook>,
}

impl Variable {
    /// Check if this variable is projected as a configuration option
    pub fn is_public(&self) -> bool {
        self.protection == Protection::Public
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("full_name", &self.full_name)
            .field("protection", &self.protection)
            .field("init", &self.init)
            .field("config", &self.config.is_some())
            .finish()
    }
}

/// How a variable is reached from one class's scope
#[derive(Debug, Clone)]
pub struct VarLookup {
    /// The variable
    pub variable: Rc<Variable>,
    /// Shortest name that reaches this variable unambiguously
    pub least_qual_name: String,
    /// Number of names mapped to this variable
    pub usage: usize,
    /// Whether the owning scope may access the variable
    pub accessible: bool,
}

/// Named delegation slot of a composite class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Declaring class
    pub class_id: ClassId,
    /// Component name
    pub name: String,
    /// Full name of the variable that stores the delegate's access name
    pub variable: String,
}

/// Name-indexed table that preserves creation order
#[derive(Debug, Clone)]
pub struct MemberTable<T> {
    /// Entries in creation order
    entries: Vec<T>,
    /// Simple name to entry index
    index: FxHashMap<String, usize>,
}

impl<T> MemberTable<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Insert an entry; returns it back if the name is taken
    pub fn insert(&mut self, name: &str, entry: T) -> Result<(), T> {
        if self.index.contains_key(name) {
            return Err(entry);
        }
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Get an entry by simple name
    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).and_then(|i| self.entries.get(*i))
    }

    /// Check if a name is present
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate entries in creation order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for MemberTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Every name by which a member is reachable, least qualified first
///
/// For `::ui::Button::color` this yields `color`, `Button::color`,
/// `ui::Button::color` and `::ui::Button::color`.
pub fn qualified_names(full_name: &str) -> Vec<String> {
    let parts: Vec<&str> = full_name
        .trim_start_matches("::")
        .split("::")
        .filter(|p| !p.is_empty())
        .collect();
    let mut names = Vec::with_capacity(parts.len() + 1);
    for start in (0..parts.len()).rev() {
        names.push(parts[start..].join("::"));
    }
    names.push(format!("::{}", parts.join("::")));
    names
}

/// Strip namespace qualification from a member name
pub fn simple_name(name: &str) -> &str {
    match name.rfind("::") {
        Some(pos) => &name[pos + 2..],
        None => name,
    }
}
