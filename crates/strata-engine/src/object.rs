//! Object instances and their variable storage

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::class::ClassId;
use crate::value::Value;

/// Object handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// Object instance
#[derive(Debug, Clone)]
pub struct Object {
    /// Unique object ID
    pub id: ObjectId,
    /// Access name the object is addressed by in scripts
    pub name: String,
    /// Most-derived class
    pub class_id: ClassId,
    /// Variable values keyed by variable full name; absent means unset
    vars: FxHashMap<String, Value>,
    /// Classes whose constructor already ran for this object
    constructed: FxHashSet<ClassId>,
    /// Classes whose destructor already ran during the current deletion
    destructed: FxHashSet<ClassId>,
}

impl Object {
    /// Create an object with no variables set
    pub fn new(id: ObjectId, name: String, class_id: ClassId) -> Self {
        Self {
            id,
            name,
            class_id,
            vars: FxHashMap::default(),
            constructed: FxHashSet::default(),
            destructed: FxHashSet::default(),
        }
    }

    /// Get a variable by full name
    pub fn var(&self, full_name: &str) -> Option<&Value> {
        self.vars.get(full_name)
    }

    /// Set a variable by full name, returning the previous value
    pub fn set_var(&mut self, full_name: &str, value: Value) -> Option<Value> {
        self.vars.insert(full_name.to_string(), value)
    }

    /// Unset a variable by full name, returning the previous value
    pub fn unset_var(&mut self, full_name: &str) -> Option<Value> {
        self.vars.remove(full_name)
    }

    /// Record that a class's constructor ran; `false` if it already had
    pub fn mark_constructed(&mut self, class_id: ClassId) -> bool {
        self.constructed.insert(class_id)
    }

    /// Check if a class's constructor already ran
    pub fn is_constructed(&self, class_id: ClassId) -> bool {
        self.constructed.contains(&class_id)
    }

    /// Record that a class's destructor ran; `false` if it already had
    pub fn mark_destructed(&mut self, class_id: ClassId) -> bool {
        self.destructed.insert(class_id)
    }

    /// Forget destructor progress after a failed deletion
    pub fn clear_destructed(&mut self) {
        self.destructed.clear();
    }
}

/// Live objects indexed by ID and by access name
#[derive(Debug, Default)]
pub struct ObjectTable {
    objects: FxHashMap<ObjectId, Object>,
    by_name: FxHashMap<String, ObjectId>,
    next_id: u64,
}

impl ObjectTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an object; the caller checks the name is free
    pub fn insert(&mut self, name: &str, class_id: ClassId) -> ObjectId {
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        self.by_name.insert(name.to_string(), id);
        self.objects
            .insert(id, Object::new(id, name.to_string(), class_id));
        id
    }

    /// Remove an object
    pub fn remove(&mut self, id: ObjectId) -> Option<Object> {
        let object = self.objects.remove(&id)?;
        self.by_name.remove(&object.name);
        Some(object)
    }

    /// Get an object by ID
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Get a mutable object by ID
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Find an object by access name
    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.by_name.get(name).copied()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if there are no live objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
