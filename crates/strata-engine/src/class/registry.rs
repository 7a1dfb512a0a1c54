//! Class registry for managing class definitions

use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::{Class, ClassId};

/// Process-wide class table owned by an [`Interp`](crate::Interp)
#[derive(Debug)]
pub struct ClassRegistry {
    /// Classes indexed by ID
    classes: Vec<Rc<Class>>,
    /// Full name (`::ns::Name`) to ID mapping
    name_to_id: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            name_to_id: FxHashMap::default(),
        }
    }

    /// Register a built class; its ID must be [`next_class_id`](Self::next_class_id)
    pub fn register_class(&mut self, class: Class) -> ClassId {
        debug_assert_eq!(class.id, self.next_class_id());
        let id = class.id;
        self.name_to_id.insert(class.full_name.clone(), id);
        self.classes.push(Rc::new(class));
        id
    }

    /// Get class by ID
    pub fn get(&self, id: ClassId) -> Option<&Rc<Class>> {
        self.classes.get(id.0)
    }

    /// Get class by fully-qualified name
    pub fn get_by_full_name(&self, full_name: &str) -> Option<&Rc<Class>> {
        self.name_to_id
            .get(full_name)
            .and_then(|id| self.classes.get(id.0))
    }

    /// Resolve a class name
    ///
    /// Accepts a full name (`::ui::Button`), a name relative to the global
    /// namespace (`ui::Button`), or a simple name that matches exactly one
    /// registered class.
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        if name.starts_with("::") {
            return self.name_to_id.get(name).copied();
        }
        if let Some(id) = self.name_to_id.get(&format!("::{}", name)) {
            return Some(*id);
        }
        let mut matches = self.classes.iter().filter(|class| class.name == name);
        match (matches.next(), matches.next()) {
            (Some(class), None) => Some(class.id),
            _ => None,
        }
    }

    /// Get next available class ID
    pub fn next_class_id(&self) -> ClassId {
        ClassId(self.classes.len())
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if no classes are registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterate over all classes in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Class>> {
        self.classes.iter()
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}
