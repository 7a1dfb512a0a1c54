//! Call frames
//!
//! Each member call pushes one [`CallFrame`] recording the class scope it
//! runs in, the object it runs against (none for class-level calls) and the
//! member name as invoked. The invocation context resolver and `chain` read
//! the innermost frame; nothing else keeps per-call state.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ ConfigHook  ::Base    obj  -                 │  ← current
//! ├──────────────────────────────────────────────┤
//! │ Builtin     ::Base    obj  "configure"       │
//! ├──────────────────────────────────────────────┤
//! │ Method      ::Derived obj  "setup"           │
//! └──────────────────────────────────────────────┘
//! ```

use crate::class::ClassId;
use crate::error::{DispatchError, DispatchResult};
use crate::object::ObjectId;

/// What kind of code a frame runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// User method body
    Method,
    /// Class-level procedure
    Proc,
    /// Builtin implementation
    Builtin,
    /// Constructor body or initializer
    Constructor,
    /// Destructor body
    Destructor,
    /// Config code of a public variable
    ConfigHook,
    /// Code evaluated in a class scope outside any member
    Eval,
}

/// Activation record of one member call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    /// Class scope the code runs in
    pub class_id: ClassId,

    /// Object the code runs against
    pub object: Option<ObjectId>,

    /// Member name as invoked (may be qualified)
    pub member: Option<String>,

    /// Kind of code
    pub kind: FrameKind,
}

impl CallFrame {
    /// Create a new call frame
    pub fn new(
        class_id: ClassId,
        object: Option<ObjectId>,
        member: Option<String>,
        kind: FrameKind,
    ) -> Self {
        Self {
            class_id,
            object,
            member,
            kind,
        }
    }
}

/// Stack of active call frames
#[derive(Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
}

impl CallStack {
    /// Create an empty stack that refuses to grow past `max_depth`
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame
    pub fn push(&mut self, frame: CallFrame) -> DispatchResult<()> {
        if self.frames.len() >= self.max_depth {
            return Err(DispatchError::Usage(
                "too many nested evaluations (infinite loop?)".to_string(),
            ));
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the innermost frame
    pub fn pop(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    /// Innermost frame
    pub fn current(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Number of active frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Check if no call is active
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
