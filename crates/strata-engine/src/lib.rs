//! Strata Object Dispatch Engine
//!
//! This crate provides the method dispatch layer of an object system for an
//! embeddable scripting host:
//! - Classes with multiple inheritance and a cached heritage linearization
//! - Public/protected/private members and per-class resolution tables
//! - Built-in `cget`, `configure`, `info` and `isa` methods
//! - `chain` to the next more general implementation of a member
//! - Widget-style composite classes with a `hull` component
//!
//! Classes are defined with [`ClassBuilder`] and live in an [`Interp`],
//! which owns the class registry, the objects and the call stack.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod builtin;
pub mod class;
pub mod error;
pub mod interp;
pub mod object;
pub mod options;
pub mod value;
pub mod widget;

pub use builtin::BuiltinKind;
pub use class::{
    Class, ClassBuilder, ClassFlags, ClassId, ClassKind, ClassRegistry, HierIter, MemberBody,
    MemberFunc, Protection, Variable,
};
pub use error::{DispatchError, DispatchResult};
pub use interp::{CallFrame, ClassLoader, FrameKind, Interp};
pub use object::{Object, ObjectId};
pub use options::{EngineOptions, OptionsError};
pub use value::Value;
pub use widget::WidgetDelegate;
