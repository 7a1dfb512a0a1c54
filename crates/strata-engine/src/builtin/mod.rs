//! Built-in methods
//!
//! Every class gets default implementations of `cget`, `configure`, `info`
//! and `isa` unless the class or one of its ancestors already defines a
//! member with that simple name. `chain` is not a member: it is an
//! interpreter command ([`Interp::chain`]) usable from any member body.

pub mod chain;
pub mod configure;
pub mod info;

use tracing::debug;

use crate::class::{
    Class, ClassRegistry, FunctionFlags, HierIter, MemberBody, MemberFunc, Protection,
};
use crate::error::DispatchResult;
use crate::interp::Interp;
use crate::options::EngineOptions;
use crate::value::Value;

/// Engine-provided member implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    /// `cget -option`
    Cget,
    /// `configure ?-option? ?value -option value...?`
    Configure,
    /// `info option ?arg arg ...?`
    Info,
    /// `isa className`
    Isa,
}

impl BuiltinKind {
    /// Builtins in installation order
    pub const ALL: [BuiltinKind; 4] = [
        BuiltinKind::Cget,
        BuiltinKind::Configure,
        BuiltinKind::Info,
        BuiltinKind::Isa,
    ];

    /// Member name the builtin is installed under
    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::Cget => "cget",
            BuiltinKind::Configure => "configure",
            BuiltinKind::Info => "info",
            BuiltinKind::Isa => "isa",
        }
    }

    /// Argument description shown in usage messages
    pub fn usage(self) -> &'static str {
        match self {
            BuiltinKind::Cget => "-option",
            BuiltinKind::Configure => "?-option? ?value -option value...?",
            BuiltinKind::Info => "option ?arg arg ...?",
            BuiltinKind::Isa => "className",
        }
    }
}

/// Add the builtins that `class` does not already inherit or define
///
/// `class` is the class being built; its ancestors are looked up in
/// `registry`. Returns the number of builtins installed. A failure to create
/// a member aborts the pass and is fatal to the class build.
pub fn install_builtins(
    class: &mut Class,
    registry: &ClassRegistry,
    options: &EngineOptions,
) -> DispatchResult<usize> {
    let mut installed = 0;
    for kind in BuiltinKind::ALL {
        let name = kind.name();
        let defined = HierIter::new(class.heritage()).any(|class_id| {
            if class_id == class.id {
                class.has_function(name)
            } else {
                registry
                    .get(class_id)
                    .map_or(false, |ancestor| ancestor.has_function(name))
            }
        });
        if defined {
            debug!(
                target: "strata::builtin",
                class = %class.full_name,
                builtin = name,
                "builtin already defined in heritage; skipped"
            );
            continue;
        }

        let full_name = class.member_full_name(name);
        class.add_function(MemberFunc {
            class_id: class.id,
            name: name.to_string(),
            full_name,
            protection: Protection::Public,
            flags: FunctionFlags::BUILTIN,
            usage: Some(kind.usage().to_string()),
            registration: Some(options.registration_name(name)),
            body: MemberBody::Builtin(kind),
            initializer: None,
        })?;
        installed += 1;
    }
    debug!(
        target: "strata::builtin",
        class = %class.full_name,
        installed,
        "builtins installed"
    );
    Ok(installed)
}

/// Run a builtin in the current call frame
pub(crate) fn dispatch(interp: &mut Interp, kind: BuiltinKind, args: &[Value]) -> DispatchResult<Value> {
    match kind {
        BuiltinKind::Cget => configure::cget(interp, args),
        BuiltinKind::Configure => configure::configure(interp, args),
        BuiltinKind::Info => info::info(interp, args),
        BuiltinKind::Isa => info::isa(interp, args),
    }
}
