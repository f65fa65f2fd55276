//! Script block analysis.
//!
//! This module holds the pieces the script compiler is assembled from: the
//! compile context, the type resolver, one processor per compiler macro
//! (`defineProps`, `defineEmits`, etc.) and the binding classifier.

mod analyze_script_bindings;
mod bindings;
mod context;
mod define_emits;
mod define_expose;
mod define_model;
mod define_options;
mod define_props;
mod define_props_destructure;
mod define_slots;
mod resolve_type;
mod utils;
mod walk;

// Re-export main types
pub use analyze_script_bindings::analyze_script_bindings;
pub use context::{ImportBinding, OrderedBindings, ScriptBlockAst, ScriptCompileContext};
pub use define_model::ModelDecl;
pub use define_props::PropEntry;
pub use define_props_destructure::{DestructuredDefault, PropsDestructureBinding};
pub use resolve_type::{
    infer_member_type, infer_runtime_type, MemberType, PropMember, ResolvedElements,
    ResolvedNode, ResolvedType, RuntimeTag, RuntimeTypes, TypeOrigin, TypeResolveError,
    TypeScope,
};

// Re-export constants
pub use define_emits::DEFINE_EMITS;
pub use define_expose::DEFINE_EXPOSE;
pub use define_model::DEFINE_MODEL;
pub use define_options::DEFINE_OPTIONS;
pub use define_props::{DEFINE_PROPS, WITH_DEFAULTS};
pub use define_slots::DEFINE_SLOTS;

/// Every compiler macro name.
pub const COMPILER_MACROS: [&str; 7] = [
    DEFINE_PROPS,
    DEFINE_EMITS,
    DEFINE_EXPOSE,
    DEFINE_OPTIONS,
    DEFINE_SLOTS,
    DEFINE_MODEL,
    WITH_DEFAULTS,
];

pub(crate) use bindings::DeclarationClassifier;
pub(crate) use define_emits::{gen_runtime_emits, process_define_emits};
pub(crate) use define_expose::process_define_expose;
pub(crate) use define_model::process_define_model;
pub(crate) use define_options::process_define_options;
pub(crate) use define_props::{gen_runtime_props, process_define_props};
pub(crate) use define_props_destructure::transform_destructured_props;
pub(crate) use define_slots::process_define_slots;
pub(crate) use utils::{component_name_from_filename, unwrap_ts_node};
pub(crate) use walk::{collect_references, ReferenceVisitor, ScopeWalker};
