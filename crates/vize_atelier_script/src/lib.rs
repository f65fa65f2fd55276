//! Vize Atelier Script - The `<script setup>` workshop.
//!
//! Resolves the compiler macros of a Vue single-file component's `<script setup>`
//! block (`defineProps`, `withDefaults`, `defineEmits`, `defineModel`, `defineExpose`,
//! `defineOptions`, `defineSlots`), infers runtime prop schemas from TypeScript
//! types, classifies every top-level binding for the template compiler and
//! rewrites both script blocks into a single component module with a source map.
//!
//! # Example
//!
//! ```
//! use vize_atelier_script::{compile_script, ScriptCompileOptions, SfcDescriptor};
//!
//! let source = "<script setup>\nconst msg = 'hi'\n</script>\n";
//! let descriptor = SfcDescriptor::from_source("Hello.vue", source);
//! let result = compile_script(&descriptor, &ScriptCompileOptions::default()).unwrap();
//! assert!(result.code.contains("__name: 'Hello'"));
//! ```

pub mod compile_script;
pub mod error;
pub mod rewrite;
pub mod script;
pub mod types;

#[cfg(test)]
mod fixture_tests;

pub use compile_script::{compile_script, ScriptCompileResult};
pub use error::{ScriptCompileError, ScriptErrorKind};
pub use rewrite::{InsertSide, RewriteError, SourceRewriter, TextEdit};
pub use script::{
    analyze_script_bindings, infer_runtime_type, ImportBinding, ResolvedType, RuntimeTag,
    RuntimeTypes, ScriptCompileContext, TypeOrigin, TypeScope,
};
pub use types::{
    BindingMetadata, BindingType, BlockLocation, PropsDestructure, ScriptCompileOptions,
    SfcDescriptor, SfcScriptBlock,
};
