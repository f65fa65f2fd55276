//! Script compile context.
//!
//! Holds all state during script compilation: the parsed blocks, the edit
//! buffer over the document, binding metadata, user imports and the state
//! collected by the macro processors.

use oxc_allocator::Allocator;
use oxc_ast::ast::{BindingPattern, CallExpression, Expression, ObjectPattern, Program, TSType};
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};
use serde::Serialize;
use tracing::debug;
use vize_carton::FxHashMap;

use crate::error::{ScriptCompileError, ScriptErrorKind, ScriptResult};
use crate::rewrite::SourceRewriter;
use crate::types::{BindingMetadata, BindingType, ScriptCompileOptions, SfcDescriptor, SfcScriptBlock};

use super::define_model::ModelDecl;
use super::define_props_destructure::PropsDestructureBinding;
use super::resolve_type::{TypeOrigin, TypeResolveError, TypeScope};

/// An import recorded from either script block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBinding {
    pub is_type: bool,
    pub imported: String,
    pub local: String,
    pub source: String,
    pub is_from_setup: bool,
    pub is_used_in_template: bool,
}

impl ImportBinding {
    /// Imports whose value can never be a ref.
    pub fn is_const_source(&self, runtime_module: &str) -> bool {
        self.source == "vue"
            || self.source == runtime_module
            || (self.imported == "default" && self.source.ends_with(".vue"))
            || self.imported == "*"
    }
}

/// A parsed script block.
#[derive(Debug, Clone, Copy)]
pub struct ScriptBlockAst<'a> {
    pub program: &'a Program<'a>,
    pub content: &'a str,
    /// Offset of the block content in the document source.
    pub start: usize,
    pub end: usize,
}

impl ScriptBlockAst<'_> {
    /// Absolute document range of a block-relative span.
    #[inline]
    pub fn abs(&self, span: Span) -> (usize, usize) {
        (self.start + span.start as usize, self.start + span.end as usize)
    }
}

/// Ordered binding table of one block.
#[derive(Debug, Default, Clone)]
pub struct OrderedBindings {
    entries: Vec<(String, BindingType)>,
}

impl OrderedBindings {
    pub fn insert(&mut self, name: &str, binding_type: BindingType) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = binding_type,
            None => self.entries.push((name.to_string(), binding_type)),
        }
    }

    pub fn get(&self, name: &str) -> Option<BindingType> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, BindingType)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), *t))
    }
}

/// Script compile context - holds all state during compilation
pub struct ScriptCompileContext<'a> {
    pub filename: &'a str,
    pub source: &'a str,
    pub options: &'a ScriptCompileOptions,
    pub is_ts: bool,

    pub script: Option<ScriptBlockAst<'a>>,
    pub script_setup: Option<ScriptBlockAst<'a>>,

    /// Edits over the whole document source.
    pub s: SourceRewriter<'a>,
    pub type_scope: TypeScope<'a>,

    pub bindings: BindingMetadata,
    pub script_bindings: OrderedBindings,
    pub setup_bindings: OrderedBindings,

    pub user_imports: FxHashMap<String, ImportBinding>,
    pub user_import_order: Vec<String>,
    /// Local names of runtime-module imports, keyed by imported name.
    pub user_import_aliases: FxHashMap<String, String>,

    helper_requests: Vec<&'static str>,
    pub warnings: Vec<String>,

    // macro state
    /// The module script has a default export, bound to `__default__`.
    pub has_default_export: bool,
    pub has_define_props_call: bool,
    pub has_define_emit_call: bool,
    pub has_define_expose_call: bool,
    pub has_default_export_name: bool,
    pub has_define_options_call: bool,
    pub has_define_slots_call: bool,
    pub has_define_model_call: bool,
    pub has_await: bool,

    pub props_call: Option<&'a CallExpression<'a>>,
    pub props_decl: Option<&'a BindingPattern<'a>>,
    pub props_runtime_decl: Option<&'a Expression<'a>>,
    pub props_type_decl: Option<&'a TSType<'a>>,
    pub props_runtime_defaults: Option<&'a Expression<'a>>,
    pub props_destructure_decl: Option<&'a ObjectPattern<'a>>,
    pub props_destructured_bindings: Vec<PropsDestructureBinding<'a>>,
    pub props_destructure_rest_id: Option<&'a str>,

    pub emits_runtime_decl: Option<&'a Expression<'a>>,
    pub emits_type_decl: Option<&'a TSType<'a>>,
    pub emit_decl: Option<&'a BindingPattern<'a>>,

    pub model_decls: Vec<ModelDecl<'a>>,

    pub options_runtime_decl: Option<&'a Expression<'a>>,
}

impl<'a> ScriptCompileContext<'a> {
    /// Parse the script blocks of `descriptor` into `allocator`.
    pub fn new(
        descriptor: &'a SfcDescriptor<'a>,
        options: &'a ScriptCompileOptions,
        allocator: &'a Allocator,
    ) -> ScriptResult<Self> {
        let filename: &'a str = &descriptor.filename;
        let source: &'a str = &descriptor.source;

        let is_ts = descriptor
            .script_setup
            .as_ref()
            .or(descriptor.script.as_ref())
            .is_some_and(SfcScriptBlock::is_ts);

        let script = descriptor
            .script
            .as_ref()
            .map(|block| parse_block(block, filename, source, allocator))
            .transpose()?;
        let script_setup = descriptor
            .script_setup
            .as_ref()
            .map(|block| parse_block(block, filename, source, allocator))
            .transpose()?;

        let type_scope = if is_ts {
            TypeScope::new(script.map(|b| b.program), script_setup.map(|b| b.program))
        } else {
            TypeScope::default()
        };

        Ok(Self {
            filename,
            source,
            options,
            is_ts,
            script,
            script_setup,
            s: SourceRewriter::new(source),
            type_scope,
            bindings: BindingMetadata::default(),
            script_bindings: OrderedBindings::default(),
            setup_bindings: OrderedBindings::default(),
            user_imports: FxHashMap::default(),
            user_import_order: Vec::new(),
            user_import_aliases: FxHashMap::default(),
            helper_requests: Vec::new(),
            warnings: Vec::new(),
            has_default_export: false,
            has_define_props_call: false,
            has_define_emit_call: false,
            has_define_expose_call: false,
            has_default_export_name: false,
            has_define_options_call: false,
            has_define_slots_call: false,
            has_define_model_call: false,
            has_await: false,
            props_call: None,
            props_decl: None,
            props_runtime_decl: None,
            props_type_decl: None,
            props_runtime_defaults: None,
            props_destructure_decl: None,
            props_destructured_bindings: Vec::new(),
            props_destructure_rest_id: None,
            emits_runtime_decl: None,
            emits_type_decl: None,
            emit_decl: None,
            model_decls: Vec::new(),
            options_runtime_decl: None,
        })
    }

    /// Request a runtime helper import and return its local name.
    pub fn helper(&mut self, name: &'static str) -> String {
        if !self.helper_requests.contains(&name) {
            self.helper_requests.push(name);
        }
        format!("_{name}")
    }

    /// Helpers in first-request order.
    pub fn helpers(&self) -> &[&'static str] {
        &self.helper_requests
    }

    /// Offset of the setup block content, or 0 without one.
    pub fn setup_offset(&self) -> usize {
        self.script_setup.map_or(0, |b| b.start)
    }

    /// Absolute range of a setup-relative span.
    pub fn setup_range(&self, span: Span) -> (usize, usize) {
        let offset = self.setup_offset();
        (offset + span.start as usize, offset + span.end as usize)
    }

    /// Document text of a setup-relative span.
    pub fn setup_text(&self, span: Span) -> &'a str {
        let (start, end) = self.setup_range(span);
        self.s.slice(start, end)
    }

    fn origin_offset(&self, origin: TypeOrigin) -> usize {
        match origin {
            TypeOrigin::Setup => self.setup_offset(),
            TypeOrigin::Module => self.script.map_or(0, |b| b.start),
        }
    }

    /// Document text of a span from either block.
    pub fn origin_text(&self, span: Span, origin: TypeOrigin) -> &'a str {
        let offset = self.origin_offset(origin);
        self.s
            .slice(offset + span.start as usize, offset + span.end as usize)
    }

    pub fn error(
        &self,
        kind: ScriptErrorKind,
        message: impl Into<String>,
        range: Option<(usize, usize)>,
    ) -> ScriptCompileError {
        ScriptCompileError::new(kind, message, self.filename, self.source, range)
    }

    /// Error pointing at a node of the setup block.
    pub fn setup_error(
        &self,
        kind: ScriptErrorKind,
        message: impl Into<String>,
        span: Span,
    ) -> ScriptCompileError {
        self.error(kind, message, Some(self.setup_range(span)))
    }

    pub fn type_error(&self, err: TypeResolveError) -> ScriptCompileError {
        let offset = self.origin_offset(err.origin);
        let range = (
            offset + err.span.start as usize,
            offset + err.span.end as usize,
        );
        self.error(ScriptErrorKind::TypeResolution, err.message, Some(range))
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(filename = self.filename, "{message}");
        self.warnings.push(message);
    }

    /// Record an import from either block.
    pub fn register_user_import(&mut self, import: ImportBinding) {
        if import.source == self.options.runtime_module_name() || import.source == "vue" {
            self.user_import_aliases
                .insert(import.imported.clone(), import.local.clone());
        }
        if !self.user_imports.contains_key(&import.local) {
            self.user_import_order.push(import.local.clone());
        }
        debug!(local = %import.local, source = %import.source, "register import");
        self.user_imports.insert(import.local.clone(), import);
    }

    /// Local name of a runtime API, honoring user aliases.
    pub fn runtime_alias(&self, imported: &str) -> String {
        self.user_import_aliases
            .get(imported)
            .cloned()
            .unwrap_or_else(|| imported.to_string())
    }

    /// Imports in registration order.
    pub fn imports(&self) -> impl Iterator<Item = &ImportBinding> {
        self.user_import_order
            .iter()
            .filter_map(|local| self.user_imports.get(local))
    }
}

fn parse_block<'a>(
    block: &'a SfcScriptBlock<'a>,
    filename: &str,
    source: &str,
    allocator: &'a Allocator,
) -> ScriptResult<ScriptBlockAst<'a>> {
    let source_type = match block.lang() {
        "ts" => SourceType::ts(),
        "tsx" => SourceType::tsx(),
        "jsx" => SourceType::jsx(),
        _ => SourceType::mjs(),
    };
    let content: &'a str = &block.content;
    let ret = Parser::new(allocator, content, source_type).parse();
    if let Some(err) = ret.errors.first() {
        let range = err
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| {
                let start = block.loc.start + label.offset();
                (start, start + label.len())
            });
        return Err(ScriptCompileError::new(
            ScriptErrorKind::Parse,
            err.to_string(),
            filename,
            source,
            range,
        ));
    }
    if ret.panicked {
        return Err(ScriptCompileError::new(
            ScriptErrorKind::Parse,
            "Failed to parse script block",
            filename,
            source,
            None,
        ));
    }
    debug!(
        lang = block.lang(),
        setup = block.setup,
        statements = ret.program.body.len(),
        "parsed script block"
    );
    Ok(ScriptBlockAst {
        program: allocator.alloc(ret.program),
        content,
        start: block.loc.start,
        end: block.loc.end,
    })
}
