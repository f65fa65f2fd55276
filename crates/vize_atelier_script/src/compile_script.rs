//! Script compilation for Vue SFCs.
//!
//! Turns the `<script>` and `<script setup>` blocks of a component into a
//! single module: macros are resolved, runtime props and emits are generated
//! and the setup code is wrapped into the component's `setup()` function.

mod codegen;
mod imports;
mod normal_script;
mod setup_body;
#[cfg(test)]
mod tests;

use oxc_allocator::Allocator;
use oxc_span::Span;
use serde::Serialize;
use tracing::{debug, trace};
use vize_carton::{skip_whitespace, FxHashMap, SourceMap};

use crate::error::{ScriptCompileError, ScriptErrorKind, ScriptResult};
use crate::rewrite::RewriteError;
use crate::script::{ImportBinding, ScriptCompileContext};
use crate::types::{BindingMetadata, ScriptCompileOptions, SfcDescriptor};

/// Local name the module script's default export is bound to.
pub const NORMAL_SCRIPT_DEFAULT_VAR: &str = "__default__";

/// Script compilation result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptCompileResult {
    pub code: String,
    pub map: Option<SourceMap>,
    pub bindings: BindingMetadata,
    /// Imports of both blocks keyed by local name
    pub imports: FxHashMap<String, ImportBinding>,
    pub warnings: Vec<String>,
}

/// Compile the script blocks of `descriptor` into a component module.
pub fn compile_script(
    descriptor: &SfcDescriptor<'_>,
    options: &ScriptCompileOptions,
) -> ScriptResult<ScriptCompileResult> {
    debug!(
        filename = %descriptor.filename,
        is_prod = options.is_prod,
        "compile script"
    );

    let Some(script_setup) = &descriptor.script_setup else {
        if descriptor.script.is_none() {
            return Err(ScriptCompileError::new(
                ScriptErrorKind::InvalidInput,
                "SFC contains no <script> tags.",
                &descriptor.filename,
                &descriptor.source,
                None,
            ));
        }
        let allocator = Allocator::default();
        let ctx = ScriptCompileContext::new(descriptor, options, &allocator)?;
        return normal_script::compile_normal_script(ctx);
    };

    if let Some(script) = &descriptor.script {
        if script.lang() != script_setup.lang() {
            return Err(ScriptCompileError::new(
                ScriptErrorKind::InvalidInput,
                "<script> and <script setup> must have the same language type.",
                &descriptor.filename,
                &descriptor.source,
                Some((script.loc.start, script.loc.end)),
            ));
        }
    }

    let allocator = Allocator::default();
    let mut ctx = ScriptCompileContext::new(descriptor, options, &allocator)?;
    debug!(lang = script_setup.lang(), is_ts = ctx.is_ts, "compile script setup");

    imports::register_module_imports(&mut ctx);
    imports::process_setup_imports(&mut ctx)?;
    normal_script::process_module_body(&mut ctx);
    setup_body::process_setup_body(&mut ctx)?;
    setup_body::rewrite_top_level_awaits(&mut ctx);
    crate::script::transform_destructured_props(&mut ctx)?;
    setup_body::check_macro_scope_references(&ctx)?;
    codegen::remove_non_script_content(&mut ctx);
    codegen::collect_binding_metadata(&mut ctx);
    codegen::generate_component(&mut ctx)?;

    let result = finish(ctx)?;
    debug!(
        bytes = result.code.len(),
        bindings = result.bindings.bindings.len(),
        "compiled script setup"
    );
    Ok(result)
}

/// Move a setup statement, including its trailing whitespace, to the top
/// of the output.
fn hoist_setup_node(ctx: &mut ScriptCompileContext<'_>, span: Span) {
    let (start, end) = ctx.setup_range(span);
    let end = end_of_trailing_comment(ctx.source, end);
    let end = skip_whitespace(ctx.source, end).min(ctx.source.len());
    trace!(start, end, "hoist statement");
    ctx.s.move_range(start, end, 0);
}

/// End of a comment following `end` on the same line, or `end` itself.
fn end_of_trailing_comment(source: &str, end: usize) -> usize {
    let Some(rest) = source.get(end..) else {
        return end;
    };
    let line = rest.split('\n').next().unwrap_or_default();
    let trimmed = line.trim_start_matches([' ', '\t']);
    let comment_start = end + (line.len() - trimmed.len());
    if trimmed.starts_with("//") {
        end + line.trim_end_matches('\r').len()
    } else if let Some(body) = trimmed.strip_prefix("/*") {
        match body.find("*/") {
            Some(close) => comment_start + 2 + close + 2,
            None => end,
        }
    } else {
        end
    }
}

fn rewrite_error(ctx: &ScriptCompileContext<'_>, err: RewriteError) -> ScriptCompileError {
    ctx.error(ScriptErrorKind::Rewrite, err.to_string(), None)
}

/// Apply the collected edits and assemble the result.
fn finish(ctx: ScriptCompileContext<'_>) -> ScriptResult<ScriptCompileResult> {
    let (code, map) = if ctx.options.source_map {
        let output = ctx
            .s
            .apply_with_map(ctx.filename)
            .map_err(|err| rewrite_error(&ctx, err))?;
        (output.code, output.map)
    } else {
        let code = ctx.s.apply().map_err(|err| rewrite_error(&ctx, err))?;
        (code, None)
    };

    let imports = ctx
        .imports()
        .map(|import| (import.local.clone(), import.clone()))
        .collect();
    Ok(ScriptCompileResult {
        code,
        map,
        bindings: ctx.bindings,
        imports,
        warnings: ctx.warnings,
    })
}
