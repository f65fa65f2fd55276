//! Import processing.
//!
//! Imports of both blocks are recorded for binding analysis. Imports of
//! `<script setup>` are hoisted to the top of the module, deduplicated
//! against earlier imports and stripped of compiler macros.

use oxc_ast::ast::{ImportDeclaration, ImportDeclarationSpecifier, Statement};
use oxc_span::GetSpan;
use tracing::trace;

use crate::error::{ScriptErrorKind, ScriptResult};
use crate::script::{ImportBinding, ScriptCompileContext, COMPILER_MACROS};

use super::hoist_setup_node;

/// Name a specifier imports: `default`, `*` for namespaces, or the export name.
pub fn imported_name(specifier: &ImportDeclarationSpecifier<'_>) -> String {
    match specifier {
        ImportDeclarationSpecifier::ImportSpecifier(s) => s.imported.name().to_string(),
        ImportDeclarationSpecifier::ImportDefaultSpecifier(_) => "default".to_string(),
        ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => "*".to_string(),
    }
}

fn local_name<'a>(specifier: &ImportDeclarationSpecifier<'a>) -> &'a str {
    match specifier {
        ImportDeclarationSpecifier::ImportSpecifier(s) => s.local.name.as_str(),
        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => s.local.name.as_str(),
        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => s.local.name.as_str(),
    }
}

/// Whether the specifier only imports a type.
pub fn is_type_import(decl: &ImportDeclaration<'_>, specifier: &ImportDeclarationSpecifier<'_>) -> bool {
    decl.import_kind.is_type()
        || matches!(specifier, ImportDeclarationSpecifier::ImportSpecifier(s) if s.import_kind.is_type())
}

fn is_runtime_source(ctx: &ScriptCompileContext<'_>, source: &str) -> bool {
    source == "vue" || source == ctx.options.runtime_module_name()
}

fn import_binding(
    ctx: &ScriptCompileContext<'_>,
    decl: &ImportDeclaration<'_>,
    specifier: &ImportDeclarationSpecifier<'_>,
    is_from_setup: bool,
) -> ImportBinding {
    let local = local_name(specifier);
    let is_used_in_template = match &ctx.options.template_used_identifiers {
        Some(used) if ctx.is_ts => used.contains(local),
        _ => true,
    };
    ImportBinding {
        is_type: is_type_import(decl, specifier),
        imported: imported_name(specifier),
        local: local.to_string(),
        source: decl.source.value.to_string(),
        is_from_setup,
        is_used_in_template,
    }
}

/// Record the imports of the module script.
pub(super) fn register_module_imports(ctx: &mut ScriptCompileContext<'_>) {
    let Some(script) = ctx.script else {
        return;
    };
    for stmt in script.program.body.iter() {
        let Statement::ImportDeclaration(decl) = stmt else {
            continue;
        };
        let Some(specifiers) = &decl.specifiers else {
            continue;
        };
        for specifier in specifiers.iter() {
            let import = import_binding(ctx, decl, specifier, false);
            ctx.register_user_import(import);
        }
    }
}

/// Hoist, deduplicate and record the imports of `<script setup>`.
pub(super) fn process_setup_imports(ctx: &mut ScriptCompileContext<'_>) -> ScriptResult<()> {
    let Some(setup) = ctx.script_setup else {
        return Ok(());
    };
    let offset = setup.start;

    for stmt in setup.program.body.iter() {
        let Statement::ImportDeclaration(decl) = stmt else {
            continue;
        };
        hoist_setup_node(ctx, decl.span);

        let Some(specifiers) = &decl.specifiers else {
            continue;
        };
        let source = decl.source.value.as_str();
        let mut removed = 0;

        for (i, specifier) in specifiers.iter().enumerate() {
            let local = local_name(specifier);
            let imported = imported_name(specifier);

            if is_runtime_source(ctx, source) && COMPILER_MACROS.contains(&imported.as_str()) {
                if local != imported {
                    return Err(ctx.setup_error(
                        ScriptErrorKind::MacroProtocol,
                        format!(
                            "`{imported}` is a compiler macro and cannot be aliased to a different name."
                        ),
                        specifier.span(),
                    ));
                }
                ctx.warn(format!(
                    "`{imported}` is a compiler macro and no longer needs to be imported."
                ));
                remove_specifier(ctx, specifiers, i, &mut removed, offset);
            } else if let Some(existing) = ctx.user_imports.get(local) {
                if existing.source != source || existing.imported != imported {
                    return Err(ctx.setup_error(
                        ScriptErrorKind::InvalidInput,
                        "different imports aliased to same local name.",
                        specifier.span(),
                    ));
                }
                trace!(local, source, "dedupe import");
                remove_specifier(ctx, specifiers, i, &mut removed, offset);
            } else {
                let import = import_binding(ctx, decl, specifier, true);
                ctx.register_user_import(import);
            }
        }

        if !specifiers.is_empty() && removed == specifiers.len() {
            let (start, end) = ctx.setup_range(decl.span);
            ctx.s.remove(start, end);
        }
    }
    Ok(())
}

/// Remove the `i`-th specifier together with the comma that separates it
/// from a kept neighbour.
fn remove_specifier(
    ctx: &mut ScriptCompileContext<'_>,
    specifiers: &[ImportDeclarationSpecifier<'_>],
    i: usize,
    removed: &mut usize,
    offset: usize,
) {
    let remove_left = i > *removed;
    *removed += 1;
    let current = specifiers[i].span();
    let start = if remove_left {
        specifiers[i - 1].span().end
    } else {
        current.start
    };
    let end = match specifiers.get(i + 1) {
        Some(next) if !remove_left => next.span().start,
        _ => current.end,
    };
    ctx.s.remove(offset + start as usize, offset + end as usize);
}
