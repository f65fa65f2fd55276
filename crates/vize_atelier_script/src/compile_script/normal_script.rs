//! The normal `<script>` block.
//!
//! Next to `<script setup>` its default export is rebound to `__default__`
//! and merged into the generated component. On its own the block is passed
//! through with its bindings analyzed.

use oxc_ast::ast::{
    ExportDefaultDeclaration, ExportNamedDeclaration, ExportSpecifier, Expression,
    ObjectPropertyKind, PropertyKey, Statement,
};
use oxc_span::GetSpan;
use tracing::{debug, trace};

use crate::error::ScriptResult;
use crate::script::{analyze_script_bindings, DeclarationClassifier, ScriptBlockAst, ScriptCompileContext};

use super::{finish, ScriptCompileResult, NORMAL_SCRIPT_DEFAULT_VAR};

fn default_specifier<'b, 'a>(export: &'b ExportNamedDeclaration<'a>) -> Option<&'b ExportSpecifier<'a>> {
    export
        .specifiers
        .iter()
        .find(|s| s.exported.name().as_str() == "default")
}

/// Whether the options object of a default export sets `name`.
fn declares_name(export: &ExportDefaultDeclaration<'_>) -> bool {
    let options = match export.declaration.as_expression() {
        Some(Expression::ObjectExpression(obj)) => Some(obj),
        Some(Expression::CallExpression(call)) => match call.arguments.first() {
            Some(arg) => match arg.as_expression() {
                Some(Expression::ObjectExpression(obj)) => Some(obj),
                _ => None,
            },
            None => None,
        },
        _ => None,
    };
    options.is_some_and(|obj| {
        obj.properties.iter().any(|prop| match prop {
            ObjectPropertyKind::ObjectProperty(p) => {
                !p.method && matches!(&p.key, PropertyKey::StaticIdentifier(id) if id.name.as_str() == "name")
            }
            ObjectPropertyKind::SpreadProperty(_) => false,
        })
    })
}

/// Remove a `default` export specifier, or the whole statement when it is
/// the only one.
fn remove_default_specifier(
    ctx: &mut ScriptCompileContext<'_>,
    script: ScriptBlockAst<'_>,
    export: &ExportNamedDeclaration<'_>,
    specifier: &ExportSpecifier<'_>,
) {
    let span = if export.specifiers.len() > 1 {
        specifier.span
    } else {
        export.span
    };
    let (start, end) = script.abs(span);
    ctx.s.remove(start, end);
}

/// Rebind the default export, record module bindings and move the block
/// in front of `<script setup>`.
pub(super) fn process_module_body(ctx: &mut ScriptCompileContext<'_>) {
    let Some(script) = ctx.script else {
        return;
    };

    for stmt in script.program.body.iter() {
        match stmt {
            Statement::ExportDefaultDeclaration(export) => {
                ctx.has_default_export = true;
                if declares_name(export) {
                    ctx.has_default_export_name = true;
                }
                let start = script.start + export.span.start as usize;
                let end = script.start + export.declaration.span().start as usize;
                ctx.s
                    .overwrite(start, end, format!("const {NORMAL_SCRIPT_DEFAULT_VAR} = "));
            }
            Statement::ExportNamedDeclaration(export) => {
                if let Some(specifier) = default_specifier(export) {
                    ctx.has_default_export = true;
                    remove_default_specifier(ctx, script, export, specifier);
                    let local = specifier.local.name();
                    match &export.source {
                        Some(source) => ctx.s.prepend(format!(
                            "import {{ {local} as {NORMAL_SCRIPT_DEFAULT_VAR} }} from '{}'\n",
                            source.value
                        )),
                        None => ctx.s.append_left(
                            script.end,
                            format!("\nconst {NORMAL_SCRIPT_DEFAULT_VAR} = {local}\n"),
                        ),
                    }
                }
                if let Some(decl) = &export.declaration {
                    let classifier = DeclarationClassifier {
                        aliases: &ctx.user_import_aliases,
                        literal_const: true,
                        props_destructure: false,
                    };
                    classifier.walk(decl, &mut ctx.script_bindings);
                }
            }
            _ => {
                if let Some(decl) = stmt.as_declaration() {
                    let classifier = DeclarationClassifier {
                        aliases: &ctx.user_import_aliases,
                        literal_const: true,
                        props_destructure: false,
                    };
                    classifier.walk(decl, &mut ctx.script_bindings);
                }
            }
        }
    }

    let setup_start = ctx.setup_offset();
    if script.start > setup_start {
        trace!("move <script> above <script setup>");
        ctx.s.append_left(script.end, "\n");
        ctx.s.move_range(script.start, script.end, 0);
    }
}

/// Compile a component that only has a normal `<script>`.
pub(super) fn compile_normal_script(
    mut ctx: ScriptCompileContext<'_>,
) -> ScriptResult<ScriptCompileResult> {
    let Some(script) = ctx.script else {
        return finish(ctx);
    };
    ctx.bindings = analyze_script_bindings(script.program);

    let options = ctx.options;
    if let Some(name) = options.gen_default_as.as_deref() {
        rewrite_default_export(&mut ctx, script, name);
    }
    ctx.s.remove(0, script.start);
    ctx.s.remove(script.end, ctx.source.len());

    debug!(bindings = ctx.bindings.bindings.len(), "compiled normal script");
    finish(ctx)
}

/// Turn the default export into `const <name> = ...`.
fn rewrite_default_export(ctx: &mut ScriptCompileContext<'_>, script: ScriptBlockAst<'_>, name: &str) {
    let mut found = false;
    for stmt in script.program.body.iter() {
        match stmt {
            Statement::ExportDefaultDeclaration(export) => {
                found = true;
                let start = script.start + export.span.start as usize;
                let end = script.start + export.declaration.span().start as usize;
                ctx.s.overwrite(start, end, format!("const {name} = "));
            }
            Statement::ExportNamedDeclaration(export) => {
                let Some(specifier) = default_specifier(export) else {
                    continue;
                };
                found = true;
                remove_default_specifier(ctx, script, export, specifier);
                let local = specifier.local.name();
                match &export.source {
                    Some(source) => {
                        ctx.s.prepend(format!(
                            "import {{ {local} as {NORMAL_SCRIPT_DEFAULT_VAR} }} from '{}'\n",
                            source.value
                        ));
                        ctx.s.append_left(
                            script.end,
                            format!("\nconst {name} = {NORMAL_SCRIPT_DEFAULT_VAR}"),
                        );
                    }
                    None => ctx
                        .s
                        .append_left(script.end, format!("\nconst {name} = {local}")),
                }
            }
            _ => {}
        }
    }
    if !found {
        ctx.s.append_left(script.end, format!("\nconst {name} = {{}}"));
    }
}
