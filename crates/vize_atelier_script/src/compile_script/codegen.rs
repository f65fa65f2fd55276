//! Component definition codegen.
//!
//! Wraps the rewritten setup code into `setup()`, generates the bindings
//! object it returns and the component options around it.

use oxc_span::GetSpan;
use tracing::trace;
use vize_carton::{to_json_string, FxHashSet};

use crate::error::ScriptResult;
use crate::script::{
    analyze_script_bindings, component_name_from_filename, gen_runtime_emits, gen_runtime_props,
    ImportBinding, ScriptCompileContext,
};
use crate::types::{BindingType, DEFAULT_FILENAME};

use super::NORMAL_SCRIPT_DEFAULT_VAR;

/// Remove everything in the document that is not script content.
pub(super) fn remove_non_script_content(ctx: &mut ScriptCompileContext<'_>) {
    let Some(setup) = ctx.script_setup else {
        return;
    };
    let len = ctx.source.len();
    match ctx.script {
        Some(script) if setup.start < script.start => {
            ctx.s.remove(0, setup.start);
            ctx.s.remove(setup.end, script.start);
            ctx.s.remove(script.end, len);
        }
        Some(script) => {
            ctx.s.remove(0, script.start);
            ctx.s.remove(script.end, setup.start);
            ctx.s.remove(setup.end, len);
        }
        None => {
            ctx.s.remove(0, setup.start);
            ctx.s.remove(setup.end, len);
        }
    }
}

/// Merge module, import and setup bindings into the binding metadata.
pub(super) fn collect_binding_metadata(ctx: &mut ScriptCompileContext<'_>) {
    if let Some(script) = ctx.script {
        let analyzed = analyze_script_bindings(script.program);
        for (name, binding_type) in analyzed.bindings {
            ctx.bindings.register(&name, binding_type);
        }
    }

    let runtime_module = ctx.options.runtime_module_name().to_string();
    let imports: Vec<(String, BindingType)> = ctx
        .imports()
        .filter(|import| !import.is_type)
        .map(|import| {
            let binding_type = if import.is_const_source(&runtime_module) {
                BindingType::SetupConst
            } else {
                BindingType::SetupMaybeRef
            };
            (import.local.clone(), binding_type)
        })
        .collect();
    for (name, binding_type) in imports {
        ctx.bindings.register(&name, binding_type);
    }

    for (name, binding_type) in ctx.script_bindings.iter() {
        ctx.bindings.register(name, binding_type);
    }
    for (name, binding_type) in ctx.setup_bindings.iter() {
        ctx.bindings.register(name, binding_type);
    }
    ctx.bindings.is_script_setup = true;
}

fn is_runtime_import(ctx: &ScriptCompileContext<'_>, import: &ImportBinding) -> bool {
    import.source == "vue"
        || import.source == ctx.options.runtime_module_name()
        || import.source.ends_with(".vue")
}

/// The object literal returned from `setup()`.
fn gen_returned_bindings(ctx: &ScriptCompileContext<'_>) -> String {
    let mut keys: Vec<&str> = Vec::new();
    let mut seen = FxHashSet::default();
    for (name, _) in ctx.script_bindings.iter().chain(ctx.setup_bindings.iter()) {
        if seen.insert(name) {
            keys.push(name);
        }
    }

    let mut entries = Vec::with_capacity(keys.len());
    for key in keys {
        if ctx.bindings.get(key) == Some(BindingType::SetupLet) {
            let set_arg = if key == "v" { "_v" } else { "v" };
            entries.push(format!(
                "get {key}() {{ return {key} }}, set {key}({set_arg}) {{ {key} = {set_arg} }}"
            ));
        } else {
            entries.push(key.to_string());
        }
    }
    for import in ctx.imports() {
        let key = import.local.as_str();
        if import.is_type || !import.is_used_in_template || seen.contains(key) {
            continue;
        }
        if is_runtime_import(ctx, import) {
            entries.push(key.to_string());
        } else {
            entries.push(format!("get {key}() {{ return {key} }}"));
        }
    }

    format!("{{ {} }}", entries.join(", "))
}

/// Generate the setup signature, the returned bindings and the component
/// options around `<script setup>`.
pub(super) fn generate_component(ctx: &mut ScriptCompileContext<'_>) -> ScriptResult<()> {
    let Some(setup) = ctx.script_setup else {
        return Ok(());
    };
    let (start_offset, end_offset) = (setup.start, setup.end);

    let mut args = String::from("__props");
    if ctx.props_type_decl.is_some() {
        args.push_str(": any");
    }

    if ctx.props_decl.is_some() {
        if let Some(call) = ctx.props_call {
            let (start, end) = ctx.setup_range(call.span);
            if ctx.props_destructure_rest_id.is_some() {
                let keys: Vec<String> = ctx
                    .props_destructured_bindings
                    .iter()
                    .map(|b| to_json_string(&b.key))
                    .collect();
                let helper = ctx.helper("createPropsRestProxy");
                ctx.s
                    .overwrite(start, end, format!("{helper}(__props, [{}])", keys.join(",")));
            } else if ctx.props_destructure_decl.is_none() {
                ctx.s.overwrite(start, end, "__props");
            }
        }
    }

    if ctx.has_await {
        let any = if ctx.is_ts { ": any" } else { "" };
        ctx.s
            .prepend_left(start_offset, format!("\nlet __temp{any}, __restore{any}\n"));
    }

    let mut destructure_elements = vec!["expose: __expose"];
    if ctx.emit_decl.is_some() {
        destructure_elements.push("emit: __emit");
    }
    args.push_str(&format!(", {{ {} }}", destructure_elements.join(", ")));

    let returned = gen_returned_bindings(ctx);
    ctx.s.append_right(
        end_offset,
        format!(
            "\nconst __returned__ = {returned}\nObject.defineProperty(__returned__, '__isScriptSetup', {{ enumerable: false, value: true }})\nreturn __returned__\n}}\n\n"
        ),
    );

    let gen_default_as = match &ctx.options.gen_default_as {
        Some(name) => format!("const {name} ="),
        None => "export default".to_string(),
    };

    let mut runtime_options = String::new();
    if !ctx.has_default_export_name && ctx.filename != DEFAULT_FILENAME {
        if let Some(name) = component_name_from_filename(ctx.filename) {
            runtime_options.push_str(&format!("\n  __name: '{name}',"));
        }
    }
    if let Some(props) = gen_runtime_props(ctx)? {
        runtime_options.push_str(&format!("\n  props: {props},"));
    }
    if let Some(emits) = gen_runtime_emits(ctx)? {
        runtime_options.push_str(&format!("\n  emits: {emits},"));
    }

    let defined_options = ctx
        .options_runtime_decl
        .map(|decl| ctx.setup_text(decl.span()).trim())
        .unwrap_or_default();
    let expose_call = if ctx.has_define_expose_call {
        ""
    } else {
        "  __expose();\n"
    };
    let async_prefix = if ctx.has_await { "async " } else { "" };
    let setup_fn = format!("{runtime_options}\n  {async_prefix}setup({args}) {{\n{expose_call}");

    if ctx.is_ts {
        let mut spread = String::new();
        if ctx.has_default_export {
            spread.push_str(&format!("\n  ...{NORMAL_SCRIPT_DEFAULT_VAR},"));
        }
        if !defined_options.is_empty() {
            spread.push_str(&format!("\n  ...{defined_options},"));
        }
        let define_component = ctx.helper("defineComponent");
        ctx.s.prepend_left(
            start_offset,
            format!("\n{gen_default_as} /*@__PURE__*/{define_component}({{{spread}{setup_fn}"),
        );
        ctx.s.append_right(end_offset, "})");
    } else if ctx.has_default_export || !defined_options.is_empty() {
        let mut targets = String::new();
        if ctx.has_default_export {
            targets.push_str(&format!("{NORMAL_SCRIPT_DEFAULT_VAR}, "));
        }
        if !defined_options.is_empty() {
            targets.push_str(&format!("{defined_options}, "));
        }
        ctx.s.prepend_left(
            start_offset,
            format!("\n{gen_default_as} /*@__PURE__*/Object.assign({targets}{{{setup_fn}"),
        );
        ctx.s.append_right(end_offset, "})");
    } else {
        ctx.s
            .prepend_left(start_offset, format!("\n{gen_default_as} {{{setup_fn}"));
        ctx.s.append_right(end_offset, "}");
    }

    if !ctx.helpers().is_empty() {
        let specifiers: Vec<String> = ctx
            .helpers()
            .iter()
            .map(|helper| format!("{helper} as _{helper}"))
            .collect();
        let source = match &ctx.options.runtime_module_name {
            Some(name) => to_json_string(name),
            None => "'vue'".to_string(),
        };
        trace!(helpers = specifiers.len(), "helper imports");
        ctx.s.prepend(format!(
            "import {{ {} }} from {source}\n",
            specifiers.join(", ")
        ));
    }
    Ok(())
}
