use crate::compile_script::compile_script;
use crate::error::ScriptErrorKind;
use crate::types::{BindingType, ScriptCompileOptions, SfcDescriptor};

fn compile(filename: &str, source: &str) -> super::ScriptCompileResult {
    compile_with(filename, source, &ScriptCompileOptions::default())
}

fn compile_with(
    filename: &str,
    source: &str,
    options: &ScriptCompileOptions,
) -> super::ScriptCompileResult {
    let descriptor = SfcDescriptor::from_source(filename, source);
    compile_script(&descriptor, options).unwrap()
}

fn compile_err(source: &str) -> crate::error::ScriptCompileError {
    let descriptor = SfcDescriptor::from_source("Comp.vue", source);
    compile_script(&descriptor, &ScriptCompileOptions::default()).unwrap_err()
}

#[test]
fn test_hoists_literal_const_and_names_component() {
    let result = compile("Hello.vue", "<script setup>\nconst msg = 'hi'\n</script>\n");
    assert_eq!(
        result.code,
        "const msg = 'hi'\n\nexport default {\n  __name: 'Hello',\n  setup(__props, { expose: __expose }) {\n  __expose();\n\n\nconst __returned__ = { msg }\nObject.defineProperty(__returned__, '__isScriptSetup', { enumerable: false, value: true })\nreturn __returned__\n}\n\n}"
    );
    assert_eq!(result.bindings.get("msg"), Some(BindingType::LiteralConst));
    assert!(result.bindings.is_script_setup);
    assert!(result.map.is_none());
}

#[test]
fn test_anonymous_component_has_no_name() {
    let result = compile("anonymous.vue", "<script setup>\nconst a = 1\n</script>");
    assert!(!result.code.contains("__name"));
}

#[test]
fn test_setup_let_is_exposed_through_accessors() {
    let result = compile("Comp.vue", "<script setup>\nlet count = 0\n</script>");
    assert!(result
        .code
        .contains("get count() { return count }, set count(v) { count = v }"));
    assert_eq!(result.bindings.get("count"), Some(BindingType::SetupLet));
}

#[test]
fn test_type_based_props() {
    let source = "<script setup lang=\"ts\">\nconst props = defineProps<{ msg: string; count?: number }>()\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result
        .code
        .starts_with("import { defineComponent as _defineComponent } from 'vue'\n"));
    assert!(result.code.contains(
        "props: {\n    msg: { type: String, required: true },\n    count: { type: Number, required: false }\n  },"
    ));
    assert!(result.code.contains("setup(__props: any, { expose: __expose }) {"));
    assert!(result.code.contains("const props = __props"));
    assert!(result.code.contains("export default /*@__PURE__*/_defineComponent({"));
    assert!(result.code.ends_with("})"));
    assert_eq!(result.bindings.get("msg"), Some(BindingType::Props));
    assert_eq!(result.bindings.get("count"), Some(BindingType::Props));
    assert_eq!(
        result.bindings.get("props"),
        Some(BindingType::SetupReactiveConst)
    );
}

#[test]
fn test_with_defaults_inlines_static_defaults() {
    let source = "<script setup lang=\"ts\">\nwithDefaults(defineProps<{ msg?: string }>(), { msg: 'hi' })\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result
        .code
        .contains("msg: { type: String, required: false, default: 'hi' }"));
    assert!(!result.code.contains("withDefaults"));
}

#[test]
fn test_interface_props_with_extends() {
    let source = "<script setup lang=\"ts\">\ninterface Base { id: number }\ninterface Props extends Base { name?: string }\ndefineProps<Props>()\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result.code.contains("id: { type: Number, required: true }"));
    assert!(result.code.contains("name: { type: String, required: false }"));
    // interfaces are moved out of setup()
    let setup_at = result.code.find("setup(").unwrap();
    let interface_at = result.code.find("interface Props").unwrap();
    assert!(interface_at < setup_at);
}

#[test]
fn test_destructured_props_are_rewritten() {
    let source = "<script setup>\nconst { foo, bar: baz = 1 } = defineProps(['foo', 'bar'])\nconsole.log(foo, baz)\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result.code.contains("console.log(__props.foo, __props.bar)"));
    assert!(result.code.contains(
        "props: /*@__PURE__*/_mergeDefaults(['foo', 'bar'], {\n  bar: 1\n}),"
    ));
    assert!(result
        .code
        .starts_with("import { mergeDefaults as _mergeDefaults } from 'vue'\n"));
    assert!(!result.code.contains("defineProps"));
    assert_eq!(result.bindings.get("foo"), Some(BindingType::Props));
    assert_eq!(result.bindings.get("baz"), Some(BindingType::PropsAliased));
    assert_eq!(
        result.bindings.props_aliases.get("baz").map(String::as_str),
        Some("bar")
    );
}

#[test]
fn test_props_rest_uses_rest_proxy() {
    let source = "<script setup>\nconst { a, ...rest } = defineProps(['a', 'b'])\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result
        .code
        .contains("const { a, ...rest } = _createPropsRestProxy(__props, [\"a\"])"));
    assert_eq!(
        result.bindings.get("rest"),
        Some(BindingType::SetupReactiveConst)
    );
}

#[test]
fn test_destructure_default_type_mismatch() {
    let source = "<script setup lang=\"ts\">\nconst { count = 'zero' } = defineProps<{ count?: number }>()\n</script>";
    let err = compile_err(source);
    assert_eq!(err.kind, ScriptErrorKind::MacroProtocol);
    assert!(err.message.contains("does not match declared type"));
}

#[test]
fn test_duplicate_define_props() {
    let err = compile_err("<script setup>\ndefineProps(['a'])\ndefineProps(['b'])\n</script>");
    assert_eq!(err.kind, ScriptErrorKind::MacroProtocol);
    assert_eq!(err.message, "duplicate defineProps() call");
    assert!(err.span.is_some());
}

#[test]
fn test_type_based_emits() {
    let source = "<script setup lang=\"ts\">\nconst emit = defineEmits<{ (e: 'change', id: number): void; (e: 'update', value: string): void }>()\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result.code.contains("emits: [\"change\", \"update\"],"));
    assert!(result.code.contains("const emit = __emit"));
    assert!(result
        .code
        .contains("setup(__props, { expose: __expose, emit: __emit }) {"));
}

#[test]
fn test_define_model() {
    let source = "<script setup>\nconst model = defineModel()\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result
        .code
        .contains("const model = _useModel(__props, \"modelValue\")"));
    assert!(result
        .code
        .contains("props: {\n    \"modelValue\": {},\n    \"modelModifiers\": {},\n  },"));
    assert!(result.code.contains("emits: [\"update:modelValue\"],"));
    assert_eq!(result.bindings.get("modelValue"), Some(BindingType::Props));
    assert_eq!(result.bindings.get("model"), Some(BindingType::SetupRef));
}

#[test]
fn test_define_expose_replaces_default_expose() {
    let source = "<script setup>\ndefineExpose({ a: 1 })\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result.code.contains("__expose({ a: 1 })"));
    assert!(!result.code.contains("__expose();"));
}

#[test]
fn test_define_options_merged_into_component() {
    let source = "<script setup>\ndefineOptions({ inheritAttrs: false })\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result
        .code
        .contains("export default /*@__PURE__*/Object.assign({ inheritAttrs: false }, {"));
}

#[test]
fn test_define_options_cannot_be_assigned() {
    let err = compile_err("<script setup>\nconst o = defineOptions({ name: 'X' })\n</script>");
    assert_eq!(err.kind, ScriptErrorKind::MacroProtocol);
    assert!(err.message.contains("has no returning value"));
}

#[test]
fn test_top_level_await() {
    let source = "<script setup>\nconst data = await fetchData()\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result.code.contains("async setup(__props, { expose: __expose }) {"));
    assert!(result.code.contains("let __temp, __restore"));
    assert!(result.code.contains(
        "const data = (\n  ([__temp,__restore] = _withAsyncContext(() => fetchData())),\n  __temp = await __temp,\n  __restore(),\n  __temp\n)"
    ));
    assert!(result
        .code
        .starts_with("import { withAsyncContext as _withAsyncContext } from 'vue'\n"));
}

#[test]
fn test_await_inside_function_is_untouched() {
    let source = "<script setup>\nasync function load() { await fetchData() }\n</script>";
    let result = compile("Comp.vue", source);
    assert!(!result.code.contains("_withAsyncContext"));
    assert!(!result.code.contains("async setup"));
}

#[test]
fn test_macro_import_warns_and_is_removed() {
    let source = "<script setup>\nimport { defineProps, ref } from 'vue'\nconst props = defineProps(['a'])\nconst c = ref(1)\n</script>";
    let result = compile("Comp.vue", source);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("`defineProps` is a compiler macro"));
    assert!(result.code.starts_with("import { ref } from 'vue'"));
    assert_eq!(result.bindings.get("c"), Some(BindingType::SetupRef));
    assert_eq!(result.bindings.get("ref"), Some(BindingType::SetupConst));
    assert!(result.imports.contains_key("ref"));
    assert!(!result.imports.contains_key("defineProps"));
    assert!(result.code.contains("const __returned__ = { props, c, ref }"));
}

#[test]
fn test_non_runtime_import_is_exposed_through_getter() {
    let source = "<script setup>\nimport { helper } from './utils'\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result.code.contains("get helper() { return helper }"));
    assert_eq!(result.bindings.get("helper"), Some(BindingType::SetupMaybeRef));
}

#[test]
fn test_unused_ts_import_is_not_exposed() {
    let options = ScriptCompileOptions {
        template_used_identifiers: Some(["Used".to_string()].into_iter().collect()),
        ..Default::default()
    };
    let source = "<script setup lang=\"ts\">\nimport { Used, Unused } from './lib'\n</script>";
    let result = compile_with("Comp.vue", source, &options);
    assert!(result.code.contains("get Used() { return Used }"));
    assert!(!result.code.contains("get Unused()"));
}

#[test]
fn test_setup_export_is_rejected() {
    let err = compile_err("<script setup>\nexport const a = 1\n</script>");
    assert_eq!(err.kind, ScriptErrorKind::InvalidInput);
    assert!(err
        .message
        .starts_with("<script setup> cannot contain ES module exports."));
}

#[test]
fn test_macro_cannot_reference_setup_scope() {
    let err = compile_err(
        "<script setup>\nconst n = foo()\ndefineProps({ a: { default: n } })\n</script>",
    );
    assert_eq!(err.kind, ScriptErrorKind::MacroProtocol);
    assert!(err
        .message
        .contains("cannot reference locally declared variables"));

    let descriptor = SfcDescriptor::from_source(
        "Comp.vue",
        "<script setup>\nconst n = 1\ndefineProps({ a: { default: n } })\n</script>",
    );
    assert!(compile_script(&descriptor, &ScriptCompileOptions::default()).is_ok());
}

#[test]
fn test_no_script_blocks() {
    let err = compile_err("<template><div /></template>");
    assert_eq!(err.kind, ScriptErrorKind::InvalidInput);
    assert_eq!(err.message, "SFC contains no <script> tags.");
}

#[test]
fn test_language_mismatch() {
    let err = compile_err(
        "<script lang=\"ts\">\nexport default {}\n</script>\n<script setup>\nconst a = 1\n</script>",
    );
    assert_eq!(err.kind, ScriptErrorKind::InvalidInput);
    assert_eq!(
        err.message,
        "<script> and <script setup> must have the same language type."
    );
}

#[test]
fn test_normal_script_with_setup() {
    let source = "<script>\nexport default { name: 'Custom' }\n</script>\n<script setup>\nconst count = 1\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result.code.contains("const __default__ = { name: 'Custom' }"));
    assert!(result
        .code
        .contains("export default /*@__PURE__*/Object.assign(__default__, {"));
    assert!(!result.code.contains("__name"));
    // no hoisting next to a normal script
    assert_eq!(result.bindings.get("count"), Some(BindingType::SetupConst));
}

#[test]
fn test_normal_script_after_setup_is_moved_first() {
    let source = "<script setup>\nconst a = 1\n</script>\n<script>\nexport const shared = 1\n</script>";
    let result = compile("Comp.vue", source);
    let shared_at = result.code.find("export const shared = 1").unwrap();
    let setup_at = result.code.find("setup(").unwrap();
    assert!(shared_at < setup_at);
    assert_eq!(result.bindings.get("shared"), Some(BindingType::LiteralConst));
}

#[test]
fn test_normal_script_only() {
    let options = ScriptCompileOptions {
        gen_default_as: Some("_sfc_main".to_string()),
        ..Default::default()
    };
    let source = "<script>\nexport default { name: 'Foo', props: ['a'] }\n</script>";
    let result = compile_with("Comp.vue", source, &options);
    assert!(result
        .code
        .contains("const _sfc_main = { name: 'Foo', props: ['a'] }"));
    assert!(!result.code.contains("<script>"));
    assert_eq!(result.bindings.get("a"), Some(BindingType::Props));
    assert!(!result.bindings.is_script_setup);
}

#[test]
fn test_normal_script_without_default_export() {
    let options = ScriptCompileOptions {
        gen_default_as: Some("_sfc_main".to_string()),
        ..Default::default()
    };
    let result = compile_with(
        "Comp.vue",
        "<script>\nexport const x = 1\n</script>",
        &options,
    );
    assert!(result.code.contains("const _sfc_main = {}"));
}

#[test]
fn test_gen_default_as_with_setup() {
    let options = ScriptCompileOptions {
        gen_default_as: Some("_sfc_main".to_string()),
        ..Default::default()
    };
    let result = compile_with("Comp.vue", "<script setup>\nconst a = 1\n</script>", &options);
    assert!(result.code.contains("const _sfc_main = {"));
    assert!(!result.code.contains("export default"));
}

#[test]
fn test_runtime_module_name() {
    let options = ScriptCompileOptions {
        runtime_module_name: Some("@vue/runtime-dom".to_string()),
        ..Default::default()
    };
    let source = "<script setup lang=\"ts\">\nconst a = 1\n</script>";
    let result = compile_with("Comp.vue", source, &options);
    assert!(result
        .code
        .starts_with("import { defineComponent as _defineComponent } from \"@vue/runtime-dom\"\n"));
}

#[test]
fn test_source_map() {
    let options = ScriptCompileOptions {
        source_map: true,
        ..Default::default()
    };
    let result = compile_with("Hello.vue", "<script setup>\nconst msg = 'hi'\n</script>\n", &options);
    let map = result.map.expect("source map requested");
    assert_eq!(map.version, 3);
    assert_eq!(map.sources, vec!["Hello.vue".to_string()]);
    assert!(!map.mappings.is_empty());
}

#[test]
fn test_binding_table() {
    let source = "<script setup>\nimport { ref, computed } from 'vue'\nconst props = defineProps(['title'])\nconst count = ref(0)\nconst double = computed(() => count.value * 2)\nconst state = { n: 1 }\nlet mutable = 1\nfunction inc() {}\nconst label = 'x'\n</script>";
    let result = compile("Comp.vue", source);
    let mut rows: Vec<String> = result
        .bindings
        .bindings
        .iter()
        .map(|(name, kind)| format!("{name}: {}", kind.as_str()))
        .collect();
    rows.sort();
    insta::assert_snapshot!(rows.join("\n"), @r"
    computed: setup-const
    count: setup-ref
    double: setup-ref
    inc: setup-const
    label: literal-const
    mutable: setup-let
    props: setup-reactive-const
    ref: setup-const
    state: setup-const
    title: props
    ");
}

#[test]
fn test_duplicate_define_options_in_any_order() {
    for source in [
        "<script setup>\ndefineOptions()\ndefineOptions({ name: 'x' })\n</script>",
        "<script setup>\ndefineOptions({ name: 'x' })\ndefineOptions()\n</script>",
        "<script setup>\ndefineOptions()\ndefineOptions()\n</script>",
    ] {
        let err = compile_err(source);
        assert_eq!(err.kind, ScriptErrorKind::MacroProtocol, "{source}");
        assert_eq!(err.message, "duplicate defineOptions() call", "{source}");
    }
}

#[test]
fn test_duplicate_define_expose_and_slots() {
    let err = compile_err("<script setup>\ndefineExpose({ a: 1 })\ndefineExpose()\n</script>");
    assert_eq!(err.message, "duplicate defineExpose() call");

    let err = compile_err("<script setup>\nconst s = defineSlots()\ndefineSlots()\n</script>");
    assert_eq!(err.message, "duplicate defineSlots() call");
}

#[test]
fn test_with_defaults_and_destructure_defaults_conflict() {
    let source = "<script setup lang=\"ts\">\nconst { msg = 'x' } = withDefaults(defineProps<{ msg?: string }>(), { msg: 'y' })\n</script>";
    let err = compile_err(source);
    assert_eq!(err.kind, ScriptErrorKind::MacroProtocol);
    assert!(err
        .message
        .contains("cannot be combined with destructure default values"));
}

#[test]
fn test_emits_type_cannot_mix_call_and_property_syntax() {
    let source = "<script setup lang=\"ts\">\ndefineEmits<{ (e: 'change'): void; update: [value: string] }>()\n</script>";
    let err = compile_err(source);
    assert_eq!(err.kind, ScriptErrorKind::MacroProtocol);
    assert!(err
        .message
        .contains("cannot mixed call signature and property syntax"));
}

#[test]
fn test_props_destructure_rejects_computed_and_nested_patterns() {
    let err = compile_err("<script setup>\nconst { [key]: a } = defineProps(['a'])\n</script>");
    assert_eq!(err.kind, ScriptErrorKind::MacroProtocol);
    assert_eq!(err.message, "defineProps() destructure cannot use computed key.");

    let err = compile_err("<script setup>\nconst { a: { b } } = defineProps(['a'])\n</script>");
    assert_eq!(err.kind, ScriptErrorKind::MacroProtocol);
    assert_eq!(
        err.message,
        "defineProps() destructure does not support nested patterns."
    );
}

#[test]
fn test_production_props_are_pruned() {
    let options = ScriptCompileOptions {
        is_prod: true,
        ..Default::default()
    };
    let source = "<script setup lang=\"ts\">\nwithDefaults(defineProps<{ flag?: boolean; cb?: () => void; msg: string }>(), { flag: false, cb: () => {} })\n</script>";
    let result = compile_with("Comp.vue", source, &options);
    assert!(result.code.contains(
        "props: {\n    flag: { type: Boolean, default: false },\n    cb: { type: Function, default: () => {} },\n    msg: {}\n  },"
    ));
    assert!(!result.code.contains("required"));
}

#[test]
fn test_custom_runtime_module_imports_are_const() {
    let options = ScriptCompileOptions {
        runtime_module_name: Some("@vue/runtime-dom".to_string()),
        ..Default::default()
    };
    let source = "<script setup>\nimport { h } from '@vue/runtime-dom'\nimport { helper } from './utils'\n</script>";
    let result = compile_with("Comp.vue", source, &options);
    assert_eq!(result.bindings.get("h"), Some(BindingType::SetupConst));
    assert_eq!(result.bindings.get("helper"), Some(BindingType::SetupMaybeRef));
}

#[test]
fn test_ambient_enum_and_class_are_hoisted() {
    let source = "<script setup lang=\"ts\">\nconst a = foo()\ndeclare enum Dir { Up }\ndeclare class Shape {}\n</script>";
    let result = compile("Comp.vue", source);
    let setup_at = result.code.find("setup(").unwrap();
    assert!(result.code.find("declare enum Dir").unwrap() < setup_at);
    assert!(result.code.find("declare class Shape").unwrap() < setup_at);
    assert_eq!(result.bindings.get("Dir"), None);
    assert_eq!(result.bindings.get("Shape"), None);
}

#[test]
fn test_destructured_props_in_jsx() {
    let source = "<script setup lang=\"tsx\">\nconst { msg } = defineProps(['msg'])\nconst el = <div title={msg}>{msg}</div>\n</script>";
    let result = compile("Comp.vue", source);
    assert!(result
        .code
        .contains("const el = <div title={__props.msg}>{__props.msg}</div>"));
}
