//! Input, option and binding type definitions.
//!
//! Zero-copy design using borrowed strings for the descriptor blocks.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use vize_carton::{FxHashMap, FxHashSet};

static SCRIPT_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<script\b([^>]*)>").expect("valid script tag regex"));
static LANG_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\blang\s*=\s*["']([^"']+)["']"#).expect("valid lang regex"));
static SETUP_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|\s)setup(\s|=|$)").expect("valid setup regex"));

/// The script blocks of a single-file component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SfcDescriptor<'a> {
    /// Filename
    #[serde(borrow)]
    pub filename: Cow<'a, str>,

    /// Whole document source. Block locations are offsets into this string.
    #[serde(borrow)]
    pub source: Cow<'a, str>,

    /// Script block (options API or <script> without setup)
    pub script: Option<SfcScriptBlock<'a>>,

    /// Script setup block
    pub script_setup: Option<SfcScriptBlock<'a>>,
}

impl<'a> Default for SfcDescriptor<'a> {
    fn default() -> Self {
        Self {
            filename: Cow::Borrowed(DEFAULT_FILENAME),
            source: Cow::Borrowed(""),
            script: None,
            script_setup: None,
        }
    }
}

pub const DEFAULT_FILENAME: &str = "anonymous.vue";

impl<'a> SfcDescriptor<'a> {
    /// Locate the `<script>` and `<script setup>` blocks of a document.
    ///
    /// Only script tags are recognized; template and style blocks are left to
    /// the host's SFC parser.
    pub fn from_source(filename: &'a str, source: &'a str) -> Self {
        let mut descriptor = Self {
            filename: Cow::Borrowed(filename),
            source: Cow::Borrowed(source),
            script: None,
            script_setup: None,
        };

        let mut search_from = 0;
        while let Some(open) = SCRIPT_OPEN_RE.captures_at(source, search_from) {
            let (Some(whole), Some(attrs)) = (open.get(0), open.get(1)) else {
                break;
            };
            let content_start = whole.end();
            let Some(close) = source[content_start..].find("</script>") else {
                break;
            };
            let content_end = content_start + close;
            search_from = content_end + "</script>".len();

            let attrs = attrs.as_str();
            let setup = SETUP_ATTR_RE.is_match(attrs);
            let block = SfcScriptBlock {
                content: Cow::Borrowed(&source[content_start..content_end]),
                loc: BlockLocation::new(content_start, content_end),
                lang: LANG_ATTR_RE
                    .captures(attrs)
                    .and_then(|c| c.get(1))
                    .map(|m| Cow::Borrowed(m.as_str())),
                setup,
            };
            if setup {
                descriptor.script_setup = Some(block);
            } else {
                descriptor.script = Some(block);
            }
        }

        descriptor
    }
}

/// Script block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SfcScriptBlock<'a> {
    /// Block content
    #[serde(borrow)]
    pub content: Cow<'a, str>,

    /// Location of the content in the document source
    pub loc: BlockLocation,

    /// Script language (js/ts/jsx/tsx)
    #[serde(default, borrow)]
    pub lang: Option<Cow<'a, str>>,

    /// Whether this is script setup
    #[serde(default)]
    pub setup: bool,
}

impl<'a> SfcScriptBlock<'a> {
    /// Language tag, defaulting to `js`.
    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or("js")
    }

    pub fn is_ts(&self) -> bool {
        matches!(self.lang(), "ts" | "tsx")
    }

    pub fn is_jsx(&self) -> bool {
        matches!(self.lang(), "jsx" | "tsx")
    }
}

/// Location information for a block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLocation {
    /// Start offset in source
    pub start: usize,

    /// End offset in source
    pub end: usize,
}

impl BlockLocation {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Script compile options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptCompileOptions {
    /// Production mode drops runtime prop checks that have no runtime effect
    pub is_prod: bool,

    /// Generate a source map
    pub source_map: bool,

    /// Emit `const <name> =` instead of `export default`
    pub gen_default_as: Option<String>,

    /// Hoist literal constants of <script setup> to module scope
    pub hoist_static: bool,

    /// Props destructure
    pub props_destructure: PropsDestructure,

    /// Module the runtime helpers are imported from
    pub runtime_module_name: Option<String>,

    /// Identifiers referenced by the template. When present (TS only), imports
    /// that the template does not use are not exposed from setup.
    pub template_used_identifiers: Option<FxHashSet<String>>,
}

impl Default for ScriptCompileOptions {
    fn default() -> Self {
        Self {
            is_prod: false,
            source_map: false,
            gen_default_as: None,
            hoist_static: true,
            props_destructure: PropsDestructure::Enabled,
            runtime_module_name: None,
            template_used_identifiers: None,
        }
    }
}

impl ScriptCompileOptions {
    pub fn runtime_module_name(&self) -> &str {
        self.runtime_module_name.as_deref().unwrap_or("vue")
    }
}

/// Props destructure mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropsDestructure {
    /// Destructured props are reactive and compiled to `__props` accesses
    #[default]
    Enabled,
    /// Destructuring is a plain one-time read of the props object
    Disabled,
    /// Destructuring `defineProps()` is a compile error
    Error,
}

/// Binding metadata from script setup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingMetadata {
    /// Top-level bindings with their types
    pub bindings: FxHashMap<String, BindingType>,

    /// Props aliases (local name -> prop key)
    /// For destructured props with aliases like: const { foo: bar } = defineProps()
    /// This maps "bar" -> "foo"
    pub props_aliases: FxHashMap<String, String>,

    /// Whether these bindings are from script setup
    /// If false, components/directives won't be resolved from these bindings
    pub is_script_setup: bool,
}

impl BindingMetadata {
    pub fn get(&self, name: &str) -> Option<BindingType> {
        self.bindings.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Set the binding type of `name` unless an existing `props`/`ref` kind
    /// would be downgraded.
    pub fn register(&mut self, name: &str, binding_type: BindingType) {
        match self.bindings.get(name) {
            Some(existing) if existing.is_sticky() && *existing != binding_type => {}
            _ => {
                self.bindings.insert(name.to_string(), binding_type);
            }
        }
    }

    /// Register `name` only if it is not yet known.
    pub fn register_if_absent(&mut self, name: &str, binding_type: BindingType) {
        self.bindings
            .entry(name.to_string())
            .or_insert(binding_type);
    }
}

/// Binding type of a top-level identifier.
///
/// Optimized with `#[repr(u8)]` for minimal memory footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum BindingType {
    /// Variable declared with let in setup
    SetupLet = 0,
    /// Const binding that may be a ref
    SetupMaybeRef = 1,
    /// Const binding that is definitely a ref
    SetupRef = 2,
    /// Reactive const binding (reactive(), defineProps())
    SetupReactiveConst = 3,
    /// Const binding (functions, classes, non-reactive values)
    SetupConst = 4,
    /// Binding from props
    Props = 5,
    /// Binding from props with alias
    PropsAliased = 6,
    /// Data binding from data()
    Data = 7,
    /// Options API binding (computed, methods, inject)
    Options = 8,
    /// Literal constant (string, number, boolean literals)
    LiteralConst = 9,
}

impl BindingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetupLet => "setup-let",
            Self::SetupMaybeRef => "setup-maybe-ref",
            Self::SetupRef => "setup-ref",
            Self::SetupReactiveConst => "setup-reactive-const",
            Self::SetupConst => "setup-const",
            Self::Props => "props",
            Self::PropsAliased => "props-aliased",
            Self::Data => "data",
            Self::Options => "options",
            Self::LiteralConst => "literal-const",
        }
    }

    /// Kinds that later classification passes must not overwrite.
    #[inline]
    pub fn is_sticky(self) -> bool {
        matches!(self, Self::Props | Self::PropsAliased | Self::SetupRef)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_source_locates_blocks() {
        let source = "<template><div/></template>\n<script lang=\"ts\">\nexport default {}\n</script>\n<script setup lang=\"ts\">\nconst a = 1\n</script>\n";
        let descriptor = SfcDescriptor::from_source("Comp.vue", source);

        let script = descriptor.script.as_ref().unwrap();
        assert_eq!(script.content, "\nexport default {}\n");
        assert_eq!(&source[script.loc.start..script.loc.end], script.content);
        assert!(script.is_ts());
        assert!(!script.setup);

        let setup = descriptor.script_setup.as_ref().unwrap();
        assert_eq!(setup.content, "\nconst a = 1\n");
        assert!(setup.setup);
        assert_eq!(setup.lang(), "ts");
    }

    #[test]
    fn test_from_source_defaults_to_js() {
        let descriptor = SfcDescriptor::from_source("A.vue", "<script setup>\n</script>");
        let setup = descriptor.script_setup.unwrap();
        assert_eq!(setup.lang(), "js");
        assert!(!setup.is_ts());
        assert!(descriptor.script.is_none());
    }

    #[test]
    fn test_binding_metadata_never_downgrades_props() {
        let mut bindings = BindingMetadata::default();
        bindings.register("foo", BindingType::Props);
        bindings.register("foo", BindingType::SetupMaybeRef);
        assert_eq!(bindings.get("foo"), Some(BindingType::Props));

        bindings.register("bar", BindingType::SetupLet);
        bindings.register("bar", BindingType::SetupConst);
        assert_eq!(bindings.get("bar"), Some(BindingType::SetupConst));
    }

    #[test]
    fn test_binding_type_serializes_kebab_case() {
        let json = serde_json::to_string(&BindingType::SetupReactiveConst).unwrap();
        assert_eq!(json, "\"setup-reactive-const\"");
        assert_eq!(BindingType::LiteralConst.as_str(), "literal-const");
    }

    #[test]
    fn test_options_from_toml() {
        let options: ScriptCompileOptions = toml::from_str(
            r#"
isProd = true
genDefaultAs = "_sfc_main"
propsDestructure = "error"
"#,
        )
        .unwrap();
        assert!(options.is_prod);
        assert!(options.hoist_static);
        assert_eq!(options.gen_default_as.as_deref(), Some("_sfc_main"));
        assert_eq!(options.props_destructure, PropsDestructure::Error);
        assert_eq!(options.runtime_module_name(), "vue");
    }
}
