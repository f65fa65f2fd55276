//! Type resolution for macro type arguments.
//!
//! Resolves type references against the type declarations of both script
//! blocks, flattens object-shaped types into their members and infers the
//! runtime constructor tags used by runtime prop declarations.

use std::fmt;

use oxc_ast::ast::{
    Declaration, Expression, FormalParameters, Program, Statement, TSEnumDeclaration,
    TSFunctionType, TSInterfaceDeclaration, TSLiteral, TSSignature, TSType, TSTypeAliasDeclaration,
    TSTypeLiteral, TSTypeName, TSTypeOperatorOperator, TSTypeReference,
};
use oxc_span::{GetSpan, Span};
use phf::phf_map;
use serde::Serialize;
use vize_carton::{smallvec, FxHashMap, SmallVec};

use super::utils::resolve_object_key;

/// Which block a type declaration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeOrigin {
    Setup,
    Module,
}

#[derive(Debug, Clone, Copy)]
enum TypeDecl<'a> {
    Alias(&'a TSTypeAliasDeclaration<'a>),
    Interface(&'a TSInterfaceDeclaration<'a>),
    Enum(&'a TSEnumDeclaration<'a>),
}

/// Failure to resolve a type argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeResolveError {
    pub message: String,
    pub span: Span,
    pub origin: TypeOrigin,
}

impl TypeResolveError {
    fn new(message: impl Into<String>, span: Span, origin: TypeOrigin) -> Self {
        Self {
            message: message.into(),
            span,
            origin,
        }
    }
}

const UNRESOLVABLE_REFERENCE: &str =
    "Unresolvable type reference or unsupported built-in utility type";

/// The declaration a type node resolved to.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedNode<'a> {
    TypeLiteral(&'a TSTypeLiteral<'a>),
    Interface(&'a TSInterfaceDeclaration<'a>),
    Function(&'a TSFunctionType<'a>),
    Other(&'a TSType<'a>),
}

/// A resolved type together with its flattened members.
#[derive(Debug, Clone)]
pub struct ResolvedType<'a> {
    pub node: ResolvedNode<'a>,
    pub origin: TypeOrigin,
    /// Own members first, then members inherited through `extends`.
    pub members: Vec<&'a TSSignature<'a>>,
}

impl ResolvedType<'_> {
    /// Type literal or interface.
    pub fn is_object_shape(&self) -> bool {
        matches!(
            self.node,
            ResolvedNode::TypeLiteral(_) | ResolvedNode::Interface(_)
        )
    }

    pub fn is_function(&self) -> bool {
        matches!(self.node, ResolvedNode::Function(_))
    }
}

/// Type of a flattened member.
#[derive(Debug, Clone)]
pub enum MemberType<'a> {
    Annotation(&'a TSType<'a>),
    Method,
    Untyped,
    Union(Vec<MemberType<'a>>),
    Intersection(Vec<MemberType<'a>>),
}

/// A keyed member of a resolved object type.
#[derive(Debug, Clone)]
pub struct PropMember<'a> {
    pub key: String,
    pub optional: bool,
    pub ty: MemberType<'a>,
    pub span: Span,
    pub origin: TypeOrigin,
}

/// Keyed members and call signatures of a type.
#[derive(Debug, Clone, Default)]
pub struct ResolvedElements<'a> {
    pub props: Vec<PropMember<'a>>,
    pub calls: Vec<&'a FormalParameters<'a>>,
}

impl<'a> ResolvedElements<'a> {
    pub fn get(&self, key: &str) -> Option<&PropMember<'a>> {
        self.props.iter().find(|p| p.key == key)
    }

    fn merge(parts: Vec<ResolvedElements<'a>>, union: bool) -> Self {
        let mut merged = ResolvedElements::default();
        for part in parts {
            for prop in part.props {
                match merged.props.iter_mut().find(|p| p.key == prop.key) {
                    Some(existing) => {
                        let types = vec![existing.ty.clone(), prop.ty];
                        existing.ty = if union {
                            MemberType::Union(types)
                        } else {
                            MemberType::Intersection(types)
                        };
                        existing.optional = existing.optional || prop.optional;
                    }
                    None => merged.props.push(prop),
                }
            }
            merged.calls.extend(part.calls);
        }
        merged
    }
}

/// Type declarations visible to the macros of one component.
///
/// Declarations of the setup block shadow same-named declarations of the
/// module block.
#[derive(Debug, Default)]
pub struct TypeScope<'a> {
    decls: FxHashMap<&'a str, (TypeDecl<'a>, TypeOrigin)>,
}

impl<'a> TypeScope<'a> {
    pub fn new(module: Option<&'a Program<'a>>, setup: Option<&'a Program<'a>>) -> Self {
        let mut scope = Self::default();
        if let Some(program) = module {
            scope.register(&program.body, TypeOrigin::Module);
        }
        if let Some(program) = setup {
            scope.register(&program.body, TypeOrigin::Setup);
        }
        scope
    }

    fn register(&mut self, body: &'a [Statement<'a>], origin: TypeOrigin) {
        for stmt in body {
            match stmt {
                Statement::TSTypeAliasDeclaration(alias) => {
                    self.decls.insert(alias.id.name.as_str(), (TypeDecl::Alias(alias), origin));
                }
                Statement::TSInterfaceDeclaration(iface) => {
                    self.decls.insert(iface.id.name.as_str(), (TypeDecl::Interface(iface), origin));
                }
                Statement::TSEnumDeclaration(decl) => {
                    self.decls.insert(decl.id.name.as_str(), (TypeDecl::Enum(decl), origin));
                }
                Statement::ExportNamedDeclaration(export) => match &export.declaration {
                    Some(Declaration::TSTypeAliasDeclaration(alias)) => {
                        self.decls.insert(alias.id.name.as_str(), (TypeDecl::Alias(alias), origin));
                    }
                    Some(Declaration::TSInterfaceDeclaration(iface)) => {
                        self.decls
                            .insert(iface.id.name.as_str(), (TypeDecl::Interface(iface), origin));
                    }
                    Some(Declaration::TSEnumDeclaration(decl)) => {
                        self.decls.insert(decl.id.name.as_str(), (TypeDecl::Enum(decl), origin));
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }

    /// Whether a type named `name` is declared in either block.
    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    pub fn origin_of(&self, name: &str) -> Option<TypeOrigin> {
        self.decls.get(name).map(|(_, origin)| *origin)
    }

    fn lookup(&self, reference: &TSTypeReference<'a>) -> Option<(TypeDecl<'a>, TypeOrigin)> {
        match &reference.type_name {
            TSTypeName::IdentifierReference(id) => self.decls.get(id.name.as_str()).copied(),
            _ => None,
        }
    }

    /// Follow aliases and interfaces from `ty` until `predicate` accepts a
    /// candidate. Returns `None` when the chain ends without a match.
    pub fn resolve(
        &self,
        ty: &'a TSType<'a>,
        origin: TypeOrigin,
        predicate: impl Fn(&ResolvedType<'a>) -> bool,
    ) -> Option<ResolvedType<'a>> {
        let mut visiting = Vec::new();
        self.resolve_inner(ty, origin, &predicate, &mut visiting)
    }

    fn resolve_inner(
        &self,
        ty: &'a TSType<'a>,
        origin: TypeOrigin,
        predicate: &dyn Fn(&ResolvedType<'a>) -> bool,
        visiting: &mut Vec<&'a str>,
    ) -> Option<ResolvedType<'a>> {
        let candidate = match ty {
            TSType::TSParenthesizedType(paren) => {
                return self.resolve_inner(&paren.type_annotation, origin, predicate, visiting);
            }
            TSType::TSTypeLiteral(lit) => ResolvedType {
                node: ResolvedNode::TypeLiteral(lit),
                origin,
                members: lit.members.iter().collect(),
            },
            TSType::TSFunctionType(func) => ResolvedType {
                node: ResolvedNode::Function(func),
                origin,
                members: Vec::new(),
            },
            TSType::TSTypeReference(reference) => match self.lookup(reference) {
                Some((TypeDecl::Interface(iface), decl_origin)) => {
                    let name = iface.id.name.as_str();
                    if visiting.contains(&name) {
                        return None;
                    }
                    visiting.push(name);
                    let members = self.interface_members(iface, visiting);
                    visiting.pop();
                    ResolvedType {
                        node: ResolvedNode::Interface(iface),
                        origin: decl_origin,
                        members,
                    }
                }
                Some((TypeDecl::Alias(alias), decl_origin)) => {
                    let name = alias.id.name.as_str();
                    if visiting.contains(&name) {
                        return None;
                    }
                    visiting.push(name);
                    let resolved =
                        self.resolve_inner(&alias.type_annotation, decl_origin, predicate, visiting);
                    visiting.pop();
                    return resolved;
                }
                _ => ResolvedType {
                    node: ResolvedNode::Other(ty),
                    origin,
                    members: Vec::new(),
                },
            },
            _ => ResolvedType {
                node: ResolvedNode::Other(ty),
                origin,
                members: Vec::new(),
            },
        };
        predicate(&candidate).then_some(candidate)
    }

    /// Own members followed by inherited ones. The first declaration of a
    /// key wins, so base members shadow `extends` members and earlier
    /// `extends` entries shadow later ones.
    fn interface_members(
        &self,
        iface: &'a TSInterfaceDeclaration<'a>,
        visiting: &mut Vec<&'a str>,
    ) -> Vec<&'a TSSignature<'a>> {
        let mut members: Vec<&'a TSSignature<'a>> = iface.body.body.iter().collect();
        let Some(extends) = &iface.extends else {
            return members;
        };
        for heritage in extends.iter() {
            let Expression::Identifier(id) = &heritage.expression else {
                continue;
            };
            let name = id.name.as_str();
            if visiting.contains(&name) {
                continue;
            }
            let inherited = match self.decls.get(name) {
                Some((TypeDecl::Interface(parent), _)) => {
                    visiting.push(name);
                    let inherited = self.interface_members(parent, visiting);
                    visiting.pop();
                    inherited
                }
                Some((TypeDecl::Alias(alias), origin)) => {
                    visiting.push(name);
                    let resolved = self.resolve_inner(
                        &alias.type_annotation,
                        *origin,
                        &ResolvedType::is_object_shape,
                        visiting,
                    );
                    visiting.pop();
                    resolved.map(|r| r.members).unwrap_or_default()
                }
                _ => continue,
            };
            for member in inherited {
                let key = signature_key(member);
                let shadowed = key.is_some()
                    && members.iter().any(|existing| signature_key(existing) == key);
                if !shadowed {
                    members.push(member);
                }
            }
        }
        members
    }

    /// Members of a (possibly aliased) union type, flattened.
    pub fn resolve_union_type(&self, ty: &'a TSType<'a>) -> Vec<&'a TSType<'a>> {
        let mut out = Vec::new();
        let mut visiting = Vec::new();
        self.union_inner(ty, &mut out, &mut visiting);
        out
    }

    fn union_inner(
        &self,
        ty: &'a TSType<'a>,
        out: &mut Vec<&'a TSType<'a>>,
        visiting: &mut Vec<&'a str>,
    ) {
        match ty {
            TSType::TSParenthesizedType(paren) => {
                self.union_inner(&paren.type_annotation, out, visiting);
            }
            TSType::TSUnionType(union) => {
                for t in union.types.iter() {
                    self.union_inner(t, out, visiting);
                }
            }
            TSType::TSTypeReference(reference) => match self.lookup(reference) {
                Some((TypeDecl::Alias(alias), _)) if !visiting.contains(&alias.id.name.as_str()) => {
                    visiting.push(alias.id.name.as_str());
                    self.union_inner(&alias.type_annotation, out, visiting);
                    visiting.pop();
                }
                _ => out.push(ty),
            },
            _ => out.push(ty),
        }
    }

    /// Flatten a type into keyed members and call signatures.
    pub fn resolve_type_elements(
        &self,
        ty: &'a TSType<'a>,
        origin: TypeOrigin,
    ) -> Result<ResolvedElements<'a>, TypeResolveError> {
        let mut visiting = Vec::new();
        self.elements_inner(ty, origin, &mut visiting)
    }

    fn elements_inner(
        &self,
        ty: &'a TSType<'a>,
        origin: TypeOrigin,
        visiting: &mut Vec<&'a str>,
    ) -> Result<ResolvedElements<'a>, TypeResolveError> {
        match ty {
            TSType::TSParenthesizedType(paren) => {
                self.elements_inner(&paren.type_annotation, origin, visiting)
            }
            TSType::TSTypeLiteral(lit) => elements_from_members(lit.members.iter(), origin),
            TSType::TSFunctionType(func) => Ok(ResolvedElements {
                props: Vec::new(),
                calls: vec![&*func.params],
            }),
            TSType::TSUnionType(union) => {
                let parts = union
                    .types
                    .iter()
                    .map(|t| self.elements_inner(t, origin, visiting))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResolvedElements::merge(parts, true))
            }
            TSType::TSIntersectionType(intersection) => {
                let parts = intersection
                    .types
                    .iter()
                    .map(|t| self.elements_inner(t, origin, visiting))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResolvedElements::merge(parts, false))
            }
            TSType::TSTypeReference(reference) => {
                self.reference_elements(reference, ty, origin, visiting)
            }
            _ => Err(TypeResolveError::new(
                "Unresolvable type in macro type argument",
                ty.span(),
                origin,
            )),
        }
    }

    fn reference_elements(
        &self,
        reference: &'a TSTypeReference<'a>,
        ty: &'a TSType<'a>,
        origin: TypeOrigin,
        visiting: &mut Vec<&'a str>,
    ) -> Result<ResolvedElements<'a>, TypeResolveError> {
        let unresolvable = || TypeResolveError::new(UNRESOLVABLE_REFERENCE, ty.span(), origin);
        match self.lookup(reference) {
            Some((TypeDecl::Interface(iface), decl_origin)) => {
                let name = iface.id.name.as_str();
                if visiting.contains(&name) {
                    return Err(unresolvable());
                }
                visiting.push(name);
                let members = self.interface_members(iface, visiting);
                visiting.pop();
                elements_from_members(members.into_iter(), decl_origin)
            }
            Some((TypeDecl::Alias(alias), decl_origin)) => {
                let name = alias.id.name.as_str();
                if visiting.contains(&name) {
                    return Err(unresolvable());
                }
                visiting.push(name);
                let resolved = self.elements_inner(&alias.type_annotation, decl_origin, visiting);
                visiting.pop();
                resolved
            }
            Some((TypeDecl::Enum(_), _)) => Err(unresolvable()),
            None => {
                let TSTypeName::IdentifierReference(id) = &reference.type_name else {
                    return Err(unresolvable());
                };
                let arg = reference
                    .type_parameters
                    .as_ref()
                    .and_then(|params| params.params.first());
                let optional = match id.name.as_str() {
                    "Partial" => Some(true),
                    "Required" => Some(false),
                    "Readonly" => None,
                    _ => return Err(unresolvable()),
                };
                let Some(arg) = arg else {
                    return Err(unresolvable());
                };
                let mut elements = self.elements_inner(arg, origin, visiting)?;
                if let Some(optional) = optional {
                    for prop in &mut elements.props {
                        prop.optional = optional;
                    }
                }
                Ok(elements)
            }
        }
    }
}

fn signature_key(sig: &TSSignature<'_>) -> Option<String> {
    match sig {
        TSSignature::TSPropertySignature(prop) => resolve_object_key(&prop.key, prop.computed),
        TSSignature::TSMethodSignature(method) => resolve_object_key(&method.key, method.computed),
        _ => None,
    }
}

fn elements_from_members<'a>(
    members: impl Iterator<Item = &'a TSSignature<'a>>,
    origin: TypeOrigin,
) -> Result<ResolvedElements<'a>, TypeResolveError> {
    let mut elements = ResolvedElements::default();
    for member in members {
        let (key, optional, ty, span) = match member {
            TSSignature::TSPropertySignature(prop) => {
                let ty = match &prop.type_annotation {
                    Some(annotation) => MemberType::Annotation(&annotation.type_annotation),
                    None => MemberType::Untyped,
                };
                (
                    resolve_object_key(&prop.key, prop.computed),
                    prop.optional,
                    ty,
                    prop.span,
                )
            }
            TSSignature::TSMethodSignature(method) => (
                resolve_object_key(&method.key, method.computed),
                method.optional,
                MemberType::Method,
                method.span,
            ),
            TSSignature::TSCallSignatureDeclaration(call) => {
                elements.calls.push(&*call.params);
                continue;
            }
            _ => continue,
        };
        let Some(key) = key else {
            return Err(TypeResolveError::new(
                "Unsupported computed key in type referenced by a macro",
                span,
                origin,
            ));
        };
        if elements.props.iter().any(|p| p.key == key) {
            continue;
        }
        elements.props.push(PropMember {
            key,
            optional,
            ty,
            span,
            origin,
        });
    }
    Ok(elements)
}

/// Runtime constructor tag of a prop type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuntimeTag {
    String,
    Number,
    Boolean,
    Object,
    Function,
    Array,
    Symbol,
    Null,
    Set,
    Map,
    WeakSet,
    WeakMap,
    Date,
    Promise,
    Unknown,
}

impl RuntimeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Object => "Object",
            Self::Function => "Function",
            Self::Array => "Array",
            Self::Symbol => "Symbol",
            Self::Null => "null",
            Self::Set => "Set",
            Self::Map => "Map",
            Self::WeakSet => "WeakSet",
            Self::WeakMap => "WeakMap",
            Self::Date => "Date",
            Self::Promise => "Promise",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RuntimeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of runtime tags. Equality ignores order.
#[derive(Debug, Clone, Default, Eq)]
pub struct RuntimeTypes(SmallVec<[RuntimeTag; 4]>);

impl RuntimeTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(tag: RuntimeTag) -> Self {
        Self(smallvec![tag])
    }

    pub fn insert(&mut self, tag: RuntimeTag) {
        if !self.0.contains(&tag) {
            self.0.push(tag);
        }
    }

    pub fn extend(&mut self, other: RuntimeTypes) {
        for tag in other.0 {
            self.insert(tag);
        }
    }

    pub fn remove(&mut self, tag: RuntimeTag) {
        self.0.retain(|t| *t != tag);
    }

    pub fn contains(&self, tag: RuntimeTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = RuntimeTag> + '_ {
        self.0.iter().copied()
    }

    /// `String` for a single tag, `[String, Number]` for several.
    pub fn to_runtime_string(&self) -> String {
        match self.0.as_slice() {
            [single] => single.as_str().to_string(),
            tags => format!(
                "[{}]",
                tags.iter().map(RuntimeTag::as_str).collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

impl PartialEq for RuntimeTypes {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|tag| other.0.contains(tag))
    }
}

impl FromIterator<RuntimeTag> for RuntimeTypes {
    fn from_iter<I: IntoIterator<Item = RuntimeTag>>(iter: I) -> Self {
        let mut types = Self::new();
        for tag in iter {
            types.insert(tag);
        }
        types
    }
}

/// Global types that map directly to a runtime tag when not shadowed by a
/// local declaration.
static GLOBAL_TYPE_TAGS: phf::Map<&'static str, RuntimeTag> = phf_map! {
    "Array" => RuntimeTag::Array,
    "Function" => RuntimeTag::Function,
    "Object" => RuntimeTag::Object,
    "Set" => RuntimeTag::Set,
    "Map" => RuntimeTag::Map,
    "WeakSet" => RuntimeTag::WeakSet,
    "WeakMap" => RuntimeTag::WeakMap,
    "Date" => RuntimeTag::Date,
    "Promise" => RuntimeTag::Promise,
    "Error" => RuntimeTag::Unknown,
    "Partial" => RuntimeTag::Object,
    "Required" => RuntimeTag::Object,
    "Readonly" => RuntimeTag::Object,
    "Record" => RuntimeTag::Object,
    "Pick" => RuntimeTag::Object,
    "Omit" => RuntimeTag::Object,
    "InstanceType" => RuntimeTag::Object,
    "Uppercase" => RuntimeTag::String,
    "Lowercase" => RuntimeTag::String,
    "Capitalize" => RuntimeTag::String,
    "Uncapitalize" => RuntimeTag::String,
    "Parameters" => RuntimeTag::Array,
    "ConstructorParameters" => RuntimeTag::Array,
    "ReadonlyArray" => RuntimeTag::Array,
    "ReadonlyMap" => RuntimeTag::Map,
    "ReadonlySet" => RuntimeTag::Set,
};

const MAX_INFER_DEPTH: usize = 32;

/// Infer the runtime tags of a type node.
pub fn infer_runtime_type<'a>(scope: &TypeScope<'a>, ty: &TSType<'a>) -> RuntimeTypes {
    infer_inner(scope, ty, 0)
}

/// Infer the runtime tags of a flattened member.
pub fn infer_member_type<'a>(scope: &TypeScope<'a>, ty: &MemberType<'a>) -> RuntimeTypes {
    match ty {
        MemberType::Annotation(annotation) => infer_runtime_type(scope, annotation),
        MemberType::Method => RuntimeTypes::single(RuntimeTag::Function),
        MemberType::Untyped => RuntimeTypes::single(RuntimeTag::Unknown),
        MemberType::Union(parts) => parts
            .iter()
            .flat_map(|part| infer_member_type(scope, part).0)
            .collect(),
        MemberType::Intersection(parts) => {
            let mut types: RuntimeTypes = parts
                .iter()
                .flat_map(|part| infer_member_type(scope, part).0)
                .collect();
            types.remove(RuntimeTag::Unknown);
            types
        }
    }
}

fn infer_inner<'a>(scope: &TypeScope<'a>, ty: &TSType<'a>, depth: usize) -> RuntimeTypes {
    if depth > MAX_INFER_DEPTH {
        return RuntimeTypes::single(RuntimeTag::Unknown);
    }
    let depth = depth + 1;
    let tag = match ty {
        TSType::TSStringKeyword(_) | TSType::TSTemplateLiteralType(_) => RuntimeTag::String,
        TSType::TSNumberKeyword(_) => RuntimeTag::Number,
        TSType::TSBooleanKeyword(_) => RuntimeTag::Boolean,
        TSType::TSObjectKeyword(_) => RuntimeTag::Object,
        TSType::TSNullKeyword(_) => RuntimeTag::Null,
        TSType::TSSymbolKeyword(_) => RuntimeTag::Symbol,
        TSType::TSTypeLiteral(lit) => return infer_members(lit.members.iter()),
        TSType::TSFunctionType(_) | TSType::TSConstructorType(_) => RuntimeTag::Function,
        TSType::TSArrayType(_) | TSType::TSTupleType(_) => RuntimeTag::Array,
        TSType::TSLiteralType(lit) => match &lit.literal {
            TSLiteral::StringLiteral(_) => RuntimeTag::String,
            TSLiteral::BooleanLiteral(_) => RuntimeTag::Boolean,
            TSLiteral::NumericLiteral(_)
            | TSLiteral::BigIntLiteral(_)
            | TSLiteral::UnaryExpression(_) => RuntimeTag::Number,
            _ => RuntimeTag::Unknown,
        },
        TSType::TSTypeReference(reference) => return infer_reference(scope, reference, depth),
        TSType::TSParenthesizedType(paren) => {
            return infer_inner(scope, &paren.type_annotation, depth);
        }
        TSType::TSUnionType(union) => {
            return union
                .types
                .iter()
                .flat_map(|t| infer_inner(scope, t, depth).0)
                .collect();
        }
        TSType::TSIntersectionType(intersection) => {
            let mut types: RuntimeTypes = intersection
                .types
                .iter()
                .flat_map(|t| infer_inner(scope, t, depth).0)
                .collect();
            types.remove(RuntimeTag::Unknown);
            return types;
        }
        TSType::TSTypeOperatorType(op) => match op.operator {
            TSTypeOperatorOperator::Keyof => {
                return [RuntimeTag::String, RuntimeTag::Number, RuntimeTag::Symbol]
                    .into_iter()
                    .collect();
            }
            _ => return infer_inner(scope, &op.type_annotation, depth),
        },
        _ => RuntimeTag::Unknown,
    };
    RuntimeTypes::single(tag)
}

fn infer_members<'a, 'b>(members: impl Iterator<Item = &'b TSSignature<'a>>) -> RuntimeTypes
where
    'a: 'b,
{
    let mut types = RuntimeTypes::new();
    for member in members {
        match member {
            TSSignature::TSCallSignatureDeclaration(_)
            | TSSignature::TSConstructSignatureDeclaration(_) => {
                types.insert(RuntimeTag::Function);
            }
            _ => types.insert(RuntimeTag::Object),
        }
    }
    if types.is_empty() {
        types.insert(RuntimeTag::Object);
    }
    types
}

fn infer_reference<'a>(
    scope: &TypeScope<'a>,
    reference: &TSTypeReference<'a>,
    depth: usize,
) -> RuntimeTypes {
    let TSTypeName::IdentifierReference(id) = &reference.type_name else {
        return RuntimeTypes::single(RuntimeTag::Unknown);
    };
    let name = id.name.as_str();
    match scope.decls.get(name) {
        Some((TypeDecl::Alias(alias), _)) => {
            return match &alias.type_annotation {
                TSType::TSFunctionType(_) => RuntimeTypes::single(RuntimeTag::Function),
                annotation => infer_inner(scope, annotation, depth),
            };
        }
        Some((TypeDecl::Interface(iface), _)) => return infer_members(iface.body.body.iter()),
        Some((TypeDecl::Enum(decl), _)) => return infer_enum_type(decl),
        None => {}
    }

    let type_arg = |index: usize| {
        reference
            .type_parameters
            .as_ref()
            .and_then(|params| params.params.get(index))
    };
    match name {
        "NonNullable" => match type_arg(0) {
            Some(arg) => {
                let mut types = infer_inner(scope, arg, depth);
                types.remove(RuntimeTag::Null);
                types
            }
            None => RuntimeTypes::single(RuntimeTag::Unknown),
        },
        "Extract" => type_arg(1).map_or_else(
            || RuntimeTypes::single(RuntimeTag::Unknown),
            |arg| infer_inner(scope, arg, depth),
        ),
        "Exclude" | "OmitThisParameter" => type_arg(0).map_or_else(
            || RuntimeTypes::single(RuntimeTag::Unknown),
            |arg| infer_inner(scope, arg, depth),
        ),
        _ => RuntimeTypes::single(
            GLOBAL_TYPE_TAGS
                .get(name)
                .copied()
                .unwrap_or(RuntimeTag::Unknown),
        ),
    }
}

fn infer_enum_type(decl: &TSEnumDeclaration<'_>) -> RuntimeTypes {
    let mut types = RuntimeTypes::new();
    for member in decl.members.iter() {
        match &member.initializer {
            Some(Expression::StringLiteral(_)) | Some(Expression::TemplateLiteral(_)) => {
                types.insert(RuntimeTag::String);
            }
            Some(Expression::NumericLiteral(_)) => types.insert(RuntimeTag::Number),
            _ => {}
        }
    }
    if types.is_empty() {
        types.insert(RuntimeTag::Number);
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    /// Parse `source` and hand the type annotation of the last type alias
    /// (named `Target`) to `f`.
    fn with_target(
        module: &str,
        setup: &str,
        f: impl for<'a> FnOnce(&TypeScope<'a>, &'a TSType<'a>),
    ) {
        let allocator = Allocator::default();
        let module: &Program<'_> =
            allocator.alloc(Parser::new(&allocator, module, SourceType::ts()).parse().program);
        let setup: &Program<'_> =
            allocator.alloc(Parser::new(&allocator, setup, SourceType::ts()).parse().program);
        let scope = TypeScope::new(Some(module), Some(setup));
        let target = setup
            .body
            .iter()
            .find_map(|stmt| match stmt {
                Statement::TSTypeAliasDeclaration(alias) if alias.id.name == "Target" => {
                    Some(&alias.type_annotation)
                }
                _ => None,
            })
            .expect("Target alias");
        f(&scope, target);
    }

    fn tags(types: &RuntimeTypes) -> Vec<&'static str> {
        types.iter().map(|t| t.as_str()).collect()
    }

    #[test]
    fn test_infer_keywords_and_literals() {
        with_target("", "type Target = string | 'a' | 1 | null | boolean", |scope, ty| {
            assert_eq!(
                tags(&infer_runtime_type(scope, ty)),
                vec!["String", "Number", "null", "Boolean"]
            );
        });
    }

    #[test]
    fn test_infer_references() {
        with_target("", "type Target = Date | Promise<void> | Record<string, number>", |scope, ty| {
            assert_eq!(tags(&infer_runtime_type(scope, ty)), vec!["Date", "Promise", "Object"]);
        });
        with_target("", "type Target = NonNullable<string | null>", |scope, ty| {
            assert_eq!(tags(&infer_runtime_type(scope, ty)), vec!["String"]);
        });
        with_target("", "type Target = Error", |scope, ty| {
            assert_eq!(tags(&infer_runtime_type(scope, ty)), vec!["Unknown"]);
        });
    }

    #[test]
    fn test_infer_local_declarations() {
        with_target(
            "type Handler = (e: Event) => void\nenum Color { Red = 'red' }",
            "interface Callable { (): void }\ntype Target = Handler | Color | Callable",
            |scope, ty| {
                assert_eq!(
                    tags(&infer_runtime_type(scope, ty)),
                    vec!["Function", "String"]
                );
            },
        );
    }

    #[test]
    fn test_intersection_drops_unknown() {
        with_target("", "type Target = string & Brand", |scope, ty| {
            assert_eq!(tags(&infer_runtime_type(scope, ty)), vec!["String"]);
        });
    }

    #[test]
    fn test_runtime_types_set_equality() {
        let a: RuntimeTypes = [RuntimeTag::String, RuntimeTag::Number].into_iter().collect();
        let b: RuntimeTypes = [RuntimeTag::Number, RuntimeTag::String].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.to_runtime_string(), "[String, Number]");
        assert_eq!(RuntimeTypes::single(RuntimeTag::Null).to_runtime_string(), "null");
    }

    #[test]
    fn test_interface_extends_first_wins() {
        with_target(
            "interface Base { a: number; b: string }\ninterface Other { b: boolean; c: Date }",
            "interface Props extends Base, Other { a: string }\ntype Target = Props",
            |scope, ty| {
                let elements = scope.resolve_type_elements(ty, TypeOrigin::Setup).unwrap();
                let keys: Vec<_> = elements.props.iter().map(|p| p.key.as_str()).collect();
                assert_eq!(keys, vec!["a", "b", "c"]);
                let b = elements.get("b").unwrap();
                assert_eq!(tags(&infer_member_type(scope, &b.ty)), vec!["String"]);
                let a = elements.get("a").unwrap();
                assert_eq!(tags(&infer_member_type(scope, &a.ty)), vec!["String"]);
            },
        );
    }

    #[test]
    fn test_setup_shadows_module() {
        with_target(
            "interface Props { fromModule: string }",
            "interface Props { fromSetup: string }\ntype Target = Props",
            |scope, ty| {
                let elements = scope.resolve_type_elements(ty, TypeOrigin::Setup).unwrap();
                assert_eq!(elements.props.len(), 1);
                assert_eq!(elements.props[0].key, "fromSetup");
                assert_eq!(elements.props[0].origin, TypeOrigin::Setup);
            },
        );
    }

    #[test]
    fn test_intersection_and_partial() {
        with_target(
            "",
            "type A = { x: string }\ntype Target = Partial<A> & { y?: number; x: number }",
            |scope, ty| {
                let elements = scope.resolve_type_elements(ty, TypeOrigin::Setup).unwrap();
                let x = elements.get("x").unwrap();
                assert!(x.optional);
                assert_eq!(tags(&infer_member_type(scope, &x.ty)), vec!["String", "Number"]);
                assert!(elements.get("y").unwrap().optional);
            },
        );
    }

    #[test]
    fn test_unresolvable_reference() {
        with_target("", "type Target = Missing", |scope, ty| {
            let err = scope.resolve_type_elements(ty, TypeOrigin::Setup).unwrap_err();
            assert_eq!(err.message, UNRESOLVABLE_REFERENCE);
        });
    }

    #[test]
    fn test_resolve_with_predicate() {
        with_target("", "type Fn = (e: 'change') => void\ntype Target = Fn", |scope, ty| {
            let resolved = scope.resolve(ty, TypeOrigin::Setup, ResolvedType::is_function);
            assert!(resolved.is_some_and(|r| r.is_function()));
            assert!(scope
                .resolve(ty, TypeOrigin::Setup, ResolvedType::is_object_shape)
                .is_none());
        });
    }
}
