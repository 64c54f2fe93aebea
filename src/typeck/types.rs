use crate::parser::ast::FunctionDecl;
use crate::registry::FnId;
use crate::span::Span;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Int,
    Float,
    String,
    Void,
    Bool,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => Builtin::Int,
            "float" => Builtin::Float,
            "string" => Builtin::String,
            "void" => Builtin::Void,
            "bool" => Builtin::Bool,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::String => "string",
            Builtin::Void => "void",
            Builtin::Bool => "bool",
        }
    }
}

#[derive(Debug)]
pub struct StructType {
    pub name: String,
    pub properties: Vec<(String, Type)>,
    pub generics: Vec<String>,
    pub doc: Option<String>,
}

impl StructType {
    pub fn property(&self, name: &str) -> Option<&Type> {
        self.properties.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }
}

#[derive(Debug)]
pub struct EnumVariant {
    pub name: String,
    pub discriminator: i64,
    pub payload: Option<Vec<Type>>,
}

#[derive(Debug)]
pub struct EnumType {
    pub name: String,
    pub variants: Vec<EnumVariant>,
    /// Set when the enum has two cases and only one carries data; the empty case lowers to `null`.
    pub null_discriminator: Option<i64>,
    pub generics: Vec<String>,
    pub doc: Option<String>,
}

impl EnumType {
    pub fn variant(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn is_null_optimized(&self) -> bool {
        self.null_discriminator.is_some()
    }

    /// Payload of the single data-carrying case of a null-optimized enum.
    pub fn data_payload(&self) -> Option<&[Type]> {
        self.variants.iter().find_map(|v| v.payload.as_deref())
    }

    fn same_layout(&self, other: &EnumType) -> bool {
        self.variants.len() == other.variants.len()
            && self.variants.iter().all(|v| {
                other.variant(&v.name).is_some_and(|o| o.discriminator == v.discriminator)
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct FnFlags {
    pub export: bool,
    pub builtin: bool,
    pub any_args: bool,
    pub doc: Option<String>,
}

/// Resolved signature of a declared function. Shared between every reference to it.
#[derive(Debug)]
pub struct FnSig {
    pub id: FnId,
    pub name: String,
    pub generics: Vec<String>,
    pub params: Vec<Type>,
    pub ret: Type,
    pub flags: FnFlags,
    pub decl: Rc<FunctionDecl>,
}

impl FnSig {
    pub fn is_generic(&self) -> bool {
        !self.generics.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FnRef {
    pub sig: Rc<FnSig>,
    /// Non-associative functions are called as `a.f(b)` and lowered to `f(a, b)`.
    pub associative: bool,
    pub rename: Option<String>,
}

impl FnRef {
    pub fn plain(sig: Rc<FnSig>) -> Self {
        Self { sig, associative: true, rename: None }
    }

    /// Name the lowered call uses.
    pub fn emitted_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.sig.name)
    }
}

/// Methods attached to a type by an `extension` or `implement` block.
#[derive(Debug)]
pub struct ExtensionTable {
    pub target: String,
    pub ty: Type,
    pub functions: Vec<(String, FnRef)>,
    pub export: bool,
    pub global: bool,
    pub decl: Span,
}

impl ExtensionTable {
    pub fn function(&self, name: &str) -> Option<&FnRef> {
        self.functions.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }
}

#[derive(Debug, Clone)]
pub enum Type {
    Builtin(Builtin),
    Struct(Rc<StructType>),
    Enum(Rc<EnumType>),
    /// A value of an enum; `member` is the case when it is statically known.
    EnumValue { ty: Rc<EnumType>, member: Option<String> },
    Fn(FnRef),
    Module(Rc<BTreeMap<String, Type>>),
    Applied { base: Box<Type>, args: Vec<Type> },
    Generic(String),
}

impl Type {
    pub const INT: Type = Type::Builtin(Builtin::Int);
    pub const FLOAT: Type = Type::Builtin(Builtin::Float);
    pub const STRING: Type = Type::Builtin(Builtin::String);
    pub const VOID: Type = Type::Builtin(Builtin::Void);
    pub const BOOL: Type = Type::Builtin(Builtin::Bool);

    pub fn builtin(&self) -> Option<Builtin> {
        match self {
            Type::Builtin(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        self.builtin() == Some(Builtin::Void)
    }

    /// Structural equality. Generic parameters only match parameters of the same name.
    pub fn equals(&self, other: &Type) -> bool {
        type_equals(self, other, false)
    }

    /// Equality where a generic parameter on either side matches anything.
    pub fn matches_wildcard(&self, other: &Type) -> bool {
        type_equals(self, other, true)
    }

    /// The enum behind an enum type, enum value, or generic application of either.
    pub fn as_enum(&self) -> Option<&Rc<EnumType>> {
        match self {
            Type::Enum(e) | Type::EnumValue { ty: e, .. } => Some(e),
            Type::Applied { base, .. } => base.as_enum(),
            _ => None,
        }
    }

    /// `Applied` is unwrapped to its base.
    pub fn base(&self) -> &Type {
        match self {
            Type::Applied { base, .. } => base.base(),
            other => other,
        }
    }

    pub fn generic_args(&self) -> &[Type] {
        match self {
            Type::Applied { args, .. } => args,
            _ => &[],
        }
    }

    pub fn has_generic_param(&self) -> bool {
        match self {
            Type::Generic(_) => true,
            Type::Applied { args, .. } => args.iter().any(Type::has_generic_param),
            _ => false,
        }
    }

    /// Replace generic parameters from `bindings`. Unbound parameters are an error.
    pub fn dissolve(&self, bindings: &HashMap<String, Type>) -> Result<Type, String> {
        match self {
            Type::Generic(name) => bindings.get(name).cloned().ok_or_else(|| name.clone()),
            Type::Applied { base, args } => Ok(Type::Applied {
                base: base.clone(),
                args: args.iter().map(|a| a.dissolve(bindings)).collect::<Result<_, _>>()?,
            }),
            other => Ok(other.clone()),
        }
    }

    /// Like [`Type::dissolve`], but unbound parameters are left in place.
    pub fn substitute(&self, bindings: &HashMap<String, Type>) -> Type {
        match self {
            Type::Generic(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            Type::Applied { base, args } => Type::Applied {
                base: base.clone(),
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            other => other.clone(),
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

fn list_equals(lhs: &[Type], rhs: &[Type], wildcard: bool) -> bool {
    lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(l, r)| type_equals(l, r, wildcard))
}

fn type_equals(lhs: &Type, rhs: &Type, wildcard: bool) -> bool {
    match (lhs, rhs) {
        (Type::Builtin(l), Type::Builtin(r)) => l == r,
        (Type::Enum(l) | Type::EnumValue { ty: l, .. }, Type::Enum(r) | Type::EnumValue { ty: r, .. }) => {
            l.same_layout(r)
        }
        (Type::Struct(l), Type::Struct(r)) => {
            l.properties.len() == r.properties.len()
                && l.properties.iter().all(|(name, ty)| r.property(name).is_some_and(|o| type_equals(ty, o, wildcard)))
        }
        (Type::Applied { base: lb, args: la }, Type::Applied { base: rb, args: ra }) => {
            list_equals(la, ra, wildcard) && type_equals(lb, rb, wildcard)
        }
        (Type::Generic(_), _) | (_, Type::Generic(_)) if wildcard => true,
        (Type::Generic(l), Type::Generic(r)) => l == r,
        (Type::Fn(l), Type::Fn(r)) => l.sig.id == r.sig.id,
        (Type::Module(l), Type::Module(r)) => Rc::ptr_eq(l, r),
        _ => false,
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Builtin(b) => f.write_str(b.name()),
            Type::Fn(r) => {
                let params: Vec<String> = r.sig.params.iter().map(ToString::to_string).collect();
                write!(f, "function({}):{}", params.join(", "), r.sig.ret)
            }
            Type::EnumValue { ty, .. } => write!(f, "{}", Type::Enum(ty.clone())),
            Type::Enum(e) if e.generics.is_empty() => write!(f, "Enum({})", e.name),
            Type::Enum(e) => write!(f, "Enum<{}>({})", e.generics.join(", "), e.name),
            Type::Struct(s) => write!(f, "Struct<{}>", s.name),
            Type::Module(_) => f.write_str("module"),
            Type::Applied { base, args } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{base} with <{}>", args.join(", "))
            }
            Type::Generic(name) => write!(f, "(GenericIdentifier)<{name}>"),
        }
    }
}
