use std::fmt::Display;

pub mod location;
pub mod pretty;

pub use location::{LineIndex, Location, LocationData, StatementId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Bool,
    Char,
    StringT,
    Array(Box<Type>),
    Pair(Box<Type>, Box<Type>),
    Ptr(Box<Type>),
    Struct(String),
    Fun(Box<Type>, Vec<Declaration>),
    Arb,
}

impl Type {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Structural equality with `Arb` acting as a wildcard on either
    /// side, at every position. Reflexive and symmetric.
    pub fn matches(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Arb, _) | (_, Type::Arb) => true,
            (Type::Int, Type::Int) => true,
            (Type::Bool, Type::Bool) => true,
            (Type::Char, Type::Char) => true,
            (Type::StringT, Type::StringT) => true,
            (Type::Array(a), Type::Array(b)) => a.matches(b),
            (Type::Pair(a1, a2), Type::Pair(b1, b2)) => a1.matches(b1) && a2.matches(b2),
            (Type::Ptr(a), Type::Ptr(b)) => a.matches(b),
            (Type::Struct(a), Type::Struct(b)) => a == b,
            (Type::Fun(ar, aps), Type::Fun(br, bps)) => {
                ar.matches(br)
                    && aps.len() == bps.len()
                    && aps
                        .iter()
                        .zip(bps.iter())
                        .all(|((_, a), (_, b))| a.matches(b))
            }
            _ => false,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Bool => write!(f, "bool"),
            Self::Char => write!(f, "char"),
            Self::StringT => write!(f, "string"),
            Self::Array(inner) => write!(f, "{}[]", inner),
            Self::Pair(fst, snd) => write!(f, "pair({}, {})", fst, snd),
            Self::Ptr(inner) => write!(f, "{}*", inner),
            Self::Struct(name) => write!(f, "struct {}", name),
            Self::Fun(ret, params) => {
                write!(f, "{}(", ret)?;
                for (i, (_, ty)) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                write!(f, ")")
            }
            Self::Arb => write!(f, "any"),
        }
    }
}

/// A named, typed binding.
pub type Declaration = (String, Type);

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Char(char),
    Int(i64),
    Bool(bool),
    Str(String),
    Array(Vec<Expr>),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    Fst,
    Snd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Len,
    Ord,
    Chr,
    Deref,
    AddrOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    //
    Add,
    Sub,
    //
    ShiftLeft,
    ShiftRight,
    //
    Less,
    LessEq,
    Greater,
    GreaterEq,
    //
    Eq,
    NotEq,
    //
    BitAnd,
    BitXor,
    BitOr,
    //
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Literal),
    Ident(String),
    ArrElem(String, Vec<Expr>),
    PairElem(PairSide, String),
    UnApp(UnaryOp, Box<Expr>),
    BinApp(BinaryOp, Box<Expr>, Box<Expr>),
    FunCall(String, Vec<Expr>),
    NewPair(Box<Expr>, Box<Expr>),
    NewStruct(String),
}

impl Expr {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Whether the expression may appear where a storage location is
    /// required (assignment targets, `read` targets).
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::Ident(_) | Expr::ArrElem(_, _) | Expr::PairElem(_, _)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CtrlOp {
    Return(Expr),
    Break,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinOp {
    Read,
    Free,
    Exit,
    Print,
    PrintLn,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Noop,
    Block(Vec<Statement>),
    VarDef(Declaration, Expr),
    Assign(Expr, Expr),
    Ctrl(CtrlOp),
    Cond(Expr, Box<Statement>, Box<Statement>),
    Loop(Expr, Box<Statement>),
    Builtin(BuiltinOp, Expr),
    ExpStmt(Expr),
    ExternDecl(String),
    InlineAssembly(Vec<String>),
    Identified(Box<Statement>, StatementId),
}

impl Statement {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// The tree with every `Identified` wrapper removed. Structural
    /// comparisons across reparses go through this.
    pub fn unidentified(&self) -> Statement {
        match self {
            Statement::Identified(inner, _) => inner.unidentified(),
            Statement::Block(stmts) => {
                Statement::Block(stmts.iter().map(Statement::unidentified).collect())
            }
            Statement::Cond(e, then, otherwise) => Statement::Cond(
                e.clone(),
                then.unidentified().boxed(),
                otherwise.unidentified().boxed(),
            ),
            Statement::Loop(e, body) => Statement::Loop(e.clone(), body.unidentified().boxed()),
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    FunDef(Declaration, Statement),
    TypeDef(String, Vec<Declaration>),
    GlobalDef(Declaration, Expr),
}

/// Name under which loose program-scope statements are collected when
/// they cannot become `main`. Never clashes with a user identifier: the
/// identifier class has no `%`.
pub const GLOBAL_BLOCK: &str = "%GLOBAL%";

/// Pseudo-identifier bound to the enclosing function's return type.
pub const RETURN_SENTINEL: &str = "%RETURN%";

#[derive(Debug, Clone)]
pub struct AnnotatedProgram {
    pub definitions: Vec<Definition>,
    pub locations: LocationData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_is_reflexive() {
        let types = [
            Type::Int,
            Type::StringT,
            Type::Array(Type::Char.boxed()),
            Type::Pair(Type::Int.boxed(), Type::Array(Type::Bool.boxed()).boxed()),
            Type::Ptr(Type::Struct("node".to_string()).boxed()),
        ];

        for ty in &types {
            assert!(ty.matches(ty));
        }
    }

    #[test]
    fn arb_is_a_wildcard_on_both_sides() {
        let pair = Type::Pair(Type::Int.boxed(), Type::Char.boxed());
        let null_ty = Type::Pair(Type::Arb.boxed(), Type::Arb.boxed());

        assert!(pair.matches(&null_ty));
        assert!(null_ty.matches(&pair));
        assert!(Type::Arb.matches(&Type::Bool));
        assert!(Type::Bool.matches(&Type::Arb));
        assert!(Type::Array(Type::Arb.boxed()).matches(&Type::Array(Type::Int.boxed())));
    }

    #[test]
    fn mismatched_structures_do_not_match() {
        assert!(!Type::Int.matches(&Type::Bool));
        assert!(!Type::Array(Type::Int.boxed()).matches(&Type::Int));
        assert!(!Type::Struct("a".to_string()).matches(&Type::Struct("b".to_string())));
        assert!(!Type::Pair(Type::Int.boxed(), Type::Int.boxed())
            .matches(&Type::Pair(Type::Int.boxed(), Type::Char.boxed())));
    }

    #[test]
    fn matches_is_symmetric() {
        let a = Type::Array(Type::Pair(Type::Arb.boxed(), Type::Int.boxed()).boxed());
        let b = Type::Array(Type::Pair(Type::Char.boxed(), Type::Int.boxed()).boxed());

        assert_eq!(a.matches(&b), b.matches(&a));
    }
}
