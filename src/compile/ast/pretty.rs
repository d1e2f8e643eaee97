//! Rendering of the tree back into concrete WACC syntax. Reparsing the
//! output of these impls yields the same tree, which the tests lean on.

use std::fmt::{Display, Formatter, Result};

use super::{
    BinaryOp, BuiltinOp, CtrlOp, Definition, Expr, Literal, PairSide, Statement, Type, UnaryOp,
};

fn escape_into(c: char, out: &mut String) {
    match c {
        '\\' => out.push_str("\\\\"),
        '"' => out.push_str("\\\""),
        '\'' => out.push_str("\\'"),
        '\0' => out.push_str("\\0"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\u{b}' => out.push_str("\\v"),
        '\t' => out.push_str("\\t"),
        '\u{8}' => out.push_str("\\b"),
        '\u{c}' => out.push_str("\\f"),
        other => out.push(other),
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Literal::Char(c) => {
                let mut body = String::new();
                escape_into(*c, &mut body);
                write!(f, "'{}'", body)
            }
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Str(s) => {
                let mut body = String::new();
                for c in s.chars() {
                    escape_into(c, &mut body);
                }
                write!(f, "\"{}\"", body)
            }
            Literal::Array(elems) => {
                write!(f, "[")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            Literal::Null => write!(f, "null"),
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Len => write!(f, "len "),
            UnaryOp::Ord => write!(f, "ord "),
            UnaryOp::Chr => write!(f, "chr "),
            UnaryOp::Deref => write!(f, "*"),
            UnaryOp::AddrOf => write!(f, "&"),
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let symbol = match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };

        write!(f, "{}", symbol)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Expr::Lit(lit) => write!(f, "{}", lit),
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::ArrElem(name, indices) => {
                write!(f, "{}", name)?;
                for idx in indices {
                    write!(f, "[{}]", idx)?;
                }
                Ok(())
            }
            Expr::PairElem(PairSide::Fst, name) => write!(f, "fst {}", name),
            Expr::PairElem(PairSide::Snd, name) => write!(f, "snd {}", name),
            Expr::UnApp(op, rhs) => write!(f, "{}({})", op, rhs),
            Expr::BinApp(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::FunCall(name, args) => {
                write!(f, "call {}(", name)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            Expr::NewPair(fst, snd) => write!(f, "newpair({}, {})", fst, snd),
            Expr::NewStruct(name) => write!(f, "news {}", name),
        }
    }
}

/// A statement sequence without the surrounding `begin`/`end`, as it
/// appears inside function bodies, branches and loop bodies.
struct Seq<'a>(&'a Statement);

impl Display for Seq<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.0 {
            Statement::Identified(inner, _) => write!(f, "{}", Seq(inner)),
            Statement::Block(stmts) => {
                for (i, s) in stmts.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", s)?;
                }
                Ok(())
            }
            other => write!(f, "{}", other),
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Statement::Noop => write!(f, "skip"),
            Statement::Block(_) => write!(f, "begin {} end", Seq(self)),
            Statement::VarDef((name, ty), init) => write!(f, "{} {} = {}", ty, name, init),
            Statement::Assign(lhs, rhs) => write!(f, "{} = {}", lhs, rhs),
            Statement::Ctrl(CtrlOp::Return(e)) => write!(f, "return {}", e),
            Statement::Ctrl(CtrlOp::Break) => write!(f, "break"),
            Statement::Ctrl(CtrlOp::Continue) => write!(f, "continue"),
            Statement::Cond(test, then, otherwise) => {
                write!(f, "if {} then {}", test, Seq(then))?;
                if otherwise.unidentified() != Statement::Noop {
                    write!(f, " else {}", Seq(otherwise))?;
                }
                write!(f, " fi")
            }
            Statement::Loop(test, body) => write!(f, "while {} do {} done", test, Seq(body)),
            Statement::Builtin(BuiltinOp::Read, e) => write!(f, "read {}", e),
            Statement::Builtin(BuiltinOp::Free, e) => write!(f, "free {}", e),
            Statement::Builtin(BuiltinOp::Exit, e) => write!(f, "exit {}", e),
            Statement::Builtin(BuiltinOp::Print, e) => write!(f, "print {}", e),
            Statement::Builtin(BuiltinOp::PrintLn, e) => write!(f, "println {}", e),
            Statement::ExpStmt(e) => write!(f, "{}", e),
            Statement::ExternDecl(name) => write!(f, "extern {}", name),
            Statement::InlineAssembly(lines) => {
                writeln!(f, "begin inline")?;
                for line in lines {
                    writeln!(f, "{}", line)?;
                }
                write!(f, "end")
            }
            Statement::Identified(inner, _) => write!(f, "{}", inner),
        }
    }
}

impl Display for Definition {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Definition::FunDef((name, Type::Fun(ret, params)), body) => {
                write!(f, "{} {}(", ret, name)?;
                for (i, (pname, pty)) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", pty, pname)?;
                }
                write!(f, ") is {} end", Seq(body))
            }
            Definition::FunDef((name, ty), body) => {
                write!(f, "{} {}() is {} end", ty, name, Seq(body))
            }
            Definition::TypeDef(name, fields) => {
                write!(f, "struct {} is ", name)?;
                for (i, (fname, fty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{} {}", fty, fname)?;
                }
                write!(f, " end")
            }
            Definition::GlobalDef((name, ty), init) => write!(f, "{} {} = {}", ty, name, init),
        }
    }
}
