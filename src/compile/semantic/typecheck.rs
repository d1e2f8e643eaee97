use crate::compile::ast::{BinaryOp, Expr, Literal, PairSide, Type, UnaryOp};
use crate::compile::CheckerError;
use crate::datstructures::scope_stack::ScopeStack;

/// One row of the operator signature table.
pub struct UnarySig {
    pub op: UnaryOp,
    pub operand: Type,
    pub result: Type,
}

pub struct BinarySig {
    pub op: BinaryOp,
    pub operands: (Type, Type),
    pub result: Type,
}

/// `*` (deref) and `&` (address-of) have operand-dependent results and
/// are handled directly in `type_of`.
pub fn unary_signatures() -> Vec<UnarySig> {
    use Type::*;
    use UnaryOp::*;

    vec![
        UnarySig { op: Not, operand: Bool, result: Bool },
        UnarySig { op: Neg, operand: Int, result: Int },
        UnarySig { op: Len, operand: Array(Arb.boxed()), result: Int },
        UnarySig { op: Ord, operand: Char, result: Int },
        UnarySig { op: Chr, operand: Int, result: Char },
    ]
}

pub fn binary_signatures() -> Vec<BinarySig> {
    use BinaryOp::*;
    use Type::*;

    let mut table = Vec::new();

    for op in [Mul, Div, Mod, Add, Sub, ShiftLeft, ShiftRight, BitAnd, BitXor, BitOr] {
        table.push(BinarySig { op, operands: (Int, Int), result: Int });
    }

    for op in [Less, LessEq, Greater, GreaterEq] {
        table.push(BinarySig { op, operands: (Int, Int), result: Bool });
        table.push(BinarySig { op, operands: (Char, Char), result: Bool });
    }

    for op in [Eq, NotEq] {
        table.push(BinarySig { op, operands: (Arb, Arb), result: Bool });
    }

    for op in [And, Or] {
        table.push(BinarySig { op, operands: (Bool, Bool), result: Bool });
    }

    table
}

fn op_label(op: impl std::fmt::Display) -> String {
    op.to_string().trim_end().to_string()
}

/// Computes the type of an expression under the current scope, or the
/// first error found in it. Errors carry no position here; the walker
/// attaches one on the way out.
pub fn type_of(expr: &Expr, symbols: &ScopeStack<Type>) -> Result<Type, CheckerError> {
    match expr {
        Expr::Lit(lit) => type_of_literal(lit, symbols),

        Expr::Ident(name) => symbols
            .lookup(name)
            .cloned()
            .map_err(|err| CheckerError::semantic(err.to_string())),

        Expr::ArrElem(name, indices) => {
            let mut current = symbols
                .lookup(name)
                .cloned()
                .map_err(|err| CheckerError::semantic(err.to_string()))?;

            for index in indices {
                let index_ty = type_of(index, symbols)?;
                if !index_ty.matches(&Type::Int) {
                    return Err(CheckerError::typing(format!(
                        "array index must be int, got {}",
                        index_ty
                    )));
                }

                current = match current {
                    Type::Array(inner) => *inner,
                    Type::Arb => Type::Arb,
                    other => {
                        return Err(CheckerError::typing(format!("cannot index into {}", other)))
                    }
                };
            }

            Ok(current)
        }

        Expr::PairElem(side, name) => {
            let ty = symbols
                .lookup(name)
                .cloned()
                .map_err(|err| CheckerError::semantic(err.to_string()))?;

            match (side, ty) {
                (PairSide::Fst, Type::Pair(fst, _)) => Ok(*fst),
                (PairSide::Snd, Type::Pair(_, snd)) => Ok(*snd),
                (_, Type::Arb) => Ok(Type::Arb),
                (PairSide::Fst, other) => {
                    Err(CheckerError::typing(format!("cannot take fst of {}", other)))
                }
                (PairSide::Snd, other) => {
                    Err(CheckerError::typing(format!("cannot take snd of {}", other)))
                }
            }
        }

        Expr::UnApp(op, rhs) => {
            let operand = type_of(rhs, symbols)?;

            match op {
                UnaryOp::Deref => match operand {
                    Type::Ptr(inner) => Ok(*inner),
                    Type::Arb => Ok(Type::Arb),
                    other => Err(CheckerError::typing(format!(
                        "cannot dereference {}",
                        other
                    ))),
                },
                UnaryOp::AddrOf => Ok(Type::Ptr(operand.boxed())),
                _ => unary_signatures()
                    .into_iter()
                    .find(|sig| sig.op == *op && sig.operand.matches(&operand))
                    .map(|sig| sig.result)
                    .ok_or_else(|| {
                        CheckerError::typing(format!(
                            "operator {} cannot be applied to {}",
                            op_label(op),
                            operand
                        ))
                    }),
            }
        }

        Expr::BinApp(op, lhs, rhs) => {
            let left = type_of(lhs, symbols)?;
            let right = type_of(rhs, symbols)?;

            if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) && !left.matches(&right) {
                return Err(CheckerError::typing(format!(
                    "cannot compare {} and {}",
                    left, right
                )));
            }

            binary_signatures()
                .into_iter()
                .find(|sig| {
                    sig.op == *op && sig.operands.0.matches(&left) && sig.operands.1.matches(&right)
                })
                .map(|sig| sig.result)
                .ok_or_else(|| {
                    CheckerError::typing(format!(
                        "operator {} cannot be applied to {} and {}",
                        op_label(op),
                        left,
                        right
                    ))
                })
        }

        Expr::FunCall(name, args) => {
            let ty = symbols
                .lookup(name)
                .cloned()
                .map_err(|err| CheckerError::semantic(err.to_string()))?;

            let Type::Fun(ret, params) = ty else {
                return Err(CheckerError::semantic(format!("{} is not a function", name)));
            };

            if args.len() != params.len() {
                return Err(CheckerError::semantic(format!(
                    "wrong number of arguments in call to {}: expected {}, got {}",
                    name,
                    params.len(),
                    args.len()
                )));
            }

            for (arg, (pname, pty)) in args.iter().zip(params.iter()) {
                let arg_ty = type_of(arg, symbols)?;
                if !pty.matches(&arg_ty) {
                    return Err(CheckerError::typing(format!(
                        "argument {} of {}: expected {}, got {}",
                        pname, name, pty, arg_ty
                    )));
                }
            }

            Ok(*ret)
        }

        Expr::NewPair(fst, snd) => {
            let fst_ty = type_of(fst, symbols)?;
            let snd_ty = type_of(snd, symbols)?;

            Ok(Type::Pair(fst_ty.boxed(), snd_ty.boxed()))
        }

        Expr::NewStruct(name) => Ok(Type::Ptr(Type::Struct(name.clone()).boxed())),
    }
}

fn type_of_literal(lit: &Literal, symbols: &ScopeStack<Type>) -> Result<Type, CheckerError> {
    match lit {
        Literal::Char(_) => Ok(Type::Char),
        Literal::Int(_) => Ok(Type::Int),
        Literal::Bool(_) => Ok(Type::Bool),
        Literal::Str(_) => Ok(Type::StringT),
        Literal::Null => Ok(Type::Pair(Type::Arb.boxed(), Type::Arb.boxed())),
        Literal::Array(elems) => {
            let Some(first) = elems.first() else {
                return Ok(Type::Array(Type::Arb.boxed()));
            };

            let elem_ty = type_of(first, symbols)?;
            for elem in &elems[1..] {
                let other = type_of(elem, symbols)?;
                if !elem_ty.matches(&other) {
                    return Err(CheckerError::typing(format!(
                        "array literal elements have mismatched types: {} and {}",
                        elem_ty, other
                    )));
                }
            }

            Ok(Type::Array(elem_ty.boxed()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::ErrorKind;

    fn scope(bindings: &[(&str, Type)]) -> ScopeStack<Type> {
        let mut symbols = ScopeStack::new();
        for (name, ty) in bindings {
            symbols.add_symbol(name.to_string(), ty.clone()).unwrap();
        }

        symbols
    }

    fn int(value: i64) -> Expr {
        Expr::Lit(Literal::Int(value))
    }

    #[test]
    fn literals_have_their_obvious_types() {
        let symbols = scope(&[]);

        assert_eq!(type_of(&int(1), &symbols), Ok(Type::Int));
        assert_eq!(
            type_of(&Expr::Lit(Literal::Str("hi".to_string())), &symbols),
            Ok(Type::StringT)
        );
        assert_eq!(
            type_of(&Expr::Lit(Literal::Null), &symbols),
            Ok(Type::Pair(Type::Arb.boxed(), Type::Arb.boxed()))
        );
        assert_eq!(
            type_of(&Expr::Lit(Literal::Array(Vec::new())), &symbols),
            Ok(Type::Array(Type::Arb.boxed()))
        );
    }

    #[test]
    fn array_literals_take_the_common_element_type() {
        let symbols = scope(&[]);

        assert_eq!(
            type_of(&Expr::Lit(Literal::Array(vec![int(1), int(2)])), &symbols),
            Ok(Type::Array(Type::Int.boxed()))
        );

        let mixed = Expr::Lit(Literal::Array(vec![int(1), Expr::Lit(Literal::Bool(true))]));
        assert_eq!(type_of(&mixed, &symbols).unwrap_err().kind, ErrorKind::Type);
    }

    #[test]
    fn array_elements_peel_one_layer_per_index() {
        let grid = Type::Array(Type::Array(Type::Char.boxed()).boxed());
        let symbols = scope(&[("grid", grid)]);

        let once = Expr::ArrElem("grid".to_string(), vec![int(0)]);
        assert_eq!(type_of(&once, &symbols), Ok(Type::Array(Type::Char.boxed())));

        let twice = Expr::ArrElem("grid".to_string(), vec![int(0), int(1)]);
        assert_eq!(type_of(&twice, &symbols), Ok(Type::Char));

        let too_deep = Expr::ArrElem("grid".to_string(), vec![int(0), int(1), int(2)]);
        assert_eq!(
            type_of(&too_deep, &symbols).unwrap_err().kind,
            ErrorKind::Type
        );
    }

    #[test]
    fn array_indices_must_be_int() {
        let symbols = scope(&[("xs", Type::Array(Type::Int.boxed()))]);

        let bad = Expr::ArrElem("xs".to_string(), vec![Expr::Lit(Literal::Bool(true))]);
        assert_eq!(type_of(&bad, &symbols).unwrap_err().kind, ErrorKind::Type);
    }

    #[test]
    fn comparison_works_on_ints_and_chars_only() {
        let symbols = scope(&[]);

        let chars = Expr::BinApp(
            BinaryOp::Less,
            Expr::Lit(Literal::Char('a')).boxed(),
            Expr::Lit(Literal::Char('b')).boxed(),
        );
        assert_eq!(type_of(&chars, &symbols), Ok(Type::Bool));

        let bools = Expr::BinApp(
            BinaryOp::Less,
            Expr::Lit(Literal::Bool(true)).boxed(),
            Expr::Lit(Literal::Bool(false)).boxed(),
        );
        assert_eq!(type_of(&bools, &symbols).unwrap_err().kind, ErrorKind::Type);
    }

    #[test]
    fn equality_requires_matching_operand_types() {
        let symbols = scope(&[]);

        let same = Expr::BinApp(BinaryOp::Eq, int(1).boxed(), int(2).boxed());
        assert_eq!(type_of(&same, &symbols), Ok(Type::Bool));

        let mixed = Expr::BinApp(
            BinaryOp::Eq,
            int(1).boxed(),
            Expr::Lit(Literal::Bool(true)).boxed(),
        );
        assert_eq!(type_of(&mixed, &symbols).unwrap_err().kind, ErrorKind::Type);
    }

    #[test]
    fn pointers_round_trip_through_addr_and_deref() {
        let symbols = scope(&[("x", Type::Int)]);

        let addr = Expr::UnApp(UnaryOp::AddrOf, Expr::Ident("x".to_string()).boxed());
        assert_eq!(type_of(&addr, &symbols), Ok(Type::Ptr(Type::Int.boxed())));

        let symbols = scope(&[("p", Type::Ptr(Type::Char.boxed()))]);
        let deref = Expr::UnApp(UnaryOp::Deref, Expr::Ident("p".to_string()).boxed());
        assert_eq!(type_of(&deref, &symbols), Ok(Type::Char));

        let bad = Expr::UnApp(UnaryOp::Deref, int(1).boxed());
        assert_eq!(type_of(&bad, &symbols).unwrap_err().kind, ErrorKind::Type);
    }

    #[test]
    fn calls_check_arity_then_argument_types() {
        let fun = Type::Fun(
            Type::Bool.boxed(),
            vec![("c".to_string(), Type::Char)],
        );
        let symbols = scope(&[("classify", fun)]);

        let ok = Expr::FunCall("classify".to_string(), vec![Expr::Lit(Literal::Char('x'))]);
        assert_eq!(type_of(&ok, &symbols), Ok(Type::Bool));

        let wrong_arity = Expr::FunCall("classify".to_string(), Vec::new());
        assert_eq!(
            type_of(&wrong_arity, &symbols).unwrap_err().kind,
            ErrorKind::Semantic
        );

        let wrong_type = Expr::FunCall("classify".to_string(), vec![int(1)]);
        assert_eq!(
            type_of(&wrong_type, &symbols).unwrap_err().kind,
            ErrorKind::Type
        );
    }

    #[test]
    fn calling_a_non_function_is_semantic() {
        let symbols = scope(&[("x", Type::Int)]);

        let call = Expr::FunCall("x".to_string(), Vec::new());
        assert_eq!(
            type_of(&call, &symbols).unwrap_err().kind,
            ErrorKind::Semantic
        );
    }

    #[test]
    fn undefined_identifiers_are_semantic() {
        let symbols = scope(&[]);

        let err = type_of(&Expr::Ident("ghost".to_string()), &symbols).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
        assert!(err.message.contains("undefined identifier"));
    }
}
