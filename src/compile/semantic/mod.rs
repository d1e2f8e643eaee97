use crate::compile::ast::{
    AnnotatedProgram, BuiltinOp, CtrlOp, Declaration, Definition, LocationData, Statement, Type,
    GLOBAL_BLOCK, RETURN_SENTINEL,
};
use crate::compile::CheckerError;
use crate::datstructures::scope_stack::ScopeStack;

pub mod controlflow;
pub mod typecheck;

use typecheck::type_of;

fn declare(symbols: &mut ScopeStack<Type>, name: &str, ty: &Type) -> Result<(), CheckerError> {
    symbols
        .add_symbol(name.to_string(), ty.clone())
        .map_err(|err| CheckerError::semantic(err.to_string()))
}

/// Walks the annotated program under a scoped symbol table. Statement
/// checks raise errors without a position; each `Identified` boundary
/// on the way out stamps its own saved location over the error.
pub struct SemanticAnalysis<'a> {
    locations: &'a LocationData,
}

impl SemanticAnalysis<'_> {
    pub fn analyze(program: &AnnotatedProgram) -> Result<(), CheckerError> {
        SemanticAnalysis {
            locations: &program.locations,
        }
        ._analyze(&program.definitions)
    }

    fn _analyze(&self, definitions: &[Definition]) -> Result<(), CheckerError> {
        for def in definitions {
            if let Definition::FunDef((name, _), body) = def {
                // The anonymous global block is program scope, the
                // same as main: it may exit but never return.
                if name == "main" || name == GLOBAL_BLOCK {
                    controlflow::check_main_does_not_return(body, self.locations)?;
                } else {
                    controlflow::check_code_paths_return(body, self.locations)?;
                    controlflow::check_unreachable_code(body, self.locations)?;
                }
            }
        }

        // Every program-scope name goes into the global frame before
        // any body is walked, so source order does not matter for
        // references.
        let mut symbols = ScopeStack::new();
        for def in definitions {
            match def {
                Definition::FunDef((name, ty), _) => declare(&mut symbols, name, ty)?,
                Definition::GlobalDef((name, ty), _) => declare(&mut symbols, name, ty)?,
                Definition::TypeDef(_, _) => {}
            }
        }

        for def in definitions {
            match def {
                Definition::FunDef(decl, body) => self.check_function(&mut symbols, decl, body)?,
                Definition::GlobalDef((name, ty), init) => {
                    let init_ty = type_of(init, &symbols)?;
                    if !ty.matches(&init_ty) {
                        return Err(CheckerError::typing(format!(
                            "mismatched types in definition of {}: expected {}, got {}",
                            name, ty, init_ty
                        )));
                    }
                }
                Definition::TypeDef(_, _) => {}
            }
        }

        // A checked program must still name its entry point. This is
        // independent of the loose-statement bookkeeping: a program
        // made only of other functions fails here too.
        let has_main = definitions
            .iter()
            .any(|def| matches!(def, Definition::FunDef((name, _), _) if name == "main"));
        if !has_main {
            return Err(CheckerError::semantic("program has no main function"));
        }

        Ok(())
    }

    fn check_function(
        &self,
        symbols: &mut ScopeStack<Type>,
        (name, ty): &Declaration,
        body: &Statement,
    ) -> Result<(), CheckerError> {
        let Type::Fun(ret, params) = ty else {
            return Err(CheckerError::semantic(format!(
                "{} is not a function",
                name
            )));
        };

        symbols.scoped(|symbols| {
            for (pname, pty) in params {
                declare(symbols, pname, pty)?;
            }
            declare(symbols, RETURN_SENTINEL, ret)?;

            self.check_stmt(symbols, body)
        })
    }

    fn check_stmt(
        &self,
        symbols: &mut ScopeStack<Type>,
        stmt: &Statement,
    ) -> Result<(), CheckerError> {
        match stmt {
            Statement::Identified(inner, id) => {
                self.check_stmt(symbols, inner)
                    .map_err(|err| match self.locations.location(*id) {
                        Some(location) => err.at(location),
                        None => err,
                    })
            }

            Statement::Noop
            | Statement::Ctrl(CtrlOp::Break)
            | Statement::Ctrl(CtrlOp::Continue)
            | Statement::ExternDecl(_)
            | Statement::InlineAssembly(_) => Ok(()),

            Statement::Block(stmts) => symbols.scoped(|symbols| {
                stmts
                    .iter()
                    .try_for_each(|stmt| self.check_stmt(symbols, stmt))
            }),

            // The binding only becomes visible after its initializer,
            // so the initializer cannot refer to it.
            Statement::VarDef((name, ty), init) => {
                let init_ty = type_of(init, symbols)?;
                if !ty.matches(&init_ty) {
                    return Err(CheckerError::typing(format!(
                        "mismatched types in definition of {}: expected {}, got {}",
                        name, ty, init_ty
                    )));
                }

                declare(symbols, name, ty)
            }

            Statement::Assign(lhs, rhs) => {
                let target = type_of(lhs, symbols)?;
                let value = type_of(rhs, symbols)?;

                if !target.matches(&value) {
                    return Err(CheckerError::typing(format!(
                        "cannot assign {} to a target of type {}",
                        value, target
                    )));
                }

                Ok(())
            }

            Statement::Ctrl(CtrlOp::Return(e)) => {
                let expected = symbols
                    .lookup(RETURN_SENTINEL)
                    .cloned()
                    .map_err(|err| CheckerError::semantic(err.to_string()))?;
                let actual = type_of(e, symbols)?;

                if !expected.matches(&actual) {
                    return Err(CheckerError::typing(format!(
                        "return type mismatch: expected {}, got {}",
                        expected, actual
                    )));
                }

                Ok(())
            }

            // The test's type is deliberately not constrained here;
            // only loop conditions are.
            Statement::Cond(test, then, otherwise) => {
                type_of(test, symbols)?;
                symbols.scoped(|symbols| self.check_stmt(symbols, then))?;
                symbols.scoped(|symbols| self.check_stmt(symbols, otherwise))
            }

            Statement::Loop(test, body) => {
                let test_ty = type_of(test, symbols)?;
                if !test_ty.matches(&Type::Bool) {
                    return Err(CheckerError::typing(format!(
                        "loop condition must be bool, got {}",
                        test_ty
                    )));
                }

                symbols.scoped(|symbols| self.check_stmt(symbols, body))
            }

            Statement::Builtin(op, e) => {
                if *op == BuiltinOp::Read && !e.is_assignable() {
                    return Err(CheckerError::syntax(
                        "read target must be an assignable expression",
                    ));
                }

                let ty = type_of(e, symbols)?;
                match op {
                    BuiltinOp::Free => match ty {
                        Type::Pair(_, _) | Type::Array(_) | Type::Arb => Ok(()),
                        other => Err(CheckerError::semantic(format!(
                            "free target must be a pair or an array, got {}",
                            other
                        ))),
                    },
                    BuiltinOp::Exit => {
                        if ty.matches(&Type::Int) {
                            Ok(())
                        } else {
                            Err(CheckerError::typing(format!(
                                "exit status must be int, got {}",
                                ty
                            )))
                        }
                    }
                    _ => Ok(()),
                }
            }

            Statement::ExpStmt(e) => type_of(e, symbols).map(|_| ()),
        }
    }
}
