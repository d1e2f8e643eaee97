use pretty_assertions::assert_eq;

use wacc::compile::ast::{AnnotatedProgram, Definition, Statement, StatementId};
use wacc::compile::{CheckerError, ErrorKind, Frontend};

fn run(src: &str) -> Result<AnnotatedProgram, CheckerError> {
    Frontend::new().source(src).run()
}

fn run_implicit(src: &str) -> Result<AnnotatedProgram, CheckerError> {
    Frontend::new().source(src).implicit_main(true).run()
}

fn collect_ids(stmt: &Statement, out: &mut Vec<StatementId>) {
    match stmt {
        Statement::Identified(inner, id) => {
            out.push(*id);
            collect_ids(inner, out);
        }
        Statement::Block(stmts) => stmts.iter().for_each(|s| collect_ids(s, out)),
        Statement::Cond(_, then, otherwise) => {
            collect_ids(then, out);
            collect_ids(otherwise, out);
        }
        Statement::Loop(_, body) => collect_ids(body, out),
        _ => {}
    }
}

fn program_ids(program: &AnnotatedProgram) -> Vec<StatementId> {
    let mut ids = Vec::new();
    for def in &program.definitions {
        if let Definition::FunDef(_, body) = def {
            collect_ids(body, &mut ids);
        }
    }

    ids
}

#[test]
fn bare_global_statements_need_the_implicit_main_convention() {
    let src = "begin int x = 3; x = x + 1 end";

    let err = run(src).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.message, "program has no main function");

    let program = run_implicit(src).unwrap();
    assert_eq!(program.definitions.len(), 2);
}

#[test]
fn a_program_without_main_is_rejected_even_when_type_correct() {
    let err = run("begin int f() is return 1 end end").unwrap_err();

    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.message, "program has no main function");
}

#[test]
fn loose_statements_beside_a_real_main_are_allowed() {
    assert!(run("begin int main() is skip end; println 1 end").is_ok());
}

#[test]
fn returning_the_wrong_type_is_a_type_error() {
    let err = run("begin int f() is return true end end").unwrap_err();

    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(err.location().unwrap().line, 1);
    assert!(err.message.contains("int"));
    assert!(err.message.contains("bool"));
}

#[test]
fn partial_return_coverage_is_semantic() {
    let err = run("begin int f() is if true then return 1 else skip fi end end").unwrap_err();

    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.message, "not all code paths return a value");
    assert_eq!(err.location().unwrap().line, 1);
}

#[test]
fn coverage_failures_point_at_the_offending_line() {
    let src = "begin int main() is skip end;\n\
               int f() is\n\
               if true then return 1 else skip fi\n\
               end end";
    let err = run(src).unwrap_err();

    assert_eq!(err.message, "not all code paths return a value");
    assert_eq!(err.location().unwrap().line, 3);
}

#[test]
fn main_cannot_return_a_value() {
    let err = run("begin int main() is return 0 end end").unwrap_err();

    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.message, "cannot return a value from the global scope");
}

#[test]
fn main_may_exit() {
    assert!(run("begin int main() is exit 0 end end").is_ok());
}

#[test]
fn a_two_function_program_checks_out() {
    let program =
        run("begin int main() is skip end; int f(int x) is return x + 1 end end").unwrap();

    assert_eq!(program.definitions.len(), 2);

    let ids = program_ids(&program);
    assert!(ids.len() >= 2);
    for id in &ids {
        assert!(program.locations.location(*id).is_some());
    }
}

#[test]
fn for_loops_share_one_id_saved_at_the_for_keyword() {
    let src = "begin int main() is for (int i = 0; i < 10; i = i + 1) do skip done end end";
    let program = run(src).unwrap();

    let ids = program_ids(&program);

    // Four desugared statements share the for's id; the skip in the
    // body keeps its own.
    let for_id = ids[0];
    let shared = ids.iter().filter(|id| **id == for_id).count();
    assert_eq!(shared, 4);

    let location = program.locations.location(for_id).unwrap();
    let offset = src.find("for").unwrap();
    assert_eq!(location.line, 1);
    assert_eq!(location.column as usize, offset + 1);
}

#[test]
fn ids_are_unique_and_every_id_is_located() {
    let src = "begin int main() is \
               int x = 0; \
               while x < 3 do x = x + 1 done; \
               if x == 3 then println \"ok\" else exit 1 fi \
               end end";
    let program = run(src).unwrap();

    let ids = program_ids(&program);
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();

    assert_eq!(sorted.len(), ids.len());
    for id in &ids {
        assert!(program.locations.location(*id).is_some());
    }
    assert_eq!(program.locations.counter() as usize, program.locations.len());
}

#[test]
fn diagnostics_render_kind_line_and_column() {
    let err = run("begin int f() is return true end end").unwrap_err();
    let rendered = err.to_string();

    assert!(rendered.starts_with("Type Error in statement on line 1, column "));
    assert!(rendered.contains("expected int, got bool"));

    let err = run("begin int main() is skip end end extra").unwrap_err();
    assert!(err.to_string().starts_with("Syntax Error"));
}

#[test]
fn undefined_identifiers_are_caught_in_scope() {
    let err = run("begin int main() is begin int y = 1; skip end; println y end end").unwrap_err();

    assert_eq!(err.kind, ErrorKind::Semantic);
    assert!(err.message.contains("undefined identifier y"));
}

#[test]
fn inline_assembly_is_captured_verbatim() {
    let src = "begin int main() is begin inline mov r0, r1 end end end";
    let program = run(src).unwrap();

    fn find_asm(stmt: &Statement) -> Option<Vec<String>> {
        match stmt {
            Statement::Identified(inner, _) => find_asm(inner),
            Statement::Block(stmts) => stmts.iter().find_map(find_asm),
            Statement::InlineAssembly(lines) => Some(lines.clone()),
            _ => None,
        }
    }

    let Definition::FunDef(_, body) = &program.definitions[0] else {
        panic!("expected main");
    };
    let lines = find_asm(body).expect("inline assembly should survive parsing");
    assert_eq!(lines, vec![" mov r0, r1 ".to_string()]);
}

#[test]
fn parse_print_parse_is_structurally_stable() {
    let src = "begin \
               int main() is \
               int x = 0; \
               pair(int, char) p = newpair(1, 'a'); \
               int[] xs = [1, 2, 3]; \
               while x < 3 do x = x + 1; print xs[x - 1] done; \
               if x == 3 then println \"done\" else exit 1 fi \
               end; \
               int f(int y) is return y * 2 end \
               end";

    let first = run(src).unwrap();

    let printed = format!(
        "begin {} end",
        first
            .definitions
            .iter()
            .map(|def| def.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    );

    let second = run(&printed).unwrap();

    fn normalize(def: &Definition) -> Definition {
        match def {
            Definition::FunDef(decl, body) => {
                Definition::FunDef(decl.clone(), body.unidentified())
            }
            other => other.clone(),
        }
    }

    assert_eq!(
        first.definitions.iter().map(normalize).collect::<Vec<_>>(),
        second.definitions.iter().map(normalize).collect::<Vec<_>>(),
    );
}

#[test]
fn struct_definitions_and_news_round_through_the_checker() {
    let src = "begin \
               struct point is int x; int y end; \
               int main() is struct point* p = news point; skip end \
               end";

    assert!(run(src).is_ok());
}

#[test]
fn out_of_range_integer_literals_are_syntax_errors() {
    let err = run("begin int main() is int x = 9223372036854775808 end end").unwrap_err();

    assert_eq!(err.kind, ErrorKind::Syntax);

    assert!(run("begin int main() is int x = -9223372036854775808 end end").is_ok());
}

#[test]
fn null_matches_any_pair_type() {
    let src = "begin int main() is \
               pair(int, char) p = null; \
               free p \
               end end";

    assert!(run(src).is_ok());
}
