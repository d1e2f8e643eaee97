use chumsky::input::ValueInput;
use chumsky::prelude::*;

use crate::compile::ast::{
    BinaryOp, BuiltinOp, CtrlOp, Definition, Expr, Literal, LocationData, PairSide, Statement,
    Type, UnaryOp,
};
use crate::compile::parser::lex::Token;
use crate::compile::parser::SourcePos;

type ParserExtra<'src> =
    extra::Full<Rich<'src, Token, SourcePos>, extra::SimpleState<LocationData>, ()>;

/// One item at program scope: a definition, or a loose statement that
/// the host may fold into an implicit `main`.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Def(Definition),
    Stmt(Statement),
}

/// Draws a fresh statement id at the position of the statement's first
/// token and wraps the parsed statement in it.
fn identified<'src, I>(
    stmt: impl Parser<'src, I, Statement, ParserExtra<'src>> + Clone,
) -> impl Parser<'src, I, Statement, ParserExtra<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
{
    stmt.map_with(|stmt, ctx| {
        let start = ctx.span().start;
        let id = ctx.state().next_id(start);
        Statement::Identified(stmt.boxed(), id)
    })
}

pub fn program_parser<'src, I>() -> impl Parser<'src, I, Vec<Item>, ParserExtra<'src>>
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
{
    let items = item().separated_by(just(Token::SEMICOLON)).collect();

    just(Token::BEGIN)
        .ignore_then(items)
        .then_ignore(just(Token::END))
        .then_ignore(end())
}

fn item<'src, I>() -> impl Parser<'src, I, Item, ParserExtra<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
{
    let ident = select! { Token::IDENT(name) => name };

    let param = type_parser().then(ident).map(|(ty, name)| (name, ty));

    let body = stmt()
        .separated_by(just(Token::SEMICOLON))
        .at_least(1)
        .collect()
        .map(Statement::Block);

    let fun_def = type_parser()
        .then(ident)
        .then(
            param
                .clone()
                .separated_by(just(Token::COMMA))
                .collect::<Vec<_>>()
                .delimited_by(just(Token::L_ROUND), just(Token::R_ROUND)),
        )
        .then_ignore(just(Token::IS))
        .then(body)
        .then_ignore(just(Token::END))
        .map(|(((ret, name), params), body)| {
            Item::Def(Definition::FunDef(
                (name, Type::Fun(ret.boxed(), params)),
                body,
            ))
        });

    let type_def = just(Token::STRUCT)
        .ignore_then(ident)
        .then_ignore(just(Token::IS))
        .then(
            param
                .separated_by(just(Token::SEMICOLON))
                .at_least(1)
                .collect(),
        )
        .then_ignore(just(Token::END))
        .map(|(name, fields)| Item::Def(Definition::TypeDef(name, fields)));

    let global_def = type_parser()
        .then(ident)
        .then_ignore(just(Token::EQ))
        .then(expr())
        .map(|((ty, name), init)| Item::Def(Definition::GlobalDef((name, ty), init)));

    choice((fun_def, type_def, global_def, stmt().map(Item::Stmt)))
}

pub fn type_parser<'src, I>() -> impl Parser<'src, I, Type, ParserExtra<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
{
    #[derive(Clone, Copy)]
    enum Qualifier {
        Array,
        Pointer,
    }

    recursive(|ty| {
        let ident = select! { Token::IDENT(name) => name };

        let pair = just(Token::PAIR)
            .ignore_then(
                ty.clone()
                    .then_ignore(just(Token::COMMA))
                    .then(ty)
                    .delimited_by(just(Token::L_ROUND), just(Token::R_ROUND)),
            )
            .map(|(fst, snd): (Type, Type)| Type::Pair(fst.boxed(), snd.boxed()));

        let base = choice((
            just(Token::INT).to(Type::Int),
            just(Token::BOOL).to(Type::Bool),
            just(Token::CHAR).to(Type::Char),
            just(Token::STRING).to(Type::StringT),
            pair,
            just(Token::STRUCT).ignore_then(ident).map(Type::Struct),
        ));

        let qualifier = choice((
            just(Token::L_SQUARE)
                .ignore_then(just(Token::R_SQUARE))
                .to(Qualifier::Array),
            just(Token::STAR).to(Qualifier::Pointer),
        ));

        base.foldl(qualifier.repeated(), |inner, qualifier| match qualifier {
            Qualifier::Array => Type::Array(inner.boxed()),
            Qualifier::Pointer => Type::Ptr(inner.boxed()),
        })
    })
}

pub fn expr<'src, I>() -> impl Parser<'src, I, Expr, ParserExtra<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
{
    recursive(|expr| {
        let ident = select! { Token::IDENT(name) => name };

        // The sign is part of the literal, which keeps i64::MIN
        // writable while anything past the signed 64-bit range fails
        // the parse.
        let int_literal = choice((just(Token::MINUS).to('-'), just(Token::PLUS).to('+')))
            .or_not()
            .then(select! { Token::NUM(digits) => digits })
            .try_map(|(sign, digits), span| {
                let mut text = String::new();
                if sign == Some('-') {
                    text.push('-');
                }
                text.push_str(&digits);

                text.parse::<i64>()
                    .map(|value| Expr::Lit(Literal::Int(value)))
                    .map_err(|_| Rich::custom(span, "integer literal does not fit in 64 bits"))
            })
            .boxed();

        let array_literal = expr
            .clone()
            .separated_by(just(Token::COMMA))
            .collect()
            .delimited_by(just(Token::L_SQUARE), just(Token::R_SQUARE))
            .map(|elems| Expr::Lit(Literal::Array(elems)));

        let literal = choice((
            int_literal.clone(),
            select! {
                Token::CHAR_LIT(c) => Expr::Lit(Literal::Char(c)),
                Token::STR_LIT(s) => Expr::Lit(Literal::Str(s)),
                Token::TRUE => Expr::Lit(Literal::Bool(true)),
                Token::FALSE => Expr::Lit(Literal::Bool(false)),
                Token::NULL => Expr::Lit(Literal::Null),
            },
            array_literal,
        ))
        .boxed();

        let call = just(Token::CALL)
            .ignore_then(ident)
            .then(
                expr.clone()
                    .separated_by(just(Token::COMMA))
                    .collect()
                    .delimited_by(just(Token::L_ROUND), just(Token::R_ROUND)),
            )
            .map(|(name, args)| Expr::FunCall(name, args));

        let newpair = just(Token::NEWPAIR)
            .ignore_then(
                expr.clone()
                    .then_ignore(just(Token::COMMA))
                    .then(expr.clone())
                    .delimited_by(just(Token::L_ROUND), just(Token::R_ROUND)),
            )
            .map(|(fst, snd): (Expr, Expr)| Expr::NewPair(fst.boxed(), snd.boxed()));

        let news = just(Token::NEWS).ignore_then(ident).map(Expr::NewStruct);

        let arr_elem = ident
            .then(
                expr.clone()
                    .delimited_by(just(Token::L_SQUARE), just(Token::R_SQUARE))
                    .repeated()
                    .at_least(1)
                    .collect(),
            )
            .map(|(name, indices)| Expr::ArrElem(name, indices));

        let pair_elem = choice((
            just(Token::FST).to(PairSide::Fst),
            just(Token::SND).to(PairSide::Snd),
        ))
        .then(ident)
        .map(|(side, name)| Expr::PairElem(side, name));

        let atom = choice((
            expr.clone()
                .delimited_by(just(Token::L_ROUND), just(Token::R_ROUND)),
            call,
            newpair,
            news,
            literal,
            arr_elem,
            pair_elem,
            ident.map(Expr::Ident),
        ))
        .boxed();

        let unary_op = choice((
            just(Token::BANG).to(UnaryOp::Not),
            just(Token::MINUS).to(UnaryOp::Neg),
            just(Token::LEN).to(UnaryOp::Len),
            just(Token::ORD).to(UnaryOp::Ord),
            just(Token::CHR).to(UnaryOp::Chr),
            just(Token::STAR).to(UnaryOp::Deref),
            just(Token::AMPERSAND).to(UnaryOp::AddrOf),
        ))
        .boxed();
        let unary = choice((
            int_literal,
            unary_op
                .repeated()
                .foldr(atom, |op, rhs| Expr::UnApp(op, rhs.boxed())),
        ))
        .boxed();

        let mult_op = choice((
            just(Token::STAR).to(BinaryOp::Mul),
            just(Token::SLASH).to(BinaryOp::Div),
            just(Token::PERCENT).to(BinaryOp::Mod),
        ))
        .boxed();
        let mult = unary
            .clone()
            .foldl(mult_op.then(unary).repeated(), |a, (op, b)| {
                Expr::BinApp(op, a.boxed(), b.boxed())
            });

        let sum_op = choice((
            just(Token::PLUS).to(BinaryOp::Add),
            just(Token::MINUS).to(BinaryOp::Sub),
        ))
        .boxed();
        let sum = mult
            .clone()
            .foldl(sum_op.then(mult).repeated(), |a, (op, b)| {
                Expr::BinApp(op, a.boxed(), b.boxed())
            })
            .boxed();

        let shift_op = choice((
            just(Token::SHIFT_LEFT).to(BinaryOp::ShiftLeft),
            just(Token::SHIFT_RIGHT).to(BinaryOp::ShiftRight),
        ))
        .boxed();
        let shift = sum
            .clone()
            .foldl(shift_op.then(sum).repeated(), |a, (op, b)| {
                Expr::BinApp(op, a.boxed(), b.boxed())
            })
            .boxed();

        let int_comp_op = choice((
            just(Token::LESS_EQ).to(BinaryOp::LessEq),
            just(Token::GREATER_EQ).to(BinaryOp::GreaterEq),
            just(Token::LESS).to(BinaryOp::Less),
            just(Token::GREATER).to(BinaryOp::Greater),
        ))
        .boxed();
        let int_comp = shift
            .clone()
            .foldl(int_comp_op.then(shift).repeated(), |a, (op, b)| {
                Expr::BinApp(op, a.boxed(), b.boxed())
            });

        let comp_op = choice((
            just(Token::EQ_EQ).to(BinaryOp::Eq),
            just(Token::NOT_EQ).to(BinaryOp::NotEq),
        ))
        .boxed();
        let comp = int_comp
            .clone()
            .foldl(comp_op.then(int_comp).repeated(), |a, (op, b)| {
                Expr::BinApp(op, a.boxed(), b.boxed())
            })
            .boxed();

        let bitwise_and = comp
            .clone()
            .foldl(
                just(Token::AMPERSAND)
                    .to(BinaryOp::BitAnd)
                    .then(comp)
                    .repeated(),
                |a, (op, b)| Expr::BinApp(op, a.boxed(), b.boxed()),
            )
            .boxed();

        let bitwise_xor = bitwise_and
            .clone()
            .foldl(
                just(Token::CARET)
                    .to(BinaryOp::BitXor)
                    .then(bitwise_and)
                    .repeated(),
                |a, (op, b)| Expr::BinApp(op, a.boxed(), b.boxed()),
            )
            .boxed();

        let bitwise_or = bitwise_xor
            .clone()
            .foldl(
                just(Token::PIPE)
                    .to(BinaryOp::BitOr)
                    .then(bitwise_xor)
                    .repeated(),
                |a, (op, b)| Expr::BinApp(op, a.boxed(), b.boxed()),
            )
            .boxed();

        let logical_and = bitwise_or
            .clone()
            .foldl(
                just(Token::LOGICAL_AND)
                    .to(BinaryOp::And)
                    .then(bitwise_or)
                    .repeated(),
                |a, (op, b)| Expr::BinApp(op, a.boxed(), b.boxed()),
            )
            .boxed();

        let logical_or = logical_and
            .clone()
            .foldl(
                just(Token::LOGICAL_OR)
                    .to(BinaryOp::Or)
                    .then(logical_and)
                    .repeated(),
                |a, (op, b)| Expr::BinApp(op, a.boxed(), b.boxed()),
            )
            .boxed();

        logical_or
    })
}

pub fn stmt<'src, I>() -> impl Parser<'src, I, Statement, ParserExtra<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
{
    recursive(|stmt| {
        let ident = select! { Token::IDENT(name) => name };

        let seq = stmt
            .separated_by(just(Token::SEMICOLON))
            .at_least(1)
            .collect()
            .map(Statement::Block)
            .boxed();

        let var_def = type_parser()
            .then(ident)
            .then_ignore(just(Token::EQ))
            .then(expr())
            .map(|((ty, name), init)| Statement::VarDef((name, ty), init))
            .boxed();

        let arr_elem = ident
            .then(
                expr()
                    .delimited_by(just(Token::L_SQUARE), just(Token::R_SQUARE))
                    .repeated()
                    .at_least(1)
                    .collect(),
            )
            .map(|(name, indices)| Expr::ArrElem(name, indices));
        let pair_elem = choice((
            just(Token::FST).to(PairSide::Fst),
            just(Token::SND).to(PairSide::Snd),
        ))
        .then(ident)
        .map(|(side, name)| Expr::PairElem(side, name));
        let lvalue = choice((arr_elem, pair_elem, ident.map(Expr::Ident))).boxed();

        let assign = lvalue
            .then_ignore(just(Token::EQ))
            .then(expr())
            .map(|(lhs, rhs)| Statement::Assign(lhs, rhs))
            .boxed();

        let simp = var_def.clone().or(assign.clone()).boxed();

        let block = seq
            .clone()
            .delimited_by(just(Token::BEGIN), just(Token::END))
            .boxed();

        let control = choice((
            just(Token::RETURN)
                .ignore_then(expr())
                .map(|e| Statement::Ctrl(CtrlOp::Return(e))),
            just(Token::BREAK).to(Statement::Ctrl(CtrlOp::Break)),
            just(Token::CONTINUE).to(Statement::Ctrl(CtrlOp::Continue)),
        ))
        .boxed();

        let cond = just(Token::IF)
            .ignore_then(expr())
            .then_ignore(just(Token::THEN))
            .then(seq.clone())
            .then(just(Token::ELSE).ignore_then(seq.clone()).or_not())
            .then_ignore(just(Token::FI))
            .map(|((test, then), otherwise)| {
                Statement::Cond(
                    test,
                    then.boxed(),
                    otherwise.unwrap_or(Statement::Noop).boxed(),
                )
            })
            .boxed();

        let extern_decl = just(Token::EXTERN)
            .ignore_then(ident)
            .map(Statement::ExternDecl)
            .boxed();

        let while_loop = just(Token::WHILE)
            .ignore_then(expr())
            .then_ignore(just(Token::DO))
            .then(seq.clone())
            .then_ignore(just(Token::DONE))
            .map(|(test, body)| Statement::Loop(test, body.boxed()))
            .boxed();

        // Desugared at parse time. All four generated statements share
        // one id saved at the `for` keyword, so any diagnostic raised
        // inside them reports the loop's own position.
        let for_loop = just(Token::FOR)
            .ignore_then(
                simp.clone()
                    .then_ignore(just(Token::SEMICOLON))
                    .then(expr())
                    .then_ignore(just(Token::SEMICOLON))
                    .then(simp)
                    .delimited_by(just(Token::L_ROUND), just(Token::R_ROUND)),
            )
            .then_ignore(just(Token::DO))
            .then(seq.clone())
            .then_ignore(just(Token::DONE))
            .map_with(
                |(((init, test), step), body),
                 ctx: &mut chumsky::input::MapExtra<'src, '_, I, ParserExtra<'src>>| {
                let start = ctx.span().start;
                let id = ctx.state().next_id(start);

                Statement::Block(vec![
                    Statement::Identified(init.boxed(), id),
                    Statement::Identified(
                        Statement::Loop(
                            test,
                            Statement::Block(vec![
                                Statement::Identified(body.boxed(), id),
                                Statement::Identified(step.boxed(), id),
                            ])
                            .boxed(),
                        )
                        .boxed(),
                        id,
                    ),
                ])
            },
            )
            .boxed();

        let builtin = choice((
            just(Token::READ).to(BuiltinOp::Read),
            just(Token::FREE).to(BuiltinOp::Free),
            just(Token::EXIT).to(BuiltinOp::Exit),
            just(Token::PRINT).to(BuiltinOp::Print),
            just(Token::PRINTLN).to(BuiltinOp::PrintLn),
        ))
        .then(expr())
        .map(|(op, e)| Statement::Builtin(op, e))
        .boxed();

        let inline_asm = select! { Token::ASM(raw) => raw }
            .map(|raw: String| {
                Statement::InlineAssembly(raw.lines().map(str::to_string).collect())
            })
            .boxed();

        let skip = just(Token::SKIP).to(Statement::Noop).boxed();

        let exp_stmt = expr().map(Statement::ExpStmt).boxed();

        let plain = choice((
            inline_asm,
            block,
            var_def,
            assign,
            control,
            cond,
            extern_decl,
            while_loop,
            builtin,
            skip,
            exp_stmt,
        ))
        .boxed();

        choice((for_loop, identified(plain)))
    })
}
