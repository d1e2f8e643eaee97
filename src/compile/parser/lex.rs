use chumsky::prelude::*;

use super::Spanned;

#[derive(Clone, Debug, PartialEq)]
#[allow(non_camel_case_types)]
pub enum Token {
    IDENT(String),
    NUM(String),
    CHAR_LIT(char),
    STR_LIT(String),
    /// Raw text of a `begin inline … end` block, captured verbatim.
    ASM(String),
    BEGIN,
    END,
    IS,
    SKIP,
    RETURN,
    BREAK,
    CONTINUE,
    IF,
    THEN,
    ELSE,
    FI,
    WHILE,
    DO,
    DONE,
    FOR,
    CALL,
    NEWPAIR,
    NEWS,
    NULL,
    TRUE,
    FALSE,
    FST,
    SND,
    PAIR,
    STRUCT,
    EXTERN,
    READ,
    FREE,
    EXIT,
    PRINT,
    PRINTLN,
    INLINE,
    LEN,
    ORD,
    CHR,
    INT,
    BOOL,
    CHAR,
    STRING,
    L_ROUND,
    R_ROUND,
    L_SQUARE,
    R_SQUARE,
    COMMA,
    SEMICOLON,
    EQ,
    PLUS,
    MINUS,
    STAR,
    SLASH,
    PERCENT,
    BANG,
    AMPERSAND,
    CARET,
    PIPE,
    LOGICAL_AND,
    LOGICAL_OR,
    SHIFT_LEFT,
    SHIFT_RIGHT,
    LESS,
    LESS_EQ,
    GREATER,
    GREATER_EQ,
    EQ_EQ,
    NOT_EQ,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::IDENT(name) => write!(f, "{}", name),
            Token::NUM(digits) => write!(f, "{}", digits),
            Token::CHAR_LIT(c) => write!(f, "'{}'", c),
            Token::STR_LIT(s) => write!(f, "\"{}\"", s),
            Token::ASM(_) => write!(f, "inline assembly"),
            Token::BEGIN => write!(f, "begin"),
            Token::END => write!(f, "end"),
            Token::IS => write!(f, "is"),
            Token::SKIP => write!(f, "skip"),
            Token::RETURN => write!(f, "return"),
            Token::BREAK => write!(f, "break"),
            Token::CONTINUE => write!(f, "continue"),
            Token::IF => write!(f, "if"),
            Token::THEN => write!(f, "then"),
            Token::ELSE => write!(f, "else"),
            Token::FI => write!(f, "fi"),
            Token::WHILE => write!(f, "while"),
            Token::DO => write!(f, "do"),
            Token::DONE => write!(f, "done"),
            Token::FOR => write!(f, "for"),
            Token::CALL => write!(f, "call"),
            Token::NEWPAIR => write!(f, "newpair"),
            Token::NEWS => write!(f, "news"),
            Token::NULL => write!(f, "null"),
            Token::TRUE => write!(f, "true"),
            Token::FALSE => write!(f, "false"),
            Token::FST => write!(f, "fst"),
            Token::SND => write!(f, "snd"),
            Token::PAIR => write!(f, "pair"),
            Token::STRUCT => write!(f, "struct"),
            Token::EXTERN => write!(f, "extern"),
            Token::READ => write!(f, "read"),
            Token::FREE => write!(f, "free"),
            Token::EXIT => write!(f, "exit"),
            Token::PRINT => write!(f, "print"),
            Token::PRINTLN => write!(f, "println"),
            Token::INLINE => write!(f, "inline"),
            Token::LEN => write!(f, "len"),
            Token::ORD => write!(f, "ord"),
            Token::CHR => write!(f, "chr"),
            Token::INT => write!(f, "int"),
            Token::BOOL => write!(f, "bool"),
            Token::CHAR => write!(f, "char"),
            Token::STRING => write!(f, "string"),
            Token::L_ROUND => write!(f, "("),
            Token::R_ROUND => write!(f, ")"),
            Token::L_SQUARE => write!(f, "["),
            Token::R_SQUARE => write!(f, "]"),
            Token::COMMA => write!(f, ","),
            Token::SEMICOLON => write!(f, ";"),
            Token::EQ => write!(f, "="),
            Token::PLUS => write!(f, "+"),
            Token::MINUS => write!(f, "-"),
            Token::STAR => write!(f, "*"),
            Token::SLASH => write!(f, "/"),
            Token::PERCENT => write!(f, "%"),
            Token::BANG => write!(f, "!"),
            Token::AMPERSAND => write!(f, "&"),
            Token::CARET => write!(f, "^"),
            Token::PIPE => write!(f, "|"),
            Token::LOGICAL_AND => write!(f, "&&"),
            Token::LOGICAL_OR => write!(f, "||"),
            Token::SHIFT_LEFT => write!(f, "<<"),
            Token::SHIFT_RIGHT => write!(f, ">>"),
            Token::LESS => write!(f, "<"),
            Token::LESS_EQ => write!(f, "<="),
            Token::GREATER => write!(f, ">"),
            Token::GREATER_EQ => write!(f, ">="),
            Token::EQ_EQ => write!(f, "=="),
            Token::NOT_EQ => write!(f, "!="),
        }
    }
}

type ErrorParserExtra<'src> = extra::Err<Rich<'src, char, SimpleSpan>>;

fn escape<'src>() -> impl Parser<'src, &'src str, char, ErrorParserExtra<'src>> {
    just('\\').ignore_then(choice((
        just('\\').to('\\'),
        just('"').to('"'),
        just('\'').to('\''),
        just('0').to('\0'),
        just('n').to('\n'),
        just('r').to('\r'),
        just('v').to('\u{b}'),
        just('t').to('\t'),
        just('b').to('\u{8}'),
        just('f').to('\u{c}'),
    )))
}

pub fn lexer<'src>()
-> impl Parser<'src, &'src str, Vec<Spanned<Token>>, ErrorParserExtra<'src>> {
    let ident = text::ascii::ident().map(|ident| match ident {
        "begin" => Token::BEGIN,
        "end" => Token::END,
        "is" => Token::IS,
        "skip" => Token::SKIP,
        "return" => Token::RETURN,
        "break" => Token::BREAK,
        "continue" => Token::CONTINUE,
        "if" => Token::IF,
        "then" => Token::THEN,
        "else" => Token::ELSE,
        "fi" => Token::FI,
        "while" => Token::WHILE,
        "do" => Token::DO,
        "done" => Token::DONE,
        "for" => Token::FOR,
        "call" => Token::CALL,
        "newpair" => Token::NEWPAIR,
        "news" => Token::NEWS,
        "null" => Token::NULL,
        "true" => Token::TRUE,
        "false" => Token::FALSE,
        "fst" => Token::FST,
        "snd" => Token::SND,
        "pair" => Token::PAIR,
        "struct" => Token::STRUCT,
        "extern" => Token::EXTERN,
        "read" => Token::READ,
        "free" => Token::FREE,
        "exit" => Token::EXIT,
        "print" => Token::PRINT,
        "println" => Token::PRINTLN,
        "inline" => Token::INLINE,
        "len" => Token::LEN,
        "ord" => Token::ORD,
        "chr" => Token::CHR,
        "int" => Token::INT,
        "bool" => Token::BOOL,
        "char" => Token::CHAR,
        "string" => Token::STRING,
        _ => Token::IDENT(ident.to_string()),
    });

    let num = text::digits(10)
        .to_slice()
        .map(|digits: &str| Token::NUM(digits.to_string()));

    let char_lit = escape()
        .or(none_of("\\'\""))
        .delimited_by(just('\''), just('\''))
        .map(Token::CHAR_LIT);

    let str_lit = escape()
        .or(none_of("\\'\""))
        .repeated()
        .collect::<String>()
        .delimited_by(just('"'), just('"'))
        .map(Token::STR_LIT);

    // The body of an inline-assembly block is arbitrary text, so it is
    // swallowed here rather than forced through the token rules.
    let inline_asm = just("begin")
        .ignore_then(text::whitespace().at_least(1))
        .ignore_then(just("inline"))
        .then_ignore(any().filter(|c: &char| c.is_whitespace()).rewind())
        .ignore_then(
            any()
                .and_is(just("end").not())
                .repeated()
                .collect::<String>(),
        )
        .then_ignore(just("end"))
        .map(Token::ASM);

    let symbol = choice((
        just("&&").to(Token::LOGICAL_AND),
        just("||").to(Token::LOGICAL_OR),
        just("<<").to(Token::SHIFT_LEFT),
        just(">>").to(Token::SHIFT_RIGHT),
        just("<=").to(Token::LESS_EQ),
        just(">=").to(Token::GREATER_EQ),
        just("==").to(Token::EQ_EQ),
        just("!=").to(Token::NOT_EQ),
        just("(").to(Token::L_ROUND),
        just(")").to(Token::R_ROUND),
        just("[").to(Token::L_SQUARE),
        just("]").to(Token::R_SQUARE),
        just(",").to(Token::COMMA),
        just(";").to(Token::SEMICOLON),
        just("=").to(Token::EQ),
        just("+").to(Token::PLUS),
        just("-").to(Token::MINUS),
        just("*").to(Token::STAR),
        just("/").to(Token::SLASH),
        just("%").to(Token::PERCENT),
        just("!").to(Token::BANG),
        just("&").to(Token::AMPERSAND),
        just("^").to(Token::CARET),
        just("|").to(Token::PIPE),
        just("<").to(Token::LESS),
        just(">").to(Token::GREATER),
    ));

    let comment = just("#")
        .then(any().and_is(text::newline().not()).repeated())
        .padded()
        .to(())
        .boxed();

    choice((inline_asm, num, char_lit, str_lit, ident, symbol))
        .map_with(|token, ctx| (token, ctx.span()))
        .padded_by(comment.repeated())
        .padded()
        .repeated()
        .collect()
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        lexer()
            .parse(src)
            .into_result()
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn keywords_do_not_swallow_longer_identifiers() {
        assert_eq!(lex("returnX"), vec![Token::IDENT("returnX".to_string())]);
        assert_eq!(
            lex("return x"),
            vec![Token::RETURN, Token::IDENT("x".to_string())]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            lex("skip # the rest is noise\nskip"),
            vec![Token::SKIP, Token::SKIP]
        );
    }

    #[test]
    fn escapes_are_decoded_in_literals() {
        assert_eq!(lex("'\\n'"), vec![Token::CHAR_LIT('\n')]);
        assert_eq!(lex("'\\0'"), vec![Token::CHAR_LIT('\0')]);
        assert_eq!(
            lex("\"a\\tb\\\"c\""),
            vec![Token::STR_LIT("a\tb\"c".to_string())]
        );
    }

    #[test]
    fn bare_escape_source_characters_fail() {
        assert!(lexer().parse("\"a\"b\"").into_result().is_err());
        assert!(lexer().parse("'''").into_result().is_err());
        assert!(lexer().parse("\"a\\qb\"").into_result().is_err());
    }

    #[test]
    fn multi_char_operators_win_over_prefixes() {
        assert_eq!(
            lex("< << <= = =="),
            vec![
                Token::LESS,
                Token::SHIFT_LEFT,
                Token::LESS_EQ,
                Token::EQ,
                Token::EQ_EQ
            ]
        );
    }

    #[test]
    fn inline_assembly_is_one_raw_token() {
        let tokens = lex("begin begin inline mov r0, #1 end end");

        assert_eq!(
            tokens,
            vec![
                Token::BEGIN,
                Token::ASM(" mov r0, #1 ".to_string()),
                Token::END
            ]
        );
    }

    #[test]
    fn numbers_keep_their_digits() {
        assert_eq!(
            lex("007 9223372036854775808"),
            vec![
                Token::NUM("007".to_string()),
                Token::NUM("9223372036854775808".to_string())
            ]
        );
    }
}
