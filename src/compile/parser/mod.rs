pub mod lex;
pub mod parse;

pub type SourcePos = chumsky::span::SimpleSpan;
pub type Spanned<T> = (T, SourcePos);
