use std::fmt::Display;

use chumsky::input::{Input, Stream};
use chumsky::Parser;
use thiserror::Error;

use crate::compile::ast::{
    AnnotatedProgram, Definition, LineIndex, Location, LocationData, Statement, Type, GLOBAL_BLOCK,
};
use crate::compile::parser::lex::lexer;
use crate::compile::parser::parse::{program_parser, Item};
use crate::compile::semantic::SemanticAnalysis;

pub mod ast;
pub mod parser;
pub mod semantic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Semantic,
    Type,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax => write!(f, "Syntax Error"),
            Self::Semantic => write!(f, "Semantic Error"),
            Self::Type => write!(f, "Type Error"),
        }
    }
}

/// Where a diagnostic points, if anywhere. Renders as the
/// ` in statement on line L, column C` clause, or as nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorPosition(pub Option<Location>);

impl Display for ErrorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(Location { line, column }) => {
                write!(f, " in statement on line {}, column {}", line, column)
            }
            None => Ok(()),
        }
    }
}

/// The single diagnostic the front-end reports. Semantic and type
/// errors are raised without a position and pick one up while
/// propagating through `Statement::Identified` boundaries.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}{position}: {message}")]
pub struct CheckerError {
    pub kind: ErrorKind,
    pub position: ErrorPosition,
    pub message: String,
}

impl CheckerError {
    pub fn syntax(message: impl Into<String>) -> CheckerError {
        CheckerError {
            kind: ErrorKind::Syntax,
            position: ErrorPosition::default(),
            message: message.into(),
        }
    }

    pub fn semantic(message: impl Into<String>) -> CheckerError {
        CheckerError {
            kind: ErrorKind::Semantic,
            position: ErrorPosition::default(),
            message: message.into(),
        }
    }

    pub fn typing(message: impl Into<String>) -> CheckerError {
        CheckerError {
            kind: ErrorKind::Type,
            position: ErrorPosition::default(),
            message: message.into(),
        }
    }

    pub fn location(&self) -> Option<Location> {
        self.position.0
    }

    /// Replaces any previously attached location: when an error crosses
    /// nested identified statements, the outermost wrap wins.
    pub fn at(mut self, location: Location) -> CheckerError {
        self.position = ErrorPosition(Some(location));
        self
    }
}

macro_rules! pipeline_error {
    ($msg:expr) => {
        panic!("front-end pipeline encountered an error: {}", $msg)
    };
}

/// The analysis pipeline: source text in, annotated program out.
#[derive(Debug, Clone, Default)]
pub struct Frontend {
    source: Option<String>,
    implicit_main: bool,
    program: Option<AnnotatedProgram>,
}

impl Frontend {
    pub fn new() -> Frontend {
        Frontend::default()
    }

    pub fn source(&mut self, source: impl Into<String>) -> &mut Self {
        self.source = Some(source.into());

        self
    }

    /// When enabled, loose program-scope statements become the body of
    /// an implicit `int main()` instead of being rejected later.
    pub fn implicit_main(&mut self, enabled: bool) -> &mut Self {
        self.implicit_main = enabled;

        self
    }

    pub fn run(&mut self) -> Result<AnnotatedProgram, CheckerError> {
        self.parse()?.analyze()?;

        Ok(self.program.take().unwrap())
    }

    fn parse(&mut self) -> Result<&mut Self, CheckerError> {
        let Some(ref source) = self.source else {
            pipeline_error!("no source provided")
        };
        let src = source.as_str();

        let index = LineIndex::new(src);

        let tokens = match lexer().parse(src).into_result() {
            Ok(tokens) => tokens,
            Err(errs) => {
                let err = errs.into_iter().next().unwrap();
                let location = index.locate(err.span().start);

                return Err(CheckerError::syntax(err.to_string()).at(location));
            }
        };

        let stream = Stream::from_iter(tokens.into_iter())
            .map((src.len()..src.len()).into(), |(t, s): (_, _)| (t, s));

        let mut state = chumsky::extra::SimpleState(LocationData::new(index.clone()));
        let items = match program_parser()
            .parse_with_state(stream, &mut state)
            .into_result()
        {
            Ok(items) => items,
            Err(errs) => {
                let err = errs.into_iter().next().unwrap();
                let location = index.locate(err.span().start);

                return Err(CheckerError::syntax(err.to_string()).at(location));
            }
        };

        self.program = Some(assemble(items, self.implicit_main, state.0));

        Ok(self)
    }

    fn analyze(&mut self) -> Result<&mut Self, CheckerError> {
        let Some(ref program) = self.program else {
            pipeline_error!("no program parsed")
        };

        SemanticAnalysis::analyze(program)?;

        Ok(self)
    }
}

/// Splits program-scope items into definitions and loose statements.
/// Loose statements become an implicit `main` where the convention
/// allows it, and an anonymous global block otherwise; the checker
/// rejects the latter.
fn assemble(items: Vec<Item>, implicit_main: bool, locations: LocationData) -> AnnotatedProgram {
    let mut definitions = Vec::new();
    let mut loose = Vec::new();

    for item in items {
        match item {
            Item::Def(def) => definitions.push(def),
            Item::Stmt(stmt) => loose.push(stmt),
        }
    }

    if !loose.is_empty() {
        let has_main = definitions
            .iter()
            .any(|def| matches!(def, Definition::FunDef((name, _), _) if name == "main"));

        let name = if implicit_main && !has_main {
            "main"
        } else {
            GLOBAL_BLOCK
        };

        definitions.push(Definition::FunDef(
            (name.to_string(), Type::Fun(Type::Int.boxed(), Vec::new())),
            Statement::Block(loose),
        ));
    }

    AnnotatedProgram {
        definitions,
        locations,
    }
}
