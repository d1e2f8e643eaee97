use std::process::Termination;

use crate::compile::{CheckerError, ErrorKind};

pub struct ExitCode(u8);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAIL_IO: ExitCode = ExitCode(255);
}

impl Termination for ExitCode {
    fn report(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self.0)
    }
}

/// The three configurable failure codes, one per error kind. Defaults
/// follow the classic WACC convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCodes {
    pub syntax: u8,
    pub semantic: u8,
    pub typing: u8,
}

impl Default for ErrorCodes {
    fn default() -> Self {
        ErrorCodes {
            syntax: 100,
            semantic: 200,
            typing: 200,
        }
    }
}

/// Selects the configured exit code matching the error's kind.
pub fn error_exit_code(err: &CheckerError, codes: ErrorCodes) -> ExitCode {
    let code = match err.kind {
        ErrorKind::Syntax => codes.syntax,
        ErrorKind::Semantic => codes.semantic,
        ErrorKind::Type => codes.typing,
    };

    ExitCode(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_selects_its_own_code() {
        let codes = ErrorCodes {
            syntax: 11,
            semantic: 22,
            typing: 33,
        };

        assert_eq!(error_exit_code(&CheckerError::syntax("x"), codes).0, 11);
        assert_eq!(error_exit_code(&CheckerError::semantic("x"), codes).0, 22);
        assert_eq!(error_exit_code(&CheckerError::typing("x"), codes).0, 33);
    }

    #[test]
    fn defaults_follow_the_wacc_convention() {
        let codes = ErrorCodes::default();

        assert_eq!(codes.syntax, 100);
        assert_eq!(codes.semantic, 200);
        assert_eq!(codes.typing, 200);
    }
}
