use crate::compile::ast::{BuiltinOp, CtrlOp, LocationData, Statement, StatementId};
use crate::compile::CheckerError;

/// Summary of one linear execution path through a function body.
/// Counts saturate at 2: the checks only ever distinguish zero, one
/// and more-than-one, and capping the domain keeps the number of
/// distinct summaries bounded no matter how deeply branches nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSummary {
    exits: u8,
    returns: u8,
    last_is_exit: bool,
    nonempty: bool,
    /// Last identified statement on the path; where a coverage failure
    /// is reported.
    site: Option<StatementId>,
    /// First return on the path.
    return_site: Option<StatementId>,
}

impl PathSummary {
    const EMPTY: PathSummary = PathSummary {
        exits: 0,
        returns: 0,
        last_is_exit: false,
        nonempty: false,
        site: None,
        return_site: None,
    };

    fn leaf(stmt: &Statement) -> PathSummary {
        let is_return = matches!(stmt, Statement::Ctrl(CtrlOp::Return(_)));
        let is_exit = is_return || matches!(stmt, Statement::Builtin(BuiltinOp::Exit, _));

        PathSummary {
            exits: is_exit as u8,
            returns: is_return as u8,
            last_is_exit: is_exit,
            nonempty: true,
            site: None,
            return_site: None,
        }
    }

    fn then(self, rest: PathSummary) -> PathSummary {
        PathSummary {
            exits: (self.exits + rest.exits).min(2),
            returns: (self.returns + rest.returns).min(2),
            last_is_exit: if rest.nonempty {
                rest.last_is_exit
            } else {
                self.last_is_exit
            },
            nonempty: self.nonempty || rest.nonempty,
            site: rest.site.or(self.site),
            return_site: self.return_site.or(rest.return_site),
        }
    }

    fn key(&self) -> (u8, u8, bool, bool) {
        (self.exits, self.returns, self.last_is_exit, self.nonempty)
    }
}

fn push_unique(paths: &mut Vec<PathSummary>, path: PathSummary) {
    if !paths.iter().any(|p| p.key() == path.key()) {
        paths.push(path);
    }
}

/// Enumerates the linear statement sequences that can execute through
/// `stmt`, as summaries. Blocks fold from the right; a conditional
/// contributes each branch separately; a loop may run zero times.
pub fn code_paths(stmt: &Statement) -> Vec<PathSummary> {
    match stmt {
        Statement::Identified(inner, id) => code_paths(inner)
            .into_iter()
            .map(|mut path| {
                path.site = path.site.or(Some(*id));
                if path.returns > 0 && path.return_site.is_none() {
                    path.return_site = Some(*id);
                }
                path
            })
            .collect(),

        Statement::Block(stmts) => {
            let mut suffixes = vec![PathSummary::EMPTY];
            for stmt in stmts.iter().rev() {
                let mut combined = Vec::new();
                for head in code_paths(stmt) {
                    for rest in &suffixes {
                        push_unique(&mut combined, head.then(*rest));
                    }
                }
                suffixes = combined;
            }

            suffixes
        }

        Statement::Cond(_, then, otherwise) => {
            let mut paths = code_paths(then);
            for path in code_paths(otherwise) {
                push_unique(&mut paths, path);
            }

            paths
        }

        Statement::Loop(_, body) => {
            let mut paths = code_paths(body);
            push_unique(&mut paths, PathSummary::EMPTY);

            paths
        }

        leaf => vec![PathSummary::leaf(leaf)],
    }
}

fn located(err: CheckerError, site: Option<StatementId>, locations: &LocationData) -> CheckerError {
    match site.and_then(|id| locations.location(id)) {
        Some(location) => err.at(location),
        None => err,
    }
}

/// Every path must reach a `return` or an `exit`.
pub fn check_code_paths_return(
    body: &Statement,
    locations: &LocationData,
) -> Result<(), CheckerError> {
    for path in code_paths(body) {
        if path.exits == 0 {
            return Err(located(
                CheckerError::semantic("not all code paths return a value"),
                path.site,
                locations,
            ));
        }
    }

    Ok(())
}

/// Deliberately coarse: fires when no path ends in a return/exit, or
/// when every path passes more than one.
pub fn check_unreachable_code(
    body: &Statement,
    locations: &LocationData,
) -> Result<(), CheckerError> {
    let paths = code_paths(body);

    let none_end_in_exit = paths.iter().all(|path| !path.last_is_exit);
    let all_exit_twice = paths.iter().all(|path| path.exits > 1);

    if none_end_in_exit || all_exit_twice {
        let site = paths.first().and_then(|path| path.site);
        return Err(located(
            CheckerError::semantic("unreachable code after return statement"),
            site,
            locations,
        ));
    }

    Ok(())
}

/// No path through `main` may return a value. `exit` is fine.
pub fn check_main_does_not_return(
    body: &Statement,
    locations: &LocationData,
) -> Result<(), CheckerError> {
    for path in code_paths(body) {
        if path.returns > 0 {
            return Err(located(
                CheckerError::semantic("cannot return a value from the global scope"),
                path.return_site.or(path.site),
                locations,
            ));
        }
    }

    Ok(())
}
