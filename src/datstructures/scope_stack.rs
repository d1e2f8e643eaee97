use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ScopeError {
    #[error("the stack is empty")]
    EmptyStack,

    #[error("undefined identifier {0}")]
    Undefined(String),

    #[error("duplicate declaration of {0}")]
    Duplicate(String),
}

/// A stack of lexical scopes mapping identifiers to values. Lookup
/// walks from the innermost frame outwards; insertion always targets
/// the innermost frame and rejects a name already bound there.
#[derive(Clone, Debug)]
pub struct ScopeStack<V> {
    scopes: Vec<HashMap<String, V>>,
}

impl<V> ScopeStack<V> {
    /// Starts with a single global frame.
    pub fn new() -> Self {
        ScopeStack {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn increase_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn decrease_scope(&mut self) {
        self.scopes.pop();
    }

    /// Runs `action` inside a fresh frame; the frame is released on
    /// every exit path, error included.
    pub fn scoped<T, E>(
        &mut self,
        action: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        self.increase_scope();
        let result = action(self);
        self.decrease_scope();

        result
    }

    pub fn add_symbol(&mut self, name: String, value: V) -> Result<(), ScopeError> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(ScopeError::EmptyStack);
        };

        if scope.contains_key(&name) {
            return Err(ScopeError::Duplicate(name));
        }

        scope.insert(name, value);

        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&V, ScopeError> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Ok(value);
            }
        }

        Err(ScopeError::Undefined(name.to_string()))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl<V> Default for ScopeStack<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_the_innermost_binding() {
        let mut stack = ScopeStack::new();
        stack.add_symbol("x".to_string(), 1).unwrap();
        stack.increase_scope();
        stack.add_symbol("x".to_string(), 2).unwrap();

        assert_eq!(stack.lookup("x"), Ok(&2));

        stack.decrease_scope();
        assert_eq!(stack.lookup("x"), Ok(&1));
    }

    #[test]
    fn duplicates_are_rejected_within_one_frame_only() {
        let mut stack = ScopeStack::new();
        stack.add_symbol("x".to_string(), 1).unwrap();

        assert_eq!(
            stack.add_symbol("x".to_string(), 2),
            Err(ScopeError::Duplicate("x".to_string()))
        );

        stack.increase_scope();
        assert!(stack.add_symbol("x".to_string(), 2).is_ok());
    }

    #[test]
    fn missing_names_are_undefined() {
        let stack: ScopeStack<i32> = ScopeStack::new();

        assert_eq!(
            stack.lookup("ghost"),
            Err(ScopeError::Undefined("ghost".to_string()))
        );
    }

    #[test]
    fn scoped_restores_depth_on_both_exits() {
        let mut stack: ScopeStack<i32> = ScopeStack::new();
        let depth = stack.depth();

        let ok: Result<(), ScopeError> = stack.scoped(|inner| {
            inner.add_symbol("x".to_string(), 1)?;
            Ok(())
        });
        assert!(ok.is_ok());
        assert_eq!(stack.depth(), depth);

        let err: Result<(), ScopeError> = stack.scoped(|inner| {
            inner.add_symbol("x".to_string(), 1)?;
            inner.add_symbol("x".to_string(), 2)?;
            Ok(())
        });
        assert!(err.is_err());
        assert_eq!(stack.depth(), depth);
    }
}
