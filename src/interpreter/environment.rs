use std::collections::HashMap;

use crate::interpreter::value::Value;

/// Handle to a frame in [`Scopes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Frame {
    values: HashMap<String, Value>,
    parent: Option<ScopeId>,
}

/// Arena of scope frames. Each frame points at its parent by index, and
/// frames are pushed and popped strictly in LIFO order.
#[derive(Debug)]
pub struct Scopes {
    frames: Vec<Frame>,
    current: ScopeId,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    /// A chain holding only the global frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            current: ScopeId(0),
        }
    }

    /// Number of frames on the chain, the global frame included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Push a frame whose parent is the current frame.
    pub fn begin(&mut self) -> ScopeId {
        let id = ScopeId(self.frames.len());
        self.frames.push(Frame {
            values: HashMap::new(),
            parent: Some(self.current),
        });
        self.current = id;
        id
    }

    /// Pop the current frame; the global frame is never popped.
    pub fn end(&mut self) {
        if let Some(parent) = self.frames[self.current.0].parent {
            self.frames.truncate(self.current.0);
            self.current = parent;
        }
    }

    /// Walk the chain outward for the innermost frame binding `name`.
    pub fn lookup(&self, name: &str) -> Option<ScopeId> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let frame = &self.frames[id.0];
            if frame.values.contains_key(name) {
                return Some(id);
            }
            scope = frame.parent;
        }
        None
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let id = self.lookup(name)?;
        self.frames[id.0].values.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let id = self.lookup(name)?;
        self.frames[id.0].values.get_mut(name)
    }

    /// Bind `name` in the current frame, shadowing any outer binding.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.frames[self.current.0]
            .values
            .insert(name.into(), value);
    }

    /// Update the frame that already binds `name`, or define it in the
    /// current frame when it is unbound.
    pub fn bind(&mut self, name: &str, value: Value) {
        let id = self.lookup(name).unwrap_or(self.current);
        self.frames[id.0].values.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let mut scopes = Scopes::new();
        scopes.define("x", Value::Number(42));
        assert_eq!(scopes.get("x"), Some(&Value::Number(42)));
    }

    #[test]
    fn get_undefined_returns_none() {
        let scopes = Scopes::new();
        assert!(scopes.get("x").is_none());
        assert!(scopes.lookup("x").is_none());
    }

    #[test]
    fn inner_frame_sees_outer_bindings() {
        let mut scopes = Scopes::new();
        scopes.define("x", Value::Number(1));
        let global = scopes.lookup("x");
        scopes.begin();
        assert!(global.is_some());
        assert_eq!(scopes.lookup("x"), global);
        assert_eq!(scopes.get("x"), Some(&Value::Number(1)));
    }

    #[test]
    fn bind_updates_outer_binding() {
        let mut scopes = Scopes::new();
        scopes.define("x", Value::Number(1));
        scopes.begin();
        scopes.bind("x", Value::Number(2));
        scopes.end();
        assert_eq!(scopes.get("x"), Some(&Value::Number(2)));
    }

    #[test]
    fn bind_unbound_defines_in_current_frame() {
        let mut scopes = Scopes::new();
        scopes.begin();
        scopes.bind("y", Value::Bool(true));
        assert!(scopes.get("y").is_some());
        scopes.end();
        assert!(scopes.get("y").is_none());
    }

    #[test]
    fn define_shadows_outer_binding() {
        let mut scopes = Scopes::new();
        scopes.define("x", Value::Number(1));
        scopes.begin();
        scopes.define("x", Value::Number(2));
        assert_eq!(scopes.get("x"), Some(&Value::Number(2)));
        scopes.end();
        assert_eq!(scopes.get("x"), Some(&Value::Number(1)));
    }

    #[test]
    fn get_mut_writes_through() {
        let mut scopes = Scopes::new();
        scopes.define("x", Value::Number(1));
        scopes.begin();
        if let Some(slot) = scopes.get_mut("x") {
            *slot = Value::Number(5);
        }
        scopes.end();
        assert_eq!(scopes.get("x"), Some(&Value::Number(5)));
    }

    #[test]
    fn global_frame_is_never_popped() {
        let mut scopes = Scopes::new();
        scopes.define("x", Value::Number(1));
        scopes.end();
        assert_eq!(scopes.depth(), 1);
        assert!(scopes.get("x").is_some());
    }

    #[test]
    fn depth_tracks_begin_and_end() {
        let mut scopes = Scopes::new();
        scopes.begin();
        scopes.begin();
        assert_eq!(scopes.depth(), 3);
        scopes.end();
        assert_eq!(scopes.depth(), 2);
    }
}
