/// Limits and switches for one interpreter instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Deepest allowed nesting of calls before `StackOverflow` is raised.
    pub max_call_depth: usize,
}

impl Config {
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH }
    }
}
