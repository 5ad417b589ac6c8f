/// Session configuration shared by [`Encoder`](crate::Encoder) and [`Decoder`](crate::Decoder).
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum nesting depth of lists, maps and class instances.
    ///
    /// Decoding recurses once per nesting level, so crafted input could otherwise
    /// exhaust the call stack.
    pub max_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config { max_depth: 128 }
    }
}

impl Config {
    /// Creates a new Config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}
