use std::fmt::{Debug, Display, Formatter};

use super::Position;

/// How much tracing a tokenizer/parser/object should emit. Each variant
/// carries the label printed alongside its traces; ordering is
/// `None < Default < Success < Result < Verbose`, and all tracing compiles
/// out entirely in release builds.
#[derive(Debug, Clone)]
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}

impl<T: Display> Display for Log<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Log::None => Ok(()),
            Log::Default(s) | Log::Success(s) | Log::Result(s) | Log::Verbose(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

impl<T> Log<T> {
    /// Rank used to gate which traces are printed: `None < Default <
    /// Success < Result < Verbose`.
    pub fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }
}

impl<TL: Display> Log<TL> {
    pub fn trace_token<T: Debug>(&self, pos: Position, token: &T) {
        #[cfg(debug_assertions)]
        if self.order() >= Log::Success(()).order() {
            println!("[{}; token]: {:?} at {}", self, token, pos);
        }
    }

    pub fn trace_error(&self, pos: Position, message: &dyn Display) {
        #[cfg(debug_assertions)]
        if self.order() >= Log::Result(()).order() {
            println!("[{}; error]: {} at {}", self, message, pos);
        }
    }

    pub fn trace_rehash(&self, old_cap: usize, new_cap: usize) {
        #[cfg(debug_assertions)]
        if self.order() >= Log::Verbose(()).order() {
            println!("[{}; rehash]: {} -> {}", self, old_cap, new_cap);
        }
    }
}
