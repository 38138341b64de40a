//! Routing of untyped event payloads to typed application data.
//!
//! A [`CodecRegistry`] is an ordered list of (path pattern, decoder)
//! entries. Incoming events are matched by their source path against each
//! pattern in registration order and handed to the first decoder that
//! matches, so specific patterns must be registered before general ones.
//!
//! ```
//! use urbit_channel::codec::CodecRegistry;
//!
//! #[derive(Debug, PartialEq)]
//! enum Update {
//!     Message(String),
//!     Other,
//! }
//!
//! let mut registry = CodecRegistry::new();
//! registry
//!     .register(r"^/messages/", |json| {
//!         json.as_str()
//!             .map(|s| Update::Message(s.to_string()))
//!             .ok_or_else(|| "message is not a string".to_string())
//!     })
//!     .unwrap();
//! registry.register(r".*", |_| Ok(Update::Other)).unwrap();
//!
//! let update = registry
//!     .dispatch("/messages/general", &serde_json::json!("hi"))
//!     .unwrap();
//! assert_eq!(update, Update::Message("hi".to_string()));
//! ```

use std::fmt;

use regex::Regex;
use serde_json::Value;

use crate::error::ChannelError;

type Decoder<T> = Box<dyn Fn(&Value) -> Result<T, String> + Send + Sync>;

struct CodecEntry<T> {
    pattern: Regex,
    decoder: Decoder<T>,
}

/// Ordered (pattern, decoder) list. First match wins.
pub struct CodecRegistry<T> {
    entries: Vec<CodecEntry<T>>,
}

impl<T> CodecRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a decoder for paths matching the regular expression
    /// `pattern`.
    pub fn register<F>(&mut self, pattern: &str, decoder: F) -> Result<&mut Self, regex::Error>
    where
        F: Fn(&Value) -> Result<T, String> + Send + Sync + 'static,
    {
        let pattern = Regex::new(pattern)?;
        self.entries.push(CodecEntry {
            pattern,
            decoder: Box::new(decoder),
        });
        Ok(self)
    }

    /// Decode `payload` with the first decoder whose pattern matches `path`.
    pub fn dispatch(&self, path: &str, payload: &Value) -> Result<T, ChannelError> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.pattern.is_match(path))
            .ok_or_else(|| ChannelError::NoDecoderFound(path.to_string()))?;

        (entry.decoder)(payload).map_err(ChannelError::DecodeFailed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for CodecRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CodecRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| entry.pattern.as_str()))
            .finish()
    }
}
