use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default PATH handed to interpreter processes
pub const DEFAULT_RUNTIME_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// How to start the interpreter for one language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Human-readable name (e.g., "Python 3")
    pub name: String,

    /// Program and leading arguments; the source is appended as the last argument
    pub command: Vec<String>,

    /// PATH for the child process
    ///
    /// The child environment is cleared, so this is also where a bare
    /// program name is looked up on the host.
    #[serde(default = "default_runtime_path")]
    pub path: String,

    /// Extra environment variables for the child process
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl RuntimeConfig {
    /// Create a runtime with an empty environment and the default PATH
    pub fn new(name: impl Into<String>, command: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            command: command.into_iter().map(Into::into).collect(),
            path: default_runtime_path(),
            env: HashMap::new(),
        }
    }

    /// Set the PATH for the child process
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Add an environment variable for the child process
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// The program to spawn, if the command is not empty
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    /// Arguments after the program, with `source` appended
    pub fn args_with_source<'a>(&'a self, source: &'a str) -> Vec<&'a str> {
        self.command
            .iter()
            .skip(1)
            .map(String::as_str)
            .chain(std::iter::once(source))
            .collect()
    }
}

fn default_runtime_path() -> String {
    DEFAULT_RUNTIME_PATH.to_string()
}
