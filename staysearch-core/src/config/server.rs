use super::defaults::{DEFAULT_SERVER_ARGS, DEFAULT_SERVER_COMMAND, DEFAULT_SERVER_NAME};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// How to launch one tool provider process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDescriptor {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl ServerDescriptor {
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            workdir: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }
}

impl Default for ServerDescriptor {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_NAME, DEFAULT_SERVER_COMMAND)
            .with_args(DEFAULT_SERVER_ARGS.iter().copied())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawServer {
    #[serde(default)]
    name: Option<String>,
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    workdir: Option<String>,
}

impl From<RawServer> for ServerDescriptor {
    fn from(raw: RawServer) -> Self {
        let expand = |s: &str| -> String {
            shellexpand::full(s)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };

        let command = PathBuf::from(expand(&raw.command));
        let workdir = raw.workdir.map(|d| PathBuf::from(expand(&d)));
        let args = raw.args.into_iter().map(|arg| expand(&arg)).collect();
        let env = raw
            .env
            .into_iter()
            .map(|(key, value)| {
                let expanded = expand(&value);
                (key, expanded)
            })
            .collect();

        Self {
            name: raw.name.unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
            command,
            args,
            env,
            workdir,
        }
    }
}
