use std::collections::HashSet;

/// The set of command names permitted to run.
///
/// Built once at startup from configuration and handed to the HTTP
/// layer; nothing can mutate it while the server is up.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    commands: HashSet<String>,
}

impl Allowlist {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        self.commands.contains(command)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
