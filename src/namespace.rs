//! Namespaces: named, hierarchically scoped command tables with private
//! state and rewrite rules.

use crate::command::Command;
use crate::error::ShellError;
use crate::rules::RuleSet;
use log::debug;
use std::collections::HashMap;

/// A single scope.
///
/// Owns its command table (names unique within the namespace), its rewrite
/// rules, and a private key-value store. The parent reference makes lookups
/// fall through to enclosing scopes; definitions here shadow inherited ones.
#[derive(Debug)]
pub struct Namespace {
    pub name: String,
    pub parent: Option<String>,
    commands: HashMap<String, Command>,
    pub rules: RuleSet,
    pub vars: HashMap<String, String>,
}

impl Namespace {
    fn new(name: impl Into<String>, parent: Option<String>) -> Self {
        Namespace {
            name: name.into(),
            parent,
            commands: HashMap::new(),
            rules: RuleSet::new(),
            vars: HashMap::new(),
        }
    }

    /// Command names defined directly in this namespace, sorted.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// The arena of namespaces, indexed by identifier.
///
/// The root namespace always exists and anchors every parent chain. The
/// registry itself does not know which namespace is active; operations that
/// depend on it (removal) take the active name as a parameter.
#[derive(Debug)]
pub struct NamespaceRegistry {
    spaces: HashMap<String, Namespace>,
    root: String,
}

impl NamespaceRegistry {
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let mut spaces = HashMap::new();
        spaces.insert(root.clone(), Namespace::new(root.clone(), None));
        NamespaceRegistry { spaces, root }
    }

    pub fn root_name(&self) -> &str {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Namespace {
        self.spaces
            .get_mut(&self.root)
            .expect("root namespace always exists")
    }

    /// Create a namespace under the given parent.
    pub fn create(&mut self, name: &str, parent: &str) -> Result<(), ShellError> {
        if self.spaces.contains_key(name) {
            return Err(ShellError::DuplicateNamespace(name.to_string()));
        }
        if !self.spaces.contains_key(parent) {
            return Err(ShellError::NamespaceNotFound(parent.to_string()));
        }
        debug!("creating namespace {} under {}", name, parent);
        self.spaces
            .insert(name.to_string(), Namespace::new(name, Some(parent.to_string())));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Namespace> {
        self.spaces.get(name)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Namespace> {
        self.spaces.get_mut(name)
    }

    /// Remove a namespace.
    ///
    /// Fails with [`ShellError::NamespaceInUse`] for the active namespace
    /// and for the root. Children of the removed namespace are reparented
    /// to its parent so inherited commands stay resolvable.
    pub fn remove(&mut self, name: &str, active: &str) -> Result<(), ShellError> {
        if !self.spaces.contains_key(name) {
            return Err(ShellError::NamespaceNotFound(name.to_string()));
        }
        if name == active || name == self.root {
            return Err(ShellError::NamespaceInUse(name.to_string()));
        }
        let removed = self.spaces.remove(name).expect("presence checked above");
        let new_parent = removed.parent.unwrap_or_else(|| self.root.clone());
        for space in self.spaces.values_mut() {
            if space.parent.as_deref() == Some(name) {
                space.parent = Some(new_parent.clone());
            }
        }
        debug!("removed namespace {}", name);
        Ok(())
    }

    /// Register a command into a namespace.
    ///
    /// Command names are unique per namespace; a second registration under
    /// the same name is refused.
    pub fn register(&mut self, namespace: &str, command: Command) -> Result<(), ShellError> {
        let space = self
            .spaces
            .get_mut(namespace)
            .ok_or_else(|| ShellError::NamespaceNotFound(namespace.to_string()))?;
        if space.commands.contains_key(&command.name) {
            return Err(ShellError::DuplicateCommand {
                namespace: namespace.to_string(),
                name: command.name.clone(),
            });
        }
        space.commands.insert(command.name.clone(), command);
        Ok(())
    }

    /// Resolve a command name from a namespace, walking the parent chain.
    ///
    /// The namespace's own table is searched first, then each ancestor up
    /// to the root; the first match wins, so local definitions shadow
    /// inherited ones.
    pub fn resolve_command(&self, from: &str, name: &str) -> Result<Command, ShellError> {
        for space_name in self.chain_of(from) {
            let space = &self.spaces[&space_name];
            if let Some(command) = space.commands.get(name) {
                return Ok(command.clone());
            }
        }
        Err(ShellError::CommandNotFound(name.to_string()))
    }

    /// The names of a namespace's chain, nearest first, ending at the root.
    ///
    /// An unknown starting point yields an empty chain.
    pub fn chain_of(&self, from: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = self.spaces.get(from);
        while let Some(space) = current {
            chain.push(space.name.clone());
            current = space.parent.as_deref().and_then(|p| self.spaces.get(p));
        }
        chain
    }

    /// All command names visible from a namespace, shadowed duplicates
    /// removed, sorted.
    pub fn visible_commands(&self, from: &str) -> Vec<String> {
        let mut seen = Vec::new();
        for space_name in self.chain_of(from) {
            for name in self.spaces[&space_name].command_names() {
                if !seen.iter().any(|s: &String| s == name) {
                    seen.push(name.to_string());
                }
            }
        }
        seen.sort_unstable();
        seen
    }

    /// Read a private state key through the parent chain.
    pub fn lookup_var(&self, from: &str, key: &str) -> Option<&str> {
        for space_name in self.chain_of(from) {
            if let Some(value) = self.spaces[&space_name].vars.get(key) {
                return Some(value);
            }
        }
        None
    }

    /// All namespaces, sorted by name.
    pub fn iter(&self) -> Vec<&Namespace> {
        let mut spaces: Vec<&Namespace> = self.spaces.values().collect();
        spaces.sort_by(|a, b| a.name.cmp(&b.name));
        spaces
    }
}
