//! Loading and validating a hooks module.

use std::path::Path;

use mlua::{Function, Lua, Table, Value};
use tracing::{debug, info, instrument};

use vaultpress_markdown::{HOOK_NAMES, HookSet};
use vaultpress_shared::{Result, VaultpressError};

use crate::{bridge, helpers};

/// A validated hooks module: the Lua state it runs in and its hook functions.
pub struct HookModule {
    lua: Lua,
    functions: Vec<(&'static str, Function)>,
}

impl std::fmt::Debug for HookModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookModule")
            .field("hooks", &self.names())
            .finish_non_exhaustive()
    }
}

impl HookModule {
    /// Evaluate `source` and check that it is a well-formed hooks module.
    ///
    /// Every shape violation is reported in one `Validation` error.
    pub fn load(source: &str, chunk_name: &str) -> Result<Self> {
        let lua = Lua::new();
        helpers::register(&lua).map_err(|e| {
            VaultpressError::validation(format!("{chunk_name}: failed to set up Lua globals: {e}"))
        })?;

        let value: Value = lua
            .load(source)
            .set_name(chunk_name)
            .eval()
            .map_err(|e| VaultpressError::validation(format!("{chunk_name}: {e}")))?;

        let Value::Table(table) = value else {
            return Err(VaultpressError::validation(format!(
                "{chunk_name}: hooks module must return a table, got {}",
                value.type_name()
            )));
        };

        let functions = collect_functions(&table).map_err(|issues| {
            VaultpressError::validation(format!("{chunk_name}: {}", issues.join("; ")))
        })?;

        debug!(chunk = chunk_name, hooks = functions.len(), "hooks module validated");
        Ok(Self { lua, functions })
    }

    /// Names of the hooks this module defines, in canonical order.
    pub fn names(&self) -> Vec<&'static str> {
        self.functions.iter().map(|(name, _)| *name).collect()
    }

    /// Adapt the module into a hook set.
    pub fn into_hook_set(self) -> HookSet {
        let Self { lua, functions } = self;
        functions
            .into_iter()
            .fold(HookSet::new(), |hooks, (name, function)| {
                bridge::install(hooks, name, lua.clone(), function)
            })
    }
}

/// Pair every key of `table` with a known hook, gathering all violations.
fn collect_functions(
    table: &Table,
) -> std::result::Result<Vec<(&'static str, Function)>, Vec<String>> {
    let mut functions = Vec::new();
    let mut issues = Vec::new();

    for pair in table.pairs::<Value, Value>() {
        let (key, value) = match pair {
            Ok(pair) => pair,
            Err(e) => {
                issues.push(format!("unreadable entry: {e}"));
                continue;
            }
        };

        let key = match key {
            Value::String(s) => match s.to_str() {
                Ok(s) => s.to_string(),
                Err(_) => {
                    issues.push("hook names must be valid UTF-8".to_string());
                    continue;
                }
            },
            other => {
                issues.push(format!("hook names must be strings, got {}", other.type_name()));
                continue;
            }
        };

        let Some(name) = HOOK_NAMES.iter().copied().find(|name| *name == key) else {
            issues.push(format!(
                "unknown hook `{key}` (expected one of: {})",
                HOOK_NAMES.join(", ")
            ));
            continue;
        };

        match value {
            Value::Function(function) => functions.push((name, function)),
            other => issues.push(format!(
                "hook `{name}` must be a function, got {}",
                other.type_name()
            )),
        }
    }

    if !issues.is_empty() {
        issues.sort();
        return Err(issues);
    }

    functions.sort_by_key(|(name, _)| HOOK_NAMES.iter().position(|n| n == name));
    Ok(functions)
}

/// Read, validate and adapt the hooks file at `path`.
#[instrument(fields(path = %path.display()))]
pub fn load_hooks(path: &Path) -> Result<HookSet> {
    let module = read_module(path)?;
    info!(hooks = ?module.names(), "loaded hooks module");
    Ok(module.into_hook_set())
}

/// Validate the hooks file at `path` and return the hooks it defines.
pub fn check_hooks(path: &Path) -> Result<Vec<&'static str>> {
    Ok(read_module(path)?.names())
}

fn read_module(path: &Path) -> Result<HookModule> {
    let source = std::fs::read_to_string(path).map_err(|e| VaultpressError::io(path, e))?;
    HookModule::load(&source, &path.to_string_lossy())
}
