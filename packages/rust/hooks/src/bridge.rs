//! Calling Lua hook functions from the typed hook slots.
//!
//! Arguments cross into Lua through the serde bridge. Return values are
//! checked against what each slot requires; a mismatch or a Lua error
//! becomes a `Hook` error naming the slot.

use futures::FutureExt;
use mlua::{Function, IntoLuaMulti, Lua, LuaSerdeExt, Table, Value};
use serde::Serialize;

use vaultpress_markdown::{CodeBlock, CodeblockOutcome, Fragment, HookSet};
use vaultpress_shared::{Frontmatter, Note, Result, VaultpressError};

/// Install `function` into the slot called `name`.
pub(crate) fn install(hooks: HookSet, name: &'static str, lua: Lua, function: Function) -> HookSet {
    let hook = LuaHook {
        name,
        lua,
        function,
    };

    match name {
        "frontmatter" => hooks.with_frontmatter(move |raw, note| hook.call_frontmatter(raw, note)),
        "header_content" => hooks.with_header_content(move |fm, note| {
            let args = (hook.to_lua(fm)?, hook.to_lua(note)?);
            hook.call_string(args)
        }),
        "footer_content" => hooks.with_footer_content(move |fm, note| {
            let args = (hook.to_lua(fm)?, hook.to_lua(note)?);
            hook.call_string(args)
        }),
        "preprocess_content" => hooks.with_preprocess_content(move |text, note, fm| {
            let args = (text, hook.to_lua(note)?, hook.to_lua(fm)?);
            hook.call_string(args)
        }),
        "postprocess_content" => hooks.with_postprocess_content(move |text, note, fm| {
            let args = (text, hook.to_lua(note)?, hook.to_lua(fm)?);
            hook.call_string(args)
        }),
        "output_path" => hooks.with_output_path(move |note, fm, text| {
            let args = (hook.to_lua(note)?, hook.to_lua(fm)?, text.to_string());
            hook.call_string(args)
        }),
        "process_codeblock" => hooks.with_process_codeblock_async(move |block| {
            futures::future::ready(hook.call_codeblock(block)).boxed_local()
        }),
        _ => hooks,
    }
}

struct LuaHook {
    name: &'static str,
    lua: Lua,
    function: Function,
}

impl LuaHook {
    fn error(&self, message: impl std::fmt::Display) -> VaultpressError {
        VaultpressError::hook(self.name, message.to_string())
    }

    fn to_lua<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value> {
        self.lua
            .to_value(value)
            .map_err(|e| self.error(format!("argument conversion failed: {e}")))
    }

    fn call(&self, args: impl IntoLuaMulti) -> Result<Value> {
        self.function.call::<Value>(args).map_err(|e| self.error(e))
    }

    fn call_string(&self, args: impl IntoLuaMulti) -> Result<String> {
        match self.call(args)? {
            Value::String(s) => s
                .to_str()
                .map(|s| s.to_string())
                .map_err(|_| self.error("returned a string that is not valid UTF-8")),
            other => Err(self.error(format!("expected a string, got {}", other.type_name()))),
        }
    }

    fn call_frontmatter(&self, raw: Frontmatter, note: &Note) -> Result<Frontmatter> {
        let args = (self.to_lua(&raw)?, self.to_lua(note)?);
        let returned = match self.call(args)? {
            value @ Value::Table(_) => self
                .lua
                .from_value::<Frontmatter>(value)
                .map_err(|e| self.error(format!("returned table is not a mapping: {e}")))?,
            other => {
                return Err(self.error(format!("expected a table, got {}", other.type_name())));
            }
        };
        Ok(restore_key_order(&raw, returned))
    }

    fn call_codeblock(&self, block: &CodeBlock) -> Result<CodeblockOutcome> {
        let value = self.call(self.to_lua(block)?)?;
        match value {
            Value::Nil | Value::Boolean(false) => Ok(CodeblockOutcome::Unchanged),
            Value::String(s) => s
                .to_str()
                .map(|s| CodeblockOutcome::Text(s.to_string()))
                .map_err(|_| self.error("returned a string that is not valid UTF-8")),
            Value::Table(table) => self
                .fragment(&table, block)
                .map(CodeblockOutcome::Replace)
                .map_err(|e| self.error(e)),
            other => Err(self.error(format!(
                "expected nil, a string or a table, got {}",
                other.type_name()
            ))),
        }
    }

    /// Read a returned node table. Missing code fields keep the original's.
    fn fragment(&self, table: &Table, original: &CodeBlock) -> mlua::Result<Fragment> {
        let kind: Option<String> = table.get("type")?;
        match kind.as_deref() {
            Some("html") => Ok(Fragment::Html(table.get::<String>("value")?)),
            None | Some("code") => Ok(Fragment::Code(CodeBlock {
                language: table
                    .get::<Option<String>>("language")?
                    .unwrap_or_else(|| original.language.clone()),
                meta: table
                    .get::<Option<String>>("meta")?
                    .unwrap_or_else(|| original.meta.clone()),
                value: table
                    .get::<Option<String>>("value")?
                    .unwrap_or_else(|| original.value.clone()),
            })),
            Some(other) => Err(mlua::Error::runtime(format!(
                "unknown node type `{other}` (expected `code` or `html`)"
            ))),
        }
    }
}

/// Lua tables are unordered: keep the original keys in their original order
/// and append new ones sorted.
fn restore_key_order(original: &Frontmatter, mut returned: Frontmatter) -> Frontmatter {
    let mut ordered = Frontmatter::new();
    for key in original.keys() {
        if let Some(value) = returned.remove(key) {
            ordered.insert(key.clone(), value);
        }
    }

    let mut added: Vec<_> = returned.into_iter().collect();
    added.sort_by(|(a, _), (b, _)| a.as_str().cmp(&b.as_str()));
    ordered.extend(added);
    ordered
}

#[cfg(test)]
mod tests {
    use crate::HookModule;
    use vaultpress_markdown::{CodeBlock, CodeblockOutcome, Fragment, HookSet};
    use vaultpress_shared::{Frontmatter, Note, VaultpressError};

    fn hooks(source: &str) -> HookSet {
        HookModule::load(source, "hooks.lua").unwrap().into_hook_set()
    }

    fn note() -> Note {
        Note::new("Test Link", "guides/Test Link.md", Frontmatter::new())
    }

    fn frontmatter(yaml: &str) -> Frontmatter {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn frontmatter_hook_edits_mapping() {
        let hooks = hooks(
            r#"
            return {
              frontmatter = function(fm, note)
                fm.title = fm.title or note.name
                fm.draft = nil
                return fm
              end,
            }
            "#,
        );
        let out = hooks
            .frontmatter(frontmatter("draft: true\ntags: [a, b]\n"), &note())
            .unwrap();

        assert_eq!(out.get("title").and_then(|v| v.as_str()), Some("Test Link"));
        assert!(out.get("draft").is_none());
        assert_eq!(out.get("tags").and_then(|v| v.as_sequence()).map(Vec::len), Some(2));
    }

    #[test]
    fn frontmatter_key_order_is_stable() {
        let hooks = hooks(
            r#"
            return {
              frontmatter = function(fm)
                fm.zeta = 1
                fm.alpha = 2
                return fm
              end,
            }
            "#,
        );
        let out = hooks
            .frontmatter(frontmatter("title: T\ndate: 2024-01-01\nauthor: A\n"), &note())
            .unwrap();
        let keys: Vec<&str> = out.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["title", "date", "author", "alpha", "zeta"]);
    }

    #[test]
    fn text_hooks_receive_arguments() {
        let hooks = hooks(
            r##"
            return {
              header_content = function(fm, note) return "# " .. fm.title .. " (" .. note.slug .. ")\n" end,
              preprocess_content = function(text, note, fm) return text .. "!" end,
              output_path = function(note, fm, text) return note.slug .. "/" .. vaultpress.sha256(text):sub(1, 8) .. ".md" end,
            }
            "##,
        );
        let fm = frontmatter("title: Hello\n");
        let note = note();

        assert_eq!(
            hooks.header_content(&fm, &note).unwrap(),
            "# Hello (test-link)\n"
        );
        assert_eq!(hooks.preprocess_content("hi".into(), &note, &fm).unwrap(), "hi!");
        assert_eq!(
            hooks.output_path(&note, &fm, "abc").unwrap(),
            "test-link/ba7816bf.md"
        );
    }

    #[test]
    fn wrong_return_type_is_hook_error() {
        let hooks = hooks("return { footer_content = function() return 42 end }");
        let err = hooks.footer_content(&Frontmatter::new(), &note()).unwrap_err();
        match err {
            VaultpressError::Hook { hook, message } => {
                assert_eq!(hook, "footer_content");
                assert!(message.contains("expected a string, got integer"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn runtime_error_is_hook_error() {
        let hooks = hooks(r#"return { postprocess_content = function() error("kaboom") end }"#);
        let err = hooks
            .postprocess_content(String::new(), &note(), &Frontmatter::new())
            .unwrap_err();
        assert!(matches!(err, VaultpressError::Hook { .. }));
        assert!(err.to_string().contains("kaboom"));
    }

    #[tokio::test]
    async fn codeblock_outcomes() {
        let hooks = hooks(
            r#"
            return {
              process_codeblock = function(block)
                if block.language == "mermaid" then
                  return { type = "html", value = "<Mermaid chart={`" .. block.value .. "`} />" }
                elseif block.language == "upper" then
                  return block.value:upper()
                elseif block.language == "sh" then
                  return { language = "bash" }
                end
                return nil
              end,
            }
            "#,
        );

        let outcome = hooks
            .process_codeblock(&CodeBlock::new("mermaid", "graph TD"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CodeblockOutcome::Replace(Fragment::Html("<Mermaid chart={`graph TD`} />".into()))
        );

        let outcome = hooks
            .process_codeblock(&CodeBlock::new("upper", "shout"))
            .await
            .unwrap();
        assert_eq!(outcome, CodeblockOutcome::Text("SHOUT".into()));

        let outcome = hooks
            .process_codeblock(&CodeBlock::new("sh", "ls -la"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CodeblockOutcome::Replace(Fragment::Code(CodeBlock::new("bash", "ls -la")))
        );

        let outcome = hooks
            .process_codeblock(&CodeBlock::new("rust", "fn main() {}"))
            .await
            .unwrap();
        assert_eq!(outcome, CodeblockOutcome::Unchanged);
    }

    #[tokio::test]
    async fn codeblock_unknown_node_type() {
        let hooks = hooks(r#"return { process_codeblock = function() return { type = "image" } end }"#);
        let err = hooks
            .process_codeblock(&CodeBlock::new("x", "y"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown node type `image`"), "{err}");
    }
}
