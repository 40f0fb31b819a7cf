//! The `vaultpress` global available to hooks modules.

use mlua::{Lua, Result as LuaResult};
use sha2::{Digest, Sha256};
use tracing::info;

use vaultpress_shared::slugify;

/// Register `vaultpress.slugify`, `vaultpress.sha256` and `vaultpress.log`.
pub(crate) fn register(lua: &Lua) -> LuaResult<()> {
    let vaultpress = lua.create_table()?;

    vaultpress.set(
        "slugify",
        lua.create_function(|_, text: String| Ok(slugify(&text)))?,
    )?;

    vaultpress.set(
        "sha256",
        lua.create_function(|_, text: String| {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            Ok(format!("{:x}", hasher.finalize()))
        })?,
    )?;

    vaultpress.set(
        "log",
        lua.create_function(|_, message: String| {
            info!(source = "hooks", "{message}");
            Ok(())
        })?,
    )?;

    lua.globals().set("vaultpress", vaultpress)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lua() -> Lua {
        let lua = Lua::new();
        register(&lua).unwrap();
        lua
    }

    #[test]
    fn slugify_matches_note_slugs() {
        let slug: String = lua()
            .load(r#"return vaultpress.slugify("Test Link")"#)
            .eval()
            .unwrap();
        assert_eq!(slug, slugify("Test Link"));
    }

    #[test]
    fn sha256_is_hex_digest() {
        let digest: String = lua()
            .load(r#"return vaultpress.sha256("abc")"#)
            .eval()
            .unwrap();
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn log_accepts_strings() {
        lua().load(r#"vaultpress.log("hello")"#).exec().unwrap();
    }
}
