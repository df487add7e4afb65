//! Source rewrites that follow the selected API target.
//!
//! Two things differ between API 12 and API 13 sources: the namespaces the
//! UI bindings are imported from, and the declared type of the chat sender
//! id in the chat router. [`patch_source`] is a pure function of the content
//! and the target; [`patch_sources`] applies it across a tree.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::core::{Target, BINDING_MODULES};
use crate::ops::sanitize::SOURCE_EXTENSION;
use crate::util::fs::{read_utf8, relative_path, walk_files, write_string};

/// The one file whose `senderId` parameter type is target-specific.
pub const CHAT_ROUTER_FILE: &str = "ChatRouter.cs";

/// A whole-line `using <namespace>;` declaration.
static USING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<lead>[ \t]*)using[ \t]+(?P<ns>[A-Za-z_][A-Za-z0-9_.]*)[ \t]*;(?P<trail>\s*)$")
        .expect("valid using regex")
});

static INT_SENDER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bint(\s+senderId)\b").expect("valid senderId regex"));

static UINT_SENDER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\buint(\s+senderId)\b").expect("valid senderId regex"));

/// Rewrite `content` for `target`.
///
/// `file_name` selects whether the `senderId` rewrite applies.
pub fn patch_source(content: &str, file_name: &str, target: Target) -> String {
    let imports = rewrite_imports(content, target);

    if file_name.eq_ignore_ascii_case(CHAT_ROUTER_FILE) {
        rewrite_sender_id(&imports, target)
    } else {
        imports
    }
}

/// Replace whole-line imports of the foreign binding generation with the
/// target's. Partial-line matches, comments and aliases are left alone.
pub fn rewrite_imports(content: &str, target: Target) -> String {
    let foreign = target.opposite();
    let mut out = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        let (body, terminator) = split_terminator(line);

        let replacement = USING_LINE.captures(body).and_then(|caps| {
            let ns = &caps["ns"];
            BINDING_MODULES
                .iter()
                .find(|m| foreign.binding_namespace(m) == ns)
                .map(|m| {
                    format!(
                        "{}using {};{}",
                        &caps["lead"],
                        target.binding_namespace(m),
                        &caps["trail"]
                    )
                })
        });

        match replacement {
            Some(rewritten) => out.push_str(&rewritten),
            None => out.push_str(body),
        }
        out.push_str(terminator);
    }

    out
}

/// Flip the declared type of `senderId` to the target's.
pub fn rewrite_sender_id(content: &str, target: Target) -> String {
    let (pattern, replacement) = match target {
        Target::Net8 => (&*INT_SENDER_ID, "uint${1}"),
        Target::Net9 => (&*UINT_SENDER_ID, "int${1}"),
    };
    pattern.replace_all(content, replacement).into_owned()
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Patch every C# source below `root` outside build output.
///
/// Returns the number of files whose content changed.
pub fn patch_sources(root: &Path, target: Target) -> Result<usize> {
    let mut count = 0;

    for path in walk_files(root, SOURCE_EXTENSION) {
        let Some(content) = read_utf8(&path)? else {
            continue;
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let patched = patch_source(&content, &file_name, target);
        if patched != content {
            write_string(&path, &patched)?;
            tracing::debug!(
                "patched {} for {}",
                relative_path(root, &path).display(),
                target.label()
            );
            count += 1;
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{PluginFixture, CHAT_ROUTER_API13, MAIN_WINDOW_API12};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_imports_to_api13() {
        let patched = rewrite_imports(MAIN_WINDOW_API12, Target::Net9);
        assert!(patched.contains("using Dalamud.Bindings.ImGui;\r\n"));
        assert!(patched.contains("  using Dalamud.Bindings.ImPlot;  \r\n"));
        assert!(patched.contains("using Dalamud.Bindings.ImGuizmo;"));
        assert!(!patched.contains("ImGuiNET"));
    }

    #[test]
    fn test_imports_round_trip() {
        let there = rewrite_imports(MAIN_WINDOW_API12, Target::Net9);
        let back = rewrite_imports(&there, Target::Net8);
        assert_eq!(back, MAIN_WINDOW_API12);
    }

    #[test]
    fn test_only_whole_lines_are_rewritten() {
        let content = "// using ImGuiNET; is the old spelling\n\
                       var s = \"using ImGuiNET;\";\n\
                       using ImGuiNETExtras;\n\
                       using Foo = ImGuiNET;\n";
        assert_eq!(rewrite_imports(content, Target::Net9), content);
    }

    #[test]
    fn test_crlf_terminators_preserved() {
        let content = "using ImGuiNET;\r\nusing System;\r\n";
        assert_eq!(
            rewrite_imports(content, Target::Net9),
            "using Dalamud.Bindings.ImGui;\r\nusing System;\r\n"
        );
    }

    #[test]
    fn test_sender_id_flip() {
        let api13 = "void Handle(int senderId, int  senderIdLength)";
        let api12 = rewrite_sender_id(api13, Target::Net8);
        assert_eq!(api12, "void Handle(uint senderId, int  senderIdLength)");
        assert_eq!(rewrite_sender_id(&api12, Target::Net9), api13);
    }

    #[test]
    fn test_sender_id_whole_word_only() {
        let content = "point senderId; int senderIds; uint\tsenderId";
        assert_eq!(
            rewrite_sender_id(content, Target::Net8),
            "point senderId; int senderIds; uint\tsenderId"
        );
        assert_eq!(
            rewrite_sender_id(content, Target::Net9),
            "point senderId; int senderIds; int\tsenderId"
        );
    }

    #[test]
    fn test_sender_id_only_in_chat_router() {
        let content = "void F(int senderId) {}\n";
        assert_eq!(patch_source(content, "Other.cs", Target::Net8), content);
        assert_eq!(
            patch_source(content, "chatrouter.CS", Target::Net8),
            "void F(uint senderId) {}\n"
        );
    }

    #[test]
    fn test_patch_source_is_idempotent() {
        for target in Target::ALL {
            let once = patch_source(CHAT_ROUTER_API13, CHAT_ROUTER_FILE, target);
            let twice = patch_source(&once, CHAT_ROUTER_FILE, target);
            assert_eq!(once, twice, "{}", target);
        }
    }

    #[test]
    fn test_patch_sources_counts_changed_files() {
        let tmp = TempDir::new().unwrap();
        let fixture = PluginFixture::standard("Nunu");
        fixture.write(tmp.path());
        let router = tmp.path().join("src/Nunu/Core/ChatRouter.cs");

        assert_eq!(patch_sources(tmp.path(), Target::Net8).unwrap(), 1);
        let text = fs::read_to_string(&router).unwrap();
        assert!(text.contains("using ImGuiNET;\r\n"));
        assert!(text.contains("uint senderId, int senderIdLength"));
        assert!(text.contains("// using ImGuiNET; would be the API 12 spelling"));

        assert_eq!(patch_sources(tmp.path(), Target::Net8).unwrap(), 0);
        assert_eq!(patch_sources(tmp.path(), Target::Net9).unwrap(), 2);
    }
}
