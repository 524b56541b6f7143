//! `kernels.json`: the kernels of one input, for the runtime selector.

use std::path::Path;

use snafu::ResultExt;

use super::error::{Result, WriteOutputSnafu};
use super::locate::KernelDescriptor;
use super::rewrite::BindingDecl;

/// One kernel as listed in the manifest.
#[derive(Clone, Debug, PartialEq)]
pub struct ManifestEntry {
    pub name: String,
    pub file_location: String,
    /// Shader file name relative to the output directory, when emitted.
    pub shader: Option<String>,
    pub has_local_size: bool,
    pub bindings: Vec<BindingDecl>,
}

impl ManifestEntry {
    pub fn from_descriptor(descriptor: &KernelDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            file_location: descriptor.file_location.clone(),
            shader: None,
            has_local_size: descriptor.has_local_size,
            bindings: Vec::new(),
        }
    }
}

pub fn to_json(entries: &[ManifestEntry]) -> String {
    let mut out = String::new();
    out.push_str("{\n  \"kernels\": [");
    if entries.is_empty() {
        out.push_str("]\n}\n");
        return out;
    }
    out.push('\n');
    for (i, entry) in entries.iter().enumerate() {
        out.push_str("    {\n");
        out.push_str(&format!("      \"name\": {},\n", quote(&entry.name)));
        out.push_str(&format!(
            "      \"file_location\": {},\n",
            quote(&entry.file_location)
        ));
        match &entry.shader {
            Some(shader) => out.push_str(&format!("      \"shader\": {},\n", quote(shader))),
            None => out.push_str("      \"shader\": null,\n"),
        }
        out.push_str(&format!(
            "      \"has_local_size\": {},\n",
            entry.has_local_size
        ));
        out.push_str("      \"bindings\": [");
        for (j, b) in entry.bindings.iter().enumerate() {
            out.push_str(if j == 0 { "\n" } else { ",\n" });
            out.push_str(&binding_json(b));
        }
        if entry.bindings.is_empty() {
            out.push_str("]\n");
        } else {
            out.push_str("\n      ]\n");
        }
        out.push_str("    }");
        if i + 1 < entries.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("  ]\n}\n");
    out
}

fn binding_json(b: &BindingDecl) -> String {
    let dim = match b.dim {
        Some(d) => d.to_string(),
        None => "null".to_string(),
    };
    format!(
        "        {{ \"kind\": {}, \"name\": {}, \"element\": {}, \"dim\": {}, \"binding\": {}, \"set\": {} }}",
        quote(b.kind.as_str()),
        quote(&b.name),
        quote(&b.element),
        dim,
        b.binding,
        b.set
    )
}

/// JSON string literal.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Save the manifest to `path`.
pub fn save(entries: &[ManifestEntry], path: &Path) -> Result<()> {
    std::fs::write(path, to_json(entries)).context(WriteOutputSnafu { path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpile::rewrite::BindingKind;

    fn entry() -> ManifestEntry {
        ManifestEntry {
            name: "life::GameOfLife".to_string(),
            file_location: "gol_v4".to_string(),
            shader: Some("gol_v4.comp".to_string()),
            has_local_size: true,
            bindings: vec![
                BindingDecl {
                    kind: BindingKind::Buffer,
                    element: "uint".to_string(),
                    dim: None,
                    binding: 0,
                    set: 0,
                    name: "cells".to_string(),
                },
                BindingDecl {
                    kind: BindingKind::Image,
                    element: "float".to_string(),
                    dim: Some(2),
                    binding: 1,
                    set: 0,
                    name: "img".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_empty_manifest() {
        assert_eq!(to_json(&[]), "{\n  \"kernels\": []\n}\n");
    }

    #[test]
    fn test_manifest_layout() {
        let json = to_json(&[entry()]);
        let expected = "{\n  \"kernels\": [\n    {\n      \"name\": \"life::GameOfLife\",\n      \"file_location\": \"gol_v4\",\n      \"shader\": \"gol_v4.comp\",\n      \"has_local_size\": true,\n      \"bindings\": [\n        { \"kind\": \"buffer\", \"name\": \"cells\", \"element\": \"uint\", \"dim\": null, \"binding\": 0, \"set\": 0 },\n        { \"kind\": \"image\", \"name\": \"img\", \"element\": \"float\", \"dim\": 2, \"binding\": 1, \"set\": 0 }\n      ]\n    }\n  ]\n}\n";
        assert_eq!(json, expected);
    }

    #[test]
    fn test_unemitted_kernel_has_null_shader() {
        let mut e = entry();
        e.shader = None;
        e.bindings.clear();
        let json = to_json(&[e.clone(), e]);
        assert_eq!(json.matches("\"shader\": null").count(), 2);
        assert!(json.contains("\"bindings\": []\n    },\n"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(quote("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn test_save_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("kernels.json");
        save(&[entry()], &path).unwrap();
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("\"name\": \"life::GameOfLife\""));
    }
}
