use crate::context::{DeclarationSlice, SymbolContextPayload};
use std::fmt::Write;

/// Last line of every rendered payload
pub const END_DELIMITER: &str = "=== END SYMBOL CONTEXT ===";

const NONE: &str = "<none>";

/// Plain text renderer; labels and field order are stable
pub struct TextRenderer;

impl TextRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, payload: &SymbolContextPayload) -> String {
        let mut out = String::new();
        out.push_str("=== SYMBOL CONTEXT ===\n");

        if let Some(warning) = &payload.warning {
            let _ = writeln!(out, "Warning: {}", warning);
        }

        if let Some(target) = &payload.target {
            out.push_str("--- TARGET ---\n");
            let _ = writeln!(out, "Package: {}", target.package_directive.as_deref().unwrap_or(NONE));
            if target.imports.is_empty() {
                let _ = writeln!(out, "Imports: {}", NONE);
            } else {
                out.push_str("Imports:\n");
                for import in &target.imports {
                    let _ = writeln!(out, "  {}", import);
                }
            }
            self.render_slice(&mut out, &target.slice);
        }

        let _ = writeln!(out, "Referenced symbols: {}", payload.referenced_symbols.len());
        for (idx, referenced) in payload.referenced_symbols.iter().enumerate() {
            let _ = writeln!(out, "--- REFERENCED SYMBOL {} ---", idx + 1);
            let kinds: Vec<&str> = referenced.usage_kinds.iter().map(|k| k.as_str()).collect();
            let _ = writeln!(out, "Usage kinds: {}", kinds.join(", "));
            self.render_slice(&mut out, &referenced.slice);
        }

        out.push_str(END_DELIMITER);
        out.push('\n');
        out
    }

    fn render_slice(&self, out: &mut String, slice: &DeclarationSlice) {
        let _ = writeln!(out, "File: {}", slice.file_path);
        let _ = writeln!(
            out,
            "Caret: offset={} line={} column={}",
            slice.caret.offset, slice.caret.line, slice.caret.column
        );
        let _ = writeln!(out, "Qualified name: {}", slice.qualified_name.as_deref().unwrap_or(NONE));
        let _ = writeln!(
            out,
            "Relative name: {}",
            slice.relative_qualified_name.as_deref().unwrap_or(NONE)
        );
        let _ = writeln!(out, "Presentable: {}", slice.presentable_text.as_deref().unwrap_or(NONE));
        let _ = writeln!(out, "Name: {}", slice.simple_name.as_deref().unwrap_or(NONE));
        let _ = writeln!(out, "Kind tag: {}", slice.declared_symbol_kind_tag);
        let _ = writeln!(out, "Origin: {}", slice.origin_kind);
        out.push_str("Source:\n");
        out.push_str(&slice.source_text);
        if !slice.source_text.ends_with('\n') {
            out.push('\n');
        }
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}
