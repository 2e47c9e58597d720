//! Component-format front end
//!
//! Splits a single-file component into its script blocks, style block,
//! and markup; preprocesses the scripts (module context first, optional
//! TypeScript stripping); and compiles the result into a module the
//! bundler can wrap.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::TranspileOptions;

static SCRIPT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<script([^>]*)>(.*?)</script>"#).unwrap());

static STYLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<style[^>]*>(.*?)</style>"#).unwrap());

/// Script language declared via the lang attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLang {
    Js,
    Ts,
}

/// A script block extracted from a component
#[derive(Debug, Clone)]
pub struct ScriptBlock {
    pub code: String,
    pub lang: ScriptLang,
    /// True for `<script context="module">` blocks
    pub module_context: bool,
}

/// The constituent parts of a single-file component
#[derive(Debug, Clone, Default)]
pub struct ComponentParts {
    /// Module-context script, runs once per import
    pub module_script: Option<ScriptBlock>,

    /// Instance script, runs per component instance
    pub instance_script: Option<ScriptBlock>,

    /// Style block content
    pub style: Option<String>,

    /// Markup with script and style blocks removed
    pub markup: String,
}

/// Split a component source into scripts, style, and markup
pub fn split_component(source: &str) -> Result<ComponentParts> {
    let mut parts = ComponentParts::default();
    let mut markup = source.to_string();

    for cap in SCRIPT_REGEX.captures_iter(source) {
        let attrs = cap.get(1).map(|m| m.as_str()).unwrap_or("");
        let code = cap.get(2).map(|m| m.as_str()).unwrap_or("");

        let block = ScriptBlock {
            code: code.trim().to_string(),
            lang: parse_lang(attrs),
            module_context: attrs.contains("context=\"module\"")
                || attrs.contains("context='module'"),
        };

        let slot = if block.module_context {
            &mut parts.module_script
        } else {
            &mut parts.instance_script
        };

        if slot.is_some() {
            anyhow::bail!(
                "A component may contain at most one instance script and one module-context script"
            );
        }
        *slot = Some(block);
    }

    let style_count = STYLE_REGEX.captures_iter(source).count();
    if style_count > 1 {
        anyhow::bail!("A component may contain at most one style block");
    }
    if let Some(cap) = STYLE_REGEX.captures(source) {
        parts.style = Some(cap.get(1).map(|m| m.as_str()).unwrap_or("").trim().to_string());
    }

    markup = SCRIPT_REGEX.replace_all(&markup, "").to_string();
    markup = STYLE_REGEX.replace_all(&markup, "").to_string();
    parts.markup = markup.trim().to_string();

    Ok(parts)
}

fn parse_lang(attrs: &str) -> ScriptLang {
    if attrs.contains("lang=\"ts\"")
        || attrs.contains("lang='ts'")
        || attrs.contains("lang=\"typescript\"")
        || attrs.contains("lang='typescript'")
    {
        ScriptLang::Ts
    } else {
        ScriptLang::Js
    }
}

/// Combine and transpile script blocks
///
/// The module-context block comes first, matching the execution order of
/// the component format. The transpile target is module-capable
/// environments with loose semantics, so the only source change is
/// TypeScript stripping; module syntax is left for the bundler.
pub fn preprocess_scripts(parts: &ComponentParts, options: TranspileOptions) -> Result<String> {
    let mut combined = String::new();

    if let Some(module) = &parts.module_script {
        combined.push_str(&transpile_block(module, options));
    }

    if let Some(instance) = &parts.instance_script {
        if !combined.is_empty() {
            combined.push_str("\n\n");
        }
        combined.push_str(&transpile_block(instance, options));
    }

    Ok(combined)
}

fn transpile_block(block: &ScriptBlock, options: TranspileOptions) -> String {
    let code = match block.lang {
        ScriptLang::Ts => strip_typescript_types(&block.code),
        ScriptLang::Js => block.code.clone(),
    };

    // modules: false keeps import/export untouched; esmodules targets
    // need no syntax down-leveling.
    debug_assert!(options.esmodules && !options.modules);
    code
}

/// Compile a component into a module
///
/// The emitted module exports the markup template and a mount function;
/// styles are intentionally absent here, they flow through the
/// stylesheet pipeline.
pub fn compile(parts: &ComponentParts, script: &str) -> String {
    let template = escape_js_string(&parts.markup);

    let mut code = String::new();
    if !script.is_empty() {
        code.push_str(script);
        code.push_str("\n\n");
    }

    code.push_str(&format!(
        "var __weft_template__ = \"{}\";\n\
         module.exports = {{\n\
         \x20 template: __weft_template__,\n\
         \x20 mount: function (target) {{\n\
         \x20   target.innerHTML = __weft_template__;\n\
         \x20   return target;\n\
         \x20 }}\n\
         }};\n",
        template
    ));

    code
}

fn escape_js_string(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "")
}

/// Strip TypeScript type annotations from a script
///
/// A heuristic single-pass scanner in place of a real parser: it removes
/// `: Type` annotations that look like types, `interface` blocks, `type`
/// aliases, and `as Type` casts, leaving everything else (including
/// string and template literal contents) untouched.
fn strip_typescript_types(source: &str) -> String {
    let mut result = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_string = false;
    let mut string_char = '"';
    let mut in_template = false;

    while let Some(c) = chars.next() {
        // String literals pass through verbatim
        if !in_template && (c == '"' || c == '\'') {
            if !in_string {
                in_string = true;
                string_char = c;
            } else if string_char == c {
                in_string = false;
            }
            result.push(c);
            continue;
        }

        if c == '`' && !in_string {
            in_template = !in_template;
            result.push(c);
            continue;
        }

        if in_string || in_template {
            result.push(c);
            continue;
        }

        // `: Type` annotations, guarded by a type-likeness check so
        // object literals survive
        if c == ':' {
            let lookahead: String = chars.clone().take(50).collect();
            let trimmed = lookahead.trim_start();
            if lookahead.starts_with(' ') && is_type_like(trimmed) {
                skip_type_expression(&mut chars);
                continue;
            }
        }

        // interface blocks
        if c == 'i' && starts_with_keyword(&mut chars, c, "interface ") {
            skip_braced_block(&mut chars);
            continue;
        }

        // type aliases
        if c == 't' && starts_with_keyword(&mut chars, c, "type ") {
            for nc in chars.by_ref() {
                if nc == ';' || nc == '\n' {
                    break;
                }
            }
            continue;
        }

        // `as Type` casts
        if c == ' ' {
            let lookahead: String = chars.clone().take(3).collect();
            if lookahead == "as " {
                for _ in 0..3 {
                    chars.next();
                }
                skip_type_expression(&mut chars);
                result.push(' ');
                continue;
            }
        }

        result.push(c);
    }

    result
}

fn is_type_like(text: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "string", "number", "boolean", "any", "void", "never", "unknown", "null", "undefined",
    ];
    KEYWORDS.iter().any(|kw| text.starts_with(kw))
        || text
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false)
}

fn starts_with_keyword(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    first: char,
    keyword: &str,
) -> bool {
    let lookahead: String = std::iter::once(first)
        .chain(chars.clone().take(keyword.len()))
        .collect();
    if lookahead.starts_with(keyword) {
        for _ in 0..keyword.len() - 1 {
            chars.next();
        }
        true
    } else {
        false
    }
}

fn skip_type_expression(chars: &mut std::iter::Peekable<std::str::Chars>) {
    let mut depth = 0;
    while let Some(&next) = chars.peek() {
        match next {
            '<' | '(' | '[' => {
                depth += 1;
                chars.next();
            }
            '>' | ']' => {
                depth -= 1;
                chars.next();
            }
            ')' if depth > 0 => {
                depth -= 1;
                chars.next();
            }
            '=' | ',' | '{' | ';' | '\n' | ')' if depth == 0 => break,
            _ => {
                chars.next();
            }
        }
    }
}

fn skip_braced_block(chars: &mut std::iter::Peekable<std::str::Chars>) {
    while let Some(nc) = chars.next() {
        if nc == '{' {
            let mut depth = 1;
            while depth > 0 {
                match chars.next() {
                    Some('{') => depth += 1,
                    Some('}') => depth -= 1,
                    Some(_) => {}
                    None => return,
                }
            }
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "<script>\nlet greeting = 'Hello';\n</script>\n\n<style>\nh1 { color: red; }\n</style>\n\n<h1>Hello World!</h1>\n";

    #[test]
    fn test_split_component() {
        let parts = split_component(HELLO).unwrap();

        assert_eq!(
            parts.instance_script.as_ref().unwrap().code,
            "let greeting = 'Hello';"
        );
        assert!(parts.module_script.is_none());
        assert_eq!(parts.style.as_deref(), Some("h1 { color: red; }"));
        assert_eq!(parts.markup, "<h1>Hello World!</h1>");
    }

    #[test]
    fn test_split_component_without_blocks() {
        let parts = split_component("<p>Just markup</p>").unwrap();
        assert!(parts.instance_script.is_none());
        assert!(parts.style.is_none());
        assert_eq!(parts.markup, "<p>Just markup</p>");
    }

    #[test]
    fn test_module_context_script_combines_first() {
        let source = "<script>\nlet count = 0;\n</script>\n<script context=\"module\">\nexport const shared = 'data';\n</script>\n<p>hi</p>";
        let parts = split_component(source).unwrap();
        let combined = preprocess_scripts(&parts, TranspileOptions::default()).unwrap();

        assert!(combined.starts_with("export const shared = 'data';"));
        assert!(combined.contains("let count = 0;"));
    }

    #[test]
    fn test_duplicate_instance_scripts_rejected() {
        let source = "<script>a;</script><script>b;</script>";
        assert!(split_component(source).is_err());
    }

    #[test]
    fn test_typescript_scripts_are_stripped() {
        let source = "<script lang=\"ts\">\nlet count: number = 0;\n</script>\n<p>hi</p>";
        let parts = split_component(source).unwrap();
        assert_eq!(parts.instance_script.as_ref().unwrap().lang, ScriptLang::Ts);

        let combined = preprocess_scripts(&parts, TranspileOptions::default()).unwrap();
        assert!(combined.contains("let count"));
        assert!(!combined.contains(": number"));
    }

    #[test]
    fn test_strip_types_leaves_object_literals() {
        let stripped = strip_typescript_types("const point = { x: 1, y: 2 };");
        assert_eq!(stripped, "const point = { x: 1, y: 2 };");
    }

    #[test]
    fn test_strip_types_removes_interface() {
        let stripped = strip_typescript_types("interface Point { x: number }\nconst a = 1;");
        assert!(!stripped.contains("interface"));
        assert!(stripped.contains("const a = 1;"));
    }

    #[test]
    fn test_strip_types_leaves_strings() {
        let source = "const s = 'a: string';";
        assert_eq!(strip_typescript_types(source), source);
    }

    #[test]
    fn test_compile_exports_template_and_mount() {
        let parts = split_component(HELLO).unwrap();
        let script = preprocess_scripts(&parts, TranspileOptions::default()).unwrap();
        let code = compile(&parts, &script);

        assert!(code.contains("let greeting = 'Hello';"));
        assert!(code.contains("__weft_template__ = \"<h1>Hello World!</h1>\""));
        assert!(code.contains("mount: function (target)"));
        assert!(code.contains("module.exports"));
        // Styles never end up in the compiled module
        assert!(!code.contains("color: red"));
    }
}
