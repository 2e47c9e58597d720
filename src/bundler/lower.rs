//! Module syntax lowering
//!
//! The preprocessing step leaves import/export syntax untouched
//! (`modules: false`); lowering it to the bundle's require-based module
//! shape is the bundler's job. Import specifiers are rewritten to the
//! resolved module keys at the same time. Default interop follows loose
//! semantics: a default import receives the whole exports object, and
//! `export default` replaces it.

use std::collections::HashMap;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

static EXPORT_DEFAULT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"export\s+default\s+").unwrap());

static EXPORT_BINDING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"export\s+(?:const|let|var)\s+(\w+)\s*=").unwrap());

static EXPORT_FUNCTION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"export\s+function\s+(\w+)").unwrap());

static EXPORT_CLASS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"export\s+class\s+(\w+)").unwrap());

static EXPORT_LIST_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"export\s*\{([^}]*)\}\s*;?").unwrap());

/// Lower import/export statements in module code
///
/// `keys` maps each import specifier to its module key; unresolved
/// specifiers stay as-is, and the runtime returns an empty exports
/// object for keys it does not know.
pub fn lower_module_syntax(code: &str, keys: &HashMap<String, String>) -> Result<String> {
    let mut out = code.to_string();

    for (spec, key) in keys {
        let spec_pattern = regex::escape(spec);
        let require = format!("require(\"{}\")", key);

        // import Default, { named } from 'spec';
        let combined = Regex::new(&format!(
            r#"import\s+(\w+)\s*,\s*\{{([^}}]*)\}}\s+from\s+['"]{}['"]\s*;?"#,
            spec_pattern
        ))?;
        out = combined
            .replace_all(&out, |caps: &regex::Captures| {
                format!(
                    "var {} = {}; var {{ {} }} = {};",
                    &caps[1],
                    require,
                    rename_bindings(&caps[2]),
                    &caps[1]
                )
            })
            .to_string();

        // import * as ns from 'spec';
        let namespace = Regex::new(&format!(
            r#"import\s+\*\s+as\s+(\w+)\s+from\s+['"]{}['"]\s*;?"#,
            spec_pattern
        ))?;
        out = namespace
            .replace_all(&out, format!("var $1 = {};", require).as_str())
            .to_string();

        // import { named } from 'spec';
        let named = Regex::new(&format!(
            r#"import\s*\{{([^}}]*)\}}\s*from\s*['"]{}['"]\s*;?"#,
            spec_pattern
        ))?;
        out = named
            .replace_all(&out, |caps: &regex::Captures| {
                format!("var {{ {} }} = {};", rename_bindings(&caps[1]), require)
            })
            .to_string();

        // import Default from 'spec';
        let default = Regex::new(&format!(
            r#"import\s+(\w+)\s+from\s+['"]{}['"]\s*;?"#,
            spec_pattern
        ))?;
        out = default
            .replace_all(&out, format!("var $1 = {};", require).as_str())
            .to_string();

        // export { a, b } from 'spec';
        let reexport = Regex::new(&format!(
            r#"export\s*\{{([^}}]*)\}}\s*from\s*['"]{}['"]\s*;?"#,
            spec_pattern
        ))?;
        out = reexport
            .replace_all(&out, |caps: &regex::Captures| {
                reexport_assignments(&caps[1], &require)
            })
            .to_string();

        // import 'spec';
        let side_effect = Regex::new(&format!(
            r#"import\s+['"]{}['"]\s*;?"#,
            spec_pattern
        ))?;
        out = side_effect
            .replace_all(&out, format!("{};", require).as_str())
            .to_string();
    }

    out = EXPORT_DEFAULT_REGEX
        .replace_all(&out, "module.exports = ")
        .to_string();
    out = EXPORT_BINDING_REGEX
        .replace_all(&out, "var $1 = module.exports.$1 =")
        .to_string();
    out = EXPORT_FUNCTION_REGEX
        .replace_all(&out, "var $1 = module.exports.$1 = function $1")
        .to_string();
    out = EXPORT_CLASS_REGEX
        .replace_all(&out, "var $1 = module.exports.$1 = class $1")
        .to_string();
    out = EXPORT_LIST_REGEX
        .replace_all(&out, |caps: &regex::Captures| {
            local_export_assignments(&caps[1])
        })
        .to_string();

    Ok(out)
}

/// `a as b, c` -> `a: b, c` for destructuring
fn rename_bindings(list: &str) -> String {
    list.split(',')
        .map(|binding| {
            let binding = binding.trim();
            match binding.split_once(" as ") {
                Some((from, to)) => format!("{}: {}", from.trim(), to.trim()),
                None => binding.to_string(),
            }
        })
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `a, b as c` re-exported from another module
fn reexport_assignments(list: &str, require: &str) -> String {
    list.split(',')
        .filter_map(|binding| {
            let binding = binding.trim();
            if binding.is_empty() {
                return None;
            }
            let (from, to) = match binding.split_once(" as ") {
                Some((from, to)) => (from.trim(), to.trim()),
                None => (binding, binding),
            };
            Some(format!("module.exports.{} = {}.{};", to, require, from))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `export { a, b as c };` over local bindings
fn local_export_assignments(list: &str) -> String {
    list.split(',')
        .filter_map(|binding| {
            let binding = binding.trim();
            if binding.is_empty() {
                return None;
            }
            let (from, to) = match binding.split_once(" as ") {
                Some((from, to)) => (from.trim(), to.trim()),
                None => (binding, binding),
            };
            Some(format!("module.exports.{} = {};", to, from))
        })
        .collect::<Vec<_>>()
        .join(" ")
}
