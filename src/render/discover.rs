use std::{path::Path, sync::LazyLock};

use regex::Regex;

/// `class Name(<bases containing "Scene">):` on a single line.
static SCENE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"class\s+(\w+)\s*\(.*Scene.*\):").expect("scene class pattern is valid")
});

/// Names of the renderable scene declarations in `source_file`, in file order.
///
/// A declaration counts when its base-type list mentions a type containing `Scene`
/// (`Scene`, `MovingCameraScene`, `BaseScene`, ...). An absent or unreadable file yields an
/// empty list.
pub fn discover_units(source_file: &Path) -> Vec<String> {
    match std::fs::read_to_string(source_file) {
        Ok(source) => discover_units_in(&source),
        Err(e) => {
            tracing::debug!(path = %source_file.display(), error = %e, "cannot read source");
            Vec::new()
        }
    }
}

/// Same as [`discover_units`] over in-memory source text.
///
/// Repeated declarations keep their first position.
pub fn discover_units_in(source: &str) -> Vec<String> {
    let mut out = Vec::<String>::new();
    for caps in SCENE_CLASS.captures_iter(source) {
        let name = &caps[1];
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/discover.rs"]
mod tests;
