//! `annogen inspect`: show what a header exposes.

use std::fmt::Write as _;
use std::path::Path;

use annogen_core::{
    bound, custom_type_universe, map_type, Annotated, CustomTypes, Declaration, Entities,
};
use anyhow::{bail, Context, Result};

/// Parse `header` and print its entities as `text` (default) or `json`.
/// Only bound declarations are shown unless `all` is set.
pub fn run(header: &Path, all: bool, format: Option<&str>) -> Result<()> {
    let source = std::fs::read_to_string(header)
        .with_context(|| format!("reading {}", header.display()))?;
    let entities = Entities::from_source(&source)
        .with_context(|| format!("parsing {}", header.display()))?;
    let custom = custom_type_universe(&entities);
    let shown = if all { entities } else { bound(&entities) };

    match format.unwrap_or("text") {
        "text" => print!("{}", render_text(&shown, &custom)),
        "json" => println!("{}", render_json(&shown, &custom)?),
        other => bail!("unknown format '{other}' (expected text or json)"),
    }
    Ok(())
}

fn tags(item: &impl Annotated) -> String {
    if item.annotations().is_empty() {
        String::new()
    } else {
        format!(" [{}]", item.annotations().join(", "))
    }
}

/// One block per declaration, members indented beneath it with their C
/// spelling and mapped target type.
pub fn render_text(entities: &Entities, custom: &CustomTypes) -> String {
    let mut out = String::new();
    for decl in entities.declarations() {
        let _ = writeln!(out, "{} {}{}", decl.kind_label(), decl.name(), tags(&decl));
        match &decl {
            Declaration::Struct(s) => {
                for f in &s.fields {
                    let target = map_type(&f.type_spelling, custom);
                    let _ = writeln!(
                        out,
                        "  {}: {} -> {target}{}",
                        f.name,
                        f.type_spelling,
                        tags(f)
                    );
                }
            }
            Declaration::Enum(e) => {
                for c in &e.constants {
                    let _ = writeln!(out, "  {} = {}{}", c.name, c.value, tags(c));
                }
            }
            Declaration::Typedef(t) => {
                let target = map_type(&t.underlying, custom);
                let _ = writeln!(out, "  = {} -> {target}", t.underlying);
            }
            Declaration::Function(f) => {
                for p in &f.parameters {
                    let target = map_type(&p.type_spelling, custom);
                    let _ = writeln!(out, "  {}: {} -> {target}", p.name, p.type_spelling);
                }
                if f.is_variadic {
                    let _ = writeln!(out, "  ...");
                }
                let target = map_type(&f.return_type, custom);
                let _ = writeln!(out, "  returns {} -> {target}", f.return_type);
            }
        }
    }
    let _ = writeln!(
        out,
        "{} declaration(s), {} custom type(s)",
        entities.len(),
        custom.len()
    );
    out
}

/// The entity collections plus the custom-type universe as pretty JSON.
pub fn render_json(entities: &Entities, custom: &CustomTypes) -> Result<String> {
    let value = serde_json::json!({
        "structs": entities.structs,
        "enums": entities.enums,
        "typedefs": entities.typedefs,
        "functions": entities.functions,
        "custom_types": custom,
    });
    serde_json::to_string_pretty(&value).context("serializing entities")
}
