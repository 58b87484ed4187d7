//! Template rendering.
//!
//! Templates see the bound entity collections plus a handful of globals
//! and functions:
//!
//! | Name | Meaning |
//! |------|---------|
//! | `structs`, `enums`, `typedefs`, `functions` | Bound declarations, hidden members removed |
//! | `custom_types` | Sorted names of bound struct/enum/typedef declarations |
//! | `BASE_DIR`, `PLATFORM`, `PLATFORM_DEFINE` | Build environment |
//! | `c_type(spelling)` | Target type name for a C type spelling |
//! | `doc_block(comment)` | Indented `"""` doc-block |
//! | `line_comment(comment)` | `// ` prefixed lines |
//! | `docstring(comment)` | Escaped one-line docstring |
//! | `params(function)` | `a: int, b: float` |
//!
//! Extra globals come from the project's `[vars]` table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use annogen_core::{
    bound, custom_type_universe, map_type, transform_comment, CommentStyle, CustomTypes, Entities,
};
use minijinja::{context, AutoEscape, Environment, Error, ErrorKind, Value};

/// Name and preprocessor define of the platform annogen runs on.
pub fn platform() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("windows", "PLATFORM_IS_WINDOWS")
    } else if cfg!(target_os = "macos") {
        ("macos", "PLATFORM_IS_MACOS")
    } else {
        ("linux", "PLATFORM_IS_LINUX")
    }
}

/// Render a function's parameter list as `name: type` pairs.
/// Unnamed parameters are called `arg0`, `arg1`, ...
fn format_params(function: &Value, custom: &CustomTypes) -> Result<String, Error> {
    let parameters = function.get_attr("parameters")?;
    if parameters.is_undefined() || parameters.is_none() {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "params() expects a function",
        ));
    }

    let mut parts = Vec::new();
    for (index, param) in parameters.try_iter()?.enumerate() {
        let name = param.get_attr("name")?;
        let name = match name.as_str() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("arg{index}"),
        };
        let spelling = param.get_attr("type")?;
        let target = map_type(spelling.as_str().unwrap_or_default(), custom);
        parts.push(format!("{name}: {target}"));
    }
    Ok(parts.join(", "))
}

/// Template renderer bound to one base directory.
#[derive(Debug, Clone)]
pub struct Renderer {
    base_dir: PathBuf,
    globals: BTreeMap<String, Value>,
}

impl Renderer {
    /// A renderer whose templates may `{% include %}` files under `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let (name, define) = platform();
        let mut globals = BTreeMap::new();
        globals.insert(
            "BASE_DIR".to_string(),
            Value::from(base_dir.display().to_string()),
        );
        globals.insert("PLATFORM".to_string(), Value::from(name));
        globals.insert("PLATFORM_DEFINE".to_string(), Value::from(define));
        Renderer { base_dir, globals }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Add or replace a template global.
    pub fn set_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.globals.insert(name.into(), value.into());
    }

    pub fn globals(&self) -> &BTreeMap<String, Value> {
        &self.globals
    }

    fn environment(&self, custom: Arc<CustomTypes>) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        // Generated code is written verbatim, whatever the template is named.
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_loader(minijinja::path_loader(&self.base_dir));

        for (name, value) in &self.globals {
            env.add_global(name.clone(), value.clone());
        }

        let types = Arc::clone(&custom);
        env.add_function("c_type", move |spelling: String| -> String {
            map_type(&spelling, &types).to_string()
        });
        env.add_function("doc_block", |comment: Option<String>| -> String {
            transform_comment(comment.as_deref(), CommentStyle::DocBlock)
        });
        env.add_function("line_comment", |comment: Option<String>| -> String {
            transform_comment(comment.as_deref(), CommentStyle::LineComment)
        });
        env.add_function("docstring", |comment: Option<String>| -> String {
            transform_comment(comment.as_deref(), CommentStyle::Inline)
        });
        env.add_function("params", move |function: Value| -> Result<String, Error> {
            format_params(&function, &custom)
        });
        env
    }

    /// Render `source` (named `name` in error messages) against the
    /// bound view of `entities`.
    pub fn render(&self, name: &str, source: &str, entities: &Entities) -> Result<String, Error> {
        let custom = Arc::new(custom_type_universe(entities));
        let exposed = bound(entities);
        let env = self.environment(Arc::clone(&custom));

        env.render_named_str(
            name,
            source,
            context! {
                structs => exposed.structs,
                enums => exposed.enums,
                typedefs => exposed.typedefs,
                functions => exposed.functions,
                custom_types => custom.as_ref(),
            },
        )
    }
}
