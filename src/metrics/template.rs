//! Placeholder templates for metric names, rendered with `minijinja`.
//!
//! `{{Name}}` substitutes a field; the dotted `{{.Name}}` form is accepted
//! too and rewritten before compilation. Every referenced name must belong
//! to the [`FieldSet`] the template is compiled against.

use std::collections::BTreeMap;
use std::fmt;

use minijinja::{Environment, UndefinedBehavior};

use super::context::{FieldId, FieldSet, SubstitutionContext};
use crate::error::{Error, Result};

const NAME: &str = "metric";

/// A template compiled against a [`FieldSet`].
pub struct Template {
    source: String,
    referenced: Vec<FieldId>,
    env: Environment<'static>,
}

impl Template {
    /// Compile `source` once. Syntax errors and names outside `fields`
    /// are both fatal.
    pub fn compile(source: &str, fields: &FieldSet) -> Result<Self> {
        let fail = |reason: String| Error::FatalDerivation(format!("template {source:?}: {reason}"));

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.add_template_owned(NAME, strip_dots(source))
            .map_err(|e| fail(e.to_string()))?;

        let referenced = {
            let compiled = env.get_template(NAME).map_err(|e| fail(e.to_string()))?;
            let mut names: Vec<String> = compiled.undeclared_variables(false).into_iter().collect();
            names.sort();
            names
                .iter()
                .map(|name| {
                    fields
                        .lookup(name)
                        .ok_or_else(|| fail(format!("unknown field {name:?}")))
                })
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Self {
            source: source.to_string(),
            referenced,
            env,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitute every placeholder from `ctx`. A placeholder with no bound
    /// value is an error naming the field.
    pub fn render(&self, ctx: &SubstitutionContext<'_>) -> Result<String> {
        let mut values = BTreeMap::new();
        for &id in &self.referenced {
            let name = ctx.fields().name(id);
            let value = ctx.get_id(id).ok_or_else(|| {
                Error::FatalDerivation(format!("template {:?}: no value for {name:?}", self.source))
            })?;
            values.insert(name, value);
        }

        self.env
            .get_template(NAME)
            .and_then(|t| t.render(&values))
            .map_err(|e| Error::FatalDerivation(format!("template {:?}: {e}", self.source)))
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("source", &self.source)
            .field("referenced", &self.referenced)
            .finish()
    }
}

/// `{{ .Name }}` -> `{{ Name }}`
fn strip_dots(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(open) = rest.find("{{") {
        let after = &rest[open + 2..];
        let inner = after.trim_start();
        out.push_str(&rest[..open + 2]);
        out.push_str(&after[..after.len() - inner.len()]);
        rest = inner.strip_prefix('.').unwrap_or(inner);
    }
    out.push_str(rest);
    out
}
