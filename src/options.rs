//! Option merging: pulls the options an artifact declares out of the override
//! document and turns them into template variables.

use crate::store::{OptionValue, OverrideDocument};
use crate::template::Context;

/// Fallback used when an option is missing or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionDefault {
    EmptyStr,
    EmptyList,
    Text(&'static str),
    List(&'static [&'static str]),
}

impl OptionDefault {
    fn value(self) -> OptionValue {
        match self {
            OptionDefault::EmptyStr => OptionValue::empty_str(),
            OptionDefault::EmptyList => OptionValue::empty_list(),
            OptionDefault::Text(text) => OptionValue::from(text),
            OptionDefault::List(items) => OptionValue::from(items),
        }
    }
}

/// One recognized option of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub default: OptionDefault,
    /// Separator for options spliced into an inline list.
    pub inline: Option<&'static str>,
}

impl OptionSpec {
    /// A free-form option defaulting to the empty string.
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            default: OptionDefault::EmptyStr,
            inline: None,
        }
    }

    /// A list option defaulting to the empty list.
    pub const fn list(name: &'static str) -> Self {
        Self {
            name,
            default: OptionDefault::EmptyList,
            inline: None,
        }
    }

    /// A fragment appended to an inline list in the template, e.g.
    /// `skip = "*.po%(codespell_skip)s"`.
    pub const fn inline(name: &'static str, separator: &'static str) -> Self {
        Self {
            name,
            default: OptionDefault::EmptyStr,
            inline: Some(separator),
        }
    }

    /// Use `default` when the option is missing or blank.
    pub const fn or(self, default: OptionDefault) -> Self {
        Self { default, ..self }
    }
}

/// Collect `specs` from `section` of `document` into template variables.
///
/// Missing and blank values take the option's default. Multi-line strings that
/// start with whitespace get back the leading line break a TOML parser strips
/// from `'''` blocks. Inline fragments get a single leading separator when
/// they are non-empty and stay empty otherwise.
pub fn collect(document: &OverrideDocument, section: &str, specs: &[OptionSpec]) -> Context {
    let mut options = Context::new();
    for spec in specs {
        let mut value = document.option(section, spec.name, spec.default.value());
        if !value.is_truthy() && value != OptionValue::Bool(false) {
            value = spec.default.value();
        }
        value = restore_leading_newline(value);
        if let Some(separator) = spec.inline {
            value = OptionValue::Str(pad_inline(&value, separator));
        }
        log::debug!("option {}.{} = {:?}", section, spec.name, value);
        options.insert(spec.name.to_string(), value);
    }
    options
}

fn restore_leading_newline(value: OptionValue) -> OptionValue {
    match value {
        OptionValue::Str(s) if s.contains('\n') && s.starts_with(' ') => {
            OptionValue::Str(format!("\n{}", s))
        }
        other => other,
    }
}

/// Join an inline list fragment, prefixed with one separator when non-empty.
pub fn pad_inline(value: &OptionValue, separator: &str) -> String {
    let joined = match value {
        OptionValue::List(items) => items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(separator),
        other => other.to_text().trim().to_string(),
    };
    if joined.is_empty() {
        joined
    } else {
        format!("{}{}", separator, joined)
    }
}
