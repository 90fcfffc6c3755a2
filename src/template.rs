//! # Template Resolution and Rendering
//!
//! Templates live on disk under a template root, one directory per profile.
//! A profile's own directory is searched first and the shared `default`
//! directory second, so a profile can override individual templates and
//! inherit the rest.
//!
//! ## Template syntax
//!
//! The generated formats (YAML, INI, TOML, shell) use `{}` and `%` heavily,
//! so placeholders use the `%(` ... `)s` pair instead:
//!
//! - `%(name)s` substitutes a variable. Lists are joined with spaces.
//! - `%(if name)s`, `%(if not name)s`, `%(else)s`, `%(endif)s` test
//!   truthiness (empty strings, empty lists and `false` are falsy).
//! - `%(for item in name)s` ... `%(endfor)s` loops over a list, or over the
//!   lines of a string.
//! - `%%(` emits a literal `%(`.
//!
//! Block tags swallow the indentation before them and the line break after
//! them, so a tag on its own line leaves no trace in the output.
//!
//! Referencing a variable that was not supplied is an error: rendering fails
//! instead of silently producing a blank.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::defaults::SHARED_TEMPLATE_DIR;
use crate::error::{Error, Result};
use crate::store::OptionValue;

/// Variables available to a template.
pub type Context = BTreeMap<String, OptionValue>;

const OPEN: &str = "%(";
const CLOSE: &str = ")s";
const ESCAPED_OPEN: &str = "%%(";

/// Ordered template search locations for one profile.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    profile: String,
    roots: Vec<PathBuf>,
}

impl TemplateResolver {
    /// Resolve `profile` against the template root.
    ///
    /// Fails if the profile has no directory under `template_root`.
    pub fn for_profile(template_root: &Path, profile: &str) -> Result<Self> {
        let roots = resolve(template_root, profile);
        if !roots[0].is_dir() {
            let available = available_profiles(template_root);
            return Err(Error::Configuration {
                message: format!(
                    "Unknown configuration type '{}' (no directory {})",
                    profile,
                    roots[0].display()
                ),
                hint: Some(if available.is_empty() {
                    format!("No profiles found under {}", template_root.display())
                } else {
                    format!("Available types: {}", available.join(", "))
                }),
            });
        }
        Ok(Self {
            profile: profile.to_string(),
            roots,
        })
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// The profile-specific directory (first search root).
    pub fn profile_dir(&self) -> &Path {
        &self.roots[0]
    }

    /// Locate a template file, first match wins.
    pub fn find(&self, name: &str) -> Result<PathBuf> {
        for root in &self.roots {
            let candidate = root.join(name);
            if candidate.is_file() {
                log::debug!("template {} resolved to {}", name, candidate.display());
                return Ok(candidate);
            }
        }
        Err(Error::TemplateNotFound {
            name: name.to_string(),
            searched: self
                .roots
                .iter()
                .map(|root| root.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Read the body of a template.
    pub fn load(&self, name: &str) -> Result<String> {
        Ok(fs::read_to_string(self.find(name)?)?)
    }

    /// Render the named template with `context`.
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        let body = self.load(name)?;
        render_str(name, &body, context)
    }

    /// All visible templates by name, with the file that wins for each.
    pub fn templates(&self) -> BTreeMap<String, PathBuf> {
        let mut found = BTreeMap::new();
        // Iterate from the lowest precedence root so higher ones overwrite.
        for root in self.roots.iter().rev() {
            for entry in WalkDir::new(root)
                .min_depth(1)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
            {
                if let Ok(relative) = entry.path().strip_prefix(root) {
                    found.insert(
                        relative.to_string_lossy().replace('\\', "/"),
                        entry.path().to_path_buf(),
                    );
                }
            }
        }
        found
    }

    /// Short SHA-256 over the names and contents of all visible templates.
    /// Stable across builds, so unchanged templates keep their token.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for (name, path) in self.templates() {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            if let Ok(content) = fs::read(&path) {
                hasher.update((content.len() as u64).to_le_bytes());
                hasher.update(&content);
            }
        }
        hex::encode(hasher.finalize())[..8].to_string()
    }
}

/// Search roots for `profile`: its own directory, then the shared one.
pub fn resolve(template_root: &Path, profile: &str) -> Vec<PathBuf> {
    let mut roots = vec![template_root.join(profile)];
    if profile != SHARED_TEMPLATE_DIR {
        roots.push(template_root.join(SHARED_TEMPLATE_DIR));
    }
    roots
}

/// Profiles available under a template root, sorted.
pub fn available_profiles(template_root: &Path) -> Vec<String> {
    let mut profiles: Vec<String> = fs::read_dir(template_root)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_dir())
                .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
                .filter(|name| !name.starts_with('.'))
                .collect()
        })
        .unwrap_or_default();
    profiles.sort();
    profiles
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Var(String),
    Block(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Var(String),
    If {
        name: String,
        negate: bool,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    For {
        item: String,
        list: String,
        body: Vec<Node>,
    },
}

fn render_error(template: &str, message: impl Into<String>, variable: Option<&str>) -> Error {
    Error::TemplateRender {
        template: template.to_string(),
        message: message.into(),
        variable: variable.map(str::to_string),
    }
}

fn is_block(tag: &str) -> bool {
    let keyword = tag.split_whitespace().next().unwrap_or_default();
    matches!(keyword, "if" | "else" | "endif" | "for" | "endfor")
}

fn tokenize(template: &str, source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = source;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix(ESCAPED_OPEN) {
            text.push_str(OPEN);
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix(OPEN) {
            let end = after
                .find(CLOSE)
                .ok_or_else(|| render_error(template, "unterminated placeholder", None))?;
            let tag = after[..end].trim().to_string();
            rest = &after[end + CLOSE.len()..];

            if is_block(&tag) {
                // Drop indentation between the last line break and the tag.
                let line_start = text.rfind('\n').map(|i| i + 1).unwrap_or(0);
                let at_line_start = line_start > 0
                    || match tokens.last() {
                        None | Some(Token::Block(_)) => true,
                        Some(Token::Text(previous)) => previous.ends_with('\n'),
                        Some(Token::Var(_)) => false,
                    };
                if at_line_start && text[line_start..].chars().all(|c| c == ' ' || c == '\t') {
                    text.truncate(line_start);
                }
                if let Some(after_newline) = rest.strip_prefix('\n') {
                    rest = after_newline;
                }
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text)));
                }
                tokens.push(Token::Block(tag));
            } else {
                if tag.is_empty() {
                    return Err(render_error(template, "empty placeholder", None));
                }
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text)));
                }
                tokens.push(Token::Var(tag));
            }
            continue;
        }
        let next = rest
            .char_indices()
            .skip(1)
            .find(|(i, _)| rest[*i..].starts_with('%'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        text.push_str(&rest[..next]);
        rest = &rest[next..];
    }
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    Ok(tokens)
}

/// What ended a nested block while parsing.
enum Terminator {
    Eof,
    Else,
    EndIf,
    EndFor,
}

fn parse(template: &str, tokens: &mut std::vec::IntoIter<Token>) -> Result<(Vec<Node>, Terminator)> {
    let mut nodes = Vec::new();
    while let Some(token) = tokens.next() {
        match token {
            Token::Text(text) => nodes.push(Node::Text(text)),
            Token::Var(name) => nodes.push(Node::Var(name)),
            Token::Block(tag) => {
                let words: Vec<&str> = tag.split_whitespace().collect();
                match words.as_slice() {
                    ["if", name] | ["if", "not", name] => {
                        let negate = words.len() == 3;
                        let name = name.to_string();
                        let (then, end) = parse(template, tokens)?;
                        let otherwise = match end {
                            Terminator::EndIf => Vec::new(),
                            Terminator::Else => match parse(template, tokens)? {
                                (nodes, Terminator::EndIf) => nodes,
                                _ => {
                                    return Err(render_error(
                                        template,
                                        format!("`if {}` is missing its endif", name),
                                        None,
                                    ))
                                }
                            },
                            _ => {
                                return Err(render_error(
                                    template,
                                    format!("`if {}` is missing its endif", name),
                                    None,
                                ))
                            }
                        };
                        nodes.push(Node::If {
                            name,
                            negate,
                            then,
                            otherwise,
                        });
                    }
                    ["for", item, "in", list] => {
                        let (body, end) = parse(template, tokens)?;
                        if !matches!(end, Terminator::EndFor) {
                            return Err(render_error(
                                template,
                                format!("`for {} in {}` is missing its endfor", item, list),
                                None,
                            ));
                        }
                        nodes.push(Node::For {
                            item: item.to_string(),
                            list: list.to_string(),
                            body,
                        });
                    }
                    ["else"] => return Ok((nodes, Terminator::Else)),
                    ["endif"] => return Ok((nodes, Terminator::EndIf)),
                    ["endfor"] => return Ok((nodes, Terminator::EndFor)),
                    _ => {
                        return Err(render_error(
                            template,
                            format!("malformed block tag `{}`", tag),
                            None,
                        ))
                    }
                }
            }
        }
    }
    Ok((nodes, Terminator::Eof))
}

struct Scope<'a> {
    context: &'a Context,
    locals: Vec<(String, OptionValue)>,
}

impl Scope<'_> {
    fn lookup(&self, template: &str, name: &str) -> Result<OptionValue> {
        self.locals
            .iter()
            .rev()
            .find(|(local, _)| local == name)
            .map(|(_, value)| value.clone())
            .or_else(|| self.context.get(name).cloned())
            .ok_or_else(|| render_error(template, "undefined variable", Some(name)))
    }
}

fn evaluate(template: &str, nodes: &[Node], scope: &mut Scope<'_>, out: &mut String) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(name) => out.push_str(&scope.lookup(template, name)?.to_text()),
            Node::If {
                name,
                negate,
                then,
                otherwise,
            } => {
                let truthy = scope.lookup(template, name)?.is_truthy();
                let branch = if truthy != *negate { then } else { otherwise };
                evaluate(template, branch, scope, out)?;
            }
            Node::For { item, list, body } => {
                for value in scope.lookup(template, list)?.items() {
                    scope.locals.push((item.clone(), OptionValue::Str(value)));
                    let result = evaluate(template, body, scope, out);
                    scope.locals.pop();
                    result?;
                }
            }
        }
    }
    Ok(())
}

/// Render template source text. `template` names the source in errors.
pub fn render_str(template: &str, source: &str, context: &Context) -> Result<String> {
    let tokens = tokenize(template, source)?;
    let (nodes, end) = parse(template, &mut tokens.into_iter())?;
    match end {
        Terminator::Eof => {}
        Terminator::Else => return Err(render_error(template, "`else` outside of `if`", None)),
        Terminator::EndIf => return Err(render_error(template, "`endif` without `if`", None)),
        Terminator::EndFor => return Err(render_error(template, "`endfor` without `for`", None)),
    }
    let mut scope = Scope {
        context,
        locals: Vec::new(),
    };
    let mut out = String::with_capacity(source.len());
    evaluate(template, &nodes, &mut scope, &mut out)?;
    Ok(out)
}
