//! URL templates with `:name` placeholder tokens.
//! used for API endpoint templates and for redirect targets that carry path parameters.

use std::collections::HashMap;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// bytes escaped when a value is written into a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("no value for placeholder `:{name}` in template `{template}`")]
    MissingParameter { name: String, template: String },
}

/// values that can be substituted into a template
pub trait Placeholders {
    fn placeholder(&self, name: &str) -> Option<&str>;
}

impl Placeholders for HashMap<String, String> {
    fn placeholder(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<const N: usize> Placeholders for [(&str, &str); N] {
    fn placeholder(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

/// a piece of a template: either text copied as-is or a named placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'text> {
    Literal(&'text str),
    Placeholder(&'text str),
}

/// iterator over the pieces of a template, in order
#[derive(Debug, Clone)]
pub struct Pieces<'text> {
    text: &'text str,
    position: usize,
}

impl<'text> Iterator for Pieces<'text> {
    type Item = Piece<'text>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.position..];
        if rest.is_empty() {
            return None;
        }

        if let Some(len) = placeholder_len(rest) {
            self.position += 1 + len;
            return Some(Piece::Placeholder(&rest[1..1 + len]));
        }

        let end = rest
            .char_indices()
            .skip(1)
            .find(|&(i, _)| placeholder_len(&rest[i..]).is_some())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        self.position += end;
        Some(Piece::Literal(&rest[..end]))
    }
}

pub fn pieces(template: &str) -> Pieces<'_> {
    Pieces {
        text: template,
        position: 0,
    }
}

/// names of every placeholder in `template`, in order of appearance
pub fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    pieces(template).filter_map(|piece| match piece {
        Piece::Placeholder(name) => Some(name),
        Piece::Literal(_) => None,
    })
}

/// replace every `:name` token in `template` with its value from `params`.
/// values are percent-encoded so each one stays a single path segment.
/// unused params are ignored.
pub fn expand<P>(template: &str, params: &P) -> Result<String, TemplateError>
where
    P: Placeholders + ?Sized,
{
    let mut expanded = String::with_capacity(template.len());

    for piece in pieces(template) {
        match piece {
            Piece::Literal(text) => expanded.push_str(text),
            Piece::Placeholder(name) => {
                let value =
                    params
                        .placeholder(name)
                        .ok_or_else(|| TemplateError::MissingParameter {
                            name: name.to_string(),
                            template: template.to_string(),
                        })?;
                expanded.extend(utf8_percent_encode(value, PATH_SEGMENT));
            }
        }
    }

    Ok(expanded)
}

/// the name of `segment` when the whole segment is one `:name` token
pub fn placeholder_name(segment: &str) -> Option<&str> {
    placeholder_len(segment)
        .filter(|&len| len + 1 == segment.len())
        .map(|len| &segment[1..])
}

/// length of the placeholder name if `text` starts with a `:name` token.
/// a name starts with an ASCII letter or `_` and continues with ASCII alphanumerics or `_`.
fn placeholder_len(text: &str) -> Option<usize> {
    let name = text.strip_prefix(':')?;
    let mut chars = name.char_indices();

    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }

    let len = chars
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(name.len());

    Some(len)
}
