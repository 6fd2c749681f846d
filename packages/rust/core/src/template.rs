//! Template filling.
//!
//! Every text leaf is a flat format string: `{field}` is replaced with the
//! content field of that name, and `{{` / `}}` produce literal braces.
//! Lists and maps are rebuilt with the same shape; other scalars pass through.

use std::sync::LazyLock;

use regex::Regex;

use pagesmith_shared::{ContentMap, PagesmithError, Result, TemplateNode};

/// Fill every text leaf of `template` from `content`.
///
/// Fails on the first placeholder that names no content field, or on an
/// unbalanced brace.
pub fn fill(template: &TemplateNode, content: &ContentMap) -> Result<TemplateNode> {
    let filled = match template {
        TemplateNode::Text(text) => TemplateNode::Text(substitute(text, content)?),
        TemplateNode::List(items) => TemplateNode::List(
            items
                .iter()
                .map(|item| fill(item, content))
                .collect::<Result<Vec<_>>>()?,
        ),
        TemplateNode::Map(entries) => TemplateNode::Map(
            entries
                .iter()
                .map(|(key, value)| Ok((key.clone(), fill(value, content)?)))
                .collect::<Result<Vec<_>>>()?,
        ),
        TemplateNode::Scalar(scalar) => TemplateNode::Scalar(scalar.clone()),
    };
    Ok(filled)
}

/// Resolve the placeholders in one format string.
pub fn substitute(text: &str, content: &ContentMap) -> Result<String> {
    // Escaped braces first, then a placeholder, then any stray brace.
    static TOKEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").expect("valid regex"));

    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in TOKEN_RE.captures_iter(text) {
        let Some(token) = caps.get(0) else { continue };
        out.push_str(&text[last..token.start()]);
        last = token.end();

        match (token.as_str(), caps.get(1)) {
            ("{{", _) => out.push('{'),
            ("}}", _) => out.push('}'),
            (_, Some(name)) => {
                let value = content.get(name.as_str()).ok_or_else(|| {
                    PagesmithError::UnknownPlaceholder {
                        placeholder: name.as_str().to_string(),
                        text: text.to_string(),
                    }
                })?;
                out.push_str(value);
            }
            (stray, None) => {
                return Err(PagesmithError::MalformedTemplate {
                    text: text.to_string(),
                    reason: format!("unmatched '{stray}' at byte {}", token.start()),
                });
            }
        }
    }

    out.push_str(&text[last..]);
    Ok(out)
}
