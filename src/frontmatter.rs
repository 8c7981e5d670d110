//! YAML front matter extraction for markdown content files.
//!
//! A content file starts with a `---` fence line, the YAML block, and a
//! closing `---` line. Everything after the closing fence is the body.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("missing front matter block")]
    Missing,
    #[error("front matter is not closed with '---'")]
    Unterminated,
}

/// Split a markdown document into its raw YAML block and body.
pub fn split(content: &str) -> Result<(&str, &str), FrontMatterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = match content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    {
        Some(r) => r,
        None => return Err(FrontMatterError::Missing),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((yaml, body.trim_start_matches(['\r', '\n'])));
        }
        offset += line.len();
    }
    Err(FrontMatterError::Unterminated)
}

/// Parse the front matter into a YAML value. An empty block yields an empty mapping.
pub fn parse(content: &str) -> Result<(serde_yaml::Value, &str), ParseError> {
    let (yaml, body) = split(content)?;
    if yaml.trim().is_empty() {
        return Ok((serde_yaml::Value::Mapping(Default::default()), body));
    }
    let value = serde_yaml::from_str(yaml)?;
    Ok((value, body))
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
