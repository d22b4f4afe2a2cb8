// Parsing of structured model responses.
//
// The model is asked for JSON only, but the text still arrives as a plain
// string: it can be empty, wrapped in a markdown code fence, or malformed.

use serde::de::DeserializeOwned;

use crate::error::{EngineError, Result};
use crate::tree::TreeNode;

/// Parse a model response body as `T`.
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(EngineError::EmptyResponse);
    }
    Ok(serde_json::from_str(body)?)
}

/// Parse and validate a decision tree returned by the model.
pub fn parse_tree_response(text: &str) -> Result<TreeNode> {
    let tree: TreeNode = parse_model_json(text)?;
    tree.validate()?;
    Ok(tree)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return text;
    };
    // drop the info string ("json") on the opening line
    match rest.find('\n') {
        Some(nl) => rest[nl + 1..].trim(),
        None => rest.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree() {
        let text = r#"{"name":"Root","children":[{"name":"A"},{"name":"B","details":"why","children":[{"name":"B1"}]}]}"#;
        let tree = parse_tree_response(text).unwrap();
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.children()[1].details.as_deref(), Some("why"));
    }

    #[test]
    fn test_fenced_response() {
        let text = "```json\n{\"name\": \"Root\"}\n```";
        let tree = parse_tree_response(text).unwrap();
        assert_eq!(tree.name, "Root");
    }

    #[test]
    fn test_empty_response() {
        assert!(matches!(parse_tree_response("   "), Err(EngineError::EmptyResponse)));
        assert!(matches!(parse_tree_response("```json\n```"), Err(EngineError::EmptyResponse)));
    }

    #[test]
    fn test_malformed_response() {
        assert!(matches!(parse_tree_response("{\"name\": "), Err(EngineError::InvalidJson(_))));
        assert!(matches!(parse_tree_response("{\"details\": \"no name\"}"), Err(EngineError::InvalidJson(_))));
    }

    #[test]
    fn test_blank_label_rejected() {
        let text = r#"{"name":"Root","children":[{"name":""}]}"#;
        assert!(matches!(parse_tree_response(text), Err(EngineError::EmptyName { .. })));
    }
}
