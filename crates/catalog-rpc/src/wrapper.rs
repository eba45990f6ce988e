//! Response wrapping for frontend compatibility.
//!
//! The frontend expects `{success: true, <key>: data}` envelopes for list and
//! status results. Methods not listed here pass through unchanged.

use serde_json::{json, Value};

/// Wrap a raw handler result in the envelope the frontend expects for `method`.
pub fn wrap_response(method: &str, result: Value) -> Value {
    match method {
        // List wrappers
        "search" => {
            json!({
                "success": true,
                "hits": if result.is_null() { json!([]) } else { result }
            })
        }

        "suggest" => {
            json!({
                "success": true,
                "suggestions": if result.is_null() { json!([]) } else { result }
            })
        }

        // Dict wrappers
        "get" => {
            json!({
                "success": true,
                "record": result
            })
        }

        "status" => {
            json!({
                "success": true,
                "status": if result.is_null() { json!({}) } else { result }
            })
        }

        // Bool methods
        "delete" => {
            json!({
                "success": result.as_bool().unwrap_or(false)
            })
        }

        // Passthrough methods (already structured reports)
        _ => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_wrappers() {
        let wrapped = wrap_response("search", json!([{"id": "a"}]));
        assert_eq!(wrapped["success"], json!(true));
        assert_eq!(wrapped["hits"][0]["id"], json!("a"));

        let wrapped = wrap_response("suggest", Value::Null);
        assert_eq!(wrapped["suggestions"], json!([]));
    }

    #[test]
    fn test_bool_wrapper() {
        assert_eq!(wrap_response("delete", json!(true)), json!({"success": true}));
    }

    #[test]
    fn test_passthrough() {
        let report = json!({"success_count": 3, "errors": []});
        assert_eq!(wrap_response("reindex_all", report.clone()), report);
    }
}
