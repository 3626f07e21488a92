//! Advisory scan of proposed queries for write or destructive operations.
//!
//! The backend rejects such queries on execution; flagging them up front lets
//! the person approving see the risk before pressing "execute".

use std::sync::LazyLock;

use regex::Regex;

const WRITE_OPERATIONS: &[&str] = &[
    "drop", "delete", "remove", "update", "replace", "insert", "create", "rename",
];

static METHOD_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.\s*([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("method call pattern")
});

static WRITE_STAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']?\$(out|merge)["']?\s*:"#).expect("stage pattern"));

/// Returns one human-readable warning per distinct risky construct, in the
/// order they appear. Field names (`created_at`) and read calls (`find`,
/// `aggregate`, `count_documents`) are not flagged.
pub fn scan_query(query: &str) -> Vec<String> {
    let mut warnings: Vec<String> = Vec::new();

    for caps in METHOD_CALL.captures_iter(query) {
        let method = &caps[1];
        let lower = method.to_ascii_lowercase();
        if let Some(op) = WRITE_OPERATIONS.iter().find(|op| lower.contains(*op)) {
            let warning = format!("calls `{}` ({} operation)", method, op);
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }
    }

    for caps in WRITE_STAGE.captures_iter(query) {
        let warning = format!(
            "uses the `${}` aggregation stage, which writes to a collection",
            &caps[1]
        );
        if !warnings.contains(&warning) {
            warnings.push(warning);
        }
    }

    warnings
}
