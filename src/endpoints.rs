//! The API endpoints URIs.
//!
//! Endpoints that take a parameter, e.g., '/api/users/{user_id}', are filled in by
//! `format_endpoint` in tests.

/// The route to create a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to mark a transaction completed or cancelled.
pub const TRANSACTION_STATUS: &str = "/api/transactions/{transaction_id}/status";
/// The route for a user's status.
pub const USER: &str = "/api/users/{user_id}";
/// The route for a user's transaction history.
pub const USER_TRANSACTIONS: &str = "/api/users/{user_id}/transactions";
/// The route to ask the scammer gate about a user.
pub const USER_GATE: &str = "/api/users/{user_id}/gate";
/// The route to flag or clear a user as a scammer.
pub const USER_SCAMMER: &str = "/api/users/{user_id}/scammer";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
