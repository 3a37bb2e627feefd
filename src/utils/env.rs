/// Get environment variable with ORGAUTH_ prefix, falling back to unprefixed version
///
/// Checks `ORGAUTH_{key}` first, then `{key}`, so deployments can keep the
/// plain `PORT` / `DSN` / `JWT_SECRET` names. Empty values count as unset.
///
/// # Examples
///
/// ```rust
/// use orgauth::utils::get_env_with_prefix;
///
/// // Checks ORGAUTH_PORT first, then PORT
/// let port = get_env_with_prefix("PORT");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    let lookup = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
    lookup(&format!("ORGAUTH_{}", key)).or_else(|| lookup(key))
}
