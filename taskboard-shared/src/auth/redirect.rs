/// Post-authentication navigation
///
/// After the authentication widget reports back, the client is sent
/// somewhere based on where it was, any `redirect` query value, and whether
/// a user came back.

/// Paths that belong to the authentication flow
pub const AUTH_PAGES: [&str; 6] = [
    "/login",
    "/signup",
    "/callback",
    "/error",
    "/prompt-password",
    "/reset-password",
];

/// Fallback landing page for authenticated users
pub const HOME_PATH: &str = "/";

/// Landing page for anonymous users
pub const LOGIN_PATH: &str = "/login";

/// True if `path` (with or without query) is part of the auth flow
pub fn is_auth_page(path: &str) -> bool {
    AUTH_PAGES.iter().any(|page| path.contains(page))
}

/// True for same-origin paths: a single leading `/`, not `//` or `/\`
pub fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/') && !matches!(chars.next(), Some('/') | Some('\\'))
}

/// Where to send the client after the widget callback
///
/// With a user: `redirect` if given, else the current path unless it is an
/// auth page, else `/`. Without a user: the current path if it is an auth
/// page, else `/login`. Only local paths are ever returned; a `redirect`
/// pointing elsewhere lands on `/`.
pub fn post_auth_destination(current_path: &str, redirect: Option<&str>, user_present: bool) -> String {
    let redirect = redirect.filter(|r| !r.is_empty());
    let on_auth_page = is_auth_page(current_path);
    let local_current = is_local_path(current_path);

    let destination = match (user_present, redirect) {
        (true, Some(target)) if is_local_path(target) => target,
        (true, Some(target)) => {
            tracing::warn!(redirect = target, "Ignoring non-local redirect");
            HOME_PATH
        }
        (true, None) if !on_auth_page && local_current => current_path,
        (true, None) => HOME_PATH,
        (false, _) if on_auth_page && local_current => current_path,
        (false, _) => LOGIN_PATH,
    };

    destination.to_string()
}
