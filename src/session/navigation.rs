//! Page location and redirects.

/// File name of the login entry point.
pub const LOGIN_PAGE: &str = "login.html";

/// The browser's location bar, as seen by the session layer.
pub trait Navigator: Send + Sync {
    /// Path of the page currently rendered, e.g. `/3 Teacher-View/dashboard.html`.
    fn current_path(&self) -> String;

    /// Leave the current page for `target`, a path relative to it.
    fn redirect(&self, target: &str);
}

pub fn is_login_page(path: &str) -> bool {
    path.contains(LOGIN_PAGE)
}

/// Relative path from `current_path` to the login entry point.
///
/// Role pages live one directory below the application root, so a page
/// nested in a directory (or inside any `*-View` / `*_View` folder) must go
/// up one level.
pub fn login_path_for(current_path: &str) -> String {
    let segments: Vec<&str> = current_path
        .split('/')
        // drive letters in file:// paths on Windows
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .collect();

    let nested_page = segments.len() > 1
        && segments
            .last()
            .is_some_and(|last| last.ends_with(".html"));
    let in_view_folder = current_path.contains("_View") || current_path.contains("-View");

    if nested_page || in_view_folder {
        format!("../{LOGIN_PAGE}")
    } else {
        LOGIN_PAGE.to_owned()
    }
}
