//! Artifact naming derived from the original archive.
//!
//! The app name seeds every generated artifact name: the unsigned working
//! copy is `{name}-unsigned.apk` and the signed output `{name}-signed.apk`.

use camino::Utf8Path;

/// Extension marker stripped from the original file name.
pub const ARCHIVE_EXTENSION: &str = ".apk";

/// Name used when nothing usable can be derived from the original file.
pub const FALLBACK_APP_NAME: &str = "app-mod";

/// Suffix of the unsigned working copy.
pub const UNSIGNED_SUFFIX: &str = "-unsigned.apk";

/// Suffix of the signed output.
pub const SIGNED_SUFFIX: &str = "-signed.apk";

/// Resolve the app name for a run.
///
/// A non-empty `override_name` always wins. Otherwise the original file's
/// base name is used with everything from the last `.apk` onwards removed.
/// A name without the marker, or one that is empty once stripped, resolves to
/// [`FALLBACK_APP_NAME`].
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use rebuilder::app_name::resolve_app_name;
///
/// assert_eq!(resolve_app_name(Utf8Path::new("in/app.apk"), None), "app");
/// assert_eq!(resolve_app_name(Utf8Path::new("in/app.apk"), Some("mod")), "mod");
/// assert_eq!(resolve_app_name(Utf8Path::new(".apk"), None), "app-mod");
/// ```
#[must_use]
pub fn resolve_app_name(original: &Utf8Path, override_name: Option<&str>) -> String {
    if let Some(name) = override_name.filter(|name| !name.is_empty()) {
        return name.to_owned();
    }

    let file_name = original.file_name().unwrap_or_default();
    let derived = file_name
        .rfind(ARCHIVE_EXTENSION)
        .and_then(|idx| file_name.get(..idx))
        .unwrap_or_default();

    if derived.is_empty() {
        FALLBACK_APP_NAME.to_owned()
    } else {
        derived.to_owned()
    }
}

/// File name of the unsigned working copy for `app_name`.
#[must_use]
pub fn unsigned_file_name(app_name: &str) -> String {
    format!("{app_name}{UNSIGNED_SUFFIX}")
}

/// File name of the signed output for `app_name`.
#[must_use]
pub fn signed_file_name(app_name: &str) -> String {
    format!("{app_name}{SIGNED_SUFFIX}")
}
