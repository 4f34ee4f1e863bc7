//! Home-relative path display.
//!
//! Result rows show `~/data/lakes.shp` instead of `/home/me/data/lakes.shp`.
//! The substitution only ever touches a leading home prefix on a component
//! boundary, so `/home/meg` is not shortened for a home of `/home/me` and a
//! `~` in the middle of a file name is left alone when expanding.

use std::path::{Path, PathBuf};

/// The user's home directory, if the platform can tell us.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Replace a leading `home` prefix with `~`. Paths outside `home` come back unchanged.
pub fn canonicalize_home(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}

/// Reverse of [`canonicalize_home`].
pub fn expand_home(display: &str, home: &Path) -> PathBuf {
    if display == "~" {
        home.to_path_buf()
    } else if let Some(rest) = display.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(display)
    }
}

/// Directory part of a display path (`~/data` for `~/data/lakes.shp`).
pub fn display_dir(display: &str) -> &str {
    match display.rfind('/') {
        Some(0) => "/",
        Some(idx) => &display[..idx],
        None => "",
    }
}

/// File name part of a display path.
pub fn display_file(display: &str) -> &str {
    match display.rfind('/') {
        Some(idx) => &display[idx + 1..],
        None => display,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> PathBuf {
        PathBuf::from("/home/ada")
    }

    #[test]
    fn test_canonicalize_under_home() {
        let path = Path::new("/home/ada/data/lakes.shp");
        assert_eq!(canonicalize_home(path, &home()), "~/data/lakes.shp");
    }

    #[test]
    fn test_canonicalize_home_itself() {
        assert_eq!(canonicalize_home(&home(), &home()), "~");
    }

    #[test]
    fn test_canonicalize_outside_home_is_identity() {
        let path = Path::new("/srv/gis/rivers.shp");
        assert_eq!(canonicalize_home(path, &home()), "/srv/gis/rivers.shp");
    }

    #[test]
    fn test_canonicalize_respects_component_boundary() {
        let path = Path::new("/home/adam/roads.shp");
        assert_eq!(canonicalize_home(path, &home()), "/home/adam/roads.shp");
    }

    #[test]
    fn test_round_trip_under_home() {
        for raw in [
            "/home/ada",
            "/home/ada/lakes.shp",
            "/home/ada/deep/nested/dir/dem.tif",
            "/home/ada/with space/x~y.shp",
        ] {
            let path = PathBuf::from(raw);
            let display = canonicalize_home(&path, &home());
            assert_eq!(expand_home(&display, &home()), path, "round trip of {raw}");
        }
    }

    #[test]
    fn test_expand_leaves_inner_tilde() {
        assert_eq!(
            expand_home("/srv/backup~1/a.shp", &home()),
            PathBuf::from("/srv/backup~1/a.shp")
        );
    }

    #[test]
    fn test_display_parts() {
        assert_eq!(display_dir("~/data/lakes.shp"), "~/data");
        assert_eq!(display_file("~/data/lakes.shp"), "lakes.shp");
        assert_eq!(display_dir("/lakes.shp"), "/");
        assert_eq!(display_dir("lakes.shp"), "");
        assert_eq!(display_file("lakes.shp"), "lakes.shp");
    }
}
