//! Naming rules for the `downloads/<OS-name>/<file>` tree.

use url::Url;

const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace characters that are not portable in directory names with `_`.
///
/// ```
/// use firmfetch_common::paths::safe_dir_name;
///
/// assert_eq!(safe_dir_name("SUSE Linux ES 15"), "SUSE Linux ES 15");
/// assert_eq!(safe_dir_name(r#"x<y>z"q|w?*"#), "x_y_z_q_w__");
/// ```
pub fn safe_dir_name(name: &str) -> String {
    name.chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect()
}

/// Derive the local file name for a discovered package URL.
///
/// Uses the last path segment. When that is empty or has no extension the
/// name falls back to `driver_<index>.<fallback_ext>`.
///
/// ```
/// use firmfetch_common::paths::file_name_from_url;
///
/// let name = file_name_from_url("https://dl.example.com/FOLDER1/BIOS_ABC.BIN?x=1", 0, "bin");
/// assert_eq!(name, "BIOS_ABC.BIN");
/// assert_eq!(file_name_from_url("https://dl.example.com/get", 7, "bin"), "driver_7.bin");
/// ```
pub fn file_name_from_url(raw: &str, index: usize, fallback_ext: &str) -> String {
    let segment = Url::parse(raw)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segs| segs.next_back().map(str::to_string))
        })
        .unwrap_or_else(|| {
            // Not an absolute URL: strip query/fragment and take what follows the last '/'.
            let path = raw.split(['?', '#']).next().unwrap_or("");
            path.rsplit('/').next().unwrap_or("").to_string()
        });

    if segment.is_empty() || !segment.contains('.') {
        format!("driver_{index}.{fallback_ext}")
    } else {
        segment
    }
}

/// True for pseudo-links that only run script in the page.
pub fn is_script_url(raw: &str) -> bool {
    let lower = raw.trim_start().to_ascii_lowercase();
    lower.starts_with("javascript:") || lower.contains("onclick")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitises_every_reserved_character() {
        assert_eq!(safe_dir_name(r#"<>:"/\|?*"#), "_________");
    }

    #[test]
    fn keeps_unicode_names() {
        assert_eq!(safe_dir_name("해당 없음"), "해당 없음");
    }

    #[test]
    fn file_name_ignores_query_and_fragment() {
        assert_eq!(
            file_name_from_url("https://x.test/a/b/Network_Firmware_1.BIN#frag", 3, "bin"),
            "Network_Firmware_1.BIN"
        );
    }

    #[test]
    fn trailing_slash_falls_back() {
        assert_eq!(file_name_from_url("https://x.test/a/b/", 2, "bin"), "driver_2.bin");
    }

    #[test]
    fn relative_paths_are_supported() {
        assert_eq!(file_name_from_url("/files/fw.bin?dl=1", 0, "bin"), "fw.bin");
        assert_eq!(file_name_from_url("", 4, "exe"), "driver_4.exe");
    }

    #[test]
    fn detects_script_urls() {
        assert!(is_script_url("javascript:void(0)"));
        assert!(is_script_url("  JavaScript:download('x.bin')"));
        assert!(!is_script_url("https://x.test/fw.bin"));
    }
}
