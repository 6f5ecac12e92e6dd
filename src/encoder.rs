//! Replacement-call rendering for accepted call sites.
//!
//! The engine never rewrites source itself; it only produces the literal
//! call text the host splices over the original span.

/// Render the replacement call for an extracted string.
///
/// The localization function keeps its local name from the import site, so
/// the rewritten call still resolves in the host module. The reference
/// number is the per-file prefix plus the occurrence's stable index; an
/// explicit locale rides along as a quoted second argument.
pub fn replacement(fn_name: &str, global_index: i64, locale: Option<&str>) -> String {
    return match locale {
        None => format!("{fn_name}({global_index})"),
        Some(tag) => format!("{fn_name}({global_index}, \"{tag}\")"),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_locale_renders_single_argument_call() {
        assert_eq!(replacement("t", 9_001_001, None), "t(9001001)");
    }

    #[test]
    fn explicit_locale_rides_along_quoted() {
        assert_eq!(
            replacement("tr", 9_001_002, Some("zh_CN")),
            "tr(9001002, \"zh_CN\")"
        );
    }
}
