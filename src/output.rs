use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `PCHSCOPE_QUIET=1` suppresses progress bars and decorative output
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("PCHSCOPE_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
