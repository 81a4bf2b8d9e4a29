use crate::diagnostic::Severity;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles by role in pchscope output
#[derive(Debug, Clone)]
pub struct Theme {
    pub heading: Style,
    pub ok: Style,
    pub error: Style,
    pub warning: Style,
    pub accent: Style,
    pub label: Style,
    /// Files left untouched by `emit`
    pub unchanged: Style,
    pub scope: Style,
    pub include: Style,
}

impl Theme {
    /// Colored on a terminal unless `NO_COLOR` is set
    pub fn detect() -> Self {
        let color = console::Term::stdout().is_term() && std::env::var_os("NO_COLOR").is_none();
        Self::new(color)
    }

    pub fn new(color: bool) -> Self {
        let paint = |style: Style| if color { style } else { Style::new() };
        Self {
            heading: paint(Style::new().cyan().bold()),
            ok: paint(Style::new().green().bold()),
            error: paint(Style::new().red().bold()),
            warning: paint(Style::new().yellow().bold()),
            accent: paint(Style::new().magenta()),
            label: paint(Style::new().white().dimmed()),
            unchanged: paint(Style::new().bright_black()),
            scope: paint(Style::new().blue().bold()),
            include: paint(Style::new().green()),
        }
    }

    pub fn severity(&self, severity: Severity) -> Style {
        match severity {
            Severity::Error => self.error.clone(),
            Severity::Warning => self.warning.clone(),
        }
    }

    /// Summary style for a run with `failed` failures
    pub fn outcome(&self, failed: usize) -> Style {
        if failed == 0 {
            self.ok.clone()
        } else {
            self.error.clone()
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    #[test]
    fn test_plain_theme_adds_no_escapes() {
        let plain = Theme::new(false);
        assert_eq!(format!("{}", "src/mongo".style(plain.scope.clone())), "src/mongo");
        assert_eq!(format!("{}", "x".style(plain.severity(Severity::Error))), "x");
    }

    #[test]
    fn test_colored_theme_styles_by_role() {
        let colored = Theme::new(true);
        assert_ne!(format!("{}", "src/mongo".style(colored.scope.clone())), "src/mongo");
        assert_eq!(
            format!("{}", "x".style(colored.outcome(0))),
            format!("{}", "x".style(colored.ok.clone()))
        );
    }
}
