use fantoccini::Locator;
use firmfetch_config::{ProbeKind, ProbeSpec};
use std::fmt;

/// One way of locating an element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Id(String),
    Css(String),
    XPath(String),
}

impl Probe {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Borrow as a `fantoccini` locator.
    pub fn locator(&self) -> Locator<'_> {
        match self {
            Probe::Id(v) => Locator::Id(v),
            Probe::Css(v) => Locator::Css(v),
            Probe::XPath(v) => Locator::XPath(v),
        }
    }

    /// The raw selector text.
    pub fn value(&self) -> &str {
        match self {
            Probe::Id(v) | Probe::Css(v) | Probe::XPath(v) => v,
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::Id(v) => write!(f, "id = '{v}'"),
            Probe::Css(v) => write!(f, "css = '{v}'"),
            Probe::XPath(v) => write!(f, "xpath = '{v}'"),
        }
    }
}

impl From<&ProbeSpec> for Probe {
    fn from(spec: &ProbeSpec) -> Self {
        match spec.by {
            ProbeKind::Id => Probe::Id(spec.value.clone()),
            ProbeKind::Css => Probe::Css(spec.value.clone()),
            ProbeKind::Xpath => Probe::XPath(spec.value.clone()),
        }
    }
}

/// Expand `{code}` in each CSS template into a probe chain for one OS code.
///
/// ```
/// use firmfetch_drivers::browser::probe::{option_chain, Probe};
///
/// let chain = option_chain(&["button[data-value='{code}']".to_string()], "US008");
/// assert_eq!(chain, vec![Probe::css("button[data-value='US008']")]);
/// ```
pub fn option_chain(templates: &[String], code: &str) -> Vec<Probe> {
    templates
        .iter()
        .map(|t| Probe::Css(t.replace("{code}", code)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_config_specs() {
        let spec = ProbeSpec {
            by: ProbeKind::Xpath,
            value: "//input".into(),
        };
        assert_eq!(Probe::from(&spec), Probe::xpath("//input"));
        assert_eq!(Probe::from(&spec).value(), "//input");
    }

    #[test]
    fn display_names_the_strategy() {
        assert_eq!(Probe::id("inpEntry").to_string(), "id = 'inpEntry'");
        assert_eq!(Probe::css("a").to_string(), "css = 'a'");
    }

    #[test]
    fn option_chain_keeps_template_order() {
        let templates = vec![
            "button[data-value='{code}']".to_string(),
            "*[data-value='{code}']".to_string(),
        ];
        let chain = option_chain(&templates, "RHEL9");
        assert_eq!(
            chain,
            vec![
                Probe::css("button[data-value='RHEL9']"),
                Probe::css("*[data-value='RHEL9']"),
            ]
        );
    }
}
