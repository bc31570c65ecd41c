use crate::types::Severity;

/// Foreground/background colours of a severity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Palette {
    pub foreground: &'static str,
    pub background: &'static str,
}

impl Palette {
    #[must_use]
    pub fn border(&self) -> String {
        format!("1px solid {}", self.foreground)
    }
}

#[must_use]
pub const fn palette(severity: Severity) -> Palette {
    match severity {
        Severity::Info => Palette {
            foreground: "#31708F",
            background: "#D9EDF7",
        },
        Severity::Success => Palette {
            foreground: "#3C763D",
            background: "#DFF0D8",
        },
        Severity::Warning => Palette {
            foreground: "#8A6D3B",
            background: "#FCF8E3",
        },
        Severity::Error => Palette {
            foreground: "#A94442",
            background: "#F2DEDE",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::palette;
    use crate::types::Severity;

    #[test]
    fn every_severity_has_distinct_colours() {
        let mut seen = Vec::new();
        for severity in Severity::ALL {
            let p = palette(severity);
            assert_ne!(p.foreground, p.background);
            assert!(!seen.contains(&p.foreground));
            seen.push(p.foreground);
        }
    }

    #[test]
    fn border_uses_foreground() {
        assert_eq!(palette(Severity::Error).border(), "1px solid #A94442");
    }
}
