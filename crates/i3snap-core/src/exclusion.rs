//! Which windows are never captured or swallowed.

/// Window classes that belong to the desktop itself rather than to a
/// restorable application.
pub const DEFAULT_EXCLUDED_CLASSES: &[&str] = &["i3bar", "i3status"];

/// Window instances excluded regardless of class.
pub const DEFAULT_EXCLUDED_INSTANCES: &[&str] = &["i3bar"];

/// Exclusion filter shared by capture and projection.
///
/// A window is excluded when its class or instance is on a deny list, or
/// when either field is empty (utility surfaces without WM_CLASS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRules {
    classes: Vec<String>,
    instances: Vec<String>,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            classes: DEFAULT_EXCLUDED_CLASSES.iter().map(|s| s.to_string()).collect(),
            instances: DEFAULT_EXCLUDED_INSTANCES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ExclusionRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the class deny list (e.g. from `--exclude-class`).
    #[must_use]
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for class in classes {
            let class = class.into();
            if !class.is_empty() && !self.classes.contains(&class) {
                self.classes.push(class);
            }
        }
        self
    }

    pub fn excludes(&self, class: &str, instance: &str) -> bool {
        class.is_empty()
            || instance.is_empty()
            || self.classes.iter().any(|c| c == class)
            || self.instances.iter().any(|i| i == instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_exclude_bars() {
        let rules = ExclusionRules::default();
        assert!(rules.excludes("i3bar", "i3bar"));
        assert!(rules.excludes("i3status", "i3status"));
        assert!(rules.excludes("SomeBar", "i3bar"));
    }

    #[test]
    fn empty_class_or_instance_is_excluded() {
        let rules = ExclusionRules::default();
        assert!(rules.excludes("", "xterm"));
        assert!(rules.excludes("XTerm", ""));
        assert!(rules.excludes("", ""));
    }

    #[test]
    fn ordinary_windows_pass() {
        let rules = ExclusionRules::default();
        assert!(!rules.excludes("XTerm", "xterm"));
        assert!(!rules.excludes("firefox", "Navigator"));
    }

    #[test]
    fn extra_classes_extend_defaults() {
        let rules = ExclusionRules::default().with_classes(["Polybar", "", "i3bar"]);
        assert!(rules.excludes("Polybar", "polybar"));
        assert!(rules.excludes("i3bar", "x"));
        assert!(!rules.excludes("XTerm", "xterm"));
        assert_eq!(rules.classes.iter().filter(|c| *c == "i3bar").count(), 1);
    }
}
