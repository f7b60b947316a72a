/// The `EntryValidator` trait checks group names, keys and values against
/// what the line format can actually hold.
///
/// There is no escaping in the format, so text that would break a line apart
/// or could never be matched again is refused up front instead of written.
pub trait EntryValidator {
    /// Checks a section name before it is written as a `[group]` header.
    ///
    /// # Arguments
    /// * `group`: The section name, without brackets.
    ///
    /// # Returns
    /// A `Vec<String>` with one message per problem. Empty when the name can
    /// be written and found again.
    fn validate_group(&self, group: &str) -> Vec<String>;

    /// Checks a key before it is written at the start of a `key=value` line.
    ///
    /// # Arguments
    /// * `key`: The key name.
    ///
    /// # Returns
    /// A `Vec<String>` with one message per problem.
    fn validate_key(&self, key: &str) -> Vec<String>;

    /// Checks a value before it is written after the `=`.
    ///
    /// # Arguments
    /// * `value`: The value text.
    ///
    /// # Returns
    /// A `Vec<String>` with one message per problem.
    fn validate_value(&self, value: &str) -> Vec<String>;

    /// Every issue for a full `[group] key=value` entry, in that order.
    fn validate_entry(&self, group: &str, key: &str, value: &str) -> Vec<String> {
        let mut issues = self.validate_group(group);
        issues.extend(self.validate_key(key));
        issues.extend(self.validate_value(value));
        issues
    }
}

/// The `StandardValidator` is the validator used by `Session` and the CLI.
pub struct StandardValidator;

impl StandardValidator {
    pub fn new() -> Self {
        Self
    }

    /// Reports a line break embedded in `text`.
    fn check_line_breaks(&self, what: &str, text: &str) -> Option<String> {
        if text.contains(['\n', '\r']) {
            Some(format!("{what} must not contain line breaks"))
        } else {
            None
        }
    }
}

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryValidator for StandardValidator {
    fn validate_group(&self, group: &str) -> Vec<String> {
        let mut issues = Vec::new();

        if group.is_empty() {
            issues.push("Group name must not be empty".to_string());
        }
        issues.extend(self.check_line_breaks("Group name", group));

        issues
    }

    /// Keys are only ever recognised on lines whose first byte is an ASCII
    /// letter or digit, so anything else could be written but never read back.
    fn validate_key(&self, key: &str) -> Vec<String> {
        let mut issues = Vec::new();

        match key.bytes().next() {
            None => issues.push("Key must not be empty".to_string()),
            Some(first) if !first.is_ascii_alphanumeric() => issues.push(format!(
                "Key '{key}' must start with an ASCII letter or digit"
            )),
            Some(_) => {}
        }
        if key.contains('=') {
            issues.push(format!("Key '{key}' must not contain '='"));
        }
        issues.extend(self.check_line_breaks("Key", key));

        issues
    }

    fn validate_value(&self, value: &str) -> Vec<String> {
        self.check_line_breaks("Value", value).into_iter().collect()
    }
}
