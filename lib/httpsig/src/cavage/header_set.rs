/// Ordered mapping of lowercase header names to trimmed values
///
/// Built once per operation from free-text `Name: value` lines and treated
/// as immutable afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a header set from free-text `Name: value` lines
    ///
    /// Deliberately lenient: lines too short to hold a `name:value` pair and
    /// lines without a colon are skipped, not rejected, so stray blank or
    /// malformed lines in pasted input don't abort the operation.
    #[must_use]
    pub fn extract(text: &str) -> Self {
        let mut set = Self::new();

        for line in text.lines() {
            if line.trim().len() <= 3 {
                continue;
            }

            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            if name.trim().is_empty() || value.is_empty() {
                continue;
            }

            set.insert(name, value);
        }

        set
    }

    /// Insert a header, replacing the value in place if the name is present
    pub fn insert(&mut self, name: &str, value: &str) {
        let name = name.trim().to_lowercase();
        let value = value.trim().to_owned();

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| *existing == name)
        {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Case-insensitive lookup
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Header names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::HeaderSet;

    #[test]
    fn extract_header_lines() {
        let set = HeaderSet::extract(
            "Host: example.com\r\nDate: Sun, 05 Jan 2014 21:31:40 GMT\n\nx:y\nnot a header line\nContent-Type: application/json",
        );

        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            [
                ("host", "example.com"),
                ("date", "Sun, 05 Jan 2014 21:31:40 GMT"),
                ("content-type", "application/json"),
            ]
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let set = HeaderSet::extract("Host: example.com");

        assert_eq!(set.get("HOST"), Some("example.com"));
        assert_eq!(set.get("host"), Some("example.com"));
        assert_eq!(set.get("date"), None);
    }

    #[test]
    fn reinserting_a_name_replaces_in_place() {
        let mut set = HeaderSet::extract("Host: one\nDate: D");
        set.insert("HOST", "two");

        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            [("host", "two"), ("date", "D")]
        );
    }

    #[test]
    fn short_and_malformed_lines_are_skipped() {
        let set = HeaderSet::extract("x:y\nab\n: nameless\nno colon here at all");
        assert!(set.is_empty());
    }
}
