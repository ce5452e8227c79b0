//! Navigation history. Pages read and write the query string through `Navigator`
//! so the persistence target can be swapped in tests.

pub trait Navigator {
    /// Current query string, without the leading `?`.
    fn search(&self) -> String;
    /// Overwrite the current entry. Pages never add entries of their own.
    fn replace(&mut self, search: &str);
}

/// In-memory history stack. The last entry is the current location.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    path: String,
    entries: Vec<String>,
}

impl MemoryHistory {
    pub fn new(path: &str, search: &str) -> Self {
        Self {
            path: path.to_string(),
            entries: vec![search.strip_prefix('?').unwrap_or(search).to_string()],
        }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Full location, e.g. `/?date=2024-05-01&tab=0`.
    pub fn href(&self) -> String {
        let search = self.search();
        if search.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, search)
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/", "")
    }
}

impl Navigator for MemoryHistory {
    fn search(&self) -> String {
        self.entries.last().cloned().unwrap_or_default()
    }

    fn replace(&mut self, search: &str) {
        let s = search.strip_prefix('?').unwrap_or(search).to_string();
        match self.entries.last_mut() {
            Some(cur) => *cur = s,
            None => self.entries.push(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_keeps_depth() {
        let mut h = MemoryHistory::new("/", "?tab=1");
        assert_eq!(h.search(), "tab=1");
        h.replace("date=2024-05-01&tab=1");
        h.replace("?date=2024-05-02&tab=1");
        assert_eq!(h.entries().len(), 1);
        assert_eq!(h.href(), "/?date=2024-05-02&tab=1");
    }

    #[test]
    fn empty_search_has_bare_path() {
        assert_eq!(MemoryHistory::default().href(), "/");
    }
}
