use std::collections::HashMap;
use std::fmt;

/// Trims, collapses repeated slashes, forces a single leading slash and drops
/// the trailing one. Case is preserved.
pub fn clean_path(raw: &str) -> String {
    let segments: Vec<&str> = raw.trim().split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_owned();
    }
    let mut out = String::with_capacity(raw.len() + 1);
    for s in segments {
        out.push('/');
        out.push_str(s);
    }
    out
}

/// Canonical form used for router paths and websocket namespaces.
pub fn normalize_path(raw: &str) -> String {
    clean_path(&raw.to_lowercase())
}

/// Joins path fragments, ignoring empty and root fragments.
pub fn join_paths(parts: &[&str]) -> String {
    clean_path(&parts.join("/"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Route pattern with `:name` parameter segments; literals are stored lower-cased
/// and compared against the lower-cased request segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(path: &str) -> Self {
        let cleaned = clean_path(path);
        let segments = cleaned
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_owned()),
                _ => Segment::Literal(s.to_lowercase()),
            })
            .collect();
        Self { segments }
    }

    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let cleaned = clean_path(path.split('?').next().unwrap_or_default());
        let parts: Vec<&str> = cleaned.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (seg, part) in self.segments.iter().zip(parts) {
            match seg {
                Segment::Literal(lit) if *lit == part.to_lowercase() => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_owned());
                }
            }
        }
        Some(params)
    }

    pub fn has_params(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for s in &self.segments {
            match s {
                Segment::Literal(l) => write!(f, "/{l}")?,
                Segment::Param(p) => write!(f, "/:{p}")?,
            }
        }
        Ok(())
    }
}
