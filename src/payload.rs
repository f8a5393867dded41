//! In-flight parse state.

use crate::issue::{PathSegment, RawIssue};
use crate::value::Value;

/// The value being parsed, the issues raised so far and the absolute path
/// of the value from the root.
///
/// Issues inside a payload carry paths relative to the payload; [`absorb`]
/// prefixes them when a child payload is folded back into its parent.
///
/// [`absorb`]: Payload::absorb
#[derive(Debug)]
pub(crate) struct Payload {
    pub value: Value,
    pub issues: Vec<RawIssue>,
    pub path: Vec<PathSegment>,
}

impl Payload {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            issues: Vec::new(),
            path: Vec::new(),
        }
    }

    /// A payload for the value at `segment` beneath this one.
    pub fn child(&self, segment: PathSegment, value: Value) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        Self {
            value,
            issues: Vec::new(),
            path,
        }
    }

    /// A payload at the same position with no issues, for trial parses.
    pub fn fork(&self, value: Value) -> Self {
        Self {
            value,
            issues: Vec::new(),
            path: self.path.clone(),
        }
    }

    /// Fold a child's issues into this payload and return the child's value.
    pub fn absorb(&mut self, child: Payload) -> Value {
        let Payload {
            value,
            mut issues,
            path,
        } = child;
        if path.len() > self.path.len() {
            let segment = &path[self.path.len()];
            for issue in &mut issues {
                issue.prefix(segment);
            }
        }
        self.issues.append(&mut issues);
        value
    }

    pub fn push(&mut self, issue: RawIssue) {
        self.issues.push(issue);
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_prefixes_child_segment() {
        let mut root = Payload::new(Value::Null);
        let mut child = root.child(PathSegment::from("a"), Value::from(1));
        let mut grandchild = child.child(PathSegment::from(2), Value::from(2));
        grandchild.push(RawIssue::custom("bad").with_path(vec!["b".into()]));
        child.absorb(grandchild);
        root.absorb(child);

        assert_eq!(root.issues.len(), 1);
        assert_eq!(
            root.issues[0].path,
            vec![
                PathSegment::from("a"),
                PathSegment::from(2),
                PathSegment::from("b"),
            ]
        );
    }

    #[test]
    fn fork_keeps_path_and_starts_clean() {
        let mut root = Payload::new(Value::Null);
        root.push(RawIssue::custom("existing"));
        let child = root.child(PathSegment::from("x"), Value::Null);
        let fork = child.fork(Value::from(true));
        assert_eq!(fork.path, vec![PathSegment::from("x")]);
        assert!(fork.issues.is_empty());
    }
}
