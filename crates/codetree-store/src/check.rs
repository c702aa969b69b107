//! Read-only integrity scan of a persisted forest.
//!
//! With depth enforcement on, batch upsert keeps a healthy forest healthy.
//! The document can still be edited by hand or written with enforcement off. The checker reports
//! every structural problem it finds instead of stopping at the first one.

use std::collections::{BTreeSet, HashMap, HashSet};

use codetree_types::CodeCollection;
use serde::Serialize;

/// Result of a forest integrity scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub node_count: usize,
    pub root_count: usize,
    pub violations: Vec<Violation>,
}

impl IntegrityReport {
    /// Returns `true` if no violations were found.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A single structural problem attached to one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub code: String,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    DuplicateCode,
    DanglingParent,
    SelfParent,
    DepthMismatch,
    ParentCycle,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// Forest integrity checker.
pub struct ForestChecker;

impl ForestChecker {
    /// Scan `collection` for duplicate codes, dangling or self parents,
    /// depth mismatches, and parent cycles.
    pub fn check(collection: &CodeCollection) -> IntegrityReport {
        let mut violations = Vec::new();

        let mut depth_of: HashMap<&str, u32> = HashMap::new();
        let mut parent_of: HashMap<&str, Option<&str>> = HashMap::new();
        let mut duplicates = HashSet::new();
        for node in &collection.codes {
            if depth_of.insert(&node.code, node.depth).is_some() && duplicates.insert(&node.code) {
                violations.push(Violation {
                    code: node.code.clone(),
                    kind: ViolationKind::DuplicateCode,
                    description: "code appears more than once".into(),
                });
            }
            parent_of.entry(&node.code).or_insert(node.parent_code.as_deref());
        }

        for node in &collection.codes {
            match node.parent_code.as_deref() {
                None if node.depth != 1 => violations.push(Violation {
                    code: node.code.clone(),
                    kind: ViolationKind::DepthMismatch,
                    description: format!("root has depth {}, expected 1", node.depth),
                }),
                None => {}
                Some(parent) if parent == node.code => violations.push(Violation {
                    code: node.code.clone(),
                    kind: ViolationKind::SelfParent,
                    description: "node names itself as parent".into(),
                }),
                Some(parent) => match depth_of.get(parent) {
                    None => violations.push(Violation {
                        code: node.code.clone(),
                        kind: ViolationKind::DanglingParent,
                        description: format!("parent {parent} does not exist"),
                    }),
                    Some(&parent_depth) if node.depth != parent_depth + 1 => {
                        violations.push(Violation {
                            code: node.code.clone(),
                            kind: ViolationKind::DepthMismatch,
                            description: format!(
                                "depth {} under parent {parent} at depth {parent_depth}, expected {}",
                                node.depth,
                                parent_depth + 1
                            ),
                        })
                    }
                    Some(_) => {}
                },
            }
        }

        for code in cycle_members(&parent_of) {
            violations.push(Violation {
                code: code.to_string(),
                kind: ViolationKind::ParentCycle,
                description: "parent chain loops back to this node".into(),
            });
        }

        IntegrityReport {
            node_count: collection.len(),
            root_count: collection.codes.iter().filter(|n| n.is_root()).count(),
            violations,
        }
    }
}

/// Codes whose parent chain returns to themselves. Self edges are reported
/// separately and ignored here.
fn cycle_members<'a>(parent_of: &HashMap<&'a str, Option<&'a str>>) -> BTreeSet<&'a str> {
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut members = BTreeSet::new();

    let mut starts: Vec<&str> = parent_of.keys().copied().collect();
    starts.sort_unstable();

    for start in starts {
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(code) = current {
            match marks.get(code) {
                Some(Mark::Done) => break,
                Some(Mark::OnPath) => {
                    if let Some(pos) = path.iter().position(|p| *p == code) {
                        members.extend(path[pos..].iter().copied());
                    }
                    break;
                }
                None => {
                    marks.insert(code, Mark::OnPath);
                    path.push(code);
                    current = parent_of
                        .get(code)
                        .copied()
                        .flatten()
                        .filter(|parent| *parent != code && parent_of.contains_key(parent));
                }
            }
        }
        for code in path {
            marks.insert(code, Mark::Done);
        }
    }

    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use codetree_types::CodeNode;

    fn node(code: &str, parent: Option<&str>, depth: u32) -> CodeNode {
        CodeNode {
            code: code.into(),
            name: code.into(),
            parent_code: parent.map(str::to_string),
            depth,
            sort_order: 1,
            use_yn: true,
            remark: None,
            updated_at: None,
        }
    }

    fn kinds(report: &IntegrityReport) -> Vec<(String, ViolationKind)> {
        report
            .violations
            .iter()
            .map(|v| (v.code.clone(), v.kind))
            .collect()
    }

    #[test]
    fn healthy_forest_is_valid() {
        let collection = CodeCollection::new(vec![
            node("R", None, 1),
            node("C", Some("R"), 2),
            node("G", Some("C"), 3),
            node("S", None, 1),
        ]);
        let report = ForestChecker::check(&collection);
        assert!(report.is_valid(), "{report:?}");
        assert_eq!(report.node_count, 4);
        assert_eq!(report.root_count, 2);
    }

    #[test]
    fn empty_forest_is_valid() {
        assert!(ForestChecker::check(&CodeCollection::default()).is_valid());
    }

    #[test]
    fn reports_dangling_and_self_parents() {
        let collection = CodeCollection::new(vec![
            node("X", Some("NOPE"), 2),
            node("S", Some("S"), 2),
        ]);
        let report = ForestChecker::check(&collection);
        assert_eq!(
            kinds(&report),
            vec![
                ("X".to_string(), ViolationKind::DanglingParent),
                ("S".to_string(), ViolationKind::SelfParent),
            ]
        );
    }

    #[test]
    fn reports_depth_mismatches() {
        let collection = CodeCollection::new(vec![
            node("R", None, 2),
            node("C", Some("R"), 2),
        ]);
        let report = ForestChecker::check(&collection);
        assert_eq!(
            kinds(&report),
            vec![
                ("R".to_string(), ViolationKind::DepthMismatch),
                ("C".to_string(), ViolationKind::DepthMismatch),
            ]
        );
    }

    #[test]
    fn reports_duplicates_once() {
        let collection = CodeCollection::new(vec![
            node("A", None, 1),
            node("A", None, 1),
            node("A", None, 1),
        ]);
        let report = ForestChecker::check(&collection);
        assert_eq!(kinds(&report), vec![("A".to_string(), ViolationKind::DuplicateCode)]);
    }

    #[test]
    fn reports_every_cycle_member() {
        let collection = CodeCollection::new(vec![
            node("A", Some("B"), 1),
            node("B", Some("C"), 1),
            node("C", Some("A"), 1),
            node("TAIL", Some("A"), 1),
        ]);
        let report = ForestChecker::check(&collection);
        let cyclic: Vec<_> = report
            .violations
            .iter()
            .filter(|v| v.kind == ViolationKind::ParentCycle)
            .map(|v| v.code.as_str())
            .collect();
        assert_eq!(cyclic, vec!["A", "B", "C"]);
    }

    #[test]
    fn report_serializes_kinds_in_kebab_case() {
        let collection = CodeCollection::new(vec![node("X", Some("NOPE"), 2)]);
        let json = serde_json::to_value(ForestChecker::check(&collection)).unwrap();
        assert_eq!(json["nodeCount"], 1);
        assert_eq!(json["violations"][0]["kind"], "dangling-parent");
    }
}
