//! Relationship and business-rule inference across all columns of a dataset.
//!
//! Both passes produce flat candidate-string lists computed once over the
//! whole column set. A descriptor picks up every candidate whose text
//! mentions its field name (case-insensitive substring match).

/// Column-level facts the inference passes need.
#[derive(Debug, Clone)]
pub struct ColumnFacts<'a> {
    pub name: &'a str,
    /// Non-empty samples in this column.
    pub non_empty: usize,
    /// Distinct non-empty samples.
    pub distinct: usize,
    /// `(min, max)` when every non-empty sample parses as a number.
    pub numeric_bounds: Option<(f64, f64)>,
}

const HIERARCHY_PARENT_MARKERS: &[&str] = &["category", "type", "class"];
const DEPENDENCY_MARKERS: &[&str] = &["status", "state", "phase"];

/// Infer foreign-key, hierarchical and dependency links between columns.
pub fn infer_relationships(names: &[&str]) -> Vec<String> {
    let mut relationships = Vec::new();

    // Foreign keys: `owner_id` links to every other column containing `owner`.
    for &name in names {
        let Some(stem) = id_stem(name) else {
            continue;
        };
        let stem_lower = stem.to_lowercase();
        for &other in names {
            if other == name {
                continue;
            }
            if other.to_lowercase().contains(&stem_lower) {
                relationships.push(format!("{name} references {other} (foreign_key)"));
            }
        }
    }

    // Hierarchies: `category` contains `subcategory`.
    let children: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| n.to_lowercase().starts_with("sub"))
        .collect();
    for &parent in names {
        let lower = parent.to_lowercase();
        if lower.starts_with("sub") || !HIERARCHY_PARENT_MARKERS.iter().any(|m| lower.contains(m)) {
            continue;
        }
        for &child in &children {
            relationships.push(format!("{parent} contains {child} (hierarchical)"));
        }
    }

    // Dependencies: a status-like column gates every other column.
    for &driver in names {
        let lower = driver.to_lowercase();
        if !DEPENDENCY_MARKERS.iter().any(|m| lower.contains(m)) {
            continue;
        }
        for &other in names {
            if other != driver {
                relationships.push(format!("{driver} determines {other} (dependency)"));
            }
        }
    }

    relationships
}

/// Infer required, unique and numeric range rules.
pub fn infer_business_rules(columns: &[ColumnFacts<'_>], total_records: usize) -> Vec<String> {
    let mut rules = Vec::new();
    if total_records == 0 {
        return rules;
    }

    for column in columns {
        if column.non_empty == total_records {
            rules.push(format!("{} is required", column.name));
        }
        if column.non_empty >= 2 && column.distinct == column.non_empty {
            rules.push(format!("{} values are unique", column.name));
        }
        if let Some((min, max)) = column.numeric_bounds {
            if min >= 0.0 && max <= 100.0 {
                rules.push(format!("{} is within 0-100", column.name));
            } else if min >= 0.0 {
                rules.push(format!("{} is non-negative", column.name));
            }
        }
    }

    rules
}

/// Candidates that mention `field` anywhere in their text.
pub fn attach(field: &str, candidates: &[String]) -> Vec<String> {
    let needle = field.to_lowercase();
    candidates
        .iter()
        .filter(|c| c.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Stem of an id-suffixed column: `owner_id`, `owner-id` and `ownerId` all
/// yield `owner`. A bare `id` has no stem.
fn id_stem(name: &str) -> Option<&str> {
    let stem = if let Some(stem) = name
        .strip_suffix("_id")
        .or_else(|| name.strip_suffix("_ID"))
        .or_else(|| name.strip_suffix("-id"))
    {
        stem
    } else if let Some(stem) = name.strip_suffix("Id") {
        // camelCase only: the stem must not end in an uppercase run like `UUId`
        if stem.chars().last().is_some_and(|c| c.is_lowercase()) {
            stem
        } else {
            return None;
        }
    } else {
        return None;
    };
    (stem.chars().count() >= 2).then_some(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_stem() {
        assert_eq!(id_stem("owner_id"), Some("owner"));
        assert_eq!(id_stem("ownerId"), Some("owner"));
        assert_eq!(id_stem("owner-id"), Some("owner"));
        assert_eq!(id_stem("id"), None);
        assert_eq!(id_stem("paid"), None);
        assert_eq!(id_stem("x_id"), None);
    }

    #[test]
    fn test_foreign_key_links() {
        let rels = infer_relationships(&["owner_id", "owner_name", "breed"]);
        assert_eq!(
            rels,
            vec!["owner_id references owner_name (foreign_key)".to_string()]
        );
    }

    #[test]
    fn test_hierarchical_links() {
        let rels = infer_relationships(&["category", "subcategory", "price"]);
        assert!(rels.contains(&"category contains subcategory (hierarchical)".to_string()));
        assert!(!rels.iter().any(|r| r.starts_with("subcategory contains")));
    }

    #[test]
    fn test_dependency_links() {
        let rels = infer_relationships(&["status", "name", "age"]);
        assert_eq!(
            rels,
            vec![
                "status determines name (dependency)".to_string(),
                "status determines age (dependency)".to_string(),
            ]
        );
    }

    #[test]
    fn test_business_rules() {
        let columns = vec![
            ColumnFacts {
                name: "score",
                non_empty: 4,
                distinct: 3,
                numeric_bounds: Some((0.0, 95.0)),
            },
            ColumnFacts {
                name: "weight",
                non_empty: 3,
                distinct: 3,
                numeric_bounds: Some((2.0, 310.0)),
            },
            ColumnFacts {
                name: "delta",
                non_empty: 4,
                distinct: 2,
                numeric_bounds: Some((-5.0, 5.0)),
            },
        ];
        let rules = infer_business_rules(&columns, 4);
        assert_eq!(
            rules,
            vec![
                "score is required".to_string(),
                "score is within 0-100".to_string(),
                "weight values are unique".to_string(),
                "weight is non-negative".to_string(),
                "delta is required".to_string(),
            ]
        );
    }

    #[test]
    fn test_business_rules_empty_dataset() {
        assert!(infer_business_rules(&[], 0).is_empty());
    }

    #[test]
    fn test_attach_is_case_insensitive_substring() {
        let candidates = vec![
            "Status determines breed (dependency)".to_string(),
            "age is required".to_string(),
        ];
        assert_eq!(attach("status", &candidates).len(), 1);
        assert_eq!(attach("BREED", &candidates).len(), 1);
        assert!(attach("owner", &candidates).is_empty());
    }
}
