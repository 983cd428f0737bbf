//! Category classification.
//!
//! A contribution type resolves to a category through an ordered rule list:
//! the first rule that fires wins. Exact-match rules are generated for every
//! configured category; an aggregate bucket adds a prefix rule evaluated first,
//! so `task-analysis` lands in the bucket rather than in `analysis`.

use curator_common::CategoryTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationRule {
    /// `contribution_type == category`.
    Exact { category: String },
    /// `contribution_type` starts with `prefix`; counted toward the aggregate `category`.
    Prefix { prefix: String, category: String },
}

/// How a type was resolved. The allocator treats the two kinds differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Aggregate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<'a> {
    pub category: &'a str,
    pub kind: MatchKind,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassificationRule>,
}

impl Classifier {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn from_table(table: &CategoryTable) -> Self {
        let mut rules = Vec::with_capacity(table.profiles.len() + 1);
        if let Some(agg) = &table.aggregate {
            rules.push(ClassificationRule::Prefix {
                prefix: agg.prefix.clone(),
                category: agg.category.clone(),
            });
        }
        rules.extend(table.profiles.iter().map(|p| ClassificationRule::Exact {
            category: p.id.clone(),
        }));
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Resolve a raw contribution type. `None` means no rule applies.
    pub fn classify(&self, contribution_type: &str) -> Option<Classification<'_>> {
        self.rules.iter().find_map(|rule| match rule {
            ClassificationRule::Prefix { prefix, category }
                if contribution_type.starts_with(prefix.as_str()) =>
            {
                Some(Classification {
                    category: category.as_str(),
                    kind: MatchKind::Aggregate,
                })
            }
            ClassificationRule::Exact { category } if contribution_type == category => {
                Some(Classification {
                    category: category.as_str(),
                    kind: MatchKind::Exact,
                })
            }
            _ => None,
        })
    }

    /// Whether `category` is an aggregate bucket.
    pub fn is_aggregate(&self, category: &str) -> bool {
        self.rules.iter().any(|r| {
            matches!(r, ClassificationRule::Prefix { category: c, .. } if c == category)
        })
    }
}
