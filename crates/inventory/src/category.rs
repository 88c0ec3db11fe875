//! Category rollups over a flat row set.
//!
//! Categories are not stored as a tree: every row carries its full path as a
//! `>`-separated string (`Electronics>Audio>Headphones`) and the hierarchy is
//! reconstructed per request from the rows the store returned.
//!
//! Two matching modes exist:
//!
//! - [`CategoryMatch::Prefix`] compares paths by literal string prefix. This is
//!   the historical behaviour, including its collision (`Electronics2` sits
//!   "under" `Electronics`).
//! - [`CategoryMatch::Segment`] requires the match to end on a segment
//!   boundary, so `Electronics2` and `Electronics` are unrelated.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use shelfscan_core::{Barcode, DomainError};

use crate::item::StockItem;

/// Level separator inside a category path.
pub const SEPARATOR: char = '>';

/// How a category path is matched against its ancestors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryMatch {
    #[default]
    Prefix,
    Segment,
}

impl CategoryMatch {
    /// `path` is `ancestor` itself or lies anywhere below it.
    pub fn descends_from(self, path: &str, ancestor: &str) -> bool {
        match self {
            CategoryMatch::Prefix => path.starts_with(ancestor),
            CategoryMatch::Segment => match path.strip_prefix(ancestor) {
                Some(rest) => rest.is_empty() || rest.starts_with(SEPARATOR),
                None => false,
            },
        }
    }

    /// `path` lies exactly one level below `parent`.
    pub fn is_direct_child(self, path: &str, parent: &str) -> bool {
        let Some(rest) = path.strip_prefix(parent) else {
            return false;
        };
        if rest.is_empty() {
            return false;
        }
        match self {
            CategoryMatch::Prefix => rest.matches(SEPARATOR).count() == 1,
            CategoryMatch::Segment => rest
                .strip_prefix(SEPARATOR)
                .is_some_and(|segment| !segment.contains(SEPARATOR)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryMatch::Prefix => "prefix",
            CategoryMatch::Segment => "segment",
        }
    }
}

impl FromStr for CategoryMatch {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prefix" => Ok(CategoryMatch::Prefix),
            "segment" => Ok(CategoryMatch::Segment),
            other => Err(DomainError::validation(format!(
                "category match must be one of: prefix, segment (got {other:?})"
            ))),
        }
    }
}

/// First path segment (`Electronics` for `Electronics>Audio`).
pub fn top_level_name(path: &str) -> &str {
    path.split_once(SEPARATOR).map_or(path, |(head, _)| head)
}

/// One entry of the top-level category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelCategory {
    pub name: String,
    pub item_count: u64,
}

/// Quantity rolled up under one direct subcategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryRollup {
    pub category_name: String,
    pub sum_quantity: u64,
}

/// Detail view of one category.
///
/// `sub_total_quantity` is `None` only when the store held no rows at all;
/// the serialized object then carries no `subTotalQuantity` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    pub categories: Vec<SubcategoryRollup>,
    pub items: Vec<Barcode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_total_quantity: Option<u64>,
}

impl CategoryDetail {
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
            items: Vec::new(),
            sub_total_quantity: None,
        }
    }
}

/// Distinct category paths with their own (non-rolled-up) quantity, in order
/// of first appearance.
struct PathTotals<'a> {
    paths: Vec<(&'a str, u64)>,
}

impl<'a> PathTotals<'a> {
    fn collect(rows: &'a [StockItem]) -> Self {
        let mut paths: Vec<(&'a str, u64)> = Vec::new();
        let mut index: HashMap<&'a str, usize> = HashMap::new();

        for row in rows {
            let path = row.category.as_str();
            let slot = *index.entry(path).or_insert_with(|| {
                paths.push((path, 0));
                paths.len() - 1
            });
            paths[slot].1 = paths[slot].1.saturating_add(row.quantity);
        }

        Self { paths }
    }

    fn sum_under(&self, ancestor: &str, mode: CategoryMatch) -> u64 {
        self.paths
            .iter()
            .filter(|(path, _)| mode.descends_from(path, ancestor))
            .fold(0, |acc, (_, qty)| acc.saturating_add(*qty))
    }

    fn direct_children<'s>(
        &'s self,
        parent: &'s str,
        mode: CategoryMatch,
    ) -> impl Iterator<Item = &'a str> + 's {
        self.paths
            .iter()
            .map(|(path, _)| *path)
            .filter(move |path| mode.is_direct_child(path, parent))
    }
}

/// Computes category listings and rollups from a full row set.
///
/// Stateless apart from the match mode; every call rescans the rows it is
/// given.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CategoryAggregator {
    mode: CategoryMatch,
}

impl CategoryAggregator {
    pub fn new(mode: CategoryMatch) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CategoryMatch {
        self.mode
    }

    /// Top-level categories with every nested row's quantity rolled in.
    ///
    /// Rows whose first segment is empty are skipped. Output follows the order
    /// in which each name is first seen.
    pub fn top_level_categories(&self, rows: &[StockItem]) -> Vec<TopLevelCategory> {
        let mut out: Vec<TopLevelCategory> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for row in rows {
            let name = top_level_name(&row.category);
            if name.is_empty() {
                continue;
            }
            let slot = *index.entry(name).or_insert_with(|| {
                out.push(TopLevelCategory {
                    name: name.to_string(),
                    item_count: 0,
                });
                out.len() - 1
            });
            out[slot].item_count = out[slot].item_count.saturating_add(row.quantity);
        }

        out
    }

    /// Direct items of `category`, one level of subcategory rollups, and the
    /// total under `category` at any depth.
    pub fn category_detail(&self, rows: &[StockItem], category: &str) -> CategoryDetail {
        if rows.is_empty() {
            return CategoryDetail::empty();
        }

        let totals = PathTotals::collect(rows);

        let items = rows
            .iter()
            .filter(|r| r.category == category)
            .map(|r| r.barcode.clone())
            .collect();

        let categories = totals
            .direct_children(category, self.mode)
            .map(|child| SubcategoryRollup {
                category_name: child.to_string(),
                sum_quantity: totals.sum_under(child, self.mode),
            })
            .collect();

        CategoryDetail {
            categories,
            items,
            sub_total_quantity: Some(totals.sum_under(category, self.mode)),
        }
    }
}
