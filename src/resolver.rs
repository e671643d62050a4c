//! Keyword query resolver for the chatbot.
//!
//! A question is classified by plain substring membership against fixed
//! keyword sets, checked in strict priority order: cold, hot, menu, then a
//! whole-row text search over the merged orders/items view.

use crate::data::text::{row_text, string_columns};
use crate::data::ITEM_NAME;
use crate::error::{AssistantError, Result};
use itertools::Itertools;
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

pub const COLD_KEYWORDS: [&str; 4] = ["cold", "iced", "ice", "frappe"];
pub const HOT_KEYWORDS: [&str; 2] = ["hot", "warm"];
pub const MENU_KEYWORDS: [&str; 2] = ["menu", "drink"];

/// Column name of the full-menu listing.
pub const MENU_COLUMN: &str = "Available Drinks";

pub const NO_COLD_DRINKS: &str = "No cold drinks found.";
pub const NO_HOT_DRINKS: &str = "No hot drinks found.";
pub const NO_MATCHES: &str = "No matching results.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Cold,
    Hot,
    Menu,
    Search,
}

impl QueryKind {
    /// Classify an already lower-cased question.
    pub fn classify(normalized: &str) -> Self {
        let contains_any = |keywords: &[&str]| keywords.iter().any(|k| normalized.contains(k));

        if contains_any(&COLD_KEYWORDS) {
            QueryKind::Cold
        } else if contains_any(&HOT_KEYWORDS) {
            QueryKind::Hot
        } else if contains_any(&MENU_KEYWORDS) {
            QueryKind::Menu
        } else {
            QueryKind::Search
        }
    }
}

/// What the resolver hands back: a table to render or a message to show.
#[derive(Debug, Clone)]
pub enum QueryAnswer {
    Rows(DataFrame),
    Message(String),
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub kind: QueryKind,
    pub answer: QueryAnswer,
}

/// Blank questions are never resolved; callers treat them as "no query".
pub fn is_blank_query(question: &str) -> bool {
    question.trim().is_empty()
}

/// Resolve a free-text question against the merged view. Pure apart from
/// a debug log line.
pub fn resolve(question: &str, merged: &DataFrame) -> Result<Resolution> {
    let normalized = question.to_lowercase();
    let kind = QueryKind::classify(&normalized);

    let answer = match kind {
        QueryKind::Cold => names_matching(merged, &COLD_KEYWORDS, NO_COLD_DRINKS)?,
        QueryKind::Hot => names_matching(merged, &HOT_KEYWORDS, NO_HOT_DRINKS)?,
        QueryKind::Menu => full_menu(merged)?,
        QueryKind::Search => search_rows(merged, &normalized)?,
    };

    debug!(
        "Resolved {:?} as {:?} ({})",
        question,
        kind,
        match &answer {
            QueryAnswer::Rows(df) => format!("{} rows", df.height()),
            QueryAnswer::Message(msg) => msg.clone(),
        }
    );

    Ok(Resolution { kind, answer })
}

fn item_names(merged: &DataFrame) -> Result<StringChunked> {
    let column = merged.column(ITEM_NAME).map_err(|_| {
        AssistantError::Query(format!("Merged view has no '{}' column", ITEM_NAME))
    })?;
    Ok(column.cast(&DataType::String)?.str()?.clone())
}

/// Distinct item names (first-seen order) containing any keyword,
/// case-insensitively. Null names never match.
fn names_matching(merged: &DataFrame, keywords: &[&str], empty_message: &str) -> Result<QueryAnswer> {
    let names = item_names(merged)?;
    let matching: Vec<String> = names
        .into_iter()
        .flatten()
        .filter(|name| {
            let lowered = name.to_lowercase();
            keywords.iter().any(|k| lowered.contains(k))
        })
        .unique()
        .map(str::to_string)
        .collect();

    if matching.is_empty() {
        return Ok(QueryAnswer::Message(empty_message.to_string()));
    }

    let df = DataFrame::new(vec![Series::new(ITEM_NAME, matching)])?;
    Ok(QueryAnswer::Rows(df))
}

fn full_menu(merged: &DataFrame) -> Result<QueryAnswer> {
    let names = item_names(merged)?;
    let menu: Vec<String> = names
        .into_iter()
        .flatten()
        .unique()
        .map(str::to_string)
        .collect();

    let df = DataFrame::new(vec![Series::new(MENU_COLUMN, menu)])?;
    Ok(QueryAnswer::Rows(df))
}

/// Keep every merged row whose stringified fields contain the query.
/// This scans all columns, not only the item name.
fn search_rows(merged: &DataFrame, normalized: &str) -> Result<QueryAnswer> {
    let columns = string_columns(merged)?;
    let mask: Vec<bool> = (0..merged.height())
        .map(|row_idx| row_text(&columns, row_idx).to_lowercase().contains(normalized))
        .collect();

    if !mask.iter().any(|hit| *hit) {
        return Ok(QueryAnswer::Message(NO_MATCHES.to_string()));
    }

    let mask = BooleanChunked::from_slice("matches", &mask);
    Ok(QueryAnswer::Rows(merged.filter(&mask)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged() -> DataFrame {
        df!(
            "order_id" => [100i64, 101, 102, 103, 104, 105],
            "item_id" => [1i64, 2, 3, 1, 42, 3],
            "quantity" => [1i64, 2, 1, 3, 1, 1],
            "item_name" => [
                Some("Iced Latte"),
                Some("Hot Americano"),
                Some("Cappuccino"),
                Some("Iced Latte"),
                None,
                Some("Cappuccino"),
            ]
        )
        .unwrap()
    }

    fn rows(resolution: &Resolution) -> &DataFrame {
        match &resolution.answer {
            QueryAnswer::Rows(df) => df,
            QueryAnswer::Message(msg) => panic!("expected rows, got message {:?}", msg),
        }
    }

    fn message(resolution: &Resolution) -> &str {
        match &resolution.answer {
            QueryAnswer::Message(msg) => msg,
            QueryAnswer::Rows(df) => panic!("expected message, got {} rows", df.height()),
        }
    }

    fn first_column(df: &DataFrame) -> Vec<Option<String>> {
        df.get_columns()[0]
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(QueryKind::classify("cold menu"), QueryKind::Cold);
        assert_eq!(QueryKind::classify("hot drinks"), QueryKind::Hot);
        assert_eq!(QueryKind::classify("iced or hot"), QueryKind::Cold);
        assert_eq!(QueryKind::classify("show all drinks"), QueryKind::Menu);
        assert_eq!(QueryKind::classify("latte"), QueryKind::Search);
    }

    #[test]
    fn test_cold_query_returns_distinct_cold_names() {
        let resolution = resolve("Iced", &merged()).unwrap();
        assert_eq!(resolution.kind, QueryKind::Cold);
        let df = rows(&resolution);
        assert_eq!(df.get_column_names(), vec![ITEM_NAME]);
        assert_eq!(first_column(df), vec![Some("Iced Latte".to_string())]);
    }

    #[test]
    fn test_cold_query_collects_every_cold_keyword() {
        let menu = df!(
            "order_id" => [1i64, 2, 3, 4, 5, 6, 7],
            "item_name" => [
                "Caramel Frappe",
                "Hot Americano",
                "Iced Cappuccino",
                "Caramel Frappe",
                "Cold Brew",
                "Mocha",
                "Iced Cappuccino",
            ]
        )
        .unwrap();

        let resolution = resolve("ice", &menu).unwrap();
        assert_eq!(resolution.kind, QueryKind::Cold);
        assert_eq!(
            first_column(rows(&resolution)),
            vec![
                Some("Caramel Frappe".to_string()),
                Some("Iced Cappuccino".to_string()),
                Some("Cold Brew".to_string()),
            ]
        );
    }

    #[test]
    fn test_hot_query() {
        let resolution = resolve("something WARM please", &merged()).unwrap();
        assert_eq!(resolution.kind, QueryKind::Hot);
        assert_eq!(first_column(rows(&resolution)), vec![Some("Hot Americano".to_string())]);
    }

    #[test]
    fn test_cold_menu_uses_cold_branch() {
        let resolution = resolve("cold menu", &merged()).unwrap();
        assert_eq!(resolution.kind, QueryKind::Cold);
        assert_eq!(rows(&resolution).height(), 1);
    }

    #[test]
    fn test_menu_lists_every_name_once() {
        let resolution = resolve("show all drinks", &merged()).unwrap();
        assert_eq!(resolution.kind, QueryKind::Menu);
        let df = rows(&resolution);
        assert_eq!(df.get_column_names(), vec![MENU_COLUMN]);
        assert_eq!(
            first_column(df),
            vec![
                Some("Iced Latte".to_string()),
                Some("Hot Americano".to_string()),
                Some("Cappuccino".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_keyword_class_returns_sentinel() {
        let only_hot = df!(
            "item_id" => [1i64],
            "item_name" => ["Hot Chocolate"]
        )
        .unwrap();
        let resolution = resolve("frappe", &only_hot).unwrap();
        assert_eq!(resolution.kind, QueryKind::Cold);
        assert_eq!(message(&resolution), NO_COLD_DRINKS);

        let only_cold = df!(
            "item_id" => [1i64],
            "item_name" => ["Cold Brew"]
        )
        .unwrap();
        let resolution = resolve("hot", &only_cold).unwrap();
        assert_eq!(message(&resolution), NO_HOT_DRINKS);
    }

    #[test]
    fn test_fallback_matches_whole_row() {
        let resolution = resolve("latte", &merged()).unwrap();
        assert_eq!(resolution.kind, QueryKind::Search);
        let df = rows(&resolution);
        assert_eq!(df.height(), 2);
        let ids: Vec<Option<i64>> = df.column("order_id").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some(100), Some(103)]);
    }

    #[test]
    fn test_fallback_matches_non_item_fields() {
        // order 104 references a missing item but is still found by its id
        let resolution = resolve("104", &merged()).unwrap();
        let df = rows(&resolution);
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("item_id").unwrap().i64().unwrap().get(0), Some(42));
    }

    #[test]
    fn test_fallback_without_match() {
        let resolution = resolve("tea", &merged()).unwrap();
        assert_eq!(message(&resolution), NO_MATCHES);
    }

    #[test]
    fn test_blank_query() {
        assert!(is_blank_query(""));
        assert!(is_blank_query("   \n"));
        assert!(!is_blank_query("menu"));
    }
}
