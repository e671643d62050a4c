//! Sales dashboard and dataset previews.

use crate::data::{CoffeeData, TableName, ITEM_NAME};
use crate::error::{AssistantError, Result};
use itertools::Itertools;
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const ORDERS_PREVIEW_ROWS: usize = 20;
pub const EXPLORER_ROWS: usize = 50;
pub const DEFAULT_CHART_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCount {
    pub item_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_orders: usize,
    pub unique_items_sold: usize,
    /// Most ordered first; ties broken by name.
    pub item_counts: Vec<ItemCount>,
}

impl DashboardSummary {
    pub fn build(data: &CoffeeData) -> Result<Self> {
        Self::from_frames(data.table(TableName::Orders), data.merged())
    }

    pub fn from_frames(orders: &DataFrame, merged: &DataFrame) -> Result<Self> {
        let names = merged
            .column(ITEM_NAME)
            .map_err(|_| AssistantError::Query(format!("Merged view has no '{}' column", ITEM_NAME)))?
            .cast(&DataType::String)?;
        let names = names.str()?;

        let item_counts: Vec<ItemCount> = names
            .into_iter()
            .flatten()
            .counts()
            .into_iter()
            .map(|(name, count)| ItemCount {
                item_name: name.to_string(),
                count,
            })
            .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.item_name.cmp(&b.item_name)))
            .collect();

        Ok(Self {
            total_orders: orders.height(),
            unique_items_sold: item_counts.len(),
            item_counts,
        })
    }

    /// Metrics followed by a horizontal bar chart of the most ordered drinks.
    pub fn render(&self, chart_width: usize) -> String {
        let mut out = String::new();
        out.push_str("Sales Dashboard\n\n");
        out.push_str(&format!("Total Orders:       {}\n", self.total_orders));
        out.push_str(&format!("Unique Items Sold:  {}\n\n", self.unique_items_sold));
        out.push_str("Most Ordered Drinks\n");
        out.push_str(&render_bar_chart(&self.item_counts, chart_width));
        out
    }
}

/// One line per item: label, bar scaled against the largest count, count.
pub fn render_bar_chart(counts: &[ItemCount], width: usize) -> String {
    let Some(max) = counts.iter().map(|c| c.count).max() else {
        return "(no orders)\n".to_string();
    };
    let label_width = counts
        .iter()
        .map(|c| c.item_name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for entry in counts {
        let mut bar_len = if max == 0 { 0 } else { entry.count * width / max };
        if entry.count > 0 && bar_len == 0 {
            bar_len = 1;
        }
        out.push_str(&format!(
            "{:<label_width$} | {} {}\n",
            entry.item_name,
            "#".repeat(bar_len),
            entry.count,
            label_width = label_width
        ));
    }
    out
}

/// A frame the explorer can show: the merged orders view or a raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetView {
    Merged,
    Table(TableName),
}

impl DatasetView {
    pub fn frame<'a>(&self, data: &'a CoffeeData) -> &'a DataFrame {
        match self {
            DatasetView::Merged => data.merged(),
            DatasetView::Table(name) => data.table(*name),
        }
    }
}

impl fmt::Display for DatasetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetView::Merged => f.write_str("merged"),
            DatasetView::Table(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for DatasetView {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("merged") {
            Ok(DatasetView::Merged)
        } else {
            s.parse::<TableName>().map(DatasetView::Table)
        }
    }
}

/// First `rows` rows of a frame.
pub fn preview(df: &DataFrame, rows: usize) -> DataFrame {
    df.head(Some(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames() -> (DataFrame, DataFrame) {
        let orders = df!(
            "order_id" => [1i64, 2, 3, 4, 5, 6],
            "item_id" => [1i64, 2, 1, 3, 9, 2]
        )
        .unwrap();
        let merged = df!(
            "order_id" => [1i64, 2, 3, 4, 5, 6],
            "item_id" => [1i64, 2, 1, 3, 9, 2],
            "item_name" => [
                Some("Latte"),
                Some("Mocha"),
                Some("Latte"),
                Some("Americano"),
                None,
                Some("Mocha"),
            ]
        )
        .unwrap();
        (orders, merged)
    }

    #[test]
    fn test_summary_counts() {
        let (orders, merged) = frames();
        let summary = DashboardSummary::from_frames(&orders, &merged).unwrap();

        assert_eq!(summary.total_orders, 6);
        assert_eq!(summary.unique_items_sold, 3);
        assert_eq!(
            summary.item_counts,
            vec![
                ItemCount { item_name: "Latte".to_string(), count: 2 },
                ItemCount { item_name: "Mocha".to_string(), count: 2 },
                ItemCount { item_name: "Americano".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_bar_chart_scaling() {
        let counts = vec![
            ItemCount { item_name: "Latte".to_string(), count: 10 },
            ItemCount { item_name: "Tea".to_string(), count: 1 },
        ];
        let chart = render_bar_chart(&counts, 20);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], format!("Latte | {} 10", "#".repeat(20)));
        assert_eq!(lines[1], "Tea   | ## 1");
    }

    #[test]
    fn test_bar_chart_minimum_bar() {
        let counts = vec![
            ItemCount { item_name: "A".to_string(), count: 100 },
            ItemCount { item_name: "B".to_string(), count: 1 },
        ];
        let chart = render_bar_chart(&counts, 10);
        assert!(chart.lines().nth(1).unwrap().starts_with("B | # 1"));
    }

    #[test]
    fn test_empty_chart() {
        assert_eq!(render_bar_chart(&[], 10), "(no orders)\n");
    }

    #[test]
    fn test_dataset_view_parsing() {
        assert_eq!("merged".parse::<DatasetView>().unwrap(), DatasetView::Merged);
        assert_eq!(
            "inventory".parse::<DatasetView>().unwrap(),
            DatasetView::Table(TableName::Inventory)
        );
        assert!("nope".parse::<DatasetView>().is_err());
    }

    #[test]
    fn test_render_includes_metrics() {
        let (orders, merged) = frames();
        let text = DashboardSummary::from_frames(&orders, &merged).unwrap().render(10);
        assert!(text.contains("Total Orders:       6"));
        assert!(text.contains("Unique Items Sold:  3"));
        assert!(text.contains("Latte"));
    }
}
