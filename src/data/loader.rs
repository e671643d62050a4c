//! Loads the eight coffee-shop tables from CSV and builds the merged
//! orders/items view.

use crate::error::{AssistantError, Result};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Join key shared by `orders` and `items`.
pub const ITEM_ID: &str = "item_id";
pub const ITEM_NAME: &str = "item_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableName {
    Ingredients,
    Inventory,
    Items,
    Orders,
    Recipe,
    Rota,
    Shift,
    Staff,
}

impl TableName {
    pub const ALL: [TableName; 8] = [
        TableName::Ingredients,
        TableName::Inventory,
        TableName::Items,
        TableName::Orders,
        TableName::Recipe,
        TableName::Rota,
        TableName::Shift,
        TableName::Staff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Ingredients => "ingredients",
            TableName::Inventory => "inventory",
            TableName::Items => "items",
            TableName::Orders => "orders",
            TableName::Recipe => "recipe",
            TableName::Rota => "rota",
            TableName::Shift => "shift",
            TableName::Staff => "staff",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        TableName::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                AssistantError::Query(format!(
                    "Unknown table '{}'. Expected one of: {}",
                    s,
                    TableName::ALL.map(|t| t.as_str()).join(", ")
                ))
            })
    }
}

/// Immutable handle over every loaded table plus the merged view.
/// Built once per process; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct CoffeeData {
    data_dir: PathBuf,
    tables: HashMap<TableName, DataFrame>,
    merged: DataFrame,
}

impl CoffeeData {
    /// Read all eight tables from `data_dir`. Any missing or malformed file
    /// fails the whole load.
    pub fn load(data_dir: &Path) -> Result<Self> {
        info!("Loading coffee shop tables from {}", data_dir.display());

        let mut tables = HashMap::with_capacity(TableName::ALL.len());
        for name in TableName::ALL {
            let df = read_table(data_dir, name)?;
            debug!("Loaded {}: {} rows x {} columns", name, df.height(), df.width());
            tables.insert(name, df);
        }

        let data = Self::from_tables(data_dir.to_path_buf(), tables)?;
        info!(
            "Loaded {} orders, {} menu items, merged view has {} rows",
            data.table(TableName::Orders).height(),
            data.table(TableName::Items).height(),
            data.merged.height()
        );
        Ok(data)
    }

    /// Assemble a handle from frames that are already in memory. All eight
    /// tables must be present.
    pub fn from_tables(data_dir: PathBuf, tables: HashMap<TableName, DataFrame>) -> Result<Self> {
        for name in TableName::ALL {
            if !tables.contains_key(&name) {
                return Err(AssistantError::Load(format!("Table '{}' was not provided", name)));
            }
        }

        let items = &tables[&TableName::Items];
        let orders = &tables[&TableName::Orders];
        require_columns(TableName::Items, items, &[ITEM_ID, ITEM_NAME])?;
        require_columns(TableName::Orders, orders, &[ITEM_ID])?;

        let merged = merge_orders_with_items(orders, items)?;

        Ok(Self {
            data_dir,
            tables,
            merged,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn table(&self, name: TableName) -> &DataFrame {
        // from_tables guarantees every name is present
        &self.tables[&name]
    }

    pub fn merged(&self) -> &DataFrame {
        &self.merged
    }
}

fn read_table(data_dir: &Path, name: TableName) -> Result<DataFrame> {
    let path = data_dir.join(name.file_name());

    if !path.exists() {
        return Err(AssistantError::Load(format!(
            "Table file not found for {}: {}",
            name,
            path.display()
        )));
    }

    LazyCsvReader::new(&path)
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .finish()
        .map_err(|e| AssistantError::Load(format!("Failed to scan CSV {}: {}", name, e)))?
        .collect()
        .map_err(|e| AssistantError::Load(format!("Failed to read CSV {}: {}", name, e)))
}

fn require_columns(name: TableName, df: &DataFrame, required: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !present.contains(column))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AssistantError::Load(format!(
            "Table {} is missing required column(s): {}",
            name,
            missing.join(", ")
        )))
    }
}

/// Left join of orders onto items by `item_id`. Orders whose item does not
/// exist keep null item fields; order row order is preserved.
pub fn merge_orders_with_items(orders: &DataFrame, items: &DataFrame) -> Result<DataFrame> {
    let mut left = orders.clone().lazy();
    let mut right = items.clone().lazy();

    // Keys inferred with different types (e.g. "A1" vs 1) only join as text.
    let left_type = orders.column(ITEM_ID)?.dtype().clone();
    let right_type = items.column(ITEM_ID)?.dtype().clone();
    if left_type != right_type {
        debug!(
            "item_id types differ (orders: {}, items: {}), joining as text",
            left_type, right_type
        );
        left = left.with_column(col(ITEM_ID).cast(DataType::String));
        right = right.with_column(col(ITEM_ID).cast(DataType::String));
    }

    left.join(
        right,
        [col(ITEM_ID)],
        [col(ITEM_ID)],
        JoinArgs::new(JoinType::Left),
    )
    .collect()
    .map_err(|e| AssistantError::Load(format!("Failed to join orders with items: {}", e)))
}
