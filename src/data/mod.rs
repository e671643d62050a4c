pub mod loader;
pub mod text;

pub use loader::{merge_orders_with_items, CoffeeData, TableName, ITEM_ID, ITEM_NAME};
