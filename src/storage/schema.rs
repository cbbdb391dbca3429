//! Database schema definitions using sea-query.
//!
//! Star-schema tables are generated from the static column catalog in
//! [`crate::model::WarehouseTable`]; the watermark table is declared here.

use sea_query::{Alias, ColumnDef, Iden, Index, IndexCreateStatement, Table, TableCreateStatement};

use crate::model::{ColumnType, WarehouseTable, EVENT_AT_COLUMN};

/// Watermarks table schema.
#[derive(Iden)]
pub enum SyncWatermarks {
    Table,
    #[iden = "table_name"]
    TableName,
    #[iden = "last_synced_at"]
    LastSyncedAt,
    #[iden = "rows_synced"]
    RowsSynced,
    #[iden = "sync_type"]
    SyncType,
}

/// CREATE TABLE for the watermark table.
pub fn create_watermarks_table() -> TableCreateStatement {
    Table::create()
        .table(SyncWatermarks::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(SyncWatermarks::TableName)
                .text()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(SyncWatermarks::LastSyncedAt).text().not_null())
        .col(
            ColumnDef::new(SyncWatermarks::RowsSynced)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(SyncWatermarks::SyncType).text().not_null())
        .to_owned()
}

/// CREATE TABLE for a dimension or fact table.
///
/// The natural key is the primary key; every other column is nullable.
pub fn create_table(table: WarehouseTable) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(Alias::new(table.name())).if_not_exists();

    for (i, column) in table.columns().iter().enumerate() {
        let mut def = ColumnDef::new(Alias::new(column.name));
        match column.ty {
            ColumnType::Text => def.text(),
            ColumnType::Double => def.double(),
            ColumnType::BigInt => def.big_integer(),
        };
        if i == 0 {
            def.not_null().primary_key();
        }
        stmt.col(&mut def);
    }

    stmt.to_owned()
}

/// Index on `event_at` for fact window deletes; `None` for dimensions.
pub fn create_event_index(table: WarehouseTable) -> Option<IndexCreateStatement> {
    table.is_fact().then(|| {
        Index::create()
            .if_not_exists()
            .name(format!("idx_{}_{}", table.name(), EVENT_AT_COLUMN))
            .table(Alias::new(table.name()))
            .col(Alias::new(EVENT_AT_COLUMN))
            .to_owned()
    })
}
