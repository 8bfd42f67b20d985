//! JSON export of the rendered views.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::poller::Status;
use crate::source::DataQuery;
use crate::view::{DashboardView, TableBody, TableView};

/// Build the export document for the views currently on screen.
pub fn export_value(
    table: &TableView,
    dashboard: Option<&DashboardView>,
    status: Status,
    query: &DataQuery,
) -> Value {
    let mut export = Map::new();

    export.insert("status".to_string(), json!(status.label()));
    export.insert("last_updated".to_string(), json!(table.last_updated));
    export.insert(
        "filters".to_string(),
        json!({ "search": query.search, "column": query.column }),
    );

    let (columns, rows): (Vec<String>, Vec<Value>) = match &table.body {
        TableBody::Empty => (Vec::new(), Vec::new()),
        TableBody::Rows { columns, rows } => {
            let rows: Vec<Value> = rows
                .iter()
                .map(|cells| {
                    let row: Map<String, Value> = columns
                        .iter()
                        .cloned()
                        .zip(cells.iter().map(|c| json!(c)))
                        .collect();
                    Value::Object(row)
                })
                .collect();
            (columns.clone(), rows)
        }
    };
    export.insert("columns".to_string(), json!(columns));
    export.insert("rows".to_string(), Value::Array(rows));

    if let Some(dashboard) = dashboard {
        let cards: Vec<Value> = dashboard
            .cards
            .iter()
            .map(|c| json!({ "title": c.title, "value": c.value }))
            .collect();
        let categorical: Vec<Value> = dashboard
            .categorical
            .iter()
            .map(|c| {
                let top: Vec<Value> = c
                    .top
                    .iter()
                    .map(|(value, count)| json!({ "value": value, "count": count }))
                    .collect();
                json!({ "column": c.column, "unique": c.unique, "top": top })
            })
            .collect();
        let timeseries: Vec<Value> = dashboard
            .timeseries
            .iter()
            .map(|(period, count)| json!({ "period": period, "count": count }))
            .collect();

        export.insert(
            "dashboard".to_string(),
            json!({
                "cards": cards,
                "categorical": categorical,
                "timeseries_monthly": timeseries,
            }),
        );
    }

    Value::Object(export)
}

/// Write the export document to a file as pretty JSON.
pub fn write_export(
    path: &Path,
    table: &TableView,
    dashboard: Option<&DashboardView>,
    status: Status,
    query: &DataQuery,
) -> Result<()> {
    let json = serde_json::to_string_pretty(&export_value(table, dashboard, status, query))?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}
