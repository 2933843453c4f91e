//! Example binding into a map and reporting every failing parameter
//!
//! Run with: cargo run --example errors

use bytes::Bytes;
use http_param_bind::prelude::*;
use serde_json::Map;
use std::collections::HashMap;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Parameters as they appear in a Swagger 2.0 operation
    let definitions: Vec<ParameterDefinition> = serde_json::from_value(serde_json::json!([
        { "name": "id", "in": "path", "required": true, "type": "integer", "format": "int32" },
        { "name": "since", "in": "query", "type": "string", "format": "date-time" },
        { "name": "limit", "in": "query", "type": "integer", "default": 20 },
        { "name": "fields", "in": "query", "type": "array", "items": { "type": "string" } }
    ]))?;
    let binder = RequestBinder::new(
        definitions
            .into_iter()
            .map(|param| (param.name.clone(), param)),
    )?;

    let route = HashMap::from([("id".to_owned(), "7".to_owned())]);

    println!("Binding a valid request...");
    let request = http::Request::get("/pets/7?fields=name,age").body(Bytes::new())?;
    let mut map = Map::new();
    binder.bind(&request, &route, &JsonConsumer, &mut map)?;
    println!("  {}", serde_json::to_string_pretty(&map)?);

    println!("\nBinding an invalid request...");
    let route = HashMap::from([("id".to_owned(), "seven".to_owned())]);
    let request = http::Request::get("/pets/seven?since=last-week").body(Bytes::new())?;
    let mut map = Map::new();
    match binder.bind(&request, &route, &JsonConsumer, &mut map) {
        Ok(()) => println!("  unexpectedly bound: {map:?}"),
        Err(err) => {
            println!("  status: {}", err.status());
            for failure in err.errors() {
                println!("  [{}] {} ({:?})", failure.name(), failure, failure.kind());
            }
            println!("\n{err}");
        }
    }

    println!("\nDone!");
    Ok(())
}
