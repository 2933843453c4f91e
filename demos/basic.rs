//! Basic example binding one request into a struct
//!
//! Run with: cargo run --example basic

use bytes::Bytes;
use http_param_bind::prelude::*;
use http_param_bind::CollectionFormat;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Default, Deserialize)]
struct NewPet {
    name: String,
    age: Option<u8>,
}

#[derive(Debug, Default)]
struct UpdatePet {
    pet_id: i64,
    tags: Vec<String>,
    dry_run: Option<bool>,
    pet: NewPet,
}

bindable!(UpdatePet {
    pet_id,
    tags,
    dry_run,
    pet,
});

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Build the binder once; it is reused for every request
    let binder = RequestBinder::new([
        (
            "pet_id",
            ParameterDefinition::path("petId").typed(SimpleSchema::integer().format("int64")),
        ),
        (
            "tags",
            ParameterDefinition::query("tag").typed(
                SimpleSchema::array(SimpleSchema::string()).collection_format(CollectionFormat::Multi),
            ),
        ),
        (
            "dry_run",
            ParameterDefinition::header("X-Dry-Run").typed(SimpleSchema::boolean()),
        ),
        (
            "pet",
            ParameterDefinition::body(
                "pet",
                serde_json::json!({
                    "type": "object",
                    "required": ["name"],
                    "properties": { "age": { "type": "integer", "minimum": 0 } }
                }),
            )
            .required(true),
        ),
    ])?;

    println!("Binding PUT /pets/42...");
    let request = http::Request::put("/pets/42?tag=indoor&tag=senior")
        .header("content-type", "application/json")
        .header("X-Dry-Run", "yes")
        .body(Bytes::from_static(br#"{"name":"Rex","age":11}"#))?;
    let route = HashMap::from([("petId".to_owned(), "42".to_owned())]);

    let mut params = UpdatePet::default();
    binder.bind(&request, &route, &JsonConsumer, Destination::Record(&mut params))?;

    println!("  pet_id:  {}", params.pet_id);
    println!("  tags:    {:?}", params.tags);
    println!("  dry_run: {:?}", params.dry_run);
    println!("  pet:     {:?}", params.pet);

    println!("\nDone!");
    Ok(())
}
