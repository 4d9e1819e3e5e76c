use anyhow::Result;

// Print the OpenAPI document so clients can be generated without a running server.
fn main() -> Result<()> {
    let doc = credstore::api::openapi();
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
