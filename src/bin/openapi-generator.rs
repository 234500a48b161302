//! Print the OpenAPI document of the tickshare HTTP surface.

use anyhow::Context;
use tickshare::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let doc = ApiDoc::openapi()
        .to_pretty_json()
        .context("rendering OpenAPI document")?;
    println!("{doc}");
    Ok(())
}
