//! Print the OpenAPI document as JSON.

use utoipa::OpenApi;
use whenworks::doc::ApiDoc;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    println!("{}", ApiDoc::openapi().to_pretty_json()?);
    Ok(())
}
