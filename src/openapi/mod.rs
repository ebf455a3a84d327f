use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FabTrack API",
        version = "1.0.0",
        description = r#"
# FabTrack Manufacturing Operations API

Backend for manufacturing and inventory tracking: product and
product-type catalogs, spare-part purchasing and stock availability,
device assembly and testing, customer sales, and vendor service/repair
workflows.

## Authentication

All business endpoints require a bearer token issued by the identity
collaborator:

```
Authorization: Bearer <token>
```

## Error Handling

Errors use a consistent format with appropriate HTTP status codes:

```json
{
  "error": "Conflict",
  "message": "Serial 'VCI-0042' already exists for part 'Main PCB'",
  "request_id": "req-abc123xyz",
  "timestamp": "2026-08-08T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` and `per_page` query parameters and wrap
results with pagination metadata.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080/api/v1", description = "Local development")
    ),
    tags(
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Spare Parts", description = "Spare-part catalog and stock availability"),
        (name = "Purchases", description = "Spare-part purchase endpoints"),
        (name = "Inventory", description = "Assembled unit and testing endpoints"),
        (name = "Sales", description = "Customer sale endpoints"),
        (name = "Vendors", description = "Vendor and contact person endpoints"),
        (name = "Service", description = "Vendor service/repair endpoints"),
        (name = "Tracking", description = "Per-serial timeline"),
        (name = "Reports", description = "Dashboard aggregates"),
        (name = "Health", description = "Health check endpoints")
    ),
    components(
        schemas(
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("FabTrack API"));
    }
}
