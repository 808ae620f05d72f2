use utoipa::openapi::{
    InfoBuilder, OpenApi,
    security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

pub fn create_swagger_ui(mut openapi: OpenApi) -> SwaggerUi {
    openapi.info = InfoBuilder::new()
        .title("TechStore OrderService API")
        .version("1.0.0")
        .build();

    let bearer = HttpBuilder::new()
        .scheme(HttpAuthScheme::Bearer)
        .bearer_format("JWT")
        .build();
    openapi
        .components
        .get_or_insert_with(Default::default)
        .add_security_scheme("bearerAuth", SecurityScheme::Http(bearer));

    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi)
}
