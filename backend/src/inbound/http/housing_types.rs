//! Housing type registry listing.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::HousingType;
use crate::inbound::http::state::HttpState;

/// Registered housing types and the default applied to untyped input.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct HousingTypesResponse {
    #[schema(example = "standard")]
    pub default_type: String,
    pub types: Vec<HousingType>,
}

#[utoipa::path(
    get,
    path = "/api/v1/housing_types",
    responses((status = 200, description = "Housing type registry", body = HousingTypesResponse)),
    tags = ["housing_types"],
    operation_id = "listHousingTypes"
)]
#[get("/housing_types")]
pub async fn list_housing_types(state: web::Data<HttpState>) -> web::Json<HousingTypesResponse> {
    let registry = &state.housing_types;
    web::Json(HousingTypesResponse {
        default_type: registry.default_type().to_owned(),
        types: registry.entries().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use serde_json::Value;

    use crate::inbound::http::test_utils::{harness, test_app};

    #[actix_web::test]
    async fn lists_builtin_types_with_video_categories() {
        let app = test::init_service(test_app(harness().state)).await;
        let req = test::TestRequest::get().uri("/api/v1/housing_types").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["default_type"], "standard");
        let ids: Vec<_> = body["types"]
            .as_array()
            .expect("types array")
            .iter()
            .filter_map(|entry| entry["id"].as_str())
            .collect();
        assert_eq!(ids, ["standard", "oval", "squared", "angular"]);
        assert_eq!(body["types"][2]["video_category"], "sqaure_housing");
    }
}
