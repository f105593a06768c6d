#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{PathItemType, RefOr, Schema};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components");
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            other => panic!("{} should be an object schema, got {:?}", name, other.is_some()),
        }
    }

    fn method_name(method: &PathItemType) -> &'static str {
        match method {
            PathItemType::Get => "GET",
            PathItemType::Post => "POST",
            PathItemType::Put => "PUT",
            PathItemType::Patch => "PATCH",
            PathItemType::Delete => "DELETE",
            _ => "other",
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        let components = openapi.components.as_ref().unwrap();
        for schema in [
            "ErrorResponse",
            "MessageResponse",
            "HealthResponse",
            "UserForm",
            "ProductForm",
            "UserListItem",
            "UserDetails",
            "ProductListItem",
            "ProductDetails",
            "CreatedProductResponse",
        ] {
            assert!(components.schemas.contains_key(schema), "missing {}", schema);
        }

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        assert_eq!(object_properties("ErrorResponse"), vec!["error".to_string()]);
    }

    #[test]
    fn test_user_schemas_do_not_expose_password() {
        for schema in ["UserListItem", "UserDetails"] {
            let properties = object_properties(schema);
            assert!(properties.contains(&"email".to_string()));
            assert!(!properties.contains(&"password".to_string()));
        }
    }

    #[test]
    fn test_documented_operations() {
        let openapi = ApiDoc::openapi();
        let expected = [
            ("/health", PathItemType::Get),
            ("/user/", PathItemType::Get),
            ("/user/", PathItemType::Post),
            ("/user/{id}", PathItemType::Get),
            ("/user/{id}", PathItemType::Put),
            ("/user/{id}", PathItemType::Delete),
            ("/product/", PathItemType::Get),
            ("/product/create", PathItemType::Post),
            ("/product/{id}", PathItemType::Get),
            ("/product/{id}", PathItemType::Patch),
            ("/product/{id}", PathItemType::Delete),
        ];

        for (path, method) in expected {
            let item = openapi
                .paths
                .paths
                .get(path)
                .unwrap_or_else(|| panic!("missing path {}", path));
            assert!(
                item.operations.contains_key(&method),
                "missing {} {}",
                method_name(&method),
                path
            );
        }
    }

    #[test]
    fn test_not_found_codes_differ_per_resource() {
        let openapi = ApiDoc::openapi();
        let user_get = &openapi.paths.paths["/user/{id}"].operations[&PathItemType::Get];
        let product_get = &openapi.paths.paths["/product/{id}"].operations[&PathItemType::Get];

        assert!(user_get.responses.responses.contains_key("400"));
        assert!(!user_get.responses.responses.contains_key("404"));
        assert!(product_get.responses.responses.contains_key("404"));
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi_json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("ErrorResponse"));
    }
}
