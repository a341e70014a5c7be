#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{PathItemType, RefOr, schema::Schema};
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();

        for schema in [
            "ErrorResponse",
            "HealthResponse",
            "RegisterRequest",
            "TokenResponse",
            "ReminderRequest",
            "ReminderResponse",
            "ThemeResponse",
            "SettingsResponse",
            "ProfileResponse",
        ] {
            assert!(components.schemas.contains_key(schema), "missing schema {}", schema);
        }

        // Verify that the schema can be serialized to JSON without errors
        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let error_response_schema = components.schemas.get("ErrorResponse").unwrap();

        if let RefOr::T(Schema::Object(obj)) = error_response_schema {
            let properties = &obj.properties;
            assert!(properties.contains_key("resp"));
            assert!(properties.contains_key("message"));
            assert!(properties.contains_key("code"));
        } else {
            panic!("ErrorResponse should be an object schema");
        }
    }

    #[test]
    fn test_reminder_request_uses_camel_case() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();

        if let Some(RefOr::T(Schema::Object(obj))) = components.schemas.get("ReminderRequest") {
            assert!(obj.properties.contains_key("reminderDateTime"));
            assert!(obj.properties.contains_key("breakDuration"));
            assert!(obj.required.contains(&"content".to_string()));
        } else {
            panic!("ReminderRequest should be an object schema");
        }
    }

    #[test]
    fn test_openapi_contains_all_routes() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/health", PathItemType::Get),
            ("/api/v1/register", PathItemType::Post),
            ("/api/v1/login", PathItemType::Post),
            ("/api/v1/logout", PathItemType::Post),
            ("/api/v1/reminders", PathItemType::Get),
            ("/api/v1/reminders", PathItemType::Post),
            ("/api/v1/reminders/{reminder_id}", PathItemType::Put),
            ("/api/v1/reminders/{reminder_id}", PathItemType::Delete),
            ("/api/v1/reminders/delete", PathItemType::Post),
            ("/api/v1/theme", PathItemType::Get),
            ("/api/v1/theme", PathItemType::Post),
            ("/api/v1/settings", PathItemType::Get),
            ("/api/v1/settings", PathItemType::Post),
            ("/api/v1/profile", PathItemType::Get),
            ("/api/v1/profile", PathItemType::Post),
            ("/api/v1/profile/upload", PathItemType::Post),
        ];

        for (path, method) in expected {
            let item = paths
                .get(path)
                .unwrap_or_else(|| panic!("missing path {}", path));
            assert!(
                item.operations.contains_key(&method),
                "missing operation on {}",
                path
            );
        }
    }

    #[test]
    fn test_protected_routes_declare_token_security() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("token"));

        let reminders = openapi.paths.paths.get("/api/v1/reminders").unwrap();
        let list = reminders.operations.get(&PathItemType::Get).unwrap();
        assert!(list.security.is_some());

        let register = openapi.paths.paths.get("/api/v1/register").unwrap();
        let register_op = register.operations.get(&PathItemType::Post).unwrap();
        assert!(register_op.security.is_none());

        let upload = openapi.paths.paths.get("/api/v1/profile/upload").unwrap();
        let upload_op = upload.operations.get(&PathItemType::Post).unwrap();
        let responses = &upload_op.responses.responses;
        assert!(responses.contains_key("201"));
        assert!(responses.contains_key("409"));
    }
}
