use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateRoleDto {
    #[validate(length(min = 2, max = 50, message = "Role name must be between 2 and 50 characters"))]
    pub name: String,

    #[validate(length(max = 255, message = "Description is too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePermissionDto {
    #[validate(length(min = 2, max = 100, message = "Permission name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 255, message = "Description is too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SetPermissionsDto {
    pub permission_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SetUserRolesDto {
    #[validate(length(min = 1, message = "A user needs at least one role"))]
    pub role_ids: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_needs_a_role() {
        let dto = SetUserRolesDto { role_ids: vec![] };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn short_role_name_is_rejected() {
        let dto = CreateRoleDto { name: "x".into(), description: None };
        assert!(dto.validate().is_err());
    }
}
