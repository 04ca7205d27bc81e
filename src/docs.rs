use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::auth::register,
        routes::auth::login,
        routes::users::list_users,
        routes::users::get_user,
        routes::users::me,
        routes::users::create_user,
        routes::users::update_user,
        routes::users::delete_user,
        routes::projects::list_projects,
        routes::projects::create_project,
        routes::projects::get_project,
        routes::projects::update_project,
        routes::projects::delete_project,
        routes::projects::metrics,
        routes::projects::add_member,
        routes::projects::remove_member,
        routes::tasks::list_tasks,
        routes::tasks::create_task,
        routes::tasks::list_project_tasks,
        routes::tasks::update_task,
        routes::tasks::delete_task
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::auth::MessageResponse,
            models::user::User,
            models::user::Role,
            models::user::RegisterRequest,
            models::user::LoginRequest,
            models::user::AuthResponse,
            models::user::AuthUserView,
            models::user::UserCreateRequest,
            models::user::UserUpdateRequest,
            models::project::Project,
            models::project::ProjectCreateRequest,
            models::project::ProjectUpdateRequest,
            models::project::AddMemberRequest,
            models::project::ProjectMetrics,
            models::project::StatusBreakdown,
            models::task::Task,
            models::task::TaskStatus,
            models::task::TaskCreateRequest,
            models::task::TaskUpdateRequest
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "User management (role-gated)"),
        (name = "Projects", description = "Project and membership management"),
        (name = "Tasks", description = "Task management"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
