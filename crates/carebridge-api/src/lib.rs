pub mod handlers;
pub mod middleware;
pub mod models;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use carebridge_access::{
    AccessCodeService, ActivityLog, AdminOps, MembershipService, NoteService, WorkspaceResolver,
};
use sea_orm::DatabaseConnection;

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub allow_signup: bool,
    pub resolver: WorkspaceResolver,
    pub codes: AccessCodeService,
    pub activity: ActivityLog,
    pub memberships: MembershipService,
    pub notes: NoteService,
    pub admin: AdminOps,
}

impl AppState {
    /// Wire up the engine services over one database connection.
    pub fn new(db: DatabaseConnection, jwt_secret: String, allow_signup: bool) -> Self {
        let resolver = WorkspaceResolver::new(db.clone());
        let activity = ActivityLog::new(db.clone());

        Self {
            codes: AccessCodeService::new(db.clone()),
            memberships: MembershipService::new(db.clone(), resolver.clone(), activity.clone()),
            notes: NoteService::new(db.clone()),
            admin: AdminOps::new(db.clone(), activity.clone()),
            resolver,
            activity,
            db,
            jwt_secret,
            allow_signup,
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CareBridge API",
        version = "0.1.0",
        description = "REST API for the CareBridge care-coordination workspace",
        contact(
            name = "CareBridge Team",
            email = "team@carebridge.dev"
        )
    ),
    paths(
        handlers::health_check,
        handlers::login,
        handlers::register,
        handlers::get_current_user,
        handlers::get_permissions,
        handlers::get_workspace,
        handlers::list_access_codes,
        handlers::issue_access_code,
        handlers::revoke_access_code,
        handlers::validate_access_code,
        handlers::list_team,
        handlers::invite_team_member,
        handlers::accept_invite,
        handlers::remove_team_member,
        handlers::list_notes,
        handlers::create_note,
        handlers::list_activity,
        handlers::activity_stats,
        handlers::change_user_role,
        handlers::set_user_active,
    ),
    components(
        schemas(
            models::ErrorResponse,
            models::HealthResponse,
            models::UserRole,
            models::User,
            models::LoginRequest,
            models::LoginResponse,
            models::RegisterRequest,
            models::PermissionsResponse,
            models::TeamRole,
            models::TeamMemberStatus,
            models::WorkspaceResponse,
            models::CodeAccessLevel,
            models::IssueAccessCodeRequest,
            models::AccessCode,
            models::AccessCodeList,
            models::ValidateAccessCodeRequest,
            models::ValidateAccessCodeResponse,
            models::InviteTeamMemberRequest,
            models::TeamMember,
            models::TeamMemberList,
            models::CreateNoteRequest,
            models::Note,
            models::NoteList,
            models::ActivityEntry,
            models::ActivityPageResponse,
            models::ActivityStatsResponse,
            models::ChangeRoleRequest,
            models::SetActiveRequest,
        )
    ),
    tags(
        (name = "system", description = "System health endpoints"),
        (name = "auth", description = "Authentication and account endpoints"),
        (name = "permissions", description = "Role and capability endpoints"),
        (name = "workspace", description = "Workspace delegation endpoints"),
        (name = "access-tokens", description = "Client access code endpoints"),
        (name = "team", description = "Workspace team management endpoints"),
        (name = "notes", description = "Care note endpoints"),
        (name = "admin", description = "Privileged administration endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development)
    pub enable_cors: bool,
    /// JWT secret for signing session tokens
    pub jwt_secret: String,
    /// Whether self-service registration is open
    pub allow_signup: bool,
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, db: DatabaseConnection) -> Self {
        let state = Arc::new(AppState::new(
            db,
            config.jwt_secret.clone(),
            config.allow_signup,
        ));

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let jwt_state = Arc::new(middleware::JwtState::new(self.config.jwt_secret.as_bytes()));

        // PUBLIC routes: health, login, signup, and external code validation
        // (the external viewer holds no account).
        let public_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route("/api/auth/login", post(handlers::login))
            .route("/api/auth/register", post(handlers::register))
            .route(
                "/api/access-tokens/validate",
                post(handlers::validate_access_code),
            )
            .with_state(self.state.clone());

        // PROTECTED routes (require a session token)
        let protected_router = Router::new()
            .route("/api/auth/me", get(handlers::get_current_user))
            .route("/api/permissions", get(handlers::get_permissions))
            .route("/api/workspace", get(handlers::get_workspace))
            .route(
                "/api/access-tokens",
                get(handlers::list_access_codes).post(handlers::issue_access_code),
            )
            .route(
                "/api/access-tokens/{id}/revoke",
                post(handlers::revoke_access_code),
            )
            .route("/api/team", get(handlers::list_team))
            .route("/api/team/invites", post(handlers::invite_team_member))
            .route(
                "/api/team/invites/{id}/accept",
                post(handlers::accept_invite),
            )
            .route(
                "/api/team/members/{id}/remove",
                post(handlers::remove_team_member),
            )
            .route(
                "/api/notes",
                get(handlers::list_notes).post(handlers::create_note),
            )
            .route("/api/admin/activity", get(handlers::list_activity))
            .route("/api/admin/activity/stats", get(handlers::activity_stats))
            .route(
                "/api/admin/users/{id}/role",
                post(handlers::change_user_role),
            )
            .route(
                "/api/admin/users/{id}/active",
                post(handlers::set_user_active),
            )
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                jwt_state.clone(),
                middleware::require_auth,
            ));

        let api_router = public_router.merge(protected_router);

        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router);

        let cors = if self.config.enable_cors {
            use tower_http::cors::AllowOrigin;

            // Cookie-based sessions require credentials, which rules out a
            // wildcard origin.
            let cors_layer = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                        || origin_str.starts_with("https://localhost:")
                        || origin_str.starts_with("https://127.0.0.1:")
                }));

            Some(cors_layer)
        } else {
            None
        };

        let mut router = router.layer(TraceLayer::new_for_http());

        if let Some(cors) = cors {
            router = router.layer(cors);
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        // Ensure OpenAPI spec can be generated without panics
        let _api_doc = ApiDoc::openapi();
    }
}
