mod auth;
mod home;
mod upload;
mod users;
mod videos;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::auth::auth_middleware;
use crate::services::ingest::MAX_THUMBNAIL_BYTES;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        home::root,
        auth::login,
        users::create_user,
        videos::create_video,
        videos::list_videos,
        videos::get_video,
        videos::delete_video,
        upload::upload_video,
        upload::upload_thumbnail,
    ),
    components(
        schemas(
            home::RootResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            users::CreateUserRequest,
            users::UserResponse,
            videos::CreateVideoRequest,
            crate::models::video::VideoResponse,
        )
    ),
    tags(
        (name = "General", description = "General API information"),
        (name = "Authentication", description = "Bearer token issuance"),
        (name = "Users", description = "Account registration"),
        (name = "Videos", description = "Video records owned by the caller"),
        (name = "Uploads", description = "Video and thumbnail ingestion")
    ),
    info(
        title = "VideoBlobKit API",
        version = "0.1.0",
        description = "Video ingestion service: fast-start remux, aspect classification, S3 storage and presigned delivery",
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

pub fn create_routes(state: AppState) -> Router {
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into();

    let video_limit = usize::try_from(state.max_upload_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(upload::MULTIPART_OVERHEAD_BYTES);

    let upload_routes = Router::new()
        .route(
            "/videos/{id}/video",
            post(upload::upload_video).layer(DefaultBodyLimit::max(video_limit)),
        )
        .route(
            "/videos/{id}/thumbnail",
            post(upload::upload_thumbnail).layer(DefaultBodyLimit::max(
                MAX_THUMBNAIL_BYTES + upload::MULTIPART_OVERHEAD_BYTES,
            )),
        );

    let protected_routes = Router::new()
        .route("/videos", post(videos::create_video).get(videos::list_videos))
        .route(
            "/videos/{id}",
            get(videos::get_video).delete(videos::delete_video),
        )
        .merge(upload_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let app_routes = Router::new()
        .route("/", get(home::root))
        .route("/users", post(users::create_user))
        .route("/login", post(auth::login))
        .merge(protected_routes)
        .with_state(state);

    Router::new()
        .merge(swagger_router)
        .merge(app_routes)
        .layer(TraceLayer::new_for_http())
}
