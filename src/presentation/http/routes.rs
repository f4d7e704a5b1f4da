use super::{
    handlers::{auth, blogs, categories, health, stories, users},
    middleware::request_id::request_id_middleware,
    middleware::user::require_user,
    state::AppState,
};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};

pub fn create_router(state: AppState) -> Router {
    // Mutations require a valid bearer token; reads stay open.
    let protected_routes = Router::new()
        .route("/api/blogs", post(blogs::add_blog))
        .route(
            "/api/blogs/{id}",
            put(blogs::update_blog).delete(blogs::delete_blog),
        )
        .route("/api/blogs/like", put(blogs::like_blog))
        .route("/api/blogs/unlike", put(blogs::unlike_blog))
        .route("/api/blogs/save", put(blogs::save_blog))
        .route("/api/blogs/unsave", put(blogs::unsave_blog))
        .route(
            "/api/users/{id}",
            put(users::update_user).delete(users::delete_user),
        )
        .route("/api/categories", post(categories::add_category))
        .route(
            "/api/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/api/stories", post(stories::add_story))
        .route(
            "/api/stories/{id}",
            put(stories::update_story).delete(stories::delete_story),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Blogs
        .route("/api/blogs", get(blogs::get_all_blogs))
        .route("/api/blogs/saved", get(blogs::get_saved_blogs))
        .route("/api/blogs/user", post(blogs::get_blogs_by_user))
        .route("/api/blogs/category", post(blogs::get_blogs_by_category))
        .route("/api/blogs/{id}", get(blogs::get_blog))
        // Users
        .route("/api/users", get(users::get_all_users))
        .route("/api/users/{id}", get(users::get_user))
        // Categories
        .route("/api/categories", get(categories::get_all_categories))
        .route("/api/categories/{id}", get(categories::get_category))
        // Stories
        .route("/api/stories", get(stories::get_all_stories))
        .route("/api/stories/user", post(stories::get_stories_by_user))
        .route("/api/stories/{id}", get(stories::get_story))
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login_user))
        .route("/api/auth/me", get(auth::me))
        .merge(protected_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
